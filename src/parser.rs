use std::ops::Range;
use std::rc::Rc;

use log::debug;
use thiserror::Error;

use crate::combinators::{Constant, Transform};
use crate::config::Config;
use crate::state::ParseState;

/// ParseError is the only failure a parser reports. It means "this alternative does not apply
/// here" and carries no position, so creating and discarding it during backtracking costs nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("input does not match the grammar")]
pub struct ParseError;

pub type ParseResult<R> = Result<R, ParseError>;

/// GrammarError is returned while defining a grammar, never while parsing with one.
#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("invalid pattern {pattern:?}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex_automata::meta::BuildError,
    },
    /// A variant was declared while a dispatch over the same registry was running.
    #[error("variant registry is in use by a running dispatch")]
    RegistryBusy,
}

/// Node is a successfully constructed instance of a node type: the value computed from its
/// structural match, and the byte range of input it consumed. Nodes are immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Node<V> {
    value: V,
    span: Range<usize>,
}

impl<V> Node<V> {
    pub fn new(value: V, span: Range<usize>) -> Node<V> {
        Node { value, span }
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn into_value(self) -> V {
        self.value
    }

    /// Byte range in the input consumed by this node.
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }
}

/// Parser is implemented by every node type. Matching happens in two phases: `match_at` does the
/// structural recognition and yields a payload, then `compute` derives the node's value from it.
/// Either phase may fail with `ParseError`; a node only exists once both have succeeded.
pub trait Parser {
    /// The structural payload handed to `compute`.
    type Match;
    type Value;

    /// match_at recognizes this node type at byte offset `pos` of the input. On success, it
    /// returns the payload and the offset just past the consumed input.
    fn match_at(&self, st: &ParseState, pos: usize) -> ParseResult<(Self::Match, usize)>;

    /// compute derives the semantic value from a structural match. It runs exactly once per
    /// constructed node, after all children have computed theirs.
    fn compute(&self, m: Self::Match) -> ParseResult<Self::Value>;

    /// attempt runs both phases and returns the finished node with the new position.
    fn attempt(&self, st: &ParseState, pos: usize) -> ParseResult<(Node<Self::Value>, usize)> {
        let (m, end) = self.match_at(st, pos)?;
        let value = self.compute(m)?;
        Ok((Node::new(value, pos..end), end))
    }

    /// parse matches the whole input, failing if only a prefix was consumed.
    fn parse(&self, input: &str) -> ParseResult<Self::Value> {
        self.parse_state(&ParseState::new(input))
    }

    /// parse_with is `parse` with explicit limits.
    fn parse_with(&self, input: &str, config: &Config) -> ParseResult<Self::Value> {
        self.parse_state(&ParseState::new(input).with_config(config.clone()))
    }

    /// parse_state matches all of the text held by `st`, starting at offset 0.
    fn parse_state(&self, st: &ParseState) -> ParseResult<Self::Value> {
        let (node, end) = self.attempt(st, 0)?;
        if end == st.len() {
            Ok(node.into_value())
        } else {
            debug!("parse consumed {} of {} bytes", end, st.len());
            Err(ParseError)
        }
    }

    /// apply replaces the value computation of this node type with `f`, which receives the
    /// structural payload. If `f` fails, the node is treated as not matched.
    fn apply<V, F: Fn(Self::Match) -> ParseResult<V>>(self, f: F) -> Transform<Self, F>
    where
        Self: Sized,
    {
        Transform::new(self, f)
    }

    /// to makes every constructed node carry a clone of `value`.
    fn to<V: Clone>(self, value: V) -> Constant<Self, V>
    where
        Self: Sized,
    {
        Constant::new(self, value)
    }
}

/// Rule is the object-safe face of a `Parser`, with the payload type erased. It is what open
/// dispatch stores, since its variants may be built from entirely different combinators.
pub trait Rule<V> {
    fn attempt_rule(&self, st: &ParseState, pos: usize) -> ParseResult<(Node<V>, usize)>;
}

impl<P: Parser> Rule<P::Value> for P {
    fn attempt_rule(&self, st: &ParseState, pos: usize) -> ParseResult<(Node<P::Value>, usize)> {
        self.attempt(st, pos)
    }
}

/// A shared, type-erased rule is itself a node type whose payload is the finished inner node.
impl<V> Parser for Rc<dyn Rule<V>> {
    type Match = Node<V>;
    type Value = V;

    fn match_at(&self, st: &ParseState, pos: usize) -> ParseResult<(Self::Match, usize)> {
        self.as_ref().attempt_rule(st, pos)
    }

    fn compute(&self, m: Self::Match) -> ParseResult<Self::Value> {
        Ok(m.into_value())
    }
}

/// parse matches `input` in full with `parser`; see `Parser::parse`.
pub fn parse<P: Parser>(parser: &P, input: &str) -> ParseResult<P::Value> {
    parser.parse(input)
}
