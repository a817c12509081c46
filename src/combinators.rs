use log::trace;

use crate::parser::{Node, ParseError, ParseResult, Parser};
use crate::state::ParseState;

/// Transform gives a node type a value computation: `f` receives the structural payload of the
/// inner node type and returns the value, or fails, in which case the node is not constructed.
/// The inner node type's own computation is not run.
#[derive(Clone)]
pub struct Transform<P, F> {
    p: P,
    f: F,
}

impl<P, F> Transform<P, F> {
    /// Create a new Transform parser using f.
    pub fn new(p: P, f: F) -> Transform<P, F> {
        Transform { p, f }
    }
}

impl<P: Parser, V, F: Fn(P::Match) -> ParseResult<V>> Parser for Transform<P, F> {
    type Match = P::Match;
    type Value = V;

    fn match_at(&self, st: &ParseState, pos: usize) -> ParseResult<(Self::Match, usize)> {
        self.p.match_at(st, pos)
    }

    fn compute(&self, m: Self::Match) -> ParseResult<Self::Value> {
        (self.f)(m)
    }
}

/// Constant gives every node the same value, regardless of what was matched.
#[derive(Debug, Clone)]
pub struct Constant<P, V> {
    p: P,
    value: V,
}

impl<P, V> Constant<P, V> {
    pub fn new(p: P, value: V) -> Constant<P, V> {
        Constant { p, value }
    }
}

impl<P: Parser, V: Clone> Parser for Constant<P, V> {
    type Match = P::Match;
    type Value = V;

    fn match_at(&self, st: &ParseState, pos: usize) -> ParseResult<(Self::Match, usize)> {
        self.p.match_at(st, pos)
    }

    fn compute(&self, _: Self::Match) -> ParseResult<Self::Value> {
        Ok(self.value.clone())
    }
}

/// Selected is the payload of `Choice` and `Dispatch`: the alternative that matched and the node
/// it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Selected<V> {
    index: usize,
    node: Node<V>,
}

impl<V> Selected<V> {
    pub fn new(index: usize, node: Node<V>) -> Selected<V> {
        Selected { index, node }
    }

    /// Position of the matching alternative, in the order alternatives are tried.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn node(&self) -> &Node<V> {
        &self.node
    }

    pub fn into_node(self) -> Node<V> {
        self.node
    }

    pub fn into_value(self) -> V {
        self.node.into_value()
    }
}

/// Choice tries each alternative in order at the same position and takes the first one that is
/// fully constructed, value computation included. Once Choice has returned, the decision is final:
/// a failure further up the grammar does not make it try the remaining alternatives.
///
/// All alternatives produce the same value type, which Choice passes through. T is always a tuple.
/// The selected alternative's value takes the place of the `()` placeholder that node types
/// without a value computation get; use `apply` on the Choice to compute something else from
/// the `Selected` payload.
#[derive(Clone)]
pub struct Choice<T>(T);

impl<T> Choice<T> {
    pub fn new(tuple: T) -> Choice<T> {
        Choice(tuple)
    }
}

macro_rules! choice_impl {
    ( ( $($ptype:ident/$ix:tt),* ) ) => {
        impl<V, $($ptype : Parser<Value = V>, )*> Parser for Choice<($($ptype,)*)> {
            type Match = Selected<V>;
            type Value = V;

            fn match_at(&self, st: &ParseState, pos: usize) -> ParseResult<(Self::Match, usize)> {
                $(
                    match (self.0).$ix.attempt(st, pos) {
                        Ok((node, end)) => return Ok((Selected::new($ix, node), end)),
                        Err(_) => trace!("alternative {} rejected at {}", $ix, pos),
                    }
                )*
                Err(ParseError)
            }

            fn compute(&self, m: Self::Match) -> ParseResult<Self::Value> {
                Ok(m.into_value())
            }
        }
    }
}

choice_impl!((P0 / 0, P1 / 1));
choice_impl!((P0 / 0, P1 / 1, P2 / 2));
choice_impl!((P0 / 0, P1 / 1, P2 / 2, P3 / 3));
choice_impl!((P0 / 0, P1 / 1, P2 / 2, P3 / 3, P4 / 4));
choice_impl!((P0 / 0, P1 / 1, P2 / 2, P3 / 3, P4 / 4, P5 / 5));
choice_impl!((P0 / 0, P1 / 1, P2 / 2, P3 / 3, P4 / 4, P5 / 5, P6 / 6));
choice_impl!((
    P0 / 0,
    P1 / 1,
    P2 / 2,
    P3 / 3,
    P4 / 4,
    P5 / 5,
    P6 / 6,
    P7 / 7
));
choice_impl!((
    P0 / 0,
    P1 / 1,
    P2 / 2,
    P3 / 3,
    P4 / 4,
    P5 / 5,
    P6 / 6,
    P7 / 7,
    P8 / 8
));
choice_impl!((
    P0 / 0,
    P1 / 1,
    P2 / 2,
    P3 / 3,
    P4 / 4,
    P5 / 5,
    P6 / 6,
    P7 / 7,
    P8 / 8,
    P9 / 9
));

/// Sequence matches its parsers one after the other and only succeeds if all of them do. There
/// is no backtracking into earlier elements. T is always a tuple; the payload is a tuple of the
/// child nodes in the same order. Without a value computation, the value is `()`.
#[derive(Clone)]
pub struct Sequence<T>(T);

impl<T> Sequence<T> {
    pub fn new(tuple: T) -> Sequence<T> {
        Sequence(tuple)
    }
}

/// Macro for implementing sequence parsers for arbitrary tuples. Not for public use.
macro_rules! seq_impl {
    ( ( $($ptype:ident/$ix:tt),+ ) ) => {
        impl<$($ptype : Parser, )*> Parser for Sequence<($($ptype,)*)> {
            type Match = ($(Node<<$ptype as Parser>::Value>,)*);
            type Value = ();

            #[allow(unused_assignments)]
            fn match_at(&self, st: &ParseState, pos: usize) -> ParseResult<(Self::Match, usize)> {
                let mut end = pos;
                let children = ($(
                    {
                        let (node, next) = (self.0).$ix.attempt(st, end)?;
                        end = next;
                        node
                    },
                )*);
                Ok((children, end))
            }

            fn compute(&self, _: Self::Match) -> ParseResult<Self::Value> {
                Ok(())
            }
        }
    }
}

seq_impl!((P0 / 0));
seq_impl!((P0 / 0, P1 / 1));
seq_impl!((P0 / 0, P1 / 1, P2 / 2));
seq_impl!((P0 / 0, P1 / 1, P2 / 2, P3 / 3));
seq_impl!((P0 / 0, P1 / 1, P2 / 2, P3 / 3, P4 / 4));
seq_impl!((P0 / 0, P1 / 1, P2 / 2, P3 / 3, P4 / 4, P5 / 5));
seq_impl!((P0 / 0, P1 / 1, P2 / 2, P3 / 3, P4 / 4, P5 / 5, P6 / 6));
seq_impl!((
    P0 / 0,
    P1 / 1,
    P2 / 2,
    P3 / 3,
    P4 / 4,
    P5 / 5,
    P6 / 6,
    P7 / 7
));
seq_impl!((
    P0 / 0,
    P1 / 1,
    P2 / 2,
    P3 / 3,
    P4 / 4,
    P5 / 5,
    P6 / 6,
    P7 / 7,
    P8 / 8
));
seq_impl!((
    P0 / 0,
    P1 / 1,
    P2 / 2,
    P3 / 3,
    P4 / 4,
    P5 / 5,
    P6 / 6,
    P7 / 7,
    P8 / 8,
    P9 / 9
));

/// Item is one entry of a `SeparatedList` payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Item<E, S> {
    Element(Node<E>),
    Separator(Node<S>),
}

impl<E, S> Item<E, S> {
    pub fn element(&self) -> Option<&Node<E>> {
        match self {
            Item::Element(n) => Some(n),
            Item::Separator(_) => None,
        }
    }

    pub fn into_element(self) -> Option<Node<E>> {
        match self {
            Item::Element(n) => Some(n),
            Item::Separator(_) => None,
        }
    }

    pub fn is_separator(&self) -> bool {
        match self {
            Item::Element(_) => false,
            Item::Separator(_) => true,
        }
    }
}

/// SeparatedList matches one or more elements with a separator between each pair. A missing
/// separator ends the list; a separator that is not followed by an element fails the whole list,
/// so a trailing separator is never accepted.
///
/// The payload holds elements and separators alternately, in input order.
#[derive(Debug, Clone)]
pub struct SeparatedList<E, S> {
    element: E,
    separator: S,
}

impl<E, S> SeparatedList<E, S> {
    pub fn new(element: E, separator: S) -> SeparatedList<E, S> {
        SeparatedList { element, separator }
    }
}

impl<E: Parser, S: Parser> Parser for SeparatedList<E, S> {
    type Match = Vec<Item<E::Value, S::Value>>;
    type Value = ();

    fn match_at(&self, st: &ParseState, pos: usize) -> ParseResult<(Self::Match, usize)> {
        let (first, mut end) = self.element.attempt(st, pos)?;
        let mut items = vec![Item::Element(first)];
        loop {
            let (sep, next) = match self.separator.attempt(st, end) {
                Ok(r) => r,
                Err(_) => return Ok((items, end)),
            };
            let (element, next) = self.element.attempt(st, next)?;
            if next == end {
                // Neither consumed anything; repeating would never terminate.
                return Ok((items, end));
            }
            items.push(Item::Separator(sep));
            items.push(Item::Element(element));
            end = next;
        }
    }

    fn compute(&self, _: Self::Match) -> ParseResult<Self::Value> {
        Ok(())
    }
}

/// elements keeps only the element values of a `SeparatedList` payload.
pub fn elements<E, S>(items: Vec<Item<E, S>>) -> Vec<E> {
    items
        .into_iter()
        .filter_map(Item::into_element)
        .map(Node::into_value)
        .collect()
}
