use std::collections::HashMap;
use std::rc::Rc;

use regex_automata::meta::Regex;
use regex_automata::{Anchored, Input, PatternID};

use crate::parser::{GrammarError, ParseError, ParseResult, Parser};
use crate::state::ParseState;

/// Literal matches an exact, case-sensitive string. Its payload is the literal itself.
#[derive(Debug, Clone)]
pub struct Literal(String);

impl Literal {
    pub fn new<S: AsRef<str>>(s: S) -> Literal {
        Literal(s.as_ref().to_owned())
    }

    pub fn text(&self) -> &str {
        &self.0
    }
}

impl Parser for Literal {
    type Match = String;
    type Value = ();

    fn match_at(&self, st: &ParseState, pos: usize) -> ParseResult<(Self::Match, usize)> {
        if st.rest(pos)?.starts_with(self.0.as_str()) {
            Ok((self.0.clone(), pos + self.0.len()))
        } else {
            Err(ParseError)
        }
    }

    fn compute(&self, _: Self::Match) -> ParseResult<Self::Value> {
        Ok(())
    }
}

/// Capture selects one group of a `RegexMatch`, by position or by name. Group 0 is the whole
/// match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capture {
    Index(usize),
    Name(String),
}

/// RegexMatch is the payload of a `Pattern`: the matched text and its capture groups.
#[derive(Debug, Clone, PartialEq)]
pub struct RegexMatch {
    groups: Vec<Option<String>>,
    names: Rc<HashMap<String, usize>>,
}

impl RegexMatch {
    /// The full matched text. May be empty.
    pub fn text(&self) -> &str {
        self.get(0).unwrap_or("")
    }

    /// Group `i`, or None if it doesn't exist or did not participate in the match.
    pub fn get(&self, i: usize) -> Option<&str> {
        self.groups.get(i).and_then(|g| g.as_deref())
    }

    pub fn name(&self, name: &str) -> Option<&str> {
        self.names.get(name).and_then(|&i| self.get(i))
    }

    pub fn select(&self, c: &Capture) -> Option<&str> {
        match c {
            Capture::Index(i) => self.get(*i),
            Capture::Name(n) => self.name(n),
        }
    }

    /// Number of groups, including the implicit group 0.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Pattern matches a regular expression anchored at the current position; it never searches
/// ahead. The text before the position still counts as context for assertions, so `^` only
/// matches at offset 0. Zero-length matches succeed without advancing.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
    names: Rc<HashMap<String, usize>>,
}

impl Pattern {
    pub fn new(pattern: &str) -> Result<Pattern, GrammarError> {
        let regex = Regex::new(pattern).map_err(|source| GrammarError::InvalidPattern {
            pattern: pattern.to_owned(),
            source,
        })?;
        let names = regex
            .group_info()
            .pattern_names(PatternID::ZERO)
            .enumerate()
            .filter_map(|(i, n)| n.map(|n| (n.to_owned(), i)))
            .collect();
        Ok(Pattern {
            regex,
            names: Rc::new(names),
        })
    }

    /// capture returns a node type whose value is the text of capture group `index`.
    pub fn capture(pattern: &str, index: usize) -> Result<Captured, GrammarError> {
        Ok(Captured {
            pattern: Pattern::new(pattern)?,
            group: Capture::Index(index),
        })
    }

    /// capture_name returns a node type whose value is the text of the named capture group.
    pub fn capture_name(pattern: &str, name: &str) -> Result<Captured, GrammarError> {
        Ok(Captured {
            pattern: Pattern::new(pattern)?,
            group: Capture::Name(name.to_owned()),
        })
    }
}

impl Parser for Pattern {
    type Match = RegexMatch;
    type Value = ();

    fn match_at(&self, st: &ParseState, pos: usize) -> ParseResult<(Self::Match, usize)> {
        // Searching the whole text keeps what precedes `pos` visible to `^`, `\b` and `\B`.
        st.rest(pos)?;
        let text = st.text();
        let input = Input::new(text).range(pos..).anchored(Anchored::Yes);
        let mut caps = self.regex.create_captures();
        self.regex.search_captures(&input, &mut caps);
        let end = caps.get_match().ok_or(ParseError)?.end();
        let groups = (0..caps.group_len())
            .map(|i| {
                caps.get_group(i)
                    .and_then(|span| text.get(span.range()))
                    .map(str::to_owned)
            })
            .collect();
        Ok((
            RegexMatch {
                groups,
                names: self.names.clone(),
            },
            end,
        ))
    }

    fn compute(&self, _: Self::Match) -> ParseResult<Self::Value> {
        Ok(())
    }
}

/// Captured is a `Pattern` whose value is bound to a single capture group. A group that did not
/// take part in the match fails the node.
#[derive(Debug, Clone)]
pub struct Captured {
    pattern: Pattern,
    group: Capture,
}

impl Parser for Captured {
    type Match = RegexMatch;
    type Value = String;

    fn match_at(&self, st: &ParseState, pos: usize) -> ParseResult<(Self::Match, usize)> {
        self.pattern.match_at(st, pos)
    }

    fn compute(&self, m: Self::Match) -> ParseResult<Self::Value> {
        m.select(&self.group).map(str::to_owned).ok_or(ParseError)
    }
}
