use std::borrow::Cow;
use std::cell::Cell;
use std::io;

use log::warn;

use crate::config::Config;
use crate::parser::{ParseError, ParseResult};

struct UTF8Reader<R: io::Read>(utf8reader::UTF8Reader<R>);

impl<R: io::Read> Iterator for UTF8Reader<R> {
    type Item = char;
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.0.next() {
                None => return None,
                Some(Err(_)) => continue,
                Some(Ok(c)) => return Some(c),
            }
        }
    }
}

/// ParseState holds the input text for one parse, together with the limits it runs under.
///
/// Positions are not part of the state: parsers receive a byte offset and return a new one, so
/// a failed alternative cannot leave anything behind for its caller to undo. The only mutable
/// piece is the recursion depth, which is restored by `Depth` guards as the parse unwinds.
#[derive(Debug)]
pub struct ParseState<'a> {
    text: Cow<'a, str>,
    config: Config,
    depth: Cell<usize>,
}

/// Depth represents one level of nested dispatch. Dropping it leaves the level.
pub struct Depth<'s> {
    depth: &'s Cell<usize>,
}

impl<'s> Drop for Depth<'s> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get() - 1);
    }
}

impl<'a> ParseState<'a> {
    /// Initialize ParseState from a string.
    pub fn new(s: &'a str) -> ParseState<'a> {
        ParseState::from_text(Cow::Borrowed(s))
    }

    /// Initialize ParseState from a UTF-8 encoded source. Byte sequences that don't decode are
    /// skipped.
    pub fn from_reader<R: io::Read>(r: R) -> ParseState<'static> {
        let text: String = UTF8Reader(utf8reader::UTF8Reader::new(r)).collect();
        ParseState::from_text(Cow::Owned(text))
    }

    fn from_text(text: Cow<'a, str>) -> ParseState<'a> {
        ParseState {
            text,
            config: Config::default(),
            depth: Cell::new(0),
        }
    }

    pub fn with_config(mut self, config: Config) -> ParseState<'a> {
        self.config = config;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length of the input in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Return the input remaining at `pos`. Offsets past the end or inside a character fail.
    pub fn rest(&self, pos: usize) -> ParseResult<&str> {
        self.text.get(pos..).ok_or(ParseError)
    }

    /// Current number of nested dispatch levels.
    pub fn depth(&self) -> usize {
        self.depth.get()
    }

    /// Enter one more level of nested dispatch, failing if that exceeds the configured limit.
    pub fn enter(&self) -> ParseResult<Depth<'_>> {
        let next = self.depth.get() + 1;
        if let Some(max) = self.config.max_depth {
            if next > max {
                warn!("nesting depth limit of {} exceeded", max);
                return Err(ParseError);
            }
        }
        self.depth.set(next);
        Ok(Depth { depth: &self.depth })
    }
}
