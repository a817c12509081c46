//! parseable is a recursive-descent parser combinator library built around node types. A node
//! type is anything implementing `Parser`: it recognizes a piece of input at a given position,
//! then computes a value from what it recognized. Grammars are built by composing node types:
//!
//!   * `Literal` and `Pattern` match fixed text and anchored regular expressions.
//!   * `Sequence` matches node types one after another, `Choice` takes the first alternative that
//!     succeeds, and `SeparatedList` matches one or more elements between separators.
//!   * `Dispatch` is a choice whose alternatives are declared separately, and may be declared
//!     after the dispatcher itself is in use. This is how recursive grammars are tied together.
//!   * `apply` attaches a value computation to any node type; it receives the structural match
//!     and may reject it.
//!
//! Failure is a single, payload-free `ParseError`. Only `Choice`, `Dispatch` and the separator
//! step of `SeparatedList` recover from it; anywhere else it fails the enclosing node. Choices are
//! final: once an alternative has been returned, it is not reconsidered.
//!
//! ```
//! use parseable::{Choice, Literal, ParseError, Parser, Pattern, Sequence};
//!
//! let number = || {
//!     Pattern::new("[0-9]+")
//!         .unwrap()
//!         .apply(|m| m.text().parse::<i64>().map_err(|_| ParseError))
//! };
//! let op = Choice::new((Literal::new("+").to(1i64), Literal::new("-").to(-1i64)));
//! let sum = Sequence::new((number(), op, number()))
//!     .apply(|(a, sign, b)| Ok(a.into_value() + sign.into_value() * b.into_value()));
//!
//! assert_eq!(Ok(5), sum.parse("2+3"));
//! assert_eq!(Ok(-1), sum.parse("2-3"));
//! // The whole input has to be consumed.
//! assert_eq!(Err(ParseError), sum.parse("2+3 "));
//! ```
//!
//! The `json` module contains a complete grammar written this way.

#[allow(unused_imports)]
#[macro_use]
extern crate time_test;

pub mod combinators;
pub mod config;
pub mod dispatch;
pub mod json;
pub mod parser;
pub mod primitives;
mod state;

pub use combinators::{Choice, Item, Selected, SeparatedList, Sequence, Transform};
pub use config::Config;
pub use dispatch::{Dispatch, WeakDispatch};
pub use parser::{parse, GrammarError, Node, ParseError, ParseResult, Parser, Rule};
pub use primitives::{Capture, Literal, Pattern, RegexMatch};
pub use state::{Depth, ParseState};
