//! Open dispatch: an ordered choice whose alternatives are registered after it is created.
//!
//! A `Dispatch` owns a registry of variants, all producing the same value type. Variants are
//! tried in the order they were declared, and the registry is read when a dispatch runs, so a
//! grammar can declare a variant after handing out the dispatcher, as long as it does so before
//! parsing. The registry only grows. Like `Choice`, a dispatcher's value is the value of the
//! variant that matched rather than a `()` placeholder.
//!
//! Recursive grammars refer back to a dispatcher through `WeakDispatch`, which does not keep the
//! registry alive; the grammar keeps the owning `Dispatch`.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use log::{trace, warn};

use crate::combinators::Selected;
use crate::parser::{GrammarError, ParseError, ParseResult, Parser, Rule};
use crate::state::ParseState;

type Registry<V> = RefCell<Vec<Rc<dyn Rule<V>>>>;

pub struct Dispatch<V> {
    variants: Rc<Registry<V>>,
}

impl<V> Clone for Dispatch<V> {
    fn clone(&self) -> Dispatch<V> {
        Dispatch {
            variants: self.variants.clone(),
        }
    }
}

impl<V> fmt::Debug for Dispatch<V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Dispatch")
            .field("variants", &self.len())
            .finish()
    }
}

impl<V: 'static> Default for Dispatch<V> {
    fn default() -> Dispatch<V> {
        Dispatch::new()
    }
}

impl<V: 'static> Dispatch<V> {
    pub fn new() -> Dispatch<V> {
        Dispatch {
            variants: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// declare appends a variant. It will be tried after all previously declared ones.
    ///
    /// Declaring from inside a running dispatch over the same registry is refused.
    pub fn declare<P: Parser<Value = V> + 'static>(&self, variant: P) -> Result<(), GrammarError> {
        let mut variants = self
            .variants
            .try_borrow_mut()
            .map_err(|_| GrammarError::RegistryBusy)?;
        variants.push(Rc::new(variant));
        Ok(())
    }

    /// downgrade returns a handle for referring back to this dispatcher from one of its own
    /// variants.
    pub fn downgrade(&self) -> WeakDispatch<V> {
        WeakDispatch {
            variants: Rc::downgrade(&self.variants),
        }
    }
}

impl<V> Dispatch<V> {
    /// Number of declared variants.
    pub fn len(&self) -> usize {
        self.variants.try_borrow().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn dispatch<V>(
    variants: &Registry<V>,
    st: &ParseState,
    pos: usize,
) -> ParseResult<(Selected<V>, usize)> {
    let _depth = st.enter()?;
    let variants = variants.try_borrow().map_err(|_| ParseError)?;
    for (index, variant) in variants.iter().enumerate() {
        match variant.attempt_rule(st, pos) {
            Ok((node, end)) => return Ok((Selected::new(index, node), end)),
            Err(_) => trace!("variant {} rejected at {}", index, pos),
        }
    }
    Err(ParseError)
}

impl<V> Parser for Dispatch<V> {
    type Match = Selected<V>;
    type Value = V;

    fn match_at(&self, st: &ParseState, pos: usize) -> ParseResult<(Self::Match, usize)> {
        dispatch(&self.variants, st, pos)
    }

    fn compute(&self, m: Self::Match) -> ParseResult<Self::Value> {
        Ok(m.into_value())
    }
}

/// WeakDispatch behaves like the `Dispatch` it was obtained from. Once that dispatcher and all
/// its clones are gone, it fails to match anything.
pub struct WeakDispatch<V> {
    variants: Weak<Registry<V>>,
}

impl<V> Clone for WeakDispatch<V> {
    fn clone(&self) -> WeakDispatch<V> {
        WeakDispatch {
            variants: self.variants.clone(),
        }
    }
}

impl<V> fmt::Debug for WeakDispatch<V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("WeakDispatch")
            .field("live", &(self.variants.strong_count() > 0))
            .finish()
    }
}

impl<V> Parser for WeakDispatch<V> {
    type Match = Selected<V>;
    type Value = V;

    fn match_at(&self, st: &ParseState, pos: usize) -> ParseResult<(Self::Match, usize)> {
        match self.variants.upgrade() {
            Some(variants) => dispatch(&variants, st, pos),
            None => {
                warn!("dispatch through a dropped registry");
                Err(ParseError)
            }
        }
    }

    fn compute(&self, m: Self::Match) -> ParseResult<Self::Value> {
        Ok(m.into_value())
    }
}
