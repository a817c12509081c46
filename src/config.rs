/// Default limit on nested dispatch levels.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Config carries the limits a parse runs under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of nested dispatch levels. Deeper input fails to parse instead of
    /// exhausting the stack. `None` removes the limit.
    pub max_depth: Option<usize>,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            max_depth: Some(DEFAULT_MAX_DEPTH),
        }
    }
}

impl Config {
    /// A configuration without a depth limit. Very deeply nested input may then overflow the
    /// stack.
    pub fn unbounded() -> Config {
        Config { max_depth: None }
    }

    pub fn max_depth(mut self, max: usize) -> Config {
        self.max_depth = Some(max);
        self
    }
}
