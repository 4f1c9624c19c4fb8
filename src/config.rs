//! Parser limits, read from `GPARSE_*` environment variables.

use crate::error::{Error, Result};

pub const ENV_MAX_LOOKAHEAD: &str = "GPARSE_MAX_LOOKAHEAD";
pub const ENV_MAX_DEPTH: &str = "GPARSE_MAX_DEPTH";

/// Bounds applied to a single parse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Tokens any lookahead scan may inspect before giving up
    pub max_lookahead: usize,
    /// Nested expressions/statements allowed before the parse is rejected
    pub max_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_lookahead: 512,
            max_depth: 96,
        }
    }
}

impl ParserConfig {
    /// Defaults overridden by whatever `GPARSE_*` variables are set
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading values through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(raw) = lookup(ENV_MAX_LOOKAHEAD) {
            config.max_lookahead = parse_limit(ENV_MAX_LOOKAHEAD, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MAX_DEPTH) {
            config.max_depth = parse_limit(ENV_MAX_DEPTH, &raw)?;
        }
        log::debug!("parser config: {:?}", config);
        Ok(config)
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_lookahead(mut self, max_lookahead: usize) -> Self {
        self.max_lookahead = max_lookahead;
        self
    }
}

fn parse_limit(key: &str, raw: &str) -> Result<usize> {
    match raw.trim().parse::<usize>() {
        Ok(0) => Err(Error::config(format!("{} must be greater than zero", key))),
        Ok(value) => Ok(value),
        Err(_) => Err(Error::config(format!("{} must be a positive integer, got '{}'", key, raw))),
    }
}
