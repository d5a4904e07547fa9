//! Engine configuration.

use std::num::NonZeroUsize;

use upkeep_core::DEFAULT_LOOKAHEAD_MONTH;

/// Configuration for the continuity engine.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Max assets processed concurrently in a batch
    pub max_concurrent: NonZeroUsize,
    /// Month (1-12) from which next year's schedules are generated too
    pub lookahead_month: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent: NonZeroUsize::new(4).unwrap_or(NonZeroUsize::MIN),
            lookahead_month: DEFAULT_LOOKAHEAD_MONTH,
        }
    }
}

impl EngineConfig {
    /// Create a default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set max concurrent workers.
    pub fn with_max_concurrent(mut self, max: NonZeroUsize) -> Self {
        self.max_concurrent = max;
        self
    }

    /// Set the lookahead month, clamped to 1..=13 (13 disables lookahead).
    pub fn with_lookahead_month(mut self, month: u32) -> Self {
        self.lookahead_month = month.clamp(1, 13);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_concurrent.get(), 4);
        assert_eq!(config.lookahead_month, 10);
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::new()
            .with_max_concurrent(NonZeroUsize::new(8).unwrap())
            .with_lookahead_month(40);
        assert_eq!(config.max_concurrent.get(), 8);
        assert_eq!(config.lookahead_month, 13);
    }
}
