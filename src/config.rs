//! Calling thresholds and parse policy for consensus computation.

use thiserror::Error;

/// Default minimum representation for a base to enter an IUPAC call.
pub const DEFAULT_MIN_PER: f64 = 0.20;

/// Errors produced when validating a [`ConsensusConfig`].
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Ratio threshold outside `[0, 1]` (or NaN).
    #[error("minimum base ratio must lie in [0, 1], got {0}")]
    InvalidRatio(f64),
}

/// How the pileup parser treats lines that match no known column layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseMode {
    /// Malformed lines are skipped (upstream tools emit the odd bad row).
    #[default]
    Lenient,
    /// Malformed lines are reported as errors.
    Strict,
}

/// Thresholds applied when folding pileup records into a region.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsensusConfig {
    /// A position is called only when its coverage is strictly greater.
    pub min_cov: u32,
    /// A base joins the call when `count / coverage` is strictly greater.
    pub min_per: f64,
    /// Policy for malformed pileup lines.
    pub parse_mode: ParseMode,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            min_cov: 0,
            min_per: DEFAULT_MIN_PER,
            parse_mode: ParseMode::Lenient,
        }
    }
}

impl ConsensusConfig {
    /// Build a validated configuration.
    pub fn new(min_cov: u32, min_per: f64) -> Result<Self, ConfigError> {
        Self::default().with_min_cov(min_cov).with_min_per(min_per).validate()
    }

    /// Set the minimum coverage.
    pub fn with_min_cov(mut self, min_cov: u32) -> Self {
        self.min_cov = min_cov;
        self
    }

    /// Set the minimum base ratio.
    pub fn with_min_per(mut self, min_per: f64) -> Self {
        self.min_per = min_per;
        self
    }

    /// Set the parse policy.
    pub fn with_parse_mode(mut self, parse_mode: ParseMode) -> Self {
        self.parse_mode = parse_mode;
        self
    }

    /// Check thresholds, returning the configuration unchanged when valid.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&self.min_per) {
            return Err(ConfigError::InvalidRatio(self.min_per));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_region_calling() {
        let config = ConsensusConfig::default();
        assert_eq!(config.min_cov, 0);
        assert_eq!(config.min_per, 0.20);
        assert_eq!(config.parse_mode, ParseMode::Lenient);
    }

    #[test]
    fn rejects_out_of_range_ratio() {
        assert_eq!(
            ConsensusConfig::new(5, 1.5),
            Err(ConfigError::InvalidRatio(1.5))
        );
        assert!(ConsensusConfig::new(5, f64::NAN).is_err());
        assert!(ConsensusConfig::new(5, 0.5).is_ok());
    }
}
