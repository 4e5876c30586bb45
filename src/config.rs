//! Cache configuration file.
//!
//! The file lists both levels as whitespace-separated tokens:
//!
//! ```text
//! L1:
//! 64      block size in bytes
//! 4       associativity, 0 for fully associative
//! 16      size in KiB
//! L2:
//! 64
//! 8
//! 256
//! ```
//!
//! (without the annotations).

use std::fs;
use std::path::Path;
use std::str::SplitWhitespace;

use text_io::try_read;

use crate::error::ConfigError;
use crate::memory::{Geometry, InclusiveHierarchy};

/// Geometry of both cache levels
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HierarchyConfig {
    pub l1: Geometry,
    pub l2: Geometry,
}

impl HierarchyConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::FileReadError(path.into(), e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut tokens = content.split_whitespace();
        let l1 = parse_level(&mut tokens, "L1:")?;
        let l2 = parse_level(&mut tokens, "L2:")?;
        Ok(Self { l1, l2 })
    }

    /// Build an empty hierarchy, rejecting mismatched block sizes
    pub fn build(&self) -> Result<InclusiveHierarchy, ConfigError> {
        InclusiveHierarchy::make(self.l1, self.l2)
    }
}

fn parse_level(
    tokens: &mut SplitWhitespace,
    label: &str,
) -> Result<Geometry, ConfigError> {
    let found = tokens.next().ok_or_else(|| {
        ConfigError::ParseError(format!("missing '{}' section", label))
    })?;
    if !found.eq_ignore_ascii_case(label) {
        return Err(ConfigError::ParseError(format!(
            "expected '{}', found '{}'",
            label, found
        )));
    }

    let block_size = parse_field(tokens, label, "block size")?;
    let associativity = parse_field(tokens, label, "associativity")?;
    let size_kib = parse_field(tokens, label, "cache size")?;
    Geometry::make(block_size, associativity, size_kib)
}

fn parse_field(
    tokens: &mut SplitWhitespace,
    label: &str,
    name: &str,
) -> Result<u32, ConfigError> {
    let token = tokens.next().ok_or_else(|| {
        ConfigError::ParseError(format!("{} {} is missing", label, name))
    })?;
    let value: Result<u32, text_io::Error> = try_read!("{}", token.bytes());
    value.map_err(|e| {
        ConfigError::ParseError(format!(
            "{} {} '{}' is not a number ({:?})",
            label, name, token, e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let config = HierarchyConfig::parse("L1:\n64\n4\n16\nL2:\n64\n0\n256\n").unwrap();
        assert_eq!(config.l1, Geometry::make(64, 4, 16).unwrap());
        assert_eq!(config.l2.ways(), 4096);
        assert_eq!(config.l2.num_sets(), 1);
    }

    #[test]
    fn test_parse_single_line() {
        let config = HierarchyConfig::parse("L1: 8 1 1 L2: 8 2 4").unwrap();
        assert_eq!(config.l1.num_sets(), 128);
        assert_eq!(config.l2.num_sets(), 256);
    }

    #[test]
    fn test_missing_field() {
        let result = HierarchyConfig::parse("L1:\n64\n4\n16\nL2:\n64\n8\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_bad_number() {
        let result = HierarchyConfig::parse("L1: 64 four 16 L2: 64 8 256");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_wrong_label() {
        let result = HierarchyConfig::parse("L2: 64 4 16 L1: 64 8 256");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_invalid_geometry() {
        let result = HierarchyConfig::parse("L1: 48 4 16 L2: 64 8 256");
        assert!(matches!(result, Err(ConfigError::InvalidGeometry(_))));
    }

    #[test]
    fn test_build_rejects_block_size_mismatch() {
        let config = HierarchyConfig::parse("L1: 32 4 16 L2: 64 8 256").unwrap();
        assert!(matches!(
            config.build(),
            Err(ConfigError::BlockSizeMismatch { l1: 32, l2: 64 })
        ));
    }
}
