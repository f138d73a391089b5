use nom::{
    character::complete::{multispace0, multispace1, u32 as unsigned},
    combinator::all_consuming,
    sequence::tuple,
    IResult,
};
use thiserror::Error;

use crate::{geometry::CacheGeometry, trace::describe_nom_error};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("malformed cache config: {0}")]
    Syntax(String),
    #[error("{name} must be a non-zero power of two, got {value}")]
    NotPowerOfTwo { name: &'static str, value: u32 },
    #[error("total size {total_size} is not a multiple of associativity * line size ({set_bytes})")]
    NotDivisible { total_size: u32, set_bytes: u64 },
}

/// raw contents of a cache config file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    pub associativity: u32,
    pub line_size: u32,
    pub total_size: u32,
}

impl CacheConfig {
    /// three unsigned integers separated by whitespace:
    /// associativity, line size in bytes, total size in bytes.
    pub fn parse(src: &str) -> Result<Self, ConfigError> {
        let (_, config) = all_consuming(Self::read_config)(src)
            .map_err(|e| ConfigError::Syntax(describe_nom_error(e)))?;
        Ok(config)
    }
    fn read_config(input: &str) -> IResult<&str, Self> {
        let (input, (_, associativity, _, line_size, _, total_size, _)) = tuple((
            multispace0,
            unsigned,
            multispace1,
            unsigned,
            multispace1,
            unsigned,
            multispace0,
        ))(input)?;
        Ok((
            input,
            Self {
                associativity,
                line_size,
                total_size,
            },
        ))
    }
    pub fn geometry(&self) -> Result<CacheGeometry, ConfigError> {
        CacheGeometry::new(self.associativity, self.line_size, self.total_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_parse() {
        let c = CacheConfig::parse("2\n16\n1024\n").unwrap();
        assert_eq!(
            c,
            CacheConfig {
                associativity: 2,
                line_size: 16,
                total_size: 1024
            }
        );
        let g = c.geometry().unwrap();
        assert_eq!(g.num_sets(), 32);
    }
    #[test]
    fn test_config_any_whitespace() {
        let c = CacheConfig::parse("  1 4\t16  ").unwrap();
        assert_eq!(c.total_size, 16);
    }
    #[test]
    fn test_config_syntax_error() {
        assert!(matches!(
            CacheConfig::parse("2\n16\n"),
            Err(ConfigError::Syntax(_))
        ));
        assert!(matches!(
            CacheConfig::parse("2\nsixteen\n1024"),
            Err(ConfigError::Syntax(_))
        ));
        assert!(matches!(
            CacheConfig::parse("2 16 1024 8"),
            Err(ConfigError::Syntax(_))
        ));
        assert!(matches!(
            CacheConfig::parse("-2 16 1024"),
            Err(ConfigError::Syntax(_))
        ));
    }
    #[test]
    fn test_config_invalid_geometry() {
        let c = CacheConfig::parse("3 16 1024").unwrap();
        let e = c.geometry().unwrap_err();
        assert_eq!(
            e.to_string(),
            "associativity must be a non-zero power of two, got 3"
        );
    }
}
