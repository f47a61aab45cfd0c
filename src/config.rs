//! YAML configuration for score processing
//!
//! ```yaml
//! sharp: true
//! transpose: -2
//! limit: C6
//! bass-offset: -12
//! optimise: true
//! no-chords: false
//! ```
//! Every key is optional. Intervals are in semitones.

use crate::chord::BAND_STEP_12;
use crate::error::{Result, ScoreError};
use crate::score::value::parse_score_key;
use crate::score::Head;
use log::debug;
use serde::Deserialize;
use std::path::Path;

/// Raw YAML fields, before validation
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawConfig {
    sharp: Option<bool>,
    #[serde(default)]
    no_chords: bool,
    #[serde(default)]
    optimise: bool,
    #[serde(default)]
    transpose: i32,
    limit: Option<String>,
    #[serde(default)]
    bass_offset: i32,
}

/// Validated processing options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreConfig {
    /// Force sharp (`true`) or flat (`false`) chord spelling
    pub sharp: Option<bool>,
    pub no_chords: bool,
    pub optimise: bool,
    /// Semitones
    pub transpose: i32,
    /// Highest treble key, in bands
    pub limit: Option<u32>,
    /// Semitones
    pub bass_offset: i32,
}

impl ScoreConfig {
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: RawConfig = serde_yaml::from_str(content).map_err(|e| ScoreError::Config(e.to_string()))?;

        let limit = match raw.limit.as_deref().map(str::trim) {
            Some(text) => Some(parse_key(text, "limit")?),
            None => None,
        };

        Ok(ScoreConfig {
            sharp: raw.sharp,
            no_chords: raw.no_chords,
            optimise: raw.optimise,
            transpose: raw.transpose,
            limit,
            bass_offset: raw.bass_offset,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ScoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Run the configured transforms on `head`, in the order transpose,
    /// limit, bass offset, optimise.
    pub fn apply(&self, head: &mut Head) {
        if self.transpose != 0 {
            head.transpose_score(self.transpose * BAND_STEP_12 as i32, self.sharp);
        }
        if let Some(limit) = self.limit {
            head.limit_score(limit);
        }
        if self.bass_offset != 0 {
            head.bass_offset(self.bass_offset * BAND_STEP_12 as i32);
        }
        if self.optimise {
            head.optimise();
        }
        debug!("applied {:?}", self);
    }
}

/// Parse a note such as `C6` into a score key, naming `arg` on failure
pub fn parse_key(text: &str, arg: &str) -> Result<u32> {
    let valid = text.chars().count() > 1 && text.chars().skip(1).all(|c| c.is_ascii_digit() || "bB.".contains(c));
    match parse_score_key(text) {
        Some(key) if valid => Ok(key),
        _ => Err(ScoreError::InvalidArgument {
            arg: arg.to_string(),
            message: format!("'{}' is not a note", text),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_full_config() {
        let config = ScoreConfig::from_yaml(
            "sharp: true\nno-chords: true\noptimise: true\ntranspose: -2\nlimit: C6\nbass-offset: -12\n",
        )
        .unwrap();
        assert_eq!(
            config,
            ScoreConfig {
                sharp: Some(true),
                no_chords: true,
                optimise: true,
                transpose: -2,
                limit: Some(72 * 16),
                bass_offset: -12,
            }
        );
    }

    #[test]
    fn test_empty_config() {
        assert_eq!(ScoreConfig::from_yaml("").unwrap(), ScoreConfig::default());
        assert_eq!(ScoreConfig::from_yaml("optimise: false").unwrap(), ScoreConfig::default());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = ScoreConfig::from_yaml("tempo: 120").unwrap_err();
        assert!(matches!(err, ScoreError::Config(_)));
    }

    #[test]
    fn test_bad_limit() {
        let err = ScoreConfig::from_yaml("limit: X9").unwrap_err();
        assert!(matches!(err, ScoreError::InvalidArgument { .. }));
        assert!(parse_key("C", "limit").is_err());
        assert!(parse_key("C6x", "limit").is_err());
        assert_eq!(parse_key("E5B", "limit").unwrap(), 63 * 16);
    }

    #[test]
    fn test_missing_file() {
        let err = ScoreConfig::load(Path::new("/nonexistent/chordscore.yaml")).unwrap_err();
        assert!(matches!(err, ScoreError::Io { .. }));
    }

    #[test]
    fn test_apply() {
        let config = ScoreConfig::from_yaml("transpose: 2\noptimise: true").unwrap();
        let mut head = Head::parse("T0 C5\nT0  D5\n");
        config.apply(&mut head);
        assert_eq!(head.to_text(), "T0 D5\nE5\n");
    }
}
