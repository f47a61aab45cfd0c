//! # Error Types
//!
//! The chord engine and score model never fail: unreadable chords come back
//! as `None` or an empty name, and out-of-range values are clamped. Errors
//! only arise at the edges, when loading configuration or reading files.
//!
//! ## Error Types
//! - `Io` - a file could not be read or written
//! - `Config` - invalid YAML configuration
//! - `InvalidArgument` - a value given on the command line or in the
//!   configuration does not make sense
//!
//! ## Usage
//! ```rust
//! use chordscore::{ScoreConfig, ScoreError};
//!
//! match ScoreConfig::from_yaml("transpose: [1, 2]") {
//!     Ok(config) => println!("{:?}", config),
//!     Err(ScoreError::Config(message)) => eprintln!("Bad config: {}", message),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoreError {
    /// File access error.
    #[error("Cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration.
    ///
    /// # Example
    /// ```
    /// # use chordscore::ScoreError;
    /// let err = ScoreError::Config("unknown field `tempo`".to_string());
    /// assert_eq!(err.to_string(), "Invalid config: unknown field `tempo`");
    /// ```
    #[error("Invalid config: {0}")]
    Config(String),

    /// A value that cannot be used.
    ///
    /// # Example
    /// ```
    /// # use chordscore::ScoreError;
    /// let err = ScoreError::InvalidArgument {
    ///     arg: "limit".to_string(),
    ///     message: "'X9' is not a note".to_string(),
    /// };
    /// assert_eq!(err.to_string(), "Invalid limit: 'X9' is not a note");
    /// ```
    #[error("Invalid {arg}: {message}")]
    InvalidArgument { arg: String, message: String },
}

pub type Result<T> = std::result::Result<T, ScoreError>;
