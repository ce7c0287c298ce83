//! CLI errors and the exit code each one maps to.
//!
//! | code | meaning |
//! |------|---------|
//! | 0    | success |
//! | 2    | argument parse error (reported by clap) |
//! | 10   | scene, physics or render parameters rejected by the library |
//! | 11   | a scene file or snapshot could not be read or written |
//! | 12   | malformed JSON in a flag or scene file |
//! | 13   | results could not be encoded as JSON |

use charge_field_core::FieldError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// The library rejected the scene or its parameters.
    #[error(transparent)]
    Field(FieldError),

    #[error("{0}")]
    Io(String),

    /// Flag or scene-file text that is not the JSON we expect.
    #[error("{0}")]
    Input(String),

    #[error("cannot encode output: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Field(_) => 10,
            CliError::Io(_) => 11,
            CliError::Input(_) => 12,
            CliError::Serialization(_) => 13,
        }
    }
}

/// Snapshot write failures surface from the render crate as `FieldError::Io`
/// and keep the I/O exit code.
impl From<FieldError> for CliError {
    fn from(e: FieldError) -> Self {
        match e {
            FieldError::Io(msg) => CliError::Io(msg),
            other => CliError::Field(other),
        }
    }
}
