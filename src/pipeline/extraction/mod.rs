pub mod types;
pub mod sanitize;
pub mod aliases;
pub mod coerce;
pub mod patterns;
pub mod table_detect;
pub mod line_kv;
pub mod keyword;
pub mod numeric;
pub mod canonical;
pub mod orchestrator;

pub use types::*;
pub use sanitize::*;
pub use aliases::AliasTable;
pub use coerce::{coerce, coerce_str, try_coerce};
pub use patterns::PatternSet;
pub use canonical::{assemble_samples, canonicalize, CanonicalSample};
pub use orchestrator::*;

use thiserror::Error;

/// Why a token could not be read as a number.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoercionError {
    #[error("Empty value")]
    Empty,

    #[error("Not a number: {0:?}")]
    NotNumeric(String),

    #[error("Number followed by unrecognized text: {0:?}")]
    TrailingText(String),

    #[error("Value is not finite")]
    NonFinite,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Unknown report domain: {0}")]
pub struct DomainParseError(pub String);

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Parser worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}
