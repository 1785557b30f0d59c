//! Scientific-name mention extraction from free text.
//!
//! Rule-based and tiered: no model, just patterns plus a keyword gate.
//! Candidates are then resolved one by one against a species catalog.

pub mod extractor;
pub mod resolver;

pub use extractor::{ExtractorConfig, MentionExtractor};
pub use resolver::MentionResolver;

pub type Result<T> = std::result::Result<T, NerError>;

#[derive(Debug, thiserror::Error)]
pub enum NerError {
    #[error("Pattern compilation failed: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Invalid extractor configuration: {0}")]
    InvalidConfig(String),
}
