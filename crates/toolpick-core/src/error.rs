use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreError {
    /// A tool or scenario record carries a value outside its attribute's
    /// declared domain. Raised before any arithmetic, never clamped away.
    #[error("invalid record: {0}")]
    Validation(String),

    /// A scenario configuration that makes scoring meaningless, such as
    /// all-zero attribute weights.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Caller-supplied input that cannot be scored, such as a submission
    /// timestamp earlier than the presentation timestamp.
    #[error("invalid input: {0}")]
    Input(String),
}
