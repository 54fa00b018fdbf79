/// Errors that can occur across the Faultline platform.
///
/// Each variant wraps a specific error domain. Library crates use this type
/// directly; the binary crate converts to `miette` diagnostics at the boundary.
///
/// # Examples
///
/// ```
/// use faultline_core::FaultlineError;
///
/// let err = FaultlineError::Config("unknown template version".into());
/// assert!(err.to_string().contains("unknown template version"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum FaultlineError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A hunk header's declared counts cannot be reconciled with the lines
    /// that follow it. Recoverable only through lenient parsing.
    #[error("malformed diff: {0}")]
    MalformedDiff(String),

    /// The diff contains no added line in any policy-eligible file.
    ///
    /// This is a legitimate terminal condition for mutation: there is
    /// nothing the engine could rewrite, fallback included.
    #[error("no policy-eligible added lines in diff")]
    NoEligibleLines,

    /// The requested mutation kind/style pair is not recognized.
    #[error("unsupported mutation: kind `{kind}` with style `{style}`")]
    UnsupportedPattern {
        /// The requested kind, as given by the caller.
        kind: String,
        /// The requested style, as given by the caller.
        style: String,
    },

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
