/// Result alias that carries the custom [`RibbonError`] type.
pub type Result<T> = std::result::Result<T, RibbonError>;

/// Common error type for the core crate.
///
/// Every variant raised during a recomputation pass is local to that pass:
/// the output buffers are never touched once one of them has been produced.
#[derive(Debug, thiserror::Error)]
pub enum RibbonError {
    /// Two samples used for a tangent estimate coincide.
    #[error("degenerate curve: zero-length tangent at sample {index}")]
    DegenerateCurve { index: usize },
    /// The requested sample count no longer matches the allocated buffers.
    #[error("buffer capacity mismatch: allocated for {expected} samples, asked for {actual}")]
    CapacityMismatch { expected: usize, actual: usize },
    #[error("invalid gradient: {0}")]
    InvalidGradient(String),
    #[error("curve needs at least {min} samples, got {actual}")]
    TooFewSamples { min: usize, actual: usize },
    #[error("invalid value {value} for parameter `{name}`")]
    InvalidParameter { name: &'static str, value: f64 },
    #[error("unknown parameter `{0}`")]
    UnknownParameter(String),
    #[error("invalid color `{0}`, expected #rrggbb")]
    InvalidColor(String),
    /// A shared lock was poisoned by a panicking writer.
    #[error("{0} has been poisoned")]
    Poisoned(&'static str),
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl RibbonError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for RibbonError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for RibbonError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
