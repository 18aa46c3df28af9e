/// Convenience result type used across pixelcore.
pub type PixelResult<T> = Result<T, PixelError>;

/// Top-level error taxonomy used by codec and compositing APIs.
#[derive(thiserror::Error, Debug)]
pub enum PixelError {
    /// A decoded value fell outside its domain (e.g. palette index >= palette size).
    #[error("range fault: {0}")]
    Range(String),

    /// The input buffer ended before the profile's required byte count.
    #[error("truncated input: needed {needed} bytes, {available} available")]
    TruncatedInput {
        /// Bytes the decode needed.
        needed: usize,
        /// Bytes the caller supplied.
        available: usize,
    },

    /// The target image lacks the colorspace or palette the layout requires.
    #[error("domain mismatch: {0}")]
    DomainMismatch(String),

    /// Invalid caller-provided configuration or arguments.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PixelError {
    /// Build a [`PixelError::Range`] value.
    pub fn range(msg: impl Into<String>) -> Self {
        Self::Range(msg.into())
    }

    /// Build a [`PixelError::TruncatedInput`] value.
    pub fn truncated(needed: usize, available: usize) -> Self {
        Self::TruncatedInput { needed, available }
    }

    /// Build a [`PixelError::DomainMismatch`] value.
    pub fn domain_mismatch(msg: impl Into<String>) -> Self {
        Self::DomainMismatch(msg.into())
    }

    /// Build a [`PixelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Fault class of this error.
    pub fn kind(&self) -> FaultKind {
        match self {
            Self::Range(_) => FaultKind::Range,
            Self::TruncatedInput { .. } => FaultKind::TruncatedInput,
            Self::DomainMismatch(_) => FaultKind::DomainMismatch,
            Self::Validation(_) | Self::Other(_) => FaultKind::Other,
        }
    }

    /// Convert into an accumulated [`Diagnostic`].
    pub fn to_diagnostic(&self) -> Diagnostic {
        let kind = self.kind();
        Diagnostic {
            severity: kind.severity(),
            kind,
            message: self.to_string(),
        }
    }
}

/// Fault classes reported through the diagnostics channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// Out-of-domain value, recovered by substitution.
    Range,
    /// Input ended early; the buffer was not decoded.
    TruncatedInput,
    /// Layout/operator requires a colorspace or palette the image lacks.
    DomainMismatch,
    /// Anything else (row access failures, wrapped errors).
    Other,
}

impl FaultKind {
    /// Default severity for this fault class.
    pub fn severity(self) -> Severity {
        match self {
            Self::Range => Severity::Warning,
            Self::TruncatedInput | Self::DomainMismatch | Self::Other => Severity::Error,
        }
    }
}

/// Diagnostic severity.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Recoverable; output is still meaningful.
    Warning,
    /// The affected buffer or row was skipped.
    Error,
}

/// One caller-visible fault record.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Diagnostic {
    /// Severity.
    pub severity: Severity,
    /// Fault class.
    pub kind: FaultKind,
    /// Human-readable message.
    pub message: String,
}

impl Diagnostic {
    /// Build a warning-level range diagnostic.
    pub fn range(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            kind: FaultKind::Range,
            message: message.into(),
        }
    }
}

impl From<&PixelError> for Diagnostic {
    fn from(err: &PixelError) -> Self {
        err.to_diagnostic()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
