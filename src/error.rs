use thiserror::Error;

/// Exit code for configuration and local I/O failures.
pub const EXIT_CONFIG: u8 = 2;
/// Exit code for records that break the pipeline's data contract.
pub const EXIT_PIPELINE: u8 = 3;
/// Exit code for data-source failures (HTTP, decoding).
pub const EXIT_SOURCE: u8 = 4;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Fatal data-contract violations raised by the reshaping pipeline.
///
/// Any of these aborts the run before anything reaches a sink.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("Unknown production group '{label}': not present in the taxonomy table")]
    UnknownCategory { label: String },

    #[error("Unknown price area '{region}': not in the configured regions")]
    UnknownRegion { region: String },

    #[error("Unknown connected area '{interconnection}': not in the configured interconnections")]
    UnknownInterconnection { interconnection: String },

    #[error("Emission schema mismatch: {detail}")]
    SchemaMismatch { detail: String },

    #[error("Invalid hour timestamp '{raw}': {reason}")]
    InvalidTimestamp { raw: String, reason: String },
}

impl PipelineError {
    pub(crate) fn schema(detail: impl Into<String>) -> Self {
        PipelineError::SchemaMismatch {
            detail: detail.into(),
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        AppError::new(EXIT_PIPELINE, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_errors_map_to_pipeline_exit_code() {
        let err: AppError = PipelineError::UnknownCategory {
            label: "Tidevand".to_string(),
        }
        .into();
        assert_eq!(err.exit_code(), EXIT_PIPELINE);
        assert!(err.to_string().contains("Tidevand"));
    }
}
