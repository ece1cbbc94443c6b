use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReporterError {
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ReporterError {
    /// Short error code string, used as a structured log field.
    pub fn code(&self) -> &'static str {
        match self {
            ReporterError::Config(_) => "CONFIG_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, ReporterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_carries_code_and_message() {
        let err = ReporterError::Config("api.token must not be empty".into());
        assert_eq!(err.code(), "CONFIG_ERROR");
        assert_eq!(
            err.to_string(),
            "Configuration error: api.token must not be empty"
        );
    }
}
