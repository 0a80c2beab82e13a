use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("FETCH_FAILED: {0}")]
    Fetch(String),
    #[error("NOT_FOUND: {0}")]
    NotFound(String),
    #[error("MALFORMED_RECORD: {0}")]
    MalformedRecord(String),
    #[error("VALIDATION_FAILED: {0}")]
    Validation(String),
    #[error("CONFIG_INVALID: {0}")]
    Config(String),
    #[error("IO_FAILURE: {0}")]
    Io(String),
    #[error("INTERNAL: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Fetch(_) => "FETCH_FAILED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::MalformedRecord(_) => "MALFORMED_RECORD",
            Self::Validation(_) => "VALIDATION_FAILED",
            Self::Config(_) => "CONFIG_INVALID",
            Self::Io(_) => "IO_FAILURE",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Internal(value.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Internal(value.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(value: serde_yaml::Error) -> Self {
        Self::Config(value.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(value: reqwest::Error) -> Self {
        Self::Fetch(value.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::AppError;

    #[test]
    fn display_carries_stable_code_prefix() {
        let error = AppError::Fetch("connection reset".to_string());
        assert_eq!(error.code(), "FETCH_FAILED");
        assert!(error.to_string().starts_with("FETCH_FAILED: "));
    }
}
