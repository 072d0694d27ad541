use thiserror::Error;

pub type LeadboardResult<T> = Result<T, LeadboardError>;

#[derive(Error, Debug)]
pub enum LeadboardError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Missing column '{column}' in {table} table")]
    MissingColumn { table: &'static str, column: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl LeadboardError {
    /// True when the dataset itself breaks the data contract, as opposed to
    /// an environment or configuration failure.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::MissingColumn { .. })
    }
}

impl From<config::ConfigError> for LeadboardError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_classification() {
        assert!(LeadboardError::InvalidInput("bad period".into()).is_invalid_input());
        assert!(LeadboardError::MissingColumn {
            table: "leads",
            column: "Valor total".into()
        }
        .is_invalid_input());
        assert!(!LeadboardError::Config("missing file".into()).is_invalid_input());
    }

    #[test]
    fn test_missing_column_message() {
        let err = LeadboardError::MissingColumn {
            table: "investment",
            column: "PERIODO".into(),
        };
        assert_eq!(err.to_string(), "Missing column 'PERIODO' in investment table");
    }
}
