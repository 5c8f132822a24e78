use thiserror::Error;

#[derive(Debug, Error)]
pub enum MortgageSimError {
    #[error("Invalid input: {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Not eligible: {0}")]
    Eligibility(String),

    #[error("Not affordable: {0}")]
    Affordability(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl MortgageSimError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        MortgageSimError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// HTTP-style status for the failure: 400 for anything the caller can
    /// fix by changing the request, 500 otherwise.
    pub fn status_code(&self) -> u16 {
        if self.is_client_error() {
            400
        } else {
            500
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            MortgageSimError::Validation { .. }
                | MortgageSimError::Eligibility(_)
                | MortgageSimError::Affordability(_)
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MortgageSimError::Validation { .. } => "validation",
            MortgageSimError::Eligibility(_) => "eligibility",
            MortgageSimError::Affordability(_) => "affordability",
            MortgageSimError::Internal(_) => "internal",
            MortgageSimError::Serialization(_) => "serialization",
        }
    }
}

impl From<serde_json::Error> for MortgageSimError {
    fn from(e: serde_json::Error) -> Self {
        MortgageSimError::Serialization(e.to_string())
    }
}
