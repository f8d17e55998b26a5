use crate::retry::{classify_error, ErrorType};

/// Why an utterance produced no plan
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("completion request failed: {0:#}")]
    Transport(anyhow::Error),

    #[error("completion request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("completion service returned an empty response")]
    EmptyResponse,

    #[error("response is not a JSON or literal object: {raw}")]
    Syntax { raw: String },

    #[error("response is not a plan: {0}")]
    Structure(String),
}

impl PlanError {
    /// Whether another attempt could succeed. Parse failures never qualify:
    /// a deterministic model repeats them.
    pub fn is_recoverable(&self) -> bool {
        match self {
            PlanError::Transport(e) => matches!(classify_error(e), ErrorType::Recoverable(_)),
            PlanError::Timeout { .. } => true,
            PlanError::EmptyResponse | PlanError::Syntax { .. } | PlanError::Structure(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_recoverable_kinds() {
        assert!(PlanError::Transport(anyhow!("HTTP 503 Service Unavailable")).is_recoverable());
        assert!(PlanError::Transport(anyhow!("connection refused")).is_recoverable());
        assert!(PlanError::Timeout { seconds: 30 }.is_recoverable());

        assert!(!PlanError::Transport(anyhow!("Invalid API key")).is_recoverable());
        assert!(!PlanError::EmptyResponse.is_recoverable());
        assert!(!PlanError::Syntax { raw: "nope".into() }.is_recoverable());
        assert!(!PlanError::Structure("missing steps".into()).is_recoverable());
    }

    #[test]
    fn test_display_keeps_context_chain() {
        let err = PlanError::Transport(anyhow!("503").context("Gemini request failed"));
        assert_eq!(
            err.to_string(),
            "completion request failed: Gemini request failed: 503"
        );
    }
}
