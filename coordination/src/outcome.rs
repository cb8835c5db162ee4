use crate::error::SessionError;

/// What a phase handler reports back to the orchestrator.
///
/// Transient API failures are absorbed inside the handler and surface as
/// `Retry` at most; only `Session` and `Fatal` escalate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// The handler did its work; poll the next phase.
    Continue,
    /// A transient failure cut the handler short; poll again and re-enter.
    Retry,
    /// Restart the client instance.
    Session(SessionError),
    /// Stop the whole process.
    Fatal(String),
}

impl From<SessionError> for HandlerOutcome {
    fn from(err: SessionError) -> Self {
        Self::Session(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_error_converts_to_restart() {
        let outcome: HandlerOutcome = SessionError::StatsTimeout { polls: 60 }.into();
        assert_eq!(
            outcome,
            HandlerOutcome::Session(SessionError::StatsTimeout { polls: 60 })
        );
    }
}
