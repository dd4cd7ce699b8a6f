use thiserror::Error;

use crate::model::RunStatus;

pub type ConsoleResult<T> = Result<T, ConsoleError>;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("microphone permission denied: {0}")]
    PermissionDenied(String),

    #[error("a capture is already in progress")]
    AlreadyRecording,

    #[error("no capture in progress to submit")]
    NotRecording,

    #[error("cannot move from {from} to {to} here")]
    InvalidTransition { from: RunStatus, to: RunStatus },

    #[error("invalid simulator config: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::ConsoleError;
    use crate::model::RunStatus;

    #[test]
    fn display_messages_carry_detail() {
        let denied = ConsoleError::PermissionDenied("user rejected the prompt".to_string());
        assert!(denied.to_string().contains("user rejected"));

        let transition = ConsoleError::InvalidTransition {
            from: RunStatus::Processing,
            to: RunStatus::Recording,
        };
        let text = transition.to_string();
        assert!(text.contains("processing"), "got: {text}");
        assert!(text.contains("recording"), "got: {text}");

        let config = ConsoleError::InvalidConfig("tick interval must be non-zero".to_string());
        assert!(config.to_string().contains("tick interval"));
    }

    #[test]
    fn console_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<ConsoleError>();
        assert_sync::<ConsoleError>();
    }
}
