//! # Error Types Module
//!
//! Domain errors raised by tutoring operations. Each variant maps to a
//! localization key so handlers can explain the failure to the user.

/// Custom error types for bot operations
#[derive(Debug, Clone, PartialEq)]
pub enum BotError {
    /// The Telegram account is not bound to any user
    NotRegistered,
    /// The user exists but may not perform the action
    AccessDenied,
    /// A referenced row does not exist
    NotFound(&'static str, i64),
    /// User input failed validation; holds the localization key
    InvalidInput(&'static str),
    /// The requested change is not allowed from the current state
    InvalidState(String),
    /// Storage or transport failure
    Internal(String),
}

impl BotError {
    /// Localization key describing this error to the user
    pub fn message_key(&self) -> &'static str {
        match self {
            BotError::NotRegistered => "error-not-registered",
            BotError::AccessDenied => "error-access-denied",
            BotError::NotFound(..) => "error-not-found",
            BotError::InvalidInput(key) => key,
            BotError::InvalidState(_) => "error-invalid-state",
            BotError::Internal(_) => "error-generic",
        }
    }
}

impl std::fmt::Display for BotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BotError::NotRegistered => write!(f, "User is not registered"),
            BotError::AccessDenied => write!(f, "Access denied"),
            BotError::NotFound(entity, id) => write!(f, "{entity} {id} not found"),
            BotError::InvalidInput(key) => write!(f, "Invalid input: {key}"),
            BotError::InvalidState(msg) => write!(f, "Invalid state: {msg}"),
            BotError::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for BotError {}

impl From<anyhow::Error> for BotError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<BotError>() {
            Ok(bot_error) => bot_error,
            Err(other) => BotError::Internal(format!("{other:#}")),
        }
    }
}

impl From<sqlx::Error> for BotError {
    fn from(err: sqlx::Error) -> Self {
        BotError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(BotError::NotFound("lesson", 7).to_string(), "lesson 7 not found");
        assert_eq!(BotError::AccessDenied.to_string(), "Access denied");
    }

    #[test]
    fn test_anyhow_roundtrip_keeps_variant() {
        let err: anyhow::Error = BotError::AccessDenied.into();
        assert_eq!(BotError::from(err), BotError::AccessDenied);

        let err = anyhow::anyhow!("disk full");
        assert!(matches!(BotError::from(err), BotError::Internal(msg) if msg.contains("disk full")));
    }

    #[test]
    fn test_message_keys() {
        assert_eq!(BotError::InvalidInput("error-bad-date").message_key(), "error-bad-date");
        assert_eq!(BotError::NotRegistered.message_key(), "error-not-registered");
    }
}
