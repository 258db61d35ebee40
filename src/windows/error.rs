use serde::Serialize;

/// Failure delivering a command to the window host.
///
/// Never surfaced to bridge callers: the dispatcher logs it and moves on.
#[cfg_attr(feature = "typegen", derive(specta::Type))]
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TransportError {
    #[error("Closed: host transport is closed")]
    Closed,
    #[error("Encode: {message}")]
    Encode { message: String },
    #[error("Io: {message}")]
    Io { message: String },
    #[error("Rejected: {command}: {message}")]
    Rejected {
        command: &'static str,
        message: String,
    },
}

impl TransportError {
    pub fn rejected(command: &'static str, message: impl Into<String>) -> Self {
        Self::Rejected {
            command,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encode {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        if matches!(
            err.kind(),
            std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::ConnectionReset
        ) {
            return Self::Closed;
        }
        Self::Io {
            message: err.to_string(),
        }
    }
}
