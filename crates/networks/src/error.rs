// ---------------------------------------------------------------------------
// NetworkError: wiring and snapshot errors surfaced by the network manager
// ---------------------------------------------------------------------------

use std::fmt;

use crate::connection::Connection;

/// Errors returned by [`NetworkManager`](crate::network_manager::NetworkManager).
///
/// Operations on points that are not members are *not* errors; they are
/// no-ops. These variants indicate integration mistakes or corrupt input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// The connection was never configured on the manager.
    UnknownConnection(Connection),
    /// A passer is already registered for this connection.
    DuplicatePasser(Connection),
    /// A membership snapshot could not be decoded.
    Decode(String),
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::UnknownConnection(c) => {
                write!(f, "Unknown connection '{c}': configure it before use")
            }
            NetworkError::DuplicatePasser(c) => {
                write!(f, "A passer is already registered for connection '{c}'")
            }
            NetworkError::Decode(msg) => write!(f, "Snapshot decoding error: {msg}"),
        }
    }
}

impl std::error::Error for NetworkError {}

impl From<bitcode::Error> for NetworkError {
    fn from(e: bitcode::Error) -> Self {
        NetworkError::Decode(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_unknown_connection() {
        let err = NetworkError::UnknownConnection(Connection::new("gas"));
        let msg = format!("{err}");
        assert!(msg.contains("Unknown connection"), "got: {msg}");
        assert!(msg.contains("gas"), "got: {msg}");
    }

    #[test]
    fn test_display_duplicate_passer() {
        let err = NetworkError::DuplicatePasser(Connection::new("power"));
        let msg = format!("{err}");
        assert!(msg.contains("already registered"), "got: {msg}");
    }

    #[test]
    fn test_is_error_trait() {
        let err: Box<dyn std::error::Error> = Box::new(NetworkError::Decode("eof".into()));
        assert!(err.to_string().contains("eof"));
    }
}
