//! Error types and handling for mediasync
//!
//! Errors fall into three classes that the reconciler treats differently:
//! transient host errors (network, timeout, malformed response) are isolated
//! to one host and retried next cycle, index mutation errors abort one host's
//! state update, and configuration errors are fatal at startup.

use std::time::Duration;

/// Error severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Low severity - operation can continue
    Low,
    /// Medium severity - the affected host is retried next cycle
    Medium,
    /// High severity - the operation should be aborted
    High,
    /// Critical severity - the process cannot start
    Critical,
}

/// Main error type for mediasync operations
#[derive(thiserror::Error, Debug, Clone)]
pub enum Error {
    /// A host could not be reached or returned an error status
    #[error("Network error: {message}")]
    Network {
        /// Error message describing the network issue
        message: String,
    },

    /// A host did not answer within the allotted time
    #[error("Operation timed out after {duration:?}")]
    Timeout {
        /// The timeout that elapsed
        duration: Duration,
    },

    /// A host answered with a body that does not follow the wire contract
    #[error("Malformed response: {message}")]
    MalformedResponse {
        /// Error message describing what was wrong with the response
        message: String,
    },

    /// The index rejected an add or remove
    #[error("Index mutation failed: {message}")]
    IndexMutation {
        /// Error message from the index store
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message describing the configuration issue
        message: String,
    },

    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        /// Error message from the I/O operation
        message: String,
    },

    /// Encoding or decoding of persisted data failed
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message from the serializer
        message: String,
    },

    /// Generic error with custom message
    #[error("{message}")]
    Other {
        /// Custom error message
        message: String,
    },
}

/// Error kind for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network errors
    Network,
    /// Timeouts
    Timeout,
    /// Malformed host responses
    MalformedResponse,
    /// Index mutation errors
    IndexMutation,
    /// Configuration errors
    Config,
    /// I/O related errors
    Io,
    /// Serialization errors
    Serialization,
    /// Other errors
    Other,
}

impl Error {
    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network { .. } => ErrorKind::Network,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::MalformedResponse { .. } => ErrorKind::MalformedResponse,
            Self::IndexMutation { .. } => ErrorKind::IndexMutation,
            Self::Config { .. } => ErrorKind::Config,
            Self::Io { .. } => ErrorKind::Io,
            Self::Serialization { .. } => ErrorKind::Serialization,
            Self::Other { .. } => ErrorKind::Other,
        }
    }

    /// Get the error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Network { .. } | Self::Timeout { .. } | Self::MalformedResponse { .. } => {
                ErrorSeverity::Medium
            }
            Self::IndexMutation { .. } => ErrorSeverity::Medium,
            Self::Config { .. } => ErrorSeverity::Critical,
            Self::Io { .. } | Self::Serialization { .. } => ErrorSeverity::High,
            Self::Other { .. } => ErrorSeverity::Medium,
        }
    }

    /// Whether this error belongs to a single host's transport and is
    /// expected to clear up on a later cycle
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Timeout { .. } | Self::MalformedResponse { .. }
        )
    }

    /// Check if the failed work should be attempted again on the next cycle
    pub fn should_retry(&self) -> bool {
        self.is_transient() || matches!(self, Self::IndexMutation { .. })
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout(duration: Duration) -> Self {
        Self::Timeout { duration }
    }

    /// Create a new malformed response error
    pub fn malformed<S: Into<String>>(message: S) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    /// Create a new index mutation error
    pub fn index_mutation<S: Into<String>>(message: S) -> Self {
        Self::IndexMutation {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new serialization error
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    proptest! {
        #[test]
        fn test_error_kind_consistency(message in ".*") {
            let errors = vec![
                Error::network(message.clone()),
                Error::malformed(message.clone()),
                Error::index_mutation(message.clone()),
                Error::config(message.clone()),
                Error::serialization(message.clone()),
                Error::other(message.clone()),
            ];

            for error in errors {
                let kind = error.kind();
                match error {
                    Error::Network { .. } => prop_assert_eq!(kind, ErrorKind::Network),
                    Error::MalformedResponse { .. } => prop_assert_eq!(kind, ErrorKind::MalformedResponse),
                    Error::IndexMutation { .. } => prop_assert_eq!(kind, ErrorKind::IndexMutation),
                    Error::Config { .. } => prop_assert_eq!(kind, ErrorKind::Config),
                    Error::Serialization { .. } => prop_assert_eq!(kind, ErrorKind::Serialization),
                    Error::Other { .. } => prop_assert_eq!(kind, ErrorKind::Other),
                    _ => {}
                }
            }
        }

        #[test]
        fn test_transient_errors_are_retried(message in ".*") {
            for error in [Error::network(message.clone()), Error::malformed(message.clone())] {
                prop_assert!(error.is_transient());
                prop_assert!(error.should_retry());
                prop_assert!(error.severity() <= ErrorSeverity::Medium);
            }
        }

        #[test]
        fn test_timeout_error_properties(millis in 1u64..3_600_000u64) {
            let error = Error::timeout(Duration::from_millis(millis));

            prop_assert_eq!(error.kind(), ErrorKind::Timeout);
            prop_assert_eq!(error.severity(), ErrorSeverity::Medium);
            prop_assert!(error.is_transient());
        }
    }

    #[rstest]
    #[case(Error::network("connection refused"), "Network error: connection refused")]
    #[case(Error::malformed("bad json"), "Malformed response: bad json")]
    #[case(Error::config("no hosts"), "Configuration error: no hosts")]
    fn test_error_display(#[case] error: Error, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[test]
    fn test_error_severity_ordering() {
        assert!(ErrorSeverity::Low < ErrorSeverity::Medium);
        assert!(ErrorSeverity::Medium < ErrorSeverity::High);
        assert!(ErrorSeverity::High < ErrorSeverity::Critical);
    }

    #[test]
    fn test_index_mutation_is_retried_but_not_transient() {
        let error = Error::index_mutation("disk full");

        assert!(!error.is_transient());
        assert!(error.should_retry());
        assert!(error.to_string().contains("disk full"));
    }

    #[test]
    fn test_config_error_is_fatal() {
        let error = Error::config("invalid host URL");

        assert_eq!(error.kind(), ErrorKind::Config);
        assert_eq!(error.severity(), ErrorSeverity::Critical);
        assert!(!error.should_retry());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "index.json");
        let error = Error::from(io_error);

        assert_eq!(error.kind(), ErrorKind::Io);
        assert!(error.to_string().contains("index.json"));
    }
}
