//! Error types for DIMSE operations

use thiserror::Error;

/// Result type alias for DIMSE operations
pub type Result<T> = std::result::Result<T, DimseError>;

/// Error types that can occur during DIMSE operations
///
/// Transport implementations translate their native status codes into these
/// variants. `Timeout`, `PeerClosed`, `AssociationRejected` and
/// `NegotiationAborted` are expected conditions the commitment workflows react
/// to; everything else is fatal for the association at hand.
#[derive(Error, Debug)]
pub enum DimseError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),

    #[error("DICOM object error: {0}")]
    DicomObject(String),

    #[error("Timeout occurred: {0}")]
    Timeout(String),

    #[error("Association closed by peer")]
    PeerClosed,

    #[error("Association rejected: {0}")]
    AssociationRejected(String),

    #[error("Association negotiation aborted: {0}")]
    NegotiationAborted(String),

    #[error("Invalid AE Title: {0}")]
    InvalidAeTitle(String),

    #[error("DIMSE operation failed: {0}")]
    OperationFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DimseError {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new operation failed error
    pub fn operation_failed(msg: impl Into<String>) -> Self {
        Self::OperationFailed(msg.into())
    }

    /// Create a new timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a new DICOM object error
    pub fn dicom_object(msg: impl Into<String>) -> Self {
        Self::DicomObject(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error is a wait that ran out of time
    pub fn is_timeout(&self) -> bool {
        matches!(self, DimseError::Timeout(_))
    }

    /// Check if this error is recoverable
    ///
    /// Recoverable errors leave the caller free to keep waiting or listening;
    /// the remaining kinds end the current association.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DimseError::Timeout(_)
                | DimseError::AssociationRejected(_)
                | DimseError::NegotiationAborted(_)
        )
    }
}
