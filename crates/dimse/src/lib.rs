//! DIMSE (DICOM Message Service Element) boundary for storage commitment
//!
//! This crate defines everything the commitment workflows need from a DICOM
//! networking stack without implementing the upper layer itself.
//!
//! # Features
//! - N-ACTION / N-EVENT-REPORT message model over `dicom-object` data sets
//! - DIMSE status codes and their PS3.7 interpretation
//! - The [`AssociationTransport`] seam for association lifecycle and message exchange
//! - A scripted in-memory transport for tests (feature = "mock")

pub mod config;
pub mod error;
pub mod transport;
pub mod types;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export commonly used types
pub use config::{DimseConfig, RemoteNode};
pub use error::{DimseError, Result};
pub use transport::{AssociationTransport, RejectReason};
pub use types::{AssociationId, DimseCommand, DimseMessage, DimseStatus, ServiceProfile};

/// Default DICOM port (non-TLS)
pub const DEFAULT_DIMSE_PORT: u16 = 11112;
