//! Association transport seam
//!
//! The commitment workflows drive associations exclusively through
//! [`AssociationTransport`]. Implementations wrap a DICOM upper-layer stack and
//! translate its native status codes into [`DimseError`](crate::DimseError):
//!
//! - a wait that elapses without data is `Timeout`
//! - a release or abort received from the remote side is `PeerClosed`
//! - an inbound connection from an unexpected host or AE title is
//!   `AssociationRejected`
//! - an inbound negotiation that failed half-way is `NegotiationAborted`
//!
//! Anything else is reported as a fatal error kind.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::RemoteNode;
use crate::types::{AssociationId, DimseMessage, DimseStatus, ServiceProfile};
use crate::Result;

/// Reason given when refusing an inbound association
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The local side is shutting down
    NoReasonGiven,
    /// The association arrived too late to be served
    TemporaryCongestion,
}

/// Association lifecycle and message exchange used by the commitment workflows
#[async_trait]
pub trait AssociationTransport: Send + Sync {
    /// Open an association to `node`, negotiating `profile`
    async fn open_association(
        &self,
        node: &RemoteNode,
        profile: ServiceProfile,
    ) -> Result<AssociationId>;

    /// Wait up to `timeout` for `peer` to open an association on `port`
    ///
    /// The returned association has completed negotiation but has not been
    /// accepted yet.
    async fn wait_for_association(
        &self,
        profile: ServiceProfile,
        peer: &RemoteNode,
        port: u16,
        timeout: Duration,
    ) -> Result<AssociationId>;

    /// Accept an association returned by [`wait_for_association`](Self::wait_for_association)
    async fn accept_association(&self, id: AssociationId) -> Result<()>;

    /// Refuse an association returned by [`wait_for_association`](Self::wait_for_association)
    async fn reject_association(&self, id: AssociationId, reason: RejectReason) -> Result<()>;

    /// Send a request message
    async fn send_request(&self, id: AssociationId, message: DimseMessage) -> Result<()>;

    /// Read the next message, waiting up to `timeout`
    async fn read_message(&self, id: AssociationId, timeout: Duration) -> Result<DimseMessage>;

    /// Send a response message carrying `status`
    async fn send_response(
        &self,
        id: AssociationId,
        status: DimseStatus,
        message: DimseMessage,
    ) -> Result<()>;

    /// Release the association gracefully
    async fn close_association(&self, id: AssociationId) -> Result<()>;

    /// Abort the association
    async fn abort_association(&self, id: AssociationId) -> Result<()>;
}
