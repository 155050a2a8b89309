//! Waiting for the remote node to deliver results on an association of its own

use dimse::{DimseError, RejectReason, ServiceProfile};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::commitment::event_report::{handle_event_report, MIN_READ_WAIT};
use crate::commitment::manager::{CommitmentManager, Family};
use crate::commitment::protocols::{abort, finish, ProtocolOutcome};
use crate::models::RequestDescriptor;

/// Listen until the target connects back and one event report has been handled.
///
/// Only the accept and the event-report exchange run under the family lock, and
/// one exchange is bounded by the DIMSE association timeout.
pub(crate) async fn await_results(
    manager: &CommitmentManager,
    family: Family,
    descriptor: &mut RequestDescriptor,
    deadline: Instant,
) -> ProtocolOutcome {
    let transport = manager.transport();
    let port = descriptor
        .callback_port
        .unwrap_or(manager.dimse_config().port);
    let cancel = manager.cancellation_token();
    let mut attempts: u64 = 0;

    info!(
        "Waiting for {} to deliver storage commitment results on port {}",
        descriptor.node, port
    );

    loop {
        let now = Instant::now();
        if now >= deadline {
            error!(
                "No storage commitment result from {} after {} listen attempt(s). \
                 Check that {} can reach this node on port {} and that it is configured \
                 for asynchronous storage commitment",
                descriptor.node, attempts, descriptor.node.host, port
            );
            return ProtocolOutcome::Failure;
        }

        attempts += 1;
        let listen_for = manager
            .config()
            .listen_timeout()
            .max(MIN_READ_WAIT)
            .min(deadline - now);
        let inbound = tokio::select! {
            _ = cancel.cancelled() => {
                warn!("Stopped waiting for storage commitment results from {}", descriptor.node);
                return ProtocolOutcome::Failure;
            }
            inbound = transport.wait_for_association(
                ServiceProfile::StorageCommitmentResults,
                &descriptor.node,
                port,
                listen_for,
            ) => inbound,
        };

        let association = match inbound {
            Ok(association) => association,
            Err(DimseError::Timeout(_)) => {
                debug!("No association from {} yet", descriptor.node);
                continue;
            }
            Err(e @ (DimseError::AssociationRejected(_) | DimseError::NegotiationAborted(_))) => {
                warn!(
                    "Ignoring inbound connection while waiting for {}: {}",
                    descriptor.node, e
                );
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(manager.config().reject_backoff()) => {}
                }
                continue;
            }
            Err(e) => {
                error!(
                    "Listening for storage commitment results from {} failed: {}",
                    descriptor.node, e
                );
                return ProtocolOutcome::Failure;
            }
        };

        let _guard = manager.lock_family(family).await;

        let reason = if cancel.is_cancelled() {
            Some(RejectReason::NoReasonGiven)
        } else if Instant::now() >= deadline {
            Some(RejectReason::TemporaryCongestion)
        } else {
            None
        };
        if let Some(reason) = reason {
            warn!(
                "Rejecting association {} from {}, no longer waiting for results",
                association, descriptor.node
            );
            if let Err(e) = transport.reject_association(association, reason).await {
                debug!("Rejecting {}: {}", association, e);
            }
            return ProtocolOutcome::Failure;
        }

        if let Err(e) = transport.accept_association(association).await {
            warn!(
                "Could not accept association {} from {}: {}",
                association, descriptor.node, e
            );
            abort(manager, association).await;
            continue;
        }

        let exchange_deadline = deadline.min(Instant::now() + manager.dimse_config().association_timeout());
        let wait = manager.event_wait(descriptor, false, exchange_deadline);
        let outcome =
            handle_event_report(transport, association, &mut descriptor.result, &wait).await;
        finish(manager, association, outcome).await;
        return outcome.into();
    }
}
