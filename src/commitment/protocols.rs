//! The per-target commitment workflows

use dimse::AssociationId;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::commitment::event_report::{handle_event_report, EventOutcome};
use crate::commitment::listener::await_results;
use crate::commitment::manager::{CommitmentManager, Family};
use crate::commitment::request::send_commit_request;
use crate::models::{CommitStrategy, RequestDescriptor};

/// Result of one worker's workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolOutcome {
    Success,
    Failure,
}

impl From<EventOutcome> for ProtocolOutcome {
    fn from(outcome: EventOutcome) -> Self {
        match outcome {
            EventOutcome::Success => ProtocolOutcome::Success,
            EventOutcome::Failure | EventOutcome::Timeout => ProtocolOutcome::Failure,
        }
    }
}

pub(crate) async fn run_protocol(
    manager: &CommitmentManager,
    strategy: CommitStrategy,
    descriptor: &mut RequestDescriptor,
    deadline: Instant,
) -> ProtocolOutcome {
    if !strategy.commits() {
        return ProtocolOutcome::Success;
    }
    if !descriptor.result.has_committable_files() {
        info!("Nothing to commit for {}", descriptor.node);
        return ProtocolOutcome::Success;
    }

    match strategy {
        CommitStrategy::Synchronous => synchronous(manager, descriptor, deadline).await,
        CommitStrategy::Asynchronous => asynchronous(manager, descriptor, deadline).await,
        CommitStrategy::Either => either(manager, descriptor, deadline).await,
        CommitStrategy::None => ProtocolOutcome::Success,
    }
}

async fn synchronous(
    manager: &CommitmentManager,
    descriptor: &mut RequestDescriptor,
    deadline: Instant,
) -> ProtocolOutcome {
    let _guard = manager.lock_family(Family::Synchronous).await;

    let Some(association) = request(manager, descriptor).await else {
        return ProtocolOutcome::Failure;
    };

    let wait = manager.event_wait(descriptor, false, deadline);
    let outcome = handle_event_report(
        manager.transport(),
        association,
        &mut descriptor.result,
        &wait,
    )
    .await;
    finish(manager, association, outcome).await;
    outcome.into()
}

async fn asynchronous(
    manager: &CommitmentManager,
    descriptor: &mut RequestDescriptor,
    deadline: Instant,
) -> ProtocolOutcome {
    {
        let _guard = manager.lock_family(Family::Asynchronous).await;
        let Some(association) = request(manager, descriptor).await else {
            return ProtocolOutcome::Failure;
        };
        // The remote node reports on an association of its own.
        close(manager, association).await;
    }

    await_results(manager, Family::Asynchronous, descriptor, deadline).await
}

async fn either(
    manager: &CommitmentManager,
    descriptor: &mut RequestDescriptor,
    deadline: Instant,
) -> ProtocolOutcome {
    {
        let _guard = manager.lock_family(Family::Either).await;
        let Some(association) = request(manager, descriptor).await else {
            return ProtocolOutcome::Failure;
        };

        let wait = manager.event_wait(descriptor, true, deadline);
        let outcome = handle_event_report(
            manager.transport(),
            association,
            &mut descriptor.result,
            &wait,
        )
        .await;

        if outcome != EventOutcome::Timeout {
            finish(manager, association, outcome).await;
            return outcome.into();
        }

        warn!(
            "{} did not send a synchronous commitment result within {:?}, waiting for it asynchronously",
            descriptor.node, descriptor.role_reversal_wait
        );
        close(manager, association).await;
    }

    info!(
        "Configure {} for asynchronous storage commitment to avoid the synchronous attempt",
        descriptor.node.ae_title
    );
    await_results(manager, Family::Either, descriptor, deadline).await
}

/// Send the request; the association is returned only if the remote accepted it
async fn request(
    manager: &CommitmentManager,
    descriptor: &mut RequestDescriptor,
) -> Option<AssociationId> {
    let outcome = send_commit_request(manager, descriptor).await;
    match (outcome.association, outcome.accepted) {
        (Some(association), true) => Some(association),
        (Some(association), false) => {
            abort(manager, association).await;
            None
        }
        (None, _) => None,
    }
}

/// Close after a completed exchange, abort after a failed one
pub(crate) async fn finish(
    manager: &CommitmentManager,
    association: AssociationId,
    outcome: EventOutcome,
) {
    match outcome {
        EventOutcome::Failure => abort(manager, association).await,
        EventOutcome::Success | EventOutcome::Timeout => close(manager, association).await,
    }
}

pub(crate) async fn close(manager: &CommitmentManager, association: AssociationId) {
    if let Err(e) = manager.transport().close_association(association).await {
        debug!("Closing {}: {}", association, e);
    }
}

pub(crate) async fn abort(manager: &CommitmentManager, association: AssociationId) {
    if let Err(e) = manager.transport().abort_association(association).await {
        debug!("Aborting {}: {}", association, e);
    }
}
