use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

use dimse::{AssociationTransport, DimseConfig};
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};

use crate::commitment::event_report::EventWait;
use crate::commitment::protocols::{run_protocol, ProtocolOutcome};
use crate::commitment::transaction::TransactionUidGenerator;
use crate::commitment::worker::WorkerHandle;
use crate::config::{CommitmentConfig, Config};
use crate::error::CommitError;
use crate::models::{CommitStrategy, RequestDescriptor};

/// Protocol families; workers of one family serialize their DIMSE exchanges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Family {
    Synchronous,
    Asynchronous,
    Either,
}

#[derive(Debug, Default)]
struct FamilyLocks {
    synchronous: Mutex<()>,
    asynchronous: Mutex<()>,
    either: Mutex<()>,
}

/// Owns the transport, the settings and the per-family locks shared by all workers
pub struct CommitmentManager {
    transport: Arc<dyn AssociationTransport>,
    dimse: DimseConfig,
    config: CommitmentConfig,
    uids: TransactionUidGenerator,
    locks: FamilyLocks,
    message_ids: AtomicU16,
    cancel: CancellationToken,
}

impl CommitmentManager {
    pub fn new(
        transport: Arc<dyn AssociationTransport>,
        dimse: DimseConfig,
        config: CommitmentConfig,
    ) -> Self {
        let uids = TransactionUidGenerator::new(
            config.transaction_uid_root.clone(),
            config.device_type,
            config.device_serial,
        );
        Self {
            transport,
            dimse,
            config,
            uids,
            locks: FamilyLocks::default(),
            message_ids: AtomicU16::new(1),
            cancel: CancellationToken::new(),
        }
    }

    /// Build a manager from a configuration file's `[dimse]` and `[commitment]` sections
    pub fn from_config(
        transport: Arc<dyn AssociationTransport>,
        config: &Config,
    ) -> Result<Self, CommitError> {
        config.validate()?;
        Ok(Self::new(
            transport,
            config.dimse.clone(),
            config.commitment.clone(),
        ))
    }

    pub fn transport(&self) -> &dyn AssociationTransport {
        self.transport.as_ref()
    }

    pub fn config(&self) -> &CommitmentConfig {
        &self.config
    }

    pub fn dimse_config(&self) -> &DimseConfig {
        &self.dimse
    }

    /// Token cancelled by [`shutdown`](Self::shutdown)
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop every wait of every running worker; affected workers finish with failure
    pub fn shutdown(&self) {
        info!("Cancelling outstanding storage commitment waits");
        self.cancel.cancel();
    }

    pub(crate) fn next_transaction_uid(&self) -> String {
        self.uids.next_uid()
    }

    pub(crate) fn next_message_id(&self) -> u16 {
        loop {
            let id = self.message_ids.fetch_add(1, Ordering::Relaxed);
            if id != 0 {
                return id;
            }
        }
    }

    pub(crate) async fn lock_family(&self, family: Family) -> MutexGuard<'_, ()> {
        match family {
            Family::Synchronous => self.locks.synchronous.lock().await,
            Family::Asynchronous => self.locks.asynchronous.lock().await,
            Family::Either => self.locks.either.lock().await,
        }
    }

    pub(crate) fn event_wait(
        &self,
        descriptor: &RequestDescriptor,
        adaptive: bool,
        deadline: Instant,
    ) -> EventWait {
        EventWait {
            wait: descriptor.role_reversal_wait,
            adaptive,
            deadline,
            cancel: self.cancel.clone(),
            verbose: descriptor.verbose,
        }
    }

    /// Start one worker per descriptor.
    ///
    /// Returns one handle per descriptor in input order, except for
    /// [`CommitStrategy::None`] which starts nothing and returns no handles.
    /// A descriptor with an invalid node or a zero role-reversal wait, or one
    /// whose worker cannot be started, gets a
    /// [`WorkerHandle::FailedToStart`] and the remaining ones are still dispatched.
    pub fn dispatch(
        self: &Arc<Self>,
        strategy: CommitStrategy,
        descriptors: Vec<RequestDescriptor>,
    ) -> Vec<WorkerHandle> {
        if !strategy.commits() {
            info!(
                "Storage commitment disabled, {} target(s) stored without commitment",
                descriptors.len()
            );
            return Vec::new();
        }

        let runtime = tokio::runtime::Handle::try_current();

        descriptors
            .into_iter()
            .map(|descriptor| {
                if let Err(e) = descriptor.node.validate() {
                    warn!("Not committing to {}: {}", descriptor.node, e);
                    return WorkerHandle::FailedToStart {
                        descriptor,
                        reason: e.to_string(),
                    };
                }

                if descriptor.role_reversal_wait.is_zero() {
                    warn!("Not committing to {}: role-reversal wait is zero", descriptor.node);
                    return WorkerHandle::FailedToStart {
                        descriptor,
                        reason: "role-reversal wait must be greater than zero".to_string(),
                    };
                }

                let runtime = match &runtime {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        warn!("Not committing to {}: no async runtime: {}", descriptor.node, e);
                        return WorkerHandle::FailedToStart {
                            descriptor,
                            reason: format!("no async runtime: {}", e),
                        };
                    }
                };

                let peer = descriptor.node.ae_title.clone();
                let span = info_span!("commitment", peer = %peer, strategy = %strategy);
                let manager = Arc::clone(self);
                let handle = runtime.spawn(
                    async move { manager.commit(strategy, descriptor).await }.instrument(span),
                );
                WorkerHandle::Started { peer, handle }
            })
            .collect()
    }

    /// Commit one target on the current task and hand its descriptor back
    pub async fn commit(
        &self,
        strategy: CommitStrategy,
        mut descriptor: RequestDescriptor,
    ) -> RequestDescriptor {
        let started = Instant::now();
        let deadline = started + self.config.event_deadline();

        let outcome = run_protocol(self, strategy, &mut descriptor, deadline).await;

        let summary = descriptor.result.summary();
        match outcome {
            ProtocolOutcome::Success => info!(
                "Storage commitment with {} ({}) finished after {:?}: {}",
                descriptor.node,
                strategy,
                started.elapsed(),
                summary
            ),
            ProtocolOutcome::Failure => warn!(
                "Storage commitment with {} ({}) failed after {:?}: {}",
                descriptor.node,
                strategy,
                started.elapsed(),
                summary
            ),
        }

        descriptor
    }
}
