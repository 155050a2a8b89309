//! Storage commitment orchestration
//!
//! [`CommitmentManager::dispatch`] starts one worker per target. Each worker
//! runs the protocol selected by its [`CommitStrategy`](crate::models::CommitStrategy):
//!
//! - synchronous: N-ACTION, then the N-EVENT-REPORT on the same association
//! - asynchronous: N-ACTION, release, then wait for the remote node to connect
//!   back with the N-EVENT-REPORT
//! - either: synchronous, falling back to the asynchronous wait when nothing
//!   arrives within the target's role-reversal wait
//!
//! Workers of the same protocol family take turns on the request and on the
//! event-report exchange; the long wait for an inbound association happens
//! outside that lock.

pub mod correlator;
pub mod event_report;
mod listener;
pub mod manager;
pub mod protocols;
pub mod request;
pub mod transaction;
pub mod worker;

pub use correlator::correlate;
pub use event_report::{handle_event_report, EventOutcome, EventWait};
pub use manager::CommitmentManager;
pub use protocols::ProtocolOutcome;
pub use request::{build_commit_request, send_commit_request, RequestOutcome};
pub use transaction::TransactionUidGenerator;
pub use worker::{join_all, WorkerHandle};
