//! Waiting for, correlating and acknowledging N-EVENT-REPORT requests

use std::time::Duration;

use dimse::{AssociationId, AssociationTransport, DimseCommand, DimseError, DimseMessage, DimseStatus};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::commitment::correlator::correlate;
use crate::models::TargetResult;

/// Shortest per-read wait; a zero wait would never yield to the timer
pub const MIN_READ_WAIT: Duration = Duration::from_secs(1);

/// Terminal result of one event-report exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Success,
    Failure,
    /// The first elapsed wait of an adaptive run; only reported when `adaptive` is set
    Timeout,
}

/// How long and in which mode to wait for an event report
#[derive(Debug, Clone)]
pub struct EventWait {
    /// Per-read wait, raised to [`MIN_READ_WAIT`]
    pub wait: Duration,
    /// Report the first elapsed wait as [`EventOutcome::Timeout`] instead of retrying
    pub adaptive: bool,
    /// Give up with [`EventOutcome::Failure`] once this instant has passed
    pub deadline: Instant,
    pub cancel: CancellationToken,
    pub verbose: bool,
}

#[derive(Debug)]
enum State {
    AwaitMessage,
    DispatchEvent(DimseMessage),
    SendAck(DimseMessage, DimseStatus),
    Done,
    TimedOut,
    Failed,
}

/// Drive one association until a commitment result has been acknowledged.
///
/// Exactly one response is sent per event report, with processing-failure
/// status when the report does not belong to this transaction. A release by
/// the peer counts as completion.
pub async fn handle_event_report(
    transport: &dyn AssociationTransport,
    association: AssociationId,
    result: &mut TargetResult,
    wait: &EventWait,
) -> EventOutcome {
    let mut state = State::AwaitMessage;
    let mut cycles: u64 = 0;
    let mut timeouts: u64 = 0;

    loop {
        state = match state {
            State::AwaitMessage => {
                let now = Instant::now();
                if now >= wait.deadline {
                    error!(
                        "Gave up waiting for a storage commitment result on {} after {} wait(s)",
                        association, cycles
                    );
                    State::Failed
                } else {
                    cycles += 1;
                    let read_for = wait.wait.max(MIN_READ_WAIT).min(wait.deadline - now);
                    let read = tokio::select! {
                        _ = wait.cancel.cancelled() => {
                            warn!("Stopped waiting for a storage commitment result on {}", association);
                            return EventOutcome::Failure;
                        }
                        read = transport.read_message(association, read_for) => read,
                    };
                    if matches!(read, Err(DimseError::Timeout(_))) {
                        timeouts += 1;
                    }
                    await_transition(read, association, wait.adaptive, timeouts)
                }
            }
            State::DispatchEvent(message) => {
                let status = if correlate(&message, result, wait.verbose) {
                    DimseStatus::Success
                } else {
                    DimseStatus::PROCESSING_FAILURE
                };
                State::SendAck(message, status)
            }
            State::SendAck(message, status) => {
                let response = DimseMessage::n_event_report_rsp(&message, status);
                match transport.send_response(association, status, response).await {
                    Ok(()) => {
                        debug!("Acknowledged commitment result on {} with {}", association, status);
                        State::Done
                    }
                    Err(e) => {
                        error!("Failed to acknowledge commitment result on {}: {}", association, e);
                        State::Failed
                    }
                }
            }
            State::Done => return EventOutcome::Success,
            State::TimedOut => return EventOutcome::Timeout,
            State::Failed => return EventOutcome::Failure,
        };
    }
}

fn await_transition(
    read: dimse::Result<DimseMessage>,
    association: AssociationId,
    adaptive: bool,
    timeouts: u64,
) -> State {
    match read {
        Ok(message) if message.command == DimseCommand::NEventReportRq => State::DispatchEvent(message),
        Ok(message) => {
            warn!("Ignoring unexpected {} on {}", message.command, association);
            State::AwaitMessage
        }
        Err(DimseError::Timeout(_)) if adaptive && timeouts == 1 => State::TimedOut,
        Err(DimseError::Timeout(_)) => {
            if timeouts % 12 == 0 {
                info!("Still waiting for a storage commitment result on {}", association);
            } else {
                debug!("No storage commitment result on {} yet", association);
            }
            State::AwaitMessage
        }
        Err(DimseError::PeerClosed) => {
            debug!("{} released by peer", association);
            State::Done
        }
        Err(e) => {
            error!("Lost {} while waiting for a commitment result: {}", association, e);
            State::Failed
        }
    }
}
