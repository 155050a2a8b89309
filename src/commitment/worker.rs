use tokio::task::JoinHandle;

use crate::error::CommitError;
use crate::models::RequestDescriptor;

/// Handle to the worker committing one target
///
/// Joining hands back the descriptor with its result filled in. A worker that
/// could not be started returns its descriptor untouched, every file still
/// unknown.
#[derive(Debug)]
pub enum WorkerHandle {
    Started {
        peer: String,
        handle: JoinHandle<RequestDescriptor>,
    },
    FailedToStart {
        descriptor: RequestDescriptor,
        reason: String,
    },
}

impl WorkerHandle {
    /// AE title of the target this worker commits
    pub fn peer(&self) -> &str {
        match self {
            WorkerHandle::Started { peer, .. } => peer,
            WorkerHandle::FailedToStart { descriptor, .. } => &descriptor.node.ae_title,
        }
    }

    pub fn is_started(&self) -> bool {
        matches!(self, WorkerHandle::Started { .. })
    }

    pub fn is_finished(&self) -> bool {
        match self {
            WorkerHandle::Started { handle, .. } => handle.is_finished(),
            WorkerHandle::FailedToStart { .. } => true,
        }
    }

    /// Wait for the worker to terminate
    pub async fn join(self) -> Result<RequestDescriptor, CommitError> {
        match self {
            WorkerHandle::Started { peer, handle } => {
                handle.await.map_err(|e| CommitError::WorkerAborted {
                    peer,
                    reason: e.to_string(),
                })
            }
            WorkerHandle::FailedToStart { descriptor, .. } => Ok(descriptor),
        }
    }
}

/// Join every handle, keeping the order of `handles`
pub async fn join_all(handles: Vec<WorkerHandle>) -> Vec<Result<RequestDescriptor, CommitError>> {
    futures_util::future::join_all(handles.into_iter().map(WorkerHandle::join)).await
}
