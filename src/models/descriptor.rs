use std::time::Duration;

use dimse::RemoteNode;

use crate::models::result::TargetResult;

/// Default time a remote node is given to answer on the requesting association
pub const DEFAULT_ROLE_REVERSAL_WAIT: Duration = Duration::from_secs(60);

/// Everything one worker needs to commit one target's files
///
/// The descriptor, including its [`TargetResult`], moves into the worker and is
/// handed back when the worker is joined.
#[derive(Clone, Debug)]
pub struct RequestDescriptor {
    pub node: RemoteNode,
    /// Per-read wait for the event report; also the synchronous window in `Either` mode
    pub role_reversal_wait: Duration,
    /// Log every referenced and confirmed file
    pub verbose: bool,
    /// Port the remote uses for asynchronous results (defaults to the local DIMSE port)
    pub callback_port: Option<u16>,
    pub result: TargetResult,
}

impl RequestDescriptor {
    pub fn new(node: RemoteNode, result: TargetResult) -> Self {
        Self {
            node,
            role_reversal_wait: DEFAULT_ROLE_REVERSAL_WAIT,
            verbose: false,
            callback_port: None,
            result,
        }
    }

    pub fn with_role_reversal_wait(mut self, wait: Duration) -> Self {
        self.role_reversal_wait = wait;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_callback_port(mut self, port: u16) -> Self {
        self.callback_port = Some(port);
        self
    }
}
