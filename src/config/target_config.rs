use dimse::RemoteNode;
use serde::Deserialize;
use std::time::Duration;

use crate::models::{FileOutcome, RequestDescriptor, TargetResult};

/// A storage target that is asked to commit what was sent to it
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    #[serde(flatten)]
    pub node: RemoteNode,

    #[serde(default = "default_role_reversal_wait")]
    pub role_reversal_wait_secs: u64,

    #[serde(default)]
    pub verbose: bool,

    /// Overrides the local DIMSE port for asynchronous results from this target
    #[serde(default)]
    pub callback_port: Option<u16>,
}

impl TargetConfig {
    pub fn role_reversal_wait(&self) -> Duration {
        Duration::from_secs(self.role_reversal_wait_secs)
    }

    /// Build the worker input for the files sent to this target
    pub fn to_descriptor(&self, files: Vec<FileOutcome>) -> RequestDescriptor {
        let mut descriptor = RequestDescriptor::new(self.node.clone(), TargetResult::new(files))
            .with_role_reversal_wait(self.role_reversal_wait())
            .with_verbose(self.verbose);
        if let Some(port) = self.callback_port {
            descriptor = descriptor.with_callback_port(port);
        }
        descriptor
    }
}

fn default_role_reversal_wait() -> u64 {
    60
}
