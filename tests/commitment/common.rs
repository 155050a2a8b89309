#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use commitment::config::CommitmentConfig;
use commitment::{CommitOutcome, CommitmentManager, FileOutcome, RequestDescriptor, TargetResult};
use dimse::mock::MockTransport;
use dimse::{DimseConfig, RemoteNode};

pub const CT: &str = "1.2.840.10008.5.1.4.1.1.2";

pub fn commitment_config() -> CommitmentConfig {
    CommitmentConfig {
        listen_timeout_secs: 5,
        ack_timeout_secs: 30,
        reject_backoff_ms: 1000,
        event_deadline_secs: 600,
        ..CommitmentConfig::default()
    }
}

pub fn manager_with(transport: &Arc<MockTransport>, config: CommitmentConfig) -> Arc<CommitmentManager> {
    Arc::new(CommitmentManager::new(
        transport.clone(),
        DimseConfig::default(),
        config,
    ))
}

pub fn manager(transport: &Arc<MockTransport>) -> Arc<CommitmentManager> {
    manager_with(transport, commitment_config())
}

pub fn descriptor(ae_title: &str, instances: &[&str]) -> RequestDescriptor {
    let files = instances
        .iter()
        .map(|instance| FileOutcome::new(CT, *instance, format!("/data/{}.dcm", instance)))
        .collect();
    RequestDescriptor::new(
        RemoteNode::new(ae_title, "127.0.0.1", 104),
        TargetResult::new(files),
    )
    .with_role_reversal_wait(Duration::from_secs(2))
    .with_callback_port(11113)
}

pub fn outcomes(descriptor: &RequestDescriptor) -> Vec<CommitOutcome> {
    descriptor.result.files.iter().map(|file| file.outcome).collect()
}
