//! Scripted in-memory transport
//!
//! Each remote node is scripted by AE title with a [`MockPeer`]: the status of
//! its N-ACTION response, what it sends on the requesting association after
//! that response, and what happens on each role-reversal listen. Event reports
//! echo the transaction UID of the last N-ACTION request the peer received
//! unless a fixed one is scripted. Waits that time out sleep for the requested
//! duration, so tests usually run with tokio's paused clock.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use dicom_dictionary_std::tags;
use dicom_object::InMemDicomObject;
use tracing::debug;

use crate::config::RemoteNode;
use crate::transport::{AssociationTransport, RejectReason};
use crate::types::{
    put_sequence, put_u16, put_uid, string_attr, AssociationId, DimseCommand, DimseMessage,
    DimseStatus, ServiceProfile, EVENT_TYPE_COMMITMENT_FAILURE, EVENT_TYPE_COMMITMENT_SUCCESS,
};
use crate::{DimseError, Result};

/// Transaction UID carried by a scripted event report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockTransaction {
    /// Echo the UID of the last N-ACTION request
    Echo,
    /// Always send this UID
    Fixed(String),
}

/// Scripted N-EVENT-REPORT content
#[derive(Debug, Clone)]
pub struct MockReport {
    pub event_type: Option<u16>,
    pub transaction: MockTransaction,
    pub succeeded: Vec<(String, String)>,
    pub failed: Vec<(String, String, u16)>,
}

/// One scripted outcome of a message read
#[derive(Debug, Clone)]
pub enum MockRead {
    Report(MockReport),
    Timeout,
    PeerClosed,
    Fatal,
}

/// One scripted outcome of a role-reversal listen
#[derive(Debug, Clone)]
pub enum MockListen {
    Timeout,
    Rejected,
    Aborted,
    Fatal,
    /// The peer connects and then produces these reads
    Connect(Vec<MockRead>),
}

/// Script for a single remote node
#[derive(Debug, Clone)]
pub struct MockPeer {
    refuse_open: bool,
    stall_open: bool,
    ack_status: DimseStatus,
    sync_reads: VecDeque<MockRead>,
    listens: VecDeque<MockListen>,
}

/// Everything a peer observed during a test
#[derive(Debug, Clone, Default)]
pub struct MockJournal {
    pub opened: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub closed: usize,
    pub aborted: usize,
    pub listens: usize,
    pub requests: Vec<DimseMessage>,
    pub responses: Vec<DimseStatus>,
}

#[derive(Debug)]
struct MockAssociation {
    peer: String,
    inbound: bool,
    pending: Option<DimseMessage>,
    reads: VecDeque<MockRead>,
}

#[derive(Debug, Default)]
struct MockState {
    next_id: u32,
    peers: HashMap<String, MockPeer>,
    journals: HashMap<String, MockJournal>,
    transaction_uids: HashMap<String, String>,
    associations: HashMap<AssociationId, MockAssociation>,
}

/// In-memory [`AssociationTransport`] driven by per-peer scripts
#[derive(Debug, Default)]
pub struct MockTransport {
    state: Mutex<MockState>,
}

enum ReadAction {
    Ready(DimseMessage),
    Sleep,
    Fail(DimseError),
}

impl MockReport {
    /// Empty report echoing the request's transaction UID
    pub fn new() -> Self {
        Self {
            event_type: None,
            transaction: MockTransaction::Echo,
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn succeeded(mut self, class_uid: &str, instance_uid: &str) -> Self {
        self.succeeded.push((class_uid.to_string(), instance_uid.to_string()));
        self
    }

    pub fn failed(mut self, class_uid: &str, instance_uid: &str, reason: u16) -> Self {
        self.failed
            .push((class_uid.to_string(), instance_uid.to_string(), reason));
        self
    }

    pub fn with_transaction_uid(mut self, uid: &str) -> Self {
        self.transaction = MockTransaction::Fixed(uid.to_string());
        self
    }

    pub fn with_event_type(mut self, event_type: u16) -> Self {
        self.event_type = Some(event_type);
        self
    }

    fn to_message(&self, message_id: u16, echoed_uid: Option<&str>) -> DimseMessage {
        let event_type = self.event_type.unwrap_or(if self.failed.is_empty() {
            EVENT_TYPE_COMMITMENT_SUCCESS
        } else {
            EVENT_TYPE_COMMITMENT_FAILURE
        });

        let mut ds = InMemDicomObject::new_empty();
        let uid = match &self.transaction {
            MockTransaction::Echo => echoed_uid,
            MockTransaction::Fixed(uid) => Some(uid.as_str()),
        };
        if let Some(uid) = uid {
            put_uid(&mut ds, tags::TRANSACTION_UID, uid);
        }

        if !self.succeeded.is_empty() {
            let items = self
                .succeeded
                .iter()
                .map(|(class_uid, instance_uid)| reference_item(class_uid, instance_uid))
                .collect();
            put_sequence(&mut ds, tags::REFERENCED_SOP_SEQUENCE, items);
        }

        if !self.failed.is_empty() {
            let items = self
                .failed
                .iter()
                .map(|(class_uid, instance_uid, reason)| {
                    let mut item = reference_item(class_uid, instance_uid);
                    put_u16(&mut item, tags::FAILURE_REASON, *reason);
                    item
                })
                .collect();
            put_sequence(&mut ds, tags::FAILED_SOP_SEQUENCE, items);
        }

        DimseMessage::n_event_report_rq(message_id, event_type, ds)
    }
}

impl Default for MockReport {
    fn default() -> Self {
        Self::new()
    }
}

fn reference_item(class_uid: &str, instance_uid: &str) -> InMemDicomObject {
    let mut item = InMemDicomObject::new_empty();
    put_uid(&mut item, tags::REFERENCED_SOP_CLASS_UID, class_uid);
    put_uid(&mut item, tags::REFERENCED_SOP_INSTANCE_UID, instance_uid);
    item
}

impl MockPeer {
    /// Peer that accepts associations and acknowledges requests with success
    pub fn new() -> Self {
        Self {
            refuse_open: false,
            stall_open: false,
            ack_status: DimseStatus::Success,
            sync_reads: VecDeque::new(),
            listens: VecDeque::new(),
        }
    }

    /// Reject every outbound association
    pub fn refuse_open(mut self) -> Self {
        self.refuse_open = true;
        self
    }

    /// Never answer outbound association requests
    pub fn stall_open(mut self) -> Self {
        self.stall_open = true;
        self
    }

    /// Status of the N-ACTION response
    pub fn with_ack_status(mut self, status: DimseStatus) -> Self {
        self.ack_status = status;
        self
    }

    /// Queue a read on the requesting association, after the N-ACTION response
    pub fn then_read(mut self, read: MockRead) -> Self {
        self.sync_reads.push_back(read);
        self
    }

    /// Queue a role-reversal listen outcome
    pub fn then_listen(mut self, listen: MockListen) -> Self {
        self.listens.push_back(listen);
        self
    }
}

impl Default for MockPeer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the node with the given AE title
    pub fn add_peer(&self, ae_title: &str, peer: MockPeer) {
        let mut state = self.lock();
        state.peers.insert(ae_title.to_string(), peer);
        state.journals.entry(ae_title.to_string()).or_default();
    }

    /// Snapshot of what happened with a peer so far
    pub fn journal(&self, ae_title: &str) -> MockJournal {
        self.lock().journals.get(ae_title).cloned().unwrap_or_default()
    }

    /// Transaction UID of the last N-ACTION request sent to a peer
    pub fn last_transaction_uid(&self, ae_title: &str) -> Option<String> {
        self.lock().transaction_uids.get(ae_title).cloned()
    }

    /// Associations not yet closed or aborted
    pub fn open_associations(&self) -> usize {
        self.lock().associations.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the state from the others.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl MockState {
    fn allocate(&mut self, peer: &str, inbound: bool, reads: VecDeque<MockRead>) -> AssociationId {
        self.next_id += 1;
        let id = AssociationId(self.next_id);
        self.associations.insert(
            id,
            MockAssociation {
                peer: peer.to_string(),
                inbound,
                pending: None,
                reads,
            },
        );
        id
    }

    fn journal_for(&mut self, id: AssociationId) -> Result<&mut MockJournal> {
        let peer = self
            .associations
            .get(&id)
            .map(|assoc| assoc.peer.clone())
            .ok_or_else(|| DimseError::internal(format!("unknown association {}", id)))?;
        Ok(self.journals.entry(peer).or_default())
    }
}

#[async_trait]
impl AssociationTransport for MockTransport {
    async fn open_association(
        &self,
        node: &RemoteNode,
        _profile: ServiceProfile,
    ) -> Result<AssociationId> {
        let stalled = self
            .lock()
            .peers
            .get(&node.ae_title)
            .is_some_and(|peer| peer.stall_open);
        if stalled {
            std::future::pending::<()>().await;
        }

        let mut state = self.lock();
        let peer = state.peers.get_mut(&node.ae_title).ok_or_else(|| {
            DimseError::Network(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                format!("no scripted peer {}", node),
            ))
        })?;
        if peer.refuse_open {
            return Err(DimseError::AssociationRejected(format!(
                "{} refused the association",
                node.ae_title
            )));
        }
        let reads = std::mem::take(&mut peer.sync_reads);
        let id = state.allocate(&node.ae_title, false, reads);
        state.journals.entry(node.ae_title.clone()).or_default().opened += 1;
        debug!("mock: opened {} to {}", id, node);
        Ok(id)
    }

    async fn wait_for_association(
        &self,
        _profile: ServiceProfile,
        peer: &RemoteNode,
        _port: u16,
        timeout: Duration,
    ) -> Result<AssociationId> {
        let outcome = {
            let mut state = self.lock();
            state.journals.entry(peer.ae_title.clone()).or_default().listens += 1;
            state
                .peers
                .get_mut(&peer.ae_title)
                .and_then(|p| p.listens.pop_front())
                .unwrap_or(MockListen::Timeout)
        };

        match outcome {
            MockListen::Timeout => {
                tokio::time::sleep(timeout).await;
                Err(DimseError::timeout("no inbound association"))
            }
            MockListen::Rejected => Err(DimseError::AssociationRejected(
                "unexpected calling host".to_string(),
            )),
            MockListen::Aborted => Err(DimseError::NegotiationAborted(
                "peer aborted during negotiation".to_string(),
            )),
            MockListen::Fatal => Err(DimseError::operation_failed("listener failed")),
            MockListen::Connect(reads) => {
                let mut state = self.lock();
                let id = state.allocate(&peer.ae_title, true, reads.into());
                debug!("mock: inbound {} from {}", id, peer);
                Ok(id)
            }
        }
    }

    async fn accept_association(&self, id: AssociationId) -> Result<()> {
        self.lock().journal_for(id)?.accepted += 1;
        Ok(())
    }

    async fn reject_association(&self, id: AssociationId, _reason: RejectReason) -> Result<()> {
        let mut state = self.lock();
        state.journal_for(id)?.rejected += 1;
        state.associations.remove(&id);
        Ok(())
    }

    async fn send_request(&self, id: AssociationId, message: DimseMessage) -> Result<()> {
        let mut state = self.lock();
        let peer_name = state
            .associations
            .get(&id)
            .map(|assoc| assoc.peer.clone())
            .ok_or_else(|| DimseError::internal(format!("unknown association {}", id)))?;

        if message.command == DimseCommand::NActionRq {
            if let Some(uid) = message
                .dataset
                .as_ref()
                .and_then(|ds| string_attr(ds, tags::TRANSACTION_UID))
            {
                state.transaction_uids.insert(peer_name.clone(), uid);
            }
            let ack_status = state
                .peers
                .get(&peer_name)
                .map(|peer| peer.ack_status)
                .unwrap_or(DimseStatus::Success);
            let ack = DimseMessage::n_action_rsp(&message, ack_status);
            if let Some(assoc) = state.associations.get_mut(&id) {
                assoc.pending = Some(ack);
            }
        }

        state.journals.entry(peer_name).or_default().requests.push(message);
        Ok(())
    }

    async fn read_message(&self, id: AssociationId, timeout: Duration) -> Result<DimseMessage> {
        let action = {
            let mut guard = self.lock();
            let state = &mut *guard;
            state.next_id += 1;
            let message_id = (state.next_id % u32::from(u16::MAX)) as u16;
            let assoc = state
                .associations
                .get_mut(&id)
                .ok_or_else(|| DimseError::internal(format!("unknown association {}", id)))?;

            if let Some(pending) = assoc.pending.take() {
                ReadAction::Ready(pending)
            } else {
                match assoc.reads.pop_front() {
                    Some(MockRead::Report(report)) => {
                        let echoed = state.transaction_uids.get(&assoc.peer).map(String::as_str);
                        ReadAction::Ready(report.to_message(message_id, echoed))
                    }
                    Some(MockRead::Timeout) => ReadAction::Sleep,
                    Some(MockRead::PeerClosed) => ReadAction::Fail(DimseError::PeerClosed),
                    Some(MockRead::Fatal) => {
                        ReadAction::Fail(DimseError::operation_failed("connection reset"))
                    }
                    None if assoc.inbound => ReadAction::Fail(DimseError::PeerClosed),
                    None => ReadAction::Sleep,
                }
            }
        };

        match action {
            ReadAction::Ready(message) => Ok(message),
            ReadAction::Fail(err) => Err(err),
            ReadAction::Sleep => {
                tokio::time::sleep(timeout).await;
                Err(DimseError::timeout(format!("no message on {}", id)))
            }
        }
    }

    async fn send_response(
        &self,
        id: AssociationId,
        status: DimseStatus,
        _message: DimseMessage,
    ) -> Result<()> {
        self.lock().journal_for(id)?.responses.push(status);
        Ok(())
    }

    async fn close_association(&self, id: AssociationId) -> Result<()> {
        let mut state = self.lock();
        state.journal_for(id)?.closed += 1;
        state.associations.remove(&id);
        Ok(())
    }

    async fn abort_association(&self, id: AssociationId) -> Result<()> {
        let mut state = self.lock();
        state.journal_for(id)?.aborted += 1;
        state.associations.remove(&id);
        Ok(())
    }
}
