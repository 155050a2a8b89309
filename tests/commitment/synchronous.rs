mod common;

use std::sync::Arc;
use std::time::Duration;

use commitment::{CommitOutcome, CommitStrategy, FileOutcome, RequestDescriptor, TargetResult};
use dimse::mock::{MockPeer, MockRead, MockReport, MockTransport};
use dimse::{DimseCommand, DimseStatus, RemoteNode};
use tokio::time::Instant;

use common::{descriptor, manager, outcomes, CT};

#[tokio::test(start_paused = true)]
async fn sync_commitment_confirms_stored_instance() {
    let transport = Arc::new(MockTransport::new());
    transport.add_peer(
        "ARCHIVE",
        MockPeer::new().then_read(MockRead::Report(MockReport::new().succeeded(CT, "1.2.3.4"))),
    );
    let manager = manager(&transport);

    let done = manager
        .commit(CommitStrategy::Synchronous, descriptor("ARCHIVE", &["1.2.3.4"]))
        .await;

    assert_eq!(outcomes(&done), vec![CommitOutcome::Success]);
    assert!(done.result.is_fully_committed());
    assert_eq!(
        Some(done.result.transaction_uid.clone()),
        transport.last_transaction_uid("ARCHIVE")
    );

    let journal = transport.journal("ARCHIVE");
    assert_eq!(journal.opened, 1);
    assert_eq!(journal.closed, 1);
    assert_eq!(journal.aborted, 0);
    assert_eq!(journal.listens, 0);
    assert_eq!(journal.requests.len(), 1);
    assert_eq!(journal.requests[0].command, DimseCommand::NActionRq);
    assert_eq!(journal.responses, vec![DimseStatus::Success]);
    assert_eq!(transport.open_associations(), 0);
}

#[tokio::test(start_paused = true)]
async fn foreign_transaction_is_acknowledged_with_failure() {
    let transport = Arc::new(MockTransport::new());
    transport.add_peer(
        "ARCHIVE",
        MockPeer::new().then_read(MockRead::Report(
            MockReport::new()
                .with_transaction_uid("1.2.3.999")
                .succeeded(CT, "1.2.3.4"),
        )),
    );
    let manager = manager(&transport);

    let done = manager
        .commit(CommitStrategy::Synchronous, descriptor("ARCHIVE", &["1.2.3.4"]))
        .await;

    assert_eq!(outcomes(&done), vec![CommitOutcome::Unknown]);
    let journal = transport.journal("ARCHIVE");
    assert_eq!(journal.responses, vec![DimseStatus::PROCESSING_FAILURE]);
    assert_eq!(journal.closed, 1);
}

#[tokio::test(start_paused = true)]
async fn partial_failure_marks_each_file() {
    let transport = Arc::new(MockTransport::new());
    transport.add_peer(
        "ARCHIVE",
        MockPeer::new().then_read(MockRead::Report(
            MockReport::new()
                .succeeded(CT, "1.2.3.4")
                .failed(CT, "1.2.3.5", 0x0112),
        )),
    );
    let manager = manager(&transport);

    let done = manager
        .commit(
            CommitStrategy::Synchronous,
            descriptor("ARCHIVE", &["1.2.3.4", "1.2.3.5", "1.2.3.6"]),
        )
        .await;

    assert_eq!(
        outcomes(&done),
        vec![CommitOutcome::Success, CommitOutcome::Failure, CommitOutcome::Unknown]
    );
    let summary = done.result.summary();
    assert_eq!((summary.total, summary.succeeded, summary.failed, summary.unknown), (3, 1, 1, 1));
    assert_eq!(transport.journal("ARCHIVE").responses, vec![DimseStatus::Success]);
}

#[tokio::test(start_paused = true)]
async fn nothing_to_commit_opens_no_association() {
    let transport = Arc::new(MockTransport::new());
    transport.add_peer("ARCHIVE", MockPeer::new());
    let manager = manager(&transport);

    let empty = manager
        .commit(CommitStrategy::Synchronous, descriptor("ARCHIVE", &[]))
        .await;
    assert!(empty.result.files.is_empty());

    let unidentified = RequestDescriptor::new(
        RemoteNode::new("ARCHIVE", "127.0.0.1", 104),
        TargetResult::new(vec![FileOutcome::new("", "", "/data/broken.dcm")]),
    );
    let done = manager.commit(CommitStrategy::Either, unidentified).await;
    assert_eq!(outcomes(&done), vec![CommitOutcome::Unknown]);

    let journal = transport.journal("ARCHIVE");
    assert_eq!(journal.opened, 0);
    assert_eq!(journal.listens, 0);
    assert!(journal.requests.is_empty());
}

#[tokio::test(start_paused = true)]
async fn rejected_request_aborts_association() {
    let transport = Arc::new(MockTransport::new());
    transport.add_peer(
        "ARCHIVE",
        MockPeer::new().with_ack_status(DimseStatus::NO_SUCH_SOP_INSTANCE),
    );
    let manager = manager(&transport);

    let done = manager
        .commit(CommitStrategy::Synchronous, descriptor("ARCHIVE", &["1.2.3.4"]))
        .await;

    assert_eq!(outcomes(&done), vec![CommitOutcome::Unknown]);
    let journal = transport.journal("ARCHIVE");
    assert_eq!(journal.opened, 1);
    assert_eq!(journal.aborted, 1);
    assert_eq!(journal.closed, 0);
    assert!(journal.responses.is_empty());
    assert_eq!(transport.open_associations(), 0);
}

#[tokio::test(start_paused = true)]
async fn refused_association_leaves_outcomes_unknown() {
    let transport = Arc::new(MockTransport::new());
    transport.add_peer("ARCHIVE", MockPeer::new().refuse_open());
    let manager = manager(&transport);

    let done = manager
        .commit(CommitStrategy::Synchronous, descriptor("ARCHIVE", &["1.2.3.4"]))
        .await;

    assert_eq!(outcomes(&done), vec![CommitOutcome::Unknown]);
    assert!(done.result.transaction_uid.is_empty());
    assert!(transport.journal("ARCHIVE").requests.is_empty());
}

#[tokio::test(start_paused = true)]
async fn lost_connection_aborts_association() {
    let transport = Arc::new(MockTransport::new());
    transport.add_peer("ARCHIVE", MockPeer::new().then_read(MockRead::Fatal));
    let manager = manager(&transport);

    let done = manager
        .commit(CommitStrategy::Synchronous, descriptor("ARCHIVE", &["1.2.3.4"]))
        .await;

    assert_eq!(outcomes(&done), vec![CommitOutcome::Unknown]);
    let journal = transport.journal("ARCHIVE");
    assert_eq!(journal.aborted, 1);
    assert_eq!(journal.closed, 0);
}

#[tokio::test(start_paused = true)]
async fn zero_wait_gives_up_at_the_deadline() {
    let transport = Arc::new(MockTransport::new());
    transport.add_peer("ARCHIVE", MockPeer::new());
    let config = commitment::config::CommitmentConfig {
        event_deadline_secs: 10,
        ..common::commitment_config()
    };
    let manager = common::manager_with(&transport, config);

    let started = Instant::now();
    let descriptor = descriptor("ARCHIVE", &["1.2.3.4"]).with_role_reversal_wait(Duration::ZERO);
    let done = tokio::time::timeout(
        Duration::from_secs(30),
        manager.commit(CommitStrategy::Synchronous, descriptor),
    )
    .await
    .expect("commit finishes within the event deadline");

    assert!(started.elapsed() >= Duration::from_secs(10));
    assert_eq!(outcomes(&done), vec![CommitOutcome::Unknown]);
    assert_eq!(transport.journal("ARCHIVE").aborted, 1);
}

#[tokio::test(start_paused = true)]
async fn unanswered_association_request_times_out() {
    let transport = Arc::new(MockTransport::new());
    transport.add_peer("ARCHIVE", MockPeer::new().stall_open());
    let manager = manager(&transport);

    let started = Instant::now();
    let done = manager
        .commit(CommitStrategy::Synchronous, descriptor("ARCHIVE", &["1.2.3.4"]))
        .await;

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(30) && elapsed < Duration::from_secs(31));
    assert_eq!(outcomes(&done), vec![CommitOutcome::Unknown]);
    let journal = transport.journal("ARCHIVE");
    assert_eq!(journal.opened, 0);
    assert!(journal.requests.is_empty());
}
