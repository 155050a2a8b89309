mod common;

use std::sync::Arc;
use std::time::Duration;

use commitment::{CommitOutcome, CommitStrategy};
use dimse::mock::{MockListen, MockPeer, MockRead, MockReport, MockTransport};
use dimse::DimseStatus;
use tokio::time::Instant;

use common::{descriptor, manager, outcomes, CT};

#[tokio::test(start_paused = true)]
async fn either_uses_synchronous_result_when_it_arrives() {
    let transport = Arc::new(MockTransport::new());
    transport.add_peer(
        "ARCHIVE",
        MockPeer::new().then_read(MockRead::Report(MockReport::new().succeeded(CT, "1.2.3.4"))),
    );
    let manager = manager(&transport);

    let done = manager
        .commit(CommitStrategy::Either, descriptor("ARCHIVE", &["1.2.3.4"]))
        .await;

    assert_eq!(outcomes(&done), vec![CommitOutcome::Success]);
    let journal = transport.journal("ARCHIVE");
    assert_eq!(journal.listens, 0);
    assert_eq!(journal.closed, 1);
}

#[tokio::test(start_paused = true)]
async fn either_falls_back_to_role_reversal() {
    let transport = Arc::new(MockTransport::new());
    transport.add_peer(
        "ARCHIVE",
        MockPeer::new().then_listen(MockListen::Connect(vec![MockRead::Report(
            MockReport::new().succeeded(CT, "1.2.3.4"),
        )])),
    );
    let manager = manager(&transport);

    let started = Instant::now();
    let done = manager
        .commit(CommitStrategy::Either, descriptor("ARCHIVE", &["1.2.3.4"]))
        .await;

    assert!(started.elapsed() >= Duration::from_secs(2));
    assert_eq!(outcomes(&done), vec![CommitOutcome::Success]);
    assert_eq!(
        Some(done.result.transaction_uid.clone()),
        transport.last_transaction_uid("ARCHIVE")
    );

    let journal = transport.journal("ARCHIVE");
    assert_eq!(journal.opened, 1);
    assert_eq!(journal.requests.len(), 1);
    assert_eq!(journal.listens, 1);
    assert_eq!(journal.accepted, 1);
    // The stale requesting association and the inbound one
    assert_eq!(journal.closed, 2);
    assert_eq!(journal.responses, vec![DimseStatus::Success]);
    assert_eq!(transport.open_associations(), 0);
}

#[tokio::test(start_paused = true)]
async fn either_keeps_listening_after_idle_attempts() {
    let transport = Arc::new(MockTransport::new());
    transport.add_peer(
        "ARCHIVE",
        MockPeer::new()
            .then_listen(MockListen::Timeout)
            .then_listen(MockListen::Timeout)
            .then_listen(MockListen::Connect(vec![MockRead::Report(
                MockReport::new().failed(CT, "1.2.3.4", 0x0110),
            )])),
    );
    let manager = manager(&transport);

    let done = manager
        .commit(CommitStrategy::Either, descriptor("ARCHIVE", &["1.2.3.4"]))
        .await;

    assert_eq!(outcomes(&done), vec![CommitOutcome::Failure]);
    assert_eq!(transport.journal("ARCHIVE").listens, 3);
}
