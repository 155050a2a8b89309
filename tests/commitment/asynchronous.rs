mod common;

use std::sync::Arc;
use std::time::Duration;

use commitment::{CommitOutcome, CommitStrategy};
use dimse::mock::{MockListen, MockPeer, MockRead, MockReport, MockTransport};
use dimse::DimseStatus;
use tokio::time::Instant;

use common::{commitment_config, descriptor, manager, manager_with, outcomes, CT};

#[tokio::test(start_paused = true)]
async fn async_commitment_releases_then_accepts_results() {
    let transport = Arc::new(MockTransport::new());
    transport.add_peer(
        "ARCHIVE",
        MockPeer::new()
            // Never read: the requesting association is released after the response.
            .then_read(MockRead::Report(MockReport::new().with_transaction_uid("0.0")))
            .then_listen(MockListen::Connect(vec![MockRead::Report(
                MockReport::new().succeeded(CT, "1.2.3.4").succeeded(CT, "1.2.3.5"),
            )])),
    );
    let manager = manager(&transport);

    let started = Instant::now();
    let done = manager
        .commit(
            CommitStrategy::Asynchronous,
            descriptor("ARCHIVE", &["1.2.3.4", "1.2.3.5"]),
        )
        .await;

    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(outcomes(&done), vec![CommitOutcome::Success, CommitOutcome::Success]);
    let journal = transport.journal("ARCHIVE");
    assert_eq!(journal.opened, 1);
    assert_eq!(journal.listens, 1);
    assert_eq!(journal.accepted, 1);
    assert_eq!(journal.closed, 2);
    assert_eq!(journal.responses, vec![DimseStatus::Success]);
}

#[tokio::test(start_paused = true)]
async fn rejected_callers_are_retried_after_backoff() {
    let transport = Arc::new(MockTransport::new());
    transport.add_peer(
        "ARCHIVE",
        MockPeer::new()
            .then_listen(MockListen::Rejected)
            .then_listen(MockListen::Aborted)
            .then_listen(MockListen::Connect(vec![MockRead::Report(
                MockReport::new().succeeded(CT, "1.2.3.4"),
            )])),
    );
    let manager = manager(&transport);

    let started = Instant::now();
    let done = manager
        .commit(CommitStrategy::Asynchronous, descriptor("ARCHIVE", &["1.2.3.4"]))
        .await;

    assert!(started.elapsed() >= Duration::from_secs(2));
    assert_eq!(outcomes(&done), vec![CommitOutcome::Success]);
    assert_eq!(transport.journal("ARCHIVE").listens, 3);
}

#[tokio::test(start_paused = true)]
async fn gives_up_at_the_deadline() {
    let transport = Arc::new(MockTransport::new());
    transport.add_peer("ARCHIVE", MockPeer::new());
    let config = commitment::config::CommitmentConfig {
        event_deadline_secs: 20,
        ..commitment_config()
    };
    let manager = manager_with(&transport, config);

    let started = Instant::now();
    let done = manager
        .commit(CommitStrategy::Asynchronous, descriptor("ARCHIVE", &["1.2.3.4"]))
        .await;

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(20) && elapsed < Duration::from_secs(21));
    assert_eq!(outcomes(&done), vec![CommitOutcome::Unknown]);
    let journal = transport.journal("ARCHIVE");
    assert_eq!(journal.listens, 4);
    assert_eq!(journal.accepted, 0);
}

#[tokio::test(start_paused = true)]
async fn listener_failure_ends_the_wait() {
    let transport = Arc::new(MockTransport::new());
    transport.add_peer("ARCHIVE", MockPeer::new().then_listen(MockListen::Fatal));
    let manager = manager(&transport);

    let done = manager
        .commit(CommitStrategy::Asynchronous, descriptor("ARCHIVE", &["1.2.3.4"]))
        .await;

    assert_eq!(outcomes(&done), vec![CommitOutcome::Unknown]);
    assert_eq!(transport.journal("ARCHIVE").listens, 1);
}

#[tokio::test(start_paused = true)]
async fn inbound_report_for_another_transaction_is_refused() {
    let transport = Arc::new(MockTransport::new());
    transport.add_peer(
        "ARCHIVE",
        MockPeer::new().then_listen(MockListen::Connect(vec![MockRead::Report(
            MockReport::new()
                .with_transaction_uid("1.2.3.999")
                .succeeded(CT, "1.2.3.4"),
        )])),
    );
    let manager = manager(&transport);

    let done = manager
        .commit(CommitStrategy::Asynchronous, descriptor("ARCHIVE", &["1.2.3.4"]))
        .await;

    assert_eq!(outcomes(&done), vec![CommitOutcome::Unknown]);
    assert_eq!(
        transport.journal("ARCHIVE").responses,
        vec![DimseStatus::PROCESSING_FAILURE]
    );
}

#[tokio::test(start_paused = true)]
async fn silent_inbound_association_is_bounded() {
    let transport = Arc::new(MockTransport::new());
    transport.add_peer(
        "ARCHIVE",
        MockPeer::new().then_listen(MockListen::Connect(vec![MockRead::Timeout; 500])),
    );
    let manager = manager(&transport);

    let started = Instant::now();
    let done = manager
        .commit(CommitStrategy::Asynchronous, descriptor("ARCHIVE", &["1.2.3.4"]))
        .await;

    // Association timeout (300 s) rather than the 600 s event deadline.
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(300) && elapsed < Duration::from_secs(301));
    assert_eq!(outcomes(&done), vec![CommitOutcome::Unknown]);
    let journal = transport.journal("ARCHIVE");
    assert_eq!(journal.accepted, 1);
    assert_eq!(journal.aborted, 1);
    assert!(journal.responses.is_empty());
}
