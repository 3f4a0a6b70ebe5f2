//! End-to-end scenarios for the reporting state machine, driven tick by
//! tick over mock chains.

mod common;

use common::{make_reporter, stash, MockOracle, MockPara, MockRelay};
use eralink_oracle::OracleError;
use eralink_types::ReporterStatus;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn empty_stash_set_skips_the_era() {
    let relay = MockRelay::with_era(42);
    let para = MockPara::with_receipt_script(vec![]);
    let oracle = MockOracle::for_era(42);
    let (mut reporter, status) = make_reporter(relay, para.clone(), oracle, false);

    let cancel = CancellationToken::new();
    reporter.initialize().await.expect("initializes");
    let advanced = reporter.poll_once(&cancel).await.expect("ticks");

    assert!(advanced);
    assert_eq!(para.sent_count(), 0, "no reports built for an empty set");
    assert_eq!(reporter.last_era_reported(), None);
    assert_eq!(*status.borrow(), ReporterStatus::Monitoring);
}

#[tokio::test]
async fn happy_path_reports_every_stash_and_advances() {
    let relay = MockRelay::with_era(42);
    relay.balances.lock().insert(stash(1), 500);
    relay.balances.lock().insert(stash(2), 700);
    let para = MockPara::with_receipt_script(vec![true, true]);
    let oracle = MockOracle::for_era(42);
    *oracle.stashes.lock() = vec![stash(1), stash(2)];
    let (mut reporter, status) = make_reporter(relay, para.clone(), oracle, false);

    let cancel = CancellationToken::new();
    reporter.initialize().await.expect("initializes");
    let advanced = reporter.poll_once(&cancel).await.expect("ticks");

    assert!(advanced);
    assert_eq!(para.sent_count(), 2);
    assert_eq!(reporter.last_era_reported(), Some(42));
    assert_eq!(*status.borrow(), ReporterStatus::Monitoring);

    // Same era again: no advance, nothing re-submitted.
    let advanced = reporter.poll_once(&cancel).await.expect("ticks");
    assert!(!advanced);
    assert_eq!(para.sent_count(), 2);
}

#[tokio::test]
async fn revert_blocks_last_era_reported() {
    let relay = MockRelay::with_era(42);
    let para = MockPara::with_receipt_script(vec![true, false]);
    let oracle = MockOracle::for_era(42);
    *oracle.stashes.lock() = vec![stash(1), stash(2)];
    let (mut reporter, _status) = make_reporter(relay, para.clone(), oracle, false);

    let cancel = CancellationToken::new();
    reporter.initialize().await.expect("initializes");
    reporter.poll_once(&cancel).await.expect("ticks");

    assert_eq!(para.sent_count(), 2, "both stashes were attempted");
    assert_eq!(
        reporter.last_era_reported(),
        None,
        "a revert must keep last_era_reported unchanged"
    );
}

#[tokio::test]
async fn debug_mode_builds_but_never_broadcasts() {
    let relay = MockRelay::with_era(42);
    relay.balances.lock().insert(stash(1), 100);
    let para = MockPara::with_receipt_script(vec![]);
    let oracle = MockOracle::for_era(42);
    *oracle.stashes.lock() = vec![stash(1), stash(2), stash(3)];
    let (mut reporter, _status) = make_reporter(relay, para.clone(), oracle, true);

    let cancel = CancellationToken::new();
    reporter.initialize().await.expect("initializes");
    reporter.poll_once(&cancel).await.expect("ticks");

    assert_eq!(para.sent_count(), 0, "debug mode must not broadcast");
    assert_eq!(reporter.last_era_reported(), None);
}

#[tokio::test]
async fn already_reported_stashes_are_skipped() {
    let relay = MockRelay::with_era(42);
    let para = MockPara::with_receipt_script(vec![true]);
    let oracle = MockOracle::for_era(42);
    *oracle.stashes.lock() = vec![stash(1), stash(2)];

    let (mut reporter, _status) = make_reporter(relay, para.clone(), oracle.clone(), false);
    let member = common::test_config(false).signer.address();
    oracle.reported.lock().insert((member, stash(1)), (42, true));

    let cancel = CancellationToken::new();
    reporter.initialize().await.expect("initializes");
    reporter.poll_once(&cancel).await.expect("ticks");

    assert_eq!(
        para.sent_count(),
        1,
        "only the unreported stash goes on the wire"
    );
    assert_eq!(
        reporter.last_era_reported(),
        Some(42),
        "skipped-as-already-reported still completes the era"
    );
}

#[tokio::test]
async fn contract_not_ready_defers_processing() {
    let relay = MockRelay::with_era(43);
    let para = MockPara::with_receipt_script(vec![]);
    let oracle = MockOracle::for_era(42); // contract still accepts era 42
    *oracle.committed_era.lock() = 42;
    *oracle.stashes.lock() = vec![stash(1)];
    let (mut reporter, _status) = make_reporter(relay, para.clone(), oracle, false);

    let cancel = CancellationToken::new();
    reporter.initialize().await.expect("initializes");
    let advanced = reporter.poll_once(&cancel).await.expect("ticks");

    assert!(advanced, "the era advance itself is still registered");
    assert_eq!(para.sent_count(), 0);
    assert_eq!(reporter.last_era_reported(), None);
}

#[tokio::test]
async fn missing_boundary_block_skips_the_era() {
    let relay = MockRelay::with_era(42);
    *relay.missing_boundary.lock() = true;
    let para = MockPara::with_receipt_script(vec![]);
    let oracle = MockOracle::for_era(42);
    *oracle.stashes.lock() = vec![stash(1)];
    let (mut reporter, _status) = make_reporter(relay, para.clone(), oracle, false);

    let cancel = CancellationToken::new();
    reporter.initialize().await.expect("initializes");
    reporter.poll_once(&cancel).await.expect("ticks");

    assert_eq!(para.sent_count(), 0);
    assert_eq!(reporter.last_era_reported(), None);
}

#[tokio::test]
async fn excessive_contract_skew_is_fatal() {
    let relay = MockRelay::with_era(50);
    let para = MockPara::with_receipt_script(vec![]);
    let oracle = MockOracle::for_era(50);
    // Contract trails by 4 eras at 180 s/era = 720 s > 600 s limit.
    *oracle.committed_era.lock() = 46;
    let (mut reporter, _status) = make_reporter(relay, para, oracle, false);

    let cancel = CancellationToken::new();
    reporter.initialize().await.expect("initializes");
    let err = reporter.poll_once(&cancel).await.expect_err("skew guard");
    assert!(matches!(err, OracleError::SkewFatal(_)));
}
