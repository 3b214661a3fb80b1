// End-to-end sync runs against a mock provider and a temporary dataset

mod common;

use common::{SyncTestHarness, TestConfigBuilder, sample_block_stats};
use statsync::core::dataset::RawTimestamp;
use statsync::{SyncError, SyncOutcome};
use time::macros::date;

#[test]
fn test_lagging_dataset_catches_up() {
    let mut h = SyncTestHarness::new();
    h.seed_contiguous(0, 99).unwrap();
    h.remote_chain(100, 102);

    let outcome = h.run().unwrap();
    match outcome {
        SyncOutcome::Saved { plan, fetched, write, failed } => {
            assert_eq!(plan.blocks_to_fetch, 3);
            assert_eq!(fetched, 3);
            assert_eq!(write.rows, 3);
            assert!(failed.is_empty());
        }
        other => panic!("expected a saved batch, got {other:?}"),
    }
    assert_eq!(h.source.requested(), vec![100, 101, 102]);
    assert_eq!(h.partition_heights().unwrap(), vec![100, 101, 102]);
    assert_eq!(h.partition().unwrap()[0], sample_block_stats(100));
}

#[test]
fn test_up_to_date_dataset_does_nothing() {
    let mut h = SyncTestHarness::new();
    h.seed_contiguous(0, 99).unwrap();
    h.remote_chain(0, 99);

    let outcome = h.run().unwrap();
    assert!(matches!(outcome, SyncOutcome::UpToDate(plan) if plan.blocks_to_fetch == 0));
    assert!(h.source.requested().is_empty());
    assert!(!h.partition_exists());
    assert!(!h.layout.incremental_dir().exists());
}

#[test]
fn test_gap_aborts_before_any_network_call() {
    let mut h = SyncTestHarness::new();
    h.seed_contiguous(0, 50).unwrap();
    h.seed_contiguous(52, 60).unwrap();
    h.remote_chain(0, 70);

    let err = h.run().unwrap_err();
    assert!(matches!(err, SyncError::DataIntegrity { after: 50, next: 52, .. }));
    assert_eq!(h.source.network_calls(), 0);
    assert!(!h.partition_exists());
}

#[test]
fn test_failed_block_is_skipped() {
    let mut h = SyncTestHarness::new();
    h.seed_contiguous(0, 99).unwrap();
    h.remote_chain(100, 102);
    h.source.fail_at(101, "HTTP 429: rate limited");

    let outcome = h.run().unwrap();
    match outcome {
        SyncOutcome::Saved { fetched, failed, write, .. } => {
            assert_eq!(fetched, 2);
            assert_eq!(failed, vec![101]);
            assert_eq!(write.rows, 2);
        }
        other => panic!("expected a saved batch, got {other:?}"),
    }
    assert_eq!(h.source.requested(), vec![100, 101, 102]);
    assert_eq!(h.partition_heights().unwrap(), vec![100, 102]);
}

#[test]
fn test_every_block_failing_writes_nothing() {
    let mut h = SyncTestHarness::new();
    h.seed_contiguous(0, 9).unwrap();
    h.remote_chain(10, 11);
    h.source.fail_at(10, "timeout");
    h.source.fail_at(11, "timeout");

    let outcome = h.run().unwrap();
    assert!(matches!(outcome, SyncOutcome::NothingFetched { ref failed, .. } if failed == &vec![10, 11]));
    assert!(!h.partition_exists());
}

#[test]
fn test_same_day_rerun_extends_partition() {
    let mut h = SyncTestHarness::new();
    h.seed_contiguous(0, 99).unwrap();
    h.remote_chain(100, 102);
    h.run().unwrap();

    for height in 103..=105 {
        h.source.set_stats(sample_block_stats(height));
    }
    h.source.set_tip(105);
    let outcome = h.run().unwrap();

    match outcome {
        SyncOutcome::Saved { plan, write, .. } => {
            assert_eq!(plan.local_last_height, 102);
            assert_eq!(write.previous_rows, 3);
            assert_eq!(write.rows, 6);
        }
        other => panic!("expected a saved batch, got {other:?}"),
    }
    assert_eq!(h.source.requested(), (100..=105).collect::<Vec<_>>());
    assert_eq!(h.partition_heights().unwrap(), (100..=105).collect::<Vec<_>>());
}

#[test]
fn test_caught_up_rerun_is_up_to_date() {
    let mut h = SyncTestHarness::new();
    h.seed_contiguous(0, 99).unwrap();
    h.remote_chain(100, 104);
    h.run().unwrap();
    let first = h.partition().unwrap();

    let outcome = h.run().unwrap();
    assert!(matches!(outcome, SyncOutcome::UpToDate(plan) if plan.local_last_height == 104));
    assert_eq!(h.source.requested(), (100..=104).collect::<Vec<_>>());
    assert_eq!(h.partition().unwrap(), first);
}

#[test]
fn test_base_only_rerun_keeps_newest_copy() {
    let mut h = SyncTestHarness::with_builder(TestConfigBuilder::new().with_incremental_in_dataset(false));
    h.seed_contiguous(0, 99).unwrap();
    h.remote_chain(100, 102);
    h.run().unwrap();

    // Partitions are not read back, so the second run asks for the same window.
    h.source.set_stats(sample_block_stats(101).with_field("avgfee", 7_777));
    h.run().unwrap();

    assert_eq!(h.source.requested(), vec![100, 101, 102, 100, 101, 102]);
    let partition = h.partition().unwrap();
    assert_eq!(partition.len(), 3);
    let row = partition.iter().find(|r| r.height == 101).unwrap();
    assert_eq!(row.fields["avgfee"], 7_777);
}

#[test]
fn test_base_only_identical_rerun_is_idempotent() {
    let mut h = SyncTestHarness::with_builder(TestConfigBuilder::new().with_incremental_in_dataset(false));
    h.seed_contiguous(0, 99).unwrap();
    h.remote_chain(100, 104);
    h.run().unwrap();
    let first = h.partition().unwrap();
    h.run().unwrap();
    assert_eq!(h.source.requested().len(), 10);
    assert_eq!(h.partition().unwrap(), first);
}

#[test]
fn test_catch_up_is_capped_per_run() {
    let mut h = SyncTestHarness::with_builder(TestConfigBuilder::new().with_max_blocks(5));
    h.seed_contiguous(0, 99).unwrap();
    h.remote_chain(100, 200);

    let outcome = h.run().unwrap();
    assert_eq!(outcome.plan().blocks_to_fetch, 5);
    assert_eq!(outcome.plan().remaining_after(), 96);
    assert_eq!(h.partition_heights().unwrap(), vec![100, 101, 102, 103, 104]);
}

#[test]
fn test_daily_runs_advance_toward_tip() {
    let mut h = SyncTestHarness::new();
    h.seed_contiguous(0, 99).unwrap();
    h.remote_chain(100, 110);
    let day_before = date!(2024 - 04 - 19);

    h.run_on(day_before).unwrap();
    let outcome = h.run().unwrap();

    assert_eq!(outcome.plan().local_last_height, 104);
    assert_eq!(h.source.requested(), (100..=109).collect::<Vec<_>>());
    assert_eq!(h.partition_heights_on(day_before).unwrap(), vec![100, 101, 102, 103, 104]);
    assert_eq!(h.partition_heights().unwrap(), vec![105, 106, 107, 108, 109]);

    let last = h.run_on(date!(2024 - 04 - 21)).unwrap();
    assert_eq!(last.plan().blocks_to_fetch, 1);
    assert!(matches!(h.run_on(date!(2024 - 04 - 22)).unwrap(), SyncOutcome::UpToDate(_)));
}

#[test]
fn test_base_only_runs_repeat_window() {
    let mut h = SyncTestHarness::with_builder(TestConfigBuilder::new().with_incremental_in_dataset(false));
    h.seed_contiguous(0, 99).unwrap();
    h.remote_chain(100, 110);

    h.run_on(date!(2024 - 04 - 19)).unwrap();
    let outcome = h.run().unwrap();

    assert_eq!(outcome.plan().local_last_height, 99);
    assert_eq!(h.partition_heights().unwrap(), vec![100, 101, 102, 103, 104]);
}

#[test]
fn test_failed_height_stops_next_run_at_the_hole() {
    let mut h = SyncTestHarness::new();
    h.seed_contiguous(0, 99).unwrap();
    h.remote_chain(100, 110);
    h.source.fail_at(101, "timeout");
    h.run().unwrap();

    let calls = h.source.network_calls();
    let err = h.run().unwrap_err();
    assert!(matches!(err, SyncError::DataIntegrity { after: 100, next: 102, .. }));
    assert_eq!(h.source.network_calls(), calls);
}

#[test]
fn test_mixed_timestamp_units_are_accepted() {
    let mut h = SyncTestHarness::new();
    let rows = vec![
        (0, RawTimestamp::Int(1_231_006_505)),
        (1, RawTimestamp::Int(1_231_469_665_000)),
        (2, RawTimestamp::Int(1_231_470_173_000_000)),
    ];
    h.seed_rows(&rows).unwrap();
    h.remote_chain(3, 3);

    let outcome = h.run().unwrap();
    assert!(matches!(outcome, SyncOutcome::Saved { fetched: 1, .. }));
}

#[test]
fn test_empty_dataset_is_rejected() {
    let h = SyncTestHarness::new();
    assert!(matches!(h.run().unwrap_err(), SyncError::EmptyDataset(_)));
    assert_eq!(h.source.network_calls(), 0);
}
