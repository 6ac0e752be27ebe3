// Integration tests for lockbench_api::snapshot

use lockbench_api::snapshot::{PoolInspector, PoolSnapshot, QueueCapacity};
use std::time::Duration;

fn sample(capacity: QueueCapacity) -> PoolSnapshot {
    PoolSnapshot {
        active_count: 1,
        pool_size: 2,
        queue_size: 3,
        keep_alive: Duration::from_secs(10),
        largest_pool_size: 2,
        core_pool_size: 1,
        maximum_pool_size: 4,
        queue_remaining_capacity: capacity,
    }
}

struct FixedInspector(PoolSnapshot);

impl PoolInspector for FixedInspector {
    fn snapshot(&self) -> PoolSnapshot {
        self.0.clone()
    }
}

#[test]
fn test_queue_capacity_display() {
    assert_eq!(QueueCapacity::Limited(7).to_string(), "7");
    assert_eq!(QueueCapacity::Unlimited.to_string(), "unlimited");
}

#[test]
fn test_snapshot_report_order() {
    let report = sample(QueueCapacity::Limited(5)).to_string();
    let lines: Vec<&str> = report.lines().collect();

    assert_eq!(lines.len(), 8);
    assert!(lines[0].starts_with("active count"));
    assert!(lines[1].starts_with("pool size"));
    assert!(lines[2].starts_with("queue size"));
    assert!(lines[3].starts_with("keep alive"));
    assert!(lines[4].starts_with("largest pool size"));
    assert!(lines[5].starts_with("core pool size"));
    assert!(lines[6].starts_with("maximum pool size"));
    assert!(lines[7].ends_with(": 5"));
}

#[test]
fn test_unbounded_queue_reports_unlimited() {
    let report = sample(QueueCapacity::Unlimited).to_string();
    assert!(report.ends_with("queue remain capacity : unlimited"));
}

#[test]
fn test_inspector_trait_object() {
    let inspector: Box<dyn PoolInspector> = Box::new(FixedInspector(sample(QueueCapacity::Unlimited)));
    let snapshot = inspector.snapshot();
    assert_eq!(snapshot.pool_size, 2);
    assert_eq!(snapshot.maximum_pool_size, 4);
}
