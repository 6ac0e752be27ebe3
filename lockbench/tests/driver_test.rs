//! Console driver runs over in-memory input and output.

use std::sync::Arc;
use std::time::Duration;

use lockbench::config::{HarnessConfig, PoolConfig};
use lockbench::driver::{Command, CommandReader, Driver, DriverSummary, TaskRequest};
use lockbench::task::{RecordingObserver, TaskEvent, TaskKind};

mod test_helpers;
use test_helpers::{fast_settings, TIME_UNIT};

fn config(core: usize, max: usize, queue: usize) -> HarnessConfig {
    HarnessConfig {
        pool: PoolConfig::new(core, max, TIME_UNIT * 10, queue),
        tasks: fast_settings(5, 10),
        grace_units: 20,
        ..HarnessConfig::default()
    }
}

async fn run(
    config: &HarnessConfig,
    script: &str,
) -> (DriverSummary, String, Arc<RecordingObserver>, Driver) {
    let observer = Arc::new(RecordingObserver::new());
    let driver = Driver::from_config(config, observer.clone()).expect("driver");
    let mut output = Vec::new();
    let summary = driver
        .run(script.as_bytes(), &mut output)
        .await
        .expect("driver run");
    let text = String::from_utf8(output).expect("utf8 output");
    (summary, text, observer, driver)
}

#[tokio::test]
async fn test_writers_submitted_from_console_serialise() {
    let (summary, text, observer, _driver) =
        run(&config(1, 1, 0), "add\na\n3\nwrite\nadd\nb\n1\nWRITE\nINFO\nQUIT\n").await;

    assert_eq!(summary.submitted, 2);
    assert_eq!(summary.rejected, 0);
    assert!(text.contains("Submitted A (WRITE, 3 units)"));
    assert!(text.contains("maximum pool size     : 1"));

    // 4 units of work against a 20 unit grace period.
    assert!(summary.terminated_gracefully);
    let a_finished = observer.first("A", &TaskEvent::Finished).expect("A finished");
    let b_started = observer.first("B", &TaskEvent::Started).expect("B started");
    assert!(b_started >= a_finished);
}

#[tokio::test]
async fn test_end_of_input_quits() {
    let (summary, text, _observer, driver) = run(&config(1, 2, 1), "info").await;

    assert_eq!(
        summary,
        DriverSummary {
            terminated_gracefully: true,
            ..DriverSummary::default()
        }
    );
    assert!(text.contains("queue remain capacity : 1"));
    assert!(text.ends_with("Shutting down\n"));
    assert!(driver.pool().is_terminated());
}

#[tokio::test]
async fn test_task_name_may_contain_spaces() {
    let (summary, text, observer, _driver) =
        run(&config(1, 1, 0), "x\nmy task\n1\nREAD\nQUIT\n").await;

    assert_eq!(summary.submitted, 1);
    assert_eq!(summary.skipped, 0);
    assert!(text.contains("Submitted MY TASK (READ, 1 units)"));
    assert!(observer.first("MY TASK", &TaskEvent::Finished).is_some());
}

#[tokio::test]
async fn test_unknown_kind_submits_nothing() {
    let (summary, text, observer, _driver) = run(&config(1, 1, 0), "x\nQ\n1\nLOCK\nquit\n").await;

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.submitted, 0);
    assert!(text.contains("Skipped Q: Unknown task kind: LOCK"));
    assert!(observer.events().is_empty());
}

#[tokio::test]
async fn test_waiter_without_signal_is_forced_down() {
    let (summary, _text, observer, driver) = run(&config(1, 1, 0), "x\nW\n0\nWAIT\n").await;

    assert!(!summary.terminated_gracefully);
    assert!(driver.pool().is_terminated());
    let events = observer.events_for("W");
    assert!(matches!(events.last(), Some(TaskEvent::Failed(_))));
    assert!(!driver.context().lock().is_write_locked());
}

#[tokio::test]
async fn test_wait_and_signal_from_console() {
    let cfg = HarnessConfig {
        tasks: fast_settings(5, 1),
        ..config(2, 2, 0)
    };
    let observer = Arc::new(RecordingObserver::new());
    let driver = Driver::from_config(&cfg, observer.clone()).expect("driver");

    let (client, server) = tokio::io::duplex(256);
    let (server_read, _server_write) = tokio::io::split(server);
    let (_client_read, mut client_write) = tokio::io::split(client);

    let mut output = Vec::new();
    let driving = driver.run(tokio::io::BufReader::new(server_read), &mut output);
    let feed = async {
        use tokio::io::AsyncWriteExt;
        client_write.write_all(b"x\nW\n0\nWAIT\n").await.expect("write");
        while driver.context().lock().condition_waiters() == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        client_write.write_all(b"x\nS\n0\nSIGNAL\nquit\n").await.expect("write");
    };

    let (summary, ()) = tokio::join!(driving, feed);
    let summary = summary.expect("driver run");

    assert_eq!(summary.submitted, 2);
    assert!(summary.terminated_gracefully);
    assert_eq!(
        observer.events_for("W"),
        vec![
            TaskEvent::Started,
            TaskEvent::Finished,
            TaskEvent::Awakened { iteration: 1 },
        ]
    );
}

#[tokio::test]
async fn test_reader_yields_commands_in_order() {
    let input = "INFO\n\nnew\nR\n2\nread\nnew\n T \n1\ntry\nQuit\n";
    let mut reader = CommandReader::new(input.as_bytes());

    assert_eq!(reader.next_command().await.expect("read"), Command::Info);
    assert_eq!(
        reader.next_command().await.expect("read"),
        Command::Submit(TaskRequest {
            name: "R".to_string(),
            duration_units: 2,
            kind: TaskKind::Read,
        })
    );
    assert_eq!(
        reader.next_command().await.expect("read"),
        Command::Submit(TaskRequest {
            name: "T".to_string(),
            duration_units: 1,
            kind: TaskKind::TryWrite,
        })
    );
    assert_eq!(reader.next_command().await.expect("read"), Command::Quit);
}
