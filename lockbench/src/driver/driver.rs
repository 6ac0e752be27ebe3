use std::sync::Arc;
use std::time::Duration;

use lockbench_api::{PoolInspector, SubmitError};
use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt};
use tracing::{error, info, warn};

use crate::config::HarnessConfig;
use crate::error::HarnessResult;
use crate::lock::SharedLockState;
use crate::pool::WorkerPool;
use crate::task::{TaskContext, TaskObserver};

use super::command::{Command, CommandParser, CommandReader, TaskRequest};

/// How long to wait for interrupted workers after a forced stop.
pub const FORCED_STOP_WAIT: Duration = Duration::from_secs(1);

/// Counters reported once the driver has shut the pool down.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverSummary {
    pub submitted: usize,
    pub rejected: usize,
    pub skipped: usize,
    /// Queued jobs dropped by a forced stop.
    pub discarded: usize,
    /// Every worker finished within the grace period.
    pub terminated_gracefully: bool,
}

/// Console front end: reads commands, submits tasks, prints snapshots and
/// shuts the pool down on `QUIT` or end of input.
pub struct Driver {
    pool: Arc<WorkerPool>,
    context: TaskContext,
    grace_period: Duration,
}

impl Driver {
    pub fn new(pool: Arc<WorkerPool>, context: TaskContext, grace_period: Duration) -> Self {
        Self {
            pool,
            context,
            grace_period,
        }
    }

    /// Build the pool and the shared lock described by `config`.
    pub fn from_config(
        config: &HarnessConfig,
        observer: Arc<dyn TaskObserver>,
    ) -> HarnessResult<Self> {
        config.validate()?;
        let pool = Arc::new(WorkerPool::new(config.pool.clone())?);
        let context = TaskContext::new(
            Arc::new(SharedLockState::new()),
            config.tasks.clone(),
            observer,
        );
        Ok(Self::new(pool, context, config.grace_period()))
    }

    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }

    pub fn context(&self) -> &TaskContext {
        &self.context
    }

    /// Run the command loop until `QUIT` or end of input, then shut down.
    ///
    /// The pool is shut down even when console I/O fails; the I/O error is
    /// returned once shutdown has finished.
    pub async fn run<R, W>(&self, input: R, output: &mut W) -> HarnessResult<DriverSummary>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut reader = CommandReader::new(input);
        let mut summary = DriverSummary::default();

        let outcome = self.command_loop(&mut reader, output, &mut summary).await;
        if let Err(e) = &outcome {
            error!(error = %e, "Console failed, shutting down");
        }

        let (terminated_gracefully, discarded) = self.shutdown().await?;
        summary.terminated_gracefully = terminated_gracefully;
        summary.discarded = discarded;

        info!(
            submitted = summary.submitted,
            rejected = summary.rejected,
            skipped = summary.skipped,
            discarded = summary.discarded,
            terminated_gracefully = summary.terminated_gracefully,
            "Driver finished"
        );
        outcome.map(|()| summary)
    }

    async fn command_loop<R, W>(
        &self,
        reader: &mut CommandReader<R>,
        output: &mut W,
        summary: &mut DriverSummary,
    ) -> HarnessResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        loop {
            match self.read_command(reader, output).await? {
                Command::Quit => break,
                Command::Info => {
                    let snapshot = self.pool.snapshot();
                    output.write_all(format!("{}\n", snapshot).as_bytes()).await?;
                }
                Command::Submit(request) => match self.submit(request) {
                    Ok(name) => {
                        summary.submitted += 1;
                        output
                            .write_all(format!("Submitted {}\n", name).as_bytes())
                            .await?;
                    }
                    Err(e) => {
                        summary.rejected += 1;
                        output.write_all(format!("{}\n", e).as_bytes()).await?;
                    }
                },
                Command::Skip(reason) => {
                    summary.skipped += 1;
                    warn!(reason = %reason, "Command skipped");
                    output
                        .write_all(format!("Skipped {}\n", reason).as_bytes())
                        .await?;
                }
            }
        }

        output.write_all(b"Shutting down\n").await?;
        output.flush().await?;
        Ok(())
    }

    async fn read_command<R, W>(
        &self,
        reader: &mut CommandReader<R>,
        output: &mut W,
    ) -> HarnessResult<Command>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut parser = CommandParser::new();
        loop {
            output.write_all(parser.prompt().to_string().as_bytes()).await?;
            output.flush().await?;

            let Some(line) = reader.next_line().await? else {
                if parser.in_progress() {
                    warn!("End of input inside a submission, discarding it");
                }
                return Ok(Command::Quit);
            };
            if let Some(command) = parser.accept(line) {
                return Ok(command);
            }
        }
    }

    fn submit(&self, request: TaskRequest) -> Result<String, SubmitError> {
        let job = self.context.job(request.into_task());
        let task = job.task();
        let label = format!(
            "{} ({}, {} units)",
            task.name(),
            task.kind(),
            task.duration_units()
        );
        self.pool.submit(Box::new(job))?;
        Ok(label)
    }

    /// Graceful shutdown with a grace period, escalating to a forced stop.
    ///
    /// Returns whether the pool terminated within the grace period and how
    /// many queued jobs a forced stop discarded.
    pub async fn shutdown(&self) -> HarnessResult<(bool, usize)> {
        self.pool.shutdown();

        let pool = Arc::clone(&self.pool);
        let grace = self.grace_period;
        let terminated =
            tokio::task::spawn_blocking(move || pool.await_termination(grace)).await?;
        if terminated {
            return Ok((true, 0));
        }

        let discarded = self.pool.shutdown_now();
        warn!(
            grace_period = ?grace,
            discarded,
            "Grace period elapsed, forcing shutdown"
        );

        let pool = Arc::clone(&self.pool);
        let stopped =
            tokio::task::spawn_blocking(move || pool.await_termination(FORCED_STOP_WAIT)).await?;
        if !stopped {
            warn!("Workers still running after forced stop");
        }
        Ok((false, discarded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PoolConfig, TaskSettings};
    use crate::error::HarnessError;
    use crate::task::RecordingObserver;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::{AsyncRead, BufReader, ReadBuf};

    /// Console whose reads always fail.
    struct BrokenConsole;

    impl AsyncRead for BrokenConsole {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "console gone")))
        }
    }

    fn test_driver(core: usize, max: usize, queue: usize) -> Driver {
        let config = HarnessConfig {
            pool: PoolConfig::new(core, max, Duration::from_millis(50), queue),
            tasks: TaskSettings {
                time_unit: Duration::from_millis(10),
                try_timeout_units: 5,
                wait_iterations: 1,
            },
            grace_units: 5,
            ..HarnessConfig::default()
        };
        Driver::from_config(&config, Arc::new(RecordingObserver::new())).expect("driver")
    }

    #[tokio::test]
    async fn test_info_then_quit() {
        let driver = test_driver(1, 1, 0);
        let mut output = Vec::new();

        let summary = driver
            .run(&b"INFO\nQUIT\n"[..], &mut output)
            .await
            .expect("run");

        let text = String::from_utf8(output).expect("utf8");
        assert!(text.contains("core pool size        : 1"));
        assert!(text.contains("queue remain capacity : unlimited"));
        assert!(summary.terminated_gracefully);
        assert_eq!(summary.submitted, 0);
    }

    #[tokio::test]
    async fn test_submit_and_skip_counts() {
        let driver = test_driver(1, 1, 0);
        let mut output = Vec::new();

        let summary = driver
            .run(&b"x\nA\n1\nREAD\nx\nB\n1\nEXPLODE\nx\nC\nnope\nWRITE\n"[..], &mut output)
            .await
            .expect("run");

        assert_eq!(summary.submitted, 1);
        assert_eq!(summary.skipped, 2);
        assert!(summary.terminated_gracefully);
        let text = String::from_utf8(output).expect("utf8");
        assert!(text.contains("Submitted A (READ, 1 units)"));
    }

    #[tokio::test]
    async fn test_rejection_is_reported() {
        let driver = test_driver(1, 1, 1);
        let mut output = Vec::new();

        let summary = driver
            .run(&b"x\nA\n20\nWRITE\nx\nB\n0\nWRITE\nx\nC\n0\nWRITE\nquit\n"[..], &mut output)
            .await
            .expect("run");

        assert_eq!(summary.submitted, 2);
        assert_eq!(summary.rejected, 1);
        let text = String::from_utf8(output).expect("utf8");
        assert!(text.contains("Job C rejected"));
    }

    #[tokio::test]
    async fn test_stuck_waiter_forces_shutdown() {
        let driver = test_driver(1, 1, 0);
        let mut output = Vec::new();

        let summary = driver
            .run(&b"x\nW\n0\nWAIT\nx\nQ\n0\nREAD\n"[..], &mut output)
            .await
            .expect("run");

        assert!(!summary.terminated_gracefully);
        assert_eq!(summary.discarded, 1);
        assert!(driver.pool().is_terminated());
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_is_skipped_and_pool_shuts_down() {
        let driver = test_driver(1, 1, 0);
        let mut output = Vec::new();

        let summary = driver
            .run(&b"x\nA\n5\nWRITE\n\xff\xfe\nINFO\nQUIT\n"[..], &mut output)
            .await
            .expect("run");

        assert_eq!(summary.submitted, 1);
        assert_eq!(summary.skipped, 1);
        assert!(summary.terminated_gracefully);
        assert!(driver.pool().is_terminated());
        let text = String::from_utf8(output).expect("utf8");
        assert!(text.contains("Skipped input is not valid UTF-8"));
        assert!(text.contains("core pool size"));
    }

    #[tokio::test]
    async fn test_console_failure_still_shuts_pool_down() {
        let driver = test_driver(1, 1, 0);
        let mut output = Vec::new();

        let result = driver.run(BufReader::new(BrokenConsole), &mut output).await;

        assert!(matches!(result, Err(HarnessError::Io(_))));
        assert!(driver.pool().is_terminated());
    }
}
