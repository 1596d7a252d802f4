//! Streaming process pipeline
//!
//! Connects two subprocesses so the producer's stdout feeds the consumer's
//! stdin through an OS pipe, while background threads drain both error
//! streams from the moment each process starts.
//!
//! The drains are the correctness core: a wait-then-read strategy deadlocks
//! whenever either process fills its stderr pipe buffer before the caller
//! reads it, because the process blocks on the write while the caller
//! blocks on an unrelated wait. Draining from spawn eliminates that.
//!
//! Each pipeline run owns its process pair and drain threads exclusively;
//! nothing is shared across invocations.

use std::io::Read;
use std::process::{Child, ChildStdout, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::{BackupError, BackupResult};

/// Read size for drain threads
const DRAIN_CHUNK: usize = 64 * 1024;

/// Upper bound on captured stderr per process. The drain keeps reading to
/// end-of-stream past this limit, but stops retaining bytes.
const STDERR_CAPTURE_LIMIT: usize = 256 * 1024;

/// How often the wait loop polls child exit status
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Background reader that drains one pipe to end-of-stream
///
/// Started immediately after spawn so the child can never block on a full
/// pipe buffer. Collected bytes are bounded by `STDERR_CAPTURE_LIMIT`.
pub struct PipeDrain {
    handle: Option<JoinHandle<Vec<u8>>>,
}

impl PipeDrain {
    /// Start draining `reader` in a background thread
    ///
    /// A `None` reader yields a drain that joins to empty output, so callers
    /// don't need to special-case children spawned without that pipe.
    pub fn start<R: Read + Send + 'static>(reader: Option<R>) -> Self {
        let handle = reader.map(|mut reader| {
            thread::spawn(move || {
                let mut captured = Vec::new();
                let mut buf = vec![0u8; DRAIN_CHUNK];
                loop {
                    match reader.read(&mut buf) {
                        Ok(0) => break,
                        Ok(n) => {
                            let room = STDERR_CAPTURE_LIMIT.saturating_sub(captured.len());
                            captured.extend_from_slice(&buf[..n.min(room)]);
                        }
                        Err(_) => break,
                    }
                }
                captured
            })
        });
        Self { handle }
    }

    /// Join the drain thread and return everything it captured
    pub fn join(self) -> Vec<u8> {
        match self.handle {
            Some(handle) => handle.join().unwrap_or_default(),
            None => Vec::new(),
        }
    }
}

/// Outcome of a completed pipeline run
///
/// Only produced when both processes actually ran to termination; spawn
/// failures surface as errors before a result exists.
#[derive(Debug)]
pub struct PipelineResult {
    /// Exit status of the producer (dump or download side)
    pub producer_status: ExitStatus,
    /// Exit status of the consumer (upload or restore side)
    pub consumer_status: ExitStatus,
    /// Captured producer stderr (bounded)
    pub producer_stderr: String,
    /// Captured consumer stderr (bounded)
    pub consumer_stderr: String,
    /// Whether the run was cut off by the wall-clock timeout
    pub timed_out: bool,
}

impl PipelineResult {
    /// True only if both processes exited zero and no timeout fired
    pub fn success(&self) -> bool {
        !self.timed_out && self.producer_status.success() && self.consumer_status.success()
    }

    /// Combined stderr text of both processes for diagnostics
    pub fn combined_stderr(&self) -> String {
        let mut out = String::new();
        if !self.producer_stderr.trim().is_empty() {
            out.push_str(self.producer_stderr.trim());
        }
        if !self.consumer_stderr.trim().is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(self.consumer_stderr.trim());
        }
        if self.timed_out {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str("pipeline timed out");
        }
        out
    }
}

/// Orchestrates one producer/consumer process pair
pub struct Pipeline {
    timeout: Option<Duration>,
}

impl Pipeline {
    /// Pipeline with no wall-clock ceiling
    pub fn new() -> Self {
        Self { timeout: None }
    }

    /// Pipeline with an optional wall-clock ceiling; on expiry both
    /// processes are killed and the result is marked timed out
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    /// Run the pipeline to completion
    ///
    /// Both children must already be spawned, with the producer's stdout
    /// connected to the consumer's stdin (see [`take_stdout`]). Drains for
    /// both stderr streams (and any leftover piped stdout) start before
    /// any waiting happens. Exit statuses are collected order-independently;
    /// neither process is killed early when the other fails — EOF
    /// propagation ends the survivor naturally.
    pub fn run(&self, mut producer: Child, mut consumer: Child) -> BackupResult<PipelineResult> {
        let producer_stderr = PipeDrain::start(producer.stderr.take());
        let consumer_stderr = PipeDrain::start(consumer.stderr.take());
        // Not part of the data stream, but a chatty tool writing to an
        // unread stdout pipe would block just the same.
        let producer_stdout = PipeDrain::start(producer.stdout.take());
        let consumer_stdout = PipeDrain::start(consumer.stdout.take());

        let deadline = self.timeout.map(|t| Instant::now() + t);
        let mut timed_out = false;
        let mut producer_status: Option<ExitStatus> = None;
        let mut consumer_status: Option<ExitStatus> = None;

        let (producer_status, consumer_status) = loop {
            if producer_status.is_none() {
                producer_status = producer.try_wait()?;
            }
            if consumer_status.is_none() {
                consumer_status = consumer.try_wait()?;
            }
            if let (Some(p), Some(c)) = (producer_status, consumer_status) {
                break (p, c);
            }

            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    warn!("pipeline deadline elapsed; terminating both processes");
                    timed_out = true;
                    abort(&mut producer);
                    abort(&mut consumer);
                    break (producer.wait()?, consumer.wait()?);
                }
            }
            thread::sleep(POLL_INTERVAL);
        };

        // Drains see end-of-stream once the processes are gone; joining
        // here guarantees the captured text is complete.
        let producer_stderr = String::from_utf8_lossy(&producer_stderr.join()).into_owned();
        let consumer_stderr = String::from_utf8_lossy(&consumer_stderr.join()).into_owned();
        producer_stdout.join();
        consumer_stdout.join();

        debug!(
            producer = %producer_status,
            consumer = %consumer_status,
            timed_out,
            "pipeline finished"
        );

        Ok(PipelineResult {
            producer_status,
            consumer_status,
            producer_stderr,
            consumer_stderr,
            timed_out,
        })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Take a child's piped stdout for connecting to the next process's stdin
pub fn take_stdout(child: &mut Child) -> BackupResult<ChildStdout> {
    child.stdout.take().ok_or_else(|| BackupError::Pipeline {
        stage: "setup",
        detail: "producer was spawned without a piped stdout".into(),
    })
}

/// Take a child's piped stdout as a `Stdio` for the consumer's stdin
pub fn take_stdout_stdio(child: &mut Child) -> BackupResult<Stdio> {
    take_stdout(child).map(Stdio::from)
}

/// Terminate a child forcibly, reaping it to avoid a zombie
///
/// Used when the other half of a pipeline failed to spawn, and on timeout.
pub fn abort(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
