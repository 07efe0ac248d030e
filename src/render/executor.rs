//! Where markdown conversions run.
//!
//! The pipeline never blocks on a conversion: it submits a
//! [`RenderRequest`] and later drains [`RenderCompletion`]s. Completions
//! may arrive in any order.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use super::{MarkdownRenderer, RenderError, render_contained};

/// An immutable snapshot of text submitted for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    /// Issue order; strictly increasing per pipeline.
    pub seq: u64,
    pub text: String,
    pub issued_at_ms: u64,
}

/// The result of a finished [`RenderRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderCompletion {
    pub seq: u64,
    pub result: Result<String, RenderError>,
}

/// Runs render requests and hands back their completions.
pub trait RenderExecutor {
    /// Start converting `request`. Must not block on the conversion.
    fn submit(&mut self, request: RenderRequest);

    /// Take one finished conversion, if any is ready.
    fn try_complete(&mut self) -> Option<RenderCompletion>;
}

impl<E: RenderExecutor + ?Sized> RenderExecutor for Box<E> {
    fn submit(&mut self, request: RenderRequest) {
        (**self).submit(request);
    }

    fn try_complete(&mut self) -> Option<RenderCompletion> {
        (**self).try_complete()
    }
}

/// Renders on submit, on the calling thread.
///
/// Results are still only observable through [`RenderExecutor::try_complete`],
/// so the pipeline treats them exactly like asynchronous ones.
#[derive(Debug)]
pub struct InlineExecutor<R> {
    renderer: R,
    done: VecDeque<RenderCompletion>,
}

impl<R: MarkdownRenderer> InlineExecutor<R> {
    pub const fn new(renderer: R) -> Self {
        Self {
            renderer,
            done: VecDeque::new(),
        }
    }
}

impl<R: MarkdownRenderer> RenderExecutor for InlineExecutor<R> {
    fn submit(&mut self, request: RenderRequest) {
        let _scope = crate::perf::scope("render.inline");
        let result = render_contained(&self.renderer, &request.text);
        self.done.push_back(RenderCompletion {
            seq: request.seq,
            result,
        });
    }

    fn try_complete(&mut self) -> Option<RenderCompletion> {
        self.done.pop_front()
    }
}

/// A pool of background threads sharing one job queue.
pub struct WorkerExecutor {
    jobs: Option<Sender<RenderRequest>>,
    completions: Receiver<RenderCompletion>,
    orphaned: VecDeque<RenderCompletion>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl WorkerExecutor {
    /// Spawn `workers` render threads (at least one).
    ///
    /// # Errors
    /// Returns an error if the OS refuses to create a thread.
    pub fn spawn<R: MarkdownRenderer + 'static>(
        renderer: R,
        workers: usize,
    ) -> std::io::Result<Self> {
        let renderer = Arc::new(renderer);
        let (job_tx, job_rx) = mpsc::channel::<RenderRequest>();
        let (done_tx, done_rx) = mpsc::channel();
        let job_rx = Arc::new(Mutex::new(job_rx));
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut handles = Vec::with_capacity(workers.max(1));
        for idx in 0..workers.max(1) {
            let renderer = Arc::clone(&renderer);
            let jobs = Arc::clone(&job_rx);
            let done = done_tx.clone();
            let shutdown = Arc::clone(&shutdown);
            let handle = std::thread::Builder::new()
                .name(format!("markpane-render-{idx}"))
                .spawn(move || worker_loop(renderer.as_ref(), &jobs, &done, &shutdown))?;
            handles.push(handle);
        }

        Ok(Self {
            jobs: Some(job_tx),
            completions: done_rx,
            orphaned: VecDeque::new(),
            workers: handles,
            shutdown,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }
}

fn worker_loop(
    renderer: &dyn MarkdownRenderer,
    jobs: &Mutex<Receiver<RenderRequest>>,
    done: &Sender<RenderCompletion>,
    shutdown: &AtomicBool,
) {
    loop {
        // Hold the lock only while waiting for the next job.
        let next = match jobs.lock() {
            Ok(rx) => rx.recv(),
            Err(_) => break,
        };
        let Ok(request) = next else {
            break;
        };
        // Queued work left at shutdown is stale; skip it.
        if shutdown.load(Ordering::Acquire) {
            continue;
        }
        let result = {
            let _scope = crate::perf::scope("render.worker");
            render_contained(renderer, &request.text)
        };
        if let Err(err) = &result {
            tracing::debug!(seq = request.seq, %err, "render worker conversion failed");
        }
        if done
            .send(RenderCompletion {
                seq: request.seq,
                result,
            })
            .is_err()
        {
            break;
        }
    }
}

impl RenderExecutor for WorkerExecutor {
    fn submit(&mut self, request: RenderRequest) {
        let seq = request.seq;
        let sent = self
            .jobs
            .as_ref()
            .is_some_and(|jobs| jobs.send(request).is_ok());
        if !sent {
            tracing::warn!(seq, "render workers are gone; request dropped");
            self.orphaned.push_back(RenderCompletion {
                seq,
                result: Err(RenderError::WorkerGone),
            });
        }
    }

    fn try_complete(&mut self) -> Option<RenderCompletion> {
        self.orphaned
            .pop_front()
            .or_else(|| self.completions.try_recv().ok())
    }
}

impl Drop for WorkerExecutor {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        // Closing the job channel ends every worker loop.
        self.jobs = None;
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

impl std::fmt::Debug for WorkerExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerExecutor")
            .field("workers", &self.workers.len())
            .field("open", &self.jobs.is_some())
            .finish_non_exhaustive()
    }
}
