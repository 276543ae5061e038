//! Worker pool running jobs off the caller's thread

use crate::{execute, ErrorKind, JobError, JobMessage, JobRequest, Result};
use crossbeam_channel::{Receiver, Sender};
use pdf_core::Progress;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Messages a job may have in flight before its worker waits for the host
pub const MESSAGE_CAPACITY: usize = 32;

struct Task {
    request: JobRequest,
    cancel: Arc<AtomicBool>,
    messages: Sender<JobMessage>,
}

/// A fixed set of threads taking jobs from a shared queue
///
/// Each job runs on one worker from start to finish and owns its documents;
/// nothing is shared between jobs. Dropping the pool lets queued jobs finish
/// and joins the workers.
pub struct WorkerPool {
    queue: Option<Sender<Task>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Start `threads` workers (at least one)
    pub fn new(threads: usize) -> Self {
        let (queue, tasks) = crossbeam_channel::unbounded::<Task>();
        let workers = (0..threads.max(1))
            .map(|_| {
                let tasks = tasks.clone();
                thread::spawn(move || {
                    for task in tasks.iter() {
                        task.run();
                    }
                })
            })
            .collect();

        Self {
            queue: Some(queue),
            workers,
        }
    }

    /// Queue a job
    pub fn submit(&self, request: JobRequest) -> JobHandle {
        let (sender, messages) = crossbeam_channel::bounded(MESSAGE_CAPACITY);
        let cancel = Arc::new(AtomicBool::new(false));
        let id = request.id.clone();

        let task = Task {
            request,
            cancel: Arc::clone(&cancel),
            messages: sender,
        };
        if let Some(queue) = &self.queue {
            if queue.send(task).is_err() {
                log::warn!("job {id} dropped, no worker is running");
            }
        }

        JobHandle {
            id,
            cancel,
            messages,
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.queue.take();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                log::warn!("worker thread panicked");
            }
        }
    }
}

impl Task {
    fn run(self) {
        let Task {
            request,
            cancel,
            messages,
        } = self;
        let id = request.id.clone();

        if cancel.load(Ordering::Relaxed) {
            log::info!("job {id} cancelled before it started");
            return;
        }

        let outcome = {
            let mut sink = |percent: u8| {
                if cancel.load(Ordering::Relaxed) {
                    return;
                }
                let message = JobMessage::Progress {
                    id: id.clone(),
                    progress: percent,
                };
                // The host dropped its handle; stop at the next report.
                if messages.send(message).is_err() {
                    cancel.store(true, Ordering::Relaxed);
                }
            };
            let mut progress = Progress::with_sink(&mut sink).cancel_on(cancel.as_ref());
            panic::catch_unwind(AssertUnwindSafe(|| execute(&request, &mut progress)))
        };

        if cancel.load(Ordering::Relaxed) {
            log::info!("job {id} cancelled");
            return;
        }

        let message = match outcome {
            Ok(Ok(data)) => JobMessage::Success { id, data },
            Ok(Err(err)) if err.kind == ErrorKind::Cancelled => return,
            Ok(Err(err)) => {
                log::warn!("job {id} failed: {err}");
                JobMessage::Error {
                    id,
                    error: err.message,
                    kind: err.kind,
                }
            }
            Err(_) => {
                log::error!("job {id} panicked");
                JobMessage::Error {
                    id,
                    error: "Internal error while processing the document".to_string(),
                    kind: ErrorKind::Serialize,
                }
            }
        };
        let _ = messages.send(message);
    }
}

/// The caller's side of a submitted job
pub struct JobHandle {
    id: String,
    cancel: Arc<AtomicBool>,
    messages: Receiver<JobMessage>,
}

impl JobHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Messages of this job, ending with `success` or `error`
    ///
    /// The channel closes once the job is done. A cancelled job closes it
    /// without a final message.
    pub fn messages(&self) -> &Receiver<JobMessage> {
        &self.messages
    }

    /// Ask the job to stop at its next cancellation point
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Block until the job ends, discarding progress messages
    pub fn wait(self) -> Result<Vec<Vec<u8>>> {
        for message in self.messages.iter() {
            match message {
                JobMessage::Progress { .. } => continue,
                JobMessage::Success { data, .. } => return Ok(data),
                JobMessage::Error { error, kind, .. } => {
                    return Err(JobError {
                        kind,
                        message: error,
                    })
                }
            }
        }
        Err(JobError::cancelled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TransformKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_validation_error_is_reported() {
        let pool = WorkerPool::new(1);
        let handle = pool.submit(JobRequest::new("a", TransformKind::Merge, vec![]));
        assert_eq!(handle.id(), "a");

        let messages: Vec<JobMessage> = handle.messages().iter().collect();
        assert_eq!(
            messages.last(),
            Some(&JobMessage::Error {
                id: "a".into(),
                error: "merge needs at least one input file".into(),
                kind: ErrorKind::Validation,
            })
        );
        assert_eq!(messages.iter().filter(|m| m.is_final()).count(), 1);
    }

    #[test]
    fn test_dropped_handle_does_not_block_the_pool() {
        let pool = WorkerPool::new(1);
        let text = || vec![crate::InputFile::new("a.txt", "text/plain", b"hello".to_vec())];

        drop(pool.submit(JobRequest::new("gone", TransformKind::TextToPdf, text())));
        let handle = pool.submit(JobRequest::new("kept", TransformKind::TextToPdf, text()));

        let output = handle.wait().unwrap();
        assert_eq!(output.len(), 1);
        assert!(output[0].starts_with(b"%PDF-"));
    }

    #[test]
    fn test_pool_with_zero_threads_still_runs() {
        let pool = WorkerPool::new(0);
        let handle = pool.submit(JobRequest::new("c", TransformKind::TextToPdf, vec![]));
        let err = handle.wait().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }
}
