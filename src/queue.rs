//! In-memory job registry and work queue.
//!
//! Producers call [`JobStore::enqueue`]; a worker pulls with
//! [`JobStore::next_job`] and drives the job to a terminal state. Each job is
//! mutated only by the worker that activated it.

use crate::{error::QueueError, extract::DocumentRef, report::ExtractionOutput, util::now_rfc3339};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{Notify, broadcast};
use tracing::{debug, warn};

const EVENT_CAPACITY: usize = 1024;

/// Highest progress a job can report before its result is attached.
const MAX_ACTIVE_PROGRESS: u8 = 99;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = QueueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(JobId)
            .map_err(|_| QueueError::NotFound(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Waiting,
    Active,
    Completed,
    Failed,
}

impl JobState {
    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Waiting => "waiting",
            JobState::Active => "active",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

/// Snapshot of a job as seen by status readers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub data: DocumentRef,
    pub progress: u8,
    pub state: JobState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returnvalue: Option<ExtractionOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_reason: Option<String>,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_on: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    Active { id: JobId },
    Progress { id: JobId, progress: u8 },
    Completed { id: JobId },
    Failed { id: JobId, reason: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCounts {
    pub waiting: usize,
    pub active: usize,
    pub completed: usize,
    pub failed: usize,
}

#[derive(Default)]
struct Inner {
    jobs: BTreeMap<JobId, Job>,
    waiting: VecDeque<JobId>,
    next_id: u64,
    closed: bool,
}

/// Cloneable handle; clones share the same jobs.
#[derive(Clone)]
pub struct JobStore {
    inner: Arc<Mutex<Inner>>,
    wake: Arc<Notify>,
    events: broadcast::Sender<JobEvent>,
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl JobStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            wake: Arc::new(Notify::new()),
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, event: JobEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.events.subscribe()
    }

    /// Registers a document for extraction. The work happens later, on a worker.
    pub fn enqueue(&self, doc: DocumentRef) -> JobId {
        let id = {
            let mut inner = self.lock();
            inner.next_id += 1;
            let id = JobId(inner.next_id);
            inner.jobs.insert(
                id,
                Job {
                    id,
                    data: doc,
                    progress: 0,
                    state: JobState::Waiting,
                    returnvalue: None,
                    failed_reason: None,
                    timestamp: now_rfc3339(),
                    processed_on: None,
                    finished_on: None,
                },
            );
            inner.waiting.push_back(id);
            id
        };
        debug!(job_id = %id, "job enqueued");
        self.wake.notify_one();
        id
    }

    pub fn get_job(&self, id: &JobId) -> Option<Job> {
        self.lock().jobs.get(id).cloned()
    }

    /// Jobs in enqueue order. An empty filter matches every state.
    pub fn list_jobs(&self, states: &[JobState]) -> Vec<Job> {
        self.lock()
            .jobs
            .values()
            .filter(|j| states.is_empty() || states.contains(&j.state))
            .cloned()
            .collect()
    }

    pub fn counts(&self) -> JobCounts {
        let inner = self.lock();
        let mut counts = JobCounts::default();
        for job in inner.jobs.values() {
            match job.state {
                JobState::Waiting => counts.waiting += 1,
                JobState::Active => counts.active += 1,
                JobState::Completed => counts.completed += 1,
                JobState::Failed => counts.failed += 1,
            }
        }
        counts
    }

    /// Waits for the next waiting job and marks it active. Returns `None`
    /// once the store is closed and nothing is left waiting.
    pub async fn next_job(&self) -> Option<Job> {
        loop {
            let notified = self.wake.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut inner = self.lock();
                if let Some(id) = inner.waiting.pop_front() {
                    if let Some(job) = inner.jobs.get_mut(&id) {
                        job.state = JobState::Active;
                        job.processed_on = Some(now_rfc3339());
                        let snapshot = job.clone();
                        drop(inner);
                        self.emit(JobEvent::Active { id });
                        return Some(snapshot);
                    }
                    // Removed while waiting.
                    continue;
                }
                if inner.closed {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Signals that no more work is expected: workers exit once the waiting
    /// list is empty. Later enqueues are still accepted.
    pub fn close(&self) {
        self.lock().closed = true;
        self.wake.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Records progress for an active job. Values never go down, and 100 is
    /// reserved for completion.
    pub fn update_progress(&self, id: &JobId, percent: u8) -> Result<(), QueueError> {
        let percent = percent.min(MAX_ACTIVE_PROGRESS);
        {
            let mut inner = self.lock();
            let job = active_job(&mut inner, id, "active")?;
            if percent < job.progress {
                warn!(
                    job_id = %id,
                    current = job.progress,
                    requested = percent,
                    "ignoring progress decrease"
                );
                return Ok(());
            }
            job.progress = percent;
        }
        self.emit(JobEvent::Progress {
            id: *id,
            progress: percent,
        });
        Ok(())
    }

    pub fn complete(&self, id: &JobId, output: ExtractionOutput) -> Result<(), QueueError> {
        {
            let mut inner = self.lock();
            let job = active_job(&mut inner, id, "completed")?;
            job.returnvalue = Some(output);
            job.progress = 100;
            job.state = JobState::Completed;
            job.finished_on = Some(now_rfc3339());
        }
        self.emit(JobEvent::Progress {
            id: *id,
            progress: 100,
        });
        self.emit(JobEvent::Completed { id: *id });
        Ok(())
    }

    pub fn fail(&self, id: &JobId, reason: impl Into<String>) -> Result<(), QueueError> {
        let reason = reason.into();
        {
            let mut inner = self.lock();
            let job = active_job(&mut inner, id, "failed")?;
            job.failed_reason = Some(reason.clone());
            job.state = JobState::Failed;
            job.finished_on = Some(now_rfc3339());
        }
        self.emit(JobEvent::Failed { id: *id, reason });
        Ok(())
    }

    /// Drops a finished job from the store.
    pub fn remove(&self, id: &JobId) -> Result<Job, QueueError> {
        let mut inner = self.lock();
        let state = inner
            .jobs
            .get(id)
            .map(|j| j.state)
            .ok_or_else(|| QueueError::NotFound(id.to_string()))?;
        if !state.is_terminal() {
            return Err(QueueError::InvalidTransition {
                id: id.to_string(),
                from: state.as_str(),
                to: "removed",
            });
        }
        inner
            .jobs
            .remove(id)
            .ok_or_else(|| QueueError::NotFound(id.to_string()))
    }
}

fn active_job<'a>(
    inner: &'a mut Inner,
    id: &JobId,
    to: &'static str,
) -> Result<&'a mut Job, QueueError> {
    let job = inner
        .jobs
        .get_mut(id)
        .ok_or_else(|| QueueError::NotFound(id.to_string()))?;
    if job.state != JobState::Active {
        return Err(QueueError::InvalidTransition {
            id: id.to_string(),
            from: job.state.as_str(),
            to,
        });
    }
    Ok(job)
}
