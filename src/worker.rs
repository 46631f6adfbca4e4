//! Queue consumer. Runs up to `concurrency` jobs at once; a job that errors
//! or panics is marked failed and the loop carries on.

use crate::{
    job::{self, JobContext},
    queue::JobStore,
};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

pub struct Worker {
    store: JobStore,
    ctx: Arc<JobContext>,
    concurrency: usize,
}

impl Worker {
    pub fn new(store: JobStore, ctx: JobContext, concurrency: usize) -> Self {
        Self {
            store,
            ctx: Arc::new(ctx),
            concurrency: concurrency.max(1),
        }
    }

    /// Consumes jobs until the store is closed and drained, then waits for
    /// in-flight jobs. Returns the number of jobs processed.
    pub async fn run(self) -> usize {
        info!(concurrency = self.concurrency, "worker started");
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        let mut processed = 0usize;

        loop {
            // Take a slot before activating a job so nothing sits "active" unrun.
            let Ok(permit) = permits.clone().acquire_owned().await else {
                break;
            };
            let Some(job) = self.store.next_job().await else {
                break;
            };
            processed += 1;

            let ctx = self.ctx.clone();
            let store = self.store.clone();
            tasks.spawn(async move {
                let _permit = permit;
                let id = job.id;
                let handle = tokio::spawn({
                    let store = store.clone();
                    async move { job::process(&ctx, &store, job).await }
                });
                if let Err(e) = handle.await {
                    error!(job_id = %id, "job task aborted: {e}");
                    if let Err(e) = store.fail(&id, format!("worker task aborted: {e}")) {
                        error!(job_id = %id, "could not fail job: {e}");
                    }
                }
            });

            while tasks.try_join_next().is_some() {}
        }

        debug!("queue drained; waiting for {} in-flight jobs", tasks.len());
        while tasks.join_next().await.is_some() {}
        info!(processed, "worker stopped");
        processed
    }
}
