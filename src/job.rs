//! One document's extraction, start to terminal state.

use crate::{
    config::Config,
    engine::PdfEngine,
    error::ExtractionError,
    extract::DocumentRef,
    normalize::normalize,
    queue::{Job, JobId, JobStore},
    report::ExtractionOutput,
    util::sanitize_stem,
};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

pub const PROGRESS_STARTED: u8 = 10;
pub const PROGRESS_EXTRACTED: u8 = 50;

/// Everything a job needs besides the store.
#[derive(Clone)]
pub struct JobContext {
    pub out_root: PathBuf,
    pub engine: Arc<dyn PdfEngine>,
    pub write_manifest: bool,
    pub manifest_filename: String,
}

impl JobContext {
    pub fn from_config(cfg: &Config, engine: Arc<dyn PdfEngine>) -> Self {
        Self {
            out_root: PathBuf::from(&cfg.paths.out_dir),
            engine,
            write_manifest: cfg.output.write_manifest,
            manifest_filename: cfg.output.manifest_filename.clone(),
        }
    }
}

/// `res_<stem>-<job id>`: the id keeps same-named uploads apart.
pub fn output_dir_for(out_root: &Path, doc: &DocumentRef, id: &JobId) -> PathBuf {
    out_root.join(format!("res_{}-{}", sanitize_stem(doc.original_name()), id))
}

/// Runs an activated job and records its outcome in the store. Never
/// returns an error; failures land on the job.
pub async fn process(ctx: &JobContext, store: &JobStore, job: Job) {
    let started = Instant::now();
    let id = job.id;
    info!(job_id = %id, name = %job.data.original_name(), "job started");

    match run(ctx, store, &job).await {
        Ok(output) => {
            let records = output.data.len();
            match store.complete(&id, output) {
                Ok(()) => info!(
                    job_id = %id,
                    records,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "job completed"
                ),
                Err(e) => error!(job_id = %id, "could not complete job: {e}"),
            }
        }
        Err(err) => {
            let reason = format!("{err:#}");
            warn!(job_id = %id, "job failed: {reason}");
            if let Err(e) = store.fail(&id, reason) {
                error!(job_id = %id, "could not fail job: {e}");
            }
        }
    }
}

/// Extracts, pairs and (optionally) writes the manifest. Progress goes to
/// 10 on entry and 50 once both extraction branches have joined.
pub async fn run(ctx: &JobContext, store: &JobStore, job: &Job) -> Result<ExtractionOutput> {
    store.update_progress(&job.id, PROGRESS_STARTED)?;

    let doc = &job.data;
    let out_dir = output_dir_for(&ctx.out_root, doc, &job.id);
    tokio::fs::create_dir_all(&out_dir)
        .await
        .with_context(|| format!("create output dir {}", out_dir.display()))?;

    let data = match doc.format() {
        Ok(format) => {
            let raw = format
                .extract(doc.path(), &out_dir, ctx.engine.as_ref())
                .await
                .with_context(|| format!("extracting {}", doc.original_name()))?;
            store.update_progress(&job.id, PROGRESS_EXTRACTED)?;
            normalize(&raw)
        }
        Err(ExtractionError::UnsupportedFormat(declared)) => {
            warn!(
                job_id = %job.id,
                "unsupported document type {declared:?}; producing no records"
            );
            store.update_progress(&job.id, PROGRESS_EXTRACTED)?;
            Vec::new()
        }
        Err(e) => return Err(e.into()),
    };

    let output = ExtractionOutput {
        filename: doc.original_name().to_string(),
        output_dir: out_dir.to_string_lossy().into_owned(),
        data,
    };

    if ctx.write_manifest {
        let manifest = out_dir.join(&ctx.manifest_filename);
        tokio::fs::write(&manifest, serde_json::to_string_pretty(&output)?)
            .await
            .with_context(|| format!("write manifest {}", manifest.display()))?;
    }

    Ok(output)
}
