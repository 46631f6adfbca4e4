use crate::{
    config::Config,
    engine::{PdfEngine, PopplerEngine},
    extract::{DocumentRef, Format},
    job::JobContext,
    queue::{JobEvent, JobState, JobStore},
    util::ensure_dir,
    worker::Worker,
};
use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "pagepair")]
#[command(about = "Extract per-page (text, image) pairs from PDF, DOCX, PPTX and text files")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./pagepair.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check that the PDF tools can be executed.
    Doctor {},
    /// Queue every input and process them all; prints the job list.
    Run {
        #[arg(long = "input", required = true)]
        inputs: Vec<PathBuf>,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Process a single document; prints its manifest.
    Extract {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

pub async fn dispatch(args: Args) -> Result<()> {
    let mut cfg = match resolve_config_path(args.config.as_deref()) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };
    let _guard = init_logging(&args, &cfg)?;

    match &args.cmd {
        Command::Doctor {} => doctor(&cfg).await,
        Command::Run { inputs, out_dir } => {
            if let Some(dir) = out_dir {
                cfg.paths.out_dir = dir.display().to_string();
            }
            run(&cfg, inputs).await
        }
        Command::Extract { input, out_dir } => {
            if let Some(dir) = out_dir {
                cfg.paths.out_dir = dir.display().to_string();
            }
            extract_one(&cfg, input).await
        }
    }
}

fn resolve_config_path(user: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = user {
        return Some(p.to_path_buf());
    }
    let default = PathBuf::from("pagepair.toml");
    default.exists().then_some(default)
}

fn init_logging(args: &Args, cfg: &Config) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Logs go to stderr; stdout carries the JSON results.
    let stderr_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = match resolve_log_path(cfg) {
        Some(path) => {
            let parent = path.parent().unwrap_or_else(|| Path::new("."));
            ensure_dir(parent)?;
            let file = std::fs::File::create(&path)
                .with_context(|| format!("create log file: {}", path.display()))?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }
    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }
    Some(PathBuf::from(&cfg.paths.out_dir).join("pagepair.log"))
}

async fn doctor(cfg: &Config) -> Result<()> {
    let engine = PopplerEngine::new(cfg);
    let diag = engine.doctor().await;
    println!("{}", serde_json::to_string_pretty(&diag)?);
    if diag.iter().any(|d| !d.ok) {
        return Err(anyhow!("one or more tools are unavailable"));
    }
    Ok(())
}

async fn run(cfg: &Config, inputs: &[PathBuf]) -> Result<()> {
    let store = JobStore::new();
    let mut rejected = Vec::new();

    for input in inputs {
        match validate_input(cfg, input) {
            Ok(doc) => {
                let id = store.enqueue(doc);
                info!(job_id = %id, "queued {}", input.display());
            }
            Err(err) => {
                warn!("rejected {}: {err:#}", input.display());
                rejected.push(serde_json::json!({
                    "input": input,
                    "error": format!("{err:#}"),
                }));
            }
        }
    }
    store.close();

    let progress_log = spawn_progress_log(&store);
    process_queue(cfg, &store).await?;
    progress_log.abort();

    let jobs = store.list_jobs(&[]);
    let counts = store.counts();
    if cfg.output.print_summary {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "jobs": jobs,
                "counts": counts,
                "rejected": rejected,
            }))?
        );
    }

    if counts.failed > 0 || !rejected.is_empty() {
        return Err(anyhow!(
            "{} failed, {} rejected of {} inputs",
            counts.failed,
            rejected.len(),
            inputs.len()
        ));
    }
    Ok(())
}

async fn extract_one(cfg: &Config, input: &Path) -> Result<()> {
    let doc = validate_input(cfg, input)?;
    let store = JobStore::new();
    let id = store.enqueue(doc);
    store.close();
    process_queue(cfg, &store).await?;

    let job = store
        .get_job(&id)
        .ok_or_else(|| anyhow!("job {id} disappeared"))?;
    match (job.state, job.returnvalue) {
        (JobState::Completed, Some(output)) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        _ => Err(anyhow!(
            "extraction failed: {}",
            job.failed_reason.unwrap_or_else(|| "unknown".to_string())
        )),
    }
}

async fn process_queue(cfg: &Config, store: &JobStore) -> Result<()> {
    ensure_dir(Path::new(&cfg.paths.out_dir))?;
    let engine: Arc<dyn PdfEngine> = Arc::new(PopplerEngine::new(cfg));
    let ctx = JobContext::from_config(cfg, engine);
    Worker::new(store.clone(), ctx, cfg.worker.concurrency)
        .run()
        .await;
    Ok(())
}

fn spawn_progress_log(store: &JobStore) -> tokio::task::JoinHandle<()> {
    let mut events = store.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let JobEvent::Progress { id, progress } = event {
                info!(job_id = %id, progress, "progress");
            }
        }
    })
}

/// Admission checks normally done by the upload layer: URL rejection,
/// existence, size ceiling and supported type.
pub fn validate_input(cfg: &Config, input: &Path) -> Result<DocumentRef> {
    let input_str = input.display().to_string();

    if cfg.security.reject_url_inputs && looks_like_url(&input_str) {
        return Err(anyhow!("URL inputs are disabled: {input_str}"));
    }

    let meta = std::fs::metadata(input)
        .with_context(|| format!("input does not exist: {}", input.display()))?;
    if !meta.is_file() {
        return Err(anyhow!("input is not a file: {}", input.display()));
    }
    if meta.len() > cfg.limits.max_input_file_bytes {
        return Err(anyhow!(
            "input exceeds max_input_file_bytes ({} > {})",
            meta.len(),
            cfg.limits.max_input_file_bytes
        ));
    }

    let original_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("input has no file name: {}", input.display()))?;
    let doc = DocumentRef::new(input, original_name);
    let format: Format = doc.format()?;
    info!("accepted {} as {:?}", input.display(), format);
    Ok(doc)
}

fn looks_like_url(s: &str) -> bool {
    let s = s.to_ascii_lowercase();
    s.starts_with("http://") || s.starts_with("https://") || s.starts_with("file://")
}
