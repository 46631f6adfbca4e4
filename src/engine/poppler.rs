use super::{PdfEngine, ToolDiag};
use crate::{config::Config, error::ExtractionError};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

const PDFTOTEXT: &str = "pdftotext";
const PDFTOPPM: &str = "pdftoppm";

/// Drives poppler-utils (`pdftotext`, `pdftoppm`) as subprocesses.
pub struct PopplerEngine {
    pdftotext_exe: PathBuf,
    pdftoppm_exe: PathBuf,
    raster_dpi: u32,
    timeout: Option<Duration>,
    keep_stderr: bool,
}

impl PopplerEngine {
    pub fn new(cfg: &Config) -> Self {
        let timeout = if cfg.tools.timeout_seconds > 0 {
            Some(Duration::from_secs(cfg.tools.timeout_seconds))
        } else {
            None
        };
        Self {
            pdftotext_exe: expand_tilde(&cfg.tools.pdftotext_exe),
            pdftoppm_exe: expand_tilde(&cfg.tools.pdftoppm_exe),
            raster_dpi: cfg.tools.raster_dpi.max(1),
            timeout,
            keep_stderr: cfg.tools.keep_stderr,
        }
    }

    async fn run_tool(
        &self,
        tool: &str,
        exe: &Path,
        args: Vec<OsString>,
    ) -> Result<Output, ExtractionError> {
        debug!("run {} {:?} timeout={:?}", exe.display(), args, self.timeout);
        let mut cmd = Command::new(exe);
        cmd.args(&args);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| spawn_error(tool, e))?;

        // Dropping the wait future on timeout kills the child.
        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(res) => res?,
                Err(_) => {
                    warn!("{tool} timed out after {:?}", limit);
                    return Err(ExtractionError::Timeout {
                        tool: tool.to_string(),
                        seconds: limit.as_secs(),
                    });
                }
            },
            None => child.wait_with_output().await?,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractionError::ExternalTool {
                tool: tool.to_string(),
                reason: format!("{}: {}", output.status, stderr.trim()),
            });
        }

        if self.keep_stderr && !output.stderr.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("{tool} stderr: {}", stderr.trim());
        }

        Ok(output)
    }

    async fn probe_version(&self, tool: &str, exe: &Path) -> ToolDiag {
        let mut diag = ToolDiag {
            tool: tool.to_string(),
            exe: exe.display().to_string(),
            ok: false,
            version: None,
            error: None,
        };
        let res = Command::new(exe)
            .arg("-v")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await;
        match res {
            Ok(out) => {
                // Poppler prints its banner on stderr; older builds exit 99 for -v.
                let banner = format!(
                    "{}\n{}",
                    String::from_utf8_lossy(&out.stderr),
                    String::from_utf8_lossy(&out.stdout)
                );
                diag.version = banner
                    .lines()
                    .find(|l| l.contains("version"))
                    .map(|l| l.trim().to_string());
                diag.ok = diag.version.is_some();
                if !diag.ok {
                    diag.error = Some(format!("unexpected output ({})", out.status));
                }
            }
            Err(e) => diag.error = Some(spawn_error(tool, e).to_string()),
        }
        diag
    }
}

fn spawn_error(tool: &str, e: std::io::Error) -> ExtractionError {
    if e.kind() == std::io::ErrorKind::NotFound {
        ExtractionError::ToolNotFound(tool.to_string())
    } else {
        ExtractionError::Io(e)
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}

#[async_trait]
impl PdfEngine for PopplerEngine {
    async fn doctor(&self) -> Vec<ToolDiag> {
        vec![
            self.probe_version(PDFTOTEXT, &self.pdftotext_exe).await,
            self.probe_version(PDFTOPPM, &self.pdftoppm_exe).await,
        ]
    }

    async fn render_text(&self, input: &Path, dest: &Path) -> Result<(), ExtractionError> {
        // Page breaks must stay in the stream; they are the page delimiter.
        let args = vec![
            OsString::from("-q"),
            OsString::from("-layout"),
            input.as_os_str().to_owned(),
            dest.as_os_str().to_owned(),
        ];
        self.run_tool(PDFTOTEXT, &self.pdftotext_exe, args).await?;
        Ok(())
    }

    async fn rasterize(&self, input: &Path, prefix: &Path) -> Result<(), ExtractionError> {
        let args = vec![
            OsString::from("-q"),
            OsString::from("-png"),
            OsString::from("-r"),
            OsString::from(self.raster_dpi.to_string()),
            input.as_os_str().to_owned(),
            prefix.as_os_str().to_owned(),
        ];
        self.run_tool(PDFTOPPM, &self.pdftoppm_exe, args).await?;
        Ok(())
    }
}
