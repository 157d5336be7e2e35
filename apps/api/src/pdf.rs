//! DOCX → PDF conversion through a headless office suite.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tracing::{debug, info};

/// Conversions allowed to run at once unless configured otherwise.
pub const DEFAULT_MAX_PARALLEL: usize = 2;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("failed to start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create converter profile: {0}")]
    Profile(#[source] std::io::Error),

    #[error("conversion timed out after {0}s")]
    Timeout(u64),

    #[error("converter exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("converter finished but {} was not produced", .0.display())]
    MissingOutput(PathBuf),
}

/// Carried in `AppState` as `Arc<dyn PdfConverter>`.
#[async_trait]
pub trait PdfConverter: Send + Sync {
    /// Writes `<stem>.pdf` next to `docx` and returns its path.
    async fn convert(&self, docx: &Path) -> Result<PathBuf, PdfError>;
}

/// LibreOffice / soffice in headless mode.
///
/// Each call gets a throwaway user profile; instances sharing one profile
/// lock each other out.
#[derive(Debug, Clone)]
pub struct LibreOfficeConverter {
    command: String,
    timeout: Duration,
    max_parallel: usize,
    permits: Arc<Semaphore>,
}

impl LibreOfficeConverter {
    pub fn new(command: Option<String>, timeout: Duration) -> Self {
        Self {
            command: command.unwrap_or_else(|| default_command().to_string()),
            timeout,
            max_parallel: DEFAULT_MAX_PARALLEL,
            permits: Arc::new(Semaphore::new(DEFAULT_MAX_PARALLEL)),
        }
    }

    /// Caps how many office processes run at once; 0 is treated as 1.
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self.permits = Arc::new(Semaphore::new(self.max_parallel));
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }
}

/// `-env:UserInstallation` wants a file URL, also on Windows.
fn profile_url(dir: &Path) -> String {
    let path = dir.to_string_lossy().replace('\\', "/");
    let path = urlencoding::encode(&path).replace("%2F", "/").replace("%3A", ":");
    if path.starts_with('/') {
        format!("file://{path}")
    } else {
        format!("file:///{path}")
    }
}

/// Where LibreOffice usually lives on this OS.
pub fn default_command() -> &'static str {
    if cfg!(target_os = "macos") {
        "/Applications/LibreOffice.app/Contents/MacOS/soffice"
    } else if cfg!(windows) {
        "soffice.exe"
    } else {
        "libreoffice"
    }
}

#[async_trait]
impl PdfConverter for LibreOfficeConverter {
    async fn convert(&self, docx: &Path) -> Result<PathBuf, PdfError> {
        let out_dir = docx.parent().unwrap_or_else(|| Path::new("."));
        let pdf_path = docx.with_extension("pdf");

        // Held until the process has exited or been killed.
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| PdfError::Profile(std::io::Error::other(e)))?;
        let profile = tempfile::Builder::new()
            .prefix("lo-profile-")
            .tempdir()
            .map_err(PdfError::Profile)?;

        debug!("Converting {} with {}", docx.display(), self.command);

        let child = Command::new(&self.command)
            .arg(format!("-env:UserInstallation={}", profile_url(profile.path())))
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg(docx)
            .arg("--outdir")
            .arg(out_dir)
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| PdfError::Timeout(self.timeout.as_secs()))?
            .map_err(|source| PdfError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(PdfError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        if !pdf_path.exists() {
            return Err(PdfError::MissingOutput(pdf_path));
        }

        info!("Converted {} to PDF", docx.display());
        Ok(pdf_path)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Writes a placeholder PDF next to the document.
    pub(crate) struct FakeConverter;

    #[async_trait]
    impl PdfConverter for FakeConverter {
        async fn convert(&self, docx: &Path) -> Result<PathBuf, PdfError> {
            let pdf = docx.with_extension("pdf");
            tokio::fs::write(&pdf, b"%PDF-1.4").await.unwrap();
            Ok(pdf)
        }
    }

    pub(crate) struct BrokenConverter;

    #[async_trait]
    impl PdfConverter for BrokenConverter {
        async fn convert(&self, _docx: &Path) -> Result<PathBuf, PdfError> {
            Err(PdfError::Timeout(120))
        }
    }

    #[test]
    fn test_default_command_is_set() {
        let converter = LibreOfficeConverter::new(None, Duration::from_secs(1));
        assert_eq!(converter.command(), default_command());

        let converter =
            LibreOfficeConverter::new(Some("/opt/soffice".into()), Duration::from_secs(1));
        assert_eq!(converter.command(), "/opt/soffice");
        assert_eq!(converter.max_parallel(), DEFAULT_MAX_PARALLEL);
        assert_eq!(converter.with_max_parallel(0).max_parallel(), 1);
    }

    #[test]
    fn test_profile_url() {
        assert_eq!(
            profile_url(Path::new("/tmp/lo-profile-ab12")),
            "file:///tmp/lo-profile-ab12"
        );
        assert_eq!(
            profile_url(Path::new("/tmp/my dir/p")),
            "file:///tmp/my%20dir/p"
        );
        assert_eq!(
            profile_url(Path::new(r"C:\Users\me\AppData\Local\Temp\p")),
            "file:///C:/Users/me/AppData/Local/Temp/p"
        );
    }

    // Every case that spawns a process lives in one test: writing a script
    // while another test thread forks can make exec fail with ETXTBSY.
    #[cfg(unix)]
    #[tokio::test]
    async fn test_converter_process_outcomes() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let docx = dir.path().join("AI 고소장 홍길동_사기_153045.docx");
        std::fs::write(&docx, b"docx").unwrap();

        let script = |name: &str, body: &str| {
            let path = dir.path().join(name);
            std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path.to_string_lossy().into_owned()
        };
        // args: -env:UserInstallation=<url> --headless --convert-to pdf <docx> --outdir <dir>
        let ok = script(
            "ok.sh",
            r#"printf '%s\n' "$@" >> "$7/args.txt"; printf '%%PDF-1.4' > "$7/$(basename "$5" .docx).pdf""#,
        );
        let silent = script("silent.sh", "exit 0");
        let failing = script("failing.sh", "echo 'source file could not be loaded' >&2; exit 1");
        let slow = script("slow.sh", "sleep 5");

        let timeout = Duration::from_secs(2);

        let pdf = LibreOfficeConverter::new(Some(ok.clone()), timeout)
            .convert(&docx)
            .await
            .unwrap();
        assert_eq!(pdf, dir.path().join("AI 고소장 홍길동_사기_153045.pdf"));
        assert!(pdf.exists());

        let converter = LibreOfficeConverter::new(Some(ok), timeout);
        converter.convert(&docx).await.unwrap();
        let args = std::fs::read_to_string(dir.path().join("args.txt")).unwrap();
        let profiles: Vec<&str> = args
            .lines()
            .filter_map(|a| a.strip_prefix("-env:UserInstallation=file://"))
            .collect();
        assert_eq!(args.lines().next().map(|a| a.starts_with("-env:")), Some(true));
        assert_eq!(profiles.len(), 2);
        assert_ne!(profiles[0], profiles[1]);
        for profile in &profiles {
            assert!(profile.contains("lo-profile-"));
            assert!(!Path::new(profile).exists());
        }
        assert_eq!(
            args.lines().skip(1).take(6).collect::<Vec<_>>(),
            vec![
                "--headless",
                "--convert-to",
                "pdf",
                docx.to_str().unwrap(),
                "--outdir",
                dir.path().to_str().unwrap(),
            ]
        );

        let err = LibreOfficeConverter::new(Some(silent), timeout)
            .convert(&docx.with_file_name("other.docx"))
            .await
            .unwrap_err();
        assert!(matches!(err, PdfError::MissingOutput(_)));

        let err = LibreOfficeConverter::new(Some(failing), timeout)
            .convert(&docx)
            .await
            .unwrap_err();
        match err {
            PdfError::Failed { stderr, .. } => assert_eq!(stderr, "source file could not be loaded"),
            other => panic!("unexpected error: {other:?}"),
        }

        let err = LibreOfficeConverter::new(Some(slow), Duration::from_millis(200))
            .convert(&docx)
            .await
            .unwrap_err();
        assert!(matches!(err, PdfError::Timeout(_)));

        let missing = dir.path().join("no-such-office").to_string_lossy().into_owned();
        let err = LibreOfficeConverter::new(Some(missing), timeout)
            .convert(&docx)
            .await
            .unwrap_err();
        assert!(matches!(err, PdfError::Spawn { .. }));
    }
}
