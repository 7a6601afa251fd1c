// THEORY:
// Text recognition is done by a third-party engine the crate does not own. This
// module defines the seam (`OcrEngine`), the way an engine is brought up
// (`OcrLoader`), and the one long-lived shared resource in the crate: the lazily
// loaded engine handle (`SharedOcrEngine`).
//
// Key architectural principles:
// 1.  **Injected, not ambient**: the pipeline receives a `SharedOcrEngine` built from
//     any loader. Production uses the Tesseract CLI; tests pass scripted engines.
// 2.  **Load once, on first use**: the engine is not touched until the first
//     document needs reading. Concurrent first callers all await the same in-flight
//     load instead of starting their own.
// 3.  **Failed loads are not cached**: if loading fails, the next caller tries again.

use crate::error::{VisionError, VisionResult};
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Raw output of one recognition call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Recognition {
    pub text: String,
}

/// An opaque text recognizer: image bytes plus a language code in, text out.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, image_png: &[u8], language: &str) -> VisionResult<Recognition>;

    fn engine_name(&self) -> &str;
}

/// Brings an engine up. Called at most once per successful load.
#[async_trait]
pub trait OcrLoader: Send + Sync {
    async fn load(&self) -> VisionResult<Arc<dyn OcrEngine>>;
}

/// Lazily loaded, process-wide engine handle. Cheap to clone.
#[derive(Clone)]
pub struct SharedOcrEngine {
    loader: Arc<dyn OcrLoader>,
    engine: Arc<OnceCell<Arc<dyn OcrEngine>>>,
}

impl SharedOcrEngine {
    pub fn new(loader: Arc<dyn OcrLoader>) -> Self {
        Self {
            loader,
            engine: Arc::new(OnceCell::new()),
        }
    }

    /// Wraps an engine that is already loaded.
    pub fn preloaded(engine: Arc<dyn OcrEngine>) -> Self {
        let cell = OnceCell::new_with(Some(engine.clone()));
        Self {
            loader: Arc::new(Preloaded(engine)),
            engine: Arc::new(cell),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.engine.initialized()
    }

    /// Returns the engine, loading it first if nobody has yet.
    pub async fn get(&self) -> VisionResult<Arc<dyn OcrEngine>> {
        let engine = self
            .engine
            .get_or_try_init(|| async {
                info!("loading OCR engine");
                let engine = self.loader.load().await?;
                info!(engine = engine.engine_name(), "OCR engine ready");
                Ok::<_, VisionError>(engine)
            })
            .await?;
        Ok(Arc::clone(engine))
    }
}

struct Preloaded(Arc<dyn OcrEngine>);

#[async_trait]
impl OcrLoader for Preloaded {
    async fn load(&self) -> VisionResult<Arc<dyn OcrEngine>> {
        Ok(Arc::clone(&self.0))
    }
}

/// Probes for the `tesseract` executable and hands out a CLI-backed engine.
pub struct TesseractLoader {
    command: String,
}

impl TesseractLoader {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl OcrLoader for TesseractLoader {
    async fn load(&self) -> VisionResult<Arc<dyn OcrEngine>> {
        let output = Command::new(&self.command)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| VisionError::EngineUnavailable(format!("{}: {e}", self.command)))?;

        if !output.status.success() {
            return Err(VisionError::EngineUnavailable(format!(
                "{} --version exited with {}",
                self.command, output.status
            )));
        }

        // Older releases print the banner on stderr.
        let banner = if output.stdout.is_empty() { &output.stderr } else { &output.stdout };
        let version = String::from_utf8_lossy(banner).lines().next().unwrap_or_default().to_string();
        debug!(%version, "tesseract detected");

        Ok(Arc::new(TesseractCli {
            command: self.command.clone(),
            version,
        }))
    }
}

/// Runs `tesseract stdin stdout -l <lang>` per recognition call.
pub struct TesseractCli {
    command: String,
    version: String,
}

impl TesseractCli {
    pub fn version(&self) -> &str {
        &self.version
    }
}

#[async_trait]
impl OcrEngine for TesseractCli {
    async fn recognize(&self, image_png: &[u8], language: &str) -> VisionResult<Recognition> {
        let mut child = Command::new(&self.command)
            .args(["stdin", "stdout", "-l", language])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| VisionError::Recognition("tesseract stdin unavailable".to_string()))?;
        let payload = image_png.to_vec();
        let writer = tokio::spawn(async move {
            stdin.write_all(&payload).await?;
            stdin.shutdown().await
        });

        let output = child.wait_with_output().await?;
        if let Ok(Err(e)) = writer.await {
            warn!("writing image to tesseract failed: {e}");
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VisionError::Recognition(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(Recognition {
            text: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }

    fn engine_name(&self) -> &str {
        "tesseract"
    }
}
