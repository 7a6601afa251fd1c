// THEORY:
// The `TextExtractor` is the adapter between a base64 document photo and the
// third-party OCR engine. One call runs the whole sequence: decode, preprocess,
// re-encode as PNG, recognize. It never fails from the caller's point of view. The
// result is an `Extraction`, and the only distinction it keeps is the one the UI
// needs: text was read, nothing was read, or the engine took too long.
//
// There is no retry. A user who gets `NoText` or `TimedOut` re-uploads, which
// re-runs the full sequence from scratch.

use crate::core_modules::ocr_engine::SharedOcrEngine;
use crate::core_modules::preprocess::{PreprocessConfig, prepare_for_ocr};
use crate::core_modules::utils::image_helper::image_helper;
use crate::error::{VisionError, VisionResult};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub const DEFAULT_OCR_LANGUAGE: &str = "eng";
pub const DEFAULT_OCR_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of one extraction attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum Extraction {
    Recognized(String),
    /// Decode failure, engine failure, or the engine returned only whitespace.
    NoText,
    TimedOut,
}

impl Extraction {
    /// The recognized text, or an empty string.
    pub fn text(&self) -> &str {
        match self {
            Extraction::Recognized(text) => text,
            _ => "",
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Extraction::Recognized(text) => text,
            _ => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractorConfig {
    pub preprocess: PreprocessConfig,
    pub language: String,
    /// Upper bound on engine load plus recognition.
    pub timeout: Duration,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            preprocess: PreprocessConfig::default(),
            language: DEFAULT_OCR_LANGUAGE.to_string(),
            timeout: DEFAULT_OCR_TIMEOUT,
        }
    }
}

#[derive(Clone)]
pub struct TextExtractor {
    engine: SharedOcrEngine,
    config: ExtractorConfig,
}

impl TextExtractor {
    pub fn new(engine: SharedOcrEngine, config: ExtractorConfig) -> Self {
        Self { engine, config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Reads the text off a base64 document image.
    pub async fn extract(&self, image_base64: &str) -> Extraction {
        let started = Instant::now();
        let png = match self.prepare(image_base64).await {
            Ok(png) => png,
            Err(e) => {
                warn!("document image not usable for OCR: {e}");
                return Extraction::NoText;
            }
        };

        match tokio::time::timeout(self.config.timeout, self.recognize(&png)).await {
            Ok(Ok(text)) if text.trim().is_empty() => {
                info!(elapsed_ms = started.elapsed().as_millis() as u64, "OCR returned no text");
                Extraction::NoText
            }
            Ok(Ok(text)) => {
                info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    chars = text.chars().count(),
                    "OCR completed"
                );
                Extraction::Recognized(text)
            }
            Ok(Err(e)) => {
                warn!(elapsed_ms = started.elapsed().as_millis() as u64, "OCR failed: {e}");
                Extraction::NoText
            }
            Err(_) => {
                warn!("OCR abandoned: {}", VisionError::TimedOut(self.config.timeout));
                Extraction::TimedOut
            }
        }
    }

    /// String form of `extract`: empty whenever no text could be recovered.
    pub async fn extract_text(&self, image_base64: &str) -> String {
        self.extract(image_base64).await.into_text()
    }

    /// Decode, resize and PNG encoding are CPU bound, so they run on the blocking pool.
    async fn prepare(&self, image_base64: &str) -> VisionResult<Vec<u8>> {
        let payload = image_base64.to_string();
        let preprocess = self.config.preprocess;
        tokio::task::spawn_blocking(move || prepare_png(&payload, &preprocess)).await?
    }

    async fn recognize(&self, png: &[u8]) -> VisionResult<String> {
        let engine = self.engine.get().await?;
        let recognition = engine.recognize(png, &self.config.language).await?;
        Ok(recognition.text)
    }
}

fn prepare_png(image_base64: &str, preprocess: &PreprocessConfig) -> VisionResult<Vec<u8>> {
    let image = image_helper::decode_base64(image_base64)?;
    let prepared = prepare_for_ocr(&image, preprocess);
    image_helper::encode_png(&prepared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::ocr_engine::{OcrEngine, Recognition};
    use async_trait::async_trait;
    use image::{GrayImage, Luma};
    use std::sync::{Arc, Mutex};

    struct Recorder {
        seen: Mutex<Vec<(u32, u32, String)>>,
        reply: Option<String>,
        delay: Duration,
    }

    #[async_trait]
    impl OcrEngine for Recorder {
        async fn recognize(&self, image_png: &[u8], language: &str) -> VisionResult<Recognition> {
            let decoded = image::load_from_memory(image_png).expect("engine receives a PNG");
            self.seen
                .lock()
                .unwrap()
                .push((decoded.width(), decoded.height(), language.to_string()));
            tokio::time::sleep(self.delay).await;
            match &self.reply {
                Some(text) => Ok(Recognition { text: text.clone() }),
                None => Err(VisionError::Recognition("engine crashed".to_string())),
            }
        }

        fn engine_name(&self) -> &str {
            "recorder"
        }
    }

    fn recorder(reply: Option<String>, delay: Duration) -> Arc<Recorder> {
        Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
            reply,
            delay,
        })
    }

    fn sample_document() -> String {
        let image = GrayImage::from_fn(300, 200, |x, _| Luma([(x % 256) as u8]));
        image_helper::encode_base64(&image_helper::encode_png(&image).unwrap())
    }

    #[tokio::test]
    async fn engine_sees_preprocessed_png() {
        let engine = recorder(Some("INCOME TAX DEPARTMENT".to_string()), Duration::ZERO);
        let extractor = TextExtractor::new(SharedOcrEngine::preloaded(engine.clone()), ExtractorConfig::default());

        let extraction = extractor.extract(&sample_document()).await;
        assert_eq!(extraction, Extraction::Recognized("INCOME TAX DEPARTMENT".to_string()));
        assert_eq!(*engine.seen.lock().unwrap(), vec![(600, 400, "eng".to_string())]);
    }

    #[tokio::test]
    async fn engine_errors_become_empty_text() {
        let engine = recorder(None, Duration::ZERO);
        let extractor = TextExtractor::new(SharedOcrEngine::preloaded(engine), ExtractorConfig::default());
        assert_eq!(extractor.extract_text(&sample_document()).await, "");
    }

    #[tokio::test]
    async fn whitespace_only_is_no_text() {
        let engine = recorder(Some(" \n\t ".to_string()), Duration::ZERO);
        let extractor = TextExtractor::new(SharedOcrEngine::preloaded(engine), ExtractorConfig::default());
        assert_eq!(extractor.extract(&sample_document()).await, Extraction::NoText);
    }

    #[tokio::test]
    async fn undecodable_upload_never_reaches_engine() {
        let engine = recorder(Some("text".to_string()), Duration::ZERO);
        let extractor = TextExtractor::new(SharedOcrEngine::preloaded(engine.clone()), ExtractorConfig::default());
        assert_eq!(extractor.extract("bm90IGFuIGltYWdl").await, Extraction::NoText);
        assert!(engine.seen.lock().unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_documents_keep_their_order() {
        let engine = recorder(Some("CERTIFICATE".to_string()), Duration::from_millis(5));
        let extractor = TextExtractor::new(SharedOcrEngine::preloaded(engine.clone()), ExtractorConfig::default());
        let documents = vec![sample_document(), "%%%".to_string(), sample_document(), sample_document()];

        let results = futures::future::join_all(documents.iter().map(|doc| extractor.extract(doc))).await;
        assert_eq!(
            results,
            vec![
                Extraction::Recognized("CERTIFICATE".to_string()),
                Extraction::NoText,
                Extraction::Recognized("CERTIFICATE".to_string()),
                Extraction::Recognized("CERTIFICATE".to_string()),
            ]
        );
        assert_eq!(engine.seen.lock().unwrap().len(), 3);
    }

    #[test]
    fn preparation_runs_without_a_runtime() {
        let png = prepare_png(&sample_document(), &PreprocessConfig::default()).expect("prepared");
        let decoded = image::load_from_memory(&png).expect("png");
        assert_eq!((decoded.width(), decoded.height()), (600, 400));
        assert!(prepare_png("%%%", &PreprocessConfig::default()).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_engine_times_out() {
        let engine = recorder(Some("late".to_string()), Duration::from_secs(120));
        let config = ExtractorConfig {
            timeout: Duration::from_secs(5),
            ..ExtractorConfig::default()
        };
        let extractor = TextExtractor::new(SharedOcrEngine::preloaded(engine), config);
        assert_eq!(extractor.extract(&sample_document()).await, Extraction::TimedOut);
    }
}
