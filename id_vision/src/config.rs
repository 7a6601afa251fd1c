use crate::core_modules::face_match::DEFAULT_FACE_MATCH_THRESHOLD;
use crate::core_modules::preprocess::PreprocessConfig;
use crate::core_modules::text_extractor::{DEFAULT_OCR_LANGUAGE, DEFAULT_OCR_TIMEOUT, ExtractorConfig};
use std::{env, fmt::Display, str::FromStr, time::Duration};
use tracing::{info, warn};

pub const DEFAULT_TESSERACT_COMMAND: &str = "tesseract";
/// Largest accepted upload, 5 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Configuration for the VerificationPipeline, allowing for tunable behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Largest hash distance (of 64 bits) still treated as a face match. Empirical;
    /// calibrate against real captures before tightening.
    pub face_match_threshold: u32,
    pub ocr_language: String,
    pub ocr_timeout: Duration,
    pub tesseract_command: String,
    pub max_upload_bytes: u64,
    pub preprocess: PreprocessConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            face_match_threshold: DEFAULT_FACE_MATCH_THRESHOLD,
            ocr_language: DEFAULT_OCR_LANGUAGE.to_string(),
            ocr_timeout: DEFAULT_OCR_TIMEOUT,
            tesseract_command: DEFAULT_TESSERACT_COMMAND.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            preprocess: PreprocessConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Reads `IDV_*` environment variables, keeping the default for anything unset or
    /// unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            face_match_threshold: try_load("IDV_FACE_MATCH_THRESHOLD", defaults.face_match_threshold),
            ocr_language: try_load("IDV_OCR_LANGUAGE", defaults.ocr_language),
            ocr_timeout: Duration::from_secs(try_load(
                "IDV_OCR_TIMEOUT_SECS",
                defaults.ocr_timeout.as_secs(),
            )),
            tesseract_command: try_load("IDV_TESSERACT_CMD", defaults.tesseract_command),
            max_upload_bytes: try_load("IDV_MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
            preprocess: PreprocessConfig {
                target_long_edge: try_load("IDV_TARGET_LONG_EDGE", defaults.preprocess.target_long_edge),
                max_upscale: try_load("IDV_MAX_UPSCALE", defaults.preprocess.max_upscale),
                contrast_factor: try_load("IDV_CONTRAST_FACTOR", defaults.preprocess.contrast_factor),
            },
        }
    }

    pub fn extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig {
            preprocess: self.preprocess,
            language: self.ocr_language.clone(),
            timeout: self.ocr_timeout,
        }
    }
}

fn try_load<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
            default
        }),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = PipelineConfig::default();
        assert_eq!(config.face_match_threshold, 18);
        assert_eq!(config.ocr_language, "eng");
        assert_eq!(config.max_upload_bytes, 5_242_880);
        assert_eq!(config.preprocess.target_long_edge, 1600);
    }

    #[test]
    fn unset_and_invalid_values_fall_back() {
        assert_eq!(try_load("IDV_TEST_SURELY_UNSET_KEY", 7u32), 7);

        // SAFETY: this key is only touched by this test.
        unsafe { env::set_var("IDV_TEST_INVALID_NUMBER", "eighteen") };
        assert_eq!(try_load("IDV_TEST_INVALID_NUMBER", 18u32), 18);

        unsafe { env::set_var("IDV_TEST_VALID_NUMBER", " 12 ") };
        assert_eq!(try_load("IDV_TEST_VALID_NUMBER", 18u32), 12);
    }

    #[test]
    fn extractor_config_carries_ocr_settings() {
        let config = PipelineConfig {
            ocr_language: "eng+hin".to_string(),
            ocr_timeout: Duration::from_secs(3),
            ..PipelineConfig::default()
        };
        let extractor = config.extractor_config();
        assert_eq!(extractor.language, "eng+hin");
        assert_eq!(extractor.timeout, Duration::from_secs(3));
    }
}
