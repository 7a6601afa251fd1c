// THEORY:
// This file is the main entry point for the `id_vision` library crate.
// It follows the standard Rust convention of using `lib.rs` to define the public
// API that will be exposed to external consumers (the onboarding wizard and the
// `verify_tester` binary).
//
// The primary goal is to export the `VerificationPipeline` and its associated
// data structures (`PipelineConfig`, `DocumentReport`, `Verdict`, `FaceMatch`) as
// the high-level interface for the engine. The `core_modules` stay public so the
// individual stages can be exercised on their own, but callers are expected to
// go through the pipeline.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod onboarding;
pub mod pipeline;

pub use config::PipelineConfig;
pub use core_modules::face_match::{FaceMatch, FaceMatchPolicy};
pub use core_modules::perceptual_hash::{HashDistance, PerceptualHash};
pub use core_modules::text_extractor::Extraction;
pub use error::{VisionError, VisionResult};
pub use onboarding::OnboardingSession;
pub use pipeline::{DocumentReport, UnverifiedReason, Verdict, VerificationPipeline};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs a `fmt` subscriber filtered by `RUST_LOG`. Safe to call more than once;
/// only the first call installs anything.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init();
}
