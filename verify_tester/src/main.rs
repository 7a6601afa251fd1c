mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use id_vision::core_modules::perceptual_hash::distance;
use id_vision::core_modules::utils::image_helper::image_helper;
use id_vision::core_modules::validators::AadhaarChecksum;
use id_vision::{PipelineConfig, VerificationPipeline};
use serde_json::json;
use std::path::Path;
use tracing::info;

fn load_base64(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(image_helper::encode_base64(&bytes))
}

#[tokio::main]
async fn main() -> Result<()> {
    id_vision::init_tracing();
    let cli = Cli::parse();

    let config = PipelineConfig::from_env();
    let pipeline = VerificationPipeline::with_tesseract(&config);

    let output = match cli.cmd {
        Command::Hash { image } => {
            let hash = pipeline.hash_image(&load_base64(&image)?)?;
            json!({ "image": image, "hash": hash, "bit_length": hash.bit_length() })
        }
        Command::Compare { first, second } => {
            let a = pipeline.hash_image(&load_base64(&first)?).ok();
            let b = pipeline.hash_image(&load_base64(&second)?).ok();
            json!({ "first": a, "second": b, "distance": distance(a.as_ref(), b.as_ref()) })
        }
        Command::Ocr { image } => {
            let extraction = pipeline.extractor().extract(&load_base64(&image)?).await;
            serde_json::to_value(extraction)?
        }
        Command::Aadhaar { image, strict } => {
            let pipeline = if strict {
                pipeline.with_aadhaar_validator(AadhaarChecksum)
            } else {
                pipeline
            };
            serde_json::to_value(pipeline.verify_aadhaar(&load_base64(&image)?).await)?
        }
        Command::Pan { image } => serde_json::to_value(pipeline.verify_pan(&load_base64(&image)?).await)?,
        Command::Certificate { image, name } => {
            serde_json::to_value(pipeline.verify_certificate(&load_base64(&image)?, &name).await)?
        }
        Command::Face { id_photo, live } => {
            let (id_photo, live) = (load_base64(&id_photo)?, load_base64(&live)?);
            let decision = pipeline.match_faces(Some(id_photo.as_str()), Some(live.as_str()));
            info!(?decision, threshold = pipeline.face_policy().max_distance, "face compared");
            json!({ "threshold": pipeline.face_policy().max_distance, "decision": decision })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
