use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "verify_tester")]
#[command(about = "Runs identity verification stages against image files and prints JSON")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Average hash of one image.
    Hash { image: PathBuf },
    /// Hamming distance between two images' hashes.
    Compare { first: PathBuf, second: PathBuf },
    /// Preprocess and OCR one image.
    Ocr { image: PathBuf },
    Aadhaar {
        image: PathBuf,
        /// Require the AADHAAR keyword and a Verhoeff-valid number.
        #[arg(long)]
        strict: bool,
    },
    Pan { image: PathBuf },
    Certificate {
        image: PathBuf,
        #[arg(long)]
        name: String,
    },
    /// Face match decision between an ID photo and a live capture.
    Face { id_photo: PathBuf, live: PathBuf },
}
