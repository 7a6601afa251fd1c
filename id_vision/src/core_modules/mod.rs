// Building blocks of the verification engine, lowest layer first.

pub mod pixel;
pub mod chunk;
pub mod grid_manager;
pub mod utils;

pub mod perceptual_hash;
pub mod face_match;

pub mod preprocess;
pub mod ocr_engine;
pub mod text_extractor;

pub mod validators;
