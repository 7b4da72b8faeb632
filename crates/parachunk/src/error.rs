#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to load {path}: {message}")]
    Load { path: String, message: String },

    #[error("Extraction failed: {0}")]
    Extraction(#[from] parachunk_core::Error),
}
