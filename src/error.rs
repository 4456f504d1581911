use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("fetch failed with HTTP status {status}")]
    Fetch { status: u16 },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("store error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("load error: {message}")]
    Load { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EtlError>;
