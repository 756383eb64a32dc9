pub mod bio;
pub mod cli;
pub mod core;
pub mod download;
pub mod report;

pub use crate::core::{
    classifier::Classifier, config::Config, pipeline::Harvester, row::NormalizedRow,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{endpoint} request failed after {attempts} attempts: {message}")]
    Transport {
        endpoint: String,
        attempts: u32,
        message: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Service error: {0}")]
    Service(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Workbook error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

pub type Result<T> = std::result::Result<T, HarvestError>;
