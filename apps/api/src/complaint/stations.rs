//! Police station list for the "제출 경찰서" picker.
//!
//! The source CSV is the national police agency export, usually CP949
//! encoded; UTF-8 (with or without BOM) is accepted as well.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

pub const NAME_COLUMN: &str = "경찰서명";

#[derive(Debug, Error)]
pub enum StationsError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid station CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("station CSV has no '{0}' column")]
    MissingColumn(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoliceStation {
    pub name: String,
}

pub async fn load_stations(path: &Path) -> Result<Vec<PoliceStation>, StationsError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| StationsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let stations = parse_stations(&bytes)?;
    debug!("Loaded {} police stations from {}", stations.len(), path.display());
    Ok(stations)
}

pub fn parse_stations(bytes: &[u8]) -> Result<Vec<PoliceStation>, StationsError> {
    let text = decode(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let column = reader
        .headers()?
        .iter()
        .position(|h| h.trim() == NAME_COLUMN)
        .ok_or(StationsError::MissingColumn(NAME_COLUMN))?;

    let mut stations = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(name) = record.get(column).map(str::trim).filter(|n| !n.is_empty()) {
            stations.push(PoliceStation {
                name: name.to_string(),
            });
        }
    }
    Ok(stations)
}

fn decode(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.trim_start_matches('\u{feff}').to_string(),
        // encoding_rs's EUC-KR is the WHATWG definition, i.e. CP949
        Err(_) => encoding_rs::EUC_KR.decode(bytes).0.into_owned(),
    }
}
