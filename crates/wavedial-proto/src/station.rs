//! Station catalog: loading, parsing, and the lookup surface the player core
//! consumes.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Station {
    pub name: String,
    pub url: String,
}

impl Station {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("cannot read stations file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot download stations list from {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Read-only view of an ordered station catalog.
///
/// Stations are identified by their position; a `reload` produces a new
/// snapshot and invalidates previously handed-out indices.
pub trait Catalog {
    /// Display rows, one per station, in catalog order.
    fn rows(&self) -> Vec<String>;

    /// Station at `index`, or `None` when out of bounds.
    fn get_selected(&self, index: usize) -> Option<&Station>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Re-read the catalog from its source.
    fn reload(&mut self) -> Result<(), CatalogError>;
}

/// File-backed catalog.
#[derive(Debug, Clone)]
pub struct StationList {
    path: PathBuf,
    stations: Vec<Station>,
}

impl StationList {
    /// Load the catalog at `path`, downloading `remote_url` into it first when
    /// the file does not exist.
    pub async fn load(path: &Path, remote_url: &str) -> Result<Self, CatalogError> {
        if !path.exists() {
            info!("stations file {:?} missing, downloading {}", path, remote_url);
            download_stations(path, remote_url).await?;
        }
        let stations = load_stations_from_file(path)?;
        info!("loaded {} stations from {:?}", stations.len(), path);
        Ok(Self {
            path: path.to_path_buf(),
            stations,
        })
    }

    pub fn from_stations(path: PathBuf, stations: Vec<Station>) -> Self {
        Self { path, stations }
    }
}

impl Catalog for StationList {
    fn rows(&self) -> Vec<String> {
        self.stations.iter().map(|s| s.name.clone()).collect()
    }

    fn get_selected(&self, index: usize) -> Option<&Station> {
        self.stations.get(index)
    }

    fn len(&self) -> usize {
        self.stations.len()
    }

    fn reload(&mut self) -> Result<(), CatalogError> {
        self.stations = load_stations_from_file(&self.path)?;
        info!("reloaded {} stations from {:?}", self.stations.len(), self.path);
        Ok(())
    }
}

pub fn load_stations_from_file(path: &Path) -> Result<Vec<Station>, CatalogError> {
    let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let is_m3u = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("m3u"))
        .unwrap_or(false);
    if is_m3u {
        Ok(parse_m3u_from_str(&content))
    } else {
        Ok(parse_csv_from_str(&content))
    }
}

/// Parse a pyradio-style `name,url` list.  Extra columns (newer pyradio
/// versions append encoding/icon fields) are ignored.  Names may be quoted
/// to contain commas.
pub fn parse_csv_from_str(content: &str) -> Vec<Station> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let fields = split_csv_fields(line)?;
            let name = fields.first()?.trim();
            let url = fields.get(1)?.trim();
            if url.is_empty() {
                return None;
            }
            Some(Station::new(name, url))
        })
        .collect()
}

/// Split one CSV record.  Double-quoted fields may contain commas and `""`
/// escapes; `None` on an unterminated quote.
fn split_csv_fields(line: &str) -> Option<Vec<String>> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.trim().is_empty() => {
                field.clear();
                in_quotes = true;
            }
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(ch),
        }
    }
    if in_quotes {
        return None;
    }
    fields.push(field);
    Some(fields)
}

pub fn parse_m3u_from_str(content: &str) -> Vec<Station> {
    let mut stations = Vec::new();
    let mut pending_name: Option<String> = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix("#EXTINF:") {
            if let Some(comma_idx) = rest.find(',') {
                pending_name = Some(rest[comma_idx + 1..].trim().to_string());
            }
            continue;
        }

        if line.starts_with('#') {
            continue;
        }

        let url = line.to_string();
        let name = pending_name.take().unwrap_or_else(|| url.clone());
        stations.push(Station { name, url });
    }

    stations
}

async fn download_stations(path: &Path, url: &str) -> Result<(), CatalogError> {
    let io_err = |source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    };
    let download_err = |source| CatalogError::Download {
        url: url.to_string(),
        source,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let body = reqwest::get(url)
        .await
        .and_then(|resp| resp.error_for_status())
        .map_err(download_err)?
        .bytes()
        .await
        .map_err(download_err)?;

    if body.is_empty() {
        warn!("stations download from {} returned an empty body", url);
    }
    tokio::fs::write(path, &body).await.map_err(io_err)?;
    Ok(())
}
