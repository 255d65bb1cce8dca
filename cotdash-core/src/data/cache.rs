//! Flat CSV cache, one file per identifier.
//!
//! Layout: `{cache_dir}/{stem}.csv` with header `date,value`, plus a
//! `{stem}.meta.json` sidecar (date range, point count, BLAKE3 hash of the
//! data, source, write time).
//!
//! Writes are atomic (write to .tmp, rename into place). A cache file is valid
//! until cleared; there is no staleness check.

use super::provider::DataError;
use crate::domain::{Identifier, SeriesPoint};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const DATA_EXT: &str = "csv";
const META_SUFFIX: &str = ".meta.json";

/// Metadata sidecar for a cached identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheMeta {
    pub identifier: Identifier,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub point_count: usize,
    pub data_hash: String,
    pub source: String,
    pub cached_at: chrono::NaiveDateTime,
}

/// Cache status for a single identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStatus {
    pub identifier: Identifier,
    pub cached: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub point_count: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    date: NaiveDate,
    value: f64,
}

/// The per-identifier CSV cache.
#[derive(Debug, Clone)]
pub struct SeriesCache {
    cache_dir: PathBuf,
}

impl SeriesCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// `{cache_dir}/{stem}.csv`
    pub fn data_path(&self, identifier: &Identifier) -> PathBuf {
        self.cache_dir
            .join(format!("{}.{DATA_EXT}", identifier.file_stem()))
    }

    fn meta_path(&self, identifier: &Identifier) -> PathBuf {
        self.cache_dir
            .join(format!("{}{META_SUFFIX}", identifier.file_stem()))
    }

    pub fn contains(&self, identifier: &Identifier) -> bool {
        self.data_path(identifier).is_file()
    }

    /// Write points for an identifier, replacing any previous file.
    pub fn write(&self, identifier: &Identifier, points: &[SeriesPoint], source: &str) -> Result<CacheMeta, DataError> {
        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            return Err(DataError::CacheError(format!("no points to cache for '{identifier}'")));
        };

        fs::create_dir_all(&self.cache_dir)
            .map_err(|e| DataError::CacheError(format!("failed to create dir: {e}")))?;

        let mut wtr = csv::Writer::from_writer(Vec::new());
        for p in points {
            wtr.serialize(CsvRow {
                date: p.date,
                value: p.value,
            })
            .map_err(|e| DataError::CacheError(format!("csv encode: {e}")))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| DataError::CacheError(format!("csv flush: {e}")))?;

        let path = self.data_path(identifier);
        write_atomic(&path, &bytes)?;

        let meta = CacheMeta {
            identifier: identifier.clone(),
            start_date: first.date,
            end_date: last.date,
            point_count: points.len(),
            data_hash: blake3::hash(&bytes).to_hex().to_string(),
            source: source.to_string(),
            cached_at: chrono::Local::now().naive_local(),
        };
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| DataError::CacheError(format!("meta serialization: {e}")))?;
        write_atomic(&self.meta_path(identifier), meta_json.as_bytes())?;

        Ok(meta)
    }

    /// Load cached points in file order, or `Ok(None)` when nothing is cached.
    ///
    /// The points are not validated here; the store builds the `TimeSeries`
    /// and rejects bad ordering.
    pub fn load(&self, identifier: &Identifier) -> Result<Option<Vec<SeriesPoint>>, DataError> {
        let path = self.data_path(identifier);
        if !path.is_file() {
            return Ok(None);
        }

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(|e| DataError::CacheError(format!("open {}: {e}", path.display())))?;

        let mut points = Vec::new();
        for row in rdr.deserialize::<CsvRow>() {
            let row = row.map_err(|e| DataError::CacheError(format!("read {}: {e}", path.display())))?;
            points.push(SeriesPoint::new(row.date, row.value));
        }
        Ok(Some(points))
    }

    /// Sidecar metadata, if the identifier is cached and the sidecar parses.
    pub fn get_meta(&self, identifier: &Identifier) -> Option<CacheMeta> {
        let content = fs::read_to_string(self.meta_path(identifier)).ok()?;
        serde_json::from_str(&content).ok()
    }

    pub fn status(&self, identifiers: &[Identifier]) -> Vec<CacheStatus> {
        identifiers
            .iter()
            .map(|id| {
                let meta = self.get_meta(id);
                CacheStatus {
                    identifier: id.clone(),
                    cached: self.contains(id),
                    start_date: meta.as_ref().map(|m| m.start_date),
                    end_date: meta.as_ref().map(|m| m.end_date),
                    point_count: meta.as_ref().map(|m| m.point_count),
                }
            })
            .collect()
    }

    /// Identifiers with a readable sidecar, sorted.
    pub fn cached_identifiers(&self) -> Vec<Identifier> {
        let Ok(entries) = fs::read_dir(&self.cache_dir) else {
            return Vec::new();
        };
        let mut ids: Vec<Identifier> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(META_SUFFIX))
            .filter_map(|e| fs::read_to_string(e.path()).ok())
            .filter_map(|s| serde_json::from_str::<CacheMeta>(&s).ok())
            .map(|m| m.identifier)
            .collect();
        ids.sort();
        ids
    }

    /// Delete the data file, sidecar and any leftover temp files of every
    /// cached identifier. Other files in the directory are left alone.
    /// Returns the number of files removed.
    pub fn clear(&self) -> Result<usize, DataError> {
        let mut removed = 0;
        for identifier in self.cached_identifiers() {
            let data = self.data_path(&identifier);
            let meta = self.meta_path(&identifier);
            let files = [tmp_path(&data), tmp_path(&meta), data, meta];
            for path in files.iter().filter(|p| p.is_file()) {
                fs::remove_file(path)
                    .map_err(|e| DataError::CacheError(format!("remove {}: {e}", path.display())))?;
                removed += 1;
            }
        }
        tracing::info!(dir = %self.cache_dir.display(), removed, "cleared series cache");
        Ok(removed)
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), DataError> {
    let tmp = tmp_path(path);
    fs::write(&tmp, bytes).map_err(|e| DataError::CacheError(format!("write {}: {e}", tmp.display())))?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        DataError::CacheError(format!("atomic rename failed: {e}"))
    })
}
