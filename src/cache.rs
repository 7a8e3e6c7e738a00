//! Day-bucketed file cache in front of the tariff fetcher
//!
//! One JSON file per `(command, date, days)` holds the records exactly as the
//! fetcher produced them. A key is only ever written once: the next calendar
//! day maps to a new file, and nothing is expired or deleted.
//!
//! Concurrent requests for the same unwritten key are serialized on a per-key
//! lock so the fetch process runs once; requests for other keys proceed
//! independently.

use crate::error::{HdoError, Result};
use crate::fetcher::TariffFetcher;
use crate::logging::{StructuredLogger, get_logger};
use crate::tariff::TariffRecord;
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use std::collections::HashMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Identity of one cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub command: i64,
    pub date: NaiveDate,
    pub days: i64,
}

impl CacheKey {
    pub const fn new(command: i64, date: NaiveDate, days: i64) -> Self {
        Self {
            command,
            date,
            days,
        }
    }

    /// File name embedding all three key components
    pub fn file_name(&self) -> String {
        format!("hdo-{self}.json")
    }

    pub fn path_in(&self, directory: &Path) -> PathBuf {
        directory.join(self.file_name())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}",
            self.command,
            self.date.format("%Y-%m-%d"),
            self.days
        )
    }
}

/// Current calendar date in `tz`
pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

type KeyLock = Arc<tokio::sync::Mutex<()>>;

/// File-backed tariff cache
pub struct TariffCache {
    directory: PathBuf,
    timezone: Tz,
    fetcher: Arc<dyn TariffFetcher>,
    locks: Mutex<HashMap<PathBuf, KeyLock>>,
    logger: StructuredLogger,
}

impl TariffCache {
    pub fn new(directory: PathBuf, timezone: Tz, fetcher: Arc<dyn TariffFetcher>) -> Self {
        Self {
            directory,
            timezone,
            fetcher,
            locks: Mutex::new(HashMap::new()),
            logger: get_logger("cache"),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub const fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Path of the entry for `(command, date, days)`
    pub fn entry_path(&self, command: i64, days: i64, date: NaiveDate) -> PathBuf {
        CacheKey::new(command, date, days).path_in(&self.directory)
    }

    /// Records for `(command, days)` as of today in the configured timezone
    pub async fn get_tariff_data(&self, command: i64, days: i64) -> Result<Vec<TariffRecord>> {
        self.get_tariff_data_on(command, days, today_in(self.timezone))
            .await
    }

    /// Records for `(command, days)` keyed on an explicit calendar date.
    ///
    /// Serves the cached file when present; otherwise runs the fetcher,
    /// persists its records and returns them.
    pub async fn get_tariff_data_on(
        &self,
        command: i64,
        days: i64,
        date: NaiveDate,
    ) -> Result<Vec<TariffRecord>> {
        let key = CacheKey::new(command, date, days);
        let path = key.path_in(&self.directory);
        let logger = self.logger.with_cache_key(key.to_string());

        if let Some(records) = read_entry(&path).await? {
            logger.debug("Cache hit");
            return Ok(records);
        }

        let lock = self.key_lock(&path);
        let result = {
            let _guard = lock.lock().await;
            self.fill_entry(&key, &path, &logger).await
        };
        drop(lock);
        self.prune_locks();
        result
    }

    async fn fill_entry(
        &self,
        key: &CacheKey,
        path: &Path,
        logger: &StructuredLogger,
    ) -> Result<Vec<TariffRecord>> {
        // Another request may have written the entry while we waited
        if let Some(records) = read_entry(path).await? {
            logger.debug("Cache filled by concurrent request");
            return Ok(records);
        }

        logger.info("Cache miss; fetching");
        let records = self.fetcher.fetch(key.command, key.days).await?;
        self.write_entry(path, &records).await?;
        logger.info(&format!(
            "Cached {} records at {}",
            records.len(),
            path.display()
        ));
        Ok(records)
    }

    async fn write_entry(&self, path: &Path, records: &[TariffRecord]) -> Result<()> {
        tokio::fs::create_dir_all(&self.directory).await.map_err(|e| {
            HdoError::io(format!(
                "Failed to create cache directory {}: {}",
                self.directory.display(),
                e
            ))
        })?;
        let body = serde_json::to_vec(records)?;
        tokio::fs::write(path, body).await.map_err(|e| {
            HdoError::io(format!(
                "Failed to write cache entry {}: {}",
                path.display(),
                e
            ))
        })
    }

    fn key_lock(&self, path: &Path) -> KeyLock {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(path.to_path_buf()).or_default().clone()
    }

    /// Drop lock entries no request is holding
    fn prune_locks(&self) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    #[cfg(test)]
    fn lock_count(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Read and parse a cache entry; `None` when it does not exist
async fn read_entry(path: &Path) -> Result<Option<Vec<TariffRecord>>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(HdoError::io(format!(
                "Failed to read cache entry {}: {}",
                path.display(),
                e
            )));
        }
    };
    serde_json::from_slice(&bytes).map(Some).map_err(|e| {
        HdoError::malformed_cache(format!("{}: {}", path.display(), e))
    })
}
