//! Core Store implementation

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, StoreError};
use crate::record::Record;

const LOCK_FILE: &str = ".lock";
const INDEX_FILE: &str = "index.db";
const LOG_EXTENSION: &str = "jsonl";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS records (
    collection TEXT NOT NULL,
    id         TEXT NOT NULL,
    data       TEXT NOT NULL,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (collection, id)
);
";

/// One line of a collection's JSONL log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogLine {
    pub id: String,
    pub updated_at: i64,
    pub data: serde_json::Value,
}

/// Durable record store: JSONL logs plus a SQLite index of latest versions
pub struct Store {
    base_path: PathBuf,
    conn: Connection,
    /// Held for the lifetime of the store; dropping it releases the lock
    _lock: File,
}

impl Store {
    /// Open or create a store at the given path
    ///
    /// Fails with [`StoreError::Locked`] if another process holds the store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        debug!(?base_path, "Store::open: called");
        fs::create_dir_all(&base_path)?;

        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(base_path.join(LOCK_FILE))?;
        lock.try_lock_exclusive()
            .map_err(|_| StoreError::Locked(base_path.clone()))?;

        let conn = Connection::open(base_path.join(INDEX_FILE))?;
        conn.execute_batch(SCHEMA)?;

        let mut store = Self {
            base_path,
            conn,
            _lock: lock,
        };

        let indexed: i64 = store.conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
        if indexed == 0 && !store.log_files()?.is_empty() {
            info!(base_path = ?store.base_path, "Index empty but logs present, rebuilding");
            store.sync()?;
        }

        Ok(store)
    }

    /// Path the store lives at
    pub fn path(&self) -> &Path {
        &self.base_path
    }

    /// Get the latest version of a record by id
    pub fn get<T: Record>(&self, id: &str) -> Result<Option<T>> {
        debug!(collection = T::collection_name(), %id, "Store::get: called");
        let data: Option<String> = self
            .conn
            .query_row(
                "SELECT data FROM records WHERE collection = ?1 AND id = ?2",
                params![T::collection_name(), id],
                |row| row.get(0),
            )
            .optional()?;

        match data {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Insert or replace a record
    ///
    /// The JSONL line is appended and flushed to disk before the index row
    /// is replaced, so a crash between the two is repaired by [`Store::sync`].
    pub fn upsert<T: Record>(&mut self, record: &T) -> Result<()> {
        let collection = T::collection_name();
        debug!(collection, id = record.id(), "Store::upsert: called");
        let log_path = self.log_path(collection)?;

        let data = serde_json::to_value(record)?;
        let line = LogLine {
            id: record.id().to_string(),
            updated_at: record.updated_at(),
            data,
        };

        let mut file = OpenOptions::new().create(true).append(true).open(&log_path)?;
        writeln!(file, "{}", serde_json::to_string(&line)?)?;
        file.sync_data()?;

        self.conn.execute(
            "INSERT INTO records (collection, id, data, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(collection, id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
            params![collection, line.id, line.data.to_string(), line.updated_at],
        )?;

        Ok(())
    }

    /// List every record in a collection, ordered by id
    pub fn list<T: Record>(&self) -> Result<Vec<T>> {
        debug!(collection = T::collection_name(), "Store::list: called");
        let mut stmt = self
            .conn
            .prepare("SELECT data FROM records WHERE collection = ?1 ORDER BY id")?;
        let rows = stmt.query_map(params![T::collection_name()], |row| row.get::<_, String>(0))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(serde_json::from_str(&row?)?);
        }
        Ok(records)
    }

    /// List the ids present in a collection, ordered
    pub fn ids<T: Record>(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM records WHERE collection = ?1 ORDER BY id")?;
        let rows = stmt.query_map(params![T::collection_name()], |row| row.get::<_, String>(0))?;
        let ids = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    /// Rebuild the SQLite index from the JSONL logs
    ///
    /// The last line for each id wins. Lines that fail to parse are skipped.
    /// Returns the number of records indexed.
    pub fn sync(&mut self) -> Result<usize> {
        debug!(base_path = ?self.base_path, "Store::sync: called");
        let mut latest: HashMap<(String, String), LogLine> = HashMap::new();

        for (collection, path) in self.log_files()? {
            let reader = BufReader::new(File::open(&path)?);
            for (line_no, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<LogLine>(&line) {
                    Ok(entry) => {
                        latest.insert((collection.clone(), entry.id.clone()), entry);
                    }
                    Err(e) => {
                        warn!(?path, line = line_no + 1, error = %e, "Skipping corrupt log line");
                    }
                }
            }
        }

        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM records", [])?;
        for ((collection, id), entry) in &latest {
            tx.execute(
                "INSERT INTO records (collection, id, data, updated_at) VALUES (?1, ?2, ?3, ?4)",
                params![collection, id, entry.data.to_string(), entry.updated_at],
            )?;
        }
        tx.commit()?;

        info!(count = latest.len(), "Store index rebuilt from logs");
        Ok(latest.len())
    }

    /// Rewrite a collection's log so it holds one line per record
    ///
    /// The new log is written to a temp file and renamed over the old one.
    pub fn compact<T: Record>(&self) -> Result<usize> {
        let collection = T::collection_name();
        debug!(collection, "Store::compact: called");
        let log_path = self.log_path(collection)?;

        let mut stmt = self
            .conn
            .prepare("SELECT id, data, updated_at FROM records WHERE collection = ?1 ORDER BY id")?;
        let rows = stmt.query_map(params![collection], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, i64>(2)?))
        })?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.base_path)?;
        let mut count = 0;
        for row in rows {
            let (id, data, updated_at) = row?;
            let line = LogLine {
                id,
                updated_at,
                data: serde_json::from_str(&data)?,
            };
            writeln!(tmp, "{}", serde_json::to_string(&line)?)?;
            count += 1;
        }
        tmp.as_file().sync_data()?;
        tmp.persist(&log_path).map_err(|e| e.error)?;

        info!(collection, count, "Compacted collection log");
        Ok(count)
    }

    fn log_path(&self, collection: &str) -> Result<PathBuf> {
        let valid = !collection.is_empty()
            && collection
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::InvalidCollection(collection.to_string()));
        }
        Ok(self.base_path.join(format!("{}.{}", collection, LOG_EXTENSION)))
    }

    fn log_files(&self) -> Result<Vec<(String, PathBuf)>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if path.extension().map(|e| e == LOG_EXTENSION).unwrap_or(false)
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                files.push((stem.to_string(), path.clone()));
            }
        }
        files.sort();
        Ok(files)
    }
}
