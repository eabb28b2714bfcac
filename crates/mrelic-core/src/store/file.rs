//! JSON-lines file backend.
//!
//! Each row is one line of JSON. Inserts append; deletes write the surviving
//! rows to a sibling temp file and rename it over the original, so a failed
//! delete leaves both the file and the in-memory view untouched. Reads are
//! served from an in-memory copy loaded at open.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::memory::MemoryBackend;
use super::{Column, Deletion, LogBackend, Selection, StoreResult, StoredRow};

/// File-backed row store.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    rows: MemoryBackend,
    /// Serializes writers so file order and memory order agree.
    write_lock: Mutex<()>,
}

impl FileBackend {
    /// Open `path`, creating it (and its parent directory) if missing.
    /// Lines that fail to parse are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or read.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(&path)?;

        let rows = load_rows(&path)?;
        tracing::debug!(path = %path.display(), rows = rows.len(), "opened file store");

        Ok(Self {
            path,
            rows: MemoryBackend::from_rows(rows),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn append(&self, rows: &[StoredRow]) -> StoreResult<()> {
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let mut writer = BufWriter::new(file);
        for row in rows {
            serde_json::to_writer(&mut writer, row)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }

    fn rewrite(&self, rows: &[StoredRow]) -> StoreResult<()> {
        let tmp = self.path.with_extension("jsonl.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            for row in rows {
                serde_json::to_writer(&mut writer, row)?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn load_rows(path: &Path) -> StoreResult<Vec<StoredRow>> {
    let reader = BufReader::new(File::open(path)?);
    let mut rows = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<StoredRow>(&line) {
            Ok(row) => rows.push(row),
            Err(err) => {
                tracing::warn!(path = %path.display(), line = lineno + 1, %err, "skipping corrupt store line");
            }
        }
    }
    Ok(rows)
}

impl LogBackend for FileBackend {
    fn insert(&self, row: StoredRow) -> StoreResult<()> {
        let _guard = self.write_lock.lock();
        self.append(std::slice::from_ref(&row))?;
        self.rows.insert(row)
    }

    fn insert_many(&self, rows: Vec<StoredRow>) -> StoreResult<()> {
        let _guard = self.write_lock.lock();
        self.append(&rows)?;
        self.rows.insert_many(rows)
    }

    fn select(&self, selection: &Selection) -> StoreResult<Vec<StoredRow>> {
        self.rows.select(selection)
    }

    fn count(&self, selection: &Selection) -> StoreResult<usize> {
        self.rows.count(selection)
    }

    fn distinct(&self, column: Column) -> StoreResult<Vec<String>> {
        self.rows.distinct(column)
    }

    fn delete(&self, deletion: &Deletion) -> StoreResult<usize> {
        let _guard = self.write_lock.lock();
        let (kept, removed) = self.rows.survivors(deletion);
        if removed == 0 {
            return Ok(0);
        }
        self.rewrite(&kept)?;
        self.rows.replace(kept);
        Ok(removed)
    }

    fn size_bytes(&self) -> StoreResult<u64> {
        Ok(fs::metadata(&self.path)?.len())
    }
}
