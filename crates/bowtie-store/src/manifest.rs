//! CSV-backed manifest store

use crate::atomic::atomic_write;
use crate::StoreError;
use bowtie_domain::{ManifestEntry, ManifestStatus};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Durable table of [`ManifestEntry`] rows keyed by `source_path`
///
/// Rows keep first-insertion order, so the file diff between runs only shows
/// real changes.
#[derive(Debug)]
pub struct ManifestStore {
    path: PathBuf,
    entries: Vec<ManifestEntry>,
    index: HashMap<String, usize>,
}

impl ManifestStore {
    /// Open the manifest at `path`, loading it if it exists
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let mut store = Self {
            path: path.into(),
            entries: Vec::new(),
            index: HashMap::new(),
        };
        store.load()?;
        Ok(store)
    }

    /// Manifest file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the manifest from disk
    ///
    /// A missing file is an empty manifest. Entries left `in_progress` by an
    /// interrupted run are reverted to their prior terminal status, or to
    /// `pending` when they had none. Repeated keys keep the last row.
    pub fn load(&mut self) -> Result<&[ManifestEntry], StoreError> {
        self.entries.clear();
        self.index.clear();

        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no manifest yet");
            return Ok(&self.entries);
        }

        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut reverted = 0usize;
        for (row, record) in reader.deserialize::<ManifestEntry>().enumerate() {
            let mut entry = record?;
            if entry.source_path.trim().is_empty() {
                return Err(StoreError::InvalidRow {
                    path: self.path.clone(),
                    row: row + 1,
                    reason: "empty source_path".to_string(),
                });
            }
            if entry.status == ManifestStatus::InProgress {
                entry.revert_attempt();
                reverted += 1;
            }
            self.upsert(entry);
        }

        if reverted > 0 {
            tracing::warn!(
                path = %self.path.display(),
                reverted,
                "reverted entries left in progress by an interrupted run"
            );
        }
        tracing::debug!(path = %self.path.display(), rows = self.entries.len(), "manifest loaded");
        Ok(&self.entries)
    }

    /// All rows, in first-insertion order
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// Look up a row by its input path
    pub fn get(&self, source_path: &str) -> Option<&ManifestEntry> {
        self.index.get(source_path).map(|&i| &self.entries[i])
    }

    /// Insert a row, or replace the row with the same `source_path`
    pub fn upsert(&mut self, entry: ManifestEntry) {
        match self.index.get(&entry.source_path) {
            Some(&i) => self.entries[i] = entry,
            None => {
                self.index.insert(entry.source_path.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    /// Atomically replace the manifest file with the in-memory rows
    pub fn save(&self) -> Result<(), StoreError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        if self.entries.is_empty() {
            writer.write_record(COLUMNS)?;
        }
        for entry in &self.entries {
            writer.serialize(entry)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| StoreError::Io(e.into_error()))?;

        atomic_write(&self.path, &bytes)?;
        tracing::trace!(path = %self.path.display(), rows = self.entries.len(), "manifest saved");
        Ok(())
    }

    /// Number of rows per status; every status is present
    pub fn counts(&self) -> BTreeMap<ManifestStatus, usize> {
        let mut counts: BTreeMap<ManifestStatus, usize> =
            ManifestStatus::ALL.iter().map(|s| (*s, 0)).collect();
        for entry in &self.entries {
            *counts.entry(entry.status).or_insert(0) += 1;
        }
        counts
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest has no rows
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Header written for an empty manifest (matches `ManifestEntry` field order)
const COLUMNS: &[&str] = &[
    "source_path",
    "incident_id",
    "output_path",
    "status",
    "error_message",
    "provider",
    "model",
    "attempt_count",
    "last_attempt_at",
    "prior_status",
];

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::fs;
    use tempfile::TempDir;

    fn manifest_path(dir: &TempDir) -> PathBuf {
        dir.path().join("manifests").join("structured_manifest.csv")
    }

    fn valid_entry(source: &str, id: &str) -> ManifestEntry {
        let mut entry = ManifestEntry::pending(source, id, "stub");
        entry.status = ManifestStatus::Valid;
        entry.output_path = Some(format!("out/stub/{}.json", id));
        entry.attempt_count = 1;
        entry.last_attempt_at = Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        entry
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = ManifestStore::open(manifest_path(&dir)).unwrap();
        assert!(store.is_empty());
        assert!(!manifest_path(&dir).exists());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let mut store = ManifestStore::open(manifest_path(&dir)).unwrap();

        store.upsert(valid_entry("text/a.txt", "a"));
        let mut failed = ManifestEntry::pending("text/b.txt", "b", "openai");
        failed.status = ManifestStatus::Error;
        failed.error_message = Some("openai rate limited: HTTP 429, slow down".to_string());
        failed.model = Some("gpt-4o".to_string());
        failed.attempt_count = 2;
        store.upsert(failed.clone());
        store.save().unwrap();

        let reloaded = ManifestStore::open(manifest_path(&dir)).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get("text/a.txt"), Some(&valid_entry("text/a.txt", "a")));
        assert_eq!(reloaded.get("text/b.txt"), Some(&failed));
    }

    #[test]
    fn test_upsert_never_duplicates() {
        let dir = TempDir::new().unwrap();
        let mut store = ManifestStore::open(manifest_path(&dir)).unwrap();

        for attempt in 1..=3 {
            let mut entry = valid_entry("text/a.txt", "a");
            entry.attempt_count = attempt;
            store.upsert(entry);
            store.upsert(valid_entry("text/b.txt", "b"));
            store.save().unwrap();
            store.load().unwrap();
        }

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("text/a.txt").unwrap().attempt_count, 3);
        assert_eq!(store.entries()[0].source_path, "text/a.txt");
    }

    #[test]
    fn test_load_reverts_in_progress() {
        let dir = TempDir::new().unwrap();
        let mut store = ManifestStore::open(manifest_path(&dir)).unwrap();

        let mut was_valid = valid_entry("text/a.txt", "a");
        was_valid.begin_attempt(Utc::now());
        let mut was_new = ManifestEntry::pending("text/b.txt", "b", "stub");
        was_new.begin_attempt(Utc::now());
        store.upsert(was_valid);
        store.upsert(was_new);
        store.save().unwrap();

        let reloaded = ManifestStore::open(manifest_path(&dir)).unwrap();
        assert_eq!(reloaded.get("text/a.txt").unwrap().status, ManifestStatus::Valid);
        assert_eq!(reloaded.get("text/b.txt").unwrap().status, ManifestStatus::Pending);
        assert_eq!(reloaded.counts()[&ManifestStatus::InProgress], 0);
    }

    #[test]
    fn test_crash_mid_save_preserves_previous_manifest() {
        let dir = TempDir::new().unwrap();
        let path = manifest_path(&dir);
        let mut store = ManifestStore::open(&path).unwrap();
        store.upsert(valid_entry("text/a.txt", "a"));
        store.save().unwrap();

        // Simulate a crash that left a truncated temp file behind
        fs::write(crate::atomic::temp_path_for(&path), "source_path,incident_id\ntext/a.t").unwrap();

        let reloaded = ManifestStore::open(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.get("text/a.txt").unwrap().status, ManifestStatus::Valid);
    }

    #[test]
    fn test_counts_include_every_status() {
        let dir = TempDir::new().unwrap();
        let mut store = ManifestStore::open(manifest_path(&dir)).unwrap();
        store.upsert(valid_entry("text/a.txt", "a"));
        store.upsert(valid_entry("text/b.txt", "b"));
        store.upsert(ManifestEntry::pending("text/c.txt", "c", "stub"));

        let counts = store.counts();
        assert_eq!(counts.len(), ManifestStatus::ALL.len());
        assert_eq!(counts[&ManifestStatus::Valid], 2);
        assert_eq!(counts[&ManifestStatus::Pending], 1);
        assert_eq!(counts[&ManifestStatus::Error], 0);
    }

    #[test]
    fn test_empty_manifest_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = ManifestStore::open(manifest_path(&dir)).unwrap();
        store.save().unwrap();

        let header = fs::read_to_string(manifest_path(&dir)).unwrap();
        assert!(header.starts_with("source_path,incident_id,output_path,status"));
        assert!(ManifestStore::open(manifest_path(&dir)).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_row_without_key() {
        let dir = TempDir::new().unwrap();
        let path = manifest_path(&dir);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            "source_path,incident_id,output_path,status,error_message,provider,model,attempt_count,last_attempt_at,prior_status\n,a,,valid,,stub,,1,,\n",
        )
        .unwrap();

        assert!(matches!(
            ManifestStore::open(&path),
            Err(StoreError::InvalidRow { row: 1, .. })
        ));
    }
}
