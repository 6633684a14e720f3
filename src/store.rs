//! The Record Store: owns the in-memory collection of entries keyed by
//! citation-key, in file order, mutated only through Session State commits.
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::bibtex_io;
use crate::entry::Entry;
use crate::error::{CitekeyError, StoreError};

/// An in-memory collection of entries keyed by citation-key, ordered by
/// input order, backed by a single bibliography file.
pub struct Store {
    path: PathBuf,
    entries: IndexMap<String, Entry>,
}

impl Store {
    /// Load and parse a bibliography file. A missing or malformed file is a
    /// fatal configuration error: this is surfaced at startup,
    /// not swallowed like a per-entry or adapter error.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let contents = std::fs::read_to_string(&path).map_err(|source| StoreError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let mut entries = IndexMap::new();
        for entry in bibtex_io::parse_all(&contents) {
            let entry = entry?;
            if entries.contains_key(&entry.citekey) {
                return Err(CitekeyError::Duplicate(entry.citekey).into());
            }
            entries.insert(entry.citekey.clone(), entry);
        }
        Ok(Self { path, entries })
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    /// Entries in file order.
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace the entry stored at `key`, preserving its position. The key
    /// itself is never changed through this path.
    pub fn replace(&mut self, key: &str, entry: Entry) -> Result<(), StoreError> {
        if !self.entries.contains_key(key) {
            return Err(CitekeyError::Missing(key.to_owned()).into());
        }
        self.entries.insert(key.to_owned(), entry);
        Ok(())
    }

    /// Serialize every entry in store order and atomically replace the
    /// backing file: write to a sibling temp file, then rename over the
    /// original, so a crash mid-write never leaves a truncated bibliography.
    pub fn flush(&self) -> Result<(), StoreError> {
        let text = bibtex_io::serialize_all(self.entries.values());
        let tmp_path = self.path.with_extension("bib.tmp");
        std::fs::write(&tmp_path, &text).map_err(|source| StoreError::Write {
            path: tmp_path.display().to_string(),
            source,
        })?;
        std::fs::rename(&tmp_path, &self.path).map_err(|source| StoreError::Write {
            path: self.path.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_and_flushes_round_trip() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("refval-store-test-{}.bib", std::process::id()));
        std::fs::write(&path, "@article{k, title = {T}, author = {A}, journal = {J}, year = {2020}}").unwrap();

        let mut store = Store::load(&path).unwrap();
        assert_eq!(store.len(), 1);

        let mut entry = store.get("k").unwrap().clone();
        entry.set_field("title", "Updated Title");
        store.replace("k", entry).unwrap();
        store.flush().unwrap();

        let reloaded = Store::load(&path).unwrap();
        assert_eq!(reloaded.get("k").unwrap().field("title"), Some("Updated Title"));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn duplicate_citekey_is_rejected() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("refval-store-dup-test-{}.bib", std::process::id()));
        std::fs::write(
            &path,
            "@misc{k, title = {A}}\n@misc{k, title = {B}}",
        )
        .unwrap();

        assert!(matches!(
            Store::load(&path),
            Err(StoreError::Citekey(CitekeyError::Duplicate(_)))
        ));

        std::fs::remove_file(&path).ok();
    }
}
