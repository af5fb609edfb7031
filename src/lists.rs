//! Rotation group list store
//!
//! Each rotation group is an ordered list of endpoint identifiers
//! persisted as a line-delimited text file in the profile directory.
//! Order defines the rotation sequence; duplicates are permitted. Every
//! mutation rewrites the whole file through a temp file and an atomic
//! rename so an interrupted save never leaves a partial list.

use crate::state::Group;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ListError {
    #[error("Failed to read list file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Endpoint '{0}' not found in list {1}")]
    NotFound(String, Group),
}

/// Store for the two endpoint list files of a profile.
pub struct ListStore {
    dir: PathBuf,
}

impl ListStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Path of a group's list file.
    pub fn path(&self, group: Group) -> PathBuf {
        self.dir.join(group.list_file_name())
    }

    /// Load a group's endpoints in order. A missing file is an empty
    /// list; blank lines and surrounding whitespace are ignored.
    pub fn load(&self, group: Group) -> Result<Vec<String>, ListError> {
        let content = match std::fs::read_to_string(self.path(group)) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }

    /// Overwrite a group's list atomically.
    pub fn save(&self, group: Group, endpoints: &[String]) -> Result<(), ListError> {
        let path = self.path(group);
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        for endpoint in endpoints {
            writeln!(tmp, "{}", endpoint)?;
        }
        tmp.persist(&path).map_err(|e| ListError::ReadError(e.error))?;
        Ok(())
    }

    /// Endpoints whose identifier contains `pattern`, case-insensitively.
    pub fn search(&self, group: Group, pattern: &str) -> Result<Vec<String>, ListError> {
        let needle = pattern.to_lowercase();
        Ok(self
            .load(group)?
            .into_iter()
            .filter(|endpoint| endpoint.to_lowercase().contains(&needle))
            .collect())
    }

    /// Append an endpoint to a group. Duplicates are permitted.
    pub fn add(&self, group: Group, endpoint: &str) -> Result<(), ListError> {
        let mut endpoints = self.load(group)?;
        endpoints.push(endpoint.trim().to_string());
        self.save(group, &endpoints)
    }

    /// Remove the first exact match of `endpoint` from a group.
    pub fn remove(&self, group: Group, endpoint: &str) -> Result<(), ListError> {
        let mut endpoints = self.load(group)?;
        let pos = endpoints
            .iter()
            .position(|e| e == endpoint)
            .ok_or_else(|| ListError::NotFound(endpoint.to_string(), group))?;
        endpoints.remove(pos);
        self.save(group, &endpoints)
    }

    /// Substring-replace `find` with `replacement` in every identifier of
    /// a group. Returns the number of identifiers that changed.
    /// Identifiers emptied by the replacement are dropped from the list.
    pub fn replace(
        &self,
        group: Group,
        find: &str,
        replacement: &str,
    ) -> Result<usize, ListError> {
        let endpoints = self.load(group)?;
        let mut changed = 0;
        let replaced: Vec<String> = endpoints
            .into_iter()
            .filter_map(|endpoint| {
                let new = endpoint.replace(find, replacement);
                if new != endpoint {
                    changed += 1;
                }
                let new = new.trim().to_string();
                if new.is_empty() { None } else { Some(new) }
            })
            .collect();

        if changed > 0 {
            self.save(group, &replaced)?;
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, ListStore) {
        let dir = TempDir::new().unwrap();
        let store = ListStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let (_dir, store) = store();
        assert!(store.load(Group::A).unwrap().is_empty());
    }

    #[test]
    fn test_save_load_preserves_order() {
        let (_dir, store) = store();
        let endpoints = vec![
            "US-FREE#1".to_string(),
            "CA#5".to_string(),
            "NL-FREE#1".to_string(),
        ];
        store.save(Group::A, &endpoints).unwrap();
        assert_eq!(store.load(Group::A).unwrap(), endpoints);
    }

    #[test]
    fn test_load_skips_blank_lines() {
        let (dir, store) = store();
        std::fs::write(dir.path().join("list_a.txt"), "US#1\n\n  \nCA#2  \n").unwrap();
        assert_eq!(store.load(Group::A).unwrap(), vec!["US#1", "CA#2"]);
    }

    #[test]
    fn test_groups_are_separate_files() {
        let (_dir, store) = store();
        store.add(Group::A, "US#1").unwrap();
        store.add(Group::B, "JP#3").unwrap();

        assert_eq!(store.load(Group::A).unwrap(), vec!["US#1"]);
        assert_eq!(store.load(Group::B).unwrap(), vec!["JP#3"]);
    }

    #[test]
    fn test_add_permits_duplicates() {
        let (_dir, store) = store();
        store.add(Group::A, "US#1").unwrap();
        store.add(Group::A, "US#1").unwrap();
        assert_eq!(store.load(Group::A).unwrap(), vec!["US#1", "US#1"]);
    }

    #[test]
    fn test_add_then_remove_restores_empty() {
        let (_dir, store) = store();
        store.add(Group::A, "US#1").unwrap();
        store.remove(Group::A, "US#1").unwrap();
        assert!(store.load(Group::A).unwrap().is_empty());
    }

    #[test]
    fn test_remove_first_match_only() {
        let (_dir, store) = store();
        store.save(
            Group::A,
            &["US#1".to_string(), "CA#2".to_string(), "US#1".to_string()],
        )
        .unwrap();
        store.remove(Group::A, "US#1").unwrap();
        assert_eq!(store.load(Group::A).unwrap(), vec!["CA#2", "US#1"]);
    }

    #[test]
    fn test_remove_not_found() {
        let (_dir, store) = store();
        store.add(Group::A, "US#1").unwrap();

        let result = store.remove(Group::A, "CA#2");
        assert!(matches!(result, Err(ListError::NotFound(_, Group::A))));
        assert_eq!(store.load(Group::A).unwrap(), vec!["US#1"]);
    }

    #[test]
    fn test_search_case_insensitive() {
        let (_dir, store) = store();
        store.save(
            Group::B,
            &["JP#3".to_string(), "SG#5".to_string(), "jp-free#1".to_string()],
        )
        .unwrap();

        let matches = store.search(Group::B, "jp").unwrap();
        assert_eq!(matches, vec!["JP#3", "jp-free#1"]);

        assert!(store.search(Group::B, "US").unwrap().is_empty());
    }

    #[test]
    fn test_replace_counts_changed_identifiers() {
        let (_dir, store) = store();
        store.save(
            Group::A,
            &["US-FREE#1".to_string(), "CA#5".to_string(), "US-FREE#2".to_string()],
        )
        .unwrap();

        let changed = store.replace(Group::A, "US-FREE", "US-PLUS").unwrap();
        assert_eq!(changed, 2);
        assert_eq!(
            store.load(Group::A).unwrap(),
            vec!["US-PLUS#1", "CA#5", "US-PLUS#2"]
        );
    }

    #[test]
    fn test_replace_is_idempotent() {
        let (_dir, store) = store();
        store.save(Group::A, &["US-FREE#1".to_string(), "CA#5".to_string()]).unwrap();

        assert_eq!(store.replace(Group::A, "FREE", "PLUS").unwrap(), 1);
        assert_eq!(store.replace(Group::A, "FREE", "PLUS").unwrap(), 0);
        assert_eq!(store.load(Group::A).unwrap(), vec!["US-PLUS#1", "CA#5"]);
    }

    #[test]
    fn test_replace_drops_emptied_identifiers() {
        let (_dir, store) = store();
        store.save(Group::A, &["US#1".to_string(), "CA#2".to_string()]).unwrap();

        let changed = store.replace(Group::A, "US#1", "").unwrap();
        assert_eq!(changed, 1);
        assert_eq!(store.load(Group::A).unwrap(), vec!["CA#2"]);
    }
}
