//! Key-value persistence of the working rows, one key per site.
//!
//! Stores only move rows in and out. Scrubbing is the workbench's job, never the store's.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use snafu::prelude::*;

use crate::workbench::*;

pub const SITE_KEY_PREFIX: &str = "site_";

/// The storage key of a site: prefix + lower-cased name, non-alphanumerics as `_`.
pub fn site_key(site: &str) -> String {
    let slug: String = site
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}{}", SITE_KEY_PREFIX, slug)
}

/// A full row set is read or written in one operation; the last write wins.
pub trait RowStore {
    fn load(&self, key: &str) -> ToolResult<Option<Vec<PersistedRow>>>;
    fn save(&mut self, key: &str, rows: &[PersistedRow]) -> ToolResult<()>;
    /// All the keys, sorted.
    fn keys(&self) -> ToolResult<Vec<String>>;
}

/// One pretty-printed JSON file per key.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct JsonDirStore {
    root: PathBuf,
}

impl JsonDirStore {
    pub fn open(root: &Path) -> ToolResult<JsonDirStore> {
        fs::create_dir_all(root).context(StoreIoSnafu {
            path: root.display().to_string(),
        })?;
        Ok(JsonDirStore {
            root: root.to_path_buf(),
        })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }
}

impl RowStore for JsonDirStore {
    fn load(&self, key: &str) -> ToolResult<Option<Vec<PersistedRow>>> {
        let p = self.path_for(key);
        if !p.exists() {
            debug!("load: no entry {:?}", key);
            return Ok(None);
        }
        let contents = fs::read_to_string(&p).context(StoreIoSnafu {
            path: p.display().to_string(),
        })?;
        let rows: Vec<PersistedRow> =
            serde_json::from_str(&contents).context(StoreFormatSnafu { key })?;
        debug!("load: {:?}: {} row(s)", key, rows.len());
        Ok(Some(rows))
    }

    fn save(&mut self, key: &str, rows: &[PersistedRow]) -> ToolResult<()> {
        let p = self.path_for(key);
        let contents = serde_json::to_string_pretty(rows).context(WritingJsonSnafu {})?;
        // Write aside then rename, so a reader never sees half an entry.
        let tmp = self.root.join(format!(".{}.json.tmp", key));
        fs::write(&tmp, contents).context(StoreIoSnafu {
            path: tmp.display().to_string(),
        })?;
        fs::rename(&tmp, &p).context(StoreIoSnafu {
            path: p.display().to_string(),
        })?;
        debug!("save: {:?}: {} row(s)", key, rows.len());
        Ok(())
    }

    fn keys(&self) -> ToolResult<Vec<String>> {
        let entries = fs::read_dir(&self.root).context(StoreIoSnafu {
            path: self.root.display().to_string(),
        })?;
        let mut res: Vec<String> = Vec::new();
        for entry in entries {
            let entry = entry.context(StoreIoSnafu {
                path: self.root.display().to_string(),
            })?;
            let name = entry.file_name().to_string_lossy().to_string();
            if let Some(key) = name.strip_suffix(".json") {
                if key.starts_with(SITE_KEY_PREFIX) {
                    res.push(key.to_string());
                }
            }
        }
        res.sort();
        Ok(res)
    }
}

/// Keeps the rows in memory only, for dry runs and tests.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, Vec<PersistedRow>>,
}

impl RowStore for MemoryStore {
    fn load(&self, key: &str) -> ToolResult<Option<Vec<PersistedRow>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, rows: &[PersistedRow]) -> ToolResult<()> {
        self.entries.insert(key.to_string(), rows.to_vec());
        Ok(())
    }

    fn keys(&self) -> ToolResult<Vec<String>> {
        Ok(self.entries.keys().cloned().collect())
    }
}
