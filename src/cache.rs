use std::{
    collections::{HashMap, VecDeque},
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::SystemTime,
};

use log::debug;

use crate::{
    error::LoadError,
    loader::{LoadOptions, SkipSet, load_resilient},
    sniff::sniff_delimiter,
    tabular::Table,
    window::RowWindow,
};

pub const DEFAULT_CACHE_CAPACITY: usize = 32;

/// Identity of a file at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FileStamp {
    path: PathBuf,
    modified: SystemTime,
    len: u64,
}

impl FileStamp {
    fn read(path: &Path) -> Result<Self, LoadError> {
        let canonical = fs::canonicalize(path).map_err(|err| LoadError::file_access(path, err))?;
        let metadata = fs::metadata(&canonical).map_err(|err| LoadError::file_access(path, err))?;
        let modified = metadata
            .modified()
            .map_err(|err| LoadError::file_access(path, err))?;
        Ok(Self {
            path: canonical,
            modified,
            len: metadata.len(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    file: FileStamp,
    window: RowWindow,
    delimiter: Option<u8>,
    encoding: &'static str,
}

/// Memoized window loads with LRU eviction.
///
/// Entries are keyed by canonical path, modification time, length, window and
/// the load options that change the parsed result. Before every lookup the
/// file is re-stamped and entries for an older version of it are dropped, so
/// an edited file is never answered from cache. Cached tables are shared as
/// `Arc<Table>` and never mutated.
pub struct LoadCache {
    entries: HashMap<CacheKey, Arc<Table>>,
    delimiters: HashMap<FileStamp, u8>,
    access_order: VecDeque<CacheKey>,
    capacity: usize,
    hits: usize,
    misses: usize,
}

impl Default for LoadCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl LoadCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            delimiters: HashMap::new(),
            access_order: VecDeque::new(),
            capacity,
            hits: 0,
            misses: 0,
        }
    }

    pub fn get_or_load(
        &mut self,
        path: &Path,
        window: RowWindow,
        options: &LoadOptions,
    ) -> Result<Arc<Table>, LoadError> {
        let file = FileStamp::read(path)?;
        self.evict_stale(&file);

        let key = CacheKey {
            file,
            window,
            delimiter: options.delimiter,
            encoding: options.encoding.name(),
        };
        if let Some(table) = self.entries.get(&key).cloned() {
            self.hits += 1;
            self.touch(&key);
            debug!("Cache hit for {:?} window {:?}", key.file.path, window);
            return Ok(table);
        }
        self.misses += 1;

        let delimiter = self.delimiter_for(&key.file, options)?;
        let mut skip = SkipSet::new();
        let table = Arc::new(load_resilient(
            &key.file.path,
            Some(delimiter),
            &mut skip,
            window,
            options,
        )?);
        self.insert(key, Arc::clone(&table));
        Ok(table)
    }

    /// Sniffed delimiter for the current version of `path`, if one was recorded.
    pub fn cached_delimiter(&self, path: &Path) -> Option<u8> {
        let file = FileStamp::read(path).ok()?;
        self.delimiters.get(&file).copied()
    }

    pub fn invalidate(&mut self, path: &Path) {
        let canonical = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        self.entries.retain(|key, _| key.file.path != canonical);
        self.delimiters.retain(|file, _| file.path != canonical);
        self.sync_access_order();
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.delimiters.clear();
        self.access_order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    fn delimiter_for(&mut self, file: &FileStamp, options: &LoadOptions) -> Result<u8, LoadError> {
        if let Some(delimiter) = options.delimiter {
            return Ok(delimiter);
        }
        if let Some(&delimiter) = self.delimiters.get(file) {
            return Ok(delimiter);
        }
        let delimiter = sniff_delimiter(&file.path)?;
        self.delimiters.insert(file.clone(), delimiter);
        Ok(delimiter)
    }

    fn evict_stale(&mut self, current: &FileStamp) {
        let before = self.entries.len();
        self.entries
            .retain(|key, _| key.file.path != current.path || key.file == *current);
        self.delimiters
            .retain(|file, _| file.path != current.path || file == current);
        if self.entries.len() != before {
            debug!(
                "Dropped {} stale cache entries for {:?}",
                before - self.entries.len(),
                current.path
            );
            self.sync_access_order();
        }
    }

    fn insert(&mut self, key: CacheKey, table: Arc<Table>) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            match self.access_order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
        self.access_order.push_back(key.clone());
        self.entries.insert(key, table);
    }

    fn touch(&mut self, key: &CacheKey) {
        if let Some(pos) = self.access_order.iter().position(|k| k == key)
            && let Some(existing) = self.access_order.remove(pos)
        {
            self.access_order.push_back(existing);
        }
    }

    fn sync_access_order(&mut self) {
        let entries = &self.entries;
        self.access_order.retain(|key| entries.contains_key(key));
    }
}
