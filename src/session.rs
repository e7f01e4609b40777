//! Explicit session state for an interactive viewer.
//!
//! [`FilterSession`] holds the ordered list of active filters a user has
//! built. [`ViewerSession`] owns the window cache and the table currently on
//! display. Both are plain values handed to whatever drives the interaction,
//! so the loading and filtering logic needs no UI harness.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Result;
use log::{debug, warn};

use crate::{
    cache::LoadCache,
    error::LoadError,
    filter::{FilterSpec, apply_filters},
    loader::LoadOptions,
    tabular::Table,
    window::RowWindow,
};

pub type FilterId = usize;

#[derive(Debug, Clone, Default)]
pub struct FilterSession {
    filters: Vec<(FilterId, FilterSpec)>,
    next_id: FilterId,
}

impl FilterSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, spec: FilterSpec) -> FilterId {
        let id = self.next_id;
        self.next_id += 1;
        self.filters.push((id, spec));
        id
    }

    /// Replaces the filter with `id`, keeping its position.
    pub fn update(&mut self, id: FilterId, spec: FilterSpec) -> bool {
        match self.filters.iter_mut().find(|(existing, _)| *existing == id) {
            Some((_, slot)) => {
                *slot = spec;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: FilterId) -> bool {
        let before = self.filters.len();
        self.filters.retain(|(existing, _)| *existing != id);
        self.filters.len() != before
    }

    pub fn clear(&mut self) {
        self.filters.clear();
    }

    pub fn get(&self, id: FilterId) -> Option<&FilterSpec> {
        self.filters
            .iter()
            .find(|(existing, _)| *existing == id)
            .map(|(_, spec)| spec)
    }

    pub fn specs(&self) -> Vec<FilterSpec> {
        self.filters.iter().map(|(_, spec)| spec.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn apply(&self, table: &Table) -> Result<Table> {
        let filtered = apply_filters(table, &self.specs())?;
        debug!(
            "Applied {} filter(s): {} -> {} row(s)",
            self.len(),
            table.row_count(),
            filtered.row_count()
        );
        Ok(filtered)
    }
}

pub struct ViewerSession {
    cache: LoadCache,
    options: LoadOptions,
    current: Option<Arc<Table>>,
    source: Option<(PathBuf, RowWindow)>,
    last_error: Option<String>,
}

impl ViewerSession {
    pub fn new(options: LoadOptions) -> Self {
        Self::with_cache(LoadCache::default(), options)
    }

    pub fn with_cache(cache: LoadCache, options: LoadOptions) -> Self {
        Self {
            cache,
            options,
            current: None,
            source: None,
            last_error: None,
        }
    }

    /// Loads `window` of `path` and makes it the current table. On failure
    /// the previous table stays current and the error message is kept.
    pub fn open(&mut self, path: &Path, window: RowWindow) -> Result<Arc<Table>, LoadError> {
        match self.cache.get_or_load(path, window, &self.options) {
            Ok(table) => {
                self.current = Some(Arc::clone(&table));
                self.source = Some((path.to_path_buf(), window));
                self.last_error = None;
                Ok(table)
            }
            Err(err) => {
                warn!("Keeping previous view, load of {path:?} failed: {err}");
                self.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub fn current(&self) -> Option<&Arc<Table>> {
        self.current.as_ref()
    }

    pub fn source(&self) -> Option<(&Path, RowWindow)> {
        self.source
            .as_ref()
            .map(|(path, window)| (path.as_path(), *window))
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    pub fn cache(&self) -> &LoadCache {
        &self.cache
    }

    /// Applies `filters` to the current table.
    pub fn filtered(&self, filters: &FilterSession) -> Result<Option<Table>> {
        self.current
            .as_deref()
            .map(|table| filters.apply(table))
            .transpose()
    }
}
