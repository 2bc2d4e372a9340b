//! Source catalog: chart source id → icon URL.
//!
//! Backed by the two indexes of the YARC OpenSource repository. Each index
//! is fetched once on a background thread and never refreshed. Until both
//! have settled (loaded or failed) lookups report [`Error::CatalogNotLoaded`].

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, OnceLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::fetch::Fetch;

pub const DEFAULT_CATALOG_ROOT: &str =
    "https://raw.githubusercontent.com/YARC-Official/OpenSource/master";

/// Icon used for sources missing from both indexes
const CUSTOM_ICON: &str = "custom";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum IndexKind {
    Base,
    Extra,
}

impl IndexKind {
    pub fn dir(&self) -> &'static str {
        self.into()
    }
}

/// One source of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
    pub ids: Vec<String>,
    /// Display names keyed by language code
    #[serde(default)]
    pub names: HashMap<String, String>,
    pub icon: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl SourceEntry {
    pub fn matches(&self, source_id: &str) -> bool {
        self.ids.iter().any(|id| id == source_id)
    }

    /// Name in `language`, falling back to English.
    pub fn display_name(&self, language: &str) -> Option<&str> {
        self.names
            .get(language)
            .or_else(|| self.names.get("en-US"))
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceIndex {
    #[serde(rename = "type")]
    pub kind: IndexKind,
    pub sources: Vec<SourceEntry>,
}

impl SourceIndex {
    pub fn find(&self, source_id: &str) -> Option<&SourceEntry> {
        self.sources.iter().find(|source| source.matches(source_id))
    }
}

/// Load progress, observable by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogState {
    Loading,
    /// Both indexes settled; a failed index behaves as empty
    Ready,
}

pub struct SourceCatalog {
    root: String,
    /// `None` once settled means the fetch failed
    base: OnceLock<Option<SourceIndex>>,
    extra: OnceLock<Option<SourceIndex>>,
    settled: Mutex<usize>,
    settled_cv: Condvar,
}

impl SourceCatalog {
    pub fn new() -> Self {
        Self::with_root(DEFAULT_CATALOG_ROOT)
    }

    pub fn with_root(root: impl Into<String>) -> Self {
        Self {
            root: root.into().trim_end_matches('/').to_string(),
            base: OnceLock::new(),
            extra: OnceLock::new(),
            settled: Mutex::new(0),
            settled_cv: Condvar::new(),
        }
    }

    /// Catalog with both indexes already present.
    pub fn from_indexes(base: Option<SourceIndex>, extra: Option<SourceIndex>) -> Self {
        let catalog = Self::new();
        catalog.settle(IndexKind::Base, base);
        catalog.settle(IndexKind::Extra, extra);
        catalog
    }

    pub fn index_url(&self, kind: IndexKind) -> String {
        format!("{}/{}/index.json", self.root, kind.dir())
    }

    pub fn icon_url(&self, kind: IndexKind, icon: &str) -> String {
        format!("{}/{}/icons/{}.png", self.root, kind.dir(), icon)
    }

    pub fn default_icon_url(&self) -> String {
        self.icon_url(IndexKind::Base, CUSTOM_ICON)
    }

    /// Store the outcome of loading one index.
    ///
    /// Returns `false` if that index had already settled; the first outcome
    /// is kept.
    pub fn settle(&self, kind: IndexKind, index: Option<SourceIndex>) -> bool {
        let slot = match kind {
            IndexKind::Base => &self.base,
            IndexKind::Extra => &self.extra,
        };

        if slot.set(index).is_err() {
            debug!("{} source index already settled, ignoring", kind);
            return false;
        }

        let mut settled = self.settled.lock().unwrap_or_else(|e| e.into_inner());
        *settled += 1;
        self.settled_cv.notify_all();
        true
    }

    /// Fetch both indexes on background threads.
    pub fn spawn_load(self: &Arc<Self>, fetcher: Arc<dyn Fetch>) -> Vec<JoinHandle<()>> {
        [IndexKind::Base, IndexKind::Extra]
            .into_iter()
            .filter_map(|kind| {
                let catalog = Arc::clone(self);
                let fetcher = Arc::clone(&fetcher);
                let spawned = thread::Builder::new()
                    .name(format!("catalog-{}", kind))
                    .spawn(move || {
                        let index = catalog.fetch_index(fetcher.as_ref(), kind);
                        catalog.settle(kind, index);
                    });

                match spawned {
                    Ok(handle) => Some(handle),
                    Err(e) => {
                        warn!("Failed to spawn {} catalog loader: {}", kind, e);
                        self.settle(kind, None);
                        None
                    }
                }
            })
            .collect()
    }

    fn fetch_index(&self, fetcher: &dyn Fetch, kind: IndexKind) -> Option<SourceIndex> {
        let url = self.index_url(kind);
        let parsed = fetcher
            .fetch_text(&url)
            .and_then(|text| Ok(serde_json::from_str::<SourceIndex>(&text)?));

        match parsed {
            Ok(index) => {
                if index.kind != kind {
                    warn!(
                        "Index at {} declares type {}, storing it as {}",
                        url, index.kind, kind
                    );
                }
                info!("Loaded {} source index ({} sources)", kind, index.sources.len());
                Some(index)
            }
            Err(e) => {
                warn!("Failed to load {} source index from {}: {}", kind, url, e);
                None
            }
        }
    }

    pub fn state(&self) -> CatalogState {
        if self.base.get().is_some() && self.extra.get().is_some() {
            CatalogState::Ready
        } else {
            CatalogState::Loading
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.state() == CatalogState::Ready
    }

    /// Block until both indexes settled or `timeout` passes.
    pub fn wait_loaded(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut settled = self.settled.lock().unwrap_or_else(|e| e.into_inner());

        while *settled < 2 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            settled = match self.settled_cv.wait_timeout(settled, remaining) {
                Ok((guard, _)) => guard,
                Err(e) => e.into_inner().0,
            };
        }
        true
    }

    /// Find the entry for `source_id`, base index first.
    pub fn lookup(&self, source_id: &str) -> Result<Option<(IndexKind, &SourceEntry)>> {
        let (Some(base), Some(extra)) = (self.base.get(), self.extra.get()) else {
            return Err(Error::CatalogNotLoaded);
        };

        let found = base
            .as_ref()
            .and_then(|index| index.find(source_id))
            .map(|entry| (IndexKind::Base, entry))
            .or_else(|| {
                extra
                    .as_ref()
                    .and_then(|index| index.find(source_id))
                    .map(|entry| (IndexKind::Extra, entry))
            });
        Ok(found)
    }

    /// Icon URL for `source_id`; the custom icon when no index knows it.
    pub fn resolve(&self, source_id: &str) -> Result<String> {
        Ok(match self.lookup(source_id)? {
            Some((kind, entry)) => self.icon_url(kind, &entry.icon),
            None => self.default_icon_url(),
        })
    }
}

impl Default for SourceCatalog {
    fn default() -> Self {
        Self::new()
    }
}
