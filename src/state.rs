use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

pub const DEFAULT_CAPACITY: usize = 5000;

/// Insertion-ordered set of links already emailed, bounded to the most
/// recent `capacity` entries. Inserting past capacity evicts the oldest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentLinkSet {
    links: VecDeque<String>,
    index: HashSet<String>,
    capacity: usize,
}

impl SentLinkSet {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            links: VecDeque::new(),
            index: HashSet::new(),
            capacity,
        }
    }

    /// Duplicates keep their first position; then only the newest
    /// `capacity` links are retained.
    pub fn from_links<I, S>(links: I, capacity: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let unique: Vec<String> = links
            .into_iter()
            .map(Into::into)
            .filter(|link| seen.insert(link.clone()))
            .collect();

        let skip = unique.len().saturating_sub(capacity);
        let links: VecDeque<String> = unique.into_iter().skip(skip).collect();
        let index = links.iter().cloned().collect();
        Self {
            links,
            index,
            capacity,
        }
    }

    pub fn contains(&self, link: &str) -> bool {
        self.index.contains(link)
    }

    /// Returns false if the link was already present (its position is kept).
    pub fn insert(&mut self, link: &str) -> bool {
        if self.capacity == 0 || self.index.contains(link) {
            return false;
        }
        self.links.push_back(link.to_string());
        self.index.insert(link.to_string());
        while self.links.len() > self.capacity {
            if let Some(evicted) = self.links.pop_front() {
                self.index.remove(&evicted);
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.links.iter().map(String::as_str)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateDocument {
    #[serde(default)]
    sent_urls: Vec<String>,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

/// Persisted state: the sent-link set plus any other keys found in the
/// file, which are written back untouched.
#[derive(Debug, Clone)]
pub struct State {
    pub sent: SentLinkSet,
    extra: serde_json::Map<String, serde_json::Value>,
}

pub struct StateStore {
    path: PathBuf,
    capacity: usize,
}

impl StateStore {
    pub fn new(path: &Path) -> Self {
        Self::with_capacity(path, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(path: &Path, capacity: usize) -> Self {
        Self {
            path: path.to_path_buf(),
            capacity,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or unreadable state is treated as empty.
    pub fn load(&self) -> State {
        let empty = State {
            sent: SentLinkSet::with_capacity(self.capacity),
            extra: serde_json::Map::new(),
        };

        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No prior state, starting fresh");
                return empty;
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read state file, starting fresh");
                return empty;
            }
        };

        match serde_json::from_str::<StateDocument>(&data) {
            Ok(doc) => {
                let sent = SentLinkSet::from_links(doc.sent_urls, self.capacity);
                tracing::debug!(path = %self.path.display(), links = sent.len(), "Loaded state");
                State {
                    sent,
                    extra: doc.extra,
                }
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "State file is corrupt, starting fresh");
                empty
            }
        }
    }

    pub fn save(&self, state: &State) -> Result<()> {
        // Re-bound in case the set was built with a larger capacity.
        let bounded = SentLinkSet::from_links(state.sent.iter(), self.capacity);
        let doc = StateDocument {
            sent_urls: bounded.iter().map(str::to_string).collect(),
            extra: state.extra.clone(),
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create state directory: {}", parent.display())
                })?;
            }
        }

        let json = serde_json::to_string_pretty(&doc).context("Failed to serialize state")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write state file: {}", self.path.display()))?;
        Ok(())
    }
}
