//! Entity catalog snapshots and the store that keeps a search index in step
//!
//! A catalog is loaded once (from a JSON/YAML file or the built-in demo data),
//! indexed, queried many times, and re-indexed whenever it is replaced.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use crate::entity::Entity;
use crate::fuzzy::{SearchIndex, SearchOptions};

const DEMO_CATALOG: &str = include_str!("../data/demo_catalog.json");

/// An ordered, id-unique set of entities
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entities: Vec<Entity>,
    /// Where the catalog was read from, if anywhere
    source: Option<PathBuf>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate ids
    pub fn new(entities: Vec<Entity>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(entities.len());
        for entity in &entities {
            if !seen.insert(entity.id.as_str()) {
                bail!("duplicate entity id in catalog: {}", entity.id);
            }
        }
        Ok(Self {
            entities,
            source: None,
        })
    }

    /// The built-in demo catalog
    pub fn demo() -> Result<Self> {
        let entities: Vec<Entity> =
            serde_json::from_str(DEMO_CATALOG).context("parsing built-in demo catalog")?;
        Self::new(entities)
    }

    /// Load a catalog from a JSON or YAML file
    ///
    /// Files ending in `.yaml`/`.yml` are read as YAML, everything else as JSON.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading catalog {}", path.display()))?;

        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml" | "yml")
        );

        let entities: Vec<Entity> = if is_yaml {
            serde_yaml::from_str(&content)
                .with_context(|| format!("parsing YAML catalog {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("parsing JSON catalog {}", path.display()))?
        };

        let mut catalog = Self::new(entities)
            .with_context(|| format!("validating catalog {}", path.display()))?;
        catalog.source = Some(path.to_path_buf());
        Ok(catalog)
    }

    /// Load from `path` when given, otherwise fall back to the demo catalog
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_path(path),
            None => {
                log::debug!("No catalog path configured, using demo catalog");
                Self::demo()
            }
        }
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// All distinct domains, sorted
    pub fn domains(&self) -> Vec<&str> {
        let mut domains: Vec<&str> = self.entities.iter().map(|e| e.domain.as_str()).collect();
        domains.sort_unstable();
        domains.dedup();
        domains
    }
}

/// The current catalog together with its search index
///
/// The index is rebuilt on every [`CatalogStore::replace`], so callers never
/// see an index for a different snapshot than [`CatalogStore::catalog`].
#[derive(Debug, Clone)]
pub struct CatalogStore {
    catalog: Catalog,
    index: Arc<SearchIndex>,
    options: SearchOptions,
    revision: u64,
}

impl CatalogStore {
    pub fn new(catalog: Catalog, options: SearchOptions) -> Self {
        let index = Arc::new(SearchIndex::build(catalog.entities(), options));
        Self {
            catalog,
            index,
            options,
            revision: 1,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn index(&self) -> &SearchIndex {
        &self.index
    }

    /// Shared handle to the current index, for off-thread searches
    pub fn shared_index(&self) -> Arc<SearchIndex> {
        Arc::clone(&self.index)
    }

    /// Incremented each time the catalog is replaced
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Swap in a new catalog and rebuild the index
    pub fn replace(&mut self, catalog: Catalog) {
        self.index = Arc::new(SearchIndex::build(catalog.entities(), self.options));
        self.catalog = catalog;
        self.revision += 1;
        log::debug!(
            "Catalog replaced: {} entities, revision {}",
            self.catalog.len(),
            self.revision
        );
    }

    /// Re-read the catalog from where it was loaded
    ///
    /// The demo catalog has no source and reloads from the embedded copy.
    pub fn reload(&mut self) -> Result<()> {
        let source = self.catalog.source().map(Path::to_path_buf);
        let catalog = Catalog::load(source.as_deref())?;
        self.replace(catalog);
        Ok(())
    }
}
