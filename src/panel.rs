//! Panel-level composition of search and category filtering
//!
//! The panel has two presentation modes. With a search term, the whole
//! catalog is fuzzy-searched and the hits are grouped into devices, sensors
//! and actions. Without one, the catalog is filtered by the active category
//! and subcategory chip. The category state is kept while a search is active
//! and comes back untouched when the term is cleared.

use serde::Serialize;

use crate::category::{
    in_subcategory, Category, SearchGroup, SubcategoryCounts, SubcategoryMode,
    SubcategorySelection,
};
use crate::entity::Entity;
use crate::fuzzy::{SearchIndex, SearchResult};

/// Search hits for one display group
#[derive(Debug, Clone, Serialize)]
pub struct ResultGroup {
    pub group: SearchGroup,
    pub count: usize,
    pub results: Vec<SearchResult>,
}

/// Split ranked results into the fixed display groups, keeping rank order
///
/// Every group is present, possibly empty.
pub fn group_results(results: Vec<SearchResult>) -> Vec<ResultGroup> {
    let mut groups: Vec<ResultGroup> = SearchGroup::ALL
        .iter()
        .map(|&group| ResultGroup {
            group,
            count: 0,
            results: Vec::new(),
        })
        .collect();

    for result in results {
        let group = SearchGroup::of(&result.entity);
        if let Some(slot) = groups.iter_mut().find(|g| g.group == group) {
            slot.count += 1;
            slot.results.push(result);
        }
    }
    groups
}

/// Entities of `category` that fall into the `selected` subcategory
pub fn filter_entities<'a>(
    entities: &'a [Entity],
    category: Category,
    mode: SubcategoryMode,
    selected: &str,
) -> Vec<&'a Entity> {
    entities
        .iter()
        .filter(|e| category.contains(e))
        .filter(|e| in_subcategory(e, mode, selected))
        .collect()
}

/// What the panel shows for its current state
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "view", rename_all = "lowercase")]
pub enum PanelView {
    Search {
        term: String,
        total: usize,
        groups: Vec<ResultGroup>,
    },
    Browse {
        category: Category,
        mode: SubcategoryMode,
        selected: String,
        counts: SubcategoryCounts,
        entities: Vec<Entity>,
    },
}

/// User-driven panel state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelState {
    category: Category,
    mode: SubcategoryMode,
    selection: SubcategorySelection,
    search_term: String,
}

impl Default for PanelState {
    fn default() -> Self {
        Self {
            category: Category::Devices,
            mode: SubcategoryMode::default(),
            selection: SubcategorySelection::default(),
            search_term: String::new(),
        }
    }
}

impl PanelState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn mode(&self) -> SubcategoryMode {
        self.mode
    }

    pub fn selected_subcategory(&self) -> &str {
        self.selection.current()
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// Whether the search view is in charge
    pub fn is_search_active(&self) -> bool {
        !self.search_term.trim().is_empty()
    }

    /// Switch primary category; a different category starts from `all`
    pub fn set_category(&mut self, category: Category) {
        if self.category != category {
            self.category = category;
            self.selection.reset();
        }
    }

    /// Switch between domain and area chips; a different mode starts from `all`
    pub fn set_mode(&mut self, mode: SubcategoryMode) {
        if self.mode != mode {
            self.mode = mode;
            self.selection.reset();
        }
    }

    /// Click a subcategory chip (clicking the active one returns to `all`)
    pub fn select_subcategory(&mut self, key: &str) {
        self.selection.select(key);
    }

    pub fn set_search(&mut self, term: &str) {
        self.search_term = term.to_string();
    }

    pub fn clear_search(&mut self) {
        self.search_term.clear();
    }

    /// Compute the visible content against `index`
    pub fn view(&self, index: &SearchIndex) -> PanelView {
        if self.is_search_active() {
            let results = index.search(&self.search_term);
            return PanelView::Search {
                term: self.search_term.trim().to_string(),
                total: results.len(),
                groups: group_results(results),
            };
        }

        let counts = SubcategoryCounts::compute(
            index.entities().iter().filter(|e| self.category.contains(e)),
            self.mode,
        );
        let entities = filter_entities(
            index.entities(),
            self.category,
            self.mode,
            self.selection.current(),
        )
        .into_iter()
        .cloned()
        .collect();

        PanelView::Browse {
            category: self.category,
            mode: self.mode,
            selected: self.selection.current().to_string(),
            counts,
            entities,
        }
    }
}
