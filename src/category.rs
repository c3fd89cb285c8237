//! Category and subcategory classification
//!
//! Every entity lands in exactly one primary category. Within a category,
//! entities are further bucketed either by a domain lookup table or by their
//! area, and each bucket carries a total and an active count for the chips
//! shown above the list.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Error};
use clap::ValueEnum;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::entity::Entity;

/// Key of the synthetic subcategory that contains everything
pub const ALL: &str = "all";

/// Display order for domain-mapped subcategories
pub const SUBCATEGORY_PRIORITY: [&str; 7] = [
    "lights",
    "climate",
    "covers",
    "media",
    "cleaning",
    "security",
    "utilities",
];

/// Domains that never count as devices
const NON_DEVICE_DOMAINS: [&str; 4] = ["script", "automation", "sensor", "binary_sensor"];
const SENSOR_DOMAINS: [&str; 2] = ["sensor", "binary_sensor"];
const ACTION_DOMAINS: [&str; 3] = ["script", "automation", "scene"];

/// Primary dashboard category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Devices,
    Sensors,
    Actions,
    Custom,
}

impl Category {
    /// Classify an entity
    ///
    /// Custom content is claimed first; the domain rules then apply in order,
    /// so a domain claimed by `Devices` is never reconsidered.
    pub fn of(entity: &Entity) -> Category {
        let domain = entity.domain.as_str();
        if entity.custom {
            Category::Custom
        } else if !NON_DEVICE_DOMAINS.contains(&domain) {
            Category::Devices
        } else if SENSOR_DOMAINS.contains(&domain) {
            Category::Sensors
        } else if ACTION_DOMAINS.contains(&domain) {
            Category::Actions
        } else {
            Category::Custom
        }
    }

    pub fn contains(self, entity: &Entity) -> bool {
        Category::of(entity) == self
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Devices => "devices",
            Category::Sensors => "sensors",
            Category::Actions => "actions",
            Category::Custom => "custom",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "devices" | "device" => Ok(Category::Devices),
            "sensors" | "sensor" => Ok(Category::Sensors),
            "actions" | "action" => Ok(Category::Actions),
            "custom" => Ok(Category::Custom),
            other => Err(anyhow!("unknown category: {other}")),
        }
    }
}

/// Group used when search results are displayed
///
/// Unlike [`Category`], scenes count as actions here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchGroup {
    Devices,
    Sensors,
    Actions,
}

impl SearchGroup {
    pub const ALL: [SearchGroup; 3] = [
        SearchGroup::Devices,
        SearchGroup::Sensors,
        SearchGroup::Actions,
    ];

    pub fn of(entity: &Entity) -> SearchGroup {
        let domain = entity.domain.as_str();
        if SENSOR_DOMAINS.contains(&domain) {
            SearchGroup::Sensors
        } else if ACTION_DOMAINS.contains(&domain) {
            SearchGroup::Actions
        } else {
            SearchGroup::Devices
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SearchGroup::Devices => "devices",
            SearchGroup::Sensors => "sensors",
            SearchGroup::Actions => "actions",
        }
    }
}

/// How entities are bucketed within a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SubcategoryMode {
    /// Fixed domain-to-subcategory table
    #[default]
    Categories,
    /// The entity's area, verbatim
    Areas,
}

/// Subcategory for a domain, if the domain has one
pub fn domain_subcategory(domain: &str) -> Option<&'static str> {
    match domain {
        "light" | "switch" => Some("lights"),
        "climate" | "fan" | "humidifier" => Some("climate"),
        "cover" => Some("covers"),
        "media_player" => Some("media"),
        "vacuum" => Some("cleaning"),
        "camera" | "lock" | "siren" => Some("security"),
        "valve" => Some("utilities"),
        _ => None,
    }
}

/// Subcategory of an entity under the given mode
pub fn subcategory_of(entity: &Entity, mode: SubcategoryMode) -> Option<&str> {
    match mode {
        SubcategoryMode::Categories => domain_subcategory(&entity.domain),
        SubcategoryMode::Areas => entity.area(),
    }
}

/// Whether an entity belongs to the selected subcategory
pub fn in_subcategory(entity: &Entity, mode: SubcategoryMode, selected: &str) -> bool {
    selected == ALL || subcategory_of(entity, mode) == Some(selected)
}

/// Entity counts for one subcategory chip
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SubcategoryCount {
    pub count: usize,
    #[serde(rename = "activeCount")]
    pub active_count: usize,
}

impl SubcategoryCount {
    fn add(&mut self, entity: &Entity) {
        self.count += 1;
        if entity.is_active() {
            self.active_count += 1;
        }
    }
}

/// Ordered subcategory chips with their counts, `all` first
///
/// Serializes as a map from chip key to counts, in chip order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubcategoryCounts {
    pub entries: Vec<(String, SubcategoryCount)>,
}

impl SubcategoryCounts {
    /// Count entities per subcategory
    ///
    /// `all` covers every entity given. Entities without a subcategory under
    /// `mode` only count towards `all`.
    pub fn compute<'a>(
        entities: impl IntoIterator<Item = &'a Entity>,
        mode: SubcategoryMode,
    ) -> Self {
        let mut all = SubcategoryCount::default();
        let mut discovered: Vec<String> = Vec::new();
        let mut buckets: HashMap<String, SubcategoryCount> = HashMap::new();

        for entity in entities {
            all.add(entity);
            let Some(key) = subcategory_of(entity, mode) else {
                continue;
            };
            if !buckets.contains_key(key) {
                discovered.push(key.to_string());
            }
            buckets.entry(key.to_string()).or_default().add(entity);
        }

        let mut ordered = Vec::with_capacity(discovered.len() + 1);
        ordered.push((ALL.to_string(), all));

        for key in SUBCATEGORY_PRIORITY {
            if let Some(count) = buckets.remove(key) {
                ordered.push((key.to_string(), count));
            }
        }
        for key in discovered {
            if let Some(count) = buckets.remove(&key) {
                ordered.push((key, count));
            }
        }

        Self { entries: ordered }
    }

    pub fn get(&self, key: &str) -> Option<SubcategoryCount> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, count)| *count)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl Serialize for SubcategoryCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, count) in &self.entries {
            map.serialize_entry(key, count)?;
        }
        map.end()
    }
}

/// Currently selected subcategory chip
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubcategorySelection(String);

impl Default for SubcategorySelection {
    fn default() -> Self {
        Self(ALL.to_string())
    }
}

impl SubcategorySelection {
    pub fn current(&self) -> &str {
        &self.0
    }

    /// Select a chip; selecting the active chip again goes back to `all`
    pub fn select(&mut self, key: &str) {
        if key != ALL && self.0 == key {
            self.reset();
        } else {
            self.0 = key.to_string();
        }
    }

    pub fn reset(&mut self) {
        self.0 = ALL.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entity(id: &str, area: Option<&str>, state: &str) -> Entity {
        serde_json::from_value(json!({"id": id, "area": area, "state": state})).unwrap()
    }

    #[test]
    fn test_primary_category() {
        assert_eq!(Category::of(&entity("light.a", None, "on")), Category::Devices);
        assert_eq!(Category::of(&entity("sensor.a", Some("Kitchen"), "on")), Category::Sensors);
        assert_eq!(Category::of(&entity("binary_sensor.a", None, "on")), Category::Sensors);
        assert_eq!(Category::of(&entity("script.a", None, "off")), Category::Actions);
        assert_eq!(Category::of(&entity("automation.a", None, "on")), Category::Actions);
        // scene is claimed by the device rule before the action rule
        assert_eq!(Category::of(&entity("scene.a", None, "on")), Category::Devices);
    }

    #[test]
    fn test_custom_category() {
        let card: Entity =
            serde_json::from_value(json!({"id": "sensor.card", "custom": true})).unwrap();
        assert_eq!(Category::of(&card), Category::Custom);
    }

    #[test]
    fn test_category_is_exclusive() {
        let entities = [
            entity("light.a", None, "on"),
            entity("sensor.b", None, "1"),
            entity("script.c", None, "off"),
            entity("scene.d", None, "on"),
            entity("weird.e", None, "on"),
        ];
        let all = [
            Category::Devices,
            Category::Sensors,
            Category::Actions,
            Category::Custom,
        ];
        for e in &entities {
            assert_eq!(all.iter().filter(|c| c.contains(e)).count(), 1, "{}", e.id);
        }
    }

    #[test]
    fn test_search_group() {
        assert_eq!(SearchGroup::of(&entity("scene.a", None, "on")), SearchGroup::Actions);
        assert_eq!(SearchGroup::of(&entity("binary_sensor.a", None, "on")), SearchGroup::Sensors);
        assert_eq!(SearchGroup::of(&entity("vacuum.a", None, "docked")), SearchGroup::Devices);
    }

    #[test]
    fn test_domain_subcategory_table() {
        assert_eq!(domain_subcategory("fan"), Some("climate"));
        assert_eq!(domain_subcategory("switch"), Some("lights"));
        assert_eq!(domain_subcategory("siren"), Some("security"));
        assert_eq!(domain_subcategory("valve"), Some("utilities"));
        assert_eq!(domain_subcategory("person"), None);
    }

    #[test]
    fn test_in_subcategory_area_mode() {
        let kitchen = entity("light.a", Some("Kitchen"), "on");
        let nowhere = entity("light.b", None, "on");

        assert!(in_subcategory(&kitchen, SubcategoryMode::Areas, "Kitchen"));
        assert!(!in_subcategory(&nowhere, SubcategoryMode::Areas, "Kitchen"));
        assert!(in_subcategory(&nowhere, SubcategoryMode::Areas, ALL));
    }

    #[test]
    fn test_counts_order_and_totals() {
        let entities = [
            entity("lock.door", None, "unlocked"),
            entity("person.alex", None, "home"),
            entity("light.a", None, "on"),
            entity("light.b", None, "off"),
            entity("fan.c", None, "on"),
        ];
        let counts = SubcategoryCounts::compute(&entities, SubcategoryMode::Categories);

        assert_eq!(
            counts.keys().collect::<Vec<_>>(),
            vec!["all", "lights", "climate", "security"]
        );
        assert_eq!(
            counts.get(ALL),
            Some(SubcategoryCount {
                count: 5,
                active_count: 4
            })
        );
        assert_eq!(
            counts.get("lights"),
            Some(SubcategoryCount {
                count: 2,
                active_count: 1
            })
        );
        for (_, c) in &counts.entries {
            assert!(c.count >= c.active_count);
        }
    }

    #[test]
    fn test_area_counts_use_discovery_order() {
        let entities = [
            entity("light.a", Some("Garage"), "off"),
            entity("light.b", None, "on"),
            entity("light.c", Some("Attic"), "on"),
            entity("light.d", Some("Garage"), "on"),
        ];
        let counts = SubcategoryCounts::compute(&entities, SubcategoryMode::Areas);

        assert_eq!(
            counts.keys().collect::<Vec<_>>(),
            vec!["all", "Garage", "Attic"]
        );
        assert_eq!(counts.get(ALL).unwrap().count, 4);
        assert_eq!(counts.get("Garage").unwrap().active_count, 1);
    }

    #[test]
    fn test_selection_toggle() {
        let mut selection = SubcategorySelection::default();
        assert_eq!(selection.current(), ALL);

        selection.select("covers");
        assert_eq!(selection.current(), "covers");

        selection.select("covers");
        assert_eq!(selection.current(), ALL);

        selection.select(ALL);
        assert_eq!(selection.current(), ALL);
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("Sensors".parse::<Category>().unwrap(), Category::Sensors);
        assert!("nope".parse::<Category>().is_err());
    }

    #[test]
    fn test_counts_serialize_in_chip_order() {
        let entities = vec![
            entity("light.a", None, "on"),
            entity("cover.b", None, "closed"),
        ];
        let counts = SubcategoryCounts::compute(&entities, SubcategoryMode::Categories);
        let json = serde_json::to_string(&counts).unwrap();
        assert_eq!(
            json,
            r#"{"all":{"count":2,"activeCount":1},"lights":{"count":1,"activeCount":1},"covers":{"count":1,"activeCount":0}}"#
        );
    }
}
