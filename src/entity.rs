//! Entity model shared by the catalog, search and classification code
//!
//! Entities are read-only snapshots of a smart-home backend. Every field
//! except `id` may be missing in the source data and is filled in with a
//! conservative default when decoding.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::translate;

/// A single device, sensor or action in the catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub id: String,
    pub domain: String,
    pub name: String,
    pub area: Option<String>,
    pub state: String,
    pub attributes: Attributes,
    /// Explicit active flag; derived from domain and state when absent
    #[serde(rename = "isActive", skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    /// Custom dashboard content that is not classified by domain
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub custom: bool,
}

/// Wire shape of an entity, with every optional field tolerated
#[derive(Debug, Deserialize)]
struct RawEntity {
    #[serde(alias = "entity_id")]
    id: String,
    #[serde(default)]
    domain: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    area: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    attributes: Option<Map<String, Value>>,
    #[serde(default, rename = "isActive", alias = "is_active")]
    is_active: Option<bool>,
    #[serde(default)]
    custom: bool,
}

impl<'de> Deserialize<'de> for Entity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawEntity::deserialize(deserializer)?;
        let attributes = Attributes(raw.attributes.unwrap_or_default());

        let (prefix, object_id) = split_entity_id(&raw.id);
        let domain = raw
            .domain
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| prefix.to_string());

        let name = raw
            .name
            .filter(|n| !n.is_empty())
            .or_else(|| attributes.friendly_name().map(str::to_string))
            .unwrap_or_else(|| object_id.replace('_', " "));

        let area = raw.area.filter(|a| !a.trim().is_empty());

        Ok(Self {
            id: raw.id,
            domain,
            name,
            area,
            state: raw.state.unwrap_or_else(|| "unknown".to_string()),
            attributes,
            is_active: raw.is_active,
            custom: raw.custom,
        })
    }
}

impl Entity {
    /// Whether the entity is currently "on" in the dashboard sense
    pub fn is_active(&self) -> bool {
        self.is_active
            .unwrap_or_else(|| translate::is_active_state(&self.domain, &self.state))
    }

    pub fn area(&self) -> Option<&str> {
        self.area.as_deref()
    }
}

/// Split `light.kitchen` into `("light", "kitchen")`
///
/// Ids without a dot have an empty domain prefix.
pub fn split_entity_id(id: &str) -> (&str, &str) {
    match id.split_once('.') {
        Some((domain, object_id)) => (domain, object_id),
        None => ("", id),
    }
}

/// Open attribute bag with typed accessors for the keys the dashboard knows
///
/// Accessors never fail: a missing key or a value of the wrong type reads as
/// `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(pub Map<String, Value>);

impl Attributes {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Numeric value, accepting numbers encoded as strings
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        match self.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn friendly_name(&self) -> Option<&str> {
        self.get_str("friendly_name").filter(|s| !s.is_empty())
    }

    pub fn device_class(&self) -> Option<&str> {
        self.get_str("device_class")
    }

    pub fn unit_of_measurement(&self) -> Option<&str> {
        self.get_str("unit_of_measurement")
    }

    pub fn icon(&self) -> Option<&str> {
        self.get_str("icon")
    }

    /// Light brightness as a percentage of the 0-255 range
    pub fn brightness_pct(&self) -> Option<u8> {
        let raw = self.get_f64("brightness")?;
        Some(((raw.clamp(0.0, 255.0) / 255.0) * 100.0).round() as u8)
    }

    /// Target temperature (climate)
    pub fn temperature(&self) -> Option<f64> {
        self.get_f64("temperature")
    }

    pub fn current_temperature(&self) -> Option<f64> {
        self.get_f64("current_temperature")
    }

    /// Cover position, 0 (closed) to 100 (open)
    pub fn current_position(&self) -> Option<f64> {
        self.get_f64("current_position")
    }

    pub fn media_title(&self) -> Option<&str> {
        self.get_str("media_title")
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_full_entity() {
        let entity: Entity = serde_json::from_value(json!({
            "id": "light.kitchen",
            "domain": "light",
            "name": "Kitchen Light",
            "area": "Kitchen",
            "state": "on",
            "attributes": {"brightness": 255}
        }))
        .unwrap();

        assert_eq!(entity.domain, "light");
        assert_eq!(entity.area(), Some("Kitchen"));
        assert_eq!(entity.attributes.brightness_pct(), Some(100));
        assert!(entity.is_active());
    }

    #[test]
    fn test_deserialize_minimal_entity() {
        let entity: Entity = serde_json::from_value(json!({"id": "sensor.outdoor_temp"})).unwrap();

        assert_eq!(entity.domain, "sensor");
        assert_eq!(entity.name, "outdoor temp");
        assert_eq!(entity.state, "unknown");
        assert!(entity.area.is_none());
        assert!(entity.attributes.is_empty());
        assert!(!entity.custom);
    }

    #[test]
    fn test_name_falls_back_to_friendly_name() {
        let entity: Entity = serde_json::from_value(json!({
            "entity_id": "switch.coffee",
            "attributes": {"friendly_name": "Coffee Maker"}
        }))
        .unwrap();

        assert_eq!(entity.id, "switch.coffee");
        assert_eq!(entity.name, "Coffee Maker");
    }

    #[test]
    fn test_blank_area_and_null_attributes() {
        let entity: Entity = serde_json::from_value(json!({
            "id": "lock.front_door",
            "area": "  ",
            "attributes": null
        }))
        .unwrap();

        assert!(entity.area.is_none());
        assert!(entity.attributes.is_empty());
    }

    #[test]
    fn test_explicit_active_flag_wins() {
        let entity: Entity = serde_json::from_value(json!({
            "id": "light.hall",
            "state": "off",
            "isActive": true
        }))
        .unwrap();

        assert!(entity.is_active());
    }

    #[test]
    fn test_attribute_accessors_tolerate_wrong_types() {
        let attrs = Attributes(
            json!({"brightness": "128", "temperature": [1, 2], "device_class": 3})
                .as_object()
                .cloned()
                .unwrap(),
        );

        assert_eq!(attrs.brightness_pct(), Some(50));
        assert_eq!(attrs.temperature(), None);
        assert_eq!(attrs.device_class(), None);
        assert_eq!(attrs.unit_of_measurement(), None);
    }

    #[test]
    fn test_target_and_current_temperature_are_distinct() {
        let attrs = Attributes(
            json!({"temperature": 21.5, "current_temperature": 20.8})
                .as_object()
                .cloned()
                .unwrap(),
        );

        assert_eq!(attrs.temperature(), Some(21.5));
        assert_eq!(attrs.current_temperature(), Some(20.8));
    }

    #[test]
    fn test_split_entity_id() {
        assert_eq!(split_entity_id("light.kitchen"), ("light", "kitchen"));
        assert_eq!(split_entity_id("orphan"), ("", "orphan"));
    }
}
