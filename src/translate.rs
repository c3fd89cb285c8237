//! Display strings for raw entity states
//!
//! Pure lookups from backend state strings, device classes and units to the
//! labels shown on cards, plus the per-domain "is this entity active" rule.

use crate::entity::Entity;

/// Whether a raw state means "active" for the given domain
pub fn is_active_state(domain: &str, state: &str) -> bool {
    match domain {
        "light" | "switch" | "fan" | "input_boolean" | "automation" | "siren" | "humidifier"
        | "binary_sensor" | "script" | "remote" => state == "on",
        "climate" | "water_heater" => !matches!(state, "off" | "unavailable" | "unknown"),
        "cover" | "valve" => matches!(state, "open" | "opening" | "closing"),
        "lock" => matches!(state, "unlocked" | "unlocking" | "open" | "jammed"),
        "media_player" => matches!(state, "playing" | "on" | "buffering"),
        "vacuum" => matches!(state, "cleaning" | "returning"),
        "camera" => matches!(state, "recording" | "streaming"),
        "alarm_control_panel" => state.starts_with("armed") || state == "triggered",
        "person" | "device_tracker" => state == "home",
        _ => false,
    }
}

/// Human label for an entity's current state
pub fn state_label(entity: &Entity) -> String {
    let state = entity.state.as_str();

    match state {
        "unavailable" => return "Unavailable".to_string(),
        "unknown" => return "Unknown".to_string(),
        _ => {}
    }

    match entity.domain.as_str() {
        "binary_sensor" => binary_sensor_label(entity.attributes.device_class(), state).to_string(),
        "sensor" => match state.parse::<f64>() {
            Ok(value) => format_value(value, entity.attributes.unit_of_measurement()),
            Err(_) => capitalize(state),
        },
        "climate" => climate_label(state).to_string(),
        "cover" | "valve" => match state {
            "open" => "Open".to_string(),
            "closed" => "Closed".to_string(),
            "opening" => "Opening".to_string(),
            "closing" => "Closing".to_string(),
            other => capitalize(other),
        },
        "lock" => match state {
            "locked" => "Locked".to_string(),
            "unlocked" => "Unlocked".to_string(),
            "locking" => "Locking".to_string(),
            "unlocking" => "Unlocking".to_string(),
            "jammed" => "Jammed".to_string(),
            other => capitalize(other),
        },
        "media_player" => match state {
            "playing" => match entity.attributes.media_title() {
                Some(title) => format!("Playing: {title}"),
                None => "Playing".to_string(),
            },
            "paused" => "Paused".to_string(),
            "idle" => "Idle".to_string(),
            "standby" => "Standby".to_string(),
            other => on_off_label(other),
        },
        "vacuum" => match state {
            "cleaning" => "Cleaning".to_string(),
            "docked" => "Docked".to_string(),
            "returning" => "Returning to dock".to_string(),
            "paused" => "Paused".to_string(),
            "error" => "Error".to_string(),
            other => capitalize(other),
        },
        "light" => match (state, entity.attributes.brightness_pct()) {
            ("on", Some(pct)) => format!("On ({pct}%)"),
            (other, _) => on_off_label(other),
        },
        "person" | "device_tracker" => match state {
            "home" => "Home".to_string(),
            "not_home" => "Away".to_string(),
            other => capitalize(other),
        },
        "scene" => "Scene".to_string(),
        _ => on_off_label(state),
    }
}

fn on_off_label(state: &str) -> String {
    match state {
        "on" => "On".to_string(),
        "off" => "Off".to_string(),
        other => capitalize(other),
    }
}

fn climate_label(state: &str) -> &str {
    match state {
        "off" => "Off",
        "heat" => "Heating",
        "cool" => "Cooling",
        "heat_cool" => "Heat/Cool",
        "auto" => "Auto",
        "dry" => "Dry",
        "fan_only" => "Fan only",
        _ => "Unknown",
    }
}

fn binary_sensor_label(device_class: Option<&str>, state: &str) -> &'static str {
    let on = state == "on";
    match device_class {
        Some("door" | "window" | "opening" | "garage_door") => {
            if on {
                "Open"
            } else {
                "Closed"
            }
        }
        Some("motion" | "occupancy" | "presence" | "sound" | "vibration") => {
            if on {
                "Detected"
            } else {
                "Clear"
            }
        }
        Some("moisture") => {
            if on {
                "Wet"
            } else {
                "Dry"
            }
        }
        Some("smoke" | "gas" | "carbon_monoxide" | "problem" | "safety" | "tamper") => {
            if on {
                "Detected"
            } else {
                "OK"
            }
        }
        Some("battery") => {
            if on {
                "Low"
            } else {
                "Normal"
            }
        }
        Some("connectivity") => {
            if on {
                "Connected"
            } else {
                "Disconnected"
            }
        }
        Some("lock") => {
            if on {
                "Unlocked"
            } else {
                "Locked"
            }
        }
        _ => {
            if on {
                "On"
            } else {
                "Off"
            }
        }
    }
}

/// Human name for a sensor device class
pub fn device_class_label(device_class: &str) -> String {
    match device_class {
        "temperature" => "Temperature".to_string(),
        "humidity" => "Humidity".to_string(),
        "illuminance" => "Illuminance".to_string(),
        "power" => "Power".to_string(),
        "energy" => "Energy".to_string(),
        "battery" => "Battery".to_string(),
        "pressure" => "Pressure".to_string(),
        "carbon_dioxide" => "CO₂".to_string(),
        "pm25" => "PM2.5".to_string(),
        "motion" => "Motion".to_string(),
        "door" => "Door".to_string(),
        "window" => "Window".to_string(),
        "moisture" => "Moisture".to_string(),
        other => capitalize(&other.replace('_', " ")),
    }
}

/// Display name for a domain
pub fn domain_label(domain: &str) -> String {
    match domain {
        "binary_sensor" => "Binary sensor".to_string(),
        "media_player" => "Media player".to_string(),
        "input_boolean" => "Toggle".to_string(),
        "alarm_control_panel" => "Alarm panel".to_string(),
        other => capitalize(&other.replace('_', " ")),
    }
}

/// Format a numeric reading with its unit
///
/// Whole numbers print without decimals, everything else with one.
pub fn format_value(value: f64, unit: Option<&str>) -> String {
    let number = if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    };

    match unit {
        Some(u @ ("%" | "°C" | "°F")) => format!("{number}{u}"),
        Some(u) if !u.is_empty() => format!("{number} {u}"),
        _ => number,
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
