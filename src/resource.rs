use serde::{Deserialize, Serialize};
use std::fmt;

/// The resource kinds this daemon knows how to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Light,
    Room,
    Zone,
    GroupedLight,
}

impl ResourceKind {
    /// The kind's name as it appears in CLIP v2 paths and topic segments.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Light => "light",
            ResourceKind::Room => "room",
            ResourceKind::Zone => "zone",
            ResourceKind::GroupedLight => "grouped_light",
        }
    }

    pub fn parse(s: &str) -> Option<ResourceKind> {
        match s {
            "light" => Some(ResourceKind::Light),
            "room" => Some(ResourceKind::Room),
            "zone" => Some(ResourceKind::Zone),
            "grouped_light" => Some(ResourceKind::GroupedLight),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized form of a display name, used as a topic segment: trimmed,
/// lowercased, spaces and hyphens replaced with underscores.
pub fn slug(name: &str) -> String {
    name.trim().to_lowercase().replace([' ', '-'], "_")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    pub rid: String,
    pub rtype: String,
}

type Owner = ResourceIdentifier;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    pub name: Option<String>,
    pub archetype: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct On {
    pub on: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dimming {
    pub brightness: f32,
    pub min_dim_level: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorTemperature {
    pub mirek: Option<u16>,
    pub mirek_valid: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct XY {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Color {
    pub xy: Option<XY>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Light {
    pub id: String,
    pub id_v1: Option<String>,
    pub owner: Option<Owner>,
    pub metadata: Option<Metadata>,
    pub on: Option<On>,
    pub dimming: Option<Dimming>,
    pub color_temperature: Option<ColorTemperature>,
    pub color: Option<Color>,
}

impl Light {
    pub fn name(&self) -> &str {
        self.metadata
            .as_ref()
            .and_then(|m| m.name.as_deref())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub id_v1: Option<String>,
    pub children: Option<Vec<ResourceIdentifier>>,
    pub services: Option<Vec<ResourceIdentifier>>,
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    pub id_v1: Option<String>,
    pub children: Option<Vec<ResourceIdentifier>>,
    pub services: Option<Vec<ResourceIdentifier>>,
    pub metadata: Option<Metadata>,
}

/// Finds the grouped_light service attached to a room or zone, if any.
pub fn grouped_light_service(services: &[ResourceIdentifier]) -> Option<&str> {
    services
        .iter()
        .find(|s| s.rtype == "grouped_light")
        .map(|s| s.rid.as_str())
}
