//! Daemon configuration, loaded once at startup from a TOML file given as
//! the single positional argument.

use serde::Deserialize;
use std::path::Path;

use crate::{HueError, Result};

/// MQTT broker connection parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct MqttSettings {
    pub host: String,
    #[serde(default = "default_mqtt_port")]
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default = "default_client_id")]
    pub client_id: String,
}

/// Hue bridge address and credential.
#[derive(Debug, Clone, Deserialize)]
pub struct HueSettings {
    /// Host or IP of the bridge, without scheme.
    pub host: String,
    /// The `hue-application-key` obtained by registering with the bridge.
    pub application_key: String,
}

/// How a named selector in a control topic is matched against resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorMatch {
    /// Selector is an exact match against the resource's name slug.
    Slug,
    /// Selector is a regular expression tested against the raw name.
    Regex,
}

/// How a room or zone control is turned into bridge requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupTargeting {
    /// One request to the location's grouped_light service.
    GroupedLight,
    /// One request per member light.
    MemberLights,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BridgeSettings {
    /// Leading segment of every topic this daemon handles.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// How long a GET response stays served from cache.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_selector_match")]
    pub selector_match: SelectorMatch,
    #[serde(default = "default_group_targeting")]
    pub group_targeting: GroupTargeting,
    /// Publish a full state snapshot right after connecting to the broker.
    #[serde(default)]
    pub publish_on_connect: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        BridgeSettings {
            prefix: default_prefix(),
            cache_ttl_secs: default_cache_ttl_secs(),
            selector_match: default_selector_match(),
            group_targeting: default_group_targeting(),
            publish_on_connect: false,
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub mqtt: MqttSettings,
    pub hue: HueSettings,
    #[serde(default)]
    pub bridge: BridgeSettings,
}

fn default_mqtt_port() -> u16 {
    1883
}

fn default_client_id() -> String {
    "huemqtt".to_string()
}

fn default_prefix() -> String {
    "hue".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_selector_match() -> SelectorMatch {
    SelectorMatch::Slug
}

fn default_group_targeting() -> GroupTargeting {
    GroupTargeting::GroupedLight
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> Result<Settings> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Settings::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Settings> {
        toml::from_str(raw).map_err(|e| HueError::config_err(e.to_string()))
    }
}
