//! MQTT front-end for a Philips Hue bridge.
//!
//! Subscribes to a configurable topic tree, translates simplified control
//! payloads into CLIP v2 commands, and issues them against the bridge's
//! HTTPS API. Resource listings are cached in memory and resolved into a
//! room/zone/light graph so topics can address resources by name.

pub mod bridge;
pub mod cache;
pub mod config;
pub mod dispatch;
pub mod graph;
pub mod mqtt;
pub mod payload;
pub mod resolver;
pub mod resource;
pub mod service;
pub mod topic;

pub use crate::bridge::{BridgeApi, CommandLight, HueBridge};
pub use crate::config::Settings;
pub use crate::resource::ResourceKind;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HueError>;

#[derive(Error, Debug)]
pub enum HueError {
    #[error("configuration error: {msg}")]
    ConfigError { msg: String },
    #[error("bridge replied with error: {description}")]
    BridgeError { description: String },
    #[error("malformed payload: {0}")]
    TranslationError(#[from] serde_json::Error),
    #[error(transparent)]
    HttpError(#[from] reqwest::Error),
    #[error(transparent)]
    MqttError(#[from] rumqttc::ClientError),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

impl HueError {
    pub fn config_err(msg: impl Into<String>) -> Self {
        HueError::ConfigError { msg: msg.into() }
    }
}
