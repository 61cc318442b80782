//! Topic parsing: `/`-delimited segments to a closed route type.
//!
//! Recognized shapes, all under the configured prefix:
//!   - `{prefix}/{kind}/{selector}`                control payload
//!   - `{prefix}/resource/{kind}/{id}/set`         native CLIP v2 body
//!   - `{prefix}/resource/{kind}/get`              publish resource list
//!   - `{prefix}/resource/{kind}/{id}/get`         publish one resource
//!   - `{prefix}/state/refresh`                    rebuild + publish graph

use crate::resource::ResourceKind;

/// Which resources a control topic addresses. Whether `Named` is matched as
/// an exact slug or as a regex over raw names is a deployment choice, see
/// [`crate::config::SelectorMatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// `*`: every resource of the routed kind.
    All,
    Named(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Simplified control of lights or of room/zone members.
    Control {
        kind: ResourceKind,
        selector: Selector,
    },
    /// Direct update of one resource with a native command body.
    Set { kind: ResourceKind, id: String },
    /// Query for a resource list (`id: None`) or a single resource.
    Get {
        kind: ResourceKind,
        id: Option<String>,
    },
    /// Rebuild the resource graph and publish the snapshot.
    Refresh,
}

pub struct TopicRouter {
    prefix: String,
}

impl TopicRouter {
    pub fn new(prefix: impl Into<String>) -> TopicRouter {
        TopicRouter {
            prefix: prefix.into(),
        }
    }

    /// The subscription pattern covering every route this router accepts.
    pub fn subscription(&self) -> String {
        format!("{}/#", self.prefix)
    }

    /// True for topics this daemon itself publishes (retained state and
    /// resource listings). The wildcard subscription echoes them back on
    /// every publish and on reconnect; they carry no command.
    pub fn is_own_publish(&self, topic: &str) -> bool {
        let segments: Vec<&str> = topic.split('/').collect();
        let Some((prefix, rest)) = segments.split_first() else {
            return false;
        };
        if *prefix != self.prefix {
            return false;
        }
        match *rest {
            ["state"] => true,
            ["resource", kind] | ["resource", kind, _] => ResourceKind::parse(kind).is_some(),
            _ => false,
        }
    }

    /// Parses a topic into a route. `None` means the topic is not ours;
    /// the caller drops the message.
    pub fn route(&self, topic: &str) -> Option<Route> {
        let segments: Vec<&str> = topic.split('/').collect();
        let (prefix, rest) = segments.split_first()?;
        if *prefix != self.prefix {
            return None;
        }
        match *rest {
            ["state", "refresh"] => Some(Route::Refresh),
            ["resource", kind, "get"] => Some(Route::Get {
                kind: ResourceKind::parse(kind)?,
                id: None,
            }),
            ["resource", kind, id, "get"] if !id.is_empty() => Some(Route::Get {
                kind: ResourceKind::parse(kind)?,
                id: Some(id.to_string()),
            }),
            ["resource", kind, id, "set"] if !id.is_empty() => Some(Route::Set {
                kind: ResourceKind::parse(kind)?,
                id: id.to_string(),
            }),
            [kind, selector] if !selector.is_empty() => {
                let kind = match ResourceKind::parse(kind)? {
                    // grouped lights carry no name to select on; they are
                    // reachable through their room/zone or a Set route.
                    ResourceKind::GroupedLight => return None,
                    kind => kind,
                };
                let selector = if selector == "*" {
                    Selector::All
                } else {
                    Selector::Named(selector.to_string())
                };
                Some(Route::Control { kind, selector })
            }
            _ => None,
        }
    }
}
