//! The resolved resource graph: rooms and zones with their member lights
//! and grouped_light service, built wholesale from bridge listings.

use serde::Serialize;
use std::sync::{Arc, RwLock};

use crate::resource::{grouped_light_service, slug, Light, ResourceKind, Room, Zone};

#[derive(Debug, Clone, Serialize)]
pub struct LightNode {
    pub id: String,
    pub name: String,
}

impl LightNode {
    pub fn slug(&self) -> String {
        slug(&self.name)
    }
}

/// A room or zone, its member lights in bridge order, and the rid of its
/// grouped_light service when the bridge exposes one.
#[derive(Debug, Clone, Serialize)]
pub struct LocationNode {
    pub id: String,
    pub name: String,
    pub grouped_light: Option<String>,
    pub children: Vec<LightNode>,
}

impl LocationNode {
    pub fn slug(&self) -> String {
        slug(&self.name)
    }
}

/// One immutable snapshot of the bridge's topology. Never mutated in
/// place; a refresh builds a fresh snapshot and swaps it in through
/// [`GraphStore`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResourceGraph {
    pub lights: Vec<LightNode>,
    pub rooms: Vec<LocationNode>,
    pub zones: Vec<LocationNode>,
}

impl ResourceGraph {
    /// Assembles a snapshot from freshly fetched listings. Room children
    /// are device references and are resolved through each light's owner;
    /// zone children reference lights directly.
    pub fn build(lights: &[Light], rooms: &[Room], zones: &[Zone]) -> ResourceGraph {
        let light_nodes: Vec<LightNode> = lights
            .iter()
            .map(|light| LightNode {
                id: light.id.clone(),
                name: light.name().to_string(),
            })
            .collect();

        let rooms = rooms
            .iter()
            .map(|room| LocationNode {
                id: room.id.clone(),
                name: room
                    .metadata
                    .as_ref()
                    .and_then(|m| m.name.clone())
                    .unwrap_or_default(),
                grouped_light: room
                    .services
                    .as_deref()
                    .and_then(|s| grouped_light_service(s).map(str::to_string)),
                children: room
                    .children
                    .as_deref()
                    .unwrap_or_default()
                    .iter()
                    .flat_map(|child| {
                        lights
                            .iter()
                            .filter(|light| {
                                light
                                    .owner
                                    .as_ref()
                                    .is_some_and(|owner| owner.rid == child.rid)
                            })
                            .map(|light| LightNode {
                                id: light.id.clone(),
                                name: light.name().to_string(),
                            })
                    })
                    .collect(),
            })
            .collect();

        let zones = zones
            .iter()
            .map(|zone| LocationNode {
                id: zone.id.clone(),
                name: zone
                    .metadata
                    .as_ref()
                    .and_then(|m| m.name.clone())
                    .unwrap_or_default(),
                grouped_light: zone
                    .services
                    .as_deref()
                    .and_then(|s| grouped_light_service(s).map(str::to_string)),
                children: zone
                    .children
                    .as_deref()
                    .unwrap_or_default()
                    .iter()
                    .filter_map(|child| {
                        lights.iter().find(|light| light.id == child.rid).map(|light| {
                            LightNode {
                                id: light.id.clone(),
                                name: light.name().to_string(),
                            }
                        })
                    })
                    .collect(),
            })
            .collect();

        ResourceGraph {
            lights: light_nodes,
            rooms,
            zones,
        }
    }

    pub fn locations(&self, kind: ResourceKind) -> &[LocationNode] {
        match kind {
            ResourceKind::Room => &self.rooms,
            ResourceKind::Zone => &self.zones,
            _ => &[],
        }
    }
}

/// Shared holder for the current snapshot. Readers clone the `Arc` and
/// work against a consistent graph even while a refresh replaces it.
#[derive(Default)]
pub struct GraphStore {
    current: RwLock<Arc<ResourceGraph>>,
}

impl GraphStore {
    pub fn new() -> GraphStore {
        GraphStore::default()
    }

    pub fn load(&self) -> Arc<ResourceGraph> {
        self.current.read().expect("graph lock poisoned").clone()
    }

    pub fn replace(&self, graph: ResourceGraph) -> Arc<ResourceGraph> {
        let graph = Arc::new(graph);
        *self.current.write().expect("graph lock poisoned") = graph.clone();
        graph
    }
}
