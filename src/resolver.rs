//! Selector resolution against a graph snapshot: from a route's selector
//! to concrete bridge resource ids.

use regex::Regex;

use crate::config::{GroupTargeting, SelectorMatch};
use crate::graph::ResourceGraph;
use crate::resource::{slug, ResourceKind};
use crate::topic::Selector;

/// One concrete resource to command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub kind: ResourceKind,
    pub id: String,
}

impl Target {
    pub fn new(kind: ResourceKind, id: impl Into<String>) -> Target {
        Target {
            kind,
            id: id.into(),
        }
    }
}

enum Matcher {
    All,
    Slug(String),
    Pattern(Regex),
}

impl Matcher {
    fn new(selector: &Selector, strategy: SelectorMatch) -> Option<Matcher> {
        match (selector, strategy) {
            (Selector::All, _) => Some(Matcher::All),
            (Selector::Named(name), SelectorMatch::Slug) => Some(Matcher::Slug(name.clone())),
            (Selector::Named(pattern), SelectorMatch::Regex) => match Regex::new(pattern) {
                Ok(re) => Some(Matcher::Pattern(re)),
                Err(e) => {
                    log::warn!("invalid selector pattern {pattern:?}: {e}");
                    None
                }
            },
        }
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            Matcher::All => true,
            Matcher::Slug(wanted) => slug(name) == *wanted,
            Matcher::Pattern(re) => re.is_match(name),
        }
    }
}

pub struct ResourceResolver {
    selector_match: SelectorMatch,
    group_targeting: GroupTargeting,
}

impl ResourceResolver {
    pub fn new(selector_match: SelectorMatch, group_targeting: GroupTargeting) -> ResourceResolver {
        ResourceResolver {
            selector_match,
            group_targeting,
        }
    }

    /// Resolves a control route to its targets. An empty result means
    /// nothing matched (or a matched location lacks the required service);
    /// the caller drops the message without issuing requests.
    pub fn resolve(
        &self,
        kind: ResourceKind,
        selector: &Selector,
        graph: &ResourceGraph,
    ) -> Vec<Target> {
        let Some(matcher) = Matcher::new(selector, self.selector_match) else {
            return vec![];
        };

        let targets = match kind {
            ResourceKind::Light => graph
                .lights
                .iter()
                .filter(|light| matcher.matches(&light.name))
                .map(|light| Target::new(ResourceKind::Light, &light.id))
                .collect::<Vec<_>>(),
            ResourceKind::Room | ResourceKind::Zone => graph
                .locations(kind)
                .iter()
                .filter(|location| matcher.matches(&location.name))
                .flat_map(|location| match self.group_targeting {
                    GroupTargeting::GroupedLight => match &location.grouped_light {
                        Some(rid) => vec![Target::new(ResourceKind::GroupedLight, rid)],
                        None => {
                            log::warn!(
                                "{kind} {:?} has no grouped_light service",
                                location.name
                            );
                            vec![]
                        }
                    },
                    GroupTargeting::MemberLights => location
                        .children
                        .iter()
                        .map(|light| Target::new(ResourceKind::Light, &light.id))
                        .collect(),
                })
                .collect(),
            ResourceKind::GroupedLight => vec![],
        };

        if targets.is_empty() {
            log::warn!("{kind} {selector:?} matched no resources");
        }
        targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{LightNode, LocationNode};

    fn graph() -> ResourceGraph {
        let light = |id: &str, name: &str| LightNode {
            id: id.to_string(),
            name: name.to_string(),
        };
        ResourceGraph {
            lights: vec![
                light("L1", "Living Room"),
                light("L2", "Office-Desk"),
                light("L3", "Office Shelf"),
            ],
            rooms: vec![
                LocationNode {
                    id: "R1".to_string(),
                    name: "Kitchen".to_string(),
                    grouped_light: Some("G7".to_string()),
                    children: vec![light("L4", "Counter"), light("L5", "Hood")],
                },
                LocationNode {
                    id: "R2".to_string(),
                    name: "Attic".to_string(),
                    grouped_light: None,
                    children: vec![light("L6", "Attic Bulb")],
                },
            ],
            zones: vec![LocationNode {
                id: "Z1".to_string(),
                name: "Downstairs".to_string(),
                grouped_light: Some("G9".to_string()),
                children: vec![
                    light("L1", "Living Room"),
                    light("L4", "Counter"),
                    light("L5", "Hood"),
                ],
            }],
        }
    }

    fn slug_resolver() -> ResourceResolver {
        ResourceResolver::new(SelectorMatch::Slug, GroupTargeting::GroupedLight)
    }

    #[test]
    fn light_selector_matches_by_slug() {
        let targets = slug_resolver().resolve(
            ResourceKind::Light,
            &Selector::Named("living_room".to_string()),
            &graph(),
        );
        assert_eq!(targets, vec![Target::new(ResourceKind::Light, "L1")]);
    }

    #[test]
    fn light_wildcard_matches_all_lights() {
        let targets = slug_resolver().resolve(ResourceKind::Light, &Selector::All, &graph());
        assert_eq!(targets.len(), 3);
    }

    #[test]
    fn room_resolves_to_grouped_light_service() {
        let targets = slug_resolver().resolve(
            ResourceKind::Room,
            &Selector::Named("kitchen".to_string()),
            &graph(),
        );
        assert_eq!(targets, vec![Target::new(ResourceKind::GroupedLight, "G7")]);
    }

    #[test]
    fn room_without_grouped_light_fails_closed() {
        let targets = slug_resolver().resolve(
            ResourceKind::Room,
            &Selector::Named("attic".to_string()),
            &graph(),
        );
        assert!(targets.is_empty());
    }

    #[test]
    fn member_lights_strategy_targets_children_in_graph_order() {
        let resolver = ResourceResolver::new(SelectorMatch::Slug, GroupTargeting::MemberLights);
        let targets = resolver.resolve(ResourceKind::Zone, &Selector::All, &graph());
        assert_eq!(
            targets,
            vec![
                Target::new(ResourceKind::Light, "L1"),
                Target::new(ResourceKind::Light, "L4"),
                Target::new(ResourceKind::Light, "L5"),
            ]
        );
    }

    #[test]
    fn regex_strategy_matches_raw_names() {
        let resolver = ResourceResolver::new(SelectorMatch::Regex, GroupTargeting::GroupedLight);
        let targets = resolver.resolve(
            ResourceKind::Light,
            &Selector::Named("^Office".to_string()),
            &graph(),
        );
        assert_eq!(
            targets,
            vec![
                Target::new(ResourceKind::Light, "L2"),
                Target::new(ResourceKind::Light, "L3"),
            ]
        );
    }

    #[test]
    fn invalid_regex_matches_nothing() {
        let resolver = ResourceResolver::new(SelectorMatch::Regex, GroupTargeting::GroupedLight);
        let targets = resolver.resolve(
            ResourceKind::Light,
            &Selector::Named("[unclosed".to_string()),
            &graph(),
        );
        assert!(targets.is_empty());
    }

    #[test]
    fn unmatched_selector_yields_empty() {
        let targets = slug_resolver().resolve(
            ResourceKind::Room,
            &Selector::Named("basement".to_string()),
            &graph(),
        );
        assert!(targets.is_empty());
    }
}
