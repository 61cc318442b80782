//! Message handling pipeline: route, resolve, translate, dispatch.
//!
//! Every inbound message runs through `handle_message` on its own task.
//! Failures at any stage drop that message with a log line; nothing here
//! may take the process down.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::bridge::BridgeApi;
use crate::cache::{CacheKey, ResourceCache};
use crate::config::Settings;
use crate::dispatch::Dispatcher;
use crate::graph::{GraphStore, ResourceGraph};
use crate::payload;
use crate::resolver::{ResourceResolver, Target};
use crate::resource::{Light, ResourceKind, Room, Zone};
use crate::topic::{Route, TopicRouter};
use crate::Result;

/// Outbound side of the bus, kept behind a trait so tests can capture
/// published state instead of needing a broker.
pub trait StatePublisher: Send + Sync {
    fn publish_retained(
        &self,
        topic: String,
        body: Vec<u8>,
    ) -> impl Future<Output = Result<()>> + Send;
}

impl<P: StatePublisher> StatePublisher for &P {
    async fn publish_retained(&self, topic: String, body: Vec<u8>) -> Result<()> {
        (**self).publish_retained(topic, body).await
    }
}

/// The assembled pipeline. One instance per process, shared across
/// handler tasks.
pub struct App<B, P> {
    prefix: String,
    bridge: B,
    publisher: P,
    cache: ResourceCache,
    graph: GraphStore,
    router: TopicRouter,
    resolver: ResourceResolver,
    dispatcher: Dispatcher,
}

impl<B: BridgeApi, P: StatePublisher> App<B, P> {
    pub fn new(settings: &Settings, bridge: B, publisher: P) -> App<B, P> {
        App {
            prefix: settings.bridge.prefix.clone(),
            bridge,
            publisher,
            cache: ResourceCache::new(Duration::from_secs(settings.bridge.cache_ttl_secs)),
            graph: GraphStore::new(),
            router: TopicRouter::new(settings.bridge.prefix.clone()),
            resolver: ResourceResolver::new(
                settings.bridge.selector_match,
                settings.bridge.group_targeting,
            ),
            dispatcher: Dispatcher::new(),
        }
    }

    pub fn subscription(&self) -> String {
        self.router.subscription()
    }

    /// Entry point for one delivered message. Never propagates an error:
    /// a failed stage drops the message and the daemon keeps serving.
    pub async fn handle_message(&self, topic: &str, body: &[u8]) {
        log::info!("received message on {topic}");
        if let Err(e) = self.process(topic, body).await {
            log::error!("dropping message on {topic}: {e}");
        }
    }

    async fn process(&self, topic: &str, body: &[u8]) -> Result<()> {
        let Some(route) = self.router.route(topic) else {
            if self.router.is_own_publish(topic) {
                // our retained state echoed back by the wildcard subscription
                log::debug!("ignoring echo of own publish on {topic}");
            } else {
                log::warn!("unrecognized topic {topic:?}, dropping");
            }
            return Ok(());
        };
        match route {
            Route::Control { kind, selector } => {
                let graph = self.load_graph().await?;
                let targets = self.resolver.resolve(kind, &selector, &graph);
                if targets.is_empty() {
                    // resolver already logged the miss
                    return Ok(());
                }
                let command = payload::translate(body)?;
                let outcome = self
                    .dispatcher
                    .dispatch(&self.bridge, &targets, &command)
                    .await;
                log::info!(
                    "{topic}: {} target(s) updated, {} failed",
                    outcome.succeeded,
                    outcome.failed
                );
            }
            Route::Set { kind, id } => {
                let command = payload::parse_native(body)?;
                self.dispatcher
                    .dispatch(&self.bridge, &[Target::new(kind, id)], &command)
                    .await;
            }
            Route::Get { kind, id } => {
                let listing = self.fetch_listing(kind, id.as_deref()).await?;
                let topic = match &id {
                    Some(id) => format!("{}/resource/{}/{}", self.prefix, kind, id),
                    None => format!("{}/resource/{}", self.prefix, kind),
                };
                self.publisher
                    .publish_retained(topic, serde_json::to_vec(&*listing)?)
                    .await?;
            }
            Route::Refresh => {
                self.cache.clear();
                let graph = self.load_graph().await?;
                self.publish_state(&graph).await?;
            }
        }
        Ok(())
    }

    /// Publishes a state snapshot, rebuilding the graph first. Used on
    /// connect when `publish_on_connect` is set.
    pub async fn publish_current_state(&self) -> Result<()> {
        let graph = self.load_graph().await?;
        self.publish_state(&graph).await
    }

    async fn publish_state(&self, graph: &ResourceGraph) -> Result<()> {
        self.publisher
            .publish_retained(format!("{}/state", self.prefix), serde_json::to_vec(graph)?)
            .await
    }

    async fn fetch_listing(
        &self,
        kind: ResourceKind,
        id: Option<&str>,
    ) -> Result<Arc<serde_json::Value>> {
        let key = match id {
            Some(id) => CacheKey::single(kind, id),
            None => CacheKey::list(kind),
        };
        self.cache
            .get(key, || self.bridge.get_resource_list(kind, id))
            .await
    }

    /// Rebuilds the graph snapshot from the (cache-backed) light, room and
    /// zone listings and swaps it into the store.
    async fn load_graph(&self) -> Result<Arc<ResourceGraph>> {
        let lights = self.fetch_listing(ResourceKind::Light, None).await?;
        let rooms = self.fetch_listing(ResourceKind::Room, None).await?;
        let zones = self.fetch_listing(ResourceKind::Zone, None).await?;

        let lights: Vec<Light> = serde_json::from_value((*lights).clone())?;
        let rooms: Vec<Room> = serde_json::from_value((*rooms).clone())?;
        let zones: Vec<Zone> = serde_json::from_value((*zones).clone())?;

        Ok(self
            .graph
            .replace(ResourceGraph::build(&lights, &rooms, &zones)))
    }
}
