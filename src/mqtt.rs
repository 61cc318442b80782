//! MQTT plumbing: broker connection, subscription, and the delivery loop.
//!
//! Each incoming publish is handed to the pipeline on its own task, so
//! slow bridge round-trips never block delivery of later messages.
//! Reconnection is rumqttc's job; messages arriving while disconnected
//! are simply not delivered.

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use std::sync::Arc;
use std::time::Duration;

use crate::bridge::BridgeApi;
use crate::config::MqttSettings;
use crate::service::{App, StatePublisher};
use crate::Result;

const KEEP_ALIVE: Duration = Duration::from_secs(30);
const RECONNECT_PAUSE: Duration = Duration::from_secs(5);

/// Publishing half of the client, retained messages only.
#[derive(Clone)]
pub struct MqttPublisher {
    client: AsyncClient,
}

impl StatePublisher for MqttPublisher {
    async fn publish_retained(&self, topic: String, body: Vec<u8>) -> Result<()> {
        self.client
            .publish(topic, QoS::AtLeastOnce, true, body)
            .await?;
        Ok(())
    }
}

pub fn connect(settings: &MqttSettings) -> (MqttPublisher, AsyncClient, EventLoop) {
    let mut options = MqttOptions::new(&settings.client_id, &settings.host, settings.port);
    options.set_keep_alive(KEEP_ALIVE);
    if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
        options.set_credentials(username, password);
    }
    let (client, event_loop) = AsyncClient::new(options, 16);
    (
        MqttPublisher {
            client: client.clone(),
        },
        client,
        event_loop,
    )
}

/// Drives the event loop until the task is dropped. Subscribes on every
/// (re)connect; spawns one handler task per delivered message.
pub async fn run<B, P>(
    client: AsyncClient,
    mut event_loop: EventLoop,
    app: Arc<App<B, P>>,
    publish_on_connect: bool,
) -> Result<()>
where
    B: BridgeApi + 'static,
    P: StatePublisher + 'static,
{
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                log::info!("connected to MQTT broker");
                client
                    .subscribe(app.subscription(), QoS::AtLeastOnce)
                    .await?;
                if publish_on_connect {
                    let app = app.clone();
                    tokio::spawn(async move {
                        if let Err(e) = app.publish_current_state().await {
                            log::error!("publishing state on connect failed: {e}");
                        }
                    });
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let app = app.clone();
                tokio::spawn(async move {
                    app.handle_message(&publish.topic, &publish.payload).await;
                });
            }
            Ok(_) => {}
            Err(e) => {
                log::error!("lost MQTT connection: {e}, retrying in {RECONNECT_PAUSE:?}");
                tokio::time::sleep(RECONNECT_PAUSE).await;
            }
        }
    }
}
