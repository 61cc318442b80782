use std::process::exit;
use std::sync::Arc;

use huemqtt::bridge::HueBridge;
use huemqtt::config::Settings;
use huemqtt::mqtt;
use huemqtt::service::App;

#[tokio::main]
async fn main() {
    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: huemqtt <config.toml>");
        exit(2);
    };
    let settings = match Settings::load(&path) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("cannot load {path}: {e}");
            exit(1);
        }
    };

    // RUST_LOG, when set, wins over the configured verbosity.
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", &settings.bridge.log_level);
    }
    pretty_env_logger::init();

    let bridge = HueBridge::new(settings.hue.host.clone(), &settings.hue.application_key);
    let (publisher, client, event_loop) = mqtt::connect(&settings.mqtt);
    let app = Arc::new(App::new(&settings, bridge, publisher));

    log::info!(
        "bridging {} <-> mqtt://{}:{} under prefix {:?}",
        settings.hue.host,
        settings.mqtt.host,
        settings.mqtt.port,
        settings.bridge.prefix
    );

    tokio::select! {
        result = mqtt::run(client, event_loop, app, settings.bridge.publish_on_connect) => {
            if let Err(e) = result {
                log::error!("bus loop failed: {e}");
                exit(1);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            log::info!("received shutdown signal, exiting");
        }
    }
}
