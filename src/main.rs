//! modelstore demo
//!
//! Builds a store with a `count` model and the loading plugin, dispatches
//! overlapping effects and logs the loading state while they run.
//!
//! # Execution Flow
//!
//! 1. Load settings from `modelstore.yaml` (current directory) and `MODELSTORE__*`
//! 2. Initialize logging -> logs/modelstore.<date>
//! 3. Create a tokio runtime
//! 4. Create the store with the loading plugin configured from settings
//! 5. Dispatch `count/timeout` twice and `count/addOne` once without awaiting
//! 6. Log the loading state, await both effects, log it again
//! 7. Log store metrics

use anyhow::Result;
use modelstore::{
    APP_NAME, ConfigManager, LoadingPlugin, LoadingState, Model, Store, StoreConfig, VERSION,
};
use serde_json::{Value, json};
use std::time::Duration;

fn main() -> Result<()> {
    let config_manager = ConfigManager::new(".")?;
    let settings = config_manager.load_settings()?;

    let _guard = modelstore::logging::setup_logging(&settings.logging)?;
    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(2)
        .thread_name("modelstore-worker")
        .build()?;

    let plugin = LoadingPlugin::new(settings.loading.clone())?;
    let loading_name = plugin.config().name().to_string();

    runtime.block_on(async move {
        let store = modelstore::init(StoreConfig::new().model(count_model()).plugin(plugin))?;

        let first = store.model("count").call("timeout", Value::Null);
        let second = store.model("count").call("timeout", Value::Null);
        store.model("count").call("addOne", Value::Null).await?;

        log_loading(&store, &loading_name, "both effects in flight");

        first.await?;
        second.await?;

        log_loading(&store, &loading_name, "effects settled");
        tracing::info!("Final state: {}", store.get_state());

        store.metrics().log_summary();
        Ok::<(), anyhow::Error>(())
    })?;

    runtime.shutdown_timeout(Duration::from_secs(5));
    tracing::info!("Shutdown complete");
    Ok(())
}

fn count_model() -> Model {
    Model::new("count", json!(0))
        .reducer("addOne", |state, _| json!(state.as_i64().unwrap_or(0) + 1))
        .effect("timeout", |ctx| async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            ctx.dispatch.call("addOne", Value::Null).await
        })
}

fn log_loading(store: &Store, name: &str, label: &str) {
    match LoadingState::from_store(store, name) {
        Some(state) => tracing::info!(
            "[{}] global={:?} models={:?} effects={:?}",
            label,
            state.global,
            state.models,
            state.effects
        ),
        None => tracing::warn!("[{}] no loading state under {:?}", label, name),
    }
}
