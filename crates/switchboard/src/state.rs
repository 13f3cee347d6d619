use crate::dispatch::Dispatcher;
use crate::providers::client::ProviderClient;
use crate::providers::ChatBackend;
use common::configuration::Settings;
use common::providers::ProviderRegistry;
use std::sync::Arc;

/// Everything request handling needs, built once at startup and passed
/// explicitly. Handlers get an `Arc<AppState>`; nothing lives in globals.
pub struct AppState {
    pub settings: Settings,
    pub registry: ProviderRegistry,
    pub dispatcher: Dispatcher,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let backend = Arc::new(ProviderClient::new(settings.clone()));
        Self::with_backend(settings, backend)
    }

    /// Build with an alternate backend. Tests use this to script provider
    /// outcomes without a network.
    pub fn with_backend(settings: Settings, backend: Arc<dyn ChatBackend>) -> Self {
        let registry = ProviderRegistry::from_settings(&settings);
        let dispatcher = Dispatcher::new(registry.clone(), backend);
        AppState {
            settings,
            registry,
            dispatcher,
            http: reqwest::Client::new(),
        }
    }
}
