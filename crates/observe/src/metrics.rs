use {
    prometheus::Encoder,
    std::{collections::HashMap, sync::OnceLock},
};

/// Global metrics registry used by all components.
static REGISTRY: OnceLock<prometheus_metric_storage::StorageRegistry> = OnceLock::new();

/// Configure global metrics registry.
///
/// This function allows specifying common prefix that will be added
/// to all metric names, as well as common labels.
///
/// This function can be called at most once, and it should be done before
/// any call to [`get_registry`], ideally in the very beginning
/// of the `main` function.
///
/// # Panics
///
/// This function panics if it's called twice, or if it's called after
/// any call to [`get_registry`]. This function also panics if registry
/// configuration is invalid.
pub fn setup_registry(prefix: Option<String>, labels: Option<HashMap<String, String>>) {
    let registry = prometheus::Registry::new_custom(prefix, labels).unwrap();
    let storage_registry = prometheus_metric_storage::StorageRegistry::new(registry);
    REGISTRY.set(storage_registry).unwrap();
}

/// Like [`setup_registry`], but can be called multiple times in a row.
/// Later calls are ignored.
///
/// Useful for tests.
pub fn setup_registry_reentrant(prefix: Option<String>, labels: Option<HashMap<String, String>>) {
    let registry = prometheus::Registry::new_custom(prefix, labels).unwrap();
    let storage_registry = prometheus_metric_storage::StorageRegistry::new(registry);
    REGISTRY.set(storage_registry).ok();
}

/// Get the global instance of the metrics registry.
pub fn get_registry() -> &'static prometheus::Registry {
    get_storage_registry().registry()
}

/// Get the global instance of the metric storage registry.
///
/// If the registry was not configured with [`setup_registry`] it is
/// initialized with default settings, so unit tests don't have to set it up.
pub fn get_storage_registry() -> &'static prometheus_metric_storage::StorageRegistry {
    REGISTRY.get_or_init(prometheus_metric_storage::StorageRegistry::default)
}

/// Encodes all metrics of `registry` in the prometheus text format.
pub fn encode(registry: &prometheus::Registry) -> String {
    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&registry.gather(), &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}
