//! Configuration loading for the EventBus CLI
//!
//! Layers are merged with figment in priority order: env vars > manifest
//! file > defaults. Without `--config` the defaults are the built-in example
//! manifest, which declares the two demo channels and allowlists the demo
//! classes on them. Env vars use the `EVENTBUS_` prefix with `__` between
//! nested keys, e.g. `EVENTBUS_BUS__LOG_SIGNATURE_DRIFT=false`.

use std::path::Path;

use eventbus_facade::FacadeConfig;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use tracing::info;

use crate::error::{CliError, Result};

/// Manifest used when no configuration file is given
pub const EXAMPLE_CONFIG: &str = r#"# EventBus manifest
[bus]
log_signature_drift = true

[[bus.channels]]
channel_tag = "Toy.Stats.HealthChanged"
owns_publisher_callbacks = false

[[bus.channels]]
channel_tag = "Toy.Stats.StaminaChanged"
owns_publisher_callbacks = true

[[allowlist.publisher_rules]]
channel_tag = "Toy.Stats.HealthChanged"
publisher_class = "StatsPublisher"
signal_name = "on_health_changed"

[[allowlist.publisher_rules]]
channel_tag = "Toy.Stats.StaminaChanged"
publisher_class = "StatsPublisher"
signal_name = "on_stamina_changed"

[[allowlist.listener_rules]]
channel_tag = "Toy.Stats.HealthChanged"
listener_class = "HudListener"
allowed_methods = ["on_health"]

[[allowlist.listener_rules]]
channel_tag = "Toy.Stats.StaminaChanged"
listener_class = "HudListener"
allowed_methods = ["on_stamina"]
"#;

/// Load configuration from file or fall back to the example manifest
pub fn load_configuration(path: Option<&str>) -> Result<FacadeConfig> {
    let figment = match path {
        Some(path) => {
            info!("Loading configuration from: {}", path);
            if !Path::new(path).exists() {
                return Err(CliError::Config(format!("configuration file not found: {path}")));
            }
            Figment::new()
                .merge(Serialized::defaults(FacadeConfig::default()))
                .merge(Toml::file(path))
        }
        None => {
            info!("Using built-in example configuration");
            Figment::new().merge(Serialized::defaults(FacadeConfig::from_toml_str(EXAMPLE_CONFIG)?))
        }
    };

    let config: FacadeConfig = figment
        .merge(Env::prefixed("EVENTBUS_").split("__"))
        .extract()
        .map_err(|e| CliError::Config(format!("Failed to load configuration: {}", e)))?;

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_config_is_valid() {
        let config = load_configuration(None).unwrap();
        assert_eq!(config.bus.channels.len(), 2);

        let allowlist = config.allowlist.as_ref().unwrap();
        assert_eq!(allowlist.publisher_rules.len(), 2);
        assert_eq!(allowlist.listener_rules.len(), 2);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = load_configuration(Some("/nonexistent/eventbus.toml"));
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_invalid_manifest_fails_validation() {
        let path = std::env::temp_dir().join(format!("eventbus-cli-{}.toml", std::process::id()));
        std::fs::write(&path, "[[bus.channels]]\nchannel_tag = \".Toy\"\n").unwrap();
        let result = load_configuration(path.to_str());
        let _ = std::fs::remove_file(&path);
        assert!(matches!(result, Err(CliError::Facade(_))));
    }

    #[test]
    fn test_env_overrides_example_config() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("EVENTBUS_BUS__LOG_SIGNATURE_DRIFT", "false");

            let config = load_configuration(None).map_err(|e| e.to_string())?;
            assert!(!config.bus.log_signature_drift);
            assert_eq!(config.bus.channels.len(), 2);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_manifest_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "eventbus.toml",
                r#"
                [bus]
                log_signature_drift = true

                [[bus.channels]]
                channel_tag = "Toy.Stats.HealthChanged"
                "#,
            )?;

            let config = load_configuration(Some("eventbus.toml")).map_err(|e| e.to_string())?;
            assert!(config.bus.log_signature_drift);
            assert_eq!(config.bus.channels.len(), 1);
            assert!(config.allowlist.is_none());

            jail.set_env("EVENTBUS_BUS__LOG_SIGNATURE_DRIFT", "false");
            let config = load_configuration(Some("eventbus.toml")).map_err(|e| e.to_string())?;
            assert!(!config.bus.log_signature_drift);
            assert_eq!(config.bus.channels.len(), 1);
            Ok(())
        });
    }
}
