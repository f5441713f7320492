//! Command handlers for the EventBus CLI

use eventbus_facade::{EventBusFacade, FacadeConfig};
use tracing::info;

use crate::cli::{Cli, Commands};
use crate::config::{load_configuration, EXAMPLE_CONFIG};
use crate::demo::run_demo;
use crate::error::Result;

/// Command dispatcher for handling CLI commands
pub struct CommandDispatcher;

impl CommandDispatcher {
    /// Execute a CLI command
    pub fn execute(cli: Cli) -> Result<()> {
        match cli.command {
            Commands::ExampleConfig => {
                print!("{EXAMPLE_CONFIG}");
                Ok(())
            }
            Commands::Validate => {
                let config = load_configuration(cli.config.as_deref())?;
                Self::handle_validate(&config);
                Ok(())
            }
            Commands::Channels => {
                let config = load_configuration(cli.config.as_deref())?;
                Self::handle_channels(&config)
            }
            Commands::Demo {
                ticks,
                drop_listener_at,
            } => {
                let config = load_configuration(cli.config.as_deref())?;
                Self::handle_demo(&config, ticks, drop_listener_at)
            }
        }
    }

    fn handle_validate(config: &FacadeConfig) {
        println!("Configuration is valid");
        println!("  channels: {}", config.bus.channels.len());
        for registration in &config.bus.channels {
            println!(
                "    {} (owns publisher callbacks: {})",
                registration.channel_tag, registration.owns_publisher_callbacks
            );
        }
        match &config.allowlist {
            Some(allowlist) => {
                println!("  publisher rules: {}", allowlist.publisher_rules.len());
                println!("  listener rules: {}", allowlist.listener_rules.len());
            }
            None => println!("  no allowlist: every validated add will be denied"),
        }
    }

    fn handle_channels(config: &FacadeConfig) -> Result<()> {
        let facade = EventBusFacade::from_config(config)?;
        let snapshots: Vec<_> = facade
            .bus()
            .registered_channels()
            .iter()
            .filter_map(|tag| facade.bus().channel_info(tag))
            .collect();
        println!("{}", serde_json::to_string_pretty(&snapshots)?);
        Ok(())
    }

    fn handle_demo(config: &FacadeConfig, ticks: u32, drop_listener_at: Option<u32>) -> Result<()> {
        info!(ticks, ?drop_listener_at, "Running EventBus demo");
        let report = run_demo(config, ticks, drop_listener_at)?;

        println!("Demo summary");
        println!("  ticks: {}", report.ticks);
        println!("  health deliveries: {}", report.health_deliveries);
        println!("  stamina deliveries: {}", report.stamina_deliveries);
        println!("  primary HUD updates: {} health, {} stamina", report.primary_health_updates, report.primary_stamina_updates);
        println!("{}", serde_json::to_string_pretty(&report)?);
        Ok(())
    }
}
