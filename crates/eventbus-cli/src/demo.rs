//! Stats/HUD demo scenario
//!
//! A `StatsPublisher` fires health and stamina changes each tick and two
//! `HudListener`s receive them through allowlisted channels. The second HUD
//! can be dropped mid-run to show that dead listeners stop receiving and are
//! swept on the next mutation.

use std::sync::{Arc, OnceLock};

use eventbus_core::{
    declare_channel, impl_bus_object, listener_method, BusObject, ChannelDef, ChannelSnapshot,
    ClassInfo, MulticastSignal, ObjectHeader, ObjectRef, ParamType, Signature, TypedChannel, Value,
};
use eventbus_facade::{EventBusFacade, FacadeConfig, RuntimeHistory};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{CliError, Result};

// ----------------------------------------------------------------------------
// Demo Objects
// ----------------------------------------------------------------------------

pub struct StatsPublisher {
    header: ObjectHeader,
    on_health_changed: MulticastSignal,
    on_stamina_changed: MulticastSignal,
}

impl StatsPublisher {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            header: ObjectHeader::new(name),
            on_health_changed: MulticastSignal::new(Signature::new(&[ParamType::Float])),
            on_stamina_changed: MulticastSignal::new(Signature::new(&[ParamType::Float])),
        })
    }

    pub fn class_info() -> &'static ClassInfo {
        static CLASS: OnceLock<ClassInfo> = OnceLock::new();
        CLASS.get_or_init(|| {
            ClassInfo::builder::<StatsPublisher>("StatsPublisher")
                .signal("on_health_changed", |p| &p.on_health_changed)
                .signal("on_stamina_changed", |p| &p.on_stamina_changed)
                .build()
        })
    }

    /// Fires both signals for `tick`, returning (health, stamina) deliveries
    pub fn tick(&self, tick: u32) -> (usize, usize) {
        let health = 100.0 - 7.5 * tick as f32;
        let stamina = 40.0 + 5.0 * (tick % 4) as f32;
        (
            TypedChannel::<HealthChanged>::broadcast(self, &[Value::Float(health)]),
            TypedChannel::<StaminaChanged>::broadcast(self, &[Value::Float(stamina)]),
        )
    }
}

impl_bus_object!(StatsPublisher, header, StatsPublisher::class_info());

declare_channel!(
    /// Health updates from a [`StatsPublisher`]
    pub HealthChanged: StatsPublisher => "Toy.Stats.HealthChanged", on_health_changed
);
declare_channel!(
    /// Stamina updates from a [`StatsPublisher`]
    pub StaminaChanged: StatsPublisher => "Toy.Stats.StaminaChanged", on_stamina_changed
);

pub struct HudListener {
    header: ObjectHeader,
    health: Mutex<Vec<f32>>,
    stamina: Mutex<Vec<f32>>,
}

impl HudListener {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            header: ObjectHeader::new(name),
            health: Mutex::new(Vec::new()),
            stamina: Mutex::new(Vec::new()),
        })
    }

    pub fn class_info() -> &'static ClassInfo {
        static CLASS: OnceLock<ClassInfo> = OnceLock::new();
        CLASS.get_or_init(|| {
            ClassInfo::builder::<HudListener>("HudListener")
                .method1("on_health", HudListener::on_health)
                .method1("on_stamina", HudListener::on_stamina)
                .build()
        })
    }

    pub fn on_health(&self, value: f32) {
        debug!(hud = %self.header.name(), value, "HUD health updated");
        self.health.lock().push(value);
    }

    pub fn on_stamina(&self, value: f32) {
        debug!(hud = %self.header.name(), value, "HUD stamina updated");
        self.stamina.lock().push(value);
    }

    pub fn health_updates(&self) -> Vec<f32> {
        self.health.lock().clone()
    }

    pub fn stamina_updates(&self) -> Vec<f32> {
        self.stamina.lock().clone()
    }
}

impl_bus_object!(HudListener, header, HudListener::class_info());

// ----------------------------------------------------------------------------
// Scenario
// ----------------------------------------------------------------------------

/// Outcome of a demo run
#[derive(Debug, Clone, Serialize)]
pub struct DemoReport {
    pub ticks: u32,
    pub health_deliveries: usize,
    pub stamina_deliveries: usize,
    pub primary_health_updates: usize,
    pub primary_stamina_updates: usize,
    /// Channel state after the run, before shutdown
    pub channels: Vec<ChannelSnapshot>,
    pub history: RuntimeHistory,
}

fn bind_publisher<D: ChannelDef>(facade: &mut EventBusFacade, publisher: &ObjectRef) -> Result<()> {
    let tag = D::channel_tag();
    if facade.add_publisher_validated(&tag, publisher, D::SIGNAL_NAME) {
        Ok(())
    } else {
        Err(CliError::Binding(format!(
            "{} may not publish {} on {}",
            publisher.describe(),
            D::SIGNAL_NAME,
            tag
        )))
    }
}

fn bind_listener<D: ChannelDef>(
    facade: &mut EventBusFacade,
    listener: &ObjectRef,
    method_name: &str,
) -> Result<()> {
    let tag = D::channel_tag();
    if facade.add_listener_validated(&tag, listener, method_name) {
        Ok(())
    } else {
        Err(CliError::Binding(format!(
            "{} may not listen with {} on {}",
            listener.describe(),
            method_name,
            tag
        )))
    }
}

fn bind_hud(facade: &mut EventBusFacade, hud: &Arc<HudListener>) -> Result<()> {
    let listener: ObjectRef = hud.clone();
    bind_listener::<HealthChanged>(facade, &listener, listener_method!(HudListener, on_health).name())?;
    bind_listener::<StaminaChanged>(facade, &listener, listener_method!(HudListener, on_stamina).name())
}

/// Runs the demo against the channels and allowlist in `config`
pub fn run_demo(config: &FacadeConfig, ticks: u32, drop_listener_at: Option<u32>) -> Result<DemoReport> {
    let mut facade = EventBusFacade::from_config(config)?;

    let stats = StatsPublisher::new("stats");
    let primary = HudListener::new("hud.primary");
    let mut secondary = Some(HudListener::new("hud.secondary"));

    let publisher: ObjectRef = stats.clone();
    bind_publisher::<HealthChanged>(&mut facade, &publisher)?;
    bind_publisher::<StaminaChanged>(&mut facade, &publisher)?;
    bind_hud(&mut facade, &primary)?;
    if let Some(hud) = &secondary {
        bind_hud(&mut facade, hud)?;
    }

    let mut health_deliveries = 0;
    let mut stamina_deliveries = 0;
    for tick in 0..ticks {
        if drop_listener_at == Some(tick) {
            if let Some(hud) = secondary.take() {
                info!(tick, hud = %hud.header().name(), "Dropping secondary HUD");
            }
        }

        let (health, stamina) = stats.tick(tick);
        health_deliveries += health;
        stamina_deliveries += stamina;
    }

    // Rebinding is idempotent and sweeps stale listeners from the channel
    bind_hud(&mut facade, &primary)?;

    let channels = facade
        .bus()
        .registered_channels()
        .iter()
        .filter_map(|tag| facade.bus().channel_info(tag))
        .collect();

    let report = DemoReport {
        ticks,
        health_deliveries,
        stamina_deliveries,
        primary_health_updates: primary.health_updates().len(),
        primary_stamina_updates: primary.stamina_updates().len(),
        channels,
        history: facade.history().clone(),
    };

    facade.shutdown();
    info!(ticks, health_deliveries, stamina_deliveries, "Demo finished");
    Ok(report)
}
