// massive_world_physics/server/src/operational/monitoring/metrics.rs
use crate::systems::physics::ResolveStats;
use anyhow::{Context, Result};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};

/// Per-tick physics metrics, recorded through the `metrics` facade. Nothing is
/// exported unless the host process installs a recorder.
pub struct PhysicsMetrics;

impl PhysicsMetrics {
    pub fn new() -> Self {
        describe_counter!("physics_ticks_total", "Total number of physics resolve passes");
        describe_gauge!("physics_entities_resolved", "Entities resolved by the last physics tick");
        describe_gauge!("physics_force_systems_active", "Force systems still active after the last tick");
        describe_histogram!("physics_tick_seconds", "Physics resolve time in seconds");

        PhysicsMetrics
    }

    pub fn record_tick(&self, stats: &ResolveStats, duration: f64) {
        histogram!("physics_tick_seconds").record(duration);
        counter!("physics_ticks_total").increment(1);
        gauge!("physics_entities_resolved").set(stats.entities_resolved as f64);
        gauge!("physics_force_systems_active").set(stats.force_systems_active as f64);
    }
}

impl Default for PhysicsMetrics {
    fn default() -> Self {
        Self::new()
    }
}

// Logging setup
pub fn init_logging() -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "massive_world_physics=info,warn".into()))
        .with(fmt::layer())
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    Ok(())
}
