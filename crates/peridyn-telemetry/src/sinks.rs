//! Pluggable event sinks.

use std::sync::{Arc, Mutex};

use crate::events::{EventKind, SimulationEvent};

/// Trait for event consumers.
pub trait EventSink: Send {
    /// Process a single event.
    fn handle(&mut self, event: &SimulationEvent);

    /// Called when the simulation ends.
    fn finalize(&mut self) {}

    /// Returns a human-readable name for this sink.
    fn name(&self) -> &str;
}

/// Records events in memory.
///
/// Clones share the same buffer, so a clone kept by the caller can
/// inspect what the bus delivered to the boxed original.
#[derive(Clone, Default)]
pub struct VecSink {
    events: Arc<Mutex<Vec<SimulationEvent>>>,
}

impl VecSink {
    /// Creates an empty vec sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events.
    pub fn events(&self) -> Vec<SimulationEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events().len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for VecSink {
    fn handle(&mut self, event: &SimulationEvent) {
        let mut events = match self.events.lock() {
            Ok(events) => events,
            Err(poisoned) => poisoned.into_inner(),
        };
        events.push(event.clone());
    }

    fn name(&self) -> &str {
        "vec_sink"
    }
}

/// Forwards events to `tracing`.
///
/// Per-step events go to `debug`, lifecycle events to `info`.
#[derive(Debug, Default)]
pub struct TracingSink;

impl TracingSink {
    /// Creates a new tracing sink.
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for TracingSink {
    fn handle(&mut self, event: &SimulationEvent) {
        let step = event.timestep;
        match &event.kind {
            EventKind::JobStart {
                points,
                bonds,
                chunks,
                transport,
                stepsize,
                steps,
            } => tracing::info!(points, bonds, chunks, %transport, stepsize, steps, "job started"),
            EventKind::TimestepEnd {
                sim_time,
                wall_time,
                kinetic_energy,
            } => tracing::debug!(step, sim_time, wall_time, kinetic_energy, "timestep"),
            EventKind::Damage {
                max,
                mean,
                broken_bonds,
            } => tracing::debug!(step, max, mean, broken_bonds, "damage"),
            EventKind::StepsizeUpdate { stepsize } => {
                tracing::info!(step, stepsize, "stable step size updated")
            }
            EventKind::Export { fields } => tracing::debug!(step, ?fields, "snapshot exported"),
            EventKind::JobEnd { steps, wall_time } => {
                tracing::info!(steps, wall_time, "job finished")
            }
        }
    }

    fn name(&self) -> &str {
        "tracing_sink"
    }
}
