//! Simulation event types.
//!
//! Events are lightweight value types tagged with the time step they
//! belong to. Global quantities are already reduced over all chunks
//! when the event is built.

use serde::{Deserialize, Serialize};

/// A simulation event emitted by the time solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationEvent {
    /// Time step number (0 = initial state).
    pub timestep: usize,
    /// Event payload.
    pub kind: EventKind,
}

/// Event payload variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    /// Setup finished, integration is about to start.
    JobStart {
        /// Number of points in the body.
        points: usize,
        /// Number of bonds in the body.
        bonds: usize,
        /// Number of chunks (threads or ranks).
        chunks: usize,
        /// Transport label, e.g. `"threads"`.
        transport: String,
        /// Time step size (seconds).
        stepsize: f64,
        /// Planned number of steps.
        steps: usize,
    },

    /// Time step completed.
    TimestepEnd {
        /// Simulation time after the step (seconds).
        sim_time: f64,
        /// Wall-clock time spent in the step (seconds).
        wall_time: f64,
        /// Total kinetic energy `Σ ½ ρ V |v|²`.
        kinetic_energy: f64,
    },

    /// Damage summary over all owned points.
    Damage {
        /// Largest point damage.
        max: f64,
        /// Volume-unweighted mean point damage.
        mean: f64,
        /// Number of bonds that have stopped carrying force.
        broken_bonds: usize,
    },

    /// Stable step size recomputed.
    StepsizeUpdate {
        /// New step size (seconds).
        stepsize: f64,
    },

    /// A snapshot was handed to the export writer.
    Export {
        /// Exported field names.
        fields: Vec<String>,
    },

    /// Integration finished.
    JobEnd {
        /// Steps executed.
        steps: usize,
        /// Total wall-clock time (seconds).
        wall_time: f64,
    },
}

impl SimulationEvent {
    /// Creates a new event for the given time step.
    pub fn new(timestep: usize, kind: EventKind) -> Self {
        Self { timestep, kind }
    }
}
