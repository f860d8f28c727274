//! # peridyn-telemetry
//!
//! Event bus for simulation telemetry. The time solver emits structured
//! events (job start, per-step energy and timing, damage, exports) that
//! pluggable sinks consume: an in-memory recorder for tests and a
//! `tracing` forwarder for the CLI.

pub mod bus;
pub mod events;
pub mod sinks;

pub use bus::EventBus;
pub use events::{EventKind, SimulationEvent};
pub use sinks::{EventSink, TracingSink, VecSink};
