//! # peridyn-solver
//!
//! Chunked execution and explicit time integration of peridynamic bodies.
//!
//! ## Key Types
//!
//! - [`Body`]: Point cloud, material, per-set properties and conditions
//! - [`BodyChunk`]: One chunk's localized bonds, storage and parameters
//! - [`DataHandler`]: Transport contract; implemented by
//!   [`ThreadsDataHandler`] (rayon) and [`DistributedDataHandler`]
//!   (any [`Communicator`], in-process via [`ChannelWorld`])
//! - [`VelocityVerlet`]: Stable-step computation and the step protocol
//! - [`Job`]: Validates settings, selects the transport, gathers results

pub mod body;
pub mod chunk;
pub mod comm;
pub mod config;
pub mod data_handler;
pub mod distributed;
pub mod job;
pub mod partition;
pub mod threads;
pub mod velocity_verlet;

pub use body::{Body, ALL_POINTS};
pub use chunk::BodyChunk;
pub use comm::{ChannelComm, ChannelWorld, Communicator};
pub use config::TimeSolverConfig;
pub use data_handler::{DataHandler, ReduceOp};
pub use distributed::DistributedDataHandler;
pub use job::{Job, JobConfig, JobResults, JobSummary, Transport};
pub use partition::Partition;
pub use threads::ThreadsDataHandler;
pub use velocity_verlet::{SolveSummary, SolverOutput, StepPlan, VelocityVerlet};
