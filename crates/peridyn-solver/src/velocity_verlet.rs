//! Explicit Velocity-Verlet time integration.
//!
//! Forces and acceleration of the initial configuration are evaluated
//! once before the first step. Per step, for every chunk:
//!
//! ```text
//! v½ = v + Δt/2 · a
//! u += Δt · v½,  x += Δt · v½
//! exchange(read fields, owner → halo)
//! b_int = material.force_density(...)
//! exchange(write fields, halo → owner, summed)
//! damage = 1 − active / total
//! a = (b_int + b_ext) / ρ,  v = v½ + Δt/2 · a
//! ```
//!
//! Each exchange is a full barrier: no chunk computes forces before the
//! positions of the step arrived, and no owner integrates before every
//! halo contribution was summed in.

use std::sync::mpsc;
use std::time::Instant;

use peridyn_decomp::ExchangeDirection;
use peridyn_io::{ExportOptions, Snapshot, SnapshotWriter};
use peridyn_material::MaterialModel;
use peridyn_telemetry::{EventKind, SimulationEvent};
use peridyn_types::{PeridynError, PeridynResult};
use serde::{Deserialize, Serialize};

use crate::chunk::BodyChunk;
use crate::config::TimeSolverConfig;
use crate::data_handler::{DataHandler, ReduceOp};

/// Resolved run length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepPlan {
    /// Step size (seconds).
    pub stepsize: f64,
    /// Number of steps.
    pub steps: usize,
    /// Simulated time span (seconds).
    pub time: f64,
}

/// Where a solve reports to. Only the root handler writes.
#[derive(Default)]
pub struct SolverOutput {
    /// Telemetry events.
    pub events: Option<mpsc::Sender<SimulationEvent>>,
    /// Snapshot destination, used when `export` is set.
    pub writer: Option<Box<dyn SnapshotWriter>>,
    /// Export schedule. Must be the same on every rank.
    pub export: Option<ExportOptions>,
    /// Suppresses per-step progress logs.
    pub quiet: bool,
}

impl SolverOutput {
    fn emit(&self, timestep: usize, kind: EventKind) {
        if let Some(events) = &self.events {
            // A dropped receiver only means nobody listens.
            let _ = events.send(SimulationEvent::new(timestep, kind));
        }
    }
}

/// Outcome of a completed solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolveSummary {
    /// Steps executed.
    pub steps: usize,
    /// Simulation time reached (seconds).
    pub time: f64,
    /// Step size of the last step (seconds).
    pub stepsize: f64,
    /// Kinetic energy after the last step.
    pub kinetic_energy: f64,
    /// Largest point damage after the last step.
    pub max_damage: f64,
}

/// Velocity-Verlet time solver.
#[derive(Debug, Clone)]
pub struct VelocityVerlet {
    config: TimeSolverConfig,
}

impl VelocityVerlet {
    /// Creates a solver from a validated configuration.
    pub fn new(config: TimeSolverConfig) -> PeridynResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TimeSolverConfig {
        &self.config
    }

    /// Determines step size and run length.
    pub fn plan<D: DataHandler>(&self, handler: &mut D) -> PeridynResult<StepPlan> {
        let stepsize = match self.config.stepsize {
            Some(dt) => {
                if handler.is_root() {
                    tracing::warn!(stepsize = dt, "user-defined step size, stability is not checked");
                }
                dt
            }
            None => handler.stable_timestep(self.config.safety_factor)?,
        };
        let (steps, time) = self.config.resolve(stepsize)?;
        Ok(StepPlan {
            stepsize,
            steps,
            time,
        })
    }

    /// Runs the whole integration.
    pub fn solve<D: DataHandler>(
        &self,
        handler: &mut D,
        output: &mut SolverOutput,
    ) -> PeridynResult<SolveSummary> {
        let start = Instant::now();
        let plan = self.plan(handler)?;
        let root = handler.is_root();
        let verbose = root && !output.quiet;

        if verbose {
            tracing::info!(
                transport = handler.transport(),
                chunks = handler.n_chunks(),
                stepsize = plan.stepsize,
                steps = plan.steps,
                time = plan.time,
                "time integration started"
            );
        }
        output.emit(
            0,
            EventKind::JobStart {
                points: handler.point_count(),
                bonds: handler.bond_count(),
                chunks: handler.n_chunks(),
                transport: handler.transport().to_string(),
                stepsize: plan.stepsize,
                steps: plan.steps,
            },
        );
        self.initialize(handler)?;
        self.export(handler, output, 0, 0.0)?;

        let mut dt = plan.stepsize;
        let mut time = 0.0;
        let mut kinetic_energy = 0.0;
        let mut max_damage = 0.0;
        for step in 1..=plan.steps {
            let step_start = Instant::now();
            if let Some(new_dt) = self.updated_stepsize(handler, step)? {
                if new_dt != dt {
                    dt = new_dt;
                    output.emit(step, EventKind::StepsizeUpdate { stepsize: dt });
                }
            }

            self.step(handler, dt)?;
            time += dt;

            kinetic_energy = handler.reduce(ReduceOp::Sum, BodyChunk::kinetic_energy)?;
            if !kinetic_energy.is_finite() {
                return Err(PeridynError::NumericFailure(format!(
                    "Kinetic energy became {kinetic_energy} at step {step}"
                )));
            }
            max_damage = handler.reduce(ReduceOp::Max, BodyChunk::max_damage)?;
            let damage_sum = handler.reduce(ReduceOp::Sum, BodyChunk::damage_sum)?;
            let broken = handler.reduce(ReduceOp::Sum, |c| c.broken_bonds() as f64)?;

            let wall_time = step_start.elapsed().as_secs_f64();
            output.emit(
                step,
                EventKind::TimestepEnd {
                    sim_time: time,
                    wall_time,
                    kinetic_energy,
                },
            );
            output.emit(
                step,
                EventKind::Damage {
                    max: max_damage,
                    mean: damage_sum / handler.point_count() as f64,
                    broken_bonds: broken as usize,
                },
            );
            if verbose {
                tracing::trace!(step, time, kinetic_energy, max_damage, "step done");
            }
            self.export(handler, output, step, time)?;
        }

        if root && output.export.is_some() {
            if let Some(writer) = output.writer.as_mut() {
                writer.finish()?;
            }
        }
        let wall_time = start.elapsed().as_secs_f64();
        output.emit(
            plan.steps,
            EventKind::JobEnd {
                steps: plan.steps,
                wall_time,
            },
        );
        if verbose {
            tracing::info!(steps = plan.steps, time, wall_time, "time integration finished");
        }
        Ok(SolveSummary {
            steps: plan.steps,
            time,
            stepsize: dt,
            kinetic_energy,
            max_damage,
        })
    }

    /// Advances every chunk by one step of size `dt`.
    pub fn step<D: DataHandler>(&self, handler: &mut D, dt: f64) -> PeridynResult<()> {
        let half = 0.5 * dt;
        handler.for_each_chunk(|chunk| {
            update_velocity_half(chunk, half);
            update_displacement(chunk, dt);
            Ok(())
        })?;
        self.evaluate_forces(handler)?;
        handler.for_each_chunk(|chunk| {
            update_acceleration(chunk);
            update_velocity(chunk, half);
            Ok(())
        })
    }

    /// Computes forces and acceleration of the current configuration.
    ///
    /// Called once before the first step, so that the first half kick
    /// uses the initial loads.
    pub fn initialize<D: DataHandler>(&self, handler: &mut D) -> PeridynResult<()> {
        self.evaluate_forces(handler)?;
        handler.for_each_chunk(|chunk| {
            update_acceleration(chunk);
            Ok(())
        })
    }

    /// Position exchange, force density, force exchange, damage.
    fn evaluate_forces<D: DataHandler>(&self, handler: &mut D) -> PeridynResult<()> {
        let material = *handler.material();
        for &field in material.read_halo_fields() {
            handler.exchange(field, ExchangeDirection::LocToHalo)?;
        }
        handler.for_each_chunk(|chunk| {
            chunk.compute_force_density();
            Ok(())
        })?;
        for &field in material.write_halo_fields() {
            handler.exchange(field, ExchangeDirection::HaloToLoc)?;
        }
        handler.for_each_chunk(|chunk| {
            chunk.update_damage();
            Ok(())
        })
    }

    fn updated_stepsize<D: DataHandler>(
        &self,
        handler: &mut D,
        step: usize,
    ) -> PeridynResult<Option<f64>> {
        match self.config.timestep_update_interval {
            Some(interval) if self.config.stepsize.is_none() && step % interval == 0 => {
                let dt = handler.reduce(ReduceOp::Min, BodyChunk::stable_timestep)?;
                if dt == f64::INFINITY {
                    // every bond is broken; nothing limits the step anymore
                    return Ok(None);
                }
                if !(dt > 0.0) {
                    return Err(PeridynError::NumericFailure(format!(
                        "Stable step size became {dt} at step {step}"
                    )));
                }
                Ok(Some(dt * self.config.safety_factor))
            }
            _ => Ok(None),
        }
    }

    fn export<D: DataHandler>(
        &self,
        handler: &mut D,
        output: &mut SolverOutput,
        step: usize,
        time: f64,
    ) -> PeridynResult<()> {
        let fields = match &output.export {
            Some(options) if options.is_due(step) => options.fields.clone(),
            _ => return Ok(()),
        };
        // Every rank takes part in the gather; only the root writes.
        let Some(gathered) = handler.gather(&fields)? else {
            return Ok(());
        };
        if let Some(writer) = output.writer.as_mut() {
            let snapshot = Snapshot {
                step,
                time,
                point_ids: (0..handler.point_count()).collect(),
                fields: gathered,
            };
            writer.write(&snapshot)?;
            output.emit(
                step,
                EventKind::Export {
                    fields: fields.iter().map(|f| f.name().to_string()).collect(),
                },
            );
        }
        Ok(())
    }
}

/// `v½ = v + Δt/2 · a`.
fn update_velocity_half(chunk: &mut BodyChunk, half_dt: f64) {
    let s = &mut chunk.storage;
    for i in 0..s.n_loc_points {
        s.velocity_half[i] = s.velocity[i] + s.acceleration[i] * half_dt;
    }
}

/// `u += Δt · v½`, `x += Δt · v½`.
fn update_displacement(chunk: &mut BodyChunk, dt: f64) {
    let s = &mut chunk.storage;
    for i in 0..s.n_loc_points {
        let du = s.velocity_half[i] * dt;
        s.displacement[i] += du;
        s.position[i] += du;
    }
}

/// `a = (b_int + b_ext) / ρ`.
fn update_acceleration(chunk: &mut BodyChunk) {
    let BodyChunk { storage, params, .. } = chunk;
    for i in 0..storage.n_loc_points {
        storage.acceleration[i] = (storage.b_int[i] + storage.b_ext[i]) / params.get(i).rho;
    }
}

/// `v = v½ + Δt/2 · a`.
fn update_velocity(chunk: &mut BodyChunk, half_dt: f64) {
    let s = &mut chunk.storage;
    for i in 0..s.n_loc_points {
        s.velocity[i] = s.velocity_half[i] + s.acceleration[i] * half_dt;
    }
}
