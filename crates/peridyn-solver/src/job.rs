//! Job orchestration: configuration, transport selection and results.

use std::collections::BTreeMap;
use std::sync::Mutex;

use peridyn_io::{validate_export_options, ExportField, ExportOptions, FieldData, SnapshotWriter};
use peridyn_math::DVec3;
use peridyn_telemetry::EventBus;
use peridyn_types::{PeridynError, PeridynResult};
use serde::{Deserialize, Serialize};

use crate::body::Body;
use crate::comm::ChannelWorld;
use crate::data_handler::DataHandler;
use crate::distributed::DistributedDataHandler;
use crate::partition::Partition;
use crate::threads::ThreadsDataHandler;
use crate::velocity_verlet::{SolveSummary, SolverOutput, VelocityVerlet};

/// How chunks are executed. One transport per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    /// One process, one worker thread per chunk.
    Threads { n_chunks: usize },
    /// One in-process rank per chunk, communicating by messages.
    Distributed { n_ranks: usize },
}

impl Transport {
    /// Number of chunks the body is split into.
    pub fn n_chunks(self) -> usize {
        match self {
            Transport::Threads { n_chunks } => n_chunks,
            Transport::Distributed { n_ranks } => n_ranks,
        }
    }
}

impl Default for Transport {
    /// A single chunk; bodies of any size can run on it.
    fn default() -> Self {
        Transport::Threads { n_chunks: 1 }
    }
}

/// Run-wide settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    #[serde(default)]
    pub transport: Transport,
    /// Suppresses progress logging.
    #[serde(default)]
    pub quiet: bool,
    /// Snapshot export schedule.
    #[serde(default)]
    pub export: Option<ExportOptions>,
}

impl JobConfig {
    /// Validates the settings.
    pub fn validate(&self) -> PeridynResult<()> {
        if self.transport.n_chunks() == 0 {
            return Err(PeridynError::InvalidConfig(
                "Transport needs at least one chunk".into(),
            ));
        }
        if let Some(export) = &self.export {
            validate_export_options(export)?;
        }
        Ok(())
    }
}

/// Run summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub steps: usize,
    /// Simulation time reached (seconds).
    pub time: f64,
    /// Step size of the last step (seconds).
    pub stepsize: f64,
    pub chunks: usize,
    pub transport: String,
    pub kinetic_energy: f64,
    pub max_damage: f64,
}

/// Final state of every point, in global order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResults {
    pub summary: JobSummary,
    pub position: Vec<DVec3>,
    pub displacement: Vec<DVec3>,
    pub velocity: Vec<DVec3>,
    pub damage: Vec<f64>,
}

const RESULT_FIELDS: [ExportField; 4] = [
    ExportField::Position,
    ExportField::Displacement,
    ExportField::Velocity,
    ExportField::Damage,
];

impl JobResults {
    fn from_gathered(
        summary: JobSummary,
        mut fields: BTreeMap<String, FieldData>,
    ) -> PeridynResult<Self> {
        let mut vectors = |field: ExportField| -> PeridynResult<Vec<DVec3>> {
            match fields.remove(field.name()) {
                Some(FieldData::Vector(v)) => Ok(v.into_iter().map(DVec3::from_array).collect()),
                _ => Err(PeridynError::Transport(format!("Result field '{field}' missing"))),
            }
        };
        let position = vectors(ExportField::Position)?;
        let displacement = vectors(ExportField::Displacement)?;
        let velocity = vectors(ExportField::Velocity)?;
        let damage = match fields.remove(ExportField::Damage.name()) {
            Some(FieldData::Scalar(v)) => v,
            _ => {
                return Err(PeridynError::Transport(
                    "Result field 'damage' missing".into(),
                ))
            }
        };
        Ok(Self {
            summary,
            position,
            displacement,
            velocity,
            damage,
        })
    }
}

/// A simulation job: bodies, time solver and run settings.
#[derive(Debug, Clone)]
pub struct Job {
    bodies: Vec<Body>,
    solver: VelocityVerlet,
    config: JobConfig,
}

impl Job {
    /// A single-body job with default settings.
    pub fn new(body: Body, solver: VelocityVerlet) -> Self {
        Self::multibody(vec![body], solver)
    }

    /// A job over several bodies. Running it is not supported.
    pub fn multibody(bodies: Vec<Body>, solver: VelocityVerlet) -> Self {
        Self {
            bodies,
            solver,
            config: JobConfig::default(),
        }
    }

    /// Replaces the run settings.
    pub fn with_config(mut self, config: JobConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    /// Runs the job without telemetry or export.
    pub fn run(&self) -> PeridynResult<JobResults> {
        self.run_with(None, None)
    }

    /// Runs the job.
    ///
    /// Events go to `bus` (flushed before returning); snapshots go to
    /// `writer`, which is required when export is configured. Every
    /// configuration error is reported before any computation starts.
    pub fn run_with(
        &self,
        mut bus: Option<&mut EventBus>,
        writer: Option<Box<dyn SnapshotWriter>>,
    ) -> PeridynResult<JobResults> {
        let body = self.body()?;
        self.config.validate()?;
        if self.config.export.is_some() && writer.is_none() {
            return Err(PeridynError::InvalidConfig(
                "Export is configured but no snapshot writer was given".into(),
            ));
        }

        if !self.config.quiet {
            tracing::info!(
                body = body.name(),
                points = body.point_count(),
                transport = ?self.config.transport,
                "job started"
            );
        }
        let partition = Partition::new(body, self.config.transport.n_chunks())?;
        let output = SolverOutput {
            events: bus.as_ref().map(|b| b.sender()),
            writer,
            export: self.config.export.clone(),
            quiet: self.config.quiet,
        };

        let result = match self.config.transport {
            Transport::Threads { .. } => {
                let mut handler = ThreadsDataHandler::from_partition(body, partition)?;
                self.solve(&mut handler, output).and_then(root_results)
            }
            Transport::Distributed { n_ranks } => self.run_distributed(body, &partition, n_ranks, output),
        };
        if let Some(bus) = bus.as_mut() {
            bus.flush();
        }
        result
    }

    fn body(&self) -> PeridynResult<&Body> {
        match self.bodies.as_slice() {
            [body] => Ok(body),
            [] => Err(PeridynError::InvalidConfig("Job has no body".into())),
            bodies => Err(PeridynError::Unsupported(format!(
                "Decomposition of multi-body jobs ({} bodies)",
                bodies.len()
            ))),
        }
    }

    fn run_distributed(
        &self,
        body: &Body,
        partition: &Partition,
        n_ranks: usize,
        output: SolverOutput,
    ) -> PeridynResult<JobResults> {
        let export = output.export.clone();
        let quiet = output.quiet;
        let root_output = Mutex::new(Some(output));

        let mut results = ChannelWorld::run(n_ranks, |comm| {
            let mut handler = DistributedDataHandler::new(comm, body, partition)?;
            let output = if handler.is_root() {
                root_output.lock().ok().and_then(|mut o| o.take())
            } else {
                None
            };
            let output = output.unwrap_or_else(|| SolverOutput {
                export: export.clone(),
                quiet,
                ..SolverOutput::default()
            });
            self.solve(&mut handler, output)
        })?;
        root_results(results.swap_remove(0))
    }

    /// Integrates and gathers the final state; `None` off the root.
    fn solve<D: DataHandler>(
        &self,
        handler: &mut D,
        mut output: SolverOutput,
    ) -> PeridynResult<Option<JobResults>> {
        let summary: SolveSummary = self.solver.solve(handler, &mut output)?;
        let gathered = handler.gather(&RESULT_FIELDS)?;
        let summary = JobSummary {
            steps: summary.steps,
            time: summary.time,
            stepsize: summary.stepsize,
            chunks: handler.n_chunks(),
            transport: handler.transport().to_string(),
            kinetic_energy: summary.kinetic_energy,
            max_damage: summary.max_damage,
        };
        gathered
            .map(|fields| JobResults::from_gathered(summary, fields))
            .transpose()
    }
}

fn root_results(results: Option<JobResults>) -> PeridynResult<JobResults> {
    results.ok_or_else(|| PeridynError::Transport("Root rank returned no results".into()))
}
