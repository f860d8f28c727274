//! CLI command implementations.

use std::path::{Path, PathBuf};

use peridyn_io::{read_snapshot, FieldData, JsonSnapshotWriter, SnapshotWriter};
use peridyn_solver::{DataHandler, ThreadsDataHandler, Transport, VelocityVerlet};
use peridyn_telemetry::{EventBus, TracingSink};
use peridyn_types::PeridynResult;

use crate::job_file::JobFile;

/// Command line overrides for `run`.
pub struct RunOptions {
    /// Thread count; 0 picks one thread per available core.
    pub threads: Option<usize>,
    pub ranks: Option<usize>,
    pub out: PathBuf,
    pub quiet: bool,
}

/// Run a job file.
pub fn run(path: &Path, options: RunOptions) -> PeridynResult<()> {
    let mut file = JobFile::load(path)?;
    let body = file.body()?;

    if let Some(n) = options.threads {
        let n_chunks = if n == 0 {
            default_threads(body.point_count())
        } else {
            n
        };
        file.job.transport = Transport::Threads { n_chunks };
    } else if let Some(n_ranks) = options.ranks {
        file.job.transport = Transport::Distributed { n_ranks };
    }
    file.job.quiet |= options.quiet;

    let job = file.job()?;

    let mut bus = EventBus::new();
    if !file.job.quiet {
        bus.add_sink(Box::new(TracingSink::new()));
    }
    let writer: Option<Box<dyn SnapshotWriter>> = match &file.job.export {
        Some(_) => Some(Box::new(JsonSnapshotWriter::new(&options.out, &file.name)?)),
        None => None,
    };

    let results = job.run_with(Some(&mut bus), writer)?;
    bus.finish();

    let s = &results.summary;
    println!("=== {} ===", file.name);
    println!("  Transport:       {} ({} chunks)", s.transport, s.chunks);
    println!("  Steps:           {}", s.steps);
    println!("  Step size:       {:.4e} s", s.stepsize);
    println!("  Simulated time:  {:.4e} s", s.time);
    println!("  Kinetic energy:  {:.6e}", s.kinetic_energy);
    println!("  Max damage:      {:.4}", s.max_damage);
    let broken = results.damage.iter().filter(|&&d| d > 0.0).count();
    println!("  Damaged points:  {broken} / {}", results.damage.len());
    if file.job.export.is_some() {
        println!("  Snapshots:       {}", options.out.display());
    }
    Ok(())
}

/// One thread per core, never more chunks than points.
fn default_threads(n_points: usize) -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(1, n_points.max(1))
}

/// Inspect a snapshot file.
pub fn inspect(path: &Path) -> PeridynResult<()> {
    let snapshot = read_snapshot(path)?;

    println!("=== Snapshot: {} ===", path.display());
    println!("  Step:    {}", snapshot.step);
    println!("  Time:    {:.6e} s", snapshot.time);
    println!("  Points:  {}", snapshot.point_count());

    for (name, data) in &snapshot.fields {
        match data {
            FieldData::Scalar(values) => {
                let (min, max) = values
                    .iter()
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                        (lo.min(v), hi.max(v))
                    });
                let mean = values.iter().sum::<f64>() / values.len().max(1) as f64;
                println!("  {name:<14} min {min:.4e}  max {max:.4e}  mean {mean:.4e}");
            }
            FieldData::Vector(values) => {
                let max_norm = values
                    .iter()
                    .map(|v| (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt())
                    .fold(0.0_f64, f64::max);
                println!("  {name:<14} max |v| {max_norm:.4e}");
            }
        }
    }
    Ok(())
}

/// Validate a job file: parse it, build the body and its bonds, and plan
/// the time integration.
pub fn validate(path: &Path) -> PeridynResult<()> {
    let file = JobFile::load(path)?;
    file.job.validate()?;
    let solver = VelocityVerlet::new(file.time_solver.clone())?;
    let body = file.body()?;

    let mut handler = ThreadsDataHandler::new(&body, 1)?;
    let plan = solver.plan(&mut handler)?;

    println!("Job: {}", path.display());
    println!("  Points:     {}", handler.point_count());
    println!("  Bonds:      {}", handler.bond_count());
    println!("  Point sets: {}", body.cloud().point_sets.len());
    println!("  Step size:  {:.4e} s", plan.stepsize);
    println!("  Steps:      {}", plan.steps);
    println!("  Time:       {:.4e} s", plan.time);
    println!("  Transport:  {:?}", file.job.transport);
    println!("  ✓ Valid");
    Ok(())
}
