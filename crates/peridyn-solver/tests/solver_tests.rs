//! Integration tests for peridyn-solver.

use std::sync::{Arc, Mutex};

use approx::assert_relative_eq;
use peridyn_decomp::ExchangeDirection;
use peridyn_io::{
    read_snapshot, ExportField, ExportOptions, JsonSnapshotWriter, Snapshot, SnapshotWriter,
};
use peridyn_material::{BondBasedMaterial, CorrespondenceMaterial, HaloField, Material, MaterialProperties};
use peridyn_math::DVec3;
use peridyn_mesh::generators::{point_line, uniform_box};
use peridyn_solver::{
    Body, ChannelWorld, DataHandler, DistributedDataHandler, Job, JobConfig, Partition,
    ThreadsDataHandler, TimeSolverConfig, Transport, VelocityVerlet,
};
use peridyn_telemetry::{EventBus, EventKind, VecSink};
use peridyn_types::PeridynError;

fn two_point_body() -> Body {
    let cloud = point_line(2, 1.0, 1.0);
    let mut body = Body::new(Material::BondBased(BondBasedMaterial), cloud).unwrap();
    body.material_properties(MaterialProperties::new(1.5, 1.0, 1.0).with_fracture_energy(1.0))
        .unwrap();
    body
}

fn steel_block(material: Material) -> Body {
    let dx = 0.0625;
    let cloud = uniform_box(0.5, 0.25, 0.25, dx);
    let mut body = Body::new(material, cloud).unwrap();
    body.material_properties(
        MaterialProperties::new(3.015 * dx, 7850.0, 210e9)
            .with_poisson_ratio(0.25)
            .with_fracture_energy(1000.0),
    )
    .unwrap();
    body.point_set_where("right", |p| p.x > 0.4);
    body.velocity_ic("right", DVec3::new(2.0, 0.5, 0.0)).unwrap();
    body
}

/// Collects snapshots into a buffer the test keeps a handle to.
#[derive(Clone, Default)]
struct SharedWriter(Arc<Mutex<Vec<Snapshot>>>);

impl SnapshotWriter for SharedWriter {
    fn write(&mut self, snapshot: &Snapshot) -> peridyn_types::PeridynResult<()> {
        self.0.lock().unwrap().push(snapshot.clone());
        Ok(())
    }
}

// ─── TimeSolverConfig Tests ───────────────────────────────────

#[test]
fn time_and_steps_are_exclusive() {
    let mut both = TimeSolverConfig::with_steps(10);
    both.time = Some(1.0);
    assert!(matches!(both.validate(), Err(PeridynError::InvalidConfig(_))));

    let mut neither = TimeSolverConfig::with_steps(10);
    neither.steps = None;
    assert!(matches!(neither.validate(), Err(PeridynError::InvalidConfig(_))));

    assert!(TimeSolverConfig::with_steps(0).validate().is_err());
    assert!(TimeSolverConfig::with_time(-1.0).validate().is_err());
    assert!(VelocityVerlet::new(both).is_err());
}

#[test]
fn safety_factor_must_be_in_unit_interval() {
    assert!(TimeSolverConfig::with_steps(1).safety_factor(0.0).validate().is_err());
    assert!(TimeSolverConfig::with_steps(1).safety_factor(1.1).validate().is_err());
    assert!(TimeSolverConfig::with_steps(1).safety_factor(1.0).validate().is_ok());
    assert!(TimeSolverConfig::with_steps(1).stepsize(0.0).validate().is_err());
    assert!(TimeSolverConfig::with_steps(1)
        .timestep_update_interval(0)
        .validate()
        .is_err());
}

#[test]
fn time_and_steps_round_trip() {
    let dt = 1.234e-7;
    for steps in [1, 7, 100, 12345] {
        let (n, time) = TimeSolverConfig::with_steps(steps).resolve(dt).unwrap();
        assert_eq!(n, steps);
        let (back, t) = TimeSolverConfig::with_time(time).resolve(dt).unwrap();
        assert_eq!(back, steps);
        assert_eq!(t, time);
    }
    let (n, _) = TimeSolverConfig::with_time(10.5 * dt).resolve(dt).unwrap();
    assert_eq!(n, 10);
    assert!((n as f64 * dt - 10.5 * dt).abs() < dt);
}

#[test]
fn time_shorter_than_one_step_rejected() {
    assert!(TimeSolverConfig::with_time(1e-9).resolve(1e-6).is_err());
}

#[test]
fn config_from_json_uses_default_safety_factor() {
    let config: TimeSolverConfig = serde_json::from_str(r#"{"steps": 50}"#).unwrap();
    assert_eq!(config.steps, Some(50));
    assert_relative_eq!(config.safety_factor, 0.7);
    config.validate().unwrap();
}

// ─── Stable Step Tests ────────────────────────────────────────

#[test]
fn two_point_stable_step_matches_formula() {
    let body = two_point_body();
    let mut handler = ThreadsDataHandler::new(&body, 1).unwrap();
    // K = E / (3(1 - 2ν)), c = 18K / (πδ⁴), Δt = sqrt(2ρ / (V c / L)).
    let k = 1.0 / (3.0 * (1.0 - 2.0 * 0.25));
    let c = 18.0 * k / (std::f64::consts::PI * 1.5f64.powi(4));
    let expected = (2.0 / c).sqrt();
    assert_relative_eq!(handler.stable_timestep(1.0).unwrap(), expected, max_relative = 1e-12);
    assert_relative_eq!(handler.stable_timestep(0.7).unwrap(), 0.7 * expected, max_relative = 1e-12);
}

#[test]
fn stable_step_monotone_in_safety_factor() {
    let body = steel_block(Material::default());
    let mut handler = ThreadsDataHandler::new(&body, 2).unwrap();
    let mut last = 0.0;
    for sf in [0.1, 0.3, 0.5, 0.7, 0.9, 1.0] {
        let dt = handler.stable_timestep(sf).unwrap();
        assert!(dt >= last);
        last = dt;
    }
}

#[test]
fn doubling_stiffness_does_not_increase_step() {
    let soft = steel_block(Material::default());
    let mut stiff = soft.clone();
    stiff
        .material_properties(
            MaterialProperties::new(3.015 * 0.0625, 7850.0, 420e9).with_fracture_energy(1000.0),
        )
        .unwrap();
    let dt_soft = ThreadsDataHandler::new(&soft, 1).unwrap().stable_timestep(1.0).unwrap();
    let dt_stiff = ThreadsDataHandler::new(&stiff, 1).unwrap().stable_timestep(1.0).unwrap();
    assert!(dt_stiff <= dt_soft);
    assert_relative_eq!(dt_soft / dt_stiff, 2f64.sqrt(), max_relative = 1e-12);
}

#[test]
fn unbonded_body_aborts_with_numeric_failure() {
    let cloud = point_line(2, 1.0, 1.0);
    let mut body = Body::new(Material::BondBased(BondBasedMaterial), cloud).unwrap();
    body.material_properties(MaterialProperties::new(0.5, 1.0, 1.0)).unwrap();
    let solver = VelocityVerlet::new(TimeSolverConfig::with_steps(3)).unwrap();
    let job = Job::new(body, solver);
    assert!(matches!(job.run(), Err(PeridynError::NumericFailure(_))));
}

// ─── Body Tests ───────────────────────────────────────────────

#[test]
fn body_without_properties_rejected() {
    let body = Body::new(Material::default(), point_line(3, 1.0, 1.0)).unwrap();
    assert!(matches!(body.parameters(), Err(PeridynError::InvalidMaterial(_))));
}

#[test]
fn point_set_properties_override_default() {
    let mut body = Body::new(Material::default(), point_line(4, 1.0, 1.0)).unwrap();
    body.material_properties(MaterialProperties::new(1.5, 1.0, 1.0)).unwrap();
    body.point_set("tip", vec![3]).unwrap();
    body.set_material_properties("tip", MaterialProperties::new(1.5, 2.0, 5.0))
        .unwrap();
    let params = body.parameters().unwrap();
    assert_eq!(params.get(0).rho, 1.0);
    assert_eq!(params.get(3).rho, 2.0);
    assert_eq!(params.get(3).youngs_modulus, 5.0);
}

#[test]
fn mixed_horizons_unsupported() {
    let mut body = Body::new(Material::default(), point_line(4, 1.0, 1.0)).unwrap();
    body.material_properties(MaterialProperties::new(1.5, 1.0, 1.0)).unwrap();
    body.point_set("tip", vec![3]).unwrap();
    body.set_material_properties("tip", MaterialProperties::new(2.5, 1.0, 1.0))
        .unwrap();
    assert!(matches!(body.parameters(), Err(PeridynError::Unsupported(_))));
}

#[test]
fn no_failure_clears_bond_permission() {
    let mut body = two_point_body();
    body.point_set("left", vec![0]).unwrap();
    body.no_failure("left").unwrap();
    let params = body.parameters().unwrap();
    let system = body.bond_system(&params).unwrap();
    assert!(system.bonds.iter().all(|b| !b.fail_permit));
}

#[test]
fn unknown_point_set_rejected() {
    let mut body = two_point_body();
    assert!(body.velocity_ic("nope", DVec3::X).is_err());
    assert!(body.no_failure("nope").is_err());
    assert!(body.forcedensity_bc("all", DVec3::splat(f64::NAN)).is_err());
}

// ─── Scenario Tests ───────────────────────────────────────────

#[test]
fn two_points_at_rest_stay_in_equilibrium() {
    let body = two_point_body();
    let solver = VelocityVerlet::new(TimeSolverConfig::with_steps(20)).unwrap();

    let mut handler = ThreadsDataHandler::new(&body, 1).unwrap();
    let chunk = &handler.chunks()[0];
    assert_eq!(chunk.storage.position[0], DVec3::ZERO);
    assert_eq!(chunk.storage.position[1], DVec3::X);

    let plan = solver.plan(&mut handler).unwrap();
    assert_eq!(plan.steps, 20);
    for _ in 0..plan.steps {
        solver.step(&mut handler, plan.stepsize).unwrap();
    }
    let chunk = &handler.chunks()[0];
    assert_eq!(chunk.storage.velocity, vec![DVec3::ZERO; 2]);
    assert_eq!(chunk.storage.position[1], DVec3::X);
    assert_eq!(chunk.storage.n_active_bonds, vec![1, 1]);

    let results = Job::new(body, solver).run().unwrap();
    assert_eq!(results.velocity, vec![DVec3::ZERO; 2]);
    assert_eq!(results.damage, vec![0.0, 0.0]);
    assert_eq!(results.summary.steps, 20);
}

#[test]
fn overstretched_bond_fails_on_both_endpoints() {
    let cloud = point_line(2, 1.0, 1.0);
    let mut body = Body::new(Material::BondBased(BondBasedMaterial), cloud).unwrap();
    body.material_properties(MaterialProperties::new(1.5, 1.0, 1.0).with_critical_stretch(0.01))
        .unwrap();
    let mut handler = ThreadsDataHandler::new(&body, 2).unwrap();

    handler
        .for_each_chunk(|chunk| {
            if let Some(l) = chunk.handler.local(1).filter(|&l| chunk.handler.is_owned(l)) {
                chunk.storage.position[l] = DVec3::new(1.05, 0.0, 0.0);
            }
            Ok(())
        })
        .unwrap();
    handler.exchange(HaloField::Position, ExchangeDirection::LocToHalo).unwrap();
    handler
        .for_each_chunk(|chunk| {
            chunk.compute_force_density();
            chunk.update_damage();
            Ok(())
        })
        .unwrap();

    for chunk in handler.chunks() {
        assert_eq!(chunk.storage.n_active_bonds, vec![0]);
        assert_eq!(chunk.storage.bond_active, vec![false]);
        assert_eq!(chunk.storage.damage, vec![1.0]);
        assert_eq!(chunk.storage.b_int[0], DVec3::ZERO);
    }
}

#[test]
fn separating_points_end_fully_damaged() {
    let cloud = point_line(2, 1.0, 1.0);
    let mut body = Body::new(Material::BondBased(BondBasedMaterial), cloud).unwrap();
    body.material_properties(MaterialProperties::new(1.5, 1.0, 1.0).with_critical_stretch(0.01))
        .unwrap();
    body.point_set("right", vec![1]).unwrap();
    body.velocity_ic("right", DVec3::X).unwrap();
    let solver = VelocityVerlet::new(TimeSolverConfig::with_steps(5).stepsize(0.1)).unwrap();
    let results = Job::new(body, solver).run().unwrap();
    assert_eq!(results.damage, vec![1.0, 1.0]);
    assert_relative_eq!(results.displacement[1].x, 0.5, max_relative = 1e-12);
    assert_eq!(results.summary.max_damage, 1.0);
}

#[test]
fn external_force_accelerates_free_point() {
    let cloud = point_line(2, 10.0, 1.0);
    let mut body = Body::new(Material::BondBased(BondBasedMaterial), cloud).unwrap();
    body.material_properties(MaterialProperties::new(1.5, 2.0, 1.0)).unwrap();
    body.forcedensity_bc("all", DVec3::new(0.0, 0.0, 4.0)).unwrap();
    let solver = VelocityVerlet::new(TimeSolverConfig::with_steps(10).stepsize(0.01)).unwrap();
    let results = Job::new(body, solver).run().unwrap();
    // a = b / ρ = 2: v = a t, u = a t² / 2.
    assert_relative_eq!(results.velocity[0].z, 0.2, max_relative = 1e-12);
    assert_relative_eq!(results.displacement[1].z, 0.01, max_relative = 1e-9);
    assert_eq!(results.displacement[0].x, 0.0);
}

#[test]
fn three_chunk_exchange_updates_halo_copy() {
    let cloud = point_line(9, 1.0, 1.0);
    let mut body = Body::new(Material::BondBased(BondBasedMaterial), cloud).unwrap();
    body.material_properties(MaterialProperties::new(1.5, 1.0, 1.0)).unwrap();
    let mut handler = ThreadsDataHandler::new(&body, 3).unwrap();
    let moved = DVec3::new(5.25, 0.125, -0.5);

    let owner = handler
        .chunks()
        .iter()
        .position(|c| c.handler.loc_points().contains(&5))
        .unwrap();
    let reader = handler
        .chunks()
        .iter()
        .position(|c| c.handler.halo_points().contains(&5))
        .unwrap();
    assert_ne!(owner, reader);

    handler
        .for_each_chunk(move |chunk| {
            if let Some(l) = chunk.handler.local(5).filter(|&l| chunk.handler.is_owned(l)) {
                chunk.storage.position[l] = moved;
            }
            Ok(())
        })
        .unwrap();
    handler.exchange(HaloField::Position, ExchangeDirection::LocToHalo).unwrap();

    let chunks = handler.chunks();
    let owned = chunks[owner].storage.position[chunks[owner].handler.local(5).unwrap()];
    let halo = chunks[reader].storage.position[chunks[reader].handler.local(5).unwrap()];
    assert_eq!(owned, moved);
    assert_eq!(halo, owned);
}

#[test]
fn force_halo_contributions_reach_owner() {
    let body = steel_block(Material::default());
    let mut one = ThreadsDataHandler::new(&body, 1).unwrap();
    let mut four = ThreadsDataHandler::new(&body, 4).unwrap();
    let solver = VelocityVerlet::new(TimeSolverConfig::with_steps(1).stepsize(1e-7)).unwrap();
    for _ in 0..3 {
        solver.step(&mut one, 1e-7).unwrap();
        solver.step(&mut four, 1e-7).unwrap();
    }
    let reference = one.gather(&[ExportField::BInt]).unwrap().unwrap();
    let split = four.gather(&[ExportField::BInt]).unwrap().unwrap();
    let (peridyn_io::FieldData::Vector(a), peridyn_io::FieldData::Vector(b)) =
        (&reference["b_int"], &split["b_int"])
    else {
        panic!("b_int must be a vector field");
    };
    let scale = a.iter().flatten().fold(0.0f64, |m, v| m.max(v.abs()));
    assert!(scale > 0.0);
    for (x, y) in a.iter().flatten().zip(b.iter().flatten()) {
        assert!((x - y).abs() <= 1e-9 * scale, "{x} vs {y}");
    }
}

#[test]
fn bond_based_results_independent_of_chunk_count() {
    let run = |n_chunks| {
        let solver = VelocityVerlet::new(TimeSolverConfig::with_steps(8)).unwrap();
        Job::new(steel_block(Material::BondBased(BondBasedMaterial)), solver)
            .with_config(JobConfig {
                transport: Transport::Threads { n_chunks },
                ..JobConfig::default()
            })
            .run()
            .unwrap()
    };
    let one = run(1);
    let five = run(5);
    assert_eq!(one.position, five.position);
    assert_eq!(one.velocity, five.velocity);
}

// ─── Transport Tests ──────────────────────────────────────────

#[test]
fn threads_and_distributed_trajectories_identical() {
    let run = |transport| {
        let solver = VelocityVerlet::new(TimeSolverConfig::with_steps(10)).unwrap();
        Job::new(steel_block(Material::Correspondence(CorrespondenceMaterial::default())), solver)
            .with_config(JobConfig {
                transport,
                quiet: true,
                export: None,
            })
            .run()
            .unwrap()
    };
    let threads = run(Transport::Threads { n_chunks: 3 });
    let distributed = run(Transport::Distributed { n_ranks: 3 });

    assert_eq!(threads.summary.transport, "threads");
    assert_eq!(distributed.summary.transport, "distributed");
    assert_eq!(threads.summary.stepsize, distributed.summary.stepsize);
    assert_eq!(threads.summary.kinetic_energy, distributed.summary.kinetic_energy);
    assert_eq!(threads.position, distributed.position);
    assert_eq!(threads.displacement, distributed.displacement);
    assert_eq!(threads.velocity, distributed.velocity);
    assert_eq!(threads.damage, distributed.damage);
    assert!(threads.summary.kinetic_energy > 0.0);
}

#[test]
fn rank_count_must_match_decomposition() {
    let body = two_point_body();
    let partition = Partition::new(&body, 2).unwrap();
    let mut comms = ChannelWorld::create(3);
    let result = DistributedDataHandler::new(&mut comms[0], &body, &partition);
    assert!(matches!(result, Err(PeridynError::Transport(_))));
}

#[test]
fn distributed_reductions_agree_on_every_rank() {
    let body = steel_block(Material::default());
    let partition = Partition::new(&body, 4).unwrap();
    let minima = ChannelWorld::run(4, |comm| {
        let mut handler = DistributedDataHandler::new(comm, &body, &partition)?;
        handler.stable_timestep(0.7)
    })
    .unwrap();
    assert!(minima.iter().all(|&dt| dt == minima[0]));

    let mut threads = ThreadsDataHandler::from_partition(&body, partition).unwrap();
    assert_eq!(threads.stable_timestep(0.7).unwrap(), minima[0]);
}

#[test]
fn failing_rank_aborts_world() {
    let result = ChannelWorld::run(3, |comm| {
        use peridyn_solver::Communicator;
        if comm.rank() == 1 {
            return Err(PeridynError::InvalidConfig("rank 1 gave up".into()));
        }
        comm.recv(1, 7)
    });
    assert!(matches!(result, Err(PeridynError::InvalidConfig(_))));
}

// ─── Job Tests ────────────────────────────────────────────────

#[test]
fn multibody_job_unsupported() {
    let solver = VelocityVerlet::new(TimeSolverConfig::with_steps(1)).unwrap();
    let job = Job::multibody(vec![two_point_body(), two_point_body()], solver);
    assert!(matches!(job.run(), Err(PeridynError::Unsupported(_))));
}

#[test]
fn export_without_writer_rejected() {
    let solver = VelocityVerlet::new(TimeSolverConfig::with_steps(1)).unwrap();
    let job = Job::new(two_point_body(), solver).with_config(JobConfig {
        transport: Transport::Threads { n_chunks: 1 },
        quiet: true,
        export: Some(ExportOptions::every(1)),
    });
    assert!(matches!(job.run(), Err(PeridynError::InvalidConfig(_))));
}

#[test]
fn zero_chunks_rejected() {
    let solver = VelocityVerlet::new(TimeSolverConfig::with_steps(1)).unwrap();
    let job = Job::new(two_point_body(), solver).with_config(JobConfig {
        transport: Transport::Distributed { n_ranks: 0 },
        ..JobConfig::default()
    });
    assert!(matches!(job.run(), Err(PeridynError::InvalidConfig(_))));
}

#[test]
fn snapshots_follow_export_frequency() {
    for transport in [Transport::Threads { n_chunks: 2 }, Transport::Distributed { n_ranks: 2 }] {
        let solver = VelocityVerlet::new(TimeSolverConfig::with_steps(6)).unwrap();
        let writer = SharedWriter::default();
        let job = Job::new(steel_block(Material::default()), solver).with_config(JobConfig {
            transport,
            quiet: true,
            export: Some(ExportOptions::every(3).with_fields(vec![
                ExportField::Displacement,
                ExportField::Damage,
            ])),
        });
        let results = job.run_with(None, Some(Box::new(writer.clone()))).unwrap();

        let snapshots = writer.0.lock().unwrap();
        let steps: Vec<usize> = snapshots.iter().map(|s| s.step).collect();
        assert_eq!(steps, vec![0, 3, 6]);
        let last = &snapshots[2];
        assert_eq!(last.point_count(), results.position.len());
        match last.field(ExportField::Displacement) {
            Some(peridyn_io::FieldData::Vector(u)) => {
                let u: Vec<DVec3> = u.iter().copied().map(DVec3::from_array).collect();
                assert_eq!(u, results.displacement);
            }
            other => panic!("unexpected displacement field {other:?}"),
        }
        assert!(last.field(ExportField::Velocity).is_none());
    }
}

#[test]
fn json_export_writes_one_file_per_snapshot() {
    let dir = std::env::temp_dir().join(format!("peridyn-solver-export-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    let writer = JsonSnapshotWriter::new(&dir, "pair").unwrap();
    let solver = VelocityVerlet::new(TimeSolverConfig::with_steps(4)).unwrap();
    let job = Job::new(two_point_body(), solver).with_config(JobConfig {
        transport: Transport::Threads { n_chunks: 1 },
        quiet: true,
        export: Some(ExportOptions::every(2)),
    });
    job.run_with(None, Some(Box::new(writer))).unwrap();

    for step in [0, 2, 4] {
        let snap = read_snapshot(&dir.join(format!("pair_{step}.json"))).unwrap();
        assert_eq!(snap.step, step);
        assert_eq!(snap.point_ids, vec![0, 1]);
    }
    assert!(!dir.join("pair_1.json").exists());
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn telemetry_reports_every_step() {
    let mut bus = EventBus::new();
    let sink = VecSink::new();
    bus.add_sink(Box::new(sink.clone()));
    let solver = VelocityVerlet::new(TimeSolverConfig::with_steps(4)).unwrap();
    Job::new(two_point_body(), solver)
        .with_config(JobConfig {
            transport: Transport::Distributed { n_ranks: 2 },
            quiet: true,
            export: None,
        })
        .run_with(Some(&mut bus), None)
        .unwrap();

    let events = sink.events();
    assert!(matches!(
        events.first().map(|e| &e.kind),
        Some(EventKind::JobStart { chunks: 2, steps: 4, .. })
    ));
    let step_ends = events
        .iter()
        .filter(|e| matches!(e.kind, EventKind::TimestepEnd { .. }))
        .count();
    assert_eq!(step_ends, 4);
    assert!(matches!(
        events.last().map(|e| &e.kind),
        Some(EventKind::JobEnd { steps: 4, .. })
    ));
}

#[test]
fn stepsize_update_interval_recomputes_step() {
    let cloud = point_line(2, 1.0, 1.0);
    let mut body = Body::new(Material::BondBased(BondBasedMaterial), cloud).unwrap();
    body.material_properties(MaterialProperties::new(1.5, 1.0, 1.0).with_critical_stretch(0.01))
        .unwrap();
    let config = TimeSolverConfig::with_steps(4).timestep_update_interval(2);
    let solver = VelocityVerlet::new(config).unwrap();
    let results = Job::new(body, solver).run().unwrap();
    assert_eq!(results.summary.steps, 4);
    assert_relative_eq!(results.summary.time, 4.0 * results.summary.stepsize, max_relative = 1e-12);
}

#[test]
fn stepsize_update_keeps_step_once_all_bonds_broke() {
    let cloud = point_line(2, 1.0, 1.0);
    let mut body = Body::new(Material::BondBased(BondBasedMaterial), cloud).unwrap();
    body.material_properties(MaterialProperties::new(1.5, 1.0, 1.0).with_critical_stretch(0.01))
        .unwrap();
    body.point_set("right", vec![1]).unwrap();
    body.velocity_ic("right", DVec3::X).unwrap();

    let config = TimeSolverConfig::with_steps(20).timestep_update_interval(2);
    let solver = VelocityVerlet::new(config).unwrap();
    let mut handler = ThreadsDataHandler::new(&body, 1).unwrap();
    let planned = solver.plan(&mut handler).unwrap();

    let results = Job::new(body, solver).run().unwrap();
    assert_eq!(results.summary.steps, 20);
    assert_eq!(results.damage, vec![1.0, 1.0]);
    assert_eq!(results.summary.stepsize, planned.stepsize);
    assert_relative_eq!(results.summary.time, 20.0 * planned.stepsize, max_relative = 1e-12);
}
