// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Small rig that exercises sorting, flushing, and solving.
//!
//! Builds a leg armature whose foot reaches for an animated goal through an
//! IK constraint, plus a lamp that tracks the goal. The scene is sorted
//! once, then every frame the goal is moved, recalc flags are flushed, and
//! the flagged objects are solved. Graph passes are printed with a
//! [`PrettyPrintSink`](rigsolve_debug::pretty::PrettyPrintSink); solver
//! events are collected and summarized. The dependency graph is written to
//! `rig_graph.json`.
//!
//! Run with `RUST_LOG=debug` to see the core's diagnostics.

use std::error::Error;
use std::fs::File;
use std::io::BufWriter;

use glam::{DMat4, DVec3};

use rigsolve_core::config::{BuildConfig, LayoutConfig};
use rigsolve_core::constraint::{ConstraintData, ConstraintRegistry, ConstraintType, add_constraint_to_stack};
use rigsolve_core::eval::update_scene;
use rigsolve_core::graph::{build_dependency_graph, mark_object_dirty_and_flush, sort_pose, topologically_sort_scene};
use rigsolve_core::provider::{IkChain, IkSolver, Providers};
use rigsolve_core::recalc::{LayerMask, RecalcFlags};
use rigsolve_core::scene::{Bone, Object, ObjectKind, Pose, Scene};
use rigsolve_core::trace::Tracer;
use rigsolve_core::transform::{MatrixExt, TrackAxis, UpAxis, rotation_between};

use rigsolve_debug::collect::CollectingSink;
use rigsolve_debug::pretty::PrettyPrintSink;

const FRAME_COUNT: u32 = 24;

/// Cyclic coordinate descent, enough to make the demo move.
#[derive(Debug)]
struct CcdSolver;

impl IkSolver for CcdSolver {
    fn solve_chain(&mut self, chain: &mut IkChain<'_>, goal: &DMat4, _pole: Option<&DMat4>) {
        let target = goal.translation();
        let Some(&tip_len) = chain.lengths.last() else {
            return;
        };
        for _ in 0..chain.iterations.clamp(1, 32) {
            for i in (0..chain.pose.len()).rev() {
                let last = chain.pose[chain.pose.len() - 1];
                let tip = last.translation() + last.axis(1).normalize_or_zero() * tip_len;
                let head = chain.pose[i].translation();
                let rot = DMat4::from_mat3(rotation_between(tip - head, target - head));
                let pivot = DMat4::from_translation(head) * rot * DMat4::from_translation(-head);
                for m in &mut chain.pose[i..] {
                    *m = pivot * *m;
                }
            }
            let last = chain.pose[chain.pose.len() - 1];
            let tip = last.translation() + last.axis(1).normalize_or_zero() * tip_len;
            if (tip - target).length() < f64::from(chain.tolerance) {
                break;
            }
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let registry = ConstraintRegistry::builtin();

    // -- scene -------------------------------------------------------------
    let mut scene = Scene::new();
    let goal = scene.add_object(
        Object::new("FootGoal", ObjectKind::Empty).with_location(DVec3::new(0.5, 1.5, 0.0)),
    );
    let mut lamp = Object::new("Lamp", ObjectKind::Lamp).with_location(DVec3::new(4.0, 0.0, 3.0));
    let track = add_constraint_to_stack(registry, &mut lamp.constraints, ConstraintType::TrackTo)?;
    if let ConstraintData::TrackTo(track) = &mut track.data {
        track.target.object = Some(goal);
        track.track = TrackAxis::NegZ;
        track.up = UpAxis::Y;
    }
    let lamp = scene.add_object(lamp);

    let mut pose = Pose::new();
    let thigh = pose.add_channel("thigh", None, Bone::new(DVec3::ZERO, 1.0));
    let shin = pose.add_channel("shin", Some(thigh), Bone::new(DVec3::ZERO, 1.0));
    let foot = pose.add_channel("foot", Some(shin), Bone::new(DVec3::ZERO, 0.25));
    if let Some(ch) = pose.channel_mut(shin) {
        let con = add_constraint_to_stack(registry, &mut ch.constraints, ConstraintType::Kinematic)?;
        if let ConstraintData::Kinematic(ik) = &mut con.data {
            ik.target.object = Some(goal);
            ik.chain_len = 2;
            ik.iterations = 16;
        }
    }
    let rig = scene.add_object(Object::new("Leg", ObjectKind::Armature).with_pose(pose));

    // -- sort --------------------------------------------------------------
    let mut pretty = PrettyPrintSink::new(Box::new(std::io::stdout()));
    let report = topologically_sort_scene(&mut scene, registry, Providers::none(), &mut Tracer::new(&mut pretty));
    let names: Vec<&str> = report
        .order
        .iter()
        .filter_map(|&id| scene.object(id).map(|ob| ob.name.as_str()))
        .collect();
    log::info!("base order: {names:?}");
    let channels = sort_pose(&mut scene, rig, registry);
    log::info!("pose order: {channels:?} (foot is channel {foot})");

    let mut graph = build_dependency_graph(
        &scene,
        registry,
        Providers::none(),
        BuildConfig::complete(),
        &mut Tracer::new(&mut pretty),
    );

    // -- frames ------------------------------------------------------------
    let mut collected = CollectingSink::new();
    let mut ik = CcdSolver;
    for frame in 0..FRAME_COUNT {
        let time = frame as f32;
        let angle = f64::from(time) / f64::from(FRAME_COUNT) * core::f64::consts::TAU;
        if let Some(ob) = scene.object_mut(goal) {
            ob.location = DVec3::new(0.5 + 0.4 * angle.cos(), 1.5, 0.4 * angle.sin());
        }
        let mut tracer = Tracer::new(&mut collected);
        mark_object_dirty_and_flush(
            &mut scene,
            &mut graph,
            goal,
            RecalcFlags::OBJECT,
            LayerMask::ALL,
            &mut tracer,
        );
        let evaluated = update_scene(&mut scene, registry, Providers::none(), &mut ik, time, &mut tracer);

        let tail = scene
            .object(rig)
            .and_then(|ob| ob.pose.as_ref())
            .and_then(|p| p.channel(shin))
            .map_or(DVec3::ZERO, |ch| ch.pose_tail);
        let aim = -scene.object(lamp).map_or(DVec3::ZERO, |ob| ob.world.axis(2));
        println!(
            "frame {frame:2}: evaluated={evaluated} shin tail=({:.3}, {:.3}, {:.3}) lamp aim=({:.3}, {:.3}, {:.3})",
            tail.x, tail.y, tail.z, aim.x, aim.y, aim.z,
        );
    }
    let summaries = collected.summaries().count();
    let blended = collected.summaries().filter(|s| s.blended > 0).count();
    log::info!("{} events, {summaries} stack solves, {blended} blended", collected.len());

    // -- graph export ------------------------------------------------------
    let path = "rig_graph.json";
    let mut writer = BufWriter::new(File::create(path)?);
    rigsolve_debug::graph_json::export(&mut graph, &LayoutConfig::viewer(), &mut writer)?;
    println!("Wrote {path} ({} nodes)", graph.node_count());
    Ok(())
}
