// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transformation: map a range of one target channel onto a range of one
//! owner channel.

use glam::DVec3;

use crate::constraint::registry::ConstraintTypeInfo;
use crate::constraint::target::{first_valid, single_target_info};
use crate::constraint::{
    Constraint, ConstraintData, ConstraintOb, ConstraintTarget, ConstraintType, EvalContext,
    TargetRef, TransformKind,
};
use crate::transform::{MatrixExt, loc_euler_size};

/// Settings of [`ConstraintType::Transform`]. Rotation ranges are in
/// radians.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransformData {
    /// Object read.
    pub target: TargetRef,
    /// Channel of the target read.
    pub from: TransformKind,
    /// Channel of the owner written.
    pub to: TransformKind,
    /// For each owner component, the source component it follows.
    pub map: [usize; 3],
    /// Let values outside the source range extrapolate.
    pub extrapolate: bool,
    /// Source range start.
    pub from_min: DVec3,
    /// Source range end.
    pub from_max: DVec3,
    /// Destination range start.
    pub to_min: DVec3,
    /// Destination range end.
    pub to_max: DVec3,
}

pub(crate) const INFO: ConstraintTypeInfo = {
    let mut info = single_target_info(ConstraintType::Transform, "TransformData");
    info.new_data = Some(new_data);
    info.evaluate = Some(evaluate);
    info
};

fn new_data(data: &mut ConstraintData) {
    if let ConstraintData::Transform(d) = data {
        d.map = [0, 1, 2];
    }
}

/// Position of `value` in each source range, `0..=1` unless extrapolating.
fn range_fractions(d: &TransformData, value: DVec3) -> DVec3 {
    let value = if d.extrapolate {
        value
    } else {
        value.clamp(d.from_min.min(d.from_max), d.from_max.max(d.from_min))
    };
    let mut s = DVec3::ZERO;
    for i in 0..3 {
        let range = d.from_max[i] - d.from_min[i];
        if range != 0.0 {
            s[i] = (value[i] - d.from_min[i]) / range;
        }
    }
    s
}

fn evaluate(
    con: &mut Constraint,
    cob: &mut ConstraintOb,
    targets: &[ConstraintTarget],
    _ctx: &EvalContext<'_>,
) {
    let ConstraintData::Transform(d) = &con.data else {
        return;
    };
    let Some(ct) = first_valid(targets) else {
        return;
    };
    let s = range_fractions(d, d.from.read(&ct.matrix));
    let mapped = |i: usize| d.to_min[i] + s[d.map[i].min(2)] * (d.to_max[i] - d.to_min[i]);

    let mut loc = cob.matrix.translation();
    let mut eul = cob.matrix.euler();
    let mut size = cob.matrix.size();
    for i in 0..3 {
        match d.to {
            TransformKind::Scale => size[i] = mapped(i),
            TransformKind::Rotation => eul[i] = mapped(i),
            TransformKind::Location => loc[i] += mapped(i),
        }
    }
    cob.matrix = loc_euler_size(loc, eul, size);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::kinds::testing::{TARGET, run};
    use crate::scene::Scene;
    use glam::DMat4;

    fn mapping(from: TransformKind, to: TransformKind) -> TransformData {
        let mut data = ConstraintData::Transform(TransformData {
            target: TargetRef::object(TARGET),
            from,
            to,
            from_max: DVec3::splat(1.0),
            to_max: DVec3::splat(2.0),
            ..TransformData::default()
        });
        new_data(&mut data);
        let ConstraintData::Transform(d) = data else { unreachable!() };
        d
    }

    #[test]
    fn location_drives_scale() {
        let scene = Scene::new();
        let mut con = Constraint::new(ConstraintData::Transform(mapping(
            TransformKind::Location,
            TransformKind::Scale,
        )));
        let target = DMat4::from_translation(DVec3::new(0.5, 0.25, 3.0));
        let out = run(&mut con, &scene, &[target], DMat4::IDENTITY);
        assert!((out.size() - DVec3::new(1.0, 0.5, 2.0)).length() < 1e-12);
    }

    #[test]
    fn extrapolation_passes_range() {
        let mut d = mapping(TransformKind::Location, TransformKind::Location);
        assert_eq!(range_fractions(&d, DVec3::splat(3.0)), DVec3::splat(1.0));
        d.extrapolate = true;
        assert_eq!(range_fractions(&d, DVec3::splat(3.0)), DVec3::splat(3.0));
    }

    #[test]
    fn location_is_added_and_axes_remapped() {
        let scene = Scene::new();
        let mut data = mapping(TransformKind::Location, TransformKind::Location);
        data.map = [2, 0, 1];
        let mut con = Constraint::new(ConstraintData::Transform(data));
        let target = DMat4::from_translation(DVec3::new(0.5, 0.0, 1.0));
        let owner = DMat4::from_translation(DVec3::new(1.0, 1.0, 1.0));
        let out = run(&mut con, &scene, &[target], owner);
        assert!((out.translation() - DVec3::new(3.0, 2.0, 1.0)).length() < 1e-12);
    }

    #[test]
    fn empty_source_range_maps_to_start() {
        let mut d = mapping(TransformKind::Scale, TransformKind::Rotation);
        d.from_max = DVec3::ZERO;
        assert_eq!(range_fractions(&d, DVec3::splat(0.7)), DVec3::ZERO);
    }
}
