// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Action: drive an action's playback from one transform channel of the
//! target and apply the sampled transform to the owner.

use glam::DMat4;

use crate::constraint::registry::ConstraintTypeInfo;
use crate::constraint::target::{first_valid, single_target_info, target_to_matrix};
use crate::constraint::{
    Constraint, ConstraintData, ConstraintOb, ConstraintTarget, ConstraintType, EvalContext,
    OwnerRef, TargetRef, TransformKind,
};
use crate::scene::ActionId;

/// Settings of [`ConstraintType::Action`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActionData {
    /// Object whose transform drives the action.
    pub target: TargetRef,
    /// The action sampled.
    pub action: Option<ActionId>,
    /// Channel of the target read.
    pub transform: TransformKind,
    /// Component of the channel read, 0 to 2.
    pub axis: usize,
    /// First frame of the action range.
    pub start: f32,
    /// Last frame of the action range.
    pub end: f32,
    /// Channel value mapped to `start`.
    pub min: f64,
    /// Channel value mapped to `end`.
    pub max: f64,
}

impl ActionData {
    /// Frame of the action for a channel value.
    #[must_use]
    pub fn frame_for(&self, value: f64) -> f32 {
        let range = self.max - self.min;
        let s = if range == 0.0 {
            0.0
        } else {
            ((value - self.min) / range).clamp(0.0, 1.0)
        };
        self.start + (s as f32) * (self.end - self.start)
    }
}

pub(crate) const INFO: ConstraintTypeInfo = {
    let mut info = single_target_info(ConstraintType::Action, "ActionData");
    info.get_target_matrix = Some(get_target_matrix);
    info.evaluate = Some(evaluate);
    info
};

fn get_target_matrix(
    con: &Constraint,
    cob: &ConstraintOb,
    ct: &mut ConstraintTarget,
    ctx: &EvalContext<'_>,
) {
    ct.matrix = DMat4::IDENTITY;
    let ConstraintData::Action(d) = &con.data else {
        return;
    };
    let (Some(target), Some(action)) = (ct.object, d.action) else {
        return;
    };
    let tar = target_to_matrix(
        ctx.scene,
        &ctx.providers,
        target,
        &ct.subtarget,
        ct.space,
        con.head_tail,
    );
    let value = d.transform.read(&tar)[d.axis.min(2)];
    let frame = d.frame_for(value);
    let channel = match cob.owner {
        OwnerRef::Bone(ob, idx) => ctx
            .scene
            .object(ob)
            .and_then(|o| o.pose.as_ref())
            .and_then(|p| p.channel(idx))
            .map(|c| c.name.as_str()),
        OwnerRef::Object(_) => None,
    };
    if let Some(m) = ctx.providers.anim.sample_action(action, channel, frame) {
        ct.matrix = m;
    }
}

fn evaluate(
    _con: &mut Constraint,
    cob: &mut ConstraintOb,
    targets: &[ConstraintTarget],
    _ctx: &EvalContext<'_>,
) {
    if let Some(ct) = first_valid(targets) {
        cob.matrix *= ct.matrix;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{ConstraintSpace, TargetKind};
    use crate::provider::{AnimEvaluator, Providers};
    use crate::scene::{Object, ObjectKind, Scene};
    use crate::transform::MatrixExt;
    use glam::DVec3;

    /// Moves along +Z by the frame number.
    struct Ramp;

    impl AnimEvaluator for Ramp {
        fn sample_action(&self, _action: ActionId, channel: Option<&str>, time: f32) -> Option<DMat4> {
            assert!(channel.is_none());
            Some(DMat4::from_translation(DVec3::new(0.0, 0.0, f64::from(time))))
        }
    }

    #[test]
    fn frame_mapping_clamps() {
        let d = ActionData {
            start: 1.0,
            end: 21.0,
            min: 0.0,
            max: 2.0,
            ..ActionData::default()
        };
        assert_eq!(d.frame_for(1.0), 11.0);
        assert_eq!(d.frame_for(5.0), 21.0);
        assert_eq!(d.frame_for(-1.0), 1.0);
        let flat = ActionData { start: 3.0, ..ActionData::default() };
        assert_eq!(flat.frame_for(9.0), 3.0);
    }

    #[test]
    fn target_location_drives_action() {
        let mut scene = Scene::new();
        let mut driver = Object::new("Driver", ObjectKind::Empty);
        driver.world = DMat4::from_translation(DVec3::new(0.5, 0.0, 0.0));
        let driver = scene.add_object(driver);
        let owner = scene.add_object(Object::new("Owner", ObjectKind::Empty));
        let ramp = Ramp;
        let ctx = EvalContext {
            scene: &scene,
            providers: Providers::none().with_anim(&ramp),
            time: 0.0,
        };
        let con = Constraint::new(ConstraintData::Action(ActionData {
            target: TargetRef::object(driver),
            action: Some(ActionId(1)),
            transform: TransformKind::Location,
            axis: 0,
            start: 0.0,
            end: 10.0,
            min: 0.0,
            max: 1.0,
        }));
        let cob = ConstraintOb {
            owner: OwnerRef::Object(owner),
            matrix: DMat4::IDENTITY,
            start_matrix: DMat4::IDENTITY,
        };
        let mut ct = ConstraintTarget::new(
            &TargetRef::object(driver),
            ConstraintSpace::World,
            TargetKind::Object,
        );
        get_target_matrix(&con, &cob, &mut ct, &ctx);
        assert!((ct.matrix.translation() - DVec3::new(0.0, 0.0, 5.0)).length() < 1e-6);

        let mut con = con;
        let mut cob = cob;
        cob.matrix = DMat4::from_rotation_x(core::f64::consts::FRAC_PI_2);
        evaluate(&mut con, &mut cob, &[ct], &ctx);
        // Applied in the owner's frame: +Z becomes -Y after the X rotation.
        assert!((cob.matrix.translation() - DVec3::new(0.0, -5.0, 0.0)).length() < 1e-6);
    }
}
