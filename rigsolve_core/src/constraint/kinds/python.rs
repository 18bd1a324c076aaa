// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scripted constraints. Target matrices and the evaluation itself are
//! delegated to the [`ScriptHost`](crate::provider::ScriptHost).

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use glam::DMat4;

use crate::constraint::registry::ConstraintTypeInfo;
use crate::constraint::target::{default_target_matrix, relink_targets, target_kind};
use crate::constraint::{
    Constraint, ConstraintData, ConstraintOb, ConstraintTarget, ConstraintType, EvalContext,
    TargetRef,
};
use crate::scene::{Scene, ScriptId};

/// A user property value.
#[derive(Clone, Debug, PartialEq)]
pub enum PropValue {
    /// Integer.
    Int(i64),
    /// Float.
    Float(f64),
    /// String.
    Str(String),
    /// Nested group.
    Group(PropertyBag),
}

/// Named user properties handed to scripts.
pub type PropertyBag = BTreeMap<String, PropValue>;

/// Settings of [`ConstraintType::Python`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PythonData {
    /// User-managed target list.
    pub targets: Vec<TargetRef>,
    /// The script.
    pub script: Option<ScriptId>,
    /// Properties passed to the script.
    pub props: PropertyBag,
    /// Set when the last evaluation failed.
    pub script_error: bool,
}

pub(crate) const INFO: ConstraintTypeInfo = {
    let mut info = ConstraintTypeInfo::empty(ConstraintType::Python, "PythonData");
    info.free_data = Some(free_data);
    info.relink_data = Some(relink_targets);
    info.copy_data = Some(copy_data);
    info.new_data = Some(new_data);
    info.get_targets = Some(get_targets);
    info.flush_targets = Some(flush_targets);
    info.get_target_matrix = Some(get_target_matrix);
    info.evaluate = Some(evaluate);
    info
};

fn free_data(con: &mut Constraint) {
    if let ConstraintData::Python(d) = &mut con.data {
        d.props.clear();
        d.targets.clear();
    }
}

fn copy_data(dst: &mut Constraint, src: &Constraint) {
    if let (ConstraintData::Python(d), ConstraintData::Python(s)) = (&mut dst.data, &src.data) {
        d.props.clone_from(&s.props);
        d.targets.clone_from(&s.targets);
    }
}

fn new_data(data: &mut ConstraintData) {
    if let ConstraintData::Python(d) = data {
        d.props = PropertyBag::new();
    }
}

fn get_targets(con: &Constraint, scene: &Scene, out: &mut Vec<ConstraintTarget>) -> usize {
    let ConstraintData::Python(d) = &con.data else {
        return 0;
    };
    for t in &d.targets {
        let kind = target_kind(scene, t.object, &t.subtarget);
        out.push(ConstraintTarget::new(t, con.target_space, kind));
    }
    d.targets.len()
}

fn flush_targets(con: &mut Constraint, list: &mut Vec<ConstraintTarget>, discard: bool) {
    if !discard && let ConstraintData::Python(d) = &mut con.data {
        for (t, ct) in d.targets.iter_mut().zip(list.iter()) {
            t.object = ct.object;
            t.subtarget.clone_from(&ct.subtarget);
        }
    }
    list.clear();
}

fn get_target_matrix(
    con: &Constraint,
    cob: &ConstraintOb,
    ct: &mut ConstraintTarget,
    ctx: &EvalContext<'_>,
) {
    let ConstraintData::Python(d) = &con.data else {
        ct.matrix = DMat4::IDENTITY;
        return;
    };
    if ct.object.is_none() {
        ct.matrix = DMat4::IDENTITY;
        return;
    }
    default_target_matrix(con, cob, ct, ctx);
    if let Some(script) = d.script
        && let Some(m) = ctx.providers.scripts.target_matrix(script, &d.props, ct)
    {
        ct.matrix = m;
    }
}

fn evaluate(
    con: &mut Constraint,
    cob: &mut ConstraintOb,
    targets: &[ConstraintTarget],
    ctx: &EvalContext<'_>,
) {
    let name = con.name.clone();
    let ConstraintData::Python(d) = &mut con.data else {
        return;
    };
    let Some(script) = d.script else {
        return;
    };
    let matrices: Vec<DMat4> = targets.iter().map(|ct| ct.matrix).collect();
    match ctx.providers.scripts.compute(script, &d.props, &cob.matrix, &matrices) {
        Some(m) => {
            d.script_error = false;
            cob.matrix = m;
        }
        None => {
            if !d.script_error {
                log::warn!("script constraint {name:?} failed; owner left unchanged");
            }
            d.script_error = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::kinds::testing::{TARGET, run_in};
    use crate::provider::{Providers, ScriptHost};
    use glam::DVec3;

    /// Adds the first target's translation to the owner; fails without targets.
    struct Offset;

    impl ScriptHost for Offset {
        fn compute(
            &self,
            _script: ScriptId,
            props: &PropertyBag,
            owner: &DMat4,
            targets: &[DMat4],
        ) -> Option<DMat4> {
            let scale = match props.get("scale") {
                Some(PropValue::Float(f)) => *f,
                _ => 1.0,
            };
            let t = targets.first()?;
            Some(DMat4::from_translation(t.w_axis.truncate() * scale) * *owner)
        }
    }

    fn scripted() -> Constraint {
        let mut props = PropertyBag::new();
        props.insert(String::from("scale"), PropValue::Float(2.0));
        Constraint::new(ConstraintData::Python(PythonData {
            targets: alloc::vec![TargetRef::object(TARGET)],
            script: Some(ScriptId(7)),
            props,
            script_error: false,
        }))
    }

    #[test]
    fn compute_result_replaces_owner() {
        let scene = Scene::new();
        let host = Offset;
        let ctx = EvalContext {
            scene: &scene,
            providers: Providers::none().with_scripts(&host),
            time: 0.0,
        };
        let mut con = scripted();
        let target = DMat4::from_translation(DVec3::new(1.0, 0.0, 0.0));
        let out = run_in(&mut con, &ctx, &[target], DMat4::IDENTITY);
        assert_eq!(out.w_axis.truncate(), DVec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn failure_sets_error_flag() {
        let scene = Scene::new();
        let host = Offset;
        let ctx = EvalContext {
            scene: &scene,
            providers: Providers::none().with_scripts(&host),
            time: 0.0,
        };
        let mut con = scripted();
        let owner = DMat4::from_translation(DVec3::Z);
        let out = run_in(&mut con, &ctx, &[], owner);
        assert_eq!(out, owner);
        let ConstraintData::Python(d) = &con.data else { unreachable!() };
        assert!(d.script_error);
    }

    #[test]
    fn copy_and_free_handle_nested_data() {
        let src = scripted();
        let mut dst = Constraint::new(ConstraintData::zeroed(ConstraintType::Python));
        copy_data(&mut dst, &src);
        let (ConstraintData::Python(d), ConstraintData::Python(s)) = (&dst.data, &src.data) else {
            unreachable!()
        };
        assert_eq!(d.props, s.props);
        assert_eq!(d.targets.len(), 1);
        free_data(&mut dst);
        let ConstraintData::Python(d) = &dst.data else { unreachable!() };
        assert!(d.props.is_empty() && d.targets.is_empty());
    }

    #[test]
    fn targets_follow_user_list() {
        let scene = Scene::new();
        let mut con = scripted();
        let mut list = Vec::new();
        assert_eq!(get_targets(&con, &scene, &mut list), 1);
        list[0].subtarget = String::from("Bone");
        flush_targets(&mut con, &mut list, false);
        assert!(list.is_empty());
        let ConstraintData::Python(d) = &con.data else { unreachable!() };
        assert_eq!(d.targets[0].subtarget, "Bone");
    }
}
