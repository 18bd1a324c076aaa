// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Editing of constraint stacks: adding, copying, freeing, renaming,
//! relinking, and target validation.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use hashbrown::HashMap;

use super::registry::ConstraintRegistry;
use super::{
    Constraint, ConstraintData, ConstraintFlags, ConstraintSpace, ConstraintType, OwnerRef,
};
use crate::error::ConstraintError;
use crate::scene::{ObjectId, ObjectKind, Scene};

/// Maps old object handles to new ones, e.g. after duplicating a scene.
pub trait IdRemap {
    /// The replacement for `id`, or `None` to keep it.
    fn remap(&self, id: ObjectId) -> Option<ObjectId>;
}

impl IdRemap for HashMap<ObjectId, ObjectId> {
    fn remap(&self, id: ObjectId) -> Option<ObjectId> {
        self.get(&id).copied()
    }
}

impl<F: Fn(ObjectId) -> Option<ObjectId>> IdRemap for F {
    fn remap(&self, id: ObjectId) -> Option<ObjectId> {
        self(id)
    }
}

/// Appends a new constraint of type `ty` with the type's defaults.
///
/// The constraint is named after its type, made unique within the stack,
/// with full influence and world spaces.
pub fn add_constraint_to_stack<'a>(
    registry: &ConstraintRegistry,
    stack: &'a mut Vec<Constraint>,
    ty: ConstraintType,
) -> Result<&'a mut Constraint, ConstraintError> {
    let info = registry
        .type_info(ty)
        .ok_or(ConstraintError::InvalidType(ty.raw()))?;
    let mut data = ConstraintData::zeroed(ty);
    if let Some(new_data) = info.new_data {
        new_data(&mut data);
    }
    let mut con = Constraint::new(data);
    con.name = String::from(info.name);
    con.owner_space = ConstraintSpace::World;
    con.target_space = ConstraintSpace::World;
    stack.push(con);
    let index = stack.len() - 1;
    unique_constraint_name(stack, index);
    Ok(&mut stack[index])
}

/// Replaces `dst` with a deep copy of `src`.
pub fn copy_constraint_stack(
    registry: &ConstraintRegistry,
    dst: &mut Vec<Constraint>,
    src: &[Constraint],
) {
    dst.clear();
    dst.reserve(src.len());
    for con in src {
        let mut copy = con.clone();
        if let Some(copy_data) = registry.type_info(con.ty).and_then(|i| i.copy_data) {
            copy_data(&mut copy, con);
        }
        dst.push(copy);
    }
}

/// Releases nested data of every constraint and empties the stack.
pub fn free_constraint_stack(registry: &ConstraintRegistry, stack: &mut Vec<Constraint>) {
    for con in stack.iter_mut() {
        if let Some(free_data) = registry.type_info(con.ty).and_then(|i| i.free_data) {
            free_data(con);
        }
    }
    stack.clear();
}

/// Rewrites the object references of every constraint through `remap`.
pub fn relink_constraint_stack(
    registry: &ConstraintRegistry,
    stack: &mut [Constraint],
    remap: &dyn IdRemap,
) {
    for con in stack {
        if let Some(relink) = registry.type_info(con.ty).and_then(|i| i.relink_data) {
            relink(con, remap);
        }
    }
}

/// Renames `stack[index]` so no other entry shares its name, appending a
/// `.001` style suffix if needed. An empty name becomes the type name.
pub fn unique_constraint_name(stack: &mut [Constraint], index: usize) {
    let Some(con) = stack.get(index) else {
        return;
    };
    let name = if con.name.is_empty() {
        String::from(con.ty.name())
    } else {
        con.name.clone()
    };
    let taken = |candidate: &str| {
        stack
            .iter()
            .enumerate()
            .any(|(i, c)| i != index && c.name == candidate)
    };
    if !taken(&name) {
        stack[index].name = name;
        return;
    }
    let base = strip_number_suffix(&name);
    let mut n = 1_u32;
    let unique = loop {
        let candidate = format!("{base}.{n:03}");
        if !taken(&candidate) {
            break candidate;
        }
        n += 1;
    };
    stack[index].name = unique;
}

/// `"Name.003"` to `"Name"`; other names unchanged.
fn strip_number_suffix(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((base, digits))
            if !base.is_empty()
                && !digits.is_empty()
                && digits.bytes().all(|b| b.is_ascii_digit()) =>
        {
            base
        }
        _ => name,
    }
}

/// Index of the constraint named `name`.
#[must_use]
pub fn find_constraint(stack: &[Constraint], name: &str) -> Option<usize> {
    stack.iter().position(|c| c.name == name)
}

/// Removes the constraint named `name`, releasing its nested data.
pub fn remove_constraint(
    registry: &ConstraintRegistry,
    stack: &mut Vec<Constraint>,
    name: &str,
) -> Result<Constraint, ConstraintError> {
    let index =
        find_constraint(stack, name).ok_or_else(|| ConstraintError::NotFound(String::from(name)))?;
    let mut con = stack.remove(index);
    if let Some(free_data) = registry.type_info(con.ty).and_then(|i| i.free_data) {
        free_data(&mut con);
    }
    Ok(con)
}

/// Sets or clears [`ConstraintFlags::DISABLE`] on every constraint of
/// `owner` from the validity of its targets.
///
/// A constraint is disabled when any target that is required is unset or
/// stale, targets its own owner object without a sub-target, names a bone
/// the armature lacks, or (for path constraints) is not a curve.
pub fn validate_targets(scene: &Scene, stack: &mut [Constraint], owner: OwnerRef) {
    for con in stack {
        let valid = targets_valid(scene, con, owner);
        con.flags.set(ConstraintFlags::DISABLE, !valid);
    }
}

fn targets_valid(scene: &Scene, con: &Constraint, owner: OwnerRef) -> bool {
    let refs = match &con.data {
        ConstraintData::Kinematic(d) => {
            // The pole is optional.
            let mut refs = alloc::vec![&d.target];
            if d.pole.object.is_some() {
                refs.push(&d.pole);
            }
            refs
        }
        ConstraintData::Python(d) => d.targets.iter().collect::<Vec<_>>(),
        other => other.target().into_iter().collect(),
    };
    for t in refs {
        let Some(id) = t.object else {
            if let ConstraintData::Kinematic(d) = &con.data
                && d.auto_ik
            {
                continue;
            }
            return false;
        };
        let Some(ob) = scene.object(id) else {
            return false;
        };
        if id == owner.object() && t.subtarget.is_empty() {
            return false;
        }
        if ob.kind == ObjectKind::Armature
            && !t.subtarget.is_empty()
            && ob.pose.as_ref().and_then(|p| p.find(&t.subtarget)).is_none()
        {
            return false;
        }
        if matches!(con.ty, ConstraintType::FollowPath | ConstraintType::ClampTo)
            && ob.kind != ObjectKind::Curve
        {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{
        FollowPathData, LocLikeData, PropValue, PythonData, StretchToData, TargetRef,
    };
    use crate::scene::{Bone, Object, Pose};
    use glam::DVec3;

    fn registry() -> &'static ConstraintRegistry {
        ConstraintRegistry::builtin()
    }

    #[test]
    fn added_constraints_get_defaults_and_unique_names() {
        let mut stack = Vec::new();
        let con = add_constraint_to_stack(registry(), &mut stack, ConstraintType::StretchTo)
            .expect("registered type");
        assert_eq!(con.influence, 1.0);
        assert!(matches!(
            &con.data,
            ConstraintData::StretchTo(StretchToData { bulge, .. }) if *bulge == 1.0
        ));
        add_constraint_to_stack(registry(), &mut stack, ConstraintType::StretchTo)
            .expect("registered type");
        add_constraint_to_stack(registry(), &mut stack, ConstraintType::StretchTo)
            .expect("registered type");
        let names: Vec<&str> = stack.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Stretch To", "Stretch To.001", "Stretch To.002"]);
    }

    #[test]
    fn null_type_is_rejected() {
        let mut stack = Vec::new();
        let err = add_constraint_to_stack(registry(), &mut stack, ConstraintType::Null);
        assert_eq!(err.err(), Some(ConstraintError::InvalidType(0)));
        assert!(stack.is_empty());
    }

    #[test]
    fn renaming_strips_existing_suffix() {
        let mut stack = alloc::vec![
            Constraint::new(ConstraintData::LocLike(LocLikeData::default())),
            Constraint::new(ConstraintData::LocLike(LocLikeData::default())),
        ];
        stack[0].name = String::from("Grab.004");
        stack[1].name = String::from("Grab.004");
        unique_constraint_name(&mut stack, 1);
        assert_eq!(stack[1].name, "Grab.001");
        assert_eq!(strip_number_suffix("v1.2b"), "v1.2b");
        assert_eq!(strip_number_suffix(".001"), ".001");
    }

    #[test]
    fn copy_is_deep_and_free_empties() {
        let mut src = Vec::new();
        let con = add_constraint_to_stack(registry(), &mut src, ConstraintType::Python)
            .expect("registered type");
        if let ConstraintData::Python(d) = &mut con.data {
            d.props.insert(String::from("k"), PropValue::Int(3));
        }
        let mut dst = Vec::new();
        copy_constraint_stack(registry(), &mut dst, &src);
        assert_eq!(dst, src);
        free_constraint_stack(registry(), &mut src);
        assert!(src.is_empty());
        assert!(matches!(&dst[0].data, ConstraintData::Python(PythonData { props, .. }) if props.len() == 1));
    }

    #[test]
    fn relink_and_remove() {
        let old = ObjectId { idx: 1, generation: 0 };
        let new = ObjectId { idx: 7, generation: 2 };
        let mut stack = alloc::vec![Constraint::new(ConstraintData::LocLike(LocLikeData::new(
            TargetRef::object(old)
        )))];
        let mut map = HashMap::new();
        map.insert(old, new);
        relink_constraint_stack(registry(), &mut stack, &map);
        assert_eq!(stack[0].data.target().and_then(|t| t.object), Some(new));
        relink_constraint_stack(registry(), &mut stack, &|_: ObjectId| None::<ObjectId>);
        assert_eq!(stack[0].data.target().and_then(|t| t.object), Some(new));

        assert_eq!(find_constraint(&stack, "Copy Location"), Some(0));
        assert!(remove_constraint(registry(), &mut stack, "Copy Location").is_ok());
        assert_eq!(
            remove_constraint(registry(), &mut stack, "Copy Location"),
            Err(ConstraintError::NotFound(String::from("Copy Location")))
        );
    }

    #[test]
    fn validation_flags_bad_targets() {
        let mut scene = Scene::new();
        let owner = scene.add_object(Object::new("Owner", ObjectKind::Empty));
        let empty = scene.add_object(Object::new("Empty", ObjectKind::Empty));
        let mut pose = Pose::new();
        pose.add_channel("Root", None, Bone::new(DVec3::ZERO, 1.0));
        let arm = scene.add_object(Object::new("Rig", ObjectKind::Armature).with_pose(pose));
        let gone = scene.add_object(Object::new("Gone", ObjectKind::Empty));
        scene.remove_object(gone).expect("live object");

        let loc = |t: TargetRef| Constraint::new(ConstraintData::LocLike(LocLikeData::new(t)));
        let mut stack = alloc::vec![
            loc(TargetRef::object(empty)),
            loc(TargetRef::default()),
            loc(TargetRef::object(gone)),
            loc(TargetRef::object(owner)),
            loc(TargetRef::sub(arm, "Root")),
            loc(TargetRef::sub(arm, "Missing")),
            Constraint::new(ConstraintData::FollowPath(FollowPathData {
                target: TargetRef::object(empty),
                ..FollowPathData::default()
            })),
        ];
        stack[1].flags.insert(ConstraintFlags::DISABLE);
        stack[0].flags.insert(ConstraintFlags::DISABLE);
        validate_targets(&scene, &mut stack, OwnerRef::Object(owner));
        let disabled: Vec<bool> = stack.iter().map(Constraint::is_disabled).collect();
        assert_eq!(disabled, [false, true, true, true, false, true, true]);
    }
}
