// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The static table of per-type constraint operations.

use alloc::vec::Vec;

use super::kinds;
use super::stack::IdRemap;
use super::{Constraint, ConstraintData, ConstraintOb, ConstraintTarget, ConstraintType, EvalContext};
use crate::scene::Scene;

/// Releases nested resources owned by the settings.
pub type FreeDataFn = fn(&mut Constraint);
/// Rewrites stored references after an identity remap.
pub type RelinkDataFn = fn(&mut Constraint, &dyn IdRemap);
/// Deep-copies nested settings from the source into the destination.
pub type CopyDataFn = fn(&mut Constraint, &Constraint);
/// Fills in type-specific defaults.
pub type NewDataFn = fn(&mut ConstraintData);
/// Appends the transient targets and returns how many were added.
pub type GetTargetsFn = fn(&Constraint, &Scene, &mut Vec<ConstraintTarget>) -> usize;
/// Writes targets back unless `discard` is set, then drains the list.
pub type FlushTargetsFn = fn(&mut Constraint, &mut Vec<ConstraintTarget>, bool);
/// Fills in one target's matrix.
pub type TargetMatrixFn = fn(&Constraint, &ConstraintOb, &mut ConstraintTarget, &EvalContext<'_>);
/// Rewrites the owner matrix.
pub type EvaluateFn = fn(&mut Constraint, &mut ConstraintOb, &[ConstraintTarget], &EvalContext<'_>);

/// The operations of one constraint type. An absent operation means the
/// type does not support it.
#[derive(Clone, Copy, Debug)]
pub struct ConstraintTypeInfo {
    /// Type tag.
    pub ty: ConstraintType,
    /// Display name.
    pub name: &'static str,
    /// Name of the settings struct.
    pub struct_name: &'static str,
    /// Releases nested resources.
    pub free_data: Option<FreeDataFn>,
    /// Rewrites references after a remap.
    pub relink_data: Option<RelinkDataFn>,
    /// Deep-copies nested settings.
    pub copy_data: Option<CopyDataFn>,
    /// Fills in defaults; without it the zeroed settings are the defaults.
    pub new_data: Option<NewDataFn>,
    /// Produces the transient targets.
    pub get_targets: Option<GetTargetsFn>,
    /// Writes targets back and drains the list.
    pub flush_targets: Option<FlushTargetsFn>,
    /// Resolves a target matrix; without it targets stay identity.
    pub get_target_matrix: Option<TargetMatrixFn>,
    /// Rewrites the owner matrix; without it the constraint is skipped.
    pub evaluate: Option<EvaluateFn>,
}

impl ConstraintTypeInfo {
    /// An entry with every operation absent.
    #[must_use]
    pub const fn empty(ty: ConstraintType, struct_name: &'static str) -> Self {
        Self {
            ty,
            name: ty.name(),
            struct_name,
            free_data: None,
            relink_data: None,
            copy_data: None,
            new_data: None,
            get_targets: None,
            flush_targets: None,
            get_target_matrix: None,
            evaluate: None,
        }
    }
}

static BUILTIN_TABLE: [Option<ConstraintTypeInfo>; ConstraintType::COUNT] = [
    None,
    Some(kinds::child_of::INFO),
    Some(kinds::track_to::INFO),
    Some(kinds::kinematic::INFO),
    Some(kinds::follow_path::INFO),
    Some(kinds::limit::ROT_LIMIT),
    Some(kinds::limit::LOC_LIMIT),
    Some(kinds::limit::SIZE_LIMIT),
    Some(kinds::copy::ROT_LIKE),
    Some(kinds::copy::LOC_LIKE),
    Some(kinds::copy::SIZE_LIKE),
    Some(kinds::python::INFO),
    Some(kinds::action::INFO),
    Some(kinds::locked_track::INFO),
    Some(kinds::dist_limit::INFO),
    Some(kinds::stretch_to::INFO),
    Some(kinds::min_max::INFO),
    Some(kinds::rigid_body::INFO),
    Some(kinds::clamp_to::INFO),
    Some(kinds::transformation::INFO),
];

static BUILTIN: ConstraintRegistry = ConstraintRegistry {
    table: &BUILTIN_TABLE,
};

/// Lookup of [`ConstraintTypeInfo`] by type tag.
///
/// The built-in registry is a `const` table; pass it by reference to the
/// solver and the stack editing functions.
#[derive(Clone, Copy, Debug)]
pub struct ConstraintRegistry {
    table: &'static [Option<ConstraintTypeInfo>],
}

impl ConstraintRegistry {
    /// The registry of every built-in type.
    #[must_use]
    pub fn builtin() -> &'static Self {
        &BUILTIN
    }

    /// A registry over a custom table, indexed by raw tag.
    #[must_use]
    pub const fn from_table(table: &'static [Option<ConstraintTypeInfo>]) -> Self {
        Self { table }
    }

    /// Operations of `ty`; `None` for [`ConstraintType::Null`] and
    /// unregistered tags.
    #[must_use]
    pub fn type_info(&self, ty: ConstraintType) -> Option<&ConstraintTypeInfo> {
        if ty == ConstraintType::Null {
            return None;
        }
        self.table.get(usize::from(ty.raw()))?.as_ref()
    }

    /// Operations for a raw tag.
    #[must_use]
    pub fn type_info_raw(&self, raw: u8) -> Option<&ConstraintTypeInfo> {
        self.type_info(ConstraintType::from_raw(raw)?)
    }

    /// Whether `ty` can be evaluated.
    #[must_use]
    pub fn has_evaluate(&self, ty: ConstraintType) -> bool {
        self.type_info(ty).is_some_and(|i| i.evaluate.is_some())
    }

    /// Whether `ty` produces targets.
    #[must_use]
    pub fn has_targets(&self, ty: ConstraintType) -> bool {
        self.type_info(ty).is_some_and(|i| i.get_targets.is_some())
    }

    /// Whether `ty` resolves target matrices.
    #[must_use]
    pub fn has_target_matrix(&self, ty: ConstraintType) -> bool {
        self.type_info(ty).is_some_and(|i| i.get_target_matrix.is_some())
    }

    /// Whether `ty` writes targets back.
    #[must_use]
    pub fn has_flush(&self, ty: ConstraintType) -> bool {
        self.type_info(ty).is_some_and(|i| i.flush_targets.is_some())
    }

    /// Whether `ty` deep-copies nested settings.
    #[must_use]
    pub fn has_copy(&self, ty: ConstraintType) -> bool {
        self.type_info(ty).is_some_and(|i| i.copy_data.is_some())
    }

    /// Whether `ty` releases nested resources.
    #[must_use]
    pub fn has_free(&self, ty: ConstraintType) -> bool {
        self.type_info(ty).is_some_and(|i| i.free_data.is_some())
    }

    /// Whether `ty` rewrites references after a remap.
    #[must_use]
    pub fn has_relink(&self, ty: ConstraintType) -> bool {
        self.type_info(ty).is_some_and(|i| i.relink_data.is_some())
    }

    /// Whether `ty` fills in defaults.
    #[must_use]
    pub fn has_new_data(&self, ty: ConstraintType) -> bool {
        self.type_info(ty).is_some_and(|i| i.new_data.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tag_maps_to_its_own_entry() {
        for (raw, entry) in BUILTIN_TABLE.iter().enumerate() {
            match entry {
                Some(info) => assert_eq!(usize::from(info.ty.raw()), raw),
                None => assert_eq!(raw, 0),
            }
        }
    }

    #[test]
    fn null_has_no_operations() {
        let reg = ConstraintRegistry::builtin();
        let null = ConstraintType::Null;
        assert!(reg.type_info(null).is_none());
        assert!(!reg.has_evaluate(null));
        assert!(!reg.has_targets(null));
        assert!(!reg.has_target_matrix(null));
        assert!(!reg.has_flush(null));
        assert!(!reg.has_copy(null));
        assert!(!reg.has_free(null));
        assert!(!reg.has_relink(null));
        assert!(!reg.has_new_data(null));
        assert!(reg.type_info_raw(0).is_none());
        assert!(reg.type_info_raw(200).is_none());
    }

    #[test]
    fn ik_and_joint_have_no_evaluate() {
        let reg = ConstraintRegistry::builtin();
        assert!(!reg.has_evaluate(ConstraintType::Kinematic));
        assert!(!reg.has_evaluate(ConstraintType::RigidBodyJoint));
        assert!(reg.has_targets(ConstraintType::Kinematic));
        assert!(reg.has_targets(ConstraintType::RigidBodyJoint));
    }

    #[test]
    fn limits_have_no_targets() {
        let reg = ConstraintRegistry::builtin();
        for ty in [
            ConstraintType::RotLimit,
            ConstraintType::LocLimit,
            ConstraintType::SizeLimit,
        ] {
            assert!(reg.has_evaluate(ty));
            assert!(!reg.has_targets(ty));
        }
    }

    #[test]
    fn python_owns_nested_data() {
        let reg = ConstraintRegistry::builtin();
        let ty = ConstraintType::Python;
        assert!(reg.has_free(ty));
        assert!(reg.has_copy(ty));
        assert!(reg.has_relink(ty));
        assert!(reg.has_target_matrix(ty));
    }

    #[test]
    fn names_match_types() {
        let reg = ConstraintRegistry::builtin();
        for ty in ConstraintType::ALL.into_iter().skip(1) {
            let info = reg.type_info(ty).unwrap();
            assert_eq!(info.name, ty.name());
        }
    }

    #[test]
    fn custom_table_only_knows_its_entries() {
        static TABLE: [Option<ConstraintTypeInfo>; 2] = [
            None,
            Some(ConstraintTypeInfo::empty(ConstraintType::ChildOf, "ChildOfData")),
        ];
        let reg = ConstraintRegistry::from_table(&TABLE);
        assert!(reg.type_info(ConstraintType::ChildOf).is_some());
        assert!(!reg.has_evaluate(ConstraintType::ChildOf));
        assert!(reg.type_info(ConstraintType::TrackTo).is_none());
    }
}
