// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors returned by scene and constraint-stack editing.
//!
//! Evaluation never fails: missing targets resolve to identity, cycles are
//! reported through logging and the trace sink, and unavailable capabilities
//! are skipped.

use alloc::string::String;
use core::fmt;

use crate::scene::{GroupId, ObjectId};

/// Errors from editing a [`Scene`](crate::scene::Scene).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SceneError {
    /// The handle refers to a removed object.
    StaleObject(ObjectId),
    /// Parenting `child` to `parent` would close a loop.
    ParentCycle {
        /// The object being parented.
        child: ObjectId,
        /// The requested parent.
        parent: ObjectId,
    },
    /// No group with this handle exists.
    UnknownGroup(GroupId),
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaleObject(id) => write!(f, "object handle {id:?} is stale"),
            Self::ParentCycle { child, parent } => {
                write!(f, "parenting {child:?} to {parent:?} would create a loop")
            }
            Self::UnknownGroup(id) => write!(f, "unknown group {}", id.0),
        }
    }
}

impl core::error::Error for SceneError {}

/// Errors from editing a constraint stack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConstraintError {
    /// The type tag is reserved or unknown.
    InvalidType(u8),
    /// No constraint with this name is in the stack.
    NotFound(String),
}

impl fmt::Display for ConstraintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidType(tag) => write!(f, "constraint type {tag} cannot be instantiated"),
            Self::NotFound(name) => write!(f, "no constraint named {name:?}"),
        }
    }
}

impl core::error::Error for ConstraintError {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn display_messages() {
        assert_eq!(
            ConstraintError::InvalidType(0).to_string(),
            "constraint type 0 cannot be instantiated"
        );
        assert_eq!(
            ConstraintError::NotFound("Track".into()).to_string(),
            "no constraint named \"Track\""
        );
        assert_eq!(SceneError::UnknownGroup(GroupId(3)).to_string(), "unknown group 3");
    }
}
