// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Armature poses: bones in rest position plus their posed channels.
//!
//! Bones are described relative to their parent: `head` is measured from the
//! parent's tail and `rest` is the rest orientation relative to the parent.
//! The armature-space rest matrix (`arm_mat`) is derived when a channel is
//! added.
//!
//! A channel's pose matrix (armature space) is `parent_frame(i) * chan_mat`,
//! where the parent frame is
//!
//! - root: `arm_mat`;
//! - child: `parent.pose_mat * offset`, with `offset = T(head + parent_len·Y) * rest`;
//! - hinge child: the parent's rest rotation placed at the parent's posed
//!   offset point, times `rest`.

use alloc::string::String;
use alloc::vec::Vec;

use glam::{DMat3, DMat4, DQuat, DVec3};

use crate::constraint::Constraint;
use crate::transform::{MatrixExt, loc_quat_size, mat4_from_mat3};

/// Rest-position data of a bone.
#[derive(Clone, Debug, PartialEq)]
pub struct Bone {
    /// Head position relative to the parent's tail (or armature origin).
    pub head: DVec3,
    /// Distance from head to tail along the bone's Y axis.
    pub length: f64,
    /// Rest orientation relative to the parent bone.
    pub rest: DMat3,
    /// Whether the bone ignores its parent's rotation.
    pub hinge: bool,
    /// Rest matrix in armature space; derived by [`Pose::add_channel`].
    pub arm_mat: DMat4,
}

impl Bone {
    /// Creates a bone along its parent's Y axis.
    #[must_use]
    pub fn new(head: DVec3, length: f64) -> Self {
        Self {
            head,
            length,
            rest: DMat3::IDENTITY,
            hinge: false,
            arm_mat: DMat4::IDENTITY,
        }
    }

    /// Sets the rest orientation and returns `self`.
    #[must_use]
    pub fn with_rest(mut self, rest: DMat3) -> Self {
        self.rest = rest;
        self
    }

    /// Marks the bone as a hinge and returns `self`.
    #[must_use]
    pub fn with_hinge(mut self, hinge: bool) -> Self {
        self.hinge = hinge;
        self
    }
}

/// A posed bone.
#[derive(Clone, Debug)]
pub struct PoseChannel {
    /// Bone name; unique within the pose.
    pub name: String,
    /// Index of the parent channel.
    pub parent: Option<u32>,
    /// Rest data.
    pub bone: Bone,
    /// Pose location.
    pub location: DVec3,
    /// Pose rotation.
    pub rotation: DQuat,
    /// Pose scale.
    pub scale: DVec3,
    /// `T * R * S` built from the pose values.
    pub chan_mat: DMat4,
    /// Evaluated matrix in armature space.
    pub pose_mat: DMat4,
    /// Evaluated head in armature space.
    pub pose_head: DVec3,
    /// Evaluated tail in armature space.
    pub pose_tail: DVec3,
    /// Inverse of the change the last constraint solve applied.
    pub constraint_inverse: DMat4,
    /// Bone constraint stack.
    pub constraints: Vec<Constraint>,
}

impl PoseChannel {
    fn new(name: String, parent: Option<u32>, bone: Bone) -> Self {
        Self {
            name,
            parent,
            bone,
            location: DVec3::ZERO,
            rotation: DQuat::IDENTITY,
            scale: DVec3::ONE,
            chan_mat: DMat4::IDENTITY,
            pose_mat: DMat4::IDENTITY,
            pose_head: DVec3::ZERO,
            pose_tail: DVec3::ZERO,
            constraint_inverse: DMat4::IDENTITY,
            constraints: Vec::new(),
        }
    }

    /// Rebuilds `chan_mat` from location, rotation, and scale.
    pub fn update_chan_mat(&mut self) {
        self.chan_mat = loc_quat_size(self.location, self.rotation, self.scale);
    }

    /// Recomputes head and tail from `pose_mat`.
    pub fn update_head_tail(&mut self) {
        self.pose_head = self.pose_mat.translation();
        self.pose_tail = self.pose_head + self.pose_mat.axis(1) * self.bone.length;
    }
}

/// The channels of an armature and their evaluation order.
#[derive(Clone, Debug, Default)]
pub struct Pose {
    channels: Vec<PoseChannel>,
    order: Vec<u32>,
}

impl Pose {
    /// Creates an empty pose.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a channel and derives its armature-space rest matrix.
    ///
    /// A `parent` index that does not name an existing channel is ignored and
    /// the channel becomes a root.
    pub fn add_channel(&mut self, name: impl Into<String>, parent: Option<u32>, mut bone: Bone) -> u32 {
        let parent = parent.filter(|&p| (p as usize) < self.channels.len());
        bone.arm_mat = match parent {
            Some(p) => {
                let pb = &self.channels[p as usize].bone;
                pb.arm_mat * offset_matrix(&bone, pb.length)
            }
            None => {
                let mut m = mat4_from_mat3(&bone.rest);
                m.set_translation(bone.head);
                m
            }
        };
        let idx = u32::try_from(self.channels.len()).unwrap_or(u32::MAX);
        self.channels.push(PoseChannel::new(name.into(), parent, bone));
        self.order.clear();
        idx
    }

    /// Number of channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Whether the pose has no channels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// All channels in storage order.
    #[must_use]
    pub fn channels(&self) -> &[PoseChannel] {
        &self.channels
    }

    /// All channels in storage order, mutably.
    pub fn channels_mut(&mut self) -> &mut [PoseChannel] {
        &mut self.channels
    }

    /// Channel by index.
    #[must_use]
    pub fn channel(&self, idx: u32) -> Option<&PoseChannel> {
        self.channels.get(idx as usize)
    }

    /// Channel by index, mutably.
    pub fn channel_mut(&mut self, idx: u32) -> Option<&mut PoseChannel> {
        self.channels.get_mut(idx as usize)
    }

    /// Index of the channel named `name`.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<u32> {
        self.channels
            .iter()
            .position(|c| c.name == name)
            .and_then(|i| u32::try_from(i).ok())
    }

    /// Evaluation order. Storage order until [`sort_pose`] has run.
    ///
    /// [`sort_pose`]: crate::graph::sort_pose
    #[must_use]
    pub fn order(&self) -> Vec<u32> {
        if self.order.len() == self.channels.len() {
            self.order.clone()
        } else {
            (0..self.channels.len())
                .filter_map(|i| u32::try_from(i).ok())
                .collect()
        }
    }

    pub(crate) fn set_order(&mut self, order: Vec<u32>) {
        self.order = order;
    }

    /// `T(head + parent_len·Y) * rest` for channel `idx`; `arm_mat` for roots.
    #[must_use]
    pub fn offset_matrix(&self, idx: u32) -> DMat4 {
        let Some(ch) = self.channel(idx) else {
            return DMat4::IDENTITY;
        };
        match ch.parent.and_then(|p| self.channel(p)) {
            Some(parent) => offset_matrix(&ch.bone, parent.bone.length),
            None => ch.bone.arm_mat,
        }
    }

    /// The matrix that maps channel-local transforms into armature space,
    /// given the current pose of the parent. `pose_mat = parent_frame * chan_mat`.
    #[must_use]
    pub fn parent_frame(&self, idx: u32) -> DMat4 {
        let Some(ch) = self.channel(idx) else {
            return DMat4::IDENTITY;
        };
        let Some(parent) = ch.parent.and_then(|p| self.channel(p)) else {
            return ch.bone.arm_mat;
        };
        let offs = offset_matrix(&ch.bone, parent.bone.length);
        if ch.bone.hinge {
            let mut tmat = parent.bone.arm_mat;
            tmat.set_translation(parent.pose_mat.transform_point3(offs.translation()));
            let mut offs_rot = offs;
            offs_rot.set_translation(DVec3::ZERO);
            tmat * offs_rot
        } else {
            parent.pose_mat * offs
        }
    }

    /// Walks `chain_len` parents up from `tip` (0 means up to the root,
    /// capped at 255) and returns the chain ordered root first.
    #[must_use]
    pub fn chain(&self, tip: u32, chain_len: u16) -> Vec<u32> {
        let limit = if chain_len == 0 { 255 } else { usize::from(chain_len).min(255) };
        let mut out = Vec::new();
        let mut cur = Some(tip);
        while let Some(c) = cur {
            if out.len() >= limit || self.channel(c).is_none() {
                break;
            }
            out.push(c);
            cur = self.channel(c).and_then(|ch| ch.parent);
        }
        out.reverse();
        out
    }
}

fn offset_matrix(bone: &Bone, parent_length: f64) -> DMat4 {
    let mut m = mat4_from_mat3(&bone.rest);
    m.set_translation(bone.head + DVec3::new(0.0, parent_length, 0.0));
    m
}
