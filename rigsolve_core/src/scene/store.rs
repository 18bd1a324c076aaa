// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Object storage, base list, and groups.

use alloc::string::String;
use alloc::vec::Vec;

use super::id::{DataId, GroupId, ObjectId};
use super::object::{Object, Parent, ParentKind};
use crate::error::SceneError;
use crate::recalc::LayerMask;

/// A named set of objects, which need not be linked into the scene.
#[derive(Clone, Debug, Default)]
pub struct Group {
    /// Group name.
    pub name: String,
    /// Members in group order.
    pub objects: Vec<ObjectId>,
}

/// Objects, the ordered base list, and groups.
///
/// Objects live in slots recycled through a free list; every [`ObjectId`]
/// carries a generation so handles to removed objects resolve to `None`.
/// The base list is the evaluation order of the scene and is rewritten by
/// [`topologically_sort_scene`](crate::graph::topologically_sort_scene).
#[derive(Debug, Default)]
pub struct Scene {
    slots: Vec<Option<Object>>,
    generation: Vec<u32>,
    free_list: Vec<u32>,
    bases: Vec<ObjectId>,
    groups: Vec<Group>,
    /// Currently visible layers.
    pub visible_layers: LayerMask,
}

impl Scene {
    /// Creates an empty scene with every layer visible.
    #[must_use]
    pub fn new() -> Self {
        Self {
            visible_layers: LayerMask::ALL,
            ..Self::default()
        }
    }

    // -- Allocation API --

    /// Stores an object without linking it into the base list, e.g. a group
    /// member that is only instanced.
    pub fn add_object_unlinked(&mut self, object: Object) -> ObjectId {
        let idx = if let Some(idx) = self.free_list.pop() {
            self.generation[idx as usize] += 1;
            self.slots[idx as usize] = Some(object);
            idx
        } else {
            let idx = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
            self.slots.push(Some(object));
            self.generation.push(0);
            idx
        };
        ObjectId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Stores an object and appends it to the base list.
    pub fn add_object(&mut self, object: Object) -> ObjectId {
        let id = self.add_object_unlinked(object);
        self.bases.push(id);
        id
    }

    /// Removes an object, unlinking it from the base list and all groups.
    ///
    /// References held by other objects are left dangling; they resolve to
    /// `None` and are skipped by the graph builder and the solver.
    pub fn remove_object(&mut self, id: ObjectId) -> Result<Object, SceneError> {
        if !self.contains(id) {
            return Err(SceneError::StaleObject(id));
        }
        self.bases.retain(|&b| b != id);
        for g in &mut self.groups {
            g.objects.retain(|&o| o != id);
        }
        let slot = self.slots[id.idx as usize].take();
        self.generation[id.idx as usize] += 1;
        self.free_list.push(id.idx);
        slot.ok_or(SceneError::StaleObject(id))
    }

    /// Returns whether the handle refers to a live object.
    #[must_use]
    pub fn contains(&self, id: ObjectId) -> bool {
        (id.idx as usize) < self.slots.len()
            && self.generation[id.idx as usize] == id.generation
            && self.slots[id.idx as usize].is_some()
    }

    /// The object behind `id`, or `None` for a stale handle.
    #[must_use]
    pub fn object(&self, id: ObjectId) -> Option<&Object> {
        if self.generation.get(id.idx as usize) != Some(&id.generation) {
            return None;
        }
        self.slots.get(id.idx as usize)?.as_ref()
    }

    /// The object behind `id`, mutably.
    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        if self.generation.get(id.idx as usize) != Some(&id.generation) {
            return None;
        }
        self.slots.get_mut(id.idx as usize)?.as_mut()
    }

    /// Every live object, linked or not, in slot order.
    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &Object)> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            let ob = slot.as_ref()?;
            let idx = u32::try_from(i).ok()?;
            Some((
                ObjectId {
                    idx,
                    generation: self.generation[i],
                },
                ob,
            ))
        })
    }

    /// First object named `name`.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<ObjectId> {
        self.objects().find(|(_, ob)| ob.name == name).map(|(id, _)| id)
    }

    // -- Base list --

    /// Objects linked into the scene, in evaluation order.
    #[must_use]
    pub fn bases(&self) -> &[ObjectId] {
        &self.bases
    }

    /// Whether `id` is linked into the base list.
    #[must_use]
    pub fn is_base(&self, id: ObjectId) -> bool {
        self.bases.contains(&id)
    }

    /// Links an existing object into the base list.
    pub fn link_base(&mut self, id: ObjectId) -> Result<(), SceneError> {
        if !self.contains(id) {
            return Err(SceneError::StaleObject(id));
        }
        if !self.bases.contains(&id) {
            self.bases.push(id);
        }
        Ok(())
    }

    /// Unlinks an object from the base list; the object stays stored.
    pub fn unlink_base(&mut self, id: ObjectId) {
        self.bases.retain(|&b| b != id);
    }

    pub(crate) fn set_bases(&mut self, bases: Vec<ObjectId>) {
        self.bases = bases;
    }

    // -- Groups --

    /// Creates an empty group.
    pub fn add_group(&mut self, name: impl Into<String>) -> GroupId {
        let id = GroupId(u32::try_from(self.groups.len()).unwrap_or(u32::MAX));
        self.groups.push(Group {
            name: name.into(),
            objects: Vec::new(),
        });
        id
    }

    /// Appends an object to a group.
    pub fn add_to_group(&mut self, group: GroupId, object: ObjectId) -> Result<(), SceneError> {
        if !self.contains(object) {
            return Err(SceneError::StaleObject(object));
        }
        let g = self
            .groups
            .get_mut(group.0 as usize)
            .ok_or(SceneError::UnknownGroup(group))?;
        if !g.objects.contains(&object) {
            g.objects.push(object);
        }
        Ok(())
    }

    /// The group behind `id`.
    #[must_use]
    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id.0 as usize)
    }

    /// All groups.
    #[must_use]
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub(crate) fn groups_mut(&mut self) -> &mut [Group] {
        &mut self.groups
    }

    // -- Relations --

    /// Parents `child` to `parent`, rejecting links that would close a loop.
    ///
    /// The parent inverse is reset to identity.
    pub fn set_parent(
        &mut self,
        child: ObjectId,
        parent: ObjectId,
        kind: ParentKind,
    ) -> Result<(), SceneError> {
        if !self.contains(parent) {
            return Err(SceneError::StaleObject(parent));
        }
        if !self.contains(child) {
            return Err(SceneError::StaleObject(child));
        }
        let mut cur = Some(parent);
        let mut steps = 0;
        while let Some(c) = cur {
            steps += 1;
            if c == child || steps > self.slots.len() {
                return Err(SceneError::ParentCycle { child, parent });
            }
            cur = self
                .object(c)
                .and_then(|ob| ob.parent.as_ref())
                .map(|p| p.object);
        }
        if let Some(ob) = self.object_mut(child) {
            ob.parent = Some(Parent {
                object: parent,
                kind,
            });
            ob.parent_inverse = glam::DMat4::IDENTITY;
        }
        Ok(())
    }

    /// Clears the parent of `child`.
    pub fn clear_parent(&mut self, child: ObjectId) -> Result<(), SceneError> {
        let ob = self
            .object_mut(child)
            .ok_or(SceneError::StaleObject(child))?;
        ob.parent = None;
        Ok(())
    }

    /// Base objects that use `data`, in base order.
    #[must_use]
    pub fn data_users(&self, data: DataId) -> Vec<ObjectId> {
        self.bases
            .iter()
            .copied()
            .filter(|&id| self.object(id).is_some_and(|ob| ob.data == Some(data)))
            .collect()
    }
}
