//! Per-client surface registry and scene trees.
//!
//! Every surface is either the root of a sub-tree, owning the canonical
//! `SurfaceTree` structure, or a child pointing at its parent. Resolution
//! follows `Child` pointers until it lands on a `Root`; attach moves whole
//! sub-trees at the id level, so a cycle can only arise from attaching a
//! surface under its own descendant, which is rejected up front.
//!
//! Operations that return `Option` report "absent" for unknown ids or
//! impossible arrangements; the engine turns those into client protocol
//! errors.

use std::collections::HashMap;
use std::mem;

use crate::core::backend::BackendSurfaceHandle;
use crate::core::ids::SurfaceId;
use crate::core::surface::surface::{Surface, SurfaceState};
use crate::core::surface::tree::SurfaceTree;
use crate::util::geometry::V2;

/// How a surface hangs in its scene tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    /// The surface is the root of a sub-tree and owns its structure.
    Root(SurfaceTree),
    /// The surface lives under this parent; follow the pointer to a root.
    Child(SurfaceId),
}

#[derive(Debug, Clone)]
pub struct SurfaceEntry {
    pub surface: Surface,
    pub attachment: Attachment,
}

/// One map/unmap-relevant state application, reported back to the caller
/// so it can mirror the transition in the workspace model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitApplied {
    pub sid: SurfaceId,
    pub was_mapped: bool,
    pub now_mapped: bool,
}

/// Why a stacking change was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestackError {
    /// One of the named surfaces is not in the map.
    UnknownSurface,
    /// Both surfaces exist but are not arranged as siblings under the same
    /// parent (a root, a deeper descendant, or the surface itself).
    NotSiblings,
}

#[derive(Debug, Default)]
pub struct SurfaceMap {
    entries: HashMap<SurfaceId, SurfaceEntry>,
}

impl SurfaceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a fresh surface as its own root. Overwriting an existing id
    /// is a caller bug.
    pub fn insert(&mut self, sid: SurfaceId, surface: Surface) {
        debug_assert!(!self.entries.contains_key(&sid), "surface {sid} already exists");
        self.entries.insert(
            sid,
            SurfaceEntry {
                surface,
                attachment: Attachment::Root(SurfaceTree::leaf(sid)),
            },
        );
        tracing::debug!("Added surface {}", sid);
    }

    pub fn lookup(&self, sid: SurfaceId) -> Option<&Surface> {
        self.entries.get(&sid).map(|e| &e.surface)
    }

    pub fn lookup_mut(&mut self, sid: SurfaceId) -> Option<&mut Surface> {
        self.entries.get_mut(&sid).map(|e| &mut e.surface)
    }

    pub fn attachment(&self, sid: SurfaceId) -> Option<&Attachment> {
        self.entries.get(&sid).map(|e| &e.attachment)
    }

    /// Apply `f` to a surface's committed state.
    pub fn modify_state(&mut self, sid: SurfaceId, f: impl FnOnce(&mut SurfaceState)) -> Option<()> {
        f(&mut self.entries.get_mut(&sid)?.surface.state);
        Some(())
    }

    /// All backend handles in the map, in surface-id order.
    pub fn backend_handles(&self) -> Vec<BackendSurfaceHandle> {
        let mut ids: Vec<SurfaceId> = self.entries.keys().copied().collect();
        ids.sort();
        ids.iter().map(|sid| self.entries[sid].surface.backend).collect()
    }

    /// The root of the tree containing `sid`.
    pub fn root_of(&self, sid: SurfaceId) -> Option<SurfaceId> {
        let mut cur = sid;
        for _ in 0..=self.entries.len() {
            match self.entries.get(&cur)?.attachment {
                Attachment::Root(_) => return Some(cur),
                Attachment::Child(parent) => cur = parent,
            }
        }
        tracing::error!("Surface {} does not resolve to a root", sid);
        None
    }

    /// True when `ancestor` appears on `sid`'s parent chain.
    fn is_ancestor(&self, ancestor: SurfaceId, sid: SurfaceId) -> bool {
        let mut cur = sid;
        for _ in 0..=self.entries.len() {
            match self.entries.get(&cur).map(|e| &e.attachment) {
                Some(Attachment::Child(parent)) => {
                    if *parent == ancestor {
                        return true;
                    }
                    cur = *parent;
                }
                _ => return false,
            }
        }
        false
    }

    /// Detach `sid` from its parent, promoting its sub-tree to a root.
    /// No-op when `sid` already is one.
    fn detach(&mut self, sid: SurfaceId) -> Option<()> {
        let parent = match self.entries.get(&sid)?.attachment {
            Attachment::Root(_) => return Some(()),
            Attachment::Child(parent) => parent,
        };
        let root = self.root_of(parent)?;
        let sub = {
            let entry = self.entries.get_mut(&root)?;
            match &mut entry.attachment {
                Attachment::Root(tree) => tree.detach(sid)?,
                Attachment::Child(_) => return None,
            }
        };
        let entry = self.entries.get_mut(&sid)?;
        entry.attachment = Attachment::Root(sub);
        entry.surface.position = V2::ZERO;
        Some(())
    }

    /// Detach `sid` and, when `parent` is given, splice its whole sub-tree
    /// under `parent` on top of the stacking order. Fails when either id is
    /// absent or when the attachment would create a cycle.
    pub fn attach(&mut self, sid: SurfaceId, parent: Option<SurfaceId>) -> Option<()> {
        let Some(parent) = parent else {
            return self.detach(sid);
        };
        if !self.entries.contains_key(&parent) || sid == parent {
            return None;
        }
        if self.is_ancestor(sid, parent) {
            tracing::debug!("Refusing to attach {} under its descendant {}", sid, parent);
            return None;
        }
        self.detach(sid)?;
        let root = self.root_of(parent)?;
        let sub = match mem::replace(
            &mut self.entries.get_mut(&sid)?.attachment,
            Attachment::Child(parent),
        ) {
            Attachment::Root(tree) => tree,
            Attachment::Child(_) => SurfaceTree::leaf(sid),
        };
        let spliced = {
            let entry = self.entries.get_mut(&root)?;
            match &mut entry.attachment {
                Attachment::Root(tree) => tree.splice(parent, sub),
                Attachment::Child(_) => Err(sub),
            }
        };
        match spliced {
            Ok(()) => Some(()),
            Err(sub) => {
                // The owning tree no longer knows the parent; restore `sid`
                // to a root so the map stays consistent.
                self.entries.get_mut(&sid)?.attachment = Attachment::Root(sub);
                None
            }
        }
    }

    /// Remove a surface. It is detached from its parent first, then each of
    /// its direct children becomes the root of its own tree.
    pub fn delete(&mut self, sid: SurfaceId) -> Option<Surface> {
        self.detach(sid)?;
        let entry = self.entries.remove(&sid)?;
        let tree = match entry.attachment {
            Attachment::Root(tree) => tree,
            Attachment::Child(_) => SurfaceTree::leaf(sid),
        };
        let SurfaceTree { below, above, .. } = tree;
        for child in below.into_iter().chain(above) {
            if let Some(child_entry) = self.entries.get_mut(&child.id) {
                child_entry.surface.position = V2::ZERO;
                child_entry.attachment = Attachment::Root(child);
            }
        }
        tracing::debug!("Removed surface {}", sid);
        Some(entry.surface)
    }

    /// Set a surface's offset relative to its parent.
    pub fn set_position(&mut self, sid: SurfaceId, position: V2) -> Option<()> {
        self.entries.get_mut(&sid)?.surface.position = position;
        Some(())
    }

    /// Move `sid` in its parent's stacking order so it is drawn immediately
    /// above (or below) `sibling`; `sibling` may be the parent itself.
    /// Unknown ids are reported apart from bad arrangements so the engine
    /// can answer with the matching protocol error.
    pub fn restack(
        &mut self,
        sid: SurfaceId,
        sibling: SurfaceId,
        above: bool,
    ) -> Result<(), RestackError> {
        if !self.entries.contains_key(&sid) || !self.entries.contains_key(&sibling) {
            return Err(RestackError::UnknownSurface);
        }
        if sid == sibling {
            return Err(RestackError::NotSiblings);
        }
        let parent = match self.entries.get(&sid).map(|e| &e.attachment) {
            Some(Attachment::Child(parent)) => *parent,
            _ => return Err(RestackError::NotSiblings),
        };
        if sibling != parent {
            match self.entries.get(&sibling).map(|e| &e.attachment) {
                Some(Attachment::Child(sp)) if *sp == parent => {}
                _ => return Err(RestackError::NotSiblings),
            }
        }
        let root = self.root_of(parent).ok_or(RestackError::UnknownSurface)?;
        let entry = self
            .entries
            .get_mut(&root)
            .ok_or(RestackError::UnknownSurface)?;
        match &mut entry.attachment {
            Attachment::Root(tree) => {
                if tree.restack(parent, sid, sibling, above) {
                    Ok(())
                } else {
                    Err(RestackError::NotSiblings)
                }
            }
            Attachment::Child(_) => Err(RestackError::NotSiblings),
        }
    }

    /// True when `sid` or any of its ancestors is in synchronized mode.
    pub fn effectively_sync(&self, sid: SurfaceId) -> bool {
        let mut cur = sid;
        for _ in 0..=self.entries.len() {
            let Some(entry) = self.entries.get(&cur) else {
                return false;
            };
            if entry.surface.sync {
                return true;
            }
            match entry.attachment {
                Attachment::Root(_) => return false,
                Attachment::Child(parent) => cur = parent,
            }
        }
        false
    }

    /// Commit `state` onto `sid`. A synchronized surface caches the state;
    /// otherwise it is applied at once together with any cached states in
    /// the sub-tree. Returns the applications that took effect.
    pub fn commit(&mut self, sid: SurfaceId, state: SurfaceState) -> Option<Vec<CommitApplied>> {
        if self.effectively_sync(sid) {
            self.entries.get_mut(&sid)?.surface.cached = Some(state);
            tracing::debug!("Surface {} committed to cache (sync mode)", sid);
            return Some(Vec::new());
        }
        let entry = self.entries.get_mut(&sid)?;
        let was_mapped = entry.surface.state.is_mapped();
        entry.surface.state = state;
        let now_mapped = entry.surface.state.is_mapped();
        let mut applied = vec![CommitApplied {
            sid,
            was_mapped,
            now_mapped,
        }];
        self.apply_cached_subtree(sid, &mut applied);
        Some(applied)
    }

    /// Toggle synchronized mode. Leaving sync under a desynchronized parent
    /// applies the cached state immediately.
    pub fn set_sync(&mut self, sid: SurfaceId, sync: bool) -> Option<Vec<CommitApplied>> {
        self.entries.get_mut(&sid)?.surface.sync = sync;
        let mut applied = Vec::new();
        if !sync && !self.effectively_sync(sid) {
            if let Some(entry) = self.entries.get_mut(&sid) {
                if let Some(cached) = entry.surface.cached.take() {
                    let was_mapped = entry.surface.state.is_mapped();
                    entry.surface.state = cached;
                    applied.push(CommitApplied {
                        sid,
                        was_mapped,
                        now_mapped: entry.surface.state.is_mapped(),
                    });
                }
            }
            self.apply_cached_subtree(sid, &mut applied);
        }
        Some(applied)
    }

    fn apply_cached_subtree(&mut self, sid: SurfaceId, applied: &mut Vec<CommitApplied>) {
        let Some(ids) = self.flatten_ids(sid) else {
            return;
        };
        for id in ids.into_iter().filter(|&id| id != sid) {
            if let Some(entry) = self.entries.get_mut(&id) {
                if let Some(cached) = entry.surface.cached.take() {
                    let was_mapped = entry.surface.state.is_mapped();
                    entry.surface.state = cached;
                    applied.push(CommitApplied {
                        sid: id,
                        was_mapped,
                        now_mapped: entry.surface.state.is_mapped(),
                    });
                }
            }
        }
    }

    /// Flatten the sub-tree rooted at `sid` in draw order, pairing every
    /// surface's accumulated offset (starting from `root_offset`) with its
    /// backend handle.
    pub fn flatten(
        &self,
        root_offset: V2,
        sid: SurfaceId,
    ) -> Option<Vec<(V2, BackendSurfaceHandle)>> {
        let node = self.find_node(sid)?;
        let mut out = Vec::new();
        self.walk(node, root_offset, &mut out);
        Some(out)
    }

    /// As `flatten`, but only the surface ids.
    pub fn flatten_ids(&self, sid: SurfaceId) -> Option<Vec<SurfaceId>> {
        Some(self.find_node(sid)?.flatten())
    }

    fn find_node(&self, sid: SurfaceId) -> Option<&SurfaceTree> {
        let root = self.root_of(sid)?;
        match &self.entries.get(&root)?.attachment {
            Attachment::Root(tree) => tree.find(sid),
            Attachment::Child(_) => None,
        }
    }

    fn walk(&self, node: &SurfaceTree, base: V2, out: &mut Vec<(V2, BackendSurfaceHandle)>) {
        let Some(entry) = self.entries.get(&node.id) else {
            tracing::error!("Surface {} is in a tree but not in the map", node.id);
            return;
        };
        let at = base + entry.surface.position + entry.surface.state.buffer_offset;
        for child in &node.below {
            self.walk(child, at, out);
        }
        out.push((at, entry.surface.backend));
        for child in &node.above {
            self.walk(child, at, out);
        }
    }
}
