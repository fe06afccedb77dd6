//! Id-level surface trees.
//!
//! A root surface owns the canonical structure of its sub-tree as a tree of
//! surface ids. Children are split into the sequence drawn *below* the node
//! and the sequence drawn *above* it; within each sequence, later entries
//! are drawn later (on top). Keeping the structure at the id level means a
//! sub-tree move never rewires owning references.

use crate::core::ids::SurfaceId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceTree {
    pub id: SurfaceId,
    pub below: Vec<SurfaceTree>,
    pub above: Vec<SurfaceTree>,
}

impl SurfaceTree {
    pub fn leaf(id: SurfaceId) -> Self {
        Self {
            id,
            below: Vec::new(),
            above: Vec::new(),
        }
    }

    /// Number of surfaces in the tree, including the root.
    pub fn len(&self) -> usize {
        1 + self
            .below
            .iter()
            .chain(self.above.iter())
            .map(SurfaceTree::len)
            .sum::<usize>()
    }

    pub fn contains(&self, id: SurfaceId) -> bool {
        self.find(id).is_some()
    }

    pub fn find(&self, id: SurfaceId) -> Option<&SurfaceTree> {
        if self.id == id {
            return Some(self);
        }
        self.below
            .iter()
            .chain(self.above.iter())
            .find_map(|child| child.find(id))
    }

    fn find_mut(&mut self, id: SurfaceId) -> Option<&mut SurfaceTree> {
        if self.id == id {
            return Some(self);
        }
        self.below
            .iter_mut()
            .chain(self.above.iter_mut())
            .find_map(|child| child.find_mut(id))
    }

    /// Depth-first, below-then-node-then-above draw order.
    pub fn flatten(&self) -> Vec<SurfaceId> {
        let mut out = Vec::with_capacity(self.len());
        self.walk(&mut out);
        out
    }

    fn walk(&self, out: &mut Vec<SurfaceId>) {
        for child in &self.below {
            child.walk(out);
        }
        out.push(self.id);
        for child in &self.above {
            child.walk(out);
        }
    }

    /// Remove the sub-tree rooted at `id` and return it. The tree is left
    /// unchanged when `id` is absent or is this tree's own root.
    pub fn detach(&mut self, id: SurfaceId) -> Option<SurfaceTree> {
        for list in [&mut self.below, &mut self.above] {
            if let Some(pos) = list.iter().position(|t| t.id == id) {
                return Some(list.remove(pos));
            }
        }
        self.below
            .iter_mut()
            .chain(self.above.iter_mut())
            .find_map(|child| child.detach(id))
    }

    /// Splice `sub` on top of `parent`'s stacking order. On failure the
    /// sub-tree is handed back so the caller can restore it.
    pub fn splice(&mut self, parent: SurfaceId, sub: SurfaceTree) -> Result<(), SurfaceTree> {
        match self.find_mut(parent) {
            Some(node) => {
                node.above.push(sub);
                Ok(())
            }
            None => Err(sub),
        }
    }

    /// Move direct child `sid` of `parent` so it is drawn immediately above
    /// (or below) `sibling`, where `sibling` may be `parent` itself. Returns
    /// false when the nodes are not arranged that way.
    pub fn restack(
        &mut self,
        parent: SurfaceId,
        sid: SurfaceId,
        sibling: SurfaceId,
        above: bool,
    ) -> bool {
        let Some(node) = self.find_mut(parent) else {
            return false;
        };
        node.restack_child(sid, sibling, above)
    }

    fn restack_child(&mut self, sid: SurfaceId, sibling: SurfaceId, above: bool) -> bool {
        if sid == sibling {
            return false;
        }
        let sibling_present = sibling == self.id
            || self
                .below
                .iter()
                .chain(self.above.iter())
                .any(|t| t.id == sibling);
        if !sibling_present {
            return false;
        }
        let Some(sub) = self.detach_direct(sid) else {
            return false;
        };

        if sibling == self.id {
            // Immediately above the node is the bottom of the above stack;
            // immediately below it is the top of the below stack.
            if above {
                self.above.insert(0, sub);
            } else {
                self.below.push(sub);
            }
            return true;
        }
        if let Some(i) = self.below.iter().position(|t| t.id == sibling) {
            self.below.insert(if above { i + 1 } else { i }, sub);
            return true;
        }
        if let Some(i) = self.above.iter().position(|t| t.id == sibling) {
            self.above.insert(if above { i + 1 } else { i }, sub);
            return true;
        }
        self.above.push(sub);
        false
    }

    fn detach_direct(&mut self, id: SurfaceId) -> Option<SurfaceTree> {
        for list in [&mut self.below, &mut self.above] {
            if let Some(pos) = list.iter().position(|t| t.id == id) {
                return Some(list.remove(pos));
            }
        }
        None
    }
}
