//! Id newtypes and the free-id allocator.
//!
//! Ids are opaque unsigned integers; the newtypes keep clients, surfaces,
//! and outputs from being mixed up at compile time.

use std::fmt;

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type! {
    /// A connected client, unique per compositor.
    ClientId
}

id_type! {
    /// A surface, unique within its client.
    SurfaceId
}

id_type! {
    /// A physical output, unique per compositor.
    OutputId
}

/// Global window identity: a surface qualified by its owning client.
pub type ClientSurfaceId = (ClientId, SurfaceId);

/// Allocates the smallest free non-negative id and reclaims returned ones.
///
/// Free ids are kept as a sorted list of disjoint inclusive intervals, so
/// long-running sessions reuse low ids instead of growing without bound.
#[derive(Debug, Clone)]
pub struct IdPool {
    free: Vec<(u32, u32)>,
}

impl Default for IdPool {
    fn default() -> Self {
        Self::new()
    }
}

impl IdPool {
    pub fn new() -> Self {
        Self {
            free: vec![(0, u32::MAX)],
        }
    }

    /// Take the smallest free id, or `None` when the space is exhausted.
    pub fn acquire(&mut self) -> Option<u32> {
        let (lo, hi) = *self.free.first()?;
        if lo == hi {
            self.free.remove(0);
        } else {
            self.free[0] = (lo + 1, hi);
        }
        Some(lo)
    }

    /// Return an id to the pool. Releasing an id that is already free is a
    /// no-op.
    pub fn release(&mut self, id: u32) {
        let i = self.free.partition_point(|&(_, hi)| hi < id);
        if i < self.free.len() && self.free[i].0 <= id {
            return;
        }
        let merges_left = i > 0 && self.free[i - 1].1.saturating_add(1) == id;
        let merges_right = i < self.free.len() && id.saturating_add(1) == self.free[i].0;
        match (merges_left, merges_right) {
            (true, true) => {
                self.free[i - 1].1 = self.free[i].1;
                self.free.remove(i);
            }
            (true, false) => self.free[i - 1].1 = id,
            (false, true) => self.free[i].0 = id,
            (false, false) => self.free.insert(i, (id, id)),
        }
    }
}
