//! Surface contents and window metadata.
//!
//! A surface carries exactly one committed state. While a surface is in
//! synchronized mode a freshly committed state is parked in `cached`
//! instead and applied when the nearest desynchronized ancestor commits.

use crate::core::backend::BackendSurfaceHandle;
use crate::core::ids::SurfaceId;
use crate::core::output::Transform;
use crate::core::surface::buffer::Buffer;
use crate::util::geometry::{Rect, V2};

/// Window metadata a client assigns to a surface it wants mapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowState {
    pub title: String,
    pub class: String,
    /// Content rectangle within the surface (excludes client-side shadow).
    pub geometry: Rect,
    /// Present for popups: the parent surface and the offset within it.
    pub popup: Option<(SurfaceId, V2)>,
}

/// The committed (or cached) contents of one surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceState {
    pub buffer: Option<Buffer>,
    pub buffer_offset: V2,
    pub scale: i32,
    pub damage: Vec<Rect>,
    /// `None` means fully transparent.
    pub opaque_region: Option<Vec<Rect>>,
    /// `None` means the whole surface accepts input.
    pub input_region: Option<Vec<Rect>>,
    pub transform: Transform,
    pub window: Option<WindowState>,
}

impl Default for SurfaceState {
    fn default() -> Self {
        Self {
            buffer: None,
            buffer_offset: V2::ZERO,
            scale: 1,
            damage: Vec::new(),
            opaque_region: None,
            input_region: None,
            transform: Transform::Normal,
            window: None,
        }
    }
}

impl SurfaceState {
    /// A surface is mapped when it carries both window metadata and a
    /// buffer; only mapped surfaces participate in layout.
    pub fn is_mapped(&self) -> bool {
        self.window.is_some() && self.buffer.is_some()
    }
}

/// A surface in the map: committed contents plus the backend handle.
#[derive(Debug, Clone)]
pub struct Surface {
    pub state: SurfaceState,
    /// Committed state waiting for the next desynchronized ancestor commit.
    pub cached: Option<SurfaceState>,
    /// Synchronized sub-surface mode.
    pub sync: bool,
    /// Offset relative to the parent surface; meaningful while attached.
    pub position: V2,
    pub backend: BackendSurfaceHandle,
}

impl Surface {
    pub fn new(backend: BackendSurfaceHandle) -> Self {
        Self {
            state: SurfaceState::default(),
            cached: None,
            sync: false,
            position: V2::ZERO,
            backend,
        }
    }

    pub fn is_mapped(&self) -> bool {
        self.state.is_mapped()
    }
}
