//! The rendering-backend seam.
//!
//! The backend owns GPU and framebuffer resources, reports output hotplug
//! and frame ticks, and consumes commit batches. The core only holds
//! opaque handles to backend-side surfaces.

use crate::core::ids::OutputId;
use crate::core::output::Output;
use crate::core::surface::Buffer;
use crate::util::geometry::{Rect, V2};

/// Opaque handle to a backend-side surface resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BackendSurfaceHandle(pub u64);

/// Hands out fresh backend surface handles.
///
/// Handles follow the surface: obtained on creation, relinquished through
/// `BackendRequest::SurfaceDestroy`.
pub trait BackendHandleSource {
    fn fresh_surface(&mut self) -> BackendSurfaceHandle;
}

/// Trivial in-process handle source for headless runs and tests.
#[derive(Debug, Default)]
pub struct SerialHandleSource {
    next: u64,
}

impl BackendHandleSource for SerialHandleSource {
    fn fresh_surface(&mut self) -> BackendSurfaceHandle {
        let handle = BackendSurfaceHandle(self.next);
        self.next += 1;
        handle
    }
}

/// An event reported by the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    BufferReleased(Buffer),
    OutputAdded(Output),
    OutputRemoved(OutputId),
    /// The output presented a frame; surfaces shown on it may draw again.
    OutputFrame(OutputId),
}

/// One window's flattened surfaces inside its assigned rectangle.
pub type CommitRect = (Rect, Vec<(V2, BackendSurfaceHandle)>);

/// Everything the backend should draw on one output.
pub type OutputCommit = (OutputId, Vec<CommitRect>);

/// A request issued to the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendRequest {
    SurfaceCommit(Vec<OutputCommit>),
    SurfaceDestroy(Vec<BackendSurfaceHandle>),
}
