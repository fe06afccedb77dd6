//! Client-facing request and event vocabulary.
//!
//! The wire codec parses protocol bytes into `Request` values and
//! serializes `Event` values back to the socket; the core never touches
//! bytes. Surface ids inside a request are always interpreted in the
//! namespace of the sending client.

use crate::core::ids::SurfaceId;
use crate::core::output::MappedOutput;
use crate::core::surface::{Buffer, SurfaceState};
use crate::util::geometry::{Size, V2};

/// A parsed client request.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    SurfaceCreate {
        sid: SurfaceId,
    },
    SurfaceDestroy {
        sid: SurfaceId,
    },
    /// Atomically apply a batch of freshly committed surface states.
    SurfaceCommit {
        updates: Vec<(SurfaceId, SurfaceState)>,
    },
    /// Attach under a parent, or detach when `parent` is `None`.
    SurfaceAttach {
        sid: SurfaceId,
        parent: Option<SurfaceId>,
    },
    /// Set the offset relative to the parent surface.
    SurfaceSetPosition {
        sid: SurfaceId,
        position: V2,
    },
    /// Toggle synchronized sub-surface mode.
    SurfaceSetSync {
        sid: SurfaceId,
        sync: bool,
    },
    SurfacePlaceAbove {
        sid: SurfaceId,
        sibling: SurfaceId,
    },
    SurfacePlaceBelow {
        sid: SurfaceId,
        sibling: SurfaceId,
    },
}

/// Why a client request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientError {
    /// A request named a surface id the client never created, or an
    /// arrangement (cycle, cross-tree attach) no surface can be in.
    BadSurface,
    /// A stacking request named surfaces that are not siblings.
    BadWindow,
}

/// An event delivered to one client (or broadcast to all of them).
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    OutputAdded(MappedOutput),
    OutputRemoved(MappedOutput),
    /// The named surfaces should draw their next frame.
    SurfaceFrame(Vec<SurfaceId>),
    /// The backend no longer reads from this buffer.
    BufferReleased(Buffer),
    /// The window's assigned size changed; the client should re-render.
    WindowConfigure {
        sid: SurfaceId,
        size: Size,
    },
    Error(ClientError),
}
