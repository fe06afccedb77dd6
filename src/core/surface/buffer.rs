//! Client pixel buffers.

use crate::core::ids::ClientId;

/// Pixel format of a client buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferFormat {
    Argb8888,
    Xrgb8888,
}

/// An opaque handle to client pixel data.
///
/// The client that attached the buffer owns it until the backend reports it
/// released; the core only routes the release notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer {
    pub format: BufferFormat,
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    pub client_id: ClientId,
}
