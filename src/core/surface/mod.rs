pub mod buffer;
pub mod map;
pub mod surface;
pub mod tree;

pub use buffer::{Buffer, BufferFormat};
pub use map::{Attachment, CommitApplied, RestackError, SurfaceMap};
pub use surface::{Surface, SurfaceState, WindowState};
pub use tree::SurfaceTree;

#[cfg(test)]
pub mod tests;
