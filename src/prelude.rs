//! Common imports and types used throughout the crate.

pub use std::collections::HashMap;

pub use crate::core::errors::{CoreError, Result};
pub use crate::core::ids::{ClientId, ClientSurfaceId, OutputId, SurfaceId};
pub use crate::util::geometry::{Rect, Size, V2};
