//! Physical outputs and the global coordinate strip.
//!
//! Outputs are laid out side by side along +X starting at X = 0. The
//! engine's output list keeps the right-most output at the head, so the
//! next free X coordinate is always read off the front.

use crate::core::ids::OutputId;
use crate::util::geometry::{Rect, Size, V2};

/// Output transform, bit-exact with `wl_output.transform`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Transform {
    Normal = 0,
    Rot90 = 1,
    Rot180 = 2,
    Rot270 = 3,
    Flipped = 4,
    Flipped90 = 5,
    Flipped180 = 6,
    Flipped270 = 7,
}

impl Default for Transform {
    fn default() -> Self {
        Self::Normal
    }
}

impl Transform {
    /// Portrait transforms swap the output's width and height.
    pub fn is_portrait(self) -> bool {
        matches!(
            self,
            Transform::Rot90 | Transform::Rot270 | Transform::Flipped90 | Transform::Flipped270
        )
    }
}

/// A physical output as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub id: OutputId,
    pub name: String,
    /// Native mode width in physical pixels.
    pub width: u32,
    /// Native mode height in physical pixels.
    pub height: u32,
    pub scale: u32,
    pub transform: Transform,
}

impl Output {
    /// Size in compositor coordinates: the scale divides both axes and a
    /// portrait transform swaps them.
    pub fn effective_size(&self) -> Size {
        let scale = self.scale.max(1);
        let (w, h) = if self.transform.is_portrait() {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        };
        Size::new(w / scale, h / scale)
    }
}

/// An output placed in the global strip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedOutput {
    pub output: Output,
    pub rect: Rect,
}

impl MappedOutput {
    /// The first free X coordinate to the right of this output.
    pub fn right_edge(&self) -> i32 {
        self.rect.x2 + 1
    }
}

/// Place one output with its left edge at `x_offset`.
pub fn map_output(x_offset: i32, output: Output) -> MappedOutput {
    let size = output.effective_size();
    MappedOutput {
        output,
        rect: Rect::from_origin_size(V2::new(x_offset, 0), size),
    }
}

/// Map a whole list into a contiguous strip, anchoring the last element at
/// `x_offset` and growing rightward. List order is preserved, so the head
/// of the result is the right-most output.
pub fn map_outputs(x_offset: i32, outputs: Vec<Output>) -> Vec<MappedOutput> {
    let mut mapped: Vec<MappedOutput> = Vec::with_capacity(outputs.len());
    for output in outputs.into_iter().rev() {
        let x = mapped.first().map_or(x_offset, MappedOutput::right_edge);
        mapped.insert(0, map_output(x, output));
    }
    mapped
}

/// Remove `oid` from the strip and close the gap. The outputs on the
/// removed output's right (earlier in the list) are remapped leftward onto
/// its old left edge; the outputs on its left keep their rectangles, so the
/// strip stays contiguous from X = 0. Returns the removed output, or `None`
/// when the id is unknown.
pub fn delete_output(oid: OutputId, outputs: &mut Vec<MappedOutput>) -> Option<MappedOutput> {
    let idx = outputs.iter().position(|m| m.output.id == oid)?;
    let removed = outputs.remove(idx);
    let rights: Vec<Output> = outputs.drain(..idx).map(|m| m.output).collect();
    let mut remapped = map_outputs(removed.rect.x1, rights);
    remapped.append(outputs);
    *outputs = remapped;
    tracing::debug!("Unmapped output {} from the strip", removed.output.id);
    Some(removed)
}
