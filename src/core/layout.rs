//! Pure window layout.
//!
//! `layout` is total and deterministic: it reads nothing but the universe
//! (outputs travel inside the screens) and assigns every visible window a
//! rectangle. Hidden workspaces contribute nothing.

use std::hash::Hash;

use crate::core::output::MappedOutput;
use crate::core::universe::zipper::FocusList;
use crate::core::universe::{Screen, Universe};
use crate::util::geometry::Rect;

/// Rectangles assigned to the windows of one output.
pub type ScreenLayout<W> = (MappedOutput, Vec<(Rect, W)>);

/// Assign a rectangle to every window of every visible workspace.
///
/// Policy: vertical stack with master. The focused window fills the left
/// half and the remaining windows split the right half evenly; a lone
/// window fills the whole screen. Windows with a floating override keep
/// their stored rectangle, translated to the screen origin.
pub fn layout<W: Copy + Eq + Hash>(universe: &Universe<W>) -> Vec<ScreenLayout<W>> {
    universe
        .screens
        .iter()
        .map(|screen| (screen.output.clone(), tile(screen, universe)))
        .collect()
}

fn tile<W: Copy + Eq + Hash>(screen: &Screen<W>, universe: &Universe<W>) -> Vec<(Rect, W)> {
    let area = screen.output.rect;
    let mut rects = stack_with_master(area, &screen.workspace.windows);
    for (rect, window) in &mut rects {
        if let Some(float) = universe.floating.get(window) {
            *rect = float.translate(area.origin());
        }
    }
    rects
}

fn stack_with_master<W: Copy + Eq>(area: Rect, windows: &FocusList<W>) -> Vec<(Rect, W)> {
    let Some(&master) = windows.focus() else {
        return Vec::new();
    };
    let stacked: Vec<W> = windows.iter().copied().filter(|w| *w != master).collect();
    if stacked.is_empty() {
        return vec![(area, master)];
    }

    let master_width = area.width() / 2;
    let master_rect = Rect::new(
        area.x1,
        area.y1,
        area.x1 + master_width as i32 - 1,
        area.y2,
    );
    let column = Rect::new(area.x1 + master_width as i32, area.y1, area.x2, area.y2);

    let mut out = vec![(master_rect, master)];
    let rows = stacked.len() as i64;
    let height = i64::from(column.height());
    for (i, window) in stacked.into_iter().enumerate() {
        let i = i as i64;
        // Split the column by cumulative fractions so the rows tile it
        // exactly even when the height does not divide evenly.
        let y1 = column.y1 + (i * height / rows) as i32;
        let y2 = column.y1 + ((i + 1) * height / rows) as i32 - 1;
        out.push((Rect::new(column.x1, y1, column.x2, y2), window));
    }
    out
}
