//! Workspace, screen, and floating-window model.
//!
//! The universe knows windows only by their opaque identity `W`; it never
//! dereferences them. The engine owns the join between window identities
//! and surface contents.

pub mod zipper;

use std::collections::HashMap;
use std::hash::Hash;

use crate::core::output::MappedOutput;
use crate::util::geometry::Rect;
use self::zipper::FocusList;

#[cfg(test)]
mod tests;

/// A named, ordered collection of windows with a focus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace<W> {
    pub tag: String,
    pub windows: FocusList<W>,
}

impl<W> Workspace<W> {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            windows: FocusList::new(),
        }
    }
}

/// A workspace currently shown on an output.
#[derive(Debug, Clone, PartialEq)]
pub struct Screen<W> {
    pub workspace: Workspace<W>,
    pub output: MappedOutput,
}

/// The whole focus model: visible screens, hidden workspaces, and floating
/// rectangle overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct Universe<W: Eq + Hash> {
    pub screens: FocusList<Screen<W>>,
    pub hidden: Vec<Workspace<W>>,
    pub floating: HashMap<W, Rect>,
}

impl<W: Copy + Eq + Hash> Universe<W> {
    /// An empty universe: every tag starts out as a hidden workspace.
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            screens: FocusList::new(),
            hidden: tags.into_iter().map(|tag| Workspace::new(tag)).collect(),
            floating: HashMap::new(),
        }
    }

    /// Rebuild the screen list for a new set of outputs. Workspaces are
    /// drawn in presentation order (currently visible first, then hidden)
    /// and zipped with the outputs by index; surplus workspaces return to
    /// hidden and surplus outputs get no screen. Floating overrides are
    /// untouched.
    pub fn set_outputs(&mut self, outputs: Vec<MappedOutput>) {
        let mut workspaces: Vec<Workspace<W>> = std::mem::take(&mut self.screens)
            .into_vec()
            .into_iter()
            .map(|screen| screen.workspace)
            .collect();
        workspaces.append(&mut self.hidden);

        let visible = workspaces.len().min(outputs.len());
        let rest = workspaces.split_off(visible);
        let screens: Vec<Screen<W>> = workspaces
            .into_iter()
            .zip(outputs)
            .map(|(workspace, output)| Screen { workspace, output })
            .collect();

        self.screens = FocusList::from_vec(screens);
        self.hidden = rest;
    }

    /// Insert a window above the cursor of the focused screen's workspace.
    /// Without any screen it goes to the first hidden workspace; without
    /// any workspace at all this is a no-op.
    pub fn insert(&mut self, window: W) {
        if let Some(screen) = self.screens.focus_mut() {
            screen.workspace.windows.insert(window);
        } else if let Some(workspace) = self.hidden.first_mut() {
            workspace.windows.insert(window);
        } else {
            tracing::warn!("No workspace to hold a new window");
        }
    }

    /// Remove a window from wherever it lives, floating included.
    pub fn delete(&mut self, window: W) {
        self.filter(|w| *w != window);
    }

    /// Keep only the windows matching `pred`, everywhere.
    pub fn filter(&mut self, pred: impl Fn(&W) -> bool) {
        for screen in self.screens.iter_mut() {
            screen.workspace.windows.retain(&pred);
        }
        for workspace in &mut self.hidden {
            workspace.windows.retain(&pred);
        }
        self.floating.retain(|w, _| pred(w));
    }

    pub fn contains(&self, window: &W) -> bool {
        self.workspaces().any(|ws| ws.windows.contains(window))
    }

    /// All workspaces, visible first.
    pub fn workspaces(&self) -> impl Iterator<Item = &Workspace<W>> {
        self.screens
            .iter()
            .map(|screen| &screen.workspace)
            .chain(self.hidden.iter())
    }

    /// Give a window a floating rectangle (screen-relative).
    pub fn float(&mut self, window: W, rect: Rect) {
        self.floating.insert(window, rect);
    }

    /// Return a floating window to the tiled set.
    pub fn sink(&mut self, window: &W) {
        self.floating.remove(window);
    }

    /// Bring the named workspace to the focused screen: focus the screen
    /// already showing it, or swap it out of hidden. Unknown tags are a
    /// no-op.
    pub fn view(&mut self, tag: &str) {
        if self.focused_tag_is(tag) {
            return;
        }
        if self.screens.iter().any(|s| s.workspace.tag == tag) {
            self.screens.focus_to(|s| s.workspace.tag == tag);
            return;
        }
        let Some(pos) = self.hidden.iter().position(|ws| ws.tag == tag) else {
            return;
        };
        let Some(screen) = self.screens.focus_mut() else {
            return;
        };
        let incoming = self.hidden.remove(pos);
        let outgoing = std::mem::replace(&mut screen.workspace, incoming);
        self.hidden.push(outgoing);
    }

    /// Pull the named workspace onto the focused screen even when another
    /// screen is showing it, pushing the current workspace to wherever the
    /// named one came from.
    pub fn greedy_view(&mut self, tag: &str) {
        if self.focused_tag_is(tag) {
            return;
        }
        if self.hidden.iter().any(|ws| ws.tag == tag) {
            self.view(tag);
            return;
        }
        let Some(focus_index) = self.screens.focus_index() else {
            return;
        };
        let mut screens = std::mem::take(&mut self.screens).into_vec();
        if let Some(other) = screens.iter().position(|s| s.workspace.tag == tag) {
            let (lo, hi) = (focus_index.min(other), focus_index.max(other));
            let (head, tail) = screens.split_at_mut(hi);
            std::mem::swap(&mut head[lo].workspace, &mut tail[0].workspace);
        }
        self.screens = FocusList::from_vec_at(screens, focus_index);
    }

    fn focused_tag_is(&self, tag: &str) -> bool {
        self.screens
            .focus()
            .is_some_and(|screen| screen.workspace.tag == tag)
    }
}
