//! Central compositor state machine.
//!
//! The `Engine` consumes the single serialized input stream and owns the
//! authoritative model: which surfaces exist, how they hang together, which
//! windows sit on which workspace, and what every window's rectangle is.
//! Each input is processed to completion and its effects come back in
//! program order; nothing blocks, retries, or waits inside a handler.

use std::collections::{HashMap, HashSet};

use crate::core::backend::{
    BackendEvent, BackendHandleSource, BackendRequest, CommitRect, OutputCommit,
};
use crate::core::errors::CoreError;
use crate::core::event::{ClientError, Event, Request};
use crate::core::ids::{ClientId, ClientSurfaceId, OutputId, SurfaceId};
use crate::core::layout::{layout, ScreenLayout};
use crate::core::output::{delete_output, map_output, MappedOutput, Output};
use crate::core::surface::{
    Buffer, CommitApplied, RestackError, Surface, SurfaceMap, SurfaceState,
};
use crate::core::universe::Universe;
use crate::util::geometry::{Size, V2};


// ============================================================================
// Inputs and effects
// ============================================================================

/// One unit of work for the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum CoreInput {
    ClientAdd(ClientId),
    ClientDel(ClientId),
    ClientRequest(ClientId, Request),
    BackendEvent(BackendEvent),
}

/// An effect emitted by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum CoreOutput {
    /// An event for one client, or a broadcast when `target` is `None`.
    ClientEvent {
        target: Option<ClientId>,
        event: Event,
    },
    BackendRequest(BackendRequest),
    /// Internal inconsistency; the offending operation was skipped.
    Error(CoreError),
}

/// Per-client bookkeeping.
#[derive(Debug, Default)]
pub struct ClientData {
    pub surfaces: SurfaceMap,
}

// ============================================================================
// Engine
// ============================================================================

pub struct Engine<H> {
    /// Mapped outputs, right-most first.
    outputs: Vec<MappedOutput>,
    clients: HashMap<ClientId, ClientData>,
    universe: Universe<ClientSurfaceId>,
    last_layout: Vec<ScreenLayout<ClientSurfaceId>>,
    handles: H,
    /// Effects of the input currently being processed, in program order.
    effects: Vec<CoreOutput>,
}

impl<H: BackendHandleSource> Engine<H> {
    pub fn new<I, S>(tags: I, handles: H) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            outputs: Vec::new(),
            clients: HashMap::new(),
            universe: Universe::new(tags),
            last_layout: Vec::new(),
            handles,
            effects: Vec::new(),
        }
    }

    pub fn outputs(&self) -> &[MappedOutput] {
        &self.outputs
    }

    pub fn universe(&self) -> &Universe<ClientSurfaceId> {
        &self.universe
    }

    pub fn last_layout(&self) -> &[ScreenLayout<ClientSurfaceId>] {
        &self.last_layout
    }

    /// Process one input to completion, returning its effects in order.
    pub fn dispatch(&mut self, input: CoreInput) -> Vec<CoreOutput> {
        match input {
            CoreInput::ClientAdd(cid) => self.client_add(cid),
            CoreInput::ClientDel(cid) => self.client_del(cid),
            CoreInput::ClientRequest(cid, request) => self.client_request(cid, request),
            CoreInput::BackendEvent(event) => self.backend_event(event),
        }
        std::mem::take(&mut self.effects)
    }

    // ========================================================================
    // Client lifecycle
    // ========================================================================

    fn client_add(&mut self, cid: ClientId) {
        if self.clients.insert(cid, ClientData::default()).is_some() {
            tracing::warn!("Client {} was already registered", cid);
        }
        tracing::info!("Client {} connected", cid);
        // Announce the current outputs to the newcomer.
        for mapped in &self.outputs {
            self.effects.push(CoreOutput::ClientEvent {
                target: Some(cid),
                event: Event::OutputAdded(mapped.clone()),
            });
        }
    }

    fn client_del(&mut self, cid: ClientId) {
        let Some(data) = self.clients.remove(&cid) else {
            self.effects
                .push(CoreOutput::Error(CoreError::UnknownClient(cid)));
            return;
        };
        tracing::info!("Client {} disconnected", cid);
        self.universe.filter(|&(owner, _)| owner != cid);
        self.refresh_layout();
        self.emit_commit();
        let handles = data.surfaces.backend_handles();
        if !handles.is_empty() {
            self.effects
                .push(CoreOutput::BackendRequest(BackendRequest::SurfaceDestroy(
                    handles,
                )));
        }
    }

    // ========================================================================
    // Client requests
    // ========================================================================

    fn client_request(&mut self, cid: ClientId, request: Request) {
        if !self.clients.contains_key(&cid) {
            self.effects
                .push(CoreOutput::Error(CoreError::UnknownClient(cid)));
            return;
        }
        match request {
            Request::SurfaceCreate { sid } => self.surface_create(cid, sid),
            Request::SurfaceDestroy { sid } => self.surface_destroy(cid, sid),
            Request::SurfaceCommit { updates } => self.surface_commit(cid, updates),
            Request::SurfaceAttach { sid, parent } => self.surface_attach(cid, sid, parent),
            Request::SurfaceSetPosition { sid, position } => {
                self.surface_set_position(cid, sid, position)
            }
            Request::SurfaceSetSync { sid, sync } => self.surface_set_sync(cid, sid, sync),
            Request::SurfacePlaceAbove { sid, sibling } => {
                self.surface_restack(cid, sid, sibling, true)
            }
            Request::SurfacePlaceBelow { sid, sibling } => {
                self.surface_restack(cid, sid, sibling, false)
            }
        }
    }

    fn surface_create(&mut self, cid: ClientId, sid: SurfaceId) {
        let Some(client) = self.clients.get_mut(&cid) else {
            return;
        };
        if client.surfaces.lookup(sid).is_some() {
            self.reject(cid, ClientError::BadSurface);
            return;
        }
        let handle = self.handles.fresh_surface();
        client.surfaces.insert(sid, Surface::new(handle));
    }

    fn surface_destroy(&mut self, cid: ClientId, sid: SurfaceId) {
        let known = self
            .clients
            .get(&cid)
            .is_some_and(|c| c.surfaces.lookup(sid).is_some());
        if !known {
            self.reject(cid, ClientError::BadSurface);
            return;
        }
        self.universe.delete((cid, sid));
        self.refresh_layout();
        self.emit_commit();
        if let Some(client) = self.clients.get_mut(&cid) {
            if let Some(surface) = client.surfaces.delete(sid) {
                self.effects
                    .push(CoreOutput::BackendRequest(BackendRequest::SurfaceDestroy(
                        vec![surface.backend],
                    )));
            }
        }
    }

    fn surface_commit(&mut self, cid: ClientId, updates: Vec<(SurfaceId, SurfaceState)>) {
        let Some(client) = self.clients.get_mut(&cid) else {
            return;
        };
        // Validate the whole batch before touching anything; one unknown id
        // drops the request with the state unchanged.
        if updates
            .iter()
            .any(|(sid, _)| client.surfaces.lookup(*sid).is_none())
        {
            self.reject(cid, ClientError::BadSurface);
            return;
        }
        let mut transitions: Vec<CommitApplied> = Vec::new();
        for (sid, state) in updates {
            if let Some(applied) = client.surfaces.commit(sid, state) {
                transitions.extend(applied);
            }
        }
        if self.apply_transitions(cid, &transitions) {
            self.refresh_layout();
        }
        self.emit_commit();
    }

    fn surface_attach(&mut self, cid: ClientId, sid: SurfaceId, parent: Option<SurfaceId>) {
        let Some(client) = self.clients.get_mut(&cid) else {
            return;
        };
        if client.surfaces.attach(sid, parent).is_none() {
            self.reject(cid, ClientError::BadSurface);
            return;
        }
        self.emit_commit();
    }

    fn surface_set_position(&mut self, cid: ClientId, sid: SurfaceId, position: V2) {
        let Some(client) = self.clients.get_mut(&cid) else {
            return;
        };
        if client.surfaces.set_position(sid, position).is_none() {
            self.reject(cid, ClientError::BadSurface);
            return;
        }
        self.emit_commit();
    }

    fn surface_set_sync(&mut self, cid: ClientId, sid: SurfaceId, sync: bool) {
        let Some(client) = self.clients.get_mut(&cid) else {
            return;
        };
        let Some(applied) = client.surfaces.set_sync(sid, sync) else {
            self.reject(cid, ClientError::BadSurface);
            return;
        };
        if self.apply_transitions(cid, &applied) {
            self.refresh_layout();
        }
        self.emit_commit();
    }

    fn surface_restack(&mut self, cid: ClientId, sid: SurfaceId, sibling: SurfaceId, above: bool) {
        let Some(client) = self.clients.get_mut(&cid) else {
            return;
        };
        match client.surfaces.restack(sid, sibling, above) {
            Ok(()) => self.emit_commit(),
            Err(RestackError::UnknownSurface) => self.reject(cid, ClientError::BadSurface),
            Err(RestackError::NotSiblings) => self.reject(cid, ClientError::BadWindow),
        }
    }

    // ========================================================================
    // Backend events
    // ========================================================================

    fn backend_event(&mut self, event: BackendEvent) {
        match event {
            BackendEvent::BufferReleased(buffer) => self.buffer_released(buffer),
            BackendEvent::OutputAdded(output) => self.output_added(output),
            BackendEvent::OutputRemoved(oid) => self.output_removed(oid),
            BackendEvent::OutputFrame(oid) => self.output_frame(oid),
        }
    }

    fn buffer_released(&mut self, buffer: Buffer) {
        if self.clients.contains_key(&buffer.client_id) {
            self.effects.push(CoreOutput::ClientEvent {
                target: Some(buffer.client_id),
                event: Event::BufferReleased(buffer),
            });
        } else {
            tracing::debug!(
                "Dropping buffer release for departed client {}",
                buffer.client_id
            );
        }
    }

    fn output_added(&mut self, output: Output) {
        if self.outputs.iter().any(|m| m.output.id == output.id) {
            tracing::warn!("Output {} reappeared; replacing the stale mapping", output.id);
            delete_output(output.id, &mut self.outputs);
        }
        let x = self.outputs.first().map_or(0, MappedOutput::right_edge);
        let mapped = map_output(x, output);
        tracing::info!("Mapped output {} at {:?}", mapped.output.id, mapped.rect);
        self.outputs.insert(0, mapped.clone());
        self.effects.push(CoreOutput::ClientEvent {
            target: None,
            event: Event::OutputAdded(mapped),
        });
        self.sync_universe_outputs();
    }

    fn output_removed(&mut self, oid: OutputId) {
        match delete_output(oid, &mut self.outputs) {
            Some(removed) => {
                self.effects.push(CoreOutput::ClientEvent {
                    target: None,
                    event: Event::OutputRemoved(removed),
                });
                self.sync_universe_outputs();
            }
            None => self
                .effects
                .push(CoreOutput::Error(CoreError::UnknownOutput(oid))),
        }
    }

    fn output_frame(&mut self, oid: OutputId) {
        for (cid, sid) in self.windows_on(oid) {
            match self
                .clients
                .get(&cid)
                .and_then(|client| client.surfaces.flatten_ids(sid))
            {
                Some(sids) => self.effects.push(CoreOutput::ClientEvent {
                    target: Some(cid),
                    event: Event::SurfaceFrame(sids),
                }),
                None => self
                    .effects
                    .push(CoreOutput::Error(CoreError::InconsistentTree(cid, sid))),
            }
        }
    }

    /// Windows laid out on the given output, per the last layout.
    pub fn windows_on(&self, oid: OutputId) -> Vec<ClientSurfaceId> {
        self.last_layout
            .iter()
            .filter(|(mapped, _)| mapped.output.id == oid)
            .flat_map(|(_, windows)| windows.iter().map(|&(_, w)| w))
            .collect()
    }

    // ========================================================================
    // Layout maintenance
    // ========================================================================

    /// Mirror map/unmap transitions into the universe. Returns whether the
    /// universe changed.
    fn apply_transitions(&mut self, cid: ClientId, transitions: &[CommitApplied]) -> bool {
        let mut changed = false;
        for t in transitions {
            match (t.was_mapped, t.now_mapped) {
                (false, true) => {
                    self.universe.insert((cid, t.sid));
                    changed = true;
                }
                (true, false) => {
                    self.universe.delete((cid, t.sid));
                    changed = true;
                }
                _ => {}
            }
        }
        changed
    }

    /// Pass the strip to the universe leftmost-first so existing screens
    /// keep their outputs when the strip grows at the right edge.
    fn sync_universe_outputs(&mut self) {
        let outputs: Vec<MappedOutput> = self.outputs.iter().rev().cloned().collect();
        self.universe.set_outputs(outputs);
        self.refresh_layout();
    }

    /// Recompute the layout, configure every window whose assigned size
    /// changed, and store the new layout. A window that merely moved keeps
    /// its buffer, so it gets no configure.
    fn refresh_layout(&mut self) {
        let new_layout = layout(&self.universe);
        let old: HashSet<(Size, ClientSurfaceId)> = self
            .last_layout
            .iter()
            .flat_map(|(_, windows)| windows.iter().map(|(rect, w)| (rect.size(), *w)))
            .collect();
        for (_, windows) in &new_layout {
            for (rect, window) in windows {
                if !old.contains(&(rect.size(), *window)) {
                    let (cid, sid) = *window;
                    self.effects.push(CoreOutput::ClientEvent {
                        target: Some(cid),
                        event: Event::WindowConfigure {
                            sid,
                            size: rect.size(),
                        },
                    });
                }
            }
        }
        self.last_layout = new_layout;
    }

    /// Flatten the current layout into a backend commit.
    fn emit_commit(&mut self) {
        let mut commit: Vec<OutputCommit> = Vec::with_capacity(self.last_layout.len());
        for (mapped, windows) in &self.last_layout {
            let mut rects: Vec<CommitRect> = Vec::with_capacity(windows.len());
            for (rect, (cid, sid)) in windows {
                let Some(client) = self.clients.get(cid) else {
                    self.effects
                        .push(CoreOutput::Error(CoreError::UnknownClient(*cid)));
                    continue;
                };
                match client.surfaces.flatten(rect.origin(), *sid) {
                    Some(surfaces) => rects.push((*rect, surfaces)),
                    None => self
                        .effects
                        .push(CoreOutput::Error(CoreError::InconsistentTree(*cid, *sid))),
                }
            }
            commit.push((mapped.output.id, rects));
        }
        self.effects
            .push(CoreOutput::BackendRequest(BackendRequest::SurfaceCommit(
                commit,
            )));
    }

    fn reject(&mut self, cid: ClientId, error: ClientError) {
        tracing::debug!("Rejecting request from client {}: {:?}", cid, error);
        self.effects.push(CoreOutput::ClientEvent {
            target: Some(cid),
            event: Event::Error(error),
        });
    }
}
