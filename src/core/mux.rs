//! Input multiplexing.
//!
//! Clients and the backend run on their own tasks; everything they produce
//! is fanned into one serialized queue, so the engine processes messages to
//! completion one at a time and never needs a lock on its state. Client ids
//! are allocated smallest-free-first and recycled on disconnect.

use std::sync::mpsc::{self, Receiver, Sender};

use anyhow::{Context, Result};

use crate::core::backend::BackendEvent;
use crate::core::engine::CoreInput;
use crate::core::errors::CoreError;
use crate::core::event::Request;
use crate::core::ids::{ClientId, IdPool};

/// Fan-in of the four input streams.
pub struct InputMux {
    tx: Sender<CoreInput>,
    rx: Receiver<CoreInput>,
    ids: IdPool,
}

impl Default for InputMux {
    fn default() -> Self {
        Self::new()
    }
}

impl InputMux {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx,
            ids: IdPool::new(),
        }
    }

    /// Register a client: allocate the smallest free id and post its
    /// `ClientAdd`. Refuses the connection when the id space is exhausted.
    pub fn register_client(&mut self) -> Result<ClientHandle> {
        let id = self
            .ids
            .acquire()
            .ok_or_else(|| CoreError::state_error("client id space exhausted"))?;
        let cid = ClientId(id);
        self.tx
            .send(CoreInput::ClientAdd(cid))
            .context("engine queue closed")?;
        tracing::debug!("Registered client {}", cid);
        Ok(ClientHandle {
            cid,
            tx: self.tx.clone(),
        })
    }

    /// Return a client id to the pool once its `ClientDel` has been
    /// processed by the engine.
    pub fn release_client(&mut self, cid: ClientId) {
        self.ids.release(cid.0);
    }

    /// A sender for the backend thread.
    pub fn backend_sender(&self) -> BackendSender {
        BackendSender {
            tx: self.tx.clone(),
        }
    }

    /// Block for the next input.
    pub fn recv(&self) -> Result<CoreInput> {
        self.rx.recv().context("all input senders closed")
    }

    /// Drain one queued input without blocking.
    pub fn try_recv(&self) -> Option<CoreInput> {
        self.rx.try_recv().ok()
    }
}

/// A registered client's handle to the shared queue.
///
/// Dropping the handle posts the final `ClientDel`, which is how a client
/// reader task reports the connection closed.
pub struct ClientHandle {
    cid: ClientId,
    tx: Sender<CoreInput>,
}

impl ClientHandle {
    pub fn id(&self) -> ClientId {
        self.cid
    }

    pub fn submit(&self, request: Request) -> Result<()> {
        self.tx
            .send(CoreInput::ClientRequest(self.cid, request))
            .context("engine queue closed")
    }
}

impl Drop for ClientHandle {
    fn drop(&mut self) {
        let _ = self.tx.send(CoreInput::ClientDel(self.cid));
    }
}

/// The backend's handle to the shared queue.
#[derive(Clone)]
pub struct BackendSender {
    tx: Sender<CoreInput>,
}

impl BackendSender {
    pub fn post(&self, event: BackendEvent) -> Result<()> {
        self.tx
            .send(CoreInput::BackendEvent(event))
            .context("engine queue closed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_allocated_smallest_first_and_recycled() {
        let mut mux = InputMux::new();
        let a = mux.register_client().unwrap();
        let b = mux.register_client().unwrap();
        assert_eq!(a.id(), ClientId(0));
        assert_eq!(b.id(), ClientId(1));

        let id = a.id();
        drop(a);
        mux.release_client(id);
        let c = mux.register_client().unwrap();
        assert_eq!(c.id(), ClientId(0));
    }

    #[test]
    fn test_drop_posts_client_del() {
        let mut mux = InputMux::new();
        let client = mux.register_client().unwrap();
        let cid = client.id();
        client.submit(Request::SurfaceDestroy {
            sid: crate::core::ids::SurfaceId(1),
        })
        .unwrap();
        drop(client);

        assert_eq!(mux.try_recv(), Some(CoreInput::ClientAdd(cid)));
        assert!(matches!(
            mux.try_recv(),
            Some(CoreInput::ClientRequest(c, _)) if c == cid
        ));
        assert_eq!(mux.try_recv(), Some(CoreInput::ClientDel(cid)));
        assert_eq!(mux.try_recv(), None);
    }
}
