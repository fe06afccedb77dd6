use anyhow::Result;

use tenaya::core::backend::{BackendEvent, SerialHandleSource};
use tenaya::core::engine::{CoreInput, Engine};
use tenaya::core::event::Request;
use tenaya::core::ids::{OutputId, SurfaceId};
use tenaya::core::mux::InputMux;
use tenaya::core::output::{Output, Transform};
use tenaya::core::surface::{Buffer, BufferFormat, SurfaceState, WindowState};
use tenaya::util::geometry::Rect;
use tenaya::util::logging;

/// Headless demonstration run: one output, one client, one mapped window.
/// Real deployments replace the scripted inputs with socket reader tasks
/// and a backend thread feeding the same queue.
fn main() -> Result<()> {
    logging::init();

    let mut mux = InputMux::new();
    let backend = mux.backend_sender();

    backend.post(BackendEvent::OutputAdded(Output {
        id: OutputId(1),
        name: "headless-1".into(),
        width: 1920,
        height: 1080,
        scale: 1,
        transform: Transform::Normal,
    }))?;

    let client = mux.register_client()?;
    let sid = SurfaceId(1);
    client.submit(Request::SurfaceCreate { sid })?;
    client.submit(Request::SurfaceCommit {
        updates: vec![(
            sid,
            SurfaceState {
                buffer: Some(Buffer {
                    format: BufferFormat::Xrgb8888,
                    width: 1920,
                    height: 1080,
                    stride: 7680,
                    client_id: client.id(),
                }),
                window: Some(WindowState {
                    title: "demo".into(),
                    class: "demo".into(),
                    geometry: Rect::new(0, 0, 1919, 1079),
                    popup: None,
                }),
                ..Default::default()
            },
        )],
    })?;
    backend.post(BackendEvent::OutputFrame(OutputId(1)))?;
    drop(client);

    let mut engine = Engine::new(["main", "alt"], SerialHandleSource::default());
    while let Some(input) = mux.try_recv() {
        if let CoreInput::ClientDel(cid) = input {
            mux.release_client(cid);
        }
        for effect in engine.dispatch(input) {
            tracing::info!("Effect: {:?}", effect);
        }
    }
    Ok(())
}
