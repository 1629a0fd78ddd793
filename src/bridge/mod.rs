//! The bridge between an emulator and the terminal.
//!
//! [`Bridge::new`] wires a surface, shared state and event channel together
//! and returns a cloneable [`BridgeHandle`] for the emulator side plus the
//! [`EventLoop`] to drive. The handle may be used from any task.

pub mod event_loop;
pub mod shutdown;
pub mod state;

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::input::ScancodeEvent;
use crate::renderer::{DrawRequest, Surface};

pub use event_loop::{classify, spawn_input_pump, BridgeEvent, EventLoop, LoopExit};
pub use shutdown::{ProcessShutdown, ShutdownHooks};
pub use state::{BridgeState, KeyboardHandler, MouseHandler, SharedState};

/// Emulator-facing side of a bridge.
#[derive(Clone)]
pub struct BridgeHandle {
    shared: SharedState,
    events: UnboundedSender<BridgeEvent>,
}

impl BridgeHandle {
    pub async fn register_keyboard_handler<F>(&self, handler: F)
    where
        F: Fn(ScancodeEvent) + Send + Sync + 'static,
    {
        self.shared.lock().await.keyboard_handler = Some(Arc::new(handler));
        debug!("Keyboard handler registered");
    }

    /// The handler receives `(buttons, dx, dy)`.
    pub async fn register_mouse_handler<F>(&self, handler: F)
    where
        F: Fn(u8, i8, i8) + Send + Sync + 'static,
    {
        self.shared.lock().await.mouse_handler = Some(Arc::new(handler));
        debug!("Mouse handler registered");
    }

    /// Register from an emulator thread that is not running on the tokio
    /// runtime.
    ///
    /// # Panics
    ///
    /// Panics when called from within an async execution context.
    pub fn blocking_register_keyboard_handler<F>(&self, handler: F)
    where
        F: Fn(ScancodeEvent) + Send + Sync + 'static,
    {
        self.shared.blocking_lock().keyboard_handler = Some(Arc::new(handler));
        debug!("Keyboard handler registered");
    }

    /// Blocking counterpart of [`register_mouse_handler`](Self::register_mouse_handler).
    ///
    /// # Panics
    ///
    /// Panics when called from within an async execution context.
    pub fn blocking_register_mouse_handler<F>(&self, handler: F)
    where
        F: Fn(u8, i8, i8) + Send + Sync + 'static,
    {
        self.shared.blocking_lock().mouse_handler = Some(Arc::new(handler));
        debug!("Mouse handler registered");
    }

    /// Queue a frame for rendering.
    ///
    /// Requests from one caller are rendered in the order posted. A buffer
    /// too short for its implied geometry is rejected here.
    pub fn post_draw_request(&self, request: DrawRequest) -> Result<()> {
        request.validate()?;
        self.send(BridgeEvent::Draw(request))
    }

    /// Ask the event loop to run the quit path, as the quit key does.
    pub fn request_quit(&self) -> Result<()> {
        self.send(BridgeEvent::Quit)
    }

    /// Raw sender for additional event producers such as an input pump.
    pub fn sender(&self) -> UnboundedSender<BridgeEvent> {
        self.events.clone()
    }

    fn send(&self, event: BridgeEvent) -> Result<()> {
        self.events.send(event).map_err(|_| BridgeError::Closed)
    }
}

pub struct Bridge;

impl Bridge {
    pub fn new<S: Surface>(
        surface: S,
        config: BridgeConfig,
        shutdown: Arc<dyn ShutdownHooks>,
    ) -> (BridgeHandle, EventLoop<S>) {
        let shared = BridgeState::shared();
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = BridgeHandle {
            shared: shared.clone(),
            events: tx,
        };
        let event_loop = EventLoop::new(surface, shared, rx, config, shutdown);
        (handle, event_loop)
    }

    /// Run the event loop on its own task.
    pub fn spawn<S: Surface + 'static>(
        surface: S,
        config: BridgeConfig,
        shutdown: Arc<dyn ShutdownHooks>,
    ) -> (BridgeHandle, JoinHandle<LoopExit>) {
        let (handle, mut event_loop) = Self::new(surface, config, shutdown);
        let task = tokio::spawn(async move { event_loop.run().await });
        (handle, task)
    }
}
