use std::io;
use std::sync::Arc;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, MouseEvent};
use futures::{Stream, StreamExt};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::bridge::shutdown::{spawn_watchdog, ShutdownHooks};
use crate::bridge::state::SharedState;
use crate::config::BridgeConfig;
use crate::input::{dispatch_key, dispatch_mouse};
use crate::renderer::{render_frame, DrawRequest, RenderError, Surface};

/// Everything the event loop reacts to, merged into one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    Draw(DrawRequest),
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// A confirmed quit request.
    Quit,
    /// Every sender was dropped.
    Disconnected,
}

/// Map a raw terminal event onto the bridge's event set.
pub fn classify(event: Event, quit_key: u8) -> Option<BridgeEvent> {
    match event {
        Event::Key(key) if key.code == KeyCode::F(quit_key) => {
            (key.kind != KeyEventKind::Release).then_some(BridgeEvent::Quit)
        }
        Event::Key(key) => Some(BridgeEvent::Key(key)),
        Event::Mouse(mouse) => Some(BridgeEvent::Mouse(mouse)),
        Event::Resize(cols, rows) => Some(BridgeEvent::Resize(cols, rows)),
        Event::FocusGained | Event::FocusLost | Event::Paste(_) => None,
    }
}

/// Forward terminal input into the bridge channel until either side closes.
pub fn spawn_input_pump<St>(
    mut input: St,
    events: UnboundedSender<BridgeEvent>,
    quit_key: u8,
) -> JoinHandle<()>
where
    St: Stream<Item = io::Result<Event>> + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(item) = input.next().await {
            match item {
                Ok(event) => {
                    let Some(event) = classify(event, quit_key) else {
                        continue;
                    };
                    if events.send(event).is_err() {
                        debug!("Event loop gone, stopping input pump");
                        break;
                    }
                }
                Err(e) => {
                    error!("Terminal input failed: {}", e);
                    break;
                }
            }
        }
    })
}

/// The single control loop of a bridge.
pub struct EventLoop<S: Surface> {
    surface: S,
    shared: SharedState,
    events: UnboundedReceiver<BridgeEvent>,
    config: BridgeConfig,
    shutdown: Arc<dyn ShutdownHooks>,
}

impl<S: Surface> EventLoop<S> {
    pub(crate) fn new(
        surface: S,
        shared: SharedState,
        events: UnboundedReceiver<BridgeEvent>,
        config: BridgeConfig,
        shutdown: Arc<dyn ShutdownHooks>,
    ) -> Self {
        Self {
            surface,
            shared,
            events,
            config,
            shutdown,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Dispatch events until a confirmed quit or until every sender is gone.
    pub async fn run(&mut self) -> LoopExit {
        info!("Bridge event loop started");

        while let Some(event) = self.events.recv().await {
            match event {
                BridgeEvent::Key(key) => {
                    dispatch_key(&self.shared, &key, self.config.release_delay()).await;
                }
                BridgeEvent::Mouse(mouse) => {
                    dispatch_mouse(&self.shared, &mouse).await;
                }
                BridgeEvent::Resize(cols, rows) => self.resize(cols, rows).await,
                BridgeEvent::Draw(request) => self.draw(request).await,
                BridgeEvent::Quit => {
                    if self.quit() {
                        self.events.close();
                        return LoopExit::Quit;
                    }
                }
            }
        }

        info!("All bridge senders dropped, event loop exiting");
        LoopExit::Disconnected
    }

    async fn draw(&mut self, request: DrawRequest) {
        let mut state = self.shared.lock().await;
        match render_frame(&mut state.display, &mut self.surface, &request) {
            Ok(stats) => trace!("Frame rendered {:?}", stats),
            Err(e @ RenderError::BufferTooShort { .. }) => warn!("Dropping draw request: {}", e),
            Err(e) => error!("Failed to present frame: {}", e),
        }
    }

    async fn resize(&mut self, cols: u16, rows: u16) {
        debug!("Terminal resized to {}x{}", cols, rows);
        let mut state = self.shared.lock().await;
        if let Err(e) = self.surface.sync() {
            error!("Failed to resynchronize surface: {}", e);
        }
        // the grown area has no border fill yet
        state.display.invalidate();
    }

    fn quit(&self) -> bool {
        info!("Quit requested");
        if !self.shutdown.confirm_quit() {
            info!("Quit cancelled");
            return false;
        }
        spawn_watchdog(self.shutdown.clone(), self.config.force_exit_after());
        true
    }
}
