use std::time::Duration;

use crossterm::event::{KeyEvent, KeyEventKind};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{trace, warn};

use crate::bridge::state::SharedState;
use crate::input::scancode::{self, Scancode, KEY_UP_MASK};

/// Default gap between a key press and its synthesized release.
pub const RELEASE_DELAY: Duration = Duration::from_millis(10);

/// A key transition as seen by the emulated keyboard controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScancodeEvent {
    pub scancode: Scancode,
    pub released: bool,
}

impl ScancodeEvent {
    pub fn press(scancode: Scancode) -> Self {
        Self {
            scancode,
            released: false,
        }
    }

    pub fn release(scancode: Scancode) -> Self {
        Self {
            scancode,
            released: true,
        }
    }

    /// Set 1 byte: the make code, with the high bit set for a release.
    pub fn to_byte(self) -> u8 {
        let code = self.scancode.make_code();
        if self.released {
            code | KEY_UP_MASK
        } else {
            code
        }
    }
}

/// Deliver a key press and schedule its release.
///
/// Terminals only report key-down, so every press is followed by a
/// synthesized release of the same scancode after `release_delay`. Returns
/// the translated scancode, or `None` when the event was dropped.
pub async fn dispatch_key(
    shared: &SharedState,
    event: &KeyEvent,
    release_delay: Duration,
) -> Option<Scancode> {
    if event.kind == KeyEventKind::Release {
        return None;
    }

    let scancode = scancode::translate(event);
    if !scancode.is_valid() {
        warn!("Unknown key: {:?} ({:?})", event.code, event.modifiers);
        return None;
    }

    {
        let state = shared.lock().await;
        trace!("Key press {:?}", scancode);
        state.emit_key(ScancodeEvent::press(scancode));
    }

    schedule_release(shared.clone(), scancode, release_delay);
    Some(scancode)
}

/// Fire-and-forget release timer. It is never cancelled; the handler that is
/// registered when it fires receives the release.
pub fn schedule_release(shared: SharedState, scancode: Scancode, delay: Duration) -> JoinHandle<()> {
    let deadline = Instant::now() + delay;
    tokio::spawn(async move {
        sleep_until(deadline).await;
        let state = shared.lock().await;
        trace!("Key release {:?}", scancode);
        state.emit_key(ScancodeEvent::release(scancode));
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::state::BridgeState;
    use crossterm::event::{KeyCode, KeyEventState, KeyModifiers};
    use std::sync::{Arc, Mutex};
    use tokio::time::sleep;

    fn recorder(shared: &SharedState) -> Arc<Mutex<Vec<ScancodeEvent>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        shared
            .try_lock()
            .unwrap()
            .keyboard_handler = Some(Arc::new(move |ev: ScancodeEvent| sink.lock().unwrap().push(ev)));
        log
    }

    #[test]
    fn test_scancode_bytes() {
        assert_eq!(ScancodeEvent::press(Scancode::Enter).to_byte(), 0x1C);
        assert_eq!(ScancodeEvent::release(Scancode::Enter).to_byte(), 0x9C);
    }

    #[tokio::test(start_paused = true)]
    async fn test_press_then_delayed_release() {
        let shared = BridgeState::shared();
        let log = recorder(&shared);

        let key = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
        assert_eq!(dispatch_key(&shared, &key, RELEASE_DELAY).await, Some(Scancode::A));
        assert_eq!(*log.lock().unwrap(), vec![ScancodeEvent::press(Scancode::A)]);

        sleep(Duration::from_millis(9)).await;
        assert_eq!(log.lock().unwrap().len(), 1);

        sleep(Duration::from_millis(2)).await;
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                ScancodeEvent::press(Scancode::A),
                ScancodeEvent::release(Scancode::A)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_releases_are_scancode_scoped() {
        let shared = BridgeState::shared();
        let log = recorder(&shared);

        let a = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
        let b = KeyEvent::new(KeyCode::Char('b'), KeyModifiers::NONE);
        dispatch_key(&shared, &a, RELEASE_DELAY).await;
        sleep(Duration::from_millis(5)).await;
        dispatch_key(&shared, &b, RELEASE_DELAY).await;
        sleep(Duration::from_millis(20)).await;

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                ScancodeEvent::press(Scancode::A),
                ScancodeEvent::press(Scancode::B),
                ScancodeEvent::release(Scancode::A),
                ScancodeEvent::release(Scancode::B),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_key_is_dropped() {
        let shared = BridgeState::shared();
        let log = recorder(&shared);

        let key = KeyEvent::new(KeyCode::F(11), KeyModifiers::NONE);
        assert_eq!(dispatch_key(&shared, &key, RELEASE_DELAY).await, None);
        sleep(Duration::from_millis(50)).await;
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_release_events_are_ignored() {
        let shared = BridgeState::shared();
        let log = recorder(&shared);

        let key = KeyEvent::new_with_kind_and_state(
            KeyCode::Char('a'),
            KeyModifiers::NONE,
            KeyEventKind::Release,
            KeyEventState::NONE,
        );
        assert_eq!(dispatch_key(&shared, &key, RELEASE_DELAY).await, None);
        sleep(Duration::from_millis(50)).await;
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_reaches_handler_registered_late() {
        let shared = BridgeState::shared();

        let key = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(dispatch_key(&shared, &key, RELEASE_DELAY).await, Some(Scancode::Enter));

        let log = recorder(&shared);
        sleep(Duration::from_millis(11)).await;
        assert_eq!(*log.lock().unwrap(), vec![ScancodeEvent::release(Scancode::Enter)]);
    }
}
