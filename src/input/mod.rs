pub mod keyboard;
pub mod mouse;
pub mod scancode;

pub use keyboard::{dispatch_key, ScancodeEvent, RELEASE_DELAY};
pub use mouse::{dispatch_mouse, MouseReport, MouseState};
pub use scancode::{translate, Scancode};
