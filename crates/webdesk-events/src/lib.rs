//! WebDesk Events - notifications from the host to the surrounding shell.
//!
//! The host core never draws anything. Whenever its state changes in a way
//! the shell chrome cares about (a dock entry appears, the app list must be
//! refreshed, an app asked for an alert) it publishes a [`ShellEvent`] on
//! the [`EventBus`]. Rendering code subscribes and reacts.
//!
//! # Example
//!
//! ```rust
//! use webdesk_events::{EventBus, ShellEvent};
//!
//! # async fn example() {
//! let bus = EventBus::new();
//! let mut receiver = bus.subscribe();
//!
//! bus.publish(ShellEvent::RegistryChanged);
//!
//! let event = receiver.recv().await.unwrap();
//! assert_eq!(event.event_type(), "registry.changed");
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod bus;
mod event;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventBus, EventReceiver};
pub use event::ShellEvent;
