//! WebSocket live channel for notifications.
//!
//! Each connection subscribes to the caller's channel on the
//! [`DeliveryRegistry`](cadence_events::DeliveryRegistry) and forwards
//! every published notification as a JSON text frame.

mod handler;

pub use handler::{live_handler, LiveFrame};
