//! Notification delivery for the review workflow.
//!
//! - [`NotificationIntent`]: "tell user U about X", built by the workflow.
//! - [`Notifier`]: persists an intent through the notification store, then
//!   hands the stored row to a [`NotificationPublisher`].
//! - [`DeliveryRegistry`]: the in-process publisher. Multiplexes each
//!   user's notifications onto one shared live channel with any number of
//!   connected viewers.

pub mod intent;
pub mod notifier;
pub mod registry;

pub use intent::NotificationIntent;
pub use notifier::{NotificationPublisher, Notifier};
pub use registry::{DeliveryCallback, DeliveryError, DeliveryRegistry, Subscription};
