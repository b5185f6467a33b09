//! Event domain: typed interception events and the synchronous bus.

pub mod bus;
pub mod events;

pub use bus::{EventBus, Interest, Listener, SubscriptionId};
pub use events::{Event, EventKind, EventPayload, TaskRef};
