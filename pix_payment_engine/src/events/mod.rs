//! Order lifecycle events.
//!
//! Subscribers register async hooks with [`EventHooks`]; the engine APIs publish through [`EventProducers`] after a
//! status transition has been committed to the store.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
