pub mod registry;
pub mod tag;

pub use registry::{listener, Event, EventRegistry, Listener};
pub use tag::{EventSpec, EventTag};
