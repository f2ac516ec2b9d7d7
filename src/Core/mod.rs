pub mod clock;
pub mod context;
pub mod counter;
pub mod error;
pub mod signaler;
pub mod wait;

pub use context::{ContextId, Endpoint, WorkerContext};
pub use counter::AtomicCounter;
pub use error::{Error, Result};
pub use signaler::Signaler;
