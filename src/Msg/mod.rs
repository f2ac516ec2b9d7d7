mod debug;

pub mod Envelope {
    pub mod Envelope;
    pub mod Envelope_impl;
    pub use Envelope::{Message, Ownership, Representation, MAX_VSM_SIZE}; // re-export for stable path
}

pub mod Structs {
    pub mod Block_Structs;
    pub use Block_Structs::{PayloadBlock, ReleaseFn}; // re-export for stable path
}

pub use Envelope::{Message, Ownership, Representation, MAX_VSM_SIZE};
pub use Structs::{PayloadBlock, ReleaseFn};
