// Module naming follows project convention (Msg = message envelopes, Poll = readiness multiplexer)
#[allow(non_snake_case)]
pub mod Core;
#[allow(non_snake_case)]
pub mod Debug;
#[allow(non_snake_case)]
pub mod Inproc;
#[allow(non_snake_case)]
pub mod Msg;
#[allow(non_snake_case)]
pub mod Poll;
pub mod ffi;

pub use Core::error::{Error, Result};
pub use Msg::{Message, Representation, MAX_VSM_SIZE};
pub use Poll::{poll, PollBuilder, PollFlags, PollItem};
