// Reference worker context and endpoint living in the same process.
mod context;
mod debug;
mod pipe;

pub use context::{Command, ContextBuilder, ThreadContext};
pub use pipe::{pipe, PipeReader, PipeState, PipeWriter};
