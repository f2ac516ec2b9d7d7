use super::{PipeState, ThreadContext};
use std::fmt;

// Debug proxy implementations that call the standalone debug functions
impl fmt::Debug for ThreadContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::Debug::StructDebug::debug_thread_context(self, f)
    }
}

impl fmt::Debug for PipeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::Debug::StructDebug::debug_pipe_state(self, f)
    }
}
