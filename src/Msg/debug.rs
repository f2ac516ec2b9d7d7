use super::{Message, PayloadBlock};
use std::fmt;

// Debug proxy implementations that call the standalone debug functions
impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::Debug::StructDebug::debug_message(self, f)
    }
}

impl fmt::Debug for PayloadBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::Debug::StructDebug::debug_payload_block(self, f)
    }
}
