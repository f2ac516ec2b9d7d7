// The message envelope passed across send/receive calls.

use crate::Msg::Structs::Block_Structs::PayloadBlock;
use std::sync::Arc;

/// Largest payload stored inline in the envelope itself.
/// Payloads up to this size never touch the heap.
pub const MAX_VSM_SIZE: usize = 30;

/// Which of the three payload forms an envelope currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    /// Bytes stored inside the envelope.
    Inline,
    /// Zero-length control marker, not user data.
    Delimiter,
    /// Bytes stored in a heap [`PayloadBlock`].
    Shared,
}

/// Reference-counting discipline of a block-backed envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Sole owner; the block has never been copied.
    Exclusive,
    /// The block has been copied at least once and its count is authoritative.
    Shared,
}

pub(crate) enum Content {
    Inline {
        data: [u8; MAX_VSM_SIZE],
        len: u8,
    },
    Delimiter,
    Block {
        block: Arc<PayloadBlock>,
        ownership: Ownership,
    },
}

impl Content {
    pub(crate) const EMPTY: Content = Content::Inline {
        data: [0; MAX_VSM_SIZE],
        len: 0,
    };
}

/// One transport-level unit of payload.
///
/// Small payloads live inline, large ones in a reference-counted
/// [`PayloadBlock`] shared between copies without copying bytes.
/// Dropping an envelope closes it.
pub struct Message {
    pub(crate) content: Content,
}
