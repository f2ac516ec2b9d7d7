use std::sync::Arc;

use super::Envelope::{Content, Message, Ownership, Representation, MAX_VSM_SIZE};
use crate::Core::error::Result;
use crate::Msg::Structs::Block_Structs::{PayloadBlock, ReleaseFn};

impl Message {
    /// An empty inline envelope.
    pub const fn new() -> Self {
        Self {
            content: Content::EMPTY,
        }
    }

    /// A delimiter marker. Carries no bytes and never allocates.
    pub const fn delimiter() -> Self {
        Self {
            content: Content::Delimiter,
        }
    }

    /// An envelope with room for `size` zeroed bytes.
    ///
    /// Sizes up to [`MAX_VSM_SIZE`] are stored inline; larger sizes allocate
    /// one exclusively owned payload block.
    ///
    /// # Errors
    /// `Error::OutOfMemory` if the payload block cannot be allocated.
    pub fn with_size(size: usize) -> Result<Self> {
        if size <= MAX_VSM_SIZE {
            return Ok(Self {
                content: Content::Inline {
                    data: [0; MAX_VSM_SIZE],
                    len: size as u8,
                },
            });
        }
        let block = PayloadBlock::allocate(size)?;
        Ok(Self::from_block(block))
    }

    /// Re-initialize this envelope with room for `size` bytes, closing what
    /// it held before. On failure the envelope is left unchanged.
    pub fn init_size(&mut self, size: usize) -> Result<()> {
        let fresh = Self::with_size(size)?;
        *self = fresh;
        Ok(())
    }

    /// An envelope holding a copy of `bytes`.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let mut msg = Self::with_size(bytes.len())?;
        if let Some(dst) = msg.data_mut() {
            dst.copy_from_slice(bytes);
        }
        Ok(msg)
    }

    /// Hand a buffer over without copying it. Always block-backed.
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self::from_block(PayloadBlock::from_vec(data))
    }

    /// Reference static bytes without copying them. Always block-backed.
    pub fn from_static(data: &'static [u8]) -> Self {
        Self::from_block(PayloadBlock::from_static(data))
    }

    /// Wrap an externally owned buffer without copying it.
    ///
    /// `release` runs exactly once, with `ptr` and `len`, when the last
    /// envelope referencing the buffer is closed.
    ///
    /// # Safety
    /// `ptr` must be valid for `len` bytes until `release` runs (or forever if
    /// `release` is `None`) and must not be accessed elsewhere while any
    /// envelope references it. `ptr` may only be null when `len` is zero.
    pub unsafe fn from_raw_parts(ptr: *mut u8, len: usize, release: Option<ReleaseFn>) -> Self {
        Self::from_block(PayloadBlock::external(ptr, len, release))
    }

    fn from_block(block: PayloadBlock) -> Self {
        Self {
            content: Content::Block {
                block: Arc::new(block),
                ownership: Ownership::Exclusive,
            },
        }
    }

    /// Release this envelope's hold on its payload and reset it to empty
    /// inline. Closing an already closed envelope does nothing.
    pub fn close(&mut self) {
        self.content = Content::EMPTY;
    }

    /// Close `self`, take over everything `src` held and leave `src` empty.
    pub fn move_from(&mut self, src: &mut Message) {
        *self = std::mem::take(src);
    }

    /// Close `self` and make it another owner of `src`'s payload.
    pub fn copy_from(&mut self, src: &mut Message) {
        self.close();
        *self = src.share();
    }

    /// Produce a new owner of the same payload.
    ///
    /// Inline and delimiter envelopes are copied by value. A block-backed
    /// envelope moves from exclusive to shared ownership on its first copy;
    /// the bytes are never duplicated.
    pub fn share(&mut self) -> Message {
        let content = match &mut self.content {
            Content::Inline { data, len } => Content::Inline {
                data: *data,
                len: *len,
            },
            Content::Delimiter => Content::Delimiter,
            Content::Block { block, ownership } => {
                if *ownership == Ownership::Exclusive {
                    tracing::trace!(size = block.size(), "payload block promoted to shared");
                    *ownership = Ownership::Shared;
                }
                Content::Block {
                    block: Arc::clone(block),
                    ownership: Ownership::Shared,
                }
            }
        };
        Message { content }
    }

    /// The payload bytes. `None` for a delimiter.
    pub fn data(&self) -> Option<&[u8]> {
        match &self.content {
            Content::Inline { data, len } => Some(&data[..*len as usize]),
            Content::Delimiter => None,
            Content::Block { block, .. } => Some(block.as_slice()),
        }
    }

    /// Writable payload bytes, available while nobody else can observe them:
    /// inline envelopes and exclusively owned, non-static blocks.
    pub fn data_mut(&mut self) -> Option<&mut [u8]> {
        match &mut self.content {
            Content::Inline { data, len } => Some(&mut data[..*len as usize]),
            Content::Delimiter => None,
            Content::Block {
                block,
                ownership: Ownership::Exclusive,
            } => Arc::get_mut(block).and_then(PayloadBlock::as_mut_slice),
            Content::Block { .. } => None,
        }
    }

    pub fn size(&self) -> usize {
        match &self.content {
            Content::Inline { len, .. } => *len as usize,
            Content::Delimiter => 0,
            Content::Block { block, .. } => block.size(),
        }
    }

    pub fn representation(&self) -> Representation {
        match &self.content {
            Content::Inline { .. } => Representation::Inline,
            Content::Delimiter => Representation::Delimiter,
            Content::Block { .. } => Representation::Shared,
        }
    }

    /// Ownership state of a block-backed envelope, `None` otherwise.
    pub fn ownership(&self) -> Option<Ownership> {
        match &self.content {
            Content::Block { ownership, .. } => Some(*ownership),
            _ => None,
        }
    }

    pub fn is_shared(&self) -> bool {
        self.ownership() == Some(Ownership::Shared)
    }

    pub fn is_delimiter(&self) -> bool {
        matches!(self.content, Content::Delimiter)
    }

    /// Number of envelopes referencing the payload block, `None` when the
    /// envelope has no block.
    pub fn ref_count(&self) -> Option<usize> {
        match &self.content {
            Content::Block { block, .. } => Some(Arc::strong_count(block)),
            _ => None,
        }
    }

    /// The backing block, if any.
    pub fn block(&self) -> Option<&PayloadBlock> {
        match &self.content {
            Content::Block { block, .. } => Some(&**block),
            _ => None,
        }
    }
}

impl Default for Message {
    fn default() -> Self {
        Self::new()
    }
}
