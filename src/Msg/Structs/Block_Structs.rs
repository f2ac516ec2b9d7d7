// Heap storage behind every non-inline message envelope.

use crate::Core::error::{Error, Result};

/// Called exactly once with the original pointer and length when the last
/// owner of an externally backed payload block lets go of it.
pub type ReleaseFn = Box<dyn FnOnce(*mut u8, usize) + Send>;

pub(crate) enum Storage {
    /// Bytes allocated and owned by the block.
    Owned(Vec<u8>),
    /// Bytes owned by the caller and handed back through `release`.
    External {
        ptr: *mut u8,
        len: usize,
        release: Option<ReleaseFn>,
    },
    /// Read-only bytes that outlive every owner.
    Static(&'static [u8]),
}

/// Payload bytes shared by every envelope that references the block.
///
/// The reference count lives in the `Arc` that wraps the block. Once more
/// than one envelope references it the bytes are never written again.
pub struct PayloadBlock {
    pub(crate) storage: Storage,
}

impl PayloadBlock {
    /// Allocate `size` zeroed bytes. Allocation failure is reported, not aborted on.
    pub(crate) fn allocate(size: usize) -> Result<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(size)
            .map_err(|_| Error::OutOfMemory { requested: size })?;
        data.resize(size, 0);
        Ok(Self {
            storage: Storage::Owned(data),
        })
    }

    pub(crate) fn from_vec(data: Vec<u8>) -> Self {
        Self {
            storage: Storage::Owned(data),
        }
    }

    pub(crate) fn from_static(data: &'static [u8]) -> Self {
        Self {
            storage: Storage::Static(data),
        }
    }

    /// # Safety
    /// `ptr` must be valid for reads and writes of `len` bytes until `release`
    /// runs (or forever when `release` is `None`). `ptr` may only be null when
    /// `len` is zero.
    pub(crate) unsafe fn external(ptr: *mut u8, len: usize, release: Option<ReleaseFn>) -> Self {
        debug_assert!(!ptr.is_null() || len == 0, "null external payload with non-zero length");
        Self {
            storage: Storage::External { ptr, len, release },
        }
    }

    pub fn size(&self) -> usize {
        match &self.storage {
            Storage::Owned(data) => data.len(),
            Storage::External { len, .. } => *len,
            Storage::Static(data) => data.len(),
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        match &self.storage {
            Storage::Owned(data) => data.as_slice(),
            Storage::External { ptr, len, .. } => {
                if ptr.is_null() {
                    &[]
                } else {
                    unsafe { std::slice::from_raw_parts(*ptr, *len) }
                }
            }
            Storage::Static(data) => data,
        }
    }

    /// Writable bytes. `None` for static data.
    pub(crate) fn as_mut_slice(&mut self) -> Option<&mut [u8]> {
        match &mut self.storage {
            Storage::Owned(data) => Some(data.as_mut_slice()),
            Storage::External { ptr, len, .. } => {
                if ptr.is_null() {
                    Some(&mut [])
                } else {
                    Some(unsafe { std::slice::from_raw_parts_mut(*ptr, *len) })
                }
            }
            Storage::Static(_) => None,
        }
    }

    /// Whether the bytes are owned by somebody else.
    pub fn is_external(&self) -> bool {
        !matches!(self.storage, Storage::Owned(_))
    }
}

impl Drop for PayloadBlock {
    fn drop(&mut self) {
        let size = self.size();
        if let Storage::External { ptr, len, release } = &mut self.storage {
            if let Some(release) = release.take() {
                release(*ptr, *len);
            }
        }
        tracing::trace!(size, "payload block released");
    }
}

// Bytes are immutable once the block is reachable from more than one thread,
// and the release callback is only taken from `drop`.
unsafe impl Send for PayloadBlock {}
unsafe impl Sync for PayloadBlock {}
