use super::context::ContextId;
use std::io;

/// Errors reported by message and polling operations.
///
/// A wait interrupted by a signal is never reported here; the multiplexer
/// retries it internally.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A payload block could not be allocated. The target envelope is left as it was.
    #[error("out of memory: failed to allocate a {requested}-byte payload block")]
    OutOfMemory {
        /// Number of payload bytes requested.
        requested: usize,
    },

    /// Endpoint items in one poll call belong to different worker contexts.
    #[error("endpoints from contexts {first} and {second} cannot be polled together")]
    CrossContextMixing {
        /// Context of the first endpoint item.
        first: ContextId,
        /// Context of the conflicting endpoint item.
        second: ContextId,
    },

    /// No signaling descriptor is available on this platform or configuration.
    #[error("not supported: {0}")]
    Unsupported(&'static str),

    /// The underlying wait primitive failed.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(e) => e,
            Error::OutOfMemory { .. } => io::Error::new(io::ErrorKind::OutOfMemory, err),
            Error::CrossContextMixing { .. } => io::Error::new(io::ErrorKind::InvalidInput, err),
            Error::Unsupported(_) => io::Error::new(io::ErrorKind::Unsupported, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_conversion_keeps_kind() {
        let e: io::Error = Error::OutOfMemory { requested: 64 }.into();
        assert_eq!(e.kind(), io::ErrorKind::OutOfMemory);

        let e: io::Error = Error::Unsupported("no signaler").into();
        assert_eq!(e.kind(), io::ErrorKind::Unsupported);

        let e: io::Error = Error::CrossContextMixing {
            first: ContextId(1),
            second: ContextId(2),
        }
        .into();
        assert_eq!(e.kind(), io::ErrorKind::InvalidInput);
        assert!(e.to_string().contains("ctx#1"));
    }
}
