use crate::Core::context::Endpoint;
use bitflags::bitflags;
use std::os::raw::c_int;

bitflags! {
    /// Readiness interest and observation flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PollFlags: u16 {
        const READABLE = 0b0000_0001;
        const WRITABLE = 0b0000_0010;
    }
}

/// What a poll item watches.
#[derive(Clone, Copy)]
pub enum PollSource<'a> {
    /// A raw OS descriptor.
    Fd(c_int),
    /// A message endpoint.
    Endpoint(&'a dyn Endpoint),
}

/// One entry of a poll set: the source, the requested interest and, after
/// the call, the observed readiness.
pub struct PollItem<'a> {
    pub source: PollSource<'a>,
    pub events: PollFlags,
    pub revents: PollFlags,
}

impl<'a> PollItem<'a> {
    pub fn fd(fd: c_int, events: PollFlags) -> Self {
        Self {
            source: PollSource::Fd(fd),
            events,
            revents: PollFlags::empty(),
        }
    }

    pub fn endpoint(endpoint: &'a dyn Endpoint, events: PollFlags) -> Self {
        Self {
            source: PollSource::Endpoint(endpoint),
            events,
            revents: PollFlags::empty(),
        }
    }

    pub fn is_readable(&self) -> bool {
        self.revents.contains(PollFlags::READABLE)
    }

    pub fn is_writable(&self) -> bool {
        self.revents.contains(PollFlags::WRITABLE)
    }
}
