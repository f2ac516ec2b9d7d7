// Blocking wait over a set of descriptors.
//
// One interface for the multiplexer; platform variants live underneath.
// Unix is backed by poll(2); other platforms report Unsupported.

use std::io;
use std::os::raw::c_int;
use std::time::Duration;

use crate::Poll::PollFlags;

pub struct WaitSet {
    #[cfg(unix)]
    fds: Vec<libc::pollfd>,
    #[cfg(not(unix))]
    fds: Vec<(c_int, PollFlags)>,
}

impl WaitSet {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fds: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.fds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fds.is_empty()
    }

    /// Register `fd` with the given interest. Returns its slot index.
    #[cfg(unix)]
    pub fn push(&mut self, fd: c_int, interest: PollFlags) -> usize {
        let mut events: libc::c_short = 0;
        if interest.contains(PollFlags::READABLE) {
            events |= libc::POLLIN;
        }
        if interest.contains(PollFlags::WRITABLE) {
            events |= libc::POLLOUT;
        }
        self.fds.push(libc::pollfd {
            fd,
            events,
            revents: 0,
        });
        self.fds.len() - 1
    }

    #[cfg(not(unix))]
    pub fn push(&mut self, fd: c_int, interest: PollFlags) -> usize {
        self.fds.push((fd, interest));
        self.fds.len() - 1
    }

    /// Wait for activity. `None` blocks indefinitely, `Some(Duration::ZERO)`
    /// only checks. Returns the number of descriptors with activity.
    ///
    /// A signal arriving during the wait surfaces as `ErrorKind::Interrupted`.
    #[cfg(unix)]
    pub fn wait(&mut self, timeout: Option<Duration>) -> io::Result<usize> {
        let timeout_ms = match timeout {
            None => -1,
            Some(d) => {
                // Round up so a sub-millisecond deadline still sleeps.
                let ms = d.as_nanos().div_ceil(1_000_000);
                ms.min(c_int::MAX as u128) as c_int
            }
        };
        let rc = unsafe {
            libc::poll(
                self.fds.as_mut_ptr(),
                self.fds.len() as libc::nfds_t,
                timeout_ms,
            )
        };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(rc as usize)
    }

    #[cfg(not(unix))]
    pub fn wait(&mut self, _timeout: Option<Duration>) -> io::Result<usize> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "descriptor polling requires a Unix platform",
        ))
    }

    /// Readiness observed in `slot` by the last [`WaitSet::wait`].
    ///
    /// Hang-up, error and invalid-descriptor conditions report both
    /// directions so the caller's next operation observes the failure
    /// instead of waiting on it again.
    #[cfg(unix)]
    pub fn readiness(&self, slot: usize) -> PollFlags {
        let revents = self.fds[slot].revents;
        let mut flags = PollFlags::empty();
        if revents & libc::POLLIN != 0 {
            flags |= PollFlags::READABLE;
        }
        if revents & libc::POLLOUT != 0 {
            flags |= PollFlags::WRITABLE;
        }
        if revents & (libc::POLLHUP | libc::POLLERR | libc::POLLNVAL) != 0 {
            flags |= PollFlags::READABLE | PollFlags::WRITABLE;
        }
        flags
    }

    #[cfg(not(unix))]
    pub fn readiness(&self, _slot: usize) -> PollFlags {
        PollFlags::empty()
    }
}
