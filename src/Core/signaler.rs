// Wakeup-only descriptor used to announce pending inter-thread commands.
// Linux uses eventfd, other Unix systems fall back to a self-pipe.

use std::io;
use std::os::raw::c_int;
use std::time::Duration;

use super::wait::WaitSet;
use crate::Poll::PollFlags;

/// A descriptor that turns readable after [`Signaler::signal`] and stays
/// readable until [`Signaler::reset`] drains it.
pub struct Signaler {
    read_fd: c_int,
    write_fd: c_int,
}

impl Signaler {
    #[cfg(target_os = "linux")]
    pub fn new() -> io::Result<Self> {
        let fd = unsafe { libc::eventfd(0, libc::EFD_CLOEXEC | libc::EFD_NONBLOCK) };
        if fd == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(Self {
            read_fd: fd,
            write_fd: fd,
        })
    }

    #[cfg(all(unix, not(target_os = "linux")))]
    pub fn new() -> io::Result<Self> {
        let mut fds: [c_int; 2] = [-1; 2];
        if unsafe { libc::pipe(fds.as_mut_ptr()) } == -1 {
            return Err(io::Error::last_os_error());
        }
        for &fd in &fds {
            unsafe {
                let flags = libc::fcntl(fd, libc::F_GETFL);
                libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK);
                libc::fcntl(fd, libc::F_SETFD, libc::FD_CLOEXEC);
            }
        }
        Ok(Self {
            read_fd: fds[0],
            write_fd: fds[1],
        })
    }

    #[cfg(not(unix))]
    pub fn new() -> io::Result<Self> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "signaling descriptors require a Unix platform",
        ))
    }

    /// The descriptor to watch for readability.
    pub fn raw_fd(&self) -> c_int {
        self.read_fd
    }

    /// Make the descriptor readable. Signalling an already-signalled
    /// descriptor is a no-op.
    #[cfg(unix)]
    pub fn signal(&self) -> io::Result<()> {
        #[cfg(target_os = "linux")]
        let buf: u64 = 1;
        #[cfg(not(target_os = "linux"))]
        let buf: u8 = 1;

        loop {
            let rc = unsafe {
                libc::write(
                    self.write_fd,
                    &buf as *const _ as *const libc::c_void,
                    std::mem::size_of_val(&buf),
                )
            };
            if rc >= 0 {
                return Ok(());
            }
            let err = io::Error::last_os_error();
            match err.kind() {
                io::ErrorKind::Interrupted => continue,
                // Counter saturated or pipe full: the reader will wake anyway.
                io::ErrorKind::WouldBlock => return Ok(()),
                _ => return Err(err),
            }
        }
    }

    #[cfg(not(unix))]
    pub fn signal(&self) -> io::Result<()> {
        Err(io::ErrorKind::Unsupported.into())
    }

    /// Drain the descriptor without blocking. Returns whether it was signalled.
    #[cfg(unix)]
    pub fn reset(&self) -> io::Result<bool> {
        let mut buf = [0u8; 64];
        let mut signalled = false;
        loop {
            let rc = unsafe {
                libc::read(
                    self.read_fd,
                    buf.as_mut_ptr() as *mut libc::c_void,
                    buf.len(),
                )
            };
            if rc > 0 {
                signalled = true;
                continue;
            }
            if rc == 0 {
                return Ok(signalled);
            }
            let err = io::Error::last_os_error();
            match err.kind() {
                io::ErrorKind::Interrupted => continue,
                io::ErrorKind::WouldBlock => return Ok(signalled),
                _ => return Err(err),
            }
        }
    }

    #[cfg(not(unix))]
    pub fn reset(&self) -> io::Result<bool> {
        Err(io::ErrorKind::Unsupported.into())
    }

    /// Block until signalled or `timeout` elapses. Does not drain.
    pub fn wait(&self, timeout: Option<Duration>) -> io::Result<bool> {
        let mut set = WaitSet::with_capacity(1);
        set.push(self.read_fd, PollFlags::READABLE);
        loop {
            match set.wait(timeout) {
                Ok(n) => return Ok(n > 0),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

impl Drop for Signaler {
    fn drop(&mut self) {
        #[cfg(unix)]
        unsafe {
            libc::close(self.read_fd);
            if self.write_fd != self.read_fd {
                libc::close(self.write_fd);
            }
        }
    }
}

// The descriptors are only touched through syscalls that are thread-safe.
unsafe impl Send for Signaler {}
unsafe impl Sync for Signaler {}
