use crate::Core::clock::{sleep_secs, Stopwatch};
use crate::Core::error::Error;
use crate::Msg::Message;
use crate::Poll::{poll, PollFlags, PollItem};
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::ffi::CString;
use std::os::raw::{c_char, c_int, c_long, c_short, c_ulong, c_void};
use std::ptr;
use std::time::Duration;

// Error codes
pub const DMXP_SUCCESS: i32 = 0;
pub const DMXP_ERROR_NULL_POINTER: i32 = -1;
pub const DMXP_ERROR_INVALID_ARG: i32 = -2;
pub const DMXP_ERROR_OUT_OF_MEMORY: i32 = -3;
pub const DMXP_ERROR_CROSS_CONTEXT: i32 = -4;
pub const DMXP_ERROR_UNSUPPORTED: i32 = -5;
pub const DMXP_ERROR_INTERNAL: i32 = -6;

lazy_static! {
    static ref ERROR_STRINGS: HashMap<i32, CString> = {
        let table = [
            (DMXP_SUCCESS, "Success"),
            (DMXP_ERROR_NULL_POINTER, "Null pointer argument"),
            (DMXP_ERROR_INVALID_ARG, "Invalid argument"),
            (DMXP_ERROR_OUT_OF_MEMORY, "Out of memory"),
            (DMXP_ERROR_CROSS_CONTEXT, "Endpoints from different worker contexts polled together"),
            (DMXP_ERROR_UNSUPPORTED, "Not supported"),
            (DMXP_ERROR_INTERNAL, "Internal error"),
        ];
        table
            .iter()
            .filter_map(|(code, text)| CString::new(*text).ok().map(|s| (*code, s)))
            .collect()
    };
    static ref UNKNOWN_ERROR: CString = CString::new("Unknown error").unwrap_or_default();
}

/// Map a crate error onto the C error codes.
pub fn error_code(err: &Error) -> i32 {
    match err {
        Error::OutOfMemory { .. } => DMXP_ERROR_OUT_OF_MEMORY,
        Error::CrossContextMixing { .. } => DMXP_ERROR_CROSS_CONTEXT,
        Error::Unsupported(_) => DMXP_ERROR_UNSUPPORTED,
        Error::Io(_) => DMXP_ERROR_INTERNAL,
    }
}

/// Release callback for caller-owned buffers.
#[allow(non_camel_case_types)]
pub type dmxp_free_fn = extern "C" fn(data: *mut c_void);

// Poll flags
pub const DMXP_POLLIN: c_short = 1;
pub const DMXP_POLLOUT: c_short = 2;

/// Poll entry for a raw descriptor, laid out for C callers.
#[repr(C)]
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy)]
pub struct dmxp_pollitem {
    pub fd: c_int,
    pub events: c_short,
    pub revents: c_short,
}

/// Handle to a message envelope (opaque pointer)
pub struct MessageHandle {
    inner: Message,
}

/// Human-readable text for an error code. The string is static.
#[no_mangle]
pub extern "C" fn dmxp_strerror(code: c_int) -> *const c_char {
    ERROR_STRINGS
        .get(&code)
        .unwrap_or(&*UNKNOWN_ERROR)
        .as_ptr()
}

// -----------------------------------------------------------------------------
// Message API
// -----------------------------------------------------------------------------

/// Create an empty message.
///
/// # Returns
/// * Pointer to `MessageHandle`. Never NULL.
#[no_mangle]
pub extern "C" fn dmxp_msg_new() -> *mut MessageHandle {
    Box::into_raw(Box::new(MessageHandle {
        inner: Message::new(),
    }))
}

/// Re-initialize a message with room for `size` bytes.
///
/// # Returns
/// * 0 on success; the previous content is closed.
/// * DMXP_ERROR_OUT_OF_MEMORY if the payload cannot be allocated; the message is unchanged.
#[no_mangle]
pub extern "C" fn dmxp_msg_init_size(handle: *mut MessageHandle, size: usize) -> i32 {
    if handle.is_null() {
        return DMXP_ERROR_NULL_POINTER;
    }
    let msg = unsafe { &mut (*handle).inner };
    match msg.init_size(size) {
        Ok(()) => DMXP_SUCCESS,
        Err(e) => error_code(&e),
    }
}

/// Re-initialize a message around a caller-owned buffer without copying it.
///
/// # Arguments
/// * `data` - Buffer of `size` bytes; must stay valid until `ffn` is called.
/// * `ffn` - Called once with `data` when the last copy is closed. May be NULL.
#[no_mangle]
pub extern "C" fn dmxp_msg_init_data(
    handle: *mut MessageHandle,
    data: *mut c_void,
    size: usize,
    ffn: Option<dmxp_free_fn>,
) -> i32 {
    if handle.is_null() || (data.is_null() && size != 0) {
        return DMXP_ERROR_NULL_POINTER;
    }
    let release = ffn.map(|f| {
        Box::new(move |ptr: *mut u8, _len: usize| f(ptr as *mut c_void)) as crate::Msg::ReleaseFn
    });
    let msg = unsafe { &mut (*handle).inner };
    *msg = unsafe { Message::from_raw_parts(data as *mut u8, size, release) };
    DMXP_SUCCESS
}

/// Close a message, releasing its payload once no copy references it.
#[no_mangle]
pub extern "C" fn dmxp_msg_close(handle: *mut MessageHandle) -> i32 {
    if handle.is_null() {
        return DMXP_ERROR_NULL_POINTER;
    }
    unsafe { (*handle).inner.close() };
    DMXP_SUCCESS
}

/// Move `src` into `dest`, leaving `src` empty.
#[no_mangle]
pub extern "C" fn dmxp_msg_move(dest: *mut MessageHandle, src: *mut MessageHandle) -> i32 {
    if dest.is_null() || src.is_null() {
        return DMXP_ERROR_NULL_POINTER;
    }
    if dest == src {
        return DMXP_SUCCESS;
    }
    unsafe { (*dest).inner.move_from(&mut (*src).inner) };
    DMXP_SUCCESS
}

/// Make `dest` another owner of `src`'s payload.
#[no_mangle]
pub extern "C" fn dmxp_msg_copy(dest: *mut MessageHandle, src: *mut MessageHandle) -> i32 {
    if dest.is_null() || src.is_null() {
        return DMXP_ERROR_NULL_POINTER;
    }
    if dest == src {
        return DMXP_SUCCESS;
    }
    unsafe { (*dest).inner.copy_from(&mut (*src).inner) };
    DMXP_SUCCESS
}

/// Pointer to the payload bytes, NULL for a delimiter.
/// Writing through the pointer is only allowed before the message is copied.
#[no_mangle]
pub extern "C" fn dmxp_msg_data(handle: *mut MessageHandle) -> *mut c_void {
    if handle.is_null() {
        return ptr::null_mut();
    }
    let msg = unsafe { &mut (*handle).inner };
    if let Some(bytes) = msg.data_mut() {
        return bytes.as_mut_ptr() as *mut c_void;
    }
    match msg.data() {
        Some(bytes) => bytes.as_ptr() as *mut c_void,
        None => ptr::null_mut(),
    }
}

/// Payload size in bytes.
#[no_mangle]
pub extern "C" fn dmxp_msg_size(handle: *const MessageHandle) -> usize {
    if handle.is_null() {
        return 0;
    }
    unsafe { (*handle).inner.size() }
}

/// Free a message handle, closing the message.
#[no_mangle]
pub extern "C" fn dmxp_msg_free(handle: *mut MessageHandle) {
    if !handle.is_null() {
        unsafe {
            let _ = Box::from_raw(handle); // Dropped automatically
        }
    }
}

// -----------------------------------------------------------------------------
// Polling
// -----------------------------------------------------------------------------

/// Wait until at least one descriptor in `items` is ready.
///
/// # Arguments
/// * `timeout_ms` - Negative waits forever, 0 only checks.
///
/// # Returns
/// * Number of ready items (0 on timeout), or a negative error code.
#[no_mangle]
pub extern "C" fn dmxp_poll(items: *mut dmxp_pollitem, nitems: usize, timeout_ms: c_long) -> c_int {
    if items.is_null() && nitems != 0 {
        return DMXP_ERROR_NULL_POINTER;
    }
    let raw: &mut [dmxp_pollitem] = if nitems == 0 {
        &mut []
    } else {
        unsafe { std::slice::from_raw_parts_mut(items, nitems) }
    };

    let mut poll_items: Vec<PollItem<'_>> = raw
        .iter()
        .map(|item| PollItem::fd(item.fd, PollFlags::from_bits_truncate(item.events as u16)))
        .collect();
    let timeout = u64::try_from(timeout_ms).ok().map(Duration::from_millis);

    match poll(&mut poll_items, timeout) {
        Ok(n) => {
            for (out, item) in raw.iter_mut().zip(&poll_items) {
                out.revents = item.revents.bits() as c_short;
            }
            n.min(c_int::MAX as usize) as c_int
        }
        Err(e) => error_code(&e),
    }
}

// -----------------------------------------------------------------------------
// Timing
// -----------------------------------------------------------------------------

#[no_mangle]
pub extern "C" fn dmxp_stopwatch_start() -> *mut c_void {
    Box::into_raw(Box::new(Stopwatch::start())) as *mut c_void
}

/// Stop a stopwatch and free it.
///
/// # Returns
/// * Microseconds elapsed since `dmxp_stopwatch_start`, 0 for NULL.
#[no_mangle]
pub extern "C" fn dmxp_stopwatch_stop(watch: *mut c_void) -> c_ulong {
    if watch.is_null() {
        return 0;
    }
    let watch = unsafe { Box::from_raw(watch as *mut Stopwatch) };
    watch.stop() as c_ulong
}

#[no_mangle]
pub extern "C" fn dmxp_sleep(seconds: c_int) {
    if seconds > 0 {
        sleep_secs(seconds as u32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static RELEASED: AtomicUsize = AtomicUsize::new(0);

    extern "C" fn count_release(_data: *mut c_void) {
        RELEASED.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn copy_and_free_through_handles() {
        let mut buf = vec![5u8; 128];
        let a = dmxp_msg_new();
        let b = dmxp_msg_new();
        assert_eq!(
            dmxp_msg_init_data(a, buf.as_mut_ptr() as *mut c_void, buf.len(), Some(count_release)),
            DMXP_SUCCESS
        );
        assert_eq!(dmxp_msg_copy(b, a), DMXP_SUCCESS);
        dmxp_msg_free(a);
        assert_eq!(RELEASED.load(Ordering::SeqCst), 0);
        assert_eq!(dmxp_msg_size(b), 128);
        assert_eq!(dmxp_msg_data(b) as *mut u8, buf.as_mut_ptr());
        dmxp_msg_free(b);
        assert_eq!(RELEASED.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn init_size_and_move() {
        let a = dmxp_msg_new();
        let b = dmxp_msg_new();
        assert_eq!(dmxp_msg_init_size(a, 4), DMXP_SUCCESS);
        unsafe { ptr::copy_nonoverlapping([1u8, 2, 3, 4].as_ptr(), dmxp_msg_data(a) as *mut u8, 4) };
        assert_eq!(dmxp_msg_move(b, a), DMXP_SUCCESS);
        assert_eq!(dmxp_msg_size(a), 0);
        let data = unsafe { std::slice::from_raw_parts(dmxp_msg_data(b) as *const u8, 4) };
        assert_eq!(data, &[1, 2, 3, 4]);
        dmxp_msg_free(a);
        dmxp_msg_free(b);
    }

    #[test]
    fn null_handles_are_rejected() {
        assert_eq!(dmxp_msg_close(ptr::null_mut()), DMXP_ERROR_NULL_POINTER);
        assert_eq!(dmxp_msg_init_size(ptr::null_mut(), 8), DMXP_ERROR_NULL_POINTER);
        assert!(dmxp_msg_data(ptr::null_mut()).is_null());
    }

    #[cfg(unix)]
    #[test]
    fn poll_reports_readable_descriptor() {
        let mut fds = [-1; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        let mut items = [
            dmxp_pollitem { fd: fds[0], events: DMXP_POLLIN, revents: 0 },
            dmxp_pollitem { fd: fds[1], events: DMXP_POLLIN, revents: 0 },
        ];
        assert_eq!(dmxp_poll(items.as_mut_ptr(), items.len(), 0), 0);

        let byte = 1u8;
        unsafe { libc::write(fds[1], &byte as *const u8 as *const c_void, 1) };
        assert_eq!(dmxp_poll(items.as_mut_ptr(), items.len(), -1), 1);
        assert_eq!(items[0].revents, DMXP_POLLIN);
        assert_eq!(items[1].revents, 0);
        assert_eq!(dmxp_poll(ptr::null_mut(), 1, 0), DMXP_ERROR_NULL_POINTER);
        unsafe {
            libc::close(fds[0]);
            libc::close(fds[1]);
        }
    }

    #[test]
    fn strerror_is_static_text() {
        let text = unsafe { CStr::from_ptr(dmxp_strerror(DMXP_ERROR_OUT_OF_MEMORY)) };
        assert_eq!(text.to_str().unwrap(), "Out of memory");
        let text = unsafe { CStr::from_ptr(dmxp_strerror(42)) };
        assert_eq!(text.to_str().unwrap(), "Unknown error");
    }
}
