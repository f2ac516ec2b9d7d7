// Layout conformance tests for ABI stability across languages.
// These tests assert sizes, alignments and field offsets of the C poll
// item, and the size of the envelope that embeds small payloads.
use dmxp_msgpoll::ffi::{dmxp_pollitem, DMXP_POLLIN, DMXP_POLLOUT};
use dmxp_msgpoll::Msg::{Message, MAX_VSM_SIZE};
use dmxp_msgpoll::PollFlags;
use memoffset::offset_of;
use std::mem::{align_of, size_of};
use std::os::raw::{c_int, c_short};

#[test]
fn test_pollitem_layout() {
    let raw = size_of::<c_int>() + 2 * size_of::<c_short>();
    let aligned = (raw + align_of::<c_int>() - 1) & !(align_of::<c_int>() - 1);

    let size = size_of::<dmxp_pollitem>();
    let align = align_of::<dmxp_pollitem>();
    let off_fd = offset_of!(dmxp_pollitem, fd);
    let off_events = offset_of!(dmxp_pollitem, events);
    let off_revents = offset_of!(dmxp_pollitem, revents);

    println!(
        "dmxp_pollitem => size: {size}, expected: {aligned}, align: {align}, offsets: [fd:{off_fd}, events:{off_events}, revents:{off_revents}]"
    );

    assert_eq!(size, aligned);
    assert_eq!(align, align_of::<c_int>());
    assert_eq!(off_fd, 0);
    assert_eq!(off_events, size_of::<c_int>());
    assert_eq!(off_revents, size_of::<c_int>() + size_of::<c_short>());
}

#[test]
fn test_poll_flag_values_match_c_constants() {
    assert_eq!(PollFlags::READABLE.bits() as c_short, DMXP_POLLIN);
    assert_eq!(PollFlags::WRITABLE.bits() as c_short, DMXP_POLLOUT);
}

#[test]
fn test_envelope_holds_small_payload_inline() {
    let size = size_of::<Message>();
    println!(
        "Message => size: {size}, inline capacity: {MAX_VSM_SIZE}, pointer: {}",
        size_of::<usize>()
    );
    assert!(size > MAX_VSM_SIZE);
    // Inline bytes, a length and a tag; no room for more than one extra word.
    assert!(size <= MAX_VSM_SIZE + 2 * size_of::<usize>());
}
