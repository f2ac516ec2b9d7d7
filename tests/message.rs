// Lifecycle tests for message envelopes: copy, move, close and release callbacks.

use dmxp_msgpoll::Msg::{Message, Ownership, ReleaseFn, Representation, MAX_VSM_SIZE};
use dmxp_msgpoll::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

fn filled(size: usize, seed: u8) -> Message {
    let mut msg = Message::with_size(size).unwrap();
    for (i, b) in msg.data_mut().unwrap().iter_mut().enumerate() {
        *b = seed.wrapping_add(i as u8);
    }
    msg
}

#[test]
fn test_init_is_empty_inline() {
    let msg = Message::new();
    assert_eq!(msg.representation(), Representation::Inline);
    assert_eq!(msg.size(), 0);
    assert_eq!(msg.data(), Some(&[][..]));
    assert_eq!(msg.ref_count(), None);
}

#[test]
fn test_delimiter_has_no_data() {
    let mut d = Message::delimiter();
    assert_eq!(d.representation(), Representation::Delimiter);
    assert_eq!(d.size(), 0);
    assert!(d.data().is_none());
    assert!(d.data_mut().is_none());

    let copy = d.share();
    assert!(copy.is_delimiter());
    assert!(d.is_delimiter());
}

#[test]
fn test_inline_roundtrip_all_small_sizes() {
    for size in 0..=MAX_VSM_SIZE {
        let msg = filled(size, 3);
        assert_eq!(msg.representation(), Representation::Inline);
        assert_eq!(msg.size(), size);
        let expected: Vec<u8> = (0..size).map(|i| 3u8.wrapping_add(i as u8)).collect();
        assert_eq!(msg.data().unwrap(), &expected[..]);
    }
}

#[test]
fn test_copy_then_close_original_keeps_bytes() {
    let mut src = filled(4096, 11);
    let expected = src.data().unwrap().to_vec();
    assert_eq!(src.ownership(), Some(Ownership::Exclusive));

    let mut dest = Message::new();
    assert!(!src.is_shared());
    dest.copy_from(&mut src);
    assert!(src.is_shared() && dest.is_shared());
    assert_eq!(src.ownership(), Some(Ownership::Shared));
    assert_eq!(dest.ownership(), Some(Ownership::Shared));
    assert_eq!(src.ref_count(), Some(2));
    assert_eq!(
        src.data().unwrap().as_ptr(),
        dest.data().unwrap().as_ptr(),
        "copy must alias the same block"
    );

    src.close();
    assert_eq!(dest.ref_count(), Some(1));
    assert_eq!(dest.data().unwrap(), &expected[..]);
}

#[test]
fn test_copy_of_shared_increments() {
    let mut a = filled(100, 0);
    let mut b = Message::new();
    let mut c = Message::new();
    b.copy_from(&mut a);
    c.copy_from(&mut b);
    assert_eq!(a.ref_count(), Some(3));
    b.close();
    assert_eq!(a.ref_count(), Some(2));
    assert_eq!(c.data(), a.data());
}

#[test]
fn test_copy_inline_is_independent() {
    let mut a = filled(8, 1);
    let mut b = Message::new();
    b.copy_from(&mut a);
    a.data_mut().unwrap()[0] = 0xFF;
    assert_eq!(b.data().unwrap()[0], 1);
    assert_eq!(b.representation(), Representation::Inline);
}

#[test]
fn test_copy_closes_previous_destination() {
    let released = Arc::new(AtomicUsize::new(0));
    let r = released.clone();
    let mut buf = vec![0u8; 64].into_boxed_slice();
    let ptr = buf.as_mut_ptr();
    let mut dest = unsafe {
        Message::from_raw_parts(
            ptr,
            buf.len(),
            Some(Box::new(move |_: *mut u8, _: usize| {
                r.fetch_add(1, Ordering::SeqCst);
            })),
        )
    };
    let mut src = filled(50, 0);
    dest.copy_from(&mut src);
    assert_eq!(released.load(Ordering::SeqCst), 1);
    drop(buf);
}

#[test]
fn test_move_resets_source() {
    for size in [0usize, 5, MAX_VSM_SIZE, MAX_VSM_SIZE + 1, 10_000] {
        let mut src = filled(size, 42);
        let before = src.data().unwrap().to_vec();
        let before_repr = src.representation();

        let mut dest = filled(77, 9);
        dest.move_from(&mut src);

        assert_eq!(src.size(), 0);
        assert_eq!(src.representation(), Representation::Inline);
        assert_eq!(dest.representation(), before_repr);
        assert_eq!(dest.data().unwrap(), &before[..]);
        if size > MAX_VSM_SIZE {
            assert_eq!(dest.ref_count(), Some(1));
        }
    }
}

#[test]
fn test_move_delimiter() {
    let mut src = Message::delimiter();
    let mut dest = Message::new();
    dest.move_from(&mut src);
    assert!(dest.is_delimiter());
    assert_eq!(src.representation(), Representation::Inline);
}

#[test]
fn test_release_callback_runs_once_after_last_owner() {
    let calls = Arc::new(Mutex::new(Vec::<(usize, usize)>::new()));
    let mut buf = vec![7u8; 256];
    let ptr = buf.as_mut_ptr();

    let recorder = calls.clone();
    let mut a = unsafe {
        Message::from_raw_parts(
            ptr,
            buf.len(),
            Some(Box::new(move |p: *mut u8, len: usize| {
                recorder.lock().unwrap().push((p as usize, len));
            })),
        )
    };
    assert_eq!(a.representation(), Representation::Shared);
    assert_eq!(a.data().unwrap().as_ptr(), ptr as *const u8);

    let mut b = Message::new();
    let mut c = Message::new();
    b.copy_from(&mut a);
    c.copy_from(&mut a);

    a.close();
    b.close();
    assert!(calls.lock().unwrap().is_empty(), "released while a copy is alive");
    assert_eq!(c.data().unwrap(), &[7u8; 256][..]);

    drop(c);
    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0], (ptr as usize, 256));
    drop(buf);
}

#[test]
fn test_external_small_buffer_is_block_backed() {
    let msg = Message::from_vec(vec![1, 2, 3]);
    assert_eq!(msg.representation(), Representation::Shared);
    assert_eq!(msg.data().unwrap(), &[1, 2, 3]);
}

#[test]
fn test_static_payload_is_read_only() {
    static GREETING: &[u8] = b"hello, static payload";
    let mut msg = Message::from_static(GREETING);
    assert_eq!(msg.data().unwrap(), GREETING);
    assert!(msg.data_mut().is_none());
    assert!(msg.block().unwrap().is_external());
}

#[test]
fn test_init_size_replaces_content() {
    let mut msg = filled(1000, 0);
    msg.init_size(3).unwrap();
    assert_eq!(msg.representation(), Representation::Inline);
    assert_eq!(msg.size(), 3);
}

#[test]
fn test_init_size_out_of_memory_leaves_envelope() {
    let mut msg = filled(100, 5);
    let before = msg.data().unwrap().to_vec();

    match msg.init_size(usize::MAX) {
        Err(Error::OutOfMemory { requested }) => assert_eq!(requested, usize::MAX),
        other => panic!("expected OutOfMemory, got {:?}", other),
    }
    assert_eq!(msg.representation(), Representation::Shared);
    assert_eq!(msg.size(), 100);
    assert_eq!(msg.data().unwrap(), &before[..]);
    assert_eq!(msg.ref_count(), Some(1));

    let err = Message::with_size(usize::MAX).unwrap_err();
    assert!(matches!(err, Error::OutOfMemory { .. }), "got {:?}", err);
}

#[test]
fn test_scenario_copy_close_read() {
    let mut a = Message::with_size(4).unwrap();
    a.data_mut().unwrap().copy_from_slice(&[1, 2, 3, 4]);
    let mut b = Message::new();
    b.copy_from(&mut a);
    a.close();
    assert_eq!(b.data().unwrap(), &[1, 2, 3, 4]);
    b.close();
    assert_eq!(b.size(), 0);
}

#[test]
fn test_fanout_across_threads() {
    let released = Arc::new(AtomicUsize::new(0));
    let r = released.clone();
    let payload: Vec<u8> = (0..8192u32).map(|i| (i % 251) as u8).collect();
    let expected = payload.clone();
    let mut buf = payload.into_boxed_slice();
    let len = buf.len();
    let ptr = buf.as_mut_ptr();
    std::mem::forget(buf);

    let release: ReleaseFn = Box::new(move |p, n| {
        // Rebuild the box so the bytes are freed exactly once.
        drop(unsafe { Box::from_raw(std::ptr::slice_from_raw_parts_mut(p, n)) });
        r.fetch_add(1, Ordering::SeqCst);
    });
    let mut origin = unsafe { Message::from_raw_parts(ptr, len, Some(release)) };

    let readers: Vec<_> = (0..8)
        .map(|_| {
            let copy = origin.share();
            let expected = expected.clone();
            thread::spawn(move || {
                for _ in 0..100 {
                    assert_eq!(copy.data().unwrap(), &expected[..]);
                }
                drop(copy);
            })
        })
        .collect();

    origin.close();
    for h in readers {
        h.join().unwrap();
    }
    assert_eq!(released.load(Ordering::SeqCst), 1);
}

#[test]
fn test_debug_output_does_not_dump_payload() {
    let mut msg = filled(64, 0);
    let _copy = msg.share();
    let text = format!("{:?}", msg);
    println!("{text}");
    assert!(text.contains("Shared"));
    assert!(text.contains("ref_count: 2"));
}
