// In demos/poll_loop.rs
//
// A worker thread publishes ticks into an in-process pipe while the main
// thread multiplexes the pipe with a one second timeout. Ctrl+C signals an
// interrupt descriptor that cancels the wait.
//
// cargo run --example poll_loop -- [max_messages]
use dmxp_msgpoll::Core::Signaler;
use dmxp_msgpoll::Inproc::{pipe, ContextBuilder};
use dmxp_msgpoll::Msg::Message;
use dmxp_msgpoll::Poll::{PollBuilder, PollFlags, PollItem};
use std::env;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let max_messages: Option<usize> = env::args().nth(1).map(|s| s.parse().expect("Invalid number of messages"));

    let interrupt = Arc::new(Signaler::new()?);
    let interrupt_for_handler = Arc::clone(&interrupt);
    ctrlc::set_handler(move || {
        let _ = interrupt_for_handler.signal();
    })
    .expect("Error setting Ctrl+C handler");

    let worker_ctx = ContextBuilder::new().build()?;
    let main_ctx = ContextBuilder::new().with_pipe_hwm(64).build()?;
    let (writer, reader) = pipe(&worker_ctx, &main_ctx);

    let keep_alive = Arc::new(AtomicBool::new(true));
    let worker_alive = Arc::clone(&keep_alive);
    let worker = thread::spawn(move || {
        let mut tick = 0u64;
        while worker_alive.load(Ordering::SeqCst) {
            let mut msg = match Message::from_slice(format!("tick {}", tick).as_bytes()) {
                Ok(msg) => msg,
                Err(e) => {
                    eprintln!("Worker: {}", e);
                    break;
                }
            };
            match writer.send(&mut msg) {
                Ok(()) => tick += 1,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                Err(e) => {
                    eprintln!("Worker: {}", e);
                    break;
                }
            }
            thread::sleep(Duration::from_millis(250));
        }
        println!("Worker: stopped after {} ticks", tick);
    });

    println!("Main: polling, press Ctrl+C to stop");
    let builder = PollBuilder::new()
        .with_timeout(Duration::from_secs(1))
        .with_interrupt(&interrupt);
    let mut received = 0usize;
    let mut msg = Message::new();

    loop {
        let mut items = [PollItem::endpoint(&reader, PollFlags::READABLE)];
        let n = builder.poll(&mut items)?;
        if n == 0 {
            if interrupt.wait(Some(Duration::ZERO))? {
                println!("Main: interrupted");
                break;
            }
            println!("Main: idle");
            continue;
        }

        while reader.recv(&mut msg).is_ok() {
            received += 1;
            println!("Main: {}", String::from_utf8_lossy(msg.data().unwrap_or_default()));
        }
        if max_messages.is_some_and(|max| received >= max) {
            break;
        }
    }

    keep_alive.store(false, Ordering::SeqCst);
    let _ = worker.join();
    println!("Main: received {} messages", received);
    Ok(())
}
