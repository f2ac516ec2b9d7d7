// In demos/fanout.rs
//
// One large payload fanned out to several reader threads without copying
// the bytes. Every reader hashes what it received and compares it against
// the producer's digest.
//
// cargo run --example fanout -- <num_readers> <payload_bytes>
use dmxp_msgpoll::Inproc::{pipe, ContextBuilder};
use dmxp_msgpoll::Msg::Message;
use sha2::{Digest, Sha256};
use std::env;
use std::thread;

fn main() -> std::io::Result<()> {
    let args: Vec<String> = env::args().collect();
    let num_readers: usize = args.get(1).map(|s| s.parse().expect("Invalid number of readers")).unwrap_or(4);
    let payload_bytes: usize = args.get(2).map(|s| s.parse().expect("Invalid payload size")).unwrap_or(1 << 20);

    let producer_ctx = ContextBuilder::new().build()?;

    let mut payload = Message::with_size(payload_bytes)?;
    if let Some(bytes) = payload.data_mut() {
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = (i % 251) as u8;
        }
    }
    let digest = format!("{:x}", Sha256::digest(payload.data().unwrap_or_default()));
    println!("Producer: {} byte payload, sha256 {}", payload_bytes, digest);

    let mut writers = Vec::with_capacity(num_readers);
    let mut handles = Vec::with_capacity(num_readers);
    for id in 0..num_readers {
        let reader_ctx = ContextBuilder::new().build()?;
        let (writer, reader) = pipe(&producer_ctx, &reader_ctx);
        writers.push(writer);

        let expected = digest.clone();
        handles.push(thread::spawn(move || -> std::io::Result<bool> {
            let mut msg = Message::new();
            reader.recv_blocking(&mut msg)?;
            let got = format!("{:x}", Sha256::digest(msg.data().unwrap_or_default()));
            println!(
                "Reader {}: {} bytes, {} owners, hash {}",
                id,
                msg.size(),
                msg.ref_count().unwrap_or(1),
                if got == expected { "OK" } else { "MISMATCH" }
            );
            Ok(got == expected)
        }));
    }

    let start = std::time::Instant::now();
    for writer in &writers {
        let mut copy = payload.share();
        writer.send(&mut copy)?;
    }
    payload.close();
    println!("Producer: fanned out to {} readers in {:.2?}", num_readers, start.elapsed());

    let mut all_ok = true;
    for h in handles {
        match h.join() {
            Ok(Ok(ok)) => all_ok &= ok,
            Ok(Err(e)) => {
                eprintln!("Reader failed: {}", e);
                all_ok = false;
            }
            Err(_) => all_ok = false,
        }
    }

    if all_ok {
        println!("All {} readers verified the shared payload", num_readers);
        Ok(())
    } else {
        Err(std::io::Error::new(std::io::ErrorKind::InvalidData, "payload mismatch"))
    }
}
