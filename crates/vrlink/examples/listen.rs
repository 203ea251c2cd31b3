//! Load records and print what the module recognizes.
//!
//! Usage: cargo run -p vrlink --example listen --features serial -- /dev/ttyUSB0 0,1,2

use std::time::Duration;

use vrlink::device::{SharedModule, VoiceModule};
use vrlink::transport::SerialConfig;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let port = args.next().ok_or("usage: listen <port> [ids]")?;
    let ids: Vec<u8> = match args.next() {
        Some(list) => list
            .split(',')
            .map(|id| id.trim().parse())
            .collect::<Result<_, _>>()?,
        None => vec![0, 1, 2],
    };

    let module = SharedModule::new(VoiceModule::open(&SerialConfig::new(port))?);
    let outcome = module.load(&ids)?;
    println!("loaded {} of {} records", outcome.loaded, ids.len());

    let status = module.check_recognizer()?;
    println!("recognizer slots: {:?}", status.slots);

    loop {
        if let Some(event) = module.recognize(Duration::from_secs(1))? {
            match event.signature_text() {
                Some(text) => println!("record {} ({text})", event.record),
                None => println!("record {}", event.record),
            }
        }
    }
}
