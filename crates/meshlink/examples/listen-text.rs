//! Print text messages heard by a radio on its network bridge.
//!
//! Run with:
//!   cargo run --example listen-text -- 192.168.42.1:4403
//!
//! Without an argument the radio's default access-point address is used.

use std::net::SocketAddr;

use meshlink::client::{ClientConfig, MeshClient, SocketConfig, Transport};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let socket = match std::env::args().nth(1) {
        Some(addr) => SocketConfig::new(addr.parse::<SocketAddr>()?),
        None => SocketConfig::default(),
    };
    eprintln!("Connecting to {}", socket.endpoint);

    let mut client = MeshClient::new(Transport::socket(socket), ClientConfig::default());
    client.on_text(|meta, text| {
        println!("[{:08x} ch{}] {text}", meta.from, meta.channel);
    });

    let mut announced = false;
    loop {
        let outcome = client.poll()?;
        if outcome.can_send && !announced {
            eprintln!("Link up");
            announced = true;
        } else if !outcome.can_send {
            announced = false;
        }
        if outcome.is_idle() {
            std::thread::sleep(client.config().poll_backoff);
        }
    }
}
