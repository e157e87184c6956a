//! Cellular UDP echo example using Extended Sockets.
//!
//! Walks the full socket lifecycle against a UDP echo service:
//!
//! 1. Socket create (UDP)
//! 2. Socket bind to a local port
//! 3. Socket send-to
//! 4. Receive-from via the event channel
//! 5. Socket close
//!
//! # Requirements
//!
//! - An XBee 3 Cellular modem in API mode with an activated SIM
//! - The serial port path and APN adjusted for your setup
//!
//! # Usage
//!
//! ```sh
//! cargo run -p xbeelib --features cellular --example cellular_udp_echo
//! ```

use std::net::Ipv4Addr;
use std::time::Duration;

use xbeelib::cellular::{CellularConfig, XBeeCellularBuilder};
use xbeelib::{Protocol, XBee, XBeeEvent};

/// Public UDP echo service.
const ECHO_HOST: Ipv4Addr = Ipv4Addr::new(52, 43, 121, 77);
const ECHO_PORT: u16 = 10001;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let serial_port = "/dev/ttyUSB0";

    println!("Connecting to XBee 3 Cellular on {serial_port}...");
    let mut xbee = XBeeCellularBuilder::new()
        .serial_port(serial_port)
        .baud_rate(9600)
        .config(CellularConfig {
            apn: "hologram".into(),
            ..Default::default()
        })
        .build()
        .await?;

    println!("Attaching to network (this can take a minute)...");
    xbee.connect().await?;
    println!("Attached.");

    let mut events = xbee.subscribe();

    let socket = xbee.socket_create(Protocol::Udp).await?;
    println!("Socket {socket} created");

    xbee.socket_bind(socket, 0x1234, true).await?;
    println!("Socket bound to local port 0x1234");

    xbee.socket_send_to(socket, ECHO_HOST, ECHO_PORT, b"Hello from xbeelib!")
        .await?;
    println!("Datagram sent to {ECHO_HOST}:{ECHO_PORT}, waiting for echo...");

    // Pump frames until the echo comes back (or we give up).
    let deadline = tokio::time::Instant::now() + Duration::from_secs(30);
    'wait: while tokio::time::Instant::now() < deadline {
        xbee.process().await?;
        while let Ok(event) = events.try_recv() {
            if let XBeeEvent::CellularPacketReceived(packet) = event {
                println!(
                    "Echo from {}:{}: {}",
                    packet.ip,
                    packet.remote_port,
                    String::from_utf8_lossy(&packet.payload)
                );
                break 'wait;
            }
        }
    }

    xbee.socket_close(socket, true).await?;
    println!("Socket closed.");
    Ok(())
}
