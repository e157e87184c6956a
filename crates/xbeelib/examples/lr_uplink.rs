//! Periodic LoRaWAN uplink example.
//!
//! Demonstrates configuring OTAA credentials on an XBee LR module, joining
//! the network, sending an uplink every ten seconds, and printing any
//! downlinks that arrive between transmissions.
//!
//! # Requirements
//!
//! - An XBee LR module in API mode connected via USB or UART
//! - Credentials provisioned on your LoRaWAN network server
//! - The serial port path adjusted for your system
//!
//! # Usage
//!
//! ```sh
//! cargo run -p xbeelib --features lr --example lr_uplink
//! ```

use std::time::Duration;

use xbeelib::lr::XBeeLrBuilder;
use xbeelib::{LoRaClass, LrPacket, XBee, XBeeEvent};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Adjust this to match your system's serial port.
    let serial_port = "/dev/ttyUSB0";

    println!("Connecting to XBee LR on {serial_port}...");
    let mut xbee = XBeeLrBuilder::new()
        .serial_port(serial_port)
        .baud_rate(9600)
        .build()
        .await?;

    println!("Firmware version: 0x{:08X}", xbee.firmware_version().await?);
    println!("Device EUI: {}", xbee.dev_eui().await?);

    // Provision OTAA credentials (use your own values).
    xbee.set_app_eui("9E1177BD6B1DF41E").await?;
    xbee.set_app_key("CD32AAB41C54175E9060D86F3A8B7F48").await?;
    xbee.set_nwk_key("CD32AAB41C54175E9060D86F3A8B7F48").await?;
    xbee.set_region(8).await?; // US915
    xbee.set_class(LoRaClass::C).await?;
    xbee.set_api_options(0x01).await?;

    println!("Joining network...");
    xbee.connect().await?;
    println!("Joined.");

    let mut events = xbee.subscribe();
    let mut counter: u32 = 0;

    loop {
        let packet = LrPacket {
            payload: counter.to_be_bytes().to_vec(),
            port: 2,
            ack: false,
            ..Default::default()
        };

        print!("Sending uplink {counter}... ");
        match xbee.send_packet(&packet).await {
            Ok(0x00) => println!("delivered"),
            Ok(status) => println!("failed (status 0x{status:02X})"),
            Err(e) => println!("error: {e}"),
        }
        counter += 1;

        // Poll for downlinks between uplinks.
        let window = tokio::time::Instant::now() + Duration::from_secs(10);
        while tokio::time::Instant::now() < window {
            xbee.process().await?;
            while let Ok(event) = events.try_recv() {
                if let XBeeEvent::LrPacketReceived(downlink) = event {
                    println!(
                        "Downlink on port {} (RSSI {} dBm, SNR {} dB): {:02X?}",
                        downlink.port, downlink.rssi, downlink.snr, downlink.payload
                    );
                }
            }
        }
    }
}
