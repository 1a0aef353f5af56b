//! # Quickstart Example
//!
//! Minimal example demonstrating the basics of xcp-bridge:
//! - Solve a CAN bit timing for a clock/baud-rate pair
//! - Claim the controller and start the gateway
//! - Drive an XCP session from simulated USB transfers
//!
//! This example uses `std` and a simulated controller for a quick trial
//! run; on hardware the same code runs against the board's `CanController`
//! and `UsbLink` implementations.
//!
//! ```bash
//! cargo run --example quickstart
//! ```

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_time::Duration;
use xcp_bridge::control_loop::TickSubscriber;
use xcp_bridge::gateway::traits::{Bootloader, UsbLink};
use xcp_bridge::gateway::{Gateway, GatewayConfig};
use xcp_bridge::transport::bit_timing::BitTiming;
use xcp_bridge::transport::driver::{CanTransport, TransportListener};
use xcp_bridge::transport::frame::{CanFilter, CanFrame};
use xcp_bridge::transport::traits::can_controller::CanController;

/// Simulated CAN peripheral: every mailbox is always free and loaded
/// frames are printed instead of leaving on a wire.
struct DemoController;

impl CanController for DemoController {
    type Error = std::convert::Infallible;

    fn peripheral_clock_hz(&self) -> u32 {
        36_000_000
    }

    fn start(&mut self, timing: &BitTiming, _filter: &CanFilter) -> Result<(), Self::Error> {
        println!("   controller started, prescaler {}", timing.prescaler);
        Ok(())
    }

    fn stop(&mut self) {
        println!("   controller stopped");
    }

    fn empty_mailboxes(&self) -> u8 {
        0b111
    }

    fn load_and_request(&mut self, mailbox: usize, frame: &CanFrame) {
        print!("   mailbox {} -> id 0x{:03X}:", mailbox, frame.raw_id());
        for byte in frame.payload() {
            print!(" {:02X}", byte);
        }
        println!();
    }
}

/// USB link printing device-to-host transfers.
struct DemoUsb;

impl UsbLink for DemoUsb {
    type Error = std::convert::Infallible;

    fn transmit(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        print!("   to host:");
        for byte in data {
            print!(" {:02X}", byte);
        }
        println!();
        Ok(())
    }
}

/// Device without a local bootloader.
struct NoBootloader;

impl Bootloader for NoBootloader {
    fn is_present(&self) -> bool {
        false
    }

    fn activate(&mut self) {}
}

fn main() {
    println!("=== xcp-bridge Quickstart ===\n");

    // ======================================================================
    // 1. Solve a bit timing
    // ======================================================================
    println!("1. Bit timing for 500 kbit/s at 36 MHz");

    let timing = BitTiming::solve(36_000_000, 500_000).expect("exact solution exists");
    println!(
        "   prescaler {}, seg1 {} TQ, seg2 {} TQ, sample point {}‰\n",
        timing.prescaler,
        timing.phase_seg1,
        timing.phase_seg2,
        timing.sample_point_permille()
    );

    // ======================================================================
    // 2. Claim the controller, build and start the gateway
    // ======================================================================
    println!("2. Starting the gateway");

    let transport = CanTransport::claim(DemoController, CanFilter::accept_all())
        .expect("no other instance is alive");
    let mut gateway: Gateway<'_, _, _, _, NoopRawMutex, 4> = Gateway::new(
        transport,
        DemoUsb,
        NoBootloader,
        GatewayConfig::default(),
        None,
    )
    .expect("default identifiers are valid");
    gateway.start().expect("timing solvable");
    println!();

    // ======================================================================
    // 3. The host connects and polls over USB
    // ======================================================================
    println!("3. USB transfers from the host");

    gateway.on_usb_data_received(&[2, 0xFF, 0x00]); // CONNECT
    println!("   connected: {}", gateway.is_connected());
    gateway.on_usb_data_received(&[1, 0xFD]); // GET_STATUS
    println!();

    // ======================================================================
    // 4. The target replies over CAN
    // ======================================================================
    println!("4. CAN frame from the target");

    let reply = CanFrame::from_raw(0x7E1, false, &[0xFF, 0x1D, 0xC0]).unwrap();
    gateway.on_frame_received(&reply);
    println!();

    // ======================================================================
    // 5. Idle timeout
    // ======================================================================
    println!("5. Host goes quiet; control loop ticks every 10 ms");

    for _ in 0..1200 {
        gateway.update(Duration::from_millis(10));
    }
    println!("   connected after 12 s of silence: {}\n", gateway.is_connected());

    gateway.stop();
    println!("\nQuickstart complete.");
}
