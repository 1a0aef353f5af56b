/// Test doubles to simulate the CAN controller, the USB host link and the
/// bootloader during integration tests.
use std::sync::{Arc, Mutex};

use xcp_bridge::error::TransportError;
use xcp_bridge::gateway::traits::{Bootloader, UsbLink};
use xcp_bridge::transport::bit_timing::BitTiming;
use xcp_bridge::transport::driver::CanTransport;
use xcp_bridge::transport::frame::{CanFilter, CanFrame};
use xcp_bridge::transport::traits::can_controller::CanController;

#[derive(Default)]
/// Observable state of the simulated CAN peripheral.
pub struct ControllerState {
    /// Frames loaded into a transmit mailbox, in request order.
    pub loaded: Vec<CanFrame>,
    /// Filters programmed by each `start` call.
    pub filters: Vec<CanFilter>,
    /// Whether the controller is currently started.
    pub running: bool,
    /// Empty-mailbox bitmask returned to the transport.
    pub empty_mask: u8,
}

#[derive(Clone)]
/// In-memory CAN controller reproducing the `CanController` contract.
/// Cloned handles share one state so the test can inspect what the
/// transport did.
pub struct SharedController {
    state: Arc<Mutex<ControllerState>>,
}

#[allow(dead_code)]
impl SharedController {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ControllerState {
                empty_mask: 0b111,
                ..ControllerState::default()
            })),
        }
    }

    /// Run a closure over the shared peripheral state.
    pub fn inspect<R>(&self, f: impl FnOnce(&mut ControllerState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    /// Frames loaded so far, oldest first.
    pub fn loaded(&self) -> Vec<CanFrame> {
        self.state.lock().unwrap().loaded.clone()
    }
}

impl CanController for SharedController {
    type Error = std::convert::Infallible;

    fn peripheral_clock_hz(&self) -> u32 {
        36_000_000
    }

    fn start(&mut self, _timing: &BitTiming, filter: &CanFilter) -> Result<(), Self::Error> {
        let mut state = self.state.lock().unwrap();
        state.filters.push(*filter);
        state.running = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.state.lock().unwrap().running = false;
    }

    fn empty_mailboxes(&self) -> u8 {
        self.state.lock().unwrap().empty_mask
    }

    fn load_and_request(&mut self, _mailbox: usize, frame: &CanFrame) {
        self.state.lock().unwrap().loaded.push(*frame);
    }
}

/// Claim the shared controller slot, retrying while another test in the
/// same binary still holds it.
#[allow(dead_code)]
pub fn claim_transport(
    controller: SharedController,
) -> CanTransport<SharedController> {
    loop {
        match CanTransport::claim(controller.clone(), CanFilter::accept_all()) {
            Ok(transport) => return transport,
            Err(TransportError::ControllerClaimed) => std::thread::yield_now(),
            Err(error) => panic!("unexpected claim failure: {error:?}"),
        }
    }
}

#[derive(Clone, Default)]
/// USB host double capturing every transfer sent device-to-host.
pub struct HostUsb {
    received: Arc<Mutex<Vec<Vec<u8>>>>,
}

#[allow(dead_code)]
impl HostUsb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transfers captured so far, oldest first.
    pub fn transfers(&self) -> Vec<Vec<u8>> {
        self.received.lock().unwrap().clone()
    }
}

impl UsbLink for HostUsb {
    type Error = std::convert::Infallible;

    fn transmit(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.received.lock().unwrap().push(data.to_vec());
        Ok(())
    }
}

#[derive(Clone, Default)]
/// Bootloader double recording activations.
pub struct SpyBootloader {
    pub present: bool,
    activations: Arc<Mutex<usize>>,
}

#[allow(dead_code)]
impl SpyBootloader {
    pub fn present() -> Self {
        Self {
            present: true,
            activations: Arc::default(),
        }
    }

    pub fn activations(&self) -> usize {
        *self.activations.lock().unwrap()
    }
}

impl Bootloader for SpyBootloader {
    fn is_present(&self) -> bool {
        self.present
    }

    fn activate(&mut self) {
        *self.activations.lock().unwrap() += 1;
    }
}
