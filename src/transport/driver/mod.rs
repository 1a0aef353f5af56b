//! CAN transport driver: owns one controller instance, programs bit timing
//! and the acceptance filter, arbitrates the transmit mailboxes, and drives
//! transport callbacks from the hardware event queue on a worker task.
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Receiver;
use embassy_time::{with_timeout, Duration};

use crate::error::{TransmitError, TransportError};
use crate::transport::bit_timing::BitTiming;
use crate::transport::event::{EventQueue, HardwareEvent};
use crate::transport::frame::{CanFilter, CanFrame};
use crate::transport::traits::can_controller::CanController;
use crate::transport::{mailbox, Baudrate, EVENT_WAIT_TIMEOUT_MS};

/// Registration slot for the single live transport instance.
///
/// One physical controller exists, so exactly one [`CanTransport`] may be
/// alive at a time; interrupt trampolines rely on that identity. The flag is
/// shared across all controller types on purpose.
static CONTROLLER_CLAIMED: AtomicBool = AtomicBool::new(false);

/// Transport session over one physical CAN controller.
pub struct CanTransport<C: CanController> {
    controller: C,
    filter: CanFilter,
    baud_rate: Option<Baudrate>,
    connected: bool,
}

impl<C: CanController> CanTransport<C> {
    /// Claim the controller and build the transport around it.
    ///
    /// Checked registration: fails with
    /// [`TransportError::ControllerClaimed`] while another instance is
    /// alive. The slot is released when the transport is dropped.
    pub fn claim(controller: C, filter: CanFilter) -> Result<Self, TransportError<C::Error>> {
        if CONTROLLER_CLAIMED
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(TransportError::ControllerClaimed);
        }
        Ok(Self {
            controller,
            filter,
            baud_rate: None,
            connected: false,
        })
    }

    /// Configure the controller and synchronize to the CAN bus.
    ///
    /// Disconnects first if already connected. Bit-timing synthesis failure
    /// is a configuration error to be caught before shipping; callers treat
    /// it as startup-fatal.
    pub fn connect(&mut self, baud_rate: Baudrate) -> Result<(), TransportError<C::Error>> {
        if self.connected {
            self.disconnect();
        }
        let timing = BitTiming::solve(
            self.controller.peripheral_clock_hz(),
            baud_rate.bits_per_second(),
        )?;
        self.controller
            .start(&timing, &self.filter)
            .map_err(TransportError::Controller)?;
        self.baud_rate = Some(baud_rate);
        self.connected = true;
        #[cfg(feature = "defmt")]
        defmt::info!(
            "CAN connected: {} bit/s, sample point {}‰",
            baud_rate.bits_per_second(),
            timing.sample_point_permille()
        );
        Ok(())
    }

    /// Disconnect from the CAN bus. Idempotent; after return no further
    /// events are delivered.
    pub fn disconnect(&mut self) {
        if self.connected {
            self.controller.stop();
            self.connected = false;
            #[cfg(feature = "defmt")]
            defmt::info!("CAN disconnected");
        }
    }

    /// Replace the reception acceptance filter.
    ///
    /// The filter bank is only writable while the controller is not
    /// matching traffic, so the transport disconnects, swaps the filter and
    /// reconnects only if it was connected before the call.
    pub fn set_filter(&mut self, filter: CanFilter) -> Result<(), TransportError<C::Error>> {
        let was_connected = self.connected;
        self.disconnect();
        self.filter = filter;
        if was_connected {
            if let Some(baud_rate) = self.baud_rate {
                self.connect(baud_rate)?;
            }
        }
        Ok(())
    }

    /// Submit a frame for transmission.
    ///
    /// Selects the lowest-index empty mailbox under a short critical
    /// section shared with the completion interrupt. Returns
    /// [`TransmitError::Busy`] when all three mailboxes are occupied; the
    /// caller decides whether to drop, queue or retry. Never blocks.
    pub fn transmit(&mut self, frame: &CanFrame) -> Result<(), TransmitError> {
        if !self.connected {
            return Err(TransmitError::NotConnected);
        }
        let controller = &mut self.controller;
        critical_section::with(|_| {
            let mask = controller.empty_mailboxes();
            match mailbox::first_empty(mask) {
                Some(index) => {
                    controller.load_and_request(index, frame);
                    Ok(())
                }
                None => Err(TransmitError::Busy),
            }
        })
    }

    /// Whether the transport is currently synchronized to the bus.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Acceptance filter currently held by the transport.
    pub fn filter(&self) -> &CanFilter {
        &self.filter
    }

    /// Shared access to the underlying controller, e.g. for board code
    /// running a bus-off recovery sequence.
    pub fn controller(&self) -> &C {
        &self.controller
    }

    /// Exclusive access to the underlying controller.
    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.controller
    }
}

impl<C: CanController> Drop for CanTransport<C> {
    fn drop(&mut self) {
        self.disconnect();
        CONTROLLER_CLAIMED.store(false, Ordering::Release);
    }
}

//==================================================================================WORKER

/// Transport-level notifications, always delivered on the worker task,
/// never from interrupt context.
pub trait TransportListener {
    /// A frame left a transmit mailbox; echoes identifier, length and data
    /// actually sent, reconstructed from the completed mailbox.
    fn on_frame_transmitted(&mut self, frame: &CanFrame);
    /// A frame passed the acceptance filter.
    fn on_frame_received(&mut self, frame: &CanFrame);
    /// The controller went bus-off. Recovery is the consumer's decision.
    fn on_bus_off(&mut self);
}

/// Worker side of the hardware event queue.
///
/// Consumes events in arrival order and dispatches them to a
/// [`TransportListener`], so callback execution never happens on the
/// interrupt stack.
pub struct TransportRunner<'a, M: RawMutex, const CAP: usize> {
    events: Receiver<'a, M, HardwareEvent, CAP>,
}

impl<'a, M: RawMutex, const CAP: usize> TransportRunner<'a, M, CAP> {
    /// Attach the runner to the queue fed by the interrupt handlers.
    pub fn new(queue: &'a EventQueue<M, CAP>) -> Self {
        Self {
            events: queue.receiver(),
        }
    }

    /// Worker loop: bounded-timeout wait on the event queue, dispatch, and
    /// immediate re-arm. The only suspension point of the worker task.
    pub async fn drive<L: TransportListener>(&mut self, listener: &mut L) -> ! {
        loop {
            match with_timeout(
                Duration::from_millis(EVENT_WAIT_TIMEOUT_MS),
                self.events.receive(),
            )
            .await
            {
                Ok(event) => dispatch(listener, event),
                // Timed out with no event; re-enter the wait.
                Err(_) => {}
            }
        }
    }

    /// Synchronously service every queued event. Returns the number of
    /// events dispatched. For polling designs and tests.
    pub fn drain<L: TransportListener>(&mut self, listener: &mut L) -> usize {
        let mut count = 0;
        while let Ok(event) = self.events.try_receive() {
            dispatch(listener, event);
            count += 1;
        }
        count
    }
}

fn dispatch<L: TransportListener>(listener: &mut L, event: HardwareEvent) {
    match event {
        HardwareEvent::Transmitted(frame) => listener.on_frame_transmitted(&frame),
        HardwareEvent::Received(frame) => listener.on_frame_received(&frame),
        HardwareEvent::BusOff => {
            #[cfg(feature = "defmt")]
            defmt::warn!("CAN controller went bus-off");
            listener.on_bus_off();
        }
    }
}
