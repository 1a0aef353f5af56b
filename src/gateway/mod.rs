//! Gateway for XCP USB-CAN: reframes protocol packets between the USB
//! boundary and the CAN transport, tracks the connection state, and hands
//! off to the local bootloader when a Connect command addresses this device.
//!
//! The state machine has two states, `Disconnected` and `Connected`. A
//! well-formed Connect transfer from USB connects; Disconnect, Program
//! Reset, or the idle timeout disconnect. Everything else, malformed
//! transfers included, is relayed without interpretation: the gateway
//! favors availability of the byte pipe over strict protocol conformance.
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;
use embassy_time::Duration;
use embedded_can::Id;

use crate::control_loop::TickSubscriber;
use crate::error::{FrameError, TransportError};
use crate::gateway::traits::{Bootloader, UsbLink};
use crate::gateway::xcp::{XcpCommand, MAX_PACKET_LEN};
use crate::transport::driver::{CanTransport, TransportListener};
use crate::transport::frame::{make_id, CanFilter, CanFrame};
use crate::transport::traits::can_controller::CanController;
use crate::transport::Baudrate;

pub mod traits;
pub mod xcp;

/// Idle time after the last accepted USB transfer before a connected
/// session is declared dead.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(12_000);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Static gateway configuration.
pub struct GatewayConfig {
    /// Own node identifier. A Connect command whose mode parameter equals
    /// this value triggers local bootloader activation instead of
    /// forwarding.
    pub own_node_id: u8,
    /// CAN communication speed.
    pub baud_rate: Baudrate,
    /// Whether both CAN identifiers below are 29-bit extended.
    pub extended_ids: bool,
    /// Identifier used when sending XCP packets to the target.
    pub id_to_target: u32,
    /// Identifier carrying XCP packets from the target.
    pub id_from_target: u32,
    /// Idle-connection timeout.
    pub idle_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            own_node_id: 255,
            baud_rate: Baudrate::Br500K,
            extended_ids: false,
            id_to_target: 0x667,
            id_from_target: 0x7E1,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Notifications surfaced to the gateway's consumer.
pub enum GatewayEvent {
    /// An XCP session was established.
    Connected,
    /// The session ended (command or idle timeout).
    Disconnected,
    /// The CAN controller went bus-off. The consumer decides on recovery;
    /// the session state is left untouched.
    BusError,
}

/// Channel carrying [`GatewayEvent`]s to a consumer task.
pub type GatewayEvents<M, const CAP: usize> = Channel<M, GatewayEvent, CAP>;

/// XCP USB-CAN gateway.
///
/// Subscribes to the control loop for timeout bookkeeping (as a
/// [`TickSubscriber`]) and to the transport worker for CAN-side events (as
/// a [`TransportListener`]). USB-side data enters through
/// [`on_usb_data_received`](Gateway::on_usb_data_received).
pub struct Gateway<'a, C, U, B, M, const EVT: usize>
where
    C: CanController,
    U: UsbLink,
    B: Bootloader,
    M: RawMutex,
{
    transport: CanTransport<C>,
    usb: U,
    boot: B,
    own_node_id: u8,
    baud_rate: Baudrate,
    idle_timeout: Duration,
    id_to_target: Id,
    id_from_target: Id,
    started: bool,
    connected: bool,
    current: Duration,
    last_packet: Duration,
    events: Option<&'a GatewayEvents<M, EVT>>,
}

impl<'a, C, U, B, M, const EVT: usize> Gateway<'a, C, U, B, M, EVT>
where
    C: CanController,
    U: UsbLink,
    B: Bootloader,
    M: RawMutex,
{
    /// Build the gateway around an already claimed transport and the board
    /// boundaries. Fails if a configured identifier exceeds the bound
    /// implied by the configured width.
    pub fn new(
        transport: CanTransport<C>,
        usb: U,
        boot: B,
        config: GatewayConfig,
        events: Option<&'a GatewayEvents<M, EVT>>,
    ) -> Result<Self, FrameError> {
        let id_to_target = make_id(config.id_to_target, config.extended_ids)?;
        let id_from_target = make_id(config.id_from_target, config.extended_ids)?;
        Ok(Self {
            transport,
            usb,
            boot,
            own_node_id: config.own_node_id,
            baud_rate: config.baud_rate,
            idle_timeout: config.idle_timeout,
            id_to_target,
            id_from_target,
            started: false,
            connected: false,
            current: Duration::from_ticks(0),
            last_packet: Duration::from_ticks(0),
            events,
        })
    }

    /// Start the gateway: program the from-target acceptance filter,
    /// connect the transport and mark the gateway started. Does not touch
    /// the session state.
    pub fn start(&mut self) -> Result<(), TransportError<C::Error>> {
        self.transport
            .set_filter(CanFilter::exact_match(self.id_from_target))?;
        self.transport.connect(self.baud_rate)?;
        self.started = true;
        #[cfg(feature = "defmt")]
        defmt::info!("gateway started");
        Ok(())
    }

    /// Stop the gateway and disconnect the transport. Does not touch the
    /// session state.
    pub fn stop(&mut self) {
        self.transport.disconnect();
        self.started = false;
        #[cfg(feature = "defmt")]
        defmt::info!("gateway stopped");
    }

    /// Handle one transfer received from the USB host.
    ///
    /// Every transfer refreshes the last-packet timestamp while the gateway
    /// is started, malformed ones included; this keeps an active but
    /// protocol-silent link from timing out. Recognized connection
    /// commands drive the state machine; everything is forwarded onto CAN
    /// except a Connect that activates the local bootloader.
    pub fn on_usb_data_received(&mut self, data: &[u8]) {
        if !self.started {
            return;
        }
        self.last_packet = self.current;

        match XcpCommand::parse(data) {
            Some(XcpCommand::Connect { mode }) => {
                if self.boot.is_present() && mode == self.own_node_id {
                    #[cfg(feature = "defmt")]
                    defmt::info!("firmware update for node {}, activating bootloader", mode);
                    self.boot.activate();
                    return;
                }
                self.set_connected(true);
            }
            Some(XcpCommand::Disconnect) | Some(XcpCommand::ProgramReset) => {
                self.set_connected(false);
            }
            // Not connection-relevant, or malformed: relay only.
            Some(XcpCommand::Other) | None => {}
        }
        self.forward_to_can(data);
    }

    /// Whether `start` has been called without a matching `stop`.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Whether an XCP session is currently established.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// The underlying transport, e.g. for bus-off recovery.
    pub fn transport_mut(&mut self) -> &mut CanTransport<C> {
        &mut self.transport
    }

    /// Shared view of the underlying transport.
    pub fn transport(&self) -> &CanTransport<C> {
        &self.transport
    }

    fn set_connected(&mut self, connected: bool) {
        if self.connected != connected {
            self.connected = connected;
            self.emit(if connected {
                GatewayEvent::Connected
            } else {
                GatewayEvent::Disconnected
            });
        }
    }

    fn forward_to_can(&mut self, transfer: &[u8]) {
        if transfer.len() < 2 {
            return;
        }
        // Wire framing: byte 0 is the payload length n, bytes [1..=n] carry
        // the packet toward the target. Best-effort for malformed
        // transfers: clamp to what fits one CAN frame.
        let end = (transfer[0] as usize + 1)
            .min(transfer.len())
            .min(MAX_PACKET_LEN + 1);
        let payload = &transfer[1..end];
        let Ok(frame) = CanFrame::new(self.id_to_target, payload) else {
            return;
        };
        if let Err(_err) = self.transport.transmit(&frame) {
            // Reference policy under CAN-side congestion: log and drop.
            #[cfg(feature = "defmt")]
            defmt::warn!("XCP packet dropped: {}", _err);
        }
    }

    fn emit(&self, event: GatewayEvent) {
        if let Some(channel) = self.events {
            if channel.try_send(event).is_err() {
                #[cfg(feature = "defmt")]
                defmt::warn!("gateway event queue full, event dropped");
            }
        }
    }
}

impl<'a, C, U, B, M, const EVT: usize> TransportListener for Gateway<'a, C, U, B, M, EVT>
where
    C: CanController,
    U: UsbLink,
    B: Bootloader,
    M: RawMutex,
{
    fn on_frame_transmitted(&mut self, _frame: &CanFrame) {
        #[cfg(feature = "defmt")]
        defmt::trace!("XCP packet sent, id {=u32:#x}", _frame.raw_id());
    }

    /// Transparent pass-through toward USB for frames carrying the
    /// from-target identifier. No response validation is performed.
    fn on_frame_received(&mut self, frame: &CanFrame) {
        if !self.started || frame.id != self.id_from_target {
            return;
        }
        let mut transfer = [0u8; MAX_PACKET_LEN + 1];
        transfer[0] = frame.len as u8;
        transfer[1..1 + frame.len].copy_from_slice(frame.payload());
        if let Err(_err) = self.usb.transmit(&transfer[..frame.len + 1]) {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "USB transmit failed: {}",
                defmt::Debug2Format(&_err)
            );
        }
    }

    fn on_bus_off(&mut self) {
        self.emit(GatewayEvent::BusError);
    }
}

impl<'a, C, U, B, M, const EVT: usize> TickSubscriber for Gateway<'a, C, U, B, M, EVT>
where
    C: CanController,
    U: UsbLink,
    B: Bootloader,
    M: RawMutex,
{
    /// Timeout bookkeeping, polled once per control-loop tick. The session
    /// drops exactly once, at the tick that crosses the idle threshold.
    fn update(&mut self, elapsed: Duration) {
        self.current += elapsed;
        if self.started
            && self.connected
            && self.current - self.last_packet >= self.idle_timeout
        {
            #[cfg(feature = "defmt")]
            defmt::info!("idle timeout, dropping XCP session");
            self.set_connected(false);
        }
    }
}
