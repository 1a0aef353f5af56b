//! Full XCP session scenario: the host connects over USB, polls the target,
//! the target replies over CAN, and the session finally dies of idleness.

mod helpers;

use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, NoopRawMutex};
use embassy_time::Duration;
use helpers::{claim_transport, HostUsb, SharedController, SpyBootloader};
use static_cell::StaticCell;
use xcp_bridge::control_loop::TickPublisher;
use xcp_bridge::gateway::{Gateway, GatewayConfig, GatewayEvent, GatewayEvents};
use xcp_bridge::transport::driver::TransportRunner;
use xcp_bridge::transport::event::{publish_from_isr, EventQueue, HardwareEvent};
use xcp_bridge::transport::frame::CanFrame;

type TestGateway<'a> =
    Gateway<'a, SharedController, HostUsb, SpyBootloader, NoopRawMutex, 8>;

#[test]
fn full_session_conversation() {
    // Board wiring: controller, USB link, bootloader, event plumbing.
    let controller = SharedController::new();
    let host = HostUsb::new();
    let boot = SpyBootloader::default();
    // The hardware queue lives in a static, shared between the interrupt
    // trampolines and the worker, exactly as firmware allocates it.
    static HARDWARE_EVENTS: StaticCell<EventQueue<CriticalSectionRawMutex, 8>> = StaticCell::new();
    let hardware_events: &EventQueue<CriticalSectionRawMutex, 8> =
        HARDWARE_EVENTS.init(EventQueue::new());
    let gateway_events: GatewayEvents<NoopRawMutex, 8> = GatewayEvents::new();
    let mut runner = TransportRunner::new(hardware_events);

    let transport = claim_transport(controller.clone());
    let mut gateway: TestGateway = Gateway::new(
        transport,
        host.clone(),
        boot.clone(),
        GatewayConfig::default(),
        Some(&gateway_events),
    )
    .expect("default identifiers must be valid");

    // 1. Start: the transport comes up filtered on the from-target
    // identifier.
    gateway.start().expect("500 kbit/s at 36 MHz has a timing");
    controller.inspect(|state| {
        assert!(state.running);
        assert_eq!(state.filters.last().unwrap().code, 0x7E1);
    });

    // 2. The host opens the session.
    gateway.on_usb_data_received(&[2, 0xFF, 0x00]);
    assert!(gateway.is_connected());
    assert_eq!(gateway_events.try_receive(), Ok(GatewayEvent::Connected));

    let loaded = controller.loaded();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].raw_id(), 0x667);
    assert_eq!(loaded[0].payload(), &[0xFF, 0x00]);

    // 3. The host polls a measurement (SHORT_UPLOAD, forwarded untouched).
    gateway.on_usb_data_received(&[8, 0xF4, 0x02, 0x00, 0x00, 0x00, 0x20, 0x00, 0x10]);
    let loaded = controller.loaded();
    assert_eq!(loaded.len(), 2);
    assert_eq!(
        loaded[1].payload(),
        &[0xF4, 0x02, 0x00, 0x00, 0x00, 0x20, 0x00, 0x10]
    );

    // 4. The target answers: interrupt context publishes the completion
    // echo and the reception, the worker dispatches both to the gateway.
    let echo = loaded[1];
    let response = CanFrame::from_raw(0x7E1, false, &[0xFF, 0x12, 0x34]).unwrap();
    assert!(publish_from_isr(
        hardware_events,
        HardwareEvent::Transmitted(echo)
    ));
    assert!(publish_from_isr(
        hardware_events,
        HardwareEvent::Received(response)
    ));
    assert_eq!(runner.drain(&mut gateway), 2);

    // The response reaches the host reframed as [len, payload…].
    let transfers = host.transfers();
    assert_eq!(transfers.len(), 1);
    assert_eq!(transfers[0], vec![3, 0xFF, 0x12, 0x34]);

    // 5. Nobody talks anymore; the control loop ticks the session to death.
    {
        let mut loop_10ms: TickPublisher<4> = TickPublisher::new();
        loop_10ms
            .attach(&mut gateway)
            .expect("publisher has room for the gateway");
        for _ in 0..1200 {
            loop_10ms.notify(Duration::from_millis(10));
        }
    }
    assert!(!gateway.is_connected());
    assert_eq!(gateway_events.try_receive(), Ok(GatewayEvent::Disconnected));
    assert!(gateway_events.try_receive().is_err());

    // 6. Shutdown.
    gateway.stop();
    controller.inspect(|state| assert!(!state.running));
}

#[test]
fn session_survives_while_host_keeps_talking() {
    let controller = SharedController::new();
    let host = HostUsb::new();
    let boot = SpyBootloader::default();

    let transport = claim_transport(controller.clone());
    let mut gateway: TestGateway = Gateway::new(
        transport,
        host,
        boot,
        GatewayConfig::default(),
        None,
    )
    .unwrap();
    gateway.start().unwrap();
    gateway.on_usb_data_received(&[2, 0xFF, 0x00]);

    // A host polling GET_STATUS every 5 s stays well under the 12 s idle
    // threshold, however long the session runs.
    for _ in 0..5 {
        {
            let mut loop_10ms: TickPublisher<4> = TickPublisher::new();
            loop_10ms.attach(&mut gateway).unwrap();
            for _ in 0..500 {
                loop_10ms.notify(Duration::from_millis(10));
            }
        }
        gateway.on_usb_data_received(&[1, 0xFD]);
        assert!(gateway.is_connected());
    }

    // Then the host goes quiet.
    let mut loop_10ms: TickPublisher<4> = TickPublisher::new();
    loop_10ms.attach(&mut gateway).unwrap();
    for _ in 0..1200 {
        loop_10ms.notify(Duration::from_millis(10));
    }
    drop(loop_10ms);
    assert!(!gateway.is_connected());
}

#[test]
fn firmware_update_hand_off() {
    let controller = SharedController::new();
    let host = HostUsb::new();
    let boot = SpyBootloader::present();

    let transport = claim_transport(controller.clone());
    let config = GatewayConfig {
        own_node_id: 0x42,
        ..GatewayConfig::default()
    };
    let mut gateway: TestGateway =
        Gateway::new(transport, host, boot.clone(), config, None).unwrap();
    gateway.start().unwrap();

    // Connect addressed to another node: normal gatewaying.
    gateway.on_usb_data_received(&[2, 0xFF, 0x00]);
    assert!(gateway.is_connected());
    assert_eq!(boot.activations(), 0);

    // Connect addressed to this node: bootloader takes over, nothing is
    // forwarded.
    gateway.on_usb_data_received(&[2, 0xFF, 0x42]);
    assert_eq!(boot.activations(), 1);
    assert_eq!(controller.loaded().len(), 1);
}
