//! Boundary traits consumed by the gateway. One concrete implementation
//! exists per target board; the gateway never depends on a concrete type.

/// Host-side USB transport boundary.
///
/// The gateway only sends reply transfers through it; enumeration,
/// suspend/resume and endpoint mechanics live in the board support layer.
pub trait UsbLink {
    type Error: core::fmt::Debug;

    /// Queue one transfer toward the USB host.
    fn transmit(&mut self, data: &[u8]) -> Result<(), Self::Error>;
}

/// Local firmware-update bootloader boundary.
pub trait Bootloader {
    /// Whether a local bootloader is present on this device.
    fn is_present(&self) -> bool;

    /// Hand control to the bootloader. On hardware this resets the device
    /// and does not return; the gateway performs no further work after
    /// calling it.
    fn activate(&mut self);
}
