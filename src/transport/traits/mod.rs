//! Hardware abstraction traits consumed by the transport layer.
pub mod can_controller;
