//! sora-battery-core: device discovery, feature-report exchange, and battery presentation.
//!
//! This crate provides the cross-platform core logic for reading the battery
//! state of Ninjutso Sora wireless mice via a vendor HID feature report and
//! turning it into an icon/tooltip pair for a tray surface.

pub mod battery;
pub mod config;
pub mod device;
pub mod error;
pub mod exchange;
pub mod poller;
pub mod presentation;
pub mod profile;
pub mod transport;

/// Nordic Semiconductor USB Vendor ID (used by the Sora receiver and mouse).
pub const SORA_VID: u16 = 0x1915;

/// Vendor-defined usage page of the battery reporting interface.
pub const SORA_USAGE_PAGE: u16 = 0xFFA0;

/// Known Sora V2 product IDs.
pub mod pids {
    /// Sora V2 through the 2.4 GHz receiver.
    pub const SORA_V2_WIRELESS: u16 = 0xAE1C;
    /// Sora V2 connected by cable.
    pub const SORA_V2_WIRED: u16 = 0xAE11;
}
