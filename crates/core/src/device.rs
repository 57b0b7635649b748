//! Device model: identity, discovery, and matching.

use crate::error::{Error, Result};
use crate::transport::HidBackend;
use std::collections::BTreeSet;
use std::ffi::CString;
use tracing::{debug, info};

/// Which device to look for.
///
/// Built once from settings and passed explicitly to the locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    name: String,
    vendor_id: u16,
    product_ids: BTreeSet<u16>,
    usage_page: u16,
}

impl DeviceIdentity {
    /// Create an identity. Fails if `product_ids` is empty.
    pub fn new(
        name: impl Into<String>,
        vendor_id: u16,
        product_ids: impl IntoIterator<Item = u16>,
        usage_page: u16,
    ) -> Result<Self> {
        let product_ids: BTreeSet<u16> = product_ids.into_iter().collect();
        if product_ids.is_empty() {
            return Err(Error::Config(
                "device identity needs at least one product ID".into(),
            ));
        }
        Ok(Self {
            name: name.into(),
            vendor_id,
            product_ids,
            usage_page,
        })
    }

    /// Built-in Sora V2 identity (wireless and wired product IDs).
    pub fn sora_v2() -> Self {
        Self {
            name: "Sora V2".into(),
            vendor_id: crate::SORA_VID,
            product_ids: BTreeSet::from([
                crate::pids::SORA_V2_WIRELESS,
                crate::pids::SORA_V2_WIRED,
            ]),
            usage_page: crate::SORA_USAGE_PAGE,
        }
    }

    /// Display name used in tooltips.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vendor_id(&self) -> u16 {
        self.vendor_id
    }

    /// Accepted product IDs (wireless and wired variants).
    pub fn product_ids(&self) -> &BTreeSet<u16> {
        &self.product_ids
    }

    pub fn usage_page(&self) -> u16 {
        self.usage_page
    }

    /// Whether an enumerated interface is the one this identity describes.
    pub fn matches(&self, device: &DeviceMatch) -> bool {
        device.vendor_id == self.vendor_id
            && self.product_ids.contains(&device.product_id)
            && device.usage_page == self.usage_page
    }
}

/// An enumerated HID interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceMatch {
    /// Platform path used to open this exact interface.
    pub path: CString,
    pub vendor_id: u16,
    pub product_id: u16,
    pub usage_page: u16,
    pub interface_number: i32,
    pub product: Option<String>,
}

/// Find the first interface matching `identity`.
///
/// Returns `Ok(None)` when nothing matches; an unplugged device is a normal
/// condition, not an error. With several identical devices attached the
/// enumeration order decides which one is used.
pub fn locate<B: HidBackend + ?Sized>(
    backend: &B,
    identity: &DeviceIdentity,
) -> Result<Option<DeviceMatch>> {
    debug!(
        vid = format_args!("0x{:04X}", identity.vendor_id),
        usage_page = format_args!("0x{:04X}", identity.usage_page),
        "Starting HID device enumeration"
    );

    let found = backend
        .enumerate()?
        .into_iter()
        .find(|device| identity.matches(device));

    match &found {
        Some(device) => info!(
            name = identity.name(),
            vid = format_args!("0x{:04X}", device.vendor_id),
            pid = format_args!("0x{:04X}", device.product_id),
            path = %device.path.to_string_lossy(),
            "Found device"
        ),
        None => debug!(name = identity.name(), "No matching device"),
    }

    Ok(found)
}

/// List every visible HID interface, for diagnostics.
pub fn enumerate_all<B: HidBackend + ?Sized>(backend: &B) -> Result<Vec<DeviceMatch>> {
    let devices = backend.enumerate()?;
    debug!(count = devices.len(), "Device enumeration complete");
    Ok(devices)
}
