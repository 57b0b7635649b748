//! HID transport abstraction for device communication.
//!
//! Provides trait-based seams so that real hidapi devices and mock devices
//! share the same interface: [`HidBackend`] enumerates and opens,
//! [`FeatureTransport`] carries feature reports on an opened handle.

use crate::device::DeviceMatch;
use crate::error::{Error, Result};
use tracing::trace;

/// Feature report read/write on an opened device.
///
/// Dropping the value closes the underlying handle.
pub trait FeatureTransport {
    /// Send a feature report. `data[0]` is the report ID.
    fn send_feature_report(&mut self, data: &[u8]) -> Result<()>;

    /// Read a feature report into `buf`. `buf[0]` must hold the report ID.
    /// Returns the number of bytes written into `buf`.
    fn get_feature_report(&mut self, buf: &mut [u8]) -> Result<usize>;
}

/// Enumeration and open access to the host's HID devices.
pub trait HidBackend {
    type Device: FeatureTransport;

    /// List every HID interface currently visible.
    fn enumerate(&self) -> Result<Vec<DeviceMatch>>;

    /// Open a previously enumerated interface.
    fn open(&self, device: &DeviceMatch) -> Result<Self::Device>;
}

/// Production backend on top of hidapi.
///
/// A fresh `HidApi` context is created per call so no handle or context
/// outlives a single locate or exchange.
#[derive(Debug, Default, Clone, Copy)]
pub struct HidapiBackend;

/// An opened hidapi device.
pub struct HidapiDevice {
    device: hidapi::HidDevice,
    // Keeps the context alive until the device handle is closed.
    _api: hidapi::HidApi,
}

impl HidBackend for HidapiBackend {
    type Device = HidapiDevice;

    fn enumerate(&self) -> Result<Vec<DeviceMatch>> {
        let api = hidapi::HidApi::new().map_err(|e| Error::Hid(e.to_string()))?;
        Ok(api
            .device_list()
            .map(|info| DeviceMatch {
                path: info.path().to_owned(),
                vendor_id: info.vendor_id(),
                product_id: info.product_id(),
                usage_page: info.usage_page(),
                interface_number: info.interface_number(),
                product: info.product_string().map(|s| s.to_string()),
            })
            .collect())
    }

    fn open(&self, device: &DeviceMatch) -> Result<HidapiDevice> {
        let api = hidapi::HidApi::new().map_err(|e| Error::Hid(e.to_string()))?;
        let handle = api.open_path(&device.path).map_err(|e| {
            Error::Hid(format!(
                "open HID device (VID=0x{:04X} PID=0x{:04X}): {e}",
                device.vendor_id, device.product_id
            ))
        })?;
        Ok(HidapiDevice {
            device: handle,
            _api: api,
        })
    }
}

impl FeatureTransport for HidapiDevice {
    fn send_feature_report(&mut self, data: &[u8]) -> Result<()> {
        trace!(report_hex = format_args!("{:02X?}", data), "feature TX");
        self.device
            .send_feature_report(data)
            .map_err(|e| Error::ExchangeFailed(format!("send_feature_report: {e}")))
    }

    fn get_feature_report(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = self
            .device
            .get_feature_report(buf)
            .map_err(|e| Error::ExchangeFailed(format!("get_feature_report: {e}")))?;
        trace!(report_hex = format_args!("{:02X?}", &buf[..n.min(buf.len())]), "feature RX");
        Ok(n)
    }
}

/// A mock HID backend for testing.
///
/// Enumerates a fixed device list and answers every feature read with a
/// preconfigured response. Counts opens and closes so tests can check that
/// handles are released on every path.
#[cfg(test)]
pub mod mock {
    use super::*;
    use std::ffi::CString;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Shared counters and script for a [`MockBackend`].
    #[derive(Default)]
    struct Script {
        response: Mutex<Option<Vec<u8>>>,
        fail_write: Mutex<bool>,
        fail_open: Mutex<bool>,
        delay: Mutex<Option<Duration>>,
        writes: Mutex<Vec<Vec<u8>>>,
        opened: AtomicUsize,
        closed: AtomicUsize,
        reads: AtomicUsize,
    }

    /// Mock backend with scriptable enumeration and responses.
    #[derive(Clone, Default)]
    pub struct MockBackend {
        devices: Arc<Mutex<Vec<DeviceMatch>>>,
        script: Arc<Script>,
    }

    /// Opened handle of a [`MockBackend`] device.
    pub struct MockDevice {
        script: Arc<Script>,
    }

    /// Build an enumeration entry.
    pub fn device(vendor_id: u16, product_id: u16, usage_page: u16) -> DeviceMatch {
        DeviceMatch {
            path: CString::new(format!("mock:{vendor_id:04x}:{product_id:04x}:{usage_page:04x}"))
                .unwrap(),
            vendor_id,
            product_id,
            usage_page,
            interface_number: 0,
            product: Some("Mock Mouse".into()),
        }
    }

    /// Build a response buffer with the Sora status bytes set.
    pub fn sora_response(level: u8, charging: u8, full: u8, online: u8) -> Vec<u8> {
        let mut buf = vec![0u8; 32];
        buf[0] = 0x05;
        buf[9] = level;
        buf[10] = charging;
        buf[11] = full;
        buf[12] = online;
        buf
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Add a device to the enumeration list.
        pub fn with_device(self, device: DeviceMatch) -> Self {
            self.devices.lock().unwrap().push(device);
            self
        }

        /// Set the bytes returned by every feature read.
        pub fn respond_with(&self, response: Vec<u8>) {
            *self.script.response.lock().unwrap() = Some(response);
        }

        /// Make every feature write fail.
        pub fn fail_writes(&self) {
            *self.script.fail_write.lock().unwrap() = true;
        }

        /// Make every open fail.
        pub fn fail_opens(&self) {
            *self.script.fail_open.lock().unwrap() = true;
        }

        /// Stall every feature write for `delay`.
        pub fn stall_writes(&self, delay: Duration) {
            *self.script.delay.lock().unwrap() = Some(delay);
        }

        /// Remove every enumerated device (unplug).
        pub fn unplug(&self) {
            self.devices.lock().unwrap().clear();
        }

        pub fn opened(&self) -> usize {
            self.script.opened.load(Ordering::SeqCst)
        }

        pub fn closed(&self) -> usize {
            self.script.closed.load(Ordering::SeqCst)
        }

        pub fn reads(&self) -> usize {
            self.script.reads.load(Ordering::SeqCst)
        }

        pub fn writes(&self) -> Vec<Vec<u8>> {
            self.script.writes.lock().unwrap().clone()
        }
    }

    impl HidBackend for MockBackend {
        type Device = MockDevice;

        fn enumerate(&self) -> Result<Vec<DeviceMatch>> {
            Ok(self.devices.lock().unwrap().clone())
        }

        fn open(&self, _device: &DeviceMatch) -> Result<MockDevice> {
            if *self.script.fail_open.lock().unwrap() {
                return Err(Error::Hid("mock: open refused".into()));
            }
            self.script.opened.fetch_add(1, Ordering::SeqCst);
            Ok(MockDevice {
                script: Arc::clone(&self.script),
            })
        }
    }

    impl FeatureTransport for MockDevice {
        fn send_feature_report(&mut self, data: &[u8]) -> Result<()> {
            if let Some(delay) = *self.script.delay.lock().unwrap() {
                std::thread::sleep(delay);
            }
            self.script.writes.lock().unwrap().push(data.to_vec());
            if *self.script.fail_write.lock().unwrap() {
                return Err(Error::ExchangeFailed("mock: write refused".into()));
            }
            Ok(())
        }

        fn get_feature_report(&mut self, buf: &mut [u8]) -> Result<usize> {
            self.script.reads.fetch_add(1, Ordering::SeqCst);
            let response = self.script.response.lock().unwrap();
            let response = response
                .as_ref()
                .ok_or_else(|| Error::ExchangeFailed("mock: no response registered".into()))?;
            let n = response.len().min(buf.len());
            buf[..n].copy_from_slice(&response[..n]);
            Ok(n)
        }
    }

    impl Drop for MockDevice {
        fn drop(&mut self) {
            self.script.closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}
