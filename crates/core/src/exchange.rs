//! Feature report exchange: one request out, one response back.

use crate::error::Result;
use crate::profile::DeviceProfile;
use crate::transport::FeatureTransport;
use tracing::{trace, warn};

/// Run the profile's query on an opened device and return the raw response.
///
/// A failed write short-circuits; no read is attempted. The response is
/// truncated to the number of bytes the device returned. Closing the handle
/// is the caller's scope: the opened device is dropped after this returns,
/// whatever the outcome.
pub fn exchange<T: FeatureTransport + ?Sized>(
    device: &mut T,
    profile: &DeviceProfile,
) -> Result<Vec<u8>> {
    let request = profile.request();
    trace!(
        profile = profile.name,
        report_id = profile.report_id,
        report_hex = format_args!("{:02X?}", request),
        "Battery query TX"
    );

    if let Err(e) = device.send_feature_report(&request) {
        warn!(error = %e, "Battery query write failed");
        return Err(e);
    }

    let mut response = vec![0u8; profile.response_len];
    response[0] = profile.report_id;
    let n = device.get_feature_report(&mut response)?;
    response.truncate(n);

    trace!(
        len = n,
        report_hex = format_args!("{:02X?}", response),
        "Battery query RX"
    );
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::transport::mock::{device, sora_response, MockBackend};
    use crate::transport::HidBackend;

    fn open(backend: &MockBackend) -> crate::transport::mock::MockDevice {
        let dev = device(0x1915, 0xAE1C, 0xFFA0);
        backend.open(&dev).unwrap()
    }

    #[test]
    fn exchange_sends_template_and_returns_response() {
        let backend = MockBackend::new();
        backend.respond_with(sora_response(75, 0, 0, 1));
        let mut handle = open(&backend);

        let response = exchange(&mut handle, &DeviceProfile::SORA_V2).unwrap();
        assert_eq!(response.len(), 32);
        assert_eq!(response[9], 75);
        assert_eq!(backend.writes(), vec![DeviceProfile::SORA_V2.request().to_vec()]);
    }

    #[test]
    fn failed_write_skips_read() {
        let backend = MockBackend::new();
        backend.respond_with(sora_response(75, 0, 0, 1));
        backend.fail_writes();
        let mut handle = open(&backend);

        let result = exchange(&mut handle, &DeviceProfile::SORA_V2);
        assert!(matches!(result, Err(Error::ExchangeFailed(_))));
        assert_eq!(backend.reads(), 0);
    }

    #[test]
    fn short_read_is_truncated() {
        let backend = MockBackend::new();
        backend.respond_with(vec![0x05, 0x00, 0x00]);
        let mut handle = open(&backend);

        let response = exchange(&mut handle, &DeviceProfile::SORA_V2).unwrap();
        assert_eq!(response, vec![0x05, 0x00, 0x00]);
    }
}
