//! Device profiles: the request template and response layout of a supported model.
//!
//! The Sora battery query was recovered from USB traffic captures of the
//! vendor software. It is a single feature report exchange on report ID 5:
//!
//! | byte | request | response          |
//! |------|---------|-------------------|
//! | 0    | 0x05    | report ID         |
//! | 1    | 0x15    |                   |
//! | 4    | 0x01    |                   |
//! | 9    |         | battery level (%) |
//! | 10   |         | charging (1)      |
//! | 11   |         | fully charged (1) |
//! | 12   |         | online (1)        |
//!
//! Every other request byte is zero.

/// Outbound feature report length (including report ID).
pub const REQUEST_LEN: usize = 32;

/// Default inbound buffer length. hidapi does not expose the declared
/// feature report length, so the largest full-speed report is used and the
/// buffer is truncated to what the device returns.
pub const DEFAULT_RESPONSE_LEN: usize = 64;

/// Byte positions of each status field in a feature report response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseOffsets {
    pub level: usize,
    pub charging: usize,
    pub fully_charged: usize,
    pub online: usize,
}

impl ResponseOffsets {
    /// Highest offset read by the decoder.
    pub const fn max(&self) -> usize {
        let mut max = self.level;
        if self.charging > max {
            max = self.charging;
        }
        if self.fully_charged > max {
            max = self.fully_charged;
        }
        if self.online > max {
            max = self.online;
        }
        max
    }
}

/// Protocol description for one device model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceProfile {
    /// Human-readable model name.
    pub name: &'static str,
    /// Feature report ID used for both directions.
    pub report_id: u8,
    /// Full outbound report, report ID at byte 0.
    pub request_template: [u8; REQUEST_LEN],
    /// Size of the buffer handed to the inbound read.
    pub response_len: usize,
    /// Where the decoder finds each field.
    pub offsets: ResponseOffsets,
}

const fn sora_v2_request() -> [u8; REQUEST_LEN] {
    let mut buf = [0u8; REQUEST_LEN];
    buf[0] = 0x05;
    buf[1] = 0x15;
    buf[4] = 0x01;
    buf
}

impl DeviceProfile {
    /// Ninjutso Sora V2 battery query.
    pub const SORA_V2: DeviceProfile = DeviceProfile {
        name: "Ninjutso Sora V2",
        report_id: 0x05,
        request_template: sora_v2_request(),
        response_len: DEFAULT_RESPONSE_LEN,
        offsets: ResponseOffsets {
            level: 9,
            charging: 10,
            fully_charged: 11,
            online: 12,
        },
    };

    /// Build a fresh outbound report.
    pub fn request(&self) -> [u8; REQUEST_LEN] {
        self.request_template
    }

    /// Smallest response that still carries every field.
    pub fn min_response_len(&self) -> usize {
        self.offsets.max() + 1
    }
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self::SORA_V2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sora_request_has_magic_bytes_only() {
        let req = DeviceProfile::SORA_V2.request();
        assert_eq!(req.len(), 32);
        assert_eq!(req[0], 5);
        assert_eq!(req[1], 21);
        assert_eq!(req[4], 1);
        let others: u32 = req
            .iter()
            .enumerate()
            .filter(|(i, _)| ![0, 1, 4].contains(i))
            .map(|(_, &b)| b as u32)
            .sum();
        assert_eq!(others, 0);
    }

    #[test]
    fn sora_min_response_len_covers_online_flag() {
        assert_eq!(DeviceProfile::SORA_V2.min_response_len(), 13);
    }

    #[test]
    fn request_id_matches_report_id() {
        let p = DeviceProfile::default();
        assert_eq!(p.request()[0], p.report_id);
    }
}
