//! Battery status decoding from a raw feature report response.

use crate::error::{Error, Result};
use crate::profile::DeviceProfile;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Battery state read in one poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryStatus {
    /// Charge percentage, or -1 when no device answered.
    pub level: i16,
    pub charging: bool,
    pub fully_charged: bool,
    pub online: bool,
}

impl BatteryStatus {
    /// Sentinel level for "device not found".
    pub const NOT_FOUND_LEVEL: i16 = -1;

    /// Status reported when the device is absent or its answer is unusable.
    pub const NOT_FOUND: BatteryStatus = BatteryStatus {
        level: Self::NOT_FOUND_LEVEL,
        charging: false,
        fully_charged: false,
        online: false,
    };

    pub fn is_found(&self) -> bool {
        self.level != Self::NOT_FOUND_LEVEL
    }
}

/// Decode a response, failing when it is too short for the profile's offsets.
///
/// The level byte is taken as-is; flags are set only by the value 1.
pub fn try_decode(profile: &DeviceProfile, response: &[u8]) -> Result<BatteryStatus> {
    let min = profile.min_response_len();
    if response.len() < min {
        return Err(Error::MalformedResponse {
            len: response.len(),
            min,
        });
    }

    let offsets = &profile.offsets;
    Ok(BatteryStatus {
        level: response[offsets.level] as i16,
        charging: response[offsets.charging] == 1,
        fully_charged: response[offsets.fully_charged] == 1,
        online: response[offsets.online] == 1,
    })
}

/// Decode a response, collapsing a malformed one into [`BatteryStatus::NOT_FOUND`].
pub fn decode(profile: &DeviceProfile, response: &[u8]) -> BatteryStatus {
    try_decode(profile, response).unwrap_or_else(|e| {
        debug!(error = %e, "Treating undecodable response as device not found");
        BatteryStatus::NOT_FOUND
    })
}
