//! Presentation: map a battery status onto an icon selector, tooltip, and glyph.
//!
//! Precedence, first match wins:
//! 1. level -1 → "Device Not Found"
//! 2. fully charged → "Fully Charged"
//! 3. charging → charging color at any level
//! 4. level bands: >40 green, 21-40 yellow, 1-20 red, otherwise empty

use crate::battery::BatteryStatus;
use serde::Serialize;

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const TRANSPARENT: Rgba = Rgba {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };
}

/// Color band of the battery glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Band {
    Charging,
    Green,
    Yellow,
    Red,
    Empty,
}

impl Band {
    /// Band for a level when not charging.
    pub fn for_level(level: i16) -> Self {
        match level {
            l if l > 40 => Self::Green,
            l if l > 20 => Self::Yellow,
            l if l > 0 => Self::Red,
            _ => Self::Empty,
        }
    }

    /// Fill color.
    pub fn color(&self) -> Rgba {
        match self {
            Self::Charging => Rgba::opaque(30, 144, 255), // DodgerBlue
            Self::Green => Rgba::opaque(0, 128, 0),
            Self::Yellow => Rgba::opaque(255, 255, 0),
            Self::Red => Rgba::opaque(255, 0, 0),
            Self::Empty => Rgba::TRANSPARENT,
        }
    }

    /// Icon selector for a level glyph in this band.
    pub fn icon_key(&self) -> &'static str {
        match self {
            Self::Charging => "charging",
            Self::Green => "level-green",
            Self::Yellow => "level-yellow",
            Self::Red => "level-red",
            Self::Empty => "level-empty",
        }
    }
}

/// What the tray should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DisplayState {
    NotFound,
    FullyCharged,
    Level { band: Band, percent: i16 },
}

impl DisplayState {
    /// Derive the display state from a status.
    pub fn from_status(status: &BatteryStatus) -> Self {
        if !status.is_found() {
            Self::NotFound
        } else if status.fully_charged {
            Self::FullyCharged
        } else if status.charging {
            Self::Level {
                band: Band::Charging,
                percent: status.level,
            }
        } else {
            Self::Level {
                band: Band::for_level(status.level),
                percent: status.level,
            }
        }
    }

    pub fn icon_key(&self) -> &'static str {
        match self {
            Self::NotFound => "disconnected",
            Self::FullyCharged => "fully-charged",
            Self::Level { band, .. } => band.icon_key(),
        }
    }
}

/// Icon selector and tooltip handed to the tray surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Presentation {
    pub state: DisplayState,
    pub icon_key: &'static str,
    pub tooltip: String,
}

impl Presentation {
    /// Geometry and color of the battery glyph, for level states only.
    pub fn glyph(&self) -> Option<BatteryGlyph> {
        match self.state {
            DisplayState::Level { band, percent } => Some(BatteryGlyph::new(band, percent)),
            _ => None,
        }
    }
}

/// Derive icon and tooltip for a status. Pure.
pub fn present(status: &BatteryStatus, device_name: &str) -> Presentation {
    let state = DisplayState::from_status(status);
    let tooltip = match state {
        DisplayState::NotFound => format!("{device_name}: Device Not Found"),
        DisplayState::FullyCharged => format!("{device_name}: Fully Charged"),
        DisplayState::Level { percent, .. } => format!("{device_name}: {percent}%"),
    };
    Presentation {
        state,
        icon_key: state.icon_key(),
        tooltip,
    }
}

/// A vertical outlined rectangle filled from the bottom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryGlyph {
    /// Filled share of the body, 0.0 to 1.0.
    pub fill_fraction: f32,
    pub fill: Rgba,
}

/// Pixel rectangle, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BatteryGlyph {
    pub fn new(band: Band, percent: i16) -> Self {
        Self {
            fill_fraction: (percent as f32 / 100.0).clamp(0.0, 1.0),
            fill: band.color(),
        }
    }

    /// Fill rectangle inside an outline of thickness `outline` on a
    /// `width`×`height` canvas, anchored to the bottom edge.
    pub fn fill_rect(&self, width: u32, height: u32, outline: u32) -> Rect {
        let border = outline.saturating_mul(2);
        let inner_w = width.saturating_sub(border);
        let inner_h = height.saturating_sub(border);
        let fill_h = ((inner_h as f32 * self.fill_fraction).round() as u32).min(inner_h);
        Rect {
            x: outline.min(width),
            y: outline.min(height).saturating_add(inner_h - fill_h),
            width: inner_w,
            height: fill_h,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAME: &str = "Sora V2";

    fn status(level: i16, charging: bool, fully_charged: bool) -> BatteryStatus {
        BatteryStatus {
            level,
            charging,
            fully_charged,
            online: true,
        }
    }

    #[test]
    fn not_found_wins_over_every_flag() {
        for (charging, full) in [(false, false), (true, false), (false, true), (true, true)] {
            let s = BatteryStatus {
                level: -1,
                charging,
                fully_charged: full,
                online: true,
            };
            let p = present(&s, NAME);
            assert_eq!(p.state, DisplayState::NotFound);
            assert_eq!(p.icon_key, "disconnected");
            assert_eq!(p.tooltip, "Sora V2: Device Not Found");
            assert!(p.glyph().is_none());
        }
    }

    #[test]
    fn fully_charged_hides_percent() {
        let p = present(&status(55, false, true), NAME);
        assert_eq!(p.state, DisplayState::FullyCharged);
        assert_eq!(p.icon_key, "fully-charged");
        assert_eq!(p.tooltip, "Sora V2: Fully Charged");
        assert!(!p.tooltip.contains('%'));
    }

    #[test]
    fn charging_overrides_low_battery_color() {
        let p = present(&status(15, true, false), NAME);
        assert_eq!(
            p.state,
            DisplayState::Level {
                band: Band::Charging,
                percent: 15
            }
        );
        let glyph = p.glyph().unwrap();
        assert_eq!(glyph.fill, Rgba::opaque(30, 144, 255));
        assert_ne!(glyph.fill, Band::Red.color());
        assert_eq!(p.tooltip, "Sora V2: 15%");
    }

    #[test]
    fn band_boundaries() {
        let cases = [
            (100, Band::Green),
            (41, Band::Green),
            (40, Band::Yellow),
            (21, Band::Yellow),
            (20, Band::Red),
            (1, Band::Red),
            (0, Band::Empty),
        ];
        for (level, band) in cases {
            assert_eq!(Band::for_level(level), band, "level {level}");
            let p = present(&status(level, false, false), NAME);
            assert_eq!(p.icon_key, band.icon_key());
        }
    }

    #[test]
    fn empty_band_is_transparent() {
        assert_eq!(Band::Empty.color().a, 0);
    }

    #[test]
    fn level_tooltip_format() {
        let p = present(&status(75, false, false), NAME);
        assert_eq!(p.tooltip, "Sora V2: 75%");
        assert_eq!(p.icon_key, "level-green");
    }

    #[test]
    fn present_is_pure() {
        let s = status(33, false, false);
        assert_eq!(present(&s, NAME), present(&s, NAME));
    }

    #[test]
    fn glyph_fill_is_bottom_anchored() {
        let glyph = BatteryGlyph::new(Band::Green, 50);
        let rect = glyph.fill_rect(16, 32, 1);
        assert_eq!(rect.width, 14);
        assert_eq!(rect.height, 15);
        assert_eq!(rect.y + rect.height, 31);
    }

    #[test]
    fn glyph_outline_thicker_than_canvas() {
        let glyph = BatteryGlyph::new(Band::Green, 100);
        for outline in [20, u32::MAX / 2 + 1, u32::MAX] {
            let rect = glyph.fill_rect(16, 32, outline);
            assert_eq!(rect.width, 0);
            assert_eq!(rect.height, 0);
            assert!(rect.y <= 32);
        }
    }

    #[test]
    fn glyph_fraction_is_clamped() {
        assert_eq!(BatteryGlyph::new(Band::Green, 180).fill_fraction, 1.0);
        assert_eq!(BatteryGlyph::new(Band::Empty, 0).fill_fraction, 0.0);
        let rect = BatteryGlyph::new(Band::Empty, 0).fill_rect(16, 32, 1);
        assert_eq!(rect.height, 0);
    }
}
