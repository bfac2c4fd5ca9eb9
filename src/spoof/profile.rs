//! Spoof profile: the single source every module derives its values from.
//!
//! Independent modules must never pick correlated values on their own;
//! screen geometry, GPU identity, locale, timezone, and the noise seed all
//! live here so two surfaces can never disagree.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::gpu::{GpuProfile, GPU_PROFILES};

/// Screen geometry bundle. Window dimensions are derived from it so inner
/// and outer sizes always agree with the screen itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenProfile {
    pub width: u32,
    pub height: u32,
    pub avail_width: u32,
    pub avail_height: u32,
    pub color_depth: u32,
    pub pixel_ratio: f64,
}

/// A geographic/locale preset: timezone name and offset always paired.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationPreset {
    pub key: &'static str,
    pub timezone: &'static str,
    /// Minutes behind UTC, as `Date.prototype.getTimezoneOffset` reports.
    pub offset_minutes: i32,
    pub locale: &'static str,
    pub latitude: f64,
    pub longitude: f64,
}

/// Location presets. Registration profiles draw from the English-locale
/// subset so provider pages render in English.
pub static LOCATION_PRESETS: [LocationPreset; 5] = [
    LocationPreset {
        key: "new_york",
        timezone: "America/New_York",
        offset_minutes: 300,
        locale: "en-US",
        latitude: 40.7128,
        longitude: -74.0060,
    },
    LocationPreset {
        key: "los_angeles",
        timezone: "America/Los_Angeles",
        offset_minutes: 480,
        locale: "en-US",
        latitude: 34.0522,
        longitude: -118.2437,
    },
    LocationPreset {
        key: "london",
        timezone: "Europe/London",
        offset_minutes: 0,
        locale: "en-GB",
        latitude: 51.5074,
        longitude: -0.1278,
    },
    LocationPreset {
        key: "berlin",
        timezone: "Europe/Berlin",
        offset_minutes: -60,
        locale: "de-DE",
        latitude: 52.5200,
        longitude: 13.4050,
    },
    LocationPreset {
        key: "tokyo",
        timezone: "Asia/Tokyo",
        offset_minutes: -540,
        locale: "ja-JP",
        latitude: 35.6762,
        longitude: 139.6503,
    },
];

/// Common desktop resolutions with their taskbar-reduced available height.
const SCREEN_PRESETS: [(u32, u32, u32); 5] = [
    (1920, 1080, 1040),
    (2560, 1440, 1400),
    (1366, 768, 728),
    (1536, 864, 824),
    (1440, 900, 860),
];

/// Fonts a stock Windows install exposes; the fonts module caps
/// enumeration to this list.
pub static FONT_ALLOWLIST: [&str; 15] = [
    "Arial",
    "Arial Black",
    "Calibri",
    "Cambria",
    "Comic Sans MS",
    "Consolas",
    "Courier New",
    "Georgia",
    "Impact",
    "Lucida Console",
    "Segoe UI",
    "Tahoma",
    "Times New Roman",
    "Trebuchet MS",
    "Verdana",
];

/// Immutable parameter bundle consumed by every spoof module.
///
/// All per-run "randomness" downstream derives from `noise_seed`, so
/// repeated queries against the same page produce self-consistent output.
/// Different profiles must never be mixed within one browser session.
#[derive(Debug, Clone, PartialEq)]
pub struct SpoofProfile {
    pub user_agent: String,
    pub platform: String,
    pub vendor: String,
    pub screen: ScreenProfile,
    pub hardware_concurrency: u32,
    pub device_memory: u32,
    pub max_touch_points: u32,
    pub gpu: &'static GpuProfile,
    pub locale: String,
    pub timezone: String,
    pub timezone_offset_minutes: i32,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
    pub noise_seed: u32,
    pub fonts: Vec<&'static str>,
}

impl Default for SpoofProfile {
    fn default() -> Self {
        Self::from_preset(&LOCATION_PRESETS[0])
    }
}

impl SpoofProfile {
    /// Fixed profile for a location preset: Full HD screen, RTX 3060.
    pub fn from_preset(location: &LocationPreset) -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            platform: "Win32".to_string(),
            vendor: "Google Inc.".to_string(),
            screen: ScreenProfile {
                width: 1920,
                height: 1080,
                avail_width: 1920,
                avail_height: 1040,
                color_depth: 24,
                pixel_ratio: 1.0,
            },
            hardware_concurrency: 8,
            device_memory: 8,
            max_touch_points: 0,
            gpu: &GPU_PROFILES[3],
            locale: location.locale.to_string(),
            timezone: location.timezone.to_string(),
            timezone_offset_minutes: location.offset_minutes,
            latitude: location.latitude,
            longitude: location.longitude,
            accuracy: 50.0,
            noise_seed: 526_917,
            fonts: FONT_ALLOWLIST.to_vec(),
        }
    }

    /// Look up a location preset by key.
    pub fn preset(key: &str) -> Option<&'static LocationPreset> {
        LOCATION_PRESETS.iter().find(|preset| preset.key == key)
    }

    /// Generate a consistent randomized profile from one integer seed.
    ///
    /// Deterministic: the same seed always yields the same profile, which
    /// is what makes registration runs reproducible.
    pub fn randomized(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);

        // English-locale presets only: provider pages should render in
        // English during automated registration.
        let english: Vec<&LocationPreset> = LOCATION_PRESETS
            .iter()
            .filter(|preset| preset.locale.starts_with("en"))
            .collect();
        let location = english[rng.gen_range(0..english.len())];

        let (width, height, avail_height) = SCREEN_PRESETS[rng.gen_range(0..SCREEN_PRESETS.len())];
        let gpu = &GPU_PROFILES[rng.gen_range(0..GPU_PROFILES.len())];

        let mut profile = Self::from_preset(location);
        profile.screen = ScreenProfile {
            width,
            height,
            avail_width: width,
            avail_height,
            color_depth: 24,
            pixel_ratio: [1.0, 1.25, 1.5][rng.gen_range(0..3)],
        };
        profile.hardware_concurrency = [4, 6, 8, 12][rng.gen_range(0..4)];
        profile.device_memory = [4, 8, 16][rng.gen_range(0..3)];
        profile.gpu = gpu;
        profile.latitude += rng.gen_range(-0.01..0.01);
        profile.longitude += rng.gen_range(-0.01..0.01);
        profile.accuracy = rng.gen_range(20.0..100.0);
        profile.noise_seed = rng.gen_range(1..=1_000_000);
        profile
    }
}
