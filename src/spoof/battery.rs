//! Battery API: a plausible charging desktop battery.

use super::profile::SpoofProfile;
use super::SpoofModule;

pub struct BatterySpoof;

impl SpoofModule for BatterySpoof {
    fn name(&self) -> &'static str {
        "battery"
    }

    fn generate(&self, _profile: &SpoofProfile) -> String {
        BODY.to_string()
    }
}

const BODY: &str = r#"    {
        if (navigator.getBattery) {
            const fakeBattery = {
                charging: true,
                chargingTime: 0,
                dischargingTime: Infinity,
                level: 0.95 + seededNoise(4, 0) * 0.05,
                addEventListener: () => {},
                removeEventListener: () => {},
                dispatchEvent: () => true,
            };
            const spoofedGetBattery = () => Promise.resolve(fakeBattery);
            spoofedFunctions.set(spoofedGetBattery, 'getBattery');
            navigator.getBattery = spoofedGetBattery;
        }
    }
"#;
