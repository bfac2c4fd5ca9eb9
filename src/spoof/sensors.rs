//! Motion/orientation sensors: denied, as on a desktop without them.

use super::profile::SpoofProfile;
use super::SpoofModule;

pub struct SensorsSpoof;

impl SpoofModule for SensorsSpoof {
    fn name(&self) -> &'static str {
        "sensors"
    }

    fn generate(&self, _profile: &SpoofProfile) -> String {
        BODY.to_string()
    }
}

const BODY: &str = r#"    {
        if (typeof DeviceMotionEvent !== 'undefined') {
            safeDefineProperty(DeviceMotionEvent, 'requestPermission', {
                value: () => Promise.resolve('denied'),
                configurable: true,
            });
        }
        if (typeof DeviceOrientationEvent !== 'undefined') {
            safeDefineProperty(DeviceOrientationEvent, 'requestPermission', {
                value: () => Promise.resolve('denied'),
                configurable: true,
            });
        }
        window.addEventListener('devicemotion', (e) => e.stopImmediatePropagation(), true);
        window.addEventListener('deviceorientation', (e) => e.stopImmediatePropagation(), true);
    }
"#;
