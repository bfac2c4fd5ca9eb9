//! Geolocation pinned to the profile's coordinates.

use super::profile::SpoofProfile;
use super::SpoofModule;

pub struct GeolocationSpoof;

impl SpoofModule for GeolocationSpoof {
    fn name(&self) -> &'static str {
        "geolocation"
    }

    fn generate(&self, profile: &SpoofProfile) -> String {
        let mut script = format!(
            "    {{\n        \
             const LATITUDE = {latitude};\n        \
             const LONGITUDE = {longitude};\n        \
             const ACCURACY = {accuracy};\n",
            latitude = profile.latitude,
            longitude = profile.longitude,
            accuracy = profile.accuracy,
        );
        script.push_str(BODY);
        script
    }
}

const BODY: &str = r#"
        if (navigator.geolocation) {
            const fakePosition = () => ({
                coords: {
                    latitude: LATITUDE,
                    longitude: LONGITUDE,
                    accuracy: ACCURACY,
                    altitude: null,
                    altitudeAccuracy: null,
                    heading: null,
                    speed: null,
                },
                timestamp: Date.now(),
            });
            const spoofedGetCurrentPosition = function (success) {
                success(fakePosition());
            };
            const spoofedWatchPosition = function (success) {
                success(fakePosition());
                return 1;
            };
            spoofedFunctions.set(spoofedGetCurrentPosition, 'getCurrentPosition');
            spoofedFunctions.set(spoofedWatchPosition, 'watchPosition');
            navigator.geolocation.getCurrentPosition = spoofedGetCurrentPosition;
            navigator.geolocation.watchPosition = spoofedWatchPosition;
        }
    }
"#;

#[cfg(test)]
mod tests {
    use super::*;

    // Verifies the pinned coordinates come from the profile.
    #[test]
    fn coordinates_come_from_profile() {
        let mut profile = SpoofProfile::default();
        profile.latitude = 51.5074;
        profile.longitude = -0.1278;
        let script = GeolocationSpoof.generate(&profile);
        assert!(script.contains("const LATITUDE = 51.5074;"));
        assert!(script.contains("const LONGITUDE = -0.1278;"));
        assert!(script.contains("watchPosition"));
    }
}
