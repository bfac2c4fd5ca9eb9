//! Browser fingerprint spoofing.
//!
//! One immutable [`SpoofProfile`] feeds a fixed registry of modules, each a
//! pure function from profile to script text. The orchestrator composes
//! them into a single script that runs once per new document: shared
//! stealth runtime first, automation-hiding before any other module, the
//! toString mask last so it covers every installed replacement.

mod audio;
mod automation;
mod battery;
mod canvas;
mod fonts;
mod geolocation;
pub mod gpu;
mod inject;
mod navigator;
mod network;
mod profile;
mod screen;
mod sensors;
mod stealth;
mod timezone;
mod webgl;
mod webrtc;

pub use inject::{InjectionMethod, SpoofInjector};
pub use profile::{LocationPreset, ScreenProfile, SpoofProfile, FONT_ALLOWLIST, LOCATION_PRESETS};

/// One property-override generator: a pure function over the profile with
/// no side effects of its own.
pub trait SpoofModule {
    fn name(&self) -> &'static str;
    fn generate(&self, profile: &SpoofProfile) -> String;
}

/// The full module registry in composition order.
///
/// Automation-hiding runs first so no later override executes while an
/// automation marker is still observable.
pub fn default_modules() -> Vec<Box<dyn SpoofModule>> {
    vec![
        Box::new(automation::AutomationSpoof),
        Box::new(navigator::NavigatorSpoof),
        Box::new(screen::ScreenSpoof),
        Box::new(webgl::WebGlSpoof),
        Box::new(canvas::CanvasSpoof),
        Box::new(audio::AudioSpoof),
        Box::new(timezone::TimezoneSpoof),
        Box::new(battery::BatterySpoof),
        Box::new(network::NetworkSpoof),
        Box::new(webrtc::WebRtcSpoof),
        Box::new(fonts::FontsSpoof),
        Box::new(sensors::SensorsSpoof),
        Box::new(geolocation::GeolocationSpoof),
    ]
}

/// Compose every module into one script body.
///
/// The result is safe to register with a run-on-new-document primitive:
/// one IIFE, strict mode, no globals beyond the deliberate `window.chrome`
/// surface.
pub fn compose(profile: &SpoofProfile) -> String {
    let mut script = String::from("(() => {\n    'use strict';\n");
    script.push_str(&stealth::prelude(profile));
    for module in default_modules() {
        script.push_str(&format!("\n    // --- {} ---\n", module.name()));
        script.push_str(&module.generate(profile));
    }
    script.push('\n');
    script.push_str(&inject::propagation(profile));
    script.push('\n');
    script.push_str(stealth::epilogue());
    script.push_str("})();\n");
    script
}

#[cfg(test)]
mod tests {
    use super::gpu::GpuProfile;
    use super::*;

    // Verifies composition order: runtime first, automation before every
    // other module, propagation after the modules, the mask last.
    #[test]
    fn composition_order_is_fixed() {
        let script = compose(&SpoofProfile::default());
        let index_of = |needle: &str| script.find(needle).unwrap_or_else(|| panic!("missing {needle}"));

        let runtime = index_of("const spoofedFunctions = new Map();");
        let automation = index_of("// --- automation ---");
        let navigator = index_of("// --- navigator ---");
        let geolocation = index_of("// --- geolocation ---");
        let propagation = index_of("// --- frame/worker propagation ---");
        let mask = index_of("// --- stealth toString ---");

        assert!(runtime < automation);
        assert!(automation < navigator);
        assert!(navigator < geolocation);
        assert!(geolocation < propagation);
        assert!(propagation < mask);
    }

    // Verifies the spoof-consistency property: renderer string, numeric
    // limits, and extension list in one composed script all belong to the
    // profile's single GPU entry.
    #[test]
    fn composed_script_uses_one_gpu_entry() {
        let mut profile = SpoofProfile::default();
        profile.gpu = GpuProfile::by_key("intel_uhd_620").unwrap();
        let script = compose(&profile);

        assert!(script.contains("Intel(R) UHD Graphics 620"));
        assert!(script.contains("\"MAX_FRAGMENT_UNIFORM_VECTORS\":1024"));
        assert!(script.contains("\"ALIASED_POINT_SIZE_RANGE\":[1,1024]"));
        // No cross-profile mixing with the larger cards.
        assert!(!script.contains("NVIDIA"));
        assert!(!script.contains("Radeon"));
        assert!(!script.contains("32768"));
    }

    // Verifies deterministic output: one profile, one script; two seeds,
    // two scripts.
    #[test]
    fn composition_is_deterministic_per_profile() {
        let profile = SpoofProfile::default();
        assert_eq!(compose(&profile), compose(&profile.clone()));

        let mut reseeded = profile.clone();
        reseeded.noise_seed += 1;
        assert_ne!(compose(&profile), compose(&reseeded));
    }

    // Verifies every registry module contributes a named section.
    #[test]
    fn every_module_contributes() {
        let script = compose(&SpoofProfile::default());
        for module in default_modules() {
            assert!(
                script.contains(&format!("// --- {} ---", module.name())),
                "missing section for {}",
                module.name()
            );
        }
    }

    // Verifies the composed script is one self-contained IIFE.
    #[test]
    fn composed_script_is_one_iife() {
        let script = compose(&SpoofProfile::default());
        assert!(script.starts_with("(() => {"));
        assert!(script.trim_end().ends_with("})();"));
        assert_eq!(script.matches("'use strict';").count(), 1);
    }
}
