//! Screen geometry, kept in lockstep with window dimensions.

use super::profile::SpoofProfile;
use super::SpoofModule;

pub struct ScreenSpoof;

impl SpoofModule for ScreenSpoof {
    fn name(&self) -> &'static str {
        "screen"
    }

    fn generate(&self, profile: &SpoofProfile) -> String {
        let screen = &profile.screen;
        let mut script = format!(
            "    {{\n        \
             const WIDTH = {width};\n        \
             const HEIGHT = {height};\n        \
             const AVAIL_WIDTH = {avail_width};\n        \
             const AVAIL_HEIGHT = {avail_height};\n        \
             const COLOR_DEPTH = {color_depth};\n        \
             const PIXEL_RATIO = {pixel_ratio};\n",
            width = screen.width,
            height = screen.height,
            avail_width = screen.avail_width,
            avail_height = screen.avail_height,
            color_depth = screen.color_depth,
            pixel_ratio = screen.pixel_ratio,
        );
        script.push_str(BODY);
        script
    }
}

const BODY: &str = r#"
        defineGetter(screen, 'width', WIDTH);
        defineGetter(screen, 'height', HEIGHT);
        defineGetter(screen, 'availWidth', AVAIL_WIDTH);
        defineGetter(screen, 'availHeight', AVAIL_HEIGHT);
        defineGetter(screen, 'colorDepth', COLOR_DEPTH);
        defineGetter(screen, 'pixelDepth', COLOR_DEPTH);

        // Legacy IE-only DPI fields some collectors still sample.
        defineGetter(screen, 'deviceXDPI', 96);
        defineGetter(screen, 'logicalXDPI', 96);
        defineGetter(screen, 'fontSmoothingEnabled', true);

        // Window dimensions must agree with the screen they claim to be on.
        defineGetter(window, 'innerWidth', WIDTH);
        defineGetter(window, 'innerHeight', AVAIL_HEIGHT);
        defineGetter(window, 'outerWidth', WIDTH);
        defineGetter(window, 'outerHeight', HEIGHT);
        defineGetter(window, 'devicePixelRatio', PIXEL_RATIO);
    }
"#;

#[cfg(test)]
mod tests {
    use super::*;

    // Verifies window dimensions derive from the same geometry as screen.
    #[test]
    fn window_and_screen_share_geometry() {
        let mut profile = SpoofProfile::default();
        profile.screen.width = 2560;
        profile.screen.height = 1440;
        profile.screen.avail_height = 1400;
        let script = ScreenSpoof.generate(&profile);
        assert!(script.contains("const WIDTH = 2560;"));
        assert!(script.contains("const AVAIL_HEIGHT = 1400;"));
        // One constant feeds both surfaces.
        assert!(script.contains("defineGetter(window, 'outerHeight', HEIGHT);"));
        assert!(script.contains("defineGetter(window, 'innerHeight', AVAIL_HEIGHT);"));
    }
}
