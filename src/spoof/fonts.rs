//! Font enumeration capped to the profile's allowlist.

use super::profile::SpoofProfile;
use super::SpoofModule;

pub struct FontsSpoof;

impl SpoofModule for FontsSpoof {
    fn name(&self) -> &'static str {
        "fonts"
    }

    fn generate(&self, profile: &SpoofProfile) -> String {
        let allowlist =
            serde_json::to_string(&profile.fonts).unwrap_or_else(|_| "[]".to_string());
        let mut script = format!("    {{\n        const ALLOWED_FONTS = {allowlist};\n");
        script.push_str(BODY);
        script
    }
}

const BODY: &str = r#"
        // Only document.fonts.check is capped. Perturbing element metrics
        // would make repeated measurements jitter, which reads as a bot.
        if (document.fonts && document.fonts.check) {
            const nativeCheck = document.fonts.check.bind(document.fonts);
            const spoofedCheck = function (font, text) {
                const family = String(font).split(' ').pop().replace(/['"]/g, '');
                if (!ALLOWED_FONTS.includes(family)) return false;
                return nativeCheck(font, text);
            };
            spoofedFunctions.set(spoofedCheck, 'check');
            document.fonts.check = spoofedCheck;
        }
    }
"#;

#[cfg(test)]
mod tests {
    use super::*;

    // Verifies the allowlist embeds the profile's fonts verbatim.
    #[test]
    fn allowlist_comes_from_profile() {
        let mut profile = SpoofProfile::default();
        profile.fonts = vec!["Arial", "Consolas"];
        let script = FontsSpoof.generate(&profile);
        assert!(script.contains(r#"const ALLOWED_FONTS = ["Arial","Consolas"];"#));
    }
}
