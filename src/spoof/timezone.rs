//! Timezone: offset and IANA name always reported as one zone.

use super::profile::SpoofProfile;
use super::SpoofModule;

pub struct TimezoneSpoof;

impl SpoofModule for TimezoneSpoof {
    fn name(&self) -> &'static str {
        "timezone"
    }

    fn generate(&self, profile: &SpoofProfile) -> String {
        let mut script = format!(
            "    {{\n        \
             const TIMEZONE_OFFSET = {offset};\n        \
             const TIMEZONE_NAME = '{name}';\n",
            offset = profile.timezone_offset_minutes,
            name = profile.timezone,
        );
        script.push_str(BODY);
        script
    }
}

const BODY: &str = r#"
        const spoofedGetTimezoneOffset = function () {
            return TIMEZONE_OFFSET;
        };
        installMethod(Date.prototype, 'getTimezoneOffset', spoofedGetTimezoneOffset);

        try {
            const nativeResolvedOptions = Intl.DateTimeFormat.prototype.resolvedOptions;
            const spoofedResolvedOptions = function () {
                const options = nativeResolvedOptions.call(this);
                options.timeZone = TIMEZONE_NAME;
                return options;
            };
            installMethod(Intl.DateTimeFormat.prototype, 'resolvedOptions', spoofedResolvedOptions);
        } catch (e) {}
    }
"#;
