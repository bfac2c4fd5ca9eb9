//! Network Information API: a fixed wired-quality 4g connection.

use super::profile::SpoofProfile;
use super::SpoofModule;

pub struct NetworkSpoof;

impl SpoofModule for NetworkSpoof {
    fn name(&self) -> &'static str {
        "network"
    }

    fn generate(&self, _profile: &SpoofProfile) -> String {
        BODY.to_string()
    }
}

const BODY: &str = r#"    {
        const fakeConnection = {
            effectiveType: '4g',
            rtt: 50,
            downlink: 10,
            saveData: false,
            addEventListener: () => {},
            removeEventListener: () => {},
        };
        defineGetter(navigator, 'connection', fakeConnection);
        defineGetter(navigator, 'webkitConnection', fakeConnection);
    }
"#;
