//! WebRTC: force relay-only candidates so the real address never leaks.

use super::profile::SpoofProfile;
use super::SpoofModule;

pub struct WebRtcSpoof;

impl SpoofModule for WebRtcSpoof {
    fn name(&self) -> &'static str {
        "webrtc"
    }

    fn generate(&self, _profile: &SpoofProfile) -> String {
        BODY.to_string()
    }
}

const BODY: &str = r#"    {
        if (typeof RTCPeerConnection !== 'undefined') {
            const relayConfig = { iceServers: [], iceTransportPolicy: 'relay' };
            const NativeRTCPeerConnection = RTCPeerConnection;
            const spoofedRTCPeerConnection = new Proxy(NativeRTCPeerConnection, {
                construct(target, args) {
                    if (args.length > 0) args[0] = relayConfig;
                    else args = [relayConfig];
                    return new target(...args);
                },
            });
            spoofedFunctions.set(spoofedRTCPeerConnection, 'RTCPeerConnection');
            window.RTCPeerConnection = spoofedRTCPeerConnection;
            if (typeof webkitRTCPeerConnection !== 'undefined') {
                window.webkitRTCPeerConnection = spoofedRTCPeerConnection;
            }
        }
    }
"#;
