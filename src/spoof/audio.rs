//! Audio fingerprint noise: sub-perceptible, seeded per sample index.

use super::profile::SpoofProfile;
use super::SpoofModule;

pub struct AudioSpoof;

impl SpoofModule for AudioSpoof {
    fn name(&self) -> &'static str {
        "audio"
    }

    fn generate(&self, _profile: &SpoofProfile) -> String {
        BODY.to_string()
    }
}

const BODY: &str = r#"    {
        const AUDIO_LANE = 3;
        const sampleNoise = (index) => (seededNoise(AUDIO_LANE, index) - 0.5) * 1e-7;

        // getChannelData returns the same backing array on every call, so
        // each channel is perturbed exactly once per buffer.
        if (typeof AudioBuffer !== 'undefined') {
            const noisedChannels = new WeakMap();
            const nativeGetChannelData = AudioBuffer.prototype.getChannelData;
            const spoofedGetChannelData = function (channel) {
                const data = nativeGetChannelData.call(this, channel);
                let channels = noisedChannels.get(this);
                if (!channels) {
                    channels = new Set();
                    noisedChannels.set(this, channels);
                }
                if (!channels.has(channel)) {
                    channels.add(channel);
                    const limit = Math.min(data.length, 500);
                    for (let i = 0; i < limit; i++) {
                        data[i] += sampleNoise(i);
                    }
                }
                return data;
            };
            installMethod(AudioBuffer.prototype, 'getChannelData', spoofedGetChannelData);
        }

        if (typeof AnalyserNode !== 'undefined') {
            const nativeGetFloatFrequencyData = AnalyserNode.prototype.getFloatFrequencyData;
            const spoofedGetFloatFrequencyData = function (array) {
                nativeGetFloatFrequencyData.call(this, array);
                if (array) {
                    const limit = Math.min(array.length, 64);
                    for (let i = 0; i < limit; i++) {
                        array[i] += (seededNoise(AUDIO_LANE, 1000 + i) - 0.5) * 0.1;
                    }
                }
            };
            installMethod(
                AnalyserNode.prototype,
                'getFloatFrequencyData',
                spoofedGetFloatFrequencyData
            );

            const nativeGetByteFrequencyData = AnalyserNode.prototype.getByteFrequencyData;
            const spoofedGetByteFrequencyData = function (array) {
                nativeGetByteFrequencyData.call(this, array);
                if (array) {
                    const limit = Math.min(array.length, 64);
                    for (let i = 0; i < limit; i++) {
                        const delta = Math.floor((seededNoise(AUDIO_LANE, 2000 + i) - 0.5) * 2);
                        array[i] = Math.max(0, Math.min(255, array[i] + delta));
                    }
                }
            };
            installMethod(
                AnalyserNode.prototype,
                'getByteFrequencyData',
                spoofedGetByteFrequencyData
            );
        }
    }
"#;
