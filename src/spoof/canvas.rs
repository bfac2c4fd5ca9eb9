//! Canvas fingerprint noise: seeded, position-based, applied once per
//! canvas so repeated reads return identical output.

use super::profile::SpoofProfile;
use super::SpoofModule;

pub struct CanvasSpoof;

impl SpoofModule for CanvasSpoof {
    fn name(&self) -> &'static str {
        "canvas"
    }

    fn generate(&self, _profile: &SpoofProfile) -> String {
        BODY.to_string()
    }
}

const BODY: &str = r#"    {
        const CANVAS_LANE = 2;
        // Per-pixel noise is a pure function of (seed, x, y): a second read
        // of the same canvas sees the same perturbation, while the true
        // rendering still differs from the un-spoofed baseline.
        const pixelNoise = (x, y) =>
            Math.floor(seededNoise(CANVAS_LANE, Math.imul(x, 7919) + y) * 3) - 1;

        // Each canvas is perturbed exactly once; re-noising on every read
        // would make repeated fingerprints drift, which is itself a tell.
        const noisedCanvases = new WeakSet();
        const perturbCanvas = (canvas) => {
            if (!canvas || canvas.width <= 0 || canvas.height <= 0) return;
            if (noisedCanvases.has(canvas)) return;
            noisedCanvases.add(canvas);
            try {
                const ctx = canvas.getContext('2d');
                if (!ctx) return;
                const w = Math.min(canvas.width, 16);
                const h = Math.min(canvas.height, 16);
                const imageData = nativeGetImageData.call(ctx, 0, 0, w, h);
                const data = imageData.data;
                for (let y = 0; y < h; y++) {
                    for (let x = 0; x < w; x++) {
                        const i = (y * w + x) * 4;
                        data[i] = Math.max(0, Math.min(255, data[i] + pixelNoise(x, y)));
                    }
                }
                ctx.putImageData(imageData, 0, 0);
            } catch (e) {}
        };

        const nativeToDataURL = HTMLCanvasElement.prototype.toDataURL;
        const nativeToBlob = HTMLCanvasElement.prototype.toBlob;
        const nativeGetImageData = CanvasRenderingContext2D.prototype.getImageData;

        const spoofedToDataURL = function (...args) {
            perturbCanvas(this);
            return nativeToDataURL.apply(this, args);
        };
        const spoofedToBlob = function (...args) {
            perturbCanvas(this);
            return nativeToBlob.apply(this, args);
        };
        const spoofedGetImageData = function (...args) {
            if (this.canvas) perturbCanvas(this.canvas);
            return nativeGetImageData.apply(this, args);
        };

        installMethod(HTMLCanvasElement.prototype, 'toDataURL', spoofedToDataURL);
        installMethod(HTMLCanvasElement.prototype, 'toBlob', spoofedToBlob);
        installMethod(CanvasRenderingContext2D.prototype, 'getImageData', spoofedGetImageData);
    }
"#;

#[cfg(test)]
mod tests {
    use super::*;

    // Verifies noise is position-keyed and applied once per canvas.
    #[test]
    fn noise_is_positional_and_once_per_canvas() {
        let script = CanvasSpoof.generate(&SpoofProfile::default());
        assert!(script.contains("seededNoise(CANVAS_LANE"));
        assert!(script.contains("WeakSet"));
        for surface in ["toDataURL", "toBlob", "getImageData"] {
            assert!(script.contains(surface), "missing {surface}");
        }
    }
}
