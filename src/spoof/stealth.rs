//! Shared script runtime: deterministic noise, the spoofed-function
//! registry, and the toString mask.
//!
//! Every module registers its replacements in one shared registry; the
//! mask is installed once, last, so no module can leave a replacement
//! whose source text betrays the override.

use super::profile::SpoofProfile;

/// Runtime helpers every module body builds on. Emitted once at the top of
/// the composed script.
pub(crate) fn prelude(profile: &SpoofProfile) -> String {
    let seed = profile.noise_seed;
    let mut script = format!("    const SEED = {seed};\n");
    script.push_str(PRELUDE_BODY);
    script
}

const PRELUDE_BODY: &str = r#"
    // Deterministic 32-bit mixer. Noise is a pure function of
    // (lane, index), never a stream, so repeated reads of one surface
    // return identical output for the same seed.
    const mix32 = (value) => {
        let h = value >>> 0;
        h = Math.imul(h ^ (h >>> 16), 0x45d9f3b);
        h = Math.imul(h ^ (h >>> 16), 0x45d9f3b);
        return (h ^ (h >>> 16)) >>> 0;
    };
    const seededNoise = (lane, index) =>
        mix32(SEED ^ Math.imul(lane, 0x9e3779b1) ^ Math.imul(index, 0x85ebca6b)) / 4294967296;

    // Shared registry of installed replacements; the toString mask and the
    // descriptor shim read it. One registry across all modules.
    const spoofedFunctions = new Map();

    const safeDefineProperty = (obj, prop, descriptor) => {
        try {
            const existing = Object.getOwnPropertyDescriptor(obj, prop);
            if (existing && !existing.configurable) return false;
            Object.defineProperty(obj, prop, descriptor);
            return true;
        } catch (e) {
            return false;
        }
    };

    const defineGetter = (obj, prop, value) => {
        const getter = () => value;
        spoofedFunctions.set(getter, 'get ' + prop);
        return safeDefineProperty(obj, prop, { get: getter, configurable: true });
    };

    const installMethod = (obj, prop, replacement) => {
        spoofedFunctions.set(replacement, prop);
        return safeDefineProperty(obj, prop, {
            value: replacement,
            writable: true,
            configurable: true,
        });
    };
"#;

/// The toString mask and descriptor shim. Installed after every module so
/// the registry is complete, covering direct calls, `.call`/`.apply`
/// indirection, and the replaced `toString` itself.
pub(crate) fn epilogue() -> &'static str {
    EPILOGUE_BODY
}

const EPILOGUE_BODY: &str = r#"
    // --- stealth toString ---
    {
        const nativeToString = Function.prototype.toString;
        const nativeSource = (name) => 'function ' + name + '() { [native code] }';
        const stealthToString = new Proxy(nativeToString, {
            apply(target, thisArg, args) {
                if (spoofedFunctions.has(thisArg)) {
                    return nativeSource(spoofedFunctions.get(thisArg));
                }
                if (thisArg === stealthToString) return nativeSource('toString');
                return Reflect.apply(target, thisArg, args);
            },
            get(target, prop, receiver) {
                if (prop === 'call' || prop === 'apply') {
                    return function (...args) {
                        const subject = args[0];
                        if (spoofedFunctions.has(subject)) {
                            return nativeSource(spoofedFunctions.get(subject));
                        }
                        if (subject === stealthToString) return nativeSource('toString');
                        return target[prop](...args);
                    };
                }
                return Reflect.get(target, prop, receiver);
            },
        });
        safeDefineProperty(Function.prototype, 'toString', {
            value: stealthToString,
            writable: true,
            configurable: true,
        });

        // Descriptor probes must see ordinary descriptors for replacements.
        const nativeGetOwnPropertyDescriptor = Object.getOwnPropertyDescriptor;
        const spoofedGetOwnPropertyDescriptor = function (obj, prop) {
            const descriptor = nativeGetOwnPropertyDescriptor.call(Object, obj, prop);
            if (descriptor && descriptor.value && spoofedFunctions.has(descriptor.value)) {
                return {
                    value: descriptor.value,
                    writable: true,
                    enumerable: true,
                    configurable: true,
                };
            }
            return descriptor;
        };
        spoofedFunctions.set(spoofedGetOwnPropertyDescriptor, 'getOwnPropertyDescriptor');
        Object.getOwnPropertyDescriptor = spoofedGetOwnPropertyDescriptor;
    }
"#;
