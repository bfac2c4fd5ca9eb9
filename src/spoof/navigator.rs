//! Navigator identity: platform, vendor, language, hardware, plugins.

use super::profile::SpoofProfile;
use super::SpoofModule;

pub struct NavigatorSpoof;

impl SpoofModule for NavigatorSpoof {
    fn name(&self) -> &'static str {
        "navigator"
    }

    fn generate(&self, profile: &SpoofProfile) -> String {
        let mut script = format!(
            "    {{\n        \
             const PLATFORM = '{platform}';\n        \
             const VENDOR = '{vendor}';\n        \
             const LOCALE = '{locale}';\n        \
             const CONCURRENCY = {concurrency};\n        \
             const DEVICE_MEMORY = {memory};\n        \
             const MAX_TOUCH_POINTS = {touch};\n",
            platform = profile.platform,
            vendor = profile.vendor,
            locale = profile.locale,
            concurrency = profile.hardware_concurrency,
            memory = profile.device_memory,
            touch = profile.max_touch_points,
        );
        script.push_str(BODY);
        script
    }
}

const BODY: &str = r#"
        defineGetter(navigator, 'platform', PLATFORM);
        defineGetter(navigator, 'vendor', VENDOR);
        defineGetter(navigator, 'hardwareConcurrency', CONCURRENCY);
        defineGetter(navigator, 'deviceMemory', DEVICE_MEMORY);
        defineGetter(navigator, 'maxTouchPoints', MAX_TOUCH_POINTS);
        defineGetter(navigator, 'language', LOCALE);
        defineGetter(navigator, 'userLanguage', LOCALE);
        defineGetter(navigator, 'languages', Object.freeze([LOCALE, 'en']));
        defineGetter(navigator, 'doNotTrack', null);
        defineGetter(navigator, 'msDoNotTrack', undefined);
        defineGetter(window, 'doNotTrack', undefined);

        // Real Chrome ships a PDF-plugin triplet; collectors iterate it
        // through item()/namedItem() as well as by index.
        const createPlugin = (name, filename, description) => {
            const mimeTypes = name.includes('PDF')
                ? [{
                    type: 'application/pdf',
                    suffixes: 'pdf',
                    description: 'Portable Document Format',
                    enabledPlugin: null,
                }]
                : [];
            const plugin = {
                name,
                filename,
                description,
                version: '',
                length: mimeTypes.length,
                item(i) { return mimeTypes[i]; },
                namedItem: (n) => mimeTypes.find((m) => m.type === n),
                [Symbol.iterator]: function* () { yield* mimeTypes; },
            };
            mimeTypes.forEach((mt, i) => { plugin[i] = mt; });
            return plugin;
        };
        const fakePlugins = [
            createPlugin('Chrome PDF Plugin', 'internal-pdf-viewer', 'Portable Document Format'),
            createPlugin('Chrome PDF Viewer', 'mhjfbmdgcfjbbpaeojofohoefgiehjai', ''),
            createPlugin('Native Client', 'internal-nacl-plugin', ''),
        ];
        const pluginArray = {
            length: fakePlugins.length,
            item(i) { return fakePlugins[i]; },
            namedItem: (name) => fakePlugins.find((p) => p.name === name),
            refresh: () => {},
            [Symbol.iterator]: function* () { yield* fakePlugins; },
        };
        fakePlugins.forEach((p, i) => { pluginArray[i] = p; });
        defineGetter(navigator, 'plugins', pluginArray);

        const pdfMime = {
            type: 'application/pdf',
            suffixes: 'pdf',
            description: 'Portable Document Format',
            enabledPlugin: fakePlugins[0],
        };
        const mimeTypeArray = {
            length: 1,
            0: pdfMime,
            item(i) { return i === 0 ? pdfMime : undefined; },
            namedItem: (name) => (name === 'application/pdf' ? pdfMime : undefined),
            [Symbol.iterator]: function* () { yield pdfMime; },
        };
        defineGetter(navigator, 'mimeTypes', mimeTypeArray);
    }
"#;
