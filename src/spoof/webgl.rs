//! WebGL identity: renderer strings, numeric limits, and extensions, all
//! sourced from one GPU profile entry.

use super::profile::SpoofProfile;
use super::SpoofModule;

pub struct WebGlSpoof;

impl SpoofModule for WebGlSpoof {
    fn name(&self) -> &'static str {
        "webgl"
    }

    fn generate(&self, profile: &SpoofProfile) -> String {
        let gpu = profile.gpu;
        let mut script = format!(
            "    {{\n        \
             const WEBGL_VENDOR = '{vendor}';\n        \
             const WEBGL_RENDERER = '{renderer}';\n        \
             const WEBGL_EXTENSIONS = {extensions};\n        \
             const WEBGL_LIMITS = {limits};\n",
            vendor = gpu.vendor,
            renderer = gpu.renderer,
            extensions = gpu.extensions_json(),
            limits = gpu.limits_json(),
        );
        script.push_str(BODY);
        script
    }
}

const BODY: &str = r#"
        const UNMASKED_VENDOR_WEBGL = 0x9245;
        const UNMASKED_RENDERER_WEBGL = 0x9246;
        const GL_VENDOR = 0x1f00;
        const GL_RENDERER = 0x1f01;

        // GL constant -> limit-table key. Collectors cross-check these
        // numbers against the renderer string, so both must come from the
        // same profile entry.
        const GL_PARAM_NAMES = {
            0x0d33: 'MAX_TEXTURE_SIZE',
            0x84e8: 'MAX_RENDERBUFFER_SIZE',
            0x0d3a: 'MAX_VIEWPORT_DIMS',
            0x8869: 'MAX_VERTEX_ATTRIBS',
            0x8dfb: 'MAX_VERTEX_UNIFORM_VECTORS',
            0x8dfd: 'MAX_FRAGMENT_UNIFORM_VECTORS',
            0x8dfc: 'MAX_VARYING_VECTORS',
            0x8872: 'MAX_TEXTURE_IMAGE_UNITS',
            0x8b4c: 'MAX_VERTEX_TEXTURE_IMAGE_UNITS',
            0x8b4d: 'MAX_COMBINED_TEXTURE_IMAGE_UNITS',
            0x846e: 'ALIASED_LINE_WIDTH_RANGE',
            0x846d: 'ALIASED_POINT_SIZE_RANGE',
        };
        const INT_ARRAY_PARAMS = new Set(['MAX_VIEWPORT_DIMS']);

        const spoofContext = (proto) => {
            const nativeGetParameter = proto.getParameter;
            const spoofedGetParameter = function (parameter) {
                if (parameter === UNMASKED_VENDOR_WEBGL || parameter === GL_VENDOR) {
                    return WEBGL_VENDOR;
                }
                if (parameter === UNMASKED_RENDERER_WEBGL || parameter === GL_RENDERER) {
                    return WEBGL_RENDERER;
                }
                const name = GL_PARAM_NAMES[parameter];
                if (name && WEBGL_LIMITS[name] !== undefined) {
                    const value = WEBGL_LIMITS[name];
                    if (Array.isArray(value)) {
                        return INT_ARRAY_PARAMS.has(name)
                            ? new Int32Array(value)
                            : new Float32Array(value);
                    }
                    return value;
                }
                return nativeGetParameter.call(this, parameter);
            };
            installMethod(proto, 'getParameter', spoofedGetParameter);

            const spoofedGetSupportedExtensions = function () {
                return WEBGL_EXTENSIONS.slice();
            };
            installMethod(proto, 'getSupportedExtensions', spoofedGetSupportedExtensions);
        };

        try {
            spoofContext(WebGLRenderingContext.prototype);
            if (typeof WebGL2RenderingContext !== 'undefined') {
                spoofContext(WebGL2RenderingContext.prototype);
            }
        } catch (e) {}
    }
"#;
