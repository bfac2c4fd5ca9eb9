//! Internally consistent GPU profiles.
//!
//! Every simulated card bundles its vendor string, renderer string,
//! extension list, and numeric capability set. The three surfaces a page
//! can sample (renderer strings, numeric limits, extensions) must always
//! come from the same entry; picking them independently is a bug, not
//! acceptable noise.

/// Numeric WebGL capabilities for one simulated card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuLimits {
    pub max_texture_size: u32,
    pub max_renderbuffer_size: u32,
    pub max_viewport_dims: [u32; 2],
    pub max_vertex_attribs: u32,
    pub max_vertex_uniform_vectors: u32,
    pub max_fragment_uniform_vectors: u32,
    pub max_varying_vectors: u32,
    pub max_texture_image_units: u32,
    pub max_vertex_texture_image_units: u32,
    pub max_combined_texture_image_units: u32,
    pub aliased_line_width_range: [u32; 2],
    pub aliased_point_size_range: [u32; 2],
}

/// One simulated graphics card.
#[derive(Debug, PartialEq, Eq)]
pub struct GpuProfile {
    pub key: &'static str,
    pub vendor: &'static str,
    pub renderer: &'static str,
    pub extensions: &'static [&'static str],
    pub limits: GpuLimits,
}

impl GpuProfile {
    /// Look up a profile by its table key.
    pub fn by_key(key: &str) -> Option<&'static GpuProfile> {
        GPU_PROFILES.iter().find(|profile| profile.key == key)
    }

    /// Extension list as a JSON array literal for script embedding.
    pub fn extensions_json(&self) -> String {
        serde_json::to_string(self.extensions).unwrap_or_else(|_| "[]".to_string())
    }

    /// Capability map as a JSON object literal keyed by GL parameter name.
    pub fn limits_json(&self) -> String {
        let limits = &self.limits;
        serde_json::json!({
            "MAX_TEXTURE_SIZE": limits.max_texture_size,
            "MAX_RENDERBUFFER_SIZE": limits.max_renderbuffer_size,
            "MAX_VIEWPORT_DIMS": limits.max_viewport_dims,
            "MAX_VERTEX_ATTRIBS": limits.max_vertex_attribs,
            "MAX_VERTEX_UNIFORM_VECTORS": limits.max_vertex_uniform_vectors,
            "MAX_FRAGMENT_UNIFORM_VECTORS": limits.max_fragment_uniform_vectors,
            "MAX_VARYING_VECTORS": limits.max_varying_vectors,
            "MAX_TEXTURE_IMAGE_UNITS": limits.max_texture_image_units,
            "MAX_VERTEX_TEXTURE_IMAGE_UNITS": limits.max_vertex_texture_image_units,
            "MAX_COMBINED_TEXTURE_IMAGE_UNITS": limits.max_combined_texture_image_units,
            "ALIASED_LINE_WIDTH_RANGE": limits.aliased_line_width_range,
            "ALIASED_POINT_SIZE_RANGE": limits.aliased_point_size_range,
        })
        .to_string()
    }
}

/// Extensions common to the mid-range desktop cards below.
const BASELINE_EXTENSIONS: &[&str] = &[
    "ANGLE_instanced_arrays",
    "EXT_blend_minmax",
    "EXT_color_buffer_half_float",
    "EXT_float_blend",
    "EXT_frag_depth",
    "EXT_shader_texture_lod",
    "EXT_texture_compression_bptc",
    "EXT_texture_compression_rgtc",
    "EXT_texture_filter_anisotropic",
    "EXT_sRGB",
    "OES_element_index_uint",
    "OES_fbo_render_mipmap",
    "OES_standard_derivatives",
    "OES_texture_float",
    "OES_texture_float_linear",
    "OES_texture_half_float",
    "OES_texture_half_float_linear",
    "OES_vertex_array_object",
    "WEBGL_color_buffer_float",
    "WEBGL_compressed_texture_s3tc",
    "WEBGL_compressed_texture_s3tc_srgb",
    "WEBGL_debug_renderer_info",
    "WEBGL_debug_shaders",
    "WEBGL_depth_texture",
    "WEBGL_draw_buffers",
    "WEBGL_lose_context",
    "WEBGL_multi_draw",
];

const INTEL_IRIS_XE_EXTENSIONS: &[&str] = &[
    "ANGLE_instanced_arrays",
    "EXT_blend_minmax",
    "EXT_color_buffer_half_float",
    "EXT_float_blend",
    "EXT_frag_depth",
    "EXT_shader_texture_lod",
    "EXT_texture_compression_bptc",
    "EXT_texture_compression_rgtc",
    "EXT_texture_filter_anisotropic",
    "EXT_sRGB",
    "KHR_parallel_shader_compile",
    "OES_element_index_uint",
    "OES_fbo_render_mipmap",
    "OES_standard_derivatives",
    "OES_texture_float",
    "OES_texture_float_linear",
    "OES_texture_half_float",
    "OES_texture_half_float_linear",
    "OES_vertex_array_object",
    "WEBGL_color_buffer_float",
    "WEBGL_compressed_texture_s3tc",
    "WEBGL_compressed_texture_s3tc_srgb",
    "WEBGL_debug_renderer_info",
    "WEBGL_debug_shaders",
    "WEBGL_depth_texture",
    "WEBGL_draw_buffers",
    "WEBGL_lose_context",
    "WEBGL_multi_draw",
];

const NVIDIA_GTX_1650_EXTENSIONS: &[&str] = &[
    "ANGLE_instanced_arrays",
    "EXT_blend_minmax",
    "EXT_color_buffer_half_float",
    "EXT_float_blend",
    "EXT_frag_depth",
    "EXT_shader_texture_lod",
    "EXT_texture_compression_bptc",
    "EXT_texture_compression_rgtc",
    "EXT_texture_filter_anisotropic",
    "EXT_sRGB",
    "KHR_parallel_shader_compile",
    "NV_shader_noperspective_interpolation",
    "OES_element_index_uint",
    "OES_fbo_render_mipmap",
    "OES_standard_derivatives",
    "OES_texture_float",
    "OES_texture_float_linear",
    "OES_texture_half_float",
    "OES_texture_half_float_linear",
    "OES_vertex_array_object",
    "WEBGL_color_buffer_float",
    "WEBGL_compressed_texture_s3tc",
    "WEBGL_compressed_texture_s3tc_srgb",
    "WEBGL_debug_renderer_info",
    "WEBGL_debug_shaders",
    "WEBGL_depth_texture",
    "WEBGL_draw_buffers",
    "WEBGL_lose_context",
    "WEBGL_multi_draw",
];

const NVIDIA_RTX_3060_EXTENSIONS: &[&str] = &[
    "ANGLE_instanced_arrays",
    "EXT_blend_minmax",
    "EXT_color_buffer_half_float",
    "EXT_float_blend",
    "EXT_frag_depth",
    "EXT_shader_texture_lod",
    "EXT_texture_compression_bptc",
    "EXT_texture_compression_rgtc",
    "EXT_texture_filter_anisotropic",
    "EXT_sRGB",
    "KHR_parallel_shader_compile",
    "NV_shader_noperspective_interpolation",
    "OES_element_index_uint",
    "OES_fbo_render_mipmap",
    "OES_standard_derivatives",
    "OES_texture_float",
    "OES_texture_float_linear",
    "OES_texture_half_float",
    "OES_texture_half_float_linear",
    "OES_vertex_array_object",
    "WEBGL_color_buffer_float",
    "WEBGL_compressed_texture_s3tc",
    "WEBGL_compressed_texture_s3tc_srgb",
    "WEBGL_debug_renderer_info",
    "WEBGL_debug_shaders",
    "WEBGL_depth_texture",
    "WEBGL_draw_buffers",
    "WEBGL_lose_context",
    "WEBGL_multi_draw",
    "WEBGL_provoking_vertex",
];

/// The full profile table. Entries are real-world plausible bundles; the
/// numeric limits match the class of card named by the renderer string.
pub static GPU_PROFILES: [GpuProfile; 5] = [
    GpuProfile {
        key: "intel_uhd_620",
        vendor: "Intel Inc.",
        renderer: "Intel(R) UHD Graphics 620",
        extensions: BASELINE_EXTENSIONS,
        limits: GpuLimits {
            max_texture_size: 16384,
            max_renderbuffer_size: 16384,
            max_viewport_dims: [16384, 16384],
            max_vertex_attribs: 16,
            max_vertex_uniform_vectors: 4096,
            max_fragment_uniform_vectors: 1024,
            max_varying_vectors: 30,
            max_texture_image_units: 16,
            max_vertex_texture_image_units: 16,
            max_combined_texture_image_units: 32,
            aliased_line_width_range: [1, 1],
            aliased_point_size_range: [1, 1024],
        },
    },
    GpuProfile {
        key: "intel_iris_xe",
        vendor: "Intel Inc.",
        renderer: "Intel(R) Iris(R) Xe Graphics",
        extensions: INTEL_IRIS_XE_EXTENSIONS,
        limits: GpuLimits {
            max_texture_size: 16384,
            max_renderbuffer_size: 16384,
            max_viewport_dims: [16384, 16384],
            max_vertex_attribs: 16,
            max_vertex_uniform_vectors: 4096,
            max_fragment_uniform_vectors: 1024,
            max_varying_vectors: 31,
            max_texture_image_units: 16,
            max_vertex_texture_image_units: 16,
            max_combined_texture_image_units: 32,
            aliased_line_width_range: [1, 1],
            aliased_point_size_range: [1, 1024],
        },
    },
    GpuProfile {
        key: "nvidia_gtx_1650",
        vendor: "NVIDIA Corporation",
        renderer: "NVIDIA GeForce GTX 1650",
        extensions: NVIDIA_GTX_1650_EXTENSIONS,
        limits: GpuLimits {
            max_texture_size: 32768,
            max_renderbuffer_size: 32768,
            max_viewport_dims: [32768, 32768],
            max_vertex_attribs: 16,
            max_vertex_uniform_vectors: 4096,
            max_fragment_uniform_vectors: 4096,
            max_varying_vectors: 31,
            max_texture_image_units: 32,
            max_vertex_texture_image_units: 32,
            max_combined_texture_image_units: 64,
            aliased_line_width_range: [1, 1],
            aliased_point_size_range: [1, 2048],
        },
    },
    GpuProfile {
        key: "nvidia_rtx_3060",
        vendor: "NVIDIA Corporation",
        renderer: "NVIDIA GeForce RTX 3060",
        extensions: NVIDIA_RTX_3060_EXTENSIONS,
        limits: GpuLimits {
            max_texture_size: 32768,
            max_renderbuffer_size: 32768,
            max_viewport_dims: [32768, 32768],
            max_vertex_attribs: 16,
            max_vertex_uniform_vectors: 4096,
            max_fragment_uniform_vectors: 4096,
            max_varying_vectors: 31,
            max_texture_image_units: 32,
            max_vertex_texture_image_units: 32,
            max_combined_texture_image_units: 64,
            aliased_line_width_range: [1, 1],
            aliased_point_size_range: [1, 2048],
        },
    },
    GpuProfile {
        key: "amd_rx_580",
        vendor: "AMD",
        renderer: "AMD Radeon RX 580",
        extensions: BASELINE_EXTENSIONS,
        limits: GpuLimits {
            max_texture_size: 16384,
            max_renderbuffer_size: 16384,
            max_viewport_dims: [16384, 16384],
            max_vertex_attribs: 16,
            max_vertex_uniform_vectors: 4096,
            max_fragment_uniform_vectors: 4096,
            max_varying_vectors: 32,
            max_texture_image_units: 32,
            max_vertex_texture_image_units: 32,
            max_combined_texture_image_units: 64,
            aliased_line_width_range: [1, 1],
            aliased_point_size_range: [1, 8192],
        },
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    // Verifies every table entry carries the debug-renderer-info extension,
    // without which the unmasked strings would never be queried.
    #[test]
    fn all_profiles_expose_debug_renderer_info() {
        for profile in &GPU_PROFILES {
            assert!(
                profile.extensions.contains(&"WEBGL_debug_renderer_info"),
                "{} misses WEBGL_debug_renderer_info",
                profile.key
            );
        }
    }

    // Verifies table keys are unique and resolvable.
    #[test]
    fn profile_keys_are_unique_and_resolvable() {
        for profile in &GPU_PROFILES {
            assert_eq!(
                GpuProfile::by_key(profile.key).map(|found| found.key),
                Some(profile.key)
            );
        }
        let mut keys: Vec<_> = GPU_PROFILES.iter().map(|profile| profile.key).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), GPU_PROFILES.len());
    }

    // Verifies the JSON renderings are embeddable object/array literals.
    #[test]
    fn json_renderings_are_well_formed() {
        let profile = GpuProfile::by_key("nvidia_rtx_3060").unwrap();
        let extensions: Vec<String> = serde_json::from_str(&profile.extensions_json()).unwrap();
        assert!(extensions.iter().any(|ext| ext == "WEBGL_provoking_vertex"));

        let limits: serde_json::Value = serde_json::from_str(&profile.limits_json()).unwrap();
        assert_eq!(limits["MAX_TEXTURE_SIZE"], 32768);
        assert_eq!(limits["MAX_VIEWPORT_DIMS"][0], 32768);
    }
}
