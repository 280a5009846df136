// wglcore/src/registry.rs
//
//! The registry of extension functions that `wglGetProcAddress` can hand out.
//!
//! The registry is a partial list: the WGL extension entry points, the functions the layer
//! calls itself, and a selection of commonly loaded GL extension functions. Any other name,
//! including a real GL function missing from this list, fails with `UnknownFunction`. Add a
//! line to the `extension_registry!` invocation to make a function resolvable.

/// One extension function known to the layer.
#[derive(Clone, Copy, Debug)]
pub struct RegistryEntry {
    /// The function name, e.g. `glGetStringi`.
    pub name: &'static str,
    /// The extensions that provide the function, separated by spaces. Any one of them is
    /// enough; `GL_VERSION_x_y` stands for core OpenGL x.y.
    pub extension: &'static str,
    /// The function's slot in a driver table.
    pub function: ExtFunction,
}

macro_rules! extension_registry {
    ($($variant:ident => $name:literal, $extension:literal;)*) => {
        /// Identifies an extension function, and its slot in every driver table.
        ///
        /// Variants are declared in the byte order of their names, so the discriminant is also
        /// the position in the registry.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum ExtFunction {
            $(
                #[doc = concat!("`", $name, "`")]
                $variant,
            )*
        }

        /// Every extension function, sorted by name.
        pub static EXTENSION_REGISTRY: &[RegistryEntry] = &[
            $(
                RegistryEntry {
                    name: $name,
                    extension: $extension,
                    function: ExtFunction::$variant,
                },
            )*
        ];
    };
}

extension_registry! {
    GlActiveTexture => "glActiveTexture", "GL_VERSION_1_3";
    GlActiveTextureArb => "glActiveTextureARB", "GL_ARB_multitexture";
    GlBindBuffer => "glBindBuffer", "GL_VERSION_1_5";
    GlBindBufferArb => "glBindBufferARB", "GL_ARB_vertex_buffer_object";
    GlBindFramebuffer => "glBindFramebuffer", "GL_ARB_framebuffer_object GL_VERSION_3_0";
    GlBindFramebufferExt => "glBindFramebufferEXT", "GL_EXT_framebuffer_object";
    GlBindVertexArray => "glBindVertexArray", "GL_ARB_vertex_array_object GL_VERSION_3_0";
    GlBlendEquation => "glBlendEquation", "GL_ARB_imaging GL_VERSION_1_4";
    GlBlendFuncSeparate => "glBlendFuncSeparate", "GL_VERSION_1_4";
    GlBufferData => "glBufferData", "GL_VERSION_1_5";
    GlBufferDataArb => "glBufferDataARB", "GL_ARB_vertex_buffer_object";
    GlCompileShader => "glCompileShader", "GL_VERSION_2_0";
    GlCompressedTexImage2D => "glCompressedTexImage2D", "GL_VERSION_1_3";
    GlCopyTexSubImage3D => "glCopyTexSubImage3D", "GL_VERSION_1_2";
    GlCopyTexSubImage3DExt => "glCopyTexSubImage3DEXT", "GL_EXT_copy_texture";
    GlCreateProgram => "glCreateProgram", "GL_VERSION_2_0";
    GlCreateShader => "glCreateShader", "GL_VERSION_2_0";
    GlDebugMessageCallback => "glDebugMessageCallback", "GL_KHR_debug GL_VERSION_4_3";
    GlDebugMessageCallbackAmd => "glDebugMessageCallbackAMD", "GL_AMD_debug_output";
    GlDebugMessageCallbackArb => "glDebugMessageCallbackARB", "GL_ARB_debug_output";
    GlDebugMessageControl => "glDebugMessageControl", "GL_KHR_debug GL_VERSION_4_3";
    GlDebugMessageInsert => "glDebugMessageInsert", "GL_KHR_debug GL_VERSION_4_3";
    GlDeleteBuffers => "glDeleteBuffers", "GL_VERSION_1_5";
    GlDeleteFramebuffers => "glDeleteFramebuffers", "GL_ARB_framebuffer_object GL_VERSION_3_0";
    GlDeleteVertexArrays => "glDeleteVertexArrays", "GL_ARB_vertex_array_object GL_VERSION_3_0";
    GlDrawArraysInstanced => "glDrawArraysInstanced", "GL_VERSION_3_1";
    GlDrawArraysInstancedArb => "glDrawArraysInstancedARB", "GL_ARB_draw_instanced";
    GlGenBuffers => "glGenBuffers", "GL_VERSION_1_5";
    GlGenFramebuffers => "glGenFramebuffers", "GL_ARB_framebuffer_object GL_VERSION_3_0";
    GlGenVertexArrays => "glGenVertexArrays", "GL_ARB_vertex_array_object GL_VERSION_3_0";
    GlGenerateMipmap => "glGenerateMipmap", "GL_ARB_framebuffer_object GL_VERSION_3_0";
    GlGetDebugMessageLog => "glGetDebugMessageLog", "GL_KHR_debug GL_VERSION_4_3";
    GlGetStringi => "glGetStringi", "GL_VERSION_3_0";
    GlLinkProgram => "glLinkProgram", "GL_VERSION_2_0";
    GlMapBuffer => "glMapBuffer", "GL_VERSION_1_5";
    GlShaderSource => "glShaderSource", "GL_VERSION_2_0";
    GlTexImage3D => "glTexImage3D", "GL_VERSION_1_2";
    GlTexImage3DExt => "glTexImage3DEXT", "GL_EXT_texture3D";
    GlUniform1f => "glUniform1f", "GL_VERSION_2_0";
    GlUseProgram => "glUseProgram", "GL_VERSION_2_0";
    GlVertexAttribDivisor => "glVertexAttribDivisor", "GL_VERSION_3_3";
    GlVertexAttribDivisorArb => "glVertexAttribDivisorARB", "GL_ARB_instanced_arrays";
    GlVertexAttribPointer => "glVertexAttribPointer", "GL_VERSION_2_0";
    WglBindTexImageArb => "wglBindTexImageARB", "WGL_ARB_render_texture";
    WglChoosePixelFormatArb => "wglChoosePixelFormatARB", "WGL_ARB_pixel_format";
    WglCreateContextAttribsArb => "wglCreateContextAttribsARB", "WGL_ARB_create_context";
    WglCreatePbufferArb => "wglCreatePbufferARB", "WGL_ARB_pbuffer";
    WglDestroyPbufferArb => "wglDestroyPbufferARB", "WGL_ARB_pbuffer";
    WglGetCurrentReadDcArb => "wglGetCurrentReadDCARB", "WGL_ARB_make_current_read";
    WglGetExtensionsStringArb => "wglGetExtensionsStringARB", "WGL_ARB_extensions_string";
    WglGetExtensionsStringExt => "wglGetExtensionsStringEXT", "WGL_EXT_extensions_string";
    WglGetPbufferDcArb => "wglGetPbufferDCARB", "WGL_ARB_pbuffer";
    WglGetPixelFormatAttribfvArb => "wglGetPixelFormatAttribfvARB", "WGL_ARB_pixel_format";
    WglGetPixelFormatAttribivArb => "wglGetPixelFormatAttribivARB", "WGL_ARB_pixel_format";
    WglGetSwapIntervalExt => "wglGetSwapIntervalEXT", "WGL_EXT_swap_control";
    WglMakeContextCurrentArb => "wglMakeContextCurrentARB", "WGL_ARB_make_current_read";
    WglQueryPbufferArb => "wglQueryPbufferARB", "WGL_ARB_pbuffer";
    WglReleasePbufferDcArb => "wglReleasePbufferDCARB", "WGL_ARB_pbuffer";
    WglReleaseTexImageArb => "wglReleaseTexImageARB", "WGL_ARB_render_texture";
    WglSetPbufferAttribArb => "wglSetPbufferAttribARB", "WGL_ARB_render_texture";
    WglSwapIntervalExt => "wglSwapIntervalEXT", "WGL_EXT_swap_control";
}

// Known-broken applications ask for a function whose extension the driver may not expose, when
// an equivalent function is available under another name.
static ALTERNATIVES: &[(&str, &str)] = &[
    // RuneScape
    ("glCopyTexSubImage3DEXT", "glCopyTexSubImage3D"),
    // Caffeine
    ("glVertexAttribDivisor", "glVertexAttribDivisorARB"),
];

impl ExtFunction {
    /// The slot of this function in a driver table.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The registry entry of this function.
    #[inline]
    pub fn entry(self) -> &'static RegistryEntry {
        &EXTENSION_REGISTRY[self.index()]
    }

    /// The function name.
    #[inline]
    pub fn name(self) -> &'static str {
        self.entry().name
    }
}

/// Finds a function by name.
///
/// Only registered functions are found; see the module docs.
pub fn lookup(name: &str) -> Option<&'static RegistryEntry> {
    EXTENSION_REGISTRY
        .binary_search_by(|entry| entry.name.cmp(name))
        .ok()
        .map(|index| &EXTENSION_REGISTRY[index])
}

/// Returns the name to try instead of `name` when the extension behind `name` is unsupported.
pub(crate) fn alternative(name: &str) -> Option<&'static str> {
    ALTERNATIVES
        .iter()
        .find(|&&(broken, _)| broken == name)
        .map(|&(_, alt)| alt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_is_sorted_and_indexed() {
        for pair in EXTENSION_REGISTRY.windows(2) {
            assert!(pair[0].name < pair[1].name, "{} >= {}", pair[0].name, pair[1].name);
        }
        for (index, entry) in EXTENSION_REGISTRY.iter().enumerate() {
            assert_eq!(entry.function.index(), index);
        }
    }

    #[test]
    fn test_lookup() {
        let entry = lookup("glGetStringi").unwrap();
        assert_eq!(entry.function, ExtFunction::GlGetStringi);
        assert_eq!(entry.extension, "GL_VERSION_3_0");
        assert!(lookup("glGetString").is_none());
        assert!(lookup("").is_none());
    }

    #[test]
    fn test_alternatives_are_registered() {
        for &(name, alt) in ALTERNATIVES {
            assert!(lookup(name).is_some());
            assert!(lookup(alt).is_some());
        }
        assert_eq!(alternative("glCopyTexSubImage3DEXT"), Some("glCopyTexSubImage3D"));
        assert_eq!(alternative("glCopyTexSubImage3D"), None);
    }
}
