// wglcore/src/extensions.rs
//
//! Hiding user-disabled extensions from applications.
//!
//! Both views of `GL_EXTENSIONS` are filtered: the single string from `glGetString`, and the
//! indexed enumeration from `glGetIntegerv(GL_NUM_EXTENSIONS)` and `glGetStringi`. For the
//! indexed view only the disabled indices are kept; a filtered index is mapped to a driver index
//! by skipping over every disabled index at or below it.

use crate::config::ConfigSource;
use crate::driver::{GLint, GLuint};

use fnv::FnvHashSet;
use log::{debug, trace};

/// Terminates a list of disabled indices. Larger than any real index.
pub(crate) const INDEX_SENTINEL: GLuint = GLuint::MAX;

/// The set of extensions the user asked to hide.
#[derive(Clone, Debug, Default)]
pub struct DisabledExtensions {
    names: FnvHashSet<String>,
}

impl DisabledExtensions {
    /// Parses a space-separated list of extension names.
    pub fn parse(list: &str) -> DisabledExtensions {
        DisabledExtensions { names: list.split_ascii_whitespace().map(str::to_owned).collect() }
    }

    /// Reads the list from a configuration source. No value means nothing is disabled.
    pub(crate) fn load(config: &dyn ConfigSource) -> DisabledExtensions {
        let disabled = match config.disabled_extensions() {
            Some(list) => DisabledExtensions::parse(&list),
            None => DisabledExtensions::default(),
        };
        debug!("{} extension(s) disabled by configuration", disabled.names.len());
        disabled
    }

    /// True if no filtering happens at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Exact, whole-name membership test.
    #[inline]
    pub fn contains(&self, extension: &str) -> bool {
        self.names.contains(extension)
    }

    /// Drops every disabled name from a space-separated extension list. The kept names are
    /// joined with single spaces.
    pub fn filter_string(&self, extensions: &str) -> String {
        let mut filtered = String::with_capacity(extensions.len());
        for extension in extensions.split(' ').filter(|token| !token.is_empty()) {
            if self.contains(extension) {
                trace!("-- {} (disabled by config)", extension);
                continue;
            }
            trace!("++ {}", extension);
            if !filtered.is_empty() {
                filtered.push(' ');
            }
            filtered.push_str(extension);
        }
        filtered
    }

    /// Collects, in ascending order, the driver indices of disabled extensions, followed by
    /// `INDEX_SENTINEL`.
    ///
    /// `name_at` returns the driver's name for an index, as `glGetStringi` does.
    pub(crate) fn disabled_indices<F>(&self, count: GLint, mut name_at: F) -> Vec<GLuint>
    where
        F: FnMut(GLuint) -> Option<String>,
    {
        let count = GLuint::try_from(count).unwrap_or(0);
        let mut indices = vec![];
        for index in 0..count {
            match name_at(index) {
                Some(ref name) if self.contains(name) => {
                    trace!("-- {} (disabled by config)", name);
                    indices.push(index);
                }
                Some(name) => trace!("++ {}", name),
                None => {}
            }
        }
        indices.push(INDEX_SENTINEL);
        indices
    }
}

/// Maps an index in the filtered enumeration to the driver's index.
pub(crate) fn remap_index(mut index: GLuint, disabled: &[GLuint]) -> GLuint {
    for &disabled_index in disabled {
        if index < disabled_index {
            break;
        }
        index = index.saturating_add(1);
    }
    index
}

/// The extension count applications see.
pub(crate) fn filtered_count(count: GLint, disabled: &[GLuint]) -> GLint {
    let hidden = disabled.iter().take_while(|&&index| index != INDEX_SENTINEL).count();
    count.saturating_sub(GLint::try_from(hidden).unwrap_or(GLint::MAX))
}

/// True if `extension` is one of the space-separated names in `list`.
pub(crate) fn has_extension(list: &str, extension: &str) -> bool {
    !extension.is_empty() && list.split(' ').any(|token| token == extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DRIVER_EXTENSIONS: [&str; 6] = [
        "GL_ARB_foo",
        "GL_ARB_bar",
        "GL_ARB_foobar",
        "GL_EXT_baz",
        "GL_KHR_debug",
        "GL_EXT_qux",
    ];

    fn name_at(index: GLuint) -> Option<String> {
        DRIVER_EXTENSIONS.get(index as usize).map(|name| name.to_string())
    }

    #[test]
    fn test_filter_is_token_exact() {
        let disabled = DisabledExtensions::parse("GL_ARB_foo");
        assert_eq!(
            disabled.filter_string("GL_ARB_foo GL_ARB_bar GL_ARB_foobar"),
            "GL_ARB_bar GL_ARB_foobar"
        );
    }

    #[test]
    fn test_filter_is_idempotent() {
        let disabled = DisabledExtensions::parse("  GL_EXT_baz GL_ARB_foo ");
        let once = disabled.filter_string(&DRIVER_EXTENSIONS.join(" "));
        assert_eq!(disabled.filter_string(&once), once);
        assert_eq!(once, "GL_ARB_bar GL_ARB_foobar GL_KHR_debug GL_EXT_qux");
    }

    #[test]
    fn test_empty_configuration_filters_nothing() {
        let disabled = DisabledExtensions::parse("");
        assert!(disabled.is_empty());
        assert_eq!(disabled.filter_string("GL_A  GL_B "), "GL_A GL_B");
        let indices = disabled.disabled_indices(DRIVER_EXTENSIONS.len() as GLint, name_at);
        assert_eq!(indices, [INDEX_SENTINEL]);
    }

    #[test]
    fn test_index_remapping() {
        let disabled = DisabledExtensions::parse("GL_ARB_foo GL_EXT_baz GL_EXT_qux");
        let indices = disabled.disabled_indices(DRIVER_EXTENSIONS.len() as GLint, name_at);
        assert_eq!(indices, [0, 3, 5, INDEX_SENTINEL]);
        assert_eq!(filtered_count(DRIVER_EXTENSIONS.len() as GLint, &indices), 3);

        let visible: Vec<_> = (0..3)
            .map(|index| DRIVER_EXTENSIONS[remap_index(index, &indices) as usize])
            .collect();
        assert_eq!(visible, ["GL_ARB_bar", "GL_ARB_foobar", "GL_KHR_debug"]);

        // Past the end stays past the end.
        assert!(remap_index(3, &indices) as usize >= DRIVER_EXTENSIONS.len());
    }

    #[test]
    fn test_has_extension() {
        let list = "GL_ARB_foobar GL_EXT_bar";
        assert!(!has_extension(list, "GL_ARB_foo"));
        assert!(has_extension(list, "GL_EXT_bar"));
        assert!(!has_extension(list, ""));
    }
}
