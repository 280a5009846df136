// wglcore/src/info.rs
//
//! OpenGL information.

/// Describes an OpenGL version, as reported by a driver or required by an extension function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct GLVersion {
    /// The major OpenGL version (e.g. 4 in 4.2).
    pub major: u8,
    /// The minor OpenGL version (e.g. 2 in 4.2).
    pub minor: u8,
}

impl GLVersion {
    /// Creates a GL version structure with the given major and minor version numbers.
    #[inline]
    pub fn new(major: u8, minor: u8) -> GLVersion {
        GLVersion { major, minor }
    }

    /// Parses the leading `major.minor` of a `GL_VERSION` string such as `"4.6.0 NVIDIA 550.54"`
    /// or `"OpenGL ES 3.2 Mesa 24.0"`.
    pub fn parse(version_string: &str) -> Option<GLVersion> {
        let version_string = version_string.trim_start_matches("OpenGL ES").trim_start();
        let mut version_string_iter = version_string.split(|c| c == '.' || c == ' ');
        let major = leading_number(version_string_iter.next()?)?;
        let minor = leading_number(version_string_iter.next()?)?;
        Some(GLVersion { major, minor })
    }

    /// Parses the version out of a `GL_VERSION_x_y` pseudo-extension name.
    pub fn from_core_token(token: &str) -> Option<GLVersion> {
        let (major, minor) = token.strip_prefix("GL_VERSION_")?.split_once('_')?;
        Some(GLVersion {
            major: major.parse().ok()?,
            minor: minor.parse().ok()?,
        })
    }
}

fn leading_number(part: &str) -> Option<u8> {
    let end = part.find(|c: char| !c.is_ascii_digit()).unwrap_or(part.len());
    part[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::GLVersion;

    #[test]
    fn test_parse_version_strings() {
        assert_eq!(GLVersion::parse("4.6.0 NVIDIA 550.54"), Some(GLVersion::new(4, 6)));
        assert_eq!(GLVersion::parse("2.1 Mesa 23.1"), Some(GLVersion::new(2, 1)));
        assert_eq!(GLVersion::parse("OpenGL ES 3.2 Mesa"), Some(GLVersion::new(3, 2)));
        assert_eq!(GLVersion::parse("3"), None);
        assert_eq!(GLVersion::parse(""), None);
    }

    #[test]
    fn test_core_tokens() {
        assert_eq!(GLVersion::from_core_token("GL_VERSION_1_2"), Some(GLVersion::new(1, 2)));
        assert_eq!(GLVersion::from_core_token("GL_ARB_multitexture"), None);
        assert!(GLVersion::new(3, 3) >= GLVersion::new(3, 0));
        assert!(GLVersion::new(2, 1) < GLVersion::new(3, 0));
    }
}
