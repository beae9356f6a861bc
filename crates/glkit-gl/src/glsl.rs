//! GLSL version detection.

use glium::{Api, CapabilitiesSource, Version};
use glkit_core::glsl::{VersionDirective, DESKTOP_VERSIONS};

/// Highest desktop GLSL version the context reports, as a directive.
pub fn best_glsl_version(ctx: &impl CapabilitiesSource) -> Option<VersionDirective> {
    best_desktop_version(&ctx.get_capabilities().supported_glsl_versions)
}

/// Highest desktop entry of `versions` that names a real GLSL version.
pub fn best_desktop_version(versions: &[Version]) -> Option<VersionDirective> {
    versions
        .iter()
        .filter_map(|v| match v {
            Version(Api::Gl, major, minor) => Some(u16::from(*major) * 100 + u16::from(*minor) * 10),
            Version(Api::GlEs, ..) => None,
        })
        .filter(|number| DESKTOP_VERSIONS.contains(number))
        .max()
        .map(VersionDirective::core)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_highest_desktop_version() {
        let versions = [
            Version(Api::Gl, 1, 2),
            Version(Api::Gl, 3, 3),
            Version(Api::GlEs, 3, 2),
            Version(Api::Gl, 1, 5),
        ];
        let best = best_desktop_version(&versions).unwrap();
        assert_eq!(best.number, 330);
        assert_eq!(best.to_string(), "#version 330 core");
    }

    #[test]
    fn old_contexts_omit_the_profile() {
        let best = best_desktop_version(&[Version(Api::Gl, 1, 2)]).unwrap();
        assert_eq!(best.to_string(), "#version 120");
    }

    #[test]
    fn es_only_has_no_desktop_version() {
        assert_eq!(best_desktop_version(&[Version(Api::GlEs, 3, 0)]), None);
    }
}
