use std::fmt;

use serde::Serialize;

/// What was built, when and from which revision. Filled in by `build.rs`.
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub build_profile: &'static str,
    pub version: &'static str,
    pub package_version: &'static str,
    pub build_timestamp: &'static str,
    pub target: Option<&'static str>,
}

pub fn build_info() -> BuildInfo {
    BuildInfo {
        build_profile: env!("BUILD_PROFILE"),
        version: env!("REPO_VERSION"),
        package_version: env!("CARGO_PKG_VERSION"),
        build_timestamp: env!("BUILD_TIMESTAMP"),
        target: option_env!("BUILD_TARGET"),
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "paranoid {} ({}, {} build, {})",
            self.package_version, self.version, self.build_profile, self.build_timestamp
        )?;
        if let Some(target) = self.target {
            write!(f, " [{}]", target)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_the_package() {
        let info = build_info();
        assert!(info.to_string().starts_with("paranoid "));
        assert_eq!(info.package_version, env!("CARGO_PKG_VERSION"));
    }
}
