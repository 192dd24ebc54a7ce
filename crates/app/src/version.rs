use std::fmt;

/// Build metadata captured by the build script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildInfo {
    pub package_version: &'static str,
    pub version: &'static str,
    pub build_profile: &'static str,
    pub rust_version: &'static str,
    pub target: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            package_version: env!("CARGO_PKG_VERSION"),
            version: env!("REPO_VERSION"),
            build_profile: env!("BUILD_PROFILE"),
            rust_version: env!("RUST_VERSION"),
            target: env!("BUILD_TARGET"),
        }
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tasklist {} ({}, {} build for {}, {})",
            self.package_version, self.version, self.build_profile, self.target, self.rust_version
        )
    }
}
