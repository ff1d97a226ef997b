//! Platform detection for solc release assets.

use solx_core::{Error, Result, Version};

/// Supported platforms for solc binaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Linux (static binary asset)
    Linux,
    /// macOS (source tarball asset, built locally)
    MacOs,
    /// Windows (zip archive asset)
    Windows,
}

/// How an asset for a platform is turned into an installed binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStrategy {
    /// Download the raw binary and mark it executable.
    DirectBinary,
    /// Download a zip archive, extract into a directory-style install.
    ZipExtract,
    /// Download a source tarball and run the upstream build.
    BuildFromSource,
}

impl Platform {
    /// Detect the current platform.
    pub fn current() -> Result<Self> {
        match std::env::consts::OS {
            "linux" => Ok(Self::Linux),
            "macos" => Ok(Self::MacOs),
            "windows" => Ok(Self::Windows),
            os => Err(Error::UnsupportedPlatform {
                os: os.to_string(),
                arch: std::env::consts::ARCH.to_string(),
            }),
        }
    }

    /// The regular expression matched against release-asset names to
    /// decide whether a release is available for this platform.
    pub fn asset_pattern(&self) -> &'static str {
        match self {
            Self::Linux => r"^solc-static-linux$",
            Self::MacOs => r"^solidity_\d+\.\d+\.\d+\.tar\.gz$",
            Self::Windows => r"^solidity-windows\.zip$",
        }
    }

    /// The install strategy dispatched on by the coordinator.
    ///
    /// Selected once per process together with the platform itself,
    /// never re-branched per call.
    pub fn install_strategy(&self) -> InstallStrategy {
        match self {
            Self::Linux => InstallStrategy::DirectBinary,
            Self::MacOs => InstallStrategy::BuildFromSource,
            Self::Windows => InstallStrategy::ZipExtract,
        }
    }

    /// The downloadable asset name for a given version.
    pub fn asset_name(&self, version: &Version) -> String {
        match self {
            Self::Linux => "solc-static-linux".to_string(),
            Self::MacOs => format!("solidity_{}.tar.gz", version),
            Self::Windows => "solidity-windows.zip".to_string(),
        }
    }

    /// Whether installs are directory-style (binary at a fixed relative
    /// path inside the entry) rather than a single file.
    pub fn uses_install_dir(&self) -> bool {
        matches!(self, Self::Windows)
    }

    /// Get a human-readable display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::MacOs => "macos",
            Self::Windows => "windows",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Construct the download URL for a release asset.
pub fn asset_download_url(version: &Version, asset: &str) -> String {
    format!(
        "https://github.com/ethereum/solidity/releases/download/{}/{}",
        version.tag(),
        asset
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_detection() {
        // Supported on all CI/dev hosts we run on
        if cfg!(target_os = "linux") || cfg!(target_os = "macos") || cfg!(target_os = "windows") {
            assert!(Platform::current().is_ok());
        }
    }

    #[test]
    fn test_asset_patterns_match_asset_names() {
        let version: Version = "0.8.1".parse().unwrap();
        for platform in [Platform::Linux, Platform::MacOs, Platform::Windows] {
            let pattern = regex_lite::Regex::new(platform.asset_pattern()).unwrap();
            assert!(
                pattern.is_match(&platform.asset_name(&version)),
                "pattern should accept its own asset name for {}",
                platform
            );
        }
    }

    #[test]
    fn test_macos_pattern_rejects_windows_asset() {
        let pattern = regex_lite::Regex::new(Platform::MacOs.asset_pattern()).unwrap();
        assert!(!pattern.is_match("solidity-windows.zip"));
        assert!(!pattern.is_match("solc-static-linux"));
        assert!(pattern.is_match("solidity_0.6.12.tar.gz"));
    }

    #[test]
    fn test_asset_download_url() {
        let version: Version = "0.8.1".parse().unwrap();
        assert_eq!(
            asset_download_url(&version, "solc-static-linux"),
            "https://github.com/ethereum/solidity/releases/download/v0.8.1/solc-static-linux"
        );
    }

    #[test]
    fn test_strategy_dispatch() {
        assert_eq!(Platform::Linux.install_strategy(), InstallStrategy::DirectBinary);
        assert_eq!(Platform::MacOs.install_strategy(), InstallStrategy::BuildFromSource);
        assert_eq!(Platform::Windows.install_strategy(), InstallStrategy::ZipExtract);
        assert!(Platform::Windows.uses_install_dir());
        assert!(!Platform::Linux.uses_install_dir());
    }
}
