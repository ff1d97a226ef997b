//! Installed-version registry and active-version selection.
//!
//! The registry is an explicit value owning the install root and the
//! per-process active selection. The active version starts unset, may be
//! set explicitly or implicitly by the first successful install, and is
//! never persisted across processes.

use crate::platform::Platform;
use crate::range::Range;
use crate::releases;
use reqwest::Client;
use solx_core::{CommandRunner, EnvVars, Error, Result, Version};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Prefix for install-root entries, e.g. `solc-v0.8.1`.
const ENTRY_PREFIX: &str = "solc-";

/// Resolve the install root directory.
///
/// Precedence: `SOLX_BINARY_PATH`, then an explicit override, then the
/// per-user default `~/.solx`. The directory is created if missing.
pub fn install_root(override_path: Option<&Path>) -> Result<PathBuf> {
    let root = if let Ok(env_path) = std::env::var(EnvVars::SOLX_BINARY_PATH) {
        PathBuf::from(env_path)
    } else if let Some(path) = override_path {
        path.to_path_buf()
    } else {
        let base = directories::BaseDirs::new()
            .ok_or_else(|| Error::config("could not determine home directory"))?;
        base.home_dir().join(".solx")
    };

    fs::create_dir_all(&root).map_err(|e| Error::Io {
        message: "failed to create install root".into(),
        path: Some(root.clone()),
        source: e,
    })?;
    Ok(root)
}

/// Registry of installed solc versions plus the active selection.
#[derive(Debug)]
pub struct VersionRegistry {
    root: PathBuf,
    platform: Platform,
    active: Option<Version>,
}

impl VersionRegistry {
    /// Create a registry over an install root.
    pub fn new(root: impl Into<PathBuf>, platform: Platform) -> Self {
        Self {
            root: root.into(),
            platform,
            active: None,
        }
    }

    /// The install root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The install-root entry for a version (file or directory).
    pub fn entry_path(&self, version: &Version) -> PathBuf {
        self.root.join(format!("{}{}", ENTRY_PREFIX, version.tag()))
    }

    /// The executable path for a version.
    ///
    /// On Windows installs are directory-style with the binary at a
    /// fixed relative path inside the entry.
    pub fn executable_path(&self, version: &Version) -> PathBuf {
        let entry = self.entry_path(version);
        if self.platform.uses_install_dir() {
            entry.join("solc.exe")
        } else {
            entry
        }
    }

    /// The executable for a version, failing if it is not installed.
    pub fn executable(&self, version: &Version) -> Result<PathBuf> {
        let path = self.executable_path(version);
        if !path.exists() {
            return Err(Error::not_installed(version.to_string()));
        }
        Ok(path)
    }

    /// The executable for the active version.
    pub fn active_executable(&self) -> Result<PathBuf> {
        let version = self.active.as_ref().ok_or_else(|| {
            let fix = solx_core::Fix::with_command(
                "Install a solc version first",
                "solx install <version>",
            );
            Error::NotInstalled {
                version: "<none selected>".into(),
                fixes: vec![fix],
            }
        })?;
        self.executable(version)
    }

    /// Check whether a version is installed.
    pub fn is_installed(&self, version: &Version) -> bool {
        self.executable_path(version).exists()
    }

    /// Scan the install root for installed versions, oldest first.
    ///
    /// Entries that don't follow the `solc-v<version>` convention are
    /// ignored. Readers during an in-progress install may observe a
    /// partial entry; only read-after-complete-write is reliable.
    pub fn installed(&self) -> Result<Vec<Version>> {
        let mut versions = Vec::new();
        let entries = fs::read_dir(&self.root).map_err(|e| Error::Io {
            message: "failed to read install root".into(),
            path: Some(self.root.clone()),
            source: e,
        })?;

        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(tag) = name.strip_prefix(ENTRY_PREFIX) else {
                continue;
            };
            if !tag.starts_with('v') {
                continue;
            }
            if let Ok(version) = tag.parse::<Version>() {
                versions.push(version);
            }
        }

        versions.sort();
        Ok(versions)
    }

    /// Get the active version, if one is selected.
    pub fn active(&self) -> Option<&Version> {
        self.active.as_ref()
    }

    /// Set the active version, validating it against the installed set.
    pub fn set_active(&mut self, version: Version) -> Result<()> {
        self.executable(&version)?;
        info!("Using solc version {}", version);
        self.active = Some(version);
        Ok(())
    }

    /// Set the active version implicitly (first successful install).
    ///
    /// Does nothing when a version is already selected.
    pub(crate) fn set_active_if_unset(&mut self, version: Version) -> Result<()> {
        if self.active.is_none() {
            self.set_active(version)?;
        }
        Ok(())
    }

    /// Select the best installed version satisfying a range expression
    /// and make it active.
    pub fn set_active_by_range(&mut self, range: &Range) -> Result<Version> {
        let installed = self.installed()?;
        let selected = range.select(&installed).ok_or_else(|| {
            let fix = solx_core::Fix::with_command(
                "Install a compatible solc version",
                "solx install '<pragma>'",
            );
            Error::NotInstalled {
                version: "<no compatible version>".into(),
                fixes: vec![fix],
            }
        })?;
        self.set_active(selected.clone())?;
        Ok(selected)
    }

    /// Report (informationally) whether a newer *available* version
    /// satisfies the range. The active selection is never changed here.
    pub async fn report_newer_available(&self, client: &Client, range: &Range) -> Result<()> {
        let available = releases::available_versions(client, self.platform).await?;
        if let Some(latest) = range.select(&available) {
            if let Some(active) = &self.active {
                if latest > *active {
                    info!("Newer compatible solc version exists: {}", latest);
                }
            }
        }
        Ok(())
    }

    /// Import solc binaries already installed on the system.
    ///
    /// Copies the `solc` found on `PATH` (and, on macOS, every solc
    /// under the Homebrew cellar) into the install root. Each copy is
    /// re-verified by running `--version` afterwards; copies that no
    /// longer report the same version are removed. No-op on Windows.
    pub async fn import_installed(&self) -> Result<Vec<Version>> {
        if matches!(self.platform, Platform::Windows) {
            return Ok(vec![]);
        }

        let runner = CommandRunner::new();
        let mut candidates: Vec<PathBuf> = Vec::new();

        let which = runner.run("which", ["solc"]).await;
        if let Ok(output) = which {
            let path = output.stdout.trim();
            if output.success() && !path.is_empty() {
                candidates.push(PathBuf::from(path));
            }
        }

        if matches!(self.platform, Platform::MacOs) {
            candidates.extend(cellar_solc_binaries(Path::new("/usr/local/Cellar")));
        }

        let installed = self.installed()?;
        let mut imported = Vec::new();

        for path in candidates {
            let Some(version) = binary_version(&runner, &path).await else {
                continue;
            };
            if installed.contains(&version) || imported.contains(&version) {
                continue;
            }

            let dest = self.entry_path(&version);
            if let Err(e) = fs::copy(&path, &dest) {
                warn!("Failed to copy {}: {}", path.display(), e);
                continue;
            }

            // Confirm solc still works after being copied
            if binary_version(&runner, &dest).await.as_ref() == Some(&version) {
                info!("Imported solc {} from {}", version, path.display());
                imported.push(version);
            } else {
                let _ = fs::remove_file(&dest);
            }
        }

        Ok(imported)
    }
}

async fn binary_version(runner: &CommandRunner, path: &Path) -> Option<Version> {
    let output = runner
        .run(path.as_os_str(), [std::ffi::OsStr::new("--version")])
        .await
        .ok()
        .filter(|o| o.success())?;
    Version::from_solc_output(&output.stdout)
}

/// Find solc binaries under the Homebrew cellar (solidity*/<ver>/bin/solc).
fn cellar_solc_binaries(cellar: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let Ok(entries) = fs::read_dir(cellar) else {
        return found;
    };
    for entry in entries.flatten() {
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with("solidity") {
            continue;
        }
        collect_named(&entry.path(), "solc", &mut found, 4);
    }
    found
}

fn collect_named(dir: &Path, target: &str, found: &mut Vec<PathBuf>, depth: u8) {
    if depth == 0 {
        return;
    }
    let Ok(entries) = fs::read_dir(dir) else { return };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_named(&path, target, found, depth - 1);
        } else if path.file_name().is_some_and(|n| n == target) {
            found.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_installed_scan_ignores_foreign_entries() {
        let root = tempdir().unwrap();
        touch(&root.path().join("solc-v0.5.7"));
        touch(&root.path().join("solc-v0.8.1"));
        touch(&root.path().join("solc-vgarbage"));
        touch(&root.path().join("README"));
        fs::create_dir(root.path().join(".locks")).unwrap();

        let registry = VersionRegistry::new(root.path(), Platform::Linux);
        let installed = registry.installed().unwrap();
        assert_eq!(installed.len(), 2);
        assert_eq!(installed[0], "0.5.7".parse().unwrap());
        assert_eq!(installed[1], "0.8.1".parse().unwrap());
    }

    #[test]
    fn test_set_active_requires_installed() {
        let root = tempdir().unwrap();
        let mut registry = VersionRegistry::new(root.path(), Platform::Linux);

        let err = registry.set_active("0.8.1".parse().unwrap()).unwrap_err();
        assert!(matches!(err, Error::NotInstalled { .. }));
        assert!(registry.active().is_none());

        touch(&root.path().join("solc-v0.8.1"));
        registry.set_active("0.8.1".parse().unwrap()).unwrap();
        assert_eq!(registry.active(), Some(&"0.8.1".parse().unwrap()));
    }

    #[test]
    fn test_set_active_if_unset_is_first_writer_only() {
        let root = tempdir().unwrap();
        touch(&root.path().join("solc-v0.5.7"));
        touch(&root.path().join("solc-v0.8.1"));

        let mut registry = VersionRegistry::new(root.path(), Platform::Linux);
        registry.set_active_if_unset("0.5.7".parse().unwrap()).unwrap();
        registry.set_active_if_unset("0.8.1".parse().unwrap()).unwrap();
        assert_eq!(registry.active(), Some(&"0.5.7".parse().unwrap()));
    }

    #[test]
    fn test_set_active_by_range_picks_best_installed() {
        let root = tempdir().unwrap();
        touch(&root.path().join("solc-v0.5.0"));
        touch(&root.path().join("solc-v0.5.17"));
        touch(&root.path().join("solc-v0.6.12"));

        let mut registry = VersionRegistry::new(root.path(), Platform::Linux);
        let range = Range::parse("^0.5.0").unwrap();
        let selected = registry.set_active_by_range(&range).unwrap();
        assert_eq!(selected, "0.5.17".parse().unwrap());
        assert_eq!(registry.active(), Some(&selected));
    }

    #[test]
    fn test_windows_executable_is_inside_entry_dir() {
        let registry = VersionRegistry::new("/tmp/solx", Platform::Windows);
        let version: Version = "0.8.1".parse().unwrap();
        let exe = registry.executable_path(&version);
        assert!(exe.ends_with("solc-v0.8.1/solc.exe"));
    }
}
