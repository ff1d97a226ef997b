//! solc installation.
//!
//! Downloads platform assets and places them under the install root,
//! guarded by a per-version cross-process lock. Installs are idempotent:
//! an already-installed version short-circuits without touching the
//! network.

use crate::lock::InstallLock;
use crate::platform::{asset_download_url, InstallStrategy, Platform};
use crate::progress::{DownloadProgress, Spinner};
use crate::registry::VersionRegistry;
use futures_util::StreamExt;
use reqwest::Client;
use solx_core::{CommandRunner, Error, Fix, Result, Version};
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

const BUILD_DOCS: &str =
    "https://solidity.readthedocs.io/en/v0.6.0/installing-solidity.html#binary-packages";

/// Options for installing a solc version.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Allow building 0.4.x from source on macOS despite the missing
    /// native build tooling for those versions.
    pub allow_build: bool,
    /// Show a progress bar while downloading.
    pub show_progress: bool,
    /// HTTP timeout in seconds.
    pub timeout: u64,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            allow_build: false,
            show_progress: false,
            timeout: 300, // source tarballs and static binaries are large
        }
    }
}

/// Coordinates download, placement and verification of solc versions.
#[derive(Debug)]
pub struct InstallCoordinator {
    platform: Platform,
    // Resolved once at construction, never re-branched per call.
    strategy: InstallStrategy,
}

impl InstallCoordinator {
    /// Create a coordinator for the current platform.
    pub fn new() -> Result<Self> {
        Ok(Self::for_platform(Platform::current()?))
    }

    /// Create a coordinator for an explicit platform.
    pub fn for_platform(platform: Platform) -> Self {
        Self {
            platform,
            strategy: platform.install_strategy(),
        }
    }

    /// Install a solc version into the registry's install root.
    ///
    /// Returns the path of the installed executable. If this is the
    /// first successful install of the process and no version is
    /// active yet, the new version becomes active.
    pub async fn install(
        &self,
        registry: &mut VersionRegistry,
        version: &Version,
        options: &InstallOptions,
    ) -> Result<PathBuf> {
        if !version.is_supported() {
            return Err(Error::UnsupportedVersion {
                version: version.to_string(),
                floor: solx_core::MINIMUM_SOLC_VERSION.to_string(),
            });
        }

        let lock = InstallLock::for_version(registry.root(), version)?;
        match lock.try_acquire()? {
            Some(_guard) => {
                // Guard released on every exit path, including errors.
                self.install_locked(registry, version, options).await
            }
            None => {
                // Another process is installing this version. Wait for it,
                // then re-check state; retry the whole install once if the
                // other process did not complete it.
                lock.wait().await?;
                if registry.is_installed(version) {
                    let binary = registry.executable(version)?;
                    registry.set_active_if_unset(version.clone())?;
                    info!("solc {} already installed at: {}", version, binary.display());
                    return Ok(binary);
                }
                let _guard = lock.try_acquire()?.ok_or_else(|| Error::Lock {
                    message: format!("install lock for solc {} remained contended", version),
                    source: None,
                })?;
                self.install_locked(registry, version, options).await
            }
        }
    }

    async fn install_locked(
        &self,
        registry: &mut VersionRegistry,
        version: &Version,
        options: &InstallOptions,
    ) -> Result<PathBuf> {
        // Idempotent short-circuit. A pre-existing version still becomes
        // active when nothing is selected yet.
        if registry.is_installed(version) {
            let binary = registry.executable(version)?;
            registry.set_active_if_unset(version.clone())?;
            info!("solc {} already installed at: {}", version, binary.display());
            return Ok(binary);
        }

        info!("Installing solc {} for {}", version, self.platform);

        match self.strategy {
            InstallStrategy::DirectBinary => {
                self.install_direct_binary(registry, version, options).await?
            }
            InstallStrategy::ZipExtract => {
                self.install_zip_extract(registry, version, options).await?
            }
            InstallStrategy::BuildFromSource => {
                self.install_from_source(registry, version, options).await?
            }
        }

        let binary = registry.executable(version)?;
        if let Err(e) = verify_installation(&binary, version).await {
            // No binary is left mid-state; cleanup is best-effort.
            remove_entry(&registry.entry_path(version));
            return Err(e);
        }

        registry.set_active_if_unset(version.clone())?;
        info!("solc {} successfully installed at: {}", version, binary.display());
        Ok(binary)
    }

    /// Download the raw static binary and mark it executable.
    async fn install_direct_binary(
        &self,
        registry: &VersionRegistry,
        version: &Version,
        options: &InstallOptions,
    ) -> Result<()> {
        let url = asset_download_url(version, &self.platform.asset_name(version));
        let binary_path = registry.entry_path(version);

        info!("Downloading solc {} from {}", version, url);
        download_to_file(&url, &binary_path, version, options).await?;
        chmod_executable(&binary_path)?;
        Ok(())
    }

    /// Download the zip archive, extract it, and rename the extracted
    /// folder into the install root.
    async fn install_zip_extract(
        &self,
        registry: &VersionRegistry,
        version: &Version,
        options: &InstallOptions,
    ) -> Result<()> {
        let url = asset_download_url(version, &self.platform.asset_name(version));
        let temp_dir = process_temp_dir()?;
        let archive_path = temp_dir.join("solidity-windows.zip");

        info!("Downloading solc {} from {}", version, url);
        download_to_file(&url, &archive_path, version, options).await?;

        let extract_dir = temp_dir.join("extracted");
        fs::create_dir_all(&extract_dir).map_err(|e| Error::Io {
            message: "failed to create extraction directory".into(),
            path: Some(extract_dir.clone()),
            source: e,
        })?;
        extract_zip(&archive_path, &extract_dir)?;

        fs::rename(&extract_dir, registry.entry_path(version)).map_err(|e| Error::Io {
            message: "failed to move extracted solc into install root".into(),
            path: Some(registry.entry_path(version)),
            source: e,
        })?;
        Ok(())
    }

    /// Download the source tarball and run the upstream build.
    async fn install_from_source(
        &self,
        registry: &VersionRegistry,
        version: &Version,
        options: &InstallOptions,
    ) -> Result<()> {
        if version.major == 0 && version.minor < 5 && !options.allow_build {
            return Err(Error::Config {
                message: format!(
                    "solx cannot build solc {} on macOS: native build tooling for \
                     0.4.x versions is unavailable. Install it with brew and run \
                     `solx import` to pick up the installed binary. See {} for \
                     installation instructions.",
                    version, BUILD_DOCS
                ),
                path: None,
                source: None,
                fixes: vec![Fix::with_command(
                    "Ignore this check and build anyway",
                    format!("solx install {} --allow-build", version),
                )],
            });
        }

        let url = asset_download_url(version, &self.platform.asset_name(version));
        let temp_dir = process_temp_dir()?;
        let archive_path = temp_dir.join(format!("solidity_{}.tar.gz", version));

        info!("Downloading solc {} source from {}", version, url);
        download_to_file(&url, &archive_path, version, options).await?;
        extract_tar_gz(&archive_path, &temp_dir, version)?;

        let source_dir = temp_dir.join(format!("solidity_{}", version));
        let deps_script = source_dir.join("scripts").join("install_deps.sh");

        // Dependency-install failures are not fatal: the build itself
        // decides whether anything was actually missing.
        let runner = CommandRunner::new().with_working_dir(&source_dir);
        match runner.run("sh", [deps_script.to_string_lossy().as_ref()]).await {
            Ok(output) if !output.success() => {
                warn!(
                    exit_code = output.exit_code,
                    "install_deps.sh failed; continuing with the build"
                );
            }
            Err(e) => warn!("could not run install_deps.sh: {}", e),
            Ok(_) => {}
        }

        let build_dir = source_dir.join("build");
        fs::create_dir_all(&build_dir).map_err(|e| Error::Io {
            message: "failed to create build directory".into(),
            path: Some(build_dir.clone()),
            source: e,
        })?;

        let runner = CommandRunner::new().with_working_dir(&build_dir);
        for (step, args) in [("cmake", vec![".."]), ("make", vec![])] {
            let spinner = Spinner::new(format!("Running {}...", step));
            let output = runner.run(step, args).await?;
            if !output.success() {
                spinner.finish_error(format!("{} failed", step));
                return Err(Error::Build {
                    step: step.to_string(),
                    exit_code: output.exit_code,
                    stdout: output.stdout,
                    stderr: output.stderr,
                    fixes: vec![Fix::new(format!(
                        "This is likely due to a missing or incorrect version of an \
                         external dependency. You may be able to solve this by \
                         installing the specific version using brew: {}",
                        BUILD_DOCS
                    ))],
                });
            }
            spinner.finish_success(format!("{} complete", step));
        }

        let built = build_dir.join("solc").join("solc");
        let binary_path = registry.entry_path(version);
        fs::rename(&built, &binary_path).map_err(|e| Error::Io {
            message: "failed to move built solc into install root".into(),
            path: Some(binary_path.clone()),
            source: e,
        })?;
        chmod_executable(&binary_path)?;
        Ok(())
    }
}

/// Stream a download into `<dest>.tmp`, then rename into place.
///
/// Bytes are written to disk as they arrive; progress reporting is a
/// side effect on the chunk loop and never changes the data path.
async fn download_to_file(
    url: &str,
    dest: &Path,
    version: &Version,
    options: &InstallOptions,
) -> Result<()> {
    let client = Client::builder()
        .timeout(Duration::from_secs(options.timeout))
        .user_agent("solx")
        .build()
        .map_err(|e| Error::config(format!("failed to create HTTP client: {}", e)))?;

    debug!("Downloading from {}", url);
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| Error::config(format!("failed to download solc {}: {}", version, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Download {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let total_size = response.content_length().unwrap_or(0);
    let progress = if options.show_progress && total_size > 0 {
        Some(DownloadProgress::new(
            total_size,
            format!("Downloading solc {}", version),
        ))
    } else {
        None
    };

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::Io {
            message: "failed to create download directory".into(),
            path: Some(parent.to_path_buf()),
            source: e,
        })?;
    }

    let temp_path = dest.with_extension("tmp");
    let mut file = File::create(&temp_path).map_err(|e| Error::Io {
        message: "failed to create download file".into(),
        path: Some(temp_path.clone()),
        source: e,
    })?;

    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk =
            chunk.map_err(|e| Error::config(format!("download interrupted: {}", e)))?;
        file.write_all(&chunk).map_err(|e| Error::Io {
            message: "failed to write download data".into(),
            path: Some(temp_path.clone()),
            source: e,
        })?;
        downloaded += chunk.len() as u64;
        if let Some(ref pb) = progress {
            pb.set_position(downloaded);
        }
    }

    if let Some(pb) = progress {
        pb.finish(format!(
            "Downloaded solc {} ({:.1} MB)",
            version,
            downloaded as f64 / 1_000_000.0
        ));
    }

    fs::rename(&temp_path, dest).map_err(|e| Error::Io {
        message: "failed to finalize download".into(),
        path: Some(dest.to_path_buf()),
        source: e,
    })
}

/// Verify an install by running `--version` against the binary.
async fn verify_installation(binary: &Path, expected: &Version) -> Result<()> {
    let runner = CommandRunner::new();
    let output = runner
        .run(binary.as_os_str(), [std::ffi::OsStr::new("--version")])
        .await?;

    if !output.success() {
        return Err(Error::CommandFailed {
            command: format!("{} --version", binary.display()),
            exit_code: Some(output.exit_code),
            stdout: output.stdout,
            stderr: output.stderr,
            fixes: vec![],
        });
    }

    match Version::from_solc_output(&output.stdout) {
        Some(reported) if reported == *expected => {
            debug!("Verified solc {} at {}", reported, binary.display());
        }
        Some(reported) => {
            warn!("Version mismatch: expected {}, got {}", expected, reported);
        }
        None => {
            warn!("Could not parse version from installed solc output");
        }
    }
    Ok(())
}

/// A process-scoped temporary directory, cleared if stale.
fn process_temp_dir() -> Result<PathBuf> {
    let path = std::env::temp_dir().join(format!("solx-tmp-{}", std::process::id()));
    if path.exists() {
        fs::remove_dir_all(&path).map_err(|e| Error::Io {
            message: "failed to clear stale temp directory".into(),
            path: Some(path.clone()),
            source: e,
        })?;
    }
    fs::create_dir_all(&path).map_err(|e| Error::Io {
        message: "failed to create temp directory".into(),
        path: Some(path.clone()),
        source: e,
    })?;
    Ok(path)
}

fn remove_entry(path: &Path) {
    let _ = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
}

fn chmod_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(|e| Error::Io {
            message: "failed to set executable permissions".into(),
            path: Some(path.to_path_buf()),
            source: e,
        })?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Extract a zip archive.
fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    let file = File::open(archive_path).map_err(|e| Error::Io {
        message: "failed to open archive".into(),
        path: Some(archive_path.to_path_buf()),
        source: e,
    })?;

    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| Error::config(format!("failed to read zip archive: {}", e)))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| Error::config(format!("failed to read zip entry: {}", e)))?;

        let outpath = dest_dir.join(entry.name());

        if entry.is_dir() {
            fs::create_dir_all(&outpath).map_err(|e| Error::Io {
                message: "failed to create directory".into(),
                path: Some(outpath.clone()),
                source: e,
            })?;
        } else {
            if let Some(parent) = outpath.parent() {
                fs::create_dir_all(parent).map_err(|e| Error::Io {
                    message: "failed to create parent directory".into(),
                    path: Some(parent.to_path_buf()),
                    source: e,
                })?;
            }
            let mut outfile = File::create(&outpath).map_err(|e| Error::Io {
                message: "failed to create file".into(),
                path: Some(outpath.clone()),
                source: e,
            })?;
            std::io::copy(&mut entry, &mut outfile).map_err(|e| Error::Io {
                message: "failed to write file".into(),
                path: Some(outpath),
                source: e,
            })?;
        }
    }

    Ok(())
}

/// Extract a tar.gz source archive.
fn extract_tar_gz(archive_path: &Path, dest_dir: &Path, version: &Version) -> Result<()> {
    let spinner = Spinner::new(format!("Extracting solc {} source...", version));

    let file = File::open(archive_path).map_err(|e| Error::Io {
        message: "failed to open archive".into(),
        path: Some(archive_path.to_path_buf()),
        source: e,
    })?;

    let decoder = flate2::read::GzDecoder::new(BufReader::new(file));
    let mut archive = tar::Archive::new(decoder);

    archive.unpack(dest_dir).map_err(|e| Error::Io {
        message: format!("failed to extract archive: {}", e),
        path: Some(archive_path.to_path_buf()),
        source: e,
    })?;

    spinner.finish_success(format!("Extracted solc {} source", version));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_options_default() {
        let options = InstallOptions::default();
        assert_eq!(options.timeout, 300);
        assert!(!options.allow_build);
        assert!(!options.show_progress);
    }

    #[tokio::test]
    async fn test_install_rejects_versions_below_floor() {
        let root = tempfile::tempdir().unwrap();
        let mut registry = VersionRegistry::new(root.path(), Platform::Linux);
        let coordinator = InstallCoordinator::for_platform(Platform::Linux);

        let err = coordinator
            .install(
                &mut registry,
                &"0.4.10".parse().unwrap(),
                &InstallOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion { .. }));
    }

    #[tokio::test]
    async fn test_install_short_circuits_when_already_installed() {
        let root = tempfile::tempdir().unwrap();
        let version: Version = "0.8.1".parse().unwrap();
        // A pre-existing entry means no network access is attempted
        std::fs::write(root.path().join("solc-v0.8.1"), b"#!/bin/sh\n").unwrap();

        let mut registry = VersionRegistry::new(root.path(), Platform::Linux);
        let coordinator = InstallCoordinator::for_platform(Platform::Linux);

        let path = coordinator
            .install(&mut registry, &version, &InstallOptions::default())
            .await
            .unwrap();
        assert_eq!(path, root.path().join("solc-v0.8.1"));

        // Second call is equally idempotent
        let again = coordinator
            .install(&mut registry, &version, &InstallOptions::default())
            .await
            .unwrap();
        assert_eq!(again, path);
    }

    #[tokio::test]
    async fn test_install_of_existing_version_activates_it() {
        let root = tempfile::tempdir().unwrap();
        let version: Version = "0.8.1".parse().unwrap();
        std::fs::write(root.path().join("solc-v0.8.1"), b"#!/bin/sh\n").unwrap();

        let mut registry = VersionRegistry::new(root.path(), Platform::Linux);
        let coordinator = InstallCoordinator::for_platform(Platform::Linux);
        assert!(registry.active().is_none());

        coordinator
            .install(&mut registry, &version, &InstallOptions::default())
            .await
            .unwrap();

        // First successful install selects the version even when the
        // binary was already on disk
        assert_eq!(registry.active(), Some(&version));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_install_waits_out_a_concurrent_holder() {
        let root = tempfile::tempdir().unwrap();
        let version: Version = "0.8.1".parse().unwrap();
        std::fs::write(root.path().join("solc-v0.8.1"), b"#!/bin/sh\n").unwrap();

        // A second handle holds the per-version lock, as another
        // process would during its own install
        let lock = InstallLock::for_version(root.path(), &version).unwrap();
        let guard = lock.try_acquire().unwrap().unwrap();

        let root_path = root.path().to_path_buf();
        let task_version = version.clone();
        let handle = tokio::spawn(async move {
            let mut registry = VersionRegistry::new(root_path, Platform::Linux);
            let coordinator = InstallCoordinator::for_platform(Platform::Linux);
            coordinator
                .install(&mut registry, &task_version, &InstallOptions::default())
                .await
        });

        // Give the install a chance to hit the contended lock, then
        // release it; the install re-checks state and succeeds
        std::thread::sleep(Duration::from_millis(100));
        drop(guard);

        let path = handle.await.unwrap().unwrap();
        assert_eq!(path, root.path().join("solc-v0.8.1"));
    }

    #[tokio::test]
    async fn test_source_build_rejected_for_old_versions_without_override() {
        let root = tempfile::tempdir().unwrap();
        let mut registry = VersionRegistry::new(root.path(), Platform::MacOs);
        let coordinator = InstallCoordinator::for_platform(Platform::MacOs);

        let err = coordinator
            .install(
                &mut registry,
                &"0.4.25".parse().unwrap(),
                &InstallOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("allow") || !err.fixes().is_empty());
    }
}
