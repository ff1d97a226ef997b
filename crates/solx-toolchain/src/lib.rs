//! solc version management.
//!
//! Direct solc binary downloads and version management. This crate
//! provides:
//! - Platform detection and install-strategy selection
//! - The upstream release catalog, filtered by platform asset
//! - Pragma-style version range selection
//! - Cross-process locked installation with verification
//! - The installed-version registry and active-version selection

pub mod install;
pub mod lock;
pub mod platform;
pub mod progress;
pub mod range;
pub mod registry;
pub mod releases;

pub use install::{InstallCoordinator, InstallOptions};
pub use lock::{InstallLock, InstallLockGuard};
pub use platform::{asset_download_url, InstallStrategy, Platform};
pub use range::{ComparatorSet, Constraint, Range, RangeParseError};
pub use registry::{install_root, VersionRegistry};
pub use releases::{available_versions, Release, ReleaseAsset};
