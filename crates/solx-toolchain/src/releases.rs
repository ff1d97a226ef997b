//! Release catalog: the upstream solc release feed.
//!
//! Queries the GitHub releases API for ethereum/solidity, filtered to
//! releases carrying an asset for the current platform. The scan is
//! bounded: it stops once the minimum supported version tag is seen.

use crate::platform::Platform;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::Client;
use serde::Deserialize;
use solx_core::{EnvVars, Error, Fix, Result, Version, MINIMUM_SOLC_VERSION};
use tracing::debug;

const RELEASES_URL: &str = "https://api.github.com/repos/ethereum/solidity/releases";
const PER_PAGE: u32 = 100;

/// A release object from the feed.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// A downloadable asset attached to a release.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

#[derive(Debug, Deserialize)]
struct FeedMessage {
    #[serde(default)]
    message: String,
}

/// List the solc versions available for a platform, newest first.
///
/// Each returned version is guaranteed to have a release asset matching
/// the platform's asset pattern. Pagination stops at the minimum
/// supported version tag, so the scan is bounded.
pub async fn available_versions(client: &Client, platform: Platform) -> Result<Vec<Version>> {
    let pattern = regex_lite::Regex::new(platform.asset_pattern())
        .map_err(|e| Error::config(format!("invalid asset pattern: {}", e)))?;
    let headers = auth_headers();

    let mut versions = Vec::new();
    let mut page = 1;

    'pages: loop {
        let releases = fetch_page(client, &headers, page).await?;
        if releases.is_empty() {
            break;
        }

        for release in &releases {
            if release.assets.iter().any(|a| pattern.is_match(&a.name)) {
                if let Ok(version) = release.tag_name.parse::<Version>() {
                    versions.push(version);
                }
            }
            if release.tag_name == MINIMUM_SOLC_VERSION.tag() {
                break 'pages;
            }
        }

        page += 1;
    }

    debug!(
        count = versions.len(),
        platform = %platform,
        "Fetched available solc versions"
    );
    Ok(versions)
}

async fn fetch_page(client: &Client, headers: &HeaderMap, page: u32) -> Result<Vec<Release>> {
    let url = format!("{}?per_page={}&page={}", RELEASES_URL, PER_PAGE, page);
    debug!("Fetching release feed page {}", page);

    let response = client
        .get(&url)
        .headers(headers.clone())
        .send()
        .await
        .map_err(|e| Error::config(format!("failed to query solc release feed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        let message = response
            .json::<FeedMessage>()
            .await
            .map(|m| m.message)
            .unwrap_or_default();
        return Err(catalog_fetch_error(status.as_u16(), message));
    }

    response
        .json::<Vec<Release>>()
        .await
        .map_err(|e| Error::config(format!("failed to parse solc release feed: {}", e)))
}

const RATE_LIMIT_GUIDANCE: &str =
    "If this issue persists, generate a GitHub API token and store it as the \
     environment variable `GITHUB_TOKEN` to raise the rate limit: \
     https://github.blog/2013-05-16-personal-api-tokens/";

/// Build the error for a failed feed query.
///
/// Rate-limit rejections (403) carry the token guidance in the message
/// itself, so it survives plain `to_string()` rendering, as well as in
/// the structured fixes.
fn catalog_fetch_error(status: u16, mut message: String) -> Error {
    let fixes = if status == 403 {
        if !message.is_empty() && !message.ends_with('.') {
            message.push('.');
        }
        if !message.is_empty() {
            message.push(' ');
        }
        message.push_str(RATE_LIMIT_GUIDANCE);
        vec![Fix::new(RATE_LIMIT_GUIDANCE)]
    } else {
        vec![]
    };

    Error::CatalogFetch {
        status,
        message,
        fixes,
    }
}

/// Headers sent with every feed request.
///
/// A `GITHUB_TOKEN` from the environment is injected as a Basic auth
/// header to raise the unauthenticated rate limit.
pub fn auth_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static("solx"));

    if let Ok(token) = std::env::var(EnvVars::GITHUB_TOKEN) {
        let encoded = base64::engine::general_purpose::STANDARD.encode(token.as_bytes());
        if let Ok(value) = HeaderValue::from_str(&format!("Basic {}", encoded)) {
            headers.insert(AUTHORIZATION, value);
        }
    }

    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_deserialization() {
        let payload = r#"[
            {
                "tag_name": "v0.8.1",
                "assets": [
                    {"name": "solc-static-linux",
                     "browser_download_url": "https://example.invalid/solc-static-linux"},
                    {"name": "solidity-windows.zip",
                     "browser_download_url": "https://example.invalid/solidity-windows.zip"}
                ]
            },
            {"tag_name": "v0.8.0", "assets": []}
        ]"#;

        let releases: Vec<Release> = serde_json::from_str(payload).unwrap();
        assert_eq!(releases.len(), 2);
        assert_eq!(releases[0].tag_name, "v0.8.1");
        assert_eq!(releases[0].assets.len(), 2);
        assert!(releases[1].assets.is_empty());
    }

    #[test]
    fn test_platform_filtering() {
        let pattern = regex_lite::Regex::new(Platform::Linux.asset_pattern()).unwrap();
        let release = Release {
            tag_name: "v0.8.0".into(),
            assets: vec![ReleaseAsset {
                name: "solidity-windows.zip".into(),
                browser_download_url: String::new(),
            }],
        };
        // A windows-only release is invisible on linux
        assert!(!release.assets.iter().any(|a| pattern.is_match(&a.name)));
    }

    #[test]
    fn test_auth_headers_always_carry_user_agent() {
        let headers = auth_headers();
        assert!(headers.contains_key(USER_AGENT));
    }

    #[test]
    fn test_rate_limit_guidance_lands_in_the_message() {
        let err = catalog_fetch_error(403, "API rate limit exceeded".into());
        assert!(err.to_string().contains("GITHUB_TOKEN"));
        assert!(!err.fixes().is_empty());

        // Other statuses get no guidance
        let err = catalog_fetch_error(500, "server error".into());
        assert!(!err.to_string().contains("GITHUB_TOKEN"));
        assert!(err.fixes().is_empty());
    }
}
