//! Host-specific rules layered on top of the generic pipeline.

use std::sync::LazyLock;

use regex::Regex;

use super::utils::host_label;

pub mod uqload;

pub use uqload::UQLOAD;

/// Referer/Origin used when an embed URL cannot be parsed.
pub const FALLBACK_ORIGIN: &str = "https://uqload.cx";

/// Everything the pipeline needs to know about one video host.
#[derive(Debug)]
pub struct HostProfile {
    pub name: &'static str,
    /// Matches embed URLs served by this host. `None` matches nothing.
    pub url_regex: Option<&'static LazyLock<Regex>>,
    /// Lower-case brand substring: page chrome containing it is not a title,
    /// and sniffed URLs containing it are trusted.
    pub brand: Option<&'static str>,
    /// Referer/Origin when the embed URL does not parse.
    pub fallback_origin: &'static str,
    /// Mirror domains rewritten to the canonical one before fetching.
    pub mirror_rewrites: &'static [(&'static str, &'static str)],
    /// Fixed media path shape specific to this host.
    pub legacy_pattern: Option<&'static LazyLock<Regex>>,
}

/// Profile for hosts without dedicated rules.
pub static GENERIC: HostProfile = HostProfile {
    name: "generic",
    url_regex: None,
    brand: None,
    fallback_origin: FALLBACK_ORIGIN,
    mirror_rewrites: &[],
    legacy_pattern: None,
};

/// Known hosts, in matching order.
pub static PROFILES: &[&HostProfile] = &[&UQLOAD];

impl HostProfile {
    pub fn matches(&self, url: &str) -> bool {
        self.url_regex.is_some_and(|re| re.is_match(url))
    }

    /// Rewrites known mirror domains to the canonical one.
    pub fn normalize_url(&self, url: &str) -> String {
        self.mirror_rewrites
            .iter()
            .fold(url.to_owned(), |acc, (from, to)| acc.replace(from, to))
    }

    /// Substrings a brute-force URL must contain one of to be accepted.
    pub fn sniff_allowlist(&self) -> Vec<&'static str> {
        let mut allowlist = Vec::with_capacity(3);
        if let Some(brand) = self.brand {
            allowlist.push(brand);
        }
        allowlist.extend(["cdn", "stream"]);
        allowlist
    }

    /// Brand that marks page chrome for `url`: the profile's own, otherwise
    /// the site name of the URL's domain.
    pub fn brand_for(&self, url: &str) -> Option<String> {
        self.brand
            .map(ToOwned::to_owned)
            .or_else(|| host_label(url))
    }
}

/// Finds the profile for an embed URL, falling back to [`GENERIC`].
pub fn profile_for(url: &str) -> &'static HostProfile {
    PROFILES
        .iter()
        .copied()
        .find(|profile| profile.matches(url))
        .unwrap_or(&GENERIC)
}
