use std::sync::LazyLock;

use regex::Regex;

use super::{FALLBACK_ORIGIN, HostProfile};

pub static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:https?://)?(?:www\.)?uqload\.(?:to|com|cx|co|io|net)/").unwrap()
});

/// Uqload serves its files as `https://<node>/<hash>/v.mp4`.
pub static LEGACY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s"'<>]+/v\.mp4"#).unwrap());

pub static UQLOAD: HostProfile = HostProfile {
    name: "uqload",
    url_regex: Some(&URL_REGEX),
    brand: Some("uqload"),
    fallback_origin: FALLBACK_ORIGIN,
    mirror_rewrites: &[("uqload.to", "uqload.cx"), ("uqload.com", "uqload.cx")],
    legacy_pattern: Some(&LEGACY_REGEX),
};
