use regex::Regex;
use url::{Host, Url};

#[inline]
pub fn capture_group_1<'a>(re: &Regex, input: &'a str) -> Option<&'a str> {
    re.captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Group 1 when the pattern has one, otherwise the whole match.
#[inline]
pub fn capture_group_1_or_whole<'a>(re: &Regex, input: &'a str) -> Option<&'a str> {
    re.captures(input)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(0)))
        .map(|m| m.as_str())
}

/// Strips the quote characters a loose pattern may have swallowed.
pub fn strip_quotes(value: &str) -> String {
    value.replace(['"', '\''], "")
}

/// `scheme://host` of a URL, if it parses and has a host.
pub fn origin_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(format!("{}://{}", parsed.scheme(), host))
}

const SECOND_LEVEL: &[&str] = &["co", "com", "net", "org", "ac", "gov", "edu"];

/// Lower-case site name of a URL's domain: `vidhost` for
/// `https://www.vidhost.example/e/1`. `None` for IP hosts and unparsable URLs.
pub fn host_label(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let Some(Host::Domain(domain)) = parsed.host() else {
        return None;
    };
    let labels: Vec<&str> = domain.split('.').filter(|l| !l.is_empty()).collect();
    let label = match labels.as_slice() {
        [] => return None,
        [only] => *only,
        // second-level public suffixes such as `co.uk`
        [.., name, second, tld]
            if tld.len() == 2 && SECOND_LEVEL.contains(second) && *name != "www" =>
        {
            *name
        }
        [.., name, _tld] => *name,
    };
    Some(label.to_ascii_lowercase())
}
