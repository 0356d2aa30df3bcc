//! Request headers some streaming sites insist on.

use crate::source::Headers;

/// Desktop browser user agent accepted by the supported sites.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/111.0.0.0 Safari/537.36";

/// Names accepted by [`by_name`].
pub const PRESET_NAMES: &[&str] = &["bilibili"];

/// Bilibili live CDN refuses requests without its referer.
pub fn bilibili() -> Headers {
    Headers::from([
        ("referer".to_string(), "https://live.bilibili.com/".to_string()),
        ("user-agent".to_string(), BROWSER_USER_AGENT.to_string()),
    ])
}

/// Look a preset up by its (case-insensitive) name.
pub fn by_name(name: &str) -> Option<Headers> {
    match name.to_ascii_lowercase().as_str() {
        "bilibili" | "bili" => Some(bilibili()),
        _ => None,
    }
}
