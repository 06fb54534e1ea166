// HTML extraction for the ssstik.io flow

use chrono::{DateTime, Utc};
use regex::Regex;

/// Compiled patterns used to pick the token and the media link out of HTML
pub struct PagePatterns {
    token: Vec<Regex>,
    script_token: Regex,
    script_body: Regex,
    input_tag: Regex,
    input_named_tt: Regex,
    input_value: Regex,
    anchor: Regex,
    href: Regex,
    tag: Regex,
    video_id: Vec<Regex>,
}

impl PagePatterns {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            token: vec![
                Regex::new(r#"(?i)name=['"]tt['"].*?value=['"]([^'"]+)['"]"#)?,
                Regex::new(r#"(?i)tt\s*[:=]\s*['"]([^'"]+)['"]"#)?,
                Regex::new(r#"(?i)data-tt=['"]([^'"]+)['"]"#)?,
            ],
            script_token: Regex::new(r#"tt\s*[:=]\s*['"]([^'"]+)['"]"#)?,
            script_body: Regex::new(r"(?is)<script\b[^>]*>(.*?)</script>")?,
            input_tag: Regex::new(r"(?is)<input\b[^>]*>")?,
            input_named_tt: Regex::new(r#"(?i)\bname\s*=\s*(?:"tt"|'tt'|tt\b)"#)?,
            input_value: Regex::new(r#"(?i)\bvalue\s*=\s*(?:"([^"]*)"|'([^']*)')"#)?,
            anchor: Regex::new(r"(?is)<a\b([^>]*)>(.*?)</a>")?,
            href: Regex::new(r#"(?i)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)')"#)?,
            tag: Regex::new(r"(?s)<[^>]*>")?,
            video_id: vec![
                Regex::new(r"/video/(\d+)")?,
                Regex::new(r"/v/(\d+)")?,
                Regex::new(r"(\d{19})")?,
            ],
        })
    }

    /// Find the `tt` form token in the landing page
    pub fn extract_token(&self, html: &str) -> Option<String> {
        for pattern in &self.token {
            if let Some(token) = first_group(pattern, html) {
                return Some(token);
            }
        }

        // Attribute order the patterns above do not cover: <input value=".." name="tt">
        for tag in self.input_tag.find_iter(html) {
            let tag = tag.as_str();
            if !self.input_named_tt.is_match(tag) {
                continue;
            }
            if let Some(value) = first_group(&self.input_value, tag).filter(|v| !v.is_empty()) {
                return Some(decode_entities(&value));
            }
        }

        for script in self.script_body.captures_iter(html) {
            let body = script.get(1).map(|m| m.as_str()).unwrap_or_default();
            if !body.contains("tt") {
                continue;
            }
            if let Some(token) = first_group(&self.script_token, body) {
                return Some(token);
            }
        }

        None
    }

    /// Pick the media link from the API response
    ///
    /// Candidates are anchors whose href mentions `tikcdn.io` or `.mp4`. The
    /// first one labelled as watermark-free wins, otherwise the first candidate.
    pub fn select_download_link(&self, html: &str) -> Option<String> {
        let mut fallback = None;

        for anchor in self.anchor.captures_iter(html) {
            let attrs = anchor.get(1).map(|m| m.as_str()).unwrap_or_default();
            let Some(href) = first_group(&self.href, attrs).map(|h| decode_entities(&h)) else {
                continue;
            };
            if !(href.contains("tikcdn.io") || href.contains(".mp4")) {
                continue;
            }

            let inner = anchor.get(2).map(|m| m.as_str()).unwrap_or_default();
            let text = self.tag.replace_all(inner, "").to_lowercase();
            if text.contains("without") || text.contains("no watermark") {
                return Some(href);
            }
            if fallback.is_none() {
                fallback = Some(href);
            }
        }

        fallback
    }

    /// Numeric video id from a TikTok URL, if it carries one
    pub fn extract_video_id(&self, url: &str) -> Option<String> {
        self.video_id
            .iter()
            .find_map(|pattern| first_group(pattern, url))
    }
}

fn first_group(pattern: &Regex, haystack: &str) -> Option<String> {
    pattern.captures(haystack).and_then(|caps| {
        caps.iter()
            .skip(1)
            .flatten()
            .next()
            .map(|m| m.as_str().to_string())
    })
}

fn decode_entities(raw: &str) -> String {
    raw.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Make a scraped link absolute against `base_url`
pub fn absolutize(link: &str, base_url: &str) -> String {
    if let Some(rest) = link.strip_prefix("//") {
        format!("https://{}", rest)
    } else if link.starts_with('/') {
        format!("{}{}", base_url.trim_end_matches('/'), link)
    } else {
        link.to_string()
    }
}

/// `ssstik_<video_id>_<YYYYmmdd_HHMMSS>.mp4`; the id falls back to a timestamp
pub fn artifact_file_name(video_id: Option<&str>, now: DateTime<Utc>) -> String {
    let id = video_id
        .map(str::to_string)
        .unwrap_or_else(|| now.format("%Y%m%d%H%M%S").to_string());
    format!("ssstik_{}_{}.mp4", id, now.format("%Y%m%d_%H%M%S"))
}
