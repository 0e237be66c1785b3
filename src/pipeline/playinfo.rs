//! Extraction of stream URLs from an item page
//!
//! Item pages embed their stream manifest as
//! `<script>window.__playinfo__={...}</script>`; the first DASH video and
//! audio representation are the streams the pipeline downloads.

use scraper::{Html, Selector};
use serde_json::Value;

const PLAYINFO_PREFIX: &str = "window.__playinfo__=";

/// Stream URLs resolved from a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUrls {
    pub video: String,
    pub audio: String,
}

/// Parses the embedded playinfo JSON, if the page has any
pub fn extract_playinfo(html: &str) -> Option<Value> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("script").ok()?;

    document
        .select(&selector)
        .map(|element| element.text().collect::<String>())
        .find_map(|text| {
            let payload = text.trim().strip_prefix(PLAYINFO_PREFIX)?;
            let payload = payload.trim().trim_end_matches(';');
            match serde_json::from_str(payload) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::debug!("Malformed playinfo JSON: {}", e);
                    None
                }
            }
        })
}

/// First `baseUrl` (or `base_url`) of `data.dash.<kind>`
fn first_stream_url(info: &Value, kind: &str) -> Option<String> {
    let stream = info.get("data")?.get("dash")?.get(kind)?.get(0)?;
    stream
        .get("baseUrl")
        .or_else(|| stream.get("base_url"))
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
}

/// Resolves both stream URLs; `None` when either is missing
pub fn extract_media_urls(html: &str) -> Option<MediaUrls> {
    let info = extract_playinfo(html)?;
    Some(MediaUrls {
        video: first_stream_url(&info, "video")?,
        audio: first_stream_url(&info, "audio")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head><title>t</title>
<script>var other = 1;</script>
<script>window.__playinfo__={"code":0,"data":{"dash":{"video":[{"baseUrl":"https://cdn.example/v.m4s"},{"baseUrl":"https://cdn.example/v2.m4s"}],"audio":[{"base_url":"https://cdn.example/a.m4s"}]}}}</script>
</head><body></body></html>"#;

    #[test]
    fn test_extract_media_urls() {
        let urls = extract_media_urls(PAGE).unwrap();
        assert_eq!(urls.video, "https://cdn.example/v.m4s");
        assert_eq!(urls.audio, "https://cdn.example/a.m4s");
    }

    #[test]
    fn test_empty_playinfo_has_no_urls() {
        let page = "<script>window.__playinfo__={}</script>";
        assert!(extract_playinfo(page).is_some());
        assert!(extract_media_urls(page).is_none());
    }

    #[test]
    fn test_invalid_json() {
        let page = "<script>window.__playinfo__=invalid_json</script>";
        assert!(extract_playinfo(page).is_none());
        assert!(extract_media_urls(page).is_none());
    }

    #[test]
    fn test_page_without_playinfo() {
        assert!(extract_media_urls("<html><body>nothing</body></html>").is_none());
        assert!(extract_media_urls("").is_none());
    }

    #[test]
    fn test_audio_missing() {
        let page = r#"<script>window.__playinfo__={"data":{"dash":{"video":[{"baseUrl":"v"}],"audio":[]}}}</script>"#;
        assert!(extract_media_urls(page).is_none());
    }
}
