use regex::Regex;
use url::Url;

use crate::error::{Error, Result};

/// Parse a video ID from the common YouTube URL shapes or a raw ID.
pub fn parse_video_id(input: &str) -> Result<String> {
    let input = input.trim();

    // Raw video ID (11 characters, alphanumeric + _ -)
    let id_regex = Regex::new(r"^[0-9A-Za-z_-]{11}$").unwrap();
    if id_regex.is_match(input) {
        return Ok(input.to_string());
    }

    let patterns = [
        r"(?:youtube\.com|youtu\.be)/(?:watch\?.*?v=|embed/|v/|shorts/|live/)?([0-9A-Za-z_-]{11})",
        r"youtu\.be/([0-9A-Za-z_-]{11})",
    ];
    for pattern in patterns {
        let re = Regex::new(pattern).unwrap();
        if let Some(caps) = re.captures(input) {
            if let Some(id) = caps.get(1) {
                return Ok(id.as_str().to_string());
            }
        }
    }

    Err(Error::InvalidUrl(input.to_string()))
}

/// Channel ID straight from a `/channel/<id>` URL, no request needed.
pub(crate) fn channel_id_from_path(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let mut segments = parsed.path_segments()?;
    segments
        .find(|segment| *segment == "channel")
        .and_then(|_| segments.next())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Channel ID from a channel page's HTML: the canonical link when
/// present, the `externalId` field otherwise.
pub(crate) fn extract_channel_id(html: &str) -> Option<String> {
    let canonical =
        Regex::new(r#"<link rel="canonical" href="https://www\.youtube\.com/channel/([^"]+)">"#)
            .unwrap();
    if let Some(caps) = canonical.captures(html) {
        return Some(caps[1].to_string());
    }
    let external_id = Regex::new(r#""externalId":"([^"]+)""#).unwrap();
    external_id.captures(html).map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_video_id() {
        assert_eq!(parse_video_id("dQw4w9WgXcQ").unwrap(), "dQw4w9WgXcQ");
        assert_eq!(
            parse_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            parse_video_id("https://youtu.be/dQw4w9WgXcQ").unwrap(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            parse_video_id("https://www.youtube.com/shorts/abcdefghijk").unwrap(),
            "abcdefghijk"
        );
        assert!(parse_video_id("invalid").is_err());
    }

    #[test]
    fn test_channel_id_from_path() {
        assert_eq!(
            channel_id_from_path("https://youtube.com/channel/UC123abc/?qs=test").as_deref(),
            Some("UC123abc")
        );
        assert_eq!(channel_id_from_path("https://youtube.com/@handle"), None);
        assert_eq!(channel_id_from_path("not a url"), None);
    }

    #[test]
    fn test_extract_channel_id_from_canonical_link() {
        let html = r#"<head><link rel="canonical" href="https://www.youtube.com/channel/UC9rtYzWLlYRfbYjDUDsVmUg"></head>"#;
        assert_eq!(
            extract_channel_id(html).as_deref(),
            Some("UC9rtYzWLlYRfbYjDUDsVmUg")
        );
    }

    #[test]
    fn test_extract_channel_id_from_external_id() {
        let html = r#"<script>var config = {"externalId":"UC6ewEyR2ZNTS7_oOeyQSXsQ","other":1};</script>"#;
        assert_eq!(
            extract_channel_id(html).as_deref(),
            Some("UC6ewEyR2ZNTS7_oOeyQSXsQ")
        );
    }

    #[test]
    fn test_extract_channel_id_not_found() {
        assert_eq!(extract_channel_id("<html></html>"), None);
    }
}
