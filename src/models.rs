use chrono::{DateTime, TimeZone, Utc};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// Strip NUL bytes (YouTube occasionally embeds them) and trim.
pub(crate) fn clean(value: &str) -> String {
    value.replace('\u{0}', "").trim().to_string()
}

fn clean_field(item: &Value, key: &str) -> Option<String> {
    item.get(key).and_then(|v| v.as_str()).map(clean)
}

/// Counts come back as JSON strings in most resources, as numbers in a few.
fn count_field(item: &Value, key: &str) -> Option<u64> {
    let value = item.get(key)?;
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

fn datetime_field(item: &Value, key: &str) -> Option<DateTime<Utc>> {
    parse_datetime(item.get(key)?.as_str()?)
}

/// RFC 3339 timestamps, e.g. `2022-01-15T01:02:03Z`.
pub(crate) fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Microseconds since the Unix epoch (live-chat message timestamps).
pub(crate) fn parse_timestamp_micros(value: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_micros(value).single()
}

/// ISO 8601 duration (`PT4M13S`, `P1DT2H`) to seconds.
pub(crate) fn parse_duration_seconds(value: &str) -> Option<f64> {
    let re = Regex::new(r"^P(?:(\d+)W)?(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?)?$")
        .unwrap();
    let caps = re.captures(value.trim())?;
    let number = |i: usize| {
        caps.get(i)
            .map(|m| m.as_str().parse::<f64>().unwrap_or(0.0))
            .unwrap_or(0.0)
    };
    let seconds = number(1) * 604_800.0
        + number(2) * 86_400.0
        + number(3) * 3_600.0
        + number(4) * 60.0
        + number(5);
    Some(seconds)
}

fn required_str(item: &Value, key: &str, what: &str) -> Result<String> {
    item.get(key)
        .and_then(|v| v.as_str())
        .map(clean)
        .ok_or_else(|| Error::UnexpectedResponse(format!("missing {key} in {what} item")))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Channel {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub custom_username: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub thumbnail_url: Option<String>,
    pub views: Option<u64>,
    pub subscribers: Option<u64>,
    pub videos: Option<u64>,
    /// ID of the channel's "uploads" playlist.
    pub playlist_id: Option<String>,
}

impl Channel {
    pub(crate) fn from_api_item(item: &Value) -> Result<Self> {
        let snippet = item.get("snippet").cloned().unwrap_or_default();
        let stats = item.get("statistics").cloned().unwrap_or_default();
        Ok(Self {
            id: required_str(item, "id", "channel")?,
            title: clean_field(&snippet, "title"),
            description: clean_field(&snippet, "description"),
            custom_username: clean_field(&snippet, "customUrl"),
            published_at: datetime_field(&snippet, "publishedAt"),
            thumbnail_url: snippet
                .pointer("/thumbnails/default/url")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            views: count_field(&stats, "viewCount"),
            subscribers: count_field(&stats, "subscriberCount"),
            videos: count_field(&stats, "videoCount"),
            playlist_id: item
                .pointer("/contentDetails/relatedPlaylists/uploads")
                .and_then(|v| v.as_str())
                .map(str::to_string),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Playlist {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub videos: Option<u64>,
    pub channel_id: Option<String>,
    pub channel_title: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub thumbnail_url: Option<String>,
}

impl Playlist {
    pub(crate) fn from_api_item(item: &Value) -> Result<Self> {
        let snippet = item.get("snippet").cloned().unwrap_or_default();
        Ok(Self {
            id: required_str(item, "id", "playlist")?,
            title: clean_field(&snippet, "title"),
            description: clean_field(&snippet, "description"),
            videos: item
                .get("contentDetails")
                .and_then(|d| count_field(d, "itemCount")),
            channel_id: clean_field(&snippet, "channelId"),
            channel_title: clean_field(&snippet, "channelTitle"),
            published_at: datetime_field(&snippet, "publishedAt"),
            thumbnail_url: snippet
                .pointer("/thumbnails/default/url")
                .and_then(|v| v.as_str())
                .map(str::to_string),
        })
    }
}

/// One video, as shaped by whichever resource produced it.
///
/// `videos` items carry the full surface; `playlistItems` add playlist
/// attribution; `search` results only carry the snippet, so most fields
/// stay `None` for those.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Video {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Duration in seconds.
    pub duration: Option<f64>,
    pub definition: Option<String>,
    pub status: Option<String>,
    pub views: Option<u64>,
    pub likes: Option<u64>,
    pub dislikes: Option<u64>,
    pub favorites: Option<u64>,
    pub comments: Option<u64>,
    pub scheduled_to: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub concurrent_viewers: Option<u64>,
    /// Channel that owns the video (for playlist items, the video's
    /// author, not the playlist owner).
    pub channel_id: Option<String>,
    pub channel_title: Option<String>,
    pub playlist_channel_id: Option<String>,
    pub playlist_channel_title: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub added_to_playlist_at: Option<DateTime<Utc>>,
    pub tags: Option<Vec<String>>,
}

impl Video {
    pub(crate) fn from_api_item(item: &Value) -> Result<Self> {
        let snippet = item.get("snippet").cloned().unwrap_or_default();
        let stats = item.get("statistics").cloned().unwrap_or_default();
        let live = item.get("liveStreamingDetails").cloned().unwrap_or_default();
        let content = item.get("contentDetails").cloned().unwrap_or_default();
        let kind = item.get("kind").and_then(|v| v.as_str()).unwrap_or("");

        let id;
        let channel_id;
        let channel_title;
        let mut playlist_channel_id = None;
        let mut playlist_channel_title = None;
        let mut added_to_playlist_at = None;
        let published_at;

        match kind {
            "youtube#video" => {
                id = required_str(item, "id", "video")?;
                channel_id = clean_field(&snippet, "channelId");
                channel_title = clean_field(&snippet, "channelTitle");
                published_at = datetime_field(&snippet, "publishedAt");
            }
            "youtube#playlistItem" => {
                let resource = snippet.get("resourceId").cloned().unwrap_or_default();
                let resource_kind = resource.get("kind").and_then(|v| v.as_str());
                if resource_kind != Some("youtube#video") {
                    return Err(Error::UnexpectedResponse(format!(
                        "expected a video as playlist item, found {resource:?}"
                    )));
                }
                id = required_str(&resource, "videoId", "playlist item")?;
                channel_id = clean_field(&snippet, "videoOwnerChannelId");
                channel_title = clean_field(&snippet, "videoOwnerChannelTitle");
                playlist_channel_id = clean_field(&snippet, "channelId");
                playlist_channel_title = clean_field(&snippet, "channelTitle");
                added_to_playlist_at = datetime_field(&snippet, "publishedAt");
                published_at = datetime_field(&content, "videoPublishedAt");
            }
            "youtube#searchResult" => {
                id = item
                    .pointer("/id/videoId")
                    .and_then(|v| v.as_str())
                    .map(clean)
                    .ok_or_else(|| {
                        Error::UnexpectedResponse("missing id.videoId in search result".into())
                    })?;
                channel_id = clean_field(&snippet, "channelId");
                channel_title = clean_field(&snippet, "channelTitle");
                published_at = datetime_field(&snippet, "publishedAt");
            }
            other => {
                return Err(Error::UnexpectedResponse(format!(
                    "unknown kind of video to parse: {other:?}"
                )));
            }
        }

        Ok(Self {
            id,
            title: clean_field(&snippet, "title"),
            description: clean_field(&snippet, "description"),
            duration: content
                .get("duration")
                .and_then(|v| v.as_str())
                .and_then(parse_duration_seconds),
            definition: clean_field(&content, "definition"),
            status: item
                .get("status")
                .and_then(|s| clean_field(s, "privacyStatus")),
            views: count_field(&stats, "viewCount"),
            likes: count_field(&stats, "likeCount"),
            dislikes: count_field(&stats, "dislikeCount"),
            favorites: count_field(&stats, "favoriteCount"),
            comments: count_field(&stats, "commentCount"),
            scheduled_to: datetime_field(&live, "scheduledStartTime"),
            started_at: datetime_field(&live, "actualStartTime"),
            finished_at: datetime_field(&live, "actualEndTime"),
            concurrent_viewers: count_field(&live, "concurrentViewers"),
            channel_id,
            channel_title,
            playlist_channel_id,
            playlist_channel_title,
            published_at,
            added_to_playlist_at,
            tags: snippet.get("tags").and_then(|v| v.as_array()).map(|tags| {
                tags.iter()
                    .filter_map(|t| t.as_str())
                    .map(clean)
                    .collect()
            }),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub id: String,
    /// Set for replies, `None` for top-level comments.
    pub parent_id: Option<String>,
    pub video_id: Option<String>,
    pub text: Option<String>,
    pub author: Option<String>,
    pub author_profile_image_url: Option<String>,
    pub author_channel_id: Option<String>,
    pub likes: Option<u64>,
    pub published_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Reply count of the thread; only set on top-level comments.
    pub replies: Option<u64>,
}

impl Comment {
    pub(crate) fn from_api_item(item: &Value, replies: Option<u64>) -> Result<Self> {
        let snippet = item.get("snippet").cloned().unwrap_or_default();
        Ok(Self {
            id: required_str(item, "id", "comment")?,
            parent_id: clean_field(&snippet, "parentId"),
            video_id: clean_field(&snippet, "videoId"),
            text: clean_field(&snippet, "textOriginal"),
            author: clean_field(&snippet, "authorDisplayName"),
            author_profile_image_url: clean_field(&snippet, "authorProfileImageUrl"),
            author_channel_id: snippet
                .pointer("/authorChannelId/value")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            likes: count_field(&snippet, "likeCount"),
            published_at: datetime_field(&snippet, "publishedAt"),
            updated_at: datetime_field(&snippet, "updatedAt"),
            replies,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoCategory {
    pub id: u64,
    pub title: Option<String>,
    pub assignable: bool,
    pub channel_id: Option<String>,
}

impl VideoCategory {
    pub(crate) fn from_api_item(item: &Value) -> Result<Self> {
        let snippet = item.get("snippet").cloned().unwrap_or_default();
        let id = item
            .get("id")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| Error::UnexpectedResponse("missing id in category item".into()))?;
        Ok(Self {
            id,
            title: clean_field(&snippet, "title"),
            assignable: snippet
                .get("assignable")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
            channel_id: clean_field(&snippet, "channelId"),
        })
    }
}

/// One live-chat or superchat message, as produced by the chat scraper.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub id: String,
    pub video_id: String,
    pub created_at: Option<DateTime<Utc>>,
    /// Message type, e.g. `text_message` or `paid_message`.
    pub kind: Option<String>,
    pub action: Option<String>,
    /// Offset into the video, in seconds.
    pub video_time: Option<f64>,
    pub author: Option<String>,
    pub author_id: Option<String>,
    pub author_image_url: Option<String>,
    pub text: Option<String>,
    pub money_currency: Option<String>,
    pub money_amount: Option<f64>,
}
