use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use futures::stream::{self, Stream, StreamExt, TryStreamExt};
use serde_json::Value;
use url::Url;

use crate::error::{Error, Result};
use crate::keypool::KeyPool;
use crate::livechat;
use crate::models::{Channel, ChatMessage, Comment, Playlist, Video, VideoCategory};
use crate::resolve;
use crate::search::SearchParams;
use crate::transcription::{self, TranscriptionStatus};
use crate::transport::{HttpTransport, Transport};

const BASE_URL: &str = "https://youtube.googleapis.com/youtube/v3/";

/// Per-request maximum for multi-ID lookups and page size, documented by
/// the Data API. A protocol constant, not a tunable.
const MAX_RESULTS: usize = 50;

/// YouTube Data API v3 client.
///
/// Owns a pool of API keys and rotates through it: when a request fails
/// because the current key is over quota or invalid, the same request is
/// retried with the next key. A key found exhausted stays excluded for
/// the lifetime of the client. When every key has been excluded,
/// operations fail with [`Error::PoolExhausted`].
///
/// All listing operations return lazy streams: pages are fetched as the
/// stream is polled, and multi-ID lookups are chunked into requests of at
/// most 50 IDs.
///
/// # Example
///
/// ```no_run
/// use futures::TryStreamExt;
/// use youtool::YouTube;
///
/// # async fn example() -> youtool::Result<()> {
/// let yt = YouTube::new(vec!["key1".into(), "key2".into()])?;
/// let channel_id = yt.channel_id_from_url("https://youtube.com/c/PythonicCafe").await?;
/// let playlists: Vec<_> = yt.channel_playlists(&channel_id).try_collect().await?;
/// # Ok(())
/// # }
/// ```
pub struct YouTube {
    transport: Box<dyn Transport>,
    keys: Mutex<KeyPool>,
    base_url: Url,
    chat_downloader_bin: String,
    ytdlp_bin: String,
}

impl YouTube {
    pub fn new(api_keys: Vec<String>) -> Result<Self> {
        Self::with_transport(api_keys, Box::new(HttpTransport::new()?))
    }

    /// Build a client over a custom [`Transport`].
    pub fn with_transport(api_keys: Vec<String>, transport: Box<dyn Transport>) -> Result<Self> {
        Ok(Self {
            transport,
            keys: Mutex::new(KeyPool::new(api_keys)?),
            base_url: Url::parse(BASE_URL)?,
            chat_downloader_bin: livechat::DEFAULT_BIN.to_string(),
            ytdlp_bin: transcription::DEFAULT_BIN.to_string(),
        })
    }

    /// Override the live-chat scraper binary (default `chat_downloader`).
    pub fn with_chat_downloader(mut self, bin: impl Into<String>) -> Self {
        self.chat_downloader_bin = bin.into();
        self
    }

    /// Override the transcription downloader binary (default `yt-dlp`).
    pub fn with_ytdlp(mut self, bin: impl Into<String>) -> Self {
        self.ytdlp_bin = bin.into();
        self
    }

    /// One API call, rotating keys until it succeeds or the pool runs out.
    async fn request(&self, path: &str, params: &[(String, String)]) -> Result<Value> {
        let url = self.base_url.join(path)?;
        loop {
            let key = {
                let pool = self.keys.lock().unwrap();
                pool.current().map(str::to_string)
            }
            .ok_or(Error::PoolExhausted)?;

            let mut query = vec![
                ("key".to_string(), key.clone()),
                ("maxResults".to_string(), MAX_RESULTS.to_string()),
            ];
            query.extend_from_slice(params);

            tracing::debug!(path, "API request");
            let data = self.transport.get_json(url.as_str(), &query).await?;

            let Some(error) = data.get("error") else {
                return Ok(data);
            };
            let code = error.get("code").and_then(|v| v.as_u64()).unwrap_or(0);
            let reason = error
                .pointer("/errors/0/reason")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            if Error::reason_is_credential(&reason) {
                tracing::warn!(%reason, "API key rejected, rotating to the next one");
                let mut pool = self.keys.lock().unwrap();
                // Only advance if nobody else already excluded this key
                if pool.current() == Some(key.as_str()) {
                    pool.advance();
                }
                continue;
            }
            let message = error
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            return Err(Error::Api {
                code,
                reason,
                message,
            });
        }
    }

    /// Lazy stream of raw items from a paginated endpoint, following
    /// `nextPageToken` until a response carries none.
    fn paginate(
        &self,
        path: &'static str,
        params: Vec<(String, String)>,
    ) -> impl Stream<Item = Result<Value>> + '_ {
        struct PageState {
            params: Vec<(String, String)>,
            next_token: Option<String>,
            first: bool,
        }

        let state = PageState {
            params,
            next_token: None,
            first: true,
        };
        stream::try_unfold(state, move |mut state| async move {
            if !state.first && state.next_token.is_none() {
                return Ok::<_, crate::error::Error>(None);
            }
            let mut params = state.params.clone();
            if let Some(token) = state.next_token.take() {
                params.push(("pageToken".to_string(), token));
            }
            let data = self.request(path, &params).await?;
            // An empty first page with no token is a valid empty sequence
            let items = data
                .get("items")
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default();
            state.first = false;
            state.next_token = data
                .get("nextPageToken")
                .and_then(|v| v.as_str())
                .map(str::to_string);
            Ok(Some((items, state)))
        })
        .map_ok(|items| stream::iter(items.into_iter().map(Ok)))
        .try_flatten()
    }

    /// Lazy stream of `(chunk_ids, items)` pairs for a multi-ID endpoint,
    /// one request per chunk of at most [`MAX_RESULTS`] IDs, in input
    /// order. IDs the upstream left out are simply missing from `items`.
    fn batched(
        &self,
        path: &'static str,
        params: Vec<(String, String)>,
        ids: Vec<String>,
    ) -> impl Stream<Item = Result<(Vec<String>, Vec<Value>)>> + '_ {
        let chunks: Vec<Vec<String>> = ids.chunks(MAX_RESULTS).map(|c| c.to_vec()).collect();
        stream::iter(chunks).then(move |chunk| {
            let mut params = params.clone();
            params.push(("id".to_string(), chunk.join(",")));
            async move {
                let data = self.request(path, &params).await?;
                let items = data
                    .get("items")
                    .and_then(|v| v.as_array())
                    .cloned()
                    .unwrap_or_default();
                Ok((chunk, items))
            }
        })
    }

    /// Resolve a channel URL to its channel ID, scraping the page when
    /// the ID is not already part of the URL.
    pub async fn channel_id_from_url(&self, url: &str) -> Result<String> {
        if let Some(id) = resolve::channel_id_from_path(url) {
            return Ok(id);
        }
        let html = self.transport.get_html(url).await?;
        resolve::extract_channel_id(&html).ok_or_else(|| Error::ChannelNotFound(url.to_string()))
    }

    /// Resolve an old-style username (the API's `forUsername` parameter)
    /// to a channel ID. Does not work for `/c/...` or `/@handle` URLs;
    /// use [`YouTube::channel_id_from_url`] for those.
    pub async fn channel_id_from_username(&self, username: &str) -> Result<String> {
        let params = vec![
            ("part".to_string(), "id".to_string()),
            ("forUsername".to_string(), username.to_string()),
        ];
        let data = self.request("channels", &params).await?;
        data.pointer("/items/0/id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| Error::ChannelNotFound(username.to_string()))
    }

    /// Video categories available in a region.
    pub async fn categories(&self, region_code: &str) -> Result<Vec<VideoCategory>> {
        let params = vec![("regionCode".to_string(), region_code.to_string())];
        let data = self.request("videoCategories", &params).await?;
        data.get("items")
            .and_then(|v| v.as_array())
            .map(|items| items.iter().map(VideoCategory::from_api_item).collect())
            .unwrap_or_else(|| Ok(vec![]))
    }

    /// Most popular videos, optionally scoped to a region and category.
    pub fn most_popular<'a>(
        &'a self,
        region_code: Option<&str>,
        category_id: Option<&str>,
    ) -> impl Stream<Item = Result<Video>> + 'a {
        let mut params = vec![
            (
                "part".to_string(),
                "contentDetails,statistics,liveStreamingDetails,snippet,status".to_string(),
            ),
            ("chart".to_string(), "mostPopular".to_string()),
        ];
        if let Some(category_id) = category_id {
            params.push(("videoCategoryId".to_string(), category_id.to_string()));
        }
        if let Some(region_code) = region_code {
            params.push(("regionCode".to_string(), region_code.to_string()));
        }
        self.paginate("videos", params)
            .and_then(|item| async move { Video::from_api_item(&item) })
    }

    /// Channel records for a list of channel IDs, in input order. IDs the
    /// API does not know are omitted from the output.
    pub fn channels_info(&self, channels_ids: Vec<String>) -> impl Stream<Item = Result<Channel>> + '_ {
        let params = vec![(
            "part".to_string(),
            "snippet,contentDetails,statistics".to_string(),
        )];
        self.batched("channels", params, channels_ids)
            .map_ok(|(chunk_ids, items)| {
                let mut by_id: HashMap<String, Value> = HashMap::new();
                for item in items {
                    if let Some(id) = item.get("id").and_then(|v| v.as_str()) {
                        by_id.insert(id.to_string(), item);
                    }
                }
                let records: Vec<Result<Channel>> = chunk_ids
                    .iter()
                    .filter_map(|id| by_id.remove(id))
                    .map(|item| Channel::from_api_item(&item))
                    .collect();
                stream::iter(records)
            })
            .try_flatten()
    }

    /// Playlists owned by a channel.
    pub fn channel_playlists<'a>(
        &'a self,
        channel_id: &str,
    ) -> impl Stream<Item = Result<Playlist>> + 'a {
        let params = vec![
            ("part".to_string(), "contentDetails,snippet".to_string()),
            ("channelId".to_string(), channel_id.to_string()),
        ];
        self.paginate("playlists", params)
            .and_then(|item| async move { Playlist::from_api_item(&item) })
    }

    /// Videos of a playlist. Playlist items carry less detail than the
    /// `videos` resource; see [`Video`] for which fields stay empty.
    pub fn playlist_videos<'a>(
        &'a self,
        playlist_id: &str,
    ) -> impl Stream<Item = Result<Video>> + 'a {
        let params = vec![
            ("part".to_string(), "contentDetails,snippet,status".to_string()),
            ("playlistId".to_string(), playlist_id.to_string()),
        ];
        self.paginate("playlistItems", params)
            .and_then(|item| async move { Video::from_api_item(&item) })
    }

    /// Video records for a list of video IDs, in chunks of at most 50.
    /// Upstream per-chunk ordering is preserved; unknown IDs are omitted.
    pub fn videos_info(&self, videos_ids: Vec<String>) -> impl Stream<Item = Result<Video>> + '_ {
        let params = vec![(
            "part".to_string(),
            "contentDetails,statistics,liveStreamingDetails,snippet,status".to_string(),
        )];
        self.batched("videos", params, videos_ids)
            .map_ok(|(_, items)| {
                let records: Vec<Result<Video>> =
                    items.iter().map(Video::from_api_item).collect();
                stream::iter(records)
            })
            .try_flatten()
    }

    /// Comment threads of a video: each top-level comment (carrying its
    /// thread's reply count) followed by its replies.
    pub fn video_comments<'a>(
        &'a self,
        video_id: &str,
    ) -> impl Stream<Item = Result<Comment>> + 'a {
        let params = vec![
            ("part".to_string(), "id,replies,snippet".to_string()),
            ("videoId".to_string(), video_id.to_string()),
        ];
        self.paginate("commentThreads", params)
            .map_ok(|item| {
                let mut records: Vec<Result<Comment>> = Vec::new();
                let reply_count = item
                    .pointer("/snippet/totalReplyCount")
                    .and_then(|v| v.as_u64());
                if let Some(top) = item.pointer("/snippet/topLevelComment") {
                    records.push(Comment::from_api_item(top, reply_count));
                }
                if let Some(replies) = item.pointer("/replies/comments").and_then(|v| v.as_array())
                {
                    records.extend(replies.iter().map(|reply| Comment::from_api_item(reply, None)));
                }
                stream::iter(records)
            })
            .try_flatten()
    }

    /// Search for videos. Parameters are validated before the first
    /// request; see [`SearchParams`]. Search results carry only snippet
    /// data, so most [`Video`] fields stay empty.
    pub fn video_search(
        &self,
        search: &SearchParams,
    ) -> Result<impl Stream<Item = Result<Video>> + '_> {
        let params = search.to_query()?;
        Ok(self
            .paginate("search", params)
            .and_then(|item| async move { Video::from_api_item(&item) }))
    }

    /// Live-chat and superchat messages of a video, streamed from the
    /// external chat scraper. `expand_emojis` replaces emoji shortcuts in
    /// message text with their emoji identifiers.
    pub fn video_livechat(
        &self,
        video_id: &str,
        expand_emojis: bool,
    ) -> impl Stream<Item = Result<ChatMessage>> {
        livechat::stream_chat(&self.chat_downloader_bin, video_id, expand_emojis)
    }

    /// Download auto-generated transcriptions for a list of videos into
    /// `dir`, named `<video_id>.<language>.vtt`. Tool failures never
    /// abort the run; each ID is reported with the path of its file, or
    /// `None` when nothing was downloaded.
    pub async fn videos_transcriptions(
        &self,
        videos_ids: &[String],
        language_code: &str,
        dir: &Path,
        skip_downloaded: bool,
    ) -> Vec<TranscriptionStatus> {
        transcription::download(&self.ytdlp_bin, videos_ids, language_code, dir, skip_downloaded)
            .await
    }
}
