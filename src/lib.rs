//! Batch-oriented YouTube Data API v3 client.
//!
//! Wraps the Data API plus two external tools (a live-chat scraper and a
//! transcription downloader) behind one interface, hiding the API's
//! pagination, batching, and quota quirks:
//!
//! - multi-ID lookups are chunked into requests of at most 50 IDs;
//! - paginated endpoints are followed to exhaustion, lazily, as
//!   [`futures::Stream`]s;
//! - a pool of API keys is rotated through when a key runs out of quota,
//!   and a key found exhausted stays excluded for the client's lifetime.
//!
//! ```no_run
//! use futures::TryStreamExt;
//! use youtool::YouTube;
//!
//! # async fn example() -> youtool::Result<()> {
//! let yt = YouTube::new(vec![std::env::var("YOUTUBE_API_KEY").unwrap()])?;
//! let channel_id = yt
//!     .channel_id_from_url("https://youtube.com/c/PythonicCafe")
//!     .await?;
//! let playlists = yt.channel_playlists(&channel_id);
//! futures::pin_mut!(playlists);
//! while let Some(playlist) = playlists.try_next().await? {
//!     println!("{} ({:?} videos)", playlist.id, playlist.videos);
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod keypool;
mod livechat;
mod models;
mod resolve;
mod search;
mod transcription;
mod transport;
mod vtt;

pub use client::YouTube;
pub use error::{Error, Result};
pub use keypool::KeyPool;
pub use models::{Channel, ChatMessage, Comment, Playlist, Video, VideoCategory};
pub use resolve::parse_video_id;
pub use search::{SearchParams, SEARCH_TOPICS};
pub use transcription::TranscriptionStatus;
pub use transport::{HttpTransport, Transport};
pub use vtt::simplify_vtt;
