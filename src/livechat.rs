use std::process::Stdio;

use futures::stream::{self, Stream};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};

use crate::error::{Error, Result};
use crate::models::{clean, parse_timestamp_micros, ChatMessage};

pub(crate) const DEFAULT_BIN: &str = "chat_downloader";

fn chat_args(video_id: &str) -> Vec<String> {
    vec![
        format!("https://youtube.com/watch?v={video_id}"),
        "--message_groups".to_string(),
        "messages".to_string(),
        "superchat".to_string(),
        // One JSON object per line on stdout
        "--output".to_string(),
        "-".to_string(),
    ]
}

enum ChatState {
    Start {
        bin: String,
        video_id: String,
        expand_emojis: bool,
    },
    Running {
        lines: Lines<BufReader<ChildStdout>>,
        child: Child,
        video_id: String,
        expand_emojis: bool,
    },
}

/// Lazy stream of chat messages scraped by the external tool. The tool is
/// spawned on the first poll and reaped when its output ends.
pub(crate) fn stream_chat(
    bin: &str,
    video_id: &str,
    expand_emojis: bool,
) -> impl Stream<Item = Result<ChatMessage>> {
    let state = ChatState::Start {
        bin: bin.to_string(),
        video_id: video_id.to_string(),
        expand_emojis,
    };
    stream::try_unfold(state, |mut state| async move {
        loop {
            match state {
                ChatState::Start {
                    bin,
                    video_id,
                    expand_emojis,
                } => {
                    tracing::debug!(%bin, %video_id, "spawning chat scraper");
                    let mut child = Command::new(&bin)
                        .args(chat_args(&video_id))
                        .stdout(Stdio::piped())
                        .stderr(Stdio::null())
                        .spawn()
                        .map_err(|e| Error::ExternalTool(format!("failed to spawn {bin}: {e}")))?;
                    let stdout = child.stdout.take().ok_or_else(|| {
                        Error::ExternalTool(format!("{bin} has no captured stdout"))
                    })?;
                    state = ChatState::Running {
                        lines: BufReader::new(stdout).lines(),
                        child,
                        video_id,
                        expand_emojis,
                    };
                }
                ChatState::Running {
                    mut lines,
                    mut child,
                    video_id,
                    expand_emojis,
                } => match lines.next_line().await? {
                    Some(line) if line.trim().is_empty() => {
                        state = ChatState::Running {
                            lines,
                            child,
                            video_id,
                            expand_emojis,
                        };
                    }
                    Some(line) => {
                        let message = parse_chat_line(&video_id, &line, expand_emojis)?;
                        return Ok(Some((
                            message,
                            ChatState::Running {
                                lines,
                                child,
                                video_id,
                                expand_emojis,
                            },
                        )));
                    }
                    None => {
                        let status = child.wait().await?;
                        if !status.success() {
                            return Err(Error::ExternalTool(format!(
                                "chat scraper exited with {status}"
                            )));
                        }
                        return Ok(None);
                    }
                },
            }
        }
    })
}

/// Parse one line of the scraper's JSON output into a [`ChatMessage`].
fn parse_chat_line(video_id: &str, line: &str, expand_emojis: bool) -> Result<ChatMessage> {
    let message: Value = serde_json::from_str(line)
        .map_err(|e| Error::ExternalTool(format!("unparseable chat line: {e}")))?;
    let id = message
        .get("message_id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::ExternalTool("chat line without message_id".to_string()))?
        .to_string();

    let mut text = message
        .get("message")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    if expand_emojis {
        for emote in message
            .get("emotes")
            .and_then(|v| v.as_array())
            .into_iter()
            .flatten()
        {
            let Some(emote_id) = emote.get("id").and_then(|v| v.as_str()) else {
                continue;
            };
            for shortcut in emote
                .get("shortcuts")
                .and_then(|v| v.as_array())
                .into_iter()
                .flatten()
                .filter_map(|s| s.as_str())
            {
                text = text.replace(shortcut, emote_id);
            }
        }
    }

    let str_field = |key: &str| {
        message
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::to_string)
    };
    let author = message.get("author").cloned().unwrap_or_default();
    let money = message.get("money").cloned().unwrap_or_default();

    Ok(ChatMessage {
        id,
        video_id: video_id.to_string(),
        created_at: message
            .get("timestamp")
            .and_then(|v| v.as_i64())
            .and_then(parse_timestamp_micros),
        kind: str_field("message_type"),
        action: str_field("action_type"),
        video_time: message.get("time_in_seconds").and_then(|v| v.as_f64()),
        author: author.get("name").and_then(|v| v.as_str()).map(str::to_string),
        author_id: author.get("id").and_then(|v| v.as_str()).map(str::to_string),
        // The scraper hands out several sizes; "source" is the original
        author_image_url: author
            .get("images")
            .and_then(|v| v.as_array())
            .and_then(|images| {
                images
                    .iter()
                    .find(|img| img.get("id").and_then(|v| v.as_str()) == Some("source"))
            })
            .and_then(|img| img.get("url"))
            .and_then(|v| v.as_str())
            .map(str::to_string),
        text: Some(clean(&text)),
        money_currency: money
            .get("currency")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        money_amount: money.get("amount").and_then(|v| {
            v.as_f64()
                .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_args() {
        let args = chat_args("dQw4w9WgXcQ");
        assert_eq!(args[0], "https://youtube.com/watch?v=dQw4w9WgXcQ");
        assert!(args.contains(&"--message_groups".to_string()));
        assert!(args.contains(&"superchat".to_string()));
    }

    #[test]
    fn test_parse_chat_line() {
        let line = json!({
            "message_id": "m1",
            "message": "hello chat",
            "timestamp": 1_697_069_683_982_633i64,
            "message_type": "text_message",
            "action_type": "add_chat_item",
            "time_in_seconds": 12.5,
            "author": {
                "name": "viewer",
                "id": "UCviewer",
                "images": [
                    {"id": "32x32", "url": "https://yt3.ggpht.com/small"},
                    {"id": "source", "url": "https://yt3.ggpht.com/full"}
                ]
            }
        })
        .to_string();

        let message = parse_chat_line("vid00000000", &line, true).unwrap();
        assert_eq!(message.id, "m1");
        assert_eq!(message.video_id, "vid00000000");
        assert_eq!(message.text.as_deref(), Some("hello chat"));
        assert_eq!(message.kind.as_deref(), Some("text_message"));
        assert_eq!(message.video_time, Some(12.5));
        assert_eq!(message.author.as_deref(), Some("viewer"));
        assert_eq!(
            message.author_image_url.as_deref(),
            Some("https://yt3.ggpht.com/full")
        );
        assert_eq!(message.created_at.unwrap().timestamp(), 1_697_069_683);
        assert!(message.money_amount.is_none());
    }

    #[test]
    fn test_parse_chat_line_expands_emojis() {
        let line = json!({
            "message_id": "m2",
            "message": "nice :fire: play :fire:",
            "emotes": [{"id": "🔥", "shortcuts": [":fire:"]}]
        })
        .to_string();

        let expanded = parse_chat_line("vid", &line, true).unwrap();
        assert_eq!(expanded.text.as_deref(), Some("nice 🔥 play 🔥"));

        let raw = parse_chat_line("vid", &line, false).unwrap();
        assert_eq!(raw.text.as_deref(), Some("nice :fire: play :fire:"));
    }

    #[test]
    fn test_parse_chat_line_superchat_money() {
        let line = json!({
            "message_id": "m3",
            "message": "take my money",
            "message_type": "paid_message",
            "money": {"currency": "USD", "amount": "5.00"}
        })
        .to_string();

        let message = parse_chat_line("vid", &line, true).unwrap();
        assert_eq!(message.money_currency.as_deref(), Some("USD"));
        assert_eq!(message.money_amount, Some(5.0));
    }

    #[test]
    fn test_parse_chat_line_rejects_garbage() {
        assert!(matches!(
            parse_chat_line("vid", "not json at all", true),
            Err(Error::ExternalTool(_))
        ));
        assert!(matches!(
            parse_chat_line("vid", "{\"no_id\": true}", true),
            Err(Error::ExternalTool(_))
        ));
    }

    #[tokio::test]
    async fn test_stream_chat_missing_binary_errors() {
        use futures::TryStreamExt;

        let result: Result<Vec<ChatMessage>> =
            stream_chat("definitely-not-a-real-chat-tool", "vid00000000", true)
                .try_collect()
                .await;
        assert!(matches!(result, Err(Error::ExternalTool(_))));
    }
}
