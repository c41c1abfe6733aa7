use regex::Regex;

struct Caption {
    start: String,
    end: String,
    text: String,
}

/// Simplify WebVTT contents, removing per-word timing/styling tags and
/// deduplicating the rolling repeated lines YouTube auto-captions
/// produce. A repeated line extends the previous caption's end time
/// instead of being emitted again.
pub fn simplify_vtt(vtt: &str) -> String {
    let timing = Regex::new(
        r"^((?:\d{2,}:)?\d{2}:\d{2}\.\d{3})\s+-->\s+((?:\d{2,}:)?\d{2}:\d{2}\.\d{3})",
    )
    .unwrap();
    let tag = Regex::new(r"<[^>]*>").unwrap();

    let mut captions: Vec<Caption> = Vec::new();
    let mut last_line: Option<String> = None;
    // Timings of the cue currently being read; None outside cues, so
    // headers, NOTE blocks and cue identifiers never count as text
    let mut current: Option<(String, String)> = None;

    for line in vtt.lines() {
        if line.trim().is_empty() {
            current = None;
            continue;
        }
        if let Some(caps) = timing.captures(line.trim()) {
            current = Some((caps[1].to_string(), caps[2].to_string()));
            continue;
        }
        let Some((start, end)) = current.clone() else {
            continue;
        };
        let text = tag.replace_all(line, "").trim().to_string();
        if text.is_empty() {
            continue;
        }
        if last_line.as_deref() == Some(text.as_str()) {
            if let Some(previous) = captions.last_mut() {
                previous.end = end;
            }
            continue;
        }
        captions.push(Caption {
            start,
            end,
            text: text.clone(),
        });
        last_line = Some(text);
    }

    let mut out = String::from("WEBVTT\n\n");
    for caption in &captions {
        out.push_str(&format!(
            "{} --> {}\n{}\n\n",
            caption.start, caption.end, caption.text
        ));
    }
    out
}
