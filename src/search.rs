use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;

use crate::error::{Error, Result};

/// Freebase topic IDs accepted by the search endpoint, keyed by the
/// human-readable names from the API documentation.
pub const SEARCH_TOPICS: &[(&str, &str)] = &[
    ("Music (parent topic)", "/m/04rlf"),
    ("Christian music", "/m/02mscn"),
    ("Classical music", "/m/0ggq0m"),
    ("Country", "/m/01lyv"),
    ("Electronic music", "/m/02lkt"),
    ("Hip hop music", "/m/0glt670"),
    ("Independent music", "/m/05rwpb"),
    ("Jazz", "/m/03_d0"),
    ("Music of Asia", "/m/028sqc"),
    ("Music of Latin America", "/m/0g293"),
    ("Pop music", "/m/064t9"),
    ("Reggae", "/m/06cqb"),
    ("Rhythm and blues", "/m/06j6l"),
    ("Rock music", "/m/06by7"),
    ("Soul music", "/m/0gywn"),
    ("Gaming (parent topic)", "/m/0bzvm2"),
    ("Action game", "/m/025zzc"),
    ("Action-adventure game", "/m/02ntfj"),
    ("Casual game", "/m/0b1vjn"),
    ("Music video game", "/m/02hygl"),
    ("Puzzle video game", "/m/04q1x3q"),
    ("Racing video game", "/m/01sjng"),
    ("Role-playing video game", "/m/0403l3g"),
    ("Simulation video game", "/m/021bp2"),
    ("Sports game", "/m/022dc6"),
    ("Strategy video game", "/m/03hf_rm"),
    ("Sports (parent topic)", "/m/06ntj"),
    ("American football", "/m/0jm_"),
    ("Baseball", "/m/018jz"),
    ("Basketball", "/m/018w8"),
    ("Boxing", "/m/01cgz"),
    ("Cricket", "/m/09xp_"),
    ("Football", "/m/02vx4"),
    ("Golf", "/m/037hz"),
    ("Ice hockey", "/m/03tmr"),
    ("Mixed martial arts", "/m/01h7lh"),
    ("Motorsport", "/m/0410tth"),
    ("Tennis", "/m/07bs0"),
    ("Volleyball", "/m/07_53"),
    ("Entertainment (parent topic)", "/m/02jjt"),
    ("Humor", "/m/09kqc"),
    ("Movies", "/m/02vxn"),
    ("Performing arts", "/m/05qjc"),
    ("Professional wrestling", "/m/066wd"),
    ("TV shows", "/m/0f2f9"),
    ("Lifestyle (parent topic)", "/m/019_rr"),
    ("Fashion", "/m/032tl"),
    ("Fitness", "/m/027x7n"),
    ("Food", "/m/02wbm"),
    ("Hobby", "/m/03glg"),
    ("Pets", "/m/068hy"),
    ("Physical attractiveness [Beauty]", "/m/041xxh"),
    ("Technology", "/m/07c1v"),
    ("Tourism", "/m/07bxq"),
    ("Vehicles", "/m/07yv9"),
    ("Society (parent topic)", "/m/098wr"),
    ("Business", "/m/09s1f"),
    ("Health", "/m/0kt51"),
    ("Military", "/m/01h6rj"),
    ("Politics", "/m/05qt0"),
    ("Religion", "/m/06bvp"),
    ("Knowledge", "/m/01k8wb"),
];

/// Parameters for a video search.
///
/// Values are validated against the documented enumerations and then
/// passed through as opaque query parameters; their semantics belong to
/// the API. See <https://developers.google.com/youtube/v3/docs/search/list>.
#[derive(Debug, Clone)]
pub struct SearchParams {
    /// Free-text search term.
    pub term: Option<String>,
    /// ISO 3166-1 alpha-2 region code.
    pub region_code: Option<String>,
    /// ISO 639-1 relevance-language code.
    pub language_code: Option<String>,
    pub published_after: Option<DateTime<Utc>>,
    pub published_before: Option<DateTime<Utc>>,
    /// One of: date, rating, relevance, title, videoCount, viewCount.
    pub order: String,
    pub channel_id: Option<String>,
    pub channel_type: Option<String>,
    pub event_type: Option<String>,
    /// Topic name from [`SEARCH_TOPICS`].
    pub topic: Option<String>,
    pub video_type: Option<String>,
    /// (latitude, longitude); requires `location_radius`.
    pub location: Option<(f64, f64)>,
    /// Float plus unit, e.g. `1.2km` (m, km, ft or mi).
    pub location_radius: Option<String>,
    pub safe_search: Option<String>,
    pub video_caption: Option<String>,
    pub video_definition: Option<String>,
    pub video_dimension: Option<String>,
    pub video_embeddable: Option<String>,
    pub video_paid_product_placement: Option<String>,
    pub video_syndicated: Option<String>,
    pub video_license: Option<String>,
    pub video_category_id: Option<String>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            term: None,
            region_code: None,
            language_code: None,
            published_after: None,
            published_before: None,
            order: "date".to_string(),
            channel_id: None,
            channel_type: None,
            event_type: None,
            topic: None,
            video_type: None,
            location: None,
            location_radius: None,
            safe_search: None,
            video_caption: None,
            video_definition: None,
            video_dimension: None,
            video_embeddable: None,
            video_paid_product_placement: None,
            video_syndicated: None,
            video_license: None,
            video_category_id: None,
        }
    }
}

impl SearchParams {
    pub fn terms(term: impl Into<String>) -> Self {
        Self {
            term: Some(term.into()),
            ..Self::default()
        }
    }

    fn check_enum(name: &str, value: &str, allowed: &[&str]) -> Result<()> {
        if allowed.contains(&value) {
            Ok(())
        } else {
            Err(Error::InvalidArgument(format!(
                "{name} must be one of: {}",
                allowed.join(", ")
            )))
        }
    }

    pub(crate) fn to_query(&self) -> Result<Vec<(String, String)>> {
        Self::check_enum(
            "order",
            &self.order,
            &["date", "rating", "relevance", "title", "videoCount", "viewCount"],
        )?;

        let mut params = vec![
            ("type".to_string(), "video".to_string()),
            ("part".to_string(), "snippet".to_string()),
            ("order".to_string(), self.order.clone()),
        ];
        let mut push = |key: &str, value: String| params.push((key.to_string(), value));

        if let Some(term) = self.term.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            push("q", term.to_string());
        }
        if let Some(region) = &self.region_code {
            push("regionCode", region.clone());
        }
        if let Some(language) = &self.language_code {
            push("relevanceLanguage", language.clone());
        }
        if let Some(since) = &self.published_after {
            push("publishedAfter", since.to_rfc3339_opts(SecondsFormat::Secs, true));
        }
        if let Some(until) = &self.published_before {
            push("publishedBefore", until.to_rfc3339_opts(SecondsFormat::Secs, true));
        }
        if let Some(channel_id) = &self.channel_id {
            push("channelId", channel_id.clone());
        }
        if let Some(channel_type) = &self.channel_type {
            Self::check_enum("channel_type", channel_type, &["any", "show"])?;
            push("channelType", channel_type.clone());
        }
        if let Some(event_type) = &self.event_type {
            if self.channel_type.is_none() {
                return Err(Error::InvalidArgument(
                    "channel_type must be specified if event_type is provided".to_string(),
                ));
            }
            Self::check_enum("event_type", event_type, &["completed", "live", "upcoming"])?;
            push("eventType", event_type.clone());
        }
        if let Some(topic) = &self.topic {
            let id = SEARCH_TOPICS
                .iter()
                .find(|(name, _)| name == topic)
                .map(|(_, id)| *id)
                .ok_or_else(|| {
                    Error::InvalidArgument(format!(
                        "unknown topic {topic:?}, see SEARCH_TOPICS for the accepted names"
                    ))
                })?;
            push("topicId", id.to_string());
        }
        if let Some(video_type) = &self.video_type {
            Self::check_enum("video_type", video_type, &["any", "movie", "episode"])?;
            push("videoType", video_type.clone());
        }
        match (&self.location, &self.location_radius) {
            (None, None) => {}
            (Some((lat, long)), Some(radius)) => {
                let radius_re = Regex::new(r"^[0-9.]+(?:m|km|ft|mi)$").unwrap();
                if !radius_re.is_match(radius) {
                    return Err(Error::InvalidArgument(
                        "location_radius must be a float followed by a unit (m, km, ft or mi), like '1.2km'"
                            .to_string(),
                    ));
                }
                push("location", format!("{lat},{long}"));
                push("locationRadius", radius.clone());
            }
            _ => {
                return Err(Error::InvalidArgument(
                    "both location and location_radius must be specified".to_string(),
                ));
            }
        }
        if let Some(safe_search) = &self.safe_search {
            Self::check_enum("safe_search", safe_search, &["moderate", "none", "strict"])?;
            push("safeSearch", safe_search.clone());
        }
        if let Some(caption) = &self.video_caption {
            Self::check_enum("video_caption", caption, &["any", "closedCaption", "none"])?;
            push("videoCaption", caption.clone());
        }
        if let Some(definition) = &self.video_definition {
            Self::check_enum("video_definition", definition, &["any", "high", "standard"])?;
            push("videoDefinition", definition.clone());
        }
        if let Some(dimension) = &self.video_dimension {
            Self::check_enum("video_dimension", dimension, &["2d", "3d", "any"])?;
            push("videoDimension", dimension.clone());
        }
        if let Some(embeddable) = &self.video_embeddable {
            Self::check_enum("video_embeddable", embeddable, &["any", "true"])?;
            push("videoEmbeddable", embeddable.clone());
        }
        if let Some(paid) = &self.video_paid_product_placement {
            Self::check_enum("video_paid_product_placement", paid, &["any", "true"])?;
            push("videoPaidProductPlacement", paid.clone());
        }
        if let Some(syndicated) = &self.video_syndicated {
            Self::check_enum("video_syndicated", syndicated, &["any", "true"])?;
            push("videoSyndicated", syndicated.clone());
        }
        if let Some(license) = &self.video_license {
            Self::check_enum("video_license", license, &["any", "creativeCommons", "youtube"])?;
            push("videoLicense", license.clone());
        }
        if let Some(category_id) = &self.video_category_id {
            push("videoCategoryId", category_id.clone());
        }

        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn query(params: &SearchParams) -> Vec<(String, String)> {
        params.to_query().unwrap()
    }

    fn get<'a>(query: &'a [(String, String)], key: &str) -> Option<&'a str> {
        query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_defaults() {
        let q = query(&SearchParams::default());
        assert_eq!(get(&q, "type"), Some("video"));
        assert_eq!(get(&q, "part"), Some("snippet"));
        assert_eq!(get(&q, "order"), Some("date"));
        assert_eq!(get(&q, "q"), None);
    }

    #[test]
    fn test_term_is_trimmed_and_blank_term_dropped() {
        let q = query(&SearchParams::terms("  rust  "));
        assert_eq!(get(&q, "q"), Some("rust"));
        let q = query(&SearchParams::terms("   "));
        assert_eq!(get(&q, "q"), None);
    }

    #[test]
    fn test_published_bounds_are_rfc3339() {
        let params = SearchParams {
            published_after: Some(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()),
            ..SearchParams::default()
        };
        let q = query(&params);
        assert_eq!(get(&q, "publishedAfter"), Some("2023-01-01T00:00:00Z"));
    }

    #[test]
    fn test_invalid_order() {
        let params = SearchParams {
            order: "popularity".to_string(),
            ..SearchParams::default()
        };
        assert!(matches!(params.to_query(), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_event_type_requires_channel_type() {
        let params = SearchParams {
            event_type: Some("live".to_string()),
            ..SearchParams::default()
        };
        assert!(matches!(params.to_query(), Err(Error::InvalidArgument(_))));

        let params = SearchParams {
            event_type: Some("live".to_string()),
            channel_type: Some("any".to_string()),
            ..SearchParams::default()
        };
        let q = query(&params);
        assert_eq!(get(&q, "eventType"), Some("live"));
    }

    #[test]
    fn test_topic_name_maps_to_id() {
        let params = SearchParams {
            topic: Some("Jazz".to_string()),
            ..SearchParams::default()
        };
        assert_eq!(get(&query(&params), "topicId"), Some("/m/03_d0"));

        let params = SearchParams {
            topic: Some("Polka".to_string()),
            ..SearchParams::default()
        };
        assert!(matches!(params.to_query(), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_location_requires_radius() {
        let params = SearchParams {
            location: Some((-23.55, -46.63)),
            ..SearchParams::default()
        };
        assert!(matches!(params.to_query(), Err(Error::InvalidArgument(_))));

        let params = SearchParams {
            location: Some((-23.55, -46.63)),
            location_radius: Some("10km".to_string()),
            ..SearchParams::default()
        };
        let q = query(&params);
        assert_eq!(get(&q, "location"), Some("-23.55,-46.63"));
        assert_eq!(get(&q, "locationRadius"), Some("10km"));
    }

    #[test]
    fn test_bad_location_radius() {
        let params = SearchParams {
            location: Some((0.0, 0.0)),
            location_radius: Some("10 km".to_string()),
            ..SearchParams::default()
        };
        assert!(matches!(params.to_query(), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_enumerated_filters() {
        let params = SearchParams {
            safe_search: Some("strict".to_string()),
            video_definition: Some("high".to_string()),
            video_license: Some("creativeCommons".to_string()),
            ..SearchParams::default()
        };
        let q = query(&params);
        assert_eq!(get(&q, "safeSearch"), Some("strict"));
        assert_eq!(get(&q, "videoDefinition"), Some("high"));
        assert_eq!(get(&q, "videoLicense"), Some("creativeCommons"));

        let params = SearchParams {
            safe_search: Some("off".to_string()),
            ..SearchParams::default()
        };
        assert!(matches!(params.to_query(), Err(Error::InvalidArgument(_))));
    }
}
