//! Announcement categorization.
//!
//! Tags a post as a direct statement or third-party reporting, flags crypto
//! relevance, assigns a content type, and scores how confident the tagging is.

use sentiment_core::CategorizationConfig;
use sentiment_data::TimestampedEvent;
use std::cmp::Ordering;

/// Content type assigned to crypto-related announcements.
pub const CRYPTO_CONTENT_TYPE: &str = "crypto";

/// Tags derived from an announcement's text.
#[derive(Debug, Clone, PartialEq)]
pub struct Categorization {
    pub is_direct: bool,
    pub is_crypto: bool,
    pub content_type: String,
    /// In [0, 1]
    pub confidence_score: f64,
}

impl Categorization {
    /// Whether the announcement is worth keeping: direct, or confident enough.
    #[must_use]
    pub fn is_relevant(&self, config: &CategorizationConfig) -> bool {
        self.is_direct || self.confidence_score >= config.min_confidence
    }

    /// Copies the tags onto an event.
    #[must_use]
    pub fn apply(&self, event: TimestampedEvent) -> TimestampedEvent {
        event
            .with_content_type(self.content_type.clone())
            .with_categorization(self.is_direct, self.is_crypto, self.confidence_score)
    }
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|n| haystack.contains(&n.to_lowercase()))
}

/// Categorizes an announcement by its title and body.
///
/// Direct indicators and content-type rules are matched against the title
/// only; crypto keywords against title and body.
pub fn categorize_announcement(title: &str, body: &str, config: &CategorizationConfig) -> Categorization {
    let title_lower = title.to_lowercase();
    let body_lower = body.to_lowercase();

    let is_direct = contains_any(&title_lower, &config.direct_indicators);
    let is_crypto = contains_any(&title_lower, &config.crypto_keywords)
        || contains_any(&body_lower, &config.crypto_keywords);

    let content_type = if is_crypto {
        CRYPTO_CONTENT_TYPE.to_string()
    } else {
        config
            .content_rules
            .iter()
            .find(|rule| contains_any(&title_lower, &rule.keywords))
            .map_or_else(|| TimestampedEvent::DEFAULT_CONTENT_TYPE.to_string(), |rule| rule.name.clone())
    };

    let mut confidence_score = 0.0;
    if is_direct {
        confidence_score += config.direct_weight;
    }
    if is_crypto {
        confidence_score += config.crypto_weight;
    }
    if content_type == CRYPTO_CONTENT_TYPE {
        confidence_score += config.crypto_type_weight;
    }

    Categorization {
        is_direct,
        is_crypto,
        content_type,
        confidence_score: confidence_score.clamp(0.0, 1.0),
    }
}

/// Sorts announcements by confidence, then newest first.
pub fn rank_announcements(events: &mut [TimestampedEvent]) {
    events.sort_by(|a, b| {
        let ca = a.confidence_score.unwrap_or(0.0);
        let cb = b.confidence_score.unwrap_or(0.0);
        cb.partial_cmp(&ca)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.timestamp.cmp(&a.timestamp))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn config() -> CategorizationConfig {
        CategorizationConfig::default()
    }

    #[test]
    fn test_direct_crypto_announcement_has_full_confidence() {
        let c = categorize_announcement("Trump says Bitcoin will be a strategic reserve", "", &config());

        assert!(c.is_direct);
        assert!(c.is_crypto);
        assert_eq!(c.content_type, "crypto");
        assert!((c.confidence_score - 1.0).abs() < 1e-9);
        assert!(c.is_relevant(&config()));
    }

    #[test]
    fn test_crypto_in_body_only() {
        let c = categorize_announcement("New executive order signed", "It covers digital asset custody", &config());

        assert!(!c.is_direct);
        assert!(c.is_crypto);
        assert_eq!(c.content_type, "crypto");
        assert!((c.confidence_score - 0.6).abs() < 1e-9);
        assert!(c.is_relevant(&config()));
    }

    #[test]
    fn test_content_rules_in_order() {
        assert_eq!(categorize_announcement("Tariff talks stall", "", &config()).content_type, "trade");
        assert_eq!(categorize_announcement("Policy shift expected", "", &config()).content_type, "policy");
        assert_eq!(categorize_announcement("Campaign rally tonight", "", &config()).content_type, "political");
        assert_eq!(categorize_announcement("Court hearing delayed", "", &config()).content_type, "legal");
        // "market" (trade) wins over "decision" (policy)
        assert_eq!(
            categorize_announcement("Market decision looms", "", &config()).content_type,
            "trade"
        );
    }

    #[test]
    fn test_content_rules_ignore_body() {
        let c = categorize_announcement("Weekend update", "tariff details inside", &config());
        assert_eq!(c.content_type, "other");
        assert_eq!(c.confidence_score, 0.0);
        assert!(!c.is_relevant(&config()));
    }

    #[test]
    fn test_direct_non_crypto_is_relevant_despite_low_confidence() {
        let c = categorize_announcement("Trump announces new tariff plan", "", &config());
        assert!(c.is_direct);
        assert_eq!(c.content_type, "trade");
        assert!((c.confidence_score - 0.4).abs() < 1e-9);
        assert!(c.is_relevant(&config()));
    }

    #[test]
    fn test_apply_and_rank() {
        let t0 = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
        let cfg = config();
        let mut events: Vec<TimestampedEvent> = [
            (0, "Trump announces tariffs"),
            (1, "Trump says bitcoin rocks"),
            (2, "Trump declares crypto week"),
        ]
        .iter()
        .map(|(h, title)| {
            let event = TimestampedEvent::new(t0 + chrono::Duration::hours(*h), "politics", *title);
            categorize_announcement(title, "", &cfg).apply(event)
        })
        .collect();

        rank_announcements(&mut events);

        let titles: Vec<_> = events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Trump declares crypto week", "Trump says bitcoin rocks", "Trump announces tariffs"]
        );
        assert_eq!(events[2].content_type, "trade");
    }
}
