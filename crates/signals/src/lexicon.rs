//! Lexicon-based polarity scorer.
//!
//! Averages per-word polarity/subjectivity over the words found in a small
//! market-oriented lexicon. A negator in the two preceding tokens flips and
//! halves a word's polarity.

use sentiment_core::{PolarityScorer, SentimentScore};
use std::collections::HashMap;

/// (word, polarity, subjectivity)
const DEFAULT_LEXICON: &[(&str, f64, f64)] = &[
    ("good", 0.7, 0.6),
    ("great", 0.8, 0.75),
    ("best", 1.0, 0.3),
    ("bullish", 0.8, 0.7),
    ("moon", 0.6, 0.6),
    ("surge", 0.6, 0.5),
    ("surges", 0.6, 0.5),
    ("rally", 0.5, 0.5),
    ("gain", 0.4, 0.4),
    ("gains", 0.4, 0.4),
    ("rise", 0.3, 0.3),
    ("rises", 0.3, 0.3),
    ("up", 0.2, 0.2),
    ("win", 0.8, 0.4),
    ("strong", 0.4, 0.7),
    ("adoption", 0.3, 0.3),
    ("approve", 0.5, 0.4),
    ("approved", 0.5, 0.4),
    ("record", 0.3, 0.3),
    ("high", 0.2, 0.5),
    ("love", 0.5, 0.6),
    ("amazing", 0.6, 0.9),
    ("positive", 0.2, 0.5),
    ("bad", -0.7, 0.7),
    ("worst", -1.0, 1.0),
    ("terrible", -1.0, 1.0),
    ("bearish", -0.8, 0.7),
    ("crash", -0.8, 0.6),
    ("crashes", -0.8, 0.6),
    ("dump", -0.6, 0.6),
    ("plunge", -0.7, 0.5),
    ("plunges", -0.7, 0.5),
    ("fall", -0.4, 0.3),
    ("falls", -0.4, 0.3),
    ("drop", -0.4, 0.3),
    ("drops", -0.4, 0.3),
    ("down", -0.2, 0.3),
    ("loss", -0.5, 0.4),
    ("losses", -0.5, 0.4),
    ("weak", -0.4, 0.7),
    ("fear", -0.6, 0.7),
    ("panic", -0.7, 0.8),
    ("scam", -0.8, 0.8),
    ("fraud", -0.8, 0.8),
    ("hack", -0.6, 0.5),
    ("hacked", -0.6, 0.5),
    ("ban", -0.5, 0.4),
    ("banned", -0.5, 0.4),
    ("lawsuit", -0.4, 0.4),
    ("low", -0.2, 0.4),
    ("negative", -0.3, 0.4),
];

const NEGATORS: &[&str] = &["not", "no", "never", "isn't", "wasn't", "don't", "doesn't", "won't", "can't"];

/// Scorer backed by a word lexicon.
#[derive(Debug, Clone)]
pub struct LexiconScorer {
    words: HashMap<String, (f64, f64)>,
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self::from_entries(DEFAULT_LEXICON.iter().map(|(w, p, s)| (w.to_string(), *p, *s)))
    }
}

impl LexiconScorer {
    /// Builds a scorer from `(word, polarity, subjectivity)` entries.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, f64, f64)>) -> Self {
        let words = entries
            .into_iter()
            .map(|(w, p, s)| (w.to_lowercase(), (p.clamp(-1.0, 1.0), s.clamp(0.0, 1.0))))
            .collect();
        Self { words }
    }

    fn tokens(text: &str) -> Vec<String> {
        text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
            .collect()
    }
}

impl PolarityScorer for LexiconScorer {
    fn score(&self, text: &str) -> SentimentScore {
        let tokens = Self::tokens(text);

        let mut polarity_sum = 0.0;
        let mut subjectivity_sum = 0.0;
        let mut hits = 0usize;

        for (i, token) in tokens.iter().enumerate() {
            let Some(&(polarity, subjectivity)) = self.words.get(token) else {
                continue;
            };
            let negated = tokens[i.saturating_sub(2)..i]
                .iter()
                .any(|t| NEGATORS.contains(&t.as_str()));

            polarity_sum += if negated { -0.5 * polarity } else { polarity };
            subjectivity_sum += subjectivity;
            hits += 1;
        }

        if hits == 0 {
            return SentimentScore::default();
        }
        let n = hits as f64;
        SentimentScore::new(polarity_sum / n, subjectivity_sum / n)
    }
}
