//! Builds the standard correlation inputs from collected records.

use super::alignment::NamedSeries;
use sentiment_data::{PriceTick, TimestampedEvent, TrendPoint};

pub const PRICE_CHANGE: &str = "price_change";
pub const SENTIMENT: &str = "sentiment";
pub const BITCOIN_INTEREST: &str = "bitcoin_interest";
pub const TRUMP_INTEREST: &str = "trump_interest";

/// Pairs highlighted in the correlation summary.
pub const HEADLINE_PAIRS: &[(&str, &str)] = &[(PRICE_CHANGE, TRUMP_INTEREST), (BITCOIN_INTEREST, TRUMP_INTEREST)];

/// Price change, post sentiment, and both interest groups, in that order.
///
/// Posts without a sentiment score and ticks without a derived change are
/// left out of their series.
pub fn market_series(posts: &[TimestampedEvent], trends: &[TrendPoint], prices: &[PriceTick]) -> Vec<NamedSeries> {
    vec![
        NamedSeries::from_records(PRICE_CHANGE, prices, |t: &PriceTick| t.price_change),
        NamedSeries::from_records(SENTIMENT, posts, TimestampedEvent::polarity),
        NamedSeries::from_records(BITCOIN_INTEREST, trends, |p: &TrendPoint| Some(p.bitcoin_interest)),
        NamedSeries::from_records(TRUMP_INTEREST, trends, |p: &TrendPoint| Some(p.trump_interest)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use sentiment_core::SentimentScore;
    use sentiment_data::PriceSeries;

    #[test]
    fn test_market_series_names_and_filters() {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 30, 0, 0, 0).unwrap();
        let posts = vec![
            TimestampedEvent::new(t0, "Bitcoin", "scored").with_sentiment(SentimentScore::new(0.5, 0.5)),
            TimestampedEvent::new(t0, "Bitcoin", "unscored"),
        ];
        let trends = vec![TrendPoint::new(t0, 50.0, 20.0)];
        let prices = PriceSeries::new(vec![
            PriceTick::from_close(t0, 100.0),
            PriceTick::from_close(t0 + Duration::hours(1), 101.0),
        ])
        .into_ticks();

        let series = market_series(&posts, &trends, &prices);

        let names: Vec<_> = series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec![PRICE_CHANGE, SENTIMENT, BITCOIN_INTEREST, TRUMP_INTEREST]);
        // First tick has no previous close
        assert_eq!(series[0].len(), 1);
        assert_eq!(series[1].points, vec![(t0, 0.5)]);
        assert_eq!(series[3].points, vec![(t0, 20.0)]);
    }
}
