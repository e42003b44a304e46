//! Source adapters for the sentiment pipeline.
//!
//! Every collector implements [`sentiment_core::SourceAdapter`], so the
//! freshness cache can decide whether to reuse recent CSV output or call it:
//! - Reddit new posts across the configured subreddits
//! - Reddit announcement search with categorization
//! - NewsAPI articles
//! - Google Trends interest for two keyword groups
//! - Binance spot klines

mod announcement_collector;
mod news_collector;
mod price_collector;
mod reddit_collector;
mod trends_collector;
mod types;

pub use announcement_collector::AnnouncementCollector;
pub use news_collector::{NewsApiArticle, NewsApiResponse, NewsApiSource, NewsCollector, NEWSAPI_URL};
pub use price_collector::{Interval, PriceCollector, BINANCE_SPOT_API};
pub use reddit_collector::{RedditCollector, RedditListing, RedditPost, REDDIT_API_URL};
pub use trends_collector::{TrendsCollector, GOOGLE_TRENDS_URL};
pub use types::{CollectorStats, HttpSource};
