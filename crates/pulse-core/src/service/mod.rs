//! Application services built on the ports.

mod feed;

pub use feed::{
    BackfillReport, EmbeddingStatus, FeedSearch, FeedService, FeedStats, PostOutcome, ScoredPost,
    SearchMode, SearchSettings,
};
