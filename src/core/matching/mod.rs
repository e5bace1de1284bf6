//! Customer matching: cascade strategies and similarity scoring

pub mod matcher;
pub mod normalize;
pub mod similarity;
pub mod strategies;

pub use matcher::CustomerMatcher;
pub use normalize::SearchTerms;
pub use strategies::{default_strategies, MatchStrategy};
