//! Price feed collaborators.
//!
//! The engine only ever sees a [`PriceSeries`](crate::domain::PriceSeries);
//! everything that talks to the outside world lives here behind [`PriceFeed`].

pub mod circuit_breaker;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use provider::{FeedError, FetchWindow, PriceFeed};
pub use synthetic::SyntheticFeed;
pub use yahoo::YahooFeed;
