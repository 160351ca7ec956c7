//! Push decisions
//!
//! Everything between a matched `preload` node and what the client receives
//! for it: URL normalization, downstream selectors, deduplication, the push
//! budget, and the push-or-link decision itself.

pub mod budget;
pub mod context;
pub mod downstream;
pub mod orchestrator;
pub mod pushed_set;
pub mod pusher;
pub mod url;

pub use budget::PushBudget;
pub use context::PushContext;
pub use downstream::Downstream;
pub use orchestrator::{PreloadOutcome, PreloadRequest, link_value, preload};
pub use pushed_set::PushedSet;
pub use pusher::{NoPush, Pusher};
pub use url::{Target, UrlNormalizer};
