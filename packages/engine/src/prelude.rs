//! Pushgate engine prelude
//!
//! The types a gateway needs to run the selector and push-decision pipeline.

// Selectors
pub use crate::selector::{
    Segment, Selector, SelectorKind, SelectorSet, SelectorSource, parse_selector, parse_values,
};

// Matching and projection
pub use crate::matcher::{MatchSet, MatchedNode, NodePath, PathSegment, TreeMatcher};
pub use crate::projector::{project, project_selectors};

// Relation resolution
pub use crate::relation::{
    DocumentMode, JsonLdContext, OpenApiDocument, RelationResolver, Resolution, Route,
};

// Push decisions
pub use crate::push::{
    NoPush, PreloadOutcome, PreloadRequest, PushBudget, PushContext, PushedSet, Pusher, Target,
    UrlNormalizer, preload,
};

// Errors
pub use crate::error::{EngineError, EngineResult, PushError};

// Telemetry types
pub use crate::telemetry::{PushStats, PushStatsSnapshot};
