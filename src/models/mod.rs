//! Data models for visitor analytics

pub mod live;
pub mod session;
pub mod visit;

// Re-export commonly used types
pub use live::{LiveEntry, LiveSnapshot};
pub use session::SessionId;
pub use visit::{TrackVisitResponse, VisitOutcome, VisitRecord};
