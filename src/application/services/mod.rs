pub mod match_service;
pub mod relationship_service;
pub mod tag_events;

pub use match_service::MatchService;
pub use relationship_service::RelationshipService;
