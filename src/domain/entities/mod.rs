mod match_score;
mod relationship;

pub use match_score::MatchScore;
pub use relationship::{Relationship, RelationshipKind, RelationshipPayload};
