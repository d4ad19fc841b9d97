mod relationship_id;
mod tag_id;
mod user_id;

pub use relationship_id::RelationshipId;
pub use tag_id::TagId;
pub use user_id::UserId;
