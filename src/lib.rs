pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
pub mod shared;

pub use application::services::{MatchService, RelationshipService};
pub use shared::{AppError, Result};
