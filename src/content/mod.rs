//! Stores for user-generated and curated content. Every function takes a
//! borrowed connection so callers decide how long a pooled connection lives.

pub mod comments;
pub mod forums;
pub mod milestones;
pub mod posts;
pub mod resources;
pub mod users;
