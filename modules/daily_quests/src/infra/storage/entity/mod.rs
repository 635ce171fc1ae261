pub mod assignment;
pub mod profile;
pub mod quest;
pub mod user_stats;
