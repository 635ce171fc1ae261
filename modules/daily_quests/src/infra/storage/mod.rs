pub mod entity;
pub mod mapper;
pub mod migrations;

mod assignments_repo;
mod completion_store;
mod quests_repo;
mod users_repo;

pub use assignments_repo::SeaOrmAssignmentRepository;
pub use completion_store::{SeaOrmCompletionStore, SeaOrmStatsRepository};
pub use quests_repo::SeaOrmQuestRepository;
pub use users_repo::SeaOrmUserDirectory;
