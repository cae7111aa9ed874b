pub mod sqlite_launch_repository;

pub use sqlite_launch_repository::SqliteLaunchRepository;
