pub mod postgres_launch_repository;

pub use postgres_launch_repository::PostgresLaunchRepository;
