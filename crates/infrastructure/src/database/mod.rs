pub mod manager;
pub mod postgres;
pub mod sqlite;

use chrono::{DateTime, Utc};

pub use manager::{DatabaseManager, DatabasePool, DatabaseType};
pub use postgres::PostgresLaunchRepository;
pub use sqlite::SqliteLaunchRepository;

/// 时间窗口的起点：只读取在此之后创建的记录
pub(crate) fn recent_window_cutoff(minutes: u64) -> DateTime<Utc> {
    i64::try_from(minutes)
        .ok()
        .and_then(chrono::Duration::try_minutes)
        .and_then(|window| Utc::now().checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_window_cutoff() {
        let cutoff = recent_window_cutoff(10);
        let age = Utc::now() - cutoff;
        assert!(age >= chrono::Duration::minutes(10));
        assert!(age < chrono::Duration::minutes(11));

        assert_eq!(recent_window_cutoff(u64::MAX), DateTime::<Utc>::MIN_UTC);
    }
}
