use async_trait::async_trait;
use chrono::{DateTime, Utc};
use notifier_core::{
    models::{ArchivedRecord, DeliveryOutcome, EnrichedRecord, StagedRecord},
    traits::{ArchiveWriter, BatchReader},
    NotifierError, NotifierResult,
};
use sqlx::{PgPool, Row};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::database::recent_window_cutoff;
use crate::timeout_handler::TimeoutHandler;

const SCHEMA_SQL: &str = include_str!("../../../../../migrations/postgres/0001_create_launch_tables.sql");

/// PostgreSQL 上的暂存表/归档表仓储，同时实现批次读取与归档写入
#[derive(Clone)]
pub struct PostgresLaunchRepository {
    pool: PgPool,
    timeouts: TimeoutHandler,
    recent_window_minutes: Option<u64>,
}

impl PostgresLaunchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            timeouts: TimeoutHandler::with_default_config(),
            recent_window_minutes: None,
        }
    }

    pub fn with_storage_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts = TimeoutHandler::with_database_timeout(timeout);
        self
    }

    pub fn with_recent_window(mut self, minutes: Option<u64>) -> Self {
        self.recent_window_minutes = minutes;
        self
    }

    /// 创建暂存表与归档表（已存在时跳过）
    pub async fn ensure_schema(&self) -> NotifierResult<()> {
        self.timeouts
            .database_operation(
                async {
                    sqlx::raw_sql(SCHEMA_SQL).execute(&self.pool).await?;
                    Ok::<_, NotifierError>(())
                },
                "初始化表结构",
            )
            .await
    }

    /// 以上游生产者的身份写入一条暂存记录
    pub async fn stage(&self, record: &StagedRecord) -> NotifierResult<()> {
        sqlx::query(
            r#"
            INSERT INTO staged_records (launch_key, external_id, group_id, subgroup_id, category, created_at, payload_digest)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&record.launch_key)
        .bind(&record.external_id)
        .bind(&record.group_id)
        .bind(&record.subgroup_id)
        .bind(&record.category)
        .bind(record.created_at)
        .bind(&record.payload_digest)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn staged_count(&self) -> NotifierResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM staged_records")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// 按写入顺序列出归档记录
    pub async fn list_archived(&self) -> NotifierResult<Vec<ArchivedRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, launch_key, external_id, group_id, subgroup_id, category, created_at,
                   payload_digest, display_name, outcome, processed_at
            FROM archived_records
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_archived).collect()
    }

    fn row_to_staged(row: &sqlx::postgres::PgRow) -> NotifierResult<StagedRecord> {
        Ok(StagedRecord {
            launch_key: row.try_get("launch_key")?,
            external_id: row.try_get("external_id")?,
            group_id: row.try_get("group_id")?,
            subgroup_id: row.try_get("subgroup_id")?,
            category: row.try_get("category")?,
            created_at: row.try_get("created_at")?,
            payload_digest: row.try_get("payload_digest")?,
        })
    }

    fn row_to_archived(row: &sqlx::postgres::PgRow) -> NotifierResult<ArchivedRecord> {
        let outcome: String = row.try_get("outcome")?;
        Ok(ArchivedRecord {
            id: row.try_get("id")?,
            launch_key: row.try_get("launch_key")?,
            external_id: row.try_get("external_id")?,
            group_id: row.try_get("group_id")?,
            subgroup_id: row.try_get("subgroup_id")?,
            category: row.try_get("category")?,
            created_at: row.try_get("created_at")?,
            payload_digest: row.try_get("payload_digest")?,
            display_name: row.try_get("display_name")?,
            outcome: outcome.parse().map_err(NotifierError::DatabaseOperation)?,
            processed_at: row.try_get("processed_at")?,
        })
    }
}

#[async_trait]
impl BatchReader for PostgresLaunchRepository {
    #[instrument(skip(self))]
    async fn fetch_batch(&self, max_size: usize) -> NotifierResult<Vec<StagedRecord>> {
        let cutoff: Option<DateTime<Utc>> = self.recent_window_minutes.map(recent_window_cutoff);
        let limit = i64::try_from(max_size).unwrap_or(i64::MAX);

        let rows = self
            .timeouts
            .database_operation(
                async {
                    let rows = sqlx::query(
                        r#"
                        SELECT launch_key, external_id, group_id, subgroup_id, category, created_at, payload_digest
                        FROM staged_records
                        WHERE ($1::timestamptz IS NULL OR created_at > $1)
                        ORDER BY created_at ASC, launch_key ASC
                        LIMIT $2
                        "#,
                    )
                    .bind(cutoff)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?;
                    Ok::<_, NotifierError>(rows)
                },
                "读取暂存批次",
            )
            .await?;

        let records = rows
            .iter()
            .map(Self::row_to_staged)
            .collect::<NotifierResult<Vec<_>>>()?;
        debug!("从暂存表读取 {} 条记录", records.len());
        Ok(records)
    }
}

#[async_trait]
impl ArchiveWriter for PostgresLaunchRepository {
    #[instrument(skip(self, records, outcome), fields(count = records.len(), outcome = %outcome))]
    async fn archive(
        &self,
        records: &[EnrichedRecord],
        outcome: DeliveryOutcome,
    ) -> NotifierResult<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let processed_at = Utc::now();
        let keys: Vec<String> = records.iter().map(|r| r.launch_key().to_string()).collect();

        self.timeouts
            .database_operation(
                async {
                    let mut tx = self.pool.begin().await?;

                    for enriched in records {
                        let record = &enriched.record;
                        sqlx::query(
                            r#"
                            INSERT INTO archived_records
                                (launch_key, external_id, group_id, subgroup_id, category, created_at,
                                 payload_digest, display_name, outcome, processed_at)
                            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                            "#,
                        )
                        .bind(&record.launch_key)
                        .bind(&record.external_id)
                        .bind(&record.group_id)
                        .bind(&record.subgroup_id)
                        .bind(&record.category)
                        .bind(record.created_at)
                        .bind(&record.payload_digest)
                        .bind(&enriched.display_name)
                        .bind(outcome.as_str())
                        .bind(processed_at)
                        .execute(&mut *tx)
                        .await?;
                    }

                    // 归档行已写入同一事务后才删除暂存行
                    sqlx::query("DELETE FROM staged_records WHERE launch_key = ANY($1)")
                        .bind(&keys)
                        .execute(&mut *tx)
                        .await?;

                    tx.commit().await?;
                    Ok::<_, NotifierError>(())
                },
                "归档批次",
            )
            .await?;

        debug!("已归档 {} 条记录 (结果: {})", records.len(), outcome);
        Ok(records.len() as u64)
    }
}
