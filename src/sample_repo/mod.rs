// SQLite sample history. Append-only; every operation runs inside one critical section.
//
// Timestamps are stored as UTC microseconds in `recorded_at_us` and rehydrated in the
// repo's reference offset. Samples and range bounds are both truncated to that resolution.
// Ordering of query results is insertion order (ascending id).

use crate::error::StoreError;
use crate::models::{NewSample, Sample};
use chrono::{DateTime, FixedOffset, SubsecRound};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use std::future::Future;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::instrument;

const SELECT_COLUMNS: &str =
    "SELECT id, recorded_at_us, cpu_usage, mem_usage, load_average, disk_io, network_io FROM monitor_samples";

pub struct SampleRepo {
    pool: SqlitePool,
    /// Serializes every store operation; callers never see it.
    gate: Mutex<()>,
    offset: FixedOffset,
    op_timeout: Duration,
}

impl SampleRepo {
    /// Connect to SQLite at `path`, creating the parent dir and DB file if missing.
    pub async fn connect(
        path: &str,
        offset: FixedOffset,
        op_timeout: Duration,
    ) -> Result<Self, StoreError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await?;
        Ok(Self {
            pool,
            gate: Mutex::new(()),
            offset,
            op_timeout,
        })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub async fn init(&self) -> Result<(), StoreError> {
        self.guarded(async {
            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS monitor_samples (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    recorded_at_us INTEGER NOT NULL,
                    cpu_usage REAL NOT NULL,
                    mem_usage REAL NOT NULL,
                    load_average REAL NOT NULL,
                    disk_io REAL NOT NULL,
                    network_io REAL NOT NULL
                )
                "#,
            )
            .execute(&self.pool)
            .await?;

            sqlx::query(
                "CREATE INDEX IF NOT EXISTS idx_monitor_samples_recorded_at ON monitor_samples(recorded_at_us)",
            )
            .execute(&self.pool)
            .await?;
            Ok(())
        })
        .await
    }

    /// Persist one sample and return it with its storage-assigned id.
    /// The timestamp is truncated to microseconds, so the returned sample equals what a query reads back.
    #[instrument(skip(self, sample), fields(repo = "samples", operation = "append"))]
    pub async fn append(&self, sample: NewSample) -> Result<Sample, StoreError> {
        let sample = NewSample {
            timestamp: sample.timestamp.with_timezone(&self.offset).trunc_subsecs(6),
            ..sample
        };
        self.guarded(async {
            let result = sqlx::query(
                "INSERT INTO monitor_samples (recorded_at_us, cpu_usage, mem_usage, load_average, disk_io, network_io) VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(sample.timestamp.timestamp_micros())
            .bind(sample.cpu_usage)
            .bind(sample.mem_usage)
            .bind(sample.load_average)
            .bind(sample.disk_io)
            .bind(sample.network_io)
            .execute(&self.pool)
            .await?;
            Ok(result.last_insert_rowid())
        })
        .await
        .map(|id| Sample::from_new(id, sample))
    }

    /// Samples with timestamp in `[start, end]`; an absent bound leaves that side open.
    #[instrument(skip(self), fields(repo = "samples", operation = "query"))]
    pub async fn query(
        &self,
        start: Option<DateTime<FixedOffset>>,
        end: Option<DateTime<FixedOffset>>,
    ) -> Result<Vec<Sample>, StoreError> {
        let start_us = start.map(|t| t.timestamp_micros());
        let end_us = end.map(|t| t.timestamp_micros());

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_COLUMNS);
        qb.push(" WHERE 1 = 1");
        if let Some(us) = start_us {
            qb.push(" AND recorded_at_us >= ").push_bind(us);
        }
        if let Some(us) = end_us {
            qb.push(" AND recorded_at_us <= ").push_bind(us);
        }
        qb.push(" ORDER BY id ASC");

        let rows = self
            .guarded(async { Ok(qb.build().fetch_all(&self.pool).await?) })
            .await?;
        rows.iter().map(|row| self.parse_row(row)).collect()
    }

    /// Last `limit` samples, oldest first.
    #[instrument(skip(self), fields(repo = "samples", operation = "recent"))]
    pub async fn recent(&self, limit: u32) -> Result<Vec<Sample>, StoreError> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY id DESC LIMIT $1");
        let rows = self
            .guarded(async {
                Ok(sqlx::query(&sql)
                    .bind(limit as i64)
                    .fetch_all(&self.pool)
                    .await?)
            })
            .await?;
        let mut out = rows
            .iter()
            .map(|row| self.parse_row(row))
            .collect::<Result<Vec<_>, _>>()?;
        out.reverse();
        Ok(out)
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        self.guarded(async {
            Ok(
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM monitor_samples")
                    .fetch_one(&self.pool)
                    .await?,
            )
        })
        .await
    }

    /// Close the underlying connection. Waits for the in-flight operation, if any.
    pub async fn close(&self) {
        let _guard = self.gate.lock().await;
        self.pool.close().await;
    }

    /// Run `op` inside the store's critical section, bounded by the configured timeout.
    /// The timeout covers lock acquisition too, so a hung call cannot stall later callers forever.
    ///
    /// A timeout only drops the future. A statement already handed to the SQLite worker thread
    /// still runs, so an `append` reported as `Timeout` may have committed its row.
    async fn guarded<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        tokio::time::timeout(self.op_timeout, async {
            let _guard = self.gate.lock().await;
            op.await
        })
        .await
        .map_err(|_| StoreError::Timeout(self.op_timeout))?
    }

    fn parse_row(&self, row: &SqliteRow) -> Result<Sample, StoreError> {
        let recorded_at_us: i64 = row.try_get("recorded_at_us")?;
        let timestamp = DateTime::from_timestamp_micros(recorded_at_us)
            .ok_or(StoreError::Timestamp(recorded_at_us))?
            .with_timezone(&self.offset);
        Ok(Sample {
            id: row.try_get("id")?,
            timestamp,
            cpu_usage: row.try_get("cpu_usage")?,
            mem_usage: row.try_get("mem_usage")?,
            load_average: row.try_get("load_average")?,
            disk_io: row.try_get("disk_io")?,
            network_io: row.try_get("network_io")?,
        })
    }
}
