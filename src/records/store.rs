use axum::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// One dated health observation, owned 1:1 by a user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HealthRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: Date,
    pub body_temperature: Option<f64>,
    pub blood_pressure: Option<String>,
    pub heart_rate: Option<i32>,
    pub water_intake: Option<i32>,
    pub sleep_duration: Option<f64>,
    pub stress_level: Option<i32>,
    pub notes: Option<String>,
    pub photo_url: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Owner-scoped persistence interface for health records. Every read or
/// write that acts on behalf of a user filters by `(user_id, id)`, never by
/// id alone; `find_by_id` exists only for the photo-swap path whose caller
/// has already checked ownership.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert(&self, record: &HealthRecord) -> anyhow::Result<HealthRecord>;
    async fn find_owned(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<HealthRecord>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<HealthRecord>>;
    /// All records for a user, newest observation first.
    async fn list(&self, user_id: Uuid) -> anyhow::Result<Vec<HealthRecord>>;
    /// Records whose notes contain the keyword, case-insensitively.
    async fn search(&self, user_id: Uuid, keyword: &str) -> anyhow::Result<Vec<HealthRecord>>;
    async fn update(&self, record: &HealthRecord) -> anyhow::Result<HealthRecord>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<()>;
}

pub struct PgRecordStore {
    db: PgPool,
}

impl PgRecordStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn insert(&self, record: &HealthRecord) -> anyhow::Result<HealthRecord> {
        let row = sqlx::query_as::<_, HealthRecord>(
            r#"
            INSERT INTO health_records (
                id, user_id, date, body_temperature, blood_pressure, heart_rate,
                water_intake, sleep_duration, stress_level, notes, photo_url,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id, user_id, date, body_temperature, blood_pressure, heart_rate,
                      water_intake, sleep_duration, stress_level, notes, photo_url,
                      created_at, updated_at
            "#,
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(record.date)
        .bind(record.body_temperature)
        .bind(&record.blood_pressure)
        .bind(record.heart_rate)
        .bind(record.water_intake)
        .bind(record.sleep_duration)
        .bind(record.stress_level)
        .bind(&record.notes)
        .bind(&record.photo_url)
        .bind(record.created_at)
        .bind(record.updated_at)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn find_owned(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<HealthRecord>> {
        let row = sqlx::query_as::<_, HealthRecord>(
            r#"
            SELECT id, user_id, date, body_temperature, blood_pressure, heart_rate,
                   water_intake, sleep_duration, stress_level, notes, photo_url,
                   created_at, updated_at
            FROM health_records
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<HealthRecord>> {
        let row = sqlx::query_as::<_, HealthRecord>(
            r#"
            SELECT id, user_id, date, body_temperature, blood_pressure, heart_rate,
                   water_intake, sleep_duration, stress_level, notes, photo_url,
                   created_at, updated_at
            FROM health_records
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn list(&self, user_id: Uuid) -> anyhow::Result<Vec<HealthRecord>> {
        let rows = sqlx::query_as::<_, HealthRecord>(
            r#"
            SELECT id, user_id, date, body_temperature, blood_pressure, heart_rate,
                   water_intake, sleep_duration, stress_level, notes, photo_url,
                   created_at, updated_at
            FROM health_records
            WHERE user_id = $1
            ORDER BY date DESC, created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn search(&self, user_id: Uuid, keyword: &str) -> anyhow::Result<Vec<HealthRecord>> {
        let rows = sqlx::query_as::<_, HealthRecord>(
            r#"
            SELECT id, user_id, date, body_temperature, blood_pressure, heart_rate,
                   water_intake, sleep_duration, stress_level, notes, photo_url,
                   created_at, updated_at
            FROM health_records
            WHERE user_id = $1 AND notes ILIKE '%' || $2 || '%'
            ORDER BY date DESC, created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(keyword)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn update(&self, record: &HealthRecord) -> anyhow::Result<HealthRecord> {
        let row = sqlx::query_as::<_, HealthRecord>(
            r#"
            UPDATE health_records
            SET date = $2, body_temperature = $3, blood_pressure = $4, heart_rate = $5,
                water_intake = $6, sleep_duration = $7, stress_level = $8, notes = $9,
                photo_url = $10, updated_at = $11
            WHERE id = $1
            RETURNING id, user_id, date, body_temperature, blood_pressure, heart_rate,
                      water_intake, sleep_duration, stress_level, notes, photo_url,
                      created_at, updated_at
            "#,
        )
        .bind(record.id)
        .bind(record.date)
        .bind(record.body_temperature)
        .bind(&record.blood_pressure)
        .bind(record.heart_rate)
        .bind(record.water_intake)
        .bind(record.sleep_duration)
        .bind(record.stress_level)
        .bind(&record.notes)
        .bind(&record.photo_url)
        .bind(record.updated_at)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM health_records WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}
