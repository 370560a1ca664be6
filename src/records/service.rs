use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::records::dto::RecordInput;
use crate::records::store::{HealthRecord, RecordStore};
use crate::storage::FileStore;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("{0}")]
    Validation(&'static str),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Validates and executes all record operations on behalf of one owner.
/// Ownership is enforced here by always loading through `find_owned`;
/// timestamps are stamped explicitly on every mutation.
#[derive(Clone)]
pub struct RecordService {
    store: Arc<dyn RecordStore>,
    files: Arc<dyn FileStore>,
}

impl RecordService {
    pub fn new(store: Arc<dyn RecordStore>, files: Arc<dyn FileStore>) -> Self {
        Self { store, files }
    }

    fn validate_create(input: &RecordInput) -> Result<(), RecordError> {
        if input.body_temperature.is_none() {
            return Err(RecordError::Validation("body temperature is required"));
        }
        if input
            .blood_pressure
            .as_deref()
            .map_or(true, |bp| bp.trim().is_empty())
        {
            return Err(RecordError::Validation("blood pressure is required"));
        }
        if input.heart_rate.is_none() {
            return Err(RecordError::Validation("heart rate is required"));
        }
        Ok(())
    }

    pub async fn create(
        &self,
        owner: Uuid,
        input: RecordInput,
    ) -> Result<HealthRecord, RecordError> {
        Self::validate_create(&input)?;
        let now = OffsetDateTime::now_utc();
        let record = HealthRecord {
            id: Uuid::new_v4(),
            user_id: owner,
            date: input.date.unwrap_or_else(|| now.date()),
            body_temperature: input.body_temperature,
            blood_pressure: input.blood_pressure,
            heart_rate: input.heart_rate,
            water_intake: input.water_intake,
            sleep_duration: input.sleep_duration,
            stress_level: input.stress_level,
            notes: input.notes,
            photo_url: None,
            created_at: now,
            updated_at: now,
        };
        let created = self.store.insert(&record).await?;
        info!(record_id = %created.id, user_id = %owner, "health record created");
        Ok(created)
    }

    /// All records for the owner, or only those whose notes match the search
    /// term; newest observation first either way.
    pub async fn list(
        &self,
        owner: Uuid,
        search: Option<&str>,
    ) -> anyhow::Result<Vec<HealthRecord>> {
        match search.map(str::trim).filter(|s| !s.is_empty()) {
            Some(keyword) => self.store.search(owner, keyword).await,
            None => self.store.list(owner).await,
        }
    }

    /// Owner-scoped lookup; a record belonging to someone else is
    /// indistinguishable from a nonexistent one.
    pub async fn get(&self, owner: Uuid, id: Uuid) -> anyhow::Result<Option<HealthRecord>> {
        self.store.find_owned(owner, id).await
    }

    /// Overwrite semantics: every nullable field adopts the input value as
    /// given (null clears). `date` is non-nullable, so an absent input date
    /// keeps the stored one.
    pub async fn update(
        &self,
        owner: Uuid,
        id: Uuid,
        input: RecordInput,
    ) -> Result<Option<HealthRecord>, RecordError> {
        if input.body_temperature.is_none() {
            return Err(RecordError::Validation("body temperature is required"));
        }
        let Some(mut existing) = self.store.find_owned(owner, id).await? else {
            return Ok(None);
        };
        existing.body_temperature = input.body_temperature;
        existing.blood_pressure = input.blood_pressure;
        existing.heart_rate = input.heart_rate;
        existing.water_intake = input.water_intake;
        existing.sleep_duration = input.sleep_duration;
        existing.stress_level = input.stress_level;
        existing.notes = input.notes;
        if let Some(date) = input.date {
            existing.date = date;
        }
        existing.updated_at = OffsetDateTime::now_utc();
        let updated = self.store.update(&existing).await?;
        Ok(Some(updated))
    }

    /// Deletes the record and its attached photo file. File cleanup is
    /// best-effort and never blocks the record delete.
    pub async fn delete(&self, owner: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let Some(record) = self.store.find_owned(owner, id).await? else {
            return Ok(false);
        };
        if let Some(photo) = &record.photo_url {
            if let Err(e) = self.files.delete(photo).await {
                warn!(error = %e, filename = %photo, "failed to delete photo file");
            }
        }
        self.store.delete(record.id).await?;
        info!(record_id = %id, user_id = %owner, "health record deleted");
        Ok(true)
    }

    /// Swaps the stored photo reference. Loads by id alone: the caller has
    /// already established ownership. The superseded file is removed unless
    /// the new upload overwrote it in place.
    pub async fn update_photo(
        &self,
        id: Uuid,
        filename: &str,
    ) -> anyhow::Result<Option<HealthRecord>> {
        let Some(mut record) = self.store.find_by_id(id).await? else {
            return Ok(None);
        };
        if let Some(old) = record.photo_url.take() {
            if old != filename {
                if let Err(e) = self.files.delete(&old).await {
                    warn!(error = %e, filename = %old, "failed to delete superseded photo");
                }
            }
        }
        record.photo_url = Some(filename.to_string());
        record.updated_at = OffsetDateTime::now_utc();
        let updated = self.store.update(&record).await?;
        Ok(Some(updated))
    }
}
