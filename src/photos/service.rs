use bytes::Bytes;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::records::service::RecordService;
use crate::storage::FileStore;

/// A photo as it arrived in the multipart request.
pub struct PhotoUpload {
    pub content_type: Option<String>,
    pub body: Bytes,
}

#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("photo file must not be empty")]
    Empty,
    #[error("photo must be a JPEG, PNG, GIF or WEBP image")]
    UnsupportedType,
    #[error("photo exceeds the maximum size of 5 MiB")]
    TooLarge,
    #[error("health record not found")]
    RecordNotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// First failure wins: presence, then content type, then size.
fn validate(upload: &PhotoUpload, max_bytes: usize) -> Result<&'static str, PhotoError> {
    if upload.body.is_empty() {
        return Err(PhotoError::Empty);
    }
    let ext = upload
        .content_type
        .as_deref()
        .and_then(ext_from_mime)
        .ok_or(PhotoError::UnsupportedType)?;
    if upload.body.len() > max_bytes {
        return Err(PhotoError::TooLarge);
    }
    Ok(ext)
}

/// Validates the upload, stores it under `photo_<record-id>.<ext>` (one slot
/// per record, re-uploads overwrite), and swaps the record's photo reference.
/// Ownership of the record must be checked by the caller.
pub async fn attach_photo(
    records: &RecordService,
    files: &dyn FileStore,
    max_bytes: usize,
    record_id: Uuid,
    upload: PhotoUpload,
) -> Result<String, PhotoError> {
    let ext = validate(&upload, max_bytes)?;
    let filename = format!("photo_{record_id}.{ext}");
    files.store(&filename, upload.body).await?;

    match records.update_photo(record_id, &filename).await? {
        Some(_) => {
            info!(record_id = %record_id, filename = %filename, "photo attached");
            Ok(filename)
        }
        None => Err(PhotoError::RecordNotFound),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::dto::RecordInput;
    use crate::testing::{MemoryFileStore, MemoryRecordStore};
    use std::sync::Arc;

    fn jpeg(len: usize) -> PhotoUpload {
        PhotoUpload {
            content_type: Some("image/jpeg".into()),
            body: Bytes::from(vec![0u8; len]),
        }
    }

    const MAX: usize = 5 * 1024 * 1024;

    fn make_service() -> (RecordService, Arc<MemoryFileStore>) {
        let files = Arc::new(MemoryFileStore::default());
        let records = RecordService::new(Arc::new(MemoryRecordStore::default()), files.clone());
        (records, files)
    }

    async fn make_record(records: &RecordService) -> crate::records::store::HealthRecord {
        records
            .create(
                Uuid::new_v4(),
                RecordInput {
                    body_temperature: Some(36.5),
                    blood_pressure: Some("120/80".into()),
                    heart_rate: Some(72),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
    }

    #[test]
    fn validation_order_is_presence_type_size() {
        // Empty wins even with a bad content type.
        let empty = PhotoUpload {
            content_type: Some("text/plain".into()),
            body: Bytes::new(),
        };
        assert!(matches!(validate(&empty, MAX), Err(PhotoError::Empty)));

        // Unsupported type wins over oversized body.
        let huge_text = PhotoUpload {
            content_type: Some("text/plain".into()),
            body: Bytes::from(vec![0u8; MAX + 1]),
        };
        assert!(matches!(
            validate(&huge_text, MAX),
            Err(PhotoError::UnsupportedType)
        ));

        // A missing content type is unsupported, not a crash.
        let untyped = PhotoUpload {
            content_type: None,
            body: Bytes::from_static(b"x"),
        };
        assert!(matches!(
            validate(&untyped, MAX),
            Err(PhotoError::UnsupportedType)
        ));

        assert!(matches!(
            validate(&jpeg(MAX + 1), MAX),
            Err(PhotoError::TooLarge)
        ));
        // Exactly at the limit is allowed.
        assert_eq!(validate(&jpeg(MAX), MAX).unwrap(), "jpg");
    }

    #[test]
    fn every_allowed_type_maps_to_an_extension() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/gif"), Some("gif"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("application/pdf"), None);
    }

    #[tokio::test]
    async fn oversized_upload_leaves_the_record_untouched() {
        let (records, files) = make_service();
        let record = make_record(&records).await;

        let err = attach_photo(&records, files.as_ref(), MAX, record.id, jpeg(6 * 1024 * 1024))
            .await
            .unwrap_err();
        assert!(matches!(err, PhotoError::TooLarge));

        let stored = records
            .get(record.user_id, record.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.photo_url, None);
        assert!(!files.contains(&format!("photo_{}.jpg", record.id)));
    }

    #[tokio::test]
    async fn successful_upload_stores_file_and_swaps_reference() {
        let (records, files) = make_service();
        let record = make_record(&records).await;

        let filename = attach_photo(&records, files.as_ref(), MAX, record.id, jpeg(1024))
            .await
            .unwrap();
        assert_eq!(filename, format!("photo_{}.jpg", record.id));
        assert!(files.contains(&filename));

        let stored = records
            .get(record.user_id, record.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.photo_url, Some(filename));
    }

    #[tokio::test]
    async fn re_upload_with_new_type_removes_the_old_file() {
        let (records, files) = make_service();
        let record = make_record(&records).await;

        attach_photo(&records, files.as_ref(), MAX, record.id, jpeg(16))
            .await
            .unwrap();
        let png = PhotoUpload {
            content_type: Some("image/png".into()),
            body: Bytes::from_static(b"png-bytes"),
        };
        attach_photo(&records, files.as_ref(), MAX, record.id, png)
            .await
            .unwrap();

        assert!(!files.contains(&format!("photo_{}.jpg", record.id)));
        assert!(files.contains(&format!("photo_{}.png", record.id)));
    }

    #[tokio::test]
    async fn unknown_record_is_reported_after_validation() {
        let (records, files) = make_service();
        let err = attach_photo(&records, files.as_ref(), MAX, Uuid::new_v4(), jpeg(16))
            .await
            .unwrap_err();
        assert!(matches!(err, PhotoError::RecordNotFound));
    }
}
