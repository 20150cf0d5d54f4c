//! Document backend: the store traits over Automerge collection documents.

use async_trait::async_trait;
use automerge::AutoCommit;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::document_key::new_key;
use super::reader::{
    find_question_by_client_ref, read_all_babies, read_all_questions, read_all_sleep_entries,
    read_baby_by_key, read_sleep_entry_by_key,
};
use super::schema::{to_millis, BabyObject, QuestionObject, SleepObject};
use super::writer::{delete_record, write_baby, write_question, write_sleep_entry};
use super::{Collection, DocumentStorage};
use crate::backend::BackendKind;
use crate::error::DataError;
use crate::models::{
    Baby, BabyPatch, DoctorQuestion, NewBaby, NewDoctorQuestion, NewSleepEntry, RecordId,
    SleepEntry, SleepPatch,
};
use crate::store::{BabyStore, QuestionStore, SleepStore};

/// Automerge-backed implementation of every store trait.
///
/// Load-modify-save cycles are serialized per store instance so that
/// concurrent writers do not overwrite each other's changes on disk.
#[derive(Clone)]
pub struct DocumentStore {
    storage: DocumentStorage,
    lock: Arc<Mutex<()>>,
}

impl DocumentStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            storage: DocumentStorage::new(data_dir),
            lock: Arc::new(Mutex::new(())),
        }
    }

    async fn read<T>(
        &self,
        collection: Collection,
        f: impl FnOnce(&AutoCommit) -> Result<T, DataError>,
    ) -> Result<T, DataError> {
        let _guard = self.lock.lock().await;
        let doc = self.storage.load_or_create(collection)?;
        f(&doc)
    }

    async fn modify<T>(
        &self,
        collection: Collection,
        f: impl FnOnce(&mut AutoCommit) -> Result<T, DataError>,
    ) -> Result<T, DataError> {
        let _guard = self.lock.lock().await;
        let mut doc = self.storage.load_or_create(collection)?;
        let out = f(&mut doc)?;
        self.storage.save(collection, &mut doc)?;
        Ok(out)
    }
}

// =============================================================================
// Babies
// =============================================================================

#[async_trait]
impl BabyStore for DocumentStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Document
    }

    async fn list_visible(&self, user_id: &str) -> Result<Vec<Baby>, DataError> {
        let mut objects: Vec<BabyObject> = self
            .read(Collection::Babies, |doc| Ok(read_all_babies(doc)?))
            .await?
            .into_iter()
            .filter(|b| b.is_member(user_id))
            .collect();
        objects.sort_by_key(|b| b.creation_time);

        objects.into_iter().map(Baby::try_from).collect()
    }

    async fn get(&self, id: &RecordId) -> Result<Option<Baby>, DataError> {
        self.read(Collection::Babies, |doc| {
            read_baby_by_key(doc, id.as_str())?
                .map(Baby::try_from)
                .transpose()
        })
        .await
    }

    async fn create(&self, new: &NewBaby) -> Result<Baby, DataError> {
        let now = to_millis(&Utc::now());
        let object = BabyObject {
            id: new_key(),
            creation_time: now,
            name: new.name.clone(),
            birth_date: new.birth_date.map(|d| d.to_string()),
            due_date: new.due_date.map(|d| d.to_string()),
            sex: new.sex.map(|s| s.to_string()),
            photo_url: new.photo_url.clone(),
            owner_id: new.owner_id.clone(),
            member_ids: vec![new.owner_id.clone()],
            updated_at: now,
        };

        self.modify(Collection::Babies, |doc| {
            write_baby(doc, &object)?;
            Ok(())
        })
        .await?;

        tracing::debug!(id = %object.id, "baby created in document store");
        Baby::try_from(object)
    }

    async fn update(&self, id: &RecordId, patch: &BabyPatch) -> Result<Baby, DataError> {
        self.modify(Collection::Babies, |doc| {
            let existing = read_baby_by_key(doc, id.as_str())?
                .ok_or_else(|| DataError::not_found("Baby", id))?;
            let mut baby = Baby::try_from(existing)?;
            patch.apply(&mut baby);
            baby.updated_at = Utc::now();

            let object = BabyObject::from(&baby);
            write_baby(doc, &object)?;
            Baby::try_from(object)
        })
        .await
    }

    async fn delete(&self, id: &RecordId) -> Result<(), DataError> {
        self.modify(Collection::Babies, |doc| {
            if delete_record(doc, id.as_str())? {
                Ok(())
            } else {
                Err(DataError::not_found("Baby", id))
            }
        })
        .await
    }

    async fn share(&self, id: &RecordId, user_id: &str) -> Result<Baby, DataError> {
        self.modify(Collection::Babies, |doc| {
            let mut object = read_baby_by_key(doc, id.as_str())?
                .ok_or_else(|| DataError::not_found("Baby", id))?;

            if !object.is_member(user_id) {
                object.member_ids.push(user_id.to_string());
                object.updated_at = to_millis(&Utc::now());
                write_baby(doc, &object)?;
            }
            Baby::try_from(object)
        })
        .await
    }
}

// =============================================================================
// Sleep entries
// =============================================================================

#[async_trait]
impl SleepStore for DocumentStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Document
    }

    async fn list_for_baby(&self, baby_id: &RecordId) -> Result<Vec<SleepEntry>, DataError> {
        let mut objects: Vec<SleepObject> = self
            .read(Collection::SleepEntries, |doc| Ok(read_all_sleep_entries(doc)?))
            .await?
            .into_iter()
            .filter(|e| e.baby_id == baby_id.as_str())
            .collect();
        objects.sort_by(|a, b| b.start_time.cmp(&a.start_time));

        objects.into_iter().map(SleepEntry::try_from).collect()
    }

    async fn get(&self, id: &RecordId) -> Result<Option<SleepEntry>, DataError> {
        self.read(Collection::SleepEntries, |doc| {
            read_sleep_entry_by_key(doc, id.as_str())?
                .map(SleepEntry::try_from)
                .transpose()
        })
        .await
    }

    async fn create(&self, new: &NewSleepEntry) -> Result<SleepEntry, DataError> {
        let object = SleepObject {
            id: new_key(),
            creation_time: to_millis(&Utc::now()),
            baby_id: new.baby_id.to_string(),
            user_id: new.user_id.clone(),
            start_time: to_millis(&new.start_time),
            end_time: new.end_time.as_ref().map(to_millis),
            duration_minutes: new.duration_minutes(),
            notes: new.notes.clone(),
        };

        self.modify(Collection::SleepEntries, |doc| {
            write_sleep_entry(doc, &object)?;
            Ok(())
        })
        .await?;

        SleepEntry::try_from(object)
    }

    async fn update(&self, id: &RecordId, patch: &SleepPatch) -> Result<SleepEntry, DataError> {
        self.modify(Collection::SleepEntries, |doc| {
            let existing = read_sleep_entry_by_key(doc, id.as_str())?
                .ok_or_else(|| DataError::not_found("SleepEntry", id))?;
            let mut entry = SleepEntry::try_from(existing)?;
            patch.apply(&mut entry);

            // Re-read through the stored shape so callers see millisecond precision.
            let object = SleepObject::from(&entry);
            write_sleep_entry(doc, &object)?;
            SleepEntry::try_from(object)
        })
        .await
    }

    async fn delete(&self, id: &RecordId) -> Result<(), DataError> {
        self.modify(Collection::SleepEntries, |doc| {
            if delete_record(doc, id.as_str())? {
                Ok(())
            } else {
                Err(DataError::not_found("SleepEntry", id))
            }
        })
        .await
    }
}

// =============================================================================
// Doctor questions
// =============================================================================

#[async_trait]
impl QuestionStore for DocumentStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Document
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<DoctorQuestion>, DataError> {
        let mut objects: Vec<QuestionObject> = self
            .read(Collection::DoctorQuestions, |doc| Ok(read_all_questions(doc)?))
            .await?
            .into_iter()
            .filter(|q| q.user_id == user_id)
            .collect();
        objects.sort_by_key(|q| q.creation_time);

        objects.into_iter().map(DoctorQuestion::try_from).collect()
    }

    async fn create(&self, new: &NewDoctorQuestion) -> Result<DoctorQuestion, DataError> {
        let client_ref = new.client_ref.to_string();
        let object = QuestionObject {
            id: new_key(),
            creation_time: to_millis(&Utc::now()),
            client_ref: client_ref.clone(),
            user_id: new.user_id.clone(),
            question: new.question.clone(),
            answer: None,
            category: new.category.clone(),
            answered_at: None,
        };

        self.modify(Collection::DoctorQuestions, |doc| {
            if find_question_by_client_ref(doc, &client_ref)?.is_some() {
                return Err(DataError::InvalidRecord(format!(
                    "question {} already exists",
                    client_ref
                )));
            }
            write_question(doc, &object)?;
            Ok(())
        })
        .await?;

        DoctorQuestion::try_from(object)
    }

    async fn answer(
        &self,
        client_ref: Uuid,
        answer: &str,
        answered_at: DateTime<Utc>,
    ) -> Result<DoctorQuestion, DataError> {
        self.modify(Collection::DoctorQuestions, |doc| {
            let mut object = find_question_by_client_ref(doc, &client_ref.to_string())?
                .ok_or_else(|| DataError::not_found("DoctorQuestion", client_ref))?;
            object.answer = Some(answer.to_string());
            object.answered_at = Some(to_millis(&answered_at));

            write_question(doc, &object)?;
            DoctorQuestion::try_from(object)
        })
        .await
    }

    async fn delete(&self, client_ref: Uuid) -> Result<(), DataError> {
        self.modify(Collection::DoctorQuestions, |doc| {
            let object = find_question_by_client_ref(doc, &client_ref.to_string())?
                .ok_or_else(|| DataError::not_found("DoctorQuestion", client_ref))?;
            delete_record(doc, &object.id)?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automerge::document_key::validate_key;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn setup() -> (DocumentStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        (DocumentStore::new(temp_dir.path().to_path_buf()), temp_dir)
    }

    #[tokio::test]
    async fn test_create_baby_uses_document_keys() {
        let (store, _temp) = setup();

        let baby = BabyStore::create(&store, &NewBaby::new("Ada", "mum"))
            .await
            .unwrap();

        assert!(validate_key(baby.id.as_str()).is_ok());
        assert!(baby.shared_with.is_empty());
        assert_eq!(BabyStore::get(&store, &baby.id).await.unwrap(), Some(baby));
    }

    #[tokio::test]
    async fn test_list_visible_by_membership() {
        let (store, _temp) = setup();

        BabyStore::create(&store, &NewBaby::new("Ada", "mum"))
            .await
            .unwrap();
        let bo = BabyStore::create(&store, &NewBaby::new("Bo", "nan"))
            .await
            .unwrap();
        BabyStore::create(&store, &NewBaby::new("Cy", "stranger"))
            .await
            .unwrap();

        let shared = store.share(&bo.id, "mum").await.unwrap();
        assert_eq!(shared.shared_with, vec!["mum".to_string()]);

        let mut names: Vec<String> = store
            .list_visible("mum")
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["Ada".to_string(), "Bo".to_string()]);
    }

    #[tokio::test]
    async fn test_update_and_delete_baby() {
        let (store, _temp) = setup();
        let baby = BabyStore::create(&store, &NewBaby::new("Ada", "mum"))
            .await
            .unwrap();

        let patch = BabyPatch {
            name: Some("Ada Grace".to_string()),
            ..Default::default()
        };
        let updated = BabyStore::update(&store, &baby.id, &patch).await.unwrap();
        assert_eq!(updated.name, "Ada Grace");
        assert_eq!(updated.id, baby.id);

        BabyStore::delete(&store, &baby.id).await.unwrap();
        assert!(BabyStore::get(&store, &baby.id).await.unwrap().is_none());
        assert!(BabyStore::delete(&store, &baby.id)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_sleep_entries_persist_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let baby = RecordId::new("b1");
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 20, 0, 0).unwrap();

        let store = DocumentStore::new(temp_dir.path().to_path_buf());
        let entry = SleepStore::create(&store, &NewSleepEntry::new(baby.clone(), "mum", start))
            .await
            .unwrap();

        let reopened = DocumentStore::new(temp_dir.path().to_path_buf());
        let entries = reopened.list_for_baby(&baby).await.unwrap();
        assert_eq!(entries, vec![entry]);
    }

    #[tokio::test]
    async fn test_sleep_update_and_order() {
        let (store, _temp) = setup();
        let baby = RecordId::new("b1");
        let first = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2025, 3, 1, 13, 0, 0).unwrap();

        let morning = SleepStore::create(&store, &NewSleepEntry::new(baby.clone(), "mum", first))
            .await
            .unwrap();
        SleepStore::create(&store, &NewSleepEntry::new(baby.clone(), "mum", second))
            .await
            .unwrap();

        let end = first + Duration::minutes(40);
        let stopped = SleepStore::update(&store, &morning.id, &SleepPatch::stop(first, end))
            .await
            .unwrap();
        assert_eq!(stopped.end_time, Some(end));
        assert_eq!(stopped.duration_minutes, Some(40));

        let entries = store.list_for_baby(&baby).await.unwrap();
        assert_eq!(entries[0].start_time, second);
        assert_eq!(entries[1], stopped);
    }

    #[tokio::test]
    async fn test_questions_by_client_ref() {
        let (store, _temp) = setup();
        let question = NewDoctorQuestion::new("mum", "Vitamin D?");

        QuestionStore::create(&store, &question).await.unwrap();
        assert!(QuestionStore::create(&store, &question).await.is_err());

        let answered_at = Utc.with_ymd_and_hms(2025, 3, 2, 10, 0, 0).unwrap();
        let answered = store
            .answer(question.client_ref, "400 IU daily", answered_at)
            .await
            .unwrap();
        assert_eq!(answered.answered_at, Some(answered_at));

        let listed = store.list_for_user("mum").await.unwrap();
        assert_eq!(listed, vec![answered]);

        QuestionStore::delete(&store, question.client_ref)
            .await
            .unwrap();
        assert!(store.list_for_user("mum").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_creates_are_not_lost() {
        let (store, _temp) = setup();
        let baby = RecordId::new("b1");
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();

        let a = NewSleepEntry::new(baby.clone(), "mum", start);
        let b = NewSleepEntry::new(baby.clone(), "dad", start + Duration::hours(1));
        let (ra, rb) = tokio::join!(
            SleepStore::create(&store, &a),
            SleepStore::create(&store, &b)
        );
        ra.unwrap();
        rb.unwrap();

        assert_eq!(store.list_for_baby(&baby).await.unwrap().len(), 2);
    }
}
