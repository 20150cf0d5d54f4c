use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use super::DataService;
use crate::backend::{BackendKind, WritePolicy};
use crate::models::{DoctorQuestion, NewDoctorQuestion};
use crate::result::{DualWriteResult, ReadResult};
use crate::store::QuestionStore;

/// Questions for the doctor, mirrored to both backends by default.
///
/// Questions are addressed by their `client_ref`, which is the same on both
/// backends, so answers and deletes reach both copies.
#[derive(Clone)]
pub struct QuestionService {
    inner: DataService<dyn QuestionStore>,
}

impl QuestionService {
    pub fn new(
        relational: Arc<dyn QuestionStore>,
        document: Arc<dyn QuestionStore>,
        active: BackendKind,
    ) -> Self {
        Self {
            inner: DataService::new(relational, document, active).with_write_policy(
                WritePolicy::Dual {
                    primary: BackendKind::Relational,
                },
            ),
        }
    }

    pub fn with_write_policy(mut self, write_policy: WritePolicy) -> Self {
        self.inner = self.inner.with_write_policy(write_policy);
        self
    }

    pub fn active(&self) -> BackendKind {
        self.inner.active()
    }

    pub fn write_policy(&self) -> WritePolicy {
        self.inner.write_policy()
    }

    pub async fn list_questions(&self, user_id: &str) -> ReadResult<Vec<DoctorQuestion>> {
        self.inner.read(|store| store.list_for_user(user_id)).await
    }

    pub async fn ask_question(&self, question: &NewDoctorQuestion) -> DualWriteResult<DoctorQuestion> {
        self.inner.write(|store| store.create(question)).await
    }

    /// Records an answer. Both backends get the same `answered_at`.
    pub async fn answer_question(
        &self,
        client_ref: Uuid,
        answer: &str,
    ) -> DualWriteResult<DoctorQuestion> {
        let answered_at = Utc::now();
        self.inner
            .write(|store| store.answer(client_ref, answer, answered_at))
            .await
    }

    pub async fn delete_question(&self, client_ref: Uuid) -> DualWriteResult<()> {
        self.inner.write(|store| store.delete(client_ref)).await
    }
}
