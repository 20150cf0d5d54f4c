use chrono::Duration;
use nestling_core::{
    init_db, BabyRepository, BabyService, DocumentStore, QuestionRepository, QuestionService,
    SleepRepository, SleepService,
};
use std::sync::Arc;

use crate::config::Config;

/// The services every command works through, wired to both backends.
pub struct Services {
    pub babies: BabyService,
    pub sleep: SleepService,
    pub questions: QuestionService,
}

impl Services {
    /// Opens the SQLite database and the Automerge document directory named
    /// by `config` and builds each service with its configured routing.
    pub async fn open(config: &Config) -> Result<Self, Box<dyn std::error::Error>> {
        let pool = init_db(&config.database_path.value).await?;
        let documents = Arc::new(DocumentStore::new(config.documents_dir.value.clone()));
        let active = config.active_backend.value;

        tracing::debug!(
            database = %config.database_path.value.display(),
            documents = %config.documents_dir.value.display(),
            active = %active,
            "opened backends"
        );

        let babies = BabyService::new(
            Arc::new(BabyRepository::new(pool.clone())),
            documents.clone(),
            active,
        )
        .with_write_policy(config.write_policy.babies);

        let sleep = SleepService::new(
            Arc::new(SleepRepository::new(pool.clone())),
            documents.clone(),
            active,
        )
        .with_write_policy(config.write_policy.sleep)
        .with_max_active_duration(Duration::minutes(config.max_active_sleep_minutes.value));

        let questions =
            QuestionService::new(Arc::new(QuestionRepository::new(pool)), documents, active)
                .with_write_policy(config.write_policy.questions);

        Ok(Self {
            babies,
            sleep,
            questions,
        })
    }
}
