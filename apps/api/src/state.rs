use std::sync::Arc;

use crate::config::Config;
use crate::generation::generator::Generator;
use crate::generation::jobs::JobStore;
use crate::store::RecordStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub generator: Generator,
    /// Process-wide generation job status. Handlers go through its methods only.
    pub jobs: JobStore,
    /// Pluggable record store. Postgres when DATABASE_URL is set, in-memory otherwise.
    pub records: Arc<dyn RecordStore>,
    pub config: Config,
}

#[cfg(test)]
pub(crate) fn test_state(llm: Arc<dyn crate::llm_client::CompletionClient>) -> AppState {
    use std::time::Duration;

    use crate::store::MemoryRecordStore;

    AppState {
        generator: Generator::new(llm),
        jobs: JobStore::new(),
        records: Arc::new(MemoryRecordStore::new()),
        config: Config {
            openai_api_key: "sk-test".to_string(),
            openai_model: crate::llm_client::testing::TEST_MODEL.to_string(),
            openai_base_url: crate::config::DEFAULT_LLM_BASE_URL.to_string(),
            llm_timeout: Duration::from_secs(5),
            database_url: None,
            cors_origins: vec![],
            port: 0,
            rust_log: "debug".to_string(),
        },
    }
}
