use std::path::PathBuf;

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub log_level: String,
    /// Registry file; `None` uses the registry compiled into the binary.
    pub sources_path: Option<PathBuf>,
    pub user_agent: String,
    pub fetch_timeout_secs: u64,
    pub fetch_max_concurrent: usize,
    pub fetch_max_body_bytes: usize,
    /// Items older than this are dropped; 0 disables the window.
    pub lookback_hours: u64,
    pub max_items_per_source: usize,
    pub llm_api_key: Option<String>,
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_batch_size: usize,
    pub llm_max_attempts: u32,
    pub llm_backoff_base_ms: u64,
    pub llm_timeout_secs: u64,
    pub llm_max_concurrent: usize,
    pub summary_max_words: usize,
    pub export_dir: Option<PathBuf>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &self.database_url)
            .field("log_level", &self.log_level)
            .field("sources_path", &self.sources_path)
            .field("user_agent", &self.user_agent)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("fetch_max_concurrent", &self.fetch_max_concurrent)
            .field("fetch_max_body_bytes", &self.fetch_max_body_bytes)
            .field("lookback_hours", &self.lookback_hours)
            .field("max_items_per_source", &self.max_items_per_source)
            .field(
                "llm_api_key",
                &self.llm_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("llm_base_url", &self.llm_base_url)
            .field("llm_model", &self.llm_model)
            .field("llm_batch_size", &self.llm_batch_size)
            .field("llm_max_attempts", &self.llm_max_attempts)
            .field("llm_backoff_base_ms", &self.llm_backoff_base_ms)
            .field("llm_timeout_secs", &self.llm_timeout_secs)
            .field("llm_max_concurrent", &self.llm_max_concurrent)
            .field("summary_max_words", &self.summary_max_words)
            .field("export_dir", &self.export_dir)
            .finish()
    }
}
