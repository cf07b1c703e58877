use crate::schema::DestinationSchema;

#[derive(Clone)]
pub struct AppConfig {
    pub app_key: String,
    pub app_secret: String,
    pub server_url: String,
    pub supabase_url: String,
    pub supabase_key: String,
    pub supabase_table: String,
    pub log_level: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub page_delay_ms: u64,
    pub batch_delay_ms: u64,
    /// Columns assumed when the destination table cannot be probed.
    pub fallback_schema: DestinationSchema,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("app_key", &self.app_key)
            .field("app_secret", &"[redacted]")
            .field("server_url", &self.server_url)
            .field("supabase_url", &self.supabase_url)
            .field("supabase_key", &"[redacted]")
            .field("supabase_table", &self.supabase_table)
            .field("log_level", &self.log_level)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("page_delay_ms", &self.page_delay_ms)
            .field("batch_delay_ms", &self.batch_delay_ms)
            .field("fallback_schema", &self.fallback_schema.len())
            .finish()
    }
}
