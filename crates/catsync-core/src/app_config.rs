use std::path::PathBuf;

#[derive(Clone)]
pub struct AppConfig {
    /// Bare store domain, e.g. `"example.myshopify.com"`.
    pub store_domain: String,
    pub access_token: String,
    pub api_version: String,
    pub log_level: String,
    pub suppliers_path: PathBuf,
    /// Directory holding per-supplier image cache and progress cursor files.
    pub state_dir: PathBuf,
    pub request_timeout_secs: u64,
    /// Fixed pause between remote calls on the non-error path.
    pub inter_call_delay_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub retry_backoff_max_ms: u64,
    /// Inventory location; when `None` the first location on the store is used.
    pub location_id: Option<u64>,
    pub image_max_bytes: u64,
    pub image_max_pixels: u32,
}

impl AppConfig {
    /// Base URL of the Admin REST API, e.g.
    /// `"https://example.myshopify.com/admin/api/2023-04"`.
    #[must_use]
    pub fn admin_base_url(&self) -> String {
        format!(
            "https://{}/admin/api/{}",
            self.store_domain, self.api_version
        )
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("store_domain", &self.store_domain)
            .field("access_token", &"[redacted]")
            .field("api_version", &self.api_version)
            .field("log_level", &self.log_level)
            .field("suppliers_path", &self.suppliers_path)
            .field("state_dir", &self.state_dir)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("inter_call_delay_ms", &self.inter_call_delay_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("retry_backoff_max_ms", &self.retry_backoff_max_ms)
            .field("location_id", &self.location_id)
            .field("image_max_bytes", &self.image_max_bytes)
            .field("image_max_pixels", &self.image_max_pixels)
            .finish()
    }
}
