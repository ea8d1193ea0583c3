/// Port of the Locust web UI and control API.
pub(crate) const DEFAULT_CONTROL_PORT: u16 = 8089;
pub(crate) const DEFAULT_LOCUST_BIN: &str = "locust";
pub(crate) const DEFAULT_REPORT_DIR: &str = "reports";
pub(crate) const DEFAULT_POLL_ATTEMPTS: u32 = 5;
pub(crate) const DEFAULT_POLL_INTERVAL: &str = "3s";
pub(crate) const DEFAULT_REQUEST_TIMEOUT: &str = "10s";
/// Script extension accepted by the Locust engine.
pub(crate) const SCRIPT_EXTENSION: &str = ".py";

/// Slave processes started when `SLAVE_MUL` is unset: two per logical CPU plus one.
#[must_use]
pub fn default_worker_count() -> usize {
    num_cpus::get().saturating_mul(2).saturating_add(1)
}
