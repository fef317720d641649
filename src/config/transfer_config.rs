use std::time::Duration;

#[derive(serde::Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct TransferConfig {
    /// Records per append call
    pub batch_size: usize,
    /// Pause after each full batch, keeps the Sheets API under its per-minute quota
    pub batch_delay_ms: u64,
    /// Where every batch is appended
    pub anchor: String,
    /// Range wiped by `import` before transferring
    pub clear_range: String,
}

impl Default for TransferConfig {
    fn default() -> Self {
        TransferConfig {
            batch_size: 50,
            batch_delay_ms: 1000,
            anchor: "Sheet1!A4".to_owned(),
            clear_range: "Sheet1!A4:L".to_owned(),
        }
    }
}

impl TransferConfig {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}
