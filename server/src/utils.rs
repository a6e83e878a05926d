use std::time::{Duration, SystemTime, UNIX_EPOCH};

const BANNER_RULE: &str = "============================";

// Get current timestamp in milliseconds
pub fn get_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis() as u64
}

// Frame a match announcement between two rules
pub fn banner(text: &str) -> String {
    format!("{}\n{}\n{}", BANNER_RULE, text, BANNER_RULE)
}
