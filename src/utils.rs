//! Request number generation

use chrono::{Datelike, Utc};
use uuid7::uuid7;

/// Construct a request number in the `CM-<year>-<4 digits>` format.
/// Best effort only: callers must check the result against existing
/// numbers and retry on collision.
pub fn new_request_number() -> String {
    let year = Utc::now().year();
    let id = uuid7();
    // the tail of a uuid7 is random
    let entropy = u16::from_be_bytes([id.as_bytes()[14], id.as_bytes()[15]]);
    let digits = 1000 + u32::from(entropy) % 9000;
    format!("CM-{year}-{digits}")
}
