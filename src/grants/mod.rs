//! Government grants catalog: eligibility scoring and application numbering.
//!
//! Catalog records themselves live in [`crate::storage::grants`]; this module
//! holds the pure logic on top of them.

pub mod eligibility;

use chrono::{DateTime, Utc};
use rand::Rng;

/// Grant application numbers: `GA` + compact date + 6 random digits.
pub fn application_number(now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: u32 = rng.gen_range(0..1_000_000);
    format!("GA{}{suffix:06}", now.format("%Y%m%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn application_number_shape() {
        let now = Utc.with_ymd_and_hms(2025, 3, 14, 0, 0, 0).unwrap();
        let number = application_number(now);
        assert!(number.starts_with("GA20250314"));
        assert_eq!(number.len(), 16);
        assert!(number[2..].chars().all(|c| c.is_ascii_digit()));
    }
}
