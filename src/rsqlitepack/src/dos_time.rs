//! DOS-format date/time packing, as used by every ZIP local header and central entry.
//!
//! | Word | Bits  | Field                  |
//! | ---- | ----- | ---------------------- |
//! | date | 9-15  | year - 1980            |
//! | date | 5-8   | month (1-12)           |
//! | date | 0-4   | day (1-31)             |
//! | time | 11-15 | hour (0-23)            |
//! | time | 5-10  | minute (0-59)          |
//! | time | 0-4   | second / 2             |

use chrono::{Datelike, TimeZone, Timelike};

/// Packs a local civil time into (date, time) words. Timestamps before 1980 clamp to the DOS epoch,
/// matching every real ZIP writer's behavior for pre-epoch files rather than overflowing the 7-bit
/// year field.
pub fn pack(local: chrono::DateTime<chrono::Local>) -> (u16, u16) {
    let year = local.year();
    let dos_year = if year < 1980 { 0 } else { (year - 1980) as u16 };

    let date = (dos_year << 9) | ((local.month() as u16) << 5) | (local.day() as u16);
    let time = ((local.hour() as u16) << 11) | ((local.minute() as u16) << 5) | ((local.second() / 2) as u16);
    (date, time)
}

/// Converts a `SystemTime` (as returned by `Metadata::modified()`) into DOS date/time in local
/// civil time.
pub fn pack_system_time(time: std::time::SystemTime) -> (u16, u16) {
    let secs = time
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);
    let utc = chrono::Utc.timestamp_opt(secs, 0).single().unwrap_or_else(|| chrono::Utc.timestamp_opt(0, 0).unwrap());
    pack(utc.with_timezone(&chrono::Local))
}
