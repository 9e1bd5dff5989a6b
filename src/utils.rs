pub mod logging;
pub mod retry;

use chrono::{DateTime, Local};

/// Short local timestamp used in operator-facing notices, e.g. `241116 18:05:09`.
pub fn timestamp() -> String {
    format_timestamp(&Local::now())
}

pub fn format_timestamp(at: &DateTime<Local>) -> String {
    at.format("%y%m%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::{Local, TimeZone};

    use super::format_timestamp;

    #[test]
    fn timestamp_uses_two_digit_year_and_padded_fields() {
        let at = Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 1).unwrap();
        assert_eq!(format_timestamp(&at), "240307 09:05:01");
    }
}
