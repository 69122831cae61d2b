use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Day-granularity validity of an offer, as shown to guests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidityLabel {
    Expired,
    ExpiresToday,
    ExpiresTomorrow,
    DaysLeft(i64),
    ValidTill(NaiveDate),
}

impl fmt::Display for ValidityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expired => f.write_str("Expired"),
            Self::ExpiresToday => f.write_str("Expires today!"),
            Self::ExpiresTomorrow => f.write_str("Expires tomorrow!"),
            Self::DaysLeft(days) => write!(f, "{days} days left"),
            Self::ValidTill(date) => write!(f, "Valid till {}", date.format("%b %-d, %Y")),
        }
    }
}

/// Compares calendar dates in `zone`, never elapsed hours: an offer valid till
/// 00:30 tomorrow "expires tomorrow" even when it is 23:59 now.
pub fn validity_label(
    valid_till: DateTime<Utc>,
    now: DateTime<Utc>,
    zone: &FixedOffset,
) -> ValidityLabel {
    let today = now.with_timezone(zone).date_naive();
    let last_day = valid_till.with_timezone(zone).date_naive();

    match (last_day - today).num_days() {
        days if days < 0 => ValidityLabel::Expired,
        0 => ValidityLabel::ExpiresToday,
        1 => ValidityLabel::ExpiresTomorrow,
        days @ 2..=7 => ValidityLabel::DaysLeft(days),
        _ => ValidityLabel::ValidTill(last_day),
    }
}
