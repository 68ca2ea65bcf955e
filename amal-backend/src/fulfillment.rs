//! Fulfillment schedule arithmetic.
//!
//! A paid donation gets two timestamps: `fulfill_at`, when it counts as
//! delivered to its purpose, and `email_at`, when the confirmation email
//! goes out. The confirmation is normalized to early afternoon on the
//! donor's local clock so it never lands at 4 AM.

use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};

use crate::models::{Campaign, FulfillmentKind};

/// Standard campaigns fulfill this long after payment
pub const FULFILL_DELAY_HOURS: i64 = 24;

/// Local wall-clock time for the confirmation email
pub const EMAIL_LOCAL_HOUR: u32 = 13;
pub const EMAIL_LOCAL_MINUTE: u32 = 30;

/// Largest real-world UTC offset is UTC+14; anything beyond is client garbage
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// Holiday window for seasonal campaigns (Qurbani, Ramadan zakat drives)
#[derive(Debug, Clone, Copy)]
pub struct FulfillmentWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Resolve a campaign's holiday window, if it has one.
///
/// Standard campaigns and seasonal campaigns with missing or inverted
/// bounds get no window (the fixed delay applies instead).
pub fn campaign_window(campaign: &Campaign) -> Option<FulfillmentWindow> {
    if campaign.fulfillment_kind_enum() != Some(FulfillmentKind::Seasonal) {
        return None;
    }
    let start = parse(campaign.window_start.as_deref()?)?;
    let end = parse(campaign.window_end.as_deref()?)?;
    if end <= start {
        return None;
    }
    Some(FulfillmentWindow { start, end })
}

fn parse(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Compute when a donation is fulfilled.
///
/// Standard campaigns: a fixed delay after payment. Seasonal campaigns are
/// anchored to the holiday window: paid early -> fulfilled when the window
/// opens; paid during -> the usual delay, capped at the window close; paid
/// after the window (late donation) -> the usual delay.
pub fn fulfill_time(paid_at: DateTime<Utc>, window: Option<&FulfillmentWindow>) -> DateTime<Utc> {
    let delayed = paid_at + Duration::hours(FULFILL_DELAY_HOURS);

    match window {
        None => delayed,
        Some(w) => {
            if paid_at < w.start {
                w.start
            } else if paid_at <= w.end {
                delayed.min(w.end)
            } else {
                delayed
            }
        }
    }
}

/// Compute when the confirmation email goes out: the fulfillment instant
/// shifted to 13:30 on the donor's local clock, advancing a day if 13:30
/// has already passed locally.
///
/// `tz_offset_minutes` is minutes east of UTC as reported by the checkout
/// page (`-new Date().getTimezoneOffset()`); implausible values fall back
/// to UTC.
pub fn email_time(fulfill_at: DateTime<Utc>, tz_offset_minutes: i32) -> DateTime<Utc> {
    let offset_minutes = if tz_offset_minutes.abs() > MAX_OFFSET_MINUTES {
        0
    } else {
        tz_offset_minutes
    };
    let offset = match FixedOffset::east_opt(offset_minutes * 60) {
        Some(o) => o,
        None => return fulfill_at,
    };

    let local = fulfill_at.with_timezone(&offset);
    let at_send_hour = local
        .date_naive()
        .and_hms_opt(EMAIL_LOCAL_HOUR, EMAIL_LOCAL_MINUTE, 0)
        .and_then(|naive| offset.from_local_datetime(&naive).single());

    let mut candidate = match at_send_hour {
        Some(dt) => dt,
        // Unreachable for a fixed offset, but don't lose the email over it
        None => return fulfill_at,
    };
    if candidate < local {
        candidate += Duration::days(1);
    }

    candidate.with_timezone(&Utc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn standard_donation_fulfills_a_day_later() {
        let paid = utc(2026, 3, 10, 9, 15);
        assert_eq!(fulfill_time(paid, None), utc(2026, 3, 11, 9, 15));
    }

    #[test]
    fn early_seasonal_donation_waits_for_window_open() {
        let window = FulfillmentWindow {
            start: utc(2026, 5, 27, 0, 0),
            end: utc(2026, 5, 30, 0, 0),
        };
        let paid = utc(2026, 4, 1, 12, 0);
        assert_eq!(fulfill_time(paid, Some(&window)), window.start);
    }

    #[test]
    fn in_window_donation_keeps_delay_but_caps_at_close() {
        let window = FulfillmentWindow {
            start: utc(2026, 5, 27, 0, 0),
            end: utc(2026, 5, 30, 0, 0),
        };
        // Mid-window: plain 24h delay
        let paid = utc(2026, 5, 27, 8, 0);
        assert_eq!(fulfill_time(paid, Some(&window)), utc(2026, 5, 28, 8, 0));

        // Last day: delay would overshoot the window, so it caps
        let late = utc(2026, 5, 29, 20, 0);
        assert_eq!(fulfill_time(late, Some(&window)), window.end);
    }

    #[test]
    fn post_window_donation_falls_back_to_delay() {
        let window = FulfillmentWindow {
            start: utc(2026, 5, 27, 0, 0),
            end: utc(2026, 5, 30, 0, 0),
        };
        let paid = utc(2026, 6, 15, 10, 0);
        assert_eq!(fulfill_time(paid, Some(&window)), utc(2026, 6, 16, 10, 0));
    }

    #[test]
    fn email_lands_at_half_past_one_local() {
        // Fulfillment at 08:00 UTC, donor at UTC+3 -> 11:00 local,
        // so 13:30 local the same day = 10:30 UTC
        let fulfill = utc(2026, 3, 11, 8, 0);
        assert_eq!(email_time(fulfill, 180), utc(2026, 3, 11, 10, 30));
    }

    #[test]
    fn email_advances_a_day_when_send_hour_already_passed() {
        // Fulfillment at 20:00 UTC, donor at UTC-5 -> 15:00 local,
        // past 13:30, so next day 13:30 local = 18:30 UTC
        let fulfill = utc(2026, 3, 11, 20, 0);
        assert_eq!(email_time(fulfill, -300), utc(2026, 3, 12, 18, 30));
    }

    #[test]
    fn email_exactly_at_send_hour_sends_same_day() {
        // 13:30 local on the nose does not get pushed a day
        let fulfill = utc(2026, 3, 11, 13, 30);
        assert_eq!(email_time(fulfill, 0), utc(2026, 3, 11, 13, 30));
    }

    #[test]
    fn garbage_offset_falls_back_to_utc() {
        let fulfill = utc(2026, 3, 11, 8, 0);
        assert_eq!(email_time(fulfill, 100_000), email_time(fulfill, 0));
    }
}
