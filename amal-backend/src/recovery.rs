//! Abandoned-checkout recovery email gating.
//!
//! Five emails on a fixed schedule after abandonment. A minimum gap between
//! consecutive sends keeps a backlog (server downtime, long poll intervals)
//! from firing several steps at once.

use chrono::{DateTime, Duration, Utc};

/// Hours after abandonment at which each recovery email becomes due
pub const RECOVERY_SCHEDULE_HOURS: [i64; 5] = [1, 24, 72, 120, 168];

/// Minimum spacing between consecutive recovery emails
pub const MIN_EMAIL_GAP_HOURS: i64 = 12;

pub const MAX_RECOVERY_EMAILS: i32 = RECOVERY_SCHEDULE_HOURS.len() as i32;

/// Decide whether the next recovery email should go out now.
///
/// Returns the zero-based step to send, or None if the checkout is not due:
/// all emails sent, the schedule point not reached, or the previous email
/// too recent.
pub fn next_email_step(
    emails_sent: i32,
    abandoned_at: DateTime<Utc>,
    last_email_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<usize> {
    if emails_sent < 0 || emails_sent >= MAX_RECOVERY_EMAILS {
        return None;
    }
    let step = emails_sent as usize;

    let due = abandoned_at + Duration::hours(RECOVERY_SCHEDULE_HOURS[step]);
    if now < due {
        return None;
    }

    if let Some(last) = last_email_at {
        if now < last + Duration::hours(MIN_EMAIL_GAP_HOURS) {
            return None;
        }
    }

    Some(step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()
    }

    #[test]
    fn first_email_waits_an_hour() {
        let abandoned = utc(2026, 3, 1, 10);
        assert_eq!(next_email_step(0, abandoned, None, utc(2026, 3, 1, 10)), None);
        assert_eq!(
            next_email_step(0, abandoned, None, utc(2026, 3, 1, 11)),
            Some(0)
        );
    }

    #[test]
    fn second_email_gated_by_schedule_not_just_gap() {
        let abandoned = utc(2026, 3, 1, 10);
        let first_sent = utc(2026, 3, 1, 11);
        // 13 hours later: past the min gap, but the 24h point hasn't arrived
        assert_eq!(
            next_email_step(1, abandoned, Some(first_sent), utc(2026, 3, 2, 0)),
            None
        );
        // Day two: due
        assert_eq!(
            next_email_step(1, abandoned, Some(first_sent), utc(2026, 3, 2, 11)),
            Some(1)
        );
    }

    #[test]
    fn backlog_is_throttled_by_min_gap() {
        // Server was down for a week; steps 0 and 1 both overdue.
        let abandoned = utc(2026, 3, 1, 10);
        let now = utc(2026, 3, 8, 10);
        assert_eq!(next_email_step(0, abandoned, None, now), Some(0));

        // Step 1 is overdue too, but the email just sent holds it back
        assert_eq!(next_email_step(1, abandoned, Some(now), now), None);
        assert_eq!(
            next_email_step(1, abandoned, Some(now), now + Duration::hours(MIN_EMAIL_GAP_HOURS)),
            Some(1)
        );
    }

    #[test]
    fn no_sixth_email() {
        let abandoned = utc(2026, 3, 1, 10);
        let now = utc(2026, 4, 1, 10);
        assert_eq!(next_email_step(5, abandoned, Some(abandoned), now), None);
    }

    #[test]
    fn final_email_lands_a_week_out() {
        let abandoned = utc(2026, 3, 1, 10);
        let last = utc(2026, 3, 6, 10);
        assert_eq!(
            next_email_step(4, abandoned, Some(last), utc(2026, 3, 8, 9)),
            None
        );
        assert_eq!(
            next_email_step(4, abandoned, Some(last), utc(2026, 3, 8, 10)),
            Some(4)
        );
    }
}
