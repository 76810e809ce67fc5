//! Daily trigger: sleep until the next local run time, run, repeat.
//!
//! There is no catch-up. If the process is down at the trigger time that
//! day's digest is simply skipped, and a failed run is logged and left for
//! the next day.

use crate::job::DigestJob;
use crate::mailer::Mailer;
use crate::sources::NewsSource;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::time::Duration as StdDuration;
use tokio::time::sleep;
use tracing::{error, info, instrument};

/// The next occurrence of `at` (local wall-clock time) strictly after `now`.
///
/// A wall-clock time skipped by a DST change resolves an hour later; one
/// that occurs twice resolves to the earlier instant.
pub fn next_run_time(now: DateTime<Tz>, at: NaiveTime) -> DateTime<Tz> {
    let tz = now.timezone();
    let today = now.date_naive();
    let run = resolve_local(&tz, today, at);
    if now < run {
        run
    } else {
        resolve_local(&tz, today + Duration::days(1), at)
    }
}

fn resolve_local(tz: &Tz, date: NaiveDate, at: NaiveTime) -> DateTime<Tz> {
    let naive = date.and_time(at);
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .unwrap_or_else(|| tz.from_utc_datetime(&naive))
}

/// The slot to wait for after `previous`, the slot that last ran.
///
/// Never returns `previous` itself, even when the clock still reads a little
/// before it after a fast run.
pub fn following_run_time(now: DateTime<Tz>, previous: Option<DateTime<Tz>>, at: NaiveTime) -> DateTime<Tz> {
    match previous {
        Some(prev) if prev >= now => next_run_time(prev, at),
        _ => next_run_time(now, at),
    }
}

/// How long to sleep until `run_at`, rounded up to whole seconds; never less
/// than one second.
pub fn sleep_until(now: DateTime<Tz>, run_at: DateTime<Tz>) -> StdDuration {
    let millis = (run_at - now).num_milliseconds().max(1000);
    StdDuration::from_secs((millis as u64).div_ceil(1000))
}

/// Run `job` every day at `at` in the job's time zone. Never returns.
#[instrument(level = "info", skip_all, fields(%at))]
pub async fn run_scheduler<S, M>(job: &DigestJob<S, M>, at: NaiveTime)
where
    S: NewsSource,
    M: Mailer,
{
    let tz = job.options().timezone;
    info!(timezone = %tz.name(), "Scheduler started; digest runs daily at {}", at.format("%H:%M"));

    let mut previous = None;
    loop {
        let now = Utc::now().with_timezone(&tz);
        let run_at = following_run_time(now, previous, at);
        previous = Some(run_at);
        let wait = sleep_until(now, run_at);
        info!(next_run = %run_at.to_rfc3339(), wait_secs = wait.as_secs(), "Waiting for next run");
        sleep(wait).await;

        match job.run(Utc::now(), &mut std::io::stdout()).await {
            Ok(report) => info!(articles = report.article_count, delivery = ?report.delivery, "Scheduled run finished"),
            Err(e) => error!(error = %e, "Scheduled run failed; will retry at the next trigger"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use chrono_tz::America::Los_Angeles;

    fn eight() -> NaiveTime {
        NaiveTime::from_hms_opt(8, 0, 0).unwrap()
    }

    fn la(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Tz> {
        Los_Angeles.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_next_run_later_today() {
        let next = next_run_time(la(2025, 5, 6, 7, 59), eight());
        assert_eq!(next, la(2025, 5, 6, 8, 0));
    }

    #[test]
    fn test_next_run_at_exact_time_is_tomorrow() {
        let next = next_run_time(la(2025, 5, 6, 8, 0), eight());
        assert_eq!(next, la(2025, 5, 7, 8, 0));
    }

    #[test]
    fn test_next_run_after_time_is_tomorrow() {
        let next = next_run_time(la(2025, 12, 31, 23, 30), eight());
        assert_eq!(next, la(2026, 1, 1, 8, 0));
    }

    #[test]
    fn test_next_run_across_spring_forward() {
        // 2025-03-09 02:30 does not exist in Los Angeles
        let at = NaiveTime::from_hms_opt(2, 30, 0).unwrap();
        let next = next_run_time(la(2025, 3, 8, 23, 0), at);
        assert_eq!(next.date_naive(), NaiveDate::from_ymd_opt(2025, 3, 9).unwrap());
        assert_eq!((next.hour(), next.minute()), (3, 30));
    }

    #[test]
    fn test_next_run_across_fall_back_takes_earliest() {
        // 2025-11-02 01:30 occurs twice; the PDT one comes first
        let at = NaiveTime::from_hms_opt(1, 30, 0).unwrap();
        let next = next_run_time(la(2025, 11, 1, 12, 0), at);
        assert_eq!(
            next.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2025, 11, 2, 8, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_next_run_keeps_wall_clock_over_dst() {
        // 8:00 PDT on the spring-forward day is only 22h after 9:00 PST the day before
        let now = la(2025, 3, 8, 9, 0);
        let next = next_run_time(now, eight());
        assert_eq!(next, la(2025, 3, 9, 8, 0));
        assert_eq!(sleep_until(now, next), StdDuration::from_secs(22 * 3600));
    }

    #[test]
    fn test_sleep_until_floor() {
        let now = la(2025, 5, 6, 8, 0);
        assert_eq!(sleep_until(now, now), StdDuration::from_secs(1));
        assert_eq!(sleep_until(now, la(2025, 5, 6, 7, 0)), StdDuration::from_secs(1));
        assert_eq!(sleep_until(now, la(2025, 5, 6, 9, 0)), StdDuration::from_secs(3600));
    }

    #[test]
    fn test_sleep_until_rounds_up_partial_seconds() {
        let now = la(2025, 5, 6, 7, 0) + Duration::milliseconds(500);
        let wait = sleep_until(now, la(2025, 5, 6, 8, 0));
        assert_eq!(wait, StdDuration::from_secs(3600));
        assert!(now + Duration::from_std(wait).unwrap() >= la(2025, 5, 6, 8, 0));
    }

    #[test]
    fn test_same_slot_never_scheduled_twice() {
        let now = la(2025, 5, 6, 7, 0) + Duration::milliseconds(500);
        let first = following_run_time(now, None, eight());
        assert_eq!(first, la(2025, 5, 6, 8, 0));

        // a fast run that finishes while the clock still reads just before 08:00
        let woke = first - Duration::milliseconds(500);
        let second = following_run_time(woke, Some(first), eight());
        assert_eq!(second, la(2025, 5, 7, 8, 0));
    }

    #[test]
    fn test_following_run_after_long_run() {
        // the run overran into the evening; tomorrow's slot is still next
        let first = la(2025, 5, 6, 8, 0);
        let second = following_run_time(la(2025, 5, 6, 20, 0), Some(first), eight());
        assert_eq!(second, la(2025, 5, 7, 8, 0));
    }
}
