use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Timelike, Utc, Weekday};
use chrono_tz::Tz;

use crate::database::models::Classification;

/// Local hour on a Friday from which that Friday's cutoff is considered missed
const FRIDAY_ROLLOVER_HOUR: u32 = 23;

/// Next payroll cutoff for a request created or acted on at `reference`.
///
/// Cutoffs fall on Friday at 23:59:59 in the payroll timezone. Blue/gray/union
/// workers are paid weekly; white collar workers are paid biweekly on odd ISO
/// weeks, so an even-week Friday moves to the following one.
pub fn payroll_cutoff(
    reference: DateTime<Utc>,
    classification: &Classification,
    timezone: Tz,
) -> DateTime<Utc> {
    let local = reference.with_timezone(&timezone);
    let today = local.date_naive();

    let mut days_ahead = (Weekday::Fri.num_days_from_monday() + 7
        - today.weekday().num_days_from_monday())
        % 7;
    if days_ahead == 0 && local.hour() >= FRIDAY_ROLLOVER_HOUR {
        days_ahead = 7;
    }

    let mut friday = today + Duration::days(i64::from(days_ahead));
    if !classification.is_blue_gray() && friday.iso_week().week() % 2 == 0 {
        friday += Duration::days(7);
    }

    end_of_day(friday, timezone)
}

/// True when an action at `at` lands after the cutoff
pub fn is_late(at: DateTime<Utc>, cutoff: DateTime<Utc>) -> bool {
    at > cutoff
}

fn end_of_day(date: NaiveDate, timezone: Tz) -> DateTime<Utc> {
    let last_second = NaiveTime::from_hms_opt(23, 59, 59).expect("23:59:59 is a valid time");
    let naive = date.and_time(last_second);

    timezone
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}
