use bigdecimal::BigDecimal;

use crate::database::models::{AbsenceRequest, RequestType};

const HOURS_PER_WORKDAY: u32 = 8;

/// Monetary effect of an approved request on the employee's pay.
///
/// Paid days add `daily_salary` each and unpaid days subtract it. Hourly
/// requests (late entry, early exit) with an hours-per-day figure deduct the
/// hourly rate for those hours on every day of the range instead. Without a
/// breakdown, unpaid leave counts every day as unpaid and any other type
/// counts every day as paid.
pub fn incidence_amount(request: &AbsenceRequest, daily_salary: &BigDecimal) -> BigDecimal {
    if request.request_type.is_hourly() {
        if let Some(hours) = &request.hours_per_day {
            let hourly_rate = daily_salary / BigDecimal::from(HOURS_PER_WORKDAY);
            return -(hourly_rate * hours * &request.total_days).round(2);
        }
    }

    let (paid, unpaid) = match (&request.paid_days, &request.unpaid_days) {
        (None, None) if request.request_type == RequestType::UnpaidLeave => {
            (BigDecimal::from(0), request.total_days.clone())
        }
        (None, None) => (request.total_days.clone(), BigDecimal::from(0)),
        (paid, unpaid) => (
            paid.clone().unwrap_or_default(),
            unpaid.clone().unwrap_or_default(),
        ),
    };

    (daily_salary * (paid - unpaid)).round(2)
}
