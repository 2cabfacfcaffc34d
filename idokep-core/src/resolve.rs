//! Turning the partial dates and times printed on the pages into full ones.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use tracing::error;

use crate::{
    error::{Result, ScrapeError},
    model::{Condition, ConditionValue},
};

/// Expand a bare day-of-month into a date no earlier than `reference`'s month.
///
/// The daily forecast prints only the day number and never spans more than
/// about ten days, so a day smaller than today's belongs to the next month.
pub fn resolve_date(day: u32, reference: NaiveDate) -> Result<NaiveDate> {
    let (mut year, mut month) = (reference.year(), reference.month());

    if day < reference.day() {
        if month == 12 {
            month = 1;
            year += 1;
        } else {
            month += 1;
        }
    }

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        error!(
            day,
            month,
            year,
            reference = %reference,
            "Forecast day does not exist in resolved month"
        );
        ScrapeError::InvalidDate { year, month, day }
    })
}

/// Swap `sunny` for `clear-night` when `observed` falls outside daylight.
///
/// Only times of day are compared, so all three must refer to the same day.
pub fn apply_daynight(
    condition: ConditionValue,
    observed: NaiveTime,
    sunrise: NaiveTime,
    sunset: NaiveTime,
) -> ConditionValue {
    if condition.is(Condition::Sunny) && (observed > sunset || observed < sunrise) {
        ConditionValue::Mapped(Condition::ClearNight)
    } else {
        condition
    }
}

/// Dates the hourly cards, which list times without dates.
///
/// Whenever an hour is lower than the one before it the list has wrapped past
/// midnight and the date moves forward by one day.
#[derive(Debug, Clone)]
pub struct HourlyTimeline {
    date: NaiveDate,
    previous_hour: u32,
}

impl HourlyTimeline {
    pub fn starting(date: NaiveDate) -> Self {
        Self {
            date,
            previous_hour: 0,
        }
    }

    pub fn advance(&mut self, time: NaiveTime) -> NaiveDateTime {
        let hour = time.hour();
        if hour < self.previous_hour {
            // Past chrono's last representable date the timeline stays on it
            // instead of failing the cycle.
            self.date = self
                .date
                .checked_add_days(Days::new(1))
                .unwrap_or(self.date);
        }
        self.previous_hour = hour;
        self.date.and_time(time)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn smaller_day_rolls_into_next_month() {
        assert_eq!(resolve_date(5, date(2024, 1, 20)).unwrap(), date(2024, 2, 5));
    }

    #[test]
    fn same_or_larger_day_stays_in_month() {
        assert_eq!(resolve_date(25, date(2024, 1, 20)).unwrap(), date(2024, 1, 25));
        assert_eq!(resolve_date(20, date(2024, 1, 20)).unwrap(), date(2024, 1, 20));
    }

    #[test]
    fn december_rolls_into_next_year() {
        assert_eq!(resolve_date(3, date(2024, 12, 20)).unwrap(), date(2025, 1, 3));
    }

    #[test]
    fn impossible_date_is_an_error() {
        assert_eq!(resolve_date(31, date(2024, 1, 20)).unwrap(), date(2024, 1, 31));
        assert!(matches!(
            resolve_date(31, date(2024, 2, 10)),
            Err(ScrapeError::InvalidDate {
                year: 2024,
                month: 2,
                day: 31,
            })
        ));

        // Rolled forward from January into February.
        match resolve_date(30, date(2023, 1, 31)) {
            Err(ScrapeError::InvalidDate { year, month, day }) => {
                assert_eq!((year, month, day), (2023, 2, 30));
            }
            other => panic!("expected InvalidDate, got {other:?}"),
        }
    }

    #[test]
    fn day_31_in_thirty_day_month_fails() {
        let err = resolve_date(31, date(2024, 4, 2)).unwrap_err();
        assert!(err.to_string().contains("day 31 does not exist in 2024-04"));
    }

    #[test]
    fn sunny_after_sunset_is_clear_night() {
        let sunny = ConditionValue::Mapped(Condition::Sunny);
        let result = apply_daynight(sunny, time(22, 0), time(6, 30), time(16, 45));
        assert_eq!(result, ConditionValue::Mapped(Condition::ClearNight));
    }

    #[test]
    fn sunny_before_sunrise_is_clear_night() {
        let sunny = ConditionValue::Mapped(Condition::Sunny);
        let result = apply_daynight(sunny, time(5, 0), time(6, 30), time(16, 45));
        assert_eq!(result.as_str(), "clear-night");
    }

    #[test]
    fn sunny_during_the_day_is_untouched() {
        let sunny = ConditionValue::Mapped(Condition::Sunny);
        let result = apply_daynight(sunny, time(12, 0), time(6, 30), time(16, 45));
        assert_eq!(result.as_str(), "sunny");

        // Boundaries count as daylight.
        let sunny = ConditionValue::Mapped(Condition::Sunny);
        let at_sunset = apply_daynight(sunny, time(16, 45), time(6, 30), time(16, 45));
        assert_eq!(at_sunset.as_str(), "sunny");
    }

    #[test]
    fn other_conditions_are_untouched_at_night() {
        let rainy = ConditionValue::Mapped(Condition::Rainy);
        let result = apply_daynight(rainy, time(22, 0), time(6, 30), time(16, 45));
        assert_eq!(result.as_str(), "rainy");

        let raw = ConditionValue::Raw("sunny".to_string());
        assert_eq!(
            apply_daynight(raw.clone(), time(22, 0), time(6, 30), time(16, 45)),
            raw
        );
    }

    #[test]
    fn hour_wraparound_moves_to_next_day() {
        let start = date(2024, 1, 20);
        let mut timeline = HourlyTimeline::starting(start);

        let stamps: Vec<_> = [22, 23, 0, 1]
            .into_iter()
            .map(|h| timeline.advance(time(h, 0)))
            .collect();

        assert_eq!(
            stamps,
            vec![
                start.and_time(time(22, 0)),
                start.and_time(time(23, 0)),
                date(2024, 1, 21).and_time(time(0, 0)),
                date(2024, 1, 21).and_time(time(1, 0)),
            ]
        );
    }

    #[test]
    fn first_card_at_midnight_stays_on_start_date() {
        let start = date(2024, 12, 31);
        let mut timeline = HourlyTimeline::starting(start);

        assert_eq!(timeline.advance(time(0, 0)), start.and_time(time(0, 0)));
        assert_eq!(timeline.advance(time(23, 0)), start.and_time(time(23, 0)));
        assert_eq!(
            timeline.advance(time(0, 0)),
            date(2025, 1, 1).and_time(time(0, 0))
        );
        assert_eq!(timeline.date(), date(2025, 1, 1));
    }

    #[test]
    fn wraparound_on_last_representable_date_keeps_it() {
        let mut timeline = HourlyTimeline::starting(NaiveDate::MAX);

        timeline.advance(time(23, 0));
        assert_eq!(
            timeline.advance(time(0, 0)),
            NaiveDate::MAX.and_time(time(0, 0))
        );
        assert_eq!(timeline.date(), NaiveDate::MAX);
    }

    #[test]
    fn repeated_hour_does_not_roll() {
        let start = date(2024, 1, 20);
        let mut timeline = HourlyTimeline::starting(start);

        timeline.advance(time(10, 0));
        assert_eq!(
            timeline.advance(time(10, 30)),
            start.and_time(time(10, 30))
        );
    }
}
