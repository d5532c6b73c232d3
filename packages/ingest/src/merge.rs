//! Left join of collisions onto the holiday table by date.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use crash_map_crash_models::{CrashRecord, HolidayRecord, MergedRecord};

/// Joins each collision with the holiday on its crash date, if any.
///
/// Every collision appears exactly once in the output, in input order.
/// Holiday dates are unique after cleansing; should duplicates slip
/// through, the first one wins.
#[must_use]
pub fn merge_holidays(crashes: Vec<CrashRecord>, holidays: &[HolidayRecord]) -> Vec<MergedRecord> {
    let mut by_date: BTreeMap<NaiveDate, &str> = BTreeMap::new();
    for holiday in holidays {
        by_date
            .entry(holiday.holiday_date)
            .or_insert(holiday.holiday_name.as_str());
    }

    let merged: Vec<MergedRecord> = crashes
        .into_iter()
        .map(|crash| {
            let holiday_name = crash
                .crash_date
                .and_then(|date| by_date.get(&date))
                .map(|name| (*name).to_string());

            MergedRecord {
                is_public_holiday: holiday_name.is_some(),
                holiday_name,
                crash,
            }
        })
        .collect();

    let on_holidays = merged.iter().filter(|r| r.is_public_holiday).count();
    log::info!(
        "Merged {} collisions with {} holidays: {on_holidays} collisions on a public holiday",
        merged.len(),
        holidays.len()
    );
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn crash(id: &str, crash_date: Option<NaiveDate>) -> CrashRecord {
        CrashRecord {
            collision_id: id.to_string(),
            crash_date,
            ..CrashRecord::default()
        }
    }

    #[test]
    fn flags_holiday_crashes_and_keeps_all() {
        let holidays = vec![
            HolidayRecord {
                holiday_date: date(2023, 1, 1),
                holiday_name: "New Year's Day".to_string(),
            },
            HolidayRecord {
                holiday_date: date(2023, 7, 4),
                holiday_name: "Independence Day".to_string(),
            },
        ];
        let crashes = vec![
            crash("a", Some(date(2023, 1, 1))),
            crash("b", Some(date(2023, 1, 2))),
            crash("c", None),
            crash("d", Some(date(2023, 7, 4))),
            crash("e", Some(date(2023, 1, 1))),
        ];

        let merged = merge_holidays(crashes, &holidays);

        assert_eq!(merged.len(), 5);
        let ids: Vec<&str> = merged.iter().map(|r| r.crash.collision_id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c", "d", "e"]);

        let flags: Vec<bool> = merged.iter().map(|r| r.is_public_holiday).collect();
        assert_eq!(flags, [true, false, false, true, true]);
        assert_eq!(merged[0].holiday_name.as_deref(), Some("New Year's Day"));
        assert_eq!(merged[3].holiday_name.as_deref(), Some("Independence Day"));
        assert!(merged[1].holiday_name.is_none());
    }

    #[test]
    fn empty_holiday_table_flags_nothing() {
        let merged = merge_holidays(vec![crash("a", Some(date(2023, 1, 1)))], &[]);
        assert_eq!(merged.len(), 1);
        assert!(!merged[0].is_public_holiday);
    }
}
