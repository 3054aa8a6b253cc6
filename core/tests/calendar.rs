//! Calendar helpers: project months, Black Friday and the day sampler.

use chrono::{Datelike, NaiveDate, Weekday};
use geoweights_core::{
    calendar::{
        black_friday_day, default_overrides, nth_weekday_of_month, sample_day_in_month,
        DateOverrides, DaySampling, ProjectRange, YearMonth,
    },
    config::GeoConfig,
    GeoError,
};
use std::collections::BTreeSet;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn ym(y: i32, m: u32) -> YearMonth {
    YearMonth::new(y, m).unwrap()
}

#[test]
fn year_month_arithmetic() {
    assert_eq!(ym(2024, 2).days_in_month(), 29);
    assert_eq!(ym(2023, 2).days_in_month(), 28);
    assert_eq!(ym(2023, 12).days_in_month(), 31);
    assert_eq!(ym(2023, 12).succ(), Some(ym(2024, 1)));
    assert_eq!(ym(2025, 9).months_since(ym(2017, 8)), 97);
    assert_eq!(ym(2017, 8).months_since(ym(2025, 9)), -97);
    assert_eq!(ym(2024, 3).key(), "202403");
    assert_eq!(ym(2024, 3).period(), "2024-03");
    assert_eq!(ym(2024, 3).to_string(), "2024-03");
    assert_eq!(ym(2024, 2).last_day(), date(2024, 2, 29));
    assert_eq!(YearMonth::from_date(date(2024, 3, 17)), ym(2024, 3));
    assert!(matches!(
        YearMonth::new(2024, 0),
        Err(GeoError::InvalidYearMonth { year: 2024, month: 0 })
    ));
}

#[test]
fn project_months_cover_the_range_inclusively() {
    let range = GeoConfig::default_project().range;
    let months = range.project_months();
    assert_eq!(months.len(), 98);
    assert_eq!(range.total_months(), 97);

    let first = &months[0];
    assert_eq!((first.year, first.month, first.days_in_month), (2017, 8, 31));
    assert_eq!(first.period, "2017-08");
    assert_eq!(first.month_start, date(2017, 8, 1));

    let last = months.last().unwrap();
    assert_eq!(last.period, "2025-09");
    assert_eq!(last.month_end, date(2025, 9, 30));

    for pair in months.windows(2) {
        assert!(pair[0].month_start < pair[1].month_start);
        assert_eq!(pair[0].month_end.succ_opt(), Some(pair[1].month_start));
    }
}

#[test]
fn time_fraction_is_clamped_to_the_range() {
    let range = ProjectRange::new(date(2017, 8, 1), date(2025, 9, 30));
    assert_eq!(range.time_fraction(date(2012, 1, 1)), 0.0);
    assert_eq!(range.time_fraction(date(2017, 8, 31)), 0.0);
    assert_eq!(range.time_fraction(date(2025, 9, 1)), 1.0);
    assert_eq!(range.time_fraction(date(2030, 1, 1)), 1.0);
    assert!((range.time_fraction(date(2021, 8, 15)) - 48.0 / 97.0).abs() < 1e-12);

    let single = ProjectRange::new(date(2020, 1, 1), date(2020, 1, 31));
    assert_eq!(single.months().count(), 1);
    assert_eq!(single.time_fraction(date(2020, 1, 10)), 0.0);
}

#[test]
fn black_friday_is_the_fourth_friday_of_november() {
    assert_eq!(black_friday_day(2017).unwrap(), 24);
    assert_eq!(black_friday_day(2019).unwrap(), 22);
    assert_eq!(black_friday_day(2023).unwrap(), 24);
    assert_eq!(black_friday_day(2024).unwrap(), 22);
    for year in 2017..=2025 {
        let day = black_friday_day(year).unwrap();
        assert_eq!(date(year, 11, day).weekday(), Weekday::Fri);
        assert!((22..=28).contains(&day), "{year}: day {day}");
    }

    assert_eq!(nth_weekday_of_month(2023, 2, Weekday::Mon, 1).unwrap(), 6);
    assert!(matches!(
        nth_weekday_of_month(2023, 2, Weekday::Fri, 5),
        Err(GeoError::Calendar { .. })
    ));
}

#[test]
fn default_overrides_pin_every_november() {
    let range = GeoConfig::default_project().range;
    let overrides = default_overrides(&range).unwrap();
    let periods: Vec<&str> = overrides.by_period_day.keys().map(String::as_str).collect();
    assert_eq!(
        periods,
        vec!["2017-11", "2018-11", "2019-11", "2020-11", "2021-11", "2022-11", "2023-11", "2024-11"]
    );
    assert_eq!(overrides.fixed_day(ym(2019, 11)), Some(22));
    assert_eq!(overrides.fixed_day(ym(2019, 10)), None);
}

#[test]
fn day_sampler_is_deterministic_and_inside_the_month() {
    let month = ym(2024, 2);
    let sampling = DaySampling { unique_key: Some("cust-1"), ..DaySampling::default() };
    let a = sample_day_in_month(month, &sampling).unwrap();
    let b = sample_day_in_month(month, &sampling).unwrap();
    assert_eq!(a, b);

    let mut days = BTreeSet::new();
    for i in 0..400 {
        let key = format!("cust-{i}");
        let sampling = DaySampling { unique_key: Some(&key), ..DaySampling::default() };
        let d = sample_day_in_month(month, &sampling).unwrap();
        assert_eq!((d.year(), d.month()), (2024, 2));
        days.insert(d.day());
    }
    assert!(days.len() > 20, "only {} distinct days drawn", days.len());
    assert!(days.contains(&29), "leap day never drawn");
}

#[test]
fn day_sampler_honours_overrides_and_allowed_days() {
    let mut overrides = DateOverrides::default();
    overrides.by_period_day.insert("2023-02".into(), 31);
    overrides.by_period_day.insert("2023-11".into(), 24);

    let sampling = DaySampling { overrides: Some(&overrides), ..DaySampling::default() };
    assert_eq!(sample_day_in_month(ym(2023, 2), &sampling).unwrap(), date(2023, 2, 28));
    assert_eq!(sample_day_in_month(ym(2023, 11), &sampling).unwrap(), date(2023, 11, 24));

    let allowed = [40, 10, 5];
    for i in 0..50 {
        let key = format!("k{i}");
        let sampling = DaySampling {
            unique_key: Some(&key),
            allowed_days: Some(&allowed),
            ..DaySampling::default()
        };
        let d = sample_day_in_month(ym(2023, 4), &sampling).unwrap();
        assert!(d.day() == 5 || d.day() == 10, "drew {d}");
    }

    let impossible = [30, 31];
    let sampling = DaySampling { allowed_days: Some(&impossible), ..DaySampling::default() };
    assert!(matches!(
        sample_day_in_month(ym(2023, 2), &sampling),
        Err(GeoError::Calendar { .. })
    ));
}
