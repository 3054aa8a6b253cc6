//! Draws and request shapes.
//!
//! The empirical distribution of many keyed draws must match the weights,
//! and every accepted request shape must resolve to the same canonical
//! month and draw key.

use chrono::NaiveDate;
use geoweights_core::{
    calendar::YearMonth,
    request::{parse_period, resolve_period},
    types::WeightMap,
    AssignCall, AssignRequest, GeoEngine, GeoError, PeriodInput,
};
use std::collections::BTreeMap;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn empirical_frequencies_match_the_weights() {
    init_logging();
    let engine = GeoEngine::default_project().unwrap();
    let d = date(2024, 6, 1);
    let period = YearMonth::from_date(d);
    let weights = engine.weights_for_date(d).unwrap();

    const DRAWS: usize = 200_000;
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for i in 0..DRAWS {
        let a = engine.pick(&weights, &format!("cust-{i}"), period).unwrap();
        *counts.entry(a.subregion).or_insert(0) += 1;
    }

    let mut total_variation = 0.0;
    let mut max_dev: f64 = 0.0;
    for (unit, w) in &weights {
        let observed = counts.get(unit).copied().unwrap_or(0) as f64 / DRAWS as f64;
        let dev = (observed - w).abs();
        total_variation += dev;
        max_dev = max_dev.max(dev);
    }
    total_variation /= 2.0;
    assert!(total_variation < 0.02, "total variation distance {total_variation}");
    assert!(max_dev < 0.005, "max per-unit deviation {max_dev}");
}

#[test]
fn assignment_carries_the_owning_region() {
    init_logging();
    let engine = GeoEngine::default_project().unwrap();
    for i in 0..200 {
        let request = AssignRequest::customer(format!("c{i}"), PeriodInput::Pair(2022, 9));
        let a = engine.assign_subregion(&request).unwrap();
        let owner = engine.geography().region_of(&a.subregion).unwrap();
        assert_eq!(a.region, owner.name);
    }
}

#[test]
fn equivalent_shapes_resolve_identically() {
    init_logging();
    let engine = GeoEngine::default_project().unwrap();
    let customer = "cust-0042";

    let shapes = [
        AssignRequest::customer(customer, PeriodInput::Text("2023-06".into())),
        AssignRequest::customer(customer, PeriodInput::Text("2023/06".into())),
        AssignRequest::customer(customer, PeriodInput::Text("202306".into())),
        AssignRequest::customer(customer, PeriodInput::Pair(2023, 6)),
        AssignRequest::customer(customer, PeriodInput::YearMonth(YearMonth::new(2023, 6).unwrap())),
        AssignRequest::new(AssignCall::Named {
            customer_id: Some(customer.into()),
            year: Some(2023),
            month: Some(6),
            date: None,
            period: None,
        }),
        AssignRequest::new(AssignCall::Named {
            customer_id: Some(customer.into()),
            year: None,
            month: None,
            date: None,
            period: Some(PeriodInput::Text("2023-06-01".into())),
        }),
        AssignRequest::new(AssignCall::YearPeriod { year: 2023, period: PeriodInput::Month(6) })
            .with_random_state(customer),
    ];

    let first = shapes[0].canonicalize().unwrap();
    assert_eq!(first.date, date(2023, 6, 1));
    assert_eq!(first.draw_key, customer);
    let expected = engine.assign_subregion(&shapes[0]).unwrap();

    for request in &shapes[1..] {
        assert_eq!(request.canonicalize().unwrap(), first, "{request:?}");
        assert_eq!(engine.assign_subregion(request).unwrap(), expected, "{request:?}");
    }
}

#[test]
fn customer_with_date_keeps_the_day() {
    init_logging();
    let request = AssignRequest::customer("c1", PeriodInput::Date(date(2022, 6, 20)));
    let canonical = request.canonicalize().unwrap();
    assert_eq!(canonical.date, date(2022, 6, 20));
    assert_eq!(canonical.period, YearMonth::new(2022, 6).unwrap());

    // No opening falls inside June 2022, and the pick key only carries the
    // month, so the day does not move the draw.
    let engine = GeoEngine::default_project().unwrap();
    let first_of_month = AssignRequest::customer("c1", PeriodInput::Pair(2022, 6));
    assert_eq!(
        engine.assign_subregion(&request).unwrap(),
        engine.assign_subregion(&first_of_month).unwrap()
    );
}

#[test]
fn an_opening_inside_the_month_splits_it() {
    init_logging();
    let engine = GeoEngine::default_project().unwrap();
    let before = AssignRequest::customer("c1", PeriodInput::Date(date(2022, 5, 14)));
    let after = AssignRequest::customer("c1", PeriodInput::Date(date(2022, 5, 15)));
    let w_before = engine.weights_for_date(before.canonicalize().unwrap().date).unwrap();
    let w_after = engine.weights_for_date(after.canonicalize().unwrap().date).unwrap();
    assert!(w_after["Madrid"] < w_before["Madrid"]);
}

#[test]
fn named_date_beats_period_and_year_month_beats_date() {
    init_logging();
    let named = |year, month, date, period| {
        AssignRequest::new(AssignCall::Named { customer_id: None, year, month, date, period })
    };

    let by_date = named(None, None, Some(date(2021, 3, 9)), Some(PeriodInput::Text("2019-01".into())))
        .canonicalize()
        .unwrap();
    assert_eq!(by_date.date, date(2021, 3, 9));

    let by_year_month = named(Some(2020), Some(2), Some(date(2021, 3, 9)), None)
        .canonicalize()
        .unwrap();
    assert_eq!(by_year_month.date, date(2020, 2, 1));

    let year_with_bare_month = named(Some(2024), None, None, Some(PeriodInput::Month(11)))
        .canonicalize()
        .unwrap();
    assert_eq!(year_with_bare_month.date, date(2024, 11, 1));
}

#[test]
fn draw_key_falls_back_to_the_period() {
    init_logging();
    let anonymous = AssignRequest::year_month(2024, 11).canonicalize().unwrap();
    assert_eq!(anonymous.draw_key, "202411");

    let seeded = AssignRequest::year_month(2024, 11)
        .with_random_state("batch-7")
        .canonicalize()
        .unwrap();
    assert_eq!(seeded.draw_key, "batch-7");

    let customer_overridden = AssignRequest::customer("c9", PeriodInput::Pair(2024, 11))
        .with_random_state("batch-7")
        .canonicalize()
        .unwrap();
    assert_eq!(customer_overridden.draw_key, "batch-7");
}

#[test]
fn malformed_requests_are_rejected() {
    init_logging();
    let month_only = AssignRequest::new(AssignCall::Named {
        customer_id: Some("c1".into()),
        year: None,
        month: Some(4),
        date: None,
        period: None,
    });
    assert!(matches!(month_only.canonicalize(), Err(GeoError::MissingYear { month: 4 })));

    let empty = AssignRequest::new(AssignCall::Named {
        customer_id: Some("c1".into()),
        year: None,
        month: None,
        date: None,
        period: None,
    });
    assert!(matches!(empty.canonicalize(), Err(GeoError::UnrecognizedPeriod { .. })));

    let bare_month = AssignRequest::customer("c1", PeriodInput::Month(4));
    assert!(matches!(bare_month.canonicalize(), Err(GeoError::MissingYear { month: 4 })));

    let bad_month = AssignRequest::year_month(2024, 13);
    assert!(matches!(
        bad_month.canonicalize(),
        Err(GeoError::InvalidYearMonth { year: 2024, month: 13 })
    ));

    for text in ["June 2023", "2023-13", "2023-02-30", ""] {
        assert!(
            matches!(parse_period(text), Err(GeoError::UnrecognizedPeriod { .. })),
            "'{text}' should not parse"
        );
    }
}

#[test]
fn period_text_formats_all_parse() {
    init_logging();
    let june = YearMonth::new(2023, 6).unwrap();
    for text in ["2023-06", "2023/06", "202306", "2023-06-15", "2023/06/30", " 2023-06 "] {
        assert_eq!(parse_period(text).unwrap(), june, "'{text}'");
    }
    assert_eq!(resolve_period(&PeriodInput::Month(6), Some(2023)).unwrap(), june);
    assert_eq!(resolve_period(&PeriodInput::Date(date(2023, 6, 30)), None).unwrap(), june);
}

#[test]
fn picking_from_an_empty_map_fails() {
    init_logging();
    let engine = GeoEngine::default_project().unwrap();
    let period = YearMonth::new(2023, 6).unwrap();
    assert!(matches!(
        engine.pick(&WeightMap::new(), "c1", period),
        Err(GeoError::InvalidDistribution { stage: "pick", .. })
    ));
}

#[test]
fn requests_deserialize_from_json() {
    init_logging();
    let json = r#"{
        "call": {
            "shape": "customer",
            "customer_id": "cust-0042",
            "period": { "type": "text", "value": "2023-06" }
        }
    }"#;
    let request: AssignRequest = serde_json::from_str(json).unwrap();
    assert_eq!(request, AssignRequest::customer("cust-0042", PeriodInput::Text("2023-06".into())));

    let named = r#"{ "call": { "shape": "named", "year": 2023, "month": 6 }, "random_state": "s" }"#;
    let request: AssignRequest = serde_json::from_str(named).unwrap();
    let canonical = request.canonicalize().unwrap();
    assert_eq!(canonical.date, date(2023, 6, 1));
    assert_eq!(canonical.draw_key, "s");
}

#[test]
fn json_year_month_drops_the_day() {
    init_logging();
    let json = r#"{
        "call": {
            "shape": "customer",
            "customer_id": "c1",
            "period": { "type": "year_month", "value": "2022-05-20" }
        }
    }"#;
    let from_json: AssignRequest = serde_json::from_str(json).unwrap();
    let canonical = from_json.canonicalize().unwrap();
    assert_eq!(canonical.date, date(2022, 5, 1), "a month-only shape must start on day 1");

    // The Madrid opening on 2022-05-15 must not leak into a month-only request.
    let engine = GeoEngine::default_project().unwrap();
    let from_text = AssignRequest::customer("c1", PeriodInput::Text("2022-05".into()));
    assert_eq!(canonical, from_text.canonicalize().unwrap());
    assert_eq!(
        engine.assign_subregion(&from_json).unwrap(),
        engine.assign_subregion(&from_text).unwrap()
    );

    let ym: YearMonth = serde_json::from_str("\"2024-02-29\"").unwrap();
    assert_eq!(ym, YearMonth::new(2024, 2).unwrap());
    assert_eq!(ym.first_day(), date(2024, 2, 1));
}
