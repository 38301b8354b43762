use chrono::NaiveDate;
use serde::Serialize;

use crate::issues::{FieldError, IncompleteInput, OrderingViolation};
use crate::models::{DelayMetrics, TimelineDates};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "violations", rename_all = "snake_case")]
pub enum ValidationResult {
    Valid,
    Violations(Vec<OrderingViolation>),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn violations(&self) -> &[OrderingViolation] {
        match self {
            ValidationResult::Valid => &[],
            ValidationResult::Violations(v) => v,
        }
    }
}

pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, FieldError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|e| FieldError::new(field, raw, format!("expected YYYY-MM-DD ({e})")))
}

/// Signed calendar-day count from `from` to `to`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

fn span(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Option<i64> {
    Some(days_between(from?, to?))
}

pub fn validate_timeline(dates: &TimelineDates) -> ValidationResult {
    let present: Vec<(&'static str, NaiveDate)> = dates
        .ordered()
        .into_iter()
        .filter_map(|(name, date)| date.map(|d| (name, d)))
        .collect();

    let violations: Vec<OrderingViolation> = present
        .windows(2)
        .filter(|pair| pair[1].1 < pair[0].1)
        .map(|pair| OrderingViolation {
            earlier: pair[0].0,
            later: pair[1].0,
            gap_days: days_between(pair[0].1, pair[1].1),
        })
        .collect();

    if violations.is_empty() {
        ValidationResult::Valid
    } else {
        ValidationResult::Violations(violations)
    }
}

pub fn compute_delays(dates: &TimelineDates) -> DelayMetrics {
    let patient = span(dates.symptom_onset, dates.first_visit);
    let provider = span(dates.first_visit, dates.diagnosis);
    let treatment = span(dates.diagnosis, dates.treatment_start);
    // Never the sum of the phases: a missing middle date must not hide the total.
    let total = span(dates.symptom_onset, dates.treatment_start);

    let defined: Vec<i64> = [patient, provider, treatment, total]
        .into_iter()
        .flatten()
        .collect();
    let no_delay = if defined.is_empty() {
        None
    } else {
        Some(defined.iter().all(|&d| d == 0))
    };

    DelayMetrics {
        patient_delay_days: patient,
        provider_delay_days: provider,
        treatment_delay_days: treatment,
        total_delay_days: total,
        no_delay,
    }
}

/// Lists the metrics left undefined and which endpoint dates they lack.
pub fn missing_endpoints(dates: &TimelineDates) -> Vec<IncompleteInput> {
    let [onset, visit, diagnosis, start] = dates.ordered();
    [
        ("patientDelayDays", onset, visit),
        ("providerDelayDays", visit, diagnosis),
        ("treatmentDelayDays", diagnosis, start),
        ("totalDelayDays", onset, start),
    ]
    .into_iter()
    .filter_map(|(metric, from, to)| {
        let missing: Vec<String> = [from, to]
            .into_iter()
            .filter(|(_, date)| date.is_none())
            .map(|(name, _)| name.to_string())
            .collect();
        (!missing.is_empty()).then_some(IncompleteInput { metric, missing })
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    fn full_timeline() -> TimelineDates {
        TimelineDates {
            symptom_onset: Some(date(2024, 1, 1)),
            first_visit: Some(date(2024, 1, 10)),
            diagnosis: Some(date(2024, 1, 20)),
            treatment_start: Some(date(2024, 1, 22)),
        }
    }

    #[test]
    fn computes_the_four_delays() {
        let metrics = compute_delays(&full_timeline());
        assert_eq!(metrics.patient_delay_days, Some(9));
        assert_eq!(metrics.provider_delay_days, Some(10));
        assert_eq!(metrics.treatment_delay_days, Some(2));
        assert_eq!(metrics.total_delay_days, Some(21));
        assert_eq!(metrics.no_delay, Some(false));
        assert!(validate_timeline(&full_timeline()).is_valid());
    }

    #[test]
    fn ordered_quadruples_are_valid_and_non_negative() {
        let base = date(2023, 12, 28);
        for (a, b, c, d) in [(0, 0, 0, 0), (0, 3, 3, 40), (5, 6, 90, 91), (0, 0, 0, 365)] {
            let dates = TimelineDates {
                symptom_onset: Some(base + chrono::Duration::days(a)),
                first_visit: Some(base + chrono::Duration::days(b)),
                diagnosis: Some(base + chrono::Duration::days(c)),
                treatment_start: Some(base + chrono::Duration::days(d)),
            };
            assert!(validate_timeline(&dates).is_valid());
            let metrics = compute_delays(&dates);
            for value in [
                metrics.patient_delay_days,
                metrics.provider_delay_days,
                metrics.treatment_delay_days,
                metrics.total_delay_days,
            ] {
                assert!(value.expect("all dates present") >= 0);
            }
        }
    }

    #[test]
    fn total_is_measured_directly_when_middle_dates_are_missing() {
        let dates = TimelineDates {
            first_visit: None,
            diagnosis: None,
            ..full_timeline()
        };
        let metrics = compute_delays(&dates);
        assert_eq!(metrics.total_delay_days, Some(21));
        assert_eq!(metrics.patient_delay_days, None);
        assert_eq!(metrics.provider_delay_days, None);
        assert_eq!(metrics.treatment_delay_days, None);
    }

    #[test]
    fn a_missing_date_only_blanks_its_own_metrics() {
        let dates = TimelineDates {
            diagnosis: None,
            ..full_timeline()
        };
        let metrics = compute_delays(&dates);
        assert_eq!(metrics.patient_delay_days, Some(9));
        assert_eq!(metrics.provider_delay_days, None);
        assert_eq!(metrics.treatment_delay_days, None);
        assert_eq!(metrics.total_delay_days, Some(21));

        let missing = missing_endpoints(&dates);
        let metrics: Vec<_> = missing.iter().map(|m| m.metric).collect();
        assert_eq!(metrics, vec!["providerDelayDays", "treatmentDelayDays"]);
        assert_eq!(missing[0].missing, vec!["diagnosisDate".to_string()]);
    }

    #[test]
    fn each_absent_date_blanks_exactly_its_adjacent_metrics() {
        let full = full_timeline();
        let cases = [
            (
                "symptomOnsetDate",
                TimelineDates { symptom_onset: None, ..full },
                ["patientDelayDays", "totalDelayDays"],
            ),
            (
                "firstVisitDate",
                TimelineDates { first_visit: None, ..full },
                ["patientDelayDays", "providerDelayDays"],
            ),
            (
                "diagnosisDate",
                TimelineDates { diagnosis: None, ..full },
                ["providerDelayDays", "treatmentDelayDays"],
            ),
            (
                "treatmentStartDate",
                TimelineDates { treatment_start: None, ..full },
                ["treatmentDelayDays", "totalDelayDays"],
            ),
        ];

        for (absent, dates, undefined) in cases {
            let metrics = compute_delays(&dates);
            let values = [
                ("patientDelayDays", metrics.patient_delay_days, 9),
                ("providerDelayDays", metrics.provider_delay_days, 10),
                ("treatmentDelayDays", metrics.treatment_delay_days, 2),
                ("totalDelayDays", metrics.total_delay_days, 21),
            ];
            for (name, value, complete) in values {
                if undefined.contains(&name) {
                    assert_eq!(value, None, "{name} without {absent}");
                } else {
                    assert_eq!(value, Some(complete), "{name} without {absent}");
                }
            }

            let missing = missing_endpoints(&dates);
            let reported: Vec<_> = missing.iter().map(|m| m.metric).collect();
            assert_eq!(reported, undefined.to_vec(), "without {absent}");
            assert!(missing.iter().all(|m| m.missing == vec![absent.to_string()]));
        }
    }

    #[test]
    fn no_delay_needs_every_defined_metric_at_zero() {
        let same_day = date(2024, 3, 5);
        let dates = TimelineDates {
            symptom_onset: Some(same_day),
            first_visit: Some(same_day),
            diagnosis: None,
            treatment_start: None,
        };
        assert_eq!(compute_delays(&dates).no_delay, Some(true));

        let empty = compute_delays(&TimelineDates::default());
        assert_eq!(empty.no_delay, None);
        assert_eq!(empty.total_delay_days, None);
    }

    #[test]
    fn reversed_visit_is_flagged_and_delay_stays_negative() {
        let dates = TimelineDates {
            symptom_onset: Some(date(2024, 1, 10)),
            first_visit: Some(date(2024, 1, 1)),
            ..TimelineDates::default()
        };
        let result = validate_timeline(&dates);
        assert_eq!(
            result,
            ValidationResult::Violations(vec![OrderingViolation {
                earlier: "symptomOnsetDate",
                later: "firstVisitDate",
                gap_days: -9,
            }])
        );
        assert_eq!(
            result.violations()[0].to_string(),
            "firstVisitDate precedes symptomOnsetDate"
        );
        assert_eq!(compute_delays(&dates).patient_delay_days, Some(-9));
    }

    #[test]
    fn ordering_skips_absent_dates() {
        let dates = TimelineDates {
            symptom_onset: Some(date(2024, 2, 1)),
            first_visit: None,
            diagnosis: Some(date(2024, 1, 15)),
            treatment_start: Some(date(2024, 2, 20)),
        };
        let result = validate_timeline(&dates);
        assert_eq!(result.violations().len(), 1);
        assert_eq!(result.violations()[0].earlier, "symptomOnsetDate");
        assert_eq!(result.violations()[0].later, "diagnosisDate");
    }

    #[test]
    fn malformed_dates_name_the_field() {
        let err = parse_date("Date_Diagnosis", "2024-02-30").unwrap_err();
        assert_eq!(err.field, "Date_Diagnosis");
        assert_eq!(err.value, "2024-02-30");
        assert_eq!(
            parse_date("Date_First_Visit", " 2024-02-29 "),
            Ok(date(2024, 2, 29))
        );
    }
}
