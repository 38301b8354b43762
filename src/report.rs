use std::collections::BTreeMap;
use std::fmt::Write;

use crate::models::{DelayCategory, GroupSummary, LiteracyLevel};
use crate::session::FinalizedRecord;

pub fn mean(values: &[i64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<i64>() as f64 / values.len() as f64)
    }
}

pub fn median(values: &[i64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) as f64 / 2.0)
    } else {
        Some(sorted[mid] as f64)
    }
}

fn summarize(label: String, records: &[&FinalizedRecord]) -> GroupSummary {
    let totals: Vec<i64> = records
        .iter()
        .filter_map(|r| r.delays.total_delay_days)
        .collect();
    GroupSummary {
        label,
        count: records.len(),
        mean_total_delay: mean(&totals),
        median_total_delay: median(&totals),
        min_total_delay: totals.iter().min().copied(),
        max_total_delay: totals.iter().max().copied(),
    }
}

/// Group records by a key, then summarize the total delay of each group.
pub fn summarize_by<F>(records: &[FinalizedRecord], key: F) -> Vec<GroupSummary>
where
    F: Fn(&FinalizedRecord) -> String,
{
    let mut groups: BTreeMap<String, Vec<&FinalizedRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(key(record)).or_default().push(record);
    }

    let mut summaries: Vec<GroupSummary> = groups
        .into_iter()
        .map(|(label, members)| summarize(label, &members))
        .collect();
    summaries.sort_by(|a, b| b.count.cmp(&a.count));
    summaries
}

fn days(value: Option<f64>) -> String {
    value
        .map(|v| format!("{v:.1} days"))
        .unwrap_or_else(|| "n/a".to_string())
}

type Phase = fn(&FinalizedRecord) -> Option<i64>;

fn phase_values(records: &[FinalizedRecord], phase: Phase) -> Vec<i64> {
    records.iter().filter_map(phase).collect()
}

fn or_unknown(label: Option<String>) -> String {
    label.unwrap_or_else(|| "Not recorded".to_string())
}

pub fn build_report(source: &str, records: &[FinalizedRecord]) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# TB Care Delay Report");
    let _ = writeln!(output, "Generated for {} ({} patients)", source, records.len());
    let _ = writeln!(output);

    let totals = phase_values(records, |r| r.delays.total_delay_days);
    let _ = writeln!(output, "## Descriptive Statistics");
    if records.is_empty() {
        let _ = writeln!(output, "No records to summarize.");
        return output;
    }
    let _ = writeln!(output, "- Patients with a total delay: {}", totals.len());
    let _ = writeln!(output, "- Mean total delay: {}", days(mean(&totals)));
    let _ = writeln!(output, "- Median total delay: {}", days(median(&totals)));
    let phases: [(&str, Phase); 3] = [
        ("patient", |r| r.delays.patient_delay_days),
        ("provider", |r| r.delays.provider_delay_days),
        ("treatment", |r| r.delays.treatment_delay_days),
    ];
    for (label, phase) in phases {
        let values = phase_values(records, phase);
        let _ = writeln!(output, "- Mean {} delay: {}", label, days(mean(&values)));
    }

    let ages: Vec<i64> = records
        .iter()
        .filter_map(|r| r.record.age.map(i64::from))
        .collect();
    let _ = writeln!(output);
    let _ = writeln!(output, "## Demographics");
    let mean_age = mean(&ages).map_or("n/a".to_string(), |a| format!("{a:.1}"));
    let _ = writeln!(output, "- Mean age: {}", mean_age);
    for summary in summarize_by(records, |r| {
        or_unknown(r.record.gender.map(|g| g.to_string()))
    }) {
        let _ = writeln!(output, "- {}: {} patients", summary.label, summary.count);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Delay Categories");
    for category in [DelayCategory::Low, DelayCategory::Moderate, DelayCategory::High] {
        let count = records
            .iter()
            .filter(|r| r.delays.category() == Some(category))
            .count();
        let _ = writeln!(output, "- {}: {} patients", category, count);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Delay by TB Type");
    for summary in summarize_by(records, |r| {
        or_unknown(r.record.tb_type.map(|t| t.to_string()))
    }) {
        let _ = writeln!(
            output,
            "- {}: {} patients, median {} (range {}-{})",
            summary.label,
            summary.count,
            days(summary.median_total_delay),
            summary.min_total_delay.map_or("n/a".to_string(), |d| d.to_string()),
            summary.max_total_delay.map_or("n/a".to_string(), |d| d.to_string()),
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Digital Health Literacy");
    let levels = summarize_by(records, |r| {
        or_unknown(r.literacy.result.as_ref().map(|l| l.level.to_string()))
    });
    for level in [LiteracyLevel::Low, LiteracyLevel::Moderate, LiteracyLevel::High] {
        let label = level.to_string();
        match levels.iter().find(|s| s.label == label) {
            Some(summary) => {
                let _ = writeln!(
                    output,
                    "- {}: {} patients, mean total delay {}",
                    label,
                    summary.count,
                    days(summary.mean_total_delay)
                );
            }
            None => {
                let _ = writeln!(output, "- {}: 0 patients", label);
            }
        }
    }
    if let Some(unscored) = levels.iter().find(|s| s.label == "Not recorded") {
        let _ = writeln!(output, "- Not scored: {} patients", unscored.count);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Care Timelines");
    let timelines: Vec<&FinalizedRecord> = records
        .iter()
        .filter(|r| {
            let d = &r.record.dates;
            d.symptom_onset.is_some()
                && d.first_visit.is_some()
                && d.diagnosis.is_some()
                && d.treatment_start.is_some()
        })
        .take(8)
        .collect();
    if timelines.is_empty() {
        let _ = writeln!(output, "No fully dated timelines.");
    }
    for record in timelines {
        let dates = record.record.dates.ordered();
        let _ = write!(
            output,
            "- {} ({}):",
            record.record.participant_id,
            or_unknown(record.record.tb_type.map(|t| t.to_string()))
        );
        for (phase, pair) in ["pre-visit", "diagnosis", "pre-treatment"]
            .iter()
            .zip(dates.windows(2))
        {
            if let (Some(start), Some(end)) = (pair[0].1, pair[1].1) {
                let _ = write!(
                    output,
                    " {} {} to {} ({} days);",
                    phase,
                    start,
                    end,
                    (end - start).num_days()
                );
            }
        }
        let _ = writeln!(output);
    }

    let flagged = records.iter().filter(|r| !r.timeline.is_valid()).count();
    let incomplete = records
        .iter()
        .filter(|r| !r.missing_essentials().is_empty())
        .count();
    let _ = writeln!(output);
    let _ = writeln!(output, "## Data Quality");
    let _ = writeln!(output, "- Records with date ordering warnings: {flagged}");
    let _ = writeln!(output, "- Records missing essential fields: {incomplete}");

    output
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::config::StudyConfig;
    use crate::sample;
    use crate::session::Session;

    fn record(id: &str, tb_type: &str, onset: &str, start: &str) -> FinalizedRecord {
        let mut session = Session::new(NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date"));
        let errors = session.apply([
            ("Participant_ID", id),
            ("TB_Type", tb_type),
            ("Date_Symptom_Onset", onset),
            ("Date_Treatment_Start", start),
        ]);
        assert!(errors.is_empty());
        session.finalize(&StudyConfig::default())
    }

    #[test]
    fn mean_and_median_handle_small_sets() {
        assert_eq!(mean(&[]), None);
        assert_eq!(median(&[]), None);
        assert_eq!(mean(&[10, 20, 60]), Some(30.0));
        assert_eq!(median(&[60, 10, 20]), Some(20.0));
        assert_eq!(median(&[40, 10, 20, 60]), Some(30.0));
    }

    #[test]
    fn groups_are_ordered_by_size() {
        let records = vec![
            record("TB001", "Pulmonary", "2024-01-01", "2024-01-21"),
            record("TB002", "Pulmonary", "2024-01-01", "2024-03-01"),
            record("TB003", "DR-TB", "2024-01-01", "2024-01-11"),
        ];
        let summaries = summarize_by(&records, |r| {
            or_unknown(r.record.tb_type.map(|t| t.to_string()))
        });
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].label, "Pulmonary");
        assert_eq!(summaries[0].count, 2);
        assert_eq!(summaries[0].min_total_delay, Some(20));
        assert_eq!(summaries[0].max_total_delay, Some(60));
        assert_eq!(summaries[0].mean_total_delay, Some(40.0));
    }

    #[test]
    fn report_lists_every_section() {
        let collected = NaiveDate::from_ymd_opt(2024, 11, 1).expect("valid date");
        let records: Vec<FinalizedRecord> = sample::generate(12, 42, collected)
            .iter()
            .map(|s| s.finalize(&StudyConfig::default()))
            .collect();
        let report = build_report("sample cohort", &records);
        assert!(report.starts_with("# TB Care Delay Report"));
        assert!(report.contains("Generated for sample cohort (12 patients)"));
        for section in [
            "## Descriptive Statistics",
            "## Demographics",
            "## Delay Categories",
            "## Delay by TB Type",
            "## Digital Health Literacy",
            "## Care Timelines",
            "## Data Quality",
        ] {
            assert!(report.contains(section), "missing {section}");
        }
        assert!(report.contains("- TB001 ("));
        assert!(!report.contains("- TB009 ("));
        assert!(report.contains("- Records with date ordering warnings: 0"));
    }

    #[test]
    fn empty_input_still_renders() {
        let report = build_report("nothing", &[]);
        assert!(report.contains("No records to summarize."));
    }
}
