use std::collections::BTreeSet;
use std::io;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::Context;
use chrono::NaiveDate;
use serde_json::Value;

use crate::catalog::{self, LITERACY_ITEMS_TABLE};
use crate::config::StudyConfig;
use crate::delay::DATE_FORMAT;
use crate::session::{FinalizedRecord, Session};

type RawFields = Vec<(String, String)>;

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn date(value: Option<NaiveDate>) -> String {
    value
        .map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

/// Flat (column, cell) pairs for one record. Undefined values are empty cells.
pub fn cells(finalized: &FinalizedRecord) -> Vec<(&'static str, String)> {
    let r = &finalized.record;
    let d = &finalized.delays;
    let literacy = finalized.literacy.result.as_ref();
    let warnings: Vec<String> = finalized
        .timeline
        .violations()
        .iter()
        .map(|v| v.to_string())
        .collect();

    let mut row = vec![
        ("Participant_ID", r.participant_id.clone()),
        ("Name_Initials", r.name_initials.clone()),
        ("Data_Collection_Date", date(r.collection_date)),
        ("Age", opt(r.age)),
        ("Gender", opt(r.gender)),
        ("Address", r.address.clone()),
        ("Occupation", opt(r.occupation)),
        ("Education", opt(r.education)),
        ("Monthly_Income", opt(r.monthly_income)),
        ("Marital_Status", opt(r.marital_status)),
        ("Residence_Type", opt(r.residence)),
        ("Comorbidities", r.comorbidities.to_cell()),
        ("Comorbidities_Details", r.comorbidities_details.clone()),
        ("TB_Type", opt(r.tb_type)),
        ("Addictive_Substances", r.substance_use.to_cell()),
        ("Addictive_Substances_Details", r.substance_use_details.clone()),
        ("Date_Symptom_Onset", date(r.dates.symptom_onset)),
        ("Date_First_Visit", date(r.dates.first_visit)),
        ("Date_Diagnosis", date(r.dates.diagnosis)),
        ("Date_Treatment_Start", date(r.dates.treatment_start)),
        ("Patient_Delay", opt(d.patient_delay_days)),
        ("Healthcare_Provider_Related_Delay", opt(d.provider_delay_days)),
        ("Treatment_Delay", opt(d.treatment_delay_days)),
        ("Total_Delay", opt(d.total_delay_days)),
        ("TB_Unit_TU", opt(d.provider_delay_days)),
        ("Healthcare_Providers", opt(d.provider_delay_days)),
        ("No_Delay", opt(d.no_delay)),
        ("Delay_Category", opt(d.category())),
        ("Timeline_Valid", finalized.timeline.is_valid().to_string()),
        ("Timeline_Warnings", warnings.join("; ")),
        ("Patient_Delay_Reason", r.patient_delay_reasons.to_cell()),
        ("Provider_Delay_Reason", r.provider_delay_reasons.to_cell()),
        ("Treatment_Delay_Reason", r.treatment_delay_reasons.to_cell()),
        ("Symptoms_Nature", r.symptoms.to_cell()),
        ("First_Care_Location", r.first_care_location.clone().unwrap_or_default()),
        ("Healthcare_Visits_Count", opt(r.healthcare_visits)),
        ("Diagnostic_Tests", r.diagnostic_tests.to_cell()),
        ("Additional_Support_Needed", r.support_needed.to_cell()),
        ("DHLI_Instrument", finalized.literacy.instrument.to_string()),
    ];

    for (index, item) in LITERACY_ITEMS_TABLE.iter().enumerate() {
        row.push((item.key, opt(r.literacy_answers[index])));
        row.push((
            SCORE_COLUMNS[index],
            opt(literacy.and_then(|l| l.item_scores[index])),
        ));
    }

    row.extend([
        ("DHLI_Total_Score", opt(literacy.map(|l| l.total))),
        ("DHLI_Items_Answered", opt(literacy.map(|l| l.answered))),
        ("DHLI_Level", opt(literacy.map(|l| l.level))),
        ("Data_Verified", r.data_verified.to_string()),
        ("Verification_Notes", r.verification_notes.clone()),
    ]);
    row
}

const SCORE_COLUMNS: [&str; 10] = [
    "DHLI_Q1_Score",
    "DHLI_Q2_Score",
    "DHLI_Q3_Score",
    "DHLI_Q4_Score",
    "DHLI_Q5_Score",
    "DHLI_Q6_Score",
    "DHLI_Q7_Score",
    "DHLI_Q8_Score",
    "DHLI_Q9_Score",
    "DHLI_Q10_Score",
];

static HEADER: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    let empty = Session::default().finalize(&StudyConfig::default());
    cells(&empty).into_iter().map(|(column, _)| column).collect()
});

/// Column names in export order.
pub fn header() -> &'static [&'static str] {
    &HEADER
}

pub fn write_csv<W: io::Write>(writer: W, records: &[FinalizedRecord]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(header())?;
    for finalized in records {
        writer.write_record(cells(finalized).into_iter().map(|(_, cell)| cell))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_csv_file(path: &Path, records: &[FinalizedRecord]) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_csv(file, records)?;
    tracing::info!(rows = records.len(), path = %path.display(), "exported records");
    Ok(())
}

/// Only catalog fields are imported. Derived export columns and columns this
/// form does not collect are dropped, so exports and foreign sheets load cleanly.
fn is_input(column: &str) -> bool {
    catalog::lookup(column).is_some()
}

fn keep_input(fields: RawFields) -> RawFields {
    fields
        .into_iter()
        .filter(|(column, _)| is_input(column))
        .collect()
}

fn log_skipped<'a>(columns: impl IntoIterator<Item = &'a str>) {
    let skipped: BTreeSet<&str> = columns.into_iter().filter(|c| !is_input(c)).collect();
    if !skipped.is_empty() {
        tracing::debug!(
            columns = %skipped.into_iter().collect::<Vec<_>>().join(", "),
            "ignoring columns that are not form fields"
        );
    }
}

pub fn read_csv<R: io::Read>(reader: R) -> anyhow::Result<Vec<RawFields>> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader.headers()?.clone();
    log_skipped(headers.iter().map(str::trim));
    let mut rows = Vec::new();

    for result in reader.records() {
        let record = result?;
        let fields = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.trim().to_string(), v.to_string()))
            .collect();
        rows.push(keep_input(fields));
    }
    Ok(rows)
}

fn json_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(json_cell).collect::<Vec<_>>().join("; "),
        other => other.to_string(),
    }
}

fn json_object(value: &Value) -> anyhow::Result<RawFields> {
    let object = value
        .as_object()
        .context("each record must be a JSON object")?;
    Ok(object
        .iter()
        .map(|(k, v)| (k.clone(), json_cell(v)))
        .collect())
}

/// Accepts a single object or an array of objects.
pub fn read_json(text: &str) -> anyhow::Result<Vec<RawFields>> {
    let value: Value = serde_json::from_str(text).context("input is not valid JSON")?;
    let objects = match &value {
        Value::Array(items) => items
            .iter()
            .map(json_object)
            .collect::<anyhow::Result<Vec<_>>>()?,
        _ => vec![json_object(&value)?],
    };
    log_skipped(objects.iter().flatten().map(|(column, _)| column.as_str()));
    Ok(objects.into_iter().map(keep_input).collect())
}

/// Load raw records and replay each into its own session.
pub fn load_sessions(path: &Path, collection_date: NaiveDate) -> anyhow::Result<Vec<Session>> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let rows = if is_json {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        read_json(&text)?
    } else {
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        read_csv(file)?
    };

    let sessions: Vec<Session> = rows
        .into_iter()
        .enumerate()
        .map(|(index, fields)| {
            let mut session = Session::new(collection_date);
            for error in session.apply(fields) {
                tracing::warn!(
                    row = index + 1,
                    participant = %session.record().participant_id,
                    "{error}"
                );
            }
            session
        })
        .collect();

    tracing::info!(records = sessions.len(), path = %path.display(), "imported records");
    Ok(sessions)
}
