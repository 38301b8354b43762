//! Fabricated demonstration cohort.
//!
//! Produces raw field values only. The records go through the same session
//! intake as real data; nothing here computes delays or scores.

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::catalog::{
    COMORBIDITY_OPTIONS, LITERACY_ITEMS_TABLE, PATIENT_DELAY_REASONS, PROVIDER_DELAY_REASONS,
    SUBSTANCE_OPTIONS, TREATMENT_DELAY_REASONS,
};
use crate::delay::DATE_FORMAT;
use crate::models::{Education, MaritalStatus, MonthlyIncome, Occupation, Residence};
use crate::session::Session;

const GENDERS: &[&str] = &["Male", "Female"];
const TB_TYPES: &[&str] = &["Pulmonary", "Extra pulmonary"];

fn pick(rng: &mut StdRng, options: &[&'static str]) -> &'static str {
    options.choose(rng).copied().unwrap_or_default()
}

/// A listed reason other than the free-text "Other".
fn pick_reason(rng: &mut StdRng, options: &[&'static str]) -> &'static str {
    let listed: Vec<&'static str> = options.iter().copied().filter(|o| *o != "Other").collect();
    pick(rng, &listed)
}

fn window_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, 1).unwrap_or_default()
}

/// Raw form values for one synthetic patient.
pub fn sample_fields(rng: &mut StdRng, number: usize) -> Vec<(&'static str, String)> {
    let onset = window_start() + Duration::days(rng.random_range(0..=180));
    let first_visit = onset + Duration::days(rng.random_range(1..=90));
    let diagnosis = first_visit + Duration::days(rng.random_range(1..=60));
    let treatment_start = diagnosis + Duration::days(rng.random_range(1..=30));
    let fmt = |d: NaiveDate| d.format(DATE_FORMAT).to_string();

    let mut fields = vec![
        ("Participant_ID", format!("TB{number:03}")),
        ("Name_Initials", format!("Patient_{number:03}")),
        ("Age", rng.random_range(18..=80u32).to_string()),
        ("Gender", pick(rng, GENDERS).to_string()),
        ("Address", format!("Address {number}, Chennai")),
        ("Occupation", pick(rng, Occupation::LABELS).to_string()),
        ("Education", pick(rng, Education::LABELS).to_string()),
        ("Monthly_Income", pick(rng, MonthlyIncome::LABELS).to_string()),
        ("Marital_Status", pick(rng, MaritalStatus::LABELS).to_string()),
        ("Residence_Type", pick(rng, Residence::LABELS).to_string()),
        ("Comorbidities", pick(rng, COMORBIDITY_OPTIONS).to_string()),
        ("TB_Type", pick(rng, TB_TYPES).to_string()),
        ("Addictive_Substances", pick(rng, SUBSTANCE_OPTIONS).to_string()),
        ("Date_Symptom_Onset", fmt(onset)),
        ("Date_First_Visit", fmt(first_visit)),
        ("Date_Diagnosis", fmt(diagnosis)),
        ("Date_Treatment_Start", fmt(treatment_start)),
        ("Patient_Delay_Reason", pick_reason(rng, PATIENT_DELAY_REASONS).to_string()),
        ("Provider_Delay_Reason", pick_reason(rng, PROVIDER_DELAY_REASONS).to_string()),
        ("Treatment_Delay_Reason", pick_reason(rng, TREATMENT_DELAY_REASONS).to_string()),
        ("Healthcare_Visits_Count", rng.random_range(1..=5u32).to_string()),
    ];

    for item in &LITERACY_ITEMS_TABLE {
        let affirmative = rng.random_bool(0.5);
        let agree_scale = item.options[1].starts_with("Agree");
        let answer = match (agree_scale, affirmative) {
            (true, true) => "Agree",
            (true, false) => "Disagree",
            (false, true) => "Yes",
            (false, false) => "No",
        };
        fields.push((item.key, answer.to_string()));
    }

    fields.push(("Data_Verified", rng.random_bool(0.5).to_string()));
    fields.push((
        "Verification_Notes",
        format!("Sample patient {number} - fabricated data for demo"),
    ));
    fields
}

/// `count` synthetic sessions, reproducible for a given seed.
pub fn generate(count: usize, seed: u64, collection_date: NaiveDate) -> Vec<Session> {
    let mut rng = StdRng::seed_from_u64(seed);
    let sessions: Vec<Session> = (1..=count)
        .map(|number| {
            let mut session = Session::new(collection_date);
            for error in session.apply(sample_fields(&mut rng, number)) {
                tracing::warn!(patient = number, "sample field rejected: {error}");
            }
            session
        })
        .collect();
    tracing::info!(count, seed, "generated sample cohort");
    sessions
}
