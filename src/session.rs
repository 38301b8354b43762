use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::catalog::{self, FieldKind, FieldSpec};
use crate::config::StudyConfig;
use crate::delay::{self, ValidationResult};
use crate::issues::{FieldError, Issue};
use crate::literacy::{self, LiteracyReport};
use crate::models::{DelayMetrics, OptionSet, PatientRecord, Response};

/// Short, human-friendly participant ID: first 8 hex digits of a v4 UUID.
pub fn generate_participant_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    id[..8].to_uppercase()
}

/// One data-entry session. Owns its record exclusively.
#[derive(Debug, Clone, Default)]
pub struct Session {
    record: PatientRecord,
    rejected: BTreeMap<String, FieldError>,
}

impl Session {
    pub fn new(collection_date: NaiveDate) -> Self {
        Self {
            record: PatientRecord {
                collection_date: Some(collection_date),
                ..PatientRecord::default()
            },
            rejected: BTreeMap::new(),
        }
    }

    pub fn record(&self) -> &PatientRecord {
        &self.record
    }

    /// Parse `raw` against the catalog entry for `key` and store it.
    /// An empty value clears the field, and so does a rejected one: the
    /// record never keeps a value the operator tried to replace.
    pub fn set_field(&mut self, key: &str, raw: &str) -> Result<(), FieldError> {
        let result = self.assign(key, raw);
        match &result {
            Ok(()) => {
                self.rejected.remove(key);
            }
            Err(e) => {
                // Blank input parses for every catalog field; unknown keys have nothing to clear.
                let _ = self.assign(key, "");
                self.rejected.insert(key.to_string(), e.clone());
            }
        }
        result
    }

    /// Apply many fields, continuing past failures.
    pub fn apply<I, K, V>(&mut self, fields: I) -> Vec<FieldError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        fields
            .into_iter()
            .filter_map(|(k, v)| self.set_field(k.as_ref(), v.as_ref()).err())
            .collect()
    }

    fn assign(&mut self, key: &str, raw: &str) -> Result<(), FieldError> {
        let spec = catalog::lookup(key)
            .ok_or_else(|| FieldError::new(key, raw, "unknown field"))?;
        let value = raw.trim();
        let r = &mut self.record;

        match key {
            "Participant_ID" => r.participant_id = value.to_string(),
            "Name_Initials" => r.name_initials = value.to_string(),
            "Data_Collection_Date" => r.collection_date = parse_date(spec, value)?,
            "Age" => r.age = parse_integer(spec, value)?,
            "Gender" => r.gender = parse_choice(spec, value)?,
            "Address" => r.address = value.to_string(),
            "Occupation" => r.occupation = parse_choice(spec, value)?,
            "Education" => r.education = parse_choice(spec, value)?,
            "Monthly_Income" => r.monthly_income = parse_choice(spec, value)?,
            "Marital_Status" => r.marital_status = parse_choice(spec, value)?,
            "Residence_Type" => r.residence = parse_choice(spec, value)?,
            "Comorbidities" => r.comorbidities = parse_options(spec, value)?,
            "Comorbidities_Details" => r.comorbidities_details = value.to_string(),
            "TB_Type" => r.tb_type = parse_choice(spec, value)?,
            "Addictive_Substances" => r.substance_use = parse_options(spec, value)?,
            "Addictive_Substances_Details" => r.substance_use_details = value.to_string(),
            "Date_Symptom_Onset" => r.dates.symptom_onset = parse_date(spec, value)?,
            "Date_First_Visit" => r.dates.first_visit = parse_date(spec, value)?,
            "Date_Diagnosis" => r.dates.diagnosis = parse_date(spec, value)?,
            "Date_Treatment_Start" => r.dates.treatment_start = parse_date(spec, value)?,
            "Patient_Delay_Reason" => r.patient_delay_reasons = parse_options(spec, value)?,
            "Provider_Delay_Reason" => r.provider_delay_reasons = parse_options(spec, value)?,
            "Treatment_Delay_Reason" => r.treatment_delay_reasons = parse_options(spec, value)?,
            "Symptoms_Nature" => r.symptoms = parse_options(spec, value)?,
            "First_Care_Location" => r.first_care_location = parse_listed(spec, value)?,
            "Healthcare_Visits_Count" => r.healthcare_visits = parse_integer(spec, value)?,
            "Diagnostic_Tests" => r.diagnostic_tests = parse_options(spec, value)?,
            "Additional_Support_Needed" => r.support_needed = parse_options(spec, value)?,
            "Data_Verified" => r.data_verified = parse_flag(spec, value)?,
            "Verification_Notes" => r.verification_notes = value.to_string(),
            _ => match spec.kind {
                FieldKind::LiteracyItem(index) => {
                    r.literacy_answers[index] = parse_response(spec, value)?
                }
                _ => return Err(FieldError::new(key, raw, "field is not editable")),
            },
        }
        Ok(())
    }

    /// Derive every computed field. Never fails; problems come back as issues.
    pub fn finalize(&self, config: &StudyConfig) -> FinalizedRecord {
        let record = &self.record;
        let timeline = delay::validate_timeline(&record.dates);
        let delays = delay::compute_delays(&record.dates);
        let literacy = literacy::score_literacy(
            &record.literacy_answers,
            config.instrument,
            config.allow_partial_scoring,
        );

        let mut issues: Vec<Issue> = self.rejected.values().cloned().map(Issue::from).collect();
        for violation in timeline.violations() {
            tracing::warn!(
                participant = %record.participant_id,
                gap_days = violation.gap_days,
                "{violation}"
            );
            issues.push(violation.clone().into());
        }
        issues.extend(delay::missing_endpoints(&record.dates).into_iter().map(Issue::from));
        issues.extend(literacy.issues.iter().cloned());

        tracing::debug!(
            participant = %record.participant_id,
            total_delay = ?delays.total_delay_days,
            issues = issues.len(),
            "finalized record"
        );

        FinalizedRecord {
            record: record.clone(),
            timeline,
            delays,
            literacy,
            issues,
        }
    }
}

/// A record with its derived metrics, ready for export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalizedRecord {
    pub record: PatientRecord,
    pub timeline: ValidationResult,
    pub delays: DelayMetrics,
    pub literacy: LiteracyReport,
    pub issues: Vec<Issue>,
}

impl FinalizedRecord {
    /// Essential fields that are still blank.
    pub fn missing_essentials(&self) -> Vec<&'static str> {
        let r = &self.record;
        catalog::ESSENTIAL_FIELDS
            .iter()
            .copied()
            .filter(|key| match *key {
                "Participant_ID" => r.participant_id.is_empty(),
                "Age" => r.age.is_none(),
                "Gender" => r.gender.is_none(),
                "TB_Type" => r.tb_type.is_none(),
                _ => false,
            })
            .collect()
    }

    pub fn blocking_issues(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| !i.is_warning())
    }
}

fn parse_date(spec: &FieldSpec, value: &str) -> Result<Option<NaiveDate>, FieldError> {
    if value.is_empty() {
        return Ok(None);
    }
    delay::parse_date(spec.key, value).map(Some)
}

fn parse_integer(spec: &FieldSpec, value: &str) -> Result<Option<u32>, FieldError> {
    if value.is_empty() {
        return Ok(None);
    }
    let FieldKind::Integer { min, max } = spec.kind else {
        return Err(FieldError::new(spec.key, value, "not a numeric field"));
    };
    let n: u32 = value
        .parse()
        .map_err(|_| FieldError::new(spec.key, value, "not a whole number"))?;
    if !(min..=max).contains(&n) {
        return Err(FieldError::new(
            spec.key,
            value,
            format!("must be between {min} and {max}"),
        ));
    }
    Ok(Some(n))
}

fn parse_choice<T>(spec: &FieldSpec, value: &str) -> Result<Option<T>, FieldError>
where
    T: FromStr<Err = String>,
{
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|reason| FieldError::new(spec.key, value, reason))
}

fn parse_listed(spec: &FieldSpec, value: &str) -> Result<Option<String>, FieldError> {
    if value.is_empty() {
        return Ok(None);
    }
    let FieldKind::Choice(options) = spec.kind else {
        return Err(FieldError::new(spec.key, value, "not a choice field"));
    };
    catalog::canonical_option(options, value)
        .map(|o| Some(o.to_string()))
        .ok_or_else(|| {
            FieldError::new(spec.key, value, format!("expected one of: {}", options.join(", ")))
        })
}

fn parse_options(spec: &FieldSpec, value: &str) -> Result<OptionSet, FieldError> {
    let FieldKind::MultiChoice(options) = spec.kind else {
        return Err(FieldError::new(spec.key, value, "not a multi-choice field"));
    };
    let mut set = OptionSet::default();

    for part in value.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        if let Some((head, text)) = part.split_once(':') {
            if head.trim().eq_ignore_ascii_case("Other") && options.contains(&"Other") {
                set.selected.insert("Other".to_string());
                let text = text.trim();
                if !text.is_empty() {
                    set.other = Some(text.to_string());
                }
                continue;
            }
        }
        let option = catalog::canonical_option(options, part)
            .ok_or_else(|| FieldError::new(spec.key, part, "not an allowed option"))?;
        set.selected.insert(option.to_string());
    }

    if set.contains("None") && set.selected.len() > 1 {
        return Err(FieldError::new(
            spec.key,
            value,
            "'None' cannot be combined with other options",
        ));
    }
    Ok(set)
}

fn parse_flag(spec: &FieldSpec, value: &str) -> Result<bool, FieldError> {
    match value.to_ascii_lowercase().as_str() {
        "" | "false" | "no" | "0" => Ok(false),
        "true" | "yes" | "1" => Ok(true),
        _ => Err(FieldError::new(spec.key, value, "expected yes or no")),
    }
}

fn parse_response(spec: &FieldSpec, value: &str) -> Result<Option<Response>, FieldError> {
    if value.is_empty() {
        return Ok(None);
    }
    Response::parse(value)
        .map(Some)
        .ok_or_else(|| FieldError::new(spec.key, value, "expected Yes/No, Agree/Disagree or 1-5"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, LiteracyLevel, TbType};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 1).expect("valid date")
    }

    fn complete_session() -> Session {
        let mut session = Session::new(today());
        let errors = session.apply([
            ("Participant_ID", "TB001"),
            ("Age", "34"),
            ("Gender", "female"),
            ("TB_Type", "Pulmonary"),
            ("Date_Symptom_Onset", "2024-01-01"),
            ("Date_First_Visit", "2024-01-10"),
            ("Date_Diagnosis", "2024-01-20"),
            ("Date_Treatment_Start", "2024-01-22"),
            ("DHLI_Q1", "Yes"),
            ("DHLI_Q2", "Yes"),
            ("DHLI_Q3", "Agree"),
            ("DHLI_Q4", "Yes"),
            ("DHLI_Q5", "Disagree"),
            ("DHLI_Q6", "Yes"),
            ("DHLI_Q7", "No"),
            ("DHLI_Q8", "Agree"),
            ("DHLI_Q9", "No"),
            ("DHLI_Q10", "Yes"),
        ]);
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        session
    }

    #[test]
    fn generated_ids_are_eight_upper_hex_digits() {
        let id = generate_participant_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn finalizes_a_complete_record() {
        let finalized = complete_session().finalize(&StudyConfig::default());
        assert_eq!(finalized.record.gender, Some(Gender::Female));
        assert_eq!(finalized.record.tb_type, Some(TbType::Pulmonary));
        assert_eq!(finalized.delays.total_delay_days, Some(21));
        assert!(finalized.timeline.is_valid());
        let literacy = finalized.literacy.result.as_ref().expect("scored");
        assert_eq!(literacy.total, 8);
        assert_eq!(literacy.level, LiteracyLevel::High);
        assert!(finalized.issues.is_empty());
        assert!(finalized.missing_essentials().is_empty());
    }

    #[test]
    fn bad_fields_do_not_stop_the_rest() {
        let mut session = Session::new(today());
        let errors = session.apply([
            ("Date_Symptom_Onset", "01/01/2024"),
            ("Date_First_Visit", "2024-01-10"),
            ("Age", "130"),
            ("Favourite_Colour", "blue"),
        ]);
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["Date_Symptom_Onset", "Age", "Favourite_Colour"]);
        assert_eq!(
            session.record().dates.first_visit,
            NaiveDate::from_ymd_opt(2024, 1, 10)
        );

        let finalized = session.finalize(&StudyConfig::default());
        assert_eq!(finalized.blocking_issues().count(), 3);
        assert_eq!(finalized.delays.patient_delay_days, None);
    }

    #[test]
    fn correcting_a_field_clears_its_error() {
        let mut session = Session::new(today());
        let config = StudyConfig::default();
        assert!(session.set_field("Date_Diagnosis", "2024-13-40").is_err());
        assert_eq!(session.finalize(&config).blocking_issues().count(), 1);
        session
            .set_field("Date_Diagnosis", "2024-01-20")
            .expect("valid date");
        assert_eq!(session.finalize(&config).blocking_issues().count(), 0);
    }

    #[test]
    fn rejected_reentry_blanks_the_old_value() {
        let mut session = complete_session();
        assert!(session.set_field("Date_First_Visit", "2024-01-32").is_err());
        assert_eq!(session.record().dates.first_visit, None);

        let finalized = session.finalize(&StudyConfig::default());
        assert_eq!(finalized.delays.patient_delay_days, None);
        assert_eq!(finalized.delays.provider_delay_days, None);
        assert_eq!(finalized.delays.total_delay_days, Some(21));
        assert_eq!(finalized.blocking_issues().count(), 1);
        let row = crate::export::cells(&finalized);
        assert!(row.contains(&("Date_First_Visit", String::new())));

        assert!(session.set_field("DHLI_Q3", "perhaps").is_err());
        assert_eq!(session.record().literacy_answers[2], None);
        assert!(session.set_field("Age", "-4").is_err());
        assert_eq!(session.record().age, None);
    }

    #[test]
    fn ordering_violations_are_warnings() {
        let mut session = complete_session();
        session
            .set_field("Date_First_Visit", "2023-12-23")
            .expect("valid date");
        let finalized = session.finalize(&StudyConfig::default());
        assert!(!finalized.timeline.is_valid());
        assert_eq!(finalized.delays.patient_delay_days, Some(-9));
        assert!(finalized.issues.iter().all(Issue::is_warning));
        assert_eq!(finalized.blocking_issues().count(), 0);
    }

    #[test]
    fn option_sets_keep_other_text_and_guard_none() {
        let mut session = Session::new(today());
        session
            .set_field(
                "Patient_Delay_Reason",
                "financial constraints; Other: harvest season",
            )
            .expect("valid reasons");
        let reasons = &session.record().patient_delay_reasons;
        assert!(reasons.contains("Financial constraints"));
        assert!(reasons.contains("Other"));
        assert_eq!(reasons.other.as_deref(), Some("harvest season"));

        let err = session
            .set_field("Comorbidities", "None; Diabetes")
            .unwrap_err();
        assert_eq!(err.field, "Comorbidities");
        assert!(session.set_field("Comorbidities", "Asthma").is_err());
    }

    #[test]
    fn empty_values_clear_fields() {
        let mut session = complete_session();
        session.set_field("Gender", "").expect("clearing is allowed");
        session.set_field("DHLI_Q4", " ").expect("clearing is allowed");
        let finalized = session.finalize(&StudyConfig::default());
        assert_eq!(finalized.missing_essentials(), vec!["Gender"]);
        assert_eq!(finalized.literacy.result, None);
    }

    #[test]
    fn partial_scoring_follows_configuration() {
        let mut session = complete_session();
        session.set_field("DHLI_Q4", "").expect("clearing is allowed");
        let config = StudyConfig {
            allow_partial_scoring: true,
            ..StudyConfig::default()
        };
        let finalized = session.finalize(&config);
        let literacy = finalized.literacy.result.expect("partial score");
        assert_eq!(literacy.answered, 9);
        assert_eq!(literacy.total, 7);
    }
}
