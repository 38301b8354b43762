use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Declares a single-choice form enum whose serialized form is its label.
macro_rules! choice_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $label)] $variant,)+
        }

        impl $name {
            pub const LABELS: &'static [&'static str] = &[$($label),+];

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let needle = s.trim();
                $(
                    if needle.eq_ignore_ascii_case($label) {
                        return Ok($name::$variant);
                    }
                )+
                Err(format!("expected one of: {}", Self::LABELS.join(", ")))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

choice_enum!(Gender {
    Male => "Male",
    Female => "Female",
    Other => "Other",
});

choice_enum!(TbType {
    Pulmonary => "Pulmonary",
    ExtraPulmonary => "Extra pulmonary",
    DrTb => "DR-TB",
    Other => "Other",
});

choice_enum!(Occupation {
    Unemployed => "Unemployed",
    Salaried => "Salaried",
    SelfEmployed => "Self employed",
    DailyWage => "Daily wage/Casual",
    Other => "Other",
});

choice_enum!(Education {
    Illiterate => "Illiterate",
    Primary => "Primary",
    Secondary => "Secondary",
    SeniorSecondary => "Senior secondary",
    GraduateAndAbove => "Graduate and above",
});

choice_enum!(
    /// Monthly household income band.
    MonthlyIncome {
        Below10k => "< ₹10,000",
        From10kTo25k => "₹10,000 - ₹25,000",
        From25kTo50k => "₹25,000 - ₹50,000",
        From50kTo75k => "₹50,000 - ₹75,000",
        Above75k => "> ₹75,000",
    }
);

choice_enum!(MaritalStatus {
    Single => "Single",
    Married => "Married",
    Divorced => "Divorced",
    Widowed => "Widowed",
});

choice_enum!(Residence {
    Urban => "Urban",
    Rural => "Rural",
    SemiUrban => "Semi-Urban",
    Slum => "Slum",
});

choice_enum!(
    /// Which literacy questionnaire a deployment administers.
    InstrumentVariant {
        ShortForm => "short_form",
        Likert => "likert",
    }
);

choice_enum!(LiteracyLevel {
    Low => "Low",
    Moderate => "Moderate",
    High => "High",
});

choice_enum!(
    /// Banding of the total delay: up to 30 days, up to 60 days, beyond.
    DelayCategory {
        Low => "Low Delay",
        Moderate => "Moderate Delay",
        High => "High Delay",
    }
);

/// A set of enumerated options where "Other" may carry free text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OptionSet {
    pub selected: BTreeSet<String>,
    pub other: Option<String>,
}

impl OptionSet {
    pub fn contains(&self, option: &str) -> bool {
        self.selected.contains(option)
    }

    /// Flat cell form: options joined with "; ", free text as "Other: ...".
    pub fn to_cell(&self) -> String {
        let mut parts: Vec<String> = self
            .selected
            .iter()
            .filter(|s| s.as_str() != "Other" || self.other.is_none())
            .cloned()
            .collect();
        if let Some(text) = &self.other {
            parts.push(format!("Other: {text}"));
        }
        parts.join("; ")
    }
}

/// The four dates that bound the care pathway.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineDates {
    pub symptom_onset: Option<NaiveDate>,
    pub first_visit: Option<NaiveDate>,
    pub diagnosis: Option<NaiveDate>,
    pub treatment_start: Option<NaiveDate>,
}

impl TimelineDates {
    /// Dates in pathway order, paired with their canonical names.
    pub fn ordered(&self) -> [(&'static str, Option<NaiveDate>); 4] {
        [
            ("symptomOnsetDate", self.symptom_onset),
            ("firstVisitDate", self.first_visit),
            ("diagnosisDate", self.diagnosis),
            ("treatmentStartDate", self.treatment_start),
        ]
    }
}

/// One questionnaire answer as the operator recorded it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Response {
    Yes,
    No,
    Agree,
    Disagree,
    Likert(u8),
}

impl Response {
    pub fn parse(raw: &str) -> Option<Response> {
        let value = raw.trim();
        if let Ok(n) = value.parse::<u8>() {
            return Some(Response::Likert(n));
        }
        // Accept the bilingual option text, e.g. "Yes (ஆம்)".
        let word = value.split_whitespace().next().unwrap_or_default();
        match word.to_ascii_lowercase().as_str() {
            "yes" | "y" => Some(Response::Yes),
            "no" | "n" => Some(Response::No),
            "agree" => Some(Response::Agree),
            "disagree" => Some(Response::Disagree),
            _ => None,
        }
    }

    /// Yes/Agree are affirmative; Likert values have no polarity.
    pub fn affirmative(self) -> Option<bool> {
        match self {
            Response::Yes | Response::Agree => Some(true),
            Response::No | Response::Disagree => Some(false),
            Response::Likert(_) => None,
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Yes => f.write_str("Yes"),
            Response::No => f.write_str("No"),
            Response::Agree => f.write_str("Agree"),
            Response::Disagree => f.write_str("Disagree"),
            Response::Likert(n) => write!(f, "{n}"),
        }
    }
}

pub const LITERACY_ITEMS: usize = 10;

/// Raw inputs collected for one respondent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PatientRecord {
    pub participant_id: String,
    pub name_initials: String,
    pub collection_date: Option<NaiveDate>,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub address: String,
    pub occupation: Option<Occupation>,
    pub education: Option<Education>,
    pub monthly_income: Option<MonthlyIncome>,
    pub marital_status: Option<MaritalStatus>,
    pub residence: Option<Residence>,
    pub comorbidities: OptionSet,
    pub comorbidities_details: String,
    pub tb_type: Option<TbType>,
    pub substance_use: OptionSet,
    pub substance_use_details: String,
    pub dates: TimelineDates,
    pub patient_delay_reasons: OptionSet,
    pub provider_delay_reasons: OptionSet,
    pub treatment_delay_reasons: OptionSet,
    pub symptoms: OptionSet,
    pub first_care_location: Option<String>,
    pub healthcare_visits: Option<u32>,
    pub diagnostic_tests: OptionSet,
    pub support_needed: OptionSet,
    pub literacy_answers: [Option<Response>; LITERACY_ITEMS],
    pub data_verified: bool,
    pub verification_notes: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DelayMetrics {
    pub patient_delay_days: Option<i64>,
    pub provider_delay_days: Option<i64>,
    pub treatment_delay_days: Option<i64>,
    pub total_delay_days: Option<i64>,
    pub no_delay: Option<bool>,
}

impl DelayMetrics {
    pub fn category(&self) -> Option<DelayCategory> {
        self.total_delay_days.map(|days| match days {
            i64::MIN..=30 => DelayCategory::Low,
            31..=60 => DelayCategory::Moderate,
            _ => DelayCategory::High,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiteracyResult {
    pub total: u32,
    pub level: LiteracyLevel,
    pub answered: usize,
    /// Per-item contribution, `None` for items left out of the sum.
    pub item_scores: [Option<u32>; LITERACY_ITEMS],
}

/// Total-delay statistics for one group of patients.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub label: String,
    pub count: usize,
    pub mean_total_delay: Option<f64>,
    pub median_total_delay: Option<f64>,
    pub min_total_delay: Option<i64>,
    pub max_total_delay: Option<i64>,
}
