//! Static form configuration.
//!
//! Every field the intake form collects is described once here: its key
//! (also the CSV column name), its bilingual label and the values it
//! accepts. The tables are compile-time constants and never change at
//! runtime.

use crate::models::{
    Education, Gender, MaritalStatus, MonthlyIncome, Occupation, Residence, TbType,
    LITERACY_ITEMS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label {
    pub en: &'static str,
    pub ta: Option<&'static str>,
}

const fn en(text: &'static str) -> Label {
    Label { en: text, ta: None }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer { min: u32, max: u32 },
    Date,
    Choice(&'static [&'static str]),
    /// Options where "None" excludes everything else.
    MultiChoice(&'static [&'static str]),
    Bool,
    /// Zero-based index into [`LITERACY_ITEMS_TABLE`].
    LiteracyItem(usize),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: Label,
    pub kind: FieldKind,
    pub section: Section,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Demographics,
    Pathway,
    Literacy,
    Verification,
}

impl Section {
    pub fn title(self) -> &'static str {
        match self {
            Section::Demographics => "Demographics & Clinical Information",
            Section::Pathway => "Digital Pathway Mapping",
            Section::Literacy => "Digital Health Literacy Assessment (DHLI)",
            Section::Verification => "Data Verification",
        }
    }
}

pub const COMORBIDITY_OPTIONS: &[&str] = &["None", "Diabetes", "Hypertension", "HIV", "Other"];

pub const SUBSTANCE_OPTIONS: &[&str] = &["None", "Tobacco", "Alcohol", "Other"];

pub const PATIENT_DELAY_REASONS: &[&str] = &[
    "Did not recognize symptoms as serious",
    "Financial constraints",
    "Lack of awareness about TB",
    "Fear of stigma related to TB",
    "Unavailability of healthcare services",
    "Transportation issues",
    "Work/family commitments",
    "Self-medication attempts",
    "Other",
];

pub const PROVIDER_DELAY_REASONS: &[&str] = &[
    "Delay in diagnostic tests",
    "Waiting for test results",
    "Misdiagnosis/incorrect initial diagnosis",
    "Unavailability of healthcare provider",
    "Inadequate clinical assessment",
    "Referral delays between facilities",
    "Equipment/facility unavailability",
    "Administrative delays",
    "Other",
];

pub const TREATMENT_DELAY_REASONS: &[&str] = &[
    "Delay in availability of medicines",
    "Waiting for additional test results",
    "Financial reasons",
    "Patient counseling and preparation",
    "Administrative/paperwork delays",
    "Referral to specialized center",
    "Patient readiness/consent issues",
    "Lack of awareness of treatment urgency",
    "Other",
];

pub const SYMPTOM_OPTIONS: &[&str] = &[
    "Cough > 2 weeks",
    "Fever",
    "Weight loss",
    "Night sweats",
    "Chest pain",
    "Haemoptysis",
    "Other",
];

pub const FIRST_CARE_OPTIONS: &[&str] = &[
    "Government hospital",
    "Primary health centre",
    "Private clinic",
    "Private hospital",
    "Pharmacy",
    "Traditional healer",
    "Other",
];

pub const DIAGNOSTIC_TEST_OPTIONS: &[&str] = &[
    "Sputum smear",
    "CBNAAT/TrueNat",
    "Chest X-ray",
    "Culture",
    "Biopsy",
    "Other",
];

pub const SUPPORT_OPTIONS: &[&str] = &[
    "Nutritional support",
    "Financial support",
    "Counselling",
    "Transport",
    "Digital reminders",
    "Other",
];

/// One item of the 10-item oral literacy questionnaire.
#[derive(Debug, Clone, Copy)]
pub struct LiteracyItem {
    pub key: &'static str,
    pub prompt: Label,
    pub options: [&'static str; 2],
    /// A "No" answer scores 1 on reverse-scored items.
    pub reverse_scored: bool,
}

const YES_NO: [&str; 2] = ["No (இல்லை)", "Yes (ஆம்)"];
const AGREE: [&str; 2] = [
    "Disagree (ஒப்புக்கொள்ளவில்லை)",
    "Agree (ஒப்புக்கொள்கிறேன்)",
];

pub const LITERACY_ITEMS_TABLE: [LiteracyItem; LITERACY_ITEMS] = [
    LiteracyItem {
        key: "DHLI_Q1",
        prompt: Label {
            en: "Do you have access to a mobile phone for health info?",
            ta: Some("உங்கள் மொபைல் போனில் சுகாதார தகவல்களைப் பெற முடியுமா?"),
        },
        options: YES_NO,
        reverse_scored: false,
    },
    LiteracyItem {
        key: "DHLI_Q2",
        prompt: Label {
            en: "Can you use a phone to call for medical advice?",
            ta: Some("மருத்துவ ஆலோசனைக்காக போன் செய்ய முடியுமா?"),
        },
        options: YES_NO,
        reverse_scored: false,
    },
    LiteracyItem {
        key: "DHLI_Q3",
        prompt: Label {
            en: "Do you know how to send/receive SMS health messages?",
            ta: Some("SMS சுகாதார செய்திகளை அனுப்ப/பெற முடியுமா?"),
        },
        options: AGREE,
        reverse_scored: false,
    },
    LiteracyItem {
        key: "DHLI_Q4",
        prompt: Label {
            en: "Can you find health info using voice calls or simple apps?",
            ta: Some("குரல் அழைப்பு அல்லது எளிய ஆப் மூலம் சுகாதார தகவலைத் தேட முடியுமா?"),
        },
        options: YES_NO,
        reverse_scored: false,
    },
    LiteracyItem {
        key: "DHLI_Q5",
        prompt: Label {
            en: "Do you check if phone/online health info is reliable?",
            ta: Some("போன்/ஆன்லைன் சுகாதார தகவல் நம்பகமானதா என சரிபார்க்கிறீர்களா?"),
        },
        options: AGREE,
        reverse_scored: false,
    },
    LiteracyItem {
        key: "DHLI_Q6",
        prompt: Label {
            en: "Can you understand health videos/audio on phone?",
            ta: Some("போனில் சுகாதார வீடியோ/ஆடியோவைப் புரிந்து கொள்ள முடியுமா?"),
        },
        options: YES_NO,
        reverse_scored: false,
    },
    LiteracyItem {
        key: "DHLI_Q7",
        prompt: Label {
            en: "Do you use digital tools (e.g., SMS) to remember appointments?",
            ta: Some("appointment-களை நினைவூட்ட எஸ்எம்எஸ் போன்ற டிஜிட்டல் கருவிகளைப் பயன்படுத்துகிறீர்களா?"),
        },
        options: YES_NO,
        reverse_scored: false,
    },
    LiteracyItem {
        key: "DHLI_Q8",
        prompt: Label {
            en: "Can you share health info with family via phone?",
            ta: Some("குடும்பத்துடன் சுகாதார தகவலை போன் மூலம் பகிர முடியுமா?"),
        },
        options: AGREE,
        reverse_scored: false,
    },
    LiteracyItem {
        key: "DHLI_Q9",
        prompt: Label {
            en: "Do you face problems using digital health services due to language/tech barriers?",
            ta: Some("மொழி/டெக் காரணமாக டிஜிட்டல் சுகாதார சேவைகளில் சிக்கல்கள் உண்டா?"),
        },
        options: YES_NO,
        reverse_scored: true,
    },
    LiteracyItem {
        key: "DHLI_Q10",
        prompt: Label {
            en: "Would you use phone-based TB reminders if available?",
            ta: Some("கிடைக்குமானால் போன் அடிப்படையிலான டிபி நினைவூட்டிகளைப் பயன்படுத்துவீர்களா?"),
        },
        options: YES_NO,
        reverse_scored: false,
    },
];

/// Fields that must be filled before a record may be exported.
pub const ESSENTIAL_FIELDS: &[&str] = &["Participant_ID", "Age", "Gender", "TB_Type"];

const fn field(key: &'static str, label: Label, kind: FieldKind, section: Section) -> FieldSpec {
    FieldSpec {
        key,
        label,
        kind,
        section,
    }
}

const fn item(index: usize) -> FieldSpec {
    let entry = LITERACY_ITEMS_TABLE[index];
    field(
        entry.key,
        entry.prompt,
        FieldKind::LiteracyItem(index),
        Section::Literacy,
    )
}

pub const FIELDS: &[FieldSpec] = {
    use FieldKind::*;
    use Section::*;
    &[
        field("Participant_ID", en("Participant ID"), Text, Demographics),
        field("Name_Initials", en("Name/Initials"), Text, Demographics),
        field("Data_Collection_Date", en("Data collection date"), Date, Demographics),
        field("Age", en("Age"), Integer { min: 0, max: 120 }, Demographics),
        field("Gender", en("Gender"), Choice(Gender::LABELS), Demographics),
        field("Address", en("Address"), Text, Demographics),
        field("Occupation", en("Occupation"), Choice(Occupation::LABELS), Demographics),
        field("Education", en("Education Level"), Choice(Education::LABELS), Demographics),
        field(
            "Monthly_Income",
            en("Monthly Household Income"),
            Choice(MonthlyIncome::LABELS),
            Demographics,
        ),
        field(
            "Marital_Status",
            en("Marital Status"),
            Choice(MaritalStatus::LABELS),
            Demographics,
        ),
        field(
            "Residence_Type",
            en("Type of Residence"),
            Choice(Residence::LABELS),
            Demographics,
        ),
        field(
            "Comorbidities",
            en("Comorbidities"),
            MultiChoice(COMORBIDITY_OPTIONS),
            Demographics,
        ),
        field("Comorbidities_Details", en("Comorbidity details"), Text, Demographics),
        field("TB_Type", en("TB Type"), Choice(TbType::LABELS), Demographics),
        field(
            "Addictive_Substances",
            en("Addictive substances"),
            MultiChoice(SUBSTANCE_OPTIONS),
            Demographics,
        ),
        field(
            "Addictive_Substances_Details",
            en("Substance use details"),
            Text,
            Demographics,
        ),
        field("Date_Symptom_Onset", en("Date of Symptom Onset"), Date, Pathway),
        field("Date_First_Visit", en("Date of First Healthcare Visit"), Date, Pathway),
        field("Date_Diagnosis", en("Date of TB Diagnosis Confirmation"), Date, Pathway),
        field("Date_Treatment_Start", en("Date of Treatment Initiation"), Date, Pathway),
        field(
            "Patient_Delay_Reason",
            en("Reasons for patient delay"),
            MultiChoice(PATIENT_DELAY_REASONS),
            Pathway,
        ),
        field(
            "Provider_Delay_Reason",
            en("Reasons for provider delay"),
            MultiChoice(PROVIDER_DELAY_REASONS),
            Pathway,
        ),
        field(
            "Treatment_Delay_Reason",
            en("Reasons for treatment delay"),
            MultiChoice(TREATMENT_DELAY_REASONS),
            Pathway,
        ),
        field("Symptoms_Nature", en("Nature of symptoms"), MultiChoice(SYMPTOM_OPTIONS), Pathway),
        field(
            "First_Care_Location",
            en("Where was care first sought?"),
            Choice(FIRST_CARE_OPTIONS),
            Pathway,
        ),
        field(
            "Healthcare_Visits_Count",
            en("Healthcare visits before diagnosis"),
            Integer { min: 0, max: 50 },
            Pathway,
        ),
        field(
            "Diagnostic_Tests",
            en("Diagnostic tests performed"),
            MultiChoice(DIAGNOSTIC_TEST_OPTIONS),
            Pathway,
        ),
        field(
            "Additional_Support_Needed",
            en("Additional support needed"),
            MultiChoice(SUPPORT_OPTIONS),
            Pathway,
        ),
        item(0),
        item(1),
        item(2),
        item(3),
        item(4),
        item(5),
        item(6),
        item(7),
        item(8),
        item(9),
        field(
            "Data_Verified",
            en("Data Verified against Medical Records"),
            Bool,
            Verification,
        ),
        field("Verification_Notes", en("Verification Notes"), Text, Verification),
    ]
};

pub fn lookup(key: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|f| f.key == key)
}

/// Case-insensitive match against an option table, returning the canonical spelling.
pub fn canonical_option(options: &'static [&'static str], raw: &str) -> Option<&'static str> {
    let needle = raw.trim();
    options
        .iter()
        .copied()
        .find(|o| o.eq_ignore_ascii_case(needle))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn field_keys_are_unique() {
        let mut seen = HashSet::new();
        for spec in FIELDS {
            assert!(seen.insert(spec.key), "duplicate key {}", spec.key);
        }
    }

    #[test]
    fn every_literacy_item_is_a_form_field() {
        for (index, spec) in LITERACY_ITEMS_TABLE.iter().enumerate() {
            let field = lookup(spec.key).expect("literacy item registered");
            assert_eq!(field.kind, FieldKind::LiteracyItem(index));
            assert!(spec.prompt.ta.is_some());
        }
    }

    #[test]
    fn only_the_barrier_item_is_reverse_scored() {
        let reversed: Vec<_> = LITERACY_ITEMS_TABLE
            .iter()
            .filter(|i| i.reverse_scored)
            .map(|i| i.key)
            .collect();
        assert_eq!(reversed, vec!["DHLI_Q9"]);
    }

    #[test]
    fn essential_fields_exist() {
        for key in ESSENTIAL_FIELDS {
            assert!(lookup(key).is_some(), "{key} missing from catalog");
        }
    }

    #[test]
    fn canonical_option_normalises_case() {
        assert_eq!(
            canonical_option(PATIENT_DELAY_REASONS, "financial CONSTRAINTS"),
            Some("Financial constraints")
        );
        assert_eq!(canonical_option(COMORBIDITY_OPTIONS, "Asthma"), None);
    }
}
