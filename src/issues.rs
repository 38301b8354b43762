use serde::Serialize;
use thiserror::Error;

/// A single field failed parsing or range validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{field}: {reason} (got '{value}')")]
pub struct FieldError {
    pub field: String,
    pub value: String,
    pub reason: String,
}

impl FieldError {
    pub fn new(field: &str, value: &str, reason: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Two present timeline dates that are out of chronological order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{later} precedes {earlier}")]
pub struct OrderingViolation {
    /// The field expected to come first.
    pub earlier: &'static str,
    /// The field that was dated before it.
    pub later: &'static str,
    pub gap_days: i64,
}

/// A value could not be derived because an input is missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{metric} is undefined: missing {}", .missing.join(", "))]
pub struct IncompleteInput {
    pub metric: &'static str,
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Issue {
    #[error("field error: {0}")]
    Field(FieldError),

    #[error("ordering warning: {0}")]
    Ordering(OrderingViolation),

    #[error("incomplete: {0}")]
    Incomplete(IncompleteInput),
}

impl Issue {
    /// Ordering warnings and missing inputs never block export.
    pub fn is_warning(&self) -> bool {
        !matches!(self, Issue::Field(_))
    }
}

impl From<FieldError> for Issue {
    fn from(e: FieldError) -> Self {
        Issue::Field(e)
    }
}

impl From<OrderingViolation> for Issue {
    fn from(v: OrderingViolation) -> Self {
        Issue::Ordering(v)
    }
}

impl From<IncompleteInput> for Issue {
    fn from(i: IncompleteInput) -> Self {
        Issue::Incomplete(i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_fields() {
        let err = FieldError::new("Date_Diagnosis", "2024-13-01", "not a valid date");
        assert_eq!(
            err.to_string(),
            "Date_Diagnosis: not a valid date (got '2024-13-01')"
        );

        let violation = OrderingViolation {
            earlier: "symptomOnsetDate",
            later: "firstVisitDate",
            gap_days: -9,
        };
        assert_eq!(
            violation.to_string(),
            "firstVisitDate precedes symptomOnsetDate"
        );

        let incomplete = IncompleteInput {
            metric: "literacyScore",
            missing: vec!["DHLI_Q2".to_string(), "DHLI_Q7".to_string()],
        };
        assert_eq!(
            incomplete.to_string(),
            "literacyScore is undefined: missing DHLI_Q2, DHLI_Q7"
        );
    }

    #[test]
    fn only_field_errors_are_blocking() {
        let field: Issue = FieldError::new("Age", "abc", "not a whole number").into();
        let ordering: Issue = OrderingViolation {
            earlier: "diagnosisDate",
            later: "treatmentStartDate",
            gap_days: -1,
        }
        .into();
        assert!(!field.is_warning());
        assert!(ordering.is_warning());
    }
}
