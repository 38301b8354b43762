use serde::Serialize;

use crate::catalog::LITERACY_ITEMS_TABLE;
use crate::issues::{FieldError, IncompleteInput, Issue};
use crate::models::{InstrumentVariant, LiteracyLevel, LiteracyResult, Response, LITERACY_ITEMS};

/// Inclusive upper bounds of the Low and Moderate bands on a fully answered form.
/// An instrument without a Moderate band uses the same bound for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CutPoints {
    pub low_max: u32,
    pub moderate_max: u32,
}

impl InstrumentVariant {
    pub fn cut_points(self) -> CutPoints {
        match self {
            // 0..=10; six or fewer is low, seven and up is adequate.
            InstrumentVariant::ShortForm => CutPoints {
                low_max: 6,
                moderate_max: 6,
            },
            // 10..=50; eHEALS bands (<=20, 21-26, >=27 of 40) scaled to ten items.
            InstrumentVariant::Likert => CutPoints {
                low_max: 25,
                moderate_max: 33,
            },
        }
    }

    pub fn max_total(self) -> u32 {
        match self {
            InstrumentVariant::ShortForm => LITERACY_ITEMS as u32,
            InstrumentVariant::Likert => 5 * LITERACY_ITEMS as u32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiteracyReport {
    pub instrument: InstrumentVariant,
    /// Withheld when the answers cannot support a score.
    pub result: Option<LiteracyResult>,
    pub issues: Vec<Issue>,
}

pub fn item_score(
    index: usize,
    response: Response,
    instrument: InstrumentVariant,
) -> Result<u32, FieldError> {
    let item = &LITERACY_ITEMS_TABLE[index];
    let raw = response.to_string();
    match instrument {
        InstrumentVariant::ShortForm => {
            let affirmative = response.affirmative().ok_or_else(|| {
                FieldError::new(item.key, &raw, "expected Yes/No or Agree/Disagree")
            })?;
            Ok(u32::from(affirmative != item.reverse_scored))
        }
        InstrumentVariant::Likert => match response {
            Response::Likert(n @ 1..=5) => Ok(u32::from(n)),
            Response::Likert(_) => Err(FieldError::new(
                item.key,
                &raw,
                "Likert rating must be between 1 and 5",
            )),
            _ => Err(FieldError::new(item.key, &raw, "expected a 1-5 rating")),
        },
    }
}

/// Band a total against the cut points, scaled to the number of items answered.
pub fn classify(total: u32, answered: usize, instrument: InstrumentVariant) -> LiteracyLevel {
    let cuts = instrument.cut_points();
    let scaled_total = u64::from(total) * LITERACY_ITEMS as u64;
    let answered = answered as u64;
    if scaled_total <= u64::from(cuts.low_max) * answered {
        LiteracyLevel::Low
    } else if scaled_total <= u64::from(cuts.moderate_max) * answered {
        LiteracyLevel::Moderate
    } else {
        LiteracyLevel::High
    }
}

pub fn score_literacy(
    answers: &[Option<Response>; LITERACY_ITEMS],
    instrument: InstrumentVariant,
    allow_partial_scoring: bool,
) -> LiteracyReport {
    let mut issues = Vec::new();
    let mut missing = Vec::new();
    let mut item_scores = [None; LITERACY_ITEMS];

    for (index, answer) in answers.iter().enumerate() {
        let key = LITERACY_ITEMS_TABLE[index].key;
        match answer {
            None => missing.push(key.to_string()),
            Some(response) => match item_score(index, *response, instrument) {
                Ok(score) => item_scores[index] = Some(score),
                Err(e) => {
                    issues.push(Issue::Field(e));
                    missing.push(key.to_string());
                }
            },
        }
    }

    let answered = item_scores.iter().flatten().count();
    let incomplete = !missing.is_empty();
    if incomplete {
        issues.push(Issue::Incomplete(IncompleteInput {
            metric: "literacyScore",
            missing,
        }));
    }

    if answered == 0 || (incomplete && !allow_partial_scoring) {
        return LiteracyReport {
            instrument,
            result: None,
            issues,
        };
    }

    let total: u32 = item_scores.iter().flatten().sum();
    LiteracyReport {
        instrument,
        result: Some(LiteracyResult {
            total,
            level: classify(total, answered, instrument),
            answered,
            item_scores,
        }),
        issues,
    }
}
