//! Per-kind assertions over the value read back from the page

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::case::CaseKind;
use crate::catalogue::TENSE_MISMATCH_FORBIDDEN;

/// What the runner read from the input control
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Observation {
    /// Value after clearing and before typing. Only read for typed cases.
    pub before: Option<String>,

    /// Value after submission and settle
    pub actual: String,
}

impl Observation {
    pub fn filled(actual: impl Into<String>) -> Self {
        Self {
            before: None,
            actual: actual.into(),
        }
    }

    pub fn typed(before: impl Into<String>, actual: impl Into<String>) -> Self {
        Self {
            before: Some(before.into()),
            actual: actual.into(),
        }
    }
}

/// A failed expectation with enough context to diagnose it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionFailure {
    /// Short name of the expectation
    pub check: String,
    pub expected: String,
    pub actual: String,
}

impl AssertionFailure {
    fn new(check: &str, expected: impl Into<String>, actual: &str) -> Self {
        Self {
            check: check.to_string(),
            expected: expected.into(),
            actual: actual.to_string(),
        }
    }
}

impl fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {}, got {:?}",
            self.check, self.expected, self.actual
        )
    }
}

/// Apply the rules for `kind` to an observation
pub fn evaluate(kind: CaseKind, obs: &Observation) -> Result<(), AssertionFailure> {
    let actual = obs.actual.as_str();

    match kind {
        CaseKind::PositiveUi => {
            let before = obs.before.as_deref().unwrap_or_default();
            if actual == before {
                return Err(AssertionFailure::new(
                    "value changed",
                    format!("a value different from {:?}", before),
                    actual,
                ));
            }
            non_empty(actual)
        }
        CaseKind::PositiveFunctional | CaseKind::NegativeNoSignal | CaseKind::NegativeStress => {
            non_empty(actual)
        }
        CaseKind::NegativeEmpty => {
            if actual.trim().is_empty() {
                Ok(())
            } else {
                Err(AssertionFailure::new("blank", "an empty value", actual))
            }
        }
        CaseKind::NegativeTenseMismatch => {
            if actual.contains(TENSE_MISMATCH_FORBIDDEN) {
                return Err(AssertionFailure::new(
                    "forbidden rendering",
                    format!("no occurrence of {:?}", TENSE_MISMATCH_FORBIDDEN),
                    actual,
                ));
            }
            non_empty(actual)
        }
    }
}

/// Known gap in what a kind's assertions establish, reported with its
/// outcome
pub fn caveat(kind: CaseKind) -> Option<&'static str> {
    match kind {
        CaseKind::NegativeNoSignal => {
            Some("only checks the value is non-empty; absence of Tamil output is not asserted")
        }
        _ => None,
    }
}

fn non_empty(actual: &str) -> Result<(), AssertionFailure> {
    if actual.is_empty() {
        Err(AssertionFailure::new("non-empty", "a non-empty value", actual))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(CaseKind::PositiveFunctional ; "functional")]
    #[test_case(CaseKind::NegativeNoSignal ; "no signal")]
    #[test_case(CaseKind::NegativeStress ; "stress")]
    #[test_case(CaseKind::NegativeTenseMismatch ; "tense")]
    fn test_empty_value_fails_non_empty_kinds(kind: CaseKind) {
        let failure = evaluate(kind, &Observation::filled("")).unwrap_err();
        assert_eq!(failure.check, "non-empty");
    }

    #[test_case(CaseKind::PositiveFunctional ; "functional")]
    #[test_case(CaseKind::NegativeNoSignal ; "no signal")]
    #[test_case(CaseKind::NegativeStress ; "stress")]
    fn test_any_value_passes_non_empty_kinds(kind: CaseKind) {
        assert!(evaluate(kind, &Observation::filled("வணக்கம்")).is_ok());
    }

    #[test]
    fn test_whitespace_only_value_passes_no_signal() {
        assert!(evaluate(CaseKind::NegativeNoSignal, &Observation::filled("     ")).is_ok());
    }

    #[test_case("" ; "empty")]
    #[test_case("  \n\t" ; "whitespace")]
    fn test_blank_passes_negative_empty(actual: &str) {
        assert!(evaluate(CaseKind::NegativeEmpty, &Observation::filled(actual)).is_ok());
    }

    #[test]
    fn test_text_fails_negative_empty() {
        let failure = evaluate(CaseKind::NegativeEmpty, &Observation::filled(" அ ")).unwrap_err();
        assert_eq!(failure.check, "blank");
        assert_eq!(failure.actual, " அ ");
    }

    #[test]
    fn test_forbidden_rendering_fails_even_when_embedded() {
        let actual = format!("prefix {} suffix", TENSE_MISMATCH_FORBIDDEN);
        let failure =
            evaluate(CaseKind::NegativeTenseMismatch, &Observation::filled(actual)).unwrap_err();
        assert_eq!(failure.check, "forbidden rendering");
    }

    #[test]
    fn test_correct_tense_rendering_passes() {
        let obs = Observation::filled("நான் நாளைக்கு போவேன்");
        assert!(evaluate(CaseKind::NegativeTenseMismatch, &obs).is_ok());
    }

    #[test]
    fn test_typing_must_change_value() {
        let unchanged = Observation::typed("", "");
        let failure = evaluate(CaseKind::PositiveUi, &unchanged).unwrap_err();
        assert_eq!(failure.check, "value changed");

        let changed = Observation::typed("", "வணக்கம் எப்படி இருக்கீங்க");
        assert!(evaluate(CaseKind::PositiveUi, &changed).is_ok());
    }

    #[test]
    fn test_only_no_signal_carries_caveat() {
        for kind in CaseKind::ALL {
            assert_eq!(caveat(kind).is_some(), kind == CaseKind::NegativeNoSignal);
        }
    }

    #[test]
    fn test_failure_display_includes_values() {
        let failure = evaluate(CaseKind::NegativeEmpty, &Observation::filled("x")).unwrap_err();
        assert_eq!(failure.to_string(), "blank: expected an empty value, got \"x\"");
    }
}
