//! Test case records and the closed set of case kinds

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{E2eError, E2eResult};

/// Category tag selecting both the interaction protocol and the assertions
/// applied to a case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseKind {
    /// Bulk fill; the page must produce a value
    #[serde(alias = "pos")]
    PositiveFunctional,
    /// Live character-by-character typing
    #[serde(alias = "ui")]
    PositiveUi,
    /// Nothing submitted; the box must stay blank
    #[serde(alias = "neg_empty")]
    NegativeEmpty,
    /// Input with no Tamil phonetic signal (symbols, digits, English)
    #[serde(alias = "neg_no_tamil")]
    NegativeNoSignal,
    /// Input whose naive rendering mixes future adverb and past verb
    #[serde(alias = "neg_tense")]
    NegativeTenseMismatch,
    /// Long repetitive payload
    #[serde(alias = "neg_stress")]
    NegativeStress,
}

impl CaseKind {
    pub const ALL: [CaseKind; 6] = [
        CaseKind::PositiveFunctional,
        CaseKind::PositiveUi,
        CaseKind::NegativeEmpty,
        CaseKind::NegativeNoSignal,
        CaseKind::NegativeTenseMismatch,
        CaseKind::NegativeStress,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CaseKind::PositiveFunctional => "positive_functional",
            CaseKind::PositiveUi => "positive_ui",
            CaseKind::NegativeEmpty => "negative_empty",
            CaseKind::NegativeNoSignal => "negative_no_signal",
            CaseKind::NegativeTenseMismatch => "negative_tense_mismatch",
            CaseKind::NegativeStress => "negative_stress",
        }
    }
}

impl fmt::Display for CaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for CaseKind {
    type Err = E2eError;

    fn from_str(tag: &str) -> E2eResult<Self> {
        let kind = match tag.trim() {
            "positive_functional" | "pos" => CaseKind::PositiveFunctional,
            "positive_ui" | "ui" => CaseKind::PositiveUi,
            "negative_empty" | "neg_empty" => CaseKind::NegativeEmpty,
            "negative_no_signal" | "neg_no_tamil" => CaseKind::NegativeNoSignal,
            "negative_tense_mismatch" | "neg_tense" => CaseKind::NegativeTenseMismatch,
            "negative_stress" | "neg_stress" => CaseKind::NegativeStress,
            other => return Err(E2eError::UnknownKind(other.to_string())),
        };
        Ok(kind)
    }
}

/// A single scenario: what to type and which rules judge the result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestCase {
    /// Stable identifier used for reporting and selective re-runs
    pub id: String,

    pub kind: CaseKind,

    /// Text submitted to the page. May be empty.
    pub input: String,
}

impl TestCase {
    pub fn new(id: impl Into<String>, kind: CaseKind, input: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            input: input.into(),
        }
    }
}

/// Case as written in an external YAML catalogue, before the kind tag is
/// checked against the closed set
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawCase {
    pub id: String,
    pub kind: String,
    #[serde(default)]
    pub input: String,
}

impl TryFrom<RawCase> for TestCase {
    type Error = E2eError;

    fn try_from(raw: RawCase) -> E2eResult<Self> {
        let kind = raw.kind.parse()?;
        Ok(TestCase {
            id: raw.id,
            kind,
            input: raw.input,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("pos", CaseKind::PositiveFunctional ; "legacy positive")]
    #[test_case("ui", CaseKind::PositiveUi ; "legacy ui")]
    #[test_case("neg_no_tamil", CaseKind::NegativeNoSignal ; "legacy no tamil")]
    #[test_case("neg_tense", CaseKind::NegativeTenseMismatch ; "legacy tense")]
    #[test_case("negative_stress", CaseKind::NegativeStress ; "canonical stress")]
    #[test_case(" negative_empty ", CaseKind::NegativeEmpty ; "surrounding whitespace")]
    fn test_parse_kind_tags(tag: &str, expected: CaseKind) {
        assert_eq!(tag.parse::<CaseKind>().unwrap(), expected);
    }

    #[test]
    fn test_display_honours_width() {
        assert_eq!(format!("[{:<24}]", CaseKind::NegativeEmpty), "[negative_empty          ]");
        assert_eq!(format!("{:>10}", CaseKind::PositiveUi), "positive_ui");
        assert_eq!(format!("{:>13}|", CaseKind::PositiveUi), "  positive_ui|");
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let err = "neg_typo".parse::<CaseKind>().unwrap_err();
        assert!(matches!(err, E2eError::UnknownKind(ref tag) if tag == "neg_typo"));
    }

    #[test]
    fn test_canonical_names_round_trip() {
        for kind in CaseKind::ALL {
            assert_eq!(kind.as_str().parse::<CaseKind>().unwrap(), kind);
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_raw_case_without_input_is_empty() {
        let raw: RawCase = serde_yaml::from_str("id: Neg_Fun_0002\nkind: neg_empty\n").unwrap();
        let case = TestCase::try_from(raw).unwrap();
        assert_eq!(case.kind, CaseKind::NegativeEmpty);
        assert!(case.input.is_empty());
    }
}
