//! The case catalogue: built-in scenarios plus YAML-supplied ones

use regex::Regex;
use std::collections::HashSet;
use std::path::Path;

use crate::case::{CaseKind, RawCase, TestCase};
use crate::error::{E2eError, E2eResult};

use CaseKind::*;

/// Phrase the tense-mismatch input must never be rendered as
/// ("I went tomorrow").
pub const TENSE_MISMATCH_FORBIDDEN: &str = "நான் நாளைக்கு போனேன்";

const STRESS_ROW: &str = "asdfghjklqwertyuiopzxcvbnm asdfghjklqwertyuiopzxcvbnm asdfghjklqwertyuiopzxcvbnm";

const BUILTIN: &[(&str, CaseKind, &str)] = &[
    ("Pos_Fun_0001", PositiveFunctional, "suriyan nalaikku uthikum"),
    ("Pos_Fun_0002", PositiveFunctional, "nan padam parkiren"),
    ("Pos_Fun_0003", PositiveFunctional, "nankal netru yalpanam ponom"),
    ("Pos_Fun_0004", PositiveFunctional, "adutha varudam naan kolumbu selven"),
    ("Pos_Fun_0005", PositiveFunctional, "naan palikudam poka maden"),
    ("Pos_Fun_0006", PositiveFunctional, "naan kadaiku ponen pinpu veduku vanthen"),
    (
        "Pos_Fun_0007",
        PositiveFunctional,
        "naan vela mudinja pinbu, mazhai peythaal veetukku poguven",
    ),
    ("Pos_Fun_0008", PositiveFunctional, "inge vaa"),
    ("Pos_Fun_0009", PositiveFunctional, "neenga inge varreenga?"),
    ("Pos_Fun_0010", PositiveFunctional, "naangal inge varom"),
    ("Pos_Fun_0011", PositiveFunctional, "naan kandy pogiren"),
    ("Pos_Fun_0012", PositiveFunctional, "naan 2 mani neram padichen"),
    ("Pos_Fun_0013", PositiveFunctional, "nee inge varen?"),
    ("Pos_Fun_0014", PositiveFunctional, "romba romba sad aa irukku"),
    ("Pos_Fun_0015", PositiveFunctional, "naanveetukuporen"),
    (
        "Pos_Fun_0016",
        PositiveFunctional,
        "naankalnenda nerama kamal varuvan endu\npathukondu irukirom.\nAnal avan inum varela",
    ),
    ("Pos_Fun_0017", PositiveFunctional, "naan dhaan seithen"),
    (
        "Pos_Fun_0018",
        PositiveFunctional,
        "avan sonnathu sari illa; naan atha accept panna maaten!",
    ),
    (
        "Pos_Fun_0019",
        PositiveFunctional,
        "enakku rendu kilo apple venum, total evlo aagum?",
    ),
    ("Pos_Fun_0020", PositiveFunctional, "wifi password enna? OTP vandhucha?"),
    (
        "Pos_Fun_0021",
        PositiveFunctional,
        "indha address correct-a? \"No 12, Main Road\" nu irukku.",
    ),
    (
        "Pos_Fun_0022",
        PositiveFunctional,
        "naan innaiku romba tired. office la work adhigama irundhuchu. lunch time kooda break edukka mudiyala. evening veetuku vandhathum konjam rest eduthen. appuram amma sonna vela ellam seithen. ippo konjam free ah irukku, nalaiku early ah ezhundhu gym poganum nu plan.",
    ),
    (
        "Pos_Fun_0023",
        PositiveFunctional,
        "indha site la thanglish type panna udane tamil varuthu nu nalla irukku. aana sila words konjam different ah varalam. nevertheless, general usage ku romba helpful. naan inime daily messages tamil la type panna try pannuren. please improve speed for long paragraph also.",
    ),
    ("Pos_UI_0001", PositiveUi, "vanakkam eppadi irukeenga"),
    ("Neg_Fun_0001", NegativeNoSignal, "@@@@@@"),
    ("Neg_Fun_0002", NegativeEmpty, ""),
    ("Neg_Fun_0003", NegativeNoSignal, "     "),
    ("Neg_Fun_0004", NegativeTenseMismatch, "naan nalaikku ponen"),
    ("Neg_Fun_0005", NegativeNoSignal, "1234567890"),
    ("Neg_Fun_0006", NegativeNoSignal, "I am going to office today"),
    ("Neg_Fun_0007", NegativeNoSignal, "wifi@home#2026"),
    ("Neg_Fun_0008", NegativeNoSignal, "n@a@n v@r#e*n"),
    ("Neg_Fun_0009", NegativeNoSignal, "naa??? enna!!!"),
];

/// Ordered, immutable set of cases for one run
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    cases: Vec<TestCase>,
}

impl Catalogue {
    /// Build a catalogue from externally supplied cases, rejecting
    /// duplicate ids
    pub fn new(cases: Vec<TestCase>) -> E2eResult<Self> {
        let mut seen = HashSet::new();
        for case in &cases {
            if !seen.insert(case.id.as_str()) {
                return Err(E2eError::DuplicateCaseId(case.id.clone()));
            }
        }
        Ok(Self { cases })
    }

    /// The scenarios shipped with the suite
    pub fn builtin() -> Self {
        let mut cases: Vec<TestCase> = BUILTIN
            .iter()
            .map(|(id, kind, input)| TestCase::new(*id, *kind, *input))
            .collect();

        cases.push(TestCase::new(
            "Neg_Fun_0010",
            NegativeStress,
            [STRESS_ROW; 3].join("\n"),
        ));

        Self { cases }
    }

    /// Parse cases from a YAML list of `{id, kind, input}` records
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        Self::new(parse_cases(yaml)?)
    }

    /// Parse cases from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load a YAML file, or every YAML file under a directory in path order
    pub fn load(path: &Path) -> E2eResult<Self> {
        if path.is_dir() {
            Self::load_dir(path)
        } else {
            Self::from_file(path)
        }
    }

    /// Load all YAML catalogues from a directory
    pub fn load_dir(dir: &Path) -> E2eResult<Self> {
        let mut cases = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            let content = std::fs::read_to_string(entry.path())?;
            cases.extend(parse_cases(&content)?);
        }

        Self::new(cases)
    }

    pub fn get(&self, id: &str) -> Option<&TestCase> {
        self.cases.iter().find(|c| c.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TestCase> {
        self.cases.iter()
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn of_kind(&self, kind: CaseKind) -> Vec<&TestCase> {
        self.cases.iter().filter(|c| c.kind == kind).collect()
    }

    /// Cases whose id matches `pattern`
    pub fn matching(&self, pattern: &str) -> E2eResult<Vec<&TestCase>> {
        let re = Regex::new(pattern)?;
        Ok(self.cases.iter().filter(|c| re.is_match(&c.id)).collect())
    }

    /// Resolve ids in the order given; any unknown id is an error
    pub fn select<S: AsRef<str>>(&self, ids: &[S]) -> E2eResult<Vec<&TestCase>> {
        ids.iter()
            .map(|id| {
                let id = id.as_ref();
                self.get(id)
                    .ok_or_else(|| E2eError::CaseNotFound(id.to_string()))
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a Catalogue {
    type Item = &'a TestCase;
    type IntoIter = std::slice::Iter<'a, TestCase>;

    fn into_iter(self) -> Self::IntoIter {
        self.cases.iter()
    }
}

fn parse_cases(yaml: &str) -> E2eResult<Vec<TestCase>> {
    let raw: Vec<RawCase> = serde_yaml::from_str(yaml)?;
    raw.into_iter().map(TestCase::try_from).collect()
}
