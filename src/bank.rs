use include_dir::{include_dir, Dir};
use itertools::Itertools;
use log::{info, warn};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

static BANK_DIR: Dir = include_dir!("src/banks");

/// Name of the bank compiled into the binary
pub const BUNDLED_BANK: &str = "general_knowledge.json";

pub const OPTIONS_PER_QUESTION: usize = 4;

/// Difficulty tag attached to a question; unknown or missing tags read as `Medium`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, strum_macros::Display,
)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Expert,
    ];

    /// Parse a payload tag. Accepts english and french names, case-insensitive.
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag.map(|t| t.trim().to_lowercase()).as_deref() {
            Some("easy") | Some("facile") => Difficulty::Easy,
            Some("medium") | Some("moyen") => Difficulty::Medium,
            Some("hard") | Some("difficile") => Difficulty::Hard,
            Some("expert") => Difficulty::Expert,
            _ => Difficulty::Medium,
        }
    }
}

/// A single validated question. Immutable once it is part of a bank.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub id: i64,
    pub prompt: String,
    pub options: [String; OPTIONS_PER_QUESTION],
    pub correct_option_index: usize,
    pub explanation: String,
    pub difficulty: Difficulty,
}

impl Question {
    pub fn correct_option(&self) -> &str {
        &self.options[self.correct_option_index]
    }

    pub fn is_correct(&self, chosen: usize) -> bool {
        chosen == self.correct_option_index
    }
}

/// How many records a payload must contain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeRule {
    Exact(usize),
    AtLeast(usize),
}

impl SizeRule {
    pub fn accepts(&self, len: usize) -> bool {
        match *self {
            SizeRule::Exact(n) => len == n,
            SizeRule::AtLeast(n) => len >= n,
        }
    }
}

impl fmt::Display for SizeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeRule::Exact(n) => write!(f, "exactly {n}"),
            SizeRule::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    pub size: SizeRule,
    /// Every record must carry a numeric `id`
    pub require_ids: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            size: SizeRule::AtLeast(1),
            require_ids: false,
        }
    }
}

/// The specific rule a record broke
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum QuestionFault {
    #[error("record is not an object")]
    NotAnObject,
    #[error("record could not be read: {0}")]
    Unreadable(String),
    #[error("missing id")]
    MissingId,
    #[error("id is not an integer")]
    NonNumericId,
    #[error("duplicate id {0}")]
    DuplicateId(i64),
    #[error("question text is missing or empty")]
    EmptyPrompt,
    #[error("expected 4 answers, found {0}")]
    WrongOptionCount(usize),
    #[error("answer {0} is missing or empty")]
    EmptyOption(usize),
    #[error("correctIndex is missing or not a whole number")]
    NonNumericCorrectIndex,
    #[error("correctIndex {0} is outside 0..=3")]
    CorrectIndexOutOfRange(String),
    #[error("explanation is missing or empty")]
    MissingExplanation,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankError {
    #[error("failed to load question bank from {}: {source}", .path.display())]
    LoadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("question bank is not a list of records: {0}")]
    MalformedPayload(String),
    #[error("question bank must contain {expected} questions, found {found}")]
    SizeMismatch { expected: SizeRule, found: usize },
    #[error("record {index}{}: {reason}", .id.map(|id| format!(" (id {id})")).unwrap_or_default())]
    InvalidQuestion {
        index: usize,
        id: Option<i64>,
        reason: QuestionFault,
    },
}

/// Raw record as it appears in the payload, before validation.
#[derive(Deserialize)]
struct RawQuestion {
    id: Option<Value>,
    #[serde(alias = "prompt")]
    question: Option<Value>,
    #[serde(alias = "options")]
    answers: Option<Value>,
    #[serde(alias = "correctOptionIndex", rename = "correctIndex")]
    correct_index: Option<Value>,
    explanation: Option<Value>,
    difficulty: Option<Value>,
}

/// Immutable, validated collection of questions.
///
/// A bank is only ever produced whole: one bad record rejects the entire payload.
#[derive(Debug)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Parse and validate a serialized question list.
    pub fn load(payload: &[u8], options: LoadOptions) -> Result<Self, BankError> {
        let records: Vec<Value> = serde_json::from_slice(payload)
            .map_err(|e| BankError::MalformedPayload(e.to_string()))?;

        if !options.size.accepts(records.len()) {
            warn!(
                "question bank rejected: expected {} records, found {}",
                options.size,
                records.len()
            );
            return Err(BankError::SizeMismatch {
                expected: options.size,
                found: records.len(),
            });
        }

        let mut seen_ids = HashSet::with_capacity(records.len());
        let mut taken = HashSet::with_capacity(records.len());
        let mut missing_ids = Vec::new();
        let mut questions = Vec::with_capacity(records.len());

        for (index, record) in records.into_iter().enumerate() {
            let (id, question) = validate_record(index, record, options.require_ids, &mut seen_ids)
                .inspect_err(|e| warn!("question bank rejected: {e}"))?;
            match id {
                Some(id) => {
                    taken.insert(id);
                }
                None => missing_ids.push(index),
            }
            questions.push(question);
        }

        // records without an id take their 1-based position, or the next id not in use
        for index in missing_ids {
            let mut id = index as i64 + 1;
            while !taken.insert(id) {
                id += 1;
            }
            questions[index].id = id;
        }

        info!("loaded question bank with {} questions", questions.len());
        Ok(Self { questions })
    }

    /// Read a bank from disk. IO problems surface as `LoadFailed`.
    pub fn from_path<P: AsRef<Path>>(path: P, options: LoadOptions) -> Result<Self, BankError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| BankError::LoadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::load(&bytes, options)
    }

    /// The bank shipped inside the binary, checked against the same rules as a file
    pub fn bundled(options: LoadOptions) -> Result<Self, BankError> {
        let file = BANK_DIR
            .get_file(BUNDLED_BANK)
            .ok_or_else(|| BankError::LoadFailed {
                path: PathBuf::from(BUNDLED_BANK),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })?;
        Self::load(file.contents(), options)
    }

    pub fn size(&self) -> usize {
        self.questions.len()
    }

    /// Panics when `index` is out of range; callers index through a play order built from `size()`.
    pub fn at(&self, index: usize) -> &Question {
        &self.questions[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }

    /// Number of questions per difficulty, in difficulty order
    pub fn difficulty_counts(&self) -> BTreeMap<Difficulty, usize> {
        self.questions
            .iter()
            .counts_by(|q| q.difficulty)
            .into_iter()
            .collect()
    }
}

/// Validate one record. Returns the explicit id, if any, alongside the question;
/// questions without one carry a placeholder id until `load` assigns it.
fn validate_record(
    index: usize,
    record: Value,
    require_ids: bool,
    seen_ids: &mut HashSet<i64>,
) -> Result<(Option<i64>, Question), BankError> {
    let fault = |id: Option<i64>, reason: QuestionFault| BankError::InvalidQuestion {
        index,
        id,
        reason,
    };

    if !record.is_object() {
        return Err(fault(None, QuestionFault::NotAnObject));
    }
    let raw: RawQuestion =
        serde_json::from_value(record).map_err(|e| fault(None, QuestionFault::Unreadable(e.to_string())))?;

    let id = match raw.id {
        Some(v) => match v.as_i64() {
            Some(id) => Some(id),
            None if require_ids => return Err(fault(None, QuestionFault::NonNumericId)),
            None => None,
        },
        None if require_ids => return Err(fault(None, QuestionFault::MissingId)),
        None => None,
    };
    if let (true, Some(id)) = (require_ids, id) {
        if !seen_ids.insert(id) {
            return Err(fault(Some(id), QuestionFault::DuplicateId(id)));
        }
    }
    let fault = |reason| fault(id, reason);

    let prompt = non_empty_text(raw.question.as_ref()).ok_or_else(|| fault(QuestionFault::EmptyPrompt))?;

    let answers = match raw.answers {
        Some(Value::Array(items)) => items,
        _ => return Err(fault(QuestionFault::WrongOptionCount(0))),
    };
    if answers.len() != OPTIONS_PER_QUESTION {
        return Err(fault(QuestionFault::WrongOptionCount(answers.len())));
    }
    let mut options: [String; OPTIONS_PER_QUESTION] = Default::default();
    for (slot, answer) in answers.iter().enumerate() {
        options[slot] = non_empty_text(Some(answer)).ok_or_else(|| fault(QuestionFault::EmptyOption(slot)))?;
    }

    let correct_option_index = match raw.correct_index {
        Some(Value::Number(n)) => {
            let index = match (n.as_u64(), n.as_f64()) {
                (Some(i), _) => i,
                // whole floats such as 1.0 are still an index
                (None, Some(f)) if f.fract() == 0.0 && f >= 0.0 && f < u64::MAX as f64 => f as u64,
                (None, Some(f)) if f.fract() != 0.0 => {
                    return Err(fault(QuestionFault::NonNumericCorrectIndex))
                }
                _ => return Err(fault(QuestionFault::CorrectIndexOutOfRange(n.to_string()))),
            };
            if index >= OPTIONS_PER_QUESTION as u64 {
                return Err(fault(QuestionFault::CorrectIndexOutOfRange(n.to_string())));
            }
            index as usize
        }
        _ => return Err(fault(QuestionFault::NonNumericCorrectIndex)),
    };

    let explanation =
        non_empty_text(raw.explanation.as_ref()).ok_or_else(|| fault(QuestionFault::MissingExplanation))?;

    let difficulty = Difficulty::from_tag(raw.difficulty.as_ref().and_then(Value::as_str));

    let question = Question {
        id: id.unwrap_or_default(),
        prompt,
        options,
        correct_option_index,
        explanation,
        difficulty,
    };
    Ok((id, question))
}

fn non_empty_text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    pub(crate) fn record(id: i64, correct: usize, difficulty: Option<&str>) -> Value {
        let mut v = json!({
            "id": id,
            "question": format!("Question {id}?"),
            "answers": ["first", "second", "third", "fourth"],
            "correctIndex": correct,
            "explanation": format!("Because of {id}."),
        });
        if let Some(d) = difficulty {
            v["difficulty"] = json!(d);
        }
        v
    }

    pub(crate) fn payload(records: &[Value]) -> Vec<u8> {
        serde_json::to_vec(records).unwrap()
    }

    fn strict(n: usize) -> LoadOptions {
        LoadOptions {
            size: SizeRule::Exact(n),
            require_ids: true,
        }
    }

    #[test]
    fn loads_valid_exact_bank() {
        let records: Vec<Value> = (1..=200).map(|i| record(i, (i % 4) as usize, None)).collect();
        let bank = QuestionBank::load(&payload(&records), strict(200)).unwrap();

        assert_eq!(bank.size(), 200);
        for q in bank.iter() {
            assert_eq!(q.options.len(), 4);
            assert!(q.correct_option_index < 4);
            assert!(!q.prompt.is_empty());
            assert!(!q.explanation.is_empty());
        }
        assert_eq!(bank.at(0).id, 1);
        assert_eq!(bank.at(199).correct_option_index, 0);
    }

    #[test]
    fn accepts_prompt_and_options_aliases() {
        let data = json!([{
            "id": 7,
            "prompt": "Alias?",
            "options": ["a", "b", "c", "d"],
            "correctOptionIndex": 2,
            "explanation": "yes"
        }]);
        let bank = QuestionBank::load(data.to_string().as_bytes(), strict(1)).unwrap();
        assert_eq!(bank.at(0).prompt, "Alias?");
        assert_eq!(bank.at(0).correct_option(), "c");
    }

    #[test]
    fn not_a_list_is_malformed() {
        let err = QuestionBank::load(br#"{"question": "x"}"#, LoadOptions::default()).unwrap_err();
        assert_matches!(err, BankError::MalformedPayload(_));

        let err = QuestionBank::load(b"not json", LoadOptions::default()).unwrap_err();
        assert_matches!(err, BankError::MalformedPayload(_));
    }

    #[test]
    fn size_rules() {
        let records: Vec<Value> = (1..=3).map(|i| record(i, 0, None)).collect();

        let err = QuestionBank::load(&payload(&records), strict(200)).unwrap_err();
        assert_matches!(
            err,
            BankError::SizeMismatch {
                expected: SizeRule::Exact(200),
                found: 3
            }
        );

        let at_least = LoadOptions {
            size: SizeRule::AtLeast(20),
            require_ids: false,
        };
        let err = QuestionBank::load(&payload(&records), at_least).unwrap_err();
        assert_matches!(err, BankError::SizeMismatch { found: 3, .. });

        let at_least = LoadOptions {
            size: SizeRule::AtLeast(3),
            require_ids: false,
        };
        assert_eq!(QuestionBank::load(&payload(&records), at_least).unwrap().size(), 3);
    }

    #[test]
    fn first_invalid_record_is_reported() {
        let mut records: Vec<Value> = (1..=5).map(|i| record(i, 0, None)).collect();
        records[2]["answers"] = json!(["a", "b", "c"]);
        records[4]["explanation"] = json!("");

        let err = QuestionBank::load(&payload(&records), strict(5)).unwrap_err();
        assert_matches!(
            err,
            BankError::InvalidQuestion {
                index: 2,
                id: Some(3),
                reason: QuestionFault::WrongOptionCount(3)
            }
        );
    }

    #[test]
    fn each_fault_kind() {
        fn with(mutate: impl FnOnce(&mut Value)) -> Value {
            let mut r = record(1, 0, None);
            mutate(&mut r);
            r
        }

        let cases = vec![
            (with(|r| r["question"] = json!("   ")), QuestionFault::EmptyPrompt),
            (with(|r| drop(r.as_object_mut().unwrap().remove("question"))), QuestionFault::EmptyPrompt),
            (with(|r| r["answers"] = json!("abcd")), QuestionFault::WrongOptionCount(0)),
            (with(|r| r["answers"][1] = json!("")), QuestionFault::EmptyOption(1)),
            (with(|r| r["answers"][3] = json!(4)), QuestionFault::EmptyOption(3)),
            (with(|r| r["correctIndex"] = json!("1")), QuestionFault::NonNumericCorrectIndex),
            (with(|r| r["correctIndex"] = json!(4)), QuestionFault::CorrectIndexOutOfRange("4".into())),
            (with(|r| r["correctIndex"] = json!(-1)), QuestionFault::CorrectIndexOutOfRange("-1".into())),
            (with(|r| drop(r.as_object_mut().unwrap().remove("explanation"))), QuestionFault::MissingExplanation),
            (with(|r| r["id"] = json!("one")), QuestionFault::NonNumericId),
            (with(|r| drop(r.as_object_mut().unwrap().remove("id"))), QuestionFault::MissingId),
        ];

        for (r, expected) in cases {
            let err = QuestionBank::load(&payload(&[r]), strict(1)).unwrap_err();
            match err {
                BankError::InvalidQuestion { index, reason, .. } => {
                    assert_eq!(index, 0);
                    assert_eq!(reason, expected);
                }
                other => panic!("expected InvalidQuestion({expected:?}), got {other:?}"),
            }
        }
    }

    #[test]
    fn non_object_record() {
        let err = QuestionBank::load(b"[42]", LoadOptions::default()).unwrap_err();
        assert_matches!(
            err,
            BankError::InvalidQuestion {
                index: 0,
                id: None,
                reason: QuestionFault::NotAnObject
            }
        );
    }

    #[test]
    fn duplicate_ids_rejected() {
        let records = vec![record(1, 0, None), record(2, 0, None), record(1, 1, None)];
        let err = QuestionBank::load(&payload(&records), strict(3)).unwrap_err();
        assert_matches!(
            err,
            BankError::InvalidQuestion {
                index: 2,
                reason: QuestionFault::DuplicateId(1),
                ..
            }
        );
    }

    #[test]
    fn ids_synthesized_when_optional() {
        let mut records = vec![record(0, 0, None), record(0, 1, None)];
        for r in records.iter_mut() {
            r.as_object_mut().unwrap().remove("id");
        }
        let bank = QuestionBank::load(&payload(&records), LoadOptions::default()).unwrap();
        assert_eq!(bank.at(0).id, 1);
        assert_eq!(bank.at(1).id, 2);
    }

    #[test]
    fn missing_ids_skip_explicit_ones() {
        let mut records = vec![record(0, 0, None), record(1, 1, None), record(0, 2, None)];
        records[0].as_object_mut().unwrap().remove("id");
        records[2].as_object_mut().unwrap().remove("id");

        let bank = QuestionBank::load(&payload(&records), LoadOptions::default()).unwrap();
        let ids: Vec<i64> = bank.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn duplicate_ids_allowed_when_optional() {
        let records = vec![record(5, 0, None), record(5, 1, None)];
        let bank = QuestionBank::load(&payload(&records), LoadOptions::default()).unwrap();
        assert_eq!(bank.size(), 2);
    }

    #[test]
    fn correct_index_numbers() {
        let mut r = record(1, 0, None);
        r["correctIndex"] = json!(2.0);
        let bank = QuestionBank::load(&payload(&[r]), strict(1)).unwrap();
        assert_eq!(bank.at(0).correct_option_index, 2);

        let cases = vec![
            (json!(1.5), QuestionFault::NonNumericCorrectIndex),
            (json!(4.0), QuestionFault::CorrectIndexOutOfRange("4.0".into())),
            (json!(4_294_967_296u64), QuestionFault::CorrectIndexOutOfRange("4294967296".into())),
        ];
        for (value, expected) in cases {
            let mut r = record(1, 0, None);
            r["correctIndex"] = value;
            let err = QuestionBank::load(&payload(&[r]), strict(1)).unwrap_err();
            assert_matches!(err, BankError::InvalidQuestion { reason, .. } if reason == expected);
        }
    }

    #[test]
    fn difficulty_tags() {
        assert_eq!(Difficulty::from_tag(Some("Easy")), Difficulty::Easy);
        assert_eq!(Difficulty::from_tag(Some(" facile ")), Difficulty::Easy);
        assert_eq!(Difficulty::from_tag(Some("Difficile")), Difficulty::Hard);
        assert_eq!(Difficulty::from_tag(Some("EXPERT")), Difficulty::Expert);
        assert_eq!(Difficulty::from_tag(Some("legendary")), Difficulty::Medium);
        assert_eq!(Difficulty::from_tag(None), Difficulty::Medium);

        let records = vec![
            record(1, 0, Some("Easy")),
            record(2, 0, Some("hard")),
            record(3, 0, None),
            record(4, 0, Some("???")),
        ];
        let bank = QuestionBank::load(&payload(&records), strict(4)).unwrap();
        let counts = bank.difficulty_counts();
        assert_eq!(counts.get(&Difficulty::Easy), Some(&1));
        assert_eq!(counts.get(&Difficulty::Medium), Some(&2));
        assert_eq!(counts.get(&Difficulty::Hard), Some(&1));
        assert_eq!(counts.get(&Difficulty::Expert), None);
    }

    #[test]
    fn missing_file_is_load_failed() {
        let dir = tempfile::tempdir().unwrap();
        let err = QuestionBank::from_path(dir.path().join("nope.json"), LoadOptions::default())
            .unwrap_err();
        assert_matches!(err, BankError::LoadFailed { .. });
    }

    #[test]
    fn bundled_bank_is_valid() {
        let bank = QuestionBank::bundled(strict(24)).unwrap();
        assert_eq!(bank.size(), 24);

        let err = QuestionBank::bundled(strict(3)).unwrap_err();
        assert_matches!(err, BankError::SizeMismatch { found: 24, .. });
    }

    #[test]
    fn error_messages_name_the_record() {
        let err = BankError::InvalidQuestion {
            index: 4,
            id: Some(12),
            reason: QuestionFault::MissingExplanation,
        };
        assert_eq!(
            err.to_string(),
            "record 4 (id 12): explanation is missing or empty"
        );
    }
}
