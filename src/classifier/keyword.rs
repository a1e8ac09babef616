//! Heuristic keyword classifier
//!
//! Zero-cost, no-network classification by phrase matching. Phrases match
//! whole words only, so "trust" never counts as "rust". Each category
//! scores one point per matched phrase; the highest score wins, with ties
//! broken by category order. A prompt matching nothing is inconclusive.

use super::{Classifier, ClassifierError, TaskCategory};
use async_trait::async_trait;

/// Code requests. Phrases are lowercase words separated by single spaces.
const CODE_PATTERNS: &[&str] = &[
    "write a function",
    "write code",
    "write a program",
    "write a script",
    "function",
    "implement",
    "refactor",
    "debug",
    "compile",
    "algorithm",
    "regex",
    "sql query",
    "unit test",
    "unit tests",
    "stack trace",
    "source code",
    "programming",
];

/// Raw markers matched anywhere, symbols included
const CODE_MARKERS: &[&str] = &["```"];

const SUMMARY_PATTERNS: &[&str] = &[
    "summarize",
    "summarise",
    "summary",
    "tl dr",
    "tldr",
    "condense",
    "key points",
    "recap",
    "shorten",
    "in a nutshell",
    "main points",
];

const QUESTION_PATTERNS: &[&str] = &[
    "what is",
    "what are",
    "who is",
    "who was",
    "why does",
    "why do",
    "how does",
    "how do",
    "when did",
    "where is",
    "which",
    "explain",
    "define",
    "difference between",
];

const CREATIVE_PATTERNS: &[&str] = &[
    "poem",
    "story",
    "haiku",
    "limerick",
    "lyrics",
    "song",
    "fiction",
    "screenplay",
    "sonnet",
    "fairy tale",
    "imagine a",
    "creative",
];

/// Phrase-matching classifier
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }

    fn patterns(category: TaskCategory) -> &'static [&'static str] {
        match category {
            TaskCategory::CodeGeneration => CODE_PATTERNS,
            TaskCategory::TextSummarization => SUMMARY_PATTERNS,
            TaskCategory::QuestionAnswering => QUESTION_PATTERNS,
            TaskCategory::CreativeWriting => CREATIVE_PATTERNS,
            TaskCategory::Other => &[],
        }
    }

    fn markers(category: TaskCategory) -> &'static [&'static str] {
        match category {
            TaskCategory::CodeGeneration => CODE_MARKERS,
            _ => &[],
        }
    }

    /// Score every category and pick the best
    pub fn score(prompt: &str) -> Option<TaskCategory> {
        let lower = prompt.trim().to_lowercase();
        let words = words_of(&lower);

        let mut best: Option<(TaskCategory, usize)> = None;
        for category in TaskCategory::ALL {
            let phrase_hits = Self::patterns(category)
                .iter()
                .filter(|pattern| contains_phrase(&words, pattern))
                .count();
            let marker_hits = Self::markers(category)
                .iter()
                .filter(|marker| lower.contains(*marker))
                .count();
            let hits = phrase_hits + marker_hits;
            // Strictly greater keeps the earlier category on ties
            if hits > 0 && best.is_none_or(|(_, top)| hits > top) {
                best = Some((category, hits));
            }
        }
        best.map(|(category, _)| category)
    }
}

/// Lowercase words joined by single spaces, padded with a space on each side
fn words_of(lower: &str) -> String {
    let mut words = String::with_capacity(lower.len() + 2);
    words.push(' ');
    for word in lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
    {
        words.push_str(word);
        words.push(' ');
    }
    words
}

/// Whether `phrase` occurs in `words` as a run of whole words
fn contains_phrase(words: &str, phrase: &str) -> bool {
    words.match_indices(phrase).any(|(start, _)| {
        let end = start + phrase.len();
        words[..start].ends_with(' ') && words[end..].starts_with(' ')
    })
}

#[async_trait]
impl Classifier for KeywordClassifier {
    fn name(&self) -> &'static str {
        "keyword"
    }

    async fn try_classify(&self, prompt: &str) -> Result<TaskCategory, ClassifierError> {
        Self::score(prompt).ok_or_else(|| ClassifierError::Inconclusive {
            response: "no keyword matched".to_string(),
            response_length: 0,
        })
    }
}
