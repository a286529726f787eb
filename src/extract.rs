//! Guess extraction from free-form participant answers.
//!
//! Answers are expected to wrap a single integer in a delimiter pair such as
//! `<answer>7</answer>`, but participants routinely repeat the tag, forget
//! half of it, or skip it entirely. Extraction walks a fixed priority chain
//! and the first applicable strategy decides the result:
//!
//! 1. exactly one complete pair: its trimmed content must be an integer
//! 2. several complete pairs: the first one whose content is an integer
//! 3. an opening tag without a pair: first digit run after the opening tag
//! 4. a closing tag only: last digit run before the closing tag
//! 5. no tags: last digit run anywhere in the text
//!
//! A strategy that applies but finds nothing yields `NoNumberFound` with a
//! guess of 0; weaker strategies are not consulted. The parsed value is
//! clamped to `[0, K]` afterwards.
//!
//! Digit runs are maximal `[0-9]+` sequences and carry no sign, so "3.5"
//! contains the runs 3 and 5 and "0-10" contains 0 and 10. Only delimited
//! content may be signed.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

static DIGIT_RUN: OnceLock<Regex> = OnceLock::new();

fn digit_run() -> &'static Regex {
    DIGIT_RUN.get_or_init(|| Regex::new("[0-9]+").expect("digit run regex is valid"))
}

/// Which strategy produced a guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    /// Exactly one complete answer tag.
    ExactTag,
    /// Several complete answer tags; the first parseable one won.
    MultiTag,
    /// Only one half of the answer tag was present.
    PartialTag,
    /// No tags; the last number in the text was used.
    UntaggedLastNumber,
    /// Nothing usable; the guess defaults to 0.
    NoNumberFound,
}

impl fmt::Display for ExtractionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExactTag => write!(f, "exact_tag"),
            Self::MultiTag => write!(f, "multi_tag"),
            Self::PartialTag => write!(f, "partial_tag"),
            Self::UntaggedLastNumber => write!(f, "untagged_last_number"),
            Self::NoNumberFound => write!(f, "no_number_found"),
        }
    }
}

/// A clamped guess together with the strategy that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guess {
    /// Guess in `[0, K]`.
    pub value: u32,
    /// How the guess was derived.
    pub status: ExtractionStatus,
    /// The integer found in the text before clamping.
    pub parsed: Option<i64>,
}

impl Guess {
    /// Clamps `parsed` into `[0, range_max]`.
    #[must_use]
    pub fn clamped(parsed: i64, status: ExtractionStatus, range_max: u32) -> Self {
        let value = u32::try_from(parsed.clamp(0, i64::from(range_max))).unwrap_or(range_max);
        Self {
            value,
            status,
            parsed: Some(parsed),
        }
    }

    /// The fallback guess of 0.
    #[must_use]
    pub const fn no_number() -> Self {
        Self {
            value: 0,
            status: ExtractionStatus::NoNumberFound,
            parsed: None,
        }
    }
}

/// Delimiter pair wrapping a participant's final answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerTags {
    /// Opening delimiter.
    pub open: String,
    /// Closing delimiter.
    pub close: String,
}

impl Default for AnswerTags {
    fn default() -> Self {
        Self {
            open: "<answer>".to_string(),
            close: "</answer>".to_string(),
        }
    }
}

impl AnswerTags {
    /// Validate the delimiters.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.open.is_empty() || self.close.is_empty() {
            return Err(ValidationError::config("answer tags must be non-empty"));
        }
        if self.open.contains(&self.close) || self.close.contains(&self.open) {
            return Err(ValidationError::config(
                "answer tags must not contain one another",
            ));
        }
        Ok(())
    }

    /// Wraps `value` in the delimiters.
    #[must_use]
    pub fn wrap(&self, value: impl fmt::Display) -> String {
        format!("{}{}{}", self.open, value, self.close)
    }
}

/// Maps free text to a bounded guess.
#[derive(Debug, Clone)]
pub struct GuessExtractor {
    tags: AnswerTags,
    pair: Regex,
}

impl Default for GuessExtractor {
    fn default() -> Self {
        let tags = AnswerTags::default();
        let pair = pair_regex(&tags).expect("default answer tags are valid");
        Self { tags, pair }
    }
}

impl GuessExtractor {
    /// Builds an extractor for the given delimiters.
    pub fn new(tags: AnswerTags) -> Result<Self, ValidationError> {
        tags.validate()?;
        let pair = pair_regex(&tags)?;
        Ok(Self { tags, pair })
    }

    /// The delimiters this extractor looks for.
    #[must_use]
    pub const fn tags(&self) -> &AnswerTags {
        &self.tags
    }

    /// Extracts a guess in `[0, range_max]` from `text`.
    #[must_use]
    pub fn extract(&self, text: &str, range_max: u32) -> Guess {
        match self.locate(text) {
            Some((parsed, status)) => Guess::clamped(parsed, status, range_max),
            None => Guess::no_number(),
        }
    }

    fn locate(&self, text: &str) -> Option<(i64, ExtractionStatus)> {
        let contents: Vec<&str> = self
            .pair
            .captures_iter(text)
            .map(|c| c.get(1).map_or("", |m| m.as_str()))
            .collect();

        match contents.as_slice() {
            [only] => parse_integer(only).map(|v| (v, ExtractionStatus::ExactTag)),
            [] => self.locate_untagged(text),
            many => many
                .iter()
                .find_map(|c| parse_integer(c))
                .map(|v| (v, ExtractionStatus::MultiTag)),
        }
    }

    fn locate_untagged(&self, text: &str) -> Option<(i64, ExtractionStatus)> {
        if let Some(pos) = text.find(&self.tags.open) {
            let suffix = &text[pos + self.tags.open.len()..];
            return first_digit_run(suffix).map(|v| (v, ExtractionStatus::PartialTag));
        }
        if let Some(pos) = text.find(&self.tags.close) {
            return last_digit_run(&text[..pos]).map(|v| (v, ExtractionStatus::PartialTag));
        }
        last_digit_run(text).map(|v| (v, ExtractionStatus::UntaggedLastNumber))
    }
}

fn pair_regex(tags: &AnswerTags) -> Result<Regex, ValidationError> {
    let pattern = format!(
        "(?s){}(.*?){}",
        regex::escape(&tags.open),
        regex::escape(&tags.close)
    );
    Regex::new(&pattern).map_err(|e| ValidationError::config(format!("invalid answer tags: {e}")))
}

/// Parses an optionally signed decimal integer, saturating on overflow.
fn parse_integer(s: &str) -> Option<i64> {
    let s = s.trim();
    let (negative, digits) = match s.as_bytes().first()? {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value = match digits.parse::<i64>() {
        Ok(v) if negative => -v,
        Ok(v) => v,
        Err(_) if negative => i64::MIN,
        Err(_) => i64::MAX,
    };
    Some(value)
}

fn first_digit_run(text: &str) -> Option<i64> {
    digit_run().find(text).and_then(|m| parse_integer(m.as_str()))
}

fn last_digit_run(text: &str) -> Option<i64> {
    digit_run().find_iter(text).last().and_then(|m| parse_integer(m.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> (u32, ExtractionStatus) {
        let guess = GuessExtractor::default().extract(text, 10);
        (guess.value, guess.status)
    }

    #[test]
    fn exact_tag() {
        assert_eq!(extract("<answer>7</answer>"), (7, ExtractionStatus::ExactTag));
        assert_eq!(
            extract("After some thought: <answer> 4 </answer>."),
            (4, ExtractionStatus::ExactTag)
        );
    }

    #[test]
    fn exact_tag_with_garbage_does_not_fall_through() {
        // The 9 outside the tag must not be used.
        assert_eq!(
            extract("maybe 9? <answer>seven</answer>"),
            (0, ExtractionStatus::NoNumberFound)
        );
    }

    #[test]
    fn multi_tag_takes_first() {
        assert_eq!(
            extract("<answer>3</answer> and also <answer>9</answer>"),
            (3, ExtractionStatus::MultiTag)
        );
        assert_eq!(
            extract("<answer>x</answer> <answer>6</answer> <answer>2</answer>"),
            (6, ExtractionStatus::MultiTag)
        );
        assert_eq!(
            extract("<answer>x</answer><answer>y</answer>"),
            (0, ExtractionStatus::NoNumberFound)
        );
    }

    #[test]
    fn partial_opening_tag_clamps() {
        let guess = GuessExtractor::default().extract("I think <answer>42", 10);
        assert_eq!(guess.value, 10);
        assert_eq!(guess.status, ExtractionStatus::PartialTag);
        assert_eq!(guess.parsed, Some(42));
    }

    #[test]
    fn partial_opening_tag_ignores_prefix() {
        assert_eq!(
            extract("Between 1 and 9 <answer> I pick 6 or 8"),
            (6, ExtractionStatus::PartialTag)
        );
        assert_eq!(
            extract("5 <answer> no idea"),
            (0, ExtractionStatus::NoNumberFound)
        );
    }

    #[test]
    fn partial_closing_tag() {
        assert_eq!(
            extract("...ending near 5 </answer>"),
            (5, ExtractionStatus::PartialTag)
        );
        assert_eq!(
            extract("roughly 3.5</answer> then 9"),
            (5, ExtractionStatus::PartialTag)
        );
        assert_eq!(
            extract("nothing here</answer> 4"),
            (0, ExtractionStatus::NoNumberFound)
        );
    }

    #[test]
    fn repeated_closing_tags_use_the_first() {
        assert_eq!(
            extract("2 </answer> then 7 </answer>"),
            (2, ExtractionStatus::PartialTag)
        );
    }

    #[test]
    fn opening_tag_wins_over_stray_closing_tag() {
        assert_eq!(extract("</answer>5<answer>"), (0, ExtractionStatus::NoNumberFound));
        assert_eq!(
            extract("</answer> 5 <answer> 8"),
            (8, ExtractionStatus::PartialTag)
        );
    }

    #[test]
    fn untagged_last_number() {
        assert_eq!(
            extract("I'll go with 8 this time"),
            (8, ExtractionStatus::UntaggedLastNumber)
        );
        assert_eq!(
            extract("Others said 2 and 3, so I choose 4."),
            (4, ExtractionStatus::UntaggedLastNumber)
        );
    }

    #[test]
    fn no_number_found() {
        assert_eq!(extract("I have no idea"), (0, ExtractionStatus::NoNumberFound));
        assert_eq!(extract(""), (0, ExtractionStatus::NoNumberFound));
    }

    #[test]
    fn negative_tag_content_clamps_to_zero() {
        let guess = GuessExtractor::default().extract("<answer>-3</answer>", 10);
        assert_eq!(guess.value, 0);
        assert_eq!(guess.status, ExtractionStatus::ExactTag);
        assert_eq!(guess.parsed, Some(-3));
    }

    #[test]
    fn untagged_ranges_are_unsigned() {
        assert_eq!(
            extract("a number in 0-10"),
            (10, ExtractionStatus::UntaggedLastNumber)
        );
    }

    #[test]
    fn oversized_numbers_saturate() {
        let guess = GuessExtractor::default().extract("<answer>99999999999999999999999</answer>", 10);
        assert_eq!(guess.value, 10);
        assert_eq!(guess.parsed, Some(i64::MAX));
    }

    #[test]
    fn custom_tags() {
        let tags = AnswerTags {
            open: "[[".to_string(),
            close: "]]".to_string(),
        };
        let extractor = GuessExtractor::new(tags.clone()).unwrap();
        assert_eq!(tags.wrap(3), "[[3]]");
        assert_eq!(extractor.extract("[[3]]", 5).status, ExtractionStatus::ExactTag);
        assert_eq!(extractor.extract("<answer>3</answer>", 5).status, ExtractionStatus::UntaggedLastNumber);
    }

    #[test]
    fn invalid_tags_rejected() {
        let empty = AnswerTags {
            open: String::new(),
            close: "</a>".to_string(),
        };
        assert!(GuessExtractor::new(empty).is_err());

        let nested = AnswerTags {
            open: "<a>".to_string(),
            close: "<a>>".to_string(),
        };
        assert!(GuessExtractor::new(nested).is_err());
    }

    #[test]
    fn status_display_is_snake_case() {
        assert_eq!(ExtractionStatus::UntaggedLastNumber.to_string(), "untagged_last_number");
        let json = serde_json::to_string(&ExtractionStatus::NoNumberFound).unwrap();
        assert_eq!(json, "\"no_number_found\"");
    }
}
