// ==================== STUDENT CARD TEXT PARSER ====================
// Turns raw OCR text from the front of a student card into structured fields.
// Extraction is ordered and destructive: each step removes the line it
// consumed so no physical line can populate two fields.

use crate::models::{ScannedData, NOT_FOUND};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref IC_NUMBER: Regex = Regex::new(r"^[0-9]{12}$").unwrap();
    static ref STUDENT_ID: Regex = Regex::new(r"^[A-Z]{2,}[0-9]{2,}$").unwrap();
    static ref INTAKE: Regex = Regex::new(
        r"^(January|February|March|April|May|June|July|August|September|October|November|December)\s[0-9]{4}$"
    )
    .unwrap();
    static ref FULL_NAME: Regex = Regex::new(r"(?i)^(?:[A-Z'’]+\s){1,4}[A-Z'’]+$").unwrap();
}

/// Lowercase fragments (whitespace stripped) that mark institution lines,
/// including the ways OCR tends to garble "COLLEGE"
const INSTITUTION_FRAGMENTS: &[&str] = &["college", "campus", "peninsula", "collegb", "collbge"];

const MAJOR_KEYWORDS: &[&str] = &["bsc", "bachelor", "diploma"];

/// Parses front-of-card OCR text.
///
/// Returns `None` when the student ID or the IC number cannot be found; every
/// other field degrades to [`NOT_FOUND`].
pub fn parse(raw_text: &str) -> Option<ScannedData> {
    let mut lines: Vec<String> = raw_text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    let ic_number = take_ic_number(&mut lines);
    let student_id = take_first_match(&mut lines, &STUDENT_ID);
    let intake = take_first_match(&mut lines, &INTAKE);

    let (student_id, ic_number) = match (student_id, ic_number) {
        (Some(student_id), Some(ic_number)) => (student_id, ic_number),
        _ => {
            log::warn!("⚠️  Card parse failed: could not find Student ID or IC Number");
            return None;
        }
    };

    let major = take_major(&mut lines);
    let full_name = find_full_name(&lines).map(|name| to_title_case(&name));

    Some(ScannedData {
        full_name: full_name.unwrap_or_else(not_found),
        student_id,
        identification_number: ic_number,
        major: major.unwrap_or_else(not_found),
        intake: intake.unwrap_or_else(not_found),
        front_image: None,
        back_image: None,
    })
}

/// Same as [`parse`], attaching the capture artifacts the text came from
pub fn parse_with_images(
    raw_text: &str,
    front_image: Option<String>,
    back_image: Option<String>,
) -> Option<ScannedData> {
    parse(raw_text).map(|data| ScannedData {
        front_image,
        back_image,
        ..data
    })
}

/// Capitalizes the first letter of each space-separated word, lowercasing the rest
pub fn to_title_case(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    text.to_lowercase()
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn not_found() -> String {
    NOT_FOUND.to_string()
}

// OCR regularly reads the digit zero as the letter O
fn take_ic_number(lines: &mut Vec<String>) -> Option<String> {
    let (index, normalized) = lines.iter().enumerate().find_map(|(index, line)| {
        let normalized = line.replace(['O', 'o'], "0");
        IC_NUMBER.is_match(&normalized).then_some((index, normalized))
    })?;

    lines.remove(index);
    Some(normalized)
}

fn take_first_match(lines: &mut Vec<String>, pattern: &Regex) -> Option<String> {
    let index = lines.iter().position(|line| pattern.is_match(line))?;
    Some(lines.remove(index))
}

fn take_major(lines: &mut Vec<String>) -> Option<String> {
    let index = lines.iter().position(|line| {
        let lower = line.to_lowercase();
        MAJOR_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
    })?;

    // A parenthetical on the next line (e.g. "(Hons)") belongs to the course name
    let qualified = lines
        .get(index + 1)
        .filter(|next| next.starts_with('('))
        .map(|next| format!("{} {}", lines[index], next));

    match qualified {
        Some(major) => {
            lines.drain(index..=index + 1);
            Some(major)
        }
        None => Some(lines.remove(index)),
    }
}

fn find_full_name(lines: &[String]) -> Option<String> {
    lines
        .iter()
        .find(|line| FULL_NAME.is_match(line) && !is_institution_line(line))
        .cloned()
}

fn is_institution_line(line: &str) -> bool {
    let compact: String = line
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();

    INSTITUTION_FRAGMENTS
        .iter()
        .any(|fragment| compact.contains(fragment))
}
