//! Tag suggestion prompt.
//!
//! The prompt asks for topical tags plus six calendar tags derived from the
//! reference date. The calendar tags are computed here so the instruction
//! names them exactly; the reply is still taken as the model returns it.

use chrono::{Datelike, NaiveDate};

/// Minimum number of topical tags requested.
pub const MIN_TOPICAL_TAGS: usize = 3;

/// Maximum number of topical tags requested.
pub const MAX_TOPICAL_TAGS: usize = 10;

const FRENCH_MONTHS: [&str; 12] = [
    "JANVIER",
    "FÉVRIER",
    "MARS",
    "AVRIL",
    "MAI",
    "JUIN",
    "JUILLET",
    "AOÛT",
    "SEPTEMBRE",
    "OCTOBRE",
    "NOVEMBRE",
    "DÉCEMBRE",
];

/// Uppercase French name of a month (1-12).
///
/// Out-of-range months yield `None`.
#[must_use]
pub fn french_month_name(month: u32) -> Option<&'static str> {
    let index = usize::try_from(month.checked_sub(1)?).ok()?;
    FRENCH_MONTHS.get(index).copied()
}

/// Calendar tags for one reference date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTags {
    /// Four-digit year.
    pub year: i32,
    /// Uppercase French month name.
    pub month_name: &'static str,
    /// Quarter, 1-4.
    pub quarter: u32,
    /// Four-month period, 1-3.
    pub third: u32,
    /// Half-year, 1-2.
    pub half: u32,
}

impl DateTags {
    /// Derives the calendar tags of `date`.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        let month = date.month();
        Self {
            year: date.year(),
            month_name: french_month_name(month).unwrap_or(FRENCH_MONTHS[0]),
            quarter: month.div_ceil(3),
            third: month.div_ceil(4),
            half: month.div_ceil(6),
        }
    }

    /// `"FÉVRIER 2025"`.
    #[must_use]
    pub fn month_year(&self) -> String {
        format!("{} {}", self.month_name, self.year)
    }

    /// `"T1 2025"`.
    #[must_use]
    pub fn quarter_tag(&self) -> String {
        format!("T{} {}", self.quarter, self.year)
    }

    /// `"Q1 2025"`.
    #[must_use]
    pub fn third_tag(&self) -> String {
        format!("Q{} {}", self.third, self.year)
    }

    /// `"S1 2025"`.
    #[must_use]
    pub fn half_tag(&self) -> String {
        format!("S{} {}", self.half, self.year)
    }

    /// All six tags in prompt order.
    #[must_use]
    pub fn tags(&self) -> Vec<String> {
        vec![
            self.year.to_string(),
            self.month_name.to_string(),
            self.month_year(),
            self.quarter_tag(),
            self.third_tag(),
            self.half_tag(),
        ]
    }
}

/// Builds the tag suggestion prompt for `content` as of `date`.
///
/// Double quotes inside `content` are escaped so the quoted text block stays
/// well formed. Deterministic for a given content and date.
///
/// # Examples
///
/// ```rust
/// use autotag::llm::build_prompt;
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2025, 2, 15).unwrap();
/// let prompt = build_prompt("Budget review", date);
/// assert!(prompt.contains("T1 2025"));
/// assert!(prompt.contains("FÉVRIER"));
/// ```
#[must_use]
pub fn build_prompt(content: &str, date: NaiveDate) -> String {
    let escaped = content.replace('"', "\\\"");
    let tags = DateTags::from_date(date);
    let year = tags.year;
    let month = tags.month_name;

    format!(
        r#"Analyze the following text and suggest between {MIN_TOPICAL_TAGS} and {MAX_TOPICAL_TAGS} relevant tags describing its topics.
Each tag must be one or two words, written in UPPERCASE.

Text: "{escaped}"

Today's date is {date}. In addition to the topical tags, always include these date tags:
- the year: {year}
- the month name in French, in uppercase: {month}
- the month and year: {month_year}
- the quarter: {quarter}
- the four-month period: {third}
- the half-year: {half}

Reply with a comma-separated list of tags only, without any introduction or explanation."#,
        date = date.format("%Y-%m-%d"),
        month_year = tags.month_year(),
        quarter = tags.quarter_tag(),
        third = tags.third_tag(),
        half = tags.half_tag(),
    )
}
