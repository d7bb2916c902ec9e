//! Chapter selection: `*`, `3`, `1,2,5`, `1-10` and comma separated mixes.

use crate::error::{CrawlError, Result};
use std::{collections::BTreeSet, fmt, ops::RangeInclusive, str::FromStr};

pub const WILDCARD: &str = "*";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    All,
    Chapters {
        /// Bare terms in their textual form.
        numbers: BTreeSet<String>,
        /// Inclusive integer ranges, kept as bounds rather than expanded.
        ranges: Vec<RangeInclusive<u32>>,
    },
}

impl Selection {
    /// Range members match only in their canonical decimal form, so `02`
    /// is not in `1-3`.
    pub fn contains(&self, number: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Chapters { numbers, ranges } => {
                numbers.contains(number)
                    || number
                        .parse::<u32>()
                        .ok()
                        .filter(|n| n.to_string() == number)
                        .map_or(false, |n| ranges.iter().any(|r| r.contains(&n)))
            }
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }
}

impl FromStr for Selection {
    type Err = CrawlError;

    fn from_str(spec: &str) -> Result<Self> {
        let mut numbers = BTreeSet::new();
        let mut ranges = Vec::new();

        for term in spec.split(',').map(str::trim) {
            if term == WILDCARD {
                return Ok(Selection::All);
            }

            match term.split_once('-') {
                Some((start, end)) => ranges.push(parse_range(start, end, term)?),
                None if is_chapter_number(term) => {
                    numbers.insert(term.to_string());
                }
                None => return Err(invalid(term)),
            }
        }

        Ok(Selection::Chapters { numbers, ranges })
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => f.write_str(WILDCARD),
            Selection::Chapters { numbers, ranges } => {
                let terms: Vec<String> = numbers
                    .iter()
                    .cloned()
                    .chain(ranges.iter().map(|r| format!("{}-{}", r.start(), r.end())))
                    .collect();
                f.write_str(&terms.join(","))
            }
        }
    }
}

fn parse_range(start: &str, end: &str, term: &str) -> Result<RangeInclusive<u32>> {
    let start: u32 = start.trim().parse().map_err(|_| invalid(term))?;
    let end: u32 = end.trim().parse().map_err(|_| invalid(term))?;

    if start > end {
        return Err(invalid(term));
    }

    Ok(start..=end)
}

fn is_chapter_number(term: &str) -> bool {
    let mut parts = term.splitn(2, '.');
    let whole = parts.next().unwrap_or_default();
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

    all_digits(whole) && parts.next().map_or(true, all_digits)
}

fn invalid(term: &str) -> CrawlError {
    CrawlError::InvalidSpecification(format!("'{}' is not a chapter number or range", term))
}
