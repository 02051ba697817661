// /////////////////////////////////////////////////////////////////////////////
// Attachments Ingestion Pipeline
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Page-Range Grammar (§4.6)
//!
//! `"1,3-5,-1,N"` parses into a deduplicated, order-preserving list of
//! 1-based page numbers. `N` means "the last page"; negative numbers index
//! from the end (`-1` == last page, `-2` == second-to-last).

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageRangeError {
    #[error("invalid page-range term `{0}`")]
    InvalidTerm(String),
}

/// Parses a page-range expression against a known total page count,
/// returning 1-based page numbers in the order the terms were written,
/// deduplicated on first occurrence.
pub fn parse_page_ranges(expr: &str, total_pages: usize) -> Result<Vec<usize>, PageRangeError> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();

    for raw_term in expr.split(',') {
        let term = raw_term.trim();
        if term.is_empty() {
            continue;
        }
        for page in resolve_term(term, total_pages)? {
            if seen.insert(page) {
                out.push(page);
            }
        }
    }

    Ok(out)
}

fn resolve_term(term: &str, total_pages: usize) -> Result<Vec<usize>, PageRangeError> {
    if term.eq_ignore_ascii_case("n") {
        return Ok(vec![total_pages]);
    }

    if let Some(rest) = term.strip_prefix('-') {
        let n: i64 = rest.parse().map_err(|_| PageRangeError::InvalidTerm(term.to_string()))?;
        let page = total_pages as i64 - n + 1;
        return Ok(vec![clamp_positive(page, term)?]);
    }

    if let Some((start, end)) = term.split_once('-') {
        let start: usize = start
            .trim()
            .parse()
            .map_err(|_| PageRangeError::InvalidTerm(term.to_string()))?;
        let end_resolved = if end.trim().eq_ignore_ascii_case("n") {
            total_pages
        } else {
            end.trim().parse().map_err(|_| PageRangeError::InvalidTerm(term.to_string()))?
        };
        if start == 0 || end_resolved == 0 || start > end_resolved {
            return Err(PageRangeError::InvalidTerm(term.to_string()));
        }
        return Ok((start..=end_resolved).collect());
    }

    let page: usize = term.parse().map_err(|_| PageRangeError::InvalidTerm(term.to_string()))?;
    if page == 0 {
        return Err(PageRangeError::InvalidTerm(term.to_string()));
    }
    Ok(vec![page])
}

fn clamp_positive(page: i64, term: &str) -> Result<usize, PageRangeError> {
    if page < 1 {
        return Err(PageRangeError::InvalidTerm(term.to_string()));
    }
    Ok(page as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_terms_resolve_in_written_order() {
        let pages = parse_page_ranges("1,3-5,-1,N", 10).unwrap();
        assert_eq!(pages, vec![1, 3, 4, 5, 10]);
    }

    #[test]
    fn duplicates_are_dropped_keeping_first_occurrence() {
        let pages = parse_page_ranges("1-3,2", 10).unwrap();
        assert_eq!(pages, vec![1, 2, 3]);
    }

    #[test]
    fn spec_scenario_pages_1_to_3() {
        let pages = parse_page_ranges("1-3", 20).unwrap();
        assert_eq!(pages, vec![1, 2, 3]);
    }

    #[test]
    fn zero_is_not_a_valid_page() {
        assert!(parse_page_ranges("0", 5).is_err());
    }

    #[test]
    fn backwards_range_is_an_error() {
        assert!(parse_page_ranges("5-1", 10).is_err());
    }
}
