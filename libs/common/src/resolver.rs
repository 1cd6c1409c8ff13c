//! Fuzzy resolution of user input to a single entity
//!
//! Users refer to drinks and accounts either by numeric id or by (part of) the
//! name. [`fuzzy_search`] implements the one matching policy shared by every
//! entity kind:
//!
//! 1. a query made of ASCII digits only is first tried as an exact id,
//! 2. a case-sensitive name equality wins immediately,
//! 3. case-insensitive substring matches are collected; a single one is
//!    accepted, several are reported back as possibilities.

use std::fmt;

use crate::diagnostics::Diagnostics;
use crate::error::{MeteError, MeteResult};

/// Anything that can be picked by id or name
pub trait Candidate {
    fn candidate_id(&self) -> Option<i64>;
    fn candidate_name(&self) -> &str;

    /// Label used when listing possibilities, `"{name} ({id})"`
    fn candidate_label(&self) -> String {
        match self.candidate_id() {
            Some(id) => format!("{} ({})", self.candidate_name(), id),
            None => format!("{} (new)", self.candidate_name()),
        }
    }
}

/// Outcome of a resolution attempt
#[derive(Debug, PartialEq)]
pub enum Resolution<'a, T> {
    /// Exactly one entity was identified
    Found(&'a T),
    /// Several names contain the query and none equals it
    Ambiguous(Vec<&'a T>),
    /// Nothing matched
    NotFound,
}

impl<'a, T: Candidate> Resolution<'a, T> {
    pub fn found(&self) -> Option<&'a T> {
        match self {
            Resolution::Found(thing) => Some(thing),
            _ => None,
        }
    }

    /// The `"{name} ({id})"` labels of the reported possibilities
    pub fn possibilities(&self) -> Vec<String> {
        match self {
            Resolution::Ambiguous(things) => {
                things.iter().map(|thing| thing.candidate_label()).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Turn anything but a unique match into a [`MeteError::NoMatch`]
    pub fn into_result(self, query: &str) -> MeteResult<&'a T> {
        match self {
            Resolution::Found(thing) => Ok(thing),
            other => Err(MeteError::NoMatch {
                query: query.to_string(),
                candidates: other.possibilities(),
            }),
        }
    }
}

impl<T: Candidate> fmt::Display for Resolution<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Found(thing) => write!(f, "Found {}.", thing.candidate_label()),
            Resolution::Ambiguous(_) => write!(
                f,
                "No exact match was found. Possibilities: {}",
                self.possibilities().join(", ")
            ),
            Resolution::NotFound => write!(f, "No match was found."),
        }
    }
}

/// Resolve `query` against `candidates`
pub fn fuzzy_search<'a, T: Candidate>(
    candidates: &'a [T],
    query: &str,
    diagnostics: &Diagnostics,
) -> Resolution<'a, T> {
    if let Some(id) = as_id(query) {
        if let Some(thing) = find_by_id(candidates, id) {
            diagnostics.debug(format!("Found {} by id.", thing.candidate_label()));
            return Resolution::Found(thing);
        }
    }

    let query = query.trim();

    let folded_query = query.to_lowercase();
    let mut possible = Vec::new();
    for thing in candidates {
        if thing.candidate_name() == query {
            diagnostics.debug(format!("Found {}.", thing.candidate_label()));
            return Resolution::Found(thing);
        }
        if thing.candidate_name().to_lowercase().contains(&folded_query) {
            possible.push(thing);
        }
    }

    match possible.len() {
        0 => {
            diagnostics.info(format!("No match was found for '{}'.", query));
            Resolution::NotFound
        }
        1 => {
            let thing = possible[0];
            diagnostics.info(format!(
                "No exact match, but {} is the only possibility.",
                thing.candidate_label()
            ));
            Resolution::Found(thing)
        }
        _ => {
            let resolution = Resolution::Ambiguous(possible);
            diagnostics.info(resolution.to_string());
            resolution
        }
    }
}

/// Plain ASCII digits only; `+2` or `²` are names, not ids
fn as_id(query: &str) -> Option<u64> {
    if query.is_empty() || !query.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    query.parse().ok()
}

/// Find the candidate with exactly this id
pub fn find_by_id<T: Candidate>(candidates: &[T], id: u64) -> Option<&T> {
    candidates
        .iter()
        .find(|thing| thing.candidate_id().and_then(|own| u64::try_from(own).ok()) == Some(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;

    #[derive(Debug, PartialEq)]
    struct Thing {
        id: i64,
        name: &'static str,
    }

    impl Candidate for Thing {
        fn candidate_id(&self) -> Option<i64> {
            Some(self.id)
        }

        fn candidate_name(&self) -> &str {
            self.name
        }
    }

    fn colas() -> Vec<Thing> {
        vec![
            Thing { id: 1, name: "Cola" },
            Thing {
                id: 2,
                name: "Cola Light",
            },
        ]
    }

    #[test]
    fn test_lowercase_query_is_ambiguous() {
        let things = colas();
        let diagnostics = Diagnostics::new();

        let resolution = fuzzy_search(&things, "cola", &diagnostics);

        assert_eq!(resolution, Resolution::Ambiguous(vec![&things[0], &things[1]]));
        assert_eq!(
            resolution.possibilities(),
            vec!["Cola (1)".to_string(), "Cola Light (2)".to_string()]
        );
        assert_eq!(
            diagnostics.messages(Severity::Info),
            vec!["No exact match was found. Possibilities: Cola (1), Cola Light (2)".to_string()]
        );
    }

    #[test]
    fn test_exact_name_wins() {
        let things = colas();
        let resolution = fuzzy_search(&things, "Cola", &Diagnostics::new());
        assert_eq!(resolution.found().map(|thing| thing.id), Some(1));
    }

    #[test]
    fn test_exact_name_wins_even_after_substring_hits() {
        let things = vec![
            Thing {
                id: 7,
                name: "Mate Cola",
            },
            Thing { id: 3, name: "Cola" },
        ];
        let resolution = fuzzy_search(&things, "Cola", &Diagnostics::new());
        assert_eq!(resolution.found().map(|thing| thing.id), Some(3));
    }

    #[test]
    fn test_numeric_query_matches_id_without_name_comparison() {
        let things = colas();
        let diagnostics = Diagnostics::new();
        let resolution = fuzzy_search(&things, "2", &diagnostics);
        assert_eq!(resolution.found().map(|thing| thing.id), Some(2));
        assert!(diagnostics.messages(Severity::Info).is_empty());
    }

    #[test]
    fn test_signed_or_padded_numbers_are_names() {
        let things = vec![
            Thing { id: 1, name: "+2" },
            Thing {
                id: 2,
                name: "Club Mate",
            },
        ];
        for query in ["+2", " +2 "] {
            let resolution = fuzzy_search(&things, query, &Diagnostics::new());
            assert_eq!(resolution.found().map(|thing| thing.id), Some(1), "{query:?}");
        }
        let resolution = fuzzy_search(&things, " 2", &Diagnostics::new());
        assert_eq!(resolution.found().map(|thing| thing.id), Some(1));
    }

    #[test]
    fn test_numeric_query_prefers_id_over_name() {
        let things = vec![
            Thing { id: 1, name: "2" },
            Thing {
                id: 2,
                name: "Club Mate",
            },
        ];
        let resolution = fuzzy_search(&things, "2", &Diagnostics::new());
        assert_eq!(resolution.found().map(|thing| thing.id), Some(2));
    }

    #[test]
    fn test_numeric_query_falls_back_to_names() {
        let things = vec![Thing {
            id: 10,
            name: "Beer 1664",
        }];
        let resolution = fuzzy_search(&things, "1664", &Diagnostics::new());
        assert_eq!(resolution.found().map(|thing| thing.id), Some(10));
    }

    #[test]
    fn test_single_substring_match_is_inferred() {
        let things = colas();
        let diagnostics = Diagnostics::new();

        let resolution = fuzzy_search(&things, "light", &diagnostics);

        assert_eq!(resolution.found().map(|thing| thing.id), Some(2));
        assert_eq!(
            diagnostics.messages(Severity::Info),
            vec!["No exact match, but Cola Light (2) is the only possibility.".to_string()]
        );
    }

    #[test]
    fn test_no_match() {
        let things = colas();
        let resolution = fuzzy_search(&things, "Tea", &Diagnostics::new());
        assert_eq!(resolution, Resolution::NotFound);
        assert_eq!(resolution.to_string(), "No match was found.");

        let err = resolution.into_result("Tea").expect_err("no match");
        assert!(matches!(err, MeteError::NoMatch { ref candidates, .. } if candidates.is_empty()));
    }

    #[test]
    fn test_ambiguous_into_result_reports_all_candidates() {
        let things = vec![
            Thing {
                id: 4,
                name: "Club Mate",
            },
            Thing {
                id: 5,
                name: "Club Mate Cola",
            },
            Thing {
                id: 6,
                name: "Flora Mate",
            },
            Thing {
                id: 8,
                name: "Water",
            },
        ];

        let err = fuzzy_search(&things, "mate", &Diagnostics::new())
            .into_result("mate")
            .expect_err("ambiguous");

        match err {
            MeteError::NoMatch { candidates, .. } => assert_eq!(
                candidates,
                vec![
                    "Club Mate (4)".to_string(),
                    "Club Mate Cola (5)".to_string(),
                    "Flora Mate (6)".to_string(),
                ]
            ),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_candidates() {
        let things: Vec<Thing> = Vec::new();
        assert_eq!(
            fuzzy_search(&things, "1", &Diagnostics::new()),
            Resolution::NotFound
        );
    }
}
