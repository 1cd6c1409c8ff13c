//! Integration tests for the shared resolution and money rules
//!
//! These tests exercise the public API the command line relies on: resolving
//! user input against server-side lists and converting amounts for protocol
//! versions that speak minor units.

use common::{
    Candidate, Diagnostics, MeteError, Resolution, fuzzy_search,
    money::{from_minor_units, to_minor_units},
};

struct Account {
    id: i64,
    name: String,
}

impl Candidate for Account {
    fn candidate_id(&self) -> Option<i64> {
        Some(self.id)
    }

    fn candidate_name(&self) -> &str {
        &self.name
    }
}

fn accounts(names: &[&str]) -> Vec<Account> {
    names
        .iter()
        .enumerate()
        .map(|(index, name)| Account {
            id: index as i64 + 1,
            name: name.to_string(),
        })
        .collect()
}

/// Every id in the list resolves to its own entry, whatever the names are
#[test]
fn test_every_id_resolves_to_its_entry() {
    let accounts = accounts(&["3", "alice", "Alice", "bob", "2"]);
    let diagnostics = Diagnostics::new();

    for account in &accounts {
        let found = fuzzy_search(&accounts, &account.id.to_string(), &diagnostics)
            .found()
            .map(|found| found.id);
        assert_eq!(found, Some(account.id));
    }
}

/// The reported possibilities are exactly the case-insensitive substring hits
#[test]
fn test_ambiguity_reports_the_full_substring_set() {
    let accounts = accounts(&["Maria", "MARIO", "Marius", "Tom", "mar"]);
    let diagnostics = Diagnostics::new();

    let resolution = fuzzy_search(&accounts, "MAR", &diagnostics);

    assert!(matches!(resolution, Resolution::Ambiguous(_)));
    assert_eq!(
        resolution.possibilities(),
        vec![
            "Maria (1)".to_string(),
            "MARIO (2)".to_string(),
            "Marius (3)".to_string(),
            "mar (5)".to_string(),
        ]
    );
}

/// A single substring hit is accepted and the inference is reported
#[test]
fn test_single_substring_hit_is_returned() -> Result<(), MeteError> {
    let accounts = accounts(&["Maria", "Tom"]);
    let diagnostics = Diagnostics::new();

    let account = fuzzy_search(&accounts, "ari", &diagnostics).into_result("ari")?;

    assert_eq!(account.id, 1);
    assert!(
        diagnostics
            .entries()
            .iter()
            .any(|entry| entry.message.contains("only possibility"))
    );
    Ok(())
}

/// Two-decimal amounts survive the trip through minor units unchanged
#[test]
fn test_minor_unit_round_trip() -> Result<(), MeteError> {
    for cents in (-10_000..=10_000).step_by(37) {
        let amount = from_minor_units(cents);
        assert_eq!(from_minor_units(to_minor_units(amount)?), amount);
    }
    Ok(())
}
