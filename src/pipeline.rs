//! Derivation of the displayed name list from the repository and settings.
//!
//! Everything here is pure: inputs are borrowed, outputs are new values.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::model::{NameEntry, Settings, SortMode};

/// Equality key for names: surrounding whitespace trimmed, lower-cased.
/// Never used for display or storage.
pub fn normalize(name: &str) -> String {
  name.trim().to_lowercase()
}

/// Produce the displayed list: first-wins dedupe (if enabled), then a stable sort.
pub fn derive(entries: &[NameEntry], settings: &Settings) -> Vec<NameEntry> {
  let mut out: Vec<NameEntry> = if settings.dedupe {
    let mut seen = HashSet::new();
    entries.iter().filter(|e| seen.insert(normalize(&e.name))).cloned().collect()
  } else {
    entries.to_vec()
  };

  // `sort_by` is stable, so ties keep the order produced above.
  match settings.sort_mode {
    SortMode::Chronological => out.sort_by_key(|e| e.added_at),
    SortMode::AlphabeticalAsc => out.sort_by(|a, b| compare_names(&a.name, &b.name)),
    SortMode::AlphabeticalDesc => out.sort_by(|a, b| compare_names(&b.name, &a.name)),
  }
  out
}

/// Whether `name` occurs more than once in the full repository.
///
/// Must be given the full entry list, not the derived one: after dedupe every
/// surviving name is unique in the derived list.
pub fn is_duplicate(name: &str, all_entries: &[NameEntry], dedupe: bool) -> bool {
  if !dedupe {
    return false;
  }
  let needle = normalize(name);
  all_entries.iter().filter(|e| normalize(&e.name) == needle).nth(1).is_some()
}

/// Precomputed normalized-name counts over the full repository, so each
/// displayed row can be annotated without rescanning.
#[derive(Debug, Default)]
pub struct DuplicateIndex {
  counts: HashMap<String, usize>,
  dedupe: bool,
}

impl DuplicateIndex {
  pub fn build(all_entries: &[NameEntry], dedupe: bool) -> Self {
    let mut counts = HashMap::new();
    if dedupe {
      for entry in all_entries {
        *counts.entry(normalize(&entry.name)).or_insert(0) += 1;
      }
    }
    Self { counts, dedupe }
  }

  pub fn is_duplicate(&self, name: &str) -> bool {
    self.dedupe && self.counts.get(&normalize(name)).is_some_and(|&n| n > 1)
  }
}

// --- Collation ---

/// Locale-style comparison: case, surrounding whitespace and common Latin
/// diacritics are ignored, so "Émile" sorts with "emile" and "Alice" ties with " alice ".
pub fn compare_names(a: &str, b: &str) -> Ordering {
  collation_key(a).cmp(&collation_key(b))
}

fn collation_key(name: &str) -> String {
  let mut key = String::with_capacity(name.len());
  for c in name.trim().chars().flat_map(char::to_lowercase) {
    match fold_diacritic(c) {
      Some(base) => key.push_str(base),
      None => key.push(c),
    }
  }
  key
}

fn fold_diacritic(c: char) -> Option<&'static str> {
  let base = match c {
    'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
    'æ' => "ae",
    'ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => "c",
    'ď' | 'đ' => "d",
    'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => "e",
    'ĝ' | 'ğ' | 'ġ' | 'ģ' => "g",
    'ĥ' | 'ħ' => "h",
    'ì' | 'í' | 'î' | 'ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' | 'ı' => "i",
    'ĵ' => "j",
    'ķ' => "k",
    'ĺ' | 'ļ' | 'ľ' | 'ŀ' | 'ł' => "l",
    'ñ' | 'ń' | 'ņ' | 'ň' => "n",
    'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ŏ' | 'ő' => "o",
    'œ' => "oe",
    'ŕ' | 'ŗ' | 'ř' => "r",
    'ś' | 'ŝ' | 'ş' | 'š' => "s",
    'ß' => "ss",
    'ţ' | 'ť' | 'ŧ' => "t",
    'ù' | 'ú' | 'û' | 'ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => "u",
    'ŵ' => "w",
    'ý' | 'ÿ' | 'ŷ' => "y",
    'ź' | 'ż' | 'ž' => "z",
    _ => return None,
  };
  Some(base)
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{DateTime, Duration as ChronoDuration, Utc};
  use uuid::Uuid;

  fn t(n: i64) -> DateTime<Utc> {
    "2024-05-01T10:00:00Z".parse::<DateTime<Utc>>().unwrap() + ChronoDuration::seconds(n)
  }

  fn entry(name: &str, added: i64) -> NameEntry {
    NameEntry { id: Uuid::new_v4(), name: name.to_string(), timestamp: added as f64 * 0.5, added_at: t(added) }
  }

  fn names(list: &[NameEntry]) -> Vec<&str> {
    list.iter().map(|e| e.name.as_str()).collect()
  }

  fn settings(dedupe: bool, sort_mode: SortMode) -> Settings {
    Settings { dedupe, sort_mode }
  }

  fn sample() -> Vec<NameEntry> {
    vec![entry("Alice", 1), entry("bob", 2), entry(" alice ", 3)]
  }

  // --- normalize ---

  #[test]
  fn normalize_trims_and_lowercases() {
    assert_eq!(normalize("  AlIcE \t"), "alice");
    assert_eq!(normalize(""), "");
  }

  // --- derive ---

  #[test]
  fn derive_dedupe_chronological_drops_later_match() {
    let entries = sample();
    let out = derive(&entries, &settings(true, SortMode::Chronological));
    assert_eq!(names(&out), vec!["Alice", "bob"]);
    assert_eq!(out[0].id, entries[0].id);
  }

  #[test]
  fn derive_no_dedupe_alphabetical_keeps_ties_stable() {
    let out = derive(&sample(), &settings(false, SortMode::AlphabeticalAsc));
    assert_eq!(names(&out), vec!["Alice", " alice ", "bob"]);
  }

  #[test]
  fn derive_descending_keeps_ties_stable() {
    let out = derive(&sample(), &settings(false, SortMode::AlphabeticalDesc));
    assert_eq!(names(&out), vec!["bob", "Alice", " alice "]);
  }

  #[test]
  fn derive_dedupe_keeps_first_by_insertion_even_when_added_later() {
    // The first-inserted "carol" has a later added_at; dedupe still keeps it.
    let entries = vec![entry("carol", 9), entry("dave", 2), entry("CAROL", 1)];
    let out = derive(&entries, &settings(true, SortMode::Chronological));
    assert_eq!(names(&out), vec!["dave", "carol"]);
    assert_eq!(out[1].id, entries[0].id);
  }

  #[test]
  fn derive_dedupe_at_most_one_per_normalized_name() {
    let entries = vec![
      entry("Zoe", 1),
      entry("zoe", 2),
      entry("Ann", 3),
      entry(" ZOE", 4),
      entry("ann ", 5),
      entry("Ben", 6),
    ];
    for mode in SortMode::ALL {
      let out = derive(&entries, &settings(true, mode));
      let mut seen = HashSet::new();
      assert!(out.iter().all(|e| seen.insert(normalize(&e.name))));
      assert_eq!(out.len(), 3);
      for kept in &out {
        let first = entries.iter().find(|e| normalize(&e.name) == normalize(&kept.name)).unwrap();
        assert_eq!(first.id, kept.id);
      }
    }
  }

  #[test]
  fn derive_without_dedupe_is_permutation() {
    let entries = vec![entry("b", 3), entry("a", 1), entry("B", 2), entry("c", 4)];
    for mode in SortMode::ALL {
      let out = derive(&entries, &settings(false, mode));
      assert_eq!(out.len(), entries.len());
      let mut in_ids: Vec<Uuid> = entries.iter().map(|e| e.id).collect();
      let mut out_ids: Vec<Uuid> = out.iter().map(|e| e.id).collect();
      in_ids.sort();
      out_ids.sort();
      assert_eq!(in_ids, out_ids);
    }
  }

  #[test]
  fn derive_is_stable_under_resort() {
    let entries = vec![entry("b", 3), entry("a", 1), entry("B", 2), entry("c", 4), entry("A", 5)];
    for mode in SortMode::ALL {
      let s = settings(false, mode);
      let once = derive(&entries, &s);
      let twice = derive(&once, &s);
      assert_eq!(once, twice);
    }
  }

  #[test]
  fn derive_chronological_orders_by_added_at_not_video_timestamp() {
    let mut late = entry("late", 5);
    late.timestamp = 1.0;
    let mut early = entry("early", 1);
    early.timestamp = 99.0;
    let out = derive(&[late, early], &settings(false, SortMode::Chronological));
    assert_eq!(names(&out), vec!["early", "late"]);
  }

  #[test]
  fn derive_does_not_mutate_input() {
    let entries = sample();
    let copy = entries.clone();
    let _ = derive(&entries, &settings(true, SortMode::AlphabeticalDesc));
    assert_eq!(entries, copy);
  }

  #[test]
  fn derive_empty() {
    assert!(derive(&[], &Settings::default()).is_empty());
  }

  // --- is_duplicate ---

  #[test]
  fn is_duplicate_checks_full_repository() {
    let all = sample();
    let displayed = derive(&all, &settings(true, SortMode::Chronological));
    assert!(is_duplicate("Alice", &all, true));
    assert!(is_duplicate("  ALICE", &all, true));
    assert!(!is_duplicate("bob", &all, true));
    // The derived list never reports duplicates once deduped.
    assert!(!is_duplicate("Alice", &displayed, true));
  }

  #[test]
  fn is_duplicate_false_when_dedupe_off() {
    assert!(!is_duplicate("Alice", &sample(), false));
  }

  #[test]
  fn is_duplicate_unknown_name() {
    assert!(!is_duplicate("nobody", &sample(), true));
  }

  // --- DuplicateIndex ---

  #[test]
  fn duplicate_index_matches_predicate() {
    let all = vec![entry("Alice", 1), entry("bob", 2), entry(" alice ", 3), entry("Bob", 4), entry("eve", 5)];
    for dedupe in [true, false] {
      let index = DuplicateIndex::build(&all, dedupe);
      for probe in ["alice", "BOB", "eve", "mallory", " Alice "] {
        assert_eq!(index.is_duplicate(probe), is_duplicate(probe, &all, dedupe), "probe {probe:?} dedupe {dedupe}");
      }
    }
  }

  // --- compare_names ---

  #[test]
  fn compare_names_ignores_case_and_whitespace() {
    assert_eq!(compare_names("Alice", " alice "), Ordering::Equal);
    assert_eq!(compare_names("alice", "Bob"), Ordering::Less);
    assert_eq!(compare_names("Zed", "adam"), Ordering::Greater);
  }

  #[test]
  fn compare_names_folds_diacritics() {
    assert_eq!(compare_names("Émile", "emile"), Ordering::Equal);
    assert_eq!(compare_names("Ærø", "aero"), Ordering::Equal);
    assert_eq!(compare_names("Éva", "Fred"), Ordering::Less);
    assert_eq!(compare_names("Straße", "strasse"), Ordering::Equal);
  }
}
