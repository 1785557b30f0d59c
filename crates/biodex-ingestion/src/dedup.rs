//! Deduplication of normalised species records.

use std::collections::HashSet;

use biodex_common::{SpeciesRecord, TaxonId};

/// Drop repeated taxon ids (first occurrence wins) and the query subject.
///
/// Order of the surviving records is preserved.
pub fn dedup_records(records: Vec<SpeciesRecord>, subject: Option<TaxonId>) -> Vec<SpeciesRecord> {
    let mut seen: HashSet<TaxonId> = HashSet::with_capacity(records.len());
    if let Some(subject) = subject {
        seen.insert(subject);
    }
    records
        .into_iter()
        .filter(|r| seen.insert(r.taxon_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: TaxonId, name: &str) -> SpeciesRecord {
        SpeciesRecord {
            taxon_id: id,
            common_name: name.to_string(),
            scientific_name: String::new(),
            image_url: None,
            image_square_url: None,
            image_medium_url: None,
            group: None,
            confidence: None,
            reason: None,
        }
    }

    #[test]
    fn test_first_occurrence_wins() {
        let out = dedup_records(vec![rec(1, "a"), rec(2, "b"), rec(1, "c")], None);
        let names: Vec<&str> = out.iter().map(|r| r.common_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_subject_is_excluded() {
        let out = dedup_records(vec![rec(7, "self"), rec(8, "other")], Some(7));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].taxon_id, 8);
    }

    #[test]
    fn test_empty_input() {
        assert!(dedup_records(vec![], Some(1)).is_empty());
    }
}
