use crate::types::{AnnotatedRecord, Record};
use crate::vocabulary::Vocabulary;

/// Result of matching one record against the vocabulary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    pub is_match: bool,
    /// Matched terms in vocabulary order
    pub matched_terms: Vec<String>,
}

/// Vocabulary terms contained in `description`, ignoring case, in vocabulary order.
pub fn match_keywords(description: &str, vocabulary: &Vocabulary) -> Vec<String> {
    let haystack = description.to_lowercase();
    vocabulary
        .folded_terms()
        .filter(|(_, folded)| haystack.contains(folded))
        .map(|(original, _)| original.to_string())
        .collect()
}

/// Match a record's description against the vocabulary.
pub fn match_and_annotate(record: &Record, vocabulary: &Vocabulary) -> MatchOutcome {
    let matched_terms = match_keywords(record.description_text(), vocabulary);
    MatchOutcome {
        is_match: !matched_terms.is_empty(),
        matched_terms,
    }
}

/// Attach matched terms to a record, or drop it when nothing matched.
pub fn annotate(record: Record, vocabulary: &Vocabulary) -> Option<AnnotatedRecord> {
    let outcome = match_and_annotate(&record, vocabulary);
    outcome.is_match.then(|| AnnotatedRecord {
        record,
        matched_keywords: outcome.matched_terms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with(description: &str) -> Record {
        Record {
            description: Some(description.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let vocabulary = Vocabulary::default();
        let matched = match_keywords("CONSTRUCCIÓN DE LA PTAR Y ALCANTARILLADO", &vocabulary);
        assert_eq!(matched, vec!["PTAR".to_string(), "alcantarillado".to_string()]);
    }

    #[test]
    fn test_match_is_substring_based() {
        let vocabulary = Vocabulary::new(["bombeo"]);
        assert_eq!(match_keywords("rebombeo municipal", &vocabulary), vec!["bombeo"]);
    }

    #[test]
    fn test_matches_follow_vocabulary_order() {
        let vocabulary = Vocabulary::default();
        let matched = match_keywords("control de inundaciones y bombeo", &vocabulary);
        assert_eq!(matched, vec!["bombeo", "control de inundaciones"]);
    }

    #[test]
    fn test_overlapping_terms_all_match() {
        let vocabulary = Vocabulary::default();
        let matched = match_keywords("Optimización de estaciones de bombeo", &vocabulary);
        assert_eq!(matched, vec!["bombeo", "estaciones de bombeo"]);
    }

    #[test]
    fn test_no_spurious_matches() {
        let vocabulary = Vocabulary::default();
        let outcome = match_and_annotate(&record_with("Suministro de papelería"), &vocabulary);
        assert!(!outcome.is_match);
        assert!(outcome.matched_terms.is_empty());
    }

    #[test]
    fn test_missing_description_never_matches() {
        let vocabulary = Vocabulary::default();
        let outcome = match_and_annotate(&Record::default(), &vocabulary);
        assert!(!outcome.is_match);
    }

    #[test]
    fn test_injected_vocabulary() {
        let vocabulary = Vocabulary::new(["puente", "vía"]);
        let outcome = match_and_annotate(&record_with("Mantenimiento de VÍA y PUENTE"), &vocabulary);
        assert!(outcome.is_match);
        assert_eq!(outcome.matched_terms, vec!["puente", "vía"]);
    }

    #[test]
    fn test_annotate_drops_non_matching_records() {
        let vocabulary = Vocabulary::default();
        assert!(annotate(record_with("Servicios de aseo"), &vocabulary).is_none());

        let annotated = annotate(record_with("Suministro de agua potable"), &vocabulary).unwrap();
        assert_eq!(annotated.matched_keywords, vec!["agua potable"]);
    }
}
