//! Read-only summaries over already-produced records.

use crate::client::{ContentRecord, ContentType};
use serde::Serialize;
use std::collections::BTreeMap;

/// Summary of a merged result list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchStatistics {
    pub total_count: usize,
    /// Distinct types, in order of first appearance
    pub source_types: Vec<ContentType>,
    pub type_counts: BTreeMap<ContentType, usize>,
}

impl SearchStatistics {
    #[must_use]
    pub fn from_records(records: &[ContentRecord]) -> Self {
        let mut source_types = Vec::new();
        let mut type_counts = BTreeMap::new();

        for record in records {
            let count = type_counts.entry(record.content_type).or_insert(0);
            if *count == 0 {
                source_types.push(record.content_type);
            }
            *count += 1;
        }

        Self {
            total_count: records.len(),
            source_types,
            type_counts,
        }
    }

    /// Number of records of one type
    #[must_use]
    pub fn count_of(&self, content_type: ContentType) -> usize {
        self.type_counts.get(&content_type).copied().unwrap_or(0)
    }
}

/// Summary of a bulk search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkStatistics {
    pub total_results: usize,
    pub sources_searched: usize,
    pub results_per_source: BTreeMap<String, usize>,
    pub search_terms: Vec<String>,
}

impl BulkStatistics {
    #[must_use]
    pub fn new(
        results: &[ContentRecord],
        by_source: &BTreeMap<String, Vec<ContentRecord>>,
        search_terms: &[String],
    ) -> Self {
        Self {
            total_results: results.len(),
            sources_searched: by_source.len(),
            results_per_source: by_source
                .iter()
                .map(|(source, records)| (source.clone(), records.len()))
                .collect(),
            search_terms: search_terms.to_vec(),
        }
    }
}
