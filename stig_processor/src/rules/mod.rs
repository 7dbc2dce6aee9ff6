//! Rule records: duplicate detection, override precedence and flat serialization

mod contract;
mod error;
mod flat;
mod index;
mod kind;
mod record;

pub use contract::RuleContract;
pub use error::RecordError;
pub use flat::{keys, FlatRecord};
pub use index::{Claim, IdentifierIndex};
pub use kind::{Extraction, RuleKind};
pub use record::{RecordState, RecordStatus, RuleRecord};

use crate::document::{BenchmarkDocument, RuleGroup};
use crate::overrides::{HardCodedValues, OrganizationSettings};
use std::time::Instant;
use stig_core::log_performance;
use stig_core::logging::codes;

/// Runs every record through the contract against one shared index.
///
/// Resolution is single-writer: feed documents in a stable order and the
/// output order and duplicate markers follow it.
#[derive(Debug)]
pub struct RecordResolver<'a> {
    settings: &'a OrganizationSettings,
    hard_coded: &'a HardCodedValues,
    index: IdentifierIndex,
}

impl<'a> RecordResolver<'a> {
    pub fn new(settings: &'a OrganizationSettings, hard_coded: &'a HardCodedValues) -> Self {
        Self {
            settings,
            hard_coded,
            index: IdentifierIndex::new(),
        }
    }

    /// Resolve and finalize one group
    pub fn resolve_group(&self, group: &RuleGroup) -> Result<RuleRecord, RecordError> {
        let mut record = RuleRecord::from_group(group);
        record.check_duplicate(&self.index)?;
        record.resolve_status(self.settings)?;
        record.resolve_value(self.settings, self.hard_coded)?;
        record.convert_to_flat_record()?;
        Ok(record)
    }

    pub fn resolve_document(
        &self,
        document: &BenchmarkDocument,
    ) -> Result<Vec<RuleRecord>, RecordError> {
        document
            .groups
            .iter()
            .map(|group| self.resolve_group(group))
            .collect()
    }

    /// Resolve documents in the order given; one record per group
    pub fn resolve_all<'d>(
        &self,
        documents: impl IntoIterator<Item = &'d BenchmarkDocument>,
    ) -> Result<Vec<RuleRecord>, RecordError> {
        let start = Instant::now();
        let mut records = Vec::new();
        for document in documents {
            records.extend(self.resolve_document(document)?);
        }

        log_performance!(
            codes::success::RECORDS_RESOLVED,
            "Rule records resolved",
            duration = start.elapsed(),
            "records" => records.len(),
            "duplicates" => self.duplicate_count()
        );
        Ok(records)
    }

    pub fn duplicate_count(&self) -> usize {
        self.index.duplicate_count()
    }

    pub fn index(&self) -> &IdentifierIndex {
        &self.index
    }
}

/// Flat form of finalized records, in order
pub fn flatten(records: &[RuleRecord]) -> Result<Vec<FlatRecord>, RecordError> {
    records.iter().map(RuleRecord::flat_record).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::builder::{BenchmarkBuilder, GroupBuilder};
    use crate::document::parse_benchmark_text;

    fn document(groups: Vec<GroupBuilder>) -> BenchmarkDocument {
        let builder = groups
            .into_iter()
            .fold(BenchmarkBuilder::new("Sample_STIG"), |b, g| b.group(g));
        parse_benchmark_text(&builder.build()).unwrap()
    }

    #[test]
    fn test_duplicates_across_documents() {
        let settings = OrganizationSettings::default();
        let hard_coded = HardCodedValues::default();
        let resolver = RecordResolver::new(&settings, &hard_coded);

        let first = document(vec![
            GroupBuilder::new("V-1000").rule_title("Original"),
            GroupBuilder::new("V-1001"),
        ]);
        let second = document(vec![GroupBuilder::new("V-1000").rule_title("Repeat")]);

        let records = resolver.resolve_all([&first, &second]).unwrap();
        assert_eq!(records.len(), 3);
        assert!(!records[0].is_duplicate());
        assert!(records[2].is_duplicate());
        assert_eq!(records[2].duplicate_of(), Some("V-1000"));
        assert_eq!(resolver.duplicate_count(), 1);
        assert!(records.iter().all(RuleRecord::is_finalized));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let settings = OrganizationSettings::default().with_exception("V-1001", "14");
        let hard_coded = HardCodedValues::default().with_value("V-1000", "Enabled");
        let doc = document(vec![
            GroupBuilder::new("V-1000").check_content("Registry Hive: HKEY_LOCAL_MACHINE\nValue: 0"),
            GroupBuilder::new("V-1001"),
            GroupBuilder::new("V-1000"),
        ]);

        let run = || {
            let resolver = RecordResolver::new(&settings, &hard_coded);
            let records = resolver.resolve_all([&doc]).unwrap();
            serde_json::to_string(&flatten(&records).unwrap()).unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_flatten_rejects_unfinalized() {
        let doc = document(vec![GroupBuilder::new("V-1")]);
        let record = RuleRecord::from_group(&doc.groups[0]);
        assert!(flatten(&[record]).is_err());
    }
}
