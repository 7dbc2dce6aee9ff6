use super::error::RecordError;
use super::flat::FlatRecord;
use super::index::IdentifierIndex;
use super::record::RecordStatus;
use crate::overrides::{HardCodedValues, OrganizationSettings};

/// Resolution steps every rule record goes through, in this order.
///
/// Each step is valid exactly once; calling one out of order returns
/// `RecordError::InvalidTransition`, and any mutation after
/// [`convert_to_flat_record`](RuleContract::convert_to_flat_record) returns
/// `RecordError::Frozen`.
pub trait RuleContract {
    /// Claim the identifier in the batch index and mark repeats
    fn check_duplicate(&mut self, index: &IdentifierIndex) -> Result<(), RecordError>;

    /// Applied, exception or ignored; ignore wins over exception
    fn resolve_status(&mut self, settings: &OrganizationSettings)
        -> Result<RecordStatus, RecordError>;

    /// Hard-coded value, then organization exception, then a single value parsed
    /// from check-content; otherwise the organization must supply one
    fn resolve_value(
        &mut self,
        settings: &OrganizationSettings,
        hard_coded: &HardCodedValues,
    ) -> Result<Option<String>, RecordError>;

    /// Finalize and flatten; repeat calls return the same record
    fn convert_to_flat_record(&mut self) -> Result<FlatRecord, RecordError>;
}
