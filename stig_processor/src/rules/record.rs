//! Canonical rule record and its resolution state machine

use super::contract::RuleContract;
use super::error::RecordError;
use super::flat::{keys, FlatRecord};
use super::index::{Claim, IdentifierIndex};
use super::kind::{Extraction, RuleKind};
use crate::document::{RuleGroup, Severity};
use crate::overrides::{HardCodedValues, OrganizationSettings};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use stig_core::log_warning;
use stig_core::logging::codes;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    #[default]
    Applied,
    Exception,
    Ignored,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Applied => "applied",
            RecordStatus::Exception => "exception",
            RecordStatus::Ignored => "ignored",
        }
    }
}

impl FromStr for RecordStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "applied" => Ok(RecordStatus::Applied),
            "exception" => Ok(RecordStatus::Exception),
            "ignored" => Ok(RecordStatus::Ignored),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle position of a record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordState {
    #[default]
    New,
    DuplicateChecked,
    StatusResolved,
    ValueResolved,
    Finalized,
}

impl fmt::Display for RecordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordState::New => "new",
            RecordState::DuplicateChecked => "duplicate-checked",
            RecordState::StatusResolved => "status-resolved",
            RecordState::ValueResolved => "value-resolved",
            RecordState::Finalized => "finalized",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleRecord {
    id: String,
    rule_id: String,
    title: String,
    description: String,
    severity: Severity,
    kind: RuleKind,
    check_lines: Vec<String>,
    fix_lines: Vec<String>,
    is_duplicate: bool,
    duplicate_of: Option<String>,
    status: RecordStatus,
    organization_value_required: bool,
    hard_coded_value: Option<String>,
    resolved_value: Option<String>,
    #[serde(skip)]
    state: RecordState,
}

impl RuleRecord {
    /// New record from a parsed group; the kind is detected from check-content
    pub fn from_group(group: &RuleGroup) -> Self {
        let normalized = group.rule.normalized();
        Self {
            id: group.id.clone(),
            rule_id: group.rule.id.clone(),
            title: group.rule.title.clone(),
            description: group.rule.description.clone(),
            severity: group.rule.severity,
            kind: RuleKind::detect(&normalized.check_lines),
            check_lines: normalized.check_lines.clone(),
            fix_lines: normalized.fix_lines.clone(),
            is_duplicate: false,
            duplicate_of: None,
            status: RecordStatus::Applied,
            organization_value_required: false,
            hard_coded_value: None,
            resolved_value: None,
            state: RecordState::New,
        }
    }

    /// Rebuild a finalized record from its flat form
    pub fn from_flat_record(flat: &FlatRecord) -> Result<Self, RecordError> {
        Ok(Self {
            id: required(flat, keys::ID)?.to_string(),
            rule_id: required(flat, keys::RULE_ID)?.to_string(),
            title: required(flat, keys::TITLE)?.to_string(),
            description: required(flat, keys::DESCRIPTION)?.to_string(),
            severity: parsed(flat, keys::SEVERITY)?,
            kind: parsed(flat, keys::KIND)?,
            check_lines: flat.lines(keys::CHECK_CONTENT).unwrap_or_default(),
            fix_lines: flat.lines(keys::FIX_TEXT).unwrap_or_default(),
            is_duplicate: parsed_bool(flat, keys::IS_DUPLICATE)?,
            duplicate_of: flat.get(keys::DUPLICATE_OF).map(str::to_string),
            status: parsed(flat, keys::STATUS)?,
            organization_value_required: parsed_bool(flat, keys::ORGANIZATION_VALUE_REQUIRED)?,
            hard_coded_value: flat.get(keys::HARD_CODED_VALUE).map(str::to_string),
            resolved_value: flat.get(keys::RESOLVED_VALUE).map(str::to_string),
            state: RecordState::Finalized,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn rule_id(&self) -> &str {
        &self.rule_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    pub fn check_lines(&self) -> &[String] {
        &self.check_lines
    }

    pub fn fix_lines(&self) -> &[String] {
        &self.fix_lines
    }

    pub fn is_duplicate(&self) -> bool {
        self.is_duplicate
    }

    pub fn duplicate_of(&self) -> Option<&str> {
        self.duplicate_of.as_deref()
    }

    pub fn status(&self) -> RecordStatus {
        self.status
    }

    pub fn organization_value_required(&self) -> bool {
        self.organization_value_required
    }

    pub fn hard_coded_value(&self) -> Option<&str> {
        self.hard_coded_value.as_deref()
    }

    pub fn resolved_value(&self) -> Option<&str> {
        self.resolved_value.as_deref()
    }

    pub fn state(&self) -> RecordState {
        self.state
    }

    pub fn is_finalized(&self) -> bool {
        self.state == RecordState::Finalized
    }

    /// Flat form of a finalized record
    pub fn flat_record(&self) -> Result<FlatRecord, RecordError> {
        if !self.is_finalized() {
            return Err(RecordError::InvalidTransition {
                id: self.id.clone(),
                from: self.state,
                to: RecordState::Finalized,
            });
        }

        let mut flat = FlatRecord::new();
        flat.insert(keys::ID, self.id.as_str());
        flat.insert(keys::RULE_ID, self.rule_id.as_str());
        flat.insert(keys::TITLE, self.title.as_str());
        flat.insert(keys::DESCRIPTION, self.description.as_str());
        flat.insert(keys::SEVERITY, self.severity.as_str());
        flat.insert(keys::KIND, self.kind.as_str());
        flat.insert_lines(keys::CHECK_CONTENT, &self.check_lines);
        flat.insert_lines(keys::FIX_TEXT, &self.fix_lines);
        flat.insert(keys::IS_DUPLICATE, self.is_duplicate.to_string());
        flat.insert_optional(keys::DUPLICATE_OF, self.duplicate_of.as_deref());
        flat.insert(keys::STATUS, self.status.as_str());
        flat.insert(
            keys::ORGANIZATION_VALUE_REQUIRED,
            self.organization_value_required.to_string(),
        );
        flat.insert_optional(keys::HARD_CODED_VALUE, self.hard_coded_value.as_deref());
        flat.insert_optional(keys::RESOLVED_VALUE, self.resolved_value.as_deref());
        Ok(flat)
    }

    fn advance(&mut self, from: RecordState, to: RecordState) -> Result<(), RecordError> {
        if self.state == RecordState::Finalized {
            return Err(RecordError::Frozen {
                id: self.id.clone(),
            });
        }
        if self.state != from {
            return Err(RecordError::InvalidTransition {
                id: self.id.clone(),
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }
}

impl RuleContract for RuleRecord {
    fn check_duplicate(&mut self, index: &IdentifierIndex) -> Result<(), RecordError> {
        self.advance(RecordState::New, RecordState::DuplicateChecked)?;

        if let Claim::Duplicate { first, occurrence } = index.claim(&self.id) {
            log_warning!(
                code = codes::rules::DUPLICATE_IDENTIFIER,
                "Duplicate rule identifier",
                "id" => &self.id,
                "occurrence" => occurrence
            );
            self.title = format!("{} (Duplicate of {} #{})", self.title, first, occurrence);
            self.is_duplicate = true;
            self.duplicate_of = Some(first);
        }
        Ok(())
    }

    fn resolve_status(
        &mut self,
        settings: &OrganizationSettings,
    ) -> Result<RecordStatus, RecordError> {
        self.advance(RecordState::DuplicateChecked, RecordState::StatusResolved)?;

        self.status = if settings.is_ignored(&self.id) {
            RecordStatus::Ignored
        } else if settings.exception(&self.id).is_some() {
            RecordStatus::Exception
        } else {
            RecordStatus::Applied
        };
        Ok(self.status)
    }

    fn resolve_value(
        &mut self,
        settings: &OrganizationSettings,
        hard_coded: &HardCodedValues,
    ) -> Result<Option<String>, RecordError> {
        self.advance(RecordState::StatusResolved, RecordState::ValueResolved)?;

        self.hard_coded_value = hard_coded.get(&self.id).map(str::to_string);
        let resolved = match (&self.hard_coded_value, settings.exception(&self.id)) {
            (Some(value), _) => Some(value.clone()),
            (None, Some(exception)) => Some(exception.to_string()),
            (None, None) => match self.kind.extract_value(&self.check_lines) {
                Extraction::Single(value) => Some(value),
                Extraction::None | Extraction::Ambiguous(_) => None,
            },
        };

        self.organization_value_required = resolved.is_none();
        self.resolved_value = resolved.clone();
        Ok(resolved)
    }

    fn convert_to_flat_record(&mut self) -> Result<FlatRecord, RecordError> {
        if self.state != RecordState::Finalized {
            self.advance(RecordState::ValueResolved, RecordState::Finalized)?;
        }
        self.flat_record()
    }
}

fn required<'a>(flat: &'a FlatRecord, key: &str) -> Result<&'a str, RecordError> {
    flat.get(key).ok_or_else(|| RecordError::InvalidFlatRecord {
        key: key.to_string(),
        reason: "missing".to_string(),
    })
}

fn parsed<T: FromStr<Err = String>>(flat: &FlatRecord, key: &str) -> Result<T, RecordError> {
    required(flat, key)?
        .parse()
        .map_err(|value| RecordError::InvalidFlatRecord {
            key: key.to_string(),
            reason: format!("unrecognized value '{}'", value),
        })
}

fn parsed_bool(flat: &FlatRecord, key: &str) -> Result<bool, RecordError> {
    match required(flat, key)? {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(RecordError::InvalidFlatRecord {
            key: key.to_string(),
            reason: format!("expected true or false, found '{}'", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::RawRule;
    use assert_matches::assert_matches;

    fn group(id: &str, title: &str, check: &str) -> RuleGroup {
        RuleGroup::new(
            id,
            "SRG-OS-000001",
            RawRule::new(format!("SV-{}r1_rule", id), title, Severity::Medium)
                .with_description("Discussion.")
                .with_check_content(check)
                .with_fix_text("Configure it.\n\nReboot."),
        )
    }

    fn resolve(
        record: &mut RuleRecord,
        index: &IdentifierIndex,
        settings: &OrganizationSettings,
        hard_coded: &HardCodedValues,
    ) -> FlatRecord {
        record.check_duplicate(index).unwrap();
        record.resolve_status(settings).unwrap();
        record.resolve_value(settings, hard_coded).unwrap();
        record.convert_to_flat_record().unwrap()
    }

    #[test]
    fn test_duplicates_are_marked_not_dropped() {
        let index = IdentifierIndex::new();
        let settings = OrganizationSettings::default();
        let hard_coded = HardCodedValues::default();

        let mut first = RuleRecord::from_group(&group("V-1000", "First title", ""));
        let mut second = RuleRecord::from_group(&group("V-1000", "Second title", ""));
        resolve(&mut first, &index, &settings, &hard_coded);
        resolve(&mut second, &index, &settings, &hard_coded);

        assert!(!first.is_duplicate());
        assert_eq!(first.duplicate_of(), None);
        assert!(second.is_duplicate());
        assert_eq!(second.duplicate_of(), Some("V-1000"));
        assert_eq!(second.title(), "Second title (Duplicate of V-1000 #1)");
    }

    #[test]
    fn test_value_precedence() {
        let settings = OrganizationSettings::default().with_exception("V-1", "Disabled");
        let hard_coded = HardCodedValues::default().with_value("V-1", "Enabled");

        let mut record = RuleRecord::from_group(&group("V-1", "t", "Registry Hive: HKEY_LOCAL_MACHINE\nValue: 0"));
        resolve(&mut record, &IdentifierIndex::new(), &settings, &hard_coded);
        assert_eq!(record.resolved_value(), Some("Enabled"));
        assert_eq!(record.hard_coded_value(), Some("Enabled"));
        assert!(!record.organization_value_required());
        assert_eq!(record.status(), RecordStatus::Exception);

        let mut record = RuleRecord::from_group(&group("V-1", "t", "Registry Hive: HKEY_LOCAL_MACHINE\nValue: 0"));
        resolve(&mut record, &IdentifierIndex::new(), &settings, &HardCodedValues::default());
        assert_eq!(record.resolved_value(), Some("Disabled"));
        assert!(!record.organization_value_required());

        let mut record = RuleRecord::from_group(&group("V-1", "t", "Registry Hive: HKEY_LOCAL_MACHINE\nValue: 0"));
        resolve(
            &mut record,
            &IdentifierIndex::new(),
            &OrganizationSettings::default(),
            &HardCodedValues::default(),
        );
        assert_eq!(record.kind(), RuleKind::Registry);
        assert_eq!(record.resolved_value(), Some("0"));
        assert!(!record.organization_value_required());
    }

    #[test]
    fn test_unresolved_value_requires_organization() {
        let settings = OrganizationSettings::default();
        let hard_coded = HardCodedValues::default();

        let mut manual = RuleRecord::from_group(&group("V-2", "t", "Interview the administrator."));
        resolve(&mut manual, &IdentifierIndex::new(), &settings, &hard_coded);
        assert!(manual.organization_value_required());
        assert_eq!(manual.resolved_value(), None);

        let mut ambiguous = RuleRecord::from_group(&group(
            "V-3",
            "t",
            "Registry Hive: HKEY_LOCAL_MACHINE\nValue: 1\nValue: 2",
        ));
        resolve(&mut ambiguous, &IdentifierIndex::new(), &settings, &hard_coded);
        assert!(ambiguous.organization_value_required());
        assert_eq!(ambiguous.resolved_value(), None);
    }

    #[test]
    fn test_ignore_wins_over_exception() {
        let settings = OrganizationSettings::default()
            .with_ignored("V-4")
            .with_exception("V-4", "5");
        let mut record = RuleRecord::from_group(&group("V-4", "t", ""));
        resolve(&mut record, &IdentifierIndex::new(), &settings, &HardCodedValues::default());

        assert_eq!(record.status(), RecordStatus::Ignored);
        assert_eq!(record.resolved_value(), Some("5"));
    }

    #[test]
    fn test_transitions_are_enforced() {
        let index = IdentifierIndex::new();
        let settings = OrganizationSettings::default();
        let mut record = RuleRecord::from_group(&group("V-5", "t", ""));

        assert_matches!(
            record.resolve_status(&settings),
            Err(RecordError::InvalidTransition { from: RecordState::New, to: RecordState::StatusResolved, .. })
        );
        assert_matches!(record.flat_record(), Err(RecordError::InvalidTransition { .. }));

        let flat = resolve(&mut record, &index, &settings, &HardCodedValues::default());
        assert!(record.is_finalized());
        assert_eq!(record.convert_to_flat_record().unwrap(), flat);
        assert_matches!(record.check_duplicate(&index), Err(RecordError::Frozen { .. }));
        assert_matches!(record.resolve_status(&settings), Err(RecordError::Frozen { .. }));
    }

    #[test]
    fn test_flat_record_round_trip() {
        let settings = OrganizationSettings::default();
        let hard_coded = HardCodedValues::default().with_value("V-6", "Enabled");
        let index = IdentifierIndex::new();
        index.claim("V-6");

        let mut record = RuleRecord::from_group(&group(
            "V-6",
            "Audit logon",
            "Account Logon >> Credential Validation - Success",
        ));
        let flat = resolve(&mut record, &index, &settings, &hard_coded);

        assert_eq!(flat.get(keys::FIX_TEXT), Some("Configure it.\nReboot."));
        assert_eq!(flat.get(keys::IS_DUPLICATE), Some("true"));
        assert_eq!(flat.get(keys::KIND), Some("AuditPolicy"));

        let rebuilt = RuleRecord::from_flat_record(&flat).unwrap();
        assert_eq!(rebuilt, record);
        assert_eq!(rebuilt.flat_record().unwrap(), flat);
    }

    #[test]
    fn test_invalid_flat_record() {
        let mut record = RuleRecord::from_group(&group("V-7", "t", ""));
        let mut flat = resolve(
            &mut record,
            &IdentifierIndex::new(),
            &OrganizationSettings::default(),
            &HardCodedValues::default(),
        )
        .into_inner();

        flat.insert(keys::IS_DUPLICATE.to_string(), "maybe".to_string());
        assert_matches!(
            RuleRecord::from_flat_record(&flat.clone().into()),
            Err(RecordError::InvalidFlatRecord { key, .. }) if key == keys::IS_DUPLICATE
        );

        flat.remove(keys::ID);
        assert_matches!(
            RuleRecord::from_flat_record(&flat.into()),
            Err(RecordError::InvalidFlatRecord { key, .. }) if key == keys::ID
        );
    }

    #[test]
    fn test_serializes_camel_case() {
        let record = RuleRecord::from_group(&group("V-8", "t", ""));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["organizationValueRequired"], false);
        assert_eq!(json["ruleId"], "SV-V-8r1_rule");
        assert!(json.get("state").is_none());
    }
}
