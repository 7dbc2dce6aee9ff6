//! STIG catalog: processed data files named by technology, role and STIG version

mod entry;
mod error;
mod index;

pub use entry::{is_catalog_data, is_xml, VersionCatalogEntry};
pub use error::CatalogError;
pub use index::{known_resources, CatalogIndex, VersionTable, DEFAULT_PROCESSED_DIR};

use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use stig_core::ResourceMetadata;

/// Every data file under `root`, sorted, without org markers or schemas
pub fn list_catalog(root: &Path) -> Result<Vec<PathBuf>, CatalogError> {
    CatalogIndex::new(root)?.list()
}

/// Version table of `resource` from `<root>/processed`
pub fn build_version_table(
    root: &Path,
    resource: &str,
    version_filter: Option<&str>,
) -> Result<VersionTable, CatalogError> {
    CatalogIndex::new(root)?.build_version_table(resource, version_filter)
}

/// Versions present on only one side of a resource/catalog comparison
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VersionCrossCheck {
    /// In the catalog but not accepted by the resource
    pub missing_from_resource: BTreeSet<String>,
    /// Accepted by the resource but absent from the catalog
    pub missing_from_catalog: BTreeSet<String>,
}

impl VersionCrossCheck {
    pub fn is_consistent(&self) -> bool {
        self.missing_from_resource.is_empty() && self.missing_from_catalog.is_empty()
    }
}

/// Compare a resource's accepted versions with the catalog's versions for `role`
pub fn cross_check_versions(
    metadata: &ResourceMetadata,
    table: &VersionTable,
    role: &str,
) -> Result<VersionCrossCheck, CatalogError> {
    let catalog = table.valid_versions_for_role(role)?;
    let accepted: BTreeSet<String> = metadata.version_values.iter().cloned().collect();

    Ok(VersionCrossCheck {
        missing_from_resource: catalog
            .iter()
            .filter(|v| !metadata.supports_version(v))
            .cloned()
            .collect(),
        missing_from_catalog: accepted.difference(&catalog).cloned().collect(),
    })
}
