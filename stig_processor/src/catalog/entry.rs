use serde::Serialize;
use std::path::{Path, PathBuf};
use stig_core::config::compile_time::catalog::FILE_NAME_FIELD_COUNT;

/// One processed STIG file, named `<Technology>-<TechnologyVersion>-<TechnologyRole>-<StigVersion>.<ext>`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct VersionCatalogEntry {
    pub technology: String,
    pub technology_version: String,
    pub technology_role: String,
    pub stig_version: String,
    pub path: PathBuf,
}

impl VersionCatalogEntry {
    /// Parse the file stem; `None` unless it has exactly four non-empty fields
    pub fn from_path(path: &Path) -> Option<Self> {
        let stem = path.file_stem()?.to_str()?;
        let fields: Vec<&str> = stem.split('-').collect();
        if fields.len() != FILE_NAME_FIELD_COUNT || fields.iter().any(|f| f.is_empty()) {
            return None;
        }

        Some(Self {
            technology: fields[0].to_string(),
            technology_version: fields[1].to_string(),
            technology_role: fields[2].to_string(),
            stig_version: fields[3].to_string(),
            path: path.to_path_buf(),
        })
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Org marker files (`*.org.*`) and schemas are not catalog data
pub fn is_catalog_data(path: &Path) -> bool {
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name,
        None => return false,
    };
    let is_schema = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("xsd"))
        .unwrap_or(false);

    !is_schema && !name.to_ascii_lowercase().contains(".org.")
}

pub fn is_xml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("xml"))
        .unwrap_or(false)
}
