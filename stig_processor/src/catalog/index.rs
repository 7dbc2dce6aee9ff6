use super::entry::{is_catalog_data, is_xml, VersionCatalogEntry};
use super::error::CatalogError;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use stig_core::config::compile_time::catalog::{MAX_CATALOG_DEPTH, MAX_CATALOG_FILES};
use stig_core::logging::codes;
use stig_core::{log_debug, log_performance, log_warning};
use walkdir::WalkDir;

/// Default name of the processed-data subtree under a catalog root
pub const DEFAULT_PROCESSED_DIR: &str = "processed";

/// Resource types and the technologies their data files may name
const RESOURCE_TECHNOLOGIES: &[(&str, &[&str])] = &[
    ("Adobe", &["Adobe"]),
    ("Chrome", &["Chrome"]),
    ("DotNetFramework", &["DotNetFramework"]),
    ("FireFox", &["FireFox"]),
    ("IisServer", &["IISServer"]),
    ("IisSite", &["IISSite"]),
    ("InternetExplorer", &["InternetExplorer"]),
    ("Office", &["Office"]),
    ("OracleJRE", &["OracleJRE"]),
    ("SqlServer", &["SqlServer"]),
    ("WindowsClient", &["WindowsClient"]),
    ("WindowsDefender", &["WindowsDefender"]),
    ("WindowsDnsServer", &["WindowsDnsServer"]),
    ("WindowsFirewall", &["WindowsFirewall"]),
    ("WindowsServer", &["WindowsServer"]),
];

pub fn known_resources() -> Vec<&'static str> {
    RESOURCE_TECHNOLOGIES.iter().map(|(name, _)| *name).collect()
}

fn technologies_for(resource: &str) -> Result<&'static [&'static str], CatalogError> {
    RESOURCE_TECHNOLOGIES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(resource))
        .map(|(_, technologies)| *technologies)
        .ok_or_else(|| CatalogError::UnknownResource {
            resource: resource.to_string(),
            known: known_resources(),
        })
}

/// Anchored, case-insensitive pattern; `MS` does not match `MSDC`
fn role_pattern(pattern: &str) -> Result<Regex, CatalogError> {
    RegexBuilder::new(&format!("^(?:{})$", pattern))
        .case_insensitive(true)
        .build()
        .map_err(|e| CatalogError::InvalidFilter {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })
}

/// Catalog entries of one resource type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VersionTable {
    pub resource: String,
    pub entries: Vec<VersionCatalogEntry>,
    /// Files skipped because their names did not parse
    pub skipped: Vec<PathBuf>,
}

impl VersionTable {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Unique STIG versions whose technology role matches `role`
    pub fn valid_versions_for_role(&self, role: &str) -> Result<BTreeSet<String>, CatalogError> {
        let pattern = role_pattern(role)?;
        Ok(self
            .entries
            .iter()
            .filter(|e| pattern.is_match(&e.technology_role))
            .map(|e| e.stig_version.clone())
            .collect())
    }

    pub fn roles(&self) -> BTreeSet<&str> {
        self.entries
            .iter()
            .map(|e| e.technology_role.as_str())
            .collect()
    }

    pub fn technology_versions(&self) -> BTreeSet<&str> {
        self.entries
            .iter()
            .map(|e| e.technology_version.as_str())
            .collect()
    }
}

/// STIG data files under a catalog root
#[derive(Debug, Clone)]
pub struct CatalogIndex {
    root: PathBuf,
    processed_dir: String,
}

impl CatalogIndex {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, CatalogError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(CatalogError::RootNotFound {
                path: root.display().to_string(),
            });
        }
        Ok(Self {
            root,
            processed_dir: DEFAULT_PROCESSED_DIR.to_string(),
        })
    }

    pub fn with_processed_dir(mut self, name: impl Into<String>) -> Self {
        self.processed_dir = name.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn processed_root(&self) -> PathBuf {
        self.root.join(&self.processed_dir)
    }

    /// Every data file under the root, sorted
    pub fn list(&self) -> Result<Vec<PathBuf>, CatalogError> {
        walk_files(&self.root)
    }

    /// Parse the processed files of one resource type into a table.
    ///
    /// `version_filter` is a regular expression matched against the file name.
    /// Names that do not split into four fields are skipped with a warning.
    pub fn build_version_table(
        &self,
        resource: &str,
        version_filter: Option<&str>,
    ) -> Result<VersionTable, CatalogError> {
        let start = Instant::now();
        let technologies = technologies_for(resource)?;
        let filter = version_filter
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| CatalogError::InvalidFilter {
                    pattern: pattern.to_string(),
                    message: e.to_string(),
                })
            })
            .transpose()?;

        let processed = self.processed_root();
        if !processed.is_dir() {
            return Err(CatalogError::RootNotFound {
                path: processed.display().to_string(),
            });
        }

        let mut table = VersionTable {
            resource: resource.to_string(),
            ..Default::default()
        };

        for path in walk_files(&processed)? {
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name,
                None => continue,
            };
            let allowed = technologies
                .iter()
                .any(|t| name.starts_with(&format!("{}-", t)));
            if !is_xml(&path) || !allowed {
                continue;
            }
            if let Some(filter) = &filter {
                if !filter.is_match(name) {
                    continue;
                }
            }

            match VersionCatalogEntry::from_path(&path) {
                Some(entry) => table.entries.push(entry),
                None => {
                    log_warning!(
                        code = codes::catalog::MALFORMED_FILE_NAME,
                        "Skipping catalog file with malformed name",
                        "path" => path.display(),
                        "expected" => "<Technology>-<TechnologyVersion>-<TechnologyRole>-<StigVersion>"
                    );
                    table.skipped.push(path);
                }
            }
        }

        log_performance!(
            codes::success::CATALOG_INDEXED,
            "Catalog indexed",
            duration = start.elapsed(),
            "resource" => resource,
            "entries" => table.len(),
            "skipped" => table.skipped.len()
        );
        Ok(table)
    }
}

/// Sorted data files under `dir`, without org markers and schemas.
///
/// Entries below `dir` that cannot be read are skipped with a warning; only an
/// unreadable `dir` fails the walk.
pub(super) fn walk_files(dir: &Path) -> Result<Vec<PathBuf>, CatalogError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .follow_links(true)
        .max_depth(MAX_CATALOG_DEPTH)
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(CatalogError::Walk {
                    path: dir.display().to_string(),
                    message: e.to_string(),
                })
            }
            Err(e) => {
                log_warning!(
                    code = codes::catalog::WALK_ERROR,
                    "Skipping unreadable catalog entry",
                    "path" => e.path().map_or_else(|| dir.display().to_string(), |p| p.display().to_string()),
                    "error" => e
                );
                continue;
            }
        };
        if !entry.file_type().is_file() || !is_catalog_data(entry.path()) {
            continue;
        }

        files.push(entry.into_path());
        if files.len() >= MAX_CATALOG_FILES {
            log_warning!(
                "Reached maximum catalog file limit",
                "directory" => dir.display(),
                "limit" => MAX_CATALOG_FILES
            );
            break;
        }
    }

    files.sort();
    log_debug!("Catalog walked", "directory" => dir.display(), "files" => files.len());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn catalog(names: &[&str]) -> TempDir {
        let dir = tempdir().unwrap();
        let processed = dir.path().join("processed");
        fs::create_dir_all(&processed).unwrap();
        for name in names {
            fs::write(processed.join(name), "<DISASTIG/>").unwrap();
        }
        dir
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_entry_is_skipped() {
        let dir = catalog(&["WindowsServer-2019-MS-1.5.xml"]);
        let processed = dir.path().join("processed");
        std::os::unix::fs::symlink(
            dir.path().join("gone.xml"),
            processed.join("WindowsServer-2019-MS-2.1.xml"),
        )
        .unwrap();

        let files = walk_files(&processed).unwrap();
        assert_eq!(files, [processed.join("WindowsServer-2019-MS-1.5.xml")]);

        assert_matches!(
            walk_files(&dir.path().join("missing")),
            Err(CatalogError::Walk { .. })
        );
    }

    #[test]
    fn test_build_version_table() {
        let dir = catalog(&[
            "WindowsServer-2019-MS-1.5.xml",
            "WindowsServer-2019-MS-2.1.xml",
            "WindowsServer-2019-DC-2.1.xml",
            "WindowsServer-2019-MS-2.1.org.default.xml",
            "WindowsServer-2019.xml",
            "WindowsClient-10-1.9-extra.xml",
            "WindowsServer-2016-MS-1.9.ps1",
        ]);
        let index = CatalogIndex::new(dir.path()).unwrap();
        let table = index.build_version_table("WindowsServer", None).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.skipped.len(), 1);
        assert_eq!(table.entries[0].technology_role, "DC");

        let ms = table.valid_versions_for_role("MS").unwrap();
        assert_eq!(ms.into_iter().collect::<Vec<_>>(), ["1.5", "2.1"]);
        assert_eq!(table.valid_versions_for_role("ms|dc").unwrap().len(), 2);
        assert!(table.valid_versions_for_role("M").unwrap().is_empty());
    }

    #[test]
    fn test_version_filter() {
        let dir = catalog(&[
            "WindowsServer-2016-MS-1.9.xml",
            "WindowsServer-2019-MS-1.5.xml",
        ]);
        let index = CatalogIndex::new(dir.path()).unwrap();

        let table = index.build_version_table("windowsserver", Some("-2019-")).unwrap();
        assert_eq!(table.technology_versions().into_iter().collect::<Vec<_>>(), ["2019"]);

        assert_matches!(
            index.build_version_table("WindowsServer", Some("(")),
            Err(CatalogError::InvalidFilter { .. })
        );
    }

    #[test]
    fn test_configuration_errors() {
        assert_matches!(
            CatalogIndex::new("/nonexistent/catalog"),
            Err(CatalogError::RootNotFound { .. })
        );

        let dir = catalog(&[]);
        let index = CatalogIndex::new(dir.path()).unwrap();
        assert_matches!(
            index.build_version_table("Toaster", None),
            Err(CatalogError::UnknownResource { resource, .. }) if resource == "Toaster"
        );

        let custom = index.with_processed_dir("converted");
        assert_matches!(
            custom.build_version_table("WindowsServer", None),
            Err(CatalogError::RootNotFound { path }) if path.ends_with("converted")
        );
    }

    #[test]
    fn test_list_is_sorted_and_filtered() {
        let dir = catalog(&["b-1-MS-1.xml", "a-1-MS-1.xml", "a-1-MS-1.org.default.xml"]);
        fs::write(dir.path().join("U_XCCDF.xsd"), "<xs:schema/>").unwrap();

        let files = CatalogIndex::new(dir.path()).unwrap().list().unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, ["a-1-MS-1.xml", "b-1-MS-1.xml"]);
    }
}
