//! Shared foundation for the STIG tooling: logging, configuration, file reading,
//! and static analysis of DSC resource scripts.

pub mod config;
pub mod file_processor;
pub mod lexical;
#[macro_use]
pub mod logging;
pub mod metadata;
pub mod syntax;
pub mod tokens;
pub mod utils;

pub use metadata::{MetadataError, MetadataExtractor, ResourceMetadata};
pub use syntax::{ScriptBlockAst, SyntaxError};

/// Validate the registries every module depends on; call once at startup
pub fn init() -> Result<(), String> {
    logging::init_global_logging()?;
    file_processor::init_file_processor_logging()?;
    lexical::init_lexical_analysis_logging()?;
    syntax::init_syntax_logging()?;
    Ok(())
}

/// [`init`] with logging preferences taken from a loaded configuration file
pub fn init_with_config(config: &config::runtime::RuntimeConfig) -> Result<(), String> {
    logging::config::install_preferences(config.logging.clone())?;
    init()
}
