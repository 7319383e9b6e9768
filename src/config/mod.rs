#[cfg(feature = "cli")]
pub mod cli;
pub mod rubric_map;

#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{
    validate_file_extensions, validate_non_empty_list, validate_path, Validate,
};
#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "esocial-etl")]
#[command(about = "Builds income-tax withholding receipt data from eSocial S-1210 payment events")]
pub struct CliConfig {
    /// S-1210 XML documents to process
    #[arg(required = true)]
    pub inputs: Vec<String>,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    /// TOML override for the rubric classification table
    #[arg(long)]
    pub rubric_map: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Enable system monitoring")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn input_files(&self) -> &[String] {
        &self.inputs
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn rubric_map_path(&self) -> Option<&str> {
        self.rubric_map.as_deref()
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_list("inputs", &self.inputs)?;
        validate_file_extensions("inputs", &self.inputs, &["xml"])?;
        validate_path("output_path", &self.output_path)?;
        if let Some(path) = &self.rubric_map {
            validate_path("rubric_map", path)?;
        }
        Ok(())
    }
}
