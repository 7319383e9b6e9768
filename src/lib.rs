pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{cli::LocalStorage, CliConfig};

pub use config::rubric_map::RubricMap;
pub use core::{etl::EtlEngine, pipeline::ReceiptPipeline};
pub use domain::model::{
    BeneficiaryRecord, DocumentOutcome, EmployerIdentity, SchemaVariant, TransformResult,
    ValidationReport,
};
pub use utils::error::{EtlError, Result};
