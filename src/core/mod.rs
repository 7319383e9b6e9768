pub mod consolidate;
pub mod cpf;
pub mod detector;
pub mod etl;
pub mod extract;
pub mod pipeline;
pub mod validator;

pub use crate::domain::model::{
    BeneficiaryRecord, DocumentOutcome, EmployerIdentity, SchemaVariant, SourceDocument,
    TransformResult, ValidationReport,
};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
