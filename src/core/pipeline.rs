use crate::config::rubric_map::RubricMap;
use crate::core::{consolidate, detector, extract, validator};
use crate::domain::model::{
    DocumentOutcome, SchemaVariant, SourceDocument, TransformResult, ValidationReport,
};
use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::utils::error::{EtlError, Result};
use std::path::Path;

/// Batch pipeline: read S-1210 documents, extract and classify per
/// document, consolidate across the batch, write the receipt artifacts.
pub struct ReceiptPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    rubric_map: RubricMap,
}

impl<S: Storage, C: ConfigProvider> ReceiptPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Result<Self> {
        let rubric_map = match config.rubric_map_path() {
            Some(path) => {
                tracing::debug!("Loading rubric map from {}", path);
                RubricMap::from_file(path)?
            }
            None => RubricMap::default(),
        };

        Ok(Self {
            storage,
            config,
            rubric_map,
        })
    }

    /// Runs one document through validate -> detect -> extract. Every
    /// failure mode lands in the outcome's report; a document is never
    /// silently dropped and never aborts the batch.
    fn process_document(&self, doc: &SourceDocument) -> DocumentOutcome {
        let parsed = match roxmltree::Document::parse(&doc.xml) {
            Ok(parsed) => parsed,
            Err(e) => {
                return DocumentOutcome {
                    source: doc.name.clone(),
                    variant: SchemaVariant::Unknown,
                    employer: None,
                    report: ValidationReport::from_errors(vec![format!("XML parse error: {}", e)]),
                    records: Vec::new(),
                }
            }
        };

        let mut report = validator::validate_document(&parsed);
        let variant = detector::detect(&parsed);

        if variant == SchemaVariant::Unknown {
            return DocumentOutcome {
                source: doc.name.clone(),
                variant,
                employer: None,
                report,
                records: Vec::new(),
            };
        }

        let employer = match extract::employer_identity(&parsed) {
            Ok(employer) => Some(employer),
            Err(e) => {
                // The validator normally reports this already; documents
                // without an employer are excluded from extraction.
                if report.valid {
                    report.record_error(e.to_string());
                }
                return DocumentOutcome {
                    source: doc.name.clone(),
                    variant,
                    employer: None,
                    report,
                    records: Vec::new(),
                };
            }
        };

        let extracted = match variant {
            SchemaVariant::VariantA => extract::extract_variant_a(&parsed, &self.rubric_map),
            SchemaVariant::VariantB => extract::extract_variant_b(&parsed, &self.rubric_map),
            SchemaVariant::Unknown => Ok(Vec::new()),
        };

        let records = match extracted {
            Ok(records) => records,
            Err(e) => {
                report.record_error(e.to_string());
                Vec::new()
            }
        };

        DocumentOutcome {
            source: doc.name.clone(),
            variant,
            employer,
            report,
            records,
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ReceiptPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<SourceDocument>> {
        let mut docs = Vec::new();

        for path in self.config.input_files() {
            tracing::debug!("Reading {}", path);
            let bytes = self.storage.read_file(path).await?;
            let xml = String::from_utf8(bytes).map_err(|e| EtlError::ProcessingError {
                message: format!("{}: not valid UTF-8 ({})", path, e),
            })?;

            let name = Path::new(path)
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.clone());

            docs.push(SourceDocument { name, xml });
        }

        Ok(docs)
    }

    async fn transform(&self, docs: Vec<SourceDocument>) -> Result<TransformResult> {
        let mut outcomes = Vec::new();
        for doc in &docs {
            let outcome = self.process_document(doc);
            if !outcome.report.valid {
                tracing::warn!(
                    "{}: {} validation error(s)",
                    outcome.source,
                    outcome.report.errors.len()
                );
            }
            outcomes.push(outcome);
        }

        // Single-threaded accumulation over the full collected list; no
        // interleaved merge.
        let all_records: Vec<_> = outcomes
            .iter()
            .flat_map(|o| o.records.iter().cloned())
            .collect();
        let consolidated = consolidate::consolidate(all_records);

        for record in &consolidated {
            if record.is_all_zero() {
                tracing::warn!(
                    "record for CPF {} year {} has no classified amounts",
                    record.cpf,
                    record.calendar_year
                );
            }
        }

        Ok(TransformResult {
            outcomes,
            consolidated,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let json = serde_json::to_string_pretty(&result)?;
        self.storage
            .write_file("informe.json", json.as_bytes())
            .await?;

        let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
        for record in &result.consolidated {
            writer.serialize(record)?;
        }
        let csv_bytes = writer
            .into_inner()
            .map_err(|e| EtlError::ProcessingError {
                message: format!("CSV buffer error: {}", e),
            })?;
        self.storage.write_file("informe.csv", &csv_bytes).await?;

        tracing::debug!(
            "Wrote {} consolidated record(s) from {} document(s)",
            result.consolidated.len(),
            result.outcomes.len()
        );

        Ok(format!("{}/informe.json", self.config.output_path()))
    }
}
