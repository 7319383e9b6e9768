use esocial_etl::utils::validation::Validate;
use esocial_etl::{CliConfig, EtlEngine, LocalStorage, ReceiptPipeline};
use tempfile::TempDir;

const LEGACY_DOC: &str = r#"<eSocial xmlns="http://www.esocial.gov.br/schema/evt/evtPgtos/v02_05_00">
    <evtPgtos Id="ID1">
        <ideEvento><perApur>2023-05</perApur></ideEvento>
        <ideEmpregador><tpInsc>1</tpInsc><nrInsc>12345678000195</nrInsc></ideEmpregador>
        <ideBenef><cpfBenef>52998224725</cpfBenef><nmBenef>Maria da Silva</nmBenef></ideBenef>
        <infoPgto><detPgtoFl>
            <detRubrFl><tpRubr>1</tpRubr><codRubr>SALARIO</codRubr><vrRubr>1000.00</vrRubr></detRubrFl>
            <detRubrFl><tpRubr>2</tpRubr><codRubr>INSS</codRubr><vrRubr>90.00</vrRubr></detRubrFl>
        </detPgtoFl></infoPgto>
    </evtPgtos>
</eSocial>"#;

const CURRENT_DOC: &str = r#"<eSocial xmlns="http://www.esocial.gov.br/schema/evt/evtIrrfBenef/v_S_01_00_00">
    <evtIrrfBenef Id="ID2">
        <ideEvento><perApur>2023-11</perApur></ideEvento>
        <ideEmpregador><tpInsc>1</tpInsc><nrInsc>12345678000195</nrInsc></ideEmpregador>
        <ideBenef><cpfBenef>52998224725</cpfBenef><nmBenef>Maria da Silva</nmBenef></ideBenef>
        <demonstrativo>
            <itemRend><tpInfo>011</tpInfo><codRubr>SALARIO</codRubr><vrItem>1500.00</vrItem></itemRend>
            <itemRend><tpInfo>061</tpInfo><codRubr>IRRF</codRubr><vrItem>-45.00</vrItem></itemRend>
        </demonstrativo>
        <infoPgto>
            <detPgto><tpValor>3</tpValor><vrPgto>45.00</vrPgto></detPgto>
        </infoPgto>
    </evtIrrfBenef>
</eSocial>"#;

const NO_EMPLOYER_DOC: &str = r#"<eSocial>
    <evtPgtos>
        <ideEvento><perApur>2023-05</perApur></ideEvento>
        <ideEmpregador><tpInsc>1</tpInsc></ideEmpregador>
        <ideBenef><cpfBenef>52998224725</cpfBenef></ideBenef>
    </evtPgtos>
</eSocial>"#;

struct Workspace {
    _input_dir: TempDir,
    _output_dir: TempDir,
    config: CliConfig,
}

fn workspace(docs: &[(&str, &str)]) -> Workspace {
    let input_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();

    let mut inputs = Vec::new();
    for (name, content) in docs {
        let path = input_dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        inputs.push(path.to_str().unwrap().to_string());
    }

    let config = CliConfig {
        inputs,
        output_path: output_dir.path().to_str().unwrap().to_string(),
        rubric_map: None,
        verbose: false,
        monitor: false,
    };

    Workspace {
        _input_dir: input_dir,
        _output_dir: output_dir,
        config,
    }
}

async fn run(ws: &Workspace) -> String {
    let storage = LocalStorage::new(ws.config.output_path.clone());
    let pipeline = ReceiptPipeline::new(storage, ws.config.clone()).unwrap();
    let engine = EtlEngine::new(pipeline);
    engine.run().await.unwrap()
}

fn read_report(ws: &Workspace) -> serde_json::Value {
    let path = std::path::Path::new(&ws.config.output_path).join("informe.json");
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}

#[tokio::test]
async fn test_end_to_end_batch_across_variants() {
    let ws = workspace(&[("may.xml", LEGACY_DOC), ("nov.xml", CURRENT_DOC)]);

    assert!(ws.config.validate().is_ok());
    let output = run(&ws).await;
    assert!(output.ends_with("informe.json"));

    let report = read_report(&ws);

    // Both documents accepted, one consolidated beneficiary.
    assert_eq!(report["outcomes"].as_array().unwrap().len(), 2);
    assert_eq!(report["consolidated"].as_array().unwrap().len(), 1);

    let record = &report["consolidated"][0];
    assert_eq!(record["cpf"], "52998224725");
    assert_eq!(record["calendar_year"], "2023");
    // Amounts from distinct documents are additive: 1000 + 1500.
    assert_eq!(record["taxable_income"], "2500.00");
    assert_eq!(record["social_security_contribution"], "90.00");
    assert_eq!(record["withholding_tax"], "45.00");

    let employer = &report["outcomes"][0]["employer"];
    assert_eq!(employer["tax_id"], "12345678000195");
    assert_eq!(employer["kind"], "Cnpj");
}

#[tokio::test]
async fn test_csv_artifact_written_alongside_json() {
    let ws = workspace(&[("may.xml", LEGACY_DOC)]);
    run(&ws).await;

    let csv_path = std::path::Path::new(&ws.config.output_path).join("informe.csv");
    let csv_text = std::fs::read_to_string(csv_path).unwrap();

    let mut lines = csv_text.lines();
    let header = lines.next().unwrap();
    assert!(header.starts_with("cpf,name,calendar_year"));
    let row = lines.next().unwrap();
    assert!(row.starts_with("52998224725,Maria da Silva,2023"));
}

#[tokio::test]
async fn test_invalid_document_reported_batch_continues() {
    let ws = workspace(&[("bad.xml", NO_EMPLOYER_DOC), ("good.xml", CURRENT_DOC)]);
    run(&ws).await;

    let report = read_report(&ws);
    let outcomes = report["outcomes"].as_array().unwrap();
    assert_eq!(outcomes.len(), 2);

    let bad = &outcomes[0];
    assert_eq!(bad["report"]["valid"], false);
    let errors = bad["report"]["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].as_str().unwrap().contains("nrInsc"));
    assert!(bad["records"].as_array().unwrap().is_empty());

    let good = &outcomes[1];
    assert_eq!(good["report"]["valid"], true);
    assert_eq!(good["records"].as_array().unwrap().len(), 1);

    assert_eq!(report["consolidated"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_rubric_map_override_from_toml() {
    let ws = workspace(&[("may.xml", LEGACY_DOC)]);

    // Reroute the SALARIO rubric to exempt income via a custom table.
    let map_path = ws._input_dir.path().join("rubricas.toml");
    std::fs::write(
        &map_path,
        r#"
            [exact]
            "SALARIO" = "exempt-income"
        "#,
    )
    .unwrap();

    let mut config = ws.config.clone();
    config.rubric_map = Some(map_path.to_str().unwrap().to_string());

    let storage = LocalStorage::new(config.output_path.clone());
    let pipeline = ReceiptPipeline::new(storage, config).unwrap();
    let engine = EtlEngine::new(pipeline);
    engine.run().await.unwrap();

    let report = read_report(&ws);
    let record = &report["consolidated"][0];
    assert_eq!(record["exempt_income"], "1000.00");
    assert_eq!(record["taxable_income"], "0");
}
