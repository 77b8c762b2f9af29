use etl_model::{
    Cell, CellValue, ColumnRule, ColumnSpec, CoercionFailure, DataType, FailureKind,
    NormalizedRecord, RawRecord, ResolvedColumn, Verdict,
};
use etl_transform::Normalizer;
use etl_validate::{ValidationEngine, validate};
use proptest::prelude::*;

fn column(key: &str, name: &str, dtype: DataType) -> ResolvedColumn {
    ResolvedColumn {
        key: key.to_string(),
        name: name.to_string(),
        dtype,
        required: false,
        decimals: None,
        length: None,
        aliases: Vec::new(),
        rules: Vec::new(),
    }
}

fn acme_spec() -> ColumnSpec {
    let mut name = column("name", "Name", DataType::String);
    name.required = true;
    let mut email = column("email", "Email", DataType::String);
    email.rules.push(ColumnRule::Email);
    ColumnSpec::new(
        "acme",
        vec![name, email, column("vat", "VAT ID", DataType::String)],
    )
}

#[test]
fn bad_email_rejects_with_single_email_failure() {
    let spec = acme_spec();
    let raw = RawRecord::new(2)
        .with("name", "ACME OY")
        .with("email", "bad@@x")
        .with("vat", "");
    let record = Normalizer::new(&spec).normalize(&raw);
    let outcome = validate(&record, &spec);

    assert_eq!(outcome.verdict, Verdict::Rejected);
    assert_eq!(outcome.failures.len(), 1);
    let failure = &outcome.failures[0];
    assert_eq!(failure.column, "email");
    assert_eq!(failure.kind, FailureKind::Rule);
    assert_eq!(failure.rule.as_deref(), Some("email"));
}

#[test]
fn failures_accumulate_across_columns_in_spec_order() {
    let mut spec_columns = acme_spec().columns().to_vec();
    let mut amount = column("amount", "Amount", DataType::Float);
    amount.rules.push(ColumnRule::NonNegative);
    spec_columns.push(amount);
    let mut code = column("code", "Code", DataType::String);
    code.rules.push(ColumnRule::Pattern(regex::Regex::new("^FI[0-9]+$").unwrap()));
    code.rules.push(ColumnRule::MaxLength(4));
    spec_columns.push(code);
    let spec = ColumnSpec::new("acme", spec_columns);

    let record = NormalizedRecord {
        line: 5,
        cells: vec![
            Cell {
                key: "name".to_string(),
                value: CellValue::Null,
            },
            Cell {
                key: "email".to_string(),
                value: CellValue::Text("nope".to_string()),
            },
            Cell {
                key: "amount".to_string(),
                value: CellValue::Float(-1.0),
            },
            Cell {
                key: "code".to_string(),
                value: CellValue::Text("SE12345".to_string()),
            },
        ],
    };
    let outcome = ValidationEngine::new(&spec).validate_row(4, &record);
    assert_eq!(outcome.row, 4);
    assert_eq!(outcome.line, 5);
    let summary: Vec<(&str, FailureKind, Option<&str>)> = outcome
        .failures
        .iter()
        .map(|f| (f.column.as_str(), f.kind, f.rule.as_deref()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("name", FailureKind::Missing, None),
            ("email", FailureKind::Rule, Some("email")),
            ("amount", FailureKind::Rule, Some("non_negative")),
            ("code", FailureKind::Rule, Some("pattern")),
            ("code", FailureKind::Rule, Some("max_length")),
        ]
    );
}

#[test]
fn invalid_cell_reports_only_type_failure() {
    let mut amount = column("amount", "Amount", DataType::Float);
    amount.required = true;
    amount.rules.push(ColumnRule::NonNegative);
    let spec = ColumnSpec::new("acme", vec![amount]);
    let record = NormalizedRecord {
        line: 2,
        cells: vec![Cell {
            key: "amount".to_string(),
            value: CellValue::Invalid(CoercionFailure {
                raw: "-x".to_string(),
                expected: DataType::Float,
            }),
        }],
    };
    let outcome = validate(&record, &spec);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].kind, FailureKind::Coercion);
}

#[test]
fn optional_null_passes_rules() {
    let spec = acme_spec();
    let raw = RawRecord::new(2).with("name", "Beta");
    let outcome = validate(&Normalizer::new(&spec).normalize(&raw), &spec);
    assert!(outcome.is_accepted());
    assert!(outcome.failures.is_empty());
}

fn email_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        "[a-z]{1,5}@[a-z]{1,5}\\.fi".prop_map(Some),
        "[a-z@ .]{0,8}".prop_map(Some),
    ]
}

proptest! {
    #[test]
    fn every_row_gets_one_consistent_outcome(
        rows in proptest::collection::vec(
            (proptest::option::of("[A-Za-z ]{0,6}"), email_strategy()),
            0..20,
        )
    ) {
        let spec = acme_spec();
        let normalizer = Normalizer::new(&spec);
        let records: Vec<NormalizedRecord> = rows
            .iter()
            .enumerate()
            .map(|(idx, (name, email))| {
                let mut raw = RawRecord::new(idx as u64 + 2);
                if let Some(name) = name {
                    raw.push("name", name.as_str());
                }
                if let Some(email) = email {
                    raw.push("email", email.as_str());
                }
                normalizer.normalize(&raw)
            })
            .collect();

        let report = ValidationEngine::new(&spec).validate_all(&records);
        prop_assert_eq!(report.outcomes.len(), rows.len());
        for (idx, outcome) in report.outcomes.iter().enumerate() {
            prop_assert_eq!(outcome.row, idx);
            prop_assert_eq!(outcome.is_accepted(), outcome.failures.is_empty());
        }
        prop_assert_eq!(report.accepted_count() + report.rejected_count(), rows.len());
    }
}
