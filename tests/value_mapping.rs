use std::sync::{Arc, Mutex};

use rust_data_transforms::transform::{
    Diagnostic, DiagnosticSeverity, FileObserver, MismatchKind, MismatchPolicy, Step, StepObserver, ValueMapper,
};
use rust_data_transforms::types::{DataSet, DataType, Field, Schema, Value};
use rust_data_transforms::TransformError;

#[derive(Default)]
struct RecordingObserver {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl RecordingObserver {
    fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.diagnostics.lock().unwrap())
    }
}

impl StepObserver for RecordingObserver {
    fn on_diagnostic(&self, diagnostic: &Diagnostic) {
        self.diagnostics.lock().unwrap().push(diagnostic.clone());
    }
}

fn shirts() -> DataSet {
    let schema = Schema::new(vec![
        Field::new("sku", DataType::Utf8),
        Field::new("size", DataType::Utf8),
        Field::new("price", DataType::Float64),
    ]);
    DataSet::new(
        schema,
        vec![
            vec![Value::from("a-1"), Value::from("S"), Value::Float64(9.5)],
            vec![Value::from("a-2"), Value::from("M"), Value::Float64(10.0)],
            vec![Value::from("a-3"), Value::from("L"), Value::Null],
            vec![Value::from("a-4"), Value::Null, Value::Float64(12.0)],
        ],
    )
}

#[test]
fn size_scenario_maps_and_reports_only_the_null() {
    let obs = Arc::new(RecordingObserver::default());
    let mapper = ValueMapper::new("size", [("S", 1_i64), ("M", 2), ("L", 3)])
        .unwrap()
        .with_observer(obs.clone());
    let input = shirts();

    let out = mapper.transform(&input).unwrap();

    assert_eq!(
        out.column_values(1).cloned().collect::<Vec<_>>(),
        vec![Value::Int64(1), Value::Int64(2), Value::Int64(3), Value::Null]
    );
    assert_eq!(
        obs.take(),
        vec![Diagnostic::Mismatch {
            step: "ValueMapper",
            column: "size".to_string(),
            kind: MismatchKind::ValuesUnmapped,
            values: vec![Value::Null],
        }]
    );

    // Other columns and the input are untouched.
    assert_eq!(out.column_values(2).collect::<Vec<_>>(), input.column_values(2).collect::<Vec<_>>());
    assert_eq!(input, shirts());
}

#[test]
fn many_nulls_are_reported_once() {
    let obs = Arc::new(RecordingObserver::default());
    let mut input = shirts();
    for row in &mut input.rows {
        row[1] = Value::Null;
    }
    let mapper = ValueMapper::new("size", [("S", 1_i64)])
        .unwrap()
        .with_observer(obs.clone());

    mapper.transform(&input).unwrap();

    let diagnostics = obs.take();
    assert_eq!(diagnostics.len(), 2);
    assert!(diagnostics.iter().all(|d| d.severity() == DiagnosticSeverity::Warning));
    assert!(diagnostics.contains(&Diagnostic::Mismatch {
        step: "ValueMapper",
        column: "size".to_string(),
        kind: MismatchKind::ValuesUnmapped,
        values: vec![Value::Null],
    }));
    assert!(diagnostics.contains(&Diagnostic::Mismatch {
        step: "ValueMapper",
        column: "size".to_string(),
        kind: MismatchKind::KeysNotFound,
        values: vec![Value::from("S")],
    }));
}

#[test]
fn float_column_nulls_and_nan_stay_distinct() {
    let obs = Arc::new(RecordingObserver::default());
    let schema = Schema::new(vec![Field::new("x", DataType::Float64)]);
    let input = DataSet::new(
        schema,
        vec![
            vec![Value::Float64(f64::NAN)],
            vec![Value::Null],
            vec![Value::Float64(0.0)],
        ],
    );
    let mapper = ValueMapper::new(
        "x",
        [
            (Value::Null, Value::Float64(-1.0)),
            (Value::Float64(-0.0), Value::Float64(1.0)),
        ],
    )
    .unwrap()
    .with_observer(obs.clone());

    let out = mapper.transform(&input).unwrap();

    assert!(matches!(out.rows[0][0], Value::Float64(v) if v.is_nan()));
    assert_eq!(out.rows[1][0], Value::Float64(-1.0));
    assert_eq!(out.rows[2][0], Value::Float64(1.0));
    let diagnostics = obs.take();
    assert_eq!(diagnostics.len(), 1);
    assert!(matches!(
        &diagnostics[0],
        Diagnostic::Mismatch { kind: MismatchKind::ValuesUnmapped, values, .. }
            if matches!(values.as_slice(), [Value::Float64(v)] if v.is_nan())
    ));
}

#[test]
fn strict_keys_policy_rejects_typos() {
    let mapper = ValueMapper::new("size", [("S", 1_i64), ("M", 2), ("LL", 3), ("null", 0)])
        .unwrap()
        .on_keys_not_found(MismatchPolicy::Error);

    let err = mapper.transform(&shirts()).unwrap_err();
    match err {
        TransformError::MappingMismatch { kind, values, .. } => {
            assert_eq!(kind, MismatchKind::KeysNotFound);
            // The string "null" is not the null marker.
            assert_eq!(values, vec![Value::from("LL"), Value::from("null")]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn malformed_dataset_is_rejected_before_mapping() {
    let mut input = shirts();
    input.rows[2].truncate(1);
    let err = ValueMapper::new("size", [("S", 1_i64)])
        .unwrap()
        .transform(&input)
        .unwrap_err();
    assert!(matches!(err, TransformError::MalformedDataSet { .. }));
}

#[test]
fn file_observer_appends_diagnostics() {
    let path = std::env::temp_dir().join(format!("value_mapping_diag_{}.log", std::process::id()));
    let _ = std::fs::remove_file(&path);

    let mapper = ValueMapper::new("size", [("XL", 4_i64)])
        .unwrap()
        .with_observer(Arc::new(FileObserver::new(&path)));
    mapper.fit(&shirts(), None).transform(&shirts()).unwrap();

    let log = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("severity=Info step=ValueMapper ValueMapper.fit does nothing"));
    assert!(lines[1].contains(r#"these mapping keys do not appear in the column: {"XL"}"#));
    assert!(lines[2].contains(r#"do not contain corresponding mapping keys: {null, "L", "M", "S"}"#));
    let _ = std::fs::remove_file(&path);
}
