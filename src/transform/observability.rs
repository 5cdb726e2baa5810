use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::Value;

/// Severity classification for diagnostics. Neither level interrupts a transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DiagnosticSeverity {
    /// Informational event.
    Info,
    /// Likely data or pipeline authoring mistake.
    Warning,
}

/// The two ways a value mapping and its target column can disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchKind {
    /// Mapping keys that never occur in the column.
    KeysNotFound,
    /// Column values with no mapping key; they pass through unchanged.
    ValuesUnmapped,
}

impl fmt::Display for MismatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MismatchKind::KeysNotFound => f.write_str("these mapping keys do not appear in the column"),
            MismatchKind::ValuesUnmapped => {
                f.write_str("these values in the column do not contain corresponding mapping keys")
            }
        }
    }
}

/// A non-fatal finding reported by a step.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// `fit` was called; steps learn nothing from data.
    FitIsNoOp { step: &'static str },
    /// A value mapping disagrees with the values actually present in its column.
    Mismatch {
        step: &'static str,
        column: String,
        kind: MismatchKind,
        /// Offending keys or values, in [`crate::types::ValueKey`] order.
        values: Vec<Value>,
    },
}

impl Diagnostic {
    /// Severity of this diagnostic.
    pub fn severity(&self) -> DiagnosticSeverity {
        match self {
            Diagnostic::FitIsNoOp { .. } => DiagnosticSeverity::Info,
            Diagnostic::Mismatch { .. } => DiagnosticSeverity::Warning,
        }
    }

    /// Name of the step that produced this diagnostic.
    pub fn step(&self) -> &'static str {
        match self {
            Diagnostic::FitIsNoOp { step } | Diagnostic::Mismatch { step, .. } => *step,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::FitIsNoOp { step } => write!(f, "{step}.fit does nothing"),
            Diagnostic::Mismatch {
                step,
                column,
                kind,
                values,
            } => write!(f, "{step}[{column}] {kind}: {}", ValueSet(values)),
        }
    }
}

/// Renders values as a set literal with strings quoted: `{null, 1, "1", "null"}`.
pub(crate) struct ValueSet<'a>(pub(crate) &'a [Value]);

impl fmt::Display for ValueSet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match v {
                Value::Utf8(s) => write!(f, "{s:?}")?,
                other => write!(f, "{other}")?,
            }
        }
        f.write_str("}")
    }
}

/// Observer interface for step diagnostics.
///
/// Implementors can record metrics, logs, or collect diagnostics for inspection.
pub trait StepObserver: Send + Sync {
    /// Called once per diagnostic, before the step returns.
    fn on_diagnostic(&self, diagnostic: &Diagnostic);
}

/// Observer used when a step is not given one explicitly.
pub fn default_observer() -> Arc<dyn StepObserver> {
    Arc::new(TracingObserver)
}

/// Emits diagnostics as `tracing` events: `Info` at info level, `Warning` at warn level.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl StepObserver for TracingObserver {
    fn on_diagnostic(&self, diagnostic: &Diagnostic) {
        match diagnostic {
            Diagnostic::FitIsNoOp { step } => {
                tracing::info!(step = %step, "fit does nothing; no state is learned");
            }
            Diagnostic::Mismatch {
                step,
                column,
                kind,
                values,
            } => {
                tracing::warn!(
                    step = %step,
                    column = %column,
                    kind = ?kind,
                    count = values.len(),
                    "{diagnostic}"
                );
            }
        }
    }
}

/// Discards every diagnostic.
#[derive(Debug, Default)]
pub struct NullObserver;

impl StepObserver for NullObserver {
    fn on_diagnostic(&self, _diagnostic: &Diagnostic) {}
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn StepObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn StepObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl StepObserver for CompositeObserver {
    fn on_diagnostic(&self, diagnostic: &Diagnostic) {
        for o in &self.observers {
            o.on_diagnostic(diagnostic);
        }
    }
}

/// Logs diagnostics to stderr.
#[derive(Debug, Default)]
pub struct StdErrObserver;

impl StepObserver for StdErrObserver {
    fn on_diagnostic(&self, diagnostic: &Diagnostic) {
        eprintln!("[transform][{:?}] {diagnostic}", diagnostic.severity());
    }
}

/// Appends diagnostics to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends diagnostics to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl StepObserver for FileObserver {
    fn on_diagnostic(&self, diagnostic: &Diagnostic) {
        self.append_line(&format!(
            "{} severity={:?} step={} {diagnostic}",
            unix_ts(),
            diagnostic.severity(),
            diagnostic.step(),
        ));
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tracing_subscriber::fmt::MakeWriter;

    use super::{CompositeObserver, Diagnostic, DiagnosticSeverity, MismatchKind, StepObserver, TracingObserver};
    use crate::types::Value;

    #[derive(Default)]
    struct Counter(Mutex<usize>);

    impl StepObserver for Counter {
        fn on_diagnostic(&self, _diagnostic: &Diagnostic) {
            *self.0.lock().unwrap() += 1;
        }
    }

    #[test]
    fn mismatch_display_lists_values() {
        let d = Diagnostic::Mismatch {
            step: "ValueMapper",
            column: "size".to_string(),
            kind: MismatchKind::ValuesUnmapped,
            values: vec![Value::Null, Value::from("XL")],
        };
        assert_eq!(d.severity(), DiagnosticSeverity::Warning);
        assert_eq!(
            d.to_string(),
            "ValueMapper[size] these values in the column do not contain corresponding mapping keys: {null, \"XL\"}"
        );
    }

    #[test]
    fn mismatch_display_keeps_types_apart() {
        let render = |values: Vec<Value>| {
            Diagnostic::Mismatch {
                step: "ValueMapper",
                column: "c".to_string(),
                kind: MismatchKind::KeysNotFound,
                values,
            }
            .to_string()
        };
        assert_ne!(render(vec![Value::Null]), render(vec![Value::from("null")]));
        assert_ne!(render(vec![Value::Int64(1)]), render(vec![Value::from("1")]));
        assert!(render(vec![Value::Null, Value::Int64(1), Value::from("1"), Value::from("null")])
            .ends_with(r#"{null, 1, "1", "null"}"#));
    }

    /// Buffer shared with a `tracing_subscriber::fmt` writer.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn tracing_observer_emits_leveled_events() {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_ansi(false)
            .without_time()
            .with_max_level(tracing::Level::INFO)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let observer = TracingObserver;
            observer.on_diagnostic(&Diagnostic::FitIsNoOp { step: "OneHotEncoder" });
            observer.on_diagnostic(&Diagnostic::Mismatch {
                step: "ValueMapper",
                column: "size".to_string(),
                kind: MismatchKind::KeysNotFound,
                values: vec![Value::from("XL")],
            });
        });

        let text = captured.text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("INFO"));
        assert!(lines[0].contains("step=OneHotEncoder"));
        assert!(lines[1].contains("WARN"));
        assert!(lines[1].contains(r#"these mapping keys do not appear in the column: {"XL"}"#));
        assert!(lines[1].contains("column=size"));
        assert!(lines[1].contains("kind=KeysNotFound"));
        assert!(lines[1].contains("count=1"));
    }

    #[test]
    fn composite_fans_out_to_every_observer() {
        let a = Arc::new(Counter::default());
        let b = Arc::new(Counter::default());
        let composite = CompositeObserver::new(vec![a.clone(), b.clone()]);
        composite.on_diagnostic(&Diagnostic::FitIsNoOp { step: "ColumnRenamer" });
        assert_eq!(*a.0.lock().unwrap(), 1);
        assert_eq!(*b.0.lock().unwrap(), 1);
    }
}
