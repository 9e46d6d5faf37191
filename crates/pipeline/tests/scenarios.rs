//! End-to-end pipeline scenarios over the real inference engine

use fallback::{OverridePolicy, RuleOverrideEngine};
use inference_engine::{ArtifactBundle, Classifier, InferenceEngine, InferenceError, LabelEncoder, StandardScaler};
use ndarray::Array2;
use pipeline::{ErrorKind, PipelineError, PredictionPipeline};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const COLUMNS: [&str; 8] = [
    "Rotational_Speed_RPM",
    "Torque_Nm",
    "Vibration_X_mm_s",
    "Vibration_Y_mm_s",
    "Vibration_Z_mm_s",
    "Temperature_C",
    "Pressure_bar",
    "Flow_Rate_LPM",
];

const CLASSES: [&str; 5] = ["Bearing Fault", "Cavitation", "Imbalance", "Misalignment", "Normal"];

/// Encodes the class in the temperature reading: 70 Normal, 71 Imbalance, 72 Cavitation
struct ByTemperature {
    column: usize,
    calls: Arc<AtomicUsize>,
}

impl Classifier for ByTemperature {
    fn predict(&self, scaled: &Array2<f64>) -> Result<Vec<i64>, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(scaled
            .rows()
            .into_iter()
            .map(|r| match r[self.column].round() as i64 {
                71 => 2,
                72 => 1,
                _ => 4,
            })
            .collect())
    }
}

/// Feature list in trainer order (lexicographic over all 14 columns)
fn trained_features() -> Vec<String> {
    let mut names: Vec<String> = COLUMNS
        .iter()
        .chain(["Vibration_Mean", "Vibration_Std", "Vibration_Range", "Flow_to_Pressure", "Torque_RPM", "Temp_Pressure"].iter())
        .map(|s| s.to_string())
        .collect();
    names.sort();
    names
}

fn engine(name: &str, calls: Arc<AtomicUsize>) -> Arc<InferenceEngine> {
    let features = trained_features();
    let column = features.iter().position(|f| f == "Temperature_C").unwrap();
    let n = features.len();
    let bundle = ArtifactBundle::new(
        name,
        StandardScaler::new(vec![0.0; n], vec![1.0; n]).unwrap(),
        Box::new(ByTemperature { column, calls }),
        features,
        LabelEncoder::new(CLASSES.iter().map(|s| s.to_string()).collect()).unwrap(),
    )
    .unwrap();
    Arc::new(InferenceEngine::new(Arc::new(bundle)))
}

struct Harness {
    pipeline: PredictionPipeline,
    production_calls: Arc<AtomicUsize>,
    simulator_calls: Arc<AtomicUsize>,
}

fn harness(policy: OverridePolicy) -> Harness {
    let production_calls = Arc::new(AtomicUsize::new(0));
    let simulator_calls = Arc::new(AtomicUsize::new(0));
    let pipeline = PredictionPipeline::new(
        engine("production", production_calls.clone()),
        engine("simulator", simulator_calls.clone()),
        RuleOverrideEngine::with_policy(policy),
    );
    Harness {
        pipeline,
        production_calls,
        simulator_calls,
    }
}

/// Healthy readings except for temperature
fn reading(temperature: f64) -> [f64; 8] {
    [1500.0, 40.0, 2.0, 2.1, 2.2, temperature, 5.0, 200.0]
}

fn upload(header: &[&str], rows: &[[f64; 8]]) -> Vec<u8> {
    let order: Vec<usize> = header
        .iter()
        .map(|h| COLUMNS.iter().position(|c| c == h).unwrap())
        .collect();
    let mut out = header.join(",");
    out.push('\n');
    for row in rows {
        let cells: Vec<String> = order.iter().map(|i| row[*i].to_string()).collect();
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    out.into_bytes()
}

#[test]
fn hundred_rows_summarized_exactly() {
    let h = harness(OverridePolicy::PerBatch);
    let rows: Vec<[f64; 8]> = (0..100)
        .map(|i| match i % 20 {
            0..=11 => reading(70.0),
            12..=16 => reading(71.0),
            _ => reading(72.0),
        })
        .collect();

    let outcome = h.pipeline.predict(&upload(&COLUMNS, &rows)).unwrap();
    let s = &outcome.summary;
    assert_eq!(s.total_records, 100);
    assert_eq!(s.summary["Normal"], 60);
    assert_eq!(s.summary["Imbalance"], 25);
    assert_eq!(s.summary["Cavitation"], 15);
    assert_eq!(s.summary.len(), 3);
    assert_eq!(s.unique_faults, vec!["Normal", "Imbalance", "Cavitation"]);

    // Synthetic hourly timestamps keep every row in the trend
    assert_eq!(s.trend.len(), 100);
    assert_eq!(outcome.maintenance[0].fault_type, "Imbalance");
    assert_eq!(h.production_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn input_column_order_does_not_matter() {
    let h = harness(OverridePolicy::PerBatch);
    let rows = [reading(70.0), reading(71.0), reading(72.0)];
    let mut shuffled = COLUMNS;
    shuffled.reverse();
    shuffled.swap(0, 3);

    let canonical = h.pipeline.predict(&upload(&COLUMNS, &rows)).unwrap();
    let reordered = h.pipeline.predict(&upload(&shuffled, &rows)).unwrap();
    assert_eq!(canonical.labels, vec!["Normal", "Imbalance", "Cavitation"]);
    assert_eq!(canonical.labels, reordered.labels);
}

#[test]
fn normal_temperatures_fall_back_to_model() {
    let h = harness(OverridePolicy::PerBatch);
    let rows = [reading(60.0), reading(65.0), reading(70.0)];
    let outcome = h.pipeline.simulate(&upload(&COLUMNS, &rows)).unwrap();
    assert_eq!(outcome.labels, vec!["Normal"; 3]);
    assert!(outcome.model_invoked);
    assert_eq!(h.simulator_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.production_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn first_row_rules_label_whole_batch() {
    let h = harness(OverridePolicy::PerBatch);
    let mut first = reading(95.0);
    first[6] = 9.0;
    let rows = [first, reading(71.0), reading(72.0)];
    let outcome = h.pipeline.simulate(&upload(&COLUMNS, &rows)).unwrap();
    assert_eq!(outcome.labels, vec!["Cavitation, Misalignment"; 3]);
    assert_eq!(outcome.summary.summary["Cavitation, Misalignment"], 3);
    assert_eq!(h.simulator_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn per_row_policy_mixes_rules_and_model() {
    let h = harness(OverridePolicy::PerRow);
    let rows = [reading(95.0), reading(71.0)];
    let outcome = h.pipeline.simulate(&upload(&COLUMNS, &rows)).unwrap();
    assert_eq!(outcome.labels, vec!["Cavitation", "Imbalance"]);
    assert_eq!(outcome.overridden_rows, 1);
    assert_eq!(h.simulator_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn missing_pressure_rejected_before_inference() {
    let h = harness(OverridePolicy::PerBatch);
    let header: Vec<&str> = COLUMNS.iter().copied().filter(|c| *c != "Pressure_bar").collect();
    let body = "1500,40,2,2,2,70,200\n";
    let bytes = format!("{}\n{}", header.join(","), body).into_bytes();

    let err = h.pipeline.predict(&bytes).unwrap_err();
    assert_eq!(err, PipelineError::MissingColumns(vec!["Pressure_bar".to_string()]));
    assert_eq!(err.kind(), ErrorKind::MissingColumns);
    assert_eq!(err.missing().unwrap(), ["Pressure_bar".to_string()]);
    assert_eq!(h.production_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn imputed_cells_reach_annotated_output() {
    let h = harness(OverridePolicy::PerBatch);
    let bytes = format!(
        "Timestamp,{}\n2024-06-01 08:00:00,1500,40,2,2,2,70,5,200\n2024-06-01 09:00:00,1500,,2,2,2,70,5,200\n",
        COLUMNS.join(",")
    );
    let outcome = h.pipeline.predict(bytes.as_bytes()).unwrap();
    assert_eq!(outcome.features.rows[1].sensor.torque_nm, 40.0);

    let csv = String::from_utf8(outcome.annotated_csv().unwrap()).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert!(lines[0].starts_with("Timestamp,Rotational_Speed_RPM"));
    assert!(lines[0].ends_with("Fault_Type"));
    assert!(lines[2].starts_with("2024-06-01 09:00:00,1500,40,"));
    assert!(lines[2].ends_with(",Normal"));

    let (start, end) = outcome.summary.window().unwrap();
    assert!(start < end);
}
