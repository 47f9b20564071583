//! Benchmark Record Decoding
//!
//! Strict serde model of the Google Benchmark JSON document. Only the fields
//! benchviz relies on are modelled; everything else in the document is ignored.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while decoding benchmark output
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid benchmark JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("benchmark output is empty")]
    Empty,
}

/// Decoded benchmark document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkOutput {
    /// Host and build information reported by the benchmark library
    #[serde(default)]
    pub context: Option<BenchmarkContext>,
    /// Benchmark records in the order they were reported
    pub benchmarks: Vec<BenchmarkRecord>,
}

/// Execution context block emitted ahead of the results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkContext {
    /// Wall-clock date of the run
    #[serde(default)]
    pub date: Option<String>,
    /// Host that ran the benchmarks
    #[serde(default)]
    pub host_name: Option<String>,
    /// Path of the benchmark executable
    #[serde(default)]
    pub executable: Option<String>,
    /// Number of logical CPUs
    #[serde(default)]
    pub num_cpus: Option<u32>,
    /// CPU frequency in MHz
    #[serde(default)]
    pub mhz_per_cpu: Option<u64>,
    /// "debug" or "release"
    #[serde(default)]
    pub library_build_type: Option<String>,
}

/// One measured sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    /// `<group>/<case>` name
    pub name: String,
    /// Measured CPU time; unit-less at this layer
    pub cpu_time: f64,
    /// "iteration" or "aggregate"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_type: Option<String>,
    /// Unit of `cpu_time` as reported ("ns", "us", "ms", "s")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_unit: Option<String>,
}

impl BenchmarkRecord {
    /// Build a record from a name and measurement
    pub fn new(name: impl Into<String>, cpu_time: f64) -> Self {
        Self {
            name: name.into(),
            cpu_time,
            run_type: None,
            time_unit: None,
        }
    }
}

/// Decode raw benchmark output.
///
/// Fails on malformed JSON, a missing `benchmarks` array, records without
/// `name`/`cpu_time`, or a non-numeric `cpu_time`. No partial result is returned.
pub fn decode_records(bytes: &[u8]) -> Result<BenchmarkOutput, DecodeError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(DecodeError::Empty);
    }

    let output: BenchmarkOutput = serde_json::from_slice(bytes)?;
    tracing::debug!(records = output.benchmarks.len(), "decoded benchmark output");
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_google_benchmark_document() {
        let json = br#"{
            "context": {
                "date": "2023-01-10T21:14:07+07:00",
                "host_name": "devbox",
                "executable": "./kv_benchmark",
                "num_cpus": 8,
                "mhz_per_cpu": 2400,
                "cpu_scaling_enabled": false,
                "library_build_type": "debug"
            },
            "benchmarks": [
                {
                    "name": "kv_flat_map/100",
                    "family_index": 0,
                    "run_type": "iteration",
                    "iterations": 2851,
                    "real_time": 0.2455,
                    "cpu_time": 0.2448,
                    "time_unit": "ms"
                }
            ]
        }"#;

        let output = decode_records(json).unwrap();
        let context = output.context.unwrap();
        assert_eq!(context.host_name.as_deref(), Some("devbox"));
        assert_eq!(context.num_cpus, Some(8));
        assert_eq!(output.benchmarks.len(), 1);
        let record = &output.benchmarks[0];
        assert_eq!(record.name, "kv_flat_map/100");
        assert!((record.cpu_time - 0.2448).abs() < f64::EPSILON);
        assert_eq!(record.time_unit.as_deref(), Some("ms"));
    }

    #[test]
    fn test_non_numeric_cpu_time_fails() {
        let json = br#"{"benchmarks": [{"name": "insert/100", "cpu_time": "fast"}]}"#;
        assert!(matches!(decode_records(json), Err(DecodeError::Json(_))));
    }

    #[test]
    fn test_missing_fields_fail() {
        let no_name = br#"{"benchmarks": [{"cpu_time": 1.0}]}"#;
        let no_time = br#"{"benchmarks": [{"name": "insert/100"}]}"#;
        let no_array = br#"{"context": {}}"#;
        assert!(decode_records(no_name).is_err());
        assert!(decode_records(no_time).is_err());
        assert!(decode_records(no_array).is_err());
    }

    #[test]
    fn test_malformed_and_empty_input() {
        assert!(matches!(
            decode_records(b"{\"benchmarks\": [").unwrap_err(),
            DecodeError::Json(_)
        ));
        assert!(matches!(decode_records(b"").unwrap_err(), DecodeError::Empty));
        assert!(matches!(decode_records(b" \n").unwrap_err(), DecodeError::Empty));
    }

    #[test]
    fn test_integer_cpu_time_accepted() {
        let json = br#"{"benchmarks": [{"name": "insert/100", "cpu_time": 5}]}"#;
        let output = decode_records(json).unwrap();
        assert_eq!(output.benchmarks[0].cpu_time, 5.0);
        assert!(output.context.is_none());
    }
}
