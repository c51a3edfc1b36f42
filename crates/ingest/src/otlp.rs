use agentpulse_core::error::{PulseError, Result};
use agentpulse_core::model::otel::{MetricRow, OtelLogRow};
use agentpulse_core::outcome::OtelBatchSummary;
use agentpulse_core::time::nanos_to_dt;
use agentpulse_store::Store;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

// Simplified OTLP-shaped JSON, as emitted by collector HTTP exporters.
// Envelope fields are typed; per-point attributes stay loose (`Value`) so
// one malformed point fails alone instead of failing the whole payload.

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OtlpPayload {
    pub resource_metrics: Vec<ResourceMetrics>,
    pub resource_logs: Vec<ResourceLogs>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceMetrics {
    pub resource: Option<OtlpResource>,
    pub scope_metrics: Vec<ScopeMetrics>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceLogs {
    pub resource: Option<OtlpResource>,
    pub scope_logs: Vec<ScopeLogs>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OtlpResource {
    pub attributes: Vec<OtlpKeyValue>,
}

#[derive(Debug, Deserialize)]
pub struct OtlpKeyValue {
    pub key: String,
    #[serde(default)]
    pub value: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScopeMetrics {
    pub metrics: Vec<OtlpMetric>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OtlpMetric {
    pub name: Option<String>,
    pub sum: Option<OtlpDataPoints>,
    pub gauge: Option<OtlpDataPoints>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OtlpDataPoints {
    pub data_points: Vec<OtlpNumberPoint>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OtlpNumberPoint {
    pub time_unix_nano: Option<Value>,
    pub as_double: Option<f64>,
    pub as_int: Option<Value>,
    pub attributes: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScopeLogs {
    pub log_records: Vec<OtlpLogRecord>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OtlpLogRecord {
    pub time_unix_nano: Option<Value>,
    pub severity_text: Option<String>,
    pub body: Option<Value>,
    pub attributes: Option<Value>,
}

/// Best-effort ingestion of one OTLP-shaped batch. Every data point and log
/// record is inserted independently; a malformed one is counted in `failed`
/// and never aborts the batch. Missing top-level arrays mean empty input.
pub fn ingest_otel(store: &Store, payload: &OtlpPayload) -> Result<OtelBatchSummary> {
    let mut summary = OtelBatchSummary::default();

    for rm in &payload.resource_metrics {
        let developer_id = resource_developer_id(rm.resource.as_ref());
        for sm in &rm.scope_metrics {
            for metric in &sm.metrics {
                let name = metric.name.clone().unwrap_or_else(|| "unknown".to_string());
                let points = metric
                    .sum
                    .as_ref()
                    .or(metric.gauge.as_ref())
                    .map(|d| d.data_points.as_slice())
                    .unwrap_or_default();
                for point in points {
                    match metric_row(&name, developer_id.clone(), point)
                        .and_then(|row| store.insert_metric(&row))
                    {
                        Ok(()) => summary.metrics_inserted += 1,
                        Err(e) => {
                            warn!(metric = %name, error = %e, "metric point dropped");
                            summary.failed += 1;
                        }
                    }
                }
            }
        }
    }

    for rl in &payload.resource_logs {
        let developer_id = resource_developer_id(rl.resource.as_ref());
        for sl in &rl.scope_logs {
            for record in &sl.log_records {
                match log_row(developer_id.clone(), record)
                    .and_then(|row| store.insert_otel_log(&row))
                {
                    Ok(()) => summary.logs_inserted += 1,
                    Err(e) => {
                        warn!(error = %e, "log record dropped");
                        summary.failed += 1;
                    }
                }
            }
        }
    }

    Ok(summary)
}

fn metric_row(name: &str, developer_id: Option<String>, point: &OtlpNumberPoint) -> Result<MetricRow> {
    Ok(MetricRow {
        ts: point_ts(point.time_unix_nano.as_ref()),
        developer_id,
        name: name.to_string(),
        value: point_value(point),
        attrs_json: flatten_attrs(point.attributes.as_ref())?,
    })
}

fn log_row(developer_id: Option<String>, record: &OtlpLogRecord) -> Result<OtelLogRow> {
    Ok(OtelLogRow {
        ts: point_ts(record.time_unix_nano.as_ref()),
        developer_id,
        severity: record
            .severity_text
            .clone()
            .unwrap_or_else(|| "INFO".to_string()),
        body: log_body(record.body.as_ref()),
        attrs_json: flatten_attrs(record.attributes.as_ref())?,
    })
}

/// First resource attribute named `developer_id` or `x-developer-id` wins;
/// a match without a stringValue still wins and yields no id.
fn resource_developer_id(resource: Option<&OtlpResource>) -> Option<String> {
    let resource = resource?;
    let kv = resource
        .attributes
        .iter()
        .find(|kv| kv.key == "developer_id" || kv.key == "x-developer-id")?;
    kv.value
        .as_ref()?
        .get("stringValue")?
        .as_str()
        .map(str::to_string)
}

/// `timeUnixNano` arrives as a number or a decimal string depending on the
/// exporter. Absent or unparsable means ingestion time.
fn point_ts(raw: Option<&Value>) -> DateTime<Utc> {
    let nanos = match raw {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.parse::<u64>().ok(),
        _ => None,
    };
    nanos.map(nanos_to_dt).unwrap_or_else(Utc::now)
}

fn point_value(point: &OtlpNumberPoint) -> f64 {
    if let Some(d) = point.as_double {
        return d;
    }
    match &point.as_int {
        Some(Value::Number(n)) => n.as_i64().map(|i| i as f64).unwrap_or(0.0),
        Some(Value::String(s)) => s.parse::<i64>().map(|i| i as f64).unwrap_or(0.0),
        _ => 0.0,
    }
}

fn log_body(body: Option<&Value>) -> String {
    let Some(body) = body else {
        return String::new();
    };
    if let Some(s) = body.get("stringValue").and_then(Value::as_str) {
        return s.to_string();
    }
    if let Some(b64) = body.get("bytesValue").and_then(Value::as_str)
        && let Ok(bytes) = base64::engine::general_purpose::STANDARD.decode(b64)
    {
        return String::from_utf8_lossy(&bytes).to_string();
    }
    String::new()
}

/// Flatten OTLP `[{key, value: {stringValue|intValue|doubleValue}}]` pairs
/// into a plain JSON object. Anything else is malformed and fails just the
/// point that carried it.
fn flatten_attrs(attrs: Option<&Value>) -> Result<String> {
    let Some(attrs) = attrs else {
        return Ok("{}".to_string());
    };
    let Value::Array(entries) = attrs else {
        return Err(PulseError::Parse("attributes is not an array".to_string()));
    };

    let mut map = serde_json::Map::new();
    for entry in entries {
        let key = entry
            .get("key")
            .and_then(Value::as_str)
            .ok_or_else(|| PulseError::Parse("attribute entry without key".to_string()))?;
        let value = entry.get("value").map(flatten_value).unwrap_or(Value::Null);
        map.insert(key.to_string(), value);
    }
    Ok(Value::Object(map).to_string())
}

fn flatten_value(value: &Value) -> Value {
    if let Some(s) = value.get("stringValue").and_then(Value::as_str) {
        return Value::String(s.to_string());
    }
    if let Some(int) = value.get("intValue") {
        let parsed = match int {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.parse::<i64>().ok(),
            _ => None,
        };
        if let Some(i) = parsed {
            return Value::Number(i.into());
        }
    }
    if let Some(d) = value.get("doubleValue").and_then(Value::as_f64)
        && let Some(n) = serde_json::Number::from_f64(d)
    {
        return Value::Number(n);
    }
    Value::Null
}

#[cfg(test)]
mod tests {
    use agentpulse_store::Store;

    use super::*;

    fn payload(json: &str) -> OtlpPayload {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn empty_payload_is_zero_not_error() {
        let store = Store::open_in_memory().unwrap();
        let summary = ingest_otel(&store, &payload("{}")).unwrap();
        assert_eq!(summary, OtelBatchSummary::default());
    }

    #[test]
    fn extracts_developer_id_and_values() {
        let store = Store::open_in_memory().unwrap();
        let p = payload(
            r#"{
              "resourceMetrics": [{
                "resource": {"attributes": [
                  {"key": "developer_id", "value": {"stringValue": "dev-42"}}
                ]},
                "scopeMetrics": [{
                  "metrics": [{
                    "name": "agent.tokens",
                    "sum": {"dataPoints": [
                      {"timeUnixNano": "1770000000000000000", "asInt": "128",
                       "attributes": [{"key": "kind", "value": {"stringValue": "input"}}]},
                      {"timeUnixNano": 1770000001000000000, "asDouble": 2.5}
                    ]}
                  }]
                }]
              }]
            }"#,
        );
        let summary = ingest_otel(&store, &p).unwrap();
        assert_eq!(summary.metrics_inserted, 2);
        assert_eq!(summary.failed, 0);

        let stats = store.otel_stats().unwrap();
        assert_eq!(stats.total_metrics, 2);
        assert_eq!(stats.unique_developers, 1);
    }

    #[test]
    fn malformed_point_fails_alone() {
        let store = Store::open_in_memory().unwrap();
        let p = payload(
            r#"{
              "resourceMetrics": [{
                "scopeMetrics": [{
                  "metrics": [{
                    "name": "agent.calls",
                    "gauge": {"dataPoints": [
                      {"asInt": 1},
                      {"asInt": 2, "attributes": {"not": "an array"}},
                      {"asInt": 3}
                    ]}
                  }]
                }]
              }]
            }"#,
        );
        let summary = ingest_otel(&store, &p).unwrap();
        assert_eq!(summary.metrics_inserted, 2);
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn log_defaults_and_base64_body() {
        let store = Store::open_in_memory().unwrap();
        let p = payload(
            r#"{
              "resourceLogs": [{
                "resource": {"attributes": [
                  {"key": "x-developer-id", "value": {"stringValue": "dev-7"}}
                ]},
                "scopeLogs": [{
                  "logRecords": [
                    {"body": {"stringValue": "session started"}},
                    {"severityText": "ERROR", "body": {"bytesValue": "aGVsbG8="}}
                  ]
                }]
              }]
            }"#,
        );
        let summary = ingest_otel(&store, &p).unwrap();
        assert_eq!(summary.logs_inserted, 2);
        assert_eq!(store.otel_stats().unwrap().total_logs, 2);
    }

    #[test]
    fn flatten_attrs_rejects_non_array() {
        assert!(flatten_attrs(Some(&serde_json::json!({"a": 1}))).is_err());
        assert_eq!(flatten_attrs(None).unwrap(), "{}");
        let flat = flatten_attrs(Some(&serde_json::json!([
            {"key": "count", "value": {"intValue": "5"}},
            {"key": "ratio", "value": {"doubleValue": 0.5}}
        ])))
        .unwrap();
        assert_eq!(flat, r#"{"count":5,"ratio":0.5}"#);
    }
}
