use serde::{Deserialize, Serialize};

// Sent as a `[ts, value]` array; float timestamps are truncated to seconds.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "(f64, f64)")]
pub struct DataPoint {
    pub timestamp: i64,
    pub value: f64,
}

impl From<(f64, f64)> for DataPoint {
    fn from((timestamp, value): (f64, f64)) -> Self {
        Self {
            timestamp: timestamp as i64,
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub customer: String,
    pub cluster: String,
    pub ts: String,
    pub value: f64,
}

impl Row {
    pub fn with_metric(self, metric: &str) -> MetricRow {
        MetricRow {
            customer: self.customer,
            cluster: self.cluster,
            ts: self.ts,
            metric: metric.to_string(),
            value: self.value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRow {
    pub customer: String,
    pub cluster: String,
    pub ts: String,
    pub metric: String,
    pub value: f64,
}

// Column order of `Row`.
pub fn columns(value_column: &str) -> [&str; 4] {
    ["customer", "cluster", "ts", value_column]
}

pub fn metric_columns() -> [&'static str; 5] {
    ["customer", "cluster", "ts", "metric", "value"]
}

#[cfg(test)]
pub mod tests {
    use super::{columns, metric_columns, DataPoint};

    #[test]
    fn test_data_point_from_json_pair() {
        let points: Vec<DataPoint> =
            serde_json::from_str("[[1704103200, 42.5], [1704106800.0, 7]]").unwrap();
        assert_eq!(
            points,
            vec![
                DataPoint {
                    timestamp: 1704103200,
                    value: 42.5
                },
                DataPoint {
                    timestamp: 1704106800,
                    value: 7.0
                }
            ]
        );
    }

    #[test]
    fn test_data_point_rejects_short_pair() {
        assert!(serde_json::from_str::<DataPoint>("[1704103200]").is_err());
    }

    #[test]
    fn test_columns() {
        assert_eq!(columns("cpu"), ["customer", "cluster", "ts", "cpu"]);
        assert_eq!(
            metric_columns(),
            ["customer", "cluster", "ts", "metric", "value"]
        );
    }
}
