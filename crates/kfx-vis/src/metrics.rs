//! Metrics document model

use once_cell::sync::Lazy;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::enums::{parse_enum, MetricFormat};
use crate::error::{Result, VisError};

/// Pattern every metric name must match
pub const METRIC_NAME_PATTERN: &str = "^[a-z]([-a-z0-9]{0,62}[a-z0-9])?$";

static METRIC_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(METRIC_NAME_PATTERN).expect("static regex"));

/// Check a metric name against [`METRIC_NAME_PATTERN`]
#[must_use]
pub fn is_valid_metric_name(name: &str) -> bool {
    METRIC_NAME.is_match(name)
}

/// A single named metric of a task
///
/// Deserializing goes through [`Metric::new`], so a decoded metric always
/// has a valid name and a finite value.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct Metric {
    #[schemars(regex(pattern = r"^[a-z]([-a-z0-9]{0,62}[a-z0-9])?$"))]
    name: String,
    #[serde(rename = "numberValue")]
    number_value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    format: Option<MetricFormat>,
}

impl Metric {
    /// Validated metric
    ///
    /// # Errors
    /// [`VisError::InvalidMetricName`] or [`VisError::NonFiniteMetric`].
    pub fn new(name: impl Into<String>, value: f64, format: Option<MetricFormat>) -> Result<Self> {
        let name = name.into();
        if !is_valid_metric_name(&name) {
            return Err(VisError::InvalidMetricName(name));
        }
        if !value.is_finite() {
            return Err(VisError::NonFiniteMetric { name });
        }
        Ok(Self {
            name,
            number_value: value,
            format,
        })
    }

    /// Metric name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Metric value
    #[inline]
    #[must_use]
    pub fn value(&self) -> f64 {
        self.number_value
    }

    /// Render format, unset meaning raw
    #[inline]
    #[must_use]
    pub fn format(&self) -> Option<MetricFormat> {
        self.format
    }

    /// Validate a raw `{name, numberValue, format}` mapping
    pub fn from_value(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| VisError::InvalidDocument("metric must be an object".into()))?;

        let name = match object.get("name") {
            Some(Value::String(name)) => name.clone(),
            None | Some(Value::Null) => return Err(VisError::missing_field("metric", "name")),
            Some(other) => return Err(VisError::InvalidMetricName(other.to_string())),
        };
        let number = match object.get("numberValue") {
            Some(Value::Number(number)) => number
                .as_f64()
                .ok_or_else(|| VisError::NonFiniteMetric { name: name.clone() })?,
            None | Some(Value::Null) => return Err(VisError::missing_field("metric", "numberValue")),
            Some(other) => {
                return Err(VisError::InvalidDocument(format!(
                    "numberValue of {name} must be a number, got {other}"
                )))
            }
        };
        let format = match object.get("format") {
            None | Some(Value::Null) => None,
            Some(Value::String(format)) => Some(parse_enum::<MetricFormat>("format", format)?),
            Some(other) => return Err(VisError::invalid_enum("format", other.to_string())),
        };

        Self::new(name, number, format)
    }
}

#[derive(Deserialize)]
struct RawMetric {
    name: String,
    #[serde(rename = "numberValue")]
    number_value: f64,
    #[serde(default)]
    format: Option<MetricFormat>,
}

impl<'de> Deserialize<'de> for Metric {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawMetric::deserialize(deserializer)?;
        Self::new(raw.name, raw.number_value, raw.format).map_err(serde::de::Error::custom)
    }
}

impl TryFrom<Value> for Metric {
    type Error = VisError;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(&value)
    }
}

/// The metrics document of a task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Metrics {
    /// Metrics in display order
    #[serde(default)]
    pub metrics: Vec<Metric>,
}

impl Metrics {
    /// Empty document
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a metric
    #[must_use]
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metrics.push(metric);
        self
    }

    /// Validate a raw document
    pub fn from_value(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| VisError::InvalidDocument("metrics must be an object".into()))?;
        let metrics = match object.get("metrics") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.iter().map(Metric::from_value).collect::<Result<_>>()?,
            Some(_) => return Err(VisError::InvalidDocument("metrics must be a list".into())),
        };
        Ok(Self { metrics })
    }
}
