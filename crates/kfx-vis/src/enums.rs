//! Closed value sets of the UI metadata and metrics documents
//!
//! Each enum serializes, displays and parses with the same wire string.

use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::{Result, VisError};

/// Visualization kinds understood by the pipelines UI
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Display, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VisType {
    /// `confusion_matrix`
    ConfusionMatrix,
    /// `markdown`
    Markdown,
    /// `roc`
    Roc,
    /// `table`
    Table,
    /// `tensorboard`
    Tensorboard,
    /// `web-app`
    #[serde(rename = "web-app")]
    #[strum(serialize = "web-app")]
    WebApp,
}

impl VisType {
    /// Wire names of the fields a raw mapping of this kind must carry
    #[must_use]
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            Self::ConfusionMatrix => &["source", "labels"],
            Self::Table => &["source", "header"],
            Self::Markdown | Self::Roc | Self::Tensorboard | Self::WebApp => &["source"],
        }
    }
}

/// Data format of a visualization source
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ArtifactDataFormat {
    /// Comma separated values, the only format the UI reads
    #[default]
    Csv,
}

/// Column data type in an artifact schema
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DataType {
    /// `CATEGORY`
    Category,
    /// `NUMBER`
    Number,
    /// `KEY`
    Key,
    /// `TEXT`
    Text,
    /// `IMAGE_URL`
    ImageUrl,
}

/// Where a visualization source lives
///
/// `inline` means the source field holds the content itself.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Storage {
    /// Content embedded in `source`
    Inline,
    /// Google Cloud Storage
    Gcs,
    /// Minio
    Minio,
    /// Amazon S3
    S3,
    /// Plain http
    Http,
    /// Https
    Https,
}

/// How the UI renders a metric value
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricFormat {
    /// Rendered as a percentage
    Percentage,
    /// Rendered as is
    Raw,
}

/// Parse a wire string into one of the enums above
///
/// # Errors
/// [`VisError::InvalidEnum`] naming `field` when `value` is not a member.
pub fn parse_enum<T: FromStr>(field: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| VisError::invalid_enum(field, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn vis_type_wire_names() {
        let names: Vec<String> = VisType::iter().map(|t| t.to_string()).collect();
        assert_eq!(
            names,
            ["confusion_matrix", "markdown", "roc", "table", "tensorboard", "web-app"]
        );
        for kind in VisType::iter() {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, serde_json::Value::String(kind.to_string()));
        }
    }

    #[test]
    fn data_type_is_screaming_snake_case() {
        assert_eq!(DataType::ImageUrl.as_ref(), "IMAGE_URL");
        assert_eq!(parse_enum::<DataType>("type", "CATEGORY").unwrap(), DataType::Category);
    }

    #[test]
    fn parse_enum_reports_field() {
        let err = parse_enum::<Storage>("storage", "ftp").unwrap_err();
        assert!(matches!(err, VisError::InvalidEnum { ref field, ref value } if field == "storage" && value == "ftp"));
        assert_eq!(parse_enum::<MetricFormat>("format", "RAW").unwrap(), MetricFormat::Raw);
        assert!(parse_enum::<ArtifactDataFormat>("format", "parquet").is_err());
    }
}
