//! UI metadata document model
//!
//! One struct per visualization kind. Every kind carries the same optional
//! field set; each fixes which of those fields are required and which have
//! defaults. [`Visualization`] is the tagged union written to `outputs`, with
//! the kind as its `type` discriminant.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::enums::{parse_enum, ArtifactDataFormat, DataType, Storage, VisType};
use crate::error::{Result, VisError};

/// One column of a csv source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnSchema {
    /// Column name
    pub name: String,
    /// Column data type
    #[serde(rename = "type")]
    pub data_type: DataType,
}

impl ColumnSchema {
    /// Column `name` of type `data_type`
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

fn confusion_matrix_schema() -> Vec<ColumnSchema> {
    vec![
        ColumnSchema::new("target", DataType::Category),
        ColumnSchema::new("predicted", DataType::Category),
        ColumnSchema::new("count", DataType::Number),
    ]
}

fn roc_schema() -> Vec<ColumnSchema> {
    vec![
        ColumnSchema::new("fpr", DataType::Number),
        ColumnSchema::new("tpr", DataType::Number),
        ColumnSchema::new("thresholds", DataType::Number),
    ]
}

fn collect_strings<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values.into_iter().map(Into::into).collect()
}

macro_rules! vis_setters {
    ($ty:ident { $($kind:ident $setter:ident => $field:ident $(: $t:ty)?),* $(,)? }) => {
        impl $ty {
            $( vis_setters!(@$kind $setter $field $($t)?); )*
        }
    };
    (@strings $setter:ident $field:ident) => {
        #[doc = concat!("Set `", stringify!($field), "`")]
        #[must_use]
        pub fn $setter<I, S>(mut self, values: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            self.$field = Some(collect_strings(values));
            self
        }
    };
    (@text $setter:ident $field:ident) => {
        #[doc = concat!("Set `", stringify!($field), "`")]
        #[must_use]
        pub fn $setter(mut self, value: impl Into<String>) -> Self {
            self.$field = Some(value.into());
            self
        }
    };
    (@some $setter:ident $field:ident $t:ty) => {
        #[doc = concat!("Set `", stringify!($field), "`")]
        #[must_use]
        pub fn $setter(mut self, value: $t) -> Self {
            self.$field = Some(value);
            self
        }
    };
    (@set $setter:ident $field:ident $t:ty) => {
        #[doc = concat!("Replace `", stringify!($field), "`")]
        #[must_use]
        pub fn $setter(mut self, value: $t) -> Self {
            self.$field = value;
            self
        }
    };
}

/// Confusion matrix over a csv of `target`, `predicted`, `count` rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ConfusionMatrix {
    /// Source data format
    #[serde(rename = "format", default)]
    pub artifact_format: ArtifactDataFormat,
    /// Column headers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<Vec<String>>,
    /// Class names plotted on both axes
    pub labels: Vec<String>,
    /// Name of the predicted column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicted_col: Option<String>,
    /// Source columns
    #[serde(rename = "schema", default = "confusion_matrix_schema")]
    pub artifact_schema: Vec<ColumnSchema>,
    /// Path to the data, wildcards allowed
    pub source: String,
    /// Source storage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<Storage>,
    /// Name of the target column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_col: Option<String>,
}

impl ConfusionMatrix {
    /// Confusion matrix of `source` with class `labels`
    pub fn new<I, S>(source: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            artifact_format: ArtifactDataFormat::default(),
            header: None,
            labels: collect_strings(labels),
            predicted_col: None,
            artifact_schema: confusion_matrix_schema(),
            source: source.into(),
            storage: None,
            target_col: None,
        }
    }
}

vis_setters!(ConfusionMatrix {
    set with_format => artifact_format: ArtifactDataFormat,
    strings with_header => header,
    text with_predicted_col => predicted_col,
    set with_schema => artifact_schema: Vec<ColumnSchema>,
    some with_storage => storage: Storage,
    text with_target_col => target_col,
});

/// Markdown, either remote or inline
///
/// With [`Storage::Inline`] the source is the markdown text itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Markdown {
    /// Source data format
    #[serde(rename = "format", default, skip_serializing_if = "Option::is_none")]
    pub artifact_format: Option<ArtifactDataFormat>,
    /// Column headers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<Vec<String>>,
    /// Labels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    /// Name of the predicted column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicted_col: Option<String>,
    /// Source columns
    #[serde(rename = "schema", default, skip_serializing_if = "Option::is_none")]
    pub artifact_schema: Option<Vec<ColumnSchema>>,
    /// Path to the markdown, or the markdown itself
    pub source: String,
    /// Source storage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<Storage>,
    /// Name of the target column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_col: Option<String>,
}

impl Markdown {
    /// Markdown read from `source`
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            artifact_format: None,
            header: None,
            labels: None,
            predicted_col: None,
            artifact_schema: None,
            source: source.into(),
            storage: None,
            target_col: None,
        }
    }
}

vis_setters!(Markdown {
    some with_format => artifact_format: ArtifactDataFormat,
    strings with_header => header,
    strings with_labels => labels,
    text with_predicted_col => predicted_col,
    some with_schema => artifact_schema: Vec<ColumnSchema>,
    some with_storage => storage: Storage,
    text with_target_col => target_col,
});

/// ROC curve over a csv of `fpr`, `tpr`, `thresholds` rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Roc {
    /// Source data format
    #[serde(rename = "format", default)]
    pub artifact_format: ArtifactDataFormat,
    /// Column headers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<Vec<String>>,
    /// Labels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    /// Name of the predicted column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicted_col: Option<String>,
    /// Source columns
    #[serde(rename = "schema", default = "roc_schema")]
    pub artifact_schema: Vec<ColumnSchema>,
    /// Path to the data, wildcards allowed
    pub source: String,
    /// Source storage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<Storage>,
    /// Name of the target column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_col: Option<String>,
}

impl Roc {
    /// ROC curve of `source`
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            artifact_format: ArtifactDataFormat::default(),
            header: None,
            labels: None,
            predicted_col: None,
            artifact_schema: roc_schema(),
            source: source.into(),
            storage: None,
            target_col: None,
        }
    }
}

vis_setters!(Roc {
    set with_format => artifact_format: ArtifactDataFormat,
    strings with_header => header,
    strings with_labels => labels,
    text with_predicted_col => predicted_col,
    set with_schema => artifact_schema: Vec<ColumnSchema>,
    some with_storage => storage: Storage,
    text with_target_col => target_col,
});

/// Paginated HTML table built from a csv
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Table {
    /// Source data format
    #[serde(rename = "format", default)]
    pub artifact_format: ArtifactDataFormat,
    /// First row of the table
    pub header: Vec<String>,
    /// Labels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    /// Name of the predicted column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicted_col: Option<String>,
    /// Source columns
    #[serde(rename = "schema", default, skip_serializing_if = "Option::is_none")]
    pub artifact_schema: Option<Vec<ColumnSchema>>,
    /// Path to the data, wildcards allowed
    pub source: String,
    /// Source storage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<Storage>,
    /// Name of the target column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_col: Option<String>,
}

impl Table {
    /// Table of `source` under `header`
    pub fn new<I, S>(source: impl Into<String>, header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            artifact_format: ArtifactDataFormat::default(),
            header: collect_strings(header),
            labels: None,
            predicted_col: None,
            artifact_schema: None,
            source: source.into(),
            storage: None,
            target_col: None,
        }
    }
}

vis_setters!(Table {
    set with_format => artifact_format: ArtifactDataFormat,
    strings with_labels => labels,
    text with_predicted_col => predicted_col,
    some with_schema => artifact_schema: Vec<ColumnSchema>,
    some with_storage => storage: Storage,
    text with_target_col => target_col,
});

/// "Start Tensorboard" button pointing at a log directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Tensorboard {
    /// Source data format
    #[serde(rename = "format", default, skip_serializing_if = "Option::is_none")]
    pub artifact_format: Option<ArtifactDataFormat>,
    /// Column headers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<Vec<String>>,
    /// Labels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    /// Name of the predicted column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicted_col: Option<String>,
    /// Source columns
    #[serde(rename = "schema", default, skip_serializing_if = "Option::is_none")]
    pub artifact_schema: Option<Vec<ColumnSchema>>,
    /// Log directory, wildcards allowed
    pub source: String,
    /// Source storage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<Storage>,
    /// Name of the target column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_col: Option<String>,
}

impl Tensorboard {
    /// Tensorboard over the logs at `source`
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            artifact_format: None,
            header: None,
            labels: None,
            predicted_col: None,
            artifact_schema: None,
            source: source.into(),
            storage: None,
            target_col: None,
        }
    }
}

vis_setters!(Tensorboard {
    some with_format => artifact_format: ArtifactDataFormat,
    strings with_header => header,
    strings with_labels => labels,
    text with_predicted_col => predicted_col,
    some with_schema => artifact_schema: Vec<ColumnSchema>,
    some with_storage => storage: Storage,
    text with_target_col => target_col,
});

/// Self-contained HTML rendered in an iframe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WebApp {
    /// Source data format
    #[serde(rename = "format", default, skip_serializing_if = "Option::is_none")]
    pub artifact_format: Option<ArtifactDataFormat>,
    /// Column headers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<Vec<String>>,
    /// Labels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    /// Name of the predicted column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicted_col: Option<String>,
    /// Source columns
    #[serde(rename = "schema", default, skip_serializing_if = "Option::is_none")]
    pub artifact_schema: Option<Vec<ColumnSchema>>,
    /// Path to the html, or the html itself
    pub source: String,
    /// Source storage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<Storage>,
    /// Name of the target column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_col: Option<String>,
}

impl WebApp {
    /// Web app served from `source`
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            artifact_format: None,
            header: None,
            labels: None,
            predicted_col: None,
            artifact_schema: None,
            source: source.into(),
            storage: None,
            target_col: None,
        }
    }
}

vis_setters!(WebApp {
    some with_format => artifact_format: ArtifactDataFormat,
    strings with_header => header,
    strings with_labels => labels,
    text with_predicted_col => predicted_col,
    some with_schema => artifact_schema: Vec<ColumnSchema>,
    some with_storage => storage: Storage,
    text with_target_col => target_col,
});

/// A single entry of the `outputs` list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
pub enum Visualization {
    /// `confusion_matrix`
    #[serde(rename = "confusion_matrix")]
    ConfusionMatrix(ConfusionMatrix),
    /// `markdown`
    #[serde(rename = "markdown")]
    Markdown(Markdown),
    /// `roc`
    #[serde(rename = "roc")]
    Roc(Roc),
    /// `table`
    #[serde(rename = "table")]
    Table(Table),
    /// `tensorboard`
    #[serde(rename = "tensorboard")]
    Tensorboard(Tensorboard),
    /// `web-app`
    #[serde(rename = "web-app")]
    WebApp(WebApp),
}

impl Visualization {
    /// The `type` discriminant
    #[must_use]
    pub fn kind(&self) -> VisType {
        match self {
            Self::ConfusionMatrix(_) => VisType::ConfusionMatrix,
            Self::Markdown(_) => VisType::Markdown,
            Self::Roc(_) => VisType::Roc,
            Self::Table(_) => VisType::Table,
            Self::Tensorboard(_) => VisType::Tensorboard,
            Self::WebApp(_) => VisType::WebApp,
        }
    }

    /// Source of the visualization
    #[must_use]
    pub fn source(&self) -> &str {
        match self {
            Self::ConfusionMatrix(v) => &v.source,
            Self::Markdown(v) => &v.source,
            Self::Roc(v) => &v.source,
            Self::Table(v) => &v.source,
            Self::Tensorboard(v) => &v.source,
            Self::WebApp(v) => &v.source,
        }
    }

    /// Validate a raw mapping and build the matching variant
    ///
    /// Checks, in order: the `type` discriminant, the kind's required
    /// fields, then enum membership of `format`, `storage` and every
    /// `schema[].type`.
    pub fn from_value(value: Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| VisError::InvalidDocument("visualization must be an object".into()))?;

        let kind = match object.get("type") {
            None | Some(Value::Null) => return Err(VisError::missing_field("visualization", "type")),
            Some(Value::String(kind)) => kind
                .parse::<VisType>()
                .map_err(|_| VisError::UnknownType(kind.clone()))?,
            Some(other) => return Err(VisError::UnknownType(other.to_string())),
        };

        for field in kind.required_fields() {
            if matches!(object.get(*field), None | Some(Value::Null)) {
                return Err(VisError::missing_field(kind.as_ref(), *field));
            }
        }
        check_enum_fields(object)?;

        serde_json::from_value(value).map_err(|e| VisError::InvalidDocument(e.to_string()))
    }
}

fn check_enum_fields(object: &Map<String, Value>) -> Result<()> {
    if let Some(Value::String(format)) = object.get("format") {
        parse_enum::<ArtifactDataFormat>("format", format)?;
    }
    if let Some(Value::String(storage)) = object.get("storage") {
        parse_enum::<Storage>("storage", storage)?;
    }
    if let Some(Value::Array(columns)) = object.get("schema") {
        for column in columns {
            if let Some(Value::String(data_type)) = column.get("type") {
                parse_enum::<DataType>("schema.type", data_type)?;
            }
        }
    }
    Ok(())
}

impl TryFrom<Value> for Visualization {
    type Error = VisError;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(value)
    }
}

macro_rules! into_visualization {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Visualization {
                fn from(value: $variant) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

into_visualization!(ConfusionMatrix, Markdown, Roc, Table, Tensorboard, WebApp);

/// Version of the UI metadata schema, a number or a string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum SchemaVersion {
    /// Numeric version
    Number(i64),
    /// Free-form version
    Text(String),
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::Number(1)
    }
}

impl From<i64> for SchemaVersion {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for SchemaVersion {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SchemaVersion {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// The document the pipelines UI reads to render task outputs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UiMetadata {
    /// Schema version
    #[serde(default)]
    pub version: SchemaVersion,
    /// Visualizations in display order
    #[serde(default)]
    pub outputs: Vec<Visualization>,
}

impl UiMetadata {
    /// Version 1 document with no outputs
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the schema version
    #[inline]
    #[must_use]
    pub fn with_version(mut self, version: impl Into<SchemaVersion>) -> Self {
        self.version = version.into();
        self
    }

    /// Append a visualization
    #[must_use]
    pub fn with_output(mut self, output: impl Into<Visualization>) -> Self {
        self.outputs.push(output.into());
        self
    }

    /// Validate a raw document
    ///
    /// Every output goes through [`Visualization::from_value`].
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut object) = value else {
            return Err(VisError::InvalidDocument("ui metadata must be an object".into()));
        };
        let version = match object.remove("version") {
            None | Some(Value::Null) => SchemaVersion::default(),
            Some(version) => serde_json::from_value(version)
                .map_err(|e| VisError::InvalidDocument(format!("version: {e}")))?,
        };
        let outputs = match object.remove("outputs") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(outputs)) => outputs
                .into_iter()
                .map(Visualization::from_value)
                .collect::<Result<_>>()?,
            Some(_) => return Err(VisError::InvalidDocument("outputs must be a list".into())),
        };
        Ok(Self { version, outputs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn confusion_matrix_defaults() {
        let value = serde_json::to_value(Visualization::from(ConfusionMatrix::new("S", ["True", "False"]))).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "confusion_matrix",
                "format": "csv",
                "schema": [
                    {"name": "target", "type": "CATEGORY"},
                    {"name": "predicted", "type": "CATEGORY"},
                    {"name": "count", "type": "NUMBER"},
                ],
                "source": "S",
                "labels": ["True", "False"],
            })
        );
    }

    #[test]
    fn optional_fields_are_omitted() {
        let value = serde_json::to_value(Visualization::from(Tensorboard::new("gs://logs/*"))).unwrap();
        assert_eq!(value, json!({"type": "tensorboard", "source": "gs://logs/*"}));
    }

    #[test]
    fn from_value_applies_defaults() {
        let roc = Visualization::from_value(json!({"type": "roc", "source": "s"})).unwrap();
        assert_eq!(roc, Visualization::Roc(Roc::new("s")));
    }

    #[test]
    fn from_value_requires_kind_fields() {
        let err = Visualization::from_value(json!({"type": "table", "source": "s"})).unwrap_err();
        assert!(matches!(err, VisError::MissingField { ref field, .. } if field == "header"));

        let err = Visualization::from_value(json!({"type": "confusion_matrix", "source": "s"})).unwrap_err();
        assert!(matches!(err, VisError::MissingField { ref field, .. } if field == "labels"));

        let err = Visualization::from_value(json!({"source": "s"})).unwrap_err();
        assert!(matches!(err, VisError::MissingField { ref field, .. } if field == "type"));
    }

    #[test]
    fn from_value_rejects_unknown_type_and_enums() {
        assert!(matches!(
            Visualization::from_value(json!({"type": "pie", "source": "s"})),
            Err(VisError::UnknownType(ref kind)) if kind == "pie"
        ));
        assert!(matches!(
            Visualization::from_value(json!({"type": "markdown", "source": "s", "storage": "ftp"})),
            Err(VisError::InvalidEnum { ref field, .. }) if field == "storage"
        ));
        assert!(matches!(
            Visualization::from_value(json!({
                "type": "roc", "source": "s", "schema": [{"name": "fpr", "type": "FLOAT"}]
            })),
            Err(VisError::InvalidEnum { ref field, .. }) if field == "schema.type"
        ));
        assert!(matches!(
            Visualization::from_value(json!({"type": "markdown", "source": 3})),
            Err(VisError::InvalidDocument(_))
        ));
    }

    #[test]
    fn version_accepts_number_or_string() {
        let doc = UiMetadata::from_value(json!({"version": "v2", "outputs": []})).unwrap();
        assert_eq!(doc.version, SchemaVersion::Text("v2".into()));

        let doc = UiMetadata::from_value(json!({})).unwrap();
        assert_eq!(doc.version, SchemaVersion::Number(1));
        assert!(doc.outputs.is_empty());
    }

    #[test]
    fn setters_fill_optional_fields() {
        let table = Table::new("s", ["a", "b"])
            .with_storage(Storage::Gcs)
            .with_target_col("a")
            .with_predicted_col("b");
        let value = serde_json::to_value(&table).unwrap();
        assert_eq!(value["storage"], "gcs");
        assert_eq!(value["target_col"], "a");
        assert_eq!(value["predicted_col"], "b");
        assert!(value.get("schema").is_none());
    }
}
