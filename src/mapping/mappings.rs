/// Column to node path bindings.
///
/// Mappings are built once per load, typically from a [`MappingsSpec`]
/// deserialized out of a mappings file, and then shared read-only by every
/// row mapped against them. Targets are parsed at build time so a bad path
/// fails the whole load before any row is touched.
use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::path::NodePath;
use super::reference::Reference;
use super::{MappingError, VALUE_PLACEHOLDER};

// ── Serialized form ──────────────────────────────────────────────────

/// Mappings as they appear in a mappings file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingsSpec {
    pub id_column: String,

    #[serde(default)]
    pub mappings: Vec<MappingSpec>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingSpec {
    pub source: String,

    pub target: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default)]
    pub is_reference: bool,

    #[serde(default)]
    pub exclude_null: bool,
}

// ── Mapping ──────────────────────────────────────────────────────────

/// Binds one input column to a node path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    source: String,
    target: NodePath,
    value: Option<String>,
    is_reference: bool,
    exclude_null: bool,
}

impl Mapping {
    /// Map column `source` to the node path `target`.
    pub fn new(source: impl Into<String>, target: &str) -> Result<Self, MappingError> {
        let source = source.into();
        let target = NodePath::parse(target).ok_or_else(|| MappingError::InvalidPath {
            column: source.clone(),
            target: target.to_string(),
        })?;
        Ok(Self {
            source,
            target,
            value: None,
            is_reference: false,
            exclude_null: false,
        })
    }

    /// Use `template` as the mapped value, with every `$value` replaced by
    /// the cell value. An empty template is ignored.
    #[must_use]
    pub fn with_value(mut self, template: impl Into<String>) -> Self {
        let template = template.into();
        self.value = (!template.is_empty()).then_some(template);
        self
    }

    /// Mark the mapped value as designating another object.
    #[must_use]
    pub fn with_reference(mut self, is_reference: bool) -> Self {
        self.is_reference = is_reference;
        self
    }

    /// Skip the mapping for rows where the cell is missing or empty.
    #[must_use]
    pub fn with_exclude_null(mut self, exclude_null: bool) -> Self {
        self.exclude_null = exclude_null;
        self
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn target(&self) -> &NodePath {
        &self.target
    }

    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    #[must_use]
    pub fn is_reference(&self) -> bool {
        self.is_reference
    }

    #[must_use]
    pub fn exclude_null(&self) -> bool {
        self.exclude_null
    }
}

impl TryFrom<&MappingSpec> for Mapping {
    type Error = MappingError;

    fn try_from(spec: &MappingSpec) -> Result<Self, Self::Error> {
        let mut mapping = Mapping::new(spec.source.as_str(), &spec.target)?
            .with_reference(spec.is_reference)
            .with_exclude_null(spec.exclude_null);
        if let Some(value) = &spec.value {
            mapping = mapping.with_value(value.as_str());
        }
        Ok(mapping)
    }
}

// ── Mappings ─────────────────────────────────────────────────────────

/// An ordered set of mappings plus the column holding each row's legacy id.
///
/// Order matters: object ids are allocated in the order mappings first touch
/// each object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mappings {
    id_column: String,
    mappings: Vec<Mapping>,
}

impl Mappings {
    pub fn new(id_column: impl Into<String>) -> Result<Self, MappingError> {
        let id_column = id_column.into();
        if id_column.is_empty() {
            return Err(MappingError::NoIdColumn);
        }
        Ok(Self {
            id_column,
            mappings: Vec::new(),
        })
    }

    /// Build mappings from their serialized form, parsing every target.
    pub fn from_spec(spec: &MappingsSpec) -> Result<Self, MappingError> {
        let mut mappings = Self::new(spec.id_column.as_str())?;
        for entry in &spec.mappings {
            mappings.add(Mapping::try_from(entry)?);
        }
        Ok(mappings)
    }

    pub fn add(&mut self, mapping: Mapping) {
        self.mappings.push(mapping);
    }

    #[must_use]
    pub fn with(mut self, mapping: Mapping) -> Self {
        self.add(mapping);
        self
    }

    #[must_use]
    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    #[must_use]
    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mapping> {
        self.mappings.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Check the mappings against the columns an input provides.
    pub fn check<S: AsRef<str>>(&self, columns: &[S]) -> Vec<Remark> {
        let mut remarks = Vec::new();

        if columns.is_empty() {
            remarks.push(Remark::warning("Not receiving any input columns"));
            return remarks;
        }

        let available: HashSet<&str> = columns.iter().map(AsRef::as_ref).collect();

        if !available.contains(self.id_column.as_str()) {
            remarks.push(Remark::error(format!(
                "Id column not in input: {}",
                self.id_column
            )));
        }

        let mut reported = HashSet::new();
        for mapping in &self.mappings {
            let source = mapping.source();
            // missing cells map as empty values, only the id column is required
            if !available.contains(source) && reported.insert(source) {
                remarks.push(Remark::warning(format!("Field not in input: {source}")));
            }

            if let (true, Some(template)) = (mapping.is_reference(), mapping.value()) {
                let sample = template.replace(VALUE_PLACEHOLDER, "0");
                if Reference::parse(&sample).is_none() {
                    remarks.push(Remark::warning(format!(
                        "Value for {} -> {} is not a reference: {template}",
                        source,
                        mapping.target()
                    )));
                }
            }
        }

        remarks.push(Remark::ok(format!(
            "Receiving {} input columns",
            columns.len()
        )));
        remarks
    }
}

// ── Check remarks ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RemarkLevel {
    Ok,
    Warning,
    Error,
}

impl RemarkLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemarkLevel::Ok => "ok",
            RemarkLevel::Warning => "warning",
            RemarkLevel::Error => "error",
        }
    }
}

/// A finding from [`Mappings::check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remark {
    pub level: RemarkLevel,
    pub message: String,
}

impl Remark {
    fn new(level: RemarkLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    fn ok(message: impl Into<String>) -> Self {
        Self::new(RemarkLevel::Ok, message)
    }

    fn warning(message: impl Into<String>) -> Self {
        Self::new(RemarkLevel::Warning, message)
    }

    fn error(message: impl Into<String>) -> Self {
        Self::new(RemarkLevel::Error, message)
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.level == RemarkLevel::Error
    }
}

impl fmt::Display for Remark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level.as_str(), self.message)
    }
}
