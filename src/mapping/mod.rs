//! Row-to-object-graph mapping engine.
//!
//! A [`Mappings`] binds input columns to archetype node paths such as
//! `<party.customerperson>contacts[0]<contact.location>address`. The
//! [`RowMapper`] fans a single flat row out into the [`ETLValue`] records
//! that describe the objects to create and how they link together.
//!
//! Nothing in here performs I/O; rows come in through the [`Row`] trait and
//! values go out as plain data.
pub mod mappings;
pub mod path;
pub mod reference;
pub mod row_mapper;
pub mod value;

pub use mappings::{Mapping, MappingSpec, Mappings, MappingsSpec, Remark, RemarkLevel};
pub use path::{NodePath, PathSegment};
pub use reference::Reference;
pub use row_mapper::{Row, RowMapper};
pub use value::ETLValue;

use thiserror::Error;

/// Placeholder substituted with the row's cell value in value templates.
pub const VALUE_PLACEHOLDER: &str = "$value";

/// Errors raised while building mappings or mapping rows.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("no id column specified")]
    NoIdColumn,

    #[error("invalid mapping target for column {column}: {target}")]
    InvalidPath { column: String, target: String },

    #[error("row has no value for id column {column}")]
    MissingLegacyId { column: String },
}
