/// Maps a single row to the [`ETLValue`]s describing its object graph.
///
/// Every object a row produces gets an id of the form `{legacyId}.{n}`,
/// numbered in the order mappings first reach it. The object owning a
/// path's root field is always `{legacyId}.1`. Mappings whose paths share a
/// structural prefix (same archetypes, names and indices) land on the same
/// objects, which is how a first-name and a last-name column fill in one
/// person, or an address and a suburb column fill in one contact.
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use tracing::debug;

use super::mappings::{Mapping, Mappings};
use super::path::PathSegment;
use super::reference::Reference;
use super::value::ETLValue;
use super::{MappingError, VALUE_PLACEHOLDER};

/// A source row: case-sensitive column name to cell text.
pub trait Row {
    /// The value of `column`, or `None` if the row has no such cell.
    fn get(&self, column: &str) -> Option<&str>;
}

impl<S: BuildHasher> Row for HashMap<String, String, S> {
    fn get(&self, column: &str) -> Option<&str> {
        HashMap::get(self, column).map(String::as_str)
    }
}

impl Row for BTreeMap<String, String> {
    fn get(&self, column: &str) -> Option<&str> {
        BTreeMap::get(self, column).map(String::as_str)
    }
}

impl<R: Row + ?Sized> Row for &R {
    fn get(&self, column: &str) -> Option<&str> {
        (**self).get(column)
    }
}

/// Applies a set of [`Mappings`] to rows.
///
/// Holds no per-row state, so one mapper can serve any number of threads.
#[derive(Debug, Clone, Copy)]
pub struct RowMapper<'a> {
    mappings: &'a Mappings,
}

impl<'a> RowMapper<'a> {
    pub fn new(mappings: &'a Mappings) -> Self {
        Self { mappings }
    }

    #[must_use]
    pub fn mappings(&self) -> &'a Mappings {
        self.mappings
    }

    /// Map `row`, returning values in mapping order and root-to-leaf order
    /// within each mapping.
    ///
    /// Fails only if the row has no legacy id. Cells missing for any other
    /// column map as empty strings.
    pub fn map<R: Row + ?Sized>(&self, row: &R) -> Result<Vec<ETLValue>, MappingError> {
        let id_column = self.mappings.id_column();
        let legacy_id = match row.get(id_column) {
            Some(id) if !id.is_empty() => id,
            _ => {
                return Err(MappingError::MissingLegacyId {
                    column: id_column.to_string(),
                });
            }
        };

        let mut objects = ObjectIds::new(legacy_id);
        let mut values = Vec::new();

        for mapping in self.mappings.iter() {
            let raw = row.get(mapping.source());
            if mapping.exclude_null() && raw.is_none_or(str::is_empty) {
                debug!("{legacy_id}: skipping empty {}", mapping.source());
                continue;
            }
            map_value(mapping, raw.unwrap_or_default(), &mut objects, &mut values);
        }

        Ok(values)
    }
}

/// Per-row identity registry, keyed on structural path prefixes.
///
/// The empty prefix is the root object.
struct ObjectIds<'m, 'r> {
    legacy_id: &'r str,
    allocated: usize,
    ids: HashMap<&'m [PathSegment], String>,
}

impl<'m, 'r> ObjectIds<'m, 'r> {
    fn new(legacy_id: &'r str) -> Self {
        Self {
            legacy_id,
            allocated: 0,
            ids: HashMap::new(),
        }
    }

    /// The id of the object addressed by `prefix`, and whether it was
    /// allocated by this call.
    fn resolve(&mut self, prefix: &'m [PathSegment]) -> (String, bool) {
        if let Some(id) = self.ids.get(prefix) {
            return (id.clone(), false);
        }
        self.allocated += 1;
        let id = format!("{}.{}", self.legacy_id, self.allocated);
        self.ids.insert(prefix, id.clone());
        (id, true)
    }

    fn value(
        &self,
        object_id: &str,
        segment: &PathSegment,
        value: String,
        is_reference: bool,
    ) -> ETLValue {
        ETLValue {
            object_id: object_id.to_string(),
            archetype: segment.archetype.clone(),
            legacy_id: self.legacy_id.to_string(),
            name: segment.name.clone(),
            index: segment.output_index(),
            value,
            is_reference,
        }
    }
}

fn map_value<'m>(
    mapping: &'m Mapping,
    raw: &str,
    objects: &mut ObjectIds<'m, '_>,
    values: &mut Vec<ETLValue>,
) {
    let segments = mapping.target().segments();
    let Some((leaf, parents)) = segments.split_last() else {
        return;
    };

    let (mut owner, _) = objects.resolve(&segments[..0]);

    // Intermediate segments link their owner to a child object. The link is
    // only emitted when the child is first synthesized for this row.
    for (depth, segment) in parents.iter().enumerate() {
        let (child, created) = objects.resolve(&segments[..=depth]);
        if created {
            values.push(objects.value(&owner, segment, child.clone(), true));
        }
        owner = child;
    }

    let (value, is_reference) = leaf_value(mapping, leaf, raw);
    values.push(objects.value(&owner, leaf, value, is_reference));
}

/// Compute the value assigned to the leaf field.
///
/// NOTE: a reference mapping without a template defaults to
/// `<{root archetype}>{raw}`, taking the archetype from the first segment of
/// the path rather than the leaf. Existing mapping files rely on this.
fn leaf_value(mapping: &Mapping, leaf: &PathSegment, raw: &str) -> (String, bool) {
    match mapping.value() {
        Some(template) => (
            template.replace(VALUE_PLACEHOLDER, raw),
            mapping.is_reference(),
        ),
        None if mapping.is_reference() => {
            let root = &mapping.target().root().archetype;
            (Reference::legacy(root.as_str(), raw).to_string(), true)
        }
        None => (raw.to_string(), leaf.index.is_some()),
    }
}
