/// Node path language.
///
/// A path names a field on an archetype, optionally stepping through
/// collection slots into further archetypes:
///
/// ```text
/// <party.customerperson>firstName
/// <party.customerperson>contacts[0]<contact.location>address
/// ```
use std::fmt;

/// One step of a node path: the field `name` on an object of `archetype`.
///
/// A segment with an `index` addresses a slot of a collection field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathSegment {
    pub archetype: String,
    pub name: String,
    pub index: Option<i32>,
}

impl PathSegment {
    /// The collection index in output form, `-1` when not a collection slot.
    #[must_use]
    pub fn output_index(&self) -> i32 {
        self.index.unwrap_or(-1)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>{}", self.archetype, self.name)?;
        if let Some(index) = self.index {
            write!(f, "[{index}]")?;
        }
        Ok(())
    }
}

/// A parsed node path. Always holds at least one segment; segment `i + 1` is
/// the child of segment `i`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodePath {
    segments: Vec<PathSegment>,
}

impl NodePath {
    /// Parse a node path. Returns `None` if the text is not a well formed,
    /// non-empty sequence of `<archetype>name[index]` segments.
    pub fn parse(text: &str) -> Option<Self> {
        let mut segments = Vec::new();
        let mut rest = text;

        while !rest.is_empty() {
            let (segment, tail) = parse_segment(rest)?;
            segments.push(segment);
            rest = tail;
        }

        if segments.is_empty() {
            return None;
        }
        Some(Self { segments })
    }

    /// The first segment of the path.
    #[must_use]
    pub fn root(&self) -> &PathSegment {
        &self.segments[0]
    }

    /// The last segment of the path, naming the field that receives a value.
    #[must_use]
    pub fn leaf(&self) -> &PathSegment {
        &self.segments[self.segments.len() - 1]
    }

    /// Number of segments.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// The child of the segment at `depth`, if any.
    #[must_use]
    pub fn child(&self, depth: usize) -> Option<&PathSegment> {
        self.segments.get(depth + 1)
    }

    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// Parse one `<archetype>name[index]` segment off the front of `text`,
/// returning it with the unconsumed remainder.
fn parse_segment(text: &str) -> Option<(PathSegment, &str)> {
    let rest = text.strip_prefix('<')?;
    let (archetype, rest) = take_token(rest);
    if archetype.is_empty() {
        return None;
    }

    let rest = rest.strip_prefix('>')?;
    let (name, rest) = take_token(rest);
    if name.is_empty() {
        return None;
    }

    let (index, rest) = match rest.strip_prefix('[') {
        Some(inner) => {
            let end = inner.find(']')?;
            let digits = &inner[..end];
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            // digits only, so a parsed index is never negative
            (Some(digits.parse::<i32>().ok()?), &inner[end + 1..])
        }
        None => (None, rest),
    };

    let segment = PathSegment {
        archetype: archetype.to_string(),
        name: name.to_string(),
        index,
    };
    Some((segment, rest))
}

/// Split off the longest prefix free of path delimiters.
fn take_token(text: &str) -> (&str, &str) {
    let end = text.find(['<', '>', '[', ']']).unwrap_or(text.len());
    text.split_at(end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_segment() {
        let path = NodePath::parse("<party.customerperson>firstName").unwrap();
        assert_eq!(path.depth(), 1);
        assert_eq!(path.root().archetype, "party.customerperson");
        assert_eq!(path.root().name, "firstName");
        assert_eq!(path.root().index, None);
        assert!(path.child(0).is_none());
    }

    #[test]
    fn test_parse_chain() {
        let path =
            NodePath::parse("<party.customerperson>contacts[0]<contact.location>address").unwrap();
        assert_eq!(path.depth(), 2);

        let root = path.root();
        assert_eq!(root.archetype, "party.customerperson");
        assert_eq!(root.name, "contacts");
        assert_eq!(root.index, Some(0));

        let child = path.child(0).unwrap();
        assert_eq!(child.archetype, "contact.location");
        assert_eq!(child.name, "address");
        assert_eq!(child.index, None);
        assert_eq!(path.leaf(), child);
    }

    #[test]
    fn test_depth_matches_segment_count() {
        let cases = [
            ("<a>b", 1),
            ("<a>b[3]", 1),
            ("<a>b[0]<c>d", 2),
            ("<a>b[1]<c>d[2]<e>f", 3),
            ("<act.customerAccountInvoiceItem>patient[0]<participation.patient>entity", 2),
        ];
        for (text, depth) in cases {
            let path = NodePath::parse(text).unwrap_or_else(|| panic!("failed to parse {text}"));
            assert_eq!(path.depth(), depth, "depth of {text}");
        }
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for text in [
            "",
            "<party.customerPerson>",
            "<party.customerPerson>[0]",
            "<party.customerPerson>xnode[0]ynode",
            "party.customerPerson>name",
            "<party.customerPerson name",
            "<>name",
            "<a>b[]",
            "<a>b[x]",
            "<a>b[-1]",
            "<a>b[0",
            "<a>b]",
            "<a>b[0]<c>",
            "<a>b[2147483648]",
            "<a>b[3000000000]<c>d",
            "[0]",
        ] {
            assert!(NodePath::parse(text).is_none(), "expected {text:?} to fail");
        }
    }

    #[test]
    fn test_parse_is_deterministic() {
        let text = "<party.customerperson>contacts[0]<contact.location>suburb";
        assert_eq!(NodePath::parse(text), NodePath::parse(text));
    }

    #[test]
    fn test_display_renders_path_text() {
        let text = "<party.customerperson>contacts[10]<contact.location>address";
        let path = NodePath::parse(text).unwrap();
        assert_eq!(path.to_string(), text);
    }

    #[test]
    fn test_output_index() {
        let path = NodePath::parse("<a>b[4]<c>d").unwrap();
        assert_eq!(path.root().output_index(), 4);
        assert_eq!(path.leaf().output_index(), -1);

        let path = NodePath::parse("<a>b[2147483647]").unwrap();
        assert_eq!(path.leaf().output_index(), i32::MAX);
    }
}
