use crate::{
    error::{Error, Result},
    expression::unique_placeholder,
    metadata::{ModelMetadata, PropertyMetadata},
};

use std::{collections, fmt, str};

/// One dotted segment of an attribute path, with its list indexes.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct PathSegment {
    /// Attribute name.
    pub name: String,
    /// List indexes applied to the attribute, outermost first.
    pub indexes: Vec<usize>,
}

/// Parsed attribute path such as `a.b[2]`.
///
/// ```rust
/// use dynamodb_mapper::expression::AttributePath;
///
/// let path: AttributePath = "person.addresses[1].street".parse().unwrap();
/// assert_eq!(path.segments.len(), 3);
/// assert_eq!(path.segments[1].indexes, vec![1]);
/// assert!("person..street".parse::<AttributePath>().is_err());
/// ```
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct AttributePath {
    /// Segments, outermost first. Never empty.
    pub segments: Vec<PathSegment>,
}

/// Placeholder rendering of a path.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct RenderedPath {
    /// Path with every segment replaced by its `#name` placeholder.
    pub statement: String,
    pub attribute_names: collections::HashMap<String, String>,
    /// Base value placeholder (`:name`) for operands of this path.
    pub value_placeholder: String,
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

fn parse_segment(path: &str, raw: &str) -> Result<PathSegment> {
    let invalid = || Error::InvalidAttributePath {
        path: path.to_string(),
    };
    let (name, mut rest) = match raw.find('[') {
        Some(position) => (&raw[..position], &raw[position..]),
        None => (raw, ""),
    };
    if name.is_empty() || name.contains(']') {
        return Err(invalid());
    }
    let mut indexes = Vec::new();
    while !rest.is_empty() {
        let inner = rest.strip_prefix('[').ok_or_else(invalid)?;
        let close = inner.find(']').ok_or_else(invalid)?;
        let index = inner[..close].parse::<usize>().map_err(|_| invalid())?;
        indexes.push(index);
        rest = &inner[close + 1..];
    }
    Ok(PathSegment {
        name: name.to_string(),
        indexes,
    })
}

impl str::FromStr for AttributePath {
    type Err = Error;

    fn from_str(path: &str) -> Result<Self> {
        if path.trim().is_empty() {
            return Err(Error::InvalidAttributePath {
                path: path.to_string(),
            });
        }
        let segments = path
            .split('.')
            .map(|raw| parse_segment(path, raw))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { segments })
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.segments.iter().enumerate() {
            if position > 0 {
                f.write_str(".")?;
            }
            f.write_str(&segment.name)?;
            for index in &segment.indexes {
                write!(f, "[{index}]")?;
            }
        }
        Ok(())
    }
}

impl AttributePath {
    /// Whether the path addresses a top-level attribute as a whole.
    pub fn is_plain(&self) -> bool {
        matches!(self.segments.as_slice(), [segment] if segment.indexes.is_empty())
    }

    /// Metadata of the top-level property the path starts at.
    pub fn property<'a>(&self, model: Option<&'a ModelMetadata>) -> Option<&'a PropertyMetadata> {
        let segment = self.segments.first()?;
        model?.property(&segment.name)
    }

    /// Metadata to convert operands with: only a path naming the whole property qualifies.
    pub(crate) fn operand_property<'a>(
        &self,
        model: Option<&'a ModelMetadata>,
    ) -> Option<&'a PropertyMetadata> {
        if self.is_plain() { self.property(model) } else { None }
    }

    /// Placeholders for the path, with the top-level name mapped to its stored name.
    pub(crate) fn render(&self, model: Option<&ModelMetadata>) -> RenderedPath {
        let mut rendered = RenderedPath::default();
        let mut value_parts = Vec::with_capacity(self.segments.len());
        for (position, segment) in self.segments.iter().enumerate() {
            let name = match (position, self.property(model)) {
                (0, Some(property)) => property.name_db.as_str(),
                _ => segment.name.as_str(),
            };
            let base = format!("#{}", sanitize(name));
            let placeholder = unique_placeholder(&base, |candidate| {
                rendered
                    .attribute_names
                    .get(candidate)
                    .is_some_and(|existing| existing != name)
            });
            if position > 0 {
                rendered.statement.push('.');
            }
            rendered.statement.push_str(&placeholder);
            let mut value_part = sanitize(name);
            for index in &segment.indexes {
                rendered.statement.push_str(&format!("[{index}]"));
                value_part.push_str(&format!("_at_{index}"));
            }
            value_parts.push(value_part);
            rendered.attribute_names.insert(placeholder, name.to_string());
        }
        rendered.value_placeholder = format!(":{}", value_parts.join("__"));
        rendered
    }
}
