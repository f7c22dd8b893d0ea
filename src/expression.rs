//! Condition, update and projection expressions.
//!
//! Every expression is a statement plus the placeholder side tables the store
//! requires: `#name` placeholders map to attribute names and `:value`
//! placeholders map to attribute values. Value placeholders are derived from the
//! attribute path and disambiguated with `_2`, `_3`, ... so fragments can be
//! composed without collisions. Name placeholders are derived from the stored
//! attribute name and get the same suffixes when two names sanitize alike.

/// Condition fragments and their AND / OR / NOT composition.
pub mod condition;

/// Attribute path parsing.
pub mod path;

/// Projection expressions.
pub mod projection;

/// Update fragments and update statement merging.
pub mod update;

pub use condition::{
    Comparator, Condition, ConditionBuilder, ConditionOperator, LogicalOperator, and, attribute,
    build_condition, key_condition, not, or,
};
pub use path::AttributePath;
pub use projection::projection;
pub use update::{
    UpdateAction, UpdateBuilder, UpdateDefinition, UpdateFragment, UpdateOperation, build_update,
    merge_update_expressions, merge_update_statements, prepare_update, update,
};

use aws_sdk_dynamodb::types;
use std::collections;

/// A statement with its attribute name and value placeholders.
///
/// ```rust
/// use dynamodb_mapper::{expression, mapper::Marshaller};
///
/// let expression = expression::attribute("id")
///     .attribute_not_exists()
///     .to_expression(None, &Marshaller::default())
///     .unwrap();
/// assert_eq!(expression.statement, "attribute_not_exists (#id)");
/// assert_eq!(expression.attribute_names["#id"], "id");
/// assert!(expression.attribute_values.is_empty());
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Expression {
    /// Statement text.
    pub statement: String,
    /// Attribute name placeholders (`#name`) to attribute names.
    pub attribute_names: collections::HashMap<String, String>,
    /// Attribute value placeholders (`:value`) to attribute values.
    pub attribute_values: collections::HashMap<String, types::AttributeValue>,
}

impl Expression {
    /// Move the placeholders into a request's side tables and return the statement.
    ///
    /// Placeholders already taken in the side tables by another name or value are
    /// renamed first.
    pub fn merge_into(
        self,
        names: &mut Option<collections::HashMap<String, String>>,
        values: &mut Option<collections::HashMap<String, types::AttributeValue>>,
    ) -> String {
        let mut expression = self;
        if let Some(existing) = names.as_ref() {
            expression = expression.rename_names(existing);
        }
        if let Some(existing) = values.as_ref() {
            let taken = existing.keys().cloned().collect();
            expression = expression.rename_values(&taken);
        }
        expression.merge_unchecked(names, values)
    }

    fn merge_unchecked(
        self,
        names: &mut Option<collections::HashMap<String, String>>,
        values: &mut Option<collections::HashMap<String, types::AttributeValue>>,
    ) -> String {
        if !self.attribute_names.is_empty() {
            match names {
                Some(existing) => existing.extend(self.attribute_names),
                None => *names = Some(self.attribute_names),
            }
        }
        if !self.attribute_values.is_empty() {
            match values {
                Some(existing) => existing.extend(self.attribute_values),
                None => *values = Some(self.attribute_values),
            }
        }
        self.statement
    }

    /// Rename every value placeholder found in `taken`, rewriting the statement accordingly.
    pub(crate) fn rename_values(mut self, taken: &collections::HashSet<String>) -> Self {
        let colliding: Vec<String> = self
            .attribute_values
            .keys()
            .filter(|placeholder| taken.contains(*placeholder))
            .cloned()
            .collect();
        if colliding.is_empty() {
            return self;
        }
        let mut renames = collections::HashMap::with_capacity(colliding.len());
        for placeholder in colliding {
            let renamed = unique_placeholder(&placeholder, |candidate| {
                taken.contains(candidate)
                    || self.attribute_values.contains_key(candidate)
                    || renames.values().any(|renamed: &String| renamed == candidate)
            });
            renames.insert(placeholder, renamed);
        }
        self.statement = replace_placeholders(&self.statement, ':', &renames);
        self.attribute_values = self
            .attribute_values
            .into_iter()
            .map(|(placeholder, value)| match renames.get(&placeholder) {
                Some(renamed) => (renamed.clone(), value),
                None => (placeholder, value),
            })
            .collect();
        self
    }

    /// Rename every name placeholder `taken` maps to a different attribute name.
    pub(crate) fn rename_names(mut self, taken: &collections::HashMap<String, String>) -> Self {
        let colliding: Vec<(String, String)> = self
            .attribute_names
            .iter()
            .filter(|(placeholder, name)| {
                taken.get(*placeholder).is_some_and(|existing| existing != *name)
            })
            .map(|(placeholder, name)| (placeholder.clone(), name.clone()))
            .collect();
        if colliding.is_empty() {
            return self;
        }
        let mut renames = collections::HashMap::with_capacity(colliding.len());
        for (placeholder, name) in colliding {
            let renamed = unique_placeholder(&placeholder, |candidate| {
                taken.get(candidate).is_some_and(|existing| *existing != name)
                    || self.attribute_names.contains_key(candidate)
                    || renames.values().any(|renamed: &String| renamed == candidate)
            });
            renames.insert(placeholder, renamed);
        }
        self.statement = replace_placeholders(&self.statement, '#', &renames);
        self.attribute_names = self
            .attribute_names
            .into_iter()
            .map(|(placeholder, name)| match renames.get(&placeholder) {
                Some(renamed) => (renamed.clone(), name),
                None => (placeholder, name),
            })
            .collect();
        self
    }

    /// Absorb another expression's placeholders, returning its statement.
    /// Its name placeholders bound to another attribute here are renamed.
    pub(crate) fn absorb(&mut self, other: Self) -> String {
        let other = other.rename_names(&self.attribute_names);
        self.attribute_names.extend(other.attribute_names);
        self.attribute_values.extend(other.attribute_values);
        other.statement
    }
}

/// First of `base`, `base_2`, `base_3`, ... not rejected by `is_taken`.
pub(crate) fn unique_placeholder(base: &str, is_taken: impl Fn(&str) -> bool) -> String {
    if !is_taken(base) {
        return base.to_string();
    }
    (2..)
        .map(|suffix| format!("{base}_{suffix}"))
        .find(|candidate| !is_taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

fn is_placeholder_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Replace whole placeholder tokens starting with `sigil`, leaving longer tokens
/// sharing a prefix untouched.
pub(crate) fn replace_placeholders(
    statement: &str,
    sigil: char,
    renames: &collections::HashMap<String, String>,
) -> String {
    let mut output = String::with_capacity(statement.len());
    let mut chars = statement.char_indices().peekable();
    while let Some((start, c)) = chars.next() {
        if c != sigil {
            output.push(c);
            continue;
        }
        let mut end = start + c.len_utf8();
        while let Some(&(position, next)) = chars.peek() {
            if !is_placeholder_char(next) {
                break;
            }
            end = position + next.len_utf8();
            chars.next();
        }
        let token = &statement[start..end];
        output.push_str(renames.get(token).map_or(token, String::as_str));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case::free(&[], ":a")]
    #[case::taken(&[":a"], ":a_2")]
    #[case::taken_twice(&[":a", ":a_2"], ":a_3")]
    fn test_unique_placeholder(#[case] taken: &[&str], #[case] expected: &str) {
        assert_eq!(unique_placeholder(":a", |candidate| taken.contains(&candidate)), expected);
    }

    #[test]
    fn test_replace_placeholders_whole_tokens() {
        let renames = collections::HashMap::from([(":a".to_string(), ":a_3".to_string())]);
        let actual = replace_placeholders("#a BETWEEN :a AND :a_2", ':', &renames);
        assert_eq!(actual, "#a BETWEEN :a_3 AND :a_2");
    }

    #[test]
    fn test_rename_values() {
        let expression = Expression {
            statement: "#a BETWEEN :a AND :a_2".to_string(),
            attribute_names: collections::HashMap::from([("#a".to_string(), "a".to_string())]),
            attribute_values: collections::HashMap::from([
                (":a".to_string(), types::AttributeValue::N("1".to_string())),
                (":a_2".to_string(), types::AttributeValue::N("2".to_string())),
            ]),
        };
        let taken = collections::HashSet::from([":a".to_string()]);
        let actual = expression.rename_values(&taken);
        assert_eq!(actual.statement, "#a BETWEEN :a_3 AND :a_2");
        assert_eq!(
            actual.attribute_values,
            collections::HashMap::from([
                (":a_3".to_string(), types::AttributeValue::N("1".to_string())),
                (":a_2".to_string(), types::AttributeValue::N("2".to_string())),
            ])
        );
    }

    #[test]
    fn test_rename_names() {
        let expression = Expression {
            statement: "#a_b.#c = :a_b".to_string(),
            attribute_names: collections::HashMap::from([
                ("#a_b".to_string(), "a_b".to_string()),
                ("#c".to_string(), "c".to_string()),
            ]),
            ..Default::default()
        };
        let taken = collections::HashMap::from([
            ("#a_b".to_string(), "a-b".to_string()),
            ("#c".to_string(), "c".to_string()),
        ]);
        let actual = expression.rename_names(&taken);
        assert_eq!(actual.statement, "#a_b_2.#c = :a_b");
        assert_eq!(
            actual.attribute_names,
            collections::HashMap::from([
                ("#a_b_2".to_string(), "a_b".to_string()),
                ("#c".to_string(), "c".to_string()),
            ])
        );
    }

    #[test]
    fn test_merge_into_renames_taken_placeholders() {
        let expression = Expression {
            statement: "#a_b = :a_b".to_string(),
            attribute_names: collections::HashMap::from([("#a_b".to_string(), "a_b".to_string())]),
            attribute_values: collections::HashMap::from([(
                ":a_b".to_string(),
                types::AttributeValue::N("2".to_string()),
            )]),
        };
        let mut names = Some(collections::HashMap::from([(
            "#a_b".to_string(),
            "a-b".to_string(),
        )]));
        let mut values = Some(collections::HashMap::from([(
            ":a_b".to_string(),
            types::AttributeValue::N("1".to_string()),
        )]));
        let statement = expression.merge_into(&mut names, &mut values);
        assert_eq!(statement, "#a_b_2 = :a_b_2");
        assert_eq!(names.unwrap()["#a_b_2"], "a_b");
        assert_eq!(
            values.unwrap()[":a_b_2"],
            types::AttributeValue::N("2".to_string())
        );
    }

    #[test]
    fn test_merge_into() {
        let expression = Expression {
            statement: "#a = :a".to_string(),
            attribute_names: collections::HashMap::from([("#a".to_string(), "a".to_string())]),
            attribute_values: collections::HashMap::from([(
                ":a".to_string(),
                types::AttributeValue::Bool(true),
            )]),
        };
        let mut names = Some(collections::HashMap::from([("#b".to_string(), "b".to_string())]));
        let mut values = None;
        let statement = expression.merge_into(&mut names, &mut values);
        assert_eq!(statement, "#a = :a");
        assert_eq!(names.unwrap().len(), 2);
        assert_eq!(values.unwrap().len(), 1);
    }
}
