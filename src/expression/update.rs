use crate::{
    attribute,
    error::{Error, Result},
    expression::{Expression, path::AttributePath, unique_placeholder},
    mapper::Marshaller,
    metadata::{ModelMetadata, PropertyMetadata},
    value::Value,
};

use aws_sdk_dynamodb::types;
use std::collections;

/// Clause keyword of an update statement. Declaration order is the canonical clause order.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum UpdateAction {
    /// `SET`
    Set,
    /// `REMOVE`
    Remove,
    /// `ADD`
    Add,
    /// `DELETE`
    Delete,
}

impl UpdateAction {
    /// Every action, in canonical order.
    pub const ALL: [Self; 4] = [Self::Set, Self::Remove, Self::Add, Self::Delete];

    /// Clause keyword.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Set => "SET",
            Self::Remove => "REMOVE",
            Self::Add => "ADD",
            Self::Delete => "DELETE",
        }
    }

    fn from_keyword(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|action| action.keyword().eq_ignore_ascii_case(token))
    }
}

/// Change applied to one attribute path.
#[derive(Clone, Debug, PartialEq)]
pub enum UpdateOperation {
    /// `SET #a = :a`; a value without attribute representation removes the attribute.
    Set(Value),
    /// `SET #a = if_not_exists(#a, :a)`
    SetIfNotExists(Value),
    /// `SET #a = #a + :a`
    IncrementBy(Value),
    /// `SET #a = #a - :a`
    DecrementBy(Value),
    /// `SET #a = list_append(#a, :a)`
    AppendToList(Value),
    /// `SET #a = list_append(:a, #a)`
    PrependToList(Value),
    /// `REMOVE #a`
    Remove,
    /// `REMOVE #a[1], #a[3]`
    RemoveFromListAt(Vec<usize>),
    /// `ADD #a :a`, to a number or a set.
    Add(Value),
    /// `DELETE #a :a`, from a set.
    RemoveFromSet(Value),
}

impl UpdateOperation {
    fn name(&self) -> &'static str {
        match self {
            Self::Set(_) => "set",
            Self::SetIfNotExists(_) => "set_if_not_exists",
            Self::IncrementBy(_) => "increment_by",
            Self::DecrementBy(_) => "decrement_by",
            Self::AppendToList(_) => "append_to_list",
            Self::PrependToList(_) => "prepend_to_list",
            Self::Remove => "remove",
            Self::RemoveFromListAt(_) => "remove_from_list_at",
            Self::Add(_) => "add",
            Self::RemoveFromSet(_) => "remove_from_set",
        }
    }
}

/// Update of one attribute path, built into an [`UpdateFragment`].
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateDefinition {
    /// Attribute path.
    pub path: String,
    /// Change to apply.
    pub operation: UpdateOperation,
}

/// Update expression fragment tagged with its clause keyword.
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateFragment {
    /// Clause the fragment belongs to.
    pub action: UpdateAction,
    /// Fragment statement, without its keyword.
    pub expression: Expression,
}

/// Fluent builder for an update of one attribute path.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UpdateBuilder {
    path: String,
}

/// Start an update of `path`.
///
/// ```rust
/// use dynamodb_mapper::{expression, mapper::Marshaller};
///
/// let marshaller = Marshaller::default();
/// let expression = expression::build_update(
///     &[
///         expression::update("name").set("Jane"),
///         expression::update("age").increment_by(1),
///         expression::update("tags").add(vec!["new"]),
///         expression::update("nick").remove(),
///     ],
///     None,
///     &marshaller,
/// )
/// .unwrap();
/// assert_eq!(
///     expression.statement,
///     "SET #name = :name, #age = #age + :age REMOVE #nick ADD #tags :tags"
/// );
/// ```
pub fn update(path: impl Into<String>) -> UpdateBuilder {
    UpdateBuilder { path: path.into() }
}

impl UpdateBuilder {
    fn operation(self, operation: UpdateOperation) -> UpdateDefinition {
        UpdateDefinition {
            path: self.path,
            operation,
        }
    }

    /// Assign a value.
    pub fn set(self, value: impl Into<Value>) -> UpdateDefinition {
        self.operation(UpdateOperation::Set(value.into()))
    }

    /// Assign a value unless the attribute already exists.
    pub fn set_if_not_exists(self, value: impl Into<Value>) -> UpdateDefinition {
        self.operation(UpdateOperation::SetIfNotExists(value.into()))
    }

    /// Add to a number.
    pub fn increment_by(self, value: impl Into<Value>) -> UpdateDefinition {
        self.operation(UpdateOperation::IncrementBy(value.into()))
    }

    /// Subtract from a number.
    pub fn decrement_by(self, value: impl Into<Value>) -> UpdateDefinition {
        self.operation(UpdateOperation::DecrementBy(value.into()))
    }

    /// Append elements to a list.
    pub fn append_to_list<I, T>(self, values: I) -> UpdateDefinition
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        let values = Value::List(values.into_iter().map(Into::into).collect());
        self.operation(UpdateOperation::AppendToList(values))
    }

    /// Prepend elements to a list.
    pub fn prepend_to_list<I, T>(self, values: I) -> UpdateDefinition
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        let values = Value::List(values.into_iter().map(Into::into).collect());
        self.operation(UpdateOperation::PrependToList(values))
    }

    /// Remove the attribute.
    pub fn remove(self) -> UpdateDefinition {
        self.operation(UpdateOperation::Remove)
    }

    /// Remove list elements by position.
    pub fn remove_from_list_at(self, indexes: impl IntoIterator<Item = usize>) -> UpdateDefinition {
        self.operation(UpdateOperation::RemoveFromListAt(indexes.into_iter().collect()))
    }

    /// Add to a number, or add elements to a set.
    pub fn add(self, value: impl Into<Value>) -> UpdateDefinition {
        self.operation(UpdateOperation::Add(value.into()))
    }

    /// Delete elements from a set.
    pub fn remove_from_set(self, value: impl Into<Value>) -> UpdateDefinition {
        self.operation(UpdateOperation::RemoveFromSet(value.into()))
    }
}

impl UpdateDefinition {
    /// Build the fragment, avoiding the value placeholders in `existing`.
    pub fn build(
        &self,
        existing: &collections::HashSet<String>,
        model: Option<&ModelMetadata>,
        marshaller: &Marshaller,
    ) -> Result<UpdateFragment> {
        let attribute_path: AttributePath = self.path.parse()?;
        let rendered = attribute_path.render(model);
        let property = attribute_path.operand_property(model);
        let operator = self.operation.name();
        let invalid = |message: String| Error::InvalidOperandType {
            path: self.path.clone(),
            operator: operator.to_string(),
            message,
        };
        let required = |attribute: Option<types::AttributeValue>, value: &Value| {
            attribute.ok_or_else(|| invalid(format!("{value:?} has no attribute value representation")))
        };
        let expect = |attribute: types::AttributeValue, expected: &[&str]| {
            let found = attribute::type_descriptor(&attribute);
            if expected.contains(&found) {
                Ok(attribute)
            } else {
                Err(invalid(format!("expected one of {expected:?}, found {found}")))
            }
        };

        let path = &rendered.statement;
        let value_placeholder =
            unique_placeholder(&rendered.value_placeholder, |candidate| existing.contains(candidate));
        let v = &value_placeholder;
        let (action, statement, attribute) = match &self.operation {
            UpdateOperation::Set(value) => match marshaller.to_db_one(value, property)? {
                Some(attribute) => (UpdateAction::Set, format!("{path} = {v}"), Some(attribute)),
                None => (UpdateAction::Remove, path.clone(), None),
            },
            UpdateOperation::SetIfNotExists(value) => {
                let attribute = required(marshaller.to_db_one(value, property)?, value)?;
                (
                    UpdateAction::Set,
                    format!("{path} = if_not_exists({path}, {v})"),
                    Some(attribute),
                )
            }
            UpdateOperation::IncrementBy(value) | UpdateOperation::DecrementBy(value) => {
                let attribute = expect(required(marshaller.to_db_one(value, None)?, value)?, &["N"])?;
                let sign = match self.operation {
                    UpdateOperation::IncrementBy(_) => '+',
                    _ => '-',
                };
                (
                    UpdateAction::Set,
                    format!("{path} = {path} {sign} {v}"),
                    Some(attribute),
                )
            }
            UpdateOperation::AppendToList(value) | UpdateOperation::PrependToList(value) => {
                if value.as_collection().is_none() {
                    return Err(invalid(format!("expected a list, found {value:?}")));
                }
                // list_append only accepts lists, whatever the elements look like
                let list_property = property
                    .cloned()
                    .unwrap_or_else(|| PropertyMetadata::new(self.path.clone()))
                    .sorted();
                let attribute = expect(
                    required(marshaller.to_db_one(value, Some(&list_property))?, value)?,
                    &["L"],
                )?;
                let statement = match self.operation {
                    UpdateOperation::AppendToList(_) => format!("{path} = list_append({path}, {v})"),
                    _ => format!("{path} = list_append({v}, {path})"),
                };
                (UpdateAction::Set, statement, Some(attribute))
            }
            UpdateOperation::Remove => (UpdateAction::Remove, path.clone(), None),
            UpdateOperation::RemoveFromListAt(indexes) => {
                if indexes.is_empty() {
                    return Err(Error::InvalidOperandCount {
                        path: self.path.clone(),
                        operator: operator.to_string(),
                        expected: 1,
                        found: 0,
                    });
                }
                let mut indexes = indexes.clone();
                indexes.sort_unstable();
                indexes.dedup();
                let statement = indexes
                    .iter()
                    .map(|index| format!("{path}[{index}]"))
                    .collect::<Vec<_>>()
                    .join(", ");
                (UpdateAction::Remove, statement, None)
            }
            UpdateOperation::Add(value) => {
                let attribute = expect(
                    required(marshaller.to_db_one(value, property)?, value)?,
                    &["N", "SS", "NS", "BS"],
                )?;
                (UpdateAction::Add, format!("{path} {v}"), Some(attribute))
            }
            UpdateOperation::RemoveFromSet(value) => {
                let attribute = expect(
                    required(marshaller.to_db_one(value, property)?, value)?,
                    &["SS", "NS", "BS"],
                )?;
                (UpdateAction::Delete, format!("{path} {v}"), Some(attribute))
            }
        };
        let attribute_values = attribute
            .map(|attribute| collections::HashMap::from([(value_placeholder.clone(), attribute)]))
            .unwrap_or_default();
        Ok(UpdateFragment {
            action,
            expression: Expression {
                statement,
                attribute_names: rendered.attribute_names,
                attribute_values,
            },
        })
    }
}

type Clauses = collections::BTreeMap<UpdateAction, Vec<String>>;

fn render_clauses(clauses: &Clauses) -> String {
    clauses
        .iter()
        .filter(|(_, statements)| !statements.is_empty())
        .map(|(action, statements)| format!("{} {}", action.keyword(), statements.join(", ")))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Group fragments by clause keyword into one update expression.
///
/// Groups are rendered in `SET`, `REMOVE`, `ADD`, `DELETE` order, each group's
/// statements joined with `", "`. Colliding value placeholders of later
/// fragments are renamed.
pub fn prepare_update(fragments: impl IntoIterator<Item = UpdateFragment>) -> Expression {
    let mut merged = Expression::default();
    let mut taken = collections::HashSet::new();
    let mut clauses = Clauses::new();
    for fragment in fragments {
        let expression = fragment.expression.rename_values(&taken);
        taken.extend(expression.attribute_values.keys().cloned());
        let statement = merged.absorb(expression);
        clauses.entry(fragment.action).or_default().push(statement);
    }
    merged.statement = render_clauses(&clauses);
    merged
}

/// Build every definition and group the fragments into one update expression.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(name = "dynamodb_mapper.build_update", level = "trace", skip_all, err)
)]
pub fn build_update(
    definitions: &[UpdateDefinition],
    model: Option<&ModelMetadata>,
    marshaller: &Marshaller,
) -> Result<Expression> {
    let mut taken = collections::HashSet::new();
    let mut fragments = Vec::with_capacity(definitions.len());
    for definition in definitions {
        let fragment = definition.build(&taken, model, marshaller)?;
        taken.extend(fragment.expression.attribute_values.keys().cloned());
        fragments.push(fragment);
    }
    Ok(prepare_update(fragments))
}

/// Split a statement into its clauses. Keywords are whole whitespace-separated tokens,
/// so placeholders such as `#SET` never start a clause. A bare word anywhere else, or
/// a keyword with no body, raises [`Error::UnknownActionKeyword`].
fn parse_clauses(statement: &str, clauses: &mut Clauses) -> Result<()> {
    type Clause<'a> = (UpdateAction, &'a str, Vec<&'a str>);

    /// Store a finished clause, or hand back its keyword when it has no body.
    fn flush<'a>(current: Option<Clause<'a>>, clauses: &mut Clauses) -> Result<(), &'a str> {
        match current {
            Some((_, keyword, tokens)) if tokens.is_empty() => Err(keyword),
            Some((action, _, tokens)) => {
                clauses.entry(action).or_default().push(tokens.join(" "));
                Ok(())
            }
            None => Ok(()),
        }
    }

    let unknown = |keyword: &str| Error::UnknownActionKeyword {
        keyword: keyword.to_string(),
        statement: statement.to_string(),
    };
    let mut current: Option<Clause<'_>> = None;
    for token in statement.split_whitespace() {
        if let Some(action) = UpdateAction::from_keyword(token) {
            flush(current.take(), clauses).map_err(unknown)?;
            current = Some((action, token, Vec::new()));
            continue;
        }
        let is_word = token.chars().all(|c| c.is_ascii_alphabetic());
        match current.as_mut() {
            Some((_, _, tokens)) if !is_word => tokens.push(token),
            _ => return Err(unknown(token)),
        }
    }
    flush(current, clauses).map_err(unknown)
}

/// Union two built update statements clause by clause.
///
/// ```rust
/// use dynamodb_mapper::expression::merge_update_statements;
///
/// let merged = merge_update_statements("SET #a = :a ADD #c :c", "REMOVE #d SET #b = :b").unwrap();
/// assert_eq!(merged, "SET #a = :a, #b = :b REMOVE #d ADD #c :c");
/// assert!(merge_update_statements("UPSERT #a = :a", "").is_err());
/// ```
pub fn merge_update_statements(first: &str, second: &str) -> Result<String> {
    let mut clauses = Clauses::new();
    parse_clauses(first, &mut clauses)?;
    parse_clauses(second, &mut clauses)?;
    Ok(render_clauses(&clauses))
}

/// Union two update expressions; the second one's colliding value placeholders are renamed.
pub fn merge_update_expressions(first: Expression, second: Expression) -> Result<Expression> {
    let mut merged = first;
    let first_statement = std::mem::take(&mut merged.statement);
    let taken = merged.attribute_values.keys().cloned().collect();
    let second_statement = merged.absorb(second.rename_values(&taken));
    merged.statement = merge_update_statements(&first_statement, &second_statement)?;
    Ok(merged)
}
