use crate::{
    attribute,
    error::{Error, Result},
    expression::{Expression, path::AttributePath, unique_placeholder},
    mapper::Marshaller,
    metadata::{ItemType, ModelMetadata, PropertyMetadata, PropertyType},
    value::Value,
};

use aws_sdk_dynamodb::types;
use std::{collections, fmt, ops};

/// Logical operator for combining conditions.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LogicalOperator {
    /// All conditions must hold.
    And,
    /// At least one condition must hold.
    Or,
}

impl ops::Deref for LogicalOperator {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::And => " AND ",
            Self::Or => " OR ",
        }
    }
}

/// Binary comparison, standalone or applied to `size`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Comparator {
    /// `=`
    Equals,
    /// `<>`
    NotEquals,
    /// `<`
    LessThan,
    /// `<=`
    LessThanOrEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanOrEqual,
}

impl Comparator {
    /// Comparison symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::NotEquals => "<>",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
        }
    }
}

/// Operator of a single-attribute condition.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ConditionOperator {
    /// `#a = :a`
    Equals,
    /// `#a <> :a`
    NotEquals,
    /// `#a < :a`
    LessThan,
    /// `#a <= :a`
    LessThanOrEqual,
    /// `#a > :a`
    GreaterThan,
    /// `#a >= :a`
    GreaterThanOrEqual,
    /// `#a BETWEEN :a AND :a_2`
    Between,
    /// `#a IN (:a,:a_2)`; the single operand is the list of candidates.
    ///
    /// Each candidate becomes its own attribute value, converted with the
    /// property's metadata, or with none when the property is declared as a list
    /// or set, so candidates never take a collection shape.
    In,
    /// `attribute_exists (#a)`
    AttributeExists,
    /// `attribute_not_exists (#a)`
    AttributeNotExists,
    /// `attribute_type (#a, :a)`; the operand is a type descriptor such as `"SS"`.
    AttributeType,
    /// `begins_with (#a, :a)`
    BeginsWith,
    /// `contains (#a, :a)`
    Contains,
    /// `size (#a) > :a`
    Size(Comparator),
}

type Render = fn(&str, &str, &[String]) -> String;

/// Arity and rendering of one operator.
struct OperatorInfo {
    keyword: &'static str,
    arity: usize,
    render: Render,
}

fn render_infix(keyword: &str, path: &str, values: &[String]) -> String {
    format!("{path} {keyword} {}", values.join(" "))
}

fn render_between(keyword: &str, path: &str, values: &[String]) -> String {
    format!("{path} {keyword} {}", values.join(" AND "))
}

fn render_in(keyword: &str, path: &str, values: &[String]) -> String {
    format!("{path} {keyword} ({})", values.join(","))
}

fn render_function(keyword: &str, path: &str, values: &[String]) -> String {
    match values {
        [] => format!("{keyword} ({path})"),
        values => format!("{keyword} ({path}, {})", values.join(", ")),
    }
}

fn render_size(keyword: &str, path: &str, values: &[String]) -> String {
    format!("size ({path}) {keyword} {}", values.join(" "))
}

impl ConditionOperator {
    fn info(self) -> OperatorInfo {
        let (keyword, arity, render): (&'static str, usize, Render) = match self {
            Self::Equals => ("=", 1, render_infix),
            Self::NotEquals => ("<>", 1, render_infix),
            Self::LessThan => ("<", 1, render_infix),
            Self::LessThanOrEqual => ("<=", 1, render_infix),
            Self::GreaterThan => (">", 1, render_infix),
            Self::GreaterThanOrEqual => (">=", 1, render_infix),
            Self::Between => ("BETWEEN", 2, render_between),
            Self::In => ("IN", 1, render_in),
            Self::AttributeExists => ("attribute_exists", 0, render_function),
            Self::AttributeNotExists => ("attribute_not_exists", 0, render_function),
            Self::AttributeType => ("attribute_type", 1, render_function),
            Self::BeginsWith => ("begins_with", 1, render_function),
            Self::Contains => ("contains", 1, render_function),
            Self::Size(comparator) => (comparator.symbol(), 1, render_size),
        };
        OperatorInfo {
            keyword,
            arity,
            render,
        }
    }

    /// Number of operands the operator takes.
    pub fn arity(self) -> usize {
        self.info().arity
    }

    /// Whether the operator may appear in a key condition.
    pub fn is_key_operator(self) -> bool {
        matches!(
            self,
            Self::Equals
                | Self::LessThan
                | Self::LessThanOrEqual
                | Self::GreaterThan
                | Self::GreaterThanOrEqual
                | Self::Between
                | Self::BeginsWith
        )
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Size(comparator) => write!(f, "size {}", comparator.symbol()),
            other => f.write_str(other.info().keyword),
        }
    }
}

const TYPE_DESCRIPTORS: [&str; 10] = ["S", "SS", "N", "NS", "B", "BS", "BOOL", "NULL", "L", "M"];

/// Property metadata suitable for converting a single element: collection metadata is dropped.
fn scalar_property(property: Option<&PropertyMetadata>) -> Option<&PropertyMetadata> {
    property.filter(|property| {
        !matches!(
            property.declared_type(),
            Some(PropertyType::Array | PropertyType::Set)
        )
    })
}

/// Build one condition fragment.
///
/// Value placeholders are derived from the path and disambiguated against
/// `existing` by appending `_2`, `_3`, ... so the fragment can be merged with
/// others without collisions.
///
/// ```rust
/// use dynamodb_mapper::{
///     expression::{ConditionOperator, condition::build_condition},
///     mapper::Marshaller,
///     value::Value,
/// };
/// use std::collections::HashSet;
///
/// let existing = HashSet::from([":age".to_string()]);
/// let expression = build_condition(
///     "age",
///     ConditionOperator::Between,
///     &[Value::from(18), Value::from(65)],
///     &existing,
///     None,
///     &Marshaller::default(),
/// )
/// .unwrap();
/// assert_eq!(expression.statement, "#age BETWEEN :age_2 AND :age_3");
/// ```
pub fn build_condition(
    path: &str,
    operator: ConditionOperator,
    operands: &[Value],
    existing: &collections::HashSet<String>,
    model: Option<&ModelMetadata>,
    marshaller: &Marshaller,
) -> Result<Expression> {
    let info = operator.info();
    if operands.len() != info.arity {
        return Err(Error::InvalidOperandCount {
            path: path.to_string(),
            operator: operator.to_string(),
            expected: info.arity,
            found: operands.len(),
        });
    }
    let attribute_path: AttributePath = path.parse()?;
    let rendered = attribute_path.render(model);
    let property = attribute_path.operand_property(model);
    let invalid = |message: String| Error::InvalidOperandType {
        path: path.to_string(),
        operator: operator.to_string(),
        message,
    };
    let convert = |value: &Value, property: Option<&PropertyMetadata>| -> Result<types::AttributeValue> {
        marshaller
            .to_db_one(value, property)?
            .ok_or_else(|| invalid(format!("{value:?} has no attribute value representation")))
    };

    let attributes = match operator {
        ConditionOperator::AttributeExists | ConditionOperator::AttributeNotExists => Vec::new(),
        ConditionOperator::In => {
            let candidates = operands[0]
                .as_collection()
                .ok_or_else(|| invalid(format!("expected a list of candidates, found {:?}", operands[0])))?;
            if candidates.is_empty() {
                return Err(invalid("expected at least one candidate".to_string()));
            }
            candidates
                .iter()
                .map(|candidate| convert(candidate, scalar_property(property)))
                .collect::<Result<Vec<_>>>()?
        }
        ConditionOperator::AttributeType => match &operands[0] {
            Value::String(descriptor) if TYPE_DESCRIPTORS.contains(&descriptor.as_str()) => {
                vec![types::AttributeValue::S(descriptor.clone())]
            }
            other => return Err(invalid(format!("{other:?} is not an attribute type descriptor"))),
        },
        ConditionOperator::BeginsWith => {
            let attribute = convert(&operands[0], None)?;
            if !matches!(attribute, types::AttributeValue::S(_) | types::AttributeValue::B(_)) {
                return Err(invalid(format!(
                    "expected a string or binary prefix, found {}",
                    attribute::type_descriptor(&attribute)
                )));
            }
            vec![attribute]
        }
        ConditionOperator::Contains => {
            let attribute = convert(&operands[0], None)?;
            let expected = match property.and_then(PropertyMetadata::item_type) {
                Some(ItemType::String) => Some("S"),
                Some(ItemType::Number) => Some("N"),
                Some(ItemType::Binary) => Some("B"),
                Some(ItemType::Model(item_model)) => {
                    return Err(invalid(format!("items of model {item_model} cannot be searched")));
                }
                None => match property.and_then(PropertyMetadata::declared_type) {
                    Some(PropertyType::String) => Some("S"),
                    _ => None,
                },
            };
            let found = attribute::type_descriptor(&attribute);
            if !attribute::is_key_type(&attribute) || expected.is_some_and(|expected| expected != found) {
                return Err(invalid(format!(
                    "expected a {} operand, found {found}",
                    expected.unwrap_or("string, number or binary")
                )));
            }
            vec![attribute]
        }
        ConditionOperator::Between => {
            let low = convert(&operands[0], scalar_property(property))?;
            let high = convert(&operands[1], scalar_property(property))?;
            let (low_type, high_type) = (
                attribute::type_descriptor(&low),
                attribute::type_descriptor(&high),
            );
            if !attribute::is_key_type(&low) || low_type != high_type {
                return Err(invalid(format!(
                    "bounds must share a string, number or binary type, found {low_type} and {high_type}"
                )));
            }
            vec![low, high]
        }
        ConditionOperator::Size(_) => {
            let attribute = convert(&operands[0], None)?;
            if !matches!(attribute, types::AttributeValue::N(_)) {
                return Err(invalid(format!(
                    "expected a number, found {}",
                    attribute::type_descriptor(&attribute)
                )));
            }
            vec![attribute]
        }
        ConditionOperator::Equals
        | ConditionOperator::NotEquals
        | ConditionOperator::LessThan
        | ConditionOperator::LessThanOrEqual
        | ConditionOperator::GreaterThan
        | ConditionOperator::GreaterThanOrEqual => vec![convert(&operands[0], property)?],
    };

    let mut attribute_values = collections::HashMap::with_capacity(attributes.len());
    let mut placeholders = Vec::with_capacity(attributes.len());
    for attribute in attributes {
        let placeholder = unique_placeholder(&rendered.value_placeholder, |candidate| {
            existing.contains(candidate) || attribute_values.contains_key(candidate)
        });
        attribute_values.insert(placeholder.clone(), attribute);
        placeholders.push(placeholder);
    }
    Ok(Expression {
        statement: (info.render)(info.keyword, &rendered.statement, &placeholders),
        attribute_names: rendered.attribute_names,
        attribute_values,
    })
}

/// Condition tree, evaluated into an [`Expression`] by [`Condition::build`].
///
/// ```rust
/// use dynamodb_mapper::{expression, mapper::Marshaller};
///
/// let condition = expression::and([
///     expression::not(expression::attribute("topics").contains("z")),
///     expression::attribute("name").begins_with("Sta"),
/// ]);
/// let expression = condition.to_expression(None, &Marshaller::default()).unwrap();
/// assert_eq!(
///     expression.statement,
///     "(NOT contains (#topics, :topics) AND begins_with (#name, :name))"
/// );
/// assert_eq!(expression.attribute_values.len(), 2);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    /// Single-attribute fragment.
    Leaf {
        /// Attribute path.
        path: String,
        /// Operator.
        operator: ConditionOperator,
        /// Operands, as many as the operator's arity.
        operands: Vec<Value>,
    },
    /// Every condition must hold.
    And(Vec<Condition>),
    /// At least one condition must hold.
    Or(Vec<Condition>),
    /// The condition must not hold.
    Not(Box<Condition>),
    /// Fragment built earlier; its value placeholders are renamed on collision.
    Built(Expression),
}

impl Condition {
    /// Evaluate the tree, avoiding the value placeholders in `existing`.
    pub fn build(
        &self,
        existing: &collections::HashSet<String>,
        model: Option<&ModelMetadata>,
        marshaller: &Marshaller,
    ) -> Result<Expression> {
        match self {
            Self::Leaf {
                path,
                operator,
                operands,
            } => build_condition(path, *operator, operands, existing, model, marshaller),
            Self::And(conditions) => {
                compose(conditions, LogicalOperator::And, existing, model, marshaller)
            }
            Self::Or(conditions) => {
                compose(conditions, LogicalOperator::Or, existing, model, marshaller)
            }
            Self::Not(condition) => {
                let mut expression = condition.build(existing, model, marshaller)?;
                expression.statement = format!("NOT {}", expression.statement);
                Ok(expression)
            }
            Self::Built(expression) => Ok(expression.clone().rename_values(existing)),
        }
    }

    /// Evaluate the tree on its own.
    pub fn to_expression(
        &self,
        model: Option<&ModelMetadata>,
        marshaller: &Marshaller,
    ) -> Result<Expression> {
        self.build(&collections::HashSet::new(), model, marshaller)
    }

    /// `self AND other`.
    pub fn and(self, other: Condition) -> Condition {
        match self {
            Self::And(mut conditions) => {
                conditions.push(other);
                Self::And(conditions)
            }
            condition => Self::And(vec![condition, other]),
        }
    }

    /// `self OR other`.
    pub fn or(self, other: Condition) -> Condition {
        match self {
            Self::Or(mut conditions) => {
                conditions.push(other);
                Self::Or(conditions)
            }
            condition => Self::Or(vec![condition, other]),
        }
    }
}

impl ops::Not for Condition {
    type Output = Condition;

    fn not(self) -> Self::Output {
        not(self)
    }
}

impl From<Expression> for Condition {
    fn from(expression: Expression) -> Self {
        Self::Built(expression)
    }
}

/// Merge fragments left to right; earlier fragments keep their placeholder names.
fn compose(
    conditions: &[Condition],
    operator: LogicalOperator,
    existing: &collections::HashSet<String>,
    model: Option<&ModelMetadata>,
    marshaller: &Marshaller,
) -> Result<Expression> {
    let mut merged = Expression::default();
    let mut taken = existing.clone();
    let mut statements = Vec::with_capacity(conditions.len());
    for condition in conditions {
        let expression = condition.build(&taken, model, marshaller)?;
        taken.extend(expression.attribute_values.keys().cloned());
        statements.push(merged.absorb(expression));
    }
    merged.statement = match statements.len() {
        0 => String::new(),
        1 => statements.remove(0),
        _ => format!("({})", statements.join(&*operator)),
    };
    Ok(merged)
}

/// All conditions must hold. A single condition is returned as is when built.
pub fn and(conditions: impl IntoIterator<Item = Condition>) -> Condition {
    Condition::And(conditions.into_iter().collect())
}

/// At least one condition must hold.
pub fn or(conditions: impl IntoIterator<Item = Condition>) -> Condition {
    Condition::Or(conditions.into_iter().collect())
}

/// The condition must not hold.
pub fn not(condition: Condition) -> Condition {
    Condition::Not(Box::new(condition))
}

/// Fluent builder for a condition on one attribute path.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConditionBuilder {
    path: String,
}

/// Start a condition on `path`.
///
/// ```rust
/// use dynamodb_mapper::{expression, mapper::Marshaller};
///
/// let expression = expression::attribute("age")
///     .greater_than(18)
///     .to_expression(None, &Marshaller::default())
///     .unwrap();
/// assert_eq!(expression.statement, "#age > :age");
/// ```
pub fn attribute(path: impl Into<String>) -> ConditionBuilder {
    ConditionBuilder { path: path.into() }
}

impl ConditionBuilder {
    /// Condition with an explicit operator; arity is checked when built.
    pub fn condition(self, operator: ConditionOperator, operands: Vec<Value>) -> Condition {
        Condition::Leaf {
            path: self.path,
            operator,
            operands,
        }
    }

    /// `= value`
    pub fn equals(self, value: impl Into<Value>) -> Condition {
        self.condition(ConditionOperator::Equals, vec![value.into()])
    }

    /// `<> value`
    pub fn not_equals(self, value: impl Into<Value>) -> Condition {
        self.condition(ConditionOperator::NotEquals, vec![value.into()])
    }

    /// `< value`
    pub fn less_than(self, value: impl Into<Value>) -> Condition {
        self.condition(ConditionOperator::LessThan, vec![value.into()])
    }

    /// `<= value`
    pub fn less_than_or_equal(self, value: impl Into<Value>) -> Condition {
        self.condition(ConditionOperator::LessThanOrEqual, vec![value.into()])
    }

    /// `> value`
    pub fn greater_than(self, value: impl Into<Value>) -> Condition {
        self.condition(ConditionOperator::GreaterThan, vec![value.into()])
    }

    /// `>= value`
    pub fn greater_than_or_equal(self, value: impl Into<Value>) -> Condition {
        self.condition(ConditionOperator::GreaterThanOrEqual, vec![value.into()])
    }

    /// Inclusive range.
    pub fn between(self, low: impl Into<Value>, high: impl Into<Value>) -> Condition {
        self.condition(ConditionOperator::Between, vec![low.into(), high.into()])
    }

    /// Equal to one of the candidates.
    pub fn is_in<I, T>(self, candidates: I) -> Condition
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        let candidates = Value::List(candidates.into_iter().map(Into::into).collect());
        self.condition(ConditionOperator::In, vec![candidates])
    }

    /// The attribute is present.
    pub fn attribute_exists(self) -> Condition {
        self.condition(ConditionOperator::AttributeExists, Vec::new())
    }

    /// The attribute is absent.
    pub fn attribute_not_exists(self) -> Condition {
        self.condition(ConditionOperator::AttributeNotExists, Vec::new())
    }

    /// The attribute has the given type descriptor (`"S"`, `"SS"`, `"M"`, ...).
    pub fn attribute_type(self, descriptor: impl Into<String>) -> Condition {
        self.condition(
            ConditionOperator::AttributeType,
            vec![Value::String(descriptor.into())],
        )
    }

    /// String or binary prefix.
    pub fn begins_with(self, prefix: impl Into<Value>) -> Condition {
        self.condition(ConditionOperator::BeginsWith, vec![prefix.into()])
    }

    /// Substring of a string, or element of a set or list.
    pub fn contains(self, value: impl Into<Value>) -> Condition {
        self.condition(ConditionOperator::Contains, vec![value.into()])
    }

    /// Compare the attribute's size.
    pub fn size(self, comparator: Comparator, value: impl Into<Value>) -> Condition {
        self.condition(ConditionOperator::Size(comparator), vec![value.into()])
    }
}

/// Key condition of a query: equality on the partition key, optionally a
/// range condition on the sort key. With `index`, the index's key schema is used.
///
/// ```rust
/// use dynamodb_mapper::{
///     expression::{ConditionOperator, condition::key_condition},
///     mapper::Marshaller,
///     metadata::{ModelMetadata, PropertyMetadata},
///     value::Value,
/// };
///
/// let model = ModelMetadata::builder("Event")
///     .property(PropertyMetadata::new("id").partition_key())
///     .property(PropertyMetadata::new("at").sort_key())
///     .build()
///     .unwrap();
/// let expression = key_condition(
///     &model,
///     None,
///     Value::from("a"),
///     Some((ConditionOperator::GreaterThan, vec![Value::from(3)])),
///     &Marshaller::default(),
/// )
/// .unwrap();
/// assert_eq!(expression.statement, "(#id = :id AND #at > :at)");
/// ```
pub fn key_condition(
    model: &ModelMetadata,
    index: Option<&str>,
    partition_value: Value,
    sort_condition: Option<(ConditionOperator, Vec<Value>)>,
    marshaller: &Marshaller,
) -> Result<Expression> {
    let invalid_metadata = |message: String| Error::InvalidMetadata {
        model: model.name.clone(),
        message,
    };
    let (partition_key, sort_key) = match index {
        Some(index) => {
            let index = model
                .index(index)
                .ok_or_else(|| invalid_metadata(format!("unknown index {index}")))?;
            (index.partition_key.clone(), index.sort_key.clone())
        }
        None => {
            let partition_key = model
                .partition_key()
                .ok_or_else(|| invalid_metadata("no partition key declared".to_string()))?;
            (
                partition_key.name.clone(),
                model.sort_key().map(|property| property.name.clone()),
            )
        }
    };
    let mut condition = attribute(partition_key).equals(partition_value);
    if let Some((operator, operands)) = sort_condition {
        let sort_key = sort_key
            .ok_or_else(|| invalid_metadata("sort condition without a sort key".to_string()))?;
        if !operator.is_key_operator() {
            return Err(Error::InvalidOperandType {
                path: sort_key,
                operator: operator.to_string(),
                message: "operator is not allowed in a key condition".to_string(),
            });
        }
        condition = condition.and(attribute(sort_key).condition(operator, operands));
    }
    condition.to_expression(Some(model), marshaller)
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    fn build(condition: Condition) -> Result<Expression> {
        condition.to_expression(None, &Marshaller::default())
    }

    fn names(pairs: &[(&str, &str)]) -> collections::HashMap<String, String> {
        pairs
            .iter()
            .map(|(placeholder, name)| (placeholder.to_string(), name.to_string()))
            .collect()
    }

    fn string(value: &str) -> types::AttributeValue {
        types::AttributeValue::S(value.to_string())
    }

    fn number(value: &str) -> types::AttributeValue {
        types::AttributeValue::N(value.to_string())
    }

    #[rstest]
    #[case::equals(attribute("age").equals(1), "#age = :age")]
    #[case::not_equals(attribute("age").not_equals(1), "#age <> :age")]
    #[case::less_than(attribute("age").less_than(1), "#age < :age")]
    #[case::less_than_or_equal(attribute("age").less_than_or_equal(1), "#age <= :age")]
    #[case::greater_than(attribute("age").greater_than(1), "#age > :age")]
    #[case::greater_than_or_equal(attribute("age").greater_than_or_equal(1), "#age >= :age")]
    #[case::between(attribute("age").between(1, 2), "#age BETWEEN :age AND :age_2")]
    #[case::is_in(attribute("age").is_in([1, 2, 3]), "#age IN (:age,:age_2,:age_3)")]
    #[case::exists(attribute("id").attribute_exists(), "attribute_exists (#id)")]
    #[case::not_exists(attribute("id").attribute_not_exists(), "attribute_not_exists (#id)")]
    #[case::attribute_type(attribute("id").attribute_type("S"), "attribute_type (#id, :id)")]
    #[case::begins_with(attribute("name").begins_with("Sta"), "begins_with (#name, :name)")]
    #[case::contains(attribute("topics").contains("z"), "contains (#topics, :topics)")]
    #[case::size(attribute("topics").size(Comparator::GreaterThan, 2), "size (#topics) > :topics")]
    #[case::nested(attribute("a.b[2]").equals("x"), "#a.#b[2] = :a__b_at_2")]
    fn test_render(#[case] condition: Condition, #[case] expected: &str) {
        assert_eq!(build(condition).unwrap().statement, expected);
    }

    #[test]
    fn test_attribute_not_exists_has_no_values() {
        let actual = build(attribute("id").attribute_not_exists()).unwrap();
        assert_eq!(actual.attribute_names, names(&[("#id", "id")]));
        assert!(actual.attribute_values.is_empty());
    }

    #[test]
    fn test_is_in_values() {
        let actual = build(attribute("status").is_in(["a", "b"])).unwrap();
        assert_eq!(
            actual.attribute_values,
            collections::HashMap::from([
                (":status".to_string(), string("a")),
                (":status_2".to_string(), string("b")),
            ])
        );
    }

    #[test]
    fn test_is_in_on_set_property_keeps_scalars() {
        let model = ModelMetadata::builder("User")
            .property(PropertyMetadata::new("roles").property_type(PropertyType::Set))
            .build()
            .unwrap();
        let actual = attribute("roles")
            .is_in(["admin", "editor"])
            .to_expression(Some(&model), &Marshaller::default())
            .unwrap();
        assert_eq!(actual.statement, "#roles IN (:roles,:roles_2)");
        assert_eq!(actual.attribute_values[":roles"], string("admin"));
        assert_eq!(actual.attribute_values[":roles_2"], string("editor"));
    }

    #[test]
    fn test_existing_placeholders_are_avoided() {
        let existing = collections::HashSet::from([":age".to_string(), ":age_2".to_string()]);
        let actual = attribute("age")
            .equals(5)
            .build(&existing, None, &Marshaller::default())
            .unwrap();
        assert_eq!(actual.statement, "#age = :age_3");
        assert_eq!(actual.attribute_values[":age_3"], number("5"));
    }

    #[rstest]
    #[case::missing(attribute("a").condition(ConditionOperator::Equals, vec![]), 1, 0)]
    #[case::extra(
        attribute("a").condition(ConditionOperator::AttributeExists, vec![Value::from(1)]),
        0,
        1
    )]
    #[case::between(
        attribute("a").condition(ConditionOperator::Between, vec![Value::from(1)]),
        2,
        1
    )]
    fn test_invalid_operand_count(
        #[case] condition: Condition,
        #[case] expected_count: usize,
        #[case] found_count: usize,
    ) {
        let actual = build(condition);
        assert!(matches!(
            actual,
            Err(Error::InvalidOperandCount { expected, found, .. })
                if expected == expected_count && found == found_count
        ));
    }

    #[rstest]
    #[case::between_mixed(attribute("a").between(1, "b"))]
    #[case::between_boolean(attribute("a").between(true, false))]
    #[case::contains_boolean(attribute("a").contains(true))]
    #[case::contains_empty(attribute("a").contains(""))]
    #[case::begins_with_number(attribute("a").begins_with(1))]
    #[case::in_scalar(attribute("a").condition(ConditionOperator::In, vec![Value::from(1)]))]
    #[case::in_empty(attribute("a").is_in(Vec::<Value>::new()))]
    #[case::attribute_type_unknown(attribute("a").attribute_type("X"))]
    #[case::size_string(attribute("a").size(Comparator::Equals, "x"))]
    fn test_invalid_operand_type(#[case] condition: Condition) {
        assert!(matches!(build(condition), Err(Error::InvalidOperandType { .. })));
    }

    #[test]
    fn test_invalid_path() {
        assert!(matches!(
            build(attribute("a..b").equals(1)),
            Err(Error::InvalidAttributePath { .. })
        ));
    }

    fn model() -> ModelMetadata {
        ModelMetadata::builder("Post")
            .property(PropertyMetadata::new("id").partition_key())
            .property(PropertyMetadata::new("created").name_db("created_at").sort_key())
            .property(PropertyMetadata::new("tags").generic_type(ItemType::String))
            .property(PropertyMetadata::new("scores").generic_type(ItemType::Number))
            .property(PropertyMetadata::new("published").property_type(PropertyType::Date))
            .property(PropertyMetadata::new("author").index_partition_key("by_author"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_contains_checks_item_type() {
        let marshaller = Marshaller::default();
        let model = model();
        let actual = attribute("tags")
            .contains("rust")
            .to_expression(Some(&model), &marshaller)
            .unwrap();
        assert_eq!(actual.attribute_values[":tags"], string("rust"));
        let mismatch = attribute("scores")
            .contains("rust")
            .to_expression(Some(&model), &marshaller);
        assert!(matches!(mismatch, Err(Error::InvalidOperandType { .. })));
    }

    #[test]
    fn test_operands_use_property_metadata() {
        let published = chrono::DateTime::from_timestamp(0, 0).unwrap();
        let actual = attribute("published")
            .less_than(published)
            .to_expression(Some(&model()), &Marshaller::default())
            .unwrap();
        assert_eq!(
            actual.attribute_values[":published"],
            string("1970-01-01T00:00:00Z")
        );
    }

    #[test]
    fn test_stored_names_are_used() {
        let actual = attribute("created")
            .greater_than(3)
            .to_expression(Some(&model()), &Marshaller::default())
            .unwrap();
        assert_eq!(actual.statement, "#created_at > :created_at");
        assert_eq!(actual.attribute_names, names(&[("#created_at", "created_at")]));
    }

    #[test]
    fn test_and_not_scenario() {
        let condition = and([
            not(attribute("topics").contains("z")),
            attribute("name").begins_with("Sta"),
        ]);
        let actual = build(condition).unwrap();
        assert_eq!(
            actual.statement,
            "(NOT contains (#topics, :topics) AND begins_with (#name, :name))"
        );
        assert_eq!(
            actual.attribute_names,
            names(&[("#topics", "topics"), ("#name", "name")])
        );
        assert_eq!(
            actual.attribute_values,
            collections::HashMap::from([
                (":topics".to_string(), string("z")),
                (":name".to_string(), string("Sta")),
            ])
        );
    }

    #[test]
    fn test_single_fragment_has_no_parentheses() {
        let actual = build(or([attribute("a").equals(1)])).unwrap();
        assert_eq!(actual.statement, "#a = :a");
        let negated = build(!attribute("a").attribute_exists()).unwrap();
        assert_eq!(negated.statement, "NOT attribute_exists (#a)");
    }

    #[test]
    fn test_same_path_placeholders_are_unique() {
        let condition = or([
            attribute("age").less_than(10),
            attribute("age").between(20, 30),
            attribute("age").greater_than(40),
        ]);
        let actual = build(condition).unwrap();
        assert_eq!(
            actual.statement,
            "(#age < :age OR #age BETWEEN :age_2 AND :age_3 OR #age > :age_4)"
        );
        assert_eq!(actual.attribute_values.len(), 4);
    }

    #[test]
    fn test_nested_composition() {
        let condition = attribute("a")
            .equals(1)
            .and(or([attribute("b").equals(2), not(attribute("a").equals(3))]));
        let actual = build(condition).unwrap();
        assert_eq!(actual.statement, "(#a = :a AND (#b = :b OR NOT #a = :a_2))");
        assert_eq!(actual.attribute_values[":a_2"], number("3"));
    }

    #[test]
    fn test_built_fragments_are_renamed() {
        let marshaller = Marshaller::default();
        let first = build(attribute("age").equals(1)).unwrap();
        let second = build(attribute("age").equals(2)).unwrap();
        let actual = and([Condition::from(first), Condition::from(second)])
            .to_expression(None, &marshaller)
            .unwrap();
        assert_eq!(actual.statement, "(#age = :age AND #age = :age_2)");
        assert_eq!(actual.attribute_values[":age"], number("1"));
        assert_eq!(actual.attribute_values[":age_2"], number("2"));
    }

    #[test]
    fn test_sanitized_name_collisions_get_distinct_placeholders() {
        let condition = and([attribute("a-b").equals(1), attribute("a_b").equals(2)]);
        let actual = build(condition).unwrap();
        assert_eq!(actual.statement, "(#a_b = :a_b AND #a_b_2 = :a_b_2)");
        assert_eq!(
            actual.attribute_names,
            names(&[("#a_b", "a-b"), ("#a_b_2", "a_b")])
        );
        assert_eq!(actual.attribute_values[":a_b"], number("1"));
        assert_eq!(actual.attribute_values[":a_b_2"], number("2"));
    }

    #[test]
    fn test_key_condition() {
        let marshaller = Marshaller::default();
        let model = model();
        let actual = key_condition(
            &model,
            None,
            Value::from("a"),
            Some((ConditionOperator::BeginsWith, vec![Value::from("2020")])),
            &marshaller,
        )
        .unwrap();
        assert_eq!(actual.statement, "(#id = :id AND begins_with (#created_at, :created_at))");
        let partition_only = key_condition(&model, Some("by_author"), Value::from("x"), None, &marshaller)
            .unwrap();
        assert_eq!(partition_only.statement, "#author = :author");
    }

    #[rstest]
    #[case::operator(None, Some((ConditionOperator::NotEquals, vec![Value::from(1)])))]
    #[case::unknown_index(Some("missing"), None)]
    #[case::index_without_sort(Some("by_author"), Some((ConditionOperator::Equals, vec![Value::from(1)])))]
    fn test_key_condition_invalid(
        #[case] index: Option<&str>,
        #[case] sort_condition: Option<(ConditionOperator, Vec<Value>)>,
    ) {
        let actual = key_condition(
            &model(),
            index,
            Value::from("a"),
            sort_condition,
            &Marshaller::default(),
        );
        assert!(actual.is_err());
    }
}
