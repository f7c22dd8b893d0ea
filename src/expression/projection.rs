use crate::{
    error::Result,
    expression::{Expression, path::AttributePath},
    metadata::ModelMetadata,
};

/// Projection expression selecting the given attribute paths.
///
/// ```rust
/// use dynamodb_mapper::expression;
///
/// let projection = expression::projection(["id", "address.street"], None).unwrap();
/// assert_eq!(projection.statement, "#id, #address.#street");
/// assert_eq!(projection.attribute_names.len(), 3);
/// ```
pub fn projection<I, S>(paths: I, model: Option<&ModelMetadata>) -> Result<Expression>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut merged = Expression::default();
    let mut statements = Vec::new();
    for path in paths {
        let rendered = path.as_ref().parse::<AttributePath>()?.render(model);
        statements.push(merged.absorb(Expression {
            statement: rendered.statement,
            attribute_names: rendered.attribute_names,
            ..Default::default()
        }));
    }
    statements.dedup();
    merged.statement = statements.join(", ");
    Ok(merged)
}
