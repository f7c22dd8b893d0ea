use crate::{
    attribute,
    error::{Error, Result},
    mapper::{Mapper, property_name},
    metadata::PropertyMetadata,
    value::Value,
};

use aws_sdk_dynamodb::types;
use chrono::{DateTime, SecondsFormat, Utc};

fn parse_rfc3339(value: &str, name: Option<&str>) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|date| date.with_timezone(&Utc))
        .map_err(|_| Error::invalid_scalar(name, "RFC 3339 date", value))
}

fn parse_epoch(value: &str, name: Option<&str>) -> Result<DateTime<Utc>> {
    value
        .parse::<i64>()
        .ok()
        .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
        .ok_or_else(|| Error::invalid_scalar(name, "epoch seconds", value))
}

/// Maps dates to `S` in RFC 3339 form, e.g. `2020-01-01T10:00:00Z`.
///
/// This is the default date mapper.
#[derive(Clone, Copy, Debug, Default)]
pub struct DateToStringMapper;

impl Mapper for DateToStringMapper {
    fn to_db(
        &self,
        value: &Value,
        property: Option<&PropertyMetadata>,
    ) -> Result<Option<types::AttributeValue>> {
        let name = property_name(property);
        let date = match value {
            Value::Null => return Ok(None),
            Value::Date(date) => *date,
            Value::String(value) => parse_rfc3339(value, name)?,
            other => return Err(Error::invalid_scalar(name, "date", other)),
        };
        let formatted = date.to_rfc3339_opts(SecondsFormat::AutoSi, true);
        Ok(Some(types::AttributeValue::S(formatted)))
    }

    fn from_db(
        &self,
        attribute: &types::AttributeValue,
        property: Option<&PropertyMetadata>,
    ) -> Result<Value> {
        let name = property_name(property);
        match attribute {
            types::AttributeValue::S(value) => parse_rfc3339(value, name).map(Value::Date),
            other => Err(Error::invalid_scalar(name, "S", attribute::type_descriptor(other))),
        }
    }
}

/// Maps dates to `N` holding whole seconds since the Unix epoch.
///
/// Useful for attributes driving time-to-live expiry.
#[derive(Clone, Copy, Debug, Default)]
pub struct DateToNumberMapper;

impl Mapper for DateToNumberMapper {
    fn to_db(
        &self,
        value: &Value,
        property: Option<&PropertyMetadata>,
    ) -> Result<Option<types::AttributeValue>> {
        let name = property_name(property);
        let seconds = match value {
            Value::Null => return Ok(None),
            Value::Date(date) => date.timestamp(),
            Value::String(value) => parse_rfc3339(value, name)?.timestamp(),
            Value::Number(number) => number
                .as_i64()
                .ok_or_else(|| Error::invalid_scalar(name, "epoch seconds", number))?,
            other => return Err(Error::invalid_scalar(name, "date", other)),
        };
        Ok(Some(types::AttributeValue::N(seconds.to_string())))
    }

    fn from_db(
        &self,
        attribute: &types::AttributeValue,
        property: Option<&PropertyMetadata>,
    ) -> Result<Value> {
        let name = property_name(property);
        match attribute {
            types::AttributeValue::N(value) => parse_epoch(value, name).map(Value::Date),
            other => Err(Error::invalid_scalar(name, "N", attribute::type_descriptor(other))),
        }
    }
}
