//! Flag values to query value objects

use anyhow::{bail, Context, Result};
use geoquery_core::{
    BoundingBox, FieldKind, FieldValue, FilterField, FilterOperator, Geometry, IncludeField, Only, Polygon,
    QueryFilters, TimeRange, UniqueId,
};
use std::fs;
use std::str::FromStr;

use crate::cli::QueryArgs;

const NULL_VALUE: &str = "null";
const RANGE_SEPARATOR: &str = "..";

/// Build the optional filters shared by every query subcommand
pub fn query_filters(args: &QueryArgs) -> Result<QueryFilters> {
    let uids = if args.uids.is_empty() {
        None
    } else {
        Some(args.uids.iter().map(|uid| unique_id(uid)).collect())
    };

    let geometry = match (&args.bbox, &args.polygon) {
        (Some(bounds), _) => Some(Geometry::from(BoundingBox::from_slice(bounds)?)),
        (None, Some(path)) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read polygon file {}", path.display()))?;
            Some(Geometry::from(Polygon::from_geojson_str(&text)?))
        }
        (None, None) => None,
    };

    let time_range = if args.min_time.is_some() || args.max_time.is_some() {
        Some(TimeRange::from_strings(args.min_time.as_deref(), args.max_time.as_deref())?)
    } else {
        None
    };

    let filter_fields = if args.fields.is_empty() {
        None
    } else {
        Some(
            args.fields
                .iter()
                .map(|text| filter_field(text))
                .collect::<Result<Vec<_>>>()?,
        )
    };

    Ok(QueryFilters {
        uids,
        geometry,
        time_range,
        filter_fields,
        only: None,
    })
}

/// Integers become integer ids, anything else a string id
pub fn unique_id(text: &str) -> UniqueId {
    match text.parse::<i64>() {
        Ok(n) => UniqueId::Int(n),
        Err(_) => UniqueId::from(text),
    }
}

/// `name:kind:op:value`; `null` is the null value and numeric ranges are written `low..high`
pub fn filter_field(text: &str) -> Result<FilterField> {
    let parts: Vec<&str> = text.splitn(4, ':').collect();
    let [name, kind, operator, value] = parts[..] else {
        bail!("Filter field '{}' is not of the form name:kind:op:value", text);
    };

    let kind = FieldKind::from_str(kind)?;
    let operator = FilterOperator::from_str(operator)?;
    let value = field_value(kind, value).with_context(|| format!("Invalid value in filter field '{}'", text))?;
    let nullable = value.is_null();

    Ok(FilterField::new(name, kind, operator, value)?.nullable(nullable))
}

fn field_value(kind: FieldKind, text: &str) -> Result<FieldValue> {
    if text == NULL_VALUE {
        return Ok(FieldValue::Null);
    }
    if !kind.is_numeric() {
        return Ok(FieldValue::from(text));
    }

    match text.split_once(RANGE_SEPARATOR) {
        Some((low, high)) => Ok(FieldValue::range(number(low)?, number(high)?)),
        None => Ok(FieldValue::from(number(text)?)),
    }
}

fn number(text: &str) -> Result<i64> {
    text.trim()
        .parse::<i64>()
        .with_context(|| format!("'{}' is not an integer", text))
}

pub fn only(text: Option<&str>) -> Result<Option<Only>> {
    Ok(text.map(Only::from_str).transpose()?)
}

pub fn include(columns: &[String]) -> Result<Option<Vec<IncludeField>>> {
    if columns.is_empty() {
        return Ok(None);
    }
    let include = columns
        .iter()
        .map(|column| IncludeField::from_str(column))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(Some(include))
}
