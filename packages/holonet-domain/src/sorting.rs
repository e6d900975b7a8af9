use std::{cmp::Ordering, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Document, Error};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
	#[default]
	Asc,
	Desc,
}

impl FromStr for SortOrder {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"asc" => Ok(Self::Asc),
			"desc" => Ok(Self::Desc),
			_ => Err(Error::InvalidSortOrder { value: s.to_string() }),
		}
	}
}

/// Stable sort by `field`. Rows where the field is absent or null always come last.
pub fn sort_documents(items: &mut [Document], field: &str, order: SortOrder) {
	items.sort_by(|a, b| {
		let left = a.get(field).filter(|value| !value.is_null());
		let right = b.get(field).filter(|value| !value.is_null());

		match (left, right) {
			(Some(left), Some(right)) => match order {
				SortOrder::Asc => compare_values(left, right),
				SortOrder::Desc => compare_values(right, left),
			},
			(Some(_), None) => Ordering::Less,
			(None, Some(_)) => Ordering::Greater,
			(None, None) => Ordering::Equal,
		}
	});
}

/// Keeps only the requested fields present in each row, plus `id` when the row has one.
pub fn project_fields(items: Vec<Document>, fields: Option<&[String]>) -> Vec<Document> {
	let Some(fields) = fields.filter(|fields| !fields.is_empty()) else {
		return items;
	};

	items
		.into_iter()
		.map(|mut item| {
			let mut projected = Document::new();

			for field in fields {
				if let Some(value) = item.remove(field) {
					projected.insert(field.clone(), value);
				}
			}
			if !projected.contains_key("id")
				&& let Some(id) = item.remove("id")
			{
				projected.insert("id".to_string(), id);
			}

			projected
		})
		.collect()
}

/// Splits a comma-separated field list, dropping blanks. `None` when nothing remains.
pub fn parse_fields(raw: Option<&str>) -> Option<Vec<String>> {
	let fields: Vec<String> = raw?
		.split(',')
		.map(str::trim)
		.filter(|field| !field.is_empty())
		.map(str::to_string)
		.collect();

	if fields.is_empty() { None } else { Some(fields) }
}

fn compare_values(left: &Value, right: &Value) -> Ordering {
	match (left, right) {
		(Value::String(left), Value::String(right)) => left.cmp(right),
		(Value::Number(left), Value::Number(right)) => {
			let left = left.as_f64().unwrap_or(f64::NAN);
			let right = right.as_f64().unwrap_or(f64::NAN);

			left.total_cmp(&right)
		},
		(Value::Bool(left), Value::Bool(right)) => left.cmp(right),
		_ => type_rank(left)
			.cmp(&type_rank(right))
			.then_with(|| left.to_string().cmp(&right.to_string())),
	}
}

fn type_rank(value: &Value) -> u8 {
	match value {
		Value::Null => 0,
		Value::Bool(_) => 1,
		Value::Number(_) => 2,
		Value::String(_) => 3,
		Value::Array(_) => 4,
		Value::Object(_) => 5,
	}
}
