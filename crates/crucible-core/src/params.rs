//! Typed readers over a factory's TOML parameter table.
//!
//! Built-in factories use these instead of hand-rolled matching so that a
//! missing parameter and a present-but-wrong-type parameter produce distinct,
//! consistently worded errors.

use crate::components::ComponentError;

/// Reads a required float; integers are accepted and widened.
pub fn required_f64(params: &toml::Value, key: &'static str) -> Result<f64, ComponentError> {
	match params.get(key) {
		Some(value) => as_f64(value, key),
		None => Err(ComponentError::MissingParam(key)),
	}
}

/// Reads an optional float, falling back to `default` when absent.
pub fn optional_f64(
	params: &toml::Value,
	key: &'static str,
	default: f64,
) -> Result<f64, ComponentError> {
	match params.get(key) {
		Some(value) => as_f64(value, key),
		None => Ok(default),
	}
}

/// Reads a required non-negative integer.
pub fn required_usize(params: &toml::Value, key: &'static str) -> Result<usize, ComponentError> {
	match params.get(key) {
		Some(value) => as_usize(value, key),
		None => Err(ComponentError::MissingParam(key)),
	}
}

/// Reads an optional non-negative integer, falling back to `default`.
pub fn optional_usize(
	params: &toml::Value,
	key: &'static str,
	default: usize,
) -> Result<usize, ComponentError> {
	match params.get(key) {
		Some(value) => as_usize(value, key),
		None => Ok(default),
	}
}

/// Reads an optional boolean, falling back to `default`.
pub fn optional_bool(
	params: &toml::Value,
	key: &'static str,
	default: bool,
) -> Result<bool, ComponentError> {
	match params.get(key) {
		Some(value) => value.as_bool().ok_or_else(|| type_mismatch(key, "boolean", value)),
		None => Ok(default),
	}
}

/// Reads an optional string.
pub fn optional_string(
	params: &toml::Value,
	key: &'static str,
) -> Result<Option<String>, ComponentError> {
	match params.get(key) {
		Some(value) => value
			.as_str()
			.map(|s| Some(s.to_string()))
			.ok_or_else(|| type_mismatch(key, "string", value)),
		None => Ok(None),
	}
}

/// Reads an optional list of strings.
pub fn optional_string_list(
	params: &toml::Value,
	key: &'static str,
) -> Result<Option<Vec<String>>, ComponentError> {
	let Some(value) = params.get(key) else {
		return Ok(None);
	};
	let array = value
		.as_array()
		.ok_or_else(|| type_mismatch(key, "array of strings", value))?;
	let mut items = Vec::with_capacity(array.len());
	for item in array {
		let s = item
			.as_str()
			.ok_or_else(|| type_mismatch(key, "array of strings", item))?;
		items.push(s.to_string());
	}
	Ok(Some(items))
}

fn as_f64(value: &toml::Value, key: &'static str) -> Result<f64, ComponentError> {
	value
		.as_float()
		.or_else(|| value.as_integer().map(|i| i as f64))
		.ok_or_else(|| type_mismatch(key, "float", value))
}

fn as_usize(value: &toml::Value, key: &'static str) -> Result<usize, ComponentError> {
	value
		.as_integer()
		.and_then(|i| usize::try_from(i).ok())
		.ok_or_else(|| type_mismatch(key, "non-negative integer", value))
}

fn type_mismatch(key: &'static str, expected: &str, value: &toml::Value) -> ComponentError {
	ComponentError::InvalidParam {
		field: key,
		message: format!("expected {}, got {}", expected, value.type_str()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn params(toml: &str) -> toml::Value {
		toml.parse().unwrap()
	}

	#[test]
	fn integers_widen_to_floats() {
		let p = params("lr = 1");
		assert_eq!(required_f64(&p, "lr").unwrap(), 1.0);
	}

	#[test]
	fn missing_required_param_is_reported_by_name() {
		let p = params("");
		let err = required_f64(&p, "lr").unwrap_err();
		assert_eq!(err.to_string(), "missing required parameter 'lr'");
	}

	#[test]
	fn wrong_type_is_invalid_not_missing() {
		let p = params("lr = \"fast\"");
		let err = required_f64(&p, "lr").unwrap_err();
		assert!(matches!(err, ComponentError::InvalidParam { field: "lr", .. }));
	}

	#[test]
	fn optionals_fall_back_to_defaults() {
		let p = params("");
		assert_eq!(optional_f64(&p, "momentum", 0.9).unwrap(), 0.9);
		assert_eq!(optional_usize(&p, "k", 5).unwrap(), 5);
		assert!(optional_bool(&p, "verbose", true).unwrap());
		assert_eq!(optional_string(&p, "metric").unwrap(), None);
	}

	#[test]
	fn string_lists_parse() {
		let p = params("metrics = [\"loss\", \"accuracy\"]");
		assert_eq!(
			optional_string_list(&p, "metrics").unwrap(),
			Some(vec!["loss".to_string(), "accuracy".to_string()])
		);
	}

	#[test]
	fn negative_integer_is_invalid_for_usize() {
		let p = params("k = -3");
		assert!(required_usize(&p, "k").is_err());
	}
}
