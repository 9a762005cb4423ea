//! Declarative request schemas.
//!
//! A [`Schema`] is an ordered list of [`Field`] rules checked against a raw
//! JSON body. Validation stops at the first violation and reports it with the
//! dotted path of the offending field, e.g. `"address.city" is required`.
//! Keys not declared in the schema are rejected.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)*\.[A-Za-z]{2,}$").expect("email pattern compiles")
});

/// Symbols accepted (and one required) in a strong password.
const PASSWORD_SYMBOLS: &str = ".!_@#$%^&*-";

/// First schema violation found in a payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    fn new(path: &str, detail: impl core::fmt::Display) -> Self {
        Self {
            path: path.to_string(),
            message: format!("\"{path}\" {detail}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Email,
    Uri,
    StrongPassword,
}

#[derive(Debug, Clone)]
enum Kind {
    Str {
        min: usize,
        max: Option<usize>,
        allow_empty: bool,
        format: Option<Format>,
    },
    Int {
        min: Option<i64>,
        max: Option<i64>,
    },
    Bool,
    Object(Schema),
}

/// One field rule. Built with the chained constructors below.
#[derive(Debug, Clone)]
pub struct Field {
    name: &'static str,
    required: bool,
    kind: Kind,
}

impl Field {
    pub fn string(name: &'static str) -> Self {
        Self::with_kind(
            name,
            Kind::Str {
                min: 0,
                max: None,
                allow_empty: false,
                format: None,
            },
        )
    }

    pub fn integer(name: &'static str) -> Self {
        Self::with_kind(name, Kind::Int { min: None, max: None })
    }

    pub fn boolean(name: &'static str) -> Self {
        Self::with_kind(name, Kind::Bool)
    }

    pub fn object(name: &'static str, fields: Vec<Field>) -> Self {
        Self::with_kind(name, Kind::Object(Schema::new(fields)))
    }

    fn with_kind(name: &'static str, kind: Kind) -> Self {
        Self {
            name,
            required: false,
            kind,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Minimum string length, or minimum integer value.
    pub fn min(mut self, n: i64) -> Self {
        match &mut self.kind {
            Kind::Str { min, .. } => *min = usize::try_from(n).unwrap_or(0),
            Kind::Int { min, .. } => *min = Some(n),
            _ => {}
        }
        self
    }

    /// Maximum string length, or maximum integer value.
    pub fn max(mut self, n: i64) -> Self {
        match &mut self.kind {
            Kind::Str { max, .. } => *max = Some(usize::try_from(n).unwrap_or(0)),
            Kind::Int { max, .. } => *max = Some(n),
            _ => {}
        }
        self
    }

    /// Accept `""` regardless of the length bounds.
    pub fn allow_empty(mut self) -> Self {
        if let Kind::Str { allow_empty, .. } = &mut self.kind {
            *allow_empty = true;
        }
        self
    }

    pub fn email(self) -> Self {
        self.format(Format::Email)
    }

    pub fn uri(self) -> Self {
        self.format(Format::Uri)
    }

    pub fn strong_password(self) -> Self {
        self.format(Format::StrongPassword)
    }

    fn format(mut self, f: Format) -> Self {
        if let Kind::Str { format, .. } = &mut self.kind {
            *format = Some(f);
        }
        self
    }

    fn check(&self, path: &str, value: &Value) -> Result<(), ValidationError> {
        match &self.kind {
            Kind::Str {
                min,
                max,
                allow_empty,
                format,
            } => {
                let s = value
                    .as_str()
                    .ok_or_else(|| ValidationError::new(path, "must be a string"))?;
                if s.is_empty() {
                    return if *allow_empty {
                        Ok(())
                    } else {
                        Err(ValidationError::new(path, "is not allowed to be empty"))
                    };
                }
                let len = s.chars().count();
                if len < *min {
                    return Err(ValidationError::new(
                        path,
                        format_args!("length must be at least {min} characters long"),
                    ));
                }
                if let Some(max) = max {
                    if len > *max {
                        return Err(ValidationError::new(
                            path,
                            format_args!("length must be less than or equal to {max} characters long"),
                        ));
                    }
                }
                match format {
                    Some(f) => check_format(path, s, *f),
                    None => Ok(()),
                }
            }
            Kind::Int { min, max } => {
                let n = integer_value(value)
                    .ok_or_else(|| ValidationError::new(path, "must be an integer"))?;
                if let Some(min) = min {
                    if n < i128::from(*min) {
                        return Err(ValidationError::new(
                            path,
                            format_args!("must be greater than or equal to {min}"),
                        ));
                    }
                }
                if let Some(max) = max {
                    if n > i128::from(*max) {
                        return Err(ValidationError::new(
                            path,
                            format_args!("must be less than or equal to {max}"),
                        ));
                    }
                }
                Ok(())
            }
            Kind::Bool => {
                if value.is_boolean() {
                    Ok(())
                } else {
                    Err(ValidationError::new(path, "must be a boolean"))
                }
            }
            Kind::Object(schema) => {
                let map = value
                    .as_object()
                    .ok_or_else(|| ValidationError::new(path, "must be of type object"))?;
                schema.check_map(Some(path), map)
            }
        }
    }
}

fn integer_value(value: &Value) -> Option<i128> {
    let Value::Number(n) = value else {
        return None;
    };
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

fn check_format(path: &str, s: &str, format: Format) -> Result<(), ValidationError> {
    let ok = match format {
        Format::Email => EMAIL.is_match(s),
        Format::Uri => url::Url::parse(s).is_ok(),
        Format::StrongPassword => is_strong_password(s),
    };
    if ok {
        return Ok(());
    }
    let detail = match format {
        Format::Email => "must be a valid email".to_string(),
        Format::Uri => "must be a valid uri".to_string(),
        Format::StrongPassword => format!(
            "must contain an upper case letter, a lower case letter, a digit and one of {PASSWORD_SYMBOLS}"
        ),
    };
    Err(ValidationError::new(path, detail))
}

/// At least six characters drawn from letters, digits and the symbol set,
/// with at least one of each class.
pub fn is_strong_password(s: &str) -> bool {
    let allowed = s
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SYMBOLS.contains(c));
    allowed
        && s.chars().count() >= 6
        && s.chars().any(|c| c.is_ascii_lowercase())
        && s.chars().any(|c| c.is_ascii_uppercase())
        && s.chars().any(|c| c.is_ascii_digit())
        && s.chars().any(|c| PASSWORD_SYMBOLS.contains(c))
}

/// An ordered rule set for one request shape.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Check `value` against the rules, stopping at the first violation.
    pub fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        let map = value
            .as_object()
            .ok_or_else(|| ValidationError::new("value", "must be of type object"))?;
        self.check_map(None, map)
    }

    /// Validate, then deserialize into the typed payload.
    pub fn parse<T: DeserializeOwned>(&self, value: Value) -> Result<T, ValidationError> {
        self.validate(&value)?;
        serde_json::from_value(value).map_err(|e| ValidationError {
            path: "value".to_string(),
            message: format!("\"value\" could not be read: {e}"),
        })
    }

    fn check_map(&self, prefix: Option<&str>, map: &Map<String, Value>) -> Result<(), ValidationError> {
        let path_of = |name: &str| match prefix {
            Some(p) => format!("{p}.{name}"),
            None => name.to_string(),
        };

        for field in &self.fields {
            let path = path_of(field.name);
            match map.get(field.name) {
                None if field.required => {
                    return Err(ValidationError::new(&path, "is required"));
                }
                None => {}
                Some(value) => field.check(&path, value)?,
            }
        }

        if let Some(unknown) = map
            .keys()
            .find(|k| !self.fields.iter().any(|f| f.name == k.as_str()))
        {
            return Err(ValidationError::new(&path_of(unknown), "is not allowed"));
        }

        Ok(())
    }
}
