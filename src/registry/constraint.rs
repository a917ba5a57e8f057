//! Attribute constraints declared by node types.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::domain::is_kebab_case;

/// A typed constraint on one attribute value, resolved once when the
/// registry is built.
#[derive(Debug, Clone)]
pub enum TypeConstraint {
    /// Any string.
    String,
    /// A signed integer.
    Integer,
    /// A finite floating-point number.
    Number,
    /// `true` or `false`.
    Boolean,
    /// One of a fixed set of values.
    Enum(Vec<String>),
    /// A well-known textual format.
    Format(Format),
    /// Must match a regular expression.
    Pattern(Regex),
}

/// Well-known textual formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Format {
    /// An absolute URI with a scheme.
    Uri,
    /// An email address.
    Email,
    /// A semantic version (`MAJOR.MINOR.PATCH` with optional suffixes).
    Semver,
    /// A calendar date (`YYYY-MM-DD`).
    Date,
    /// Kebab-case text.
    Kebab,
}

/// The serialized form of a constraint in a spec bundle.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ConstraintSpec {
    /// See [`TypeConstraint::String`].
    String,
    /// See [`TypeConstraint::Integer`].
    Integer,
    /// See [`TypeConstraint::Number`].
    Number,
    /// See [`TypeConstraint::Boolean`].
    Boolean,
    /// See [`TypeConstraint::Enum`].
    Enum {
        /// Permitted values.
        values: Vec<String>,
    },
    /// See [`TypeConstraint::Format`].
    Format {
        /// The required format.
        format: Format,
    },
    /// See [`TypeConstraint::Pattern`].
    Pattern {
        /// The regular expression source.
        regex: String,
    },
}

impl TryFrom<ConstraintSpec> for TypeConstraint {
    type Error = regex::Error;

    fn try_from(spec: ConstraintSpec) -> Result<Self, Self::Error> {
        Ok(match spec {
            ConstraintSpec::String => Self::String,
            ConstraintSpec::Integer => Self::Integer,
            ConstraintSpec::Number => Self::Number,
            ConstraintSpec::Boolean => Self::Boolean,
            ConstraintSpec::Enum { values } => Self::Enum(values),
            ConstraintSpec::Format { format } => Self::Format(format),
            ConstraintSpec::Pattern { regex } => Self::Pattern(Regex::new(&regex)?),
        })
    }
}

/// A value that does not satisfy its constraint.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConstraintViolation {
    /// Expected a value of a primitive type.
    #[error("'{value}' is not a valid {expected}")]
    Type {
        /// The offending value.
        value: String,
        /// The expected type name.
        expected: &'static str,
    },
    /// The value is not in the enumeration.
    #[error("'{value}' is not one of [{}]", .allowed.join(", "))]
    NotInEnum {
        /// The offending value.
        value: String,
        /// The permitted values.
        allowed: Vec<String>,
    },
    /// The value does not match a format.
    #[error("'{value}' is not a valid {format:?} value")]
    Format {
        /// The offending value.
        value: String,
        /// The required format.
        format: Format,
    },
    /// The value does not match a pattern.
    #[error("'{value}' does not match pattern '{pattern}'")]
    Pattern {
        /// The offending value.
        value: String,
        /// The regular expression source.
        pattern: String,
    },
}

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid regex"));
static URI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*://\S+$").expect("valid regex"));
static SEMVER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)(-[0-9A-Za-z.-]+)?(\+[0-9A-Za-z.-]+)?$")
        .expect("valid regex")
});

/// `YYYY-MM-DD` naming a day that exists.
fn is_calendar_date(value: &str) -> bool {
    value.len() == 10 && chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

impl TypeConstraint {
    /// Checks a property value against this constraint.
    ///
    /// # Errors
    ///
    /// Returns the violation if the value does not satisfy the constraint.
    pub fn check(&self, value: &str) -> Result<(), ConstraintViolation> {
        let type_error = |expected| ConstraintViolation::Type {
            value: value.to_string(),
            expected,
        };

        match self {
            Self::String => Ok(()),
            Self::Integer => value
                .parse::<i64>()
                .map(drop)
                .map_err(|_| type_error("integer")),
            Self::Number => value
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(drop)
                .ok_or_else(|| type_error("number")),
            Self::Boolean => match value {
                "true" | "false" => Ok(()),
                _ => Err(type_error("boolean")),
            },
            Self::Enum(allowed) => {
                if allowed.iter().any(|a| a == value) {
                    Ok(())
                } else {
                    Err(ConstraintViolation::NotInEnum {
                        value: value.to_string(),
                        allowed: allowed.clone(),
                    })
                }
            }
            Self::Format(format) => {
                let ok = match format {
                    Format::Uri => URI.is_match(value),
                    Format::Email => EMAIL.is_match(value),
                    Format::Semver => SEMVER.is_match(value),
                    Format::Date => is_calendar_date(value),
                    Format::Kebab => is_kebab_case(value),
                };
                if ok {
                    Ok(())
                } else {
                    Err(ConstraintViolation::Format {
                        value: value.to_string(),
                        format: *format,
                    })
                }
            }
            Self::Pattern(regex) => {
                if regex.is_match(value) {
                    Ok(())
                } else {
                    Err(ConstraintViolation::Pattern {
                        value: value.to_string(),
                        pattern: regex.as_str().to_string(),
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(TypeConstraint::Integer, "42", true; "integer ok")]
    #[test_case(TypeConstraint::Integer, "4.2", false; "integer rejects float")]
    #[test_case(TypeConstraint::Number, "4.2", true; "number ok")]
    #[test_case(TypeConstraint::Number, "NaN", false; "number rejects nan")]
    #[test_case(TypeConstraint::Boolean, "true", true; "boolean ok")]
    #[test_case(TypeConstraint::Boolean, "yes", false; "boolean rejects yes")]
    #[test_case(TypeConstraint::Format(Format::Email), "ops@example.com", true; "email ok")]
    #[test_case(TypeConstraint::Format(Format::Email), "ops.example.com", false; "email missing at")]
    #[test_case(TypeConstraint::Format(Format::Uri), "https://git.example.com/repo", true; "uri ok")]
    #[test_case(TypeConstraint::Format(Format::Uri), "git.example.com", false; "uri missing scheme")]
    #[test_case(TypeConstraint::Format(Format::Semver), "1.2.3-rc.1", true; "semver prerelease")]
    #[test_case(TypeConstraint::Format(Format::Semver), "1.2", false; "semver too short")]
    #[test_case(TypeConstraint::Format(Format::Date), "2024-02-29", true; "date ok")]
    #[test_case(TypeConstraint::Format(Format::Date), "2024-13-01", false; "date bad month")]
    #[test_case(TypeConstraint::Format(Format::Date), "2024-02-30", false; "date past month end")]
    #[test_case(TypeConstraint::Format(Format::Date), "2023-02-29", false; "date not a leap year")]
    #[test_case(TypeConstraint::Format(Format::Date), "2024-2-09", false; "date unpadded month")]
    #[test_case(TypeConstraint::Format(Format::Kebab), "order-service", true; "kebab ok")]
    fn checks_values(constraint: TypeConstraint, value: &str, ok: bool) {
        assert_eq!(constraint.check(value).is_ok(), ok);
    }

    #[test]
    fn enum_violation_lists_allowed_values() {
        let constraint = TypeConstraint::Enum(vec!["GET".into(), "POST".into()]);
        let err = constraint.check("FETCH").unwrap_err();
        assert_eq!(err.to_string(), "'FETCH' is not one of [GET, POST]");
    }

    #[test]
    fn pattern_is_compiled_from_spec() {
        let spec: ConstraintSpec = serde_yaml::from_str("{ kind: pattern, regex: '^/' }").unwrap();
        let constraint = TypeConstraint::try_from(spec).unwrap();
        assert!(constraint.check("/orders").is_ok());
        assert!(matches!(
            constraint.check("orders"),
            Err(ConstraintViolation::Pattern { .. })
        ));
    }

    #[test]
    fn invalid_pattern_fails_to_compile() {
        let spec = ConstraintSpec::Pattern {
            regex: "([".to_string(),
        };
        assert!(TypeConstraint::try_from(spec).is_err());
    }
}
