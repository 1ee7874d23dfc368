//! Structural request validation.
//!
//! The validation stage of a server pipeline runs a [`Validator`] against
//! the request value before it reaches the terminal handler. Validators are
//! plain trait objects configured at build time; there is no reflection and
//! no runtime type discovery.

use crate::error::FieldErrors;

/// Exposes a request's fields by name for structural validation.
///
/// Request types that want [`RequiredFields`] checking implement this to
/// surface their string-typed fields.
pub trait FieldLookup {
    /// Returns the field's value, or `None` when the request has no such
    /// field.
    fn field(&self, name: &str) -> Option<&str>;
}

/// A structural validator for request values.
pub trait Validator<Req>: Send + Sync + 'static {
    /// Validates `req`, returning the accumulated field errors on failure.
    fn validate(&self, req: &Req) -> Result<(), FieldErrors>;
}

/// A validator that accepts every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl<Req> Validator<Req> for AcceptAll {
    fn validate(&self, _req: &Req) -> Result<(), FieldErrors> {
        Ok(())
    }
}

/// Requires a fixed set of fields to be present and non-blank.
///
/// # Example
///
/// ```
/// use keryx_core::{FieldLookup, RequiredFields, Validator};
///
/// struct Payment { merchant_id: String }
///
/// impl FieldLookup for Payment {
///     fn field(&self, name: &str) -> Option<&str> {
///         (name == "merchant_id").then_some(self.merchant_id.as_str())
///     }
/// }
///
/// let checker = RequiredFields::new(["merchant_id"]);
/// let blank = Payment { merchant_id: String::new() };
/// assert!(checker.validate(&blank).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequiredFields {
    fields: Vec<String>,
}

impl RequiredFields {
    /// Creates a validator requiring each named field.
    #[must_use]
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

impl<Req: FieldLookup> Validator<Req> for RequiredFields {
    fn validate(&self, req: &Req) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        for name in &self.fields {
            match req.field(name) {
                None => errors.add(name.clone(), "required"),
                Some(value) if value.trim().is_empty() => {
                    errors.add(name.clone(), "must not be blank");
                }
                Some(_) => {}
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Req {
        name: String,
        code: String,
    }

    impl FieldLookup for Req {
        fn field(&self, name: &str) -> Option<&str> {
            match name {
                "name" => Some(&self.name),
                "code" => Some(&self.code),
                _ => None,
            }
        }
    }

    #[test]
    fn test_accept_all() {
        let req = Req {
            name: String::new(),
            code: String::new(),
        };
        assert!(AcceptAll.validate(&req).is_ok());
    }

    #[test]
    fn test_required_fields_pass() {
        let checker = RequiredFields::new(["name", "code"]);
        let req = Req {
            name: "transfer".into(),
            code: "T100".into(),
        };
        assert!(checker.validate(&req).is_ok());
    }

    #[test]
    fn test_blank_and_missing_fields_fail() {
        let checker = RequiredFields::new(["name", "code", "absent"]);
        let req = Req {
            name: "  ".into(),
            code: "T100".into(),
        };

        let errors = checker.validate(&req).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.fields["name"], vec!["must not be blank"]);
        assert_eq!(errors.fields["absent"], vec!["required"]);
    }
}
