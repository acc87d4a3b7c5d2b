//! Opaque resource identifiers
//!
//! A resource identifier packs every scoping dimension needed to find an
//! object on the device into one string, components joined by `:` in a
//! fixed order. Empty components keep their slot, so the number of
//! separators tells the identifier's arity:
//!
//! ```
//! use declarative::id;
//!
//! let id = id::build(&["", "vsys1", "app1"]);
//! assert_eq!(id, ":vsys1:app1");
//! assert_eq!(id::parse(&id), vec!["", "vsys1", "app1"]);
//! ```
//!
//! Component values come from a character set that excludes the
//! separator, so nothing is escaped. Per-family identifier types are
//! declared with [`identifier!`](crate::identifier).

use crate::data::{Attrs, ResourceData};
use crate::error::{Error, Result};

/// Separator between identifier components.
pub const SEPARATOR: char = ':';

/// Join components into an identifier.
pub fn build<S: AsRef<str>>(components: &[S]) -> String {
    let mut id = String::new();
    for (i, component) in components.iter().enumerate() {
        if i > 0 {
            id.push(SEPARATOR);
        }
        id.push_str(component.as_ref());
    }
    id
}

/// Split an identifier into all of its components.
pub fn parse(id: &str) -> Vec<String> {
    id.split(SEPARATOR).map(str::to_string).collect()
}

/// Number of components in an identifier.
pub fn arity(id: &str) -> usize {
    id.matches(SEPARATOR).count() + 1
}

/// Split an identifier, failing unless it has exactly `expected` components.
pub fn parse_exact(id: &str, expected: usize) -> Result<Vec<String>> {
    let parts = parse(id);
    if parts.len() != expected {
        return Err(Error::IdArity {
            id: id.to_string(),
            expected,
            found: parts.len(),
        });
    }
    Ok(parts)
}

/// Reject component values that would corrupt an identifier.
pub fn check_component(value: &str) -> Result<()> {
    if value.contains(SEPARATOR) {
        return Err(Error::IdComponent {
            value: value.to_string(),
        });
    }
    Ok(())
}

/// A typed identifier for one resource family.
///
/// Field names double as attribute names, which lets the lifecycle pin
/// scoping attributes straight from the identifier and rebuild it from
/// configuration.
pub trait Identifier: Sized {
    /// Component names in identifier order.
    const FIELDS: &'static [&'static str];

    /// Number of components.
    const ARITY: usize = Self::FIELDS.len();

    /// Component values in identifier order.
    fn components(&self) -> Vec<&str>;

    /// Build from components in identifier order.
    fn from_components(parts: Vec<String>) -> Self;

    /// Encode to the opaque string form.
    fn encode(&self) -> String {
        build(&self.components())
    }

    /// Decode from the opaque string form, checking arity.
    fn decode(id: &str) -> Result<Self> {
        parse_exact(id, Self::ARITY).map(Self::from_components)
    }

    /// Check that no component contains the separator.
    fn validate(&self) -> Result<()> {
        self.components().into_iter().try_for_each(check_component)
    }

    /// Value of a named component.
    fn component(&self, field: &str) -> Option<&str> {
        let index = Self::FIELDS.iter().position(|f| *f == field)?;
        self.components().get(index).copied()
    }

    /// Read the components from same-named attributes.
    fn from_data(d: &ResourceData) -> Self {
        Self::from_components(Self::FIELDS.iter().map(|f| d.get_string(f)).collect())
    }

    /// Write the components back into same-named attributes.
    fn write_to(&self, d: &mut ResourceData) {
        for (field, value) in Self::FIELDS.iter().zip(self.components()) {
            d.set(field, value);
        }
    }
}

/// Declare an identifier type whose fields are the identifier components.
///
/// ```
/// use declarative::{identifier, Identifier};
///
/// identifier! {
///     /// `device_group:vsys:name`
///     pub struct AppId { device_group, vsys, name }
/// }
///
/// let id = AppId::decode("shared:vsys1:app1").unwrap();
/// assert_eq!(id.vsys, "vsys1");
/// assert_eq!(id.encode(), "shared:vsys1:app1");
/// ```
#[macro_export]
macro_rules! identifier {
    ($(#[$meta:meta])* $vis:vis struct $name:ident { $($field:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
        $vis struct $name {
            $(pub $field: String,)+
        }

        impl $crate::Identifier for $name {
            const FIELDS: &'static [&'static str] = &[$(stringify!($field)),+];

            fn components(&self) -> Vec<&str> {
                vec![$(self.$field.as_str()),+]
            }

            fn from_components(parts: Vec<String>) -> Self {
                let mut parts = parts.into_iter();
                Self {
                    $($field: parts.next().unwrap_or_default(),)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&$crate::Identifier::encode(self))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    identifier! {
        struct TemplateId { template, template_stack, vsys, name }
    }

    #[test]
    fn test_round_trip() {
        let cases: &[&[&str]] = &[
            &["", "", "vsys1", "radius1"],
            &["tmpl", "", "shared", "x"],
            &["", "stack", "", ""],
            &["a"],
        ];
        for components in cases {
            let id = build(components);
            assert_eq!(parse(&id), components.to_vec());
            assert_eq!(arity(&id), components.len());
        }
    }

    #[test]
    fn test_empty_components_preserved() {
        assert_eq!(build(&["", "", ""]), "::");
        assert_eq!(parse("::"), vec!["", "", ""]);
    }

    #[test]
    fn test_parse_exact_arity() {
        assert!(parse_exact("a:b:c", 3).is_ok());

        let err = parse_exact("vsys1:app1", 3).unwrap_err();
        assert!(matches!(
            err,
            Error::IdArity {
                expected: 3,
                found: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_identifier_type() {
        let id = TemplateId::decode("tmpl::vsys2:prof").unwrap();
        assert_eq!(id.template, "tmpl");
        assert_eq!(id.template_stack, "");
        assert_eq!(id.component("vsys"), Some("vsys2"));
        assert_eq!(id.component("missing"), None);
        assert_eq!(id.to_string(), "tmpl::vsys2:prof");
        assert_eq!(TemplateId::ARITY, 4);

        assert!(TemplateId::decode("vsys2:prof").is_err());
    }

    #[test]
    fn test_identifier_data_round_trip() {
        let id = TemplateId {
            template: String::new(),
            template_stack: "stack".into(),
            vsys: "shared".into(),
            name: "ldap".into(),
        };
        let mut d = ResourceData::default();
        id.write_to(&mut d);
        assert_eq!(d.get_string("template_stack"), "stack");
        assert_eq!(TemplateId::from_data(&d), id);
    }

    #[test]
    fn test_validate_rejects_separator() {
        let id = TemplateId {
            name: "a:b".into(),
            ..Default::default()
        };
        assert!(matches!(id.validate(), Err(Error::IdComponent { .. })));
    }
}
