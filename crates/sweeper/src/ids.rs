//! Composite resource identifiers.
//!
//! Association resources have no single remote ID, so their identifier is
//! composed from the IDs of both sides (and sometimes a language tag). The
//! destroy operation parses it back, which means composing and parsing have
//! to agree exactly on the separator and the order of the parts.
//!
//! Implement [`ResourceId`] with `#[derive(ResourceId)]`.

/// A composite identifier with a fixed number of parts joined by a
/// separator.
pub trait ResourceId:
    core::fmt::Display + core::str::FromStr<Err = ParseIdError> + Sized
{
    /// String placed between the parts.
    const SEPARATOR: &'static str;

    /// Names of the parts, in order.
    const FIELDS: &'static [&'static str];

    /// Human readable format, eg. `budget_name:resource_id`.
    fn expected_format() -> String {
        Self::FIELDS.join(Self::SEPARATOR)
    }
}

#[derive(snafu::Snafu, Debug, Clone, PartialEq)]
#[snafu(display("unexpected format for ID ({id}), expected {expected}"))]
pub struct ParseIdError {
    id: String,
    expected: String,
}

impl ParseIdError {
    pub fn new(id: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            expected: expected.into(),
        }
    }

    /// The identifier that could not be parsed.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn expected(&self) -> &str {
        &self.expected
    }
}
