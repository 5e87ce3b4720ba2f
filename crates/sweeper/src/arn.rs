//! Amazon Resource Names.
use std::str::FromStr;

#[derive(snafu::Snafu, Debug, Clone, PartialEq)]
#[snafu(display("{msg}"))]
pub struct ParseArnError {
    arn: String,
    msg: &'static str,
}

impl ParseArnError {
    pub fn arn(&self) -> &str {
        &self.arn
    }
}

/// A parsed ARN, eg.
/// `arn:aws:catalog:us-west-2:187416307283:product/prod-t5thhvquxw2x2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arn {
    pub partition: String,
    pub service: String,
    pub region: String,
    pub account_id: String,
    pub resource: String,
}

impl Arn {
    /// Splits the resource part into its type and ID, eg. `product` and
    /// `prod-t5thhvquxw2x2`.
    pub fn resource_type_and_id(&self) -> Option<(&str, &str)> {
        self.resource
            .split_once('/')
            .filter(|(ty, id)| !ty.is_empty() && !id.is_empty())
    }
}

impl FromStr for Arn {
    type Err = ParseArnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fail = |msg| ParseArnError {
            arn: s.to_owned(),
            msg,
        };
        let parts: Vec<&str> = s.splitn(6, ':').collect();
        if parts.len() != 6 {
            return Err(fail("not enough sections"));
        }
        if parts[0] != "arn" {
            return Err(fail("invalid prefix"));
        }
        if parts[1].is_empty() {
            return Err(fail("invalid partition"));
        }
        if parts[2].is_empty() {
            return Err(fail("invalid service"));
        }
        if parts[5].is_empty() {
            return Err(fail("invalid resource"));
        }
        Ok(Arn {
            partition: parts[1].to_owned(),
            service: parts[2].to_owned(),
            region: parts[3].to_owned(),
            account_id: parts[4].to_owned(),
            resource: parts[5].to_owned(),
        })
    }
}

impl core::fmt::Display for Arn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "arn:{}:{}:{}:{}:{}",
            self.partition, self.service, self.region, self.account_id, self.resource
        )
    }
}
