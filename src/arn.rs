//! Amazon Resource Names, as far as change sets and stacks need them.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static ARN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^arn:(?P<partition>[^:]+):(?P<service>[^:]+):",
        r"(?P<region>[^:]*):(?P<account>[^:]*):(?P<resource>.+)$",
    ))
    .unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arn {
    pub partition: String,
    pub service: String,
    pub region: String,
    pub account: String,
    pub resource: String,
}

impl Arn {
    pub fn parse(input: &str) -> Result<Self> {
        let caps = ARN_RE
            .captures(input)
            .ok_or_else(|| Error::malformed(input, "not an ARN"))?;
        Ok(Self {
            partition: caps["partition"].to_string(),
            service: caps["service"].to_string(),
            region: caps["region"].to_string(),
            account: caps["account"].to_string(),
            resource: caps["resource"].to_string(),
        })
    }

    /// Resource part split on `/`, e.g. `["stack", "name", "guid"]`.
    pub fn resource_segments(&self) -> Vec<&str> {
        self.resource.split('/').collect()
    }
}

pub fn is_arn(input: &str) -> bool {
    input.starts_with("arn:")
}

/// Unqualified change set name for a bare name or a change set ARN.
pub fn change_set_name(identifier: &str) -> Result<String> {
    if !is_arn(identifier) {
        return Ok(identifier.to_string());
    }
    let arn = Arn::parse(identifier)?;
    let segments = arn.resource_segments();
    if arn.service != "cloudformation" || segments[0] != "changeSet" {
        return Err(Error::malformed(
            identifier,
            "ARN is not referencing a CloudFormation change set",
        ));
    }
    match segments.get(1) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(Error::malformed(identifier, "ARN has no change set name")),
    }
}

/// Stack name from a stack ARN (`...:stack/<name>/<id>`).
pub fn stack_name(identifier: &str) -> Result<String> {
    let arn = Arn::parse(identifier)?;
    match arn.resource_segments().get(1) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(Error::malformed(identifier, "ARN has no stack name")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STACK_ARN: &str =
        "arn:aws:cloudformation:us-east-1:123456789012:stack/app-Nested1-ABC/1a2b3c4d";

    #[test]
    fn parses_stack_arn() {
        let arn = Arn::parse(STACK_ARN).unwrap();
        assert_eq!(arn.partition, "aws");
        assert_eq!(arn.service, "cloudformation");
        assert_eq!(arn.region, "us-east-1");
        assert_eq!(arn.account, "123456789012");
        assert_eq!(arn.resource_segments(), vec!["stack", "app-Nested1-ABC", "1a2b3c4d"]);
        assert_eq!(stack_name(STACK_ARN).unwrap(), "app-Nested1-ABC");
    }

    #[test]
    fn change_set_names() {
        assert_eq!(change_set_name("my-change-set").unwrap(), "my-change-set");
        assert_eq!(
            change_set_name("arn:aws:cloudformation:eu-west-1:1:changeSet/cs-42/abcd").unwrap(),
            "cs-42"
        );
    }

    #[test]
    fn rejects_non_change_set_arns() {
        let err = change_set_name(STACK_ARN).unwrap_err();
        assert!(matches!(err, Error::MalformedIdentifier { .. }));
        let err = change_set_name("arn:aws:s3:::changeSet/x").unwrap_err();
        assert!(matches!(err, Error::MalformedIdentifier { .. }));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(stack_name("not-an-arn"), Err(Error::MalformedIdentifier { .. })));
        assert!(matches!(
            stack_name("arn:aws:cloudformation:us-east-1:1:stack"),
            Err(Error::MalformedIdentifier { .. })
        ));
    }
}
