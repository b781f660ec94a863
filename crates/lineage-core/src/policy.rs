//! IAM policy documents.
//!
//! Types for the identity and trust policies attached to replication roles.
//! They serialize to the AWS IAM JSON policy grammar.

use serde::{Deserialize, Serialize};

/// The only policy language version IAM accepts for new documents.
pub const POLICY_VERSION: &str = "2012-10-17";

/// An IAM policy document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    /// The policy language version.
    pub version: String,
    /// The policy statements.
    pub statement: Vec<Statement>,
}

impl PolicyDocument {
    /// Creates a policy document holding the given statements.
    #[must_use]
    pub fn new(statement: Vec<Statement>) -> Self {
        Self { version: POLICY_VERSION.to_string(), statement }
    }

    /// Returns true if any Allow statement grants `action` on `resource`.
    #[must_use]
    pub fn allows(&self, action: &str, resource: &str) -> bool {
        self.statement.iter().any(|s| {
            s.effect == Effect::Allow
                && s.action.values().contains(&action)
                && s.resource.as_ref().is_some_and(|r| r.values().contains(&resource))
        })
    }
}

/// A single policy statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    /// An optional identifier for the statement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    /// Whether this statement allows or denies access.
    pub effect: Effect,
    /// The principal this statement applies to (trust policies only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,
    /// The action(s) this statement covers.
    pub action: StringOrArray,
    /// The resource(s) this statement covers (identity policies only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<StringOrArray>,
}

impl Statement {
    /// Creates an Allow statement for `actions` on `resources`.
    #[must_use]
    pub fn allow<A, R>(actions: A, resources: R) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            sid: None,
            effect: Effect::Allow,
            principal: None,
            action: StringOrArray::from_iter(actions),
            resource: Some(StringOrArray::from_iter(resources)),
        }
    }

    /// Creates the `sts:AssumeRole` trust statement for an AWS service principal.
    #[must_use]
    pub fn assume_role_by_service(service: impl Into<String>) -> Self {
        Self {
            sid: None,
            effect: Effect::Allow,
            principal: Some(Principal {
                service: Some(StringOrArray::Single(service.into())),
                aws: None,
            }),
            action: StringOrArray::Single("sts:AssumeRole".to_string()),
            resource: None,
        }
    }
}

/// The effect of a policy statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Allow the action.
    Allow,
    /// Deny the action.
    Deny,
}

/// Principal specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Principal {
    /// AWS service principals (e.g. `s3.amazonaws.com`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<StringOrArray>,
    /// AWS account ARNs or account IDs.
    #[serde(default, rename = "AWS", skip_serializing_if = "Option::is_none")]
    pub aws: Option<StringOrArray>,
}

/// Either a single string or an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrArray {
    /// A single string.
    Single(String),
    /// An array of strings.
    Array(Vec<String>),
}

impl StringOrArray {
    /// Returns the values as a vector of string slices.
    pub fn values(&self) -> Vec<&str> {
        match self {
            StringOrArray::Single(s) => vec![s.as_str()],
            StringOrArray::Array(v) => v.iter().map(|s| s.as_str()).collect(),
        }
    }
}

impl<S: Into<String>> FromIterator<S> for StringOrArray {
    /// One value collapses to `Single`, as IAM prints it.
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut values: Vec<String> = iter.into_iter().map(Into::into).collect();
        if values.len() == 1 {
            StringOrArray::Single(values.remove(0))
        } else {
            StringOrArray::Array(values)
        }
    }
}

/// A customer-managed policy attached to a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ManagedPolicy {
    /// Policy name, unique within the account.
    pub policy_name: String,
    /// Human-readable description.
    pub description: String,
    /// The policy document.
    pub policy_document: PolicyDocument,
}
