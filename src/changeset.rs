//! Change set description, as returned by `DescribeChangeSet`.
//!
//! Field names follow the provider's JSON (PascalCase). Keys this crate does
//! not use are ignored, and enum values it does not know are kept verbatim in
//! an `Other` variant so a newer provider never breaks deserialization.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Resource type of a nested stack.
pub const NESTED_STACK_TYPE: &str = "AWS::CloudFormation::Stack";

macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($variant,)+
            Other(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $wire,)+
                    Self::Other(value) => value,
                }
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                match value.as_str() {
                    $($wire => Self::$variant,)+
                    _ => Self::Other(value),
                }
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::from(value.to_string())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_enum!(
    /// Kind of a change entry. Only `Resource` carries a resource change.
    ChangeType {
        Resource => "Resource",
    }
);

wire_enum!(
    ChangeAction {
        Add => "Add",
        Remove => "Remove",
        Modify => "Modify",
        Import => "Import",
        Dynamic => "Dynamic",
    }
);

wire_enum!(
    Replacement {
        True => "True",
        False => "False",
        Conditional => "Conditional",
    }
);

wire_enum!(
    ChangeSource {
        DirectModification => "DirectModification",
        ParameterReference => "ParameterReference",
        ResourceReference => "ResourceReference",
        ResourceAttribute => "ResourceAttribute",
        Automatic => "Automatic",
    }
);

wire_enum!(
    Evaluation {
        Static => "Static",
        Dynamic => "Dynamic",
    }
);

wire_enum!(
    /// Part of the resource a change detail targets.
    ResourceAttribute {
        Properties => "Properties",
        Metadata => "Metadata",
        CreationPolicy => "CreationPolicy",
        UpdatePolicy => "UpdatePolicy",
        DeletionPolicy => "DeletionPolicy",
        UpdateReplacePolicy => "UpdateReplacePolicy",
        Tags => "Tags",
    }
);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChangeSet {
    #[serde(default)]
    pub stack_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_set_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_set_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_status: Option<String>,
    #[serde(default)]
    pub changes: Vec<Change>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

impl ChangeSet {
    pub fn from_json(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Change {
    #[serde(rename = "Type")]
    pub kind: ChangeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_change: Option<ResourceChange>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceChange {
    pub action: ChangeAction,
    pub logical_resource_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
    #[serde(default)]
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement: Option<Replacement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scope: Vec<ResourceAttribute>,
    #[serde(default)]
    pub details: Vec<ResourceChangeDetail>,
    /// Set for nested stacks whose change set was created alongside the parent's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_set_id: Option<String>,
}

impl ResourceChange {
    pub fn is_nested_stack(&self) -> bool {
        self.resource_type == NESTED_STACK_TYPE
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceChangeDetail {
    pub target: ResourceTargetDefinition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<Evaluation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_source: Option<ChangeSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub causing_entity: Option<String>,
}

impl ResourceChangeDetail {
    pub fn causing_entity(&self) -> &str {
        self.causing_entity.as_deref().unwrap_or_default()
    }

    pub fn is_static(&self) -> bool {
        self.evaluation == Some(Evaluation::Static)
    }

    pub fn is_dynamic(&self) -> bool {
        self.evaluation == Some(Evaluation::Dynamic)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceTargetDefinition {
    pub attribute: ResourceAttribute,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_recreation: Option<String>,
}

impl ResourceTargetDefinition {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// Two details address the same target when attribute and name agree.
    pub fn same_target(&self, other: &Self) -> bool {
        self.attribute == other.attribute && self.name() == other.name()
    }
}
