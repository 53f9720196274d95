// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::annotations;
use crate::error::{Result, WatchtowerError};
use kube::{api::DynamicObject, CustomResource, ResourceExt};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Only `replicas` is modelled; every other `spec` field belongs to the AAP operator.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(
    group = "automationcontroller.ansible.com",
    version = "v1beta1",
    kind = "AutomationController",
    plural = "automationcontrollers"
)]
#[kube(namespaced)]
#[serde(rename_all = "camelCase")]
pub struct AutomationControllerSpec {
    /// Kept as raw JSON: the API server may hand back any numeric encoding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<Value>,
}

/// The wire encodings a JSON integer can arrive in
#[derive(Debug, Clone, Copy, PartialEq)]
enum NumericEncoding {
    Signed(i64),
    Unsigned(u64),
    Float(f64),
}

impl NumericEncoding {
    fn of(number: &Number) -> Option<Self> {
        if let Some(v) = number.as_i64() {
            Some(Self::Signed(v))
        } else if let Some(v) = number.as_u64() {
            Some(Self::Unsigned(v))
        } else {
            number.as_f64().map(Self::Float)
        }
    }

    fn normalize(self) -> std::result::Result<i64, String> {
        match self {
            Self::Signed(v) => Ok(v),
            Self::Unsigned(v) => {
                i64::try_from(v).map_err(|_| format!("value {} is out of range", v))
            }
            Self::Float(v) if v.fract() != 0.0 => Err(format!("value {} is not an integer", v)),
            Self::Float(v) if v < i64::MIN as f64 || v >= i64::MAX as f64 => {
                Err(format!("value {} is out of range", v))
            }
            Self::Float(v) => Ok(v as i64),
        }
    }
}

/// Items are listed untyped so one malformed object cannot fail the whole list.
/// A missing or odd `spec` surfaces later through [`AutomationController::observed_replicas`].
impl From<DynamicObject> for AutomationController {
    fn from(obj: DynamicObject) -> Self {
        let replicas = obj
            .data
            .get("spec")
            .and_then(|spec| spec.get("replicas"))
            .cloned();

        AutomationController {
            metadata: obj.metadata,
            spec: AutomationControllerSpec { replicas },
        }
    }
}

impl AutomationController {
    /// Replica count declared through the `watch-tower/replicas` annotation
    pub fn target_replicas(&self) -> Result<u32> {
        let Some(value) = self.annotations().get(annotations::REPLICAS) else {
            return Err(WatchtowerError::MissingAnnotation {
                name: self.name_any(),
                key: annotations::REPLICAS,
            });
        };

        value
            .parse::<u32>()
            .map_err(|_| WatchtowerError::InvalidAnnotation {
                name: self.name_any(),
                key: annotations::REPLICAS,
                value: value.clone(),
            })
    }

    /// Current `spec.replicas`, normalized to a single integer type
    pub fn observed_replicas(&self) -> Result<i64> {
        let invalid = |reason: String| WatchtowerError::ObservedValue {
            name: self.name_any(),
            reason,
        };

        match &self.spec.replicas {
            None | Some(Value::Null) => Err(invalid("spec.replicas field not found".to_string())),
            Some(Value::Number(number)) => NumericEncoding::of(number)
                .ok_or_else(|| invalid(format!("unrecognised number {}", number)))?
                .normalize()
                .map_err(invalid),
            Some(other) => Err(invalid(format!(
                "unexpected type for spec.replicas: {}",
                json_type(other)
            ))),
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
