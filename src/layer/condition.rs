//! Draw conditions and data-bound properties.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data_model::{DataModel, DataValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equal,
    NotEqual,
    Greater,
    Less,
    Contains,
}

/// `field <operator> value`; a layer only draws while all of its
/// conditions hold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerCondition {
    pub field: String,
    pub operator: Operator,
    pub value: DataValue,
}

impl LayerCondition {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<DataValue>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// A missing field or mismatched value types never match
    pub fn evaluate(&self, data: &DataModel) -> bool {
        let Some(actual) = data.get(&self.field) else {
            return false;
        };
        match self.operator {
            Operator::Equal => actual == &self.value,
            Operator::NotEqual => same_kind(actual, &self.value) && actual != &self.value,
            Operator::Greater => match (actual, &self.value) {
                (DataValue::Number(a), DataValue::Number(b)) => a > b,
                _ => false,
            },
            Operator::Less => match (actual, &self.value) {
                (DataValue::Number(a), DataValue::Number(b)) => a < b,
                _ => false,
            },
            Operator::Contains => match (actual, &self.value) {
                (DataValue::Text(a), DataValue::Text(b)) => {
                    a.to_lowercase().contains(&b.to_lowercase())
                }
                _ => false,
            },
        }
    }
}

impl fmt::Display for LayerCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.operator {
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::Greater => ">",
            Operator::Less => "<",
            Operator::Contains => "contains",
        };
        write!(f, "{} {op} {}", self.field, self.value)
    }
}

fn same_kind(a: &DataValue, b: &DataValue) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DynamicTarget {
    Opacity,
    Width,
    Height,
}

/// Scales a property by `field / max`, clamped to [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicProperty {
    pub target: DynamicTarget,
    pub field: String,
    pub max: f64,
}

impl DynamicProperty {
    pub fn new(target: DynamicTarget, field: impl Into<String>, max: f64) -> Self {
        Self {
            target,
            field: field.into(),
            max,
        }
    }

    /// Scale factor, or `None` when the field is missing or not a number
    pub fn factor(&self, data: &DataModel) -> Option<f32> {
        let value = data.get(&self.field)?.as_number()?;
        if self.max <= 0.0 || !self.max.is_finite() {
            return None;
        }
        Some((value / self.max).clamp(0.0, 1.0) as f32)
    }
}
