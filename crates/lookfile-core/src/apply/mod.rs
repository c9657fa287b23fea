//! Applying resolved values onto typed parameters
//!
//! The host describes its target through [`ParameterSink`]: which
//! parameters exist and of what kind, and how to set each scalar kind. A
//! value is applied only when its dynamic type fits the declared kind;
//! anything else is skipped for that one attribute and reported.

mod ray;

pub use ray::{
    RAY_ALL, RAY_UNDEFINED, RECONCILE_ORDER, RayType, VisibilitySplit, reconcile_visibility,
};

use crate::value::{Value, ValueBag};
use serde::{Deserialize, Serialize};

/// Attribute that triggers visibility reconciliation
pub const VISIBILITY: &str = "visibility";

/// Declared kind of a target parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Bool,
    Byte,
    Int,
    UInt,
    Float,
    String,
    /// Enumerated parameter settable by label
    Enum,
    /// Colors, vectors, matrices and other kinds this crate does not set
    Other,
}

/// Target of attribute application
pub trait ParameterSink {
    /// Declared kind of `name`, or `None` if the target has no such parameter
    fn param_kind(&self, name: &str) -> Option<ParamKind>;

    fn set_bool(&mut self, name: &str, value: bool);
    fn set_byte(&mut self, name: &str, value: u8);
    fn set_int(&mut self, name: &str, value: i32);
    fn set_uint(&mut self, name: &str, value: u32);
    fn set_float(&mut self, name: &str, value: f32);
    fn set_string(&mut self, name: &str, value: &str);
}

/// How visibility overrides are expressed on the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RayFlagMode {
    /// Set the `visibility` byte only
    #[default]
    Mask,
    /// Also set a `visibility.<RAY_TYPE>` boolean per ray type
    MaskAndFlags,
}

/// Per-scene options for attribute application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplyOptions {
    /// Visibility of the enclosing (procedural) object
    pub parent_visibility: u8,
    pub ray_flags: RayFlagMode,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            parent_visibility: RAY_ALL,
            ray_flags: RayFlagMode::Mask,
        }
    }
}

/// Why an attribute was not applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The target declares no parameter of that name
    UnknownParameter,
    /// The value's type does not fit the parameter kind
    TypeMismatch {
        value: &'static str,
        kind: ParamKind,
    },
    /// An integer does not fit the parameter's width
    OutOfRange,
    /// An integer has no label in the attribute's enum table
    UnknownEnumValue(i64),
}

/// What applying one value bag did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Parameter names that were set, after renaming
    pub applied: Vec<String>,
    pub skipped: Vec<(String, SkipReason)>,
    /// Present when a `visibility` override was reconciled
    pub visibility: Option<VisibilitySplit>,
}

/// Renames applied to attribute names before lookup
pub fn canonical_attribute_name(name: &str) -> &str {
    match name {
        "subdiv_iterations" => "iterations",
        "disp_zero_value" => "zero_value",
        other => other,
    }
}

/// Labels for integer-authored enum attributes
pub fn enum_labels(name: &str) -> Option<&'static [&'static str]> {
    match name {
        "subdiv_type" => Some(&["none", "catclark", "linear"]),
        "subdiv_uv_smoothing" => Some(&["pin_corners", "pin_borders", "linear", "smooth"]),
        _ => None,
    }
}

/// Apply one value to a parameter of a known kind
///
/// Returns the visibility split when the value was a reconciled visibility
/// mask. `name` must already be canonical.
pub fn apply_value<S: ParameterSink + ?Sized>(
    sink: &mut S,
    name: &str,
    value: &Value,
    kind: ParamKind,
    options: &ApplyOptions,
) -> Result<Option<VisibilitySplit>, SkipReason> {
    match (value, kind) {
        (Value::Bool(b), ParamKind::Bool) => sink.set_bool(name, *b),
        (Value::Int(_) | Value::UInt(_), ParamKind::Byte) => {
            let byte = integer(value).and_then(|i| u8::try_from(i).ok());
            let byte = byte.ok_or(SkipReason::OutOfRange)?;

            if name == VISIBILITY {
                let split = reconcile_visibility(byte, options.parent_visibility);
                sink.set_byte(name, split.object);
                if options.ray_flags == RayFlagMode::MaskAndFlags {
                    for ray in RECONCILE_ORDER {
                        sink.set_bool(&format!("{}.{}", VISIBILITY, ray.name()), ray.is_set(split.object));
                    }
                }
                return Ok(Some(split));
            }
            sink.set_byte(name, byte);
        }
        (Value::Int(_) | Value::UInt(_), ParamKind::Int) => {
            let int = integer(value).and_then(|i| i32::try_from(i).ok());
            sink.set_int(name, int.ok_or(SkipReason::OutOfRange)?);
        }
        (Value::Int(_) | Value::UInt(_), ParamKind::UInt) => {
            let uint = integer(value).and_then(|i| u32::try_from(i).ok());
            sink.set_uint(name, uint.ok_or(SkipReason::OutOfRange)?);
        }
        (Value::Int(_) | Value::UInt(_), ParamKind::Enum) => {
            let index = integer(value).ok_or(SkipReason::OutOfRange)?;
            match enum_labels(name) {
                Some(labels) => {
                    let label = usize::try_from(index)
                        .ok()
                        .and_then(|i| labels.get(i))
                        .ok_or(SkipReason::UnknownEnumValue(i64::try_from(index).unwrap_or(i64::MAX)))?;
                    sink.set_string(name, label);
                }
                None => {
                    let index = i32::try_from(index).map_err(|_| SkipReason::OutOfRange)?;
                    sink.set_int(name, index);
                }
            }
        }
        (Value::Float(f), ParamKind::Float) => sink.set_float(name, *f as f32),
        (Value::String(s), ParamKind::String | ParamKind::Enum) => sink.set_string(name, s),
        (value, kind) => {
            return Err(SkipReason::TypeMismatch {
                value: value.type_name(),
                kind,
            });
        }
    }

    Ok(None)
}

/// Widen `Int`/`UInt` to `i128` so every range check is exact
fn integer(value: &Value) -> Option<i128> {
    match value {
        Value::Int(i) => Some(i128::from(*i)),
        Value::UInt(u) => Some(i128::from(*u)),
        _ => None,
    }
}

/// Apply every attribute of a resolved value bag
///
/// Names are canonicalized first. Unknown parameters and type mismatches
/// skip that attribute only; the rest of the bag still applies.
pub fn apply_bag<S: ParameterSink + ?Sized>(sink: &mut S, bag: &ValueBag, options: &ApplyOptions) -> ApplyReport {
    let mut report = ApplyReport::default();

    for (raw_name, value) in bag {
        let name = canonical_attribute_name(raw_name);

        let result = match sink.param_kind(name) {
            Some(kind) => apply_value(&mut *sink, name, value, kind, options),
            None => Err(SkipReason::UnknownParameter),
        };

        match result {
            Ok(split) => {
                if split.is_some() {
                    report.visibility = split;
                }
                report.applied.push(name.to_string());
            }
            Err(reason) => {
                tracing::debug!("Skipping attribute {} = {}: {:?}", name, value, reason);
                report.skipped.push((name.to_string(), reason));
            }
        }
    }

    report
}
