//! Ray-type visibility masks
//!
//! Visibility is one byte with a bit per ray-type category. When an
//! override sets `visibility` on an object nested under a procedural, its
//! mask is reconciled bit by bit against the procedural's own mask.

use serde::{Deserialize, Serialize};

/// No ray type
pub const RAY_UNDEFINED: u8 = 0x00;

/// Every ray type
pub const RAY_ALL: u8 = 0xFF;

/// A ray-type category and its bit in the visibility mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RayType {
    Camera,
    Shadow,
    DiffuseTransmit,
    SpecularTransmit,
    Volume,
    DiffuseReflect,
    SpecularReflect,
    Subsurface,
}

impl RayType {
    pub const fn bit(self) -> u8 {
        match self {
            Self::Camera => 0x01,
            Self::Shadow => 0x02,
            Self::DiffuseTransmit => 0x04,
            Self::SpecularTransmit => 0x08,
            Self::Volume => 0x10,
            Self::DiffuseReflect => 0x20,
            Self::SpecularReflect => 0x40,
            Self::Subsurface => 0x80,
        }
    }

    /// Name used for the companion `visibility.<NAME>` flag
    pub const fn name(self) -> &'static str {
        match self {
            Self::Camera => "AI_RAY_CAMERA",
            Self::Shadow => "AI_RAY_SHADOW",
            Self::DiffuseTransmit => "AI_RAY_DIFFUSE_TRANSMIT",
            Self::SpecularTransmit => "AI_RAY_SPECULAR_TRANSMIT",
            Self::Volume => "AI_RAY_VOLUME",
            Self::DiffuseReflect => "AI_RAY_DIFFUSE_REFLECT",
            Self::SpecularReflect => "AI_RAY_SPECULAR_REFLECT",
            Self::Subsurface => "AI_RAY_SUBSURFACE",
        }
    }

    /// Whether `mask` enables this ray type
    pub const fn is_set(self, mask: u8) -> bool {
        mask & self.bit() != 0
    }
}

/// Order in which bits are reconciled. Changing it changes the output.
pub const RECONCILE_ORDER: [RayType; 8] = [
    RayType::Subsurface,
    RayType::SpecularReflect,
    RayType::DiffuseReflect,
    RayType::Volume,
    RayType::SpecularTransmit,
    RayType::DiffuseTransmit,
    RayType::Shadow,
    RayType::Camera,
];

/// Result of reconciling an override mask with its enclosing object's mask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilitySplit {
    /// Mask assigned to the overridden object
    pub object: u8,
    /// What remains attributed to the enclosing object
    pub parent: u8,
}

/// Reconcile an override visibility against the enclosing object's visibility
///
/// Starting from a full compare mask, each bit in [`RECONCILE_ORDER`] is
/// cleared from the compare mask; then, if the parent mask is numerically
/// greater than the compare mask, the bit is cleared from the parent,
/// otherwise from the override. The parent only clears bits while it is
/// still greater than the shrinking compare mask, so the result is always
/// `object == override_mask & parent_mask` with `parent == 0`.
pub fn reconcile_visibility(override_mask: u8, parent_mask: u8) -> VisibilitySplit {
    let mut object = override_mask;
    let mut parent = parent_mask;
    let mut compare = RAY_ALL;

    for ray in RECONCILE_ORDER {
        compare &= !ray.bit();
        if parent > compare {
            parent &= !ray.bit();
        } else {
            object &= !ray.bit();
        }
    }

    VisibilitySplit { object, parent }
}
