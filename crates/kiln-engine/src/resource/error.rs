use thiserror::Error;

use super::ResourceKind;

/// Recoverable resource failures.
///
/// These are logged where they occur and leave the resource unallocated;
/// rendering carries on without it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResourceError {
    #[error("{kind} '{label}' has zero size ({width}x{height})")]
    ZeroSized {
        kind: ResourceKind,
        label: String,
        width: u32,
        height: u32,
    },

    #[error("{kind} '{label}' cannot be created from an empty array")]
    EmptyGeometry { kind: ResourceKind, label: String },

    #[error("{kind} '{label}' is already allocated; release it first")]
    AlreadyAllocated { kind: ResourceKind, label: String },

    #[error("{kind} '{label}' is not allocated")]
    NotAllocated { kind: ResourceKind, label: String },

    #[error("texture '{label}' was not created with CPU write access")]
    NotWritable { label: String },

    #[error("texture '{label}': row of {row_bytes} bytes is shorter than {min} bytes of texels")]
    RowTooShort { label: String, row_bytes: u32, min: u32 },

    #[error("texture '{label}': payload of {got} bytes, {needed} required")]
    PayloadTooShort {
        label: String,
        needed: usize,
        got: usize,
    },

    #[error("{kind} '{label}': graphics device has been shut down")]
    DeviceLost { kind: ResourceKind, label: String },
}
