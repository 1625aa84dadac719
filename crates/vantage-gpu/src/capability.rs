//! Capability identifiers and the dynamically-typed value they map to.
//!
//! A capability is anything queryable about a physical device: a feature
//! flag, a property or limit, or a derived aggregate. Identifiers are
//! contiguous and used only as indices into the dispatch tables in
//! [`crate::registry`]; they are never serialized.

/// One queryable device feature flag.
///
/// Grouped by the native block the value lives in (core features, then the
/// Vulkan 1.1/1.2/1.3 feature blocks). The grouping is informational only;
/// callers address every feature the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureId {
    // Core features
    GeometryShader,
    TessellationShader,
    SamplerAnisotropy,
    FillModeNonSolid,
    WideLines,
    MultiDrawIndirect,
    ShaderInt64,
    ShaderFloat64,
    // Vulkan 1.1
    ShaderDrawParameters,
    // Vulkan 1.2
    BufferDeviceAddress,
    DescriptorIndexing,
    ScalarBlockLayout,
    RuntimeDescriptorArray,
    ShaderSampledImageArrayNonUniformIndexing,
    TimelineSemaphore,
    // Vulkan 1.3
    DynamicRendering,
    Synchronization2,
    Maintenance4,
}

impl FeatureId {
    /// Number of registered features.
    pub const COUNT: usize = Self::ALL.len();

    /// Every feature, in table order.
    pub const ALL: [Self; 18] = [
        Self::GeometryShader,
        Self::TessellationShader,
        Self::SamplerAnisotropy,
        Self::FillModeNonSolid,
        Self::WideLines,
        Self::MultiDrawIndirect,
        Self::ShaderInt64,
        Self::ShaderFloat64,
        Self::ShaderDrawParameters,
        Self::BufferDeviceAddress,
        Self::DescriptorIndexing,
        Self::ScalarBlockLayout,
        Self::RuntimeDescriptorArray,
        Self::ShaderSampledImageArrayNonUniformIndexing,
        Self::TimelineSemaphore,
        Self::DynamicRendering,
        Self::Synchronization2,
        Self::Maintenance4,
    ];
}

/// One queryable device property or limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyId {
    ApiVersion,
    DriverVersion,
    VendorId,
    DeviceId,
    DeviceType,
    DeviceName,
    MaxImageDimension2d,
    MaxPushConstantsSize,
    MaxMemoryAllocationCount,
    MaxBoundDescriptorSets,
    MaxComputeWorkGroupInvocations,
    MaxComputeSharedMemorySize,
    MaxComputeWorkGroupSize,
    TimestampPeriod,
    TimestampComputeAndGraphics,
    /// Total device-local heap memory in MiB, aggregated over the memory
    /// heap table.
    DeviceLocalMemoryMb,
}

impl PropertyId {
    /// Number of registered properties.
    pub const COUNT: usize = Self::ALL.len();

    /// Every property, in table order.
    pub const ALL: [Self; 16] = [
        Self::ApiVersion,
        Self::DriverVersion,
        Self::VendorId,
        Self::DeviceId,
        Self::DeviceType,
        Self::DeviceName,
        Self::MaxImageDimension2d,
        Self::MaxPushConstantsSize,
        Self::MaxMemoryAllocationCount,
        Self::MaxBoundDescriptorSets,
        Self::MaxComputeWorkGroupInvocations,
        Self::MaxComputeSharedMemorySize,
        Self::MaxComputeWorkGroupSize,
        Self::TimestampPeriod,
        Self::TimestampComputeAndGraphics,
        Self::DeviceLocalMemoryMb,
    ];
}

/// Tag describing which [`CapabilityValue`] variant a capability stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    Uint,
    Float,
    UintArray,
    Enum,
    Str,
}

impl ValueKind {
    /// Zero value of this kind, used to pre-fill snapshot slots.
    pub fn default_value(self) -> CapabilityValue {
        match self {
            Self::Bool => CapabilityValue::Bool(false),
            Self::Uint => CapabilityValue::Uint(0),
            Self::Float => CapabilityValue::Float(0.0),
            Self::UintArray => CapabilityValue::UintArray([0; 3]),
            Self::Enum => CapabilityValue::Enum(0),
            Self::Str => CapabilityValue::Str(String::new()),
        }
    }
}

/// A dynamically-typed capability value.
///
/// The variant stored for a given capability always matches the kind that
/// capability's table entry declares; storing or comparing a mismatched
/// variant is a bug in table registration and panics.
#[derive(Debug, Clone, PartialEq)]
pub enum CapabilityValue {
    Bool(bool),
    Uint(u64),
    Float(f64),
    UintArray([u32; 3]),
    Enum(i32),
    Str(String),
}

impl CapabilityValue {
    /// Kind tag of the stored variant.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::Uint(_) => ValueKind::Uint,
            Self::Float(_) => ValueKind::Float,
            Self::UintArray(_) => ValueKind::UintArray,
            Self::Enum(_) => ValueKind::Enum,
            Self::Str(_) => ValueKind::Str,
        }
    }

    /// Get the boolean if this is a flag value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Get the integer if this is a scalar value.
    pub fn as_uint(&self) -> Option<u64> {
        match self {
            Self::Uint(value) => Some(*value),
            _ => None,
        }
    }

    /// Get the float if this is a floating-point value.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Get the array if this is a fixed-size array value.
    pub fn as_uint_array(&self) -> Option<[u32; 3]> {
        match self {
            Self::UintArray(value) => Some(*value),
            _ => None,
        }
    }

    /// Get the raw enumerator if this is an enum value.
    pub fn as_enum(&self) -> Option<i32> {
        match self {
            Self::Enum(value) => Some(*value),
            _ => None,
        }
    }

    /// Get the string if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_kind_matches_variant() {
        assert_eq!(CapabilityValue::Bool(true).kind(), ValueKind::Bool);
        assert_eq!(CapabilityValue::Uint(7).kind(), ValueKind::Uint);
        assert_eq!(CapabilityValue::Float(1.5).kind(), ValueKind::Float);
        assert_eq!(
            CapabilityValue::UintArray([1, 2, 3]).kind(),
            ValueKind::UintArray
        );
        assert_eq!(CapabilityValue::Enum(2).kind(), ValueKind::Enum);
        assert_eq!(
            CapabilityValue::Str("gpu".to_string()).kind(),
            ValueKind::Str
        );
    }

    #[test]
    fn default_value_round_trips_kind() {
        for kind in [
            ValueKind::Bool,
            ValueKind::Uint,
            ValueKind::Float,
            ValueKind::UintArray,
            ValueKind::Enum,
            ValueKind::Str,
        ] {
            assert_eq!(kind.default_value().kind(), kind);
        }
    }

    #[test]
    fn accessors_reject_other_variants() {
        let value = CapabilityValue::Uint(42);
        assert_eq!(value.as_uint(), Some(42));
        assert_eq!(value.as_bool(), None);
        assert_eq!(value.as_str(), None);
    }

    #[test]
    fn id_tables_are_contiguous() {
        for (index, id) in FeatureId::ALL.iter().enumerate() {
            assert_eq!(*id as usize, index);
        }
        for (index, id) in PropertyId::ALL.iter().enumerate() {
            assert_eq!(*id as usize, index);
        }
    }
}
