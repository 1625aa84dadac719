//! Capability dispatch tables.
//!
//! One table entry per [`FeatureId`] / [`PropertyId`], each carrying the
//! operations the rest of the crate needs without knowing the value's
//! concrete type: `read` extracts the value from the owned native struct
//! mirrors (all knowledge of which native field a capability lives in is
//! confined to these closures), and `compare` decides whether an available
//! value satisfies a required one.
//!
//! The tables are const-constructed `static` arrays of fn pointers, indexed
//! by the id's integer value. There is no runtime registration and no
//! initialization order to get wrong: the tables exist before `main` and are
//! never mutated.
//!
//! Storing or comparing a value whose variant does not match the entry's
//! declared kind is a bug in table registration, not a runtime condition,
//! and panics.

use crate::capability::{CapabilityValue, FeatureId, PropertyId, ValueKind};
use crate::snapshot::{CapabilitySnapshot, FeatureChain, PropertyChain};
use ash::vk;

/// Dispatch entry for one feature.
pub struct FeatureOps {
    /// Variant every value of this feature must carry.
    pub kind: ValueKind,
    /// Extract the value from a queried feature chain.
    pub read: fn(&FeatureChain) -> CapabilityValue,
    /// Does `available` satisfy `required`?
    pub compare: fn(required: &CapabilityValue, available: &CapabilityValue) -> bool,
}

/// Dispatch entry for one property.
pub struct PropertyOps {
    /// Variant every value of this property must carry.
    pub kind: ValueKind,
    /// Extract the value from a queried property chain.
    pub read: fn(&PropertyChain) -> CapabilityValue,
    /// Does `available` satisfy `required`?
    pub compare: fn(required: &CapabilityValue, available: &CapabilityValue) -> bool,
}

/// Required flag implies available flag; a `false` requirement is always met.
fn satisfies_bool(required: &CapabilityValue, available: &CapabilityValue) -> bool {
    match (required, available) {
        (CapabilityValue::Bool(required), CapabilityValue::Bool(available)) => {
            !*required || *available
        }
        _ => panic!("capability comparison on mismatched kinds: {required:?} vs {available:?}"),
    }
}

/// Scalar limit: available must reach the required minimum.
fn satisfies_at_least_uint(required: &CapabilityValue, available: &CapabilityValue) -> bool {
    match (required, available) {
        (CapabilityValue::Uint(required), CapabilityValue::Uint(available)) => {
            available >= required
        }
        _ => panic!("capability comparison on mismatched kinds: {required:?} vs {available:?}"),
    }
}

/// Float limit where smaller is better: available must not exceed the
/// required maximum (e.g. timestamp period in nanoseconds per tick).
fn satisfies_at_most_float(required: &CapabilityValue, available: &CapabilityValue) -> bool {
    match (required, available) {
        (CapabilityValue::Float(required), CapabilityValue::Float(available)) => {
            available <= required
        }
        _ => panic!("capability comparison on mismatched kinds: {required:?} vs {available:?}"),
    }
}

/// Fixed-size array limit: element-wise `available >= required`.
fn satisfies_at_least_array(required: &CapabilityValue, available: &CapabilityValue) -> bool {
    match (required, available) {
        (CapabilityValue::UintArray(required), CapabilityValue::UintArray(available)) => required
            .iter()
            .zip(available.iter())
            .all(|(required, available)| available >= required),
        _ => panic!("capability comparison on mismatched kinds: {required:?} vs {available:?}"),
    }
}

/// Exact-match capability (e.g. an enumerated device kind).
fn satisfies_exact_uint(required: &CapabilityValue, available: &CapabilityValue) -> bool {
    match (required, available) {
        (CapabilityValue::Uint(required), CapabilityValue::Uint(available)) => {
            required == available
        }
        _ => panic!("capability comparison on mismatched kinds: {required:?} vs {available:?}"),
    }
}

fn satisfies_exact_enum(required: &CapabilityValue, available: &CapabilityValue) -> bool {
    match (required, available) {
        (CapabilityValue::Enum(required), CapabilityValue::Enum(available)) => {
            required == available
        }
        _ => panic!("capability comparison on mismatched kinds: {required:?} vs {available:?}"),
    }
}

fn satisfies_exact_str(required: &CapabilityValue, available: &CapabilityValue) -> bool {
    match (required, available) {
        (CapabilityValue::Str(required), CapabilityValue::Str(available)) => required == available,
        _ => panic!("capability comparison on mismatched kinds: {required:?} vs {available:?}"),
    }
}

/// Table entry for one boolean feature flag living in one chain block.
macro_rules! feature_flag {
    ($block:ident, $field:ident) => {
        FeatureOps {
            kind: ValueKind::Bool,
            read: |chain| CapabilityValue::Bool(chain.$block.$field != 0),
            compare: satisfies_bool,
        }
    };
}

/// Feature dispatch table, indexed by `FeatureId as usize`.
///
/// Entry order must match [`FeatureId::ALL`].
static FEATURES: [FeatureOps; FeatureId::COUNT] = [
    feature_flag!(core, geometry_shader),
    feature_flag!(core, tessellation_shader),
    feature_flag!(core, sampler_anisotropy),
    feature_flag!(core, fill_mode_non_solid),
    feature_flag!(core, wide_lines),
    feature_flag!(core, multi_draw_indirect),
    feature_flag!(core, shader_int64),
    feature_flag!(core, shader_float64),
    feature_flag!(v11, shader_draw_parameters),
    feature_flag!(v12, buffer_device_address),
    feature_flag!(v12, descriptor_indexing),
    feature_flag!(v12, scalar_block_layout),
    feature_flag!(v12, runtime_descriptor_array),
    feature_flag!(v12, shader_sampled_image_array_non_uniform_indexing),
    feature_flag!(v12, timeline_semaphore),
    feature_flag!(v13, dynamic_rendering),
    feature_flag!(v13, synchronization2),
    feature_flag!(v13, maintenance4),
];

/// Property dispatch table, indexed by `PropertyId as usize`.
///
/// Entry order must match [`PropertyId::ALL`].
static PROPERTIES: [PropertyOps; PropertyId::COUNT] = [
    // ApiVersion
    PropertyOps {
        kind: ValueKind::Uint,
        read: |chain| CapabilityValue::Uint(u64::from(chain.core.api_version)),
        compare: satisfies_at_least_uint,
    },
    // DriverVersion
    PropertyOps {
        kind: ValueKind::Uint,
        read: |chain| CapabilityValue::Uint(u64::from(chain.core.driver_version)),
        compare: satisfies_at_least_uint,
    },
    // VendorId
    PropertyOps {
        kind: ValueKind::Uint,
        read: |chain| CapabilityValue::Uint(u64::from(chain.core.vendor_id)),
        compare: satisfies_exact_uint,
    },
    // DeviceId
    PropertyOps {
        kind: ValueKind::Uint,
        read: |chain| CapabilityValue::Uint(u64::from(chain.core.device_id)),
        compare: satisfies_exact_uint,
    },
    // DeviceType
    PropertyOps {
        kind: ValueKind::Enum,
        read: |chain| CapabilityValue::Enum(chain.core.device_type.as_raw()),
        compare: satisfies_exact_enum,
    },
    // DeviceName
    PropertyOps {
        kind: ValueKind::Str,
        read: |chain| CapabilityValue::Str(device_name(&chain.core)),
        compare: satisfies_exact_str,
    },
    // MaxImageDimension2d
    PropertyOps {
        kind: ValueKind::Uint,
        read: |chain| CapabilityValue::Uint(u64::from(chain.core.limits.max_image_dimension2_d)),
        compare: satisfies_at_least_uint,
    },
    // MaxPushConstantsSize
    PropertyOps {
        kind: ValueKind::Uint,
        read: |chain| CapabilityValue::Uint(u64::from(chain.core.limits.max_push_constants_size)),
        compare: satisfies_at_least_uint,
    },
    // MaxMemoryAllocationCount
    PropertyOps {
        kind: ValueKind::Uint,
        read: |chain| {
            CapabilityValue::Uint(u64::from(chain.core.limits.max_memory_allocation_count))
        },
        compare: satisfies_at_least_uint,
    },
    // MaxBoundDescriptorSets
    PropertyOps {
        kind: ValueKind::Uint,
        read: |chain| {
            CapabilityValue::Uint(u64::from(chain.core.limits.max_bound_descriptor_sets))
        },
        compare: satisfies_at_least_uint,
    },
    // MaxComputeWorkGroupInvocations
    PropertyOps {
        kind: ValueKind::Uint,
        read: |chain| {
            CapabilityValue::Uint(u64::from(
                chain.core.limits.max_compute_work_group_invocations,
            ))
        },
        compare: satisfies_at_least_uint,
    },
    // MaxComputeSharedMemorySize
    PropertyOps {
        kind: ValueKind::Uint,
        read: |chain| {
            CapabilityValue::Uint(u64::from(chain.core.limits.max_compute_shared_memory_size))
        },
        compare: satisfies_at_least_uint,
    },
    // MaxComputeWorkGroupSize
    PropertyOps {
        kind: ValueKind::UintArray,
        read: |chain| CapabilityValue::UintArray(chain.core.limits.max_compute_work_group_size),
        compare: satisfies_at_least_array,
    },
    // TimestampPeriod: nanoseconds per tick, so a finer period satisfies a
    // coarser requirement.
    PropertyOps {
        kind: ValueKind::Float,
        read: |chain| CapabilityValue::Float(f64::from(chain.core.limits.timestamp_period)),
        compare: satisfies_at_most_float,
    },
    // TimestampComputeAndGraphics
    PropertyOps {
        kind: ValueKind::Bool,
        read: |chain| {
            CapabilityValue::Bool(chain.core.limits.timestamp_compute_and_graphics != 0)
        },
        compare: satisfies_bool,
    },
    // DeviceLocalMemoryMb
    PropertyOps {
        kind: ValueKind::Uint,
        read: |chain| CapabilityValue::Uint(device_local_memory_mb(chain)),
        compare: satisfies_at_least_uint,
    },
];

/// Device name as a Rust string, truncated at the first NUL.
fn device_name(properties: &vk::PhysicalDeviceProperties) -> String {
    properties
        .device_name
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8 as char)
        .collect()
}

/// Total device-local heap memory in MiB.
fn device_local_memory_mb(chain: &PropertyChain) -> u64 {
    chain
        .memory
        .memory_heaps
        .iter()
        .take(chain.memory.memory_heap_count as usize)
        .filter(|heap| heap.flags.contains(vk::MemoryHeapFlags::DEVICE_LOCAL))
        .map(|heap| heap.size / (1024 * 1024))
        .sum()
}

/// Dispatch entry for a feature.
pub fn feature_ops(id: FeatureId) -> &'static FeatureOps {
    &FEATURES[id as usize]
}

/// Dispatch entry for a property.
pub fn property_ops(id: PropertyId) -> &'static PropertyOps {
    &PROPERTIES[id as usize]
}

/// Extract a feature value from a queried chain.
pub(crate) fn read_feature(chain: &FeatureChain, id: FeatureId) -> CapabilityValue {
    (FEATURES[id as usize].read)(chain)
}

/// Extract a property value from a queried chain.
pub(crate) fn read_property(chain: &PropertyChain, id: PropertyId) -> CapabilityValue {
    (PROPERTIES[id as usize].read)(chain)
}

/// Read a feature value out of a snapshot.
pub fn get_feature(snapshot: &CapabilitySnapshot, id: FeatureId) -> &CapabilityValue {
    let value = &snapshot.features[id as usize];
    assert_eq!(
        value.kind(),
        FEATURES[id as usize].kind,
        "snapshot slot for {id:?} holds the wrong value kind"
    );
    value
}

/// Read a property value out of a snapshot.
pub fn get_property(snapshot: &CapabilitySnapshot, id: PropertyId) -> &CapabilityValue {
    let value = &snapshot.properties[id as usize];
    assert_eq!(
        value.kind(),
        PROPERTIES[id as usize].kind,
        "snapshot slot for {id:?} holds the wrong value kind"
    );
    value
}

/// Write a feature value into a snapshot under construction.
pub(crate) fn set_feature(slots: &mut [CapabilityValue], id: FeatureId, value: CapabilityValue) {
    assert_eq!(
        value.kind(),
        FEATURES[id as usize].kind,
        "stored value kind does not match the table entry for {id:?}"
    );
    slots[id as usize] = value;
}

/// Write a property value into a snapshot under construction.
pub(crate) fn set_property(slots: &mut [CapabilityValue], id: PropertyId, value: CapabilityValue) {
    assert_eq!(
        value.kind(),
        PROPERTIES[id as usize].kind,
        "stored value kind does not match the table entry for {id:?}"
    );
    slots[id as usize] = value;
}

/// Does `available` satisfy `required` for this feature?
pub fn compare_feature(
    id: FeatureId,
    required: &CapabilityValue,
    available: &CapabilityValue,
) -> bool {
    (FEATURES[id as usize].compare)(required, available)
}

/// Does `available` satisfy `required` for this property?
pub fn compare_property(
    id: PropertyId,
    required: &CapabilityValue,
    available: &CapabilityValue,
) -> bool {
    (PROPERTIES[id as usize].compare)(required, available)
}

/// Feature slots pre-filled with each entry's zero value.
pub(crate) fn default_feature_slots() -> Box<[CapabilityValue]> {
    FEATURES.iter().map(|ops| ops.kind.default_value()).collect()
}

/// Property slots pre-filled with each entry's zero value.
pub(crate) fn default_property_slots() -> Box<[CapabilityValue]> {
    PROPERTIES
        .iter()
        .map(|ops| ops.kind.default_value())
        .collect()
}
