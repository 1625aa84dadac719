//! Device capability matching for Vulkan physical devices.
//!
//! This crate provides:
//! - Per-device capability snapshots (features, limits, queue families,
//!   extensions) built once from the driver
//! - A capability registry dispatching reads and comparisons over
//!   heterogeneous capability values without per-call-site branching
//! - Declarative requirement specifications with queue-role predicates
//! - Suitability evaluation and first-fit device selection

pub mod cache;
pub mod capability;
pub mod error;
pub mod instance;
pub mod registry;
pub mod requirements;
pub mod select;
pub mod snapshot;
pub mod surface;

pub use cache::PhysicalDeviceCache;
pub use capability::{CapabilityValue, FeatureId, PropertyId, ValueKind};
pub use error::{GpuError, Result};
pub use requirements::{QueueRoleRequirement, RequirementSpec};
pub use select::{evaluate_device, select_device, DeviceSelection, RoleAssignment};
pub use snapshot::{CapabilitySnapshot, QueueFamilyRecord};
pub use surface::{PresentationProbe, SurfaceProbe};
