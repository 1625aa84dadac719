//! Declarative device requirements.
//!
//! A [`RequirementSpec`] is built by the caller, handed to the selection
//! driver, and never mutated by evaluation. The order of queue roles is
//! significant: it defines the role index in the selection result.

use crate::capability::{CapabilityValue, FeatureId, PropertyId};
use crate::snapshot::QueueFamilyRecord;
use ash::vk;

/// Requirements one queue role places on a queue family.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueueRoleRequirement {
    /// A family is only considered if all these flags are set.
    pub must_support: vk::QueueFlags,
    /// A family is only considered if none of these flags are set.
    pub must_not_support: vk::QueueFlags,
    /// A family is only considered if it exposes at least this many queues.
    pub min_queue_count: u32,
    /// Require timestamp queries (non-zero valid bits).
    pub needs_timestamps: bool,
    /// Require presentation support to the probed surface.
    pub needs_present: bool,
}

impl QueueRoleRequirement {
    /// A role every queue family satisfies.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Graphics work that is also presented to a surface.
    pub fn graphics_present() -> Self {
        Self::empty()
            .must_support(vk::QueueFlags::GRAPHICS)
            .needs_present()
    }

    /// Compute work kept off the graphics family.
    pub fn dedicated_compute() -> Self {
        Self::empty()
            .must_support(vk::QueueFlags::COMPUTE)
            .must_not_support(vk::QueueFlags::GRAPHICS)
    }

    /// Transfer work kept off both graphics and compute families.
    pub fn dedicated_transfer() -> Self {
        Self::empty()
            .must_support(vk::QueueFlags::TRANSFER)
            .must_not_support(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE)
    }

    /// Require these queue flags to be present.
    pub fn must_support(mut self, flags: vk::QueueFlags) -> Self {
        self.must_support |= flags;
        self
    }

    /// Require these queue flags to be absent.
    pub fn must_not_support(mut self, flags: vk::QueueFlags) -> Self {
        self.must_not_support |= flags;
        self
    }

    /// Require at least this many queues in the family.
    pub fn min_queue_count(mut self, count: u32) -> Self {
        self.min_queue_count = count;
        self
    }

    /// Require timestamp query support.
    pub fn needs_timestamps(mut self) -> Self {
        self.needs_timestamps = true;
        self
    }

    /// Require presentation support.
    pub fn needs_present(mut self) -> Self {
        self.needs_present = true;
        self
    }

    /// Whether a family satisfies every predicate except presentation,
    /// which is evaluated against the snapshot's memoized probe.
    pub fn matches(&self, family: &QueueFamilyRecord) -> bool {
        family.flags.contains(self.must_support)
            && !family.flags.intersects(self.must_not_support)
            && family.queue_count >= self.min_queue_count
            && (!self.needs_timestamps || family.timestamp_valid_bits > 0)
    }
}

/// Caller-supplied declarative device requirements.
#[derive(Debug, Clone, Default)]
pub struct RequirementSpec {
    /// Required feature values, compared through the capability registry.
    pub(crate) features: Vec<(FeatureId, CapabilityValue)>,
    /// Required property/limit values, compared through the registry.
    pub(crate) properties: Vec<(PropertyId, CapabilityValue)>,
    /// Extension names the device must advertise.
    pub(crate) extensions: Vec<String>,
    /// Queue roles, in result order.
    pub(crate) roles: Vec<QueueRoleRequirement>,
}

impl RequirementSpec {
    /// An empty specification, satisfied by every device.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a feature to hold the given value.
    pub fn require_feature(mut self, id: FeatureId, value: CapabilityValue) -> Self {
        self.features.push((id, value));
        self
    }

    /// Require a feature flag to be enabled.
    pub fn require_feature_enabled(self, id: FeatureId) -> Self {
        self.require_feature(id, CapabilityValue::Bool(true))
    }

    /// Require a property/limit to satisfy the given value.
    pub fn require_property(mut self, id: PropertyId, value: CapabilityValue) -> Self {
        self.properties.push((id, value));
        self
    }

    /// Require a device extension by name.
    pub fn require_extension(mut self, name: impl Into<String>) -> Self {
        self.extensions.push(name.into());
        self
    }

    /// Append a queue role. Role indices in the result follow call order.
    pub fn require_queue_role(mut self, role: QueueRoleRequirement) -> Self {
        self.roles.push(role);
        self
    }

    /// Required features, in registration order.
    pub fn required_features(&self) -> &[(FeatureId, CapabilityValue)] {
        &self.features
    }

    /// Required properties, in registration order.
    pub fn required_properties(&self) -> &[(PropertyId, CapabilityValue)] {
        &self.properties
    }

    /// Required extension names.
    pub fn required_extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Queue roles, in result order.
    pub fn queue_roles(&self) -> &[QueueRoleRequirement] {
        &self.roles
    }
}
