//! Suitability evaluation and device selection.
//!
//! The evaluator decides whether one candidate satisfies one requirement
//! specification and, if so, which queue families can serve each declared
//! role. The driver runs the evaluator over the cache and takes the first
//! suitable candidate in enumeration order; no scoring or ranking is
//! performed. "No compatible device" is a normal `None`, not an error.

use crate::cache::PhysicalDeviceCache;
use crate::capability::{CapabilityValue, FeatureId};
use crate::registry;
use crate::requirements::RequirementSpec;
use crate::snapshot::CapabilitySnapshot;
use crate::surface::PresentationProbe;
use ash::vk;

/// Queue families able to serve one declared role.
///
/// Indices are in enumeration order and may overlap with other roles; the
/// evaluator proves feasibility, the caller picks placements (e.g. prefers
/// distinct families for distinct roles).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAssignment {
    /// Indices of every queue family satisfying the role.
    pub families: Vec<u32>,
}

/// A suitable device together with everything needed to create it.
#[derive(Debug, Clone)]
pub struct DeviceSelection {
    /// The chosen physical device.
    pub device: vk::PhysicalDevice,
    /// Enumeration index of the chosen candidate in the cache.
    pub candidate_index: usize,
    /// The minimal feature set to enable: exactly the features the
    /// specification required, never the hardware superset.
    pub enabled_features: Vec<(FeatureId, CapabilityValue)>,
    /// One entry per queue role, in specification order.
    pub role_assignments: Vec<RoleAssignment>,
}

/// Check one candidate against one specification.
///
/// Returns the per-role family assignments on success, `None` as soon as any
/// extension, feature, property, or queue role cannot be satisfied. Roles
/// needing presentation are unsatisfiable without a probe.
pub fn evaluate_device(
    snapshot: &CapabilitySnapshot,
    spec: &RequirementSpec,
    probe: Option<&dyn PresentationProbe>,
) -> Option<Vec<RoleAssignment>> {
    // The candidate's extension set must cover every required extension.
    for extension in spec.required_extensions() {
        if !snapshot.supports_extension(extension) {
            return None;
        }
    }

    for (id, required) in spec.required_features() {
        if !registry::compare_feature(*id, required, snapshot.feature(*id)) {
            return None;
        }
    }

    for (id, required) in spec.required_properties() {
        if !registry::compare_property(*id, required, snapshot.property(*id)) {
            return None;
        }
    }

    let mut assignments = Vec::with_capacity(spec.queue_roles().len());
    for role in spec.queue_roles() {
        let mut families = Vec::new();
        for (index, family) in snapshot.queue_families().iter().enumerate() {
            let index = index as u32;
            if !role.matches(family) {
                continue;
            }
            if role.needs_present
                && !probe.is_some_and(|probe| snapshot.supports_present(index, probe))
            {
                continue;
            }
            families.push(index);
        }

        if families.is_empty() {
            return None;
        }
        assignments.push(RoleAssignment { families });
    }

    Some(assignments)
}

/// First-fit selection over the cache, in enumeration order.
pub fn select_device(
    cache: &PhysicalDeviceCache,
    spec: &RequirementSpec,
    probe: Option<&dyn PresentationProbe>,
) -> Option<DeviceSelection> {
    for (candidate_index, snapshot) in cache.candidates().enumerate() {
        if let Some(role_assignments) = evaluate_device(snapshot, spec, probe) {
            tracing::info!("selected device: {}", snapshot.summary());
            return Some(DeviceSelection {
                device: snapshot.device(),
                candidate_index,
                enabled_features: spec.required_features().to_vec(),
                role_assignments,
            });
        }
    }

    tracing::info!("no candidate device satisfies the requirements");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::PropertyId;
    use crate::requirements::QueueRoleRequirement;
    use crate::snapshot::QueueFamilyRecord;

    struct ScriptedProbe {
        id: u64,
        supported: Vec<u32>,
    }

    impl ScriptedProbe {
        fn new(supported: &[u32]) -> Self {
            Self {
                id: 1,
                supported: supported.to_vec(),
            }
        }
    }

    impl PresentationProbe for ScriptedProbe {
        fn surface_id(&self) -> u64 {
            self.id
        }

        fn supports(
            &self,
            _device: vk::PhysicalDevice,
            queue_family: u32,
        ) -> std::result::Result<bool, vk::Result> {
            Ok(self.supported.contains(&queue_family))
        }
    }

    fn family(flags: vk::QueueFlags) -> QueueFamilyRecord {
        QueueFamilyRecord {
            flags,
            queue_count: 1,
            timestamp_valid_bits: 64,
            min_image_transfer_granularity: vk::Extent3D::default(),
        }
    }

    fn graphics_only_snapshot() -> CapabilitySnapshot {
        CapabilitySnapshot::from_parts(
            &[],
            &[],
            vec![family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::TRANSFER)],
            &[],
        )
    }

    #[test]
    fn empty_spec_is_satisfied_by_any_candidate() {
        let spec = RequirementSpec::new();
        let assignments = evaluate_device(&graphics_only_snapshot(), &spec, None);
        assert_eq!(assignments, Some(vec![]));
    }

    #[test]
    fn graphics_and_present_roles_land_on_their_families() {
        // Family 0 draws but cannot present, family 1 presents but cannot
        // draw.
        let snapshot = CapabilitySnapshot::from_parts(
            &[],
            &[],
            vec![
                family(vk::QueueFlags::GRAPHICS),
                family(vk::QueueFlags::TRANSFER),
            ],
            &[],
        );
        let probe = ScriptedProbe::new(&[1]);
        let spec = RequirementSpec::new()
            .require_queue_role(
                QueueRoleRequirement::empty().must_support(vk::QueueFlags::GRAPHICS),
            )
            .require_queue_role(QueueRoleRequirement::empty().needs_present());

        let assignments = evaluate_device(&snapshot, &spec, Some(&probe)).unwrap();
        assert_eq!(assignments[0].families, vec![0]);
        assert_eq!(assignments[1].families, vec![1]);
    }

    #[test]
    fn one_family_may_serve_every_role() {
        let snapshot = CapabilitySnapshot::from_parts(
            &[],
            &[],
            vec![family(vk::QueueFlags::GRAPHICS)],
            &[],
        );
        let probe = ScriptedProbe::new(&[0]);
        let spec = RequirementSpec::new()
            .require_queue_role(
                QueueRoleRequirement::empty().must_support(vk::QueueFlags::GRAPHICS),
            )
            .require_queue_role(QueueRoleRequirement::empty().needs_present());

        let assignments = evaluate_device(&snapshot, &spec, Some(&probe)).unwrap();
        // No forced exclusivity: the same family backs both roles.
        assert_eq!(assignments[0].families, vec![0]);
        assert_eq!(assignments[1].families, vec![0]);
    }

    #[test]
    fn missing_feature_rejects_the_candidate() {
        let snapshot = graphics_only_snapshot();
        let spec =
            RequirementSpec::new().require_feature_enabled(FeatureId::BufferDeviceAddress);
        assert!(evaluate_device(&snapshot, &spec, None).is_none());
    }

    #[test]
    fn missing_extension_rejects_before_anything_else() {
        let snapshot = CapabilitySnapshot::from_parts(
            &[],
            &[],
            vec![family(vk::QueueFlags::GRAPHICS)],
            &["VK_KHR_swapchain"],
        );
        let spec = RequirementSpec::new().require_extension("VK_KHR_ray_tracing_pipeline");
        assert!(evaluate_device(&snapshot, &spec, None).is_none());
    }

    #[test]
    fn unsatisfiable_role_rejects_the_candidate() {
        let snapshot = graphics_only_snapshot();
        let spec =
            RequirementSpec::new().require_queue_role(QueueRoleRequirement::dedicated_compute());
        assert!(evaluate_device(&snapshot, &spec, None).is_none());
    }

    #[test]
    fn present_role_without_probe_is_unsatisfiable() {
        let snapshot = graphics_only_snapshot();
        let spec =
            RequirementSpec::new().require_queue_role(QueueRoleRequirement::graphics_present());
        assert!(evaluate_device(&snapshot, &spec, None).is_none());
    }

    #[test]
    fn evaluation_is_idempotent() {
        let snapshot = CapabilitySnapshot::from_parts(
            &[(FeatureId::GeometryShader, CapabilityValue::Bool(true))],
            &[],
            vec![
                family(vk::QueueFlags::GRAPHICS),
                family(vk::QueueFlags::COMPUTE),
            ],
            &["VK_KHR_swapchain"],
        );
        let probe = ScriptedProbe::new(&[0, 1]);
        let spec = RequirementSpec::new()
            .require_feature_enabled(FeatureId::GeometryShader)
            .require_extension("VK_KHR_swapchain")
            .require_queue_role(QueueRoleRequirement::empty().needs_present());

        let first = evaluate_device(&snapshot, &spec, Some(&probe));
        let second = evaluate_device(&snapshot, &spec, Some(&probe));
        assert_eq!(first, second);
    }

    #[test]
    fn adding_a_requirement_never_grows_the_suitable_set() {
        let suitable = CapabilitySnapshot::from_parts(
            &[(FeatureId::ShaderInt64, CapabilityValue::Bool(true))],
            &[],
            vec![family(vk::QueueFlags::GRAPHICS)],
            &["VK_KHR_swapchain"],
        );
        let base = RequirementSpec::new().require_extension("VK_KHR_swapchain");
        let stricter = base
            .clone()
            .require_feature_enabled(FeatureId::ShaderInt64)
            .require_queue_role(
                QueueRoleRequirement::empty().must_support(vk::QueueFlags::GRAPHICS),
            );

        // Suitable under the stricter spec implies suitable under the base.
        assert!(evaluate_device(&suitable, &stricter, None).is_some());
        assert!(evaluate_device(&suitable, &base, None).is_some());

        // And tightening can only reject, never admit.
        let lacking = CapabilitySnapshot::from_parts(
            &[],
            &[],
            vec![family(vk::QueueFlags::GRAPHICS)],
            &["VK_KHR_swapchain"],
        );
        assert!(evaluate_device(&lacking, &base, None).is_some());
        assert!(evaluate_device(&lacking, &stricter, None).is_none());
    }

    #[test]
    fn first_fit_takes_enumeration_order() {
        let spec = RequirementSpec::new();
        let cache = PhysicalDeviceCache::from_snapshots(vec![
            graphics_only_snapshot(),
            graphics_only_snapshot(),
        ]);
        let selection = select_device(&cache, &spec, None).unwrap();
        assert_eq!(selection.candidate_index, 0);
    }

    #[test]
    fn extension_check_skips_earlier_candidates() {
        // Candidate 0 is otherwise fine but lacks the extension; candidate 1
        // carries it and wins despite enumerating later.
        let lacking = CapabilitySnapshot::from_parts(
            &[],
            &[],
            vec![family(vk::QueueFlags::GRAPHICS)],
            &[],
        );
        let carrying = CapabilitySnapshot::from_parts(
            &[],
            &[],
            vec![family(vk::QueueFlags::GRAPHICS)],
            &["VK_KHR_swapchain"],
        );
        let cache = PhysicalDeviceCache::from_snapshots(vec![lacking, carrying]);
        let spec = RequirementSpec::new().require_extension("VK_KHR_swapchain");

        let selection = select_device(&cache, &spec, None).unwrap();
        assert_eq!(selection.candidate_index, 1);
    }

    #[test]
    fn no_candidate_satisfying_a_feature_yields_none() {
        let cache = PhysicalDeviceCache::from_snapshots(vec![
            graphics_only_snapshot(),
            graphics_only_snapshot(),
        ]);
        let spec = RequirementSpec::new().require_feature_enabled(FeatureId::DynamicRendering);
        assert!(select_device(&cache, &spec, None).is_none());
    }

    #[test]
    fn selection_carries_only_the_requested_features() {
        let snapshot = CapabilitySnapshot::from_parts(
            &[
                (FeatureId::GeometryShader, CapabilityValue::Bool(true)),
                (FeatureId::ShaderInt64, CapabilityValue::Bool(true)),
                (FeatureId::DynamicRendering, CapabilityValue::Bool(true)),
            ],
            &[],
            vec![family(vk::QueueFlags::GRAPHICS)],
            &[],
        );
        let cache = PhysicalDeviceCache::from_snapshots(vec![snapshot]);
        let spec = RequirementSpec::new().require_feature_enabled(FeatureId::ShaderInt64);

        let selection = select_device(&cache, &spec, None).unwrap();
        assert_eq!(
            selection.enabled_features,
            vec![(FeatureId::ShaderInt64, CapabilityValue::Bool(true))]
        );
    }

    #[test]
    fn property_limits_gate_selection() {
        let small = CapabilitySnapshot::from_parts(
            &[],
            &[(PropertyId::DeviceLocalMemoryMb, CapabilityValue::Uint(512))],
            vec![family(vk::QueueFlags::GRAPHICS)],
            &[],
        );
        let large = CapabilitySnapshot::from_parts(
            &[],
            &[(PropertyId::DeviceLocalMemoryMb, CapabilityValue::Uint(8192))],
            vec![family(vk::QueueFlags::GRAPHICS)],
            &[],
        );
        let cache = PhysicalDeviceCache::from_snapshots(vec![small, large]);
        let spec = RequirementSpec::new()
            .require_property(PropertyId::DeviceLocalMemoryMb, CapabilityValue::Uint(1024));

        let selection = select_device(&cache, &spec, None).unwrap();
        assert_eq!(selection.candidate_index, 1);
    }
}
