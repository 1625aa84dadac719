//! Physical device cache.

use crate::snapshot::CapabilitySnapshot;

/// One capability snapshot per enumerated candidate device.
///
/// Built eagerly in one pass and read-only afterwards. Candidates whose
/// capability queries fail are skipped rather than failing the build; a
/// driver may legitimately refuse deeper queries for some devices. Rebuilding
/// means discarding the cache and constructing a new one.
pub struct PhysicalDeviceCache {
    snapshots: Vec<CapabilitySnapshot>,
}

impl PhysicalDeviceCache {
    /// Enumerate all physical devices and snapshot each one.
    ///
    /// # Safety
    /// The instance must be valid and target Vulkan 1.1 or newer.
    pub unsafe fn new(instance: &ash::Instance) -> crate::error::Result<Self> {
        let devices = unsafe { instance.enumerate_physical_devices() }?;

        let mut snapshots = Vec::with_capacity(devices.len());
        for device in &devices {
            match unsafe { CapabilitySnapshot::query(instance, *device) } {
                Ok(snapshot) => {
                    tracing::debug!("cached candidate: {}", snapshot.summary());
                    snapshots.push(snapshot);
                }
                Err(err) => {
                    tracing::warn!("skipping unqueryable device: {err}");
                }
            }
        }

        tracing::info!(
            "device cache built: {} of {} candidates usable",
            snapshots.len(),
            devices.len()
        );

        Ok(Self { snapshots })
    }

    /// Candidates in driver enumeration order.
    pub fn candidates(&self) -> impl Iterator<Item = &CapabilitySnapshot> {
        self.snapshots.iter()
    }

    /// Snapshot of the candidate at the given enumeration index.
    pub fn get(&self, index: usize) -> Option<&CapabilitySnapshot> {
        self.snapshots.get(index)
    }

    /// Number of cached candidates.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether no candidate survived snapshotting.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Build a cache from pre-made snapshots, bypassing the driver.
    #[cfg(test)]
    pub(crate) fn from_snapshots(snapshots: Vec<CapabilitySnapshot>) -> Self {
        Self { snapshots }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{CapabilityValue, PropertyId};

    fn named(name: &str) -> CapabilitySnapshot {
        CapabilitySnapshot::from_parts(
            &[],
            &[(
                PropertyId::DeviceName,
                CapabilityValue::Str(name.to_string()),
            )],
            vec![],
            &[],
        )
    }

    #[test]
    fn candidates_iterate_in_insertion_order() {
        let cache = PhysicalDeviceCache::from_snapshots(vec![
            named("first"),
            named("second"),
            named("third"),
        ]);

        let names: Vec<_> = cache
            .candidates()
            .map(|snapshot| {
                snapshot
                    .property(PropertyId::DeviceName)
                    .as_str()
                    .unwrap()
                    .to_string()
            })
            .collect();
        assert_eq!(names, ["first", "second", "third"]);
    }

    #[test]
    fn get_addresses_by_enumeration_index() {
        let cache = PhysicalDeviceCache::from_snapshots(vec![named("a"), named("b")]);
        assert_eq!(cache.len(), 2);
        assert!(!cache.is_empty());
        assert_eq!(
            cache.get(1).unwrap().property(PropertyId::DeviceName).as_str(),
            Some("b")
        );
        assert!(cache.get(2).is_none());
    }

    #[test]
    fn empty_cache_is_a_normal_state() {
        let cache = PhysicalDeviceCache::from_snapshots(vec![]);
        assert!(cache.is_empty());
        assert_eq!(cache.candidates().count(), 0);
    }
}
