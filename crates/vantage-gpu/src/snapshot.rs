//! Per-device capability snapshots.
//!
//! A [`CapabilitySnapshot`] is built once per candidate device and never
//! mutated afterwards; the lazily-filled presentation memo is the single
//! exception and sits behind a mutex so snapshots stay safe to share.

use crate::capability::{CapabilityValue, FeatureId, PropertyId};
use crate::registry;
use crate::surface::PresentationProbe;
use ash::vk;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::ffi::CStr;

/// Owned mirror of the chained feature query blocks.
///
/// Filled by one `vkGetPhysicalDeviceFeatures2` call with the 1.1/1.2/1.3
/// blocks pushed onto the chain, then detached from the pointer chain so the
/// mirror is self-contained. Which field of which block a given capability
/// lives in is known only to the registry's read closures.
#[derive(Clone, Default)]
pub struct FeatureChain {
    pub core: vk::PhysicalDeviceFeatures,
    pub v11: vk::PhysicalDeviceVulkan11Features<'static>,
    pub v12: vk::PhysicalDeviceVulkan12Features<'static>,
    pub v13: vk::PhysicalDeviceVulkan13Features<'static>,
}

/// Owned mirror of the property query results.
#[derive(Clone, Copy, Default)]
pub struct PropertyChain {
    pub core: vk::PhysicalDeviceProperties,
    pub memory: vk::PhysicalDeviceMemoryProperties,
}

/// Attributes of one hardware queue family.
#[derive(Debug, Clone, Copy)]
pub struct QueueFamilyRecord {
    /// Capability flags (graphics, compute, transfer, ...).
    pub flags: vk::QueueFlags,
    /// Number of queues the family exposes.
    pub queue_count: u32,
    /// Valid bits of timestamp queries; zero means no timestamp support.
    pub timestamp_valid_bits: u32,
    /// Minimum granularity of image transfers on this family.
    pub min_image_transfer_granularity: vk::Extent3D,
}

impl From<vk::QueueFamilyProperties> for QueueFamilyRecord {
    fn from(properties: vk::QueueFamilyProperties) -> Self {
        Self {
            flags: properties.queue_flags,
            queue_count: properties.queue_count,
            timestamp_valid_bits: properties.timestamp_valid_bits,
            min_image_transfer_granularity: properties.min_image_transfer_granularity,
        }
    }
}

/// Immutable capability record of one candidate device.
pub struct CapabilitySnapshot {
    pub(crate) device: vk::PhysicalDevice,
    /// One slot per [`FeatureId`], indexed by the id's integer value.
    pub(crate) features: Box<[CapabilityValue]>,
    /// One slot per [`PropertyId`], indexed by the id's integer value.
    pub(crate) properties: Box<[CapabilityValue]>,
    /// Queue families in driver enumeration order, never reordered.
    pub(crate) queue_families: Vec<QueueFamilyRecord>,
    /// Names of supported device extensions.
    pub(crate) extensions: HashSet<String>,
    /// Presentation support per (queue family, surface), filled on first
    /// probe and never invalidated.
    present_memo: Mutex<HashMap<(u32, u64), bool>>,
}

impl CapabilitySnapshot {
    /// Query the full capability record of one physical device.
    ///
    /// A failed driver query excludes the candidate rather than failing the
    /// caller; the cache turns the error into a skip.
    ///
    /// # Safety
    /// The instance and physical device must be valid, and the instance must
    /// target Vulkan 1.1 or newer so the chained query entry points exist.
    pub unsafe fn query(
        instance: &ash::Instance,
        device: vk::PhysicalDevice,
    ) -> std::result::Result<Self, vk::Result> {
        let feature_chain = unsafe { query_feature_chain(instance, device) };
        let property_chain = unsafe { query_property_chain(instance, device) };

        let fp = instance.fp_v1_0();

        // vkGetPhysicalDeviceQueueFamilyProperties cannot fail, so the
        // counting helper sees a constant SUCCESS.
        let family_properties = enumerate_twice(|count, out| {
            unsafe { (fp.get_physical_device_queue_family_properties)(device, count, out) };
            vk::Result::SUCCESS
        })?;

        let extension_properties = enumerate_twice(|count, out| unsafe {
            (fp.enumerate_device_extension_properties)(device, std::ptr::null(), count, out)
        })?;

        let extensions = extension_properties
            .iter()
            .filter_map(|ext| {
                unsafe { CStr::from_ptr(ext.extension_name.as_ptr()) }
                    .to_str()
                    .ok()
                    .map(String::from)
            })
            .collect();

        let mut features = registry::default_feature_slots();
        for id in FeatureId::ALL {
            registry::set_feature(&mut features, id, registry::read_feature(&feature_chain, id));
        }

        let mut properties = registry::default_property_slots();
        for id in PropertyId::ALL {
            registry::set_property(
                &mut properties,
                id,
                registry::read_property(&property_chain, id),
            );
        }

        Ok(Self {
            device,
            features,
            properties,
            queue_families: family_properties.into_iter().map(Into::into).collect(),
            extensions,
            present_memo: Mutex::new(HashMap::new()),
        })
    }

    /// The physical device this snapshot describes.
    pub fn device(&self) -> vk::PhysicalDevice {
        self.device
    }

    /// Read one feature value.
    pub fn feature(&self, id: FeatureId) -> &CapabilityValue {
        registry::get_feature(self, id)
    }

    /// Read one property value.
    pub fn property(&self, id: PropertyId) -> &CapabilityValue {
        registry::get_property(self, id)
    }

    /// Queue families in driver enumeration order.
    pub fn queue_families(&self) -> &[QueueFamilyRecord] {
        &self.queue_families
    }

    /// Names of supported device extensions.
    pub fn extensions(&self) -> &HashSet<String> {
        &self.extensions
    }

    /// Whether the device advertises the named extension.
    pub fn supports_extension(&self, name: &str) -> bool {
        self.extensions.contains(name)
    }

    /// Whether the given queue family can present to the probed surface.
    ///
    /// The answer is memoized per (family, surface) pair on first probe. A
    /// failed probe is reported as unsupported but not memoized, so a later
    /// probe may still succeed.
    pub fn supports_present(&self, queue_family: u32, probe: &dyn PresentationProbe) -> bool {
        let key = (queue_family, probe.surface_id());
        if let Some(&cached) = self.present_memo.lock().get(&key) {
            return cached;
        }

        match probe.supports(self.device, queue_family) {
            Ok(supported) => {
                self.present_memo.lock().insert(key, supported);
                supported
            }
            Err(err) => {
                tracing::warn!(
                    "presentation query failed for queue family {queue_family}: {err}"
                );
                false
            }
        }
    }

    /// Human-readable one-line description.
    pub fn summary(&self) -> String {
        let api_version = self
            .property(PropertyId::ApiVersion)
            .as_uint()
            .unwrap_or(0) as u32;
        let name = self
            .property(PropertyId::DeviceName)
            .as_str()
            .unwrap_or("unknown device")
            .to_string();
        let memory_mb = self
            .property(PropertyId::DeviceLocalMemoryMb)
            .as_uint()
            .unwrap_or(0);

        format!(
            "{} - Vulkan {}.{}.{} - {} MiB local",
            name,
            vk::api_version_major(api_version),
            vk::api_version_minor(api_version),
            vk::api_version_patch(api_version),
            memory_mb,
        )
    }

    /// Build a snapshot from explicit parts, bypassing the driver.
    #[cfg(test)]
    pub(crate) fn from_parts(
        features: &[(FeatureId, CapabilityValue)],
        properties: &[(PropertyId, CapabilityValue)],
        queue_families: Vec<QueueFamilyRecord>,
        extensions: &[&str],
    ) -> Self {
        let mut feature_slots = registry::default_feature_slots();
        for (id, value) in features {
            registry::set_feature(&mut feature_slots, *id, value.clone());
        }
        let mut property_slots = registry::default_property_slots();
        for (id, value) in properties {
            registry::set_property(&mut property_slots, *id, value.clone());
        }
        Self {
            device: vk::PhysicalDevice::null(),
            features: feature_slots,
            properties: property_slots,
            queue_families,
            extensions: extensions.iter().map(|&s| s.to_string()).collect(),
            present_memo: Mutex::new(HashMap::new()),
        }
    }
}

/// Count-then-fill enumeration against a driver entry point.
///
/// Queries the element count with a null destination, allocates exactly that
/// much, then queries again to fill. If the driver grew the list between the
/// two calls the whole exchange is retried once; a second mismatch is
/// reported as a query failure.
pub(crate) fn enumerate_twice<T: Clone + Default>(
    mut query: impl FnMut(&mut u32, *mut T) -> vk::Result,
) -> std::result::Result<Vec<T>, vk::Result> {
    for _ in 0..2 {
        let mut count = 0u32;
        match query(&mut count, std::ptr::null_mut()) {
            vk::Result::SUCCESS => {}
            err => return Err(err),
        }

        let mut items = vec![T::default(); count as usize];
        let mut written = count;
        match query(&mut written, items.as_mut_ptr()) {
            vk::Result::SUCCESS => {
                // The list may have shrunk between the calls.
                items.truncate(written as usize);
                return Ok(items);
            }
            vk::Result::INCOMPLETE => {}
            err => return Err(err),
        }
    }

    Err(vk::Result::INCOMPLETE)
}

/// Run the chained feature query and detach the result from the chain.
///
/// # Safety
/// The instance and physical device must be valid.
unsafe fn query_feature_chain(
    instance: &ash::Instance,
    device: vk::PhysicalDevice,
) -> FeatureChain {
    let mut v11 = vk::PhysicalDeviceVulkan11Features::default();
    let mut v12 = vk::PhysicalDeviceVulkan12Features::default();
    let mut v13 = vk::PhysicalDeviceVulkan13Features::default();

    let mut features2 = vk::PhysicalDeviceFeatures2::default()
        .push_next(&mut v11)
        .push_next(&mut v12)
        .push_next(&mut v13);

    unsafe { instance.get_physical_device_features2(device, &mut features2) };
    let core = features2.features;

    // The driver filled the blocks through the chain; null the links so the
    // mirror owns plain data.
    v11.p_next = std::ptr::null_mut();
    v12.p_next = std::ptr::null_mut();
    v13.p_next = std::ptr::null_mut();

    FeatureChain { core, v11, v12, v13 }
}

/// Run the property queries.
///
/// # Safety
/// The instance and physical device must be valid.
unsafe fn query_property_chain(
    instance: &ash::Instance,
    device: vk::PhysicalDevice,
) -> PropertyChain {
    let mut properties2 = vk::PhysicalDeviceProperties2::default();
    unsafe { instance.get_physical_device_properties2(device, &mut properties2) };
    let memory = unsafe { instance.get_physical_device_memory_properties(device) };

    PropertyChain {
        core: properties2.properties,
        memory,
    }
}
