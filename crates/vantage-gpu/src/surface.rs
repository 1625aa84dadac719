//! Presentation support probing.
//!
//! Evaluation never talks to a surface directly; it goes through the
//! [`PresentationProbe`] seam so the matching logic stays testable without a
//! live driver. The [`SurfaceProbe`] implementation wraps the `VK_KHR_surface`
//! query the way real applications use it.

use ash::vk;
use ash::vk::Handle;

/// Answers "can this queue family present to one particular surface?".
pub trait PresentationProbe {
    /// Stable identity of the probed surface; snapshots memoize per
    /// (queue family, surface id) pair.
    fn surface_id(&self) -> u64;

    /// Query the driver for presentation support of one queue family.
    fn supports(
        &self,
        device: vk::PhysicalDevice,
        queue_family: u32,
    ) -> std::result::Result<bool, vk::Result>;
}

/// Probe backed by a `VK_KHR_surface` loader and a live surface handle.
pub struct SurfaceProbe {
    loader: ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
}

impl SurfaceProbe {
    /// Wrap an existing surface.
    ///
    /// The surface must outlive the probe; the probe does not own it.
    pub fn new(entry: &ash::Entry, instance: &ash::Instance, surface: vk::SurfaceKHR) -> Self {
        Self {
            loader: ash::khr::surface::Instance::new(entry, instance),
            surface,
        }
    }

    /// The probed surface handle.
    pub fn surface(&self) -> vk::SurfaceKHR {
        self.surface
    }
}

impl PresentationProbe for SurfaceProbe {
    fn surface_id(&self) -> u64 {
        self.surface.as_raw()
    }

    fn supports(
        &self,
        device: vk::PhysicalDevice,
        queue_family: u32,
    ) -> std::result::Result<bool, vk::Result> {
        unsafe {
            self.loader
                .get_physical_device_surface_support(device, queue_family, self.surface)
        }
    }
}
