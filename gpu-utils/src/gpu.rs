use std::sync::Arc;

use log::{debug, trace, warn};
use thiserror::Error;

/// Descriptor used to configure and create a `Gpu` instance.
pub struct GpuDescriptor {
    /// Which wgpu backends to enable.
    pub backends: wgpu::Backends,
    /// Power preference for adapter selection.
    pub power_preference: wgpu::PowerPreference,
    /// Features that must be available on the device.
    pub required_features: wgpu::Features,
    /// Optional device limits to request. If `None`, the adapter's limits are used.
    pub required_limits: Option<wgpu::Limits>,
    /// Preferred texture format for render targets created through this GPU.
    pub preferred_format: wgpu::TextureFormat,
}

impl Default for GpuDescriptor {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::PRIMARY,
            power_preference: wgpu::PowerPreference::LowPower,
            required_features: wgpu::Features::empty(),
            required_limits: None,
            preferred_format: wgpu::TextureFormat::Rgba8UnormSrgb,
        }
    }
}

#[derive(Debug, Error)]
pub enum GpuError {
    #[error("adapter does not support the required features")]
    AdapterFeatureUnsupported,
    #[error(transparent)]
    RequestAdapter(#[from] wgpu::RequestAdapterError),
    #[error(transparent)]
    RequestDevice(#[from] wgpu::RequestDeviceError),
}

/// Owns a `wgpu::Instance`, the chosen adapter and the device/queue pair.
pub struct Gpu {
    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,

    features: wgpu::Features,
    limits: wgpu::Limits,
    preferred_format: wgpu::TextureFormat,
}

impl Gpu {
    /// Creates a new `Gpu` from a descriptor.
    ///
    /// Validates required features against the chosen adapter, then requests
    /// a device and queue.
    pub async fn new(desc: GpuDescriptor) -> Result<Arc<Self>, GpuError> {
        let GpuDescriptor {
            backends,
            power_preference,
            required_features,
            required_limits,
            preferred_format,
        } = desc;

        trace!(
            "Gpu::new: creating instance with backends={backends:?}, power_preference={power_preference:?}"
        );
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await?;
        debug!("Gpu::new: adapter received: {:#?}", adapter.get_info());

        let adapter_features = adapter.features();
        if !adapter_features.contains(required_features) {
            warn!(
                "Gpu::new: adapter does not support required features: required={required_features:?} available={adapter_features:?}"
            );
            return Err(GpuError::AdapterFeatureUnsupported);
        }

        let limits = required_limits.unwrap_or_else(|| adapter.limits());
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Gpu: request device"),
                required_features,
                required_limits: limits.clone(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        Ok(Arc::new(Self {
            instance,
            adapter,
            device,
            queue,
            features: required_features,
            limits,
            preferred_format,
        }))
    }

    /// A `Gpu` backed by wgpu's noop backend. Commands submitted to it are
    /// accepted and discarded, which is exactly what headless tests need.
    pub async fn noop_for_tests() -> Arc<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::NOOP,
            backend_options: wgpu::BackendOptions {
                noop: wgpu::NoopBackendOptions { enable: true },
                ..Default::default()
            },
            ..Default::default()
        });

        let adapter = instance
            .enumerate_adapters(wgpu::Backends::NOOP)
            .pop()
            .expect("failed to find noop adapter");

        let (device, queue) = adapter
            .request_device(&Default::default())
            .await
            .expect("failed to create noop device");

        Arc::new(Self {
            instance,
            adapter,
            device,
            queue,
            features: wgpu::Features::empty(),
            limits: wgpu::Limits::default(),
            preferred_format: wgpu::TextureFormat::Rgba8UnormSrgb,
        })
    }

    pub fn instance(&self) -> &wgpu::Instance {
        &self.instance
    }

    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn features(&self) -> wgpu::Features {
        self.features
    }

    pub fn limits(&self) -> &wgpu::Limits {
        &self.limits
    }

    pub fn preferred_format(&self) -> wgpu::TextureFormat {
        self.preferred_format
    }
}
