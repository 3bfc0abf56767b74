use crate::device::{Gpu, GpuFrame};

/// Device handles borrowed for one presentation pass.
pub struct RenderCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    /// Format of the swapchain image being rendered.
    pub format: wgpu::TextureFormat,
}

impl<'a> RenderCtx<'a> {
    pub fn from_gpu(gpu: &'a Gpu<'_>) -> Self {
        Self { device: gpu.device(), queue: gpu.queue(), format: gpu.surface_format() }
    }
}

/// The acquired swapchain image and the encoder recording into it.
pub struct RenderTarget<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub view: &'a wgpu::TextureView,
}

impl<'a> RenderTarget<'a> {
    pub fn for_frame(frame: &'a mut GpuFrame) -> Self {
        Self { encoder: &mut frame.encoder, view: &frame.view }
    }
}
