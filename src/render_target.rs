//! Frame buffers for the scene pass.
//!
//! A [`RenderTarget`] owns the attachments the scene renders into: an optional
//! multisampled color buffer, a depth buffer, and, in offscreen mode, a
//! single-sampled color texture the UI can sample from. In window mode the
//! swapchain texture plays that last role instead.

use crate::gpu::GpuContext;
use crate::shader::DEPTH_FORMAT;

/// Where the scene is rendered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ViewportMode {
    /// Into an offscreen texture, shown inside a `Viewport` UI window.
    #[default]
    Offscreen,
    /// Straight onto the window, with the UI drawn over it.
    Window,
}

/// Scene attachments sized independently of the window.
pub struct RenderTarget {
    /// Resolved color, present only in offscreen mode.
    color: Option<(wgpu::Texture, wgpu::TextureView)>,
    msaa_view: Option<wgpu::TextureView>,
    depth_view: wgpu::TextureView,
    format: wgpu::TextureFormat,
    sample_count: u32,
    width: u32,
    height: u32,
}

impl RenderTarget {
    pub fn new(
        gpu: &GpuContext,
        mode: ViewportMode,
        format: wgpu::TextureFormat,
        sample_count: u32,
        width: u32,
        height: u32,
    ) -> Self {
        let (width, height) = clamp_extent(
            width,
            height,
            gpu.device.limits().max_texture_dimension_2d,
        );

        let color = (mode == ViewportMode::Offscreen).then(|| {
            let texture = create_texture(
                gpu,
                "Viewport Color",
                format,
                1,
                width,
                height,
                wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::COPY_SRC,
            );
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            (texture, view)
        });

        let msaa_view = (sample_count > 1).then(|| {
            create_texture(
                gpu,
                "Scene MSAA Color",
                format,
                sample_count,
                width,
                height,
                wgpu::TextureUsages::RENDER_ATTACHMENT,
            )
            .create_view(&wgpu::TextureViewDescriptor::default())
        });

        let depth_view = create_texture(
            gpu,
            "Scene Depth",
            DEPTH_FORMAT,
            sample_count,
            width,
            height,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        )
        .create_view(&wgpu::TextureViewDescriptor::default());

        log::debug!("render target {width}x{height} ({mode:?}, {sample_count}x MSAA)");

        Self {
            color,
            msaa_view,
            depth_view,
            format,
            sample_count,
            width,
            height,
        }
    }

    /// Recreates the attachments when the requested size changed.
    ///
    /// Returns `true` if the textures were replaced. Views handed out earlier,
    /// such as a UI registration of [`Self::color_view`], must then be refreshed.
    pub fn ensure_size(&mut self, gpu: &GpuContext, width: u32, height: u32) -> bool {
        let (width, height) = clamp_extent(
            width,
            height,
            gpu.device.limits().max_texture_dimension_2d,
        );
        if (width, height) == (self.width, self.height) {
            return false;
        }
        *self = Self::new(
            gpu,
            self.mode(),
            self.format,
            self.sample_count,
            width,
            height,
        );
        true
    }

    pub fn mode(&self) -> ViewportMode {
        if self.color.is_some() {
            ViewportMode::Offscreen
        } else {
            ViewportMode::Window
        }
    }

    /// The resolved scene image, in offscreen mode.
    pub fn color_view(&self) -> Option<&wgpu::TextureView> {
        self.color.as_ref().map(|(_, view)| view)
    }

    /// The texture behind [`Self::color_view`], readable with a buffer copy.
    pub fn color_texture(&self) -> Option<&wgpu::Texture> {
        self.color.as_ref().map(|(texture, _)| texture)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Starts a pass that clears color and depth and resolves into `output`.
    ///
    /// `output` must match the target size: the offscreen color view, or the
    /// swapchain view in window mode.
    pub fn begin_pass<'e>(
        &'e self,
        encoder: &'e mut wgpu::CommandEncoder,
        output: &'e wgpu::TextureView,
        clear_color: wgpu::Color,
    ) -> wgpu::RenderPass<'e> {
        let (view, resolve_target, store) = match &self.msaa_view {
            Some(msaa) => (msaa, Some(output), wgpu::StoreOp::Discard),
            None => (output, None, wgpu::StoreOp::Store),
        };

        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear_color),
                    store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Discard,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        })
    }
}

fn create_texture(
    gpu: &GpuContext,
    label: &str,
    format: wgpu::TextureFormat,
    sample_count: u32,
    width: u32,
    height: u32,
    usage: wgpu::TextureUsages,
) -> wgpu::Texture {
    gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    })
}

/// Keeps a requested size within `1..=max` on both axes.
pub(crate) fn clamp_extent(width: u32, height: u32, max: u32) -> (u32, u32) {
    (width.clamp(1, max), height.clamp(1, max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sizes_become_one() {
        assert_eq!(clamp_extent(0, 0, 8192), (1, 1));
        assert_eq!(clamp_extent(640, 0, 8192), (640, 1));
    }

    #[test]
    fn oversized_requests_hit_the_device_limit() {
        assert_eq!(clamp_extent(20_000, 300, 8192), (8192, 300));
    }

    #[test]
    fn offscreen_is_the_default_mode() {
        assert_eq!(ViewportMode::default(), ViewportMode::Offscreen);
    }

    #[test]
    fn ensure_size_recreates_only_on_change() {
        let Some(gpu) = crate::gpu::tests::headless_gpu(64, 64) else {
            return;
        };
        let format = wgpu::TextureFormat::Rgba8Unorm;
        let mut target = RenderTarget::new(&gpu, ViewportMode::Offscreen, format, 4, 64, 64);
        assert!(target.color_view().is_some());

        assert!(!target.ensure_size(&gpu, 64, 64));
        assert!(target.ensure_size(&gpu, 128, 32));
        assert_eq!((target.width(), target.height()), (128, 32));
        assert_eq!(target.aspect(), 4.0);
        assert_eq!(target.mode(), ViewportMode::Offscreen);

        assert!(target.ensure_size(&gpu, 0, 0));
        assert_eq!((target.width(), target.height()), (1, 1));
    }

    #[test]
    fn window_mode_has_no_color_texture() {
        let Some(gpu) = crate::gpu::tests::headless_gpu(32, 32) else {
            return;
        };
        let target = RenderTarget::new(
            &gpu,
            ViewportMode::Window,
            wgpu::TextureFormat::Rgba8Unorm,
            1,
            32,
            32,
        );
        assert_eq!(target.mode(), ViewportMode::Window);
        assert!(target.color_view().is_none());
        assert!(target.color_texture().is_none());
    }
}
