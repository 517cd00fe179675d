use std::path::Path;

use image::RgbaImage;
use image::imageops::FilterType;

use crate::error::{FredError, Result};
use crate::gpu::GpuContext;

/// A GPU texture with its full mip chain and a sampler, ready to bind to a shader.
#[derive(Debug)]
pub struct Texture {
    #[allow(dead_code)]
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
    pub mip_level_count: u32,
}

impl Texture {
    /// Create a texture from raw RGBA data, generating mipmaps on the CPU.
    ///
    /// A buffer that does not fill the size, or a size the device cannot hold,
    /// yields the white texture instead.
    pub fn from_rgba(gpu: &GpuContext, data: &[u8], width: u32, height: u32, label: &str) -> Self {
        if let Err(e) = check_size(width, height, max_dimension(gpu)) {
            log::warn!("'{label}': {e}");
            return Self::white(gpu);
        }
        match RgbaImage::from_raw(width, height, data.to_vec()) {
            Some(img) => Self::from_image(gpu, img, label),
            None => {
                log::warn!("'{label}': {} bytes do not fill {width}x{height}", data.len());
                Self::white(gpu)
            }
        }
    }

    /// Load a texture from an image file.
    ///
    /// The image is flipped vertically so texture coordinates with a bottom-left
    /// origin (as exported in OBJ files) sample it upright.
    pub fn from_file(gpu: &GpuContext, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("Loading texture: {}", path.display());

        let img = match image::open(path) {
            Ok(img) => img,
            Err(e) => {
                log::warn!("Texture failed to load: {}: {e}", path.display());
                return Err(FredError::image(path, e));
            }
        };
        if let Err(e) = check_size(img.width(), img.height(), max_dimension(gpu)) {
            log::warn!("Texture failed to load: {}: {e}", path.display());
            return Err(e);
        }
        let img = image::imageops::flip_vertical(&img.to_rgba8());
        Ok(Self::from_image(gpu, img, &path.display().to_string()))
    }

    /// A 1x1 opaque white texture, bound wherever a map is missing.
    pub fn white(gpu: &GpuContext) -> Self {
        Self::from_image(
            gpu,
            RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255])),
            "Default White Texture",
        )
    }

    /// Procedural two-colour checkerboard with `cells` squares per side.
    pub fn checkerboard(gpu: &GpuContext, size: u32, cells: u32, a: [u8; 4], b: [u8; 4]) -> Self {
        let img = checkerboard_image(size.min(max_dimension(gpu)), cells, a, b);
        Self::from_image(gpu, img, "Checkerboard Texture")
    }

    fn from_image(gpu: &GpuContext, img: RgbaImage, label: &str) -> Self {
        use wgpu::util::DeviceExt;

        let (width, height) = img.dimensions();
        let mips = mip_chain(img);
        let mip_level_count = mips.len() as u32;
        let data: Vec<u8> = mips.iter().flat_map(|m| m.as_raw().iter().copied()).collect();

        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &data,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{label} Sampler")),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        log::debug!("uploaded texture '{label}': {width}x{height}, {mip_level_count} mips");

        Self {
            texture,
            view,
            sampler,
            width,
            height,
            mip_level_count,
        }
    }
}

fn max_dimension(gpu: &GpuContext) -> u32 {
    gpu.device.limits().max_texture_dimension_2d
}

/// Both sides must be in `1..=max`.
pub(crate) fn check_size(width: u32, height: u32, max: u32) -> Result<()> {
    if width == 0 || height == 0 || width > max || height > max {
        return Err(FredError::TextureSize { width, height, max });
    }
    Ok(())
}

/// Number of levels in a full mip chain down to 1x1.
pub(crate) fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Builds every mip level, base level first.
pub(crate) fn mip_chain(base: RgbaImage) -> Vec<RgbaImage> {
    let levels = mip_level_count(base.width(), base.height());
    let mut chain = Vec::with_capacity(levels as usize);
    chain.push(base);
    for _ in 1..levels {
        let prev = &chain[chain.len() - 1];
        let w = (prev.width() / 2).max(1);
        let h = (prev.height() / 2).max(1);
        let next = image::imageops::resize(prev, w, h, FilterType::Triangle);
        chain.push(next);
    }
    chain
}

pub(crate) fn checkerboard_image(size: u32, cells: u32, a: [u8; 4], b: [u8; 4]) -> RgbaImage {
    let size = size.max(1);
    let cell = (size / cells.max(1)).max(1);
    RgbaImage::from_fn(size, size, |x, y| {
        if (x / cell + y / cell) % 2 == 0 {
            image::Rgba(a)
        } else {
            image::Rgba(b)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_sizes_outside_the_device_limit_are_rejected() {
        assert!(check_size(1, 1, 8192).is_ok());
        assert!(check_size(8192, 8192, 8192).is_ok());
        assert!(matches!(
            check_size(16384, 16384, 8192),
            Err(FredError::TextureSize { width: 16384, max: 8192, .. })
        ));
        assert!(check_size(0, 0, 8192).is_err());
        assert!(check_size(64, 0, 8192).is_err());
    }

    #[test]
    fn bad_rgba_sizes_fall_back_to_white() {
        let Some(gpu) = crate::gpu::tests::headless_gpu(4, 4) else {
            return;
        };
        let empty = Texture::from_rgba(&gpu, &[], 0, 0, "empty");
        assert_eq!((empty.width, empty.height), (1, 1));

        let max = max_dimension(&gpu);
        let huge = Texture::from_rgba(&gpu, &[], max + 1, 1, "huge");
        assert_eq!((huge.width, huge.height), (1, 1));

        let ok = Texture::from_rgba(&gpu, &[255; 4 * 4 * 2], 4, 2, "ok");
        assert_eq!((ok.width, ok.height, ok.mip_level_count), (4, 2, 3));
    }

    #[test]
    fn mip_count_matches_largest_side() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(256, 256), 9);
        assert_eq!(mip_level_count(300, 17), 9);
        assert_eq!(mip_level_count(0, 0), 1);
    }

    #[test]
    fn mip_chain_halves_down_to_one_pixel() {
        let chain = mip_chain(RgbaImage::new(8, 2));
        let sizes: Vec<(u32, u32)> = chain.iter().map(|m| m.dimensions()).collect();
        assert_eq!(sizes, vec![(8, 2), (4, 1), (2, 1), (1, 1)]);
    }

    #[test]
    fn checkerboard_alternates_cells() {
        let white = [255, 255, 255, 255];
        let black = [0, 0, 0, 255];
        let img = checkerboard_image(8, 4, white, black);
        assert_eq!(img.get_pixel(0, 0).0, white);
        assert_eq!(img.get_pixel(2, 0).0, black);
        assert_eq!(img.get_pixel(2, 2).0, white);
    }
}
