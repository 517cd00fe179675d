//! Shader programs built from a vertex and a fragment WGSL file.
//!
//! Every program shares one pipeline layout, described by [`SceneLayout`]:
//!
//! - **Group 0**: per-asset uniforms (`mvp`, view, model, light)
//! - **Group 1**: albedo texture + sampler (bindings 0, 1) and specular texture +
//!   sampler (bindings 2, 3)
//!
//! The vertex file must export `vs_main` reading [`Vertex3d`] locations 0 to 2,
//! and the fragment file must export `fs_main`. A shader may leave any binding
//! undeclared; the layout still provides it.

use std::path::{Path, PathBuf};

use crate::error::{FredError, Result};
use crate::gpu::GpuContext;
use crate::mesh::Vertex3d;

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Bind group and pipeline layouts shared by every shader and asset.
pub struct SceneLayout {
    pub(crate) uniforms: wgpu::BindGroupLayout,
    pub(crate) textures: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    sample_count: u32,
}

impl SceneLayout {
    /// Describes pipelines that render into `color_format` with `sample_count` samples.
    pub fn new(gpu: &GpuContext, color_format: wgpu::TextureFormat, sample_count: u32) -> Self {
        let device = &gpu.device;

        let uniforms = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Asset Uniforms Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let sampler_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        };

        let textures = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Asset Textures Layout"),
            entries: &[
                texture_entry(0),
                sampler_entry(1),
                texture_entry(2),
                sampler_entry(3),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&uniforms, &textures],
            push_constant_ranges: &[],
        });

        Self {
            uniforms,
            textures,
            pipeline_layout,
            color_format,
            sample_count,
        }
    }

    pub fn color_format(&self) -> wgpu::TextureFormat {
        self.color_format
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }
}

/// A compiled and linked vertex + fragment program.
pub struct Shader {
    pub(crate) pipeline: wgpu::RenderPipeline,
    vertex_path: PathBuf,
    fragment_path: PathBuf,
}

impl Shader {
    /// Reads, compiles and links the two WGSL files.
    ///
    /// Any failure is logged and returned as [`FredError::Shader`].
    pub fn from_files(
        gpu: &GpuContext,
        layout: &SceneLayout,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<Self> {
        let vertex_path = vertex_path.as_ref();
        let fragment_path = fragment_path.as_ref();
        log::debug!(
            "Loading shaders: {} + {}",
            vertex_path.display(),
            fragment_path.display()
        );

        let vertex_source = read_source(vertex_path, "vertex")?;
        let fragment_source = read_source(fragment_path, "fragment")?;

        Self::from_sources(gpu, layout, &vertex_source, &fragment_source, vertex_path, fragment_path)
    }

    /// Compiles already-loaded WGSL sources. The paths are used for labels and logs.
    pub fn from_sources(
        gpu: &GpuContext,
        layout: &SceneLayout,
        vertex_source: &str,
        fragment_source: &str,
        vertex_path: &Path,
        fragment_path: &Path,
    ) -> Result<Self> {
        let vertex = compile(gpu, vertex_source, vertex_path)?;
        let fragment = compile(gpu, fragment_source, fragment_path)?;

        log::debug!("Linking program");
        gpu.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let pipeline = gpu
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(&format!("{} Pipeline", vertex_path.display())),
                layout: Some(&layout.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &vertex,
                    entry_point: Some(VERTEX_ENTRY),
                    buffers: &[Vertex3d::LAYOUT],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &fragment,
                    entry_point: Some(FRAGMENT_ENTRY),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: layout.color_format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: Some(wgpu::Face::Back),
                    front_face: wgpu::FrontFace::Ccw,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState {
                    count: layout.sample_count,
                    ..Default::default()
                },
                multiview: None,
                cache: None,
            });

        if let Some(err) = pollster::block_on(gpu.device.pop_error_scope()) {
            log::error!(
                "Failed to link {} + {}: {err}",
                vertex_path.display(),
                fragment_path.display()
            );
            return Err(FredError::shader(format!("link failed: {err}")));
        }

        Ok(Self {
            pipeline,
            vertex_path: vertex_path.to_path_buf(),
            fragment_path: fragment_path.to_path_buf(),
        })
    }

    pub fn vertex_path(&self) -> &Path {
        &self.vertex_path
    }

    pub fn fragment_path(&self) -> &Path {
        &self.fragment_path
    }
}

fn read_source(path: &Path, stage: &str) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        log::error!("Failed to open {stage} shader \"{}\": {e}", path.display());
        FredError::shader(format!("cannot read {}: {e}", path.display()))
    })
}

fn compile(gpu: &GpuContext, source: &str, path: &Path) -> Result<wgpu::ShaderModule> {
    log::debug!("Compiling shader: {}", path.display());
    gpu.device.push_error_scope(wgpu::ErrorFilter::Validation);

    let module = gpu
        .device
        .create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&path.display().to_string()),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

    match pollster::block_on(gpu.device.pop_error_scope()) {
        Some(err) => {
            log::error!("Failed to compile {}: {err}", path.display());
            Err(FredError::shader(format!("{}: {err}", path.display())))
        }
        None => Ok(module),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::naga;

    const SHADERS: &[&str] = &[
        "basic.vert.wgsl",
        "basic.frag.wgsl",
        "basic_lit.vert.wgsl",
        "basic_lit.frag.wgsl",
    ];

    fn parse_and_validate(name: &str) -> naga::Module {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/shaders").join(name);
        let source = std::fs::read_to_string(&path).unwrap();
        let module = naga::front::wgsl::parse_str(&source)
            .unwrap_or_else(|e| panic!("{name}: {}", e.emit_to_string(&source)));
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::empty(),
        )
        .validate(&module)
        .unwrap_or_else(|e| panic!("{name}: {e:?}"));
        module
    }

    #[test]
    fn bundled_shaders_validate() {
        for name in SHADERS {
            parse_and_validate(name);
        }
    }

    #[test]
    fn entry_points_follow_convention() {
        for name in SHADERS {
            let module = parse_and_validate(name);
            let (entry, stage) = if name.contains(".vert.") {
                (VERTEX_ENTRY, naga::ShaderStage::Vertex)
            } else {
                (FRAGMENT_ENTRY, naga::ShaderStage::Fragment)
            };
            assert!(
                module
                    .entry_points
                    .iter()
                    .any(|ep| ep.name == entry && ep.stage == stage),
                "{name} lacks {entry}"
            );
        }
    }

    #[test]
    fn uniform_block_matches_rust_layout() {
        let module = parse_and_validate("basic_lit.vert.wgsl");
        let uniforms = module
            .global_variables
            .iter()
            .find(|(_, var)| var.space == naga::AddressSpace::Uniform)
            .map(|(_, var)| var.ty)
            .unwrap();
        let size = module.types[uniforms].inner.size(module.to_ctx());
        assert_eq!(
            size as usize,
            std::mem::size_of::<crate::asset::AssetUniforms>()
        );
    }
}
