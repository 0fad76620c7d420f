use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::rc::Rc;

use anyhow::Result;

use super::depth::DEPTH_FORMAT;
use super::shader::{PixelShader, VertexShader};

/// Identity of a vertex/pixel shader pair.
///
/// Two shader objects with the same name but different sources are
/// different keys.
pub(crate) type PipelineKey = (*const VertexShader, *const PixelShader);

pub(crate) fn pipeline_key(vs: &Rc<VertexShader>, ps: &Rc<PixelShader>) -> PipelineKey {
    (Rc::as_ptr(vs), Rc::as_ptr(ps))
}

struct CachedPipeline {
    // Held so the addresses in the key stay unique while the entry lives.
    _vs: Rc<VertexShader>,
    _ps: Rc<PixelShader>,
    pipeline: wgpu::RenderPipeline,
}

/// Render pipelines built on demand, one per shader pair.
pub(crate) struct PipelineCache {
    layout: wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
    entries: HashMap<PipelineKey, CachedPipeline>,
}

impl PipelineCache {
    pub(crate) fn new(
        device: &wgpu::Device,
        object_layout: &wgpu::BindGroupLayout,
        format: wgpu::TextureFormat,
    ) -> Self {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("prism scene pipeline layout"),
            bind_group_layouts: &[object_layout],
            immediate_size: 0,
        });

        Self {
            layout,
            format,
            entries: HashMap::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn get(&self, key: &PipelineKey) -> Option<&wgpu::RenderPipeline> {
        self.entries.get(key).map(|entry| &entry.pipeline)
    }

    /// Returns the pipeline for this pair, building it on first use.
    pub(crate) fn get_or_create(
        &mut self,
        device: &wgpu::Device,
        vs: &Rc<VertexShader>,
        ps: &Rc<PixelShader>,
    ) -> Result<&wgpu::RenderPipeline> {
        let entry = match self.entries.entry(pipeline_key(vs, ps)) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                let pipeline = create_pipeline(device, &self.layout, self.format, vs, ps)?;
                e.insert(CachedPipeline {
                    _vs: Rc::clone(vs),
                    _ps: Rc::clone(ps),
                    pipeline,
                })
            }
        };

        Ok(&entry.pipeline)
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
    vs: &VertexShader,
    ps: &PixelShader,
) -> Result<wgpu::RenderPipeline> {
    log::debug!("creating pipeline `{}` + `{}`", vs.name(), ps.name());

    let vs_module = vs.initialize(device)?;
    let ps_module = ps.initialize(device)?;

    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("prism scene pipeline"),
        layout: Some(layout),

        vertex: wgpu::VertexState {
            module: vs_module,
            entry_point: Some(vs.entry_point()),
            compilation_options: Default::default(),
            buffers: &[vs.layout().clone()],
        },

        fragment: Some(wgpu::FragmentState {
            module: ps_module,
            entry_point: Some(ps.entry_point()),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),

        // Geometry uses clockwise front faces.
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Cw,
            cull_mode: Some(wgpu::Face::Back),
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },

        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),

        multiview_mask: None,
        cache: None,
    });

    if let Some(err) = pollster::block_on(scope.pop()) {
        anyhow::bail!(
            "pipeline `{}` + `{}` is invalid: {err}",
            vs.name(),
            ps.name()
        );
    }

    Ok(pipeline)
}
