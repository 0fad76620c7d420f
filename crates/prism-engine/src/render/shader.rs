//! Vertex and pixel shaders.
//!
//! Shaders are WGSL sources compiled lazily on first use against a device.
//! They are shared between renderables through `Rc`, so one compiled module
//! serves every object that references it.

use std::cell::OnceCell;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};

use super::vertex::SimpleVertex;

/// WGSL source plus its compiled module.
struct ShaderCode {
    name: String,
    source: String,
    entry_point: String,
    module: OnceCell<wgpu::ShaderModule>,
}

impl ShaderCode {
    fn new(name: String, source: String, entry_point: String) -> Self {
        Self {
            name,
            source,
            entry_point,
            module: OnceCell::new(),
        }
    }

    fn read(name: String, path: &Path, entry_point: String) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read shader `{name}` from {}", path.display()))?;
        Ok(Self::new(name, source, entry_point))
    }

    fn compile(&self, device: &wgpu::Device) -> Result<&wgpu::ShaderModule> {
        if let Some(module) = self.module.get() {
            return Ok(module);
        }

        log::debug!("compiling shader `{}` ({})", self.name, self.entry_point);

        let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(self.name.as_str()),
            source: wgpu::ShaderSource::Wgsl(self.source.as_str().into()),
        });

        if let Some(err) = pollster::block_on(scope.pop()) {
            anyhow::bail!("shader `{}` failed to compile: {err}", self.name);
        }

        Ok(self.module.get_or_init(|| module))
    }
}

/// Vertex stage of a pipeline.
///
/// The vertex shader owns the input layout: it is the stage that consumes
/// the vertex buffer, and a pipeline is built from exactly one of them.
pub struct VertexShader {
    code: ShaderCode,
    layout: wgpu::VertexBufferLayout<'static>,
}

impl VertexShader {
    /// Creates a vertex shader reading `SimpleVertex` input.
    pub fn new(
        name: impl Into<String>,
        wgsl: impl Into<String>,
        entry_point: impl Into<String>,
    ) -> Self {
        Self {
            code: ShaderCode::new(name.into(), wgsl.into(), entry_point.into()),
            layout: SimpleVertex::layout(),
        }
    }

    pub fn from_file(
        name: impl Into<String>,
        path: impl AsRef<Path>,
        entry_point: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            code: ShaderCode::read(name.into(), path.as_ref(), entry_point.into())?,
            layout: SimpleVertex::layout(),
        })
    }

    /// Compiles the module on first call; later calls return the cached one.
    ///
    /// Invalid WGSL is reported as an error and nothing is cached.
    pub fn initialize(&self, device: &wgpu::Device) -> Result<&wgpu::ShaderModule> {
        self.code.compile(device)
    }

    pub fn module(&self) -> Option<&wgpu::ShaderModule> {
        self.code.module.get()
    }

    pub fn name(&self) -> &str {
        &self.code.name
    }

    pub fn entry_point(&self) -> &str {
        &self.code.entry_point
    }

    pub fn source(&self) -> &str {
        &self.code.source
    }

    /// Vertex input layout.
    pub fn layout(&self) -> &wgpu::VertexBufferLayout<'static> {
        &self.layout
    }
}

impl fmt::Debug for VertexShader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VertexShader")
            .field("name", &self.code.name)
            .field("entry_point", &self.code.entry_point)
            .field("compiled", &self.code.module.get().is_some())
            .finish()
    }
}

/// Fragment stage of a pipeline.
pub struct PixelShader {
    code: ShaderCode,
}

impl PixelShader {
    pub fn new(
        name: impl Into<String>,
        wgsl: impl Into<String>,
        entry_point: impl Into<String>,
    ) -> Self {
        Self {
            code: ShaderCode::new(name.into(), wgsl.into(), entry_point.into()),
        }
    }

    pub fn from_file(
        name: impl Into<String>,
        path: impl AsRef<Path>,
        entry_point: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            code: ShaderCode::read(name.into(), path.as_ref(), entry_point.into())?,
        })
    }

    pub fn initialize(&self, device: &wgpu::Device) -> Result<&wgpu::ShaderModule> {
        self.code.compile(device)
    }

    pub fn module(&self) -> Option<&wgpu::ShaderModule> {
        self.code.module.get()
    }

    pub fn name(&self) -> &str {
        &self.code.name
    }

    pub fn entry_point(&self) -> &str {
        &self.code.entry_point
    }

    pub fn source(&self) -> &str {
        &self.code.source
    }
}

impl fmt::Debug for PixelShader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelShader")
            .field("name", &self.code.name)
            .field("entry_point", &self.code.entry_point)
            .field("compiled", &self.code.module.get().is_some())
            .finish()
    }
}
