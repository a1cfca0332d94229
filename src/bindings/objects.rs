// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Device objects that can be bound to shader variables.
//!
//! Objects are shared through [`Arc`].  The binding caches hold clones of these handles, so an
//! object stays alive as long as any cache refers to it.  Identity, not value, decides whether
//! two objects are "the same" for rebind checks.

use std::sync::Arc;

use crate::bindings::sampler::SamplerDesc;

/// How a buffer's contents are interpreted by views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferMode {
    Undefined,
    /// Typed elements with a texel format.
    Formatted,
    /// Structured elements with a fixed stride.
    Structured,
    /// Untyped bytes.
    Raw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    Immutable,
    Default,
    /// CPU-updated once per frame or more.
    Dynamic,
}

#[derive(Debug)]
pub struct Buffer {
    name: String,
    size: u64,
    mode: BufferMode,
    usage: BufferUsage,
}

impl Buffer {
    pub fn new(name: impl Into<String>, size: u64, mode: BufferMode, usage: BufferUsage) -> Arc<Self> {
        Arc::new(Buffer {
            name: name.into(),
            size,
            mode,
            usage,
        })
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn size(&self) -> u64 {
        self.size
    }
    pub fn mode(&self) -> BufferMode {
        self.mode
    }
    pub fn usage(&self) -> BufferUsage {
        self.usage
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferViewType {
    ShaderResource,
    UnorderedAccess,
}

#[derive(Debug)]
pub struct BufferView {
    name: String,
    view_type: BufferViewType,
    buffer: Arc<Buffer>,
}

impl BufferView {
    pub fn new(name: impl Into<String>, buffer: &Arc<Buffer>, view_type: BufferViewType) -> Arc<Self> {
        Arc::new(BufferView {
            name: name.into(),
            view_type,
            buffer: buffer.clone(),
        })
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn view_type(&self) -> BufferViewType {
        self.view_type
    }
    pub fn buffer(&self) -> &Arc<Buffer> {
        &self.buffer
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureViewType {
    ShaderResource,
    UnorderedAccess,
    RenderTarget,
    DepthStencil,
}

#[derive(Debug)]
pub struct TextureView {
    name: String,
    view_type: TextureViewType,
    sampler: Option<Arc<Sampler>>,
}

impl TextureView {
    pub fn new(name: impl Into<String>, view_type: TextureViewType) -> Arc<Self> {
        Arc::new(TextureView {
            name: name.into(),
            view_type,
            sampler: None,
        })
    }

    /// A view that carries the sampler it should be sampled with.
    pub fn with_sampler(
        name: impl Into<String>,
        view_type: TextureViewType,
        sampler: &Arc<Sampler>,
    ) -> Arc<Self> {
        Arc::new(TextureView {
            name: name.into(),
            view_type,
            sampler: Some(sampler.clone()),
        })
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn view_type(&self) -> TextureViewType {
        self.view_type
    }
    pub fn sampler(&self) -> Option<&Arc<Sampler>> {
        self.sampler.as_ref()
    }
}

#[derive(Debug)]
pub struct Sampler {
    name: String,
    desc: SamplerDesc,
}

impl Sampler {
    pub fn new(name: impl Into<String>, desc: SamplerDesc) -> Arc<Self> {
        Arc::new(Sampler {
            name: name.into(),
            desc,
        })
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn desc(&self) -> &SamplerDesc {
        &self.desc
    }
}

/// Top-level acceleration structure.
#[derive(Debug)]
pub struct TopLevelAS {
    name: String,
}

impl TopLevelAS {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(TopLevelAS { name: name.into() })
    }
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Any bindable object.
///
/// Equality is identity of the underlying allocation.
#[derive(Debug, Clone)]
pub enum DeviceObject {
    Buffer(Arc<Buffer>),
    BufferView(Arc<BufferView>),
    TextureView(Arc<TextureView>),
    Sampler(Arc<Sampler>),
    TopLevelAS(Arc<TopLevelAS>),
}

impl DeviceObject {
    pub fn name(&self) -> &str {
        match self {
            DeviceObject::Buffer(b) => b.name(),
            DeviceObject::BufferView(v) => v.name(),
            DeviceObject::TextureView(v) => v.name(),
            DeviceObject::Sampler(s) => s.name(),
            DeviceObject::TopLevelAS(t) => t.name(),
        }
    }

    /// Human-readable object type, including the view type for views.
    pub fn type_name(&self) -> &'static str {
        match self {
            DeviceObject::Buffer(_) => "buffer",
            DeviceObject::BufferView(v) => match v.view_type() {
                BufferViewType::ShaderResource => "buffer SRV view",
                BufferViewType::UnorderedAccess => "buffer UAV view",
            },
            DeviceObject::TextureView(v) => match v.view_type() {
                TextureViewType::ShaderResource => "texture SRV view",
                TextureViewType::UnorderedAccess => "texture UAV view",
                TextureViewType::RenderTarget => "texture RTV view",
                TextureViewType::DepthStencil => "texture DSV view",
            },
            DeviceObject::Sampler(_) => "sampler",
            DeviceObject::TopLevelAS(_) => "top-level acceleration structure",
        }
    }
}

impl PartialEq for DeviceObject {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DeviceObject::Buffer(a), DeviceObject::Buffer(b)) => Arc::ptr_eq(a, b),
            (DeviceObject::BufferView(a), DeviceObject::BufferView(b)) => Arc::ptr_eq(a, b),
            (DeviceObject::TextureView(a), DeviceObject::TextureView(b)) => Arc::ptr_eq(a, b),
            (DeviceObject::Sampler(a), DeviceObject::Sampler(b)) => Arc::ptr_eq(a, b),
            (DeviceObject::TopLevelAS(a), DeviceObject::TopLevelAS(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for DeviceObject {}

impl From<Arc<Buffer>> for DeviceObject {
    fn from(value: Arc<Buffer>) -> Self {
        DeviceObject::Buffer(value)
    }
}
impl From<Arc<BufferView>> for DeviceObject {
    fn from(value: Arc<BufferView>) -> Self {
        DeviceObject::BufferView(value)
    }
}
impl From<Arc<TextureView>> for DeviceObject {
    fn from(value: Arc<TextureView>) -> Self {
        DeviceObject::TextureView(value)
    }
}
impl From<Arc<Sampler>> for DeviceObject {
    fn from(value: Arc<Sampler>) -> Self {
        DeviceObject::Sampler(value)
    }
}
impl From<Arc<TopLevelAS>> for DeviceObject {
    fn from(value: Arc<TopLevelAS>) -> Self {
        DeviceObject::TopLevelAS(value)
    }
}
