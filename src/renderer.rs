//! wgpu upload and submission of batches.
//!
//! The batch layer is backend agnostic; this module turns a [`Batch`] into
//! GPU buffers and replays its per-camera [`DrawCall`]s on a render pass.
//! Pipelines and bind groups are owned by the caller and looked up through
//! [`GpuResources`].

use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::camera::{Camera, CameraId};
use crate::config::BufferUsage;
use crate::graphics::batch::{Batch, DrawCall, SpriteVertex};
use crate::graphics::state::{
    BlendFactor, BlendFunc, ProgramId, StateKind, StatePart, UniformBinding,
};
use crate::texture::TextureId;

/// Vertex and fragment stages matching [`SpriteVertex`] and [`crate::camera::CameraUniform`].
pub const SPRITE_SHADER: &str = r#"
struct CameraAttrs {
    zoom: f32,
    _pad: f32,
    position: vec2<f32>,
    game_dimensions: vec2<f32>,
    dimensions: vec2<f32>,
};

@group(0) @binding(0) var sprite_texture: texture_2d<f32>;
@group(0) @binding(1) var sprite_sampler: sampler;
@group(1) @binding(0) var<uniform> camera: CameraAttrs;

struct VertexIn {
    @location(0) position: vec2<f32>,
    @location(1) translate: vec2<f32>,
    @location(2) offset: vec2<f32>,
    @location(3) flip: vec2<f32>,
    @location(4) scroll_factor: vec2<f32>,
    @location(5) origin: vec2<f32>,
    @location(6) rotation: f32,
    @location(7) scale: vec2<f32>,
    @location(8) tex_coords: vec3<f32>,
    @location(9) color: vec4<f32>,
};

struct VertexOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) color: vec4<f32>,
};

@vertex
fn vs_main(v: VertexIn) -> VertexOut {
    var p = v.position;
    if (v.flip.x > 0.5) {
        p.x = 2.0 * v.origin.x - p.x;
    }
    if (v.flip.y > 0.5) {
        p.y = 2.0 * v.origin.y - p.y;
    }
    p = (p - v.origin) * v.scale;
    let r = radians(v.rotation);
    p = vec2<f32>(p.x * cos(r) - p.y * sin(r), p.x * sin(r) + p.y * cos(r));
    p = p + v.origin + v.translate - v.offset;

    let half = camera.game_dimensions * 0.5;
    p = camera.zoom * (p - half - v.scroll_factor * camera.position) + half;

    var out: VertexOut;
    let ndc = p / camera.game_dimensions * 2.0 - vec2<f32>(1.0, 1.0);
    out.clip = vec4<f32>(ndc.x, -ndc.y, 0.0, 1.0);
    out.uv = v.tex_coords.xy;
    out.color = v.color;
    return out;
}

@fragment
fn fs_main(in: VertexOut) -> @location(0) vec4<f32> {
    return textureSample(sprite_texture, sprite_sampler, in.uv) * in.color;
}
"#;

impl SpriteVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 10] = wgpu::vertex_attr_array![
        0 => Float32x2,
        1 => Float32x2,
        2 => Float32x2,
        3 => Float32x2,
        4 => Float32x2,
        5 => Float32x2,
        6 => Float32,
        7 => Float32x2,
        8 => Float32x3,
        9 => Float32x4,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SpriteVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

pub fn blend_factor(factor: BlendFactor) -> wgpu::BlendFactor {
    match factor {
        BlendFactor::Zero => wgpu::BlendFactor::Zero,
        BlendFactor::One => wgpu::BlendFactor::One,
        BlendFactor::SrcColor => wgpu::BlendFactor::Src,
        BlendFactor::OneMinusSrcColor => wgpu::BlendFactor::OneMinusSrc,
        BlendFactor::DstColor => wgpu::BlendFactor::Dst,
        BlendFactor::OneMinusDstColor => wgpu::BlendFactor::OneMinusDst,
        BlendFactor::SrcAlpha => wgpu::BlendFactor::SrcAlpha,
        BlendFactor::OneMinusSrcAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
        BlendFactor::DstAlpha => wgpu::BlendFactor::DstAlpha,
        BlendFactor::OneMinusDstAlpha => wgpu::BlendFactor::OneMinusDstAlpha,
    }
}

pub fn blend_state(blend: BlendFunc) -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: blend_factor(blend.src),
            dst_factor: blend_factor(blend.dst),
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: blend_factor(blend.src_alpha),
            dst_factor: blend_factor(blend.dst_alpha),
            operation: wgpu::BlendOperation::Add,
        },
    }
}

/// Lookups the renderer needs while replaying state switches.
pub trait GpuResources {
    fn pipeline(&self, program: ProgramId, blend: BlendFunc) -> Option<&wgpu::RenderPipeline>;
    fn texture_bind_group(&self, texture: TextureId) -> Option<&wgpu::BindGroup>;
    fn camera_bind_group(&self, binding: UniformBinding) -> Option<&wgpu::BindGroup>;
}

struct CameraBuffers {
    index_buffer: wgpu::Buffer,
    index_capacity: u64,
    calls: Vec<DrawCall>,
}

/// GPU mirror of one [`Batch`].
pub struct WgpuBatchRenderer {
    usage: BufferUsage,
    vertex_buffer: Option<wgpu::Buffer>,
    vertex_capacity: u64,
    cameras: HashMap<CameraId, CameraBuffers>,
}

impl WgpuBatchRenderer {
    pub fn new(usage: BufferUsage) -> Self {
        Self {
            usage,
            vertex_buffer: None,
            vertex_capacity: 0,
            cameras: HashMap::new(),
        }
    }

    /// Copies the batch's vertices and each camera's index list to the GPU,
    /// growing buffers as needed.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        batch: &Batch,
        cameras: &[Camera],
    ) {
        batch.with_vertices(|vertices| {
            let bytes: &[u8] = bytemuck::cast_slice(vertices);
            if bytes.is_empty() {
                return;
            }
            match &self.vertex_buffer {
                Some(buffer) if self.vertex_capacity >= bytes.len() as u64 => {
                    queue.write_buffer(buffer, 0, bytes);
                }
                _ => {
                    self.vertex_buffer = Some(device.create_buffer_init(
                        &wgpu::util::BufferInitDescriptor {
                            label: Some("Sprite Vertex Buffer"),
                            contents: bytes,
                            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                        },
                    ));
                    self.vertex_capacity = bytes.len() as u64;
                    log::debug!("allocated {} byte vertex buffer ({:?})", bytes.len(), self.usage);
                }
            }
        });

        for camera in cameras {
            let indices = batch.indices(camera.id());
            let calls = batch.draw_calls(camera.id());
            let bytes: &[u8] = bytemuck::cast_slice(&indices);
            let entry = self.cameras.get_mut(&camera.id());
            match entry {
                Some(buffers) if buffers.index_capacity >= bytes.len() as u64 => {
                    if !bytes.is_empty() {
                        queue.write_buffer(&buffers.index_buffer, 0, bytes);
                    }
                    buffers.calls = calls;
                }
                _ => {
                    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Sprite Index Buffer"),
                        contents: bytes,
                        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
                    });
                    self.cameras.insert(
                        camera.id(),
                        CameraBuffers {
                            index_buffer,
                            index_capacity: bytes.len() as u64,
                            calls,
                        },
                    );
                }
            }
        }
    }

    /// Records the draw calls for `camera`. Returns how many were issued.
    pub fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        camera: CameraId,
        resources: &impl GpuResources,
    ) -> usize {
        let (Some(vertex_buffer), Some(buffers)) = (&self.vertex_buffer, self.cameras.get(&camera))
        else {
            return 0;
        };
        if buffers.calls.is_empty() {
            return 0;
        }
        pass.set_vertex_buffer(0, vertex_buffer.slice(..));
        pass.set_index_buffer(buffers.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

        let mut issued = 0;
        for call in &buffers.calls {
            let needs_pipeline = call
                .switches
                .iter()
                .any(|p| matches!(p.kind(), StateKind::Program | StateKind::BlendFunc));
            if needs_pipeline {
                let program = match call.state.get(StateKind::Program) {
                    Some(StatePart::Program(p)) => *p,
                    _ => ProgramId(0),
                };
                let blend = match call.state.get(StateKind::BlendFunc) {
                    Some(StatePart::BlendFunc(b)) => *b,
                    _ => BlendFunc::ALPHA,
                };
                match resources.pipeline(program, blend) {
                    Some(pipeline) => pass.set_pipeline(pipeline),
                    None => {
                        log::warn!("no pipeline for {program:?}; skipping draw");
                        continue;
                    }
                }
            }
            for part in &call.switches {
                match part {
                    StatePart::Texture(id) => {
                        if let Some(group) = resources.texture_bind_group(*id) {
                            pass.set_bind_group(0, group, &[]);
                        }
                    }
                    StatePart::UniformBinding(binding) => {
                        if let Some(group) = resources.camera_bind_group(*binding) {
                            pass.set_bind_group(1, group, &[]);
                        }
                    }
                    _ => {}
                }
            }
            pass.draw_indexed(call.index_start..call.index_start + call.index_count, 0, 0..1);
            issued += 1;
        }
        issued
    }
}

/// Creates the uniform buffer backing a camera's binding.
pub fn create_camera_buffer(device: &wgpu::Device, camera: &Camera) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Camera Uniform Buffer"),
        contents: bytemuck::bytes_of(&camera.uniform()),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn write_camera_uniform(queue: &wgpu::Queue, buffer: &wgpu::Buffer, camera: &Camera) {
    queue.write_buffer(buffer, 0, bytemuck::bytes_of(&camera.uniform()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_covers_every_vertex_field() {
        let layout = SpriteVertex::layout();
        assert_eq!(layout.array_stride, 88);
        assert_eq!(layout.attributes.len(), 10);
        let last = layout.attributes[9];
        assert_eq!(last.offset, 72);
        assert_eq!(last.format, wgpu::VertexFormat::Float32x4);
    }

    #[test]
    fn alpha_blend_maps_to_wgpu() {
        let state = blend_state(BlendFunc::ALPHA);
        assert_eq!(state.color.src_factor, wgpu::BlendFactor::SrcAlpha);
        assert_eq!(state.color.dst_factor, wgpu::BlendFactor::OneMinusSrcAlpha);
        assert_eq!(state.alpha.src_factor, wgpu::BlendFactor::One);
        assert_eq!(state.alpha.dst_factor, wgpu::BlendFactor::OneMinusSrcAlpha);
    }
}
