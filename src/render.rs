use crate::bodies::{PLANET_COUNT, SUN};
use crate::initialize::{Lights, LineVertex, MeshVertex, Scene, Star};
use crate::simulation::SimulationState;
use cgmath::{EuclideanSpace, Matrix4, Rad};
use std::borrow::Cow;
use wgpu::util::DeviceExt;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const BODY_COUNT: usize = PLANET_COUNT + 1;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BodyInstance {
  model: [[f32; 4]; 4],
  color: [f32; 4],
  /// x: emissive, y: receives shadows, z: own occluder slot (-1 for none).
  params: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct LightUniform {
  ambient: [f32; 4],
  /// w holds the light range.
  position: [f32; 4],
  /// w is 1.0 when shadows are on.
  color: [f32; 4],
  occluders: [[f32; 4]; PLANET_COUNT],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct StarLayerUniform {
  rotation: [[f32; 4]; 4],
  /// x: point size, y: opacity.
  params: [f32; 4],
}

struct StarLayerGpu {
  instances: wgpu::Buffer,
  count: u32,
  size: f32,
  opacity: f32,
  uniform: wgpu::Buffer,
  bind_group: wgpu::BindGroup,
}

/// Sun first, then planets in table order.
#[must_use]
pub fn body_instances(sim: &SimulationState, shadows: bool) -> Vec<BodyInstance> {
  let [r, g, b] = crate::hex_to_linear(SUN.color);
  let sun = BodyInstance {
    model: (Matrix4::from_angle_y(Rad(sim.sun_spin)) * Matrix4::from_scale(SUN.radius)).into(),
    color: [r, g, b, 1.0],
    params: [1.0, 0.0, -1.0, 0.0],
  };
  let receive = if shadows { 1.0 } else { 0.0 };
  std::iter::once(sun)
    .chain(sim.planets.iter().enumerate().map(|(slot, planet)| {
      let descriptor = planet.descriptor();
      let [r, g, b] = crate::hex_to_linear(descriptor.color);
      let model = Matrix4::from_translation(planet.position().to_vec())
        * Matrix4::from_angle_y(Rad(planet.spin))
        * Matrix4::from_scale(descriptor.radius);
      BodyInstance {
        model: model.into(),
        color: [r, g, b, 1.0],
        params: [0.0, receive, slot as f32, 0.0],
      }
    }))
    .collect()
}

/// Planet spheres as `[x, y, z, radius]` for the shadow test.
#[must_use]
pub fn occluders(sim: &SimulationState) -> [[f32; 4]; PLANET_COUNT] {
  let mut out = [[0.0; 4]; PLANET_COUNT];
  for (slot, planet) in sim.planets.iter().take(PLANET_COUNT).enumerate() {
    let p = planet.position();
    out[slot] = [p.x, p.y, p.z, planet.descriptor().radius];
  }
  out
}

fn light_uniform(lights: &Lights, sim: &SimulationState) -> LightUniform {
  let [ar, ag, ab] = lights.ambient;
  let [px, py, pz] = lights.point_position;
  let [lr, lg, lb] = lights.point_color;
  LightUniform {
    ambient: [ar, ag, ab, 1.0],
    position: [px, py, pz, lights.point_range],
    color: [lr, lg, lb, if lights.shadows { 1.0 } else { 0.0 }],
    occluders: occluders(sim),
  }
}

pub fn create_depth_view(
  device: &wgpu::Device,
  config: &wgpu::SurfaceConfiguration,
) -> wgpu::TextureView {
  let texture = device.create_texture(&wgpu::TextureDescriptor {
    label: Some("Depth Texture"),
    size: wgpu::Extent3d {
      width: config.width.max(1),
      height: config.height.max(1),
      depth_or_array_layers: 1,
    },
    mip_level_count: 1,
    sample_count: 1,
    dimension: wgpu::TextureDimension::D2,
    format: DEPTH_FORMAT,
    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
    view_formats: &[],
  });
  texture.create_view(&wgpu::TextureViewDescriptor::default())
}

struct PipelineDesc<'a> {
  label: &'a str,
  shader: &'a wgpu::ShaderModule,
  buffers: &'a [wgpu::VertexBufferLayout<'a>],
  topology: wgpu::PrimitiveTopology,
  blend: Option<wgpu::BlendState>,
  depth_write: bool,
}

fn create_pipeline(
  device: &wgpu::Device,
  layout: &wgpu::PipelineLayout,
  format: wgpu::TextureFormat,
  desc: PipelineDesc,
) -> wgpu::RenderPipeline {
  device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
    label: Some(desc.label),
    layout: Some(layout),
    vertex: wgpu::VertexState {
      module: desc.shader,
      entry_point: "vs_main",
      buffers: desc.buffers,
    },
    fragment: Some(wgpu::FragmentState {
      module: desc.shader,
      entry_point: "fs_main",
      targets: &[Some(wgpu::ColorTargetState {
        format,
        blend: desc.blend,
        write_mask: wgpu::ColorWrites::ALL,
      })],
    }),
    primitive: wgpu::PrimitiveState {
      topology: desc.topology,
      ..Default::default()
    },
    depth_stencil: Some(wgpu::DepthStencilState {
      format: DEPTH_FORMAT,
      depth_write_enabled: desc.depth_write,
      depth_compare: wgpu::CompareFunction::LessEqual,
      stencil: wgpu::StencilState::default(),
      bias: wgpu::DepthBiasState::default(),
    }),
    multisample: wgpu::MultisampleState::default(),
    multiview: None,
  })
}

pub struct Render {
  depth_view: wgpu::TextureView,
  lights: Lights,
  light_buffer: wgpu::Buffer,
  light_bind_group: wgpu::BindGroup,
  sphere_vertices: wgpu::Buffer,
  sphere_indices: wgpu::Buffer,
  sphere_index_count: u32,
  body_buffer: wgpu::Buffer,
  body_pipeline: wgpu::RenderPipeline,
  orbit_vertices: wgpu::Buffer,
  orbit_vertex_count: u32,
  orbit_pipeline: wgpu::RenderPipeline,
  star_layers: Vec<StarLayerGpu>,
  star_pipeline: wgpu::RenderPipeline,
}

impl Render {
  #[must_use]
  pub fn init(
    config: &wgpu::SurfaceConfiguration,
    device: &wgpu::Device,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
    scene: Scene,
  ) -> Self {
    let format = config.view_formats.first().copied().unwrap_or(config.format);
    let body_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
      label: Some("bodies"),
      source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("shaders/bodies.wgsl"))),
    });
    let orbit_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
      label: Some("orbits"),
      source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("shaders/orbits.wgsl"))),
    });
    let star_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
      label: Some("stars"),
      source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("shaders/stars.wgsl"))),
    });

    let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
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
      label: Some("uniform_bind_group_layout"),
    });

    // ========================================================================
    // bodies
    // ========================================================================

    let light_buffer = device.create_buffer(&wgpu::BufferDescriptor {
      label: Some("Light Buffer"),
      size: std::mem::size_of::<LightUniform>() as wgpu::BufferAddress,
      usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
      mapped_at_creation: false,
    });
    let light_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
      layout: &uniform_layout,
      entries: &[wgpu::BindGroupEntry {
        binding: 0,
        resource: light_buffer.as_entire_binding(),
      }],
      label: Some("light_bind_group"),
    });
    let sphere_vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Sphere Vertex Buffer"),
      contents: bytemuck::cast_slice(&scene.sphere.vertices),
      usage: wgpu::BufferUsages::VERTEX,
    });
    let sphere_indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Sphere Index Buffer"),
      contents: bytemuck::cast_slice(&scene.sphere.indices),
      usage: wgpu::BufferUsages::INDEX,
    });
    let body_buffer = device.create_buffer(&wgpu::BufferDescriptor {
      label: Some("Body Instance Buffer"),
      size: (std::mem::size_of::<BodyInstance>() * BODY_COUNT) as wgpu::BufferAddress,
      usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
      mapped_at_creation: false,
    });

    let lit_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
      label: Some("lit"),
      bind_group_layouts: &[camera_bind_group_layout, &uniform_layout],
      push_constant_ranges: &[],
    });
    let mesh_buffer = wgpu::VertexBufferLayout {
      array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
      step_mode: wgpu::VertexStepMode::Vertex,
      attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3],
    };
    let instance_buffer = wgpu::VertexBufferLayout {
      array_stride: std::mem::size_of::<BodyInstance>() as wgpu::BufferAddress,
      step_mode: wgpu::VertexStepMode::Instance,
      attributes: &wgpu::vertex_attr_array![
        2 => Float32x4, 3 => Float32x4, 4 => Float32x4, 5 => Float32x4,
        6 => Float32x4, 7 => Float32x4
      ],
    };
    let body_pipeline = create_pipeline(
      device,
      &lit_layout,
      format,
      PipelineDesc {
        label: "Body Pipeline",
        shader: &body_shader,
        buffers: &[mesh_buffer, instance_buffer],
        topology: wgpu::PrimitiveTopology::TriangleList,
        blend: Some(wgpu::BlendState::REPLACE),
        depth_write: true,
      },
    );

    // ========================================================================
    // orbit guides
    // ========================================================================

    let orbit_vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Orbit Vertex Buffer"),
      contents: bytemuck::cast_slice(&scene.orbits),
      usage: wgpu::BufferUsages::VERTEX,
    });
    let flat_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
      label: Some("flat"),
      bind_group_layouts: &[camera_bind_group_layout],
      push_constant_ranges: &[],
    });
    let line_buffer = wgpu::VertexBufferLayout {
      array_stride: std::mem::size_of::<LineVertex>() as wgpu::BufferAddress,
      step_mode: wgpu::VertexStepMode::Vertex,
      attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x4],
    };
    let orbit_pipeline = create_pipeline(
      device,
      &flat_layout,
      format,
      PipelineDesc {
        label: "Orbit Pipeline",
        shader: &orbit_shader,
        buffers: &[line_buffer],
        topology: wgpu::PrimitiveTopology::LineList,
        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
        depth_write: false,
      },
    );

    // ========================================================================
    // starfield
    // ========================================================================

    let star_layers = scene
      .star_layers
      .iter()
      .enumerate()
      .map(|(i, layer)| {
        let instances = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
          label: Some(&format!("Star Layer {i}")),
          contents: bytemuck::cast_slice(&layer.stars),
          usage: wgpu::BufferUsages::VERTEX,
        });
        let uniform = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
          label: Some(&format!("Star Layer Uniform {i}")),
          contents: bytemuck::bytes_of(&StarLayerUniform {
            rotation: Matrix4::from_angle_y(Rad(0.0f32)).into(),
            params: [layer.size, layer.opacity, 0.0, 0.0],
          }),
          usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
          layout: &uniform_layout,
          entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: uniform.as_entire_binding(),
          }],
          label: None,
        });
        StarLayerGpu {
          instances,
          count: layer.stars.len() as u32,
          size: layer.size,
          opacity: layer.opacity,
          uniform,
          bind_group,
        }
      })
      .collect();
    let star_buffer = wgpu::VertexBufferLayout {
      array_stride: std::mem::size_of::<Star>() as wgpu::BufferAddress,
      step_mode: wgpu::VertexStepMode::Instance,
      attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3],
    };
    let star_pipeline = create_pipeline(
      device,
      &lit_layout,
      format,
      PipelineDesc {
        label: "Star Pipeline",
        shader: &star_shader,
        buffers: &[star_buffer],
        topology: wgpu::PrimitiveTopology::TriangleList,
        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
        depth_write: false,
      },
    );

    Render {
      depth_view: create_depth_view(device, config),
      lights: scene.lights,
      light_buffer,
      light_bind_group,
      sphere_vertices,
      sphere_indices,
      sphere_index_count: scene.sphere.indices.len() as u32,
      body_buffer,
      body_pipeline,
      orbit_vertices,
      orbit_vertex_count: scene.orbits.len() as u32,
      orbit_pipeline,
      star_layers,
      star_pipeline,
    }
  }

  pub fn resize(&mut self, device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) {
    self.depth_view = create_depth_view(device, config);
  }

  /// Uploads this frame's body transforms, light occluders and layer rotations.
  pub fn update(&self, queue: &wgpu::Queue, sim: &SimulationState) {
    let instances = body_instances(sim, self.lights.shadows);
    queue.write_buffer(&self.body_buffer, 0, bytemuck::cast_slice(&instances));
    queue.write_buffer(
      &self.light_buffer,
      0,
      bytemuck::bytes_of(&light_uniform(&self.lights, sim)),
    );
    for (layer, rotation) in self.star_layers.iter().zip(sim.star_rotations) {
      let uniform = StarLayerUniform {
        rotation: Matrix4::from_angle_y(Rad(rotation)).into(),
        params: [layer.size, layer.opacity, 0.0, 0.0],
      };
      queue.write_buffer(&layer.uniform, 0, bytemuck::bytes_of(&uniform));
    }
  }

  pub fn render(
    &self,
    view: &wgpu::TextureView,
    encoder: &mut wgpu::CommandEncoder,
    camera_bind_group: &wgpu::BindGroup,
    background: [f32; 3],
  ) {
    let [r, g, b] = background;
    let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
      label: Some("scene"),
      color_attachments: &[Some(wgpu::RenderPassColorAttachment {
        view,
        resolve_target: None,
        ops: wgpu::Operations {
          load: wgpu::LoadOp::Clear(wgpu::Color {
            r: f64::from(r),
            g: f64::from(g),
            b: f64::from(b),
            a: 1.0,
          }),
          store: wgpu::StoreOp::Store,
        },
      })],
      depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
        view: &self.depth_view,
        depth_ops: Some(wgpu::Operations {
          load: wgpu::LoadOp::Clear(1.0),
          store: wgpu::StoreOp::Store,
        }),
        stencil_ops: None,
      }),
      timestamp_writes: None,
      occlusion_query_set: None,
    });

    rpass.set_pipeline(&self.body_pipeline);
    rpass.set_bind_group(0, camera_bind_group, &[]);
    rpass.set_bind_group(1, &self.light_bind_group, &[]);
    rpass.set_vertex_buffer(0, self.sphere_vertices.slice(..));
    rpass.set_vertex_buffer(1, self.body_buffer.slice(..));
    rpass.set_index_buffer(self.sphere_indices.slice(..), wgpu::IndexFormat::Uint16);
    rpass.draw_indexed(0..self.sphere_index_count, 0, 0..BODY_COUNT as u32);

    rpass.set_pipeline(&self.star_pipeline);
    for layer in &self.star_layers {
      rpass.set_bind_group(1, &layer.bind_group, &[]);
      rpass.set_vertex_buffer(0, layer.instances.slice(..));
      rpass.draw(0..6, 0..layer.count);
    }

    rpass.set_pipeline(&self.orbit_pipeline);
    rpass.set_vertex_buffer(0, self.orbit_vertices.slice(..));
    rpass.draw(0..self.orbit_vertex_count, 0..1);
  }
}
