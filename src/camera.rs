use crate::picking::Ray;
use crate::CameraParams;
use cgmath::{EuclideanSpace, InnerSpace, Point3, SquareMatrix, Vector3};
use std::f32::consts::PI;
use winit::{
  dpi::PhysicalPosition,
  event::{ElementState, MouseScrollDelta, WindowEvent},
  window::CursorIcon,
};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

pub struct Camera {
  pub eye: Point3<f32>,
  pub target: Point3<f32>,
  pub up: Vector3<f32>,
  pub aspect: f32,
  pub fovy: f32,
  pub znear: f32,
  pub zfar: f32,
}

impl Camera {
  pub fn new(params: &CameraParams, aspect: f32) -> Self {
    Self {
      eye: params.eye.into(),
      target: Point3::origin(),
      up: Vector3::unit_y(),
      aspect,
      fovy: params.fovy,
      znear: params.znear,
      zfar: params.zfar,
    }
  }

  fn build_view_projection_matrix(&self) -> cgmath::Matrix4<f32> {
    let view = cgmath::Matrix4::look_at_rh(self.eye, self.target, self.up);
    let proj = cgmath::perspective(cgmath::Deg(self.fovy), self.aspect, self.znear, self.zfar);
    OPENGL_TO_WGPU_MATRIX * proj * view
  }

  /// Orthonormal `(forward, right, up)` of the view.
  pub fn basis(&self) -> (Vector3<f32>, Vector3<f32>, Vector3<f32>) {
    let forward = (self.target - self.eye).normalize();
    let right = forward.cross(self.up).normalize();
    let up = right.cross(forward);
    (forward, right, up)
  }

  pub fn distance(&self) -> f32 {
    (self.eye - self.target).magnitude()
  }

  /// Ray from the eye through a point given in normalized device coordinates.
  pub fn ray_through(&self, ndc_x: f32, ndc_y: f32) -> Ray {
    let (forward, right, up) = self.basis();
    let half_height = (cgmath::Rad::from(cgmath::Deg(self.fovy)).0 * 0.5).tan();
    let half_width = half_height * self.aspect;
    let direction = forward + right * (ndc_x * half_width) + up * (ndc_y * half_height);
    Ray::new(self.eye, direction)
  }
}

/// Converts a pixel position in a `width` x `height` viewport into NDC.
pub fn to_ndc(x: f32, y: f32, width: f32, height: f32) -> (f32, f32) {
  ((x / width) * 2.0 - 1.0, -(y / height) * 2.0 + 1.0)
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
  view_proj: [[f32; 4]; 4],
  right: [f32; 4],
  up: [f32; 4],
}

impl CameraUniform {
  pub fn new() -> Self {
    Self {
      view_proj: cgmath::Matrix4::identity().into(),
      right: [1.0, 0.0, 0.0, 0.0],
      up: [0.0, 1.0, 0.0, 0.0],
    }
  }

  pub fn update_view_proj(&mut self, camera: &Camera) {
    self.view_proj = camera.build_view_projection_matrix().into();
    let (_, right, up) = camera.basis();
    self.right = right.extend(0.0).into();
    self.up = up.extend(0.0).into();
  }
}

impl Default for CameraUniform {
  fn default() -> Self {
    Self::new()
  }
}

/// Radius, polar angle from +Y and azimuth around Y measured from +Z.
#[derive(Copy, Clone, Debug)]
pub struct Spherical {
  pub radius: f32,
  pub phi: f32,
  pub theta: f32,
}

impl Spherical {
  pub fn from_vector(v: Vector3<f32>) -> Self {
    let radius = v.magnitude();
    if radius == 0.0 {
      return Self {
        radius,
        phi: 0.0,
        theta: 0.0,
      };
    }
    Self {
      radius,
      phi: (v.y / radius).clamp(-1.0, 1.0).acos(),
      theta: v.x.atan2(v.z),
    }
  }

  pub fn to_vector(self) -> Vector3<f32> {
    let ring = self.radius * self.phi.sin();
    Vector3::new(
      ring * self.theta.sin(),
      self.radius * self.phi.cos(),
      ring * self.theta.cos(),
    )
  }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum InputOutcome {
  Ignored,
  Consumed,
  /// Pointer moved without a button held; a candidate for picking.
  Hover { x: f32, y: f32 },
  Left,
}

/// One input step, replayed against the camera in arrival order.
#[derive(Copy, Clone, Debug, PartialEq)]
enum CameraMove {
  Orbit { dx: f32, dy: f32 },
  Zoom(f32),
}

pub struct CameraController {
  drag_sensitivity: f32,
  zoom_sensitivity: f32,
  min_distance: f32,
  max_distance: f32,
  polar_margin: f32,
  wheel_line_px: f32,
  is_dragging: bool,
  is_outside: bool,
  last_cursor: Option<(f32, f32)>,
  pending: Vec<CameraMove>,
}

impl CameraController {
  pub fn init(params: &CameraParams) -> Self {
    Self {
      drag_sensitivity: params.drag_sensitivity,
      zoom_sensitivity: params.zoom_sensitivity,
      min_distance: params.min_distance,
      max_distance: params.max_distance,
      polar_margin: params.polar_margin,
      wheel_line_px: params.wheel_line_px,
      is_dragging: false,
      is_outside: false,
      last_cursor: None,
      pending: Vec::new(),
    }
  }

  pub fn is_dragging(&self) -> bool {
    self.is_dragging
  }

  pub fn cursor_icon(&self) -> CursorIcon {
    if self.is_dragging {
      CursorIcon::Grabbing
    } else if self.is_outside {
      CursorIcon::Default
    } else {
      CursorIcon::Grab
    }
  }

  pub fn process_events(&mut self, event: &WindowEvent) -> InputOutcome {
    match event {
      WindowEvent::MouseInput { state, .. } => {
        match state {
          ElementState::Pressed => self.press(),
          ElementState::Released => self.release(),
        }
        InputOutcome::Consumed
      }
      WindowEvent::CursorMoved { position, .. } => {
        let PhysicalPosition { x, y } = *position;
        self.cursor_moved(x as f32, y as f32)
      }
      WindowEvent::CursorEntered { .. } => {
        self.is_outside = false;
        InputOutcome::Consumed
      }
      WindowEvent::CursorLeft { .. } => self.leave(),
      WindowEvent::MouseWheel { delta, .. } => {
        let pixels = match delta {
          // winit reports scrolling up as positive; scrolling up zooms in.
          MouseScrollDelta::LineDelta(_, y) => -y * self.wheel_line_px,
          MouseScrollDelta::PixelDelta(pos) => -pos.y as f32,
        };
        self.wheel(pixels);
        InputOutcome::Consumed
      }
      _ => InputOutcome::Ignored,
    }
  }

  pub fn press(&mut self) {
    self.is_dragging = true;
  }

  pub fn release(&mut self) {
    self.is_dragging = false;
  }

  pub fn cursor_moved(&mut self, x: f32, y: f32) -> InputOutcome {
    self.is_outside = false;
    let last = self.last_cursor.replace((x, y));
    if !self.is_dragging {
      return InputOutcome::Hover { x, y };
    }
    if let Some((lx, ly)) = last {
      self.pending.push(CameraMove::Orbit {
        dx: x - lx,
        dy: y - ly,
      });
    }
    InputOutcome::Consumed
  }

  pub fn leave(&mut self) -> InputOutcome {
    self.is_dragging = false;
    self.is_outside = true;
    self.last_cursor = None;
    InputOutcome::Left
  }

  /// Queues a zoom step, `delta_y` in pixels with positive meaning "zoom out".
  pub fn wheel(&mut self, delta_y: f32) {
    self.pending.push(CameraMove::Zoom(delta_y));
  }

  /// Applies every queued drag and wheel step, each with its own clamp.
  pub fn update_camera(&mut self, camera: &mut Camera) {
    for step in std::mem::take(&mut self.pending) {
      match step {
        CameraMove::Orbit { dx, dy } => self.orbit(camera, dx, dy),
        CameraMove::Zoom(delta_y) => self.zoom(camera, delta_y),
      }
    }
  }

  pub fn orbit(&self, camera: &mut Camera, dx: f32, dy: f32) {
    let mut spherical = Spherical::from_vector(camera.eye - camera.target);
    spherical.theta -= dx * self.drag_sensitivity;
    spherical.phi = (spherical.phi + dy * self.drag_sensitivity)
      .clamp(self.polar_margin, PI - self.polar_margin);
    camera.eye = camera.target + spherical.to_vector();
  }

  pub fn zoom(&self, camera: &mut Camera, delta_y: f32) {
    let offset = camera.eye - camera.target;
    let distance = offset.magnitude() * (1.0 + delta_y * self.zoom_sensitivity);
    let distance = distance.clamp(self.min_distance, self.max_distance);
    camera.eye = camera.target + offset.normalize() * distance;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn setup() -> (Camera, CameraController) {
    let params = CameraParams::default();
    (Camera::new(&params, 16.0 / 9.0), CameraController::init(&params))
  }

  fn polar(camera: &Camera) -> f32 {
    Spherical::from_vector(camera.eye - camera.target).phi
  }

  #[test]
  fn spherical_round_trips_start_position() {
    let v = Vector3::new(30.0, 30.0, 30.0);
    let back = Spherical::from_vector(v).to_vector();
    assert!((back - v).magnitude() < 1e-3);
  }

  #[test]
  fn drag_moves_azimuth_and_polar_by_sensitivity() {
    let (mut camera, mut controller) = setup();
    let before = Spherical::from_vector(camera.eye.to_vec());

    controller.press();
    controller.cursor_moved(200.0, 200.0);
    controller.cursor_moved(300.0, 250.0);
    controller.update_camera(&mut camera);

    let after = Spherical::from_vector(camera.eye.to_vec());
    assert!((after.theta - (before.theta - 1.0)).abs() < 1e-4);
    assert!((after.phi - (before.phi + 0.5)).abs() < 1e-4);
    assert!((after.radius - before.radius).abs() < 1e-3);
  }

  #[test]
  fn polar_angle_stays_clear_of_poles() {
    let (mut camera, controller) = setup();
    for _ in 0..50 {
      controller.orbit(&mut camera, 13.0, 400.0);
      let phi = polar(&camera);
      assert!(phi <= PI - 0.1 + 1e-4, "phi = {phi}");
    }
    for _ in 0..50 {
      controller.orbit(&mut camera, -7.0, -400.0);
      let phi = polar(&camera);
      assert!(phi >= 0.1 - 1e-4, "phi = {phi}");
    }
  }

  #[test]
  fn zoom_is_multiplicative_and_clamped() {
    let (mut camera, controller) = setup();
    let start = camera.distance();
    controller.zoom(&mut camera, 10.0);
    assert!((camera.distance() - start * 1.1).abs() < 1e-3);

    for delta in [500.0, -90.0, 3000.0, -99.0, -500.0, 42.0, -1e6] {
      controller.zoom(&mut camera, delta);
      let d = camera.distance();
      assert!((15.0 - 1e-3..=100.0 + 1e-3).contains(&d), "distance = {d}");
    }
  }

  #[test]
  fn wheel_steps_in_one_frame_compound() {
    let (mut camera, mut controller) = setup();
    let start = camera.distance();
    controller.wheel(20.0);
    controller.wheel(20.0);
    controller.update_camera(&mut camera);
    assert!((camera.distance() - start * 1.2 * 1.2).abs() < 1e-3);
  }

  #[test]
  fn drag_clamps_after_every_move_in_a_frame() {
    let (mut camera, mut controller) = setup();
    controller.press();
    controller.cursor_moved(100.0, 100.0);
    controller.cursor_moved(100.0, 400.0);
    controller.cursor_moved(100.0, 100.0);
    controller.update_camera(&mut camera);
    // down 300px stops at PI - 0.1; the 3 rad back up then overshoots and stops at 0.1
    assert!((polar(&camera) - 0.1).abs() < 1e-4, "phi = {}", polar(&camera));
  }

  #[test]
  fn idle_move_hovers_and_drag_does_not() {
    let (_, mut controller) = setup();
    assert_eq!(
      controller.cursor_moved(10.0, 20.0),
      InputOutcome::Hover { x: 10.0, y: 20.0 }
    );
    controller.press();
    assert_eq!(controller.cursor_moved(15.0, 20.0), InputOutcome::Consumed);
  }

  #[test]
  fn cursor_icon_follows_drag_and_leave() {
    let (_, mut controller) = setup();
    assert_eq!(controller.cursor_icon(), CursorIcon::Grab);
    controller.press();
    assert_eq!(controller.cursor_icon(), CursorIcon::Grabbing);
    assert_eq!(controller.leave(), InputOutcome::Left);
    assert!(!controller.is_dragging());
    assert_eq!(controller.cursor_icon(), CursorIcon::Default);
    controller.cursor_moved(1.0, 1.0);
    assert_eq!(controller.cursor_icon(), CursorIcon::Grab);
  }

  #[test]
  fn center_ray_points_at_target() {
    let (camera, _) = setup();
    let ray = camera.ray_through(0.0, 0.0);
    let to_target = (camera.target - camera.eye).normalize();
    assert!((ray.direction - to_target).magnitude() < 1e-5);
  }

  #[test]
  fn ndc_maps_corners() {
    assert_eq!(to_ndc(0.0, 0.0, 800.0, 600.0), (-1.0, 1.0));
    assert_eq!(to_ndc(800.0, 600.0, 800.0, 600.0), (1.0, -1.0));
    assert_eq!(to_ndc(400.0, 300.0, 800.0, 600.0), (0.0, 0.0));
  }
}
