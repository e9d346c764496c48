//! Glint renderer - interactive CPU path tracing.
//!
//! A Monte Carlo path tracer over spheres and triangles, accelerated by a
//! BVH, with a render controller that fills a shared frame buffer
//! progressively and can be cancelled mid-frame.

mod batch;
mod bvh;
mod camera;
mod controller;
mod framebuffer;
mod hittable;
mod material;
mod renderer;
mod settings;
mod sphere;
mod triangle;
mod world;

pub use batch::{generate_batches, PixelBatch, DEFAULT_BATCH_SIZE};
pub use bvh::{Bvh, BvhChild};
pub use camera::{Camera, Movement};
pub use controller::{
    FrameUpdate, RenderController, RenderError, RenderResult, RenderState,
    DEFAULT_REPAINT_INTERVAL, WIREFRAME_COEFFICIENT,
};
pub use framebuffer::{FrameBuffer, BLACK, WHITE};
pub use hittable::{HitRecord, LineSegment, Primitive};
pub use material::{Material, ScatterResult};
pub use renderer::{
    color_to_argb, linear_to_gamma, ray_color, render, render_pixel, sky_gradient, PathTracer,
    PixelShader, SceneShader, DEFAULT_MAX_DEPTH, T_MIN,
};
pub use settings::{RenderSettings, SettingsError, SettingsResult};
pub use sphere::Sphere;
pub use triangle::Triangle;
pub use world::{SceneError, SceneResult, World};

/// Re-export the math types used throughout the public API
pub use glint_math::{Aabb, Color, Interval, Point3, Ray, Vec3};
