//! Progressive, cancellable render scheduling.
//!
//! A render job runs on its own driver thread. The driver walks shuffled
//! pixel batches and shades each batch in parallel on a rayon pool; the
//! batch is the join point where progress is reported and cancellation is
//! noticed.
//!
//! Cancellation is a generation counter. Starting or cancelling a render
//! bumps it, and a job only writes a pixel while the counter still holds
//! the value it captured at start. Stale jobs wind down on their own and
//! are joined later.

use crate::batch::{generate_batches, DEFAULT_BATCH_SIZE};
use crate::framebuffer::{BLACK, WHITE};
use crate::renderer::{color_to_argb, PixelShader, SceneShader};
use crate::{Camera, FrameBuffer, PathTracer, World};
use rayon::prelude::*;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Default minimum time between progress callbacks.
pub const DEFAULT_REPAINT_INTERVAL: Duration = Duration::from_millis(50);

/// Subdivision coefficient used when linearizing objects for wireframe.
pub const WIREFRAME_COEFFICIENT: f64 = 1.0;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to build render thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to spawn render thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("frame buffer is {buffer:?} but camera renders {camera:?}")]
    SizeMismatch {
        buffer: (u32, u32),
        camera: (u32, u32),
    },

    #[error("cannot render an empty {0}x{1} image")]
    EmptyImage(u32, u32),
}

pub type RenderResult<T> = Result<T, RenderError>;

/// Lifecycle of the most recent render job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RenderState {
    Idle = 0,
    Rendering = 1,
    Completed = 2,
    Cancelled = 3,
}

impl RenderState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Rendering,
            2 => Self::Completed,
            3 => Self::Cancelled,
            _ => Self::Idle,
        }
    }
}

/// What the presentation layer is told when the buffer changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameUpdate {
    /// A throttled preview; more pixels are coming.
    Progress,
    /// The job finished. Sent exactly once per job that was not superseded.
    Complete,
}

/// Shared state of one job.
#[derive(Debug)]
struct RenderJob {
    generation: u64,
    state: Arc<AtomicU8>,
    handle: Option<JoinHandle<()>>,
}

impl RenderJob {
    fn state(&self) -> RenderState {
        RenderState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Rendering -> `to`. Leaves finished jobs alone.
    fn finish(state: &AtomicU8, to: RenderState) -> bool {
        state
            .compare_exchange(
                RenderState::Rendering as u8,
                to as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

/// Owns the worker pool and the single active render job.
pub struct RenderController {
    pool: Arc<rayon::ThreadPool>,
    generation: Arc<AtomicU64>,
    repaint_interval: Duration,
    batch_size: usize,
    wireframe: bool,
    current: Option<RenderJob>,
    /// Superseded jobs that may still be winding down.
    retired: Vec<JoinHandle<()>>,
}

impl RenderController {
    /// Controller with a pool sized to the available hardware parallelism.
    pub fn new() -> RenderResult<Self> {
        Self::with_threads(0)
    }

    /// Controller with a fixed worker count. Zero lets rayon pick.
    pub fn with_threads(num_threads: usize) -> RenderResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("glint-worker-{i}"))
            .build()?;

        log::debug!("Render pool started with {} threads", pool.current_num_threads());

        Ok(Self {
            pool: Arc::new(pool),
            generation: Arc::new(AtomicU64::new(0)),
            repaint_interval: DEFAULT_REPAINT_INTERVAL,
            batch_size: DEFAULT_BATCH_SIZE,
            wireframe: false,
            current: None,
            retired: Vec::new(),
        })
    }

    /// Render the scene into `buffer`, path traced or as wireframe
    /// depending on the current mode.
    ///
    /// Any running job is cancelled first. Path tracing returns as soon as
    /// the new job is started; wireframe completes before returning.
    pub fn render_image<F>(
        &mut self,
        buffer: &Arc<FrameBuffer>,
        tracer: &PathTracer,
        camera: &Camera,
        on_update: F,
    ) -> RenderResult<()>
    where
        F: FnMut(FrameUpdate) + Send + 'static,
    {
        let buffer_size = (buffer.width(), buffer.height());
        let camera_size = (camera.image_width(), camera.image_height());
        if buffer_size != camera_size {
            return Err(RenderError::SizeMismatch {
                buffer: buffer_size,
                camera: camera_size,
            });
        }

        if self.wireframe {
            self.render_wireframe(buffer, tracer.world(), camera, on_update)
        } else {
            let shader = SceneShader::new(tracer.clone(), camera.clone());
            self.render_with(Arc::clone(buffer), Arc::new(shader), on_update)
        }
    }

    /// Start a progressive render that shades pixels with `shader`.
    pub fn render_with<F>(
        &mut self,
        buffer: Arc<FrameBuffer>,
        shader: Arc<dyn PixelShader>,
        mut on_update: F,
    ) -> RenderResult<()>
    where
        F: FnMut(FrameUpdate) + Send + 'static,
    {
        let (width, height) = (buffer.width(), buffer.height());
        if width == 0 || height == 0 {
            return Err(RenderError::EmptyImage(width, height));
        }

        let generation = self.begin();
        let state = Arc::new(AtomicU8::new(RenderState::Rendering as u8));
        let batches = generate_batches(width, height, self.batch_size, &mut rand::thread_rng());

        let pool = Arc::clone(&self.pool);
        let live = Arc::clone(&self.generation);
        let job_state = Arc::clone(&state);
        let repaint_interval = self.repaint_interval;

        log::debug!(
            "Render {generation} started: {width}x{height}, {} batches",
            batches.len()
        );

        let handle = std::thread::Builder::new()
            .name(format!("glint-render-{generation}"))
            .spawn(move || {
                let start = Instant::now();
                let is_current = || live.load(Ordering::Acquire) == generation;
                let mut last_notify = Instant::now();

                for batch in &batches {
                    if !is_current() {
                        break;
                    }

                    pool.install(|| {
                        batch.pixels.par_iter().for_each(|&(i, j)| {
                            if !is_current() {
                                return;
                            }
                            let color = shader.shade(i, j, &mut rand::thread_rng());
                            if is_current() {
                                buffer.set(i, height - 1 - j, color_to_argb(color));
                            }
                        });
                    });

                    if is_current() && last_notify.elapsed() > repaint_interval {
                        on_update(FrameUpdate::Progress);
                        last_notify = Instant::now();
                    }
                }

                if is_current() && RenderJob::finish(&job_state, RenderState::Completed) {
                    log::info!("Render {generation} completed in {:.2?}", start.elapsed());
                    on_update(FrameUpdate::Complete);
                } else {
                    log::debug!("Render {generation} abandoned after {:.2?}", start.elapsed());
                }
            })?;

        self.current = Some(RenderJob {
            generation,
            state,
            handle: Some(handle),
        });
        Ok(())
    }

    /// Draw every object's edges in white on black and notify once.
    pub fn render_wireframe<F>(
        &mut self,
        buffer: &FrameBuffer,
        world: &World,
        camera: &Camera,
        mut on_update: F,
    ) -> RenderResult<()>
    where
        F: FnMut(FrameUpdate),
    {
        let generation = self.begin();

        buffer.clear(BLACK);
        let mut drawn = 0usize;
        for primitive in world.primitives() {
            for segment in primitive.linearize(WIREFRAME_COEFFICIENT) {
                if let (Some(start), Some(end)) =
                    (camera.project(segment.start), camera.project(segment.end))
                {
                    buffer.draw_line(start, end, WHITE);
                    drawn += 1;
                }
            }
        }

        log::debug!("Wireframe {generation}: {drawn} segments drawn");

        self.current = Some(RenderJob {
            generation,
            state: Arc::new(AtomicU8::new(RenderState::Completed as u8)),
            handle: None,
        });
        on_update(FrameUpdate::Complete);
        Ok(())
    }

    /// Supersede the running job and return the new generation.
    fn begin(&mut self) -> u64 {
        self.cancel();
        self.retired.retain(|handle| !handle.is_finished());
        self.generation.load(Ordering::Acquire)
    }

    /// Cancel the running job, if any. Its in-flight pixels are dropped
    /// and it never reports completion.
    pub fn cancel(&mut self) {
        self.generation.fetch_add(1, Ordering::AcqRel);

        if let Some(mut job) = self.current.take() {
            if RenderJob::finish(&job.state, RenderState::Cancelled) {
                log::debug!("Render {} cancelled", job.generation);
            }
            // Keep the state visible until the next job replaces it
            let handle = job.handle.take();
            self.retired.extend(handle);
            self.current = Some(job);
        }
    }

    /// Block until the current job and every winding-down job have exited.
    pub fn wait(&mut self) {
        let current = self.current.as_mut().and_then(|job| job.handle.take());
        for handle in self.retired.drain(..).chain(current) {
            if handle.join().is_err() {
                log::warn!("Render thread panicked");
            }
        }
    }

    /// State of the most recent job.
    pub fn state(&self) -> RenderState {
        self.current
            .as_ref()
            .map_or(RenderState::Idle, RenderJob::state)
    }

    pub fn is_wireframe(&self) -> bool {
        self.wireframe
    }

    pub fn set_wireframe(&mut self, wireframe: bool) {
        self.wireframe = wireframe;
    }

    /// Flip between path traced and wireframe mode; returns the new mode.
    pub fn toggle_wireframe(&mut self) -> bool {
        self.wireframe = !self.wireframe;
        self.wireframe
    }

    pub fn repaint_interval(&self) -> Duration {
        self.repaint_interval
    }

    pub fn set_repaint_interval(&mut self, interval: Duration) {
        self.repaint_interval = interval;
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn set_batch_size(&mut self, batch_size: usize) {
        self.batch_size = batch_size.max(1);
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl Drop for RenderController {
    fn drop(&mut self) {
        self.cancel();
        self.wait();
    }
}
