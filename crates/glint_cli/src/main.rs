use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use glint_math::Vec3;
use glint_renderer::{
    Camera, FrameBuffer, FrameUpdate, Movement, PathTracer, RenderController, RenderSettings,
    RenderState, World,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Movement command applied to the camera before rendering.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Direction {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

impl From<Direction> for Movement {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Forward => Movement::Forward,
            Direction::Backward => Movement::Backward,
            Direction::Left => Movement::Left,
            Direction::Right => Movement::Right,
            Direction::Up => Movement::Up,
            Direction::Down => Movement::Down,
        }
    }
}

#[derive(Parser)]
#[command(name = "glint")]
#[command(version)]
#[command(about = "Render the random sphere scene with a progressive path tracer")]
struct Cli {
    /// JSON settings file; missing fields take defaults
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output PNG
    #[arg(short, long, default_value = "render.png")]
    output: PathBuf,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Samples per pixel
    #[arg(long)]
    spp: Option<u32>,

    #[arg(long)]
    max_depth: Option<u32>,

    /// Vertical field of view in degrees
    #[arg(long)]
    fov: Option<f64>,

    #[arg(long)]
    aperture: Option<f64>,

    #[arg(long)]
    focus_distance: Option<f64>,

    #[arg(long)]
    batch_size: Option<usize>,

    /// Distance covered by each --move
    #[arg(long)]
    movement_speed: Option<f64>,

    /// Minimum milliseconds between progress previews
    #[arg(long = "repaint-ms")]
    repaint_interval_ms: Option<u64>,

    /// Draw object edges instead of path tracing
    #[arg(long)]
    wireframe: bool,

    /// Yaw delta in radians
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    yaw: f64,

    /// Pitch delta in radians
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pitch: f64,

    /// Camera moves, applied in order (repeatable)
    #[arg(long = "move", value_enum, value_name = "DIRECTION")]
    moves: Vec<Direction>,

    /// Object id to move before rendering (see --list-objects)
    #[arg(long, requires = "offset")]
    translate: Option<String>,

    /// Offset for --translate
    #[arg(long, value_delimiter = ',', value_name = "X,Y,Z", allow_hyphen_values = true)]
    offset: Vec<f64>,

    /// Seed for scene generation
    #[arg(long)]
    seed: Option<u64>,

    /// Worker threads (0 = one per core)
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Print object ids and exit
    #[arg(long)]
    list_objects: bool,
}

impl Cli {
    fn settings(&self) -> Result<RenderSettings> {
        let mut settings = match &self.config {
            Some(path) => RenderSettings::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => RenderSettings::default(),
        };

        if let Some(width) = self.width {
            settings.width = width;
        }
        if let Some(height) = self.height {
            settings.height = height;
        }
        if let Some(spp) = self.spp {
            settings.samples_per_pixel = spp;
        }
        if let Some(max_depth) = self.max_depth {
            settings.max_depth = max_depth;
        }
        if let Some(fov) = self.fov {
            settings.fov = fov;
        }
        if let Some(aperture) = self.aperture {
            settings.aperture = aperture;
        }
        if let Some(focus_distance) = self.focus_distance {
            settings.focus_distance = focus_distance;
        }
        if let Some(batch_size) = self.batch_size {
            settings.batch_size = batch_size;
        }
        if let Some(movement_speed) = self.movement_speed {
            settings.movement_speed = movement_speed;
        }
        if let Some(repaint_interval_ms) = self.repaint_interval_ms {
            settings.repaint_interval_ms = repaint_interval_ms;
        }

        settings.validate()?;
        Ok(settings)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    let settings = cli.settings()?;

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let world = World::random_scene(&mut rng);

    if cli.list_objects {
        for id in world.list_ids() {
            println!("{id}");
        }
        return Ok(());
    }

    let mut camera = Camera::default();
    let mut tracer = PathTracer::new(world);
    let mut controller = RenderController::with_threads(cli.threads)?;
    settings.apply(&mut camera, &mut tracer, &mut controller)?;
    controller.set_wireframe(cli.wireframe);

    for &direction in &cli.moves {
        camera.step(direction.into());
    }
    camera.rotate(cli.yaw, cli.pitch);

    if let Some(id) = &cli.translate {
        let &[x, y, z] = cli.offset.as_slice() else {
            bail!("--offset takes exactly three components, got {:?}", cli.offset);
        };
        let offset = Vec3::new(x, y, z);
        tracer
            .world_mut()
            .translate_by_id(id, offset)
            .with_context(|| format!("translating {id}"))?;
        log::info!("Moved {id} by {offset}");
    }

    log::info!(
        "Rendering {}x{} at {} spp on {} threads{}",
        settings.width,
        settings.height,
        settings.samples_per_pixel,
        controller.num_threads(),
        if cli.wireframe { " (wireframe)" } else { "" }
    );

    let buffer = Arc::new(FrameBuffer::new(settings.width, settings.height));
    let previews = Arc::new(AtomicUsize::new(0));
    let preview_count = Arc::clone(&previews);

    controller.render_image(&buffer, &tracer, &camera, move |update| match update {
        FrameUpdate::Progress => {
            let n = preview_count.fetch_add(1, Ordering::Relaxed) + 1;
            log::debug!("Preview {n} ready");
        }
        FrameUpdate::Complete => log::debug!("Frame complete"),
    })?;
    controller.wait();

    if controller.state() != RenderState::Completed {
        bail!("render ended in state {:?}", controller.state());
    }
    log::info!("{} progressive previews", previews.load(Ordering::Relaxed));

    let image = image::RgbaImage::from_raw(buffer.width(), buffer.height(), buffer.to_rgba_bytes())
        .context("frame buffer size does not match its dimensions")?;
    image
        .save(&cli.output)
        .with_context(|| format!("writing {}", cli.output.display()))?;

    log::info!("Saved {}", cli.output.display());
    Ok(())
}
