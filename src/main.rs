use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use softraster::color::{color_to_alpha, merge_colors, rgba_to_color};
use softraster::math::{self, Axis};
use softraster::{
    Camera, ContextConfig, GeometryLoader, Mesh, Mode, Modes, Projection, RenderContext, Texture,
    TextureId, Vec3, Vec4, VertexCN, VertexCNT,
};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// softraster - CPU triangle rasterizer demo
#[derive(Parser, Debug)]
#[command(
    name = "softraster",
    version,
    about = "Renders a rotating sphere or an STL model to PNG files without a GPU"
)]
struct Args {
    /// Image width in pixels
    #[arg(long, default_value_t = 1024)]
    width: u32,

    /// Image height in pixels
    #[arg(long, default_value_t = 768)]
    height: u32,

    /// Output image; with several frames a frame number is appended to the file stem
    #[arg(short, long, default_value = "frame.png")]
    output: PathBuf,

    /// Number of frames to render
    #[arg(short = 'n', long, default_value_t = 1)]
    frames: u32,

    /// Rotation of the model about the Y axis between frames, degrees
    #[arg(long, default_value_t = 5.0)]
    step: f32,

    /// STL model to render instead of the sphere
    #[arg(long)]
    stl: Option<PathBuf>,

    /// Convert the STL model from Z-up to Y-up
    #[arg(long)]
    z_up: bool,

    /// Subdivision depth of the sphere
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u32).range(0..=7))]
    sphere: u32,

    /// Texture image (power-of-two dimensions); a procedural texture is used if omitted
    #[arg(short, long)]
    texture: Option<PathBuf>,

    /// Texture color (hex RRGGBB) to turn translucent
    #[arg(long, value_parser = parse_hex_color)]
    alpha_key: Option<Vec3>,

    /// Camera distance from the origin
    #[arg(long, default_value_t = 2.5)]
    distance: f32,

    /// Camera heading, degrees
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    heading: f32,

    /// Camera pitch, degrees
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pitch: f32,

    /// Vertical field of view, degrees
    #[arg(long, default_value_t = 30.0)]
    fov: f32,

    /// Near clip distance
    #[arg(long, default_value_t = 0.01)]
    near: f32,

    /// Far clip distance
    #[arg(long, default_value_t = 100.0)]
    far: f32,

    /// Ambient light fraction
    #[arg(long, default_value_t = 0.2)]
    ambient: f32,

    /// Disable lighting
    #[arg(long)]
    no_lighting: bool,

    /// Disable texturing
    #[arg(long)]
    no_texture: bool,

    /// Enable alpha blending
    #[arg(long)]
    blend: bool,

    /// Interpolate vertex colors
    #[arg(long)]
    smooth: bool,

    /// Draw back faces too
    #[arg(long)]
    back_faces: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

enum Model {
    Sphere(Mesh<VertexCNT>),
    Stl(Mesh<VertexCN>),
}

impl Model {
    fn triangle_count(&self) -> usize {
        match self {
            Model::Sphere(mesh) => mesh.triangle_count(),
            Model::Stl(mesh) => mesh.triangle_count(),
        }
    }

    fn draw(&self, ctx: &mut RenderContext) {
        match self {
            Model::Sphere(mesh) => ctx.draw_mesh(mesh),
            Model::Stl(mesh) => ctx.draw_mesh(mesh),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .init();

    let mut modes: Modes = [Mode::FrontFace, Mode::DepthWrite, Mode::DepthTest]
        .into_iter()
        .collect();
    modes.set(Mode::BackFace, args.back_faces);
    modes.set(Mode::Lighting, !args.no_lighting);
    modes.set(Mode::Texturing, !args.no_texture);
    modes.set(Mode::Blending, args.blend);
    modes.set(Mode::Smooth, args.smooth);

    let mut ctx = RenderContext::with_config(
        ContextConfig::new()
            .size(args.width, args.height)
            .clear_color(Vec4::new(0.5, 0.75, 1.0, 1.0))
            .ambient(args.ambient)
            .modes(modes),
    );

    let camera = Camera::orbiting(
        Vec3::ZERO,
        args.distance,
        args.heading.to_radians(),
        args.pitch.to_radians(),
    );
    ctx.set_camera(camera.matrix())
        .context("Camera matrix is not invertible")?;
    // headlight
    ctx.set_light(-camera.forward());

    let aspect = args.width as f32 / args.height.max(1) as f32;
    let projection = Projection::new()
        .with_fov(args.fov)
        .clip(args.near, args.far);
    ctx.set_projection(projection.matrix(aspect));

    if !args.no_texture {
        let id = load_texture(&mut ctx, &args)?;
        ctx.set_tex(id);
    }

    let model = match &args.stl {
        Some(path) => {
            let mut loader = GeometryLoader::from_file(path).centered();
            if args.z_up {
                loader = loader.upright();
            }
            if args.smooth {
                loader = loader.smooth_normals();
            }
            let mesh = loader
                .normalized()
                .scaled(2.0)
                .build()
                .with_context(|| format!("Failed to load model: {}", path.display()))?;
            Model::Stl(mesh)
        }
        None => Model::Sphere(Mesh::sphere(args.sphere)),
    };
    info!(
        "Rendering {} triangles at {}x{}",
        model.triangle_count(),
        args.width,
        args.height
    );

    let mut total = 0.0;
    for frame in 0..args.frames {
        let angle = (args.step * frame as f32).to_radians();
        ctx.set_model(math::rotation_about(Axis::Y, angle));

        let start = Instant::now();
        ctx.clear(true, true);
        model.draw(&mut ctx);
        let dt = start.elapsed().as_secs_f64();
        total += dt;

        let path = frame_path(&args.output, frame, args.frames);
        ctx.save_image(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(
            "Frame {}: {:.3} ms -> {}",
            frame,
            dt * 1e3,
            path.display()
        );
    }

    let stats = ctx.stats();
    info!(
        "{} triangles submitted, {} culled, {} clipped away, {} rasterized",
        stats.submitted, stats.culled, stats.clipped_away, stats.rasterized
    );
    if args.frames > 0 {
        info!(
            "Average {:.3} ms per frame ({:.0} fps)",
            total * 1e3 / args.frames as f64,
            args.frames as f64 / total.max(f64::EPSILON)
        );
    }

    Ok(())
}

/// Loads the texture given on the command line, or a procedural one.
fn load_texture(ctx: &mut RenderContext, args: &Args) -> Result<TextureId> {
    let texture = match &args.texture {
        Some(path) => {
            // flip so that texel row 0 is the bottom of the image
            let img = image::open(path)
                .with_context(|| format!("Failed to open texture: {}", path.display()))?
                .flipv()
                .to_rgba8();
            Texture::from_image(&img)
                .with_context(|| format!("Unusable texture: {}", path.display()))?
        }
        None => Texture::noise(256, 7).context("Failed to generate texture")?,
    };

    let mut texels = texture.texels().to_vec();
    if let Some(key) = args.alpha_key {
        let mut keyed = texels.clone();
        color_to_alpha(&mut keyed, key, 100.0);
        // halve the effect
        merge_colors(&mut texels, texture.texels(), &keyed, 0.5, 0.5);
    }

    info!("Texture: {}x{}", texture.width(), texture.height());
    Ok(ctx.load_tex(texture.width(), texture.height(), &texels))
}

fn frame_path(output: &Path, frame: u32, frames: u32) -> PathBuf {
    if frames <= 1 {
        return output.to_path_buf();
    }
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".to_string());
    let ext = output
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "png".to_string());
    output.with_file_name(format!("{}-{:03}.{}", stem, frame, ext))
}

fn parse_hex_color(s: &str) -> Result<Vec3, String> {
    let hex = s.trim_start_matches('#');
    if hex.len() != 6 {
        return Err(format!("expected RRGGBB, got '{}'", s));
    }
    let value = u32::from_str_radix(hex, 16).map_err(|e| e.to_string())?;
    // RRGGBB to packed ABGR
    let packed = (value >> 16 & 0xff) | (value & 0xff00) | (value & 0xff) << 16;
    Ok(rgba_to_color(packed).truncate())
}
