mod scene;

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context as _, Result};
use xray_core::{Camera, Context, Instance, MeshGeometry, ObjImporter, SceneNode};
use xray_math::{rotation_then_translation, Vec3};
use xray_renderer::CpuBackend;

use scene::{JsonNode, SceneFile};

const DEFAULT_OUTPUT: &str = "render.png";

fn load_scene(path: &Path) -> Result<SceneFile> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read scene '{}'", path.display()))?;
    let mut scene: SceneFile = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse scene '{}'", path.display()))?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    scene.resolve_files(base);
    Ok(scene)
}

/// Import every object and place it. Object placement reads the optional
/// `rotateAngle`, `rotateAxis` and `translate` fields.
fn build_instances(
    ctx: &mut Context,
    scene: &SceneFile,
) -> Result<HashMap<String, Instance>> {
    let importer = ObjImporter::new();
    let no_instances = HashMap::new();
    let mut instances = HashMap::new();

    for (name, object) in &scene.objects {
        let node = JsonNode::new(object, &no_instances);
        let mesh = MeshGeometry::make(ctx, &importer, &node)
            .with_context(|| format!("failed to build object '{}'", name))?;

        let placement = rotation_then_translation(
            node.get_float_or("rotateAngle", 0.0)?,
            node.get_float3_or("rotateAxis", Vec3::Y)?,
            node.get_float3_or("translate", Vec3::ZERO)?,
        );
        let instance = Instance::new(ctx, Arc::new(mesh), placement)?;
        log::debug!("Object '{}' world bounds {:?}", name, instance.world_bounds());
        instances.insert(name.clone(), instance);
    }
    Ok(instances)
}

fn run(scene_path: &Path, output: &Path) -> Result<()> {
    let start = Instant::now();
    let scene = load_scene(scene_path)?;

    let mut ctx = Context::with_backend(CpuBackend::new())?;
    let instances = build_instances(&mut ctx, &scene)?;
    log::info!("Built {} object(s) in {:.2?}", instances.len(), start.elapsed());

    let mut camera = Camera::make(&mut ctx, &JsonNode::new(&scene.camera, &instances))
        .context("failed to build camera")?;
    camera.render(&mut ctx)?;

    let (width, height) = (camera.width(), camera.height());
    let rgba = camera.read_image(&ctx)?;
    ctx.destroy();

    let image = image::RgbaImage::from_raw(width, height, rgba)
        .ok_or_else(|| anyhow!("image buffer does not match {}x{}", width, height))?;
    image
        .save(output)
        .with_context(|| format!("failed to write '{}'", output.display()))?;

    log::info!("Wrote {} in {:.2?}", output.display(), start.elapsed());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        let program = args.first().map_or("xray", String::as_str);
        eprintln!("Usage: {} <scene.json> [output.png]", program);
        std::process::exit(1);
    }

    let scene = PathBuf::from(&args[1]);
    let output = PathBuf::from(args.get(2).map_or(DEFAULT_OUTPUT, String::as_str));
    run(&scene, &output)
}
