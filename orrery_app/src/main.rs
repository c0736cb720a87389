//! Orrery demo application
//!
//! Drives a miniature solar system through the scene graph: orbit and spin
//! behaviors on the bodies, a container grouping the planets, short-lived
//! solar flares that spawn and despawn themselves mid-traversal, and
//! capability queries over the result. Headless by design: draw cycles
//! refresh world transforms and the telemetry hook logs positions instead
//! of submitting geometry.

use scene_engine::foundation::logging;
use scene_engine::foundation::math::constants::TAU;
use scene_engine::prelude::*;

/// Configuration compiled into the binary; edit and rebuild.
const CONFIG_TOML: &str = include_str!("../orrery.toml");

/// App-defined capability bit marking ejecta from the sun.
const FLARE: Capabilities = Capabilities::from_bits_retain(1 << 8);

/// Circles the parent at a fixed radius and angular velocity.
struct Orbit {
    radius: f32,
    angular_velocity: f32,
    angle: f32,
}

impl Orbit {
    fn new(radius: f32, angular_velocity: f32) -> Self {
        Self {
            radius,
            angular_velocity,
            angle: 0.0,
        }
    }
}

impl Behavior for Orbit {
    fn on_update(&mut self, ctx: &mut Context<'_>, node: NodeKey, dt: f32) {
        self.angle = (self.angle + self.angular_velocity * dt) % TAU;
        let transform = Mat4::rotation_y(self.angle) * Mat4::translation(self.radius, 0.0, 0.0);
        ctx.set_local_transform(node, transform);
    }
}

/// Spins the node around its own Y axis.
struct Spin {
    angular_velocity: f32,
}

impl Behavior for Spin {
    fn on_update(&mut self, ctx: &mut Context<'_>, node: NodeKey, dt: f32) {
        if let Some(local) = ctx.local_transform(node) {
            ctx.set_local_transform(node, local * Mat4::rotation_y(self.angular_velocity * dt));
        }
    }
}

/// Burns down, then despawns its own node mid-traversal.
struct Flare {
    remaining: f32,
}

impl Behavior for Flare {
    fn on_update(&mut self, ctx: &mut Context<'_>, node: NodeKey, dt: f32) {
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            ctx.despawn(node);
        }
    }
}

/// Periodically ejects a short-lived flare under its own node.
struct FlareSpawner {
    period: f32,
    lifetime: f32,
    clock: f32,
    ejected: u32,
}

impl Behavior for FlareSpawner {
    fn on_update(&mut self, ctx: &mut Context<'_>, node: NodeKey, dt: f32) {
        self.clock += dt;
        while self.clock >= self.period {
            self.clock -= self.period;
            let angle = (self.ejected % 8) as f32 * (TAU / 8.0);
            self.ejected += 1;

            let flare = ctx.spawn(
                NodeSpec::new(format!("flare-{}", self.ejected))
                    .capabilities(FLARE | Capabilities::DRAWABLE)
                    .local_transform(Mat4::rotation_y(angle) * Mat4::translation(1.5, 0.0, 0.0))
                    .update_priority(10)
                    .behavior(Flare {
                        remaining: self.lifetime,
                    }),
            );
            ctx.attach(flare, node);
            log::debug!("ejected flare {}", self.ejected);
        }
    }
}

/// Logs its node's world position every `every` draw cycles.
struct Telemetry {
    label: &'static str,
    every: u64,
    frames: u64,
}

impl Behavior for Telemetry {
    fn on_draw(&mut self, ctx: &mut Context<'_>, node: NodeKey) {
        self.frames += 1;
        if self.frames % self.every == 0 {
            if let Some(world) = ctx.world_transform(node) {
                let p = world.translation_part();
                log::info!("{} at ({:.2}, {:.2}, {:.2})", self.label, p.x, p.y, p.z);
            }
        }
    }
}

/// Populate the scene and return the earth's key for the teardown demo
fn build_solar_system(scene: &mut Scene) -> NodeKey {
    let root = scene.root();

    let camera = scene.spawn(
        NodeSpec::new("camera")
            .capabilities(Capabilities::CAMERA)
            .local_transform(Mat4::translation(0.0, 12.0, 24.0))
            .update_priority(-10),
    );
    scene.attach(camera, root);

    let sun = scene.spawn(
        NodeSpec::new("sun")
            .capabilities(Capabilities::DRAWABLE | Capabilities::LIGHT)
            .behavior(Spin {
                angular_velocity: 0.3,
            }),
    );
    scene.attach(sun, root);

    let ejector = scene.spawn(NodeSpec::new("flare ejector").behavior(FlareSpawner {
        period: 1.0,
        lifetime: 2.5,
        clock: 0.0,
        ejected: 0,
    }));
    scene.attach(ejector, sun);

    let planets = scene.spawn(NodeSpec::container("planets"));
    scene.attach(planets, root);

    let earth = scene.spawn(
        NodeSpec::new("earth")
            .capabilities(Capabilities::DRAWABLE)
            .behavior(Orbit::new(8.0, 0.8)),
    );
    scene.attach(earth, planets);

    let moon = scene.spawn(
        NodeSpec::new("moon")
            .capabilities(Capabilities::DRAWABLE)
            .draw_priority(1)
            .behavior(Orbit::new(2.0, 2.5)),
    );
    scene.attach(moon, earth);

    let probe = scene.spawn(NodeSpec::new("moon probe").draw_priority(9).behavior(
        Telemetry {
            label: "moon",
            every: 120,
            frames: 0,
        },
    ));
    scene.attach(probe, moon);

    let mars = scene.spawn(
        NodeSpec::new("mars")
            .capabilities(Capabilities::DRAWABLE)
            .update_priority(1)
            .behavior(Orbit::new(12.0, 0.5)),
    );
    scene.attach(mars, planets);

    earth
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = EngineConfig::from_toml_str(CONFIG_TOML)?;
    logging::init(config.log_level_filter());

    log::info!("starting orrery demo");
    let mut engine = Engine::new(config)?;
    let earth = build_solar_system(engine.scene_mut());

    for _ in 0..600 {
        engine.frame();
    }

    let scene = engine.scene();
    let root = scene.root();
    let camera = scene.find_first(root, Capabilities::CAMERA);
    let drawables = scene.find_all(root, Capabilities::DRAWABLE);
    let flares = scene.find_all(root, FLARE);
    log::info!(
        "after {} frames: camera {:?}, {} drawables, {} live flares, {} nodes resident",
        engine.frame_count(),
        camera.and_then(|key| scene.name(key)),
        drawables.len(),
        flares.len(),
        scene.node_count()
    );

    // Destruction is deferred: the subtree leaves the arena at the next
    // frame's drain, not at the despawn call.
    engine.scene_mut().despawn(earth);
    log::info!(
        "despawned the earth subtree; {} nodes resident until the next drain",
        engine.scene().node_count()
    );
    engine.frame();
    log::info!("one frame later: {} nodes resident", engine.scene().node_count());

    log::info!("orrery demo finished");
    Ok(())
}
