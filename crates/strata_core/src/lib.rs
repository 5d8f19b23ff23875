use flecs_ecs::prelude::*;
pub use rayon;

pub mod camera;
pub mod config;
pub mod error;
pub mod input;
pub mod pipeline;
pub mod time;
pub mod transform;

pub use input::*;

use crate::{config::StrataConfig, pipeline::define_pipeline_stages, time::Time};

/// The Plugin Trait
/// Every module (Renderer, Lights, Window) must implement this.
pub trait Plugin {
    fn build(&self, app: &mut App);
}

/// Size of the drawable area in physical pixels.
/// The window runner writes it, the renderer reconfigures its targets when `resized` is set.
#[derive(Component, Debug, Clone, Copy)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub resized: bool,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            resized: false,
        }
    }
}

impl Viewport {
    pub fn aspect_ratio(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }
}

/// The Engine Application
/// Holds the ECS World and orchestrates the loop.
pub struct App {
    pub world: World,
    pub running: bool,
}

impl App {
    pub fn new(config: StrataConfig) -> Self {
        // Rayon initializes itself globally the first time you use it.
        // The host-side cluster kernels and the light animator share this pool.
        rayon::ThreadPoolBuilder::new()
            .thread_name(|i| format!("strata-compute-{i}"))
            .build_global()
            .ok();

        let mut world = World::new();
        define_pipeline_stages(&mut world);

        let mut app = Self {
            world,
            running: true,
        };

        app.register_singleton(config);
        app.register_singleton_default::<Time>();
        app.register_singleton_default::<Input>();
        app.register_singleton_default::<Viewport>();

        app
    }

    pub fn add_plugin<P: Plugin>(&mut self, plugin: P) -> &mut Self {
        plugin.build(self);
        self
    }

    /// Registers `T` as a world singleton and stores `value` in it.
    pub fn register_singleton<T>(&mut self, value: T) -> &mut Self
    where
        T: ComponentId + DataComponent + ComponentType<Struct>,
    {
        self.world.component::<T>().add_trait::<flecs::Singleton>();
        self.world.set(value);
        self
    }

    pub fn register_singleton_default<T>(&mut self) -> &mut Self
    where
        T: ComponentId + DataComponent + ComponentType<Struct> + Default,
    {
        self.register_singleton(T::default())
    }

    pub fn config(&self) -> StrataConfig {
        self.world.get::<&StrataConfig>(|config| config.clone())
    }

    /// Processes ONE frame.
    /// The windowing system decides WHEN to run; we never take over the thread.
    pub fn update(&mut self) {
        if !self.running {
            return;
        }

        self.world.get::<&mut Time>(|time| time.update());

        if !self.world.progress() {
            log::info!("World requested shutdown");
            self.running = false;
        }

        self.world.get::<&mut Input>(|input| input.end_frame());
    }
}
