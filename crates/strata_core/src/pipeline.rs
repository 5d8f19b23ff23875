use flecs_ecs::prelude::*;

/// Records and submits the GPU work of a frame: light animation, cluster build, shading.
#[derive(Component)]
pub struct PhaseRender3D;

#[derive(Component)]
pub struct PhasePresent;

pub fn define_pipeline_stages(world: &mut World) {
    world
        .component::<PhaseRender3D>()
        .add(flecs::Phase)
        .depends_on(flecs::pipeline::OnStore);
    world
        .component::<PhasePresent>()
        .add(flecs::Phase)
        .depends_on(PhaseRender3D);
}
