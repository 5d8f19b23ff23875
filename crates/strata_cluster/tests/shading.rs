mod common;

use glam::{UVec3, Vec2, Vec3};
use strata_cluster::{BinningOrder, ClusterBuilder, ShadingContract};
use strata_lights::Light;

#[test]
fn forward_and_deferred_pick_the_same_lights() {
    let camera = common::hall_camera();
    let grid = common::grid([10, 20, 30], 64, camera);
    let config = *grid.config();

    // surface samples at a few cluster centers, each with a light just in front of it;
    // kept within ~16 units so the reconstructed depth stays precise
    let samples: Vec<(Vec2, Vec3)> = [
        UVec3::new(2, 3, 12),
        UVec3::new(5, 10, 14),
        UVec3::new(8, 17, 16),
    ]
    .into_iter()
    .map(|coords| {
        let (uv, depth) = grid.cluster_center_uv_depth(coords);
        let view = common::view_point(&camera, uv, depth);
        (uv, camera.inv_view.transform_point3(view))
    })
    .collect();

    let eye = camera.eye();
    let lights: Vec<Light> = samples
        .iter()
        .map(|(_, position)| Light {
            position: *position + (eye - *position).normalize() * 0.5,
            color: Vec3::new(1.0, 0.5, 0.25),
            radius: 2.0,
        })
        .collect();

    let mut builder = ClusterBuilder::new(&config, BinningOrder::LightMajor);
    builder.build(&lights, &grid);
    let contract = ShadingContract::new(&grid, builder.lists(), &lights);

    for (uv, position) in samples {
        let pixel = Vec2::new(
            uv.x * common::WIDTH as f32,
            (1.0 - uv.y) * common::HEIGHT as f32,
        );
        let normal = (eye - position).normalize();
        let albedo = Vec3::splat(0.8);
        let ndc_depth = camera.view_proj().project_point3(position).z;

        let (forward_cluster, forward) = contract.shade_forward(pixel, position, normal, albedo);
        let (deferred_cluster, deferred) = contract.shade_deferred(pixel, ndc_depth, normal, albedo);

        assert_eq!(forward_cluster, deferred_cluster);
        assert!(builder.lists().count(forward_cluster) > 0);
        assert!(forward.length() > 0.0);
        assert!(
            (forward - deferred).length() <= 1e-2 * forward.length(),
            "forward {forward} vs deferred {deferred}"
        );
    }
}

#[test]
fn shading_only_reads_the_fragment_cluster() {
    let camera = common::hall_camera();
    let grid = common::grid([4, 4, 4], 8, camera);
    let config = *grid.config();

    // lit cluster near the left edge, shaded point near the right edge
    let (uv, depth) = grid.cluster_center_uv_depth(UVec3::new(3, 1, 2));
    let position = camera.inv_view.transform_point3(common::view_point(&camera, uv, depth));
    let far_light = [Light {
        position: camera
            .inv_view
            .transform_point3(common::view_point(&camera, Vec2::new(0.05, 0.4), depth)),
        color: Vec3::ONE,
        radius: 1.0,
    }];

    let mut builder = ClusterBuilder::new(&config, BinningOrder::ClusterMajor);
    builder.build(&far_light, &grid);
    let contract = ShadingContract::new(&grid, builder.lists(), &far_light);

    let cluster = config.linear_index(UVec3::new(3, 1, 2));
    assert_eq!(builder.lists().count(cluster), 0);
    assert_eq!(
        contract.shade_fragment(cluster, position, Vec3::Y, Vec3::ONE),
        Vec3::ZERO
    );
}
