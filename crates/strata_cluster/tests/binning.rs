mod common;

use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, UVec3, Vec3};
use strata_cluster::{BinningOrder, ClusterBuilder, ClusterGrid, ClusterGridConfig, ClusterLightLists};
use strata_core::camera::CameraSnapshot;
use strata_lights::Light;

fn sorted_lists(lists: &ClusterLightLists) -> Vec<Vec<u32>> {
    (0..lists.cluster_count())
        .map(|cluster| lists.sorted_indices(cluster))
        .collect()
}

/// Every (cluster, light) pair the exact sphere-vs-AABB test accepts.
fn brute_force(grid: &ClusterGrid, lights: &[Light]) -> Vec<Vec<u32>> {
    let bounds = grid.bounds();
    (0..grid.config().cluster_count())
        .map(|cluster| {
            lights
                .iter()
                .enumerate()
                .filter(|(_, light)| {
                    let center = grid.camera().world_to_view(light.position);
                    bounds.aabb(cluster).intersects_sphere(center, light.radius)
                })
                .map(|(index, _)| index as u32)
                .collect()
        })
        .collect()
}

#[test]
fn each_light_lands_in_exactly_the_clusters_it_touches() {
    let store = common::hall_lights(300, 4.0);
    let grid = common::grid([8, 6, 12], 300, common::hall_camera());

    for order in [BinningOrder::LightMajor, BinningOrder::ClusterMajor] {
        let mut builder = ClusterBuilder::new(grid.config(), order);
        let stats = builder.build(store.active(), &grid);

        assert_eq!(stats.dropped_assignments, 0, "{order:?}");
        assert_eq!(sorted_lists(builder.lists()), brute_force(&grid, store.active()), "{order:?}");
    }
}

#[test]
fn both_orders_produce_identical_sets() {
    let grid = common::grid([10, 20, 30], 500, common::hall_camera());

    for time in [0.0, 2.5, 17.0] {
        let store = common::hall_lights(500, time);

        let mut light_major = ClusterBuilder::new(grid.config(), BinningOrder::LightMajor);
        let mut cluster_major = ClusterBuilder::new(grid.config(), BinningOrder::ClusterMajor);
        let a = light_major.build(store.active(), &grid);
        let b = cluster_major.build(store.active(), &grid);

        assert_eq!(a, b);
        assert_eq!(sorted_lists(light_major.lists()), sorted_lists(cluster_major.lists()));
    }
}

#[test]
fn rebuilding_is_idempotent() {
    let store = common::hall_lights(200, 1.0);
    let grid = common::grid([10, 20, 30], 64, common::hall_camera());
    let mut builder = ClusterBuilder::new(grid.config(), BinningOrder::LightMajor);

    let first_stats = builder.build(store.active(), &grid);
    let first = sorted_lists(builder.lists());
    let second_stats = builder.build(store.active(), &grid);

    assert_eq!(first_stats, second_stats);
    assert_eq!(first, sorted_lists(builder.lists()));
}

#[test]
fn overflow_stays_within_capacity() {
    let camera = common::hall_camera();
    let grid = common::grid([4, 4, 4], 4, camera);
    // 40 lights stacked in front of the camera all want the same clusters
    let lights: Vec<Light> = (0..40)
        .map(|i| Light {
            position: Vec3::new(3.0, 2.0 + i as f32 * 0.01, 0.0),
            color: Vec3::ONE,
            radius: 1.0,
        })
        .collect();

    for order in [BinningOrder::LightMajor, BinningOrder::ClusterMajor] {
        let mut builder = ClusterBuilder::new(grid.config(), order);
        let stats = builder.build(&lights, &grid);
        let lists = builder.lists();

        assert!(stats.dropped_assignments > 0, "{order:?}");
        assert_eq!(stats.max_count, 4, "{order:?}");
        for cluster in 0..lists.cluster_count() {
            assert!(lists.count(cluster) <= 4);
            let indices = lists.sorted_indices(cluster);
            assert!(indices.iter().all(|&index| index < 40));
            assert!(indices.windows(2).all(|pair| pair[0] != pair[1]));
        }

        let wanted: u64 = brute_force(&grid, &lights).iter().map(|l| l.len() as u64).sum();
        assert_eq!(stats.assignments + stats.dropped_assignments, wanted, "{order:?}");
    }
}

#[test]
fn single_cluster_lists_everything_touching_the_frustum() {
    let store = common::hall_lights(200, 9.0);
    let grid = common::grid([1, 1, 1], 200, common::hall_camera());
    let frustum = grid.cluster_aabb(UVec3::ZERO);

    let mut builder = ClusterBuilder::new(grid.config(), BinningOrder::LightMajor);
    builder.build(store.active(), &grid);

    let expected: Vec<u32> = store
        .active()
        .iter()
        .enumerate()
        .filter(|(_, light)| {
            frustum.intersects_sphere(grid.camera().world_to_view(light.position), light.radius)
        })
        .map(|(index, _)| index as u32)
        .collect();

    assert!(!expected.is_empty());
    assert_eq!(builder.lists().sorted_indices(0), expected);
}

#[test]
fn lights_behind_the_camera_are_not_binned() {
    let grid = common::grid([4, 4, 4], 8, common::hall_camera());
    let behind = [Light {
        position: Vec3::new(-20.0, 2.0, 0.0),
        color: Vec3::ONE,
        radius: 2.0,
    }];

    let mut builder = ClusterBuilder::new(grid.config(), BinningOrder::LightMajor);
    let stats = builder.build(&behind, &grid);
    assert_eq!(stats.assignments, 0);
    assert_eq!(stats.occupied_clusters, 0);
}

#[test]
fn single_light_scenario_fills_one_cluster() {
    // 90 degree square frustum; slice 0 spans depth 10 to ~112
    let near = 10.0;
    let far = 160_000.0;
    let proj = Mat4::perspective_rh(FRAC_PI_2, 1.0, near, far);
    let eye = Vec3::new(2.5, -2.5, 60.0);
    let view = Mat4::look_at_rh(eye, eye - Vec3::Z, Vec3::Y);
    let camera = CameraSnapshot::new(view, proj, near, far, 400, 400);

    let config = ClusterGridConfig::new([4, 4, 4], 8).unwrap();
    let grid = ClusterGrid::new(config, camera).unwrap();
    let light = [Light {
        position: Vec3::ZERO,
        color: Vec3::ONE,
        radius: 2.0,
    }];

    let target = config.linear_index(UVec3::new(1, 2, 0));
    assert_eq!(
        grid.cluster_for_view_point(camera.world_to_view(Vec3::ZERO)),
        UVec3::new(1, 2, 0)
    );

    for order in [BinningOrder::LightMajor, BinningOrder::ClusterMajor] {
        let mut builder = ClusterBuilder::new(&config, order);
        let stats = builder.build(&light, &grid);
        let lists = builder.lists();

        assert_eq!(stats.assignments, 1, "{order:?}");
        for cluster in 0..config.cluster_count() {
            let expected = if cluster == target { 1 } else { 0 };
            assert_eq!(lists.count(cluster), expected, "cluster {cluster} with {order:?}");
        }
        assert_eq!(lists.sorted_indices(target), vec![0]);
    }
}
