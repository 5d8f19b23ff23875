mod common;

use glam::{UVec3, Vec2, Vec3};
use strata_cluster::Aabb;

fn contains_with_tolerance(aabb: &Aabb, point: Vec3) -> bool {
    let slack = Vec3::splat(1e-3 * (1.0 + point.z.abs()));
    point.cmpge(aabb.min - slack).all() && point.cmple(aabb.max + slack).all()
}

#[test]
fn projected_points_land_in_a_containing_cluster() {
    let camera = common::hall_camera();
    let grid = common::grid([10, 20, 30], 8, camera);
    let slicing = grid.slicing();

    let steps = 23;
    for i in 0..steps {
        for j in 0..steps {
            for k in 0..steps {
                let uv = Vec2::new(
                    (i as f32 + 0.31) / steps as f32,
                    (j as f32 + 0.73) / steps as f32,
                );
                let t = (k as f32 + 0.5) / steps as f32;
                let depth = slicing.near() * (slicing.far() / slicing.near()).powf(t);

                let point = common::view_point(&camera, uv, depth);
                let coords = grid.cluster_for_view_point(point);
                let aabb = grid.cluster_aabb(coords);

                assert!(
                    contains_with_tolerance(&aabb, point),
                    "{point} mapped to {coords} with bounds {aabb:?}"
                );
            }
        }
    }
}

#[test]
fn tile_centers_map_back_to_every_cluster() {
    let camera = common::hall_camera();
    let grid = common::grid([10, 20, 30], 8, camera);
    let config = grid.config();

    for index in 0..config.cluster_count() {
        let coords = config.coords_of(index);
        let (uv, depth) = grid.cluster_center_uv_depth(coords);
        assert_eq!(grid.cluster_for_uv_depth(uv, depth), coords);

        let point = common::view_point(&camera, uv, depth);
        assert_eq!(grid.cluster_for_view_point(point), coords);
        assert!(grid.cluster_aabb(coords).contains(point));
    }
}

#[test]
fn pixel_mapping_matches_uv_mapping() {
    let camera = common::hall_camera();
    let grid = common::grid([10, 20, 30], 8, camera);

    // top-left pixel is the top row of tiles, since v grows upward
    let top_left = grid.cluster_for_pixel(Vec2::new(0.5, 0.5), 5.0);
    assert_eq!((top_left.x, top_left.y), (0, 19));

    let bottom_right = grid.cluster_for_pixel(
        Vec2::new(common::WIDTH as f32 - 0.5, common::HEIGHT as f32 - 0.5),
        5.0,
    );
    assert_eq!((bottom_right.x, bottom_right.y), (9, 0));
}

#[test]
fn depths_outside_the_frustum_clamp_to_end_slices() {
    let camera = common::hall_camera();
    let grid = common::grid([4, 4, 16], 8, camera);
    let center = Vec2::splat(0.5);

    assert_eq!(grid.cluster_for_uv_depth(center, 0.01).z, 0);
    assert_eq!(grid.cluster_for_uv_depth(center, 1.0e6).z, 15);
    assert_eq!(grid.cluster_for_uv_depth(center, 1.0e6), UVec3::new(2, 2, 15));
}
