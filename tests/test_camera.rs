use wave_survivor::camera::Camera;
use wave_survivor::config::CameraConfig;

use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

const WORLD: f32 = 2800.0;

fn make_camera() -> Camera {
    Camera::new(&CameraConfig::default())
}

#[test]
fn shake_offsets_stay_within_intensity() {
    let mut camera = make_camera();
    let mut rng = StdRng::seed_from_u64(42);
    camera.shake(8.0, 0.2);
    camera.update(0.05, Vec2::splat(1700.0), 1.0, WORLD, &mut rng);
    assert!(camera.shake_offset != Vec2::ZERO);
    assert!(camera.shake_offset.x.abs() <= 8.0 && camera.shake_offset.y.abs() <= 8.0);

    for _ in 0..10 {
        camera.update(0.05, Vec2::splat(1700.0), 1.0, WORLD, &mut rng);
    }
    assert_eq!(camera.shake_offset, Vec2::ZERO);
}

#[test]
fn non_positive_shake_is_ignored() {
    let mut camera = make_camera();
    let mut rng = StdRng::seed_from_u64(42);
    camera.shake(-8.0, 0.2);
    camera.shake(f32::NAN, 0.2);
    camera.update(0.05, Vec2::splat(1700.0), 1.0, WORLD, &mut rng);
    assert_eq!(camera.shake_offset, Vec2::ZERO);
}
