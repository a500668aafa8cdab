//! 粒子物理
//!
//! 每帧对每个粒子依次执行：指针吸引、摩擦衰减、显式欧拉积分、边界反弹。
//! 前三步可以交给后台线程执行，边界处理总是在主线程完成。

use super::particle::Particle;
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// 反弹时速度保留比例
pub const BOUNCE_DAMPING: f32 = 0.8;

/// 物理参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsParams {
    pub interaction_radius: f32,
    pub magnetic_force: f32,
    pub friction: f32,
    /// 是否响应指针
    pub interactive: bool,
}

/// 指针对粒子的吸引力
///
/// 距离 `d <= radius` 时大小为 `force * (1 - d / radius)`，方向指向指针；范围外为零。
pub fn magnetic_force(particle: &Particle, pointer: Vec2, params: &PhysicsParams) -> Vec2 {
    if params.interaction_radius <= 0.0 {
        return Vec2::ZERO;
    }
    let delta = pointer - particle.position;
    let distance = delta.length();
    if distance > params.interaction_radius {
        return Vec2::ZERO;
    }
    let magnitude = params.magnetic_force * (1.0 - distance / params.interaction_radius);
    Vec2::from_angle(delta.y.atan2(delta.x)) * magnitude
}

/// 前三步：吸引、摩擦、积分
pub fn step_particle(particle: &mut Particle, pointer: Option<Vec2>, params: &PhysicsParams) {
    if params.interactive {
        if let Some(pointer) = pointer {
            particle.velocity += magnetic_force(particle, pointer, params);
        }
    }
    particle.velocity *= params.friction;
    particle.position += particle.velocity;
}

/// 对整个粒子数组执行前三步
pub fn step_all(particles: &mut [Particle], pointer: Option<Vec2>, params: &PhysicsParams) {
    for particle in particles.iter_mut() {
        step_particle(particle, pointer, params);
    }
}

/// 边界反弹，两轴独立处理
pub fn resolve_boundary(particle: &mut Particle, bounds: Vec2) {
    let radius = particle.radius;
    for axis in 0..2 {
        let extent = bounds[axis];
        let position = particle.position[axis];
        if position - radius < 0.0 || position + radius > extent {
            particle.velocity[axis] = -particle.velocity[axis] * BOUNCE_DAMPING;
            particle.position[axis] = if extent >= radius * 2.0 {
                position.clamp(radius, extent - radius)
            } else {
                extent * 0.5
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn params() -> PhysicsParams {
        PhysicsParams {
            interaction_radius: 100.0,
            magnetic_force: 0.5,
            friction: 0.98,
            interactive: true,
        }
    }

    fn particle_at(x: f32, y: f32, vx: f32, vy: f32, radius: f32) -> Particle {
        Particle {
            position: Vec2::new(x, y),
            velocity: Vec2::new(vx, vy),
            radius,
            ..Particle::default()
        }
    }

    #[test]
    fn test_force_points_toward_pointer() {
        let p = particle_at(50.0, 50.0, 0.0, 0.0, 2.0);
        let force = magnetic_force(&p, Vec2::new(100.0, 50.0), &params());
        assert!(force.x > 0.0);
        assert!(force.y.abs() < 1e-5);
        // d = 50, 0.5 * (1 - 0.5)
        assert!((force.length() - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_force_at_radius_is_zero() {
        let p = particle_at(0.0, 0.0, 0.0, 0.0, 2.0);
        let force = magnetic_force(&p, Vec2::new(60.0, 80.0), &params());
        assert!(force.length() < 1e-6);
    }

    #[test]
    fn test_force_at_pointer_is_full_strength() {
        let p = particle_at(40.0, 40.0, 0.0, 0.0, 2.0);
        let force = magnetic_force(&p, Vec2::new(40.0, 40.0), &params());
        assert!((force.length() - params().magnetic_force).abs() < 1e-6);
        // atan2(0, 0) = 0，方向固定为 +x
        assert!(force.x > 0.0);
    }

    #[test]
    fn test_no_force_outside_radius() {
        let p = particle_at(0.0, 0.0, 0.0, 0.0, 2.0);
        assert_eq!(magnetic_force(&p, Vec2::new(150.0, 0.0), &params()), Vec2::ZERO);
    }

    #[test]
    fn test_non_interactive_ignores_pointer() {
        let mut p = particle_at(50.0, 50.0, 1.0, 0.0, 2.0);
        let params = PhysicsParams {
            interactive: false,
            ..params()
        };
        step_particle(&mut p, Some(Vec2::new(60.0, 50.0)), &params);
        assert!((p.velocity.x - 0.98).abs() < 1e-6);
        assert!((p.position.x - 50.98).abs() < 1e-5);
    }

    #[test]
    fn test_corner_bounce() {
        let mut p = particle_at(5.0, 5.0, -3.0, -3.0, 5.0);
        let params = params();
        step_particle(&mut p, None, &params);
        resolve_boundary(&mut p, Vec2::new(200.0, 200.0));

        let expected = 3.0 * params.friction * BOUNCE_DAMPING;
        assert!(p.position.x >= 0.0 && p.position.y >= 0.0);
        assert_eq!(p.position, Vec2::new(5.0, 5.0));
        assert!((p.velocity.x - expected).abs() < 1e-5);
        assert!((p.velocity.y - expected).abs() < 1e-5);
    }

    #[test]
    fn test_far_edge_bounce() {
        let mut p = particle_at(98.0, 50.0, 4.0, 0.0, 3.0);
        step_particle(&mut p, None, &PhysicsParams { friction: 0.99, ..params() });
        resolve_boundary(&mut p, Vec2::new(100.0, 100.0));
        assert_eq!(p.position.x, 97.0);
        assert!(p.velocity.x < 0.0);
    }

    #[test]
    fn test_surface_smaller_than_particle() {
        let mut p = particle_at(3.0, 3.0, 1.0, 1.0, 5.0);
        resolve_boundary(&mut p, Vec2::new(6.0, 6.0));
        assert_eq!(p.position, Vec2::new(3.0, 3.0));
    }

    proptest! {
        #[test]
        fn prop_particles_stay_in_bounds(
            x in 0.0f32..400.0,
            y in 0.0f32..300.0,
            vx in -20.0f32..20.0,
            vy in -20.0f32..20.0,
            radius in 0.5f32..6.0,
            px in -100.0f32..500.0,
            py in -100.0f32..400.0,
            ticks in 1usize..200,
        ) {
            let bounds = Vec2::new(400.0, 300.0);
            let mut p = particle_at(x.clamp(radius, 400.0 - radius), y.clamp(radius, 300.0 - radius), vx, vy, radius);
            let params = params();
            for _ in 0..ticks {
                step_particle(&mut p, Some(Vec2::new(px, py)), &params);
                resolve_boundary(&mut p, bounds);
                prop_assert!(p.position.x >= radius && p.position.x <= bounds.x - radius);
                prop_assert!(p.position.y >= radius && p.position.y <= bounds.y - radius);
            }
        }

        #[test]
        fn prop_friction_damps_free_motion(
            vx in -50.0f32..50.0,
            vy in -50.0f32..50.0,
            friction in 0.901f32..0.999,
        ) {
            let mut p = particle_at(1.0e4, 1.0e4, vx, vy, 1.0);
            let before = p.velocity.length();
            step_particle(&mut p, None, &PhysicsParams { friction, ..params() });
            prop_assert!(p.velocity.length() <= before);
        }
    }
}
