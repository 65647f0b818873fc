//! 物理步进
//!
//! 每次调用固定顺序：
//! 1. Verlet 积分（仅摩擦阻尼，无重力等外力）
//! 2. 距离约束松弛（固定迭代次数）
//! 3. 核心粒子防旋转阻尼
//! 4. 画布边界 / 地面碰撞
//!
//! 退化情况（零距离、零质量）逐项跳过，永不中断整个步进。

use glam::Vec2;

use super::body::PhysicsBody;
use crate::config::{get_config, PuppetConfig};
use crate::skeleton::{JointFlags, JointId};

/// 使用全局配置步进一次
///
/// 调用方需自行把 `dt` 限制在 `max_time_step` 以内。
pub fn update_physics_body(body: &mut PhysicsBody, dt: f32) {
    update_physics_body_with(body, dt, &get_config());
}

/// 步进一次
pub fn update_physics_body_with(body: &mut PhysicsBody, dt: f32, config: &PuppetConfig) {
    integrate(body, config.friction);
    relax_constraints(body, config.solver_iterations, config.min_solve_distance);
    damp_core_rotation(body, config.rotational_damping);
    resolve_collisions(body, config);

    if config.debug_log {
        let max_speed = body
            .particles
            .iter()
            .map(|p| p.velocity().length())
            .fold(0.0_f32, f32::max);
        log::debug!(
            "[Ragdoll] 步进 dt={:.4}s, 最大粒子速度 {:.3}/帧",
            dt, max_speed
        );
    }
}

// ============================================================================
// 1. 积分
// ============================================================================

/// 半隐式 Verlet：v = (pos - prev) * friction; prev = pos; pos += v
fn integrate(body: &mut PhysicsBody, friction: f32) {
    for p in body.particles.iter_mut() {
        if p.is_anchor() {
            continue;
        }
        let velocity = (p.pos - p.prev_pos) * friction;
        p.prev_pos = p.pos;
        p.pos += velocity;
    }
}

// ============================================================================
// 2. 约束松弛
// ============================================================================

/// 按质量比分配修正量：较重的一端移动较少，锚点不移动
fn relax_constraints(body: &mut PhysicsBody, iterations: usize, min_distance: f32) {
    for _ in 0..iterations {
        for c in body.constraints.iter() {
            let a = body.particles[c.particle_a];
            let b = body.particles[c.particle_b];

            let delta = b.pos - a.pos;
            let dist = delta.length();
            if dist <= 0.0 || dist < min_distance {
                continue;
            }

            let total_mass = a.mass + b.mass;
            if total_mass <= 0.0 {
                continue;
            }

            // a 按 b 的质量占比移动，b 按 a 的质量占比移动
            let (move_a, move_b) = match (a.is_anchor(), b.is_anchor()) {
                (true, true) => continue,
                (true, false) => (0.0, 1.0),
                (false, true) => (1.0, 0.0),
                (false, false) => (b.mass / total_mass, a.mass / total_mass),
            };

            let correction = delta * ((dist - c.rest_length) / dist);
            body.particles[c.particle_a].pos += correction * move_a;
            body.particles[c.particle_b].pos -= correction * move_b;
        }
    }
}

// ============================================================================
// 3. 防旋转阻尼
// ============================================================================

/// 衰减 root/waist/torso 相对其质心的运动，抑制简单求解器放大的躯干自旋
fn damp_core_rotation(body: &mut PhysicsBody, damping: f32) {
    let core: Vec<usize> = JointId::ALL
        .iter()
        .filter(|id| id.flags().contains(JointFlags::SPIN_DAMPED))
        .filter_map(|&id| body.index_of(id))
        .filter(|&i| !body.particles[i].is_anchor())
        .collect();
    if core.len() < 2 {
        return;
    }

    let mut com = Vec2::ZERO;
    let mut com_prev = Vec2::ZERO;
    let mut total_mass = 0.0;
    for &i in &core {
        let p = &body.particles[i];
        com += p.pos * p.mass;
        com_prev += p.prev_pos * p.mass;
        total_mass += p.mass;
    }
    if total_mass <= 0.0 {
        return;
    }
    com /= total_mass;
    com_prev /= total_mass;

    for &i in &core {
        let p = &mut body.particles[i];
        let relative = (p.pos - com) - (p.prev_pos - com_prev);
        p.pos += relative * damping - relative;
    }
}

// ============================================================================
// 4. 碰撞
// ============================================================================

/// 越界粒子钳制到边界，并以 bounce_factor 反射法向速度
fn resolve_collisions(body: &mut PhysicsBody, config: &PuppetConfig) {
    let radius = config.particle_radius;
    let max_x = config.canvas_width - radius;
    let max_y = config.canvas_height - radius;
    let ground = config.ground_limit();
    let bounce = config.bounce_factor;

    for p in body.particles.iter_mut() {
        let vel = p.velocity();

        // 下
        if p.pos.y > max_y {
            p.pos.y = max_y;
            p.prev_pos.y = p.pos.y + vel.y * bounce;
        }
        // 上
        if p.pos.y < radius {
            p.pos.y = radius;
            p.prev_pos.y = p.pos.y + vel.y * bounce;
        }
        // 右
        if p.pos.x > max_x {
            p.pos.x = max_x;
            p.prev_pos.x = p.pos.x + vel.x * bounce;
        }
        // 左
        if p.pos.x < radius {
            p.pos.x = radius;
            p.prev_pos.x = p.pos.x + vel.x * bounce;
        }

        // 脚不能穿过地面线
        if p.id.is_foot() && p.pos.y > ground {
            p.pos.y = ground;
            p.prev_pos.y = p.pos.y + vel.y * bounce;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::body::{
        create_physics_body_from_pose_with, PhysicsConstraint, PhysicsParticle,
    };
    use crate::skeleton::Pose;

    fn default_body(config: &PuppetConfig) -> PhysicsBody {
        create_physics_body_from_pose_with(&Pose::default(), config)
    }

    fn positions(body: &PhysicsBody) -> Vec<Vec2> {
        body.particles.iter().map(|p| p.pos).collect()
    }

    fn pair(a: PhysicsParticle, b: PhysicsParticle, rest_length: f32) -> PhysicsBody {
        let mut body = PhysicsBody::default();
        body.particle_map.insert(a.id, 0);
        body.particle_map.insert(b.id, 1);
        body.particles = vec![a, b];
        body.constraints = vec![PhysicsConstraint { particle_a: 0, particle_b: 1, rest_length }];
        body
    }

    #[test]
    fn test_rest_body_with_zero_dt_is_unchanged() {
        let config = PuppetConfig::default();
        let mut body = default_body(&config);
        let before = positions(&body);
        for _ in 0..20 {
            update_physics_body_with(&mut body, 0.0, &config);
        }
        for (a, b) in before.iter().zip(positions(&body)) {
            assert!(a.distance(b) < 1e-4);
        }
    }

    #[test]
    fn test_t_pose_single_step_barely_moves() {
        let config = PuppetConfig::default();
        let mut body = default_body(&config);
        let before = positions(&body);
        update_physics_body_with(&mut body, 1.0 / 60.0, &config);
        for (a, b) in before.iter().zip(positions(&body)) {
            assert!(a.distance(b) < 1e-3);
        }
    }

    #[test]
    fn test_free_drift_is_damped_by_friction() {
        // 无碰撞时整体平移速度每帧乘以 friction
        let config = PuppetConfig::default();
        let mut body = default_body(&config);
        body.add_velocity(Vec2::new(1.0, 0.0));
        update_physics_body_with(&mut body, 1.0 / 60.0, &config);
        for p in &body.particles {
            assert!((p.velocity().x - config.friction).abs() < 1e-3, "{}", p.id);
            assert!(p.velocity().y.abs() < 1e-3);
        }
    }

    #[test]
    fn test_constraint_restores_length_heavier_moves_less() {
        let config = PuppetConfig { solver_iterations: 1, ..PuppetConfig::default() };
        let a = PhysicsParticle::new(JointId::Root, Vec2::new(100.0, 100.0), 3.0);
        let b = PhysicsParticle::new(JointId::Waist, Vec2::new(120.0, 100.0), 1.0);
        let mut body = pair(a, b, 10.0);
        relax_constraints(&mut body, config.solver_iterations, config.min_solve_distance);

        let pa = body.particles[0].pos;
        let pb = body.particles[1].pos;
        assert!((pa.distance(pb) - 10.0).abs() < 1e-4);
        // 总修正 10：a 移动 1/4，b 移动 3/4
        assert!((pa.x - 102.5).abs() < 1e-4);
        assert!((pb.x - 112.5).abs() < 1e-4);
    }

    #[test]
    fn test_anchor_does_not_move() {
        let a = PhysicsParticle::new(JointId::Root, Vec2::new(100.0, 100.0), 0.0);
        let b = PhysicsParticle::new(JointId::Waist, Vec2::new(100.0, 130.0), 1.0);
        let mut body = pair(a, b, 20.0);
        body.particles[0].prev_pos = Vec2::new(90.0, 100.0);
        integrate(&mut body, 0.995);
        relax_constraints(&mut body, 10, 0.001);
        assert_eq!(body.particles[0].pos, Vec2::new(100.0, 100.0));
        assert!((body.particles[1].pos.y - 120.0).abs() < 1e-4);
    }

    #[test]
    fn test_degenerate_constraints_are_skipped() {
        let a = PhysicsParticle::new(JointId::Root, Vec2::new(50.0, 50.0), 1.0);
        let b = PhysicsParticle::new(JointId::Waist, Vec2::new(50.0, 50.0), 1.0);
        let mut body = pair(a, b, 10.0);
        relax_constraints(&mut body, 10, 0.001);
        assert!(body.particles.iter().all(|p| p.pos.is_finite()));
        assert_eq!(body.particles[0].pos, body.particles[1].pos);

        let a = PhysicsParticle::new(JointId::Root, Vec2::new(0.0, 0.0), 0.0);
        let b = PhysicsParticle::new(JointId::Waist, Vec2::new(30.0, 0.0), 0.0);
        let mut body = pair(a, b, 10.0);
        relax_constraints(&mut body, 10, 0.001);
        assert_eq!(body.particles[1].pos, Vec2::new(30.0, 0.0));
    }

    #[test]
    fn test_coincident_particles_stay_finite_without_distance_threshold() {
        let a = PhysicsParticle::new(JointId::Root, Vec2::new(50.0, 50.0), 1.0);
        let b = PhysicsParticle::new(JointId::Waist, Vec2::new(50.0, 50.0), 1.0);
        let mut body = pair(a, b, 10.0);
        relax_constraints(&mut body, 10, 0.0);
        assert_eq!(body.particles[0].pos, Vec2::new(50.0, 50.0));
        assert_eq!(body.particles[1].pos, Vec2::new(50.0, 50.0));
    }

    #[test]
    fn test_core_spin_is_damped() {
        let config = PuppetConfig::default();
        let mut body = default_body(&config);
        // 给躯干一个绕质心的切向速度
        for id in [JointId::Waist, JointId::Torso] {
            let p = body.particle_mut(id).unwrap();
            let sign = if id == JointId::Waist { 1.0 } else { -1.0 };
            p.prev_pos.x -= sign * 2.0;
        }
        let spin = |body: &PhysicsBody| {
            let w = body.particle(JointId::Waist).unwrap().velocity().x;
            let t = body.particle(JointId::Torso).unwrap().velocity().x;
            w - t
        };
        let before = spin(&body);
        damp_core_rotation(&mut body, config.rotational_damping);
        let after = spin(&body);
        assert!(after.abs() < before.abs());
        assert!((after - before * config.rotational_damping).abs() < 1e-3);
    }

    #[test]
    fn test_wall_bounce_reflects_velocity() {
        let config = PuppetConfig::default();
        let mut p = PhysicsParticle::new(JointId::Head, Vec2::new(798.0, 400.0), 1.0);
        p.prev_pos = Vec2::new(790.0, 400.0);
        let mut body = PhysicsBody::default();
        body.particle_map.insert(p.id, 0);
        body.particles.push(p);

        resolve_collisions(&mut body, &config);
        let p = body.particles[0];
        assert_eq!(p.pos.x, 795.0);
        // 法向速度反向并乘以 bounce_factor
        assert!((p.velocity().x + 8.0 * config.bounce_factor).abs() < 1e-4);
    }

    #[test]
    fn test_feet_stop_at_ground_other_joints_do_not() {
        let config = PuppetConfig::default();
        let mut body = default_body(&config);
        body.add_velocity(Vec2::new(0.0, 30.0));
        let mut body_below_ground = false;
        for _ in 0..20 {
            update_physics_body_with(&mut body, 1.0 / 60.0, &config);
            for p in &body.particles {
                if p.id.is_foot() {
                    assert!(p.pos.y <= config.ground_limit(), "{} y={}", p.id, p.pos.y);
                } else if p.pos.y > config.ground_limit() {
                    body_below_ground = true;
                }
            }
        }
        // 地面只约束脚，其余关节只受画布下边界限制
        assert!(body_below_ground);
    }

    #[test]
    fn test_ground_bounce_applies_to_feet_only() {
        let config = PuppetConfig::default();
        let mut body = PhysicsBody::default();
        for (i, id) in [JointId::LeftFoot, JointId::LeftKnee].into_iter().enumerate() {
            let mut p = PhysicsParticle::new(id, Vec2::new(300.0 + i as f32 * 50.0, 738.0), 1.0);
            p.prev_pos.y = 730.0;
            body.particle_map.insert(id, i);
            body.particles.push(p);
        }

        resolve_collisions(&mut body, &config);
        let foot = body.particles[0];
        assert_eq!(foot.pos.y, config.ground_limit());
        assert!((foot.velocity().y + 8.0 * config.bounce_factor).abs() < 1e-4);

        let knee = body.particles[1];
        assert_eq!(knee.pos.y, 738.0);
        assert!((knee.velocity().y - 8.0).abs() < 1e-4);
    }

    #[test]
    fn test_boundary_containment() {
        let config = PuppetConfig::default();
        let pose = Pose {
            offset: Vec2::new(350.0, -300.0),
            ground_tilt: 1.3,
            ..Pose::default()
        };
        let mut body = create_physics_body_from_pose_with(&pose, &config);
        body.add_velocity(Vec2::new(-25.0, 40.0));

        for _ in 0..300 {
            update_physics_body_with(&mut body, 1.0 / 60.0, &config);
            for p in &body.particles {
                let r = config.particle_radius;
                assert!(p.pos.x >= r && p.pos.x <= config.canvas_width - r, "{} x={}", p.id, p.pos.x);
                assert!(p.pos.y >= r && p.pos.y <= config.canvas_height - r, "{} y={}", p.id, p.pos.y);
                if p.id.is_foot() {
                    assert!(p.pos.y <= config.ground_limit());
                }
            }
        }
    }

    #[test]
    fn test_deterministic_stepping() {
        let config = PuppetConfig::default();
        let pose = Pose { ground_tilt: 0.6, head: 1.0, ..Pose::default() };
        let mut a = create_physics_body_from_pose_with(&pose, &config);
        a.add_velocity(Vec2::new(12.0, -7.0));
        let mut b = a.clone();

        let dts = [1.0 / 60.0, 1.0 / 45.0, 1.0 / 30.0, 0.0, 1.0 / 60.0];
        for _ in 0..40 {
            for &dt in &dts {
                update_physics_body_with(&mut a, dt, &config);
                update_physics_body_with(&mut b, dt, &config);
            }
        }
        assert_eq!(a.particles, b.particles);
    }

    #[test]
    fn test_rest_lengths_never_change() {
        let config = PuppetConfig::default();
        let mut body = default_body(&config);
        let rest: Vec<f32> = body.constraints.iter().map(|c| c.rest_length).collect();
        body.add_velocity(Vec2::new(5.0, 5.0));
        for _ in 0..50 {
            update_physics_body_with(&mut body, 1.0 / 60.0, &config);
        }
        let after: Vec<f32> = body.constraints.iter().map(|c| c.rest_length).collect();
        assert_eq!(rest, after);
    }
}
