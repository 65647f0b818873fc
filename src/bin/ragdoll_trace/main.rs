//! 无界面布娃娃轨迹输出（开发调试用）
//!
//! 用法：RUST_LOG=info cargo run --features trace --bin ragdoll_trace -- [帧数] [初速度X] [初速度Y]

use glam::Vec2;

use puppet_engine::{get_config, JointId, Pose, RagdollSession};

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let frames: usize = args.next().and_then(|s| s.parse().ok()).unwrap_or(240);
    let kick_x: f32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(6.0);
    let kick_y: f32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(-3.0);

    let config = get_config();
    let dt = 1.0 / 60.0;

    let mut session = RagdollSession::with_config(Pose::default(), config);
    session.set_enabled(true);
    if let Some(body) = session.body_mut() {
        // 只踢上半身，制造旋转
        for id in [JointId::Head, JointId::LeftHand, JointId::RightHand] {
            if let Some(p) = body.particle_mut(id) {
                p.prev_pos -= Vec2::new(kick_x, kick_y);
            }
        }
    }

    for frame in 0..frames {
        let pose = *session.advance(dt);
        if frame % 30 == 0 || frame + 1 == frames {
            log::info!(
                "frame {:4}: tilt={:+.3} offset=({:+.1}, {:+.1}) torso={:+.3} waist={:+.3} head={:+.3}",
                frame, pose.ground_tilt, pose.offset.x, pose.offset.y, pose.torso, pose.waist, pose.head
            );
        }
    }

    if let Some(body) = session.body() {
        for p in &body.particles {
            log::info!("{:>15}: ({:7.2}, {:7.2}) m={}", p.id.key(), p.pos.x, p.pos.y, p.mass);
        }
    }
}
