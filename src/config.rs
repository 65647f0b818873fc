//! 运行时配置
//!
//! 所有参数扁平化，直接在代码中修改默认值即可。
//! 画布尺寸与地面高度同时被渲染层使用，修改时需保持一致。

use once_cell::sync::Lazy;
use std::sync::RwLock;

use crate::{PuppetError, Result};

/// 引擎配置（扁平化，不嵌套）
#[derive(Debug, Clone)]
pub struct PuppetConfig {
    // ========== 画布 ==========
    /// 画布宽度，默认 800
    pub canvas_width: f32,
    /// 画布高度，默认 800
    pub canvas_height: f32,
    /// 地面线 Y 坐标（Y 轴向下），默认 740
    pub ground_y: f32,

    // ========== 积分 ==========
    /// 速度保留系数（轻微空气阻尼），默认 0.995
    pub friction: f32,

    // ========== 约束求解 ==========
    /// 距离约束迭代次数，默认 10
    pub solver_iterations: usize,
    /// 粒子间距小于此值时跳过该约束，默认 0.001
    pub min_solve_distance: f32,
    /// 构建时丢弃短于此值的骨骼约束，默认 0.1
    pub min_rest_length: f32,

    // ========== 防旋转阻尼 ==========
    /// 核心粒子切向速度保留系数，默认 0.98
    pub rotational_damping: f32,

    // ========== 碰撞 ==========
    /// 碰撞后法向速度保留系数，默认 0.7
    pub bounce_factor: f32,
    /// 粒子半径（边界留白），默认 5
    pub particle_radius: f32,

    // ========== 质量 ==========
    /// root/waist/torso/neck 质量，默认 3.0
    pub core_mass: f32,
    /// hand/foot 质量，默认 0.5
    pub extremity_mass: f32,
    /// 其余关节质量，默认 1.0
    pub default_mass: f32,

    // ========== 帧驱动 ==========
    /// 单帧最大步长（秒），默认 1/30
    pub max_time_step: f32,

    // ========== 调试 ==========
    /// 是否输出逐帧调试日志，默认 false
    pub debug_log: bool,
}

impl Default for PuppetConfig {
    fn default() -> Self {
        Self {
            // ====== 画布 ======
            canvas_width: 800.0,
            canvas_height: 800.0,
            // 默认 T 姿态脚底在 720，留出粒子半径以上的余量
            ground_y: 740.0,

            // ====== 积分 ======
            friction: 0.995,

            // ====== 约束求解 ======
            // 越大 → 骨骼长度越精确，但更慢
            solver_iterations: 10,
            min_solve_distance: 0.001,
            min_rest_length: 0.1,

            // ====== 防旋转阻尼 ======
            rotational_damping: 0.98,

            // ====== 碰撞 ======
            bounce_factor: 0.7,
            particle_radius: 5.0,

            // ====== 质量 ======
            // 躯干重 → 稳定；四肢末端轻 → 灵敏
            core_mass: 3.0,
            extremity_mass: 0.5,
            default_mass: 1.0,

            // ====== 帧驱动 ======
            max_time_step: 1.0 / 30.0,

            // ====== 调试 ======
            debug_log: false,
        }
    }
}

impl PuppetConfig {
    /// 画布中心
    #[inline]
    pub fn canvas_center(&self) -> glam::Vec2 {
        glam::Vec2::new(self.canvas_width * 0.5, self.canvas_height * 0.5)
    }

    /// 脚部可到达的最低 Y（地面线减去粒子半径）
    #[inline]
    pub fn ground_limit(&self) -> f32 {
        self.ground_y - self.particle_radius
    }

    /// 检查配置是否自洽
    pub fn validate(&self) -> Result<()> {
        let finite = [
            self.canvas_width,
            self.canvas_height,
            self.ground_y,
            self.friction,
            self.rotational_damping,
            self.bounce_factor,
            self.particle_radius,
            self.max_time_step,
            self.min_solve_distance,
            self.min_rest_length,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(PuppetError::InvalidConfig("non-finite parameter".to_string()));
        }
        if self.canvas_width <= 0.0 || self.canvas_height <= 0.0 {
            return Err(PuppetError::InvalidConfig(format!(
                "canvas must be positive, got {}x{}",
                self.canvas_width, self.canvas_height
            )));
        }
        if self.particle_radius < 0.0
            || self.particle_radius * 2.0 >= self.canvas_width.min(self.canvas_height)
        {
            return Err(PuppetError::InvalidConfig(format!(
                "particle radius {} leaves no interior",
                self.particle_radius
            )));
        }
        if self.ground_y <= self.particle_radius || self.ground_y > self.canvas_height {
            return Err(PuppetError::InvalidConfig(format!(
                "ground line {} outside canvas",
                self.ground_y
            )));
        }
        if self.core_mass <= 0.0 || self.extremity_mass <= 0.0 || self.default_mass <= 0.0 {
            return Err(PuppetError::InvalidConfig("particle masses must be positive".to_string()));
        }
        if self.solver_iterations == 0 {
            return Err(PuppetError::InvalidConfig("solver_iterations must be at least 1".to_string()));
        }
        if self.min_solve_distance <= 0.0 {
            return Err(PuppetError::InvalidConfig(format!(
                "min_solve_distance must be positive, got {}",
                self.min_solve_distance
            )));
        }
        if self.min_rest_length < 0.0 {
            return Err(PuppetError::InvalidConfig(format!(
                "min_rest_length must not be negative, got {}",
                self.min_rest_length
            )));
        }
        // 保留系数必须在 [0, 1]，否则速度逐帧放大
        let ratios = [
            ("friction", self.friction),
            ("rotational_damping", self.rotational_damping),
            ("bounce_factor", self.bounce_factor),
        ];
        for (name, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(PuppetError::InvalidConfig(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.max_time_step <= 0.0 {
            return Err(PuppetError::InvalidConfig(format!(
                "max time step must be positive, got {}",
                self.max_time_step
            )));
        }
        Ok(())
    }
}

/// 全局配置实例
static PUPPET_CONFIG: Lazy<RwLock<PuppetConfig>> = Lazy::new(|| {
    RwLock::new(PuppetConfig::default())
});

/// 获取当前配置（只读）
pub fn get_config() -> PuppetConfig {
    PUPPET_CONFIG.read().unwrap_or_else(|e| e.into_inner()).clone()
}

/// 手动设置配置（用于运行时调试），无效配置会被拒绝
pub fn set_config(config: PuppetConfig) -> Result<()> {
    config.validate()?;
    *PUPPET_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = config;
    Ok(())
}

/// 重置为默认配置
pub fn reset_config() {
    *PUPPET_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = PuppetConfig::default();
}
