// src/visibility.rs

use crate::camera::FovState;
use crate::error::SimError;
use nalgebra::{Point3, Vector2};
use serde::{Deserialize, Serialize};

const COMPONENT: &str = "visibility";

/// 单个时间步的目标可见性评估结果。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisibilitySample {
    /// 目标是否落在视场圆内（含边界）
    pub hit: bool,
    pub euclidean_distance: f64,
    pub manhattan_distance: f64,
    /// 目标相对视场中心的水平偏移，以视场半径为单位
    pub fov_offset: Vector2<f64>,
}

/// 两点在地面上的欧氏距离，忽略 z。
pub fn euclidean_distance(a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    let d = ground_delta(a, b);
    d.x.hypot(d.y)
}

/// 两点在地面上的曼哈顿距离，忽略 z。
pub fn manhattan_distance(a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    let d = ground_delta(a, b);
    d.x.abs() + d.y.abs()
}

fn ground_delta(a: &Point3<f64>, b: &Point3<f64>) -> Vector2<f64> {
    Vector2::new(a.x - b.x, a.y - b.y)
}

fn is_finite(p: &Point3<f64>) -> bool {
    p.coords.iter().all(|c| c.is_finite())
}

/// 判断目标是否位于视场内，并计算目标到视场中心的距离。
///
/// # 参数
/// * `target_position` - 目标位置，只使用 x、y。
/// * `fov` - 当前时间步的视场圆。
///
/// # 返回值
/// `VisibilitySample`。坐标含非有限值时返回 `SimError::InvalidPosition`，
/// 视场半径不是正数时返回 `SimError::InvalidFovRadius`。
pub fn evaluate(target_position: &Point3<f64>, fov: &FovState) -> Result<VisibilitySample, SimError> {
    if !is_finite(target_position) {
        return Err(SimError::position(COMPONENT, target_position));
    }
    if !is_finite(&fov.center) {
        return Err(SimError::position(COMPONENT, &fov.center));
    }
    if !(fov.radius.is_finite() && fov.radius > 0.0) {
        return Err(SimError::InvalidFovRadius {
            fov_radius: fov.radius,
        });
    }

    let delta = ground_delta(target_position, &fov.center);
    // hypot 避免 dx² + dy² 在有限坐标下溢出为 inf
    let euclidean_distance = delta.x.hypot(delta.y);
    Ok(VisibilitySample {
        hit: euclidean_distance <= fov.radius,
        euclidean_distance,
        manhattan_distance: delta.x.abs() + delta.y.abs(),
        fov_offset: delta / fov.radius,
    })
}
