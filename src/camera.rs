// src/camera.rs

use crate::error::SimError;
use nalgebra::{Point3, Unit, Vector2};
use serde::{Deserialize, Serialize};

const COMPONENT: &str = "camera";

/// 航向向量长度低于此值时视为原地不动
const MIN_HEADING_NORM: f64 = 1e-12;

/// 机载相机的固定参数：视线与水平轴的夹角（度）以及地面视场圆的半径。
///
/// 只能通过 [`CameraParameters::new`] 构造（反序列化时同样校验），构造后不可修改。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCameraParameters")]
pub struct CameraParameters {
    angle_degrees: f64,
    fov_radius: f64,
}

#[derive(Deserialize)]
struct RawCameraParameters {
    angle_degrees: f64,
    fov_radius: f64,
}

impl TryFrom<RawCameraParameters> for CameraParameters {
    type Error = SimError;

    fn try_from(raw: RawCameraParameters) -> Result<Self, Self::Error> {
        Self::new(raw.angle_degrees, raw.fov_radius)
    }
}

impl Default for CameraParameters {
    fn default() -> Self {
        Self {
            angle_degrees: 70.0,
            fov_radius: 1.0,
        }
    }
}

impl CameraParameters {
    /// # 参数
    /// * `angle_degrees` - 视线与水平轴的夹角，取值 (0, 90]，90 表示垂直向下。
    /// * `fov_radius` - 地面视场圆半径，必须为正。
    pub fn new(angle_degrees: f64, fov_radius: f64) -> Result<Self, SimError> {
        if !(angle_degrees.is_finite() && angle_degrees > 0.0 && angle_degrees <= 90.0) {
            return Err(SimError::InvalidCameraAngle { angle_degrees });
        }
        if !(fov_radius.is_finite() && fov_radius > 0.0) {
            return Err(SimError::InvalidFovRadius { fov_radius });
        }
        Ok(Self {
            angle_degrees,
            fov_radius,
        })
    }

    pub fn angle_degrees(&self) -> f64 {
        self.angle_degrees
    }

    pub fn fov_radius(&self) -> f64 {
        self.fov_radius
    }

    /// 将视场投影到地面。
    ///
    /// 视场中心位于无人机正下方沿航向偏移 `height / tan(angle)` 处，z 恒为 0，
    /// 半径恒为 `fov_radius`，与高度和角度无关。
    ///
    /// # 参数
    /// * `uav_position` - 无人机当前位置，z 为离地高度。
    /// * `heading` - 无人机航向在地面上的单位向量。
    ///
    /// # 返回值
    /// 当前时间步的 `FovState`；位置含非有限值或低于地面时返回 `SimError::InvalidPosition`。
    pub fn project(
        &self,
        uav_position: &Point3<f64>,
        heading: &Unit<Vector2<f64>>,
    ) -> Result<FovState, SimError> {
        if !uav_position.coords.iter().all(|c| c.is_finite()) || uav_position.z < 0.0 {
            return Err(SimError::position(COMPONENT, uav_position));
        }
        let offset = horizontal_offset(uav_position.z, self.angle_degrees);
        Ok(FovState {
            center: Point3::new(
                uav_position.x + heading.x * offset,
                uav_position.y + heading.y * offset,
                0.0,
            ),
            radius: self.fov_radius,
        })
    }
}

/// 某一时间步的地面视场圆。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FovState {
    pub center: Point3<f64>,
    pub radius: f64,
}

/// 校验相机参数后投影视场，等价于 `CameraParameters::new(..)?.project(..)`。
pub fn project(
    uav_position: &Point3<f64>,
    heading: &Unit<Vector2<f64>>,
    angle_degrees: f64,
    fov_radius: f64,
) -> Result<FovState, SimError> {
    CameraParameters::new(angle_degrees, fov_radius)?.project(uav_position, heading)
}

/// 视线与地面交点相对无人机正下方的水平距离。
///
/// 90 度时严格为 0（`f64` 中 `tan(π/2)` 是有限值，需要单独处理）。
/// 角度很小时结果很大但仍有限，不做截断。
pub fn horizontal_offset(height: f64, angle_degrees: f64) -> f64 {
    if angle_degrees == 90.0 {
        0.0
    } else {
        height / angle_degrees.to_radians().tan()
    }
}

/// 由航迹计算每个时间步的地面航向。
///
/// 第 i 步取 i → i+1 的水平方向，最后一步取 i-1 → i；
/// 水平位移为 0 时沿用上一步的航向，尚未移动时默认 +x 方向。
pub fn ground_headings(route: &[Point3<f64>]) -> Vec<Unit<Vector2<f64>>> {
    let mut heading = Vector2::x_axis();
    let mut headings = Vec::with_capacity(route.len());

    for i in 0..route.len() {
        let (from, to) = if i + 1 < route.len() {
            (route[i], route[i + 1])
        } else if i > 0 {
            (route[i - 1], route[i])
        } else {
            (route[i], route[i])
        };
        let delta = Vector2::new(to.x - from.x, to.y - from.y);
        if let Some(unit) = Unit::try_new(delta, MIN_HEADING_NORM) {
            heading = unit;
        }
        headings.push(heading);
    }
    headings
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_straight_down_is_directly_below() {
        let fov = project(&Point3::new(3.0, 4.0, 10.0), &Vector2::x_axis(), 90.0, 5.0).unwrap();
        assert_eq!(fov.center, Point3::new(3.0, 4.0, 0.0));
        assert_eq!(fov.radius, 5.0);
    }

    // 45 度、高度 10：沿航向偏移 10
    #[test]
    fn test_forty_five_degrees_offset() {
        let heading = Unit::new_normalize(Vector2::new(0.0, 1.0));
        let fov = project(&Point3::new(0.0, 0.0, 10.0), &heading, 45.0, 1.0).unwrap();
        assert_relative_eq!(fov.center.x, 0.0);
        assert_relative_eq!(fov.center.y, 10.0, epsilon = 1e-12);
        assert_eq!(fov.center.z, 0.0);
    }

    #[test]
    fn test_offset_decreases_towards_vertical() {
        let mut previous = f64::INFINITY;
        for angle in [5.0, 20.0, 45.0, 60.0, 80.0, 89.9, 90.0] {
            let offset = horizontal_offset(25.0, angle);
            assert!(offset < previous);
            previous = offset;
        }
        assert_eq!(previous, 0.0);
    }

    #[test]
    fn test_shallow_angle_gives_large_finite_offset() {
        let offset = horizontal_offset(1000.0, 1e-6);
        assert!(offset.is_finite());
        assert!(offset > 1e10);
    }

    #[test]
    fn test_invalid_angles() {
        for angle in [0.0, -10.0, 90.5, f64::NAN] {
            let err = CameraParameters::new(angle, 1.0).unwrap_err();
            assert!(matches!(err, SimError::InvalidCameraAngle { .. }));
        }
    }

    #[test]
    fn test_invalid_radius() {
        for radius in [0.0, -1.0, f64::INFINITY] {
            let err = CameraParameters::new(45.0, radius).unwrap_err();
            assert!(matches!(err, SimError::InvalidFovRadius { .. }));
        }
    }

    #[test]
    fn test_uav_below_ground_rejected() {
        let camera = CameraParameters::new(60.0, 1.0).unwrap();
        let err = camera
            .project(&Point3::new(0.0, 0.0, -1.0), &Vector2::x_axis())
            .unwrap_err();
        assert!(matches!(err, SimError::InvalidPosition { component: "camera", .. }));
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: CameraParameters =
            serde_json::from_str(r#"{"angle_degrees": 45.0, "fov_radius": 2.0}"#).unwrap();
        assert_eq!(ok.fov_radius(), 2.0);
        assert!(serde_json::from_str::<CameraParameters>(
            r#"{"angle_degrees": 0.0, "fov_radius": 2.0}"#
        )
        .is_err());
    }

    #[test]
    fn test_ground_headings() {
        let route = [
            Point3::new(0.0, 0.0, 5.0),
            Point3::new(0.0, 0.0, 6.0), // 竖直爬升，没有水平位移
            Point3::new(0.0, 2.0, 6.0),
            Point3::new(0.0, 2.0, 6.0),
            Point3::new(-3.0, 2.0, 6.0),
        ];
        let headings = ground_headings(&route);
        assert_eq!(headings.len(), 5);
        assert_eq!(headings[0].into_inner(), Vector2::new(1.0, 0.0));
        assert_eq!(headings[1].into_inner(), Vector2::new(0.0, 1.0));
        assert_eq!(headings[2].into_inner(), Vector2::new(0.0, 1.0));
        assert_eq!(headings[3].into_inner(), Vector2::new(-1.0, 0.0));
        assert_eq!(headings[4].into_inner(), Vector2::new(-1.0, 0.0));
    }
}
