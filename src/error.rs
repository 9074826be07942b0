// src/error.rs

use thiserror::Error;

/// 仿真核心的错误类型。
///
/// 每个变体都标明出错的组件和非法的取值，调用方据此可以修正配置后重新运行。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// 步数或航迹形状参数非法
    #[error("{component}: invalid configuration: {reason}")]
    InvalidConfiguration {
        component: &'static str,
        reason: String,
    },

    /// 相机视线与水平轴夹角不在 (0, 90] 内
    #[error("camera: invalid angle {angle_degrees} degrees, expected 0 < angle <= 90")]
    InvalidCameraAngle { angle_degrees: f64 },

    /// 视场半径不是正数
    #[error("camera: invalid FOV radius {fov_radius}, expected a positive value")]
    InvalidFovRadius { fov_radius: f64 },

    /// 坐标不是有限值（或位置不合法，例如无人机低于地面）
    #[error("{component}: invalid position ({x}, {y}, {z})")]
    InvalidPosition {
        component: &'static str,
        x: f64,
        y: f64,
        z: f64,
    },
}

impl SimError {
    pub fn configuration(component: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            component,
            reason: reason.into(),
        }
    }

    pub fn position(component: &'static str, p: &nalgebra::Point3<f64>) -> Self {
        Self::InvalidPosition {
            component,
            x: p.x,
            y: p.y,
            z: p.z,
        }
    }
}

/// 运行数据导出的错误。
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("export serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// 渲染入口的错误。
#[derive(Debug, Error)]
pub enum RenderError {
    /// 仿真尚未完成，没有可渲染的数据
    #[error("render: simulation run has not completed")]
    NotCompleted,

    #[error("render I/O error: {0}")]
    Io(#[from] std::io::Error),
}
