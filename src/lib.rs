// src/lib.rs

//! 无人机与地面目标追踪场景的航迹与视场几何仿真。
//!
//! 数据流：航迹生成（无人机）→ 相机视场投影 → 可见性评估 ← 航迹生成（目标），
//! 由 [`SimulationRun`] 逐步驱动并汇总为 [`RunData`]。

pub mod camera;
pub mod error;
pub mod export;
pub mod render;
pub mod route_generator;
pub mod simulation;
pub mod visibility;

pub use camera::{CameraParameters, FovState};
pub use error::{ExportError, RenderError, SimError};
pub use render::{CsvRenderer, Renderer, Theme};
pub use route_generator::{generate_route, EntityKind, Route, RouteParams, RouteShape};
pub use simulation::{simulate, RunData, RunState, SimulationConfig, SimulationRun};
pub use visibility::{evaluate, VisibilitySample};
