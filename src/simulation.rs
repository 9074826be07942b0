// src/simulation.rs

use crate::camera::{ground_headings, CameraParameters};
use crate::error::{RenderError, SimError};
use crate::render::Renderer;
use crate::route_generator::{generate_route, RouteParams, RouteShape};
use crate::visibility::{evaluate, VisibilitySample};
use nalgebra::Point3;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, trace, warn};

/// 一次仿真运行的全部配置。运行开始后不再改变。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// 两个实体共用的时间步数
    pub step_count: usize,
    pub camera: CameraParameters,
    pub uav: RouteParams,
    pub target: RouteParams,
    /// 随机种子；为 None 时每次运行使用新的种子
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            step_count: 300,
            camera: CameraParameters::default(),
            uav: RouteParams::aerial(RouteShape::Checkpoints {
                points: vec![
                    Point3::new(0.0, 0.0, 0.0),
                    Point3::new(5.0, 12.0, 20.0),
                    Point3::new(10.0, 5.0, 20.0),
                    Point3::new(13.0, 20.0, 25.0),
                    Point3::new(18.0, 13.0, 25.0),
                    Point3::new(23.0, 21.0, 25.0),
                ],
                velocities: vec![2.0, 3.0, 4.0, 2.0, 1.5],
                dt: 0.1,
            }),
            target: RouteParams::ground(RouteShape::Checkpoints {
                points: vec![
                    Point3::new(0.0, 0.0, 0.0),
                    Point3::new(9.0, 13.0, 0.0),
                    Point3::new(20.0, 19.0, 0.0),
                    Point3::new(10.0, 25.0, 0.0),
                    Point3::new(18.0, 10.0, 0.0),
                    Point3::new(30.0, 30.0, 0.0),
                ],
                velocities: vec![3.0, 2.0, 2.0, 5.0, 1.0],
                dt: 0.1,
            }),
            seed: None,
        }
    }
}

/// 运行数据中的无人机部分。所有数组按时间步对齐。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UavRunData {
    pub route: Vec<Point3<f64>>,
    pub ground_trace_route: Vec<Point3<f64>>,
    pub fov_centers: Vec<Point3<f64>>,
    pub fov_radius: f64,
    pub fov_angle_degrees: f64,
    pub min_height: f64,
    pub max_height: f64,
    pub visibility: Vec<VisibilitySample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetRunData {
    pub route: Vec<Point3<f64>>,
}

/// 一次完整运行的结果，按实体分为 `UAV` 和 `target` 两部分。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunData {
    #[serde(rename = "UAV")]
    pub uav: UavRunData,
    pub target: TargetRunData,
}

impl RunData {
    pub fn step_count(&self) -> usize {
        self.uav.route.len()
    }

    /// 目标位于视场内的时间步数。
    pub fn hit_count(&self) -> usize {
        self.uav.visibility.iter().filter(|s| s.hit).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Configured,
    Running,
    Completed,
}

/// 仿真运行：`Configured → Running → Completed`，不可回退。
///
/// 运行失败时不保留任何部分结果，状态回到 `Configured`，原始错误原样返回。
#[derive(Debug)]
pub struct SimulationRun {
    config: SimulationConfig,
    state: RunState,
    data: Option<RunData>,
}

impl SimulationRun {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            state: RunState::Configured,
            data: None,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// 执行仿真并返回运行数据。已完成的运行直接返回已有数据，不会重新计算。
    pub fn run(&mut self) -> Result<&RunData, SimError> {
        let data = match self.data.take() {
            Some(data) => data,
            None => {
                self.state = RunState::Running;
                match simulate(&self.config) {
                    Ok(data) => data,
                    Err(err) => {
                        self.state = RunState::Configured;
                        warn!(error = %err, "simulation run aborted");
                        return Err(err);
                    }
                }
            }
        };
        self.state = RunState::Completed;
        let data: &RunData = self.data.insert(data);
        Ok(data)
    }

    /// 已完成运行的数据；未完成时为 None。
    pub fn run_data(&self) -> Option<&RunData> {
        self.data.as_ref()
    }

    pub fn into_run_data(self) -> Option<RunData> {
        self.data
    }

    /// 把已完成的运行数据交给渲染器，不会重新运行仿真。
    pub fn render<R: Renderer + ?Sized>(&self, renderer: &mut R) -> Result<(), RenderError> {
        let data = self.data.as_ref().ok_or(RenderError::NotCompleted)?;
        renderer.render(data)
    }
}

/// 配置并运行一次仿真，返回运行数据。
pub fn simulate(config: &SimulationConfig) -> Result<RunData, SimError> {
    let seed = config.seed.unwrap_or_else(|| thread_rng().gen());
    info!(seed, steps = config.step_count, "starting simulation run");
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    // 先生成无人机航迹，再生成目标航迹，保证同一种子下的结果一致
    let uav_route = generate_route(config.step_count, &config.uav, &mut rng)?;
    let target_route = generate_route(config.step_count, &config.target, &mut rng)?;

    let camera = config.camera;
    let headings = ground_headings(uav_route.waypoints());
    let mut fov_centers = Vec::with_capacity(config.step_count);
    let mut visibility = Vec::with_capacity(config.step_count);

    for (step, ((uav, target), heading)) in uav_route
        .waypoints()
        .iter()
        .zip(target_route.waypoints())
        .zip(&headings)
        .enumerate()
    {
        let fov = camera.project(uav, heading)?;
        let sample = evaluate(target, &fov)?;
        trace!(
            step,
            hit = sample.hit,
            distance = sample.euclidean_distance,
            "step evaluated"
        );
        fov_centers.push(fov.center);
        visibility.push(sample);
    }

    let ground_trace_route = uav_route.ground_trace().into_waypoints();
    let min_height = uav_route.min_height();
    let max_height = uav_route.max_height();

    let data = RunData {
        uav: UavRunData {
            route: uav_route.into_waypoints(),
            ground_trace_route,
            fov_centers,
            fov_radius: camera.fov_radius(),
            fov_angle_degrees: camera.angle_degrees(),
            min_height,
            max_height,
            visibility,
        },
        target: TargetRunData {
            route: target_route.into_waypoints(),
        },
    };
    info!(
        steps = data.step_count(),
        hits = data.hit_count(),
        min_height,
        max_height,
        "simulation run completed"
    );
    Ok(data)
}
