// src/route_generator.rs

use crate::error::SimError;
use nalgebra::{Point3, Vector3};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

const COMPONENT: &str = "route_generator";

/// 运动实体的类别：空中实体可以离开地面，地面实体的 z 恒为 0。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Aerial,
    Ground,
}

/// 航迹形状及其参数。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum RouteShape {
    /// 每步在各轴上的位移服从 [0, max_step) 均匀分布，并随机插入 90 度转弯
    RandomWalk { start: Point3<f64>, max_step: f64 },
    /// 从 start 朝 end 方向匀速直线运动
    Linear {
        start: Point3<f64>,
        end: Point3<f64>,
        velocity: f64,
        dt: f64,
    },
    /// 绕 center 的水平圆周运动，高度取 center.z
    Orbit {
        center: Point3<f64>,
        radius: f64,
        velocity: f64,
        dt: f64,
    },
    /// 从经过 start 的圆逐步过渡到经过 end 的圆
    SpiralOrbit {
        start: Point3<f64>,
        end: Point3<f64>,
        center: Point3<f64>,
        dt: f64,
    },
    /// 依次经过各检查点，第 k 段以 velocities[k] 飞行
    Checkpoints {
        points: Vec<Point3<f64>>,
        velocities: Vec<f64>,
        dt: f64,
    },
}

impl RouteShape {
    /// 形状名称，与配置中 `shape` 字段的取值一致。
    pub fn name(&self) -> &'static str {
        match self {
            RouteShape::RandomWalk { .. } => "random_walk",
            RouteShape::Linear { .. } => "linear",
            RouteShape::Orbit { .. } => "orbit",
            RouteShape::SpiralOrbit { .. } => "spiral_orbit",
            RouteShape::Checkpoints { .. } => "checkpoints",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteParams {
    pub kind: EntityKind,
    #[serde(flatten)]
    pub shape: RouteShape,
}

impl RouteParams {
    pub fn aerial(shape: RouteShape) -> Self {
        Self {
            kind: EntityKind::Aerial,
            shape,
        }
    }

    pub fn ground(shape: RouteShape) -> Self {
        Self {
            kind: EntityKind::Ground,
            shape,
        }
    }
}

/// 一条离散时间航迹，每个时间步一个航点。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Route {
    waypoints: Vec<Point3<f64>>,
}

impl Route {
    pub fn waypoints(&self) -> &[Point3<f64>] {
        &self.waypoints
    }

    pub fn into_waypoints(self) -> Vec<Point3<f64>> {
        self.waypoints
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// 航迹上最低的 z 值。空航迹返回 +inf。
    pub fn min_height(&self) -> f64 {
        self.waypoints.iter().map(|p| p.z).fold(f64::INFINITY, f64::min)
    }

    /// 航迹上最高的 z 值。空航迹返回 -inf。
    pub fn max_height(&self) -> f64 {
        self.waypoints
            .iter()
            .map(|p| p.z)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// 地面投影（z 置 0 的航迹）。
    pub fn ground_trace(&self) -> Route {
        Route {
            waypoints: self
                .waypoints
                .iter()
                .map(|p| Point3::new(p.x, p.y, 0.0))
                .collect(),
        }
    }
}

impl From<Vec<Point3<f64>>> for Route {
    fn from(waypoints: Vec<Point3<f64>>) -> Self {
        Self { waypoints }
    }
}

/// 按给定形状生成一条航迹。
///
/// 随机成分全部取自调用方传入的 `rng`，相同种子的生成器会得到相同的航迹。
///
/// # 参数
/// * `step_count` - 时间步数，至少为 1。
/// * `params` - 实体类别与航迹形状。
/// * `rng` - 随机数生成器。
///
/// # 返回值
/// 长度恰为 `step_count` 的 `Route`；地面实体的每个航点 z 都为 0。
/// 步数或形状参数非法时返回 `SimError::InvalidConfiguration`。
pub fn generate_route<R: Rng + ?Sized>(
    step_count: usize,
    params: &RouteParams,
    rng: &mut R,
) -> Result<Route, SimError> {
    if step_count < 1 {
        return Err(SimError::configuration(
            COMPONENT,
            format!("step_count must be >= 1, got {step_count}"),
        ));
    }

    let mut waypoints = match &params.shape {
        RouteShape::RandomWalk { start, max_step } => {
            random_walk(step_count, start, *max_step, params.kind, rng)?
        }
        RouteShape::Linear {
            start,
            end,
            velocity,
            dt,
        } => linear(step_count, start, end, *velocity, *dt)?,
        RouteShape::Orbit {
            center,
            radius,
            velocity,
            dt,
        } => orbit(step_count, center, *radius, *velocity, *dt)?,
        RouteShape::SpiralOrbit {
            start,
            end,
            center,
            dt,
        } => spiral_orbit(step_count, start, end, center, *dt)?,
        RouteShape::Checkpoints {
            points,
            velocities,
            dt,
        } => checkpoints(step_count, points, velocities, *dt)?,
    };

    if params.kind == EntityKind::Ground {
        for p in &mut waypoints {
            p.z = 0.0;
        }
    }

    // 参数各自有限，累积后仍可能溢出
    if let Some((step, p)) = waypoints
        .iter()
        .enumerate()
        .find(|(_, p)| !p.coords.iter().all(|c| c.is_finite()))
    {
        return Err(SimError::configuration(
            COMPONENT,
            format!(
                "{} route overflows at step {step}: ({}, {}, {})",
                params.shape.name(),
                p.x,
                p.y,
                p.z
            ),
        ));
    }

    let route = Route { waypoints };
    debug!(
        kind = ?params.kind,
        steps = route.len(),
        min_height = route.min_height(),
        max_height = route.max_height(),
        "route generated"
    );
    Ok(route)
}

fn random_walk<R: Rng + ?Sized>(
    n: usize,
    start: &Point3<f64>,
    max_step: f64,
    kind: EntityKind,
    rng: &mut R,
) -> Result<Vec<Point3<f64>>, SimError> {
    ensure_finite_point("start", start)?;
    if !(max_step.is_finite() && max_step >= 0.0) {
        return Err(SimError::configuration(
            COMPONENT,
            format!("max_step must be finite and >= 0, got {max_step}"),
        ));
    }

    let mut steps: Vec<Vector3<f64>> = (0..n)
        .map(|_| {
            let dx = rng.gen::<f64>() * max_step;
            let dy = rng.gen::<f64>() * max_step;
            let dz = match kind {
                EntityKind::Aerial => rng.gen::<f64>() * max_step,
                EntityKind::Ground => 0.0,
            };
            Vector3::new(dx, dy, dz)
        })
        .collect();
    insert_random_turns(&mut steps, rng);

    let mut position = *start;
    let mut route: Vec<Point3<f64>> = steps
        .iter()
        .map(|step| {
            position += *step;
            position
        })
        .collect();

    if kind == EntityKind::Aerial {
        cap_random_altitude(&mut route, rng);
    }
    Ok(route)
}

/// 在位移序列中随机插入左转或右转：一个水平分量清零，另一个乘 3，竖直分量清零。
fn insert_random_turns<R: Rng + ?Sized>(steps: &mut [Vector3<f64>], rng: &mut R) {
    let n = steps.len();
    let max_turns = n / 100;
    if max_turns == 0 {
        return;
    }
    let number_of_turns = rng.gen_range(0..max_turns);
    let turn_duration = if n > 50 { n / 50 } else { 1 };

    for _ in 0..number_of_turns {
        let turn_start = rng.gen_range(0..n);
        let axis = rng.gen_range(0..2);
        let turn_end = (turn_start + turn_duration).min(n);
        for step in &mut steps[turn_start..turn_end] {
            step[axis] = 0.0;
            step[1 - axis] *= 3.0;
            step.z = 0.0;
        }
    }
}

/// 随机选定停止爬升的时刻，此后高度保持不变。
fn cap_random_altitude<R: Rng + ?Sized>(route: &mut [Point3<f64>], rng: &mut R) {
    let half = route.len() / 2;
    if half == 0 {
        return;
    }
    let stop = rng.gen_range(0..half);
    let ceiling = route[stop].z;
    for p in &mut route[stop + 1..] {
        p.z = ceiling;
    }
}

fn linear(
    n: usize,
    start: &Point3<f64>,
    end: &Point3<f64>,
    velocity: f64,
    dt: f64,
) -> Result<Vec<Point3<f64>>, SimError> {
    ensure_finite_point("start", start)?;
    ensure_finite_point("end", end)?;
    ensure_non_negative("velocity", velocity)?;
    ensure_positive("dt", dt)?;

    let displacement = end - start;
    let length = displacement.norm();
    if length == 0.0 {
        return Err(SimError::configuration(
            COMPONENT,
            "linear route needs distinct start and end points",
        ));
    }
    let direction = displacement / length;
    let step_size = velocity * dt;

    Ok((0..n)
        .map(|i| start + direction * (step_size * i as f64))
        .collect())
}

fn orbit(
    n: usize,
    center: &Point3<f64>,
    radius: f64,
    velocity: f64,
    dt: f64,
) -> Result<Vec<Point3<f64>>, SimError> {
    ensure_finite_point("center", center)?;
    ensure_positive("radius", radius)?;
    ensure_finite("velocity", velocity)?;
    ensure_positive("dt", dt)?;

    let angular_velocity = velocity / radius;
    Ok((0..n)
        .map(|i| {
            let angle = angular_velocity * i as f64 * dt;
            center + Vector3::new(radius * angle.cos(), radius * angle.sin(), 0.0)
        })
        .collect())
}

fn spiral_orbit(
    n: usize,
    start: &Point3<f64>,
    end: &Point3<f64>,
    center: &Point3<f64>,
    dt: f64,
) -> Result<Vec<Point3<f64>>, SimError> {
    ensure_finite_point("start", start)?;
    ensure_finite_point("end", end)?;
    ensure_finite_point("center", center)?;
    ensure_positive("dt", dt)?;

    let displacement_start = start - center;
    let displacement_end = end - center;
    let radius_start = displacement_start.norm();
    let radius_end = displacement_end.norm();
    if radius_start == 0.0 || radius_end == 0.0 {
        return Err(SimError::configuration(
            COMPONENT,
            "spiral orbit start and end must differ from its center",
        ));
    }

    // 角速度取位移在水平面上的分量与半径之比
    let up = Vector3::z();
    let angular_velocity_start = displacement_start.cross(&up).norm() / radius_start;
    let angular_velocity_end = displacement_end.cross(&up).norm() / radius_end;

    Ok((0..n)
        .map(|i| {
            let t = i as f64 * dt;
            let angle_start = angular_velocity_start * t;
            let angle_end = angular_velocity_end * t;
            let on_start = center
                + Vector3::new(
                    radius_start * angle_start.cos(),
                    radius_start * angle_start.sin(),
                    0.0,
                );
            let on_end = center
                + Vector3::new(
                    radius_end * angle_end.cos(),
                    radius_end * angle_end.sin(),
                    0.0,
                );
            let blend = i as f64 / n as f64;
            Point3::from(on_start.coords * (1.0 - blend) + on_end.coords * blend)
        })
        .collect())
}

fn checkpoints(
    n: usize,
    points: &[Point3<f64>],
    velocities: &[f64],
    dt: f64,
) -> Result<Vec<Point3<f64>>, SimError> {
    if points.len() < 2 {
        return Err(SimError::configuration(
            COMPONENT,
            format!("checkpoint route needs at least 2 points, got {}", points.len()),
        ));
    }
    if velocities.len() != points.len() - 1 {
        return Err(SimError::configuration(
            COMPONENT,
            format!(
                "checkpoint route needs one velocity per leg: {} points, {} velocities",
                points.len(),
                velocities.len()
            ),
        ));
    }
    for p in points {
        ensure_finite_point("checkpoint", p)?;
    }
    for &v in velocities {
        ensure_positive("velocity", v)?;
    }
    ensure_positive("dt", dt)?;

    // 每段航段的 (起始时刻, 结束时刻)
    let mut legs = Vec::with_capacity(velocities.len());
    let mut elapsed = 0.0;
    for (pair, &v) in points.windows(2).zip(velocities) {
        let duration = (pair[1] - pair[0]).norm() / v;
        legs.push((elapsed, elapsed + duration));
        elapsed += duration;
    }
    let last = points[points.len() - 1];

    Ok((0..n)
        .map(|i| {
            let t = i as f64 * dt;
            legs.iter()
                .position(|&(_, leg_end)| t < leg_end)
                .map_or(last, |k| {
                    let (leg_start, leg_end) = legs[k];
                    let progress = (t - leg_start) / (leg_end - leg_start);
                    points[k] + (points[k + 1] - points[k]) * progress
                })
        })
        .collect())
}

fn ensure_finite(name: &str, value: f64) -> Result<(), SimError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SimError::configuration(
            COMPONENT,
            format!("{name} must be finite, got {value}"),
        ))
    }
}

fn ensure_positive(name: &str, value: f64) -> Result<(), SimError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::configuration(
            COMPONENT,
            format!("{name} must be finite and > 0, got {value}"),
        ))
    }
}

fn ensure_non_negative(name: &str, value: f64) -> Result<(), SimError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimError::configuration(
            COMPONENT,
            format!("{name} must be finite and >= 0, got {value}"),
        ))
    }
}

fn ensure_finite_point(name: &str, p: &Point3<f64>) -> Result<(), SimError> {
    if p.coords.iter().all(|c| c.is_finite()) {
        Ok(())
    } else {
        Err(SimError::configuration(
            COMPONENT,
            format!("{name} must have finite coordinates, got ({}, {}, {})", p.x, p.y, p.z),
        ))
    }
}
