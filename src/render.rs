// src/render.rs

use crate::error::RenderError;
use crate::simulation::RunData;
use crate::visibility::VisibilitySample;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// 渲染入口。实现者只读取已完成的运行数据，不回调仿真内部。
pub trait Renderer {
    fn render(&mut self, data: &RunData) -> Result<(), RenderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// 元素在该主题下的 CSS 颜色名。
    pub fn color(self, element: Element) -> &'static str {
        use Element::*;
        match (element, self) {
            (Background, Theme::Light) => "lightgray",
            (Background, Theme::Dark) => "black",
            (Foreground, Theme::Light) => "black",
            (Foreground, Theme::Dark) => "white",
            (Uav, Theme::Light) => "darkorchid",
            (Uav, Theme::Dark) => "magenta",
            (UavGroundTrace, Theme::Light) => "slategray",
            (UavGroundTrace, Theme::Dark) => "snow",
            (Target, Theme::Light) => "lime",
            (Target, Theme::Dark) => "greenyellow",
            (UavCameraFov, Theme::Light) => "royalblue",
            (UavCameraFov, Theme::Dark) => "cornflowerblue",
        }
    }
}

/// 画面中可着色的元素。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    Background,
    Foreground,
    Uav,
    UavGroundTrace,
    Target,
    UavCameraFov,
}

impl Element {
    pub fn label(self) -> &'static str {
        match self {
            Element::Background => "background",
            Element::Foreground => "foreground",
            Element::Uav => "UAV",
            Element::UavGroundTrace => "UAV ground trace",
            Element::Target => "target",
            Element::UavCameraFov => "camera FOV",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegendEntry {
    pub element: Element,
    pub label: &'static str,
    pub color: &'static str,
}

/// 图例：无人机、目标、无人机地面轨迹、相机视场。
pub fn legend(theme: Theme) -> Vec<LegendEntry> {
    [
        Element::Uav,
        Element::Target,
        Element::UavGroundTrace,
        Element::UavCameraFov,
    ]
    .into_iter()
    .map(|element| LegendEntry {
        element,
        label: element.label(),
        color: theme.color(element),
    })
    .collect()
}

/// 动画中的一帧，对应一个时间步。
///
/// 轨迹尾迹即各航迹数组的 `[..trail_length]` 切片。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub step: usize,
    /// 截至本帧（含）已绘制的航点数
    pub trail_length: usize,
    pub uav: Point3<f64>,
    pub ground_trace: Point3<f64>,
    pub fov_center: Point3<f64>,
    pub fov_radius: f64,
    pub target: Point3<f64>,
    pub visibility: VisibilitySample,
}

/// 按时间步顺序产生动画帧。
pub fn frames(data: &RunData) -> impl Iterator<Item = Frame> + '_ {
    let uav = &data.uav;
    (0..data.step_count()).map(move |step| Frame {
        step,
        trail_length: step + 1,
        uav: uav.route[step],
        ground_trace: uav.ground_trace_route[step],
        fov_center: uav.fov_centers[step],
        fov_radius: uav.fov_radius,
        target: data.target.route[step],
        visibility: uav.visibility[step],
    })
}

/// 每帧输出一行 CSV。
pub struct CsvRenderer<W: Write> {
    writer: W,
}

impl<W: Write> CsvRenderer<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Renderer for CsvRenderer<W> {
    fn render(&mut self, data: &RunData) -> Result<(), RenderError> {
        writeln!(
            self.writer,
            "Step,UavX,UavY,UavZ,FovX,FovY,FovRadius,TargetX,TargetY,Euclidean,Manhattan,Hit"
        )?;
        for frame in frames(data) {
            writeln!(
                self.writer,
                "{},{},{},{},{},{},{},{},{},{},{},{}",
                frame.step,
                frame.uav.x,
                frame.uav.y,
                frame.uav.z,
                frame.fov_center.x,
                frame.fov_center.y,
                frame.fov_radius,
                frame.target.x,
                frame.target.y,
                frame.visibility.euclidean_distance,
                frame.visibility.manhattan_distance,
                frame.visibility.hit
            )?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{simulate, SimulationConfig};

    #[test]
    fn test_theme_parsed_by_name() {
        use clap::ValueEnum;
        assert_eq!(Theme::from_str("dark", true).unwrap(), Theme::Dark);
        assert_eq!(Theme::from_str("light", true).unwrap(), Theme::Light);
        assert!(Theme::from_str("solarized", true).is_err());
        assert_eq!(Theme::default(), Theme::Light);
        assert_eq!(Theme::Dark.color(Element::Uav), "magenta");
    }

    #[test]
    fn test_legend_entries() {
        let legend = legend(Theme::Light);
        let labels: Vec<_> = legend.iter().map(|e| e.label).collect();
        assert_eq!(labels, ["UAV", "target", "UAV ground trace", "camera FOV"]);
        assert_eq!(legend[1].color, "lime");
    }

    #[test]
    fn test_csv_renderer_writes_one_row_per_step() {
        let config = SimulationConfig {
            step_count: 25,
            seed: Some(3),
            ..Default::default()
        };
        let data = simulate(&config).unwrap();
        let mut renderer = CsvRenderer::new(Vec::new());
        renderer.render(&data).unwrap();
        let text = String::from_utf8(renderer.into_inner()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 26);
        assert!(lines[0].starts_with("Step,"));
        assert!(lines[1].starts_with("0,0,0,0,"));
    }

    #[test]
    fn test_frames_are_step_aligned() {
        let data = simulate(&SimulationConfig {
            step_count: 40,
            seed: Some(9),
            ..Default::default()
        })
        .unwrap();
        for frame in frames(&data) {
            assert_eq!(frame.uav.x, frame.ground_trace.x);
            assert_eq!(frame.ground_trace.z, 0.0);
            assert_eq!(frame.fov_center, data.uav.fov_centers[frame.step]);
            assert_eq!(frame.trail_length, frame.step + 1);
            assert_eq!(data.uav.route[..frame.trail_length].last(), Some(&frame.uav));
        }
        assert_eq!(frames(&data).count(), 40);
    }
}
