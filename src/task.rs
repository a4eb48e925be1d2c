// 该文件是 Hakoe （箱绘） 项目的一部分。
// src/task.rs - 采集、推理、渲染任务
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::{thread, time::Duration};
use tracing::{info, warn};

use crate::{
  frame::Frame,
  geometry::{Size, fit_rect},
  input::CaptureSource,
  model::{DetectResult, Model},
  output::Render,
  projection::display_detections,
};

pub trait Task<I, M, O>: Sized {
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<(), Self::Error>;
}

/// 记录图像在显示区域中的位置和每个叠加框
fn log_overlays(frame: &Frame, result: &DetectResult, area: Size) {
  let fit = fit_rect(Some(Size::from((frame.width(), frame.height()))), area);
  info!(
    "显示区域 {}x{} 中的图像位置: ({:.1}, {:.1}) {:.1}x{:.1}",
    area.width, area.height, fit.rect.x, fit.rect.y, fit.rect.width, fit.rect.height
  );
  if fit.is_placeholder() {
    warn!("显示区域退化，跳过叠加框");
    return;
  }
  for overlay in display_detections(&result.items, &fit) {
    info!(
      "  - {} at ({:.1}, {:.1}, {:.1}x{:.1})",
      overlay.caption(),
      overlay.rect.x,
      overlay.rect.y,
      overlay.rect.width,
      overlay.rect.height
    );
  }
}

#[derive(Debug, Default)]
pub struct OneShotTask {
  area: Option<Size>,
}

impl OneShotTask {
  pub fn with_area(mut self, area: Option<Size>) -> Self {
    self.area = area;
    self
  }
}

impl<
  CE: std::error::Error + Sync + Send + 'static,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: CaptureSource<Error = CE>,
  M: Model<Input = Frame, Output = DetectResult, Error = ME>,
  O: Render<Frame, DetectResult, Error = RE>,
> Task<I, M, O> for OneShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let frame = input.capture()?.into_normalized();
    info!("输入帧获取成功，开始推理...");
    let now = std::time::Instant::now();
    let result = model.infer(&frame)?;
    let elapsed = now.elapsed();
    info!("推理完成，检测到 {} 个目标，耗时: {:.2?}", result.len(), elapsed);
    if let Some(area) = self.area {
      log_overlays(&frame, &result, area);
    }
    output.render_result(&frame, &result)?;
    info!("渲染完成，耗时: {:.2?}", now.elapsed());

    Ok(())
  }
}

#[derive(Default, Debug)]
pub struct ContinuousTask {
  frame_number: Option<usize>,
  area: Option<Size>,
  interval: Option<Duration>,
  handle_interrupt: bool,
}

impl ContinuousTask {
  pub fn with_frame_number(mut self, frame_number: Option<usize>) -> Self {
    self.frame_number = frame_number;
    self
  }

  pub fn with_area(mut self, area: Option<Size>) -> Self {
    self.area = area;
    self
  }

  /// 两次采集之间的间隔
  pub fn with_interval(mut self, interval: Option<Duration>) -> Self {
    self.interval = interval;
    self
  }

  /// 安装 Ctrl-C 处理，收到信号后结束循环。进程内只能安装一次。
  pub fn with_interrupt(mut self, handle_interrupt: bool) -> Self {
    self.handle_interrupt = handle_interrupt;
    self
  }
}

impl<
  CE: std::error::Error + Sync + Send + 'static,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: CaptureSource<Error = CE>,
  M: Model<Input = Frame, Output = DetectResult, Error = ME>,
  O: Render<Frame, DetectResult, Error = RE>,
> Task<I, M, O> for ContinuousTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let (tx, rx) = std::sync::mpsc::channel();

    if self.handle_interrupt {
      ctrlc::set_handler(move || {
        info!("收到中断信号，准备退出...");
        let _ = tx.send(());
        thread::spawn(|| {
          thread::sleep(Duration::from_secs(30));
          warn!("强制退出程序");
          std::process::exit(1);
        });
      })?;
    }

    let mut frame_index = 0usize;
    let mut now = std::time::Instant::now();
    loop {
      if self.frame_number.is_some_and(|n| frame_index >= n) {
        info!("达到指定帧数 {}, 退出任务循环", frame_index);
        break;
      }
      if rx.try_recv().is_ok() {
        warn!("中断信号接收，退出任务循环");
        break;
      }

      let frame = input.capture()?.into_normalized();
      frame_index += 1;
      info!("处理第 {} 帧图像", frame_index);
      let result = model.infer(&frame)?;
      let elapsed_a = now.elapsed();
      if let Some(area) = self.area {
        log_overlays(&frame, &result, area);
      }
      output.render_result(&frame, &result)?;
      let elapsed_b = now.elapsed();
      info!("推理完成，耗时: {:.2?} / {:.2?}", elapsed_a, elapsed_b);

      if let Some(interval) = self.interval {
        thread::sleep(interval);
      }
      now = std::time::Instant::now();
    }

    info!("任务完成，退出");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    geometry::NormalizedRect,
    input::FixtureInput,
    model::{Detection, FixtureModel},
  };
  use image::RgbImage;
  use std::sync::Mutex;

  #[derive(Default)]
  struct Collect {
    seen: Mutex<Vec<(u32, u32, usize)>>,
  }

  impl Render<Frame, DetectResult> for &Collect {
    type Error = std::io::Error;

    fn render_result(&self, frame: &Frame, result: &DetectResult) -> Result<(), Self::Error> {
      self
        .seen
        .lock()
        .unwrap()
        .push((frame.width(), frame.height(), result.len()));
      Ok(())
    }
  }

  fn model() -> FixtureModel {
    FixtureModel::new(vec![Detection::new(
      "dog",
      0.9,
      NormalizedRect::new(0.1, 0.1, 0.2, 0.2),
    )])
  }

  #[test]
  fn one_shot_renders_once() {
    let collect = Collect::default();
    let input = FixtureInput::new(Frame::new(RgbImage::new(12, 8)));
    OneShotTask::default()
      .with_area(Some(Size::new(390.0, 300.0)))
      .run_task(input, model(), &collect)
      .unwrap();
    assert_eq!(*collect.seen.lock().unwrap(), vec![(12, 8, 1)]);
  }

  #[test]
  fn continuous_stops_at_frame_number() {
    let collect = Collect::default();
    let input = FixtureInput::new(Frame::new(RgbImage::new(4, 4)));
    ContinuousTask::default()
      .with_frame_number(Some(3))
      .run_task(input, model(), &collect)
      .unwrap();
    assert_eq!(collect.seen.lock().unwrap().len(), 3);
  }
}
