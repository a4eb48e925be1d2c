// 该文件是 Hakoe （箱绘） 项目的一部分。
// src/session.rs - 采集、推理与显示之间的会话
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

//! 显示层只持有一个不可变的 [`CurrentFrame`]。每次采集、推理完成、显示区域变化或清除
//! 都会整体重建并替换它。推理在后台线程执行，结果通过 channel 送回；
//! 每条结果带有发起时的代数（generation），代数过期的结果直接丢弃。

use std::{
  sync::{
    Arc,
    mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError},
  },
  thread,
  time::{Duration, Instant},
};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
  frame::Frame,
  geometry::{FitRect, Size, fit_rect},
  input::CaptureSource,
  model::{DetectResult, Detection, Model},
  projection::{DisplayDetection, display_detections},
};

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum SessionError {
  #[error("采集失败: {0}")]
  Capture(#[source] BoxError),
  #[error("推理失败: {0}")]
  Inference(String),
  #[error("尚无图像")]
  NoImage,
  #[error("推理进行中")]
  Busy,
  #[error("等待推理结果超时")]
  Timeout,
  #[error("推理线程已断开")]
  Disconnected,
}

/// 某一时刻显示层看到的全部内容
#[derive(Debug, Clone)]
pub struct CurrentFrame {
  pub generation: u64,
  pub area: Size,
  /// 已规范化方向的图像
  pub frame: Option<Arc<Frame>>,
  pub detections: Arc<[Detection]>,
  pub fit: FitRect,
  pub overlays: Vec<DisplayDetection>,
  pub detecting: bool,
}

impl CurrentFrame {
  pub fn compose(
    generation: u64,
    area: Size,
    frame: Option<Arc<Frame>>,
    detections: Arc<[Detection]>,
    detecting: bool,
  ) -> Self {
    let image_size = frame
      .as_ref()
      .map(|f| Size::from((f.width(), f.height())));
    let fit = fit_rect(image_size, area);
    // 占位区域不参与投影
    let overlays = if fit.is_placeholder() {
      Vec::new()
    } else {
      display_detections(&detections, &fit)
    };

    Self {
      generation,
      area,
      frame,
      detections,
      fit,
      overlays,
      detecting,
    }
  }

  pub fn empty(area: Size) -> Self {
    Self::compose(0, area, None, Arc::from(Vec::new()), false)
  }

  pub fn has_image(&self) -> bool {
    self.frame.is_some()
  }

  fn with_area(&self, area: Size) -> Self {
    Self::compose(
      self.generation,
      area,
      self.frame.clone(),
      self.detections.clone(),
      self.detecting,
    )
  }

  fn with_detections(&self, detections: Arc<[Detection]>, detecting: bool) -> Self {
    Self::compose(
      self.generation,
      self.area,
      self.frame.clone(),
      detections,
      detecting,
    )
  }
}

#[derive(Debug)]
enum InferenceMessage {
  Finished {
    generation: u64,
    detections: Vec<Detection>,
    elapsed: Duration,
  },
  Failed {
    generation: u64,
    error: String,
  },
}

impl InferenceMessage {
  fn generation(&self) -> u64 {
    match self {
      InferenceMessage::Finished { generation, .. } | InferenceMessage::Failed { generation, .. } => {
        *generation
      }
    }
  }
}

pub struct Session<C, M> {
  source: C,
  model: Arc<M>,
  tx: Sender<InferenceMessage>,
  rx: Receiver<InferenceMessage>,
  next_generation: u64,
  current: Arc<CurrentFrame>,
  last_error: Option<String>,
}

impl<C, M, CE, ME> Session<C, M>
where
  C: CaptureSource<Error = CE>,
  CE: std::error::Error + Send + Sync + 'static,
  M: Model<Input = Frame, Output = DetectResult, Error = ME> + Send + Sync + 'static,
  ME: std::fmt::Display,
{
  pub fn new(source: C, model: M, area: Size) -> Self {
    let (tx, rx) = mpsc::channel();
    Self {
      source,
      model: Arc::new(model),
      tx,
      rx,
      next_generation: 1,
      current: Arc::new(CurrentFrame::empty(area)),
      last_error: None,
    }
  }

  pub fn current(&self) -> Arc<CurrentFrame> {
    self.current.clone()
  }

  /// 最近一次被接受的推理失败信息
  pub fn last_error(&self) -> Option<&str> {
    self.last_error.as_deref()
  }

  fn publish(&mut self, frame: CurrentFrame) -> Arc<CurrentFrame> {
    self.current = Arc::new(frame);
    self.current.clone()
  }

  fn bump_generation(&mut self) -> u64 {
    let generation = self.next_generation;
    self.next_generation += 1;
    generation
  }

  /// 采集新图像；进行中的推理结果随之作废
  pub fn capture(&mut self) -> Result<Arc<CurrentFrame>, SessionError> {
    let frame = self
      .source
      .capture()
      .map_err(|e| SessionError::Capture(Box::new(e)))?
      .into_normalized();
    info!("采集图像: {}x{}", frame.width(), frame.height());

    let generation = self.bump_generation();
    self.last_error = None;
    let area = self.current.area;
    Ok(self.publish(CurrentFrame::compose(
      generation,
      area,
      Some(Arc::new(frame)),
      Arc::from(Vec::new()),
      false,
    )))
  }

  pub fn clear(&mut self) -> Arc<CurrentFrame> {
    let generation = self.bump_generation();
    self.last_error = None;
    let area = self.current.area;
    self.publish(CurrentFrame::compose(
      generation,
      area,
      None,
      Arc::from(Vec::new()),
      false,
    ))
  }

  pub fn resize(&mut self, area: Size) -> Arc<CurrentFrame> {
    debug!("显示区域变化: {}x{}", area.width, area.height);
    let next = self.current.with_area(area);
    self.publish(next)
  }

  /// 在后台线程推理当前图像；结果由 [`Session::poll`] 或 [`Session::wait_for_inference`] 取回
  pub fn request_inference(&mut self) -> Result<Arc<CurrentFrame>, SessionError> {
    let Some(frame) = self.current.frame.clone() else {
      return Err(SessionError::NoImage);
    };
    if self.current.detecting {
      return Err(SessionError::Busy);
    }

    let generation = self.current.generation;
    let model = self.model.clone();
    let tx = self.tx.clone();
    thread::spawn(move || {
      let now = Instant::now();
      let message = match model.infer(&frame) {
        Ok(result) => InferenceMessage::Finished {
          generation,
          detections: result.items.into_vec(),
          elapsed: now.elapsed(),
        },
        Err(e) => InferenceMessage::Failed {
          generation,
          error: e.to_string(),
        },
      };
      // 会话已销毁时接收端不存在，结果无人需要
      let _ = tx.send(message);
    });

    self.last_error = None;
    let next = self.current.with_detections(Arc::from(Vec::new()), true);
    Ok(self.publish(next))
  }

  /// 应用一条推理消息，返回是否被接受
  fn apply(&mut self, message: InferenceMessage) -> bool {
    if message.generation() != self.current.generation || !self.current.detecting {
      debug!("丢弃过期的推理结果 (generation {})", message.generation());
      return false;
    }

    match message {
      InferenceMessage::Finished {
        detections,
        elapsed,
        ..
      } => {
        info!("推理完成，检测到 {} 个目标，耗时: {:.2?}", detections.len(), elapsed);
        let next = self.current.with_detections(Arc::from(detections), false);
        self.publish(next);
      }
      InferenceMessage::Failed { error, .. } => {
        warn!("推理失败: {}", error);
        self.last_error = Some(error);
        let next = self.current.with_detections(Arc::from(Vec::new()), false);
        self.publish(next);
      }
    }
    true
  }

  /// 非阻塞地处理已到达的推理结果；有更新时返回新的快照
  pub fn poll(&mut self) -> Option<Arc<CurrentFrame>> {
    let mut updated = false;
    loop {
      match self.rx.try_recv() {
        Ok(message) => updated |= self.apply(message),
        Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
      }
    }
    updated.then(|| self.current.clone())
  }

  /// 阻塞等待当前图像的推理结果
  pub fn wait_for_inference(&mut self, timeout: Duration) -> Result<Arc<CurrentFrame>, SessionError> {
    if !self.current.detecting {
      return Ok(self.current.clone());
    }

    let deadline = Instant::now() + timeout;
    loop {
      let remaining = deadline.saturating_duration_since(Instant::now());
      match self.rx.recv_timeout(remaining) {
        Ok(message) => {
          if self.apply(message) {
            return match &self.last_error {
              Some(error) => Err(SessionError::Inference(error.clone())),
              None => Ok(self.current.clone()),
            };
          }
        }
        Err(RecvTimeoutError::Timeout) => return Err(SessionError::Timeout),
        Err(RecvTimeoutError::Disconnected) => return Err(SessionError::Disconnected),
      }
    }
  }
}
