// 该文件是 Hakoe （箱绘） 项目的一部分。
// src/model.rs - 检测结果与推理接口
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

use serde::{Deserialize, Deserializer, Serialize};

use crate::geometry::NormalizedRect;

/// 标签缺失时使用的占位名
pub const UNKNOWN_LABEL: &str = "Unknown";

/// 推理服务：输入一帧，输出检测结果
pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// 单个检测目标。创建后不再修改，只被投影到新的坐标空间。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
  #[serde(default = "unknown_label", deserialize_with = "deserialize_label")]
  pub label: String,
  pub confidence: f32,
  pub rect: NormalizedRect,
}

fn unknown_label() -> String {
  UNKNOWN_LABEL.to_string()
}

fn deserialize_label<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  let label: Option<String> = Option::deserialize(deserializer)?;
  Ok(
    label
      .filter(|l| !l.is_empty())
      .unwrap_or_else(unknown_label),
  )
}

impl Detection {
  pub fn new(label: impl Into<String>, confidence: f32, rect: NormalizedRect) -> Self {
    let label = label.into();
    Self {
      label: if label.is_empty() {
        unknown_label()
      } else {
        label
      },
      confidence,
      rect,
    }
  }

  /// 叠加层标题，例如 `dog 87%`
  pub fn caption(&self) -> String {
    format_caption(&self.label, self.confidence)
  }

  /// 推理日志行，例如 `dog (87%) rect: 0.20,0.30,0.30,0.30`
  pub fn log_line(&self) -> String {
    format!(
      "{} ({}%) rect: {:.2},{:.2},{:.2},{:.2}",
      self.label,
      confidence_percent(self.confidence),
      self.rect.min_x(),
      self.rect.min_y(),
      self.rect.width,
      self.rect.height
    )
  }
}

pub(crate) fn confidence_percent(confidence: f32) -> i64 {
  (confidence as f64 * 100.0).round() as i64
}

pub(crate) fn format_caption(label: &str, confidence: f32) -> String {
  format!("{} {}%", label, confidence_percent(confidence))
}

/// 一次推理的全部检测结果，顺序即推理输出的顺序
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectResult {
  pub items: Box<[Detection]>,
}

impl DetectResult {
  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }
}

impl From<Vec<Detection>> for DetectResult {
  fn from(items: Vec<Detection>) -> Self {
    Self {
      items: items.into_boxed_slice(),
    }
  }
}

mod fixture;
pub use self::fixture::{FixtureModel, ModelError};
