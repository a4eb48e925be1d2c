// 该文件是 Hakoe （箱绘） 项目的一部分。
// src/model/fixture.rs - 从 JSON 读取固定检测结果的推理服务
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

use std::path::Path;

use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::Frame,
  model::{DetectResult, Detection, Model},
};

#[derive(Error, Debug)]
pub enum ModelError {
  #[error("检测结果文件读取错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("检测结果解析错误: {0}")]
  ParseError(#[from] serde_json::Error),
  #[error("模型路径错误: {0}")]
  ModelPathError(String),
}

/// 对任何输入帧都返回同一组检测结果，替代真实的推理运行时
#[derive(Debug, Clone)]
pub struct FixtureModel {
  detections: Vec<Detection>,
}

impl FixtureModel {
  pub fn new(detections: Vec<Detection>) -> Self {
    Self { detections }
  }

  pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ModelError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)?;
    let detections: Vec<Detection> = serde_json::from_str(&raw)?;
    info!(
      "载入检测结果 {} 条: {}",
      detections.len(),
      path.display()
    );
    Ok(Self::new(detections))
  }

  pub fn detections(&self) -> &[Detection] {
    &self.detections
  }
}

impl FromUrlWithScheme for FixtureModel {
  const SCHEME: &'static str = "fixture";
}

impl FromUrl for FixtureModel {
  type Error = ModelError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "模型路径方案不匹配: 期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ModelError::ModelPathError(format!(
        "模型路径必须使用 {} 方案",
        Self::SCHEME
      )));
    }

    let path = crate::decode_url_path(url)
      .map_err(|e| ModelError::ModelPathError(e.to_string()))?;
    Self::from_path(path)
  }
}

impl Model for FixtureModel {
  type Input = Frame;
  type Output = DetectResult;
  type Error = ModelError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    debug!(
      "推理输入 {}x{}，返回 {} 条固定结果",
      input.width(),
      input.height(),
      self.detections.len()
    );
    Ok(DetectResult::from(self.detections.clone()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  #[test]
  fn loads_detections_from_url() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
      file,
      r#"[{{"label": "dog", "confidence": 0.9, "rect": {{"x": 0.2, "y": 0.3, "width": 0.3, "height": 0.3}}}}]"#
    )
    .unwrap();

    let url = Url::from_file_path(file.path()).unwrap();
    let url = Url::parse(&format!("fixture://{}", url.path())).unwrap();
    let model = FixtureModel::from_url(&url).unwrap();
    assert_eq!(model.detections().len(), 1);

    let frame = Frame::new(image::RgbImage::new(4, 3));
    let result = model.infer(&frame).unwrap();
    assert_eq!(result.items[0].label, "dog");
  }

  #[test]
  fn rejects_other_schemes() {
    let url = Url::parse("onnx:///tmp/model.onnx").unwrap();
    assert!(matches!(
      FixtureModel::from_url(&url),
      Err(ModelError::ModelPathError(_))
    ));
  }

  #[test]
  fn malformed_json_is_a_parse_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{not json").unwrap();
    assert!(matches!(
      FixtureModel::from_path(file.path()),
      Err(ModelError::ParseError(_))
    ));
  }
}
