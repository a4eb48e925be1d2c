// 该文件是 Hakoe （箱绘） 项目的一部分。
// src/output/save_image_file.rs - 保存调试标注图像
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

use std::{
  collections::HashMap,
  path::{Path, PathBuf},
};

use image::{ImageFormat, ImageReader, RgbImage};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::Frame,
  model::DetectResult,
  output::{
    Render,
    draw::{Annotator, DEFAULT_STROKE_WIDTH},
    record::Record,
  },
};

/// 目录形式的 URL 使用的固定文件名
pub const DEBUG_IMAGE_FILE_NAME: &str = "debug_bbox.png";

#[derive(Error, Debug)]
pub enum DebugImageError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("参数错误: {0}")]
  InvalidParameter(String),
}

/// 每次推理都覆盖写入同一路径的调试标注图像
pub struct DebugImageOutput {
  path: PathBuf,
  annotator: Annotator,
  record: Option<Record>,
}

impl DebugImageOutput {
  /// `location` 为目录（已存在，或以 `/` 结尾）时写入其中的 `debug_bbox.png`
  pub fn new(location: impl AsRef<Path>, annotator: Annotator) -> Self {
    Self {
      path: resolve_path(location.as_ref()),
      annotator,
      record: None,
    }
  }

  pub fn with_record(mut self, record: Record) -> Self {
    self.record = Some(record);
    self
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn annotator(&self) -> &Annotator {
    &self.annotator
  }

  fn save_image(&self, image: &RgbImage) -> Result<(), DebugImageError> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }

    // 无法从扩展名推断格式时写 PNG
    let format = ImageFormat::from_path(&self.path).unwrap_or(ImageFormat::Png);
    image.save_with_format(&self.path, format)?;
    info!("保存调试图像到文件: {}", self.path.display());

    Ok(())
  }

  /// 读回上一次保存的调试图像；文件不存在时返回 `Ok(None)`
  pub fn load(&self) -> Result<Option<RgbImage>, DebugImageError> {
    if !self.path.is_file() {
      warn!("调试图像不存在: {}", self.path.display());
      return Ok(None);
    }
    let image = ImageReader::open(&self.path)?
      .with_guessed_format()?
      .decode()?;
    Ok(Some(image.into_rgb8()))
  }
}

fn resolve_path(location: &Path) -> PathBuf {
  let looks_like_dir = location.as_os_str().to_string_lossy().ends_with('/');
  if looks_like_dir || location.is_dir() {
    location.join(DEBUG_IMAGE_FILE_NAME)
  } else {
    location.to_path_buf()
  }
}

fn parse_color(value: &str) -> Result<[u8; 3], DebugImageError> {
  let hex = value.trim_start_matches('#');
  let invalid = || DebugImageError::InvalidParameter(format!("颜色格式应为 rrggbb: {}", value));
  if hex.len() != 6 || !hex.is_ascii() {
    return Err(invalid());
  }
  let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
  Ok([channel(0)?, channel(2)?, channel(4)?])
}

/// `default` 表示内置字体，其余值视为字体文件路径
#[cfg(feature = "caption_text")]
fn load_font(path: &str) -> Result<ab_glyph::FontArc, DebugImageError> {
  if path == "default" {
    return crate::output::draw::default_font()
      .map_err(|e| DebugImageError::InvalidParameter(format!("无法加载内置字体: {}", e)));
  }
  let data = std::fs::read(path)?;
  ab_glyph::FontArc::try_from_vec(data)
    .map_err(|e| DebugImageError::InvalidParameter(format!("无法加载字体 {}: {}", path, e)))
}

impl FromUrlWithScheme for DebugImageOutput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for DebugImageOutput {
  type Error = DebugImageError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(DebugImageError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    let query_pairs: HashMap<_, _> = uri.query_pairs().collect();
    let stroke: u32 = query_pairs
      .get("stroke")
      .map(|v| v.parse::<u32>())
      .transpose()
      .map_err(|e| DebugImageError::InvalidParameter(format!("stroke: {}", e)))?
      .unwrap_or(DEFAULT_STROKE_WIDTH);

    let mut annotator = Annotator::default().with_stroke_width(stroke);
    if let Some(color) = query_pairs.get("color") {
      annotator = annotator.with_color(parse_color(color)?);
    }

    #[cfg(feature = "caption_text")]
    if let Some(font) = query_pairs.get("font") {
      annotator = annotator.with_font(load_font(font)?);
    }
    #[cfg(not(feature = "caption_text"))]
    if query_pairs.contains_key("font") {
      warn!("未启用 caption_text 特性，忽略字体参数");
    }

    let path = crate::decode_url_path(uri)
      .map_err(|e| DebugImageError::InvalidParameter(e.to_string()))?;
    let mut output = DebugImageOutput::new(path, annotator);
    if query_pairs.contains_key("record") {
      output = output.with_record(Record::default());
    }

    Ok(output)
  }
}

impl Render<Frame, DetectResult> for DebugImageOutput {
  type Error = DebugImageError;

  fn render_result(&self, frame: &Frame, result: &DetectResult) -> Result<(), Self::Error> {
    let image = self.annotator.annotate(frame, &result.items);
    self.save_image(&image)?;
    if let Some(record) = &self.record {
      record.record(&result.items, &self.path)?;
    }
    Ok(())
  }
}
