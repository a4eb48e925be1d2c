// 该文件是 Hakoe （箱绘） 项目的一部分。
// src/input/read_image_file.rs - 图像文件导入
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

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageDecoder, ImageReader};
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, frame::Frame, input::CaptureSource};

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("URI schema mismatch")]
  SchemaMismatch,
  #[error("Invalid path: {0}")]
  InvalidPath(String),
  #[error("I/O error: {0}")]
  IoError(#[from] std::io::Error),
  #[error("Image loading error: {0}")]
  ImageLoadError(#[from] image::ImageError),
}

/// 读取图像文件，保留 EXIF 方向信息（像素不做旋转）
pub fn read_frame(path: impl AsRef<Path>) -> Result<Frame, ImageFileInputError> {
  let mut decoder = ImageReader::open(path.as_ref())?
    .with_guessed_format()?
    .into_decoder()?;
  let orientation = decoder.orientation()?;
  let image = DynamicImage::from_decoder(decoder)?;

  Ok(Frame::with_orientation(image.into_rgb8(), orientation))
}

/// 导入照片：每次采集都重新读取文件，文件被替换后得到新内容
pub struct ImageFileInput {
  path: PathBuf,
}

impl ImageFileInput {
  pub fn new(path: impl Into<PathBuf>) -> Result<Self, ImageFileInputError> {
    let path = path.into();
    if !path.is_file() {
      return Err(ImageFileInputError::InvalidPath(path.display().to_string()));
    }
    Ok(Self { path })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ImageFileInputError::SchemaMismatch);
    }

    let path = crate::decode_url_path(url)
      .map_err(|e| ImageFileInputError::InvalidPath(e.to_string()))?;
    Self::new(path)
  }
}

impl CaptureSource for ImageFileInput {
  type Error = ImageFileInputError;

  fn capture(&mut self) -> Result<Frame, Self::Error> {
    let frame = read_frame(&self.path)?;
    debug!(
      "读取图像 {}: {}x{}, 方向 {:?}",
      self.path.display(),
      frame.width(),
      frame.height(),
      frame.orientation()
    );
    Ok(frame)
  }
}
