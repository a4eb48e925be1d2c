// 该文件是 Hakoe （箱绘） 项目的一部分。
// src/input/fixture.rs - 固定图像采集来源（预览与测试用）
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

use image::{Rgb, RgbImage};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, frame::Frame, input::CaptureSource};

// 找不到样例图像时使用的 4:3 占位图
const FALLBACK_WIDTH: u32 = 640;
const FALLBACK_HEIGHT: u32 = 480;
const FALLBACK_COLOR: [u8; 3] = [200, 200, 200];

#[derive(Error, Debug)]
pub enum FixtureInputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

/// 每次采集都返回同一帧
#[derive(Debug, Clone)]
pub struct FixtureInput {
  frame: Frame,
}

impl FixtureInput {
  pub fn new(frame: Frame) -> Self {
    Self { frame }
  }

  pub fn fallback() -> Self {
    Self::new(Frame::new(RgbImage::from_pixel(
      FALLBACK_WIDTH,
      FALLBACK_HEIGHT,
      Rgb(FALLBACK_COLOR),
    )))
  }

  pub fn frame(&self) -> &Frame {
    &self.frame
  }
}

impl FromUrlWithScheme for FixtureInput {
  const SCHEME: &'static str = "fixture";
}

impl FromUrl for FixtureInput {
  type Error = FixtureInputError;

  /// 读取失败时退回占位图，而不是报错
  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(FixtureInputError::SchemeMismatch);
    }

    let loaded = crate::decode_url_path(url)
      .ok()
      .and_then(|path| load(&path).map(|frame| (path, frame)));

    match loaded {
      Some((path, frame)) => {
        info!("载入样例图像: {}", path.display());
        Ok(Self::new(frame))
      }
      None => {
        warn!("无法载入样例图像 {}，使用占位图", url.path());
        Ok(Self::fallback())
      }
    }
  }
}

#[cfg(feature = "read_image_file")]
fn load(path: &std::path::Path) -> Option<Frame> {
  crate::input::read_frame(path).ok()
}

#[cfg(not(feature = "read_image_file"))]
fn load(path: &std::path::Path) -> Option<Frame> {
  image::open(path).ok().map(|image| Frame::new(image.into_rgb8()))
}

impl CaptureSource for FixtureInput {
  type Error = FixtureInputError;

  fn capture(&mut self) -> Result<Frame, Self::Error> {
    Ok(self.frame.clone())
  }
}
