// 该文件是 Hakoe （箱绘） 项目的一部分。
// src/frame.rs - 带方向信息的 RGB 帧
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

use image::{DynamicImage, RgbImage, metadata::Orientation};

use crate::geometry::Size;

/// 采集得到的一帧图像。
///
/// `image` 保存解码后的原始像素，`orientation` 保存尚未应用的 EXIF 方向。
/// 只有经过 [`Frame::normalized`] 的帧，其像素尺寸才等于显示尺寸。
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
  image: RgbImage,
  orientation: Orientation,
}

impl Frame {
  pub fn new(image: RgbImage) -> Self {
    Self::with_orientation(image, Orientation::NoTransforms)
  }

  pub fn with_orientation(image: RgbImage, orientation: Orientation) -> Self {
    Self { image, orientation }
  }

  pub fn image(&self) -> &RgbImage {
    &self.image
  }

  pub fn into_image(self) -> RgbImage {
    self.image
  }

  pub fn orientation(&self) -> Orientation {
    self.orientation
  }

  pub fn width(&self) -> u32 {
    self.image.width()
  }

  pub fn height(&self) -> u32 {
    self.image.height()
  }

  pub fn is_upright(&self) -> bool {
    self.orientation == Orientation::NoTransforms
  }

  /// 应用方向信息之后的尺寸（宽高在 90°/270° 旋转时互换）
  pub fn upright_size(&self) -> Size {
    let (w, h) = self.image.dimensions();
    match self.orientation {
      Orientation::Rotate90
      | Orientation::Rotate270
      | Orientation::Rotate90FlipH
      | Orientation::Rotate270FlipH => Size::from((h, w)),
      _ => Size::from((w, h)),
    }
  }

  /// 返回方向已规范化（无残留旋转/镜像）的新帧，自身不变。
  /// 对已规范化的帧再次调用得到相同的像素。
  pub fn normalized(&self) -> Frame {
    if self.is_upright() {
      return self.clone();
    }

    let mut image = DynamicImage::ImageRgb8(self.image.clone());
    image.apply_orientation(self.orientation);
    Frame::new(image.into_rgb8())
  }

  /// 原地规范化版本，供已拥有所有权的调用方使用
  pub fn into_normalized(self) -> Frame {
    if self.is_upright() {
      self
    } else {
      self.normalized()
    }
  }
}

impl From<RgbImage> for Frame {
  fn from(image: RgbImage) -> Self {
    Frame::new(image)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::Rgb;

  fn sample() -> RgbImage {
    // 3x2，每个像素颜色唯一
    RgbImage::from_fn(3, 2, |x, y| Rgb([x as u8 * 40, y as u8 * 100, 7]))
  }

  #[test]
  fn upright_frame_is_unchanged() {
    let frame = Frame::new(sample());
    assert_eq!(frame.normalized(), frame);
  }

  #[test]
  fn rotate90_swaps_dimensions() {
    let frame = Frame::with_orientation(sample(), Orientation::Rotate90);
    assert_eq!(frame.upright_size(), Size::new(2.0, 3.0));
    let upright = frame.normalized();
    assert!(upright.is_upright());
    assert_eq!((upright.width(), upright.height()), (2, 3));
    // 顺时针旋转 90°：原左下角像素移到左上角
    assert_eq!(upright.image().get_pixel(0, 0), sample().get_pixel(0, 1));
  }

  #[test]
  fn normalization_is_idempotent() {
    let orientations = [
      Orientation::NoTransforms,
      Orientation::Rotate90,
      Orientation::Rotate180,
      Orientation::Rotate270,
      Orientation::FlipHorizontal,
      Orientation::FlipVertical,
      Orientation::Rotate90FlipH,
      Orientation::Rotate270FlipH,
    ];
    for orientation in orientations {
      let frame = Frame::with_orientation(sample(), orientation);
      let once = frame.normalized();
      let twice = once.normalized();
      assert_eq!(once.image().as_raw(), twice.image().as_raw());
      assert_eq!(once, twice);
      assert_eq!(Size::from(once.image().dimensions()), frame.upright_size());
    }
  }

  #[test]
  fn normalizing_does_not_touch_source() {
    let frame = Frame::with_orientation(sample(), Orientation::FlipHorizontal);
    let _ = frame.normalized();
    assert_eq!(frame.image(), &sample());
    assert_eq!(frame.orientation(), Orientation::FlipHorizontal);
  }
}
