// 该文件是 Hakoe （箱绘） 项目的一部分。
// src/output/draw.rs - 在原图像素空间中绘制检测框
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

#[cfg(feature = "caption_text")]
use ab_glyph::{FontArc, InvalidFont, PxScale};
use image::{Rgb, RgbImage};
#[cfg(feature = "caption_text")]
use imageproc::drawing::{draw_text_mut, text_size};
use imageproc::{drawing::draw_filled_rect_mut, rect::Rect as PixelRect};
use tracing::debug;

use crate::{
  frame::Frame,
  geometry::{Rect, Size},
  model::Detection,
  projection::{PixelDetection, pixel_detections},
};

pub const DEFAULT_STROKE_WIDTH: u32 = 2;
pub const DEFAULT_STROKE_COLOR: [u8; 3] = [255, 0, 0]; // 红色
pub const MAX_STROKE_WIDTH: u32 = 64;

#[cfg(feature = "caption_text")]
const DEFAULT_FONT: &[u8] = include_bytes!("../../assets/font.ttf");
#[cfg(feature = "caption_text")]
const CAPTION_FONT_SIZE: f32 = 20.0;
#[cfg(feature = "caption_text")]
const CAPTION_PADDING: i64 = 2;
#[cfg(feature = "caption_text")]
const CAPTION_BACKGROUND: [u8; 3] = [0, 0, 0];
#[cfg(feature = "caption_text")]
const CAPTION_TEXT_COLOR: [u8; 3] = [255, 255, 255];

/// 随 crate 一起分发的默认标题字体
#[cfg(feature = "caption_text")]
pub fn default_font() -> Result<FontArc, InvalidFont> {
  FontArc::try_from_slice(DEFAULT_FONT)
}

/// 把检测框烧录进图像副本，用于调试导出
#[derive(Clone)]
pub struct Annotator {
  stroke_width: u32,
  color: [u8; 3],
  #[cfg(feature = "caption_text")]
  font: Option<FontArc>,
}

impl Default for Annotator {
  fn default() -> Self {
    Self {
      stroke_width: DEFAULT_STROKE_WIDTH,
      color: DEFAULT_STROKE_COLOR,
      #[cfg(feature = "caption_text")]
      font: None,
    }
  }
}

impl Annotator {
  /// 线宽限制在 `1..=MAX_STROKE_WIDTH`
  pub fn with_stroke_width(mut self, stroke_width: u32) -> Self {
    self.stroke_width = stroke_width.clamp(1, MAX_STROKE_WIDTH);
    self
  }

  pub fn with_color(mut self, color: [u8; 3]) -> Self {
    self.color = color;
    self
  }

  /// 设置后在每个框上方写出 `<label> <pct>%`
  #[cfg(feature = "caption_text")]
  pub fn with_font(mut self, font: FontArc) -> Self {
    self.font = Some(font);
    self
  }

  pub fn stroke_width(&self) -> u32 {
    self.stroke_width
  }

  pub fn color(&self) -> [u8; 3] {
    self.color
  }

  #[cfg(feature = "caption_text")]
  pub fn has_font(&self) -> bool {
    self.font.is_some()
  }

  /// 先规范化方向，再投影到像素空间并描边。`frame` 本身不会被修改。
  pub fn annotate(&self, frame: &Frame, detections: &[Detection]) -> RgbImage {
    let mut image = frame.normalized().into_image();
    let size = Size::from(image.dimensions());
    for detection in pixel_detections(detections, size) {
      self.draw_detection(&mut image, &detection);
    }
    image
  }

  fn draw_detection(&self, image: &mut RgbImage, detection: &PixelDetection) {
    let Some(bounds) = PixelBounds::clip(&detection.rect, image.dimensions(), self.stroke_width)
    else {
      debug!("跳过无法绘制的检测框: {:?}", detection.rect);
      return;
    };

    self.draw_outline(image, bounds);

    #[cfg(feature = "caption_text")]
    if let Some(font) = &self.font {
      self.draw_caption(image, bounds, &detection.caption(), font);
    }
  }

  /// 向内逐像素描边，只画落在图像内的边
  fn draw_outline(&self, image: &mut RgbImage, bounds: PixelBounds) {
    let (iw, ih) = (image.width() as i64, image.height() as i64);
    let color = Rgb(self.color);

    for inset in 0..self.stroke_width as i64 {
      let left = bounds.left + inset;
      let top = bounds.top + inset;
      let right = bounds.right - inset;
      let bottom = bounds.bottom - inset;
      if left > right || top > bottom {
        break;
      }

      let (x0, x1) = (left.max(0), right.min(iw - 1));
      let (y0, y1) = (top.max(0), bottom.min(ih - 1));
      for y in [top, bottom] {
        if (0..ih).contains(&y) && x0 <= x1 {
          fill_span(image, x0, y, x1 - x0 + 1, 1, color);
        }
      }
      for x in [left, right] {
        if (0..iw).contains(&x) && y0 <= y1 {
          fill_span(image, x, y0, 1, y1 - y0 + 1, color);
        }
      }
    }
  }

  #[cfg(feature = "caption_text")]
  fn draw_caption(&self, image: &mut RgbImage, bounds: PixelBounds, caption: &str, font: &FontArc) {
    let scale = PxScale::from(CAPTION_FONT_SIZE);
    let (text_width, text_height) = text_size(scale, font, caption);
    let iw = image.width() as i64;
    let label_height = text_height as i64 + 2 * CAPTION_PADDING;

    // 放在边框上方，放不下则贴着图像上沿
    let label_x = bounds.left.clamp(0, iw - 1);
    let label_y = (bounds.top - label_height).max(0);
    let label_width = (text_width as i64 + 2 * CAPTION_PADDING).min(iw - label_x);

    if label_width > 0 && label_height > 0 {
      fill_span(
        image,
        label_x,
        label_y,
        label_width,
        label_height,
        Rgb(CAPTION_BACKGROUND),
      );
      draw_text_mut(
        image,
        Rgb(CAPTION_TEXT_COLOR),
        (label_x + CAPTION_PADDING) as i32,
        (label_y + CAPTION_PADDING) as i32,
        scale,
        font,
        caption,
      );
    }
  }
}

/// 调用方保证起点在图像内、宽高为正
fn fill_span(image: &mut RgbImage, x: i64, y: i64, width: i64, height: i64, color: Rgb<u8>) {
  let rect = PixelRect::at(x as i32, y as i32).of_size(width as u32, height as u32);
  draw_filled_rect_mut(image, rect, color);
}

/// 取整后的像素边界，四边均为闭区间。
/// 超出图像的边被收拢到距图像 `margin` 像素处，内缩描边时不会越界回到图像内。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PixelBounds {
  left: i64,
  top: i64,
  right: i64,
  bottom: i64,
}

impl PixelBounds {
  /// 左上向下取整，右下向上取整。非有限、面积不为正或与图像不相交时返回 `None`。
  fn clip(rect: &Rect, (iw, ih): (u32, u32), margin: u32) -> Option<Self> {
    if !rect.is_finite() || rect.width <= 0.0 || rect.height <= 0.0 {
      return None;
    }

    let m = margin as f64;
    let clamp_x = |v: f64| v.clamp(-m, iw as f64 + m) as i64;
    let clamp_y = |v: f64| v.clamp(-m, ih as f64 + m) as i64;
    let left = clamp_x(rect.x.floor());
    let top = clamp_y(rect.y.floor());
    let right = clamp_x(rect.max_x().ceil() - 1.0).max(left);
    let bottom = clamp_y(rect.max_y().ceil() - 1.0).max(top);

    let disjoint = right < 0 || bottom < 0 || left >= iw as i64 || top >= ih as i64;
    (!disjoint).then_some(Self {
      left,
      top,
      right,
      bottom,
    })
  }
}
