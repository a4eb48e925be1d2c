// 该文件是 Hakoe （箱绘） 项目的一部分。
// src/geometry.rs - 尺寸、矩形与等比适配区域
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

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 宽高（像素）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
  pub width: f64,
  pub height: f64,
}

impl Size {
  pub const fn new(width: f64, height: f64) -> Self {
    Self { width, height }
  }

  /// 宽高比；高度为零时结果为非有限值
  pub fn aspect_ratio(&self) -> f64 {
    self.width / self.height
  }
}

/// 解析 `<W>x<H>`，例如 `390x300`
impl FromStr for Size {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let (w, h) = s
      .split_once(['x', 'X'])
      .ok_or_else(|| format!("尺寸格式应为 <宽>x<高>: {}", s))?;
    let parse = |v: &str| {
      v.trim()
        .parse::<f64>()
        .map_err(|e| format!("无效的尺寸 {}: {}", s, e))
    };
    let size = Size::new(parse(w)?, parse(h)?);
    let valid = |v: f64| v.is_finite() && v >= 0.0;
    if !valid(size.width) || !valid(size.height) {
      return Err(format!("尺寸必须为非负有限值: {}", s));
    }
    Ok(size)
  }
}

impl From<(u32, u32)> for Size {
  fn from((width, height): (u32, u32)) -> Self {
    Self::new(width as f64, height as f64)
  }
}

/// 像素坐标系中的矩形，原点在左上角
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
  pub x: f64,
  pub y: f64,
  pub width: f64,
  pub height: f64,
}

impl Rect {
  pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
    Self {
      x,
      y,
      width,
      height,
    }
  }

  /// 以 (0, 0) 为原点、铺满给定尺寸的矩形
  pub const fn from_size(size: Size) -> Self {
    Self::new(0.0, 0.0, size.width, size.height)
  }

  pub fn max_x(&self) -> f64 {
    self.x + self.width
  }

  pub fn max_y(&self) -> f64 {
    self.y + self.height
  }

  pub fn size(&self) -> Size {
    Size::new(self.width, self.height)
  }

  pub fn aspect_ratio(&self) -> f64 {
    self.size().aspect_ratio()
  }

  /// `other` 是否完全落在本矩形内，允许 `eps` 的浮点误差
  pub fn contains_rect(&self, other: &Rect, eps: f64) -> bool {
    other.x >= self.x - eps
      && other.y >= self.y - eps
      && other.max_x() <= self.max_x() + eps
      && other.max_y() <= self.max_y() + eps
  }

  pub fn is_finite(&self) -> bool {
    self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
  }
}

/// 单位空间 [0,1]×[0,1] 中的矩形，原点在左下角（视觉模型的输出格式）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedRect {
  pub x: f64,
  pub y: f64,
  pub width: f64,
  pub height: f64,
}

impl NormalizedRect {
  pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
    Self {
      x,
      y,
      width,
      height,
    }
  }

  /// 由四条边构造
  pub fn from_edges(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
    Self::new(min_x, min_y, max_x - min_x, max_y - min_y)
  }

  pub fn min_x(&self) -> f64 {
    self.x
  }

  pub fn min_y(&self) -> f64 {
    self.y
  }

  pub fn max_x(&self) -> f64 {
    self.x + self.width
  }

  pub fn max_y(&self) -> f64 {
    self.y + self.height
  }

  /// 翻转到左上原点后的上边缘：`1 - maxY`
  pub fn flipped_top(&self) -> f64 {
    1.0 - self.max_y()
  }

  pub fn is_within_unit_square(&self) -> bool {
    self.min_x() >= 0.0
      && self.min_y() >= 0.0
      && self.width >= 0.0
      && self.height >= 0.0
      && self.max_x() <= 1.0
      && self.max_y() <= 1.0
  }
}

/// 图像等比缩放并居中后在显示区域中的位置
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitRect {
  /// 显示区域像素坐标，左上原点
  pub rect: Rect,
  /// 图像宽高比；占位时为 1.0
  pub aspect: f64,
  /// 尚无图像（或尺寸退化）时的占位区域，不得用于投影检测框
  pub placeholder: bool,
}

impl FitRect {
  /// 铺满整个显示区域的占位矩形
  pub fn placeholder(area: Size) -> Self {
    Self {
      rect: Rect::from_size(area),
      aspect: 1.0,
      placeholder: true,
    }
  }

  pub fn is_placeholder(&self) -> bool {
    self.placeholder
  }
}

/// 计算图像在显示区域中等比适配（fit）并居中后的矩形。
///
/// `image` 为 `None`、或任一分母（图像高度、区域高度）不为正时返回占位矩形。
pub fn fit_rect(image: Option<Size>, area: Size) -> FitRect {
  let Some(image) = image else {
    return FitRect::placeholder(area);
  };

  // NaN 也会落入此分支
  if !(image.height > 0.0) || !(area.height > 0.0) {
    return FitRect::placeholder(area);
  }

  let image_aspect = image.aspect_ratio();
  let area_aspect = area.aspect_ratio();

  let (width, height) = if image_aspect > area_aspect {
    (area.width, area.width / image_aspect)
  } else {
    (area.height * image_aspect, area.height)
  };

  FitRect {
    rect: Rect::new(
      (area.width - width) / 2.0,
      (area.height - height) / 2.0,
      width,
      height,
    ),
    aspect: image_aspect,
    placeholder: false,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use approx::assert_abs_diff_eq;

  #[test]
  fn wider_image_is_letterboxed_vertically() {
    let fit = fit_rect(Some(Size::new(1200.0, 800.0)), Size::new(390.0, 300.0));
    assert!(!fit.is_placeholder());
    assert_abs_diff_eq!(fit.rect.width, 390.0, epsilon = 1e-9);
    assert_abs_diff_eq!(fit.rect.height, 260.0, epsilon = 1e-9);
    assert_abs_diff_eq!(fit.rect.x, 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(fit.rect.y, 20.0, epsilon = 1e-9);
  }

  #[test]
  fn taller_image_is_pillarboxed() {
    let fit = fit_rect(Some(Size::new(3024.0, 4032.0)), Size::new(390.0, 300.0));
    assert_abs_diff_eq!(fit.rect.height, 300.0, epsilon = 1e-9);
    assert_abs_diff_eq!(fit.rect.width, 225.0, epsilon = 1e-9);
    assert_abs_diff_eq!(fit.rect.x, 82.5, epsilon = 1e-9);
    assert_abs_diff_eq!(fit.rect.y, 0.0, epsilon = 1e-9);
  }

  #[test]
  fn aspect_and_containment_hold_over_a_grid() {
    let dims = [1.0, 3.0, 17.5, 240.0, 640.0, 1080.0, 4032.0];
    for &iw in &dims {
      for &ih in &dims {
        for &aw in &dims {
          for &ah in &dims {
            let fit = fit_rect(Some(Size::new(iw, ih)), Size::new(aw, ah));
            let area = Rect::from_size(Size::new(aw, ah));
            assert!((fit.rect.aspect_ratio() - iw / ih).abs() < 1e-6);
            assert!(area.contains_rect(&fit.rect, 1e-9));

            let touches_x = (fit.rect.width - aw).abs() < 1e-9;
            let touches_y = (fit.rect.height - ah).abs() < 1e-9;
            assert!(touches_x || touches_y);

            // 两侧边距相等
            assert_abs_diff_eq!(fit.rect.x, aw - fit.rect.max_x(), epsilon = 1e-9);
            assert_abs_diff_eq!(fit.rect.y, ah - fit.rect.max_y(), epsilon = 1e-9);
          }
        }
      }
    }
  }

  #[test]
  fn missing_image_yields_placeholder() {
    let area = Size::new(390.0, 300.0);
    let fit = fit_rect(None, area);
    assert!(fit.is_placeholder());
    assert_eq!(fit.rect, Rect::new(0.0, 0.0, 390.0, 300.0));
    assert_eq!(fit.aspect, 1.0);
  }

  #[test]
  fn zero_denominators_yield_placeholder() {
    let area = Size::new(390.0, 300.0);
    assert!(fit_rect(Some(Size::new(100.0, 0.0)), area).is_placeholder());
    assert!(fit_rect(Some(Size::new(100.0, 50.0)), Size::new(390.0, 0.0)).is_placeholder());
    assert!(fit_rect(Some(Size::new(100.0, f64::NAN)), area).is_placeholder());
  }

  #[test]
  fn parses_area_strings() {
    assert_eq!("390x300".parse::<Size>().unwrap(), Size::new(390.0, 300.0));
    assert_eq!("1024.5X768".parse::<Size>().unwrap(), Size::new(1024.5, 768.0));
    assert!("390".parse::<Size>().is_err());
    assert!("ax300".parse::<Size>().is_err());
    assert!("-1x300".parse::<Size>().is_err());
  }

  #[test]
  fn normalized_rect_edges() {
    let r = NormalizedRect::from_edges(0.2, 0.3, 0.5, 0.6);
    assert_abs_diff_eq!(r.width, 0.3, epsilon = 1e-12);
    assert_abs_diff_eq!(r.height, 0.3, epsilon = 1e-12);
    assert_abs_diff_eq!(r.flipped_top(), 0.4, epsilon = 1e-12);
    assert!(r.is_within_unit_square());
    assert!(!NormalizedRect::new(0.8, 0.1, 0.4, 0.2).is_within_unit_square());
  }
}
