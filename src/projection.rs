// 该文件是 Hakoe （箱绘） 项目的一部分。
// src/projection.rs - 归一化检测框到显示/像素坐标的投影
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

//! 显示叠加与像素标注共用同一个投影公式：
//!
//! ```text
//! x = target.x + r.minX * target.width
//! y = target.y + (1 - r.maxY) * target.height
//! w = r.width  * target.width
//! h = r.height * target.height
//! ```
//!
//! 像素空间只是 `target = (0, 0, iw, ih)` 的特例。超出单位正方形或非有限的输入原样线性传递，不做裁剪。

use std::marker::PhantomData;

use crate::{
  geometry::{FitRect, NormalizedRect, Rect, Size},
  model::Detection,
};

/// 将左下原点的归一化矩形投影到左上原点的目标矩形中
pub fn project(rect: &NormalizedRect, target: &Rect) -> Rect {
  Rect::new(
    target.x + rect.min_x() * target.width,
    target.y + rect.flipped_top() * target.height,
    rect.width * target.width,
    rect.height * target.height,
  )
}

/// `project` 的逆变换
pub fn unproject(rect: &Rect, target: &Rect) -> NormalizedRect {
  let width = rect.width / target.width;
  let height = rect.height / target.height;
  let top = (rect.y - target.y) / target.height;
  NormalizedRect::new(
    (rect.x - target.x) / target.width,
    1.0 - top - height,
    width,
    height,
  )
}

/// 显示区域坐标空间
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplaySpace;

/// 原始图像像素坐标空间
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelSpace;

/// 投影到某一坐标空间后的检测结果，携带原始标签与置信度
#[derive(Debug, Clone, PartialEq)]
pub struct Projected<S> {
  pub label: String,
  pub confidence: f32,
  pub rect: Rect,
  _space: PhantomData<S>,
}

pub type DisplayDetection = Projected<DisplaySpace>;
pub type PixelDetection = Projected<PixelSpace>;

impl<S> Projected<S> {
  fn from_detection(detection: &Detection, target: &Rect) -> Self {
    Self {
      label: detection.label.clone(),
      confidence: detection.confidence,
      rect: project(&detection.rect, target),
      _space: PhantomData,
    }
  }

  pub fn caption(&self) -> String {
    crate::model::format_caption(&self.label, self.confidence)
  }
}

/// 投影到显示区域中的适配矩形内。调用方须保证 `fit` 不是占位矩形。
pub fn to_display(detection: &Detection, fit: &FitRect) -> DisplayDetection {
  Projected::from_detection(detection, &fit.rect)
}

/// 投影到原始图像像素空间
pub fn to_pixels(detection: &Detection, image: Size) -> PixelDetection {
  Projected::from_detection(detection, &Rect::from_size(image))
}

/// 批量投影，保持输入顺序
pub fn display_detections(detections: &[Detection], fit: &FitRect) -> Vec<DisplayDetection> {
  detections.iter().map(|d| to_display(d, fit)).collect()
}

pub fn pixel_detections(detections: &[Detection], image: Size) -> Vec<PixelDetection> {
  detections.iter().map(|d| to_pixels(d, image)).collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::geometry::fit_rect;
  use approx::assert_abs_diff_eq;

  fn assert_rect_eq(a: &Rect, b: &Rect) {
    assert_abs_diff_eq!(a.x, b.x, epsilon = 1e-9);
    assert_abs_diff_eq!(a.y, b.y, epsilon = 1e-9);
    assert_abs_diff_eq!(a.width, b.width, epsilon = 1e-9);
    assert_abs_diff_eq!(a.height, b.height, epsilon = 1e-9);
  }

  #[test]
  fn projects_into_fit_rect() {
    let fit = fit_rect(Some(Size::new(1200.0, 800.0)), Size::new(390.0, 300.0));
    let detection = Detection::new("dog", 0.87, NormalizedRect::from_edges(0.2, 0.3, 0.5, 0.6));
    let display = to_display(&detection, &fit);
    assert_rect_eq(&display.rect, &Rect::new(78.0, 124.0, 117.0, 78.0));
    assert_eq!(display.label, "dog");
    assert_eq!(display.caption(), "dog 87%");
  }

  #[test]
  fn pixel_projection_matches_min_y_formulation() {
    let image = Size::new(1200.0, 800.0);
    let rects = [
      NormalizedRect::new(0.0, 0.0, 1.0, 1.0),
      NormalizedRect::new(0.1, 0.25, 0.3, 0.5),
      NormalizedRect::new(0.33, 0.71, 0.2, 0.09),
    ];
    for rect in rects {
      let pixel = to_pixels(&Detection::new("cat", 0.5, rect), image);
      let y = (1.0 - rect.min_y() - rect.height) * image.height;
      assert_abs_diff_eq!(pixel.rect.y, y, epsilon = 1e-9);
      assert_abs_diff_eq!(pixel.rect.x, rect.min_x() * image.width, epsilon = 1e-9);
      assert_abs_diff_eq!(pixel.rect.width, rect.width * image.width, epsilon = 1e-9);
      assert_abs_diff_eq!(pixel.rect.height, rect.height * image.height, epsilon = 1e-9);
    }
  }

  #[test]
  fn unproject_inverts_project() {
    let target = Rect::new(12.5, 20.0, 390.0, 260.0);
    let rect = NormalizedRect::new(0.137, 0.42, 0.25, 0.318);
    let back = unproject(&project(&rect, &target), &target);
    assert_abs_diff_eq!(back.x, rect.x, epsilon = 1e-9);
    assert_abs_diff_eq!(back.y, rect.y, epsilon = 1e-9);
    assert_abs_diff_eq!(back.width, rect.width, epsilon = 1e-9);
    assert_abs_diff_eq!(back.height, rect.height, epsilon = 1e-9);
  }

  #[test]
  fn unit_square_rects_stay_inside_fit() {
    let fit = fit_rect(Some(Size::new(640.0, 480.0)), Size::new(1024.0, 300.0));
    let steps = [0.0, 0.1, 0.25, 0.5, 0.75, 1.0];
    for &min_x in &steps {
      for &max_x in steps.iter().filter(|&&v| v >= min_x) {
        for &min_y in &steps {
          for &max_y in steps.iter().filter(|&&v| v >= min_y) {
            let rect = NormalizedRect::from_edges(min_x, min_y, max_x, max_y);
            let display = to_display(&Detection::new("x", 1.0, rect), &fit);
            assert!(fit.rect.contains_rect(&display.rect, 1e-9));
          }
        }
      }
    }
  }

  #[test]
  fn out_of_range_passes_through_unclamped() {
    let target = Rect::new(0.0, 0.0, 100.0, 100.0);
    let rect = project(&NormalizedRect::new(-0.5, 0.9, 0.4, 0.4), &target);
    assert_rect_eq(&rect, &Rect::new(-50.0, -30.0, 40.0, 40.0));

    let nan = project(&NormalizedRect::new(f64::NAN, 0.0, 0.1, 0.1), &target);
    assert!(nan.x.is_nan());
    assert!(!nan.is_finite());
  }

  #[test]
  fn batch_projection_preserves_order() {
    let detections = vec![
      Detection::new("a", 0.1, NormalizedRect::new(0.0, 0.0, 0.1, 0.1)),
      Detection::new("b", 0.2, NormalizedRect::new(0.5, 0.5, 0.1, 0.1)),
      Detection::new("c", 0.3, NormalizedRect::new(0.9, 0.9, 0.1, 0.1)),
    ];
    let labels: Vec<_> = pixel_detections(&detections, Size::new(10.0, 10.0))
      .into_iter()
      .map(|p| p.label)
      .collect();
    assert_eq!(labels, ["a", "b", "c"]);
  }
}
