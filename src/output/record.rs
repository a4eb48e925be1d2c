// 该文件是 Hakoe （箱绘） 项目的一部分。
// src/output/record.rs - 推理日志记录
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

use chrono::Utc;

use crate::model::Detection;

/// 把检测结果以文本形式写到图像旁边（同名 `.txt`）
#[derive(Debug, Clone, Default)]
pub struct Record {
  /// 省略首行时间戳，便于比对
  pub without_timestamp: bool,
}

impl Record {
  pub fn render(&self, detections: &[Detection]) -> String {
    let mut lines = Vec::with_capacity(detections.len() + 1);
    if !self.without_timestamp {
      lines.push(format!("# {}", Utc::now().format("%Y-%m-%dT%H:%M:%SZ")));
    }
    lines.extend(detections.iter().map(Detection::log_line));
    lines.join("\n")
  }

  pub fn record(&self, detections: &[Detection], path: &Path) -> Result<(), std::io::Error> {
    std::fs::write(path.with_extension("txt"), self.render(detections))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::geometry::NormalizedRect;

  #[test]
  fn renders_one_line_per_detection_in_order() {
    let detections = [
      Detection::new("dog", 0.87, NormalizedRect::new(0.2, 0.3, 0.3, 0.3)),
      Detection::new("", 0.4, NormalizedRect::new(0.0, 0.0, 1.0, 1.0)),
    ];
    let record = Record {
      without_timestamp: true,
    };
    assert_eq!(
      record.render(&detections),
      "dog (87%) rect: 0.20,0.30,0.30,0.30\nUnknown (40%) rect: 0.00,0.00,1.00,1.00"
    );
  }

  #[test]
  fn timestamp_header_comes_first() {
    let text = Record::default().render(&[]);
    assert!(text.starts_with("# "));
    assert_eq!(text.lines().count(), 1);
  }
}
