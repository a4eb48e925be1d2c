// 该文件是 Hakoe （箱绘） 项目的一部分。
// src/bin/overlay_oneshot.rs - 单次采集、推理并输出调试图像
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

use anyhow::Result;
use clap::Parser;
use url::Url;

use hakoe::{
  FromUrl,
  geometry::Size,
  input::InputWrapper,
  model::FixtureModel,
  output::DebugImageOutput,
  task::{OneShotTask, Task},
};
use tracing::info;

/// Hakoe 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 检测结果来源，例如 fixture:///path/detections.json
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 输入来源，image:///path/photo.jpg 或 fixture:///path/sample.png
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 调试图像输出路径，例如 image:///tmp/debug/?stroke=2&color=ff0000&record
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,
  /// 显示区域尺寸
  #[arg(long, value_name = "WxH", default_value = "390x300")]
  pub area: Size,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("检测结果来源: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let input = InputWrapper::from_url(&args.input)?;
  let model = FixtureModel::from_url(&args.model)?;
  let output = DebugImageOutput::from_url(&args.output)?;

  OneShotTask::default()
    .with_area(Some(args.area))
    .run_task(input, model, output)?;

  Ok(())
}
