// 该文件是 Hakoe （箱绘） 项目的一部分。
// src/bin/overlay_continueshot.rs - 连续采集与推理
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

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use url::Url;

use hakoe::{
  FromUrl,
  geometry::Size,
  input::InputWrapper,
  model::FixtureModel,
  output::DebugImageOutput,
  task::{ContinuousTask, Task},
};
use tracing::info;

/// Hakoe 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 检测结果来源
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 输入来源
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出路径
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,
  /// 显示区域尺寸
  #[arg(long, value_name = "WxH", default_value = "390x300")]
  pub area: Size,

  #[arg(long, value_name = "FRAME_NUMBER")]
  pub frame_number: Option<usize>,

  /// 两次采集之间的间隔（毫秒）
  #[arg(long, value_name = "MILLIS", default_value = "1000")]
  pub interval: u64,
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

  ContinuousTask::default()
    .with_frame_number(args.frame_number)
    .with_area(Some(args.area))
    .with_interval(Some(Duration::from_millis(args.interval)))
    .with_interrupt(true)
    .run_task(input, model, output)?;

  Ok(())
}
