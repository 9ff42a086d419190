// 该文件是 Gujia （骨架） 项目的一部分。
// src/bin/draw_pose.rs - 热图解码与骨架绘制
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

use anyhow::{Result, anyhow};
use clap::Parser;
use url::Url;

use gujia::{
  FromUrl,
  input::InputWrapper,
  model::{HRNET_INPUT_H, HRNET_INPUT_W, HeatmapFileModel},
  output::{SaveImageFileOutput, draw::DrawStyle},
  task::{OneShotTask, Task},
};
use tracing::info;

fn parse_color(value: &str) -> Result<[u8; 3]> {
  let parts: Vec<u8> = value
    .split(',')
    .map(|s| s.trim().parse::<u8>())
    .collect::<Result<_, _>>()?;
  parts
    .try_into()
    .map_err(|_| anyhow!("颜色格式应为 R,G,B: {}", value))
}

/// Gujia 骨架绘制参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 原始图像，例如 image:///input/test.jpg
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 推理得到的热图，例如 npy:///output/nef_sim_output.npy?stride=4,4
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 输出路径，例如 image:///output/final_pose_result.jpg?keypoints=npy,json
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,
  /// 连线颜色 R,G,B
  #[arg(long, default_value = "0,255,255", value_parser = parse_color)]
  pub line_color: [u8; 3],
  /// 关节点颜色 R,G,B
  #[arg(long, default_value = "255,0,0", value_parser = parse_color)]
  pub point_color: [u8; 3],
  /// 连线宽度（像素）
  #[arg(long, default_value = "2")]
  pub line_width: u32,
  /// 关节点半径（像素）
  #[arg(long, default_value = "3")]
  pub point_radius: u32,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("输入来源: {}", args.input);
  info!("热图文件: {}", args.model);
  info!("输出路径: {}", args.output);

  let style = DrawStyle {
    line_color: args.line_color,
    point_color: args.point_color,
    line_width: args.line_width,
    point_radius: args.point_radius,
  };

  let input = InputWrapper::<HRNET_INPUT_W, HRNET_INPUT_H>::from_url(&args.input)?;
  let model = HeatmapFileModel::<HRNET_INPUT_W, HRNET_INPUT_H>::from_url(&args.model)?;
  let output =
    SaveImageFileOutput::<HRNET_INPUT_W, HRNET_INPUT_H>::from_url(&args.output)?.with_style(style);

  OneShotTask.run_task(input.into_nchw(), model, output)?;

  Ok(())
}
