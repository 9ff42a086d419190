// 该文件是 Gujia （骨架） 项目的一部分。
// src/bin/prepare_calib.rs - 量化校正数据预处理
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

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use url::Url;

use gujia::{
  FromUrl,
  frame::{InputShape, RgbNchwFrame},
  input::InputWrapper,
  model::{HRNET_INPUT_H, HRNET_INPUT_W},
  task::{Task, TensorDumpTask},
};
use tracing::info;

/// 将校正图像目录预处理为 (N, 3, H, W) 浮点张量，交给量化工具链
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 校正图像目录，例如 calib:///docker_mount/calib_images?limit=50
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出 .npy 路径
  #[arg(long, value_name = "FILE")]
  pub output: PathBuf,
  /// 模型声明的输入形状 N,C,H,W（N 为 0 表示动态批次）
  #[arg(long, default_value = "1,3,256,192")]
  pub shape: InputShape,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("校正图像来源: {}", args.input);
  args
    .shape
    .ensure_eq(&RgbNchwFrame::<HRNET_INPUT_W, HRNET_INPUT_H>::input_shape())?;
  info!("输入形状: {}", args.shape);

  let input = InputWrapper::<HRNET_INPUT_W, HRNET_INPUT_H>::from_url(&args.input)?;
  TensorDumpTask::new(args.output).run_task(input.into_nchw(), (), ())?;

  Ok(())
}
