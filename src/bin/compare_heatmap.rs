// 该文件是 Gujia （骨架） 项目的一部分。
// src/bin/compare_heatmap.rs - 参考热图与量化热图对比
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
use tracing::{info, warn};

use gujia::{
  heatmap::{Heatmap, compare},
  model::{Stride, decode},
};

/// 对比 ONNX 运行时与 NPU 模拟器输出的热图
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 参考热图（浮点模型）
  #[arg(long, value_name = "FILE")]
  pub reference: PathBuf,
  /// 待检热图（量化模型）
  #[arg(long, value_name = "FILE")]
  pub candidate: PathBuf,
  /// 平均绝对误差阈值
  #[arg(long, default_value = "0.01", value_name = "THRESHOLD")]
  pub tolerance: f64,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  let reference = Heatmap::from_npy(&args.reference)?;
  let candidate = Heatmap::from_npy(&args.candidate)?;

  let result = compare(&reference, &candidate, args.tolerance)?;
  info!("平均绝对误差 (MAE): {:.6}", result.mae);
  info!("最大绝对误差: {:.6}", result.max_abs);

  // 逐关键点比较峰值位置，步长取 1 即热图坐标
  let stride = Stride::new(1.0, 1.0)?;
  let keypoints = reference.keypoints();
  let a = decode(&reference, stride, keypoints)?;
  let b = decode(&candidate, stride, keypoints)?;
  let moved = a
    .iter()
    .zip(b.iter())
    .filter(|(p, q)| p.x != q.x || p.y != q.y)
    .count();
  info!("峰值位置不同的关键点: {}/{}", moved, keypoints);

  if result.is_close() {
    info!("结果非常接近，转换成功");
  } else {
    warn!("存在差异，可能由预处理或量化造成损失");
  }

  Ok(())
}
