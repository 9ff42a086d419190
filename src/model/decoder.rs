// 该文件是 Gujia （骨架） 项目的一部分。
// src/model/decoder.rs - 热图解码
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

use ndarray::ArrayView2;
use thiserror::Error;
use tracing::debug;

use crate::{
  heatmap::{Heatmap, ShapeError},
  model::Keypoint,
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
  #[error("热图形状错误: {0}")]
  Shape(#[from] ShapeError),
  #[error("步长无效: ({0}, {1})，每个方向必须 >= 1")]
  InvalidStride(f32, f32),
}

/// 热图单元到原图像素的缩放倍数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stride {
  x: f32,
  y: f32,
}

impl Stride {
  pub fn new(x: f32, y: f32) -> Result<Self, DecodeError> {
    if !(x.is_finite() && y.is_finite() && x >= 1.0 && y >= 1.0) {
      return Err(DecodeError::InvalidStride(x, y));
    }
    Ok(Stride { x, y })
  }

  /// 由输入尺寸与热图尺寸推算，例如 192x256 / 48x64 = (4, 4)
  pub fn from_sizes(input: (u32, u32), heatmap: (usize, usize)) -> Result<Self, DecodeError> {
    let (iw, ih) = input;
    let (hw, hh) = heatmap;
    if hw == 0 || hh == 0 {
      return Err(ShapeError::EmptySpatial(hh, hw).into());
    }
    Stride::new(iw as f32 / hw as f32, ih as f32 / hh as f32)
  }

  pub fn x(&self) -> f32 {
    self.x
  }

  pub fn y(&self) -> f32 {
    self.y
  }
}

/// 按行优先顺序扫描，返回第一个最大值的 (row, col, value)
///
/// 平台值（量化后常见）取扫描顺序中的第一个；NaN 永远不会成为最大值，
/// 全为 NaN 时返回 (0, 0)。
fn argmax(channel: ArrayView2<'_, f32>) -> (usize, usize, f32) {
  let mut best = (0, 0, f32::NAN);
  for ((row, col), &value) in channel.indexed_iter() {
    if value.is_nan() {
      continue;
    }
    if best.2.is_nan() || value > best.2 {
      best = (row, col, value);
    }
  }
  best
}

/// 将 (K, H, W) 热图解码为 K 个关键点
///
/// 关键点顺序与通道顺序一致，坐标为 `(col * sx, row * sy)`。
/// 纯函数，相同输入总是得到相同输出。
pub fn decode(
  heatmap: &Heatmap,
  stride: Stride,
  expected_keypoints: usize,
) -> Result<Vec<Keypoint>, DecodeError> {
  heatmap.ensure_keypoints(expected_keypoints)?;

  let keypoints: Vec<Keypoint> = heatmap
    .channels()
    .map(|channel| {
      let (row, col, score) = argmax(channel);
      Keypoint {
        x: col as f32 * stride.x,
        y: row as f32 * stride.y,
        score,
      }
    })
    .collect();

  debug!("解码得到 {} 个关键点", keypoints.len());
  Ok(keypoints)
}
