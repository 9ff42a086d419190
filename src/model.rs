// 该文件是 Gujia （骨架） 项目的一部分。
// src/model.rs - 模型
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

use ndarray::{Array2, Array4};
use serde::Serialize;

use crate::heatmap::Heatmap;

/// HRNet w32 256x192 网络输入宽度
pub const HRNET_INPUT_W: u32 = 192;
/// HRNet w32 256x192 网络输入高度
pub const HRNET_INPUT_H: u32 = 256;

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// 外部推理引擎（ONNX 运行时、NPU 模拟器或硬件）
///
/// 输入 `(1, 3, H, W)` 张量，输出关键点热图。引擎内部实现不在本项目范围内。
pub trait HeatmapEngine {
  type Error: std::error::Error + Send + Sync + 'static;

  fn run(&self, tensor: &Array4<f32>) -> Result<Heatmap, Self::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Keypoint {
  pub x: f32,
  pub y: f32,
  /// 热图峰值置信度
  pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoseResult {
  pub keypoints: Box<[Keypoint]>,
}

impl From<Vec<Keypoint>> for PoseResult {
  fn from(keypoints: Vec<Keypoint>) -> Self {
    PoseResult {
      keypoints: keypoints.into_boxed_slice(),
    }
  }
}

impl PoseResult {
  pub fn len(&self) -> usize {
    self.keypoints.len()
  }

  pub fn is_empty(&self) -> bool {
    self.keypoints.is_empty()
  }

  /// 关键点坐标矩阵 (K, 2)，列为 x, y
  pub fn to_coordinates(&self) -> Array2<f32> {
    Array2::from_shape_fn((self.keypoints.len(), 2), |(k, c)| {
      let kp = &self.keypoints[k];
      if c == 0 { kp.x } else { kp.y }
    })
  }
}

mod decoder;
pub use self::decoder::{DecodeError, Stride, decode};

mod pose;
pub use self::pose::{PoseModel, PoseModelError};

mod heatmap_file;
pub use self::heatmap_file::{HeatmapFileEngine, HeatmapFileModel, HeatmapFileModelError};

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn coordinates_keep_keypoint_order() {
    let result = PoseResult::from(vec![
      Keypoint {
        x: 80.0,
        y: 40.0,
        score: 1.0,
      },
      Keypoint {
        x: 20.0,
        y: 120.0,
        score: 0.5,
      },
    ]);
    let coords = result.to_coordinates();
    assert_eq!(coords.shape(), &[2, 2]);
    assert_eq!(coords[[0, 0]], 80.0);
    assert_eq!(coords[[0, 1]], 40.0);
    assert_eq!(coords[[1, 0]], 20.0);
    assert_eq!(coords[[1, 1]], 120.0);
  }
}
