// 该文件是 Gujia （骨架） 项目的一部分。
// src/heatmap.rs - 关键点热图
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

use std::path::{Path, PathBuf};

use ndarray::{Array3, ArrayD, ArrayView2, Axis, Ix3};
use ndarray_npy::{ReadNpyError, read_npy};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
  #[error("热图维度异常: {0:?}，期望 (K, H, W) 或 (1, K, H, W)")]
  Dimensionality(Vec<usize>),
  #[error("热图批次大小为 {0}，仅支持单张")]
  BatchSize(usize),
  #[error("热图空间尺寸为空: {0}x{1}")]
  EmptySpatial(usize, usize),
  #[error("热图没有关键点通道")]
  NoKeypoints,
  #[error("关键点数量不匹配: 期望 {expected}, 实际 {actual}")]
  KeypointCount { expected: usize, actual: usize },
  #[error("热图形状不一致: {0:?} vs {1:?}")]
  Mismatch(Vec<usize>, Vec<usize>),
}

#[derive(Error, Debug)]
pub enum HeatmapFileError {
  #[error("读取热图文件 {path} 失败: {source}")]
  Read { path: PathBuf, source: ReadNpyError },
  #[error("热图文件 {path} 形状错误: {source}")]
  Shape { path: PathBuf, source: ShapeError },
}

/// 单张图像的关键点热图，形状 (K, H, W)
#[derive(Debug, Clone, PartialEq)]
pub struct Heatmap {
  data: Array3<f32>,
}

impl TryFrom<Array3<f32>> for Heatmap {
  type Error = ShapeError;

  fn try_from(data: Array3<f32>) -> Result<Self, Self::Error> {
    let (k, h, w) = data.dim();
    if k == 0 {
      return Err(ShapeError::NoKeypoints);
    }
    if h == 0 || w == 0 {
      return Err(ShapeError::EmptySpatial(h, w));
    }
    Ok(Heatmap { data })
  }
}

impl TryFrom<ArrayD<f32>> for Heatmap {
  type Error = ShapeError;

  /// 接受 (K, H, W) 或批次为 1 的 (1, K, H, W)
  fn try_from(data: ArrayD<f32>) -> Result<Self, Self::Error> {
    let data = match data.ndim() {
      3 => data,
      4 if data.shape()[0] == 1 => data.index_axis_move(Axis(0), 0),
      4 => return Err(ShapeError::BatchSize(data.shape()[0])),
      _ => return Err(ShapeError::Dimensionality(data.shape().to_vec())),
    };
    let data = data
      .into_dimensionality::<Ix3>()
      .map_err(|_| ShapeError::Dimensionality(vec![]))?;
    Heatmap::try_from(data)
  }
}

impl Heatmap {
  /// 从 `.npy` 文件读取，支持 float32 与 float64
  pub fn from_npy(path: impl AsRef<Path>) -> Result<Self, HeatmapFileError> {
    let path = path.as_ref();
    info!("读取热图文件: {}", path.display());

    let read_err = |source| HeatmapFileError::Read {
      path: path.to_path_buf(),
      source,
    };
    let data: ArrayD<f32> = match read_npy::<_, ArrayD<f32>>(path) {
      Ok(data) => data,
      Err(ReadNpyError::WrongDescriptor(_)) => {
        debug!("热图不是 float32，尝试按 float64 读取");
        read_npy::<_, ArrayD<f64>>(path)
          .map_err(read_err)?
          .mapv(|v| v as f32)
      }
      Err(e) => return Err(read_err(e)),
    };

    let heatmap = Heatmap::try_from(data).map_err(|source| HeatmapFileError::Shape {
      path: path.to_path_buf(),
      source,
    })?;
    debug!("热图形状: {:?}", heatmap.data.shape());
    Ok(heatmap)
  }

  pub fn keypoints(&self) -> usize {
    self.data.dim().0
  }

  pub fn height(&self) -> usize {
    self.data.dim().1
  }

  pub fn width(&self) -> usize {
    self.data.dim().2
  }

  pub fn channel(&self, index: usize) -> ArrayView2<'_, f32> {
    self.data.index_axis(Axis(0), index)
  }

  pub fn channels(&self) -> impl Iterator<Item = ArrayView2<'_, f32>> {
    self.data.outer_iter()
  }

  pub fn as_array(&self) -> &Array3<f32> {
    &self.data
  }

  pub fn ensure_keypoints(&self, expected: usize) -> Result<(), ShapeError> {
    if self.keypoints() != expected {
      return Err(ShapeError::KeypointCount {
        expected,
        actual: self.keypoints(),
      });
    }
    Ok(())
  }
}

/// 两张热图的逐元素比较结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatmapComparison {
  pub mae: f64,
  pub max_abs: f64,
  pub tolerance: f64,
}

impl HeatmapComparison {
  pub fn is_close(&self) -> bool {
    self.mae < self.tolerance
  }
}

/// 平均绝对误差，形状必须完全一致
pub fn mean_abs_error(reference: &Heatmap, candidate: &Heatmap) -> Result<f64, ShapeError> {
  Ok(compare(reference, candidate, 0.0)?.mae)
}

pub fn compare(
  reference: &Heatmap,
  candidate: &Heatmap,
  tolerance: f64,
) -> Result<HeatmapComparison, ShapeError> {
  if reference.data.shape() != candidate.data.shape() {
    return Err(ShapeError::Mismatch(
      reference.data.shape().to_vec(),
      candidate.data.shape().to_vec(),
    ));
  }

  let mut sum = 0.0f64;
  let mut max_abs = 0.0f64;
  for (a, b) in reference.data.iter().zip(candidate.data.iter()) {
    let diff = (*a as f64 - *b as f64).abs();
    sum += diff;
    max_abs = max_abs.max(diff);
  }
  let mae = sum / reference.data.len() as f64;

  Ok(HeatmapComparison {
    mae,
    max_abs,
    tolerance,
  })
}
