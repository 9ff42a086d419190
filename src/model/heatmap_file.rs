// 该文件是 Gujia （骨架） 项目的一部分。
// src/model/heatmap_file.rs - 基于热图文件的推理结果回放
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

use std::convert::Infallible;

use ndarray::Array4;
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  heatmap::{Heatmap, HeatmapFileError},
  model::{DecodeError, HeatmapEngine, PoseModel, Stride},
  parse_list,
  skeleton::{COCO_SKELETON, implied_keypoints},
  url_path,
};

/// 回放外部引擎已保存的 `.npy` 热图
///
/// ONNX 运行时或 NPU 模拟器在本项目之外运行，结果以 `(1, K, H, W)` 保存。
/// 输入张量不参与计算。
#[derive(Debug, Clone)]
pub struct HeatmapFileEngine {
  heatmap: Heatmap,
}

impl HeatmapFileEngine {
  pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, HeatmapFileError> {
    Ok(HeatmapFileEngine {
      heatmap: Heatmap::from_npy(path)?,
    })
  }

  pub fn heatmap(&self) -> &Heatmap {
    &self.heatmap
  }
}

impl From<Heatmap> for HeatmapFileEngine {
  fn from(heatmap: Heatmap) -> Self {
    HeatmapFileEngine { heatmap }
  }
}

impl HeatmapEngine for HeatmapFileEngine {
  type Error = Infallible;

  fn run(&self, tensor: &Array4<f32>) -> Result<Heatmap, Self::Error> {
    debug!("回放热图文件，忽略输入张量 {:?}", tensor.shape());
    Ok(self.heatmap.clone())
  }
}

pub type HeatmapFileModel<const W: u32, const H: u32> = PoseModel<HeatmapFileEngine, W, H>;

#[derive(Error, Debug)]
pub enum HeatmapFileModelError {
  #[error("模型路径必须使用 {0} 方案")]
  SchemeMismatch(&'static str),
  #[error("无效的查询参数 {0}={1}")]
  InvalidQuery(String, String),
  #[error("{0}")]
  File(#[from] HeatmapFileError),
  #[error("{0}")]
  Decode(#[from] DecodeError),
}

impl<const W: u32, const H: u32> FromUrlWithScheme for HeatmapFileModel<W, H> {
  const SCHEME: &'static str = "npy";
}

impl<const W: u32, const H: u32> FromUrl for HeatmapFileModel<W, H> {
  type Error = HeatmapFileModelError;

  /// `npy:///path/heatmap.npy?stride=4,4&keypoints=17`
  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!("模型路径方案错误: {}", url.scheme());
      return Err(HeatmapFileModelError::SchemeMismatch(Self::SCHEME));
    }

    let invalid = |k: &str, v: &str| HeatmapFileModelError::InvalidQuery(k.to_string(), v.to_string());
    let mut stride = None;
    let mut keypoints = None;
    for (k, v) in url.query_pairs() {
      match k.as_ref() {
        "stride" => {
          let values = parse_list::<f32>(&v).ok_or_else(|| invalid(&k[..], &v[..]))?;
          let (sx, sy) = match values.as_slice() {
            [s] => (*s, *s),
            [sx, sy] => (*sx, *sy),
            _ => return Err(invalid(&k[..], &v[..])),
          };
          stride = Some(Stride::new(sx, sy)?);
        }
        "keypoints" => {
          keypoints = Some(v.parse::<usize>().map_err(|_| invalid(&k[..], &v[..]))?);
        }
        _ => debug!("忽略未知查询参数 {}={}", k, v),
      }
    }

    let engine = HeatmapFileEngine::open(url_path(url))?;
    // 未指定时与 COCO 骨架连线表一致，通道数不符的热图在推理时报错
    let keypoints = keypoints.unwrap_or_else(|| implied_keypoints(&COCO_SKELETON));

    Ok(
      PoseModel::new(engine)
        .with_stride(stride)
        .with_keypoints(keypoints),
    )
  }
}
