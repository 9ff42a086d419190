// 该文件是 Gujia （骨架） 项目的一部分。
// src/model/pose.rs - 姿态估计模型
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

use thiserror::Error;
use tracing::debug;

use crate::{
  frame::RgbNchwFrame,
  input::AsNchwFrame,
  model::{DecodeError, HeatmapEngine, Model, PoseResult, Stride, decode},
  skeleton::COCO_KEYPOINT_NUM,
};

#[derive(Error, Debug)]
pub enum PoseModelError {
  #[error("推理引擎错误: {0}")]
  Engine(#[source] Box<dyn std::error::Error + Send + Sync>),
  #[error("热图解码错误: {0}")]
  Decode(#[from] DecodeError),
}

/// 推理引擎 + 热图解码
///
/// 未显式设置步长时，由输入帧尺寸与热图尺寸推算。
pub struct PoseModel<E, const W: u32, const H: u32> {
  engine: E,
  stride: Option<Stride>,
  keypoints: usize,
}

impl<E: HeatmapEngine, const W: u32, const H: u32> PoseModel<E, W, H> {
  pub fn new(engine: E) -> Self {
    PoseModel {
      engine,
      stride: None,
      keypoints: COCO_KEYPOINT_NUM,
    }
  }

  pub fn with_stride(mut self, stride: Option<Stride>) -> Self {
    self.stride = stride;
    self
  }

  pub fn with_keypoints(mut self, keypoints: usize) -> Self {
    self.keypoints = keypoints;
    self
  }

  pub fn keypoints(&self) -> usize {
    self.keypoints
  }
}

impl<E: HeatmapEngine, const W: u32, const H: u32> Model for PoseModel<E, W, H> {
  type Input = RgbNchwFrame<W, H>;
  type Output = PoseResult;
  type Error = PoseModelError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    debug!("执行模型推理");
    let heatmap = self
      .engine
      .run(input.as_nchw())
      .map_err(|e| PoseModelError::Engine(Box::new(e)))?;

    let stride = match self.stride {
      Some(stride) => stride,
      None => Stride::from_sizes((W, H), (heatmap.width(), heatmap.height()))?,
    };
    debug!("解码步长: ({}, {})", stride.x(), stride.y());

    let keypoints = decode(&heatmap, stride, self.keypoints)?;
    Ok(PoseResult::from(keypoints))
  }
}
