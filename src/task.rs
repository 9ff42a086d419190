// 该文件是 Gujia （骨架） 项目的一部分。
// src/task.rs - 任务流程
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

use ndarray::{Array4, ArrayView4, Axis};
use ndarray_npy::write_npy;
use tracing::{debug, info, warn};

use crate::{frame::RgbNchwFrame, input::AsNchwFrame, model::Model, output::Render};

pub trait Task<I, M, O>: Sized {
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<(), Self::Error>;
}

/// 取一帧，推理，渲染
pub struct OneShotTask;

impl<
  F,
  D,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = F>,
  M: Model<Input = F, Output = D, Error = ME>,
  O: Render<F, D, Error = RE>,
> Task<I, M, O> for OneShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, model: M, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    info!("输入帧获取成功，开始推理...");
    let now = std::time::Instant::now();
    let result = model.infer(&frame)?;
    let elapsed = now.elapsed();
    info!("推理完成，耗时: {:.2?}", elapsed);
    output.render_result(&frame, &result)?;
    info!("渲染完成，耗时: {:.2?}", now.elapsed());

    Ok(())
  }
}

/// 将全部输入帧堆叠为 (N, 3, H, W) 张量并保存为 `.npy`
///
/// 单张图像得到推理输入，图像目录得到量化校正数据。
pub struct TensorDumpTask {
  path: PathBuf,
}

impl TensorDumpTask {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    TensorDumpTask { path: path.into() }
  }

  pub fn stack<const W: u32, const H: u32>(
    input: impl Iterator<Item = RgbNchwFrame<W, H>>,
  ) -> anyhow::Result<Array4<f32>> {
    let frames: Vec<_> = input.collect();
    if frames.is_empty() {
      return Err(anyhow::anyhow!("没有输入帧"));
    }
    let views: Vec<ArrayView4<'_, f32>> = frames.iter().map(|f| f.as_nchw().view()).collect();
    let tensor = ndarray::concatenate(Axis(0), &views)?;
    debug!("堆叠张量形状: {:?}", tensor.shape());
    Ok(tensor)
  }
}

impl<const W: u32, const H: u32, I: Iterator<Item = RgbNchwFrame<W, H>>> Task<I, (), ()>
  for TensorDumpTask
{
  type Error = anyhow::Error;

  fn run_task(self, input: I, _model: (), _output: ()) -> Result<(), Self::Error> {
    info!("开始预处理...");
    let tensor = Self::stack(input)?;
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }
    write_npy(&self.path, &tensor)?;
    warn!(
      "保存 {} 帧张量 {:?} 到文件: {}",
      tensor.len_of(Axis(0)),
      tensor.shape(),
      self.path.display()
    );
    Ok(())
  }
}
