// 该文件是 Gujia （骨架） 项目的一部分。
// src/frame.rs - NCHW 帧定义
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

use image::{RgbImage, imageops::FilterType};
use ndarray::Array4;
use thiserror::Error;

use crate::input::AsNchwFrame;

const RGB_CHANNELS: usize = 3;

/// 网络输入帧：缩放后的 RGB 画布与对应的归一化 NCHW 张量
///
/// 画布用于后续绘制骨架，张量（`[0, 1]` 浮点，形状 `(1, 3, H, W)`）
/// 交给外部推理引擎或量化工具链。
#[derive(Debug, Clone)]
pub struct RgbNchwFrame<const W: u32, const H: u32> {
  image: RgbImage,
  tensor: Array4<f32>,
}

impl<const W: u32, const H: u32> From<RgbImage> for RgbNchwFrame<W, H> {
  fn from(image: RgbImage) -> Self {
    // 双线性插值缩放到网络输入尺寸
    let image = if image.dimensions() == (W, H) {
      image
    } else {
      image::imageops::resize(&image, W, H, FilterType::Triangle)
    };

    let mut tensor = Array4::<f32>::zeros((1, RGB_CHANNELS, H as usize, W as usize));
    for (x, y, pixel) in image.enumerate_pixels() {
      for c in 0..RGB_CHANNELS {
        tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
      }
    }

    Self { image, tensor }
  }
}

impl<const W: u32, const H: u32> Default for RgbNchwFrame<W, H> {
  fn default() -> Self {
    Self {
      image: RgbImage::new(W, H),
      tensor: Array4::zeros((1, RGB_CHANNELS, H as usize, W as usize)),
    }
  }
}

impl<const W: u32, const H: u32> RgbNchwFrame<W, H> {
  pub fn height(&self) -> usize {
    H as usize
  }

  pub fn width(&self) -> usize {
    W as usize
  }

  pub fn channels(&self) -> usize {
    RGB_CHANNELS
  }

  pub fn image(&self) -> &RgbImage {
    &self.image
  }

  pub fn into_image(self) -> RgbImage {
    self.image
  }

  pub fn input_shape() -> InputShape {
    InputShape {
      batch: 1,
      channels: RGB_CHANNELS,
      height: H as usize,
      width: W as usize,
    }
  }
}

impl<const W: u32, const H: u32> AsNchwFrame<W, H> for RgbNchwFrame<W, H> {
  fn as_nchw(&self) -> &Array4<f32> {
    &self.tensor
  }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum InputShapeError {
  #[error("无法解析输入形状: {0}")]
  Parse(String),
  #[error("输入维度异常: {0:?}，期望 NCHW")]
  NotNchw(Vec<i64>),
  #[error("期望 3 通道输入，实际 C={0}")]
  Channels(i64),
  #[error("输入空间尺寸无效: {0}x{1}")]
  Spatial(i64, i64),
  #[error("输入形状不匹配: 期望 {expected}, 实际 {actual}")]
  Mismatch {
    expected: InputShape,
    actual: InputShape,
  },
}

/// 网络声明的输入形状 (N, C, H, W)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputShape {
  pub batch: usize,
  pub channels: usize,
  pub height: usize,
  pub width: usize,
}

impl std::fmt::Display for InputShape {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "({}, {}, {}, {})",
      self.batch, self.channels, self.height, self.width
    )
  }
}

impl InputShape {
  /// 从模型声明的维度构造，动态批次（0 或负数）视为 1
  pub fn from_dims(dims: &[i64]) -> Result<Self, InputShapeError> {
    let [n, c, h, w] = dims else {
      return Err(InputShapeError::NotNchw(dims.to_vec()));
    };
    if *c != RGB_CHANNELS as i64 {
      return Err(InputShapeError::Channels(*c));
    }
    if *h <= 0 || *w <= 0 {
      return Err(InputShapeError::Spatial(*h, *w));
    }
    let batch = if *n <= 0 { 1 } else { *n as usize };

    Ok(InputShape {
      batch,
      channels: RGB_CHANNELS,
      height: *h as usize,
      width: *w as usize,
    })
  }

  pub fn ensure_eq(&self, expected: &InputShape) -> Result<(), InputShapeError> {
    if self != expected {
      return Err(InputShapeError::Mismatch {
        expected: *expected,
        actual: *self,
      });
    }
    Ok(())
  }
}

/// 解析形如 `1,3,256,192` 的形状
impl std::str::FromStr for InputShape {
  type Err = InputShapeError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let dims = crate::parse_list::<i64>(s).ok_or_else(|| InputShapeError::Parse(s.to_string()))?;
    InputShape::from_dims(&dims)
  }
}
