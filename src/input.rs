// 该文件是 Gujia （骨架） 项目的一部分。
// src/input.rs - 图像输入
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

use ndarray::Array4;
use thiserror::Error;

pub trait AsNchwFrame<const W: u32, const H: u32> {
  fn as_nchw(&self) -> &Array4<f32>;
}

#[cfg(feature = "read_image_file")]
mod read_image_file;
#[cfg(feature = "read_image_file")]
pub use self::read_image_file::{ImageFileInput, ImageFileInputError, ImageFileInputNchw};

#[cfg(feature = "read_image_file")]
mod calibration_set;
#[cfg(feature = "read_image_file")]
pub use self::calibration_set::{
  CALIBRATION_EXTENSIONS, CalibrationSetInput, CalibrationSetInputError, CalibrationSetNchw,
};

use crate::{FromUrl, frame::RgbNchwFrame};

#[derive(Error, Debug)]
pub enum InputError {
  #[cfg(feature = "read_image_file")]
  #[error("Image file input error: {0}")]
  ImageFileInputError(#[from] ImageFileInputError),
  #[cfg(feature = "read_image_file")]
  #[error("Calibration set input error: {0}")]
  CalibrationSetInputError(#[from] CalibrationSetInputError),
  #[error("URI scheme mismatch")]
  SchemeMismatch,
}

pub enum InputWrapper<const W: u32, const H: u32> {
  #[cfg(feature = "read_image_file")]
  ReadImageFile(ImageFileInput<W, H>),
  #[cfg(feature = "read_image_file")]
  CalibrationSet(CalibrationSetInput<W, H>),
}

impl<const W: u32, const H: u32> FromUrl for InputWrapper<W, H> {
  type Error = InputError;

  fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
    #[cfg(feature = "read_image_file")]
    {
      use crate::FromUrlWithScheme;

      if url.scheme() == ImageFileInput::<W, H>::SCHEME {
        let input = ImageFileInput::from_url(url)?;
        return Ok(InputWrapper::ReadImageFile(input));
      }
      if url.scheme() == CalibrationSetInput::<W, H>::SCHEME {
        let input = CalibrationSetInput::from_url(url)?;
        return Ok(InputWrapper::CalibrationSet(input));
      }
    }
    let _ = url;
    Err(InputError::SchemeMismatch)
  }
}

impl<const W: u32, const H: u32> InputWrapper<W, H> {
  pub fn into_nchw(self) -> InputWrapperNchwIter<W, H> {
    match self {
      #[cfg(feature = "read_image_file")]
      InputWrapper::ReadImageFile(input) => InputWrapperNchwIter::ReadImageFile(input.into_nchw()),
      #[cfg(feature = "read_image_file")]
      InputWrapper::CalibrationSet(input) => {
        InputWrapperNchwIter::CalibrationSet(input.into_nchw())
      }
    }
  }
}

pub enum InputWrapperNchwIter<const W: u32, const H: u32> {
  #[cfg(feature = "read_image_file")]
  ReadImageFile(ImageFileInputNchw<W, H>),
  #[cfg(feature = "read_image_file")]
  CalibrationSet(CalibrationSetNchw<W, H>),
}

impl<const W: u32, const H: u32> Iterator for InputWrapperNchwIter<W, H> {
  type Item = RgbNchwFrame<W, H>;

  fn next(&mut self) -> Option<Self::Item> {
    match self {
      #[cfg(feature = "read_image_file")]
      InputWrapperNchwIter::ReadImageFile(input) => input.next(),
      #[cfg(feature = "read_image_file")]
      InputWrapperNchwIter::CalibrationSet(input) => input.next(),
    }
  }
}
