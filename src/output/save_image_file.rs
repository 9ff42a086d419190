// 该文件是 Gujia （骨架） 项目的一部分。
// src/output/save_image_file.rs - 保存图像文件
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

use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::RgbNchwFrame,
  model::PoseResult,
  output::{
    Render,
    draw::{DrawPoseOnFrame, DrawStyle, RenderError, SkeletonRenderer},
    record::{KeypointRecord, RecordError},
  },
  url_path,
};

pub struct SaveImageFileOutput<const W: u32, const H: u32> {
  path: PathBuf,
  renderer: SkeletonRenderer,
  record: KeypointRecord,
}

#[derive(Error, Debug)]
pub enum SaveImageFileError {
  #[error("I/O 错误 {path}: {source}")]
  IoError {
    path: PathBuf,
    source: std::io::Error,
  },
  #[error("图像错误 {path}: {source}")]
  ImageError {
    path: PathBuf,
    source: image::ImageError,
  },
  #[error("渲染错误: {0}")]
  RenderError(#[from] RenderError),
  #[error("记录错误: {0}")]
  RecordError(#[from] RecordError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("无效的查询参数 {0}={1}")]
  InvalidQuery(String, String),
}

impl<const W: u32, const H: u32> FromUrlWithScheme for SaveImageFileOutput<W, H> {
  const SCHEME: &'static str = "image";
}

impl<const W: u32, const H: u32> FromUrl for SaveImageFileOutput<W, H> {
  type Error = SaveImageFileError;

  /// `image:///output/final_pose_result.jpg?keypoints=npy,json`
  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(SaveImageFileError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    let mut record = KeypointRecord::default();
    for (k, v) in uri.query_pairs() {
      if k == "keypoints" {
        record = KeypointRecord::parse(&v)
          .ok_or_else(|| SaveImageFileError::InvalidQuery(k.to_string(), v.to_string()))?;
      }
    }

    Ok(SaveImageFileOutput::new(url_path(uri)).with_record(record))
  }
}

impl<const W: u32, const H: u32> SaveImageFileOutput<W, H> {
  pub fn new(path: impl AsRef<Path>) -> Self {
    SaveImageFileOutput {
      path: path.as_ref().to_path_buf(),
      renderer: SkeletonRenderer::default(),
      record: KeypointRecord::default(),
    }
  }

  pub fn with_renderer(mut self, renderer: SkeletonRenderer) -> Self {
    self.renderer = renderer;
    self
  }

  pub fn with_style(mut self, style: DrawStyle) -> Self {
    self.renderer = self.renderer.with_style(style);
    self
  }

  pub fn with_record(mut self, record: KeypointRecord) -> Self {
    self.record = record;
    self
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  fn save_image(&self, image: image::RgbImage) -> Result<(), SaveImageFileError> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent).map_err(|source| SaveImageFileError::IoError {
        path: parent.to_path_buf(),
        source,
      })?;
    }

    image
      .save(&self.path)
      .map_err(|source| SaveImageFileError::ImageError {
        path: self.path.clone(),
        source,
      })?;

    warn!("保存图像到文件: {}", self.path.display());

    Ok(())
  }
}

impl<const W: u32, const H: u32> Render<RgbNchwFrame<W, H>, PoseResult>
  for SaveImageFileOutput<W, H>
{
  type Error = SaveImageFileError;

  fn render_result(
    &self,
    frame: &RgbNchwFrame<W, H>,
    result: &PoseResult,
  ) -> Result<(), Self::Error> {
    let image = self.renderer.draw_pose(frame, result)?;
    self.save_image(image)?;
    if self.record.is_enabled() {
      self.record.record(result, &self.path)?;
    }
    Ok(())
  }
}
