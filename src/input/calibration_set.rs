// 该文件是 Gujia （骨架） 项目的一部分。
// src/input/calibration_set.rs - 量化校正图像集输入
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
use tracing::{debug, info, warn};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, frame::RgbNchwFrame, url_path};

use super::read_image_file::load_rgb_image;

/// 校正集接受的图像扩展名（不区分大小写）
pub const CALIBRATION_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

const DEFAULT_CALIBRATION_LIMIT: usize = 50;

#[derive(Error, Debug)]
pub enum CalibrationSetInputError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("读取目录 {path} 失败: {source}")]
  IoError {
    path: PathBuf,
    source: std::io::Error,
  },
  #[error("目录 {0} 下没有找到图像")]
  NoImages(PathBuf),
  #[error("无效的查询参数 {0}={1}")]
  InvalidQuery(String, String),
}

/// 量化校正使用的图像集合
///
/// 递归扫描目录，按路径排序后截取前 `limit` 张，逐张解码预处理。
/// 解码失败的图像记录警告后跳过。
pub struct CalibrationSetInput<const W: u32, const H: u32> {
  files: Vec<PathBuf>,
}

impl<const W: u32, const H: u32> FromUrlWithScheme for CalibrationSetInput<W, H> {
  const SCHEME: &'static str = "calib";
}

impl<const W: u32, const H: u32> FromUrl for CalibrationSetInput<W, H> {
  type Error = CalibrationSetInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(CalibrationSetInputError::SchemeMismatch(format!(
        "期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    let mut limit = Some(DEFAULT_CALIBRATION_LIMIT);
    for (k, v) in url.query_pairs() {
      if k == "limit" {
        let value: usize = v
          .parse()
          .map_err(|_| CalibrationSetInputError::InvalidQuery(k.to_string(), v.to_string()))?;
        // limit=0 表示不限制
        limit = (value > 0).then_some(value);
      }
    }

    Self::scan(url_path(url), limit)
  }
}

fn is_calibration_image(path: &Path) -> bool {
  path
    .extension()
    .and_then(|ext| ext.to_str())
    .map(|ext| {
      CALIBRATION_EXTENSIONS
        .iter()
        .any(|allowed| ext.eq_ignore_ascii_case(allowed))
    })
    .unwrap_or(false)
}

fn collect_images(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), CalibrationSetInputError> {
  let to_err = |source| CalibrationSetInputError::IoError {
    path: dir.to_path_buf(),
    source,
  };
  for entry in std::fs::read_dir(dir).map_err(to_err)? {
    let path = entry.map_err(to_err)?.path();
    if path.is_dir() {
      collect_images(&path, files)?;
    } else if is_calibration_image(&path) {
      files.push(path);
    }
  }
  Ok(())
}

impl<const W: u32, const H: u32> CalibrationSetInput<W, H> {
  pub fn scan(dir: impl AsRef<Path>, limit: Option<usize>) -> Result<Self, CalibrationSetInputError> {
    let dir = dir.as_ref();
    info!("扫描校正图像目录: {}", dir.display());

    let mut files = Vec::new();
    collect_images(dir, &mut files)?;
    if files.is_empty() {
      return Err(CalibrationSetInputError::NoImages(dir.to_path_buf()));
    }
    files.sort();
    if let Some(limit) = limit {
      files.truncate(limit);
    }
    info!("校正图像数量: {}", files.len());

    Ok(CalibrationSetInput { files })
  }

  pub fn files(&self) -> &[PathBuf] {
    &self.files
  }

  pub fn into_nchw(self) -> CalibrationSetNchw<W, H> {
    CalibrationSetNchw {
      files: self.files.into_iter(),
    }
  }
}

pub struct CalibrationSetNchw<const W: u32, const H: u32> {
  files: std::vec::IntoIter<PathBuf>,
}

impl<const W: u32, const H: u32> Iterator for CalibrationSetNchw<W, H> {
  type Item = RgbNchwFrame<W, H>;

  fn next(&mut self) -> Option<Self::Item> {
    for path in self.files.by_ref() {
      match load_rgb_image(&path) {
        Ok(image) => {
          debug!("校正图像: {}", path.display());
          return Some(RgbNchwFrame::from(image));
        }
        Err(e) => warn!("跳过 {}: {}", path.display(), e),
      }
    }
    None
  }
}
