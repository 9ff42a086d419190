// 该文件是 Gujia （骨架） 项目的一部分。
// src/output/record.rs - 关键点记录
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

use ndarray_npy::{WriteNpyError, write_npy};
use thiserror::Error;
use tracing::info;

use crate::model::PoseResult;

#[derive(Error, Debug)]
pub enum RecordError {
  #[error("写入 {path} 失败: {source}")]
  Npy {
    path: PathBuf,
    source: WriteNpyError,
  },
  #[error("写入 {path} 失败: {source}")]
  Io {
    path: PathBuf,
    source: std::io::Error,
  },
  #[error("序列化关键点失败: {0}")]
  Json(#[from] serde_json::Error),
}

/// 将关键点保存在输出文件旁边：`<stem>.keypoints.npy` 为 (K, 2) float32 坐标，
/// `<stem>.keypoints.json` 包含坐标与峰值置信度
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeypointRecord {
  pub npy: bool,
  pub json: bool,
}

// 不直接使用 `<stem>.npy`，同目录下的输入热图常用这个名字
fn record_path(path: &Path, extension: &str) -> PathBuf {
  path.with_extension(format!("keypoints.{extension}"))
}

impl KeypointRecord {
  /// 解析形如 `npy,json` 的记录格式列表
  pub fn parse(kinds: &str) -> Option<Self> {
    let mut record = KeypointRecord::default();
    for kind in kinds.split(',').map(str::trim).filter(|s| !s.is_empty()) {
      match kind {
        "npy" => record.npy = true,
        "json" => record.json = true,
        _ => return None,
      }
    }
    Some(record)
  }

  pub fn is_enabled(&self) -> bool {
    self.npy || self.json
  }

  pub fn record(&self, result: &PoseResult, path: &Path) -> Result<(), RecordError> {
    if self.npy {
      let npy_path = record_path(path, "npy");
      write_npy(&npy_path, &result.to_coordinates()).map_err(|source| RecordError::Npy {
        path: npy_path.clone(),
        source,
      })?;
      info!("关键点坐标已保存: {}", npy_path.display());
    }

    if self.json {
      let json_path = record_path(path, "json");
      let json = serde_json::to_string_pretty(result)?;
      std::fs::write(&json_path, json).map_err(|source| RecordError::Io {
        path: json_path.clone(),
        source,
      })?;
      info!("关键点记录已保存: {}", json_path.display());
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::Keypoint;
  use ndarray::Array2;
  use ndarray_npy::read_npy;

  fn result() -> PoseResult {
    PoseResult::from(vec![
      Keypoint {
        x: 80.0,
        y: 40.0,
        score: 0.9,
      },
      Keypoint {
        x: 20.0,
        y: 20.0,
        score: 0.5,
      },
    ])
  }

  #[test]
  fn parse_record_kinds() {
    assert_eq!(
      KeypointRecord::parse("npy, json"),
      Some(KeypointRecord {
        npy: true,
        json: true
      })
    );
    assert_eq!(KeypointRecord::parse(""), Some(KeypointRecord::default()));
    assert_eq!(KeypointRecord::parse("csv"), None);
  }

  #[test]
  fn writes_npy_and_json_next_to_image() {
    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("final_pose_result.jpg");
    KeypointRecord {
      npy: true,
      json: true,
    }
    .record(&result(), &image_path)
    .unwrap();

    let coords: Array2<f32> = read_npy(dir.path().join("final_pose_result.keypoints.npy")).unwrap();
    assert_eq!(coords, result().to_coordinates());

    let json = std::fs::read_to_string(dir.path().join("final_pose_result.keypoints.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["keypoints"][0]["x"], 80.0);
    assert_eq!(value["keypoints"][1]["y"], 20.0);
  }

  #[test]
  fn input_heatmap_with_same_stem_is_kept() {
    let dir = tempfile::tempdir().unwrap();
    let heatmap_path = dir.path().join("x.npy");
    std::fs::write(&heatmap_path, b"heatmap").unwrap();

    KeypointRecord {
      npy: true,
      json: false,
    }
    .record(&result(), &dir.path().join("x.jpg"))
    .unwrap();

    assert_eq!(std::fs::read(&heatmap_path).unwrap(), b"heatmap");
    assert!(dir.path().join("x.keypoints.npy").exists());
  }

  #[test]
  fn disabled_record_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    KeypointRecord::default()
      .record(&result(), &dir.path().join("out.png"))
      .unwrap();
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
  }
}
