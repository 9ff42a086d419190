// 该文件是 Gujia （骨架） 项目的一部分。
// tests/pipeline.rs - 端到端流程测试
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

#![cfg(all(feature = "read_image_file", feature = "save_image_file"))]

use std::path::Path;

use image::{Rgb, RgbImage};
use ndarray::{Array2, Array4};
use ndarray_npy::{read_npy, write_npy};
use url::Url;

use gujia::{
  FromUrl,
  input::InputWrapper,
  model::{HRNET_INPUT_H, HRNET_INPUT_W, HeatmapFileModel},
  output::SaveImageFileOutput,
  task::{OneShotTask, Task, TensorDumpTask},
};

fn url(scheme: &str, path: &Path, query: &str) -> Url {
  Url::parse(&format!("{}://{}{}", scheme, path.display(), query)).unwrap()
}

fn write_scenario_heatmap(path: &Path) {
  // (1, 17, 64, 48)，各通道峰值位置
  let mut heatmap = Array4::<f32>::zeros((1, 17, 64, 48));
  for k in 0..17 {
    heatmap[[0, k, 60, 44]] = 0.5;
  }
  heatmap[[0, 0, 10, 20]] = 0.9;
  heatmap[[0, 5, 5, 5]] = 0.9;
  heatmap[[0, 6, 5, 30]] = 0.9;
  write_npy(path, &heatmap).unwrap();
}

#[test]
fn draws_skeleton_from_replayed_heatmap() {
  let dir = tempfile::tempdir().unwrap();
  let image_path = dir.path().join("test.jpg");
  let heatmap_path = dir.path().join("nef_sim_output.npy");
  let output_path = dir.path().join("output").join("final_pose_result.png");

  RgbImage::from_pixel(384, 512, Rgb([0, 0, 0]))
    .save(&image_path)
    .unwrap();
  write_scenario_heatmap(&heatmap_path);

  let input =
    InputWrapper::<HRNET_INPUT_W, HRNET_INPUT_H>::from_url(&url("image", &image_path, "")).unwrap();
  let model = HeatmapFileModel::<HRNET_INPUT_W, HRNET_INPUT_H>::from_url(&url(
    "npy",
    &heatmap_path,
    "?stride=4,4&keypoints=17",
  ))
  .unwrap();
  let output = SaveImageFileOutput::<HRNET_INPUT_W, HRNET_INPUT_H>::from_url(&url(
    "image",
    &output_path,
    "?keypoints=npy,json",
  ))
  .unwrap();

  OneShotTask
    .run_task(input.into_nchw(), model, output)
    .unwrap();

  let rendered = image::open(&output_path).unwrap().to_rgb8();
  assert_eq!(rendered.dimensions(), (192, 256));
  // 关键点 5 与 6 之间的连线 (20,20)-(120,20)
  for x in 30..=110 {
    assert_eq!(rendered.get_pixel(x, 20), &Rgb([0, 255, 255]), "x={x}");
  }
  // 关键点 0 位于 (80, 40)
  assert_eq!(rendered.get_pixel(80, 40), &Rgb([255, 0, 0]));

  let coords: Array2<f32> = read_npy(output_path.with_extension("keypoints.npy")).unwrap();
  assert_eq!(coords.shape(), &[17, 2]);
  assert_eq!((coords[[0, 0]], coords[[0, 1]]), (80.0, 40.0));
  assert_eq!((coords[[6, 0]], coords[[6, 1]]), (120.0, 20.0));
  assert_eq!((coords[[16, 0]], coords[[16, 1]]), (176.0, 240.0));
  assert!(output_path.with_extension("keypoints.json").exists());
}

#[test]
fn mismatched_keypoint_count_is_rejected() {
  let dir = tempfile::tempdir().unwrap();
  let image_path = dir.path().join("test.png");
  let heatmap_path = dir.path().join("heatmap.npy");
  let output_path = dir.path().join("out.png");

  RgbImage::new(192, 256).save(&image_path).unwrap();
  write_scenario_heatmap(&heatmap_path);

  let input =
    InputWrapper::<HRNET_INPUT_W, HRNET_INPUT_H>::from_url(&url("image", &image_path, "")).unwrap();
  let model = HeatmapFileModel::<HRNET_INPUT_W, HRNET_INPUT_H>::from_url(&url(
    "npy",
    &heatmap_path,
    "?keypoints=16",
  ))
  .unwrap();
  let output = SaveImageFileOutput::<HRNET_INPUT_W, HRNET_INPUT_H>::new(&output_path);

  let err = OneShotTask
    .run_task(input.into_nchw(), model, output)
    .unwrap_err();
  assert!(err.to_string().contains("关键点数量不匹配"), "{err}");
  assert!(!output_path.exists());
}

#[test]
fn calibration_directory_becomes_stacked_tensor() {
  let dir = tempfile::tempdir().unwrap();
  let calib = dir.path().join("calib_images");
  std::fs::create_dir(&calib).unwrap();
  for (i, name) in ["a.jpg", "b.png", "c.bmp"].iter().enumerate() {
    RgbImage::from_pixel(64, 64, Rgb([i as u8 * 100, 0, 0]))
      .save(calib.join(name))
      .unwrap();
  }
  std::fs::write(calib.join("readme.md"), "skip me").unwrap();
  let tensor_path = dir.path().join("calib.npy");

  let input =
    InputWrapper::<HRNET_INPUT_W, HRNET_INPUT_H>::from_url(&url("calib", &calib, "?limit=2"))
      .unwrap();
  TensorDumpTask::new(&tensor_path)
    .run_task(input.into_nchw(), (), ())
    .unwrap();

  let tensor: Array4<f32> = read_npy(&tensor_path).unwrap();
  assert_eq!(tensor.shape(), &[2, 3, 256, 192]);
}
