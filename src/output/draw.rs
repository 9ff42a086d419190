// 该文件是 Gujia （骨架） 项目的一部分。
// src/output/draw.rs - 姿态骨架可视化
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

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};
use thiserror::Error;
use tracing::{debug, error};

use crate::{
  frame::RgbNchwFrame,
  model::{Keypoint, PoseResult},
  skeleton::{COCO_SKELETON, SkeletonPair, find_out_of_range},
};

const LINE_COLOR: [u8; 3] = [0, 255, 255]; // 青色
const POINT_COLOR: [u8; 3] = [255, 0, 0]; // 红色
const LINE_WIDTH: u32 = 2;
const POINT_RADIUS: u32 = 3;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
  #[error("骨架连线 {pair:?} 引用了关键点 {index}，但只有 {len} 个关键点")]
  KeypointIndex {
    pair: SkeletonPair,
    index: usize,
    len: usize,
  },
  #[error("关键点 {0} 坐标不是有限值")]
  NonFinite(usize),
  #[error("连线宽度至少为 1 像素")]
  LineWidth,
}

/// 绘制样式，`line_width` 至少为 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawStyle {
  pub line_color: [u8; 3],
  pub point_color: [u8; 3],
  pub line_width: u32,
  pub point_radius: u32,
}

impl Default for DrawStyle {
  fn default() -> Self {
    Self {
      line_color: LINE_COLOR,
      point_color: POINT_COLOR,
      line_width: LINE_WIDTH,
      point_radius: POINT_RADIUS,
    }
  }
}

// Cohen-Sutherland 区域编码
const INSIDE: u8 = 0;
const LEFT: u8 = 1;
const RIGHT: u8 = 2;
const BOTTOM: u8 = 4;
const TOP: u8 = 8;

fn outcode((x, y): (f32, f32), (max_x, max_y): (f32, f32)) -> u8 {
  let mut code = INSIDE;
  if x < 0.0 {
    code |= LEFT;
  } else if x > max_x {
    code |= RIGHT;
  }
  if y < 0.0 {
    code |= TOP;
  } else if y > max_y {
    code |= BOTTOM;
  }
  code
}

/// 将线段裁剪到 `[0, max_x] x [0, max_y]`，完全在外时返回 `None`
fn clip_segment(
  mut p0: (f32, f32),
  mut p1: (f32, f32),
  bounds: (f32, f32),
) -> Option<((f32, f32), (f32, f32))> {
  let (max_x, max_y) = bounds;
  // 每个端点最多被裁剪两次，最后一轮只做判定
  for _ in 0..5 {
    let (c0, c1) = (outcode(p0, bounds), outcode(p1, bounds));
    if c0 | c1 == INSIDE {
      return Some((p0, p1));
    }
    if c0 & c1 != INSIDE {
      return None;
    }

    let code = if c0 != INSIDE { c0 } else { c1 };
    let (dx, dy) = (p1.0 - p0.0, p1.1 - p0.1);
    let p = if code & TOP != 0 {
      (p0.0 + dx * (0.0 - p0.1) / dy, 0.0)
    } else if code & BOTTOM != 0 {
      (p0.0 + dx * (max_y - p0.1) / dy, max_y)
    } else if code & LEFT != 0 {
      (0.0, p0.1 + dy * (0.0 - p0.0) / dx)
    } else {
      (max_x, p0.1 + dy * (max_x - p0.0) / dx)
    };

    if code == c0 {
      p0 = p;
    } else {
      p1 = p;
    }
  }
  None
}

// 线宽通过沿短轴平移的多条单像素线段实现，
// 斜线按 长度 / 主轴投影 增加线段数，使垂直于连线方向的宽度保持一致
fn draw_thick_line(
  canvas: &mut RgbImage,
  from: (f32, f32),
  to: (f32, f32),
  width: u32,
  color: Rgb<u8>,
) {
  let bounds = (
    canvas.width().saturating_sub(1) as f32,
    canvas.height().saturating_sub(1) as f32,
  );
  let (dx, dy) = (to.0 - from.0, to.1 - from.1);
  let horizontal = dx.abs() >= dy.abs();
  let major = dx.abs().max(dy.abs());
  let strokes = if major > 0.0 {
    (width as f32 * dx.hypot(dy) / major).round() as u32
  } else {
    width
  };
  // 超出画布的平移线段全部会被裁剪
  let strokes = strokes.clamp(1, canvas.width() + canvas.height()) as i64;
  let first = -(strokes - 1) / 2;

  for offset in first..first + strokes {
    let o = offset as f32;
    let (start, end) = if horizontal {
      ((from.0, from.1 + o), (to.0, to.1 + o))
    } else {
      ((from.0 + o, from.1), (to.0 + o, to.1))
    };
    if let Some((start, end)) = clip_segment(start, end, bounds) {
      draw_line_segment_mut(canvas, start, end, color);
    }
  }
}

fn draw_point(canvas: &mut RgbImage, center: (f32, f32), radius: u32, color: Rgb<u8>) {
  let (w, h) = (canvas.width() as f32, canvas.height() as f32);
  let radius = radius.min(canvas.width() + canvas.height());
  let r = radius as f32;
  let (x, y) = (center.0.round(), center.1.round());
  // 圆心离画布超过半径时整个圆都不可见
  if x < -r || y < -r || x > w - 1.0 + r || y > h - 1.0 + r {
    return;
  }
  draw_filled_circle_mut(canvas, (x as i32, y as i32), radius as i32, color);
}

/// 在画布上绘制骨架：先画全部连线，再画全部关节点，关节点不会被连线遮挡
///
/// 任何连线索引越界、坐标非有限值或线宽为 0 时整体失败，画布保持不变。
/// 超出画布的部分会被裁剪。
pub fn render<'c>(
  canvas: &'c mut RgbImage,
  keypoints: &[Keypoint],
  pairs: &[SkeletonPair],
  style: &DrawStyle,
) -> Result<&'c mut RgbImage, RenderError> {
  if style.line_width == 0 {
    return Err(RenderError::LineWidth);
  }
  if let Some((pair, index)) = find_out_of_range(pairs, keypoints.len()) {
    error!("骨架连线 {:?} 越界，关键点数量 {}", pair, keypoints.len());
    return Err(RenderError::KeypointIndex {
      pair,
      index,
      len: keypoints.len(),
    });
  }
  if let Some(index) = keypoints
    .iter()
    .position(|kp| !(kp.x.is_finite() && kp.y.is_finite()))
  {
    error!("关键点 {} 坐标异常: {:?}", index, keypoints[index]);
    return Err(RenderError::NonFinite(index));
  }
  if canvas.width() == 0 || canvas.height() == 0 {
    return Ok(canvas);
  }

  for &(a, b) in pairs {
    let (p1, p2) = (&keypoints[a], &keypoints[b]);
    draw_thick_line(
      canvas,
      (p1.x, p1.y),
      (p2.x, p2.y),
      style.line_width,
      Rgb(style.line_color),
    );
  }

  for kp in keypoints {
    draw_point(
      canvas,
      (kp.x, kp.y),
      style.point_radius,
      Rgb(style.point_color),
    );
  }

  debug!("绘制 {} 条连线, {} 个关节点", pairs.len(), keypoints.len());
  Ok(canvas)
}

pub struct SkeletonRenderer {
  pairs: Vec<SkeletonPair>,
  style: DrawStyle,
}

impl Default for SkeletonRenderer {
  fn default() -> Self {
    Self {
      pairs: COCO_SKELETON.to_vec(),
      style: DrawStyle::default(),
    }
  }
}

impl SkeletonRenderer {
  pub fn new(pairs: Vec<SkeletonPair>, style: DrawStyle) -> Self {
    Self { pairs, style }
  }

  pub fn with_style(mut self, style: DrawStyle) -> Self {
    self.style = style;
    self
  }

  pub fn style(&self) -> &DrawStyle {
    &self.style
  }

  pub fn pairs(&self) -> &[SkeletonPair] {
    &self.pairs
  }
}

pub trait DrawPoseOnImage {
  fn draw_pose_on_image(&self, image: &mut RgbImage, result: &PoseResult)
  -> Result<(), RenderError>;
}

pub trait ToRgbImage {
  fn to_rgb_image(&self) -> RgbImage;
}

pub trait DrawPoseOnFrame<FromFrame> {
  fn draw_pose(&self, frame: &FromFrame, result: &PoseResult) -> Result<RgbImage, RenderError>;
}

impl<FromFrame: ToRgbImage, D: DrawPoseOnImage> DrawPoseOnFrame<FromFrame> for D {
  fn draw_pose(&self, frame: &FromFrame, result: &PoseResult) -> Result<RgbImage, RenderError> {
    let mut image = frame.to_rgb_image();
    self.draw_pose_on_image(&mut image, result)?;
    Ok(image)
  }
}

impl<const W: u32, const H: u32> ToRgbImage for RgbNchwFrame<W, H> {
  fn to_rgb_image(&self) -> RgbImage {
    self.image().clone()
  }
}

impl ToRgbImage for RgbImage {
  fn to_rgb_image(&self) -> RgbImage {
    self.clone()
  }
}

impl DrawPoseOnImage for SkeletonRenderer {
  fn draw_pose_on_image(
    &self,
    image: &mut RgbImage,
    result: &PoseResult,
  ) -> Result<(), RenderError> {
    render(image, &result.keypoints, &self.pairs, &self.style)?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

  fn kp(x: f32, y: f32) -> Keypoint {
    Keypoint { x, y, score: 1.0 }
  }

  fn scenario_keypoints() -> Vec<Keypoint> {
    let mut keypoints = vec![kp(180.0, 240.0); 17];
    keypoints[5] = kp(20.0, 20.0);
    keypoints[6] = kp(120.0, 20.0);
    keypoints
  }

  #[test]
  fn line_then_points_on_blank_canvas() {
    let mut canvas = RgbImage::new(192, 256);
    let style = DrawStyle::default();
    render(&mut canvas, &scenario_keypoints(), &[(5, 6)], &style).unwrap();

    let line = Rgb(style.line_color);
    let point = Rgb(style.point_color);
    for x in 24..=116 {
      assert_eq!(canvas.get_pixel(x, 20), &line, "line pixel ({x}, 20)");
      assert_eq!(canvas.get_pixel(x, 21), &line, "line pixel ({x}, 21)");
    }
    for (cx, cy) in [(20u32, 20u32), (120, 20)] {
      for (dx, dy) in [(0i32, 0i32), (2, 0), (-2, 0), (0, 2), (0, -2), (1, 1), (-1, -1)] {
        let (x, y) = ((cx as i32 + dx) as u32, (cy as i32 + dy) as u32);
        assert_eq!(canvas.get_pixel(x, y), &point, "point pixel ({x}, {y})");
      }
    }
    assert_eq!(canvas.get_pixel(70, 60), &BLACK);
    assert_eq!(canvas.get_pixel(70, 23), &BLACK);
  }

  #[test]
  fn joints_are_not_occluded_by_lines() {
    let mut canvas = RgbImage::new(64, 64);
    let style = DrawStyle {
      line_width: 5,
      ..DrawStyle::default()
    };
    let keypoints = vec![kp(10.0, 32.0), kp(50.0, 32.0), kp(30.0, 32.0)];
    render(&mut canvas, &keypoints, &[(0, 1)], &style).unwrap();

    // 中间关节点落在连线上，仍为关节点颜色
    assert_eq!(canvas.get_pixel(30, 32), &Rgb(style.point_color));
    assert_eq!(canvas.get_pixel(40, 32), &Rgb(style.line_color));
  }

  #[test]
  fn vertical_lines_are_thickened_horizontally() {
    let mut canvas = RgbImage::new(32, 32);
    let style = DrawStyle {
      point_radius: 0,
      ..DrawStyle::default()
    };
    render(&mut canvas, &[kp(10.0, 2.0), kp(10.0, 30.0)], &[(0, 1)], &style).unwrap();
    assert_eq!(canvas.get_pixel(10, 16), &Rgb(style.line_color));
    assert_eq!(canvas.get_pixel(11, 16), &Rgb(style.line_color));
    assert_eq!(canvas.get_pixel(12, 16), &BLACK);
  }

  #[test]
  fn out_of_range_pair_fails_and_leaves_canvas_untouched() {
    let mut canvas = RgbImage::new(32, 32);
    let keypoints = vec![kp(1.0, 1.0), kp(5.0, 5.0)];
    let err = render(&mut canvas, &keypoints, &[(0, 1), (1, 2)], &DrawStyle::default())
      .unwrap_err();

    assert_eq!(
      err,
      RenderError::KeypointIndex {
        pair: (1, 2),
        index: 2,
        len: 2
      }
    );
    assert!(canvas.pixels().all(|p| *p == BLACK));
  }

  #[test]
  fn off_canvas_keypoints_are_clipped() {
    let mut canvas = RgbImage::new(16, 16);
    let keypoints = vec![kp(-40.0, 8.0), kp(300.0, 8.0)];
    render(&mut canvas, &keypoints, &[(0, 1)], &DrawStyle::default()).unwrap();
    assert_eq!(canvas.get_pixel(0, 8), &Rgb(LINE_COLOR));
    assert_eq!(canvas.get_pixel(15, 8), &Rgb(LINE_COLOR));
  }

  #[test]
  fn far_away_keypoints_do_not_overflow() {
    let mut canvas = RgbImage::new(16, 16);
    let keypoints = vec![kp(8.0, 8.0), kp(3e9, 3e9), kp(-3e9, 8.0)];
    render(
      &mut canvas,
      &keypoints,
      &[(0, 1), (0, 2), (1, 2)],
      &DrawStyle::default(),
    )
    .unwrap();

    // 对角线被裁剪后仍然可见
    assert_eq!(canvas.get_pixel(12, 12), &Rgb(LINE_COLOR));
    assert_eq!(canvas.get_pixel(0, 8), &Rgb(LINE_COLOR));
    assert_eq!(canvas.get_pixel(8, 8), &Rgb(POINT_COLOR));
  }

  #[test]
  fn clip_rejects_segments_outside_canvas() {
    assert_eq!(clip_segment((-5.0, -5.0), (-1.0, 20.0), (15.0, 15.0)), None);
    assert_eq!(
      clip_segment((-10.0, 5.0), (25.0, 5.0), (15.0, 15.0)),
      Some(((0.0, 5.0), (15.0, 5.0)))
    );
  }

  #[test]
  fn non_finite_keypoint_fails_before_drawing() {
    let mut canvas = RgbImage::new(16, 16);
    let keypoints = vec![kp(1.0, 1.0), kp(f32::INFINITY, 2.0)];
    let err = render(&mut canvas, &keypoints, &[(0, 1)], &DrawStyle::default()).unwrap_err();
    assert_eq!(err, RenderError::NonFinite(1));
    assert!(canvas.pixels().all(|p| *p == BLACK));
  }

  #[test]
  fn zero_line_width_is_rejected() {
    let mut canvas = RgbImage::new(16, 16);
    let style = DrawStyle {
      line_width: 0,
      ..DrawStyle::default()
    };
    let err = render(&mut canvas, &[kp(1.0, 1.0), kp(9.0, 9.0)], &[(0, 1)], &style).unwrap_err();
    assert_eq!(err, RenderError::LineWidth);
  }

  #[test]
  fn diagonal_lines_keep_perpendicular_width() {
    let mut canvas = RgbImage::new(64, 64);
    let style = DrawStyle {
      line_width: 4,
      point_radius: 0,
      ..DrawStyle::default()
    };
    render(&mut canvas, &[kp(8.0, 8.0), kp(56.0, 56.0)], &[(0, 1)], &style).unwrap();

    // 45° 连线沿短轴需要 round(4 * √2) = 6 条线段
    let column: Vec<u32> = (0..64)
      .filter(|&y| canvas.get_pixel(32, y) == &Rgb(style.line_color))
      .collect();
    assert_eq!(column.len(), 6, "{column:?}");
  }

  #[test]
  fn renderer_draws_on_frame_copy() {
    let frame = RgbNchwFrame::<192, 256>::default();
    let result = PoseResult::from(scenario_keypoints());
    let image = SkeletonRenderer::default().draw_pose(&frame, &result).unwrap();

    assert_eq!(image.get_pixel(70, 20), &Rgb(LINE_COLOR));
    assert!(frame.image().pixels().all(|p| *p == BLACK));
  }
}
