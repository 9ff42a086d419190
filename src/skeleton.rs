// 该文件是 Gujia （骨架） 项目的一部分。
// src/skeleton.rs - 骨架连线定义
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

/// COCO 人体关键点数量
pub const COCO_KEYPOINT_NUM: usize = 17;

/// 两个关键点之间的骨骼连线 (A, B)
pub type SkeletonPair = (usize, usize);

/// COCO 17 点骨架，索引从 0 开始
pub const COCO_SKELETON: [SkeletonPair; 16] = [
  // 躯干（肩膀与臀部）
  (5, 6),
  (5, 11),
  (6, 12),
  (11, 12),
  // 左手（肩-肘-腕）
  (5, 7),
  (7, 9),
  // 右手（肩-肘-腕）
  (6, 8),
  (8, 10),
  // 左脚（臀-膝-踝）
  (11, 13),
  (13, 15),
  // 右脚（臀-膝-踝）
  (12, 14),
  (14, 16),
  // 头部（鼻-眼-耳）
  (0, 1),
  (0, 2),
  (1, 3),
  (2, 4),
];

/// 连线表隐含的最少关键点数量（最大索引 + 1）
pub fn implied_keypoints(pairs: &[SkeletonPair]) -> usize {
  pairs
    .iter()
    .map(|&(a, b)| a.max(b) + 1)
    .max()
    .unwrap_or(0)
}

/// 找到第一个越界的连线索引
pub fn find_out_of_range(pairs: &[SkeletonPair], keypoints: usize) -> Option<(SkeletonPair, usize)> {
  pairs.iter().find_map(|&(a, b)| {
    if a >= keypoints {
      Some(((a, b), a))
    } else if b >= keypoints {
      Some(((a, b), b))
    } else {
      None
    }
  })
}
