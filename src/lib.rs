// 该文件是 Gujia （骨架） 项目的一部分。
// src/lib.rs - 库主文件
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

pub mod frame;
pub mod heatmap;
pub mod input;
pub mod model;
pub mod output;
pub mod skeleton;
pub mod task;

pub trait FromUrl {
  type Error;
  fn from_url(url: &url::Url) -> Result<Self, Self::Error>
  where
    Self: Sized;
}

pub trait FromUrlWithScheme: FromUrl {
  const SCHEME: &'static str;
}

/// 解析形如 `a,b,c` 的查询参数
pub(crate) fn parse_list<T: std::str::FromStr>(value: &str) -> Option<Vec<T>> {
  value
    .split(',')
    .map(|s| s.trim().parse::<T>().ok())
    .collect()
}

/// URL 路径的百分号解码，空格与中文路径在 URL 中以 `%XX` 形式出现
pub(crate) fn url_path(url: &url::Url) -> std::path::PathBuf {
  let path = url.path();
  match urlencoding::decode(path) {
    Ok(decoded) => std::path::PathBuf::from(decoded.into_owned()),
    Err(_) => std::path::PathBuf::from(path),
  }
}

#[cfg(test)]
mod tests {
  use super::{parse_list, url_path};
  use std::path::PathBuf;
  use url::Url;

  #[test]
  fn parse_list_accepts_comma_separated_values() {
    assert_eq!(parse_list::<u8>("0, 255,255"), Some(vec![0, 255, 255]));
    assert_eq!(parse_list::<f32>("4,4"), Some(vec![4.0, 4.0]));
  }

  #[test]
  fn parse_list_rejects_garbage() {
    assert_eq!(parse_list::<u8>("0,abc"), None);
    assert_eq!(parse_list::<u8>("256"), None);
  }

  #[test]
  fn url_path_is_percent_decoded() {
    let url = Url::parse("image:///data/人体 姿态/test.jpg").unwrap();
    assert_ne!(url.path(), "/data/人体 姿态/test.jpg");
    assert_eq!(url_path(&url), PathBuf::from("/data/人体 姿态/test.jpg"));

    let plain = Url::parse("npy:///output/nef_sim_output.npy").unwrap();
    assert_eq!(url_path(&plain), PathBuf::from("/output/nef_sim_output.npy"));
  }
}
