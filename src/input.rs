// 该文件是 Hakoe （箱绘） 项目的一部分。
// src/input.rs - 图像采集来源
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

use thiserror::Error;

use crate::{FromUrl, frame::Frame};

/// 采集能力：每次调用产生一帧新图像
pub trait CaptureSource {
  type Error;

  fn capture(&mut self) -> Result<Frame, Self::Error>;
}

impl<C: CaptureSource + ?Sized> CaptureSource for Box<C> {
  type Error = C::Error;

  fn capture(&mut self) -> Result<Frame, Self::Error> {
    (**self).capture()
  }
}

#[cfg(feature = "read_image_file")]
mod read_image_file;
#[cfg(feature = "read_image_file")]
pub use self::read_image_file::{ImageFileInput, ImageFileInputError, read_frame};

mod fixture;
pub use self::fixture::{FixtureInput, FixtureInputError};

#[derive(Error, Debug)]
pub enum InputError {
  #[cfg(feature = "read_image_file")]
  #[error("Image file input error: {0}")]
  ImageFileInputError(#[from] ImageFileInputError),
  #[error("Fixture input error: {0}")]
  FixtureInputError(#[from] FixtureInputError),
  #[error("URI scheme mismatch")]
  SchemeMismatch,
}

/// 按 URL 方案在构造时选定的采集来源
pub enum InputWrapper {
  #[cfg(feature = "read_image_file")]
  ReadImageFile(ImageFileInput),
  Fixture(FixtureInput),
}

impl FromUrl for InputWrapper {
  type Error = InputError;

  fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
    use crate::FromUrlWithScheme;

    #[cfg(feature = "read_image_file")]
    {
      if url.scheme() == ImageFileInput::SCHEME {
        let input = ImageFileInput::from_url(url)?;
        return Ok(InputWrapper::ReadImageFile(input));
      }
    }

    if url.scheme() == FixtureInput::SCHEME {
      let input = FixtureInput::from_url(url)?;
      return Ok(InputWrapper::Fixture(input));
    }

    Err(InputError::SchemeMismatch)
  }
}

impl CaptureSource for InputWrapper {
  type Error = InputError;

  fn capture(&mut self) -> Result<Frame, Self::Error> {
    match self {
      #[cfg(feature = "read_image_file")]
      InputWrapper::ReadImageFile(input) => input.capture().map_err(InputError::from),
      InputWrapper::Fixture(input) => input.capture().map_err(InputError::from),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unknown_scheme_is_rejected() {
    let url = url::Url::parse("v4l2:///dev/video0").unwrap();
    assert!(matches!(
      InputWrapper::from_url(&url),
      Err(InputError::SchemeMismatch)
    ));
  }
}
