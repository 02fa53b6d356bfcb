use std::path::{Path, PathBuf};

use crate::render::RgbaImage;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed creating directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed writing image {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Writes `image` in the format implied by the file extension.
pub fn write_image(path: &Path, image: &RgbaImage) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|source| ExportError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    let write_error = |source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    };
    let format = image::ImageFormat::from_path(path).map_err(write_error)?;
    image::save_buffer_with_format(
        path,
        image.as_raw(),
        image.width(),
        image.height(),
        image::ColorType::Rgba8,
        format,
    )
    .map_err(write_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_png_into_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shots").join("frame.png");
        let image = RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]));
        write_image(&path, &image).unwrap();

        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded.dimensions(), (3, 2));
        assert_eq!(loaded.get_pixel(0, 0).0, [10, 20, 30, 255]);
    }

    #[test]
    fn unknown_extension_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let image = RgbaImage::new(1, 1);
        let err = write_image(&dir.path().join("frame.notanimage"), &image).unwrap_err();
        assert!(matches!(err, ExportError::Write { .. }));
    }
}
