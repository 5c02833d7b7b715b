use std::{
    fs,
    path::{Path, PathBuf},
};

use image::ImageReader;

use crate::records::ImageSize;

#[derive(thiserror::Error, Debug)]
pub enum ImageCheckError {
    #[error("failed to list images in {}: {source}", dir.display())]
    ListDir {
        dir: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read image header of {}: {source}", path.display())]
    Header {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("{} is {found}, expected {expected}", path.display())]
    Resolution {
        path: PathBuf,
        expected: ImageSize,
        found: ImageSize,
    },
    #[error("no images to check")]
    Empty,
}

/// Images in `dir` with the given extension, sorted by path.
///
/// The extension is compared case-sensitively and may be given with or
/// without its leading dot (`png` and `.png` are equivalent). Sorting makes
/// the i-th left image pair with the i-th right image.
pub fn list_images(
    dir: impl AsRef<Path>,
    extension: &str,
) -> Result<Vec<PathBuf>, ImageCheckError> {
    let dir = dir.as_ref();
    let wanted = extension.trim_start_matches('.');
    let list_err = |source: std::io::Error| ImageCheckError::ListDir {
        dir: dir.to_path_buf(),
        source,
    };

    let mut out = Vec::new();
    for entry in fs::read_dir(dir).map_err(list_err)? {
        let path = entry.map_err(list_err)?.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) == Some(wanted) {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

/// Resolution of an image, read from its header only.
///
/// The format is sniffed from the file contents, so a misnamed file or an
/// extension the `image` crate does not register still gets measured.
pub fn image_size(path: &Path) -> Result<ImageSize, ImageCheckError> {
    let header_err = |source: image::ImageError| ImageCheckError::Header {
        path: path.to_path_buf(),
        source,
    };
    let (width, height) = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| header_err(image::ImageError::IoError(e)))?
        .into_dimensions()
        .map_err(header_err)?;
    Ok(ImageSize::new(width, height))
}

/// Fail on the first image whose resolution differs from `expected`.
///
/// `measure` yields the size of one image; callers pass [`image_size`] or a
/// decoder that reports the size of what it actually decodes.
pub fn check_resolution<P, F, E>(
    paths: &[P],
    expected: ImageSize,
    mut measure: F,
) -> Result<(), E>
where
    P: AsRef<Path>,
    F: FnMut(&Path) -> Result<ImageSize, E>,
    E: From<ImageCheckError>,
{
    for path in paths {
        let path = path.as_ref();
        let found = measure(path)?;
        if found != expected {
            return Err(ImageCheckError::Resolution {
                path: path.to_path_buf(),
                expected,
                found,
            }
            .into());
        }
    }
    Ok(())
}

/// The resolution shared by all images, taken from the first one.
pub fn common_resolution<P, F, E>(paths: &[P], mut measure: F) -> Result<ImageSize, E>
where
    P: AsRef<Path>,
    F: FnMut(&Path) -> Result<ImageSize, E>,
    E: From<ImageCheckError>,
{
    let first = paths.first().ok_or(ImageCheckError::Empty)?;
    let size = measure(first.as_ref())?;
    check_resolution(&paths[1..], size, measure)?;
    Ok(size)
}

/// Last component of `path`, used to name derived images after their source.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
