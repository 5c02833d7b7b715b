use std::path::Path;

use opencv::{core::Mat, imgcodecs, imgproc, prelude::*};
use stereo_calib_core::ImageSize;

use crate::convert::from_cv_size;
use crate::CvError;

fn path_str(path: &Path) -> Result<&str, CvError> {
    path.to_str().ok_or_else(|| CvError::NonUtf8Path {
        path: path.to_path_buf(),
    })
}

/// Decode an image as 8-bit BGR.
pub fn read_color(path: &Path) -> Result<Mat, CvError> {
    let img = imgcodecs::imread(path_str(path)?, imgcodecs::IMREAD_COLOR)?;
    if img.empty() {
        return Err(CvError::ReadImage {
            path: path.to_path_buf(),
        });
    }
    Ok(img)
}

/// Encode `img`; the format follows the file extension.
pub fn write_image(path: &Path, img: &Mat) -> Result<(), CvError> {
    if !imgcodecs::imwrite_def(path_str(path)?, img)? {
        return Err(CvError::WriteImage {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Pixel dimensions of a decoded image.
pub fn mat_size(img: &Mat) -> Result<ImageSize, CvError> {
    Ok(from_cv_size(img.size()?))
}

/// Size of the image at `path` as OpenCV decodes it, orientation included.
pub fn decoded_size(path: &Path) -> Result<ImageSize, CvError> {
    mat_size(&read_color(path)?)
}

/// Grayscale copy of a BGR image. Single-channel input is cloned as is.
pub fn to_gray(img: &Mat) -> Result<Mat, CvError> {
    if img.channels() == 1 {
        return Ok(img.try_clone()?);
    }
    let mut gray = Mat::default();
    imgproc::cvt_color_def(img, &mut gray, imgproc::COLOR_BGR2GRAY)?;
    Ok(gray)
}
