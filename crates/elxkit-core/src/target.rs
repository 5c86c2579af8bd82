//! Output targets for engine runs.
//!
//! An engine writes its raw output into a staging directory named
//! [`STAGING_DIR_NAME`]. The useful files are then promoted into the
//! staging directory's parent under names derived from the target and the
//! moving image.

use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};

/// Name of the scratch folder engines write into.
pub const STAGING_DIR_NAME: &str = "res_tmp";

/// Suffix of every promoted output image.
pub const OUTPUT_IMAGE_SUFFIX: &str = ".nii.gz";

/// Where a registration or resampling result should end up.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OutputTarget {
    /// Final image file. Only its directory and leading stem are used,
    /// the image is always written as `<stem>.nii.gz`.
    File(PathBuf),
    /// Directory receiving `<moving stem>.nii.gz`.
    Directory(PathBuf),
}

impl OutputTarget {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self::Directory(path.into())
    }

    /// Classify a bare path by its name: names ending in `.img` or
    /// containing `.nii` are files, everything else is a directory.
    pub fn infer(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if name.ends_with(".img") || name.contains(".nii") {
            Self::File(path.to_path_buf())
        } else {
            Self::Directory(path.to_path_buf())
        }
    }

    /// The path the caller supplied.
    pub fn path(&self) -> &Path {
        match self {
            Self::File(p) | Self::Directory(p) => p,
        }
    }

    /// Directory promoted files land in.
    pub fn output_dir(&self) -> PathBuf {
        match self {
            Self::File(p) => p.parent().map(Path::to_path_buf).unwrap_or_default(),
            Self::Directory(d) => d.clone(),
        }
    }

    /// Scratch directory handed to the engine as its output location.
    pub fn staging_dir(&self) -> PathBuf {
        self.output_dir().join(STAGING_DIR_NAME)
    }

    /// File name of the promoted image. The moving image is only consulted
    /// for directory targets.
    pub fn output_filename(&self, moving: impl AsRef<Path>) -> Result<String> {
        let stem = match self {
            Self::File(p) => leading_stem(p)?,
            Self::Directory(_) => leading_stem(moving.as_ref())?,
        };
        Ok(format!("{stem}{OUTPUT_IMAGE_SUFFIX}"))
    }

    /// Full path of the promoted image.
    pub fn output_path(&self, moving: impl AsRef<Path>) -> Result<PathBuf> {
        Ok(self.output_dir().join(self.output_filename(moving)?))
    }
}

/// The part of a file name before its first `.`, so `brain.nii.gz` gives
/// `brain`.
pub fn leading_stem(path: &Path) -> Result<&str> {
    let name = path
        .file_name()
        .ok_or_else(|| CoreError::invalid_path(format!("no file name in {}", path.display())))?
        .to_str()
        .ok_or_else(|| CoreError::invalid_path(format!("non UTF-8 file name in {}", path.display())))?;

    match name.split('.').next() {
        Some(stem) if !stem.is_empty() => Ok(stem),
        _ => Err(CoreError::invalid_path(format!("empty stem in {}", path.display()))),
    }
}

/// `TransformParameters_<moving stem>.txt`
pub fn transform_parameters_filename(moving: &Path) -> Result<String> {
    Ok(format!("TransformParameters_{}.txt", leading_stem(moving)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_stem() {
        assert_eq!(leading_stem(Path::new("/data/brain.nii.gz")).unwrap(), "brain");
        assert_eq!(leading_stem(Path::new("scan.img")).unwrap(), "scan");
        assert_eq!(leading_stem(Path::new("plain")).unwrap(), "plain");
    }

    #[test]
    fn test_leading_stem_rejects_dotfiles() {
        assert!(leading_stem(Path::new("/data/.hidden")).is_err());
        assert!(leading_stem(Path::new("/")).is_err());
    }

    #[test]
    fn test_infer() {
        assert!(matches!(OutputTarget::infer("out/reg.nii.gz"), OutputTarget::File(_)));
        assert!(matches!(OutputTarget::infer("out/reg.nii"), OutputTarget::File(_)));
        assert!(matches!(OutputTarget::infer("out/reg.img"), OutputTarget::File(_)));
        assert!(matches!(OutputTarget::infer("out/reg.hdr"), OutputTarget::Directory(_)));
        assert!(matches!(OutputTarget::infer("out/results"), OutputTarget::Directory(_)));
    }

    #[test]
    fn test_file_target_paths() {
        let target = OutputTarget::file("/work/out/registered.img");
        assert_eq!(target.staging_dir(), PathBuf::from("/work/out/res_tmp"));
        assert_eq!(target.output_filename("/in/moving.nii.gz").unwrap(), "registered.nii.gz");
        assert_eq!(
            target.output_path("/in/moving.nii.gz").unwrap(),
            PathBuf::from("/work/out/registered.nii.gz")
        );
    }

    #[test]
    fn test_directory_target_paths() {
        let target = OutputTarget::directory("/work/out");
        assert_eq!(target.staging_dir(), PathBuf::from("/work/out/res_tmp"));
        assert_eq!(target.output_filename("/in/moving.nii.gz").unwrap(), "moving.nii.gz");
    }

    #[test]
    fn test_transform_parameters_filename() {
        assert_eq!(
            transform_parameters_filename(Path::new("/in/subject_01.nii.gz")).unwrap(),
            "TransformParameters_subject_01.txt"
        );
    }
}
