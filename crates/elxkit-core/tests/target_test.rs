use elxkit_core::{OutputTarget, StagingDir, STAGING_DIR_NAME};
use proptest::prelude::*;
use std::path::PathBuf;
use tempfile::tempdir;

proptest! {
    #[test]
    fn test_file_targets_use_own_stem(
        dir in "[a-z]{1,8}",
        stem in "[a-z][a-z0-9_]{0,10}",
        ext in prop::sample::select(vec![".img", ".nii", ".nii.gz"]),
        moving in "[a-z]{1,8}",
    ) {
        let path = PathBuf::from("/data").join(&dir).join(format!("{stem}{ext}"));
        let target = OutputTarget::infer(&path);

        prop_assert!(matches!(target, OutputTarget::File(_)));
        prop_assert_eq!(target.output_filename(format!("{moving}.nii.gz")).unwrap(), format!("{stem}.nii.gz"));
        prop_assert_eq!(target.staging_dir(), PathBuf::from("/data").join(&dir).join(STAGING_DIR_NAME));
    }

    #[test]
    fn test_directory_targets_use_moving_stem(
        dir in "[a-z][a-z_]{0,10}",
        moving in "[a-z][a-z0-9]{0,8}",
    ) {
        let path = PathBuf::from("/data").join(&dir);
        let target = OutputTarget::infer(&path);

        prop_assert!(matches!(target, OutputTarget::Directory(_)));
        prop_assert_eq!(target.output_filename(format!("/in/{moving}.nii.gz")).unwrap(), format!("{moving}.nii.gz"));
        prop_assert_eq!(target.staging_dir(), path.join(STAGING_DIR_NAME));
    }
}

#[test]
fn test_staging_for_directory_target_creates_parents() {
    let dir = tempdir().unwrap();
    let target = OutputTarget::directory(dir.path().join("a").join("b"));
    let staging = StagingDir::for_target(&target).unwrap();

    assert!(staging.path().is_dir());
    assert_eq!(staging.parent(), target.output_dir().as_path());
}

#[test]
fn test_staging_for_file_target_is_sibling() {
    let dir = tempdir().unwrap();
    let target = OutputTarget::file(dir.path().join("registered.nii.gz"));
    let staging = StagingDir::for_target(&target).unwrap();

    assert_eq!(staging.path(), dir.path().join(STAGING_DIR_NAME).as_path());
}
