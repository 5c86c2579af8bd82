pub mod error;
pub mod target;
pub mod staging;
pub mod intensity;

pub use error::{CoreError, Result};
pub use target::{OutputTarget, leading_stem, transform_parameters_filename, STAGING_DIR_NAME};
pub use staging::StagingDir;
pub use intensity::{Scalar, ScalarKind, min_max_norm, min_max_norm_as, min_max_norm_values, cast_truncating};
