pub mod parameter_file;
pub mod nifti_io;

pub use parameter_file::{modify_parameters, ParameterFileError, ParameterMap};
pub use nifti_io::{normalize_nifti, scalar_kind_of};
