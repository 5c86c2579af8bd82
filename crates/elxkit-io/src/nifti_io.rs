use anyhow::{anyhow, bail, Context, Result};
use elxkit_core::intensity::{cast_truncating, min_max_norm_values, ScalarKind};
use ndarray::ArrayD;
use nifti::writer::WriterOptions;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, NiftiType, ReaderOptions};
use std::path::Path;

/// Map a NIfTI datatype onto the scalar kinds the normalizer knows.
pub fn scalar_kind_of(data_type: NiftiType) -> Result<ScalarKind> {
    let kind = match data_type {
        NiftiType::Uint8 => ScalarKind::U8,
        NiftiType::Int8 => ScalarKind::I8,
        NiftiType::Uint16 => ScalarKind::U16,
        NiftiType::Int16 => ScalarKind::I16,
        NiftiType::Uint32 => ScalarKind::U32,
        NiftiType::Int32 => ScalarKind::I32,
        NiftiType::Uint64 => ScalarKind::U64,
        NiftiType::Int64 => ScalarKind::I64,
        NiftiType::Float32 => ScalarKind::F32,
        NiftiType::Float64 => ScalarKind::F64,
        other => bail!("Unsupported NIfTI datatype for normalization: {:?}", other),
    };
    Ok(kind)
}

/// Min-max normalize the volume in `input` and write it to `output`.
///
/// # Arguments
/// * `input` - NIfTI file to read
/// * `output` - NIfTI file to write, gzip compressed if it ends in `.gz`
/// * `max_val` - Upper bound of the output range, defaults to the maximum
///   of the input's integer datatype
/// * `out_kind` - Datatype written, `float64` if not given. Integer output
///   truncates.
pub fn normalize_nifti<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    max_val: Option<f64>,
    out_kind: Option<ScalarKind>,
) -> Result<()> {
    let input = input.as_ref();
    let output = output.as_ref();

    let obj = ReaderOptions::new().read_file(input).context("Failed to read NIfTI file")?;
    let mut header: NiftiHeader = obj.header().clone();
    let native = scalar_kind_of(header.data_type()?)?;

    // Scaling is applied on read and must not be applied twice.
    header.scl_slope = 1.0;
    header.scl_inter = 0.0;

    let values: ArrayD<f64> = obj
        .into_volume()
        .into_ndarray::<f64>()
        .context("Failed to convert volume to ndarray")?;
    let normalized = min_max_norm_values(values, native, max_val)?;

    let out_kind = out_kind.unwrap_or(ScalarKind::F64);
    tracing::info!(
        "normalizing {} ({}) into {} ({})",
        input.display(),
        native,
        output.display(),
        out_kind
    );

    let writer = WriterOptions::new(output).reference_header(&header);
    let written = match out_kind {
        ScalarKind::U8 => writer.write_nifti(&cast_truncating::<u8, _, _>(&normalized)),
        ScalarKind::I16 => writer.write_nifti(&cast_truncating::<i16, _, _>(&normalized)),
        ScalarKind::U16 => writer.write_nifti(&cast_truncating::<u16, _, _>(&normalized)),
        ScalarKind::F32 => writer.write_nifti(&cast_truncating::<f32, _, _>(&normalized)),
        ScalarKind::F64 => writer.write_nifti(&normalized),
        other => bail!("Unsupported output datatype for NIfTI writing: {}", other),
    };
    written.map_err(|e| anyhow!("Failed to write NIfTI file: {}", e))?;

    Ok(())
}
