use anyhow::Result;
use elxkit_io::{modify_parameters, ParameterMap};
use std::fs;
use tempfile::tempdir;

const TRANSFORM_PARAMETERS: &str = "(Transform \"EulerTransform\")
(NumberOfParameters 6)
(TransformParameters 0.01 -0.02 0.005 1.5 -2.25 0.75)
(InitialTransformParametersFileName \"NoInitialTransform\")
(HowToCombineTransforms \"Compose\")

// Image specific
(FixedImageDimension 3)
(MovingImageDimension 3)
(Size 182 218 182)
(Spacing 1.0000000000 1.0000000000 1.0000000000)
(ResultImagePixelType \"float\")
(ResultImageFormat \"nii.gz\")
";

#[test]
fn test_modify_in_place_round_trip() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("TransformParameters_moving.txt");
    fs::write(&path, TRANSFORM_PARAMETERS)?;

    let written = modify_parameters(&[("NumberOfResolutions", "4")], &path, None)?;
    assert_eq!(written, path);

    let map = ParameterMap::read(&path)?;
    assert_eq!(map.get("NumberOfResolutions").unwrap(), ["4"]);

    // Original lines are untouched, the new entry is appended.
    let text = fs::read_to_string(&path)?;
    assert!(text.starts_with(TRANSFORM_PARAMETERS));
    assert_eq!(&text[TRANSFORM_PARAMETERS.len()..], "(NumberOfResolutions 4)\n");

    Ok(())
}

#[test]
fn test_modify_to_new_file_keeps_input() -> Result<()> {
    let dir = tempdir()?;
    let input = dir.path().join("TransformParameters_moving.txt");
    let output = dir.path().join("TransformParameters_nn.txt");
    fs::write(&input, TRANSFORM_PARAMETERS)?;

    modify_parameters(
        &[
            ("ResultImagePixelType", "short"),
            ("FinalBSplineInterpolationOrder", "0"),
            ("ResultImagePixelType", "unsigned char"),
        ],
        &input,
        Some(output.as_path()),
    )?;

    assert_eq!(fs::read_to_string(&input)?, TRANSFORM_PARAMETERS);

    let map = ParameterMap::read(&output)?;
    assert_eq!(map.get_scalar("ResultImagePixelType"), Some("unsigned char"));
    assert_eq!(map.get_scalar("FinalBSplineInterpolationOrder"), Some("0"));
    assert_eq!(map.get("TransformParameters").unwrap().len(), 6);

    let original: Vec<&str> = TRANSFORM_PARAMETERS.lines().collect();
    let edited = fs::read_to_string(&output)?;
    let edited: Vec<&str> = edited.lines().collect();
    for (idx, line) in original.iter().enumerate() {
        if line.starts_with("(ResultImagePixelType") {
            assert_eq!(edited[idx], "(ResultImagePixelType \"unsigned char\")");
        } else {
            assert_eq!(edited[idx], *line);
        }
    }

    Ok(())
}

#[test]
fn test_missing_file_reports_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.txt");
    let err = modify_parameters(&[("A", "1")], &path, None).unwrap_err();
    assert!(format!("{err:#}").contains("absent.txt"));
}

#[test]
fn test_unknown_fields_are_written() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("params.txt");
    fs::write(&path, TRANSFORM_PARAMETERS)?;

    modify_parameters(&[("NotAnElastixField", "whatever")], &path, None)?;
    assert_eq!(ParameterMap::read(&path)?.get_scalar("NotAnElastixField"), Some("whatever"));
    Ok(())
}

#[test]
fn test_modify_crlf_file_keeps_line_endings() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("TransformParameters_moving.txt");
    let crlf = TRANSFORM_PARAMETERS.replace('\n', "\r\n");
    fs::write(&path, &crlf)?;

    modify_parameters(&[("NumberOfResolutions", "4")], &path, None)?;

    let text = fs::read_to_string(&path)?;
    assert!(text.starts_with(&crlf));
    assert_eq!(&text[crlf.len()..], "(NumberOfResolutions 4)\r\n");
    Ok(())
}
