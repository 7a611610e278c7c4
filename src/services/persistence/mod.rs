//! Binary model artifact.
//!
//! Layout (bincode, fixed-width little endian): a `u32` factor count followed
//! by the user factors, item factors, user biases and item biases, each a
//! length-prefixed `f32` sequence. There is no version field.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::algorithms::ServingModel;
use crate::error::{ModelError, Result};

#[derive(Serialize)]
struct ArtifactRef<'a> {
    factor_count: u32,
    user_factors: &'a [f32],
    item_factors: &'a [f32],
    user_bias: &'a [f32],
    item_bias: &'a [f32],
}

#[derive(Deserialize)]
struct Artifact {
    factor_count: u32,
    user_factors: Vec<f32>,
    item_factors: Vec<f32>,
    user_bias: Vec<f32>,
    item_bias: Vec<f32>,
}

pub fn save_model(model: &ServingModel, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| {
        error!("Error saving model into file {}: {}", path.display(), e);
        ModelError::io(path, e)
    })?;

    let mut writer = BufWriter::new(file);
    encode(model, &mut writer)
        .map_err(|e| artifact_error(e, path))
        .and_then(|_| writer.flush().map_err(|e| ModelError::io(path, e)))
        .map_err(|e| {
            error!("Error saving model into file {}: {}", path.display(), e);
            e
        })?;

    info!(
        "Saved {} factors for {} users and {} items to {}",
        model.factor_count(),
        model.universe().num_users,
        model.universe().num_items,
        path.display()
    );
    Ok(())
}

pub fn load_model(path: impl AsRef<Path>) -> Result<ServingModel> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        error!("Error loading model from file {}: {}", path.display(), e);
        ModelError::io(path, e)
    })?;

    let model = read_model(BufReader::new(file)).map_err(|e| {
        error!("Error loading model from file {}: {}", path.display(), e);
        e
    })?;

    info!(
        "Finished loading {} factors from {}",
        model.factor_count(),
        path.display()
    );
    Ok(model)
}

pub fn write_model<W: Write>(model: &ServingModel, writer: W) -> Result<()> {
    encode(model, writer).map_err(|e| artifact_error(e, "<writer>"))
}

fn encode<W: Write>(model: &ServingModel, writer: W) -> bincode::Result<()> {
    let factor_count = u32::try_from(model.factor_count()).map_err(|_| {
        bincode::ErrorKind::Custom("factor count exceeds the u32 header".to_string())
    })?;
    let artifact = ArtifactRef {
        factor_count,
        user_factors: model.user_factors(),
        item_factors: model.item_factors(),
        user_bias: model.user_biases(),
        item_bias: model.item_biases(),
    };
    bincode::serialize_into(writer, &artifact)
}

fn artifact_error(error: bincode::Error, path: impl AsRef<Path>) -> ModelError {
    match *error {
        bincode::ErrorKind::Io(io) => ModelError::io(path.as_ref(), io),
        other => ModelError::Format(other.to_string()),
    }
}

/// Malformed, truncated or inconsistent input is a [`ModelError::Format`].
pub fn read_model<R: Read>(reader: R) -> Result<ServingModel> {
    let artifact: Artifact =
        bincode::deserialize_from(reader).map_err(|e| ModelError::Format(e.to_string()))?;

    ServingModel::from_parts(
        artifact.factor_count as usize,
        artifact.user_factors,
        artifact.item_factors,
        artifact.user_bias,
        artifact.item_bias,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> ServingModel {
        ServingModel::from_parts(
            2,
            vec![1.0, 2.0, 3.0, 4.0],
            vec![0.5, 0.25],
            vec![0.1, -0.1],
            vec![0.3],
        )
        .unwrap()
    }

    #[test]
    fn test_header_is_four_byte_factor_count() {
        let mut bytes = Vec::new();
        write_model(&model(), &mut bytes).unwrap();
        assert_eq!(&bytes[..4], &2u32.to_le_bytes());
    }

    #[test]
    fn test_read_back_in_memory() {
        let mut bytes = Vec::new();
        write_model(&model(), &mut bytes).unwrap();
        assert_eq!(read_model(bytes.as_slice()).unwrap(), model());
    }

    #[test]
    fn test_truncated_artifact_is_format_error() {
        let mut bytes = Vec::new();
        write_model(&model(), &mut bytes).unwrap();
        bytes.truncate(bytes.len() - 3);
        assert!(matches!(read_model(bytes.as_slice()), Err(ModelError::Format(_))));
    }

    #[test]
    fn test_empty_array_is_format_error() {
        let artifact = ArtifactRef {
            factor_count: 2,
            user_factors: &[1.0, 2.0],
            item_factors: &[],
            user_bias: &[0.0],
            item_bias: &[],
        };
        let bytes = bincode::serialize(&artifact).unwrap();
        assert!(matches!(read_model(bytes.as_slice()), Err(ModelError::Format(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_model(dir.path().join("absent.bin"));
        assert!(matches!(result, Err(ModelError::Io { .. })));
    }
}
