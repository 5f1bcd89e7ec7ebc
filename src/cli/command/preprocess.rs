use std::path::Path;

use anyhow::Result;
use tracing::info;

use crate::{config::PipelineConfig, pipeline};

pub async fn preprocess(
    data_dir: &Path,
    output_dir: Option<&Path>,
    config: Option<&Path>,
    parquet: bool,
) -> Result<String> {
    let config = PipelineConfig::load(config)?;
    let output_dir = output_dir.unwrap_or(data_dir);

    let written = pipeline::preprocess(data_dir, output_dir, &config, parquet).await?;
    for path in &written {
        info!(file = %path.display(), "Saved table");
    }

    Ok(output_dir.to_string_lossy().to_string())
}
