//! Generic function for reading a list of raw source files in parallel

use std::path::PathBuf;

use anyhow::{Context, Result};
use futures::future::join_all;

use crate::{
    cli::create_progress_bar,
    reading::{ReadContext, Reading},
};

/// Reads every file on the blocking pool. Results come back in the order of
/// `files`, and the first failure aborts the whole batch.
pub async fn deserialise<R: Reading>(
    files: &[PathBuf],
    context: &ReadContext,
    message: &str,
) -> Result<Vec<R>> {
    let progress_bar = create_progress_bar(files.len() as u64, message.to_string());

    let tasks: Vec<_> = files
        .iter()
        .map(|file| {
            let file = file.clone();
            let context = context.clone();
            let pb = progress_bar.clone();
            tokio::task::spawn_blocking(move || {
                let source = R::from_file(&file, &context)
                    .with_context(|| format!("Failed to process `{}`", file.display()));
                pb.inc(1);
                source
            })
        })
        .collect();

    let mut sources = Vec::with_capacity(files.len());
    for result in join_all(tasks).await {
        sources.push(result??);
    }

    progress_bar.finish_with_message(format!("{} done", message));

    Ok(sources)
}

// -- Tests -------------------------------------------------------------------
