//! Concurrent folder export.
//!
//! Frames are written on a dedicated rayon pool sized by
//! [`FolderExportOptions::with_max_workers`]. Each write derives its file
//! name from its own index, so workers share nothing except the completion
//! counter. All writes are attempted before any failure is reported.
//!
//! The public API is [`FrameSequence::to_folder`](crate::FrameSequence::to_folder);
//! this module holds the implementation.

use std::{
    fs,
    path::{Path, PathBuf},
};

use rayon::{
    ThreadPoolBuilder,
    iter::{IntoParallelIterator, ParallelIterator},
};

use crate::{
    config::FolderExportOptions,
    error::SequenceError,
    progress::{OperationType, ProgressCounter},
    source::FrameSource,
    template::FileTemplate,
    timestamps::write_timestamps,
};

/// Write every frame of `frames` into `directory`, then the timestamp log.
///
/// Returns the paths written, in index order.
pub(crate) fn export_to_folder(
    frames: &dyn FrameSource,
    timestamps: &[f64],
    directory: &Path,
    options: &FolderExportOptions,
) -> Result<Vec<PathBuf>, SequenceError> {
    let template = FileTemplate::parse(&options.file_template)?;
    let total = frames.len();

    log::info!(
        "Writing {} frames to {} ({}, {} workers)",
        total,
        directory.display(),
        template,
        options.max_workers,
    );

    fs::create_dir_all(directory)?;

    let paths: Vec<PathBuf> = (0..total)
        .map(|index| directory.join(template.format(index as u64)))
        .collect();

    let pool = ThreadPoolBuilder::new()
        .num_threads(options.max_workers.max(1))
        .thread_name(|index| format!("frameseq-writer-{index}"))
        .build()?;

    let counter = ProgressCounter::new(
        options.progress.clone(),
        OperationType::FolderExport,
        Some(total as u64),
        options.batch_size,
    );

    // Every write runs to completion; failures are gathered, not short-circuited.
    let mut failures: Vec<(usize, SequenceError)> = pool.install(|| {
        (0..total)
            .into_par_iter()
            .filter_map(|index| {
                let result = write_frame(frames, index, &paths[index]);
                counter.advance();
                result.err().map(|error| (index, error))
            })
            .collect()
    });

    log::debug!("{} of {} writes finished", counter.completed(), total);

    if !failures.is_empty() {
        failures.sort_by_key(|(index, _)| *index);
        for (index, error) in &failures {
            log::error!("Failed to write frame {index} to {}: {error}", paths[*index].display());
        }
        let failed = failures.len();
        let (index, source) = failures.swap_remove(0);
        return Err(SequenceError::ExportFailed {
            index,
            failed,
            total,
            source: Box::new(source),
        });
    }

    write_timestamps(directory.join(&options.timestamps_file), timestamps)?;
    Ok(paths)
}

fn write_frame(frames: &dyn FrameSource, index: usize, path: &Path) -> Result<(), SequenceError> {
    let image = frames.get(index)?;
    image.save(path)?;
    Ok(())
}
