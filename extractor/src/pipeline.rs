use std::collections::BTreeMap;
use std::path::PathBuf;

use frame_extract_common::camera::{CameraName, CameraSelector};
use frame_extract_common::config::Config;
use frame_extract_common::frame::{FrameDecoder, FrameError};
use frame_extract_common::record::{OpenError, RecordError, RecordReader};
use image::ImageError;
use serde::Serialize;
use tracing::{debug, error, info, trace};

use crate::codec::{write_jpeg, ImageDecoder};
use crate::naming::{camera_dir, frame_path};

/// Frames whose decoded shape and output path are logged at the start of each camera run.
const VERBOSE_FRAMES: u64 = 3;
const PROGRESS_EVERY: u64 = 100;

/// Parameters of one extraction run.
#[derive(Debug, Clone)]
pub struct ExtractionJob {
    pub source: PathBuf,
    pub output_dir: PathBuf,
    pub cameras: CameraSelector,
    pub max_frames: Option<u64>,
}

impl ExtractionJob {
    pub fn from_config(config: &Config) -> Self {
        Self {
            source: config.job.source.clone(),
            output_dir: config.job.output_dir.clone(),
            cameras: config.job.camera,
            max_frames: config.job.max_frames,
        }
    }
}

/// Counters for one camera over one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Records decoded into frames, with or without the target camera.
    pub frames_processed: u64,
    /// Images successfully written.
    pub images_saved: u64,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status")]
pub enum CameraOutcome {
    #[serde(rename = "ok")]
    Completed(RunStats),
    #[serde(rename = "failed")]
    Failed {
        error: String,
        failed_at_frame: Option<u64>,
    },
}

#[derive(Debug, Serialize)]
pub struct SingleReport {
    pub camera: CameraName,
    #[serde(flatten)]
    pub stats: RunStats,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RunReport {
    Single(SingleReport),
    Batch(BTreeMap<CameraName, CameraOutcome>),
}

impl RunReport {
    pub fn has_failures(&self) -> bool {
        match self {
            RunReport::Single(_) => false,
            RunReport::Batch(outcomes) => outcomes
                .values()
                .any(|o| matches!(o, CameraOutcome::Failed { .. })),
        }
    }
}

/// Drives records through frame decoding, camera lookup, image decoding and
/// writing. Both decoders are injected and shared across camera runs.
pub struct Extractor<F, I> {
    frames: F,
    images: I,
    jpeg_quality: u8,
}

impl<F: FrameDecoder, I: ImageDecoder> Extractor<F, I> {
    pub fn new(frames: F, images: I, jpeg_quality: u8) -> Self {
        Self {
            frames,
            images,
            jpeg_quality,
        }
    }

    pub fn run(&self, job: &ExtractionJob) -> Result<RunReport, ExtractError> {
        match job.cameras {
            CameraSelector::Single(camera) => {
                let stats = self.extract_camera(job, camera)?;
                Ok(RunReport::Single(SingleReport { camera, stats }))
            }
            CameraSelector::All => self.extract_all(job).map(RunReport::Batch),
        }
    }

    /// Run every camera in turn against the same source.
    ///
    /// A camera whose records or images fail to decode is marked failed and
    /// the remaining cameras still run. Errors that would hit every camera
    /// alike (missing source, unwritable output) abort the batch.
    pub fn extract_all(
        &self,
        job: &ExtractionJob,
    ) -> Result<BTreeMap<CameraName, CameraOutcome>, ExtractError> {
        let mut outcomes = BTreeMap::new();
        for camera in CameraName::ALL {
            info!(%camera, "processing camera");
            let outcome = match self.extract_camera(job, camera) {
                Ok(stats) => CameraOutcome::Completed(stats),
                Err(e) if e.is_batch_fatal() => return Err(e),
                Err(e) => {
                    error!(%camera, error = %e, "camera run failed, continuing with next camera");
                    CameraOutcome::Failed {
                        error: e.to_string(),
                        failed_at_frame: e.failed_at_frame(),
                    }
                }
            };
            outcomes.insert(camera, outcome);
        }

        let failed = outcomes
            .values()
            .filter(|o| matches!(o, CameraOutcome::Failed { .. }))
            .count();
        info!(cameras = outcomes.len(), failed, "batch extraction finished");
        Ok(outcomes)
    }

    /// Extract one camera's images from the whole source (or up to `max_frames`).
    pub fn extract_camera(
        &self,
        job: &ExtractionJob,
        camera: CameraName,
    ) -> Result<RunStats, ExtractError> {
        let mut records = RecordReader::open(&job.source).map_err(ExtractError::from_open)?;

        let out_dir = camera_dir(&job.output_dir, camera);
        std::fs::create_dir_all(&out_dir).map_err(|source| ExtractError::OutputUnwritable {
            path: out_dir.clone(),
            source,
        })?;

        info!(
            %camera,
            source = %job.source.display(),
            output = %out_dir.display(),
            decoder = self.frames.name(),
            "extracting camera images"
        );

        let mut stats = RunStats::default();
        loop {
            // The cap is checked before pulling the next record, so at most
            // `max_frames` records are ever read and decoded.
            if let Some(max) = job.max_frames {
                if stats.frames_processed >= max {
                    debug!(%camera, max, "frame cap reached");
                    break;
                }
            }
            let Some(record) = records.next() else {
                break;
            };

            let index = stats.frames_processed;
            let record =
                record.map_err(|source| ExtractError::CorruptRecord { frame: index, source })?;
            let frame = self
                .frames
                .decode(&record)
                .map_err(|source| ExtractError::MalformedRecord { frame: index, source })?;
            stats.frames_processed += 1;

            match frame.find_image(camera) {
                None => trace!(%camera, frame = index, "camera absent from frame"),
                Some(entry) => {
                    let image = self.images.decode(&entry.encoded).map_err(|source| {
                        ExtractError::ImageDecode {
                            frame: index,
                            camera,
                            source,
                        }
                    })?;
                    let path = frame_path(&job.output_dir, camera, index, frame.timestamp_micros);
                    write_jpeg(&image, &path, self.jpeg_quality).map_err(|source| {
                        ExtractError::OutputUnwritable {
                            path: path.clone(),
                            source,
                        }
                    })?;
                    stats.images_saved += 1;

                    if index < VERBOSE_FRAMES {
                        info!(
                            frame = index,
                            width = image.width(),
                            height = image.height(),
                            color = ?image.color(),
                            path = %path.display(),
                            "saved image"
                        );
                    }
                }
            }

            if stats.frames_processed % PROGRESS_EVERY == 0 {
                debug!(%camera, frames = stats.frames_processed, saved = stats.images_saved, "progress");
            }
        }

        info!(
            %camera,
            frames_processed = stats.frames_processed,
            images_saved = stats.images_saved,
            output = %out_dir.display(),
            "camera extraction complete"
        );
        Ok(stats)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("source {} does not exist", .0.display())]
    SourceNotFound(PathBuf),
    #[error("failed to open source {}: {source}", .path.display())]
    SourceUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("record {frame} is unreadable: {source}")]
    CorruptRecord { frame: u64, source: RecordError },
    #[error("record {frame} is not a valid frame: {source}")]
    MalformedRecord { frame: u64, source: FrameError },
    #[error("frame {frame}: failed to decode {camera} image: {source}")]
    ImageDecode {
        frame: u64,
        camera: CameraName,
        source: ImageError,
    },
    #[error("cannot write to {}: {source}", .path.display())]
    OutputUnwritable {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ExtractError {
    pub(crate) fn from_open(err: OpenError) -> Self {
        match err {
            OpenError::SourceNotFound(path) => ExtractError::SourceNotFound(path),
            OpenError::Unreadable(path, source) => ExtractError::SourceUnreadable { path, source },
        }
    }

    /// Errors that would recur for every camera, so a batch stops on them.
    pub fn is_batch_fatal(&self) -> bool {
        matches!(
            self,
            ExtractError::SourceNotFound(_)
                | ExtractError::SourceUnreadable { .. }
                | ExtractError::OutputUnwritable { .. }
        )
    }

    pub fn failed_at_frame(&self) -> Option<u64> {
        match self {
            ExtractError::CorruptRecord { frame, .. }
            | ExtractError::MalformedRecord { frame, .. }
            | ExtractError::ImageDecode { frame, .. } => Some(*frame),
            _ => None,
        }
    }
}
