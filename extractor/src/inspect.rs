use std::path::Path;

use chrono::{DateTime, Utc};
use frame_extract_common::camera::CameraName;
use frame_extract_common::frame::FrameDecoder;
use frame_extract_common::record::RecordReader;
use serde::Serialize;
use tracing::{info, warn};

use crate::codec::ImageDecoder;
use crate::pipeline::ExtractError;

#[derive(Debug, Serialize)]
pub struct FrameSummary {
    pub index: u64,
    pub context_name: Option<String>,
    pub timestamp_micros: i64,
    /// UTC rendering of the capture time, when it is in chrono's range.
    pub captured_at: Option<String>,
    pub has_pose: bool,
    pub images: Vec<ImageSummary>,
}

#[derive(Debug, Serialize)]
pub struct ImageSummary {
    pub camera: CameraName,
    pub encoded_bytes: usize,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub error: Option<String>,
}

/// Describe the first `limit` frames of a source without writing anything.
///
/// Reads the source on its own, independent of any extraction run. An image
/// that fails to decode is reported in its summary rather than aborting.
pub fn inspect<F: FrameDecoder, I: ImageDecoder>(
    source: &Path,
    limit: u64,
    frames: &F,
    images: &I,
) -> Result<Vec<FrameSummary>, ExtractError> {
    let records = RecordReader::open(source).map_err(ExtractError::from_open)?;
    let mut summaries = Vec::new();

    for (index, record) in (0u64..).zip(records).take(limit as usize) {
        let record = record.map_err(|source| ExtractError::CorruptRecord { frame: index, source })?;
        let frame = frames
            .decode(&record)
            .map_err(|source| ExtractError::MalformedRecord { frame: index, source })?;

        let captured_at = DateTime::<Utc>::from_timestamp_micros(frame.timestamp_micros)
            .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string());
        info!(
            frame = index,
            context = frame.context_name.as_deref().unwrap_or("-"),
            timestamp_micros = frame.timestamp_micros,
            captured_at = captured_at.as_deref().unwrap_or("-"),
            has_pose = frame.has_pose,
            cameras = frame.images.len(),
            "frame"
        );

        let mut image_summaries = Vec::with_capacity(frame.images.len());
        for (n, entry) in frame.images.iter().enumerate() {
            let summary = match images.decode(&entry.encoded) {
                Ok(img) => {
                    info!(n = n + 1, camera = %entry.camera, width = img.width(), height = img.height(), "  camera");
                    ImageSummary {
                        camera: entry.camera,
                        encoded_bytes: entry.encoded.len(),
                        width: Some(img.width()),
                        height: Some(img.height()),
                        error: None,
                    }
                }
                Err(e) => {
                    warn!(n = n + 1, camera = %entry.camera, error = %e, "  camera image failed to decode");
                    ImageSummary {
                        camera: entry.camera,
                        encoded_bytes: entry.encoded.len(),
                        width: None,
                        height: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            image_summaries.push(summary);
        }

        summaries.push(FrameSummary {
            index,
            context_name: frame.context_name,
            timestamp_micros: frame.timestamp_micros,
            captured_at,
            has_pose: frame.has_pose,
            images: image_summaries,
        });
    }

    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::JpegDecoder;
    use frame_extract_common::frame::{Frame, ImageEntry, WaymoFrameDecoder};
    use frame_extract_common::record::RecordWriter;
    use image::codecs::jpeg::JpegEncoder;
    use image::{Rgb, RgbImage};

    fn jpeg(width: u32, height: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, 80)
            .encode_image(&RgbImage::from_pixel(width, height, Rgb([1, 2, 3])))
            .unwrap();
        buf
    }

    #[test]
    fn summarizes_first_frames_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seg.tfrecord");
        let mut w = RecordWriter::create(&path).unwrap();
        for ts in [1_557_962_335_062_684i64, 1_557_962_335_162_684] {
            let frame = Frame {
                context_name: Some("segment-abc".into()),
                timestamp_micros: ts,
                has_pose: true,
                images: vec![
                    ImageEntry {
                        camera: CameraName::Front,
                        encoded: jpeg(12, 8),
                    },
                    ImageEntry {
                        camera: CameraName::SideRight,
                        encoded: b"broken".to_vec(),
                    },
                ],
            };
            w.write_record(&frame.encode()).unwrap();
        }
        w.finish().unwrap();

        let summaries = inspect(&path, 1, &WaymoFrameDecoder, &JpegDecoder).unwrap();
        assert_eq!(summaries.len(), 1);
        let first = &summaries[0];
        assert_eq!(first.index, 0);
        assert_eq!(first.context_name.as_deref(), Some("segment-abc"));
        assert_eq!(
            first.captured_at.as_deref(),
            Some("2019-05-15T23:18:55.062684Z")
        );
        assert_eq!(first.images.len(), 2);
        assert_eq!(first.images[0].width, Some(12));
        assert_eq!(first.images[0].height, Some(8));
        assert!(first.images[1].error.is_some());
        assert!(dir.path().read_dir().unwrap().count() == 1, "inspect writes nothing");
    }

    #[test]
    fn missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let err = inspect(&dir.path().join("nope"), 1, &WaymoFrameDecoder, &JpegDecoder).unwrap_err();
        assert!(matches!(err, ExtractError::SourceNotFound(_)));
    }
}
