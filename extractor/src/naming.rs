use frame_extract_common::camera::CameraName;
use std::path::{Path, PathBuf};

/// Per-camera output directory, e.g. "output/front_left".
pub fn camera_dir(output_dir: &Path, camera: CameraName) -> PathBuf {
    output_dir.join(camera.lowercase_name())
}

/// File name for one extracted image.
/// e.g. "frame_000042_1557962335062684_front.jpg"
///
/// The zero-padded frame index is unique within a run, so names never
/// collide even when two frames share a timestamp.
pub fn frame_file_name(camera: CameraName, frame_index: u64, timestamp_micros: i64) -> String {
    format!(
        "frame_{frame_index:06}_{timestamp_micros}_{camera}.jpg",
        camera = camera.lowercase_name()
    )
}

pub fn frame_path(
    output_dir: &Path,
    camera: CameraName,
    frame_index: u64,
    timestamp_micros: i64,
) -> PathBuf {
    camera_dir(output_dir, camera).join(frame_file_name(camera, frame_index, timestamp_micros))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_name_format() {
        let p = frame_path(Path::new("out"), CameraName::FrontLeft, 7, 1557962335062684);
        assert_eq!(
            p,
            Path::new("out/front_left/frame_000007_1557962335062684_front_left.jpg")
        );
    }

    #[test]
    fn index_wider_than_padding() {
        let name = frame_file_name(CameraName::Front, 1_234_567, 0);
        assert_eq!(name, "frame_1234567_0_front.jpg");
    }

    #[test]
    fn shared_timestamp_still_unique() {
        let names: HashSet<_> = (0..500)
            .map(|i| frame_path(Path::new("o"), CameraName::SideRight, i, 1000))
            .collect();
        assert_eq!(names.len(), 500, "frame index alone must keep paths distinct");
    }
}
