use crate::camera::CameraName;
use prost::Message;
use tracing::debug;

/// One camera's encoded image inside a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEntry {
    pub camera: CameraName,
    /// Compressed image payload (JPEG in practice), untouched.
    pub encoded: Vec<u8>,
}

/// A decoded sensor frame.
///
/// Only the parts of the dataset's `Frame` message the extractor needs are
/// kept: segment name, capture time, whether a vehicle pose was present, and
/// the camera images in their original order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub context_name: Option<String>,
    pub timestamp_micros: i64,
    pub has_pose: bool,
    pub images: Vec<ImageEntry>,
}

impl Frame {
    /// First image for `camera` in frame order, if any.
    ///
    /// Duplicate entries for one camera are allowed by the schema; the earliest
    /// one always wins, regardless of whether it later decodes.
    pub fn find_image(&self, camera: CameraName) -> Option<&ImageEntry> {
        self.images.iter().find(|entry| entry.camera == camera)
    }

    /// Serialize the supported subset back to protobuf wire format.
    pub fn encode(&self) -> Vec<u8> {
        let message = pb::Frame {
            context: self.context_name.as_ref().map(|name| pb::Context {
                name: Some(name.clone()),
            }),
            timestamp_micros: Some(self.timestamp_micros),
            pose: self.has_pose.then(pb::Transform::default),
            images: self
                .images
                .iter()
                .map(|image| pb::CameraImage {
                    name: Some(image.camera.wire_value()),
                    image: Some(image.encoded.clone()),
                })
                .collect(),
        };
        message.encode_to_vec()
    }
}

/// Turns one raw record into a [`Frame`].
///
/// Implementations hold no per-run state; the same decoder is shared by
/// every camera sub-run.
pub trait FrameDecoder {
    fn decode(&self, record: &[u8]) -> Result<Frame, FrameError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str {
        "unnamed"
    }
}

/// Subset of the Waymo Open Dataset `dataset.proto` schema (proto2).
///
/// Fields not declared here (lasers, projections, calibrations, ...) are
/// skipped by prost as unknown fields.
mod pb {
    #[derive(Clone, PartialEq, prost::Message)]
    pub struct Frame {
        #[prost(message, optional, tag = "1")]
        pub context: Option<Context>,
        #[prost(int64, optional, tag = "2")]
        pub timestamp_micros: Option<i64>,
        #[prost(message, optional, tag = "3")]
        pub pose: Option<Transform>,
        #[prost(message, repeated, tag = "4")]
        pub images: Vec<CameraImage>,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct Context {
        #[prost(string, optional, tag = "1")]
        pub name: Option<String>,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct Transform {
        /// Row-major 4x4 matrix.
        #[prost(double, repeated, packed = "false", tag = "1")]
        pub transform: Vec<f64>,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct CameraImage {
        /// `CameraName.Name` enum value.
        #[prost(int32, optional, tag = "1")]
        pub name: Option<i32>,
        #[prost(bytes = "vec", optional, tag = "2")]
        pub image: Option<Vec<u8>>,
    }
}

/// Decoder for the Waymo Open Dataset `Frame` protobuf message.
#[derive(Debug, Default, Clone, Copy)]
pub struct WaymoFrameDecoder;

impl FrameDecoder for WaymoFrameDecoder {
    fn decode(&self, record: &[u8]) -> Result<Frame, FrameError> {
        let message = pb::Frame::decode(record)?;
        let images = message
            .images
            .into_iter()
            .filter_map(|image| {
                let value = image.name.unwrap_or_default();
                match CameraName::from_wire(value) {
                    Some(camera) => Some(ImageEntry {
                        camera,
                        encoded: image.image.unwrap_or_default(),
                    }),
                    None => {
                        debug!(camera_value = value, "dropping image with unsupported camera name");
                        None
                    }
                }
            })
            .collect();

        Ok(Frame {
            context_name: message.context.and_then(|c| c.name),
            timestamp_micros: message.timestamp_micros.unwrap_or_default(),
            has_pose: message.pose.is_some(),
            images,
        })
    }

    fn name(&self) -> &str {
        "waymo-frame"
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("invalid frame protobuf: {0}")]
    Decode(#[from] prost::DecodeError),
}
