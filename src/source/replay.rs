//! JSON-lines 关键点回放
//!
//! 每行一个 JSON 对象，由外部人脸关键点检测器产生：
//!
//! ```text
//! {"timestamp_ms": 1718000000000, "landmarks": [[x, y], ... 68 points]}
//! {"timestamp_ms": 1718000000033, "landmarks": null}
//! ```
//!
//! `landmarks` 为 `null` 或空数组表示该帧未检测到人脸。
//! 无法解析的行视为检测器在该帧失败，按无人脸处理并记录警告。

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::constants::STDIN_SOURCE;
use crate::source::{Detection, Frame, LandmarkSource, SourceError};
use crate::vision::{EyeLandmarkSet, Keypoint};

#[derive(Debug, Deserialize)]
struct LandmarkRecord {
    #[serde(default)]
    timestamp_ms: Option<i64>,
    #[serde(default)]
    landmarks: Option<Vec<[f64; 2]>>,
}

pub struct JsonLinesSource<R> {
    reader: R,
    // 跨越被取消的读取保留半行数据
    buf: Vec<u8>,
    line_no: u64,
}

pub type BoxedReader = Box<dyn AsyncBufRead + Unpin + Send>;

impl JsonLinesSource<BoxedReader> {
    /// Open a file path, or stdin for `-`.
    pub async fn open(path: &str) -> Result<Self, SourceError> {
        let reader: BoxedReader = if path == STDIN_SOURCE {
            Box::new(BufReader::new(tokio::io::stdin()))
        } else {
            let file = tokio::fs::File::open(path)
                .await
                .map_err(|source| SourceError::Open {
                    path: path.to_string(),
                    source,
                })?;
            Box::new(BufReader::new(file))
        };
        tracing::info!(source = path, "Reading landmark stream");
        Ok(Self::from_reader(reader))
    }
}

impl<R> JsonLinesSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line_no: 0,
        }
    }

    fn parse_line(&self, line: &str) -> Frame {
        let record: LandmarkRecord = match serde_json::from_str(line) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(line = self.line_no, error = %e, "Unparsable landmark record, treating as no face");
                return Frame::no_face();
            }
        };

        let timestamp = record
            .timestamp_ms
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .unwrap_or_else(Utc::now);

        let detection = match record.landmarks {
            None => Detection::NoFace,
            Some(points) if points.is_empty() => Detection::NoFace,
            Some(points) => {
                let points: Vec<Keypoint> = points.into_iter().map(Keypoint::from).collect();
                match EyeLandmarkSet::from_face(&points) {
                    Ok(eyes) => Detection::Face(eyes),
                    Err(e) => {
                        tracing::warn!(line = self.line_no, error = %e, "Malformed landmark set, treating as no face");
                        Detection::NoFace
                    }
                }
            }
        };

        Frame {
            timestamp,
            detection,
        }
    }
}

impl<R> LandmarkSource for JsonLinesSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        loop {
            let read = self.reader.read_until(b'\n', &mut self.buf).await?;
            if read == 0 && self.buf.is_empty() {
                return Ok(None);
            }
            let raw = std::mem::take(&mut self.buf);
            self.line_no += 1;

            let line = match std::str::from_utf8(&raw) {
                Ok(line) => line.trim(),
                Err(e) => {
                    tracing::warn!(line = self.line_no, error = %e, "Landmark record is not valid UTF-8, treating as no face");
                    return Ok(Some(Frame::no_face()));
                }
            };
            if line.is_empty() {
                continue;
            }
            return Ok(Some(self.parse_line(line)));
        }
    }
}
