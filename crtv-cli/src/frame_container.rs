//! A minimal raw frame container used to get pixel data into and out of the
//! simulator from the command line. This is deliberately not a real video
//! codec: no resampling, no compression, no multiplexing with audio. Each
//! frame is a flat array of little-endian `0xAARRGGBB` pixels, prefixed by a
//! fixed 16-byte header.
//!
//! ```text
//! offset 0   magic       [u8; 4]   b"CRTV"
//! offset 4   width       u32 LE
//! offset 8   height      u32 LE
//! offset 12  frame_count u32 LE
//! offset 16  frame 0     width * height u32 LE pixels
//! ...        frame 1     width * height u32 LE pixels
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crtv_core::FrameData;

use crate::errors::MediaError;

const MAGIC: [u8; 4] = *b"CRTV";

fn read_u32(reader: &mut impl Read, path: &Path) -> Result<u32, MediaError> {
    let mut buf = [0u8; 4];
    reader
        .read_exact(&mut buf)
        .map_err(|source| MediaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(u32::from_le_bytes(buf))
}

/// Reads frames sequentially from a CRTV container.
pub struct FrameContainerReader {
    reader: BufReader<File>,
    path: PathBuf,
    width: u32,
    height: u32,
    frame_count: u32,
    frames_read: u32,
}

impl FrameContainerReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, MediaError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| MediaError::Io {
            path: path.clone(),
            source,
        })?;
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 4];
        reader
            .read_exact(&mut magic)
            .map_err(|source| MediaError::Io {
                path: path.clone(),
                source,
            })?;
        if magic != MAGIC {
            return Err(MediaError::BadMagic { path });
        }

        let width = read_u32(&mut reader, &path)?;
        let height = read_u32(&mut reader, &path)?;
        let frame_count = read_u32(&mut reader, &path)?;

        Ok(Self {
            reader,
            path,
            width,
            height,
            frame_count,
            frames_read: 0,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Reads the next frame, or `None` once `frame_count` frames have been
    /// returned.
    pub fn next_frame(&mut self) -> Option<Result<FrameData, MediaError>> {
        if self.frames_read >= self.frame_count {
            return None;
        }

        let pixel_count = self.width as usize * self.height as usize;
        let mut buf = vec![0u8; pixel_count * 4];
        let mut total = 0usize;
        while total < buf.len() {
            match self.reader.read(&mut buf[total..]) {
                Ok(0) => {
                    return Some(Err(MediaError::Truncated {
                        path: self.path.clone(),
                        expected: buf.len(),
                        found: total,
                    }))
                }
                Ok(n) => total += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Some(Err(MediaError::Io {
                        path: self.path.clone(),
                        source,
                    }))
                }
            }
        }

        let pixels: Vec<u32> = buf
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        self.frames_read += 1;
        Some(Ok(FrameData::from_pixels(pixels, self.width as usize, self.height as usize)))
    }
}

/// Writes frames sequentially to a new CRTV container. The frame count must
/// be known up front since it lives in the fixed header; [`finish`] checks
/// that the promised count was actually written.
///
/// [`finish`]: FrameContainerWriter::finish
pub struct FrameContainerWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    width: u32,
    height: u32,
    frame_count: u32,
    frames_written: u32,
}

impl FrameContainerWriter {
    pub fn create(path: impl AsRef<Path>, width: u32, height: u32, frame_count: u32) -> Result<Self, MediaError> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|source| MediaError::Io {
            path: path.clone(),
            source,
        })?;
        let mut writer = BufWriter::new(file);

        let header_write = (|| -> std::io::Result<()> {
            writer.write_all(&MAGIC)?;
            writer.write_all(&width.to_le_bytes())?;
            writer.write_all(&height.to_le_bytes())?;
            writer.write_all(&frame_count.to_le_bytes())
        })();
        header_write.map_err(|source| MediaError::Io {
            path: path.clone(),
            source,
        })?;

        Ok(Self {
            writer,
            path,
            width,
            height,
            frame_count,
            frames_written: 0,
        })
    }

    pub fn write_frame(&mut self, frame: &FrameData) -> Result<(), MediaError> {
        if frame.width as u32 != self.width || frame.height as u32 != self.height {
            return Err(MediaError::FrameSizeMismatch {
                index: self.frames_written as usize,
                expected_w: self.width,
                expected_h: self.height,
                actual_w: frame.width as u32,
                actual_h: frame.height as u32,
            });
        }

        for &pixel in &frame.pixels {
            self.writer
                .write_all(&pixel.to_le_bytes())
                .map_err(|source| MediaError::Io {
                    path: self.path.clone(),
                    source,
                })?;
        }
        self.frames_written += 1;
        Ok(())
    }

    /// Flushes the writer and confirms the frame count promised by the
    /// header was actually written.
    pub fn finish(mut self) -> Result<(), MediaError> {
        self.writer.flush().map_err(|source| MediaError::Io {
            path: self.path.clone(),
            source,
        })?;
        if self.frames_written != self.frame_count {
            return Err(MediaError::FrameCountMismatch {
                path: self.path,
                header: self.frame_count,
                actual: self.frames_written,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker_frame(width: usize, height: usize) -> FrameData {
        let mut frame = FrameData::new(width, height);
        for (i, p) in frame.pixels.iter_mut().enumerate() {
            *p = 0xFF00_0000 | (i as u32 & 0x00FF_FFFF);
        }
        frame
    }

    #[test]
    fn round_trips_pixels_exactly() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("crtv_container_test_{}.bin", std::process::id()));

        let frame_a = checker_frame(4, 3);
        let frame_b = checker_frame(4, 3);

        let mut writer = FrameContainerWriter::create(&path, 4, 3, 2).unwrap();
        writer.write_frame(&frame_a).unwrap();
        writer.write_frame(&frame_b).unwrap();
        writer.finish().unwrap();

        let mut reader = FrameContainerReader::open(&path).unwrap();
        assert_eq!(reader.width(), 4);
        assert_eq!(reader.height(), 3);
        assert_eq!(reader.frame_count(), 2);

        let read_a = reader.next_frame().unwrap().unwrap();
        let read_b = reader.next_frame().unwrap().unwrap();
        assert!(reader.next_frame().is_none());

        assert_eq!(read_a.pixels, frame_a.pixels);
        assert_eq!(read_b.pixels, frame_b.pixels);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn rejects_bad_magic() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("crtv_container_badmagic_{}.bin", std::process::id()));
        std::fs::write(&path, b"NOPE\x01\x00\x00\x00\x01\x00\x00\x00\x01\x00\x00\x00").unwrap();

        let result = FrameContainerReader::open(&path);
        assert!(matches!(result, Err(MediaError::BadMagic { .. })));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn rejects_truncated_frame_data() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("crtv_container_truncated_{}.bin", std::process::id()));

        let mut writer = FrameContainerWriter::create(&path, 2, 2, 1).unwrap();
        // Write fewer pixels than declared, then drop the writer without
        // finishing, leaving a short frame on disk.
        writer
            .writer
            .write_all(&0u32.to_le_bytes())
            .unwrap();
        drop(writer);

        let mut reader = FrameContainerReader::open(&path).unwrap();
        let result = reader.next_frame().unwrap();
        assert!(matches!(result, Err(MediaError::Truncated { .. })));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn write_frame_rejects_size_mismatch() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("crtv_container_sizemismatch_{}.bin", std::process::id()));

        let mut writer = FrameContainerWriter::create(&path, 4, 4, 1).unwrap();
        let wrong_frame = FrameData::new(2, 2);
        let result = writer.write_frame(&wrong_frame);
        assert!(matches!(result, Err(MediaError::FrameSizeMismatch { .. })));

        std::fs::remove_file(&path).ok();
    }
}
