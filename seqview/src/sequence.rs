use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::crop::VIEW_CROP;
use crate::image::{Image, ImageError};

const RGB_DIR: &str = "rgb";
const VIEW_DIR: &str = "view";
const FRAME_EXT: &str = ".png";

/// One paired capture at a sequence index. The view image is already
/// reduced to the fixed crop.
pub struct Frame {
    pub index: usize,
    pub rgb: Image,
    pub view: Image,
}

/// Handle to one capture-session export.
///
/// The export contains two parallel sequences, `rgb/rgb<i>.png` and
/// `view/view<i>.png`, numbered from 0 with plain decimal indices. The
/// length is taken from the count of `rgb*.png` files.
pub struct Sequence {
    root: PathBuf,
    len: usize,
}

impl Sequence {
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, SequenceError> {
        let root = root.as_ref().to_owned();
        let rgb_dir = root.join(RGB_DIR);

        let entries = std::fs::read_dir(&rgb_dir).map_err(|e| SequenceError::Enumeration {
            path: rgb_dir.clone(),
            source: e,
        })?;

        let mut len = 0;

        for entry in entries {
            let entry = entry.map_err(|e| SequenceError::Enumeration {
                path: rgb_dir.clone(),
                source: e,
            })?;

            if matches_frame_name(&entry.file_name()) {
                len += 1;
            }
        }

        Ok(Self { root, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn rgb_path(&self, index: usize) -> PathBuf {
        self.root
            .join(RGB_DIR)
            .join(format!("{RGB_DIR}{index}{FRAME_EXT}"))
    }

    pub fn view_path(&self, index: usize) -> PathBuf {
        self.root
            .join(VIEW_DIR)
            .join(format!("{VIEW_DIR}{index}{FRAME_EXT}"))
    }

    /// Loads both images of a frame and crops the view one.
    pub fn load_frame(&self, index: usize) -> Result<Frame, FrameError> {
        let rgb = Image::load(self.rgb_path(index))?;

        let view_path = self.view_path(index);
        let view = Image::load(&view_path)?;

        let crop = view.crop(VIEW_CROP);

        if crop.is_empty() {
            return Err(FrameError::EmptyCrop {
                path: view_path,
                width: view.width(),
                height: view.height(),
            });
        }

        Ok(Frame {
            index,
            rgb,
            view: crop,
        })
    }
}

/// Parity with the original `rgb*.png` glob: prefix and extension only,
/// no digit check in between.
fn matches_frame_name(name: &OsStr) -> bool {
    match name.to_str() {
        Some(name) => name.starts_with(RGB_DIR) && name.ends_with(FRAME_EXT),
        None => false,
    }
}

#[derive(Debug, Error)]
pub enum SequenceError {
    #[error("cannot enumerate frames in {path:?}: {source}")]
    Enumeration {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error("crop region lies outside {path:?} ({width}x{height})")]
    EmptyCrop {
        path: PathBuf,
        width: usize,
        height: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;
    use std::io::BufWriter;

    use png::ColorType;

    fn scratch_root(name: &str) -> PathBuf {
        let root = std::env::temp_dir().join(format!("seqview-seq-{}-{}", name, std::process::id()));

        if root.exists() {
            fs::remove_dir_all(&root).unwrap();
        }

        fs::create_dir_all(root.join(RGB_DIR)).unwrap();
        fs::create_dir_all(root.join(VIEW_DIR)).unwrap();

        root
    }

    fn write_gray_png(path: &Path, width: u32, height: u32, value: impl Fn(u32, u32) -> u8) {
        let file = fs::File::create(path).unwrap();
        let writer = BufWriter::new(file);

        let mut encoder = png::Encoder::new(writer, width, height);
        encoder.set_color(ColorType::Grayscale);
        encoder.set_depth(png::BitDepth::Eight);

        let mut data = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(value(x, y));
            }
        }

        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(&data).unwrap();
    }

    #[test]
    fn counts_numbered_frames() {
        let root = scratch_root("count");

        for i in 0..4 {
            fs::write(root.join(RGB_DIR).join(format!("rgb{i}.png")), []).unwrap();
        }
        fs::write(root.join(RGB_DIR).join("notes.txt"), []).unwrap();
        fs::write(root.join(RGB_DIR).join("depth0.png"), []).unwrap();

        let sequence = Sequence::open(&root).unwrap();
        assert_eq!(sequence.len(), 4);

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn empty_sequence() {
        let root = scratch_root("empty");

        let sequence = Sequence::open(&root).unwrap();
        assert!(sequence.is_empty());

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn missing_rgb_dir() {
        let root = std::env::temp_dir().join(format!("seqview-seq-nodir-{}", std::process::id()));

        assert!(matches!(
            Sequence::open(&root),
            Err(SequenceError::Enumeration { .. })
        ));
    }

    #[test]
    fn frame_paths_use_plain_indices() {
        let root = scratch_root("paths");

        let sequence = Sequence::open(&root).unwrap();
        assert_eq!(
            sequence.rgb_path(7),
            root.join(RGB_DIR).join("rgb7.png")
        );
        assert_eq!(
            sequence.view_path(12),
            root.join(VIEW_DIR).join("view12.png")
        );

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn loads_and_crops_frame() {
        let root = scratch_root("load");

        write_gray_png(&root.join(RGB_DIR).join("rgb0.png"), 4, 4, |_, _| 128);
        write_gray_png(&root.join(VIEW_DIR).join("view0.png"), 1920, 1080, |x, y| {
            ((x + y) % 256) as u8
        });

        let sequence = Sequence::open(&root).unwrap();
        assert_eq!(sequence.len(), 1);

        let frame = sequence.load_frame(0).unwrap();
        assert_eq!(frame.index, 0);
        assert_eq!((frame.rgb.width(), frame.rgb.height()), (4, 4));
        assert_eq!((frame.view.width(), frame.view.height()), (640, 480));

        // first crop pixel is the source pixel at column 960, row 480
        let expected = ((960 + 480) % 256) as u8;
        assert_eq!(
            &frame.view.data()[0..4],
            &[expected, expected, expected, u8::MAX]
        );

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn missing_view_file() {
        let root = scratch_root("noview");

        write_gray_png(&root.join(RGB_DIR).join("rgb0.png"), 4, 4, |_, _| 0);

        let sequence = Sequence::open(&root).unwrap();
        assert!(matches!(
            sequence.load_frame(0),
            Err(FrameError::Image(ImageError::Open { .. }))
        ));

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn undersized_view_fails() {
        let root = scratch_root("small");

        write_gray_png(&root.join(RGB_DIR).join("rgb0.png"), 4, 4, |_, _| 0);
        write_gray_png(&root.join(VIEW_DIR).join("view0.png"), 640, 480, |_, _| 0);

        let sequence = Sequence::open(&root).unwrap();
        assert!(matches!(
            sequence.load_frame(0),
            Err(FrameError::EmptyCrop { .. })
        ));

        fs::remove_dir_all(&root).unwrap();
    }
}
