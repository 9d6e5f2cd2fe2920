use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use png::{ColorType, Transformations};

use thiserror::Error;

use crate::crop::CropRect;

/// Decoded raster, always 8-bit RGBA in memory.
pub struct Image {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Image {
    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Result<Self, ImageError> {
        if width * height * 4 != data.len() {
            return Err(ImageError::InvalidDataLength);
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Decodes a PNG file, normalizing palette, grayscale and 16-bit
    /// variants to 8-bit RGBA.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ImageError> {
        let path = path.as_ref();

        let file = File::open(path).map_err(|e| ImageError::Open {
            path: path.to_owned(),
            source: e,
        })?;

        let mut decoder = png::Decoder::new(BufReader::new(file));
        decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);

        let mut reader = decoder.read_info().map_err(|e| ImageError::Decode {
            path: path.to_owned(),
            source: e,
        })?;

        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader
            .next_frame(&mut buf)
            .map_err(|e| ImageError::Decode {
                path: path.to_owned(),
                source: e,
            })?;

        buf.truncate(info.buffer_size());

        let data = match info.color_type {
            ColorType::Rgba => buf,
            ColorType::Rgb => buf
                .chunks_exact(3)
                .flat_map(|px| [px[0], px[1], px[2], u8::MAX])
                .collect(),
            ColorType::Grayscale => buf.iter().flat_map(|g| [*g, *g, *g, u8::MAX]).collect(),
            ColorType::GrayscaleAlpha => buf
                .chunks_exact(2)
                .flat_map(|px| [px[0], px[0], px[0], px[1]])
                .collect(),
            color => {
                return Err(ImageError::UnsupportedColor {
                    path: path.to_owned(),
                    color,
                })
            }
        };

        Ok(Self {
            width: info.width as usize,
            height: info.height as usize,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Copies out the given rectangle, clamped to the image bounds.
    pub fn crop(&self, rect: CropRect) -> Image {
        let rect = rect.clamped(self.width, self.height);

        if rect.is_empty() {
            return Image {
                width: rect.width,
                height: rect.height,
                data: Vec::new(),
            };
        }

        let mut data = Vec::with_capacity(rect.width * rect.height * 4);

        for row in self
            .data
            .chunks_exact(self.width * 4)
            .skip(rect.y)
            .take(rect.height)
        {
            data.extend_from_slice(&row[rect.x * 4..(rect.x + rect.width) * 4]);
        }

        Image {
            width: rect.width,
            height: rect.height,
            data,
        }
    }
}

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("cannot open {path:?}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot decode {path:?}: {source}")]
    Decode {
        path: PathBuf,
        source: png::DecodingError,
    },
    #[error("unsupported color type {color:?} in {path:?}")]
    UnsupportedColor { path: PathBuf, color: ColorType },
    #[error("invalid source data length")]
    InvalidDataLength,
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    fn gradient(width: usize, height: usize) -> Image {
        let mut data = Vec::with_capacity(width * height * 4);

        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[x as u8, y as u8, 0, u8::MAX]);
            }
        }

        Image::from_raw(width, height, data).unwrap()
    }

    fn scratch_png(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("seqview-image-{}-{}.png", name, std::process::id()))
    }

    fn write_png(path: &Path, width: u32, height: u32, color: ColorType, data: &[u8]) {
        let file = File::create(path).unwrap();
        let writer = std::io::BufWriter::new(file);

        let mut encoder = png::Encoder::new(writer, width, height);
        encoder.set_color(color);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(data).unwrap();
    }

    #[test]
    fn raw_length_check() {
        assert!(Image::from_raw(2, 2, vec![0; 16]).is_ok());
        assert!(Image::from_raw(2, 2, vec![0; 12]).is_err());
    }

    #[test]
    fn crop_copies_region() {
        let image = gradient(8, 8);

        let crop = image.crop(CropRect {
            x: 2,
            y: 1,
            width: 4,
            height: 3,
        });

        assert_eq!(crop.width(), 4);
        assert_eq!(crop.height(), 3);
        assert_eq!(&crop.data()[0..4], &[2, 1, 0, u8::MAX]);
        assert_eq!(&crop.data()[crop.data().len() - 4..], &[5, 3, 0, u8::MAX]);
    }

    #[test]
    fn crop_clamps_to_bounds() {
        let image = gradient(8, 8);

        let partial = image.crop(CropRect {
            x: 6,
            y: 6,
            width: 4,
            height: 4,
        });
        assert_eq!(partial.width(), 2);
        assert_eq!(partial.height(), 2);
        assert_eq!(&partial.data()[0..4], &[6, 6, 0, u8::MAX]);

        let outside = image.crop(CropRect {
            x: 9,
            y: 0,
            width: 2,
            height: 2,
        });
        assert!(outside.is_empty());
        assert!(outside.data().is_empty());
    }

    #[test]
    fn load_rgb_png() {
        let path = scratch_png("rgb");
        write_png(&path, 2, 1, ColorType::Rgb, &[1, 2, 3, 4, 5, 6]);

        let image = Image::load(&path).unwrap();
        assert_eq!(image.width(), 2);
        assert_eq!(image.height(), 1);
        assert_eq!(image.data(), &[1, 2, 3, u8::MAX, 4, 5, 6, u8::MAX]);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn load_gray_png() {
        let path = scratch_png("gray");
        write_png(&path, 2, 1, ColorType::Grayscale, &[7, 9]);

        let image = Image::load(&path).unwrap();
        assert_eq!(image.data(), &[7, 7, 7, u8::MAX, 9, 9, 9, u8::MAX]);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn load_missing_file() {
        let path = scratch_png("missing");

        assert!(matches!(
            Image::load(&path),
            Err(ImageError::Open { .. })
        ));
    }
}
