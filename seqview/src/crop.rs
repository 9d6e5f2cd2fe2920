/// Pixel rectangle with its origin in the top-left corner of the image.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CropRect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

/// Region of the view render shown next to the camera frame,
/// rows 480..960 and columns 960..1600 of the source image.
pub const VIEW_CROP: CropRect = CropRect {
    x: 960,
    y: 480,
    width: 640,
    height: 480,
};

impl CropRect {
    /// Intersection with an image of the given dimensions.
    pub fn clamped(&self, width: usize, height: usize) -> CropRect {
        let x = self.x.min(width);
        let y = self.y.min(height);

        CropRect {
            x,
            y,
            width: self.width.min(width - x),
            height: self.height.min(height - y),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
