use image::{imageops, DynamicImage};
use tract_onnx::prelude::*;

/// Channel statistics applied after scaling pixels to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl Normalization {
    #[cfg(test)]
    pub const IDENTITY: Normalization = Normalization {
        mean: [0.0, 0.0, 0.0],
        std: [1.0, 1.0, 1.0],
    };
}

/// Resize to `size x size` and lay out as a `[1, 3, size, size]` f32 tensor.
pub fn image_to_tensor(image: &DynamicImage, size: u32, norm: Normalization) -> Tensor {
    let resized = image.resize_exact(size, size, imageops::FilterType::Triangle);
    let rgb = resized.to_rgb8();
    let size = size as usize;

    tract_ndarray::Array4::from_shape_fn((1, 3, size, size), |(_, c, y, x)| {
        let pixel = rgb.get_pixel(x as u32, y as u32);
        (pixel[c] as f32 / 255.0 - norm.mean[c]) / norm.std[c]
    })
    .into_tensor()
}
