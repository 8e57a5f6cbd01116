//! Light/dark color swatches from an image.

use image::GenericImageView;

/// Side of the thumbnail the colors are averaged over.
const THUMBNAIL_SIZE: u32 = 32;

/// A light and a dark `#RRGGBB` color representative of an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Swatches {
    pub light: String,
    pub dark: String,
}

/// Decode `bytes` and derive its swatches.
///
/// Pixels of a downscaled copy are split by luma around the mean: the light
/// swatch averages the brighter half, the dark swatch the darker one. A flat
/// image yields the same color for both.
pub fn extract_swatches(bytes: &[u8]) -> image::ImageResult<Swatches> {
    let img = image::load_from_memory(bytes)?;
    let thumb = if img.dimensions().0 > THUMBNAIL_SIZE || img.dimensions().1 > THUMBNAIL_SIZE {
        img.thumbnail(THUMBNAIL_SIZE, THUMBNAIL_SIZE)
    } else {
        img
    };
    let rgb = thumb.to_rgb8();

    let pixels: Vec<[u8; 3]> = rgb.pixels().map(|p| p.0).collect();
    if pixels.is_empty() {
        let black = hex([0, 0, 0]);
        return Ok(Swatches {
            light: black.clone(),
            dark: black,
        });
    }

    let lumas: Vec<u32> = pixels.iter().map(|&p| luma(p)).collect();
    let mean = lumas.iter().sum::<u32>() / lumas.len() as u32;

    let mut light = Accumulator::default();
    let mut dark = Accumulator::default();
    for (pixel, l) in pixels.iter().zip(&lumas) {
        if *l >= mean {
            light.add(*pixel);
        } else {
            dark.add(*pixel);
        }
    }

    let light = light.average().unwrap_or([0, 0, 0]);
    let dark = dark.average().unwrap_or(light);
    Ok(Swatches {
        light: hex(light),
        dark: hex(dark),
    })
}

/// Integer Rec. 601 luma, 0-255.
fn luma([r, g, b]: [u8; 3]) -> u32 {
    (299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000
}

fn hex([r, g, b]: [u8; 3]) -> String {
    format!("#{r:02X}{g:02X}{b:02X}")
}

#[derive(Default)]
struct Accumulator {
    sum: [u64; 3],
    count: u64,
}

impl Accumulator {
    fn add(&mut self, pixel: [u8; 3]) {
        for (sum, channel) in self.sum.iter_mut().zip(pixel) {
            *sum += channel as u64;
        }
        self.count += 1;
    }

    fn average(&self) -> Option<[u8; 3]> {
        if self.count == 0 {
            return None;
        }
        Some(self.sum.map(|s| (s / self.count) as u8))
    }
}
