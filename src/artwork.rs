use crate::model::Track;
use image::imageops::FilterType;
use lofty::file::TaggedFileExt;
use lofty::probe::Probe;
use std::path::Path;

pub const ART_WIDTH: u32 = 28;
pub const ART_HEIGHT: u32 = 28;

/// Small RGB grid for the album panel; rows are paired into half-block cells
/// by the renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtGrid {
    width: u32,
    height: u32,
    pixels: Vec<(u8, u8, u8)>,
}

impl ArtGrid {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8) {
        self.pixels
            .get((y * self.width + x) as usize)
            .copied()
            .unwrap_or((0, 0, 0))
    }
}

/// Embedded cover art scaled for the side panel, or a deterministic
/// placeholder pattern derived from the track id when no usable picture
/// exists. Never fails; a broken file simply falls back to the placeholder.
pub fn for_track(track: &Track) -> ArtGrid {
    embedded_picture(&track.path)
        .and_then(|bytes| decode(&bytes))
        .unwrap_or_else(|| placeholder(&track.id))
}

fn embedded_picture(path: &Path) -> Option<Vec<u8>> {
    let tagged = Probe::open(path).ok()?.read().ok()?;
    let tag = tagged.primary_tag().or_else(|| tagged.first_tag())?;
    tag.pictures()
        .first()
        .map(|picture| picture.data().to_vec())
}

fn decode(bytes: &[u8]) -> Option<ArtGrid> {
    let decoded = image::load_from_memory(bytes).ok()?;
    let scaled = decoded
        .resize_exact(ART_WIDTH, ART_HEIGHT, FilterType::Triangle)
        .to_rgb8();
    let pixels = scaled
        .pixels()
        .map(|pixel| (pixel[0], pixel[1], pixel[2]))
        .collect();
    Some(ArtGrid {
        width: ART_WIDTH,
        height: ART_HEIGHT,
        pixels,
    })
}

fn placeholder(id: &str) -> ArtGrid {
    let digits: Vec<u8> = id
        .as_bytes()
        .chunks(2)
        .filter_map(|pair| {
            std::str::from_utf8(pair)
                .ok()
                .and_then(|value| u8::from_str_radix(value, 16).ok())
        })
        .collect();
    let digits = if digits.is_empty() {
        vec![0x51, 0x73, 0xa5]
    } else {
        digits
    };

    let base = (
        64_u8.saturating_add(digits[0] / 2),
        64_u8.saturating_add(digits[1 % digits.len()] / 2),
        64_u8.saturating_add(digits[2 % digits.len()] / 2),
    );
    let accent = (
        24_u8.saturating_add(digits[3 % digits.len()] / 4),
        24_u8.saturating_add(digits[4 % digits.len()] / 4),
        24_u8.saturating_add(digits[5 % digits.len()] / 4),
    );

    let half = ART_WIDTH.div_ceil(2);
    let mut pixels = Vec::with_capacity((ART_WIDTH * ART_HEIGHT) as usize);
    for y in 0..ART_HEIGHT {
        for x in 0..ART_WIDTH {
            // mirror across the vertical axis so the pattern reads as a badge
            let mirrored = x.min(ART_WIDTH - 1 - x);
            let cell = (y / 4) * half + (mirrored / 4);
            let byte = digits[cell as usize % digits.len()];
            let lit = (byte >> (cell % 8)) & 1 == 1;
            pixels.push(if lit { base } else { accent });
        }
    }

    ArtGrid {
        width: ART_WIDTH,
        height: ART_HEIGHT,
        pixels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn track(id: &str) -> Track {
        Track {
            id: String::from(id),
            index: 0,
            title: String::from("song"),
            artist: String::from("artist"),
            path: PathBuf::from("no-such-file.mp3"),
        }
    }

    #[test]
    fn missing_file_falls_back_to_placeholder() {
        let grid = for_track(&track("a1b2c3d4e5f60718"));
        assert_eq!(grid.width(), ART_WIDTH);
        assert_eq!(grid.height(), ART_HEIGHT);
        assert!(!grid.is_empty());
    }

    #[test]
    fn placeholder_is_deterministic_per_id() {
        assert_eq!(
            for_track(&track("a1b2c3d4e5f60718")),
            for_track(&track("a1b2c3d4e5f60718"))
        );
        assert_ne!(
            for_track(&track("a1b2c3d4e5f60718")),
            for_track(&track("00112233445566ff"))
        );
    }

    #[test]
    fn placeholder_pattern_is_mirrored() {
        let grid = for_track(&track("a1b2c3d4e5f60718"));
        for y in 0..ART_HEIGHT {
            assert_eq!(grid.pixel(0, y), grid.pixel(ART_WIDTH - 1, y));
        }
    }

    #[test]
    fn out_of_range_pixel_reads_as_black() {
        let grid = ArtGrid::default();
        assert_eq!(grid.pixel(5, 5), (0, 0, 0));
    }
}
