// SPDX-FileCopyrightText: © 2024 David Bliss
//
// SPDX-License-Identifier: GPL-3.0-or-later

use super::trailer::{self, MosaicMetadata};
use crate::cache::DirectoryCache;
use crate::config::Config;
use crate::file_types::MediaKind;
use crate::scanner::FileRef;
use crate::video::FrameExtractor;
use crate::Error;
use crate::Result;

use image::codecs::jpeg::JpegEncoder;
use image::{imageops, DynamicImage, ImageReader, RgbImage};

use fast_image_resize as fr;
use fr::images::Image;
use fr::{ResizeOptions, Resizer};

use rand::seq::SliceRandom;
use rayon::prelude::*;
use std::path::Path;
use tracing::{debug, warn};

/// Geometry of a square grid of square cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub columns: u32,
    pub cell_size: u32,
}

impl GridLayout {
    pub fn slots(&self) -> usize {
        (self.columns * self.columns) as usize
    }

    pub fn canvas_size(&self) -> u32 {
        self.columns * self.cell_size
    }

    /// Top-left pixel of the cell at `slot`, filled row by row.
    pub fn position(&self, slot: usize) -> (u32, u32) {
        let slot = slot as u32;
        let row = slot / self.columns;
        let column = slot % self.columns;
        (column * self.cell_size, row * self.cell_size)
    }
}

/// A finished mosaic: JPEG bytes with the metadata block appended.
#[derive(Debug, Clone)]
pub struct Mosaic {
    pub bytes: Vec<u8>,
    pub cells_filled: usize,
}

/// Assembles the preview grid for one directory.
#[derive(Debug, Clone)]
pub struct Composer {
    layout: GridLayout,
    quality: u8,
    frames: FrameExtractor,
}

impl Composer {
    pub fn new(config: &Config) -> Self {
        Self {
            layout: GridLayout {
                columns: config.grid_columns,
                cell_size: config.cell_size,
            },
            quality: config.jpeg_quality,
            frames: FrameExtractor::new(config.capture_ceiling),
        }
    }

    pub fn layout(&self) -> GridLayout {
        self.layout
    }

    /// Draws up to one file per slot at random from the whole subtree.
    /// Files the cache already knows to be undecodable are passed over.
    /// Returns `None` when not a single cell could be filled.
    pub async fn compose(
        &self,
        directory: &Path,
        files: &[(&str, &FileRef)],
        cache: &DirectoryCache,
        metadata: &MosaicMetadata,
    ) -> Result<Option<Mosaic>> {
        let mut candidates: Vec<&FileRef> = files
            .iter()
            .filter(|(key, _)| cache.get(*key).map_or(true, |e| e.dimensions.is_known()))
            .map(|(_, file)| *file)
            .collect();

        candidates.shuffle(&mut rand::rng());
        candidates.truncate(self.layout.slots());

        let mut cells: Vec<(usize, DynamicImage)> = Vec::with_capacity(candidates.len());
        for (slot, file) in candidates.into_iter().enumerate() {
            if let Some(image) = self.load(file).await {
                cells.push((slot, image));
            }
        }

        if cells.is_empty() {
            debug!("Nothing usable for a mosaic of {:?}", directory);
            return Ok(None);
        }

        let layout = self.layout;
        let quality = self.quality;
        let metadata = metadata.clone();
        let mosaic = tokio::task::spawn_blocking(move || -> Result<Mosaic> {
            let cells_filled = cells.len();
            let canvas = Self::paint(layout, cells);
            let mut bytes = Vec::new();
            JpegEncoder::new_with_quality(&mut bytes, quality).encode_image(&canvas)?;
            trailer::append(&mut bytes, &metadata)?;
            Ok(Mosaic {
                bytes,
                cells_filled,
            })
        })
        .await??;

        Ok(Some(mosaic))
    }

    async fn load(&self, file: &FileRef) -> Option<DynamicImage> {
        match file.kind {
            MediaKind::Video => {
                let edge = self.layout.cell_size;
                self.frames.extract_frame(&file.path, edge, edge).await
            }
            _ => {
                let path = file.path.clone();
                let decoded = tokio::task::spawn_blocking(move || {
                    ImageReader::open(&path)?
                        .with_guessed_format()?
                        .decode()
                        .map_err(anyhow::Error::from)
                })
                .await;

                match decoded {
                    Ok(Ok(image)) => Some(image),
                    Ok(Err(e)) => {
                        warn!("Failed decoding {:?}: {:#}", file.path, e);
                        None
                    }
                    Err(e) => {
                        warn!("Decoding {:?} did not finish: {}", file.path, e);
                        None
                    }
                }
            }
        }
    }

    /// Resizes the cells in parallel and places them on a black canvas.
    fn paint(layout: GridLayout, cells: Vec<(usize, DynamicImage)>) -> RgbImage {
        let resized: Vec<(usize, RgbImage)> = cells
            .into_par_iter()
            .filter_map(|(slot, image)| match cover_fit(image, layout.cell_size) {
                Ok(cell) => Some((slot, cell)),
                Err(e) => {
                    warn!("Failed resizing cell {}: {}", slot, e);
                    None
                }
            })
            .collect();

        let edge = layout.canvas_size();
        let mut canvas = RgbImage::new(edge, edge);
        for (slot, cell) in resized {
            let (x, y) = layout.position(slot);
            imageops::replace(&mut canvas, &cell, x.into(), y.into());
        }
        canvas
    }
}

/// Scales `image` to cover an `edge` x `edge` square and crops the centre.
pub fn cover_fit(image: DynamicImage, edge: u32) -> Result<RgbImage> {
    // The source, destination, and encoder must all agree on the pixel
    // type. RGB8 throughout; thumbnails have no use for alpha.
    let src_image = DynamicImage::ImageRgb8(image.into_rgb8());

    let mut dst_image = Image::new(edge, edge, fr::PixelType::U8x3);

    let mut resizer = Resizer::new();
    resizer.resize(
        &src_image,
        &mut dst_image,
        &ResizeOptions::new().fit_into_destination(Some((0.5, 0.5))),
    )?;

    into_cell(dst_image.into_vec(), edge)
}

fn into_cell(buffer: Vec<u8>, edge: u32) -> Result<RgbImage> {
    let actual = buffer.len();
    RgbImage::from_raw(edge, edge, buffer).ok_or(Error::CellBuffer {
        edge,
        expected: edge as usize * edge as usize * 3,
        actual,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheEntry, Dimensions, FileStat};
    use image::Rgb;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn layout() -> GridLayout {
        GridLayout {
            columns: 2,
            cell_size: 32,
        }
    }

    fn composer() -> Composer {
        Composer::new(&Config {
            cell_size: 32,
            ..Config::default()
        })
    }

    fn picture(dir: &Path, name: &str, colour: [u8; 3]) -> FileRef {
        let path = dir.join(name);
        RgbImage::from_pixel(40, 20, Rgb(colour)).save(&path).unwrap();
        FileRef {
            path,
            relative_path: name.to_string(),
            kind: MediaKind::Image,
        }
    }

    fn metadata() -> MosaicMetadata {
        MosaicMetadata::new(DirectoryCache::new(), BTreeMap::new())
    }

    #[test]
    fn slots_fill_row_by_row() {
        let layout = layout();
        assert_eq!(4, layout.slots());
        assert_eq!(64, layout.canvas_size());
        assert_eq!((0, 0), layout.position(0));
        assert_eq!((32, 0), layout.position(1));
        assert_eq!((0, 32), layout.position(2));
        assert_eq!((32, 32), layout.position(3));
    }

    #[test]
    fn cover_fit_fills_the_cell() {
        let wide = DynamicImage::ImageRgb8(RgbImage::from_pixel(90, 30, Rgb([200, 10, 10])));
        let cell = cover_fit(wide, 32).unwrap();
        assert_eq!((32, 32), cell.dimensions());
        let Rgb([r, g, b]) = *cell.get_pixel(16, 16);
        assert!(r.abs_diff(200) <= 2 && g.abs_diff(10) <= 2 && b.abs_diff(10) <= 2);
    }

    #[test]
    fn short_buffer_is_an_error() {
        assert!(into_cell(vec![0; 32 * 32 * 3], 32).is_ok());
        assert!(matches!(
            into_cell(vec![0; 10], 32),
            Err(Error::CellBuffer { actual: 10, .. })
        ));
    }

    #[tokio::test]
    async fn composes_a_decodable_jpeg_with_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            picture(dir.path(), "Dog.png", [255, 0, 0]),
            picture(dir.path(), "Frog.png", [0, 255, 0]),
        ];
        let keyed: Vec<(&str, &FileRef)> =
            files.iter().map(|f| (f.relative_path.as_str(), f)).collect();

        let mosaic = composer()
            .compose(dir.path(), &keyed, &DirectoryCache::new(), &metadata())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(2, mosaic.cells_filled);
        let decoded = image::load_from_memory(&mosaic.bytes).unwrap();
        assert_eq!((64, 64), (decoded.width(), decoded.height()));
        assert_eq!(metadata(), trailer::extract(&mosaic.bytes).unwrap());
    }

    #[tokio::test]
    async fn nothing_decodable_means_no_mosaic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"garbage").unwrap();
        let broken = FileRef {
            path,
            relative_path: String::from("broken.jpg"),
            kind: MediaKind::Image,
        };

        let mosaic = composer()
            .compose(
                dir.path(),
                &[("broken.jpg", &broken)],
                &DirectoryCache::new(),
                &metadata(),
            )
            .await
            .unwrap();
        assert!(mosaic.is_none());
    }

    #[tokio::test]
    async fn known_bad_files_are_not_drawn() {
        let dir = tempfile::tempdir().unwrap();
        let good = picture(dir.path(), "Sandow.png", [0, 0, 255]);
        let bad = FileRef {
            path: PathBuf::from("/definitely/not/here.jpg"),
            relative_path: String::from("here.jpg"),
            kind: MediaKind::Image,
        };

        let mut cache = DirectoryCache::new();
        cache.insert(
            String::from("here.jpg"),
            CacheEntry::new(FileStat::default(), Dimensions::UNKNOWN),
        );

        // One slot only: if the bad file could be drawn, some runs would fail.
        let composer = Composer::new(&Config {
            grid_columns: 1,
            cell_size: 32,
            ..Config::default()
        });
        for _ in 0..8 {
            let mosaic = composer
                .compose(
                    dir.path(),
                    &[("here.jpg", &bad), ("Sandow.png", &good)],
                    &cache,
                    &metadata(),
                )
                .await
                .unwrap();
            assert_eq!(1, mosaic.unwrap().cells_filled);
        }
    }
}
