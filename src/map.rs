use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use macroquad::math::{vec2, Vec2};
use macroquad::texture::Image;
use tracing::{debug, info, warn};

use crate::config::LoaderConfig;
use crate::error::MapError;
use crate::ir_map::*;
use crate::layer::{Layer, LayerRole, LayerStore, NO_ZONE};
use crate::loader::tmx_loader::{decode_map_file_to_ir, decode_map_str_to_ir};
use crate::render::{visible_tile_region, DrawStats, TileRegion, TileSurface, WorldRenderer};
use crate::tileset::{TileSetImage, TileSetRegistry};
use crate::view::Viewport;

/// GID of the palette sheet in a generated placeholder map.
pub const PLACEHOLDER_PALETTE_GID: u32 = 1;
/// GID of the checkerboard sheet in a generated placeholder map.
pub const PLACEHOLDER_CHECKER_GID: u32 = 5;

/// A loaded tile map: tilesets, role-tagged layers and the gameplay queries over them.
///
/// Everything here is CPU-side, so a `Map` can be built and queried without a
/// window. Drawing goes through a [`TileSurface`].
#[derive(Debug, Clone)]
pub struct Map {
    tile_w: u32,
    tile_h: u32,
    cols: u32,
    rows: u32,
    properties: Properties,
    tilesets: TileSetRegistry,
    layers: LayerStore,
    placeholder: bool,
}

impl Map {
    /// Empty map of `cols x rows` tiles using `tilesets`. Add layers with [`Map::push_layer`].
    pub fn new(tile_w: u32, tile_h: u32, cols: u32, rows: u32, tilesets: TileSetRegistry) -> Self {
        Self {
            tile_w,
            tile_h,
            cols,
            rows,
            properties: Properties::new(),
            tilesets,
            layers: LayerStore::new(cols, rows),
            placeholder: false,
        }
    }

    /// Append a layer; it is reshaped to the map size if needed.
    pub fn push_layer(&mut self, layer: Layer) -> usize {
        self.layers.push(layer)
    }

    /// Load a `.tmx` map with default loader settings.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MapError> {
        Self::load_with(path, &LoaderConfig::default())
    }

    /// Load a `.tmx` map, looking up missing images per `cfg`.
    pub fn load_with(path: impl AsRef<Path>, cfg: &LoaderConfig) -> Result<Self, MapError> {
        let path = path.as_ref();
        let ir = decode_map_file_to_ir(path)?;
        let map = Self::from_ir(ir, cfg);
        info!(
            path = %path.display(),
            cols = map.cols,
            rows = map.rows,
            layers = map.layers.len(),
            tilesets = map.tilesets.len(),
            "map loaded"
        );
        Ok(map)
    }

    /// Decode a TMX document held in memory; relative paths resolve against `base_dir`.
    pub fn load_from_str(xml: &str, base_dir: impl AsRef<Path>) -> Result<Self, MapError> {
        let base_dir = base_dir.as_ref();
        let ir = decode_map_str_to_ir(xml, base_dir, base_dir)?;
        Ok(Self::from_ir(ir, &LoaderConfig::default()))
    }

    /// Load `path`, or fall back to a generated map sized by `cfg.placeholder`.
    ///
    /// Never fails; the reason for a fallback is logged.
    pub fn load_or_placeholder(path: impl AsRef<Path>, cfg: &LoaderConfig) -> Self {
        let path = path.as_ref();
        match Self::load_with(path, cfg) {
            Ok(map) => map,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "map unavailable, generating placeholder");
                let p = cfg.placeholder;
                generate_placeholder(p.cols, p.rows, p.tile_width, p.tile_height)
            }
        }
    }

    /// Build runtime data from decoded IR. Missing images degrade to placeholder sheets.
    pub fn from_ir(ir: IrMap, cfg: &LoaderConfig) -> Self {
        let mut tilesets = TileSetRegistry::new();
        for ts in ir.tilesets {
            let first_gid = ts.first_gid;
            let sheet = tileset_from_ir(ts, cfg);
            debug!(first_gid, name = sheet.name(), placeholder = sheet.is_placeholder(), "tileset registered");
            tilesets.register(first_gid, sheet);
        }

        let mut map = Self::new(ir.tile_w, ir.tile_h, ir.cols, ir.rows, tilesets);
        map.properties = ir.properties;
        for layer in ir.layers {
            map.push_layer(Layer::from_ir(layer, ir.cols, ir.rows));
        }
        map
    }

    // ---- queries ----

    /// True when any collision layer has a non-empty cell at the tile. Outside the map is solid.
    pub fn is_solid(&self, tile_x: i32, tile_y: i32) -> bool {
        self.layers.is_solid(tile_x, tile_y)
    }

    /// [`Map::is_solid`] for the tile containing a world pixel.
    pub fn is_solid_at_pixel(&self, x: f32, y: f32) -> bool {
        match self.pixel_to_tile(x, y) {
            Some((tx, ty)) => self.is_solid(tx, ty),
            None => true,
        }
    }

    /// Zone id at a tile, [`NO_ZONE`] when unclassified or outside the map.
    pub fn zone_at(&self, tile_x: i32, tile_y: i32) -> u32 {
        self.layers.zone_at(tile_x, tile_y)
    }

    /// [`Map::zone_at`] for the tile containing a world pixel.
    pub fn zone_at_pixel(&self, x: f32, y: f32) -> u32 {
        self.pixel_to_tile(x, y)
            .map_or(NO_ZONE, |(tx, ty)| self.zone_at(tx, ty))
    }

    fn pixel_to_tile(&self, x: f32, y: f32) -> Option<(i32, i32)> {
        if !x.is_finite() || !y.is_finite() || self.tile_w == 0 || self.tile_h == 0 {
            return None;
        }
        let tx = (x / self.tile_w as f32).floor() as i32;
        let ty = (y / self.tile_h as f32).floor() as i32;
        Some((tx, ty))
    }

    // ---- rendering ----

    /// Draw ground then decoration layers. `None` draws the whole map.
    pub fn draw<S: TileSurface + ?Sized>(&self, surface: &mut S, viewport: Option<&Viewport>) -> DrawStats {
        WorldRenderer::default().draw(self, viewport, surface)
    }

    /// Tiles a draw pass would visit for `viewport`.
    pub fn visible_region(&self, viewport: Option<&Viewport>) -> TileRegion {
        visible_tile_region(
            self.cols,
            self.rows,
            self.tile_w,
            self.tile_h,
            viewport.map(Viewport::visible_rect),
        )
    }

    /// Show or hide every layer named `name`. Returns false when there is none.
    ///
    /// Only drawing is affected; collision and zone queries see hidden layers.
    pub fn set_layer_visible(&mut self, name: &str, visible: bool) -> bool {
        self.layers.set_visible(name, visible)
    }

    // ---- accessors ----

    /// Tile size in pixels.
    pub fn tile_size(&self) -> (u32, u32) {
        (self.tile_w, self.tile_h)
    }

    /// Size in tiles.
    pub fn size(&self) -> (u32, u32) {
        (self.cols, self.rows)
    }

    /// Width in pixels, saturating for hand-built maps past `u32::MAX`.
    pub fn pixel_width(&self) -> u32 {
        self.cols.saturating_mul(self.tile_w)
    }

    /// Height in pixels, saturating like [`Map::pixel_width`].
    pub fn pixel_height(&self) -> u32 {
        self.rows.saturating_mul(self.tile_h)
    }

    /// Size in pixels, as used for camera bounds.
    pub fn pixel_size(&self) -> Vec2 {
        vec2(self.pixel_width() as f32, self.pixel_height() as f32)
    }

    /// Registered tilesets.
    pub fn tilesets(&self) -> &TileSetRegistry {
        &self.tilesets
    }

    /// All layers.
    pub fn layers(&self) -> &LayerStore {
        &self.layers
    }

    /// Map-level custom properties.
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// True for maps made by [`generate_placeholder`].
    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }
}

/// A minimal drawable map with no files involved: a palette sheet at GID 1, a
/// checkerboard sheet at GID 5 and one ground layer alternating the two.
///
/// Zero arguments are raised to 1. There are no collision or zone layers.
pub fn generate_placeholder(cols: u32, rows: u32, tile_w: u32, tile_h: u32) -> Map {
    let (cols, rows) = (cols.max(1), rows.max(1));
    let (tile_w, tile_h) = (tile_w.max(1), tile_h.max(1));

    let mut tilesets = TileSetRegistry::new();
    tilesets.register(PLACEHOLDER_PALETTE_GID, TileSetImage::palette("placeholder", tile_w, tile_h));
    tilesets.register(
        PLACEHOLDER_CHECKER_GID,
        TileSetImage::checkerboard("placeholder-checker", tile_w, tile_h, 2, 2),
    );

    let cells = (0..rows)
        .flat_map(|y| (0..cols).map(move |x| (x, y)))
        .map(|(x, y)| {
            if (x + y) % 2 == 0 {
                PLACEHOLDER_PALETTE_GID
            } else {
                PLACEHOLDER_CHECKER_GID
            }
        })
        .collect();

    let mut map = Map::new(tile_w, tile_h, cols, rows, tilesets);
    map.push_layer(Layer::new("ground", LayerRole::Ground, cols, rows, cells));
    map.placeholder = true;
    map
}

fn tileset_from_ir(ts: IrTileset, cfg: &LoaderConfig) -> TileSetImage {
    let IrTileset {
        name,
        tile_w,
        tile_h,
        columns,
        tilecount,
        image,
        ..
    } = ts;
    let Some(img) = image else {
        return TileSetImage::palette(name, tile_w, tile_h);
    };

    let loaded = read_image(&img.path, cfg).and_then(|image| {
        TileSetImage::new(name.clone(), image, tile_w, tile_h)
            .ok_or_else(|| anyhow!("tileset '{name}' has zero tile size"))
    });
    match loaded {
        Ok(sheet) => sheet,
        Err(err) => {
            let (cols, rows) = placeholder_grid((tile_w, tile_h), columns, tilecount, &img);
            warn!(
                tileset = %name,
                path = %img.path.display(),
                error = %format!("{err:#}"),
                "tileset image unavailable, using checkerboard"
            );
            TileSetImage::checkerboard(name, tile_w, tile_h, cols, rows)
        }
    }
}

/// Tile grid for a stand-in image: declared pixel size, then columns/tilecount, then 2x2.
fn placeholder_grid(tile: (u32, u32), columns: Option<u32>, tilecount: Option<u32>, img: &IrImage) -> (u32, u32) {
    let (tw, th) = (tile.0.max(1), tile.1.max(1));
    if let (Some(w), Some(h)) = (img.width, img.height) {
        if w > 0 && h > 0 {
            return (w.div_ceil(tw), h.div_ceil(th));
        }
    }
    match (columns, tilecount) {
        (Some(c), Some(n)) if c > 0 && n > 0 => (c, n.div_ceil(c)),
        _ => (2, 2),
    }
}

fn read_image(path: &Path, cfg: &LoaderConfig) -> anyhow::Result<Image> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(primary) => {
            let fallback = fallback_path(path, cfg)
                .ok_or(primary)
                .with_context(|| format!("Reading image {}", path.display()))?;
            debug!(path = %fallback.display(), "retrying image in fallback dir");
            std::fs::read(&fallback).with_context(|| format!("Reading image {}", fallback.display()))?
        }
    };
    Image::from_file_with_format(&bytes, None)
        .map_err(|e| anyhow!("Decoding image {}: {e:?}", path.display()))
}

fn fallback_path(path: &Path, cfg: &LoaderConfig) -> Option<PathBuf> {
    let dir = cfg.asset_fallback_dir.as_ref()?;
    Some(dir.join(path.file_name()?))
}
