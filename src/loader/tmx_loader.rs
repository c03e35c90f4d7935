// src/loader/tmx_loader.rs
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::MapError;
use crate::ir_map::*;
use crate::layer::LayerRole;
use crate::loader::cells::decode_csv_cells;

/// Largest grid accepted per layer (4096 x 4096).
pub const MAX_LAYER_CELLS: u64 = 1 << 24;

#[derive(Deserialize)]
struct TmxMap {
    #[serde(rename = "@tilewidth")]
    tilewidth: u32,
    #[serde(rename = "@tileheight")]
    tileheight: u32,
    #[serde(rename = "@width")]
    width: u32,
    #[serde(rename = "@height")]
    height: u32,
    #[serde(default)]
    properties: Option<TmxProperties>,
    #[serde(default, rename = "tileset")]
    tilesets: Vec<TmxTileset>,
    #[serde(default, rename = "layer")]
    layers: Vec<TmxLayer>,
}

/// Used both for `<tileset>` inside a map and for the root of a `.tsx` document.
#[derive(Deserialize)]
struct TmxTileset {
    #[serde(default, rename = "@firstgid")]
    firstgid: Option<u32>,
    #[serde(default, rename = "@source")]
    source: Option<String>,
    #[serde(default, rename = "@name")]
    name: Option<String>,
    #[serde(default, rename = "@tilewidth")]
    tilewidth: Option<u32>,
    #[serde(default, rename = "@tileheight")]
    tileheight: Option<u32>,
    #[serde(default, rename = "@tilecount")]
    tilecount: Option<u32>,
    #[serde(default, rename = "@columns")]
    columns: Option<u32>,
    #[serde(default)]
    image: Option<TmxImage>,
}

#[derive(Deserialize)]
struct TmxImage {
    #[serde(rename = "@source")]
    source: String,
    #[serde(default, rename = "@width")]
    width: Option<u32>,
    #[serde(default, rename = "@height")]
    height: Option<u32>,
}

#[derive(Deserialize)]
struct TmxLayer {
    #[serde(default, rename = "@name")]
    name: String,
    #[serde(default, rename = "@visible")]
    visible: Option<String>,
    #[serde(default)]
    properties: Option<TmxProperties>,
    #[serde(default)]
    data: Option<TmxData>,
}

#[derive(Deserialize)]
struct TmxData {
    #[serde(default, rename = "@encoding")]
    encoding: Option<String>,
    #[serde(default, rename = "$text")]
    text: String,
}

#[derive(Deserialize, Default)]
struct TmxProperties {
    #[serde(default, rename = "property")]
    items: Vec<TmxProperty>,
}

#[derive(Deserialize)]
struct TmxProperty {
    #[serde(rename = "@name")]
    name: String,
    #[serde(default, rename = "@type")]
    kind: Option<String>,
    #[serde(default, rename = "@value")]
    value: Option<String>,
}

fn properties_from_tmx(props: Option<TmxProperties>) -> Properties {
    let mut out = Properties::new();
    for p in props.unwrap_or_default().items {
        let value = PropertyValue::from_tiled(p.kind.as_deref(), p.value.as_deref().unwrap_or(""));
        out.insert(p.name, value);
    }
    out
}

fn parse_xml<T: for<'de> Deserialize<'de>>(txt: &str, path: &Path) -> Result<T, MapError> {
    quick_xml::de::from_str(txt).map_err(|source| MapError::Xml {
        path: path.to_path_buf(),
        source,
    })
}

fn is_visible(attr: Option<&str>) -> bool {
    !matches!(attr.map(str::trim), Some("0") | Some("false"))
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

fn image_to_ir(img: TmxImage, doc_dir: &Path) -> IrImage {
    IrImage {
        path: doc_dir.join(img.source),
        width: img.width,
        height: img.height,
    }
}

fn tileset_to_ir(ts: TmxTileset, map: &TmxMap, map_path: &Path, map_dir: &Path) -> Result<IrTileset, MapError> {
    let first_gid = ts
        .firstgid
        .ok_or_else(|| MapError::invalid(map_path, "<tileset> without firstgid"))?;

    let Some(source) = non_empty(ts.source) else {
        // Inline declaration
        return Ok(IrTileset {
            first_gid,
            name: ts.name.unwrap_or_default(),
            tile_w: ts.tilewidth.unwrap_or(map.tilewidth),
            tile_h: ts.tileheight.unwrap_or(map.tileheight),
            columns: ts.columns,
            tilecount: ts.tilecount,
            image: ts.image.map(|img| image_to_ir(img, map_dir)),
        });
    };

    let ts_path = map_dir.join(&source);
    let ext_txt = match std::fs::read_to_string(&ts_path) {
        Ok(txt) => txt,
        Err(source) => {
            let err = MapError::from_io(&ts_path, source);
            if !err.is_resource_not_found() {
                return Err(err);
            }
            warn!(path = %ts_path.display(), first_gid, "external tileset missing, using placeholder tiles");
            return Ok(IrTileset {
                first_gid,
                name: file_stem(&ts_path),
                tile_w: map.tilewidth,
                tile_h: map.tileheight,
                columns: None,
                tilecount: None,
                image: None,
            });
        }
    };
    let ext: TmxTileset = parse_xml(&ext_txt, &ts_path)?;

    let (Some(tile_w), Some(tile_h)) = (ext.tilewidth, ext.tileheight) else {
        return Err(MapError::invalid(&ts_path, "tileset without tilewidth/tileheight"));
    };

    // Image paths are relative to the .tsx, not the map
    let ts_dir = parent_dir(&ts_path);
    Ok(IrTileset {
        first_gid,
        name: ext.name.unwrap_or_else(|| file_stem(&ts_path)),
        tile_w,
        tile_h,
        columns: ext.columns,
        tilecount: ext.tilecount,
        image: ext.image.map(|img| image_to_ir(img, &ts_dir)),
    })
}

fn layer_to_ir(l: TmxLayer, cols: u32, rows: u32, map_path: &Path) -> Result<IrLayer, MapError> {
    let properties = properties_from_tmx(l.properties);
    let role = LayerRole::from_properties(&properties);
    let data = l
        .data
        .ok_or_else(|| MapError::invalid(map_path, format!("layer '{}' has no <data>", l.name)))?;

    let cells = match data.encoding.as_deref().map(str::trim) {
        None | Some("csv") => {
            let decoded = decode_csv_cells(&data.text, cols, rows);
            if decoded.is_degraded() {
                warn!(
                    layer = %l.name,
                    malformed = decoded.malformed,
                    missing = decoded.missing,
                    extra = decoded.extra,
                    "layer data repaired"
                );
            }
            if decoded.transformed > 0 {
                debug!(layer = %l.name, cells = decoded.transformed, "flip flags dropped");
            }
            decoded.cells
        }
        Some(other) => {
            warn!(layer = %l.name, encoding = other, "unsupported layer encoding, layer left empty");
            vec![0; cols as usize * rows as usize]
        }
    };

    debug!(layer = %l.name, ?role, "layer decoded");
    Ok(IrLayer {
        name: l.name,
        visible: is_visible(l.visible.as_deref()),
        role,
        properties,
        cells,
    })
}

fn parent_dir(p: &Path) -> PathBuf {
    p.parent()
        .map(|d| d.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./"))
}

fn file_stem(p: &Path) -> String {
    p.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Decode a TMX document already in memory. Relative tileset and image paths
/// resolve against `map_dir`; `map_path` is only used in error reports.
pub fn decode_map_str_to_ir(txt: &str, map_path: &Path, map_dir: &Path) -> Result<IrMap, MapError> {
    let mut j: TmxMap = parse_xml(txt, map_path)?;

    if j.tilewidth == 0 || j.tileheight == 0 {
        return Err(MapError::invalid(map_path, "tile dimensions must be non-zero"));
    }
    if j.width == 0 || j.height == 0 {
        return Err(MapError::invalid(map_path, "map dimensions must be non-zero"));
    }
    if j.width.checked_mul(j.tilewidth).is_none() || j.height.checked_mul(j.tileheight).is_none() {
        return Err(MapError::invalid(map_path, "map pixel size does not fit in 32 bits"));
    }
    match (j.width as u64).checked_mul(j.height as u64) {
        Some(cells) if cells <= MAX_LAYER_CELLS => {}
        _ => {
            return Err(MapError::invalid(
                map_path,
                format!("{}x{} cells exceeds the {MAX_LAYER_CELLS} cell limit", j.width, j.height),
            ))
        }
    }
    if j.layers.is_empty() {
        return Err(MapError::invalid(map_path, "no <layer> elements"));
    }

    let tilesets = std::mem::take(&mut j.tilesets);
    let mut ir_tilesets = Vec::with_capacity(tilesets.len());
    for ts in tilesets {
        let ir = tileset_to_ir(ts, &j, map_path, map_dir)?;
        debug!(first_gid = ir.first_gid, name = %ir.name, "tileset declared");
        ir_tilesets.push(ir);
    }

    let layers = std::mem::take(&mut j.layers);
    let mut ir_layers = Vec::with_capacity(layers.len());
    for l in layers {
        ir_layers.push(layer_to_ir(l, j.width, j.height, map_path)?);
    }

    Ok(IrMap {
        tile_w: j.tilewidth,
        tile_h: j.tileheight,
        cols: j.width,
        rows: j.height,
        properties: properties_from_tmx(j.properties.take()),
        tilesets: ir_tilesets,
        layers: ir_layers,
    })
}

/// Read and decode a `.tmx` file. Relative paths resolve against its directory.
pub fn decode_map_file_to_ir(path: &Path) -> Result<IrMap, MapError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    if !matches!(ext.as_deref(), Some("tmx") | Some("xml")) {
        return Err(MapError::UnsupportedFormat(path.to_path_buf()));
    }

    let txt = std::fs::read_to_string(path).map_err(|source| MapError::from_io(path, source))?;
    let map_dir = parent_dir(path);
    decode_map_str_to_ir(&txt, path, &map_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock went backwards")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("mq_tile_world_{nanos}"));
        fs::create_dir_all(&dir).expect("failed to create temp dir");
        dir
    }

    const MAP_TMX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<map version="1.10" orientation="orthogonal" width="3" height="2" tilewidth="16" tileheight="16">
 <properties>
  <property name="music" value="overworld"/>
  <property name="encounters" type="bool" value="true"/>
 </properties>
 <tileset firstgid="1" source="tiles/terrain.tsx"/>
 <tileset firstgid="300" name="inline" tilewidth="16" tileheight="16"/>
 <layer id="1" name="Ground" width="3" height="2">
  <data encoding="csv">
1,2,3,
2147483652,5,6
</data>
 </layer>
 <objectgroup id="9" name="spawns"/>
 <layer id="2" name="Walls" width="3" height="2" visible="0">
  <properties>
   <property name="type" type="int" value="2"/>
  </properties>
  <data encoding="csv">0,1,0</data>
 </layer>
</map>"#;

    const TERRAIN_TSX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<tileset version="1.10" name="terrain" tilewidth="16" tileheight="16" tilecount="64" columns="8">
 <image source="terrain.png" width="128" height="128"/>
 <wangsets/>
</tileset>"#;

    fn write_fixture(dir: &Path) -> PathBuf {
        fs::create_dir_all(dir.join("tiles")).expect("failed to create tiles dir");
        let map_path = dir.join("world.tmx");
        fs::write(&map_path, MAP_TMX).expect("failed to write map");
        fs::write(dir.join("tiles/terrain.tsx"), TERRAIN_TSX).expect("failed to write tileset");
        map_path
    }

    #[test]
    fn decodes_map_tilesets_and_layers() {
        let dir = temp_dir();
        let map_path = write_fixture(&dir);

        let ir = decode_map_file_to_ir(&map_path).expect("decode");
        assert_eq!((ir.tile_w, ir.tile_h, ir.cols, ir.rows), (16, 16, 3, 2));
        assert_eq!(ir.properties.get_string("music"), Some("overworld"));
        assert_eq!(ir.properties.get_bool("encounters"), Some(true));

        assert_eq!(ir.tilesets.len(), 2);
        let terrain = &ir.tilesets[0];
        assert_eq!((terrain.first_gid, terrain.name.as_str()), (1, "terrain"));
        assert_eq!((terrain.columns, terrain.tilecount), (Some(8), Some(64)));
        let image = terrain.image.as_ref().expect("terrain has an image");
        assert_eq!(image.path, dir.join("tiles").join("terrain.png"));
        assert_eq!((image.width, image.height), (Some(128), Some(128)));

        let inline = &ir.tilesets[1];
        assert_eq!(inline.first_gid, 300);
        assert!(inline.image.is_none());

        assert_eq!(ir.layers.len(), 2);
        let ground = &ir.layers[0];
        assert_eq!(ground.role, LayerRole::Ground);
        assert!(ground.visible);
        assert_eq!(ground.cells, vec![1, 2, 3, 4, 5, 6]);

        let walls = &ir.layers[1];
        assert_eq!(walls.role, LayerRole::Collision);
        assert!(!walls.visible);
        assert_eq!(walls.cells, vec![0, 1, 0, 0, 0, 0]);
    }

    #[test]
    fn missing_map_is_resource_not_found() {
        let dir = temp_dir();
        let err = decode_map_file_to_ir(&dir.join("nope.tmx"))
            .err()
            .expect("expected decode error");
        assert!(err.is_resource_not_found());
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = decode_map_file_to_ir(Path::new("level.json"))
            .err()
            .expect("expected decode error");
        assert!(matches!(err, MapError::UnsupportedFormat(_)));
    }

    #[test]
    fn non_numeric_dimension_is_format_error() {
        let txt = r#"<map width="ten" height="2" tilewidth="16" tileheight="16">
 <layer name="g"><data encoding="csv">0</data></layer></map>"#;
        let err = decode_map_str_to_ir(txt, Path::new("bad.tmx"), Path::new("."))
            .err()
            .expect("expected decode error");
        assert!(matches!(err, MapError::Xml { .. }));
        assert!(err.is_format_error());
    }

    #[test]
    fn missing_dimension_is_format_error() {
        let txt = r#"<map height="2" tilewidth="16" tileheight="16">
 <layer name="g"><data encoding="csv">0</data></layer></map>"#;
        let err = decode_map_str_to_ir(txt, Path::new("bad.tmx"), Path::new("."))
            .err()
            .expect("expected decode error");
        assert!(err.is_format_error());
    }

    #[test]
    fn map_without_layers_is_invalid() {
        let txt = r#"<map width="2" height="2" tilewidth="16" tileheight="16"></map>"#;
        let err = decode_map_str_to_ir(txt, Path::new("empty.tmx"), Path::new("."))
            .err()
            .expect("expected decode error");
        assert!(matches!(err, MapError::InvalidMap { .. }));
    }

    #[test]
    fn layer_without_data_is_invalid() {
        let txt = r#"<map width="2" height="2" tilewidth="16" tileheight="16">
 <layer name="hollow"/></map>"#;
        let err = decode_map_str_to_ir(txt, Path::new("hollow.tmx"), Path::new("."))
            .err()
            .expect("expected decode error");
        assert!(err.to_string().contains("hollow"));
    }

    #[test]
    fn malformed_type_property_defaults_to_ground() {
        let txt = r#"<map width="2" height="1" tilewidth="8" tileheight="8">
 <layer name="odd">
  <properties><property name="type" value="lava"/></properties>
  <data encoding="csv">1,1</data>
 </layer>
 <layer name="zones">
  <properties><property name="type" value="3"/></properties>
  <data encoding="csv">770,0</data>
 </layer>
</map>"#;
        let ir = decode_map_str_to_ir(txt, Path::new("odd.tmx"), Path::new(".")).expect("decode");
        assert_eq!(ir.layers[0].role, LayerRole::Ground);
        assert_eq!(ir.layers[1].role, LayerRole::Zone);
    }

    #[test]
    fn truncated_layer_data_is_padded() {
        let txt = r#"<map width="3" height="3" tilewidth="8" tileheight="8">
 <layer name="short"><data encoding="csv">1,2,oops,4</data></layer>
</map>"#;
        let ir = decode_map_str_to_ir(txt, Path::new("short.tmx"), Path::new(".")).expect("decode");
        assert_eq!(ir.layers[0].cells, vec![1, 2, 0, 4, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn base64_layer_is_left_empty() {
        let txt = r#"<map width="2" height="1" tilewidth="8" tileheight="8">
 <layer name="packed"><data encoding="base64">AQAAAAEAAAA=</data></layer>
</map>"#;
        let ir = decode_map_str_to_ir(txt, Path::new("packed.tmx"), Path::new(".")).expect("decode");
        assert_eq!(ir.layers[0].cells, vec![0, 0]);
    }

    #[test]
    fn missing_external_tileset_becomes_placeholder() {
        let dir = temp_dir();
        let map_path = dir.join("map.tmx");
        fs::write(
            &map_path,
            r#"<map width="1" height="1" tilewidth="32" tileheight="24">
 <tileset firstgid="1" source="gone.tsx"/>
 <layer name="g"><data encoding="csv">1</data></layer>
</map>"#,
        )
        .expect("failed to write map");

        let ir = decode_map_file_to_ir(&map_path).expect("decode");
        let ts = &ir.tilesets[0];
        assert_eq!((ts.tile_w, ts.tile_h), (32, 24));
        assert_eq!(ts.name, "gone");
        assert!(ts.image.is_none());
    }

    #[test]
    fn malformed_external_tileset_is_format_error() {
        let dir = temp_dir();
        let map_path = dir.join("map.tmx");
        fs::write(
            &map_path,
            r#"<map width="1" height="1" tilewidth="16" tileheight="16">
 <tileset firstgid="1" source="broken.tsx"/>
 <layer name="g"><data encoding="csv">1</data></layer>
</map>"#,
        )
        .expect("failed to write map");
        fs::write(dir.join("broken.tsx"), r#"<tileset name="broken" columns="4"></tileset>"#)
            .expect("failed to write tileset");

        let err = decode_map_file_to_ir(&map_path)
            .err()
            .expect("expected decode error");
        assert!(matches!(err, MapError::InvalidMap { .. }));
    }

    #[test]
    fn oversized_dimensions_are_invalid() {
        let layer = r#"<layer name="g"><data encoding="csv">0</data></layer>"#;
        for attrs in [
            r#"width="70000" height="1" tilewidth="70000" tileheight="16""#,
            r#"width="1" height="300000" tilewidth="16" tileheight="20000""#,
            r#"width="100000" height="100000" tilewidth="1" tileheight="1""#,
        ] {
            let txt = format!("<map {attrs}>{layer}</map>");
            let err = decode_map_str_to_ir(&txt, Path::new("huge.tmx"), Path::new("."))
                .err()
                .expect("expected decode error");
            assert!(matches!(err, MapError::InvalidMap { .. }), "{attrs}");
        }

        let txt = format!(r#"<map width="4096" height="4096" tilewidth="16" tileheight="16">{layer}</map>"#);
        let ir = decode_map_str_to_ir(&txt, Path::new("big.tmx"), Path::new(".")).expect("largest grid decodes");
        assert_eq!(ir.layers[0].cells.len(), 1 << 24);
    }
}
