use crate::ir_map::{IrLayer, Properties};

/// Semantic purpose of a layer, read from its `type` property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub enum LayerRole {
    /// Drawn first.
    #[default]
    Ground,
    /// Drawn over ground.
    Decoration,
    /// Never drawn; any non-zero cell blocks movement.
    Collision,
    /// Never drawn; cells classify the world into zones.
    Zone,
}

impl LayerRole {
    /// Roles that produce pixels, in draw order.
    pub const DRAWN: [LayerRole; 2] = [LayerRole::Ground, LayerRole::Decoration];

    /// Map the numeric `type` code; anything unknown is ground.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => LayerRole::Decoration,
            2 => LayerRole::Collision,
            3 => LayerRole::Zone,
            _ => LayerRole::Ground,
        }
    }

    /// Role selected by a layer's `type` property, defaulting to ground.
    pub fn from_properties(props: &Properties) -> Self {
        props
            .get_int_lossy("type")
            .map(Self::from_code)
            .unwrap_or_default()
    }

    /// Ground and decoration layers produce pixels.
    pub fn is_drawn(self) -> bool {
        matches!(self, LayerRole::Ground | LayerRole::Decoration)
    }

    fn bucket(self) -> usize {
        self as usize
    }
}

/// Zone id meaning "no zone".
pub const NO_ZONE: u32 = 0;

// Zone tiles live in one specific tileset of the shipped world.
const ZONE_TABLE: [(u32, u32); 4] = [(769, 1), (770, 2), (771, 3), (772, 4)];

/// Zone id for a raw zone-layer GID; unknown GIDs are [`NO_ZONE`].
pub fn classify_zone(gid: u32) -> u32 {
    ZONE_TABLE
        .iter()
        .find(|(g, _)| *g == gid)
        .map(|(_, zone)| *zone)
        .unwrap_or(NO_ZONE)
}

/// One `rows x cols` grid of masked GIDs.
#[derive(Debug, Clone)]
pub struct Layer {
    /// Layer name from the document.
    pub name: String,
    /// Drawing switch; queries ignore it.
    pub visible: bool,
    /// What the layer is used for.
    pub role: LayerRole,
    /// Custom properties.
    pub properties: Properties,
    cols: u32,
    rows: u32,
    cells: Vec<u32>,
}

impl Layer {
    /// Build a layer, zero-padding or truncating `cells` to `cols * rows`.
    pub fn new(name: impl Into<String>, role: LayerRole, cols: u32, rows: u32, mut cells: Vec<u32>) -> Self {
        cells.resize(cols as usize * rows as usize, 0);
        Self {
            name: name.into(),
            visible: true,
            role,
            properties: Properties::new(),
            cols,
            rows,
            cells,
        }
    }

    pub(crate) fn from_ir(ir: IrLayer, cols: u32, rows: u32) -> Self {
        let mut layer = Self::new(ir.name, ir.role, cols, rows, ir.cells);
        layer.visible = ir.visible;
        layer.properties = ir.properties;
        layer
    }

    /// Size in tiles.
    pub fn size(&self) -> (u32, u32) {
        (self.cols, self.rows)
    }

    /// GID at `(x, y)`, `None` outside the grid.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<u32> {
        if x < 0 || y < 0 || x as u32 >= self.cols || y as u32 >= self.rows {
            return None;
        }
        Some(self.cells[y as usize * self.cols as usize + x as usize])
    }

    /// Overwrite one cell. Returns `false` outside the grid.
    pub fn set(&mut self, x: u32, y: u32, gid: u32) -> bool {
        if x >= self.cols || y >= self.rows {
            return false;
        }
        self.cells[y as usize * self.cols as usize + x as usize] = gid;
        true
    }

    /// Row-major GIDs.
    pub fn cells(&self) -> &[u32] {
        &self.cells
    }

    /// Row `y`. Panics if `y >= rows`.
    #[inline]
    pub fn row(&self, y: u32) -> &[u32] {
        let start = y as usize * self.cols as usize;
        &self.cells[start..start + self.cols as usize]
    }
}

/// All layers of a map, in registration order, bucketed by role.
#[derive(Debug, Clone, Default)]
pub struct LayerStore {
    cols: u32,
    rows: u32,
    layers: Vec<Layer>,
    by_role: [Vec<usize>; 4],
}

impl LayerStore {
    /// Empty store for a `cols x rows` map.
    pub fn new(cols: u32, rows: u32) -> Self {
        Self {
            cols,
            rows,
            ..Self::default()
        }
    }

    /// Append a layer; its grid is reshaped to the store's dimensions.
    pub fn push(&mut self, mut layer: Layer) -> usize {
        if layer.size() != (self.cols, self.rows) {
            let cells = reshape(&layer, self.cols, self.rows);
            layer = Layer {
                cells,
                cols: self.cols,
                rows: self.rows,
                ..layer
            };
        }
        let idx = self.layers.len();
        self.by_role[layer.role.bucket()].push(idx);
        self.layers.push(layer);
        idx
    }

    /// Size in tiles.
    pub fn size(&self) -> (u32, u32) {
        (self.cols, self.rows)
    }

    /// Number of layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// True when the map has no layers.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Every layer in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    /// Layers with `role`, in registration order.
    pub fn with_role(&self, role: LayerRole) -> impl Iterator<Item = &Layer> + '_ {
        self.by_role[role.bucket()].iter().map(move |&i| &self.layers[i])
    }

    /// Number of layers with `role`.
    pub fn count(&self, role: LayerRole) -> usize {
        self.by_role[role.bucket()].len()
    }

    /// First layer called `name`.
    pub fn find(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    /// Toggle every layer called `name`. Returns `false` when none matched.
    pub fn set_visible(&mut self, name: &str, visible: bool) -> bool {
        let mut hit = false;
        for layer in self.layers.iter_mut().filter(|l| l.name == name) {
            layer.visible = visible;
            hit = true;
        }
        hit
    }

    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.cols && (y as u32) < self.rows
    }

    /// Out-of-bounds cells are solid; otherwise any collision layer with a non-zero cell blocks.
    pub fn is_solid(&self, x: i32, y: i32) -> bool {
        if !self.in_bounds(x, y) {
            return true;
        }
        self.with_role(LayerRole::Collision)
            .any(|l| l.get(x, y).unwrap_or(0) != 0)
    }

    /// Zone of the first zone layer with a non-empty cell at `(x, y)`.
    pub fn zone_at(&self, x: i32, y: i32) -> u32 {
        if !self.in_bounds(x, y) {
            return NO_ZONE;
        }
        self.with_role(LayerRole::Zone)
            .filter_map(|l| l.get(x, y))
            .find(|&gid| gid != 0)
            .map(classify_zone)
            .unwrap_or(NO_ZONE)
    }
}

fn reshape(layer: &Layer, cols: u32, rows: u32) -> Vec<u32> {
    let mut out = vec![0; cols as usize * rows as usize];
    for y in 0..rows.min(layer.rows) {
        for x in 0..cols.min(layer.cols) {
            out[(y * cols + x) as usize] = layer.cells[(y * layer.cols + x) as usize];
        }
    }
    out
}
