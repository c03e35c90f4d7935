use crate::gid::TileId;

/// A layer's CSV payload reshaped to the map grid, plus what had to be repaired.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedCells {
    /// `cols * rows` masked GIDs, row-major.
    pub cells: Vec<u32>,
    /// Tokens that were not unsigned integers (stored as 0).
    pub malformed: usize,
    /// Cells with no token at all (zero-padded).
    pub missing: usize,
    /// Tokens past the end of the grid (dropped).
    pub extra: usize,
    /// Cells that carried flip/rotation bits.
    pub transformed: usize,
}

impl DecodedCells {
    /// Anything had to be repaired.
    pub fn is_degraded(&self) -> bool {
        self.malformed > 0 || self.missing > 0 || self.extra > 0
    }
}

/// Decode comma-separated cell values into a `cols x rows` grid.
///
/// Never fails: garbage tokens become 0, short data is zero-padded and
/// overlong data is truncated.
pub fn decode_csv_cells(text: &str, cols: u32, rows: u32) -> DecodedCells {
    let len = cols as usize * rows as usize;
    let mut out = DecodedCells {
        cells: Vec::with_capacity(len),
        ..Default::default()
    };

    let text = text.trim();
    let mut tokens: Vec<&str> = if text.is_empty() {
        Vec::new()
    } else {
        text.split(',').map(str::trim).collect()
    };
    // Tiled ends every row with a comma; tolerate one trailing separator
    if tokens.last() == Some(&"") {
        tokens.pop();
    }

    for token in tokens {
        if out.cells.len() == len {
            out.extra += 1;
            continue;
        }
        match token.parse::<u32>() {
            Ok(raw) => {
                let id = TileId(raw);
                if id.is_transformed() {
                    out.transformed += 1;
                }
                out.cells.push(id.clean());
            }
            Err(_) => {
                out.malformed += 1;
                out.cells.push(0);
            }
        }
    }

    out.missing = len - out.cells.len();
    out.cells.resize(len, 0);
    out
}
