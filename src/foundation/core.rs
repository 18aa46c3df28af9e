use crate::foundation::error::{PixelError, PixelResult};
use crate::foundation::math::{
    OPAQUE_OPACITY, QUANTUM_MAX, QUANTUM_RANGE, QUANTUM_SCALE, Quantum, clamp_to_quantum,
};

/// Colorspace tag carried by images and working pixels.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Colorspace {
    /// Additive red/green/blue.
    #[default]
    Rgb,
    /// Single-channel gray stored broadcast into red/green/blue.
    Gray,
    /// Subtractive cyan/magenta/yellow in red/green/blue, black in the index channel.
    Cmyk,
    /// Any other model; treated like RGB by the compositing algebra.
    Other,
}

impl Colorspace {
    /// `true` for [`Colorspace::Cmyk`].
    pub fn is_cmyk(self) -> bool {
        matches!(self, Self::Cmyk)
    }
}

/// Stored pixel: color plus opacity (0 = opaque, [`QUANTUM_MAX`] = transparent).
///
/// The black/index channel lives in the image's side array, not here.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct PixelPacket {
    /// Red (or cyan).
    pub red: Quantum,
    /// Green (or magenta).
    pub green: Quantum,
    /// Blue (or yellow).
    pub blue: Quantum,
    /// Legacy opacity.
    pub opacity: Quantum,
}

impl PixelPacket {
    /// Opaque pixel with the given color.
    pub fn opaque(red: Quantum, green: Quantum, blue: Quantum) -> Self {
        Self {
            red,
            green,
            blue,
            opacity: OPAQUE_OPACITY,
        }
    }

    /// Fully transparent black.
    pub fn transparent() -> Self {
        Self {
            red: 0,
            green: 0,
            blue: 0,
            opacity: QUANTUM_MAX,
        }
    }

    /// Opaque gray.
    pub fn gray(v: Quantum) -> Self {
        Self::opaque(v, v, v)
    }

    /// Alpha in the conventional sense (`QUANTUM_MAX - opacity`).
    pub fn alpha(&self) -> Quantum {
        QUANTUM_MAX - self.opacity
    }

    /// Set opacity from a conventional alpha value.
    pub fn set_alpha(&mut self, alpha: Quantum) {
        self.opacity = QUANTUM_MAX - alpha;
    }

    pub(crate) fn set_gray(&mut self, v: Quantum) {
        self.red = v;
        self.green = v;
        self.blue = v;
    }
}

/// Working pixel in real arithmetic, used by the compositing algebra.
///
/// Channels are on the `[0, QUANTUM_RANGE]` scale but are not clamped; intermediate results may
/// leave that range.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MagickPixel {
    /// Colorspace tag; decides whether `index` participates.
    pub colorspace: Colorspace,
    /// Whether the opacity channel is meaningful.
    pub matte: bool,
    /// Red (or cyan).
    pub red: f64,
    /// Green (or magenta).
    pub green: f64,
    /// Blue (or yellow).
    pub blue: f64,
    /// Legacy opacity.
    pub opacity: f64,
    /// Black (CMYK) or palette index.
    pub index: f64,
}

impl MagickPixel {
    /// Opaque RGB working pixel.
    pub fn rgb(red: f64, green: f64, blue: f64) -> Self {
        Self {
            colorspace: Colorspace::Rgb,
            matte: false,
            red,
            green,
            blue,
            opacity: 0.0,
            index: 0.0,
        }
    }

    /// RGB working pixel with explicit opacity; sets `matte`.
    pub fn rgbo(red: f64, green: f64, blue: f64, opacity: f64) -> Self {
        Self {
            matte: true,
            opacity,
            ..Self::rgb(red, green, blue)
        }
    }

    /// Widen a stored pixel. Opacity is read only when `matte` is set.
    pub fn from_packet(p: &PixelPacket, index: Quantum, colorspace: Colorspace, matte: bool) -> Self {
        Self {
            colorspace,
            matte,
            red: f64::from(p.red),
            green: f64::from(p.green),
            blue: f64::from(p.blue),
            opacity: if matte { f64::from(p.opacity) } else { 0.0 },
            index: if colorspace.is_cmyk() {
                f64::from(index)
            } else {
                0.0
            },
        }
    }

    /// Narrow to storage, rounding and saturating every channel.
    pub fn to_packet(&self) -> PixelPacket {
        PixelPacket {
            red: clamp_to_quantum(self.red),
            green: clamp_to_quantum(self.green),
            blue: clamp_to_quantum(self.blue),
            opacity: clamp_to_quantum(self.opacity),
        }
    }

    /// Coverage `1 - opacity/QUANTUM_RANGE`.
    #[inline]
    pub fn coverage(&self) -> f64 {
        1.0 - QUANTUM_SCALE * self.opacity
    }

    /// `true` when opacity is exactly transparent.
    #[inline]
    pub fn is_transparent(&self) -> bool {
        self.opacity == QUANTUM_RANGE
    }

    /// Replace red/green/blue/index with `QUANTUM_RANGE - v`.
    pub(crate) fn invert_color(&mut self) {
        self.red = QUANTUM_RANGE - self.red;
        self.green = QUANTUM_RANGE - self.green;
        self.blue = QUANTUM_RANGE - self.blue;
        self.index = QUANTUM_RANGE - self.index;
    }
}

/// Caller-owned image buffer: row-major pixels plus optional index and colormap tables.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    /// Width in pixels.
    pub columns: usize,
    /// Height in pixels.
    pub rows: usize,
    /// Colorspace of the stored samples.
    pub colorspace: Colorspace,
    /// Whether the opacity channel is meaningful.
    pub matte: bool,
    /// Nominal sample depth of the source data (informational).
    pub depth: u32,
    /// Color-similarity tolerance on the quantum scale (ChangeMask).
    pub fuzz: f64,
    /// `columns * rows` pixels, row-major.
    pub pixels: Vec<PixelPacket>,
    /// Black channel (CMYK) or palette indexes, same shape as `pixels`.
    pub indexes: Option<Vec<Quantum>>,
    /// Palette for indexed images.
    pub colormap: Option<Vec<PixelPacket>>,
}

impl Image {
    /// Opaque black RGB image.
    pub fn new(columns: usize, rows: usize) -> PixelResult<Self> {
        Self::filled(columns, rows, PixelPacket::opaque(0, 0, 0))
    }

    /// Image with every pixel set to `fill`.
    pub fn filled(columns: usize, rows: usize, fill: PixelPacket) -> PixelResult<Self> {
        if columns == 0 || rows == 0 {
            return Err(PixelError::validation("image dimensions must be > 0"));
        }
        let len = columns
            .checked_mul(rows)
            .ok_or_else(|| PixelError::validation("image dimensions overflow"))?;
        Ok(Self {
            columns,
            rows,
            colorspace: Colorspace::Rgb,
            matte: fill.opacity != OPAQUE_OPACITY,
            depth: 16,
            fuzz: 0.0,
            pixels: vec![fill; len],
            indexes: None,
            colormap: None,
        })
    }

    /// Build from existing pixels; `pixels.len()` must equal `columns * rows`.
    pub fn from_pixels(columns: usize, rows: usize, pixels: Vec<PixelPacket>) -> PixelResult<Self> {
        let mut img = Self::filled(columns, rows, PixelPacket::default())?;
        if pixels.len() != img.pixels.len() {
            return Err(PixelError::validation(format!(
                "pixel buffer length {} does not match {columns}x{rows}",
                pixels.len()
            )));
        }
        img.matte = pixels.iter().any(|p| p.opacity != OPAQUE_OPACITY);
        img.pixels = pixels;
        Ok(img)
    }

    /// Set the colorspace; CMYK allocates a zeroed black channel.
    pub fn with_colorspace(mut self, colorspace: Colorspace) -> Self {
        self.colorspace = colorspace;
        if colorspace.is_cmyk() && self.indexes.is_none() {
            self.indexes = Some(vec![0; self.pixels.len()]);
        }
        self
    }

    /// Attach a palette; allocates a zeroed index channel.
    pub fn with_colormap(mut self, colormap: Vec<PixelPacket>) -> Self {
        self.colormap = Some(colormap);
        if self.indexes.is_none() {
            self.indexes = Some(vec![0; self.pixels.len()]);
        }
        self
    }

    /// Set the opacity-channel flag.
    pub fn with_matte(mut self, matte: bool) -> Self {
        self.matte = matte;
        self
    }

    /// Number of palette entries (0 without a colormap).
    pub fn colors(&self) -> usize {
        self.colormap.as_ref().map_or(0, Vec::len)
    }

    /// `true` for CMYK images.
    pub fn is_cmyk(&self) -> bool {
        self.colorspace.is_cmyk()
    }

    /// Pixel at `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> Option<PixelPacket> {
        if x >= self.columns || y >= self.rows {
            return None;
        }
        self.pixels.get(y * self.columns + x).copied()
    }

    /// Index/black value at `(x, y)`, 0 when the image has no index channel.
    pub fn index(&self, x: usize, y: usize) -> Quantum {
        if x >= self.columns || y >= self.rows {
            return 0;
        }
        self.indexes
            .as_ref()
            .and_then(|ix| ix.get(y * self.columns + x).copied())
            .unwrap_or(0)
    }

    /// Index/black value at flat offset `i`, 0 when absent.
    pub(crate) fn index_at(&self, i: usize) -> Quantum {
        self.indexes
            .as_ref()
            .and_then(|ix| ix.get(i).copied())
            .unwrap_or(0)
    }

    /// Overwrite the pixel at `(x, y)`; out-of-bounds writes are ignored.
    pub fn set_pixel(&mut self, x: usize, y: usize, p: PixelPacket) {
        if x < self.columns && y < self.rows {
            self.pixels[y * self.columns + x] = p;
        }
    }

    /// Row `y` as a slice.
    pub fn row(&self, y: usize) -> PixelResult<&[PixelPacket]> {
        let start = self.row_start(y)?;
        Ok(&self.pixels[start..start + self.columns])
    }

    /// Row `y` as a mutable slice.
    pub fn row_mut(&mut self, y: usize) -> PixelResult<&mut [PixelPacket]> {
        let start = self.row_start(y)?;
        let end = start + self.columns;
        Ok(&mut self.pixels[start..end])
    }

    /// Index/black row `y`, when the image has an index channel.
    pub fn index_row(&self, y: usize) -> Option<&[Quantum]> {
        let start = self.row_start(y).ok()?;
        self.indexes
            .as_deref()
            .map(|ix| &ix[start..start + self.columns])
    }

    /// Mutable pixel and index rows for `y`.
    pub fn row_parts_mut(
        &mut self,
        y: usize,
    ) -> PixelResult<(&mut [PixelPacket], Option<&mut [Quantum]>)> {
        let start = self.row_start(y)?;
        let end = start + self.columns;
        let pixels = &mut self.pixels[start..end];
        let indexes = self.indexes.as_deref_mut().map(|ix| &mut ix[start..end]);
        Ok((pixels, indexes))
    }

    /// Turn on the opacity channel, marking every pixel opaque.
    pub fn set_opaque_alpha(&mut self) {
        for p in &mut self.pixels {
            p.opacity = OPAQUE_OPACITY;
        }
        self.matte = true;
    }

    fn row_start(&self, y: usize) -> PixelResult<usize> {
        if y >= self.rows {
            return Err(PixelError::validation(format!(
                "row {y} out of bounds (rows={})",
                self.rows
            )));
        }
        Ok(y * self.columns)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
