use crate::composite::op::CompositeOp;
use crate::foundation::error::{PixelError, PixelResult};
use crate::foundation::math::{MAGICK_EPSILON, QUANTUM_RANGE};

/// Raw numeric argument vector for parametrized operators, e.g. `"50"`, `"60,40"` or `"1x0.5"`.
///
/// Up to four values, separated by `,`, `x`, `X` or `/`, optionally followed by up to two signed
/// offsets (`"5x3+45"`, `"+10-4"`). A `%` anywhere marks the values as percentages and a `!`
/// measures them against the canvas; operators without a use for either ignore them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompositeArgs {
    values: Vec<f64>,
    offsets: Vec<f64>,
    percent: bool,
    aspect: bool,
}

impl CompositeArgs {
    /// Wrap an already-parsed vector.
    pub fn new(values: Vec<f64>) -> PixelResult<Self> {
        if values.len() > 4 {
            return Err(PixelError::validation(format!(
                "composite args take at most 4 values, got {}",
                values.len()
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(PixelError::validation("composite args must be finite"));
        }
        Ok(Self {
            values,
            ..Self::default()
        })
    }

    /// Parsed values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Signed offsets following the values.
    pub fn offsets(&self) -> &[f64] {
        &self.offsets
    }

    /// `%` was given.
    pub fn percent(&self) -> bool {
        self.percent
    }

    /// `!` was given.
    pub fn aspect(&self) -> bool {
        self.aspect
    }

    fn get(&self, i: usize) -> Option<f64> {
        self.values.get(i).copied()
    }

    fn offset(&self, i: usize) -> Option<f64> {
        self.offsets.get(i).copied()
    }
}

impl std::str::FromStr for CompositeArgs {
    type Err = PixelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = |t: &str| {
            PixelError::validation(format!("invalid composite argument '{t}' in '{s}'"))
        };
        let cleaned: String = s.chars().filter(|c| !matches!(c, '%' | '!')).collect();
        let cleaned = cleaned.trim();
        let (head, tail) = cleaned.split_at(offsets_start(cleaned));

        let values = head
            .split([',', 'x', 'X', '/'])
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| t.parse::<f64>().map_err(|_| bad(t)))
            .collect::<PixelResult<Vec<_>>>()?;
        let offsets = sign_starts(tail)
            .windows(2)
            .map(|w| {
                let t = tail[w[0]..w[1]].trim();
                t.parse::<f64>().ok().filter(|v| v.is_finite()).ok_or_else(|| bad(t))
            })
            .collect::<PixelResult<Vec<_>>>()?;
        if values.is_empty() && offsets.is_empty() {
            return Err(PixelError::validation(format!(
                "composite args '{s}' contain no values"
            )));
        }
        if offsets.len() > 2 {
            return Err(PixelError::validation(format!(
                "composite args '{s}' take at most 2 offsets"
            )));
        }
        Ok(Self {
            offsets,
            percent: s.contains('%'),
            aspect: s.contains('!'),
            ..Self::new(values)?
        })
    }
}

/// Byte position where the offsets begin: the first `+`, or a `-` right after a digit.
fn offsets_start(s: &str) -> usize {
    let mut prev = None;
    for (i, c) in s.char_indices() {
        let after_number = prev.is_some_and(|p: char| p.is_ascii_digit() || p == '.');
        let exponent = matches!(prev, Some('e' | 'E'));
        if (c == '+' && !exponent) || (c == '-' && after_number) {
            return i;
        }
        prev = Some(c);
    }
    s.len()
}

/// Start of every signed number in `tail`, plus its end. Exponent signs do not start a number.
fn sign_starts(tail: &str) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut prev = None;
    for (i, c) in tail.char_indices() {
        if matches!(c, '+' | '-') && !matches!(prev, Some('e' | 'E')) {
            starts.push(i);
        }
        prev = Some(c);
    }
    if starts.is_empty() {
        return starts;
    }
    starts.push(tail.len());
    starts
}

/// Typed per-operator parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompositeParams {
    /// Operator takes no parameters.
    #[default]
    None,
    /// Coverage factors for Dissolve, each in `[0, 1]`.
    Dissolve {
        /// Source coverage factor.
        source: f64,
        /// Canvas coverage factor.
        canvas: f64,
    },
    /// Coverage factors for Blend.
    Blend {
        /// Source coverage factor.
        source: f64,
        /// Canvas coverage factor.
        canvas: f64,
    },
    /// `A*Sc*Dc + B*Sc + C*Dc + D`.
    Mathematics {
        /// Product coefficient.
        a: f64,
        /// Source coefficient.
        b: f64,
        /// Canvas coefficient.
        c: f64,
        /// Constant term.
        d: f64,
    },
    /// Luma/chroma scaling in percent.
    Modulate {
        /// Luma shift scale.
        luma_percent: f64,
        /// Chroma scale.
        chroma_percent: f64,
    },
    /// Threshold gate; `threshold` is on the quantum scale.
    Threshold {
        /// Fraction of the difference applied past the gate.
        amount: f64,
        /// Minimum doubled difference that moves the canvas.
        threshold: f64,
    },
    /// Color tolerance for ChangeMask, on the quantum scale.
    ChangeMask {
        /// Euclidean distance under which colors match.
        fuzz: f64,
    },
    /// Displacement-map scaling shared by Displace and Distort.
    Displacement {
        /// Horizontal shift at full map red; `None` spans half the map (or canvas) width.
        horizontal: Option<f64>,
        /// Vertical shift at full map green; `None` follows `horizontal`.
        vertical: Option<f64>,
        /// Scales are percentages of the map (or canvas) size.
        percent: bool,
        /// Measure scales and the Distort center against the canvas instead of the map.
        relative_to_canvas: bool,
        /// Distort center column; `None` is the middle of the map (or canvas).
        center_x: Option<f64>,
        /// Distort center row.
        center_y: Option<f64>,
    },
    /// Variable blur driven by a map: red and green scale the two ellipse axes.
    Blur {
        /// Horizontal sigma at full map red.
        sigma_x: f64,
        /// Vertical sigma at full map green.
        sigma_y: f64,
        /// Ellipse rotation in degrees.
        angle: Option<f64>,
        /// With `angle`, the rotation at full map blue; blue sweeps between the two.
        angle_end: Option<f64>,
    },
}

impl CompositeParams {
    /// Defaults used by `op` when no arguments are given.
    pub fn defaults_for(op: CompositeOp) -> Self {
        match op {
            CompositeOp::Dissolve => Self::Dissolve {
                source: 1.0,
                canvas: 1.0,
            },
            CompositeOp::Blend => Self::Blend {
                source: 1.0,
                canvas: 1.0,
            },
            CompositeOp::Mathematics => Self::Mathematics {
                a: 0.0,
                b: 0.0,
                c: 0.0,
                d: 0.0,
            },
            CompositeOp::Modulate => Self::Modulate {
                luma_percent: 100.0,
                chroma_percent: 100.0,
            },
            CompositeOp::Threshold => Self::Threshold {
                amount: 0.5,
                threshold: 0.05 * QUANTUM_RANGE,
            },
            CompositeOp::ChangeMask => Self::ChangeMask { fuzz: 0.0 },
            CompositeOp::Displace | CompositeOp::Distort => Self::Displacement {
                horizontal: None,
                vertical: None,
                percent: false,
                relative_to_canvas: false,
                center_x: None,
                center_y: None,
            },
            CompositeOp::Blur => Self::Blur {
                sigma_x: 0.0,
                sigma_y: 0.0,
                angle: None,
                angle_end: None,
            },
            _ => Self::None,
        }
    }

    /// Resolve `args` for `op`. Operators without parameters ignore `args`.
    ///
    /// Blur has no usable default and requires at least a sigma.
    pub fn from_args(op: CompositeOp, args: Option<&CompositeArgs>) -> PixelResult<Self> {
        let Some(args) = args else {
            if op == CompositeOp::Blur {
                return Err(blur_needs_sigma());
            }
            return Ok(Self::defaults_for(op));
        };
        let rho = args.get(0).unwrap_or(0.0);
        let sigma = args.get(1);
        let params = match op {
            CompositeOp::Dissolve => {
                let mut source = rho / 100.0;
                let mut canvas = 1.0;
                if source - MAGICK_EPSILON < 0.0 {
                    source = 0.0;
                }
                if source + MAGICK_EPSILON > 1.0 {
                    canvas = 2.0 - source;
                    source = 1.0;
                }
                if let Some(s) = sigma {
                    canvas = s / 100.0;
                }
                if canvas - MAGICK_EPSILON < 0.0 {
                    canvas = 0.0;
                }
                if canvas + MAGICK_EPSILON > 1.0 {
                    canvas = 1.0;
                }
                Self::Dissolve { source, canvas }
            }
            CompositeOp::Blend => {
                let source = rho / 100.0;
                let canvas = sigma.map_or(1.0 - source, |s| s / 100.0);
                Self::Blend { source, canvas }
            }
            CompositeOp::Mathematics => Self::Mathematics {
                a: rho,
                b: sigma.unwrap_or(0.0),
                c: args.get(2).unwrap_or(0.0),
                d: args.get(3).unwrap_or(0.0),
            },
            CompositeOp::Modulate => Self::Modulate {
                luma_percent: rho,
                chroma_percent: sigma.unwrap_or(100.0),
            },
            CompositeOp::Threshold => Self::Threshold {
                amount: rho,
                threshold: sigma.unwrap_or(0.05) * QUANTUM_RANGE,
            },
            CompositeOp::ChangeMask => Self::ChangeMask {
                fuzz: rho.max(0.0),
            },
            CompositeOp::Displace | CompositeOp::Distort => Self::Displacement {
                horizontal: args.get(0),
                vertical: sigma,
                percent: args.percent(),
                relative_to_canvas: args.aspect(),
                center_x: args.offset(0),
                center_y: args.offset(1),
            },
            CompositeOp::Blur => {
                let sigma_x = args.get(0).ok_or_else(blur_needs_sigma)?;
                Self::Blur {
                    sigma_x,
                    sigma_y: sigma.unwrap_or(sigma_x),
                    angle: args.offset(0),
                    angle_end: args.offset(1),
                }
            }
            _ => Self::None,
        };
        Ok(params)
    }

    /// Clip-to-self implied by the coverage factors, if any.
    ///
    /// A canvas factor of one keeps the canvas outside the source intact; anything smaller fades
    /// the whole canvas, so the driver must visit every row.
    pub fn implied_clip_to_self(&self) -> Option<bool> {
        match *self {
            Self::Dissolve { canvas, .. } | Self::Blend { canvas, .. } => {
                Some(canvas + MAGICK_EPSILON > 1.0)
            }
            _ => None,
        }
    }

    pub(crate) fn source_dissolve(&self) -> f64 {
        match *self {
            Self::Dissolve { source, .. } | Self::Blend { source, .. } => source,
            _ => 1.0,
        }
    }

    pub(crate) fn canvas_dissolve(&self) -> f64 {
        match *self {
            Self::Dissolve { canvas, .. } | Self::Blend { canvas, .. } => canvas,
            _ => 1.0,
        }
    }
}

fn blur_needs_sigma() -> PixelError {
    PixelError::validation("blur needs a sigma argument, e.g. \"5\" or \"5x2+45\"")
}

#[cfg(test)]
#[path = "../../tests/unit/composite/params.rs"]
mod tests;
