//! Signed distance field generation
//!
//! Converts an alpha coverage bitmap into an 8-bit distance field using two passes of the
//! Felzenszwalb-Huttenlocher Euclidean distance transform: one over the outside of the shape
//! and one over its inside.

const INF: f64 = 1e20;

/// CPU distance field generator with reusable scratch buffers
#[derive(Debug, Clone)]
pub struct SdfGenerator {
    buffer: u32,
    radius: f64,
    cutoff: f64,
    grid_outer: Vec<f64>,
    grid_inner: Vec<f64>,
    f: Vec<f64>,
    z: Vec<f64>,
    v: Vec<usize>,
}

impl SdfGenerator {
    /// Default fraction of the range reserved for the inside of the shape
    pub const DEFAULT_CUTOFF: f64 = 0.25;

    /// Create a generator padding each glyph by `buffer` pixels and encoding distances up to
    /// `radius` pixels
    pub fn new(buffer: u32, radius: f32) -> Self {
        Self {
            buffer,
            radius: f64::from(radius.max(f32::EPSILON)),
            cutoff: Self::DEFAULT_CUTOFF,
            grid_outer: Vec::new(),
            grid_inner: Vec::new(),
            f: Vec::new(),
            z: Vec::new(),
            v: Vec::new(),
        }
    }

    /// Override the cutoff
    pub fn with_cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = cutoff;
        self
    }

    /// Padding added on each side
    pub fn buffer(&self) -> u32 {
        self.buffer
    }

    /// Output dimensions for a coverage bitmap of the given size
    pub fn padded_size(&self, width: u32, height: u32) -> (u32, u32) {
        (width + 2 * self.buffer, height + 2 * self.buffer)
    }

    /// Generate the distance field for a `width * height` coverage bitmap
    ///
    /// The result has the dimensions returned by [`Self::padded_size`]. Missing coverage
    /// bytes are treated as empty.
    pub fn generate(&mut self, coverage: &[u8], width: u32, height: u32) -> Vec<u8> {
        let (out_width, out_height) = self.padded_size(width, height);
        let (gw, gh) = (width as usize, height as usize);
        let (ow, oh) = (out_width as usize, out_height as usize);
        let buffer = self.buffer as usize;
        let len = ow * oh;

        self.grid_outer.clear();
        self.grid_outer.resize(len, INF);
        self.grid_inner.clear();
        self.grid_inner.resize(len, 0.0);

        let longest = ow.max(oh);
        if self.f.len() < longest {
            self.f.resize(longest, 0.0);
            self.v.resize(longest, 0);
            self.z.resize(longest + 1, 0.0);
        }

        for y in 0..gh {
            for x in 0..gw {
                let a = f64::from(coverage.get(y * gw + x).copied().unwrap_or(0)) / 255.0;
                if a == 0.0 {
                    continue;
                }

                let j = (y + buffer) * ow + x + buffer;
                if a == 1.0 {
                    self.grid_outer[j] = 0.0;
                    self.grid_inner[j] = INF;
                } else {
                    let d = 0.5 - a;
                    self.grid_outer[j] = if d > 0.0 { d * d } else { 0.0 };
                    self.grid_inner[j] = if d < 0.0 { d * d } else { 0.0 };
                }
            }
        }

        edt(&mut self.grid_outer, 0, 0, ow, oh, ow, &mut self.f, &mut self.v, &mut self.z);
        edt(
            &mut self.grid_inner,
            buffer,
            buffer,
            gw,
            gh,
            ow,
            &mut self.f,
            &mut self.v,
            &mut self.z,
        );

        self.grid_outer
            .iter()
            .zip(&self.grid_inner)
            .map(|(outer, inner)| {
                let d = outer.sqrt() - inner.sqrt();
                (255.0 - 255.0 * (d / self.radius + self.cutoff))
                    .round()
                    .clamp(0.0, 255.0) as u8
            })
            .collect()
    }
}

/// 2D transform of the `width * height` window at `(x0, y0)` of a grid with row length
/// `grid_size`
fn edt(
    data: &mut [f64],
    x0: usize,
    y0: usize,
    width: usize,
    height: usize,
    grid_size: usize,
    f: &mut [f64],
    v: &mut [usize],
    z: &mut [f64],
) {
    for x in x0..x0 + width {
        edt1d(data, y0 * grid_size + x, grid_size, height, f, v, z);
    }
    for y in y0..y0 + height {
        edt1d(data, y * grid_size + x0, 1, width, f, v, z);
    }
}

/// 1D squared distance transform along a strided line
fn edt1d(
    grid: &mut [f64],
    offset: usize,
    stride: usize,
    length: usize,
    f: &mut [f64],
    v: &mut [usize],
    z: &mut [f64],
) {
    if length == 0 {
        return;
    }

    v[0] = 0;
    z[0] = -INF;
    z[1] = INF;
    f[0] = grid[offset];

    let mut k: isize = 0;
    for q in 1..length {
        f[q] = grid[offset + q * stride];
        let q2 = (q * q) as f64;

        // Pop parabolas from the lower envelope until the new one starts after them
        let mut s;
        loop {
            let r = v[k as usize];
            s = (f[q] - f[r] + q2 - (r * r) as f64) / (q - r) as f64 / 2.0;
            if s <= z[k as usize] {
                k -= 1;
                if k > -1 {
                    continue;
                }
            }
            break;
        }

        k += 1;
        let ku = k as usize;
        v[ku] = q;
        z[ku] = s;
        z[ku + 1] = INF;
    }

    let mut k = 0;
    for q in 0..length {
        while z[k + 1] < q as f64 {
            k += 1;
        }
        let r = v[k];
        let qr = q as f64 - r as f64;
        grid[offset + q * stride] = f[r] + qr * qr;
    }
}
