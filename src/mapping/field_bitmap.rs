// Binary raster of the known field boundary features

use std::ops::Deref;

use nalgebra::DMatrix;

use crate::common::{LocalizationError, LocalizationResult, Pixel};

/// Boundary bitmap indexed `(row, column)`; `true` marks a boundary pixel.
pub struct FieldBitmap {
    grid: DMatrix<bool>,
}

impl FieldBitmap {
    /// Empty bitmap with no boundary pixels
    pub fn new(width: usize, height: usize) -> LocalizationResult<Self> {
        if width == 0 || height == 0 {
            return Err(LocalizationError::InvalidParameter(
                "bitmap must be at least 1x1".to_string(),
            ));
        }
        Ok(Self { grid: DMatrix::from_element(height, width, false) })
    }

    /// Wrap an existing boundary raster
    pub fn from_matrix(grid: DMatrix<bool>) -> Self {
        Self { grid }
    }

    pub fn width(&self) -> usize {
        self.grid.ncols()
    }

    pub fn height(&self) -> usize {
        self.grid.nrows()
    }

    fn index(&self, p: Pixel) -> Option<(usize, usize)> {
        if p.x >= 0 && p.y >= 0 && (p.x as usize) < self.width() && (p.y as usize) < self.height() {
            Some((p.y as usize, p.x as usize))
        } else {
            None
        }
    }

    /// True when `p` lies inside the bitmap and is marked as boundary
    pub fn is_boundary(&self, p: Pixel) -> bool {
        self.index(p).map_or(false, |idx| self.grid[idx])
    }

    /// Mark a pixel; pixels outside the bitmap are ignored
    pub fn mark(&mut self, p: Pixel) {
        if let Some(idx) = self.index(p) {
            self.grid[idx] = true;
        }
    }

    /// Walk from `from` to `to`, restricted to the part inside the bitmap
    pub fn walk(&self, from: Pixel, to: Pixel) -> impl Iterator<Item = Pixel> {
        clip_segment(from, to, self.width(), self.height())
            .map(|(start, end)| LineWalk::new(start, end))
            .into_iter()
            .flatten()
    }

    pub fn draw_line(&mut self, from: Pixel, to: Pixel) {
        for p in self.walk(from, to) {
            self.mark(p);
        }
    }

    /// Outline of the axis-aligned rectangle with top-left corner `origin`
    pub fn draw_rect(&mut self, origin: Pixel, width: i32, height: i32) {
        let tl = origin;
        let tr = Pixel::new(origin.x + width - 1, origin.y);
        let bl = Pixel::new(origin.x, origin.y + height - 1);
        let br = Pixel::new(origin.x + width - 1, origin.y + height - 1);
        self.draw_line(tl, tr);
        self.draw_line(tr, br);
        self.draw_line(br, bl);
        self.draw_line(bl, tl);
    }
}

impl Deref for FieldBitmap {
    type Target = DMatrix<bool>;

    fn deref(&self) -> &Self::Target {
        &self.grid
    }
}

/// Clip a segment to the pixel rectangle `[0, width) x [0, height)`.
///
/// Cohen-Sutherland on integer endpoints, so the clipped ends are the
/// intersections truncated toward the segment. `None` when the segment
/// misses the rectangle.
pub fn clip_segment(start: Pixel, end: Pixel, width: usize, height: usize) -> Option<(Pixel, Pixel)> {
    let right = width as i128 - 1;
    let bottom = height as i128 - 1;
    if right < 0 || bottom < 0 {
        return None;
    }
    let x_code = |x: i128| u8::from(x < 0) | (u8::from(x > right) << 1);
    let y_code = |y: i128| (u8::from(y < 0) << 2) | (u8::from(y > bottom) << 3);

    let (mut x1, mut y1) = (i128::from(start.x), i128::from(start.y));
    let (mut x2, mut y2) = (i128::from(end.x), i128::from(end.y));
    let mut c1 = x_code(x1) | y_code(y1);
    let mut c2 = x_code(x2) | y_code(y2);

    if (c1 & c2) == 0 && (c1 | c2) != 0 {
        if c1 & 12 != 0 {
            let a = if c1 < 8 { 0 } else { bottom };
            x1 += (a - y1) * (x2 - x1) / (y2 - y1);
            y1 = a;
            c1 = x_code(x1);
        }
        if c2 & 12 != 0 {
            let a = if c2 < 8 { 0 } else { bottom };
            x2 += (a - y2) * (x2 - x1) / (y2 - y1);
            y2 = a;
            c2 = x_code(x2);
        }
        if (c1 & c2) == 0 && (c1 | c2) != 0 {
            if c1 != 0 {
                let a = if c1 == 1 { 0 } else { right };
                y1 += (a - x1) * (y2 - y1) / (x2 - x1);
                x1 = a;
                c1 = 0;
            }
            if c2 != 0 {
                let a = if c2 == 1 { 0 } else { right };
                y2 += (a - x2) * (y2 - y1) / (x2 - x1);
                x2 = a;
                c2 = 0;
            }
        }
    }
    if (c1 | c2) != 0 {
        return None;
    }

    let pixel = |x: i128, y: i128| Some(Pixel::new(i32::try_from(x).ok()?, i32::try_from(y).ok()?));
    Some((pixel(x1, y1)?, pixel(x2, y2)?))
}

/// 8-connected Bresenham walk from `start` to `end`, both endpoints included.
///
/// The walk is not clipped; use [`FieldBitmap::walk`] for bitmap-bounded rays.
pub struct LineWalk {
    current: Pixel,
    end: Pixel,
    dx: i64,
    dy: i64,
    sx: i32,
    sy: i32,
    err: i64,
    done: bool,
}

impl LineWalk {
    pub fn new(start: Pixel, end: Pixel) -> Self {
        let dx = (i64::from(end.x) - i64::from(start.x)).abs();
        let dy = -(i64::from(end.y) - i64::from(start.y)).abs();
        LineWalk {
            current: start,
            end,
            dx,
            dy,
            sx: if start.x < end.x { 1 } else { -1 },
            sy: if start.y < end.y { 1 } else { -1 },
            err: dx + dy,
            done: false,
        }
    }
}

impl Iterator for LineWalk {
    type Item = Pixel;

    fn next(&mut self) -> Option<Pixel> {
        if self.done {
            return None;
        }
        let out = self.current;
        if self.current == self.end {
            self.done = true;
            return Some(out);
        }
        let e2 = 2 * self.err;
        if e2 >= self.dy {
            self.err += self.dy;
            self.current.x += self.sx;
        }
        if e2 <= self.dx {
            self.err += self.dx;
            self.current.y += self.sy;
        }
        Some(out)
    }
}
