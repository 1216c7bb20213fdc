//! Viewport nesting. Each frame records where a viewport's origin lands in
//! device units and which of the four orientations its content is drawn in.

use crate::error::Error;
use crate::model::{Rect, Rotation, mpt_to_units};

/// Affine transform `[a b c d e f]` as handed over by the layout engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ctm {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Ctm {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Ctm {
    pub const IDENTITY: Ctm = Ctm {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// The canonical matrix for a 90°-step rotation.
    pub fn rotation(rotation: Rotation) -> Self {
        let [a, b, c, d] = match rotation {
            Rotation::Deg0 => [1.0, 0.0, 0.0, 1.0],
            Rotation::Deg90 => [0.0, 1.0, -1.0, 0.0],
            Rotation::Deg180 => [-1.0, 0.0, 0.0, -1.0],
            Rotation::Deg270 => [0.0, -1.0, 1.0, 0.0],
        };
        Self {
            a,
            b,
            c,
            d,
            e: 0.0,
            f: 0.0,
        }
    }

    pub fn translated(mut self, e: f64, f: f64) -> Self {
        self.e = e;
        self.f = f;
        self
    }

    fn coefficients(&self) -> [f64; 4] {
        [self.a, self.b, self.c, self.d]
    }

    /// Rotation expressed by this matrix. Only exact canonical matrices count;
    /// anything else (skew, scale, arbitrary angles) is treated as no rotation.
    pub fn local_rotation(&self) -> Rotation {
        let coefficients = self.coefficients();
        [Rotation::Deg90, Rotation::Deg180, Rotation::Deg270]
            .into_iter()
            .find(|r| Ctm::rotation(*r).coefficients() == coefficients)
            .unwrap_or(Rotation::Deg0)
    }
}

/// Device position and orientation of a viewport.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ViewportFrame {
    pub x: i32,
    pub y: i32,
    pub rotation: Rotation,
}

impl ViewportFrame {
    pub const PAGE: ViewportFrame = ViewportFrame {
        x: 0,
        y: 0,
        rotation: Rotation::Deg0,
    };
}

#[derive(Clone, Debug)]
pub struct TransformStack {
    frames: Vec<ViewportFrame>,
    page_width: i32,
    page_height: i32,
}

impl TransformStack {
    /// Starts a page: the stack holds only the page identity frame.
    /// Page dimensions are in device units.
    pub fn new(page_width: i32, page_height: i32) -> Self {
        Self {
            frames: vec![ViewportFrame::PAGE],
            page_width,
            page_height,
        }
    }

    pub fn current(&self) -> ViewportFrame {
        self.frames.last().copied().unwrap_or(ViewportFrame::PAGE)
    }

    /// Number of frames including the page frame; 0 once the page is released.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Enters a child viewport whose view rectangle (millipoints, in the
    /// parent's coordinate space) is `view` and whose own transform is `ctm`.
    pub fn push(&mut self, view: &Rect, ctm: &Ctm) -> ViewportFrame {
        let parent = self.current();
        let (pw, ph) = (self.page_width, self.page_height);
        let units = |v: i32| mpt_to_units(v as f64);

        // Project the view rectangle into the parent's orientation.
        let (x_origin, y_origin, width, height) = match parent.rotation {
            Rotation::Deg0 => (
                units(view.x) + parent.x,
                units(view.y) + parent.y,
                units(view.width),
                units(view.height),
            ),
            Rotation::Deg90 => {
                let width = units(view.height);
                let height = units(view.width);
                (
                    pw - width - units(view.y) - parent.y,
                    units(view.x) + parent.x,
                    width,
                    height,
                )
            }
            Rotation::Deg180 => {
                let width = units(view.width);
                let height = units(view.height);
                (
                    pw - width - units(view.x) - parent.x,
                    ph - height - units(view.y) - parent.y,
                    width,
                    height,
                )
            }
            Rotation::Deg270 => {
                let width = units(view.height);
                let height = units(view.width);
                (
                    units(view.y) + parent.y,
                    ph - height - units(view.x) - parent.x,
                    width,
                    height,
                )
            }
        };

        let rotation = parent.rotation + ctm.local_rotation();

        // Re-project that origin into the cumulative orientation.
        let (x, y) = match rotation {
            Rotation::Deg0 => (x_origin, y_origin),
            Rotation::Deg90 => (y_origin, pw - width - x_origin),
            Rotation::Deg180 => (pw - width - x_origin, ph - height - y_origin),
            Rotation::Deg270 => (ph - height - y_origin, x_origin),
        };

        let frame = ViewportFrame { x, y, rotation };
        log::debug!("push viewport {view:?} -> {frame:?} (depth {})", self.frames.len() + 1);
        self.frames.push(frame);
        frame
    }

    /// Leaves the innermost viewport and returns the frame that is now active.
    pub fn pop(&mut self) -> Result<ViewportFrame, Error> {
        if self.frames.len() <= 1 {
            return Err(Error::TransformUnderflow);
        }
        self.frames.pop();
        Ok(self.current())
    }

    /// Drops every frame, page frame included. Unbalanced pushes are reported.
    pub fn release(&mut self) {
        if self.frames.len() > 1 {
            log::warn!(
                "{} viewport(s) still open at page end, discarding",
                self.frames.len() - 1
            );
        }
        self.frames.clear();
    }

    /// Converts a viewport-relative position in millipoints to device units.
    pub fn to_device(&self, x: f64, y: f64) -> (i32, i32) {
        let frame = self.current();
        (mpt_to_units(x) + frame.x, mpt_to_units(y) + frame.y)
    }
}
