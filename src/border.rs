//! Breaks styled border lines down into plain filled rules, the only line
//! primitive presentation text offers.

use crate::error::Error;
use crate::model::{BorderLine, BorderStyle};

/// Contrast applied to the outer bands of groove and ridge borders.
const BEVEL_FACTOR: f32 = 0.4;

/// An axis-aligned filled rule, in millipoints. Horizontal rules extend right
/// from `(x, y)`, vertical rules extend down.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RuleSegment {
    pub x: f64,
    pub y: f64,
    pub length: f64,
    pub thickness: f64,
    pub horizontal: bool,
    pub color: [u8; 3],
}

impl RuleSegment {
    /// End point of the rule's axis.
    pub fn end(&self) -> (f64, f64) {
        if self.horizontal {
            (self.x + self.length, self.y)
        } else {
            (self.x, self.y + self.length)
        }
    }
}

/// Decomposes a border line into rules. Fails with `InvalidGeometry` (and
/// produces nothing) when the end point lies before the start point.
pub fn decompose(line: &BorderLine) -> Result<Vec<RuleSegment>, Error> {
    let BorderLine {
        style,
        x1,
        y1,
        x2,
        y2,
        horizontal,
        color,
    } = *line;
    let w = x2 - x1;
    let h = y2 - y1;
    if w < 0.0 || h < 0.0 {
        return Err(Error::InvalidGeometry(format!(
            "negative extent {w}x{h} for {style:?} border from ({x1}, {y1}) to ({x2}, {y2})"
        )));
    }

    let rule = |x: f64, y: f64, length: f64, thickness: f64, color: [u8; 3]| RuleSegment {
        x,
        y,
        length,
        thickness,
        horizontal,
        color,
    };

    let segments = match style {
        BorderStyle::Hidden => Vec::new(),
        BorderStyle::Double => {
            if horizontal {
                let h3 = h / 3.0;
                vec![
                    rule(x1, y1, w, h3, color),
                    rule(x1, y1 + h3 + h3, w, h3, color),
                ]
            } else {
                let w3 = w / 3.0;
                vec![
                    rule(x1, y1, h, w3, color),
                    rule(x1 + w3 + w3, y1, h, w3, color),
                ]
            }
        }
        BorderStyle::Dashed => {
            let thickness = if horizontal { h } else { w };
            repeat_along(line, 2.0 * thickness, 4.0 * thickness, thickness)
        }
        BorderStyle::Dotted => {
            let thickness = if horizontal { h } else { w };
            repeat_along(line, thickness, 2.0 * thickness, thickness)
        }
        BorderStyle::Groove | BorderStyle::Ridge => {
            let factor = if style == BorderStyle::Groove {
                BEVEL_FACTOR
            } else {
                -BEVEL_FACTOR
            };
            let first = lighten(color, -factor);
            let last = lighten(color, factor);
            if horizontal {
                let h3 = h / 3.0;
                vec![
                    rule(x1, y1, w, h3, first),
                    rule(x1, y1 + h3, w, h3, color),
                    rule(x1, y1 + h3 + h3, w, h3, last),
                ]
            } else {
                let w3 = w / 3.0;
                let xm = x1 + w3 / 2.0;
                vec![
                    rule(xm, y1, h, w3, first),
                    rule(xm + w3, y1, h, w3, color),
                    rule(xm + w3 + w3, y1, h, w3, last),
                ]
            }
        }
        BorderStyle::Solid | BorderStyle::Inset | BorderStyle::Outset => {
            let (length, thickness) = if horizontal { (w, h) } else { (h, w) };
            vec![rule(x1, y1, length, thickness.abs(), color)]
        }
    };
    Ok(segments)
}

/// Repeated rules of `length` along the line's axis, the pen advancing by
/// `step` each time, while the next rule still ends before the line end.
fn repeat_along(line: &BorderLine, length: f64, step: f64, thickness: f64) -> Vec<RuleSegment> {
    if step <= 0.0 {
        return Vec::new();
    }
    let (mut pos, end) = if line.horizontal {
        (line.x1, line.x2)
    } else {
        (line.y1, line.y2)
    };
    let mut out = Vec::new();
    while pos + length < end {
        let (x, y) = if line.horizontal {
            (pos, line.y1)
        } else {
            (line.x1, pos)
        };
        out.push(RuleSegment {
            x,
            y,
            length,
            thickness,
            horizontal: line.horizontal,
            color: line.color,
        });
        pos += step;
    }
    out
}

/// Moves each channel toward white (`factor > 0`) or black (`factor < 0`) by
/// the given fraction.
pub fn lighten(color: [u8; 3], factor: f32) -> [u8; 3] {
    color.map(|c| {
        let c = c as f32;
        let v = if factor > 0.0 {
            c + factor * (255.0 - c)
        } else {
            c + factor * c
        };
        v.round().clamp(0.0, 255.0) as u8
    })
}
