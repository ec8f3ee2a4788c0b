use std::fmt;

use anyhow::Result;
use ordered_float::NotNan;
use serde::{Deserialize, Serialize};

use crate::{Angle, Distance, Pt3D};

/// A 3D polyline with at least two points and no repeated adjacent points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolyLine {
    pts: Vec<Pt3D>,
    // Redundant, but computed up-front because so many queries need it
    length: Distance,
}

/// The result of projecting a point onto a polyline.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    /// The closest point on the polyline.
    pub pt: Pt3D,
    /// The index of the segment containing `pt`.
    pub seg_idx: usize,
    /// How far along that segment `pt` lies, from 0 (segment start) to 1 (segment end).
    pub progress: f64,
}

impl PolyLine {
    pub fn new(pts: Vec<Pt3D>) -> Result<PolyLine> {
        if pts.len() < 2 {
            bail!("Need at least two points for a PolyLine");
        }
        if let Some(pair) = pts.windows(2).find(|pair| pair[0] == pair[1]) {
            bail!("PolyLine has repeat points at {}", pair[0]);
        }

        let length = pts.windows(2).map(|pair| pair[0].dist_to(pair[1])).sum();
        Ok(PolyLine { pts, length })
    }

    /// Like `new`, but panics on failure.
    pub fn must_new(pts: Vec<Pt3D>) -> PolyLine {
        PolyLine::new(pts).unwrap()
    }

    /// First dedupes adjacent points.
    pub fn deduping_new(mut pts: Vec<Pt3D>) -> Result<PolyLine> {
        pts.dedup();
        PolyLine::new(pts)
    }

    pub fn points(&self) -> &Vec<Pt3D> {
        &self.pts
    }

    pub fn length(&self) -> Distance {
        self.length
    }

    pub fn first_pt(&self) -> Pt3D {
        self.pts[0]
    }

    pub fn last_pt(&self) -> Pt3D {
        *self.pts.last().unwrap()
    }

    pub fn reversed(&self) -> PolyLine {
        let mut pts = self.pts.clone();
        pts.reverse();
        PolyLine::must_new(pts)
    }

    /// The endpoints of one segment.
    pub fn segment(&self, seg_idx: usize) -> (Pt3D, Pt3D) {
        (self.pts[seg_idx], self.pts[seg_idx + 1])
    }

    pub fn segment_length(&self, seg_idx: usize) -> Distance {
        self.pts[seg_idx].dist_to(self.pts[seg_idx + 1])
    }

    /// The heading of one segment in the XY plane.
    pub fn segment_angle(&self, seg_idx: usize) -> Angle {
        let v = self.pts[seg_idx].vec_to(self.pts[seg_idx + 1]);
        Angle::radians(v.y().atan2(v.x()))
    }

    /// The closest point on this polyline to `pt`. Considers the perpendicular foot on every
    /// segment; if no segment contains one, snaps to the nearest vertex.
    pub fn project(&self, pt: Pt3D) -> Projection {
        let mut best: Option<(NotNan<f64>, Projection)> = None;
        for (seg_idx, pair) in self.pts.windows(2).enumerate() {
            let (a, b) = (pair[0], pair[1]);
            let dir = a.vec_to(b);
            let len_sq = dir.dot(dir);
            if len_sq == 0.0 {
                continue;
            }
            let t = a.vec_to(pt).dot(dir) / len_sq;
            if !(0.0..=1.0).contains(&t) {
                continue;
            }
            let candidate = Pt3D::new(
                a.x() + t * dir.x(),
                a.y() + t * dir.y(),
                a.z() + t * dir.z(),
            );
            let dist = dist_sq(candidate, pt);
            if best.map_or(true, |(d, _)| dist < d) {
                best = Some((
                    dist,
                    Projection {
                        pt: candidate,
                        seg_idx,
                        progress: t,
                    },
                ));
            }
        }
        if let Some((_, projection)) = best {
            return projection;
        }

        // Nearest of all segment start points, unless the very end of the polyline is strictly
        // closer.
        let mut best_idx = 0;
        let mut best_dist = dist_sq(self.pts[0], pt);
        for (idx, candidate) in self.pts.iter().enumerate().take(self.pts.len() - 1).skip(1) {
            let dist = dist_sq(*candidate, pt);
            if dist < best_dist {
                best_idx = idx;
                best_dist = dist;
            }
        }
        let last = self.last_pt();
        if dist_sq(last, pt) < best_dist {
            Projection {
                pt: last,
                seg_idx: self.pts.len() - 2,
                progress: 1.0,
            }
        } else {
            Projection {
                pt: self.pts[best_idx],
                seg_idx: best_idx,
                progress: 0.0,
            }
        }
    }

    /// The distance from the first point to a projection.
    pub fn dist_along(&self, projection: &Projection) -> Distance {
        let mut dist = self.segment_length(projection.seg_idx) * projection.progress;
        for seg_idx in 0..projection.seg_idx {
            dist += self.segment_length(seg_idx);
        }
        dist
    }

    /// The distance from a projection to the last point.
    pub fn dist_remaining(&self, projection: &Projection) -> Distance {
        self.length - self.dist_along(projection)
    }

    /// The Menger curvature at every point: 4 * area / (a * b * c) over each consecutive point
    /// triple, where a, b, c are the triangle's sides. The two endpoints always get 0.
    pub fn curvatures(&self) -> Vec<f64> {
        let mut result = vec![0.0];
        for triple in self.pts.windows(3) {
            result.push(menger_curvature(triple[0], triple[1], triple[2]));
        }
        result.push(0.0);
        result
    }
}

impl fmt::Display for PolyLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "PolyLine::new(vec![")?;
        for pt in &self.pts {
            writeln!(f, "  Pt3D::new({}, {}, {}),", pt.x(), pt.y(), pt.z())?;
        }
        write!(f, "])")
    }
}

fn dist_sq(a: Pt3D, b: Pt3D) -> NotNan<f64> {
    let v = a.vec_to(b);
    NotNan::new(v.dot(v)).unwrap()
}

fn menger_curvature(p1: Pt3D, p2: Pt3D, p3: Pt3D) -> f64 {
    let a = p1.dist_to(p2).inner_meters();
    let b = p2.dist_to(p3).inner_meters();
    let c = p3.dist_to(p1).inner_meters();
    let sides = a * b * c;
    if sides == 0.0 {
        return 0.0;
    }
    // Heron's formula. The radicand dips below zero for collinear points.
    let radicand = (a + b + c) * (-a + b + c) * (a - b + c) * (a + b - c);
    if radicand <= 0.0 {
        return 0.0;
    }
    let area = radicand.sqrt() / 4.0;
    4.0 * area / sides
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng};
    use rand_xorshift::XorShiftRng;

    use super::*;

    fn l_shape() -> PolyLine {
        PolyLine::must_new(vec![
            Pt3D::new(0.0, 0.0, 0.0),
            Pt3D::new(10.0, 0.0, 0.0),
            Pt3D::new(10.0, 10.0, 0.0),
        ])
    }

    #[test]
    fn validation() {
        assert!(PolyLine::new(vec![Pt3D::new(1.0, 2.0, 3.0)]).is_err());
        assert!(PolyLine::new(vec![
            Pt3D::new(0.0, 0.0, 0.0),
            Pt3D::new(0.0, 0.0, 0.0),
            Pt3D::new(1.0, 0.0, 0.0)
        ])
        .is_err());
        // Deduping recovers the repeated point case, but not a single-point input.
        assert!(PolyLine::deduping_new(vec![
            Pt3D::new(0.0, 0.0, 0.0),
            Pt3D::new(0.0, 0.0, 0.0),
            Pt3D::new(1.0, 0.0, 0.0)
        ])
        .is_ok());
        assert!(PolyLine::deduping_new(vec![
            Pt3D::new(0.0, 0.0, 0.0),
            Pt3D::new(0.0, 0.0, 0.0)
        ])
        .is_err());
    }

    #[test]
    fn project_onto_segment() {
        let pl = l_shape();
        assert_eq!(
            Projection {
                pt: Pt3D::new(4.0, 0.0, 0.0),
                seg_idx: 0,
                progress: 0.4,
            },
            pl.project(Pt3D::new(4.0, 3.0, 0.0))
        );
        assert_eq!(
            Projection {
                pt: Pt3D::new(10.0, 7.0, 0.0),
                seg_idx: 1,
                progress: 0.7,
            },
            pl.project(Pt3D::new(12.0, 7.0, 0.0))
        );
    }

    #[test]
    fn project_vertex_fallback() {
        let pl = l_shape();
        // Behind the start, no segment admits an in-range foot.
        assert_eq!(
            Projection {
                pt: Pt3D::new(0.0, 0.0, 0.0),
                seg_idx: 0,
                progress: 0.0,
            },
            pl.project(Pt3D::new(-5.0, -1.0, 0.0))
        );

        let line = PolyLine::must_new(vec![Pt3D::new(0.0, 0.0, 0.0), Pt3D::new(10.0, 0.0, 0.0)]);
        assert_eq!(
            Projection {
                pt: Pt3D::new(10.0, 0.0, 0.0),
                seg_idx: 0,
                progress: 1.0,
            },
            line.project(Pt3D::new(12.0, 1.0, 0.0))
        );
    }

    #[test]
    fn dist_along_and_remaining() {
        let pl = l_shape();
        assert_eq!(Distance::meters(20.0), pl.length());

        let projection = pl.project(Pt3D::new(4.0, 3.0, 0.0));
        assert_eq!(Distance::meters(4.0), pl.dist_along(&projection));
        assert_eq!(Distance::meters(16.0), pl.dist_remaining(&projection));

        let projection = pl.project(Pt3D::new(12.0, 7.0, 0.0));
        assert_eq!(Distance::meters(17.0), pl.dist_along(&projection));
        assert_eq!(Distance::meters(3.0), pl.dist_remaining(&projection));
    }

    #[test]
    fn curvature_straight_and_endpoints() {
        let pl = PolyLine::must_new(vec![
            Pt3D::new(0.0, 0.0, 0.0),
            Pt3D::new(5.0, 0.0, 0.0),
            Pt3D::new(9.0, 0.0, 0.0),
            Pt3D::new(20.0, 0.0, 0.0),
        ]);
        assert_eq!(vec![0.0, 0.0, 0.0, 0.0], pl.curvatures());
    }

    #[test]
    fn curvature_of_circle() {
        let radius = 10.0;
        let pts: Vec<Pt3D> = (0..30)
            .map(|i| {
                let theta = (i as f64) * 0.1;
                Pt3D::new(radius * theta.cos(), radius * theta.sin(), 0.0)
            })
            .collect();
        let pl = PolyLine::must_new(pts);
        for curvature in &pl.curvatures()[1..29] {
            assert!(
                (curvature - 1.0 / radius).abs() < 1e-3,
                "got {} for radius {}",
                curvature,
                radius
            );
        }
    }

    #[test]
    fn curvature_reversal_symmetry() {
        let pl = PolyLine::must_new(vec![
            Pt3D::new(0.0, 0.0, 0.0),
            Pt3D::new(5.0, 1.0, 0.0),
            Pt3D::new(9.0, -2.0, 1.0),
            Pt3D::new(14.0, 3.0, 0.5),
        ]);
        let mut backwards = pl.reversed().curvatures();
        backwards.reverse();
        for (fwd, back) in pl.curvatures().into_iter().zip(backwards) {
            assert!((fwd - back).abs() < 1e-12, "{} vs {}", fwd, back);
        }
    }

    #[test]
    fn project_stays_in_bounds() {
        let mut rng = XorShiftRng::seed_from_u64(42);
        for _ in 0..50 {
            let mut x = 0.0;
            let mut pts = Vec::new();
            for _ in 0..rng.gen_range(2..10) {
                pts.push(Pt3D::new(
                    x,
                    rng.gen_range(-5.0..5.0),
                    rng.gen_range(-1.0..1.0),
                ));
                x += rng.gen_range(0.5..3.0);
            }
            let pl = PolyLine::must_new(pts);

            for _ in 0..20 {
                let query = Pt3D::new(
                    rng.gen_range(-10.0..40.0),
                    rng.gen_range(-20.0..20.0),
                    rng.gen_range(-2.0..2.0),
                );
                let projection = pl.project(query);
                assert!(projection.seg_idx + 2 <= pl.points().len());
                assert!((0.0..=1.0).contains(&projection.progress));
                let along = pl.dist_along(&projection);
                assert!(Distance::ZERO <= along && along <= pl.length());
            }
        }
    }
}
