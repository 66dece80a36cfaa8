//! Crossover strategies.
//!
//! Point-wise schemes ([`SinglePointCrossover`], [`UniformCrossover`])
//! work for any [`VectorEncoding`]; [`BlendCrossover`] and
//! [`ArithmeticCrossover`] are real-valued; [`PmxCrossover`],
//! [`OrderCrossover`], and [`CycleCrossover`] preserve the permutation
//! invariant.

use crate::encoding::{Encoding, Genome, Permutation, RealValued, VectorEncoding};
use crate::error::{GaError, Result};
use crate::operators::Crossover;
use crate::rng::GaRng;

fn check_parents<E: Encoding>(encoding: &E, a: &[E::Gene], b: &[E::Gene]) -> Result<()> {
    if a.len() != encoding.nvars() || b.len() != encoding.nvars() {
        return Err(GaError::Configuration(format!(
            "crossover parents have {} and {} genes, encoding declares {}",
            a.len(),
            b.len(),
            encoding.nvars()
        )));
    }
    Ok(())
}

/// Single-point crossover: genes are exchanged beyond one random cut.
#[derive(Debug, Clone, Copy, Default)]
pub struct SinglePointCrossover;

impl SinglePointCrossover {
    pub fn new() -> Self {
        Self
    }
}

impl<E: VectorEncoding> Crossover<E> for SinglePointCrossover {
    fn cross(
        &self,
        encoding: &E,
        a: &[E::Gene],
        b: &[E::Gene],
        rng: &mut GaRng,
    ) -> Result<(Genome<E>, Genome<E>)> {
        check_parents(encoding, a, b)?;
        let n = a.len();
        if n < 2 {
            return Ok((a.to_vec(), b.to_vec()));
        }
        let cut = 1 + rng.index(n - 1);
        let mut c0 = a[..cut].to_vec();
        c0.extend_from_slice(&b[cut..]);
        let mut c1 = b[..cut].to_vec();
        c1.extend_from_slice(&a[cut..]);
        Ok((c0, c1))
    }
}

/// Uniform crossover: each aligned gene pair is swapped with probability
/// one half.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformCrossover;

impl UniformCrossover {
    pub fn new() -> Self {
        Self
    }
}

impl<E: VectorEncoding> Crossover<E> for UniformCrossover {
    fn cross(
        &self,
        encoding: &E,
        a: &[E::Gene],
        b: &[E::Gene],
        rng: &mut GaRng,
    ) -> Result<(Genome<E>, Genome<E>)> {
        check_parents(encoding, a, b)?;
        let mut c0 = a.to_vec();
        let mut c1 = b.to_vec();
        for i in 0..c0.len() {
            if rng.chance(0.5) {
                std::mem::swap(&mut c0[i], &mut c1[i]);
            }
        }
        Ok((c0, c1))
    }
}

/// Whole-arithmetic crossover: children are complementary convex
/// combinations `α·a + (1−α)·b` with `α ~ U(0, 1)`, which keeps every
/// gene inside its box without clamping.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArithmeticCrossover;

impl ArithmeticCrossover {
    pub fn new() -> Self {
        Self
    }
}

impl Crossover<RealValued> for ArithmeticCrossover {
    fn cross(
        &self,
        encoding: &RealValued,
        a: &[f64],
        b: &[f64],
        rng: &mut GaRng,
    ) -> Result<(Genome<RealValued>, Genome<RealValued>)> {
        check_parents(encoding, a, b)?;
        let alpha = rng.uniform();
        let c0 = a
            .iter()
            .zip(b)
            .map(|(x, y)| alpha * x + (1.0 - alpha) * y)
            .collect();
        let c1 = a
            .iter()
            .zip(b)
            .map(|(x, y)| (1.0 - alpha) * x + alpha * y)
            .collect();
        Ok((c0, c1))
    }
}

/// Blend crossover (BLX-α): each child gene is drawn uniformly from the
/// parents' interval extended by `α` times its width, then clamped to the
/// variable's bounds.
#[derive(Debug, Clone, Copy)]
pub struct BlendCrossover {
    alpha: f64,
}

impl BlendCrossover {
    /// Creates the operator with extension factor `alpha`.
    ///
    /// # Errors
    ///
    /// Returns [`GaError::InvalidParameter`] for negative `alpha`.
    pub fn new(alpha: f64) -> Result<Self> {
        if alpha < 0.0 || !alpha.is_finite() {
            return Err(GaError::InvalidParameter(format!(
                "blend crossover alpha must be non-negative, got {alpha}"
            )));
        }
        Ok(Self { alpha })
    }
}

impl Default for BlendCrossover {
    fn default() -> Self {
        Self { alpha: 0.5 }
    }
}

impl Crossover<RealValued> for BlendCrossover {
    fn cross(
        &self,
        encoding: &RealValued,
        a: &[f64],
        b: &[f64],
        rng: &mut GaRng,
    ) -> Result<(Genome<RealValued>, Genome<RealValued>)> {
        check_parents(encoding, a, b)?;
        let mut c0 = Vec::with_capacity(a.len());
        let mut c1 = Vec::with_capacity(a.len());
        for i in 0..a.len() {
            let (lo, hi) = (a[i].min(b[i]), a[i].max(b[i]));
            let spread = self.alpha * (hi - lo);
            let low = (lo - spread).max(encoding.lower()[i]);
            let high = (hi + spread).min(encoding.upper()[i]);
            c0.push(rng.uniform_range(low, high));
            c1.push(rng.uniform_range(low, high));
        }
        Ok((c0, c1))
    }
}

/// Positions `start..end` (half-open) for a random two-cut segment.
fn random_segment(n: usize, rng: &mut GaRng) -> (usize, usize) {
    let i = rng.index(n);
    let j = rng.index(n);
    if i <= j {
        (i, j + 1)
    } else {
        (j, i + 1)
    }
}

fn position_table(encoding: &Permutation, genome: &[i64]) -> Vec<usize> {
    let mut table = vec![0usize; genome.len()];
    for (pos, &v) in genome.iter().enumerate() {
        table[(v - encoding.lower()) as usize] = pos;
    }
    table
}

/// Partially-mapped crossover (PMX).
///
/// The child keeps one parent's segment verbatim; conflicts outside the
/// segment are resolved through the mapping the segment induces.
#[derive(Debug, Clone, Copy, Default)]
pub struct PmxCrossover;

impl PmxCrossover {
    pub fn new() -> Self {
        Self
    }

    fn child(
        encoding: &Permutation,
        seg_parent: &[i64],
        other: &[i64],
        start: usize,
        end: usize,
    ) -> Vec<i64> {
        let n = seg_parent.len();
        let seg_pos = position_table(encoding, seg_parent);
        let in_segment =
            |v: i64| -> bool { (start..end).contains(&seg_pos[(v - encoding.lower()) as usize]) };
        let mut child = other.to_vec();
        child[start..end].copy_from_slice(&seg_parent[start..end]);
        // Outside the segment, resolve each displaced gene through the
        // mapping the segment induces until it lands on a free value.
        for i in (0..start).chain(end..n) {
            let mut v = other[i];
            while in_segment(v) {
                v = other[seg_pos[(v - encoding.lower()) as usize]];
            }
            child[i] = v;
        }
        child
    }
}

impl Crossover<Permutation> for PmxCrossover {
    fn cross(
        &self,
        encoding: &Permutation,
        a: &[i64],
        b: &[i64],
        rng: &mut GaRng,
    ) -> Result<(Genome<Permutation>, Genome<Permutation>)> {
        check_parents(encoding, a, b)?;
        if a.len() < 2 {
            return Ok((a.to_vec(), b.to_vec()));
        }
        let (start, end) = random_segment(a.len(), rng);
        Ok((
            Self::child(encoding, a, b, start, end),
            Self::child(encoding, b, a, start, end),
        ))
    }
}

/// Order crossover (OX).
///
/// The child keeps one parent's segment; the remaining positions are
/// filled with the other parent's genes in their relative order, starting
/// after the segment.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderCrossover;

impl OrderCrossover {
    pub fn new() -> Self {
        Self
    }

    fn child(seg_parent: &[i64], other: &[i64], start: usize, end: usize) -> Vec<i64> {
        let n = seg_parent.len();
        let segment: Vec<i64> = seg_parent[start..end].to_vec();
        let mut child = vec![0i64; n];
        child[start..end].copy_from_slice(&segment);
        let mut fill = other
            .iter()
            .cycle()
            .skip(end % n)
            .take(n)
            .filter(|&v| !segment.contains(v))
            .copied();
        let mut pos = end % n;
        while pos != start {
            child[pos] = fill.next().unwrap_or_default();
            pos = (pos + 1) % n;
        }
        child
    }
}

impl Crossover<Permutation> for OrderCrossover {
    fn cross(
        &self,
        encoding: &Permutation,
        a: &[i64],
        b: &[i64],
        rng: &mut GaRng,
    ) -> Result<(Genome<Permutation>, Genome<Permutation>)> {
        check_parents(encoding, a, b)?;
        if a.len() < 2 {
            return Ok((a.to_vec(), b.to_vec()));
        }
        let (start, end) = random_segment(a.len(), rng);
        if end - start == a.len() {
            return Ok((a.to_vec(), b.to_vec()));
        }
        Ok((
            Self::child(a, b, start, end),
            Self::child(b, a, start, end),
        ))
    }
}

/// Cycle crossover (CX): positions are partitioned into cycles, which the
/// children take from alternating parents. Deterministic given the
/// parents.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleCrossover;

impl CycleCrossover {
    pub fn new() -> Self {
        Self
    }
}

impl Crossover<Permutation> for CycleCrossover {
    fn cross(
        &self,
        encoding: &Permutation,
        a: &[i64],
        b: &[i64],
        _rng: &mut GaRng,
    ) -> Result<(Genome<Permutation>, Genome<Permutation>)> {
        check_parents(encoding, a, b)?;
        let n = a.len();
        let pos_in_a = position_table(encoding, a);
        let mut c0 = vec![0i64; n];
        let mut c1 = vec![0i64; n];
        let mut assigned = vec![false; n];
        let mut cycle = 0usize;
        for seed in 0..n {
            if assigned[seed] {
                continue;
            }
            let mut pos = seed;
            loop {
                assigned[pos] = true;
                if cycle % 2 == 0 {
                    c0[pos] = a[pos];
                    c1[pos] = b[pos];
                } else {
                    c0[pos] = b[pos];
                    c1[pos] = a[pos];
                }
                pos = pos_in_a[(b[pos] - encoding.lower()) as usize];
                if pos == seed {
                    break;
                }
            }
            cycle += 1;
        }
        Ok((c0, c1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{Binary, Encoding};

    #[test]
    fn single_point_swaps_a_suffix() {
        let encoding = Binary::new(6);
        let mut rng = GaRng::from_seed(8);
        let a = vec![0, 0, 0, 0, 0, 0];
        let b = vec![1, 1, 1, 1, 1, 1];
        let (c0, c1) = SinglePointCrossover::new()
            .cross(&encoding, &a, &b, &mut rng)
            .unwrap();
        let flips = c0.iter().filter(|&&g| g == 1).count();
        assert!(flips > 0 && flips < 6);
        assert_eq!(
            c1.iter().filter(|&&g| g == 0).count(),
            flips
        );
    }

    #[test]
    fn arithmetic_children_stay_in_the_box() {
        let encoding = RealValued::new(vec![-1.0, -1.0], vec![1.0, 1.0]).unwrap();
        let mut rng = GaRng::from_seed(8);
        for _ in 0..50 {
            let a = encoding.sample(&mut rng);
            let b = encoding.sample(&mut rng);
            let (c0, c1) = ArithmeticCrossover::new()
                .cross(&encoding, &a, &b, &mut rng)
                .unwrap();
            assert!(encoding.is_valid(&c0));
            assert!(encoding.is_valid(&c1));
        }
    }

    #[test]
    fn blend_children_stay_in_the_box() {
        let encoding = RealValued::new(vec![0.0], vec![1.0]).unwrap();
        let op = BlendCrossover::new(2.0).unwrap();
        let mut rng = GaRng::from_seed(21);
        for _ in 0..100 {
            let (c0, c1) = op
                .cross(&encoding, &[0.05], &[0.95], &mut rng)
                .unwrap();
            assert!(encoding.is_valid(&c0));
            assert!(encoding.is_valid(&c1));
        }
    }

    #[test]
    fn permutation_crossovers_preserve_validity() {
        let encoding = Permutation::new(1, 9).unwrap();
        let mut rng = GaRng::from_seed(31);
        let ops: Vec<Box<dyn Crossover<Permutation>>> = vec![
            Box::new(PmxCrossover::new()),
            Box::new(OrderCrossover::new()),
            Box::new(CycleCrossover::new()),
        ];
        for op in &ops {
            for _ in 0..100 {
                let a = encoding.sample(&mut rng);
                let b = encoding.sample(&mut rng);
                let (c0, c1) = op.cross(&encoding, &a, &b, &mut rng).unwrap();
                assert!(encoding.is_valid(&c0), "{op:?} produced {c0:?}");
                assert!(encoding.is_valid(&c1), "{op:?} produced {c1:?}");
            }
        }
    }

    #[test]
    fn cycle_crossover_of_identical_parents_is_identity() {
        let encoding = Permutation::new(0, 5).unwrap();
        let mut rng = GaRng::from_seed(2);
        let a = vec![3, 1, 5, 0, 2, 4];
        let (c0, c1) = CycleCrossover::new()
            .cross(&encoding, &a, &a, &mut rng)
            .unwrap();
        assert_eq!(c0, a);
        assert_eq!(c1, a);
    }
}
