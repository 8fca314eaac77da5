use itertools::Itertools;

use crate::CoreAddr;

/// A closed-open interval `[start, end)` of core indices.
///
/// The invariant `start < end` holds for every value of this type, so a
/// sector is never empty.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Sector {
    /// First index covered by the sector
    start: CoreAddr,
    /// First index past the sector
    end: CoreAddr,
}

impl Sector {
    /// Construct a sector, or `None` when the bounds would make it empty
    /// or inverted.
    #[must_use]
    pub const fn new(start: CoreAddr, end: CoreAddr) -> Option<Self> {
        if start < end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    /// First index covered by the sector
    #[must_use]
    pub const fn start(&self) -> CoreAddr {
        self.start
    }

    /// First index past the sector
    #[must_use]
    pub const fn end(&self) -> CoreAddr {
        self.end
    }

    /// Number of indices the sector covers
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// A sector is never empty
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Whether `other` lies entirely within this sector.
    #[must_use]
    pub const fn contains(&self, other: &Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// The overlap of two sectors, or `None` when they are disjoint.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        Self::new(self.start.max(other.start), self.end.min(other.end))
    }

    /// Remove `other` from this sector.
    ///
    /// Yields the zero, one, or two pieces left over: the whole sector
    /// when they are disjoint, nothing when `other` covers it, and one
    /// or two fragments when `other` trims an edge or sits strictly
    /// inside.
    #[must_use]
    pub fn subtract(&self, other: &Self) -> Vec<Self> {
        if self.intersect(other).is_none() {
            return vec![*self];
        }
        let mut pieces = Vec::new();
        if let Some(left) = Self::new(self.start, other.start) {
            pieces.push(left);
        }
        if let Some(right) = Self::new(other.end, self.end) {
            pieces.push(right);
        }
        pieces
    }
}

/// A sorted set of pairwise disjoint, non-touching sectors.
///
/// The set is kept normalized: sectors are ordered by start, and any
/// pair that would touch or overlap is merged on mutation.  The free
/// regions of the core are tracked with one of these.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SectorSet {
    /// The normalized intervals, sorted by `(start, end)`
    sectors: Vec<Sector>,
}

impl SectorSet {
    /// Build a set from arbitrary sectors, normalizing as needed.
    #[must_use]
    pub fn new(sectors: Vec<Sector>) -> Self {
        let mut set = Self { sectors };
        set.consolidate();
        set
    }

    /// The set covering `[0, len)`, the free state of a fresh core.
    ///
    /// An empty set is returned for a zero `len`.
    #[must_use]
    pub fn whole(len: usize) -> Self {
        Self {
            sectors: Sector::new(0, len).into_iter().collect(),
        }
    }

    /// Insert a sector, merging it with any neighbours it touches.
    pub fn add(&mut self, sector: Sector) {
        let index = self.sectors.partition_point(|s| *s < sector);
        self.sectors.insert(index, sector);
        self.consolidate();
    }

    /// Carve `taken` out of every stored sector that overlaps it.
    pub fn carve(&mut self, taken: &Sector) {
        let remaining: Vec<Sector> = self
            .sectors
            .iter()
            .flat_map(|sector| sector.subtract(taken))
            .collect();
        self.sectors = remaining;
        self.consolidate();
    }

    /// Iterate over the stored sectors with length at least `minimum`.
    pub fn blocks_at_least(
        &self,
        minimum: usize,
    ) -> impl Iterator<Item = &Sector> {
        self.sectors.iter().filter(move |sector| sector.len() >= minimum)
    }

    /// Iterate over all stored sectors in order.
    pub fn iter(&self) -> impl Iterator<Item = &Sector> {
        self.sectors.iter()
    }

    /// Total number of indices covered by the set.
    #[must_use]
    pub fn total_len(&self) -> usize {
        self.sectors.iter().map(Sector::len).sum()
    }

    /// Whether the set covers nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }

    /// Restore the sorted-and-merged invariant after a mutation.
    fn consolidate(&mut self) {
        self.sectors.sort_unstable();
        let merged: Vec<Sector> = self
            .sectors
            .drain(..)
            .coalesce(|left, right| {
                if right.start() <= left.end() {
                    // Touching or overlapping neighbours merge, keeping
                    // the farther end
                    Sector::new(left.start(), left.end().max(right.end()))
                        .ok_or((left, right))
                } else {
                    Err((left, right))
                }
            })
            .collect();
        self.sectors = merged;
    }
}
