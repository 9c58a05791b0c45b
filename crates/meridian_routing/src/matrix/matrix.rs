use std::{fmt, time::Duration};

use crate::{
    constants::{MAX_DURATION, NO_ROUTE},
    distance::{Distance, Meters},
    weighting::{Milliseconds, Weight},
};

#[derive(Clone, Copy, PartialEq)]
pub struct MatrixEntry {
    weight: Weight,
    time: Milliseconds,
    distance: Distance<Meters>,
}

impl MatrixEntry {
    pub fn new(weight: Weight, time: Milliseconds, distance: Distance<Meters>) -> Self {
        MatrixEntry {
            weight,
            time,
            distance,
        }
    }

    pub fn weight(&self) -> Weight {
        self.weight
    }

    pub fn distance(&self) -> Distance<Meters> {
        self.distance
    }

    pub fn time(&self) -> Milliseconds {
        self.time
    }
}

impl fmt::Debug for MatrixEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[weight={}, time={:?}, distance={}km]",
            self.weight,
            Duration::from_millis(self.time as u64),
            self.distance.value() / 1000.0
        )
    }
}

/// Row major source x target table, `None` where the target is unreachable
#[derive(Debug, Clone)]
pub struct Matrix {
    sources: usize,
    targets: usize,
    entries: Vec<Option<MatrixEntry>>,
}

impl Matrix {
    pub fn new(sources: usize, targets: usize) -> Self {
        Matrix {
            sources,
            targets,
            entries: vec![None; sources * targets],
        }
    }

    pub(crate) fn from_rows(targets: usize, rows: Vec<Vec<Option<MatrixEntry>>>) -> Self {
        let sources = rows.len();
        Matrix {
            sources,
            targets,
            entries: rows.into_iter().flatten().collect(),
        }
    }

    pub fn sources(&self) -> usize {
        self.sources
    }

    pub fn targets(&self) -> usize {
        self.targets
    }

    /// Keeps the cheaper of the current and the given entry
    pub fn update_entry(&mut self, source: usize, target: usize, entry: MatrixEntry) {
        let slot = &mut self.entries[source * self.targets + target];
        if slot.as_ref().is_none_or(|current| entry.weight < current.weight) {
            *slot = Some(entry);
        }
    }

    pub fn entry(&self, source: usize, target: usize) -> Option<&MatrixEntry> {
        self.entries[source * self.targets + target].as_ref()
    }

    /// Weight of the pair, `NO_ROUTE` when unreachable
    pub fn weight(&self, source: usize, target: usize) -> Weight {
        self.entry(source, target).map_or(NO_ROUTE, |entry| entry.weight)
    }

    pub fn time(&self, source: usize, target: usize) -> Milliseconds {
        self.entry(source, target).map_or(MAX_DURATION, |entry| entry.time)
    }

    pub fn distance(&self, source: usize, target: usize) -> Option<Distance<Meters>> {
        self.entry(source, target).map(|entry| entry.distance)
    }

    pub fn weights(&self) -> Vec<Vec<Weight>> {
        self.rows(|source, target| self.weight(source, target))
    }

    pub fn times(&self) -> Vec<Vec<Milliseconds>> {
        self.rows(|source, target| self.time(source, target))
    }

    /// Distances in meters, `None` when unreachable
    pub fn distances(&self) -> Vec<Vec<Option<f64>>> {
        self.rows(|source, target| self.distance(source, target).map(|distance| distance.value()))
    }

    fn rows<T>(&self, value: impl Fn(usize, usize) -> T) -> Vec<Vec<T>> {
        (0..self.sources)
            .map(|source| (0..self.targets).map(|target| value(source, target)).collect())
            .collect()
    }
}
