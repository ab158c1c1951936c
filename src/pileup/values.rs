/// Run-length step function over one node's coordinate space.
///
/// Canonical form: breakpoints strictly increasing inside `(0, length)`,
/// `start_value` holds before the first breakpoint and no two adjacent runs
/// carry the same value.
#[derive(Debug, Clone, PartialEq)]
pub struct PileupValue {
    length: u32,
    start_value: f64,
    indexes: Vec<u32>,
    values: Vec<f64>,
}

impl PileupValue {
    /// Single run of `value` over the whole node.
    pub fn constant(length: u32, value: f64) -> Self {
        Self {
            length,
            start_value: value,
            indexes: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Run-length encode a per-base array.
    pub fn from_dense<T>(dense: &[T]) -> Self
    where
        T: Copy + Into<f64>,
    {
        let length = dense.len() as u32;
        let start_value = dense.first().map(|&v| v.into()).unwrap_or(0.0);
        let breakpoints = dense
            .iter()
            .enumerate()
            .skip(1)
            .map(|(pos, &v)| (pos as u32, v.into()))
            .collect();
        Self::canonical(length, start_value, breakpoints)
    }

    /// Build from sorted breakpoints, normalising to canonical form.
    ///
    /// A breakpoint at 0 replaces `start_value`; breakpoints at or beyond
    /// `length` are ignored; later duplicates override earlier ones.
    pub fn from_breakpoints(length: u32, start_value: f64, breakpoints: Vec<(u32, f64)>) -> Self {
        debug_assert!(breakpoints.windows(2).all(|w| w[0].0 <= w[1].0));
        Self::canonical(length, start_value, breakpoints)
    }

    fn canonical(length: u32, mut start_value: f64, breakpoints: Vec<(u32, f64)>) -> Self {
        let mut raw: Vec<(u32, f64)> = Vec::with_capacity(breakpoints.len());
        for (idx, value) in breakpoints {
            if idx >= length {
                break;
            }
            if idx == 0 {
                start_value = value;
                continue;
            }
            if raw.last().map(|&(last, _)| last) == Some(idx) {
                raw.pop();
            }
            raw.push((idx, value));
        }

        let mut indexes = Vec::with_capacity(raw.len());
        let mut values = Vec::with_capacity(raw.len());
        let mut current = start_value;
        for (idx, value) in raw {
            if !same_value(value, current) {
                indexes.push(idx);
                values.push(value);
                current = value;
            }
        }
        Self {
            length,
            start_value,
            indexes,
            values,
        }
    }

    /// Node length covered by this function.
    pub fn length(&self) -> u32 {
        self.length
    }

    /// Value before the first breakpoint.
    pub fn start_value(&self) -> f64 {
        self.start_value
    }

    /// Breakpoint positions.
    pub fn indexes(&self) -> &[u32] {
        &self.indexes
    }

    /// Values taking effect at each breakpoint.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// `(start, end, value)` runs in position order.
    pub fn runs(&self) -> impl Iterator<Item = (u32, u32, f64)> + '_ {
        let starts = std::iter::once(0).chain(self.indexes.iter().copied());
        let ends = self
            .indexes
            .iter()
            .copied()
            .chain(std::iter::once(self.length));
        let values = std::iter::once(self.start_value).chain(self.values.iter().copied());
        starts
            .zip(ends)
            .zip(values)
            .map(|((start, end), value)| (start, end, value))
    }

    /// Value at a single position.
    pub fn value_at(&self, pos: u32) -> f64 {
        let i = self.indexes.partition_point(|&idx| idx <= pos);
        if i == 0 {
            self.start_value
        } else {
            self.values[i - 1]
        }
    }

    /// Sum of per-base values over `[start, end)`.
    pub fn sum(&self, start: u32, end: u32) -> f64 {
        self.runs()
            .filter_map(|(s, e, value)| {
                let lo = s.max(start);
                let hi = e.min(end);
                (lo < hi).then(|| value * f64::from(hi - lo))
            })
            .sum()
    }

    /// Largest value over the node.
    pub fn max_value(&self) -> f64 {
        self.values
            .iter()
            .copied()
            .fold(self.start_value, f64::max)
    }

    /// Apply `f` to every run value.
    pub fn map(&self, mut f: impl FnMut(f64) -> f64) -> Self {
        let breakpoints = self
            .indexes
            .iter()
            .zip(&self.values)
            .map(|(&idx, &value)| (idx, f(value)))
            .collect();
        Self::canonical(self.length, f(self.start_value), breakpoints)
    }

    /// Pointwise combination of two functions over the same node.
    pub fn combine(&self, other: &Self, mut f: impl FnMut(f64, f64) -> f64) -> Self {
        debug_assert_eq!(self.length, other.length);
        let (mut a, mut b) = (0usize, 0usize);
        let (mut va, mut vb) = (self.start_value, other.start_value);
        let start_value = f(va, vb);
        let mut breakpoints = Vec::with_capacity(self.indexes.len() + other.indexes.len());
        loop {
            let idx = match (self.indexes.get(a), other.indexes.get(b)) {
                (Some(&x), Some(&y)) => x.min(y),
                (Some(&x), None) => x,
                (None, Some(&y)) => y,
                (None, None) => break,
            };
            if self.indexes.get(a) == Some(&idx) {
                va = self.values[a];
                a += 1;
            }
            if other.indexes.get(b) == Some(&idx) {
                vb = other.values[b];
                b += 1;
            }
            breakpoints.push((idx, f(va, vb)));
        }
        Self::canonical(self.length, start_value, breakpoints)
    }

    /// Maximal runs whose value is at least `min_value`.
    pub fn threshold(&self, min_value: f64) -> Vec<(u32, u32)> {
        let mut kept: Vec<(u32, u32)> = Vec::new();
        for (start, end, value) in self.runs() {
            if value < min_value || value.is_nan() {
                continue;
            }
            match kept.last_mut() {
                Some(last) if last.1 == start => last.1 = end,
                _ => kept.push((start, end)),
            }
        }
        kept
    }

    /// First position in `[start, end)` with a nonzero value.
    pub fn first_nonzero(&self, start: u32, end: u32) -> Option<u32> {
        self.runs().find_map(|(s, e, value)| {
            let lo = s.max(start);
            (lo < e.min(end) && value != 0.0).then_some(lo)
        })
    }

    /// Last position in `[start, end)` with a nonzero value.
    pub fn last_nonzero(&self, start: u32, end: u32) -> Option<u32> {
        let runs: Vec<_> = self.runs().collect();
        runs.into_iter().rev().find_map(|(s, e, value)| {
            let hi = e.min(end);
            (s.max(start) < hi && value != 0.0).then(|| hi - 1)
        })
    }
}

fn same_value(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}
