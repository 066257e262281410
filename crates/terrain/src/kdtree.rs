//! Static 2D k-d tree over projected terrain sample positions.

/// Balanced tree stored as a permutation of sample indices; the node for `idx[lo..hi]` sits at
/// the median and splits on `depth % 2`.
#[derive(Debug, Clone)]
pub(crate) struct KdTree {
    points: Vec<[f64; 2]>,
    order: Vec<usize>,
}

impl KdTree {
    pub(crate) fn build(points: Vec<[f64; 2]>) -> Self {
        let mut order: Vec<usize> = (0..points.len()).collect();
        split(&points, &mut order, 0);
        Self { points, order }
    }

    /// Index of the stored point closest to `query`; ties resolve to the lower index.
    pub(crate) fn nearest(&self, query: [f64; 2]) -> Option<usize> {
        if self.order.is_empty() {
            return None;
        }
        let mut best = Best {
            index: usize::MAX,
            dist2: f64::INFINITY,
        };
        self.search(&self.order, 0, query, &mut best);
        Some(best.index)
    }

    fn search(&self, order: &[usize], depth: usize, query: [f64; 2], best: &mut Best) {
        if order.is_empty() {
            return;
        }
        let mid = order.len() / 2;
        let index = order[mid];
        let point = self.points[index];
        best.offer(index, dist2(point, query));

        let axis = depth % 2;
        let delta = query[axis] - point[axis];
        let (near, far) = if delta < 0.0 {
            (&order[..mid], &order[mid + 1..])
        } else {
            (&order[mid + 1..], &order[..mid])
        };
        self.search(near, depth + 1, query, best);
        if delta * delta <= best.dist2 {
            self.search(far, depth + 1, query, best);
        }
    }
}

struct Best {
    index: usize,
    dist2: f64,
}

impl Best {
    fn offer(&mut self, index: usize, dist2: f64) {
        if dist2 < self.dist2 || (dist2 == self.dist2 && index < self.index) {
            self.index = index;
            self.dist2 = dist2;
        }
    }
}

fn split(points: &[[f64; 2]], order: &mut [usize], depth: usize) {
    if order.len() <= 1 {
        return;
    }
    let axis = depth % 2;
    let mid = order.len() / 2;
    order.select_nth_unstable_by(mid, |&a, &b| points[a][axis].total_cmp(&points[b][axis]));
    let (left, rest) = order.split_at_mut(mid);
    split(points, left, depth + 1);
    split(points, &mut rest[1..], depth + 1);
}

#[inline]
fn dist2(a: [f64; 2], b: [f64; 2]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    dx * dx + dy * dy
}
