//! Minimum-cost flow on small dense-ish networks, solved by successive
//! shortest augmenting paths. Arcs are scanned in insertion order and
//! relaxations only accept strict improvements, so identical inputs
//! always produce identical flows.

const INF: i64 = i64::MAX / 4;

#[derive(Debug, Clone)]
struct Arc {
    from: usize,
    to: usize,
    cap: i64,
    cost: i64,
    flow: i64,
}

/// Node supplies are set with [`MinCostFlow::add_supply`]; negative
/// amounts are demands. `solve` routes every unit of supply or reports
/// infeasibility.
#[derive(Debug, Clone, Default)]
pub(crate) struct MinCostFlow {
    arcs: Vec<Arc>,
    supply: Vec<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Infeasible;

impl MinCostFlow {
    pub(crate) fn new(num_nodes: usize) -> Self {
        Self {
            arcs: Vec::new(),
            supply: vec![0; num_nodes],
        }
    }

    pub(crate) fn add_arc(&mut self, from: usize, to: usize, cap: i64, cost: i64) -> usize {
        self.arcs.push(Arc {
            from,
            to,
            cap,
            cost,
            flow: 0,
        });
        self.arcs.len() - 1
    }

    pub(crate) fn add_supply(&mut self, node: usize, amount: i64) {
        self.supply[node] += amount;
    }

    pub(crate) fn flow(&self, arc: usize) -> i64 {
        self.arcs[arc].flow
    }

    /// Routes all supply at minimum total cost and returns that cost.
    pub(crate) fn solve(&mut self) -> Result<i64, Infeasible> {
        let n = self.supply.len();
        let source = n;
        let sink = n + 1;
        let num_user_arcs = self.arcs.len();

        let mut total_supply = 0i64;
        let mut total_demand = 0i64;
        for (node, &amount) in self.supply.iter().enumerate() {
            if amount > 0 {
                self.arcs.push(Arc {
                    from: source,
                    to: node,
                    cap: amount,
                    cost: 0,
                    flow: 0,
                });
                total_supply += amount;
            } else if amount < 0 {
                self.arcs.push(Arc {
                    from: node,
                    to: sink,
                    cap: -amount,
                    cost: 0,
                    flow: 0,
                });
                total_demand += -amount;
            }
        }
        if total_supply != total_demand {
            self.arcs.truncate(num_user_arcs);
            return Err(Infeasible);
        }

        let mut routed = 0i64;
        while routed < total_supply {
            let Some(path) = self.shortest_path(n + 2, source, sink) else {
                break;
            };
            let mut bottleneck = total_supply - routed;
            for &(arc, forward) in &path {
                let residual = if forward {
                    self.arcs[arc].cap - self.arcs[arc].flow
                } else {
                    self.arcs[arc].flow
                };
                bottleneck = bottleneck.min(residual);
            }
            for &(arc, forward) in &path {
                if forward {
                    self.arcs[arc].flow += bottleneck;
                } else {
                    self.arcs[arc].flow -= bottleneck;
                }
            }
            routed += bottleneck;
        }

        let feasible = routed == total_supply;
        let cost = self.arcs[..num_user_arcs]
            .iter()
            .map(|a| a.flow * a.cost)
            .sum();
        self.arcs.truncate(num_user_arcs);
        if feasible { Ok(cost) } else { Err(Infeasible) }
    }

    /// Bellman-Ford over the residual network; residual back-arcs carry
    /// negated cost, which rules out Dijkstra here.
    fn shortest_path(
        &self,
        num_nodes: usize,
        source: usize,
        sink: usize,
    ) -> Option<Vec<(usize, bool)>> {
        let mut dist = vec![INF; num_nodes];
        let mut pred: Vec<Option<(usize, bool)>> = vec![None; num_nodes];
        dist[source] = 0;
        for _ in 0..num_nodes {
            let mut improved = false;
            for (idx, arc) in self.arcs.iter().enumerate() {
                if arc.cap - arc.flow > 0
                    && dist[arc.from] < INF
                    && dist[arc.from] + arc.cost < dist[arc.to]
                {
                    dist[arc.to] = dist[arc.from] + arc.cost;
                    pred[arc.to] = Some((idx, true));
                    improved = true;
                }
                if arc.flow > 0 && dist[arc.to] < INF && dist[arc.to] - arc.cost < dist[arc.from] {
                    dist[arc.from] = dist[arc.to] - arc.cost;
                    pred[arc.from] = Some((idx, false));
                    improved = true;
                }
            }
            if !improved {
                break;
            }
        }
        if dist[sink] >= INF {
            return None;
        }
        let mut path = Vec::new();
        let mut node = sink;
        while node != source {
            let (arc, forward) = pred[node]?;
            path.push((arc, forward));
            node = if forward {
                self.arcs[arc].from
            } else {
                self.arcs[arc].to
            };
        }
        path.reverse();
        Some(path)
    }
}
