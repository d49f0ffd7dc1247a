//! Net reconstruction.
//!
//! Labelled wires seed the nets. Unlabelled fragments are folded into them
//! one at a time: the first labelled segment (in scan order) that accepts the
//! first fragment (in pool order) wins, the fragment leaves the pool and its
//! segment joins the scan table, where it may in turn pick up further
//! fragments. When nothing attaches anymore, the first fragment left in the
//! pool becomes a net of its own under a generated `netN` name and the whole
//! process starts again, until the pool is empty.
//!
//! Ties go to scan order, never to distance. The results are therefore
//! identical for identical input order.

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Segment};

/// Index of a net inside a [`NetAggregator`].
pub type NetId = usize;

/// Prefix of generated net names.
pub const SYNTHETIC_PREFIX: &str = "net";

/// A named polyline read from the sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelledWire {
    pub name: String,
    pub points: Vec<Point>,
}

impl LabelledWire {
    pub fn new(name: impl Into<String>, points: impl IntoIterator<Item = Point>) -> Self {
        Self {
            name: name.into(),
            points: points.into_iter().collect(),
        }
    }

    /// Consecutive point pairs.
    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        self.points.windows(2).map(|pair| Segment::new(pair[0], pair[1]))
    }
}

/// An electrical net after aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Net {
    pub name: String,
    pub segments: Vec<Segment>,
    /// The name was generated rather than read from the sheet.
    #[serde(default)]
    pub synthetic: bool,
}

impl Net {
    /// Whether `p` is an end of one of the net's segments.
    pub fn touches(&self, p: Point) -> bool {
        self.segments.iter().any(|s| s.has_endpoint(p))
    }
}

#[derive(Debug, Default)]
pub struct NetAggregator {
    nets: Vec<Net>,
    by_name: HashMap<String, NetId>,
    /// Every labelled segment with its owner, in the order it joined.
    scan: Vec<(NetId, Segment)>,
    /// Unlabelled fragments; `None` once taken.
    pool: Vec<Option<Segment>>,
    next_synthetic: usize,
}

impl NetAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a wire read with a `netname`. Wires sharing a name share a net.
    pub fn add_labelled(&mut self, wire: &LabelledWire) -> NetId {
        let id = self.net_named(&wire.name, false);
        for segment in wire.segments() {
            self.attach(id, segment);
        }
        id
    }

    /// Add an already aggregated net, keeping its `synthetic` flag.
    pub fn add_net(&mut self, net: &Net) -> NetId {
        let id = self.net_named(&net.name, net.synthetic);
        for segment in &net.segments {
            self.attach(id, *segment);
        }
        id
    }

    pub fn add_fragment(&mut self, fragment: Segment) {
        self.pool.push(Some(fragment));
    }

    /// Fragments still waiting for a net.
    pub fn pending(&self) -> usize {
        self.pool.iter().flatten().count()
    }

    pub fn nets(&self) -> &[Net] {
        &self.nets
    }

    /// Move the first attachable fragment into its net.
    ///
    /// Returns the receiving net and the moved segment, or `None` when no
    /// fragment touches any labelled segment.
    pub fn absorb_one(&mut self) -> Option<(NetId, Segment)> {
        let (id, slot) = self.scan.iter().find_map(|(id, wire)| {
            self.pool
                .iter()
                .position(|frag| frag.as_ref().is_some_and(|frag| wire.accepts(frag)))
                .map(|slot| (*id, slot))
        })?;

        let segment = self.pool[slot].take()?;
        debug!(
            "Aggregating fragment {slot} ({segment}) into net {}",
            self.nets[id].name
        );
        self.attach(id, segment);
        Some((id, segment))
    }

    /// Turn the first fragment left in the pool into a new synthetic net.
    pub fn promote_first(&mut self) -> Option<NetId> {
        let segment = self.pool.iter_mut().find_map(Option::take)?;
        let name = self.synthetic_name();
        debug!("Promoting fragment {segment} to net {name}");
        let id = self.net_named(&name, true);
        self.attach(id, segment);
        Some(id)
    }

    /// Absorb and promote until the pool is empty.
    pub fn run(mut self) -> Vec<Net> {
        loop {
            while self.absorb_one().is_some() {}
            if self.promote_first().is_none() {
                break;
            }
        }
        self.nets
    }

    fn net_named(&mut self, name: &str, synthetic: bool) -> NetId {
        if let Some(id) = self.by_name.get(name) {
            return *id;
        }
        let id = self.nets.len();
        self.nets.push(Net {
            name: name.to_string(),
            segments: Vec::new(),
            synthetic,
        });
        self.by_name.insert(name.to_string(), id);
        id
    }

    fn attach(&mut self, id: NetId, segment: Segment) {
        self.nets[id].segments.push(segment);
        self.scan.push((id, segment));
    }

    // Names already on the sheet are skipped, the counter still advances.
    fn synthetic_name(&mut self) -> String {
        loop {
            let name = format!("{SYNTHETIC_PREFIX}{}", self.next_synthetic);
            self.next_synthetic += 1;
            if !self.by_name.contains_key(&name) {
                return name;
            }
        }
    }
}

/// Aggregate one sheet's wires into nets.
///
/// Labelled nets come first in order of first appearance, followed by
/// synthetic nets in promotion order.
pub fn aggregate(labelled: &[LabelledWire], fragments: &[Segment]) -> Vec<Net> {
    let mut aggregator = NetAggregator::new();
    for wire in labelled {
        aggregator.add_labelled(wire);
    }
    for fragment in fragments {
        aggregator.add_fragment(*fragment);
    }
    debug!(
        "Aggregating {} fragments into {} labelled nets",
        fragments.len(),
        aggregator.nets().len()
    );
    aggregator.run()
}
