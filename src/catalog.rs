// The fixed list of queries offered in the menu. Stored as a slice of
// (label, query) pairs so menu numbering never depends on map iteration
// order.

/// Holiday graph queries, in menu order.
pub const HOLIDAY_QUERIES: &[(&str, &str)] = &[
    ("Get Vertex Count", "g.V().count()"),
    ("Get Unique Vertex Labels", "g.V().label().dedup()"),
    ("Get Edge Count", "g.E().count()"),
    ("Get Unique Edge Labels", "g.E().label().dedup()"),
    ("Get All Vertices", "g.V()"),
    ("Get All Holiday Vertices", "g.V().hasLabel('Holiday')"),
    ("Get All Country Vertices", "g.V().hasLabel('Country')"),
    ("Get All Edges", "g.E()"),
    ("Get First Vertex", "g.V().limit(1)"),
    (
        "Get All Properties and Values for a Holiday vertex",
        "g.V().hasLabel('Holiday').limit(1).valueMap()",
    ),
    (
        "Get All Vertices with a holidayDate property",
        "g.V().has('holidayDate')",
    ),
    (
        "Get All Vertices without a holidayDate property",
        "g.V().hasNot('holidayDate')",
    ),
    (
        "Get the Number of Holidays by Date",
        "g.V().hasLabel('Holiday').group().by('holidayDate').by(values('name').count())",
    ),
    (
        "Get the Holidays Ordered by Date, then Name",
        "g.V().hasLabel('Holiday').order().by('holidayDate').by('name').valueMap('name','holidayDate')",
    ),
    (
        "Get Holidays Between Colombia and Mexico",
        "g.V().has('name','Colombia').outE().inV().inE().outV().has('name','Mexico')",
    ),
    (
        "Get Holidays Between Colombia and Mexico - Path",
        "g.V().has('name','Colombia').outE().inV().inE().outV().has('name','Mexico').path()",
    ),
    (
        "Get Holidays Between Colombia and Mexico - Execution Profile",
        "g.V().has('name','Colombia').outE().inV().inE().outV().has('name','Mexico').executionprofile()",
    ),
];

/// One named query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    pub label: &'static str,
    pub query: &'static str,
}

/// What a numeric menu choice refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Exit,
    Entry(Operation),
    OutOfRange(i64),
}

/// Immutable, ordered operation catalog.
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    entries: &'static [(&'static str, &'static str)],
}

impl Catalog {
    pub const fn new(entries: &'static [(&'static str, &'static str)]) -> Self {
        Catalog { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in menu order.
    pub fn operations(&self) -> impl Iterator<Item = Operation> + '_ {
        self.entries
            .iter()
            .map(|&(label, query)| Operation { label, query })
    }

    /// Resolve a 1-based menu choice. `0` means exit.
    pub fn select(&self, choice: i64) -> Selection {
        if choice == 0 {
            return Selection::Exit;
        }
        usize::try_from(choice)
            .ok()
            .and_then(|n| self.entries.get(n - 1))
            .map(|&(label, query)| Selection::Entry(Operation { label, query }))
            .unwrap_or(Selection::OutOfRange(choice))
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::new(HOLIDAY_QUERIES)
    }
}
