/// The engine-wide permission chain, highest first. Holding a relation
/// implicitly satisfies every lower one. This is deployment configuration,
/// not per-namespace schema; relation names outside the chain simply take
/// no part in inheritance.
pub const PERMISSION_CHAIN: [(&str, u8); 5] = [
    ("owner", 5),
    ("admin", 4),
    ("editor", 3),
    ("commenter", 2),
    ("viewer", 1),
];

/// Level of a chain relation; `None` for caller-defined relations.
pub fn level(relation: &str) -> Option<u8> {
    PERMISSION_CHAIN
        .iter()
        .find(|(name, _)| *name == relation)
        .map(|(_, level)| *level)
}

/// Relations whose level strictly exceeds the given one, nearest first.
/// Empty for non-chain relations and for the top of the chain.
pub fn relations_above(relation: &str) -> Vec<&'static str> {
    let Some(requested) = level(relation) else {
        return Vec::new();
    };
    let mut higher: Vec<(&'static str, u8)> = PERMISSION_CHAIN
        .iter()
        .filter(|(_, l)| *l > requested)
        .copied()
        .collect();
    higher.sort_by_key(|(_, l)| *l);
    higher.into_iter().map(|(name, _)| name).collect()
}
