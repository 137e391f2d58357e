//! Two-word receipt aliases.

use rand::Rng;

const ADJECTIVES: &[&str] = &[
    "amber", "brave", "calm", "clever", "crisp", "eager", "fuzzy", "gentle", "glad", "golden", "humble", "jolly",
    "keen", "lively", "mellow", "nimble", "plucky", "quiet", "rapid", "shiny", "steady", "sunny", "swift", "witty",
];

const NOUNS: &[&str] = &[
    "badger", "beacon", "comet", "falcon", "fern", "garnet", "harbor", "heron", "lantern", "maple", "meadow",
    "otter", "pebble", "pine", "quartz", "raven", "reef", "ridge", "sparrow", "spruce", "summit", "thicket",
    "walnut", "willow",
];

/// Generate a human-friendly `adjective-noun` token, e.g. `brave-otter`.
///
/// Aliases are a convenience handle, not an identifier: uniqueness comes
/// from the receipt id.
pub fn two_word_alias() -> String {
    let mut rng = rand::thread_rng();
    let adjective = ADJECTIVES[rng.gen_range(0..ADJECTIVES.len())];
    let noun = NOUNS[rng.gen_range(0..NOUNS.len())];
    format!("{}-{}", adjective, noun)
}
