//! Closed detection vocabularies. Loaded once, never mutated.

pub const GENRES: &[&str] = &[
    "trap",
    "drill",
    "boom bap",
    "phonk",
    "hyperpop",
    "cyberpunk",
    "lofi",
    "house",
];

/// Mood buckets scanned in order. A hit on any keyword sets the bucket;
/// later buckets overwrite earlier hits.
pub const MOOD_BUCKETS: &[(&str, &[&str])] = &[
    ("hype", &["hype", "crazy", "insane", "lit", "energy", "wild", "turnt"]),
    ("chill", &["chill", "relax", "smooth", "mellow", "calm", "laid back"]),
    ("dark", &["dark", "evil", "sinister", "moody", "grim", "haunted"]),
    ("melodic", &["melodic", "melody", "emotional", "beautiful", "harmony", "soulful"]),
];

pub const TECH_TERMS: &[&str] = &["mix", "master", "eq", "compress", "effect", "plugin", "daw"];

pub const STOPWORDS: &[&str] = &[
    "the", "and", "for", "that", "this", "with", "your", "just", "like", "about", "what",
    "have", "want", "need", "some", "from", "into", "then",
];
