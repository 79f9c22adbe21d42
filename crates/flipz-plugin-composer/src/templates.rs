//! The response table: every canned line the composer can emit, plus the
//! routing keyword lists. Constant data, loaded once, never mutated.

pub const SLANG_OPENERS: &[&str] = &[
    "Yo!",
    "Ayy,",
    "No cap,",
    "Sheesh,",
    "Bet.",
    "Say less,",
    "Aight,",
];

pub const GENRE_LINES: &[(&str, &str)] = &[
    ("trap", "them trap hi-hats finna rattle the whole block."),
    ("drill", "sliding on a drill groove, keeping it gritty."),
    ("boom bap", "dusty boom bap drums straight out the crates."),
    ("phonk", "cowbells and tape hiss, phonk never dies."),
    ("hyperpop", "pitch it up, hyperpop chaos incoming."),
    ("cyberpunk", "neon cyberpunk pads all over the grid."),
    ("lofi", "lofi dust on every snare, keeping it cozy."),
    ("house", "four on the floor, house all night long."),
];

pub const MOOD_LINES: &[(&str, &str)] = &[
    ("hype", "Energy is maxed out, we going stupid hard on this one."),
    ("chill", "Keeping it smooth and low key, zero stress."),
    ("dark", "Pulling from that dark place, minor keys only."),
    ("melodic", "Laying melodic runs that actually hit the soul."),
];

pub const PROCESS_QUESTIONS: &[&str] = &[
    "What vibe are you chasing today?",
    "You hearing this in a club or in headphones?",
    "Want me to flip the tempo or keep it steady?",
    "Should the 808s knock or just hum underneath?",
];

pub const BEAT_TEMPLATES: &[&str] = &[
    "Cooking a {genre} beat at {bpm} BPM with {effect} drowning the tail.",
    "Locked in at {bpm} BPM, {genre} drums, a little {effect} on top.",
    "Say no more. {genre} instrumental, {bpm} BPM, {effect} cranked.",
];

pub const LYRIC_TEMPLATES: &[&str] = &[
    "Running a {genre} flow through the pen right now.",
    "Bars loading. {genre} cadence, double-time pockets.",
    "Scribbling {genre} verses, hooks first, ad-libs later.",
];

pub const EFFECTS: &[&str] = &[
    "reverb",
    "autotune",
    "distortion",
    "tape delay",
    "phaser",
    "sidechain",
];

pub const BEAT_KEYWORDS: &[&str] = &["beat", "instrumental", "808", "bassline"];
pub const LYRIC_KEYWORDS: &[&str] = &["lyric", "write", "verse", "bars", "rhyme"];
pub const HELP_KEYWORDS: &[&str] = &["help", "tutorial", "how do i", "commands"];

pub const DEFAULT_GENRE: &str = "trap";

pub const TUTORIAL_PROMPT: &str = "Here is the rundown: type /generate for a lyric sheet, \
/play to spin a beat, /stats for the board, or just tell me what sound you are after.";

pub const GLITCH_LINE: &str =
    "Systems glitch in the sound engine. Run that by me one more time.";

pub const LYRIC_HOOKS: &[&str] = &[
    "FLIPZ on the charts, {genre} in my veins",
    "Stack it, flip it, never lose the flame",
    "Midnight signal, {genre} frequency",
];

pub const LYRIC_VERSES: &[&str] = &[
    "Charts going vertical, candles in the green",
    "Studio lights low, cooking up the unseen",
    "Pocket full of rhythm, ledger full of proof",
    "Echo off the concrete, bass through the roof",
    "Every bar minted, nothing here is loaned",
    "Static on the airwaves, sound we fully own",
];

pub const LYRIC_OUTROS: &[&str] = &[
    "Fade it out slow, let the tape run on",
    "Lights down, last chord, gone by dawn",
];
