//! Effect catalog
//!
//! Closed mapping from effect name to a transformation recipe. Names that
//! are not in the table resolve to a substitute-clip lookup.

/// How a catalogued effect transforms a segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectRecipe {
    /// Single video filter expression; audio is stream-copied
    FilterGraph(&'static str),
    /// Playback speed change applied to video and audio together
    TimeRemap { speed: f64 },
}

impl EffectRecipe {
    /// Video filter expression for this recipe
    pub fn video_filter(&self) -> String {
        match self {
            EffectRecipe::FilterGraph(filter) => (*filter).to_string(),
            EffectRecipe::TimeRemap { speed } => format!("setpts={}*PTS", 1.0 / speed),
        }
    }

    /// Audio filter expression, only for time remaps
    pub fn audio_filter(&self) -> Option<String> {
        match self {
            EffectRecipe::FilterGraph(_) => None,
            EffectRecipe::TimeRemap { speed } => Some(atempo_chain(*speed)),
        }
    }
}

/// Outcome of resolving an effect name
#[derive(Debug, Clone, PartialEq)]
pub enum EffectStrategy {
    /// Catalogued effect
    Recipe {
        name: &'static str,
        recipe: EffectRecipe,
    },
    /// Not catalogued; look for a pre-rendered clip with this name
    Substitute { name: String },
}

const CATALOG: &[(&str, EffectRecipe)] = &[
    ("brightness_up", EffectRecipe::FilterGraph("eq=brightness=0.15")),
    ("brightness_down", EffectRecipe::FilterGraph("eq=brightness=-0.15")),
    ("contrast_up", EffectRecipe::FilterGraph("eq=contrast=1.3")),
    ("contrast_down", EffectRecipe::FilterGraph("eq=contrast=0.75")),
    ("saturation_up", EffectRecipe::FilterGraph("eq=saturation=1.6")),
    ("desaturate", EffectRecipe::FilterGraph("eq=saturation=0.5")),
    ("grayscale", EffectRecipe::FilterGraph("hue=s=0")),
    ("blur", EffectRecipe::FilterGraph("boxblur=5:1")),
    ("sharpen", EffectRecipe::FilterGraph("unsharp=5:5:1.0:5:5:0.0")),
    (
        "zoom_in",
        EffectRecipe::FilterGraph("scale=trunc(iw*1.5/2)*2:trunc(ih*1.5/2)*2,crop=trunc(iw/1.5/2)*2:trunc(ih/1.5/2)*2"),
    ),
    (
        "zoom_out",
        EffectRecipe::FilterGraph(
            "scale=trunc(iw*0.8/2)*2:trunc(ih*0.8/2)*2,pad=trunc(iw/0.8/2)*2:trunc(ih/0.8/2)*2:(ow-iw)/2:(oh-ih)/2",
        ),
    ),
    (
        "crop",
        EffectRecipe::FilterGraph("crop=trunc(iw*0.8/2)*2:trunc(ih*0.8/2)*2,scale=trunc(iw/0.8/2)*2:trunc(ih/0.8/2)*2"),
    ),
    ("flip_horizontal", EffectRecipe::FilterGraph("hflip")),
    ("flip_vertical", EffectRecipe::FilterGraph("vflip")),
    ("rotate_90", EffectRecipe::FilterGraph("transpose=clock")),
    ("rotate_180", EffectRecipe::FilterGraph("hflip,vflip")),
    ("rotate_270", EffectRecipe::FilterGraph("transpose=cclock")),
    ("vignette", EffectRecipe::FilterGraph("vignette=PI/4")),
    (
        "sepia",
        EffectRecipe::FilterGraph(
            "colorchannelmixer=.393:.769:.189:0:.349:.686:.168:0:.272:.534:.131",
        ),
    ),
    ("invert", EffectRecipe::FilterGraph("negate")),
    ("slow_motion", EffectRecipe::TimeRemap { speed: 0.5 }),
    ("fast_motion", EffectRecipe::TimeRemap { speed: 2.0 }),
];

const ALIASES: &[(&str, &str)] = &[
    ("zoom", "zoom_in"),
    ("zoomin", "zoom_in"),
    ("zoomout", "zoom_out"),
    ("bright", "brightness_up"),
    ("brighten", "brightness_up"),
    ("darken", "brightness_down"),
    ("contrast", "contrast_up"),
    ("saturate", "saturation_up"),
    ("saturation", "saturation_up"),
    ("gray", "grayscale"),
    ("greyscale", "grayscale"),
    ("black_white", "grayscale"),
    ("black_and_white", "grayscale"),
    ("bw", "grayscale"),
    ("flip", "flip_horizontal"),
    ("mirror", "flip_horizontal"),
    ("rotate", "rotate_90"),
    ("negative", "invert"),
    ("slowmo", "slow_motion"),
    ("slow_mo", "slow_motion"),
    ("slow", "slow_motion"),
    ("speed_up", "fast_motion"),
    ("fast", "fast_motion"),
    ("timelapse", "fast_motion"),
];

/// Lookup surface over the effect table
pub struct EffectCatalog;

impl EffectCatalog {
    /// Canonical form of a user-supplied name
    pub fn normalize_name(name: &str) -> String {
        name.trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '-' || c.is_whitespace() { '_' } else { c })
            .collect()
    }

    /// Resolve a name to its strategy
    pub fn lookup(name: &str) -> EffectStrategy {
        let normalized = Self::normalize_name(name);
        let canonical = ALIASES
            .iter()
            .find(|(alias, _)| *alias == normalized)
            .map(|(_, target)| *target)
            .unwrap_or(normalized.as_str());

        match CATALOG.iter().find(|(key, _)| *key == canonical) {
            Some((key, recipe)) => EffectStrategy::Recipe {
                name: *key,
                recipe: *recipe,
            },
            None => EffectStrategy::Substitute {
                name: name.trim().to_string(),
            },
        }
    }

    /// Every catalogued effect name
    pub fn names() -> impl Iterator<Item = &'static str> {
        CATALOG.iter().map(|(name, _)| *name)
    }

    /// Every catalogued entry
    pub fn entries() -> impl Iterator<Item = (&'static str, EffectRecipe)> {
        CATALOG.iter().map(|(name, recipe)| (*name, *recipe))
    }
}

/// `atempo` filter chain for a tempo factor
///
/// A single `atempo` stage only accepts factors in [0.5, 2.0].
fn atempo_chain(tempo: f64) -> String {
    let mut stages = Vec::new();
    let mut remaining = tempo;

    while remaining > 2.0 {
        stages.push(2.0);
        remaining /= 2.0;
    }
    while remaining < 0.5 {
        stages.push(0.5);
        remaining /= 0.5;
    }
    stages.push(remaining);

    stages
        .iter()
        .map(|factor| format!("atempo={}", factor))
        .collect::<Vec<_>>()
        .join(",")
}
