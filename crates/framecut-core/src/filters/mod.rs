// crates/framecut-core/src/filters/mod.rs
//
// Pixel filter engine.
//
// ╔══════════════════════════════════════════════════════════════╗
// ║  HOW TO ADD A FILTER: one line, everything else is auto     ║
// ╚══════════════════════════════════════════════════════════════╝
//
//   1. Add a variant to `FilterId` (and its string tag in `as_str`).
//   2. Create `filters/my_filter.rs`, impl `PixelFilter`, and add its
//      `mod my_filter;` line (one module may hold several filters).
//   3. Add ONE line to `declare_filters!` below:
//        my_filter::MyFilter,
//
//   The CLI listing, preview and export all pick it up from the registry.
//
// ── Architecture ─────────────────────────────────────────────────────────────
//
//   Layer 1: `FilterId`
//             Serialized tag ("grayscale", "sepia", ...). Unknown tags parse to
//             `FilterId::None` so a stale settings file degrades to identity
//             instead of failing the export.
//
//   Layer 2: `PixelFilter` trait
//             Pure pixel algorithm over a packed RGBA buffer, mutated in place.
//             No FFmpeg types cross this boundary.
//
//   Layer 3: Registry  (`registered()` for listing, `apply_filter()` for use)
//             Built once from `declare_filters!`. `None` is never in it;
//             `apply_filter` short-circuits on identity.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

pub mod helpers;

// ── Drop-in registration ──────────────────────────────────────────────────────

mod blur;
mod channel_mix;
mod grayscale;
mod invert;
mod tone;
mod vignette;

macro_rules! declare_filters {
    ( $( $filter:path ),* $(,)? ) => {
        fn make_entries() -> Vec<Box<dyn PixelFilter>> {
            vec![ $( Box::new($filter) ),* ]
        }
    };
}

declare_filters! {
    grayscale::Grayscale,
    channel_mix::Sepia,
    invert::Invert,
    blur::Blur,
    tone::Brightness,
    tone::Contrast,
    channel_mix::Vintage,
    vignette::Vignette,
}

// ── FilterId ──────────────────────────────────────────────────────────────────

/// Which per-frame transform to apply.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterId {
    /// Identity. Pixels pass through untouched.
    #[default]
    None,
    Grayscale,
    Sepia,
    Invert,
    Blur,
    Brightness,
    Contrast,
    Vintage,
    Vignette,
}

impl FilterId {
    pub const ALL: [FilterId; 9] = [
        FilterId::None,
        FilterId::Grayscale,
        FilterId::Sepia,
        FilterId::Invert,
        FilterId::Blur,
        FilterId::Brightness,
        FilterId::Contrast,
        FilterId::Vintage,
        FilterId::Vignette,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FilterId::None       => "none",
            FilterId::Grayscale  => "grayscale",
            FilterId::Sepia      => "sepia",
            FilterId::Invert     => "invert",
            FilterId::Blur       => "blur",
            FilterId::Brightness => "brightness",
            FilterId::Contrast   => "contrast",
            FilterId::Vintage    => "vintage",
            FilterId::Vignette   => "vignette",
        }
    }

    pub fn is_identity(self) -> bool {
        self == FilterId::None
    }

    /// Parse a tag without logging; `None` when the tag is unknown.
    pub fn lookup(tag: &str) -> Option<FilterId> {
        let tag = tag.trim();
        Self::ALL.iter().copied().find(|f| f.as_str().eq_ignore_ascii_case(tag))
    }
}

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterId {
    type Err = std::convert::Infallible;

    /// Unknown tags fall back to identity.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::lookup(s).unwrap_or_else(|| {
            tracing::warn!("[filters] unknown filter {s:?}, using identity");
            FilterId::None
        }))
    }
}

// ── PixelFilter trait ─────────────────────────────────────────────────────────

/// Algorithm contract for all filters.
///
/// # Buffer contract
/// `rgba` is packed RGBA8, `width * height * 4` bytes, no stride padding.
/// The filter mutates it in place. Alpha is left untouched; every colour
/// channel result is clamped to [0, 255].
///
/// # Performance
/// `apply()` runs once per exported frame. Keep inner loops inside the impl.
pub trait PixelFilter: Send + Sync {
    /// Registry key. Must match the `FilterId` variant this filter implements.
    fn id(&self) -> FilterId;

    /// Human-readable name for listings (e.g. `"Sepia"`).
    fn label(&self) -> &'static str;

    fn apply(&self, rgba: &mut [u8], width: u32, height: u32);
}

// ── Registry ──────────────────────────────────────────────────────────────────

fn registry() -> &'static HashMap<FilterId, Box<dyn PixelFilter>> {
    static REGISTRY: OnceLock<HashMap<FilterId, Box<dyn PixelFilter>>> = OnceLock::new();
    REGISTRY.get_or_init(|| make_entries().into_iter().map(|f| (f.id(), f)).collect())
}

/// All registered filters in stable display order. `None` is not included.
pub fn registered() -> Vec<Box<dyn PixelFilter>> {
    make_entries()
}

/// Label for any filter id, including `"None"` for identity.
pub fn label(id: FilterId) -> &'static str {
    match registry().get(&id) {
        Some(f) => f.label(),
        None    => "None",
    }
}

/// Apply `filter` to an RGBA buffer in place. Identity for `FilterId::None`.
pub fn apply_filter(rgba: &mut [u8], filter: FilterId, width: u32, height: u32) {
    if filter.is_identity() || rgba.is_empty() {
        return;
    }
    debug_assert_eq!(
        rgba.len(),
        width as usize * height as usize * 4,
        "apply_filter — buffer length {} does not match {}x{} RGBA",
        rgba.len(), width, height,
    );
    if let Some(f) = registry().get(&filter) {
        f.apply(rgba, width, height);
    }
}
