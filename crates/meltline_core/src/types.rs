use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

/// A count of frames at the timeline's nominal rate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Frames(pub i64);

impl Frames {
    pub const ZERO: Self = Self(0);
}

impl Add for Frames {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Frames {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for Frames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// TimeRange
// ---------------------------------------------------------------------------

/// A trimmed range in frame units. An item starting at frame S with
/// duration D occupies frames [S, S+D-1].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TimeRange {
    pub start: Frames,
    pub duration: Frames,
}

impl TimeRange {
    pub fn new(start: Frames, duration: Frames) -> Self {
        Self { start, duration }
    }

    /// First frame past the range.
    pub fn end_exclusive(&self) -> Frames {
        self.start + self.duration
    }

    /// Last frame inside the range.
    pub fn end_inclusive(&self) -> Frames {
        Frames(self.start.0 + self.duration.0 - 1)
    }
}

// ---------------------------------------------------------------------------
// RationalTime
// ---------------------------------------------------------------------------

/// A time value at an explicit rate. Only used for the timeline's global
/// start, which establishes the nominal frame rate of the whole document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RationalTime {
    pub value: f64,
    pub rate: f64,
}

impl RationalTime {
    pub fn new(value: f64, rate: f64) -> Self {
        Self { value, rate }
    }
}

// ---------------------------------------------------------------------------
// MediaReference
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExternalReference {
    pub name: Option<String>,
    pub target_url: String,
}

/// A frame-numbered sequence of images on disk, addressed by a templated
/// locator instead of a single file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageSequenceReference {
    pub name: Option<String>,
    pub target_url_base: String,
    pub name_prefix: String,
    pub name_suffix: String,
    pub start_frame: i64,
    pub frame_zero_padding: usize,
}

impl ImageSequenceReference {
    /// Expand the templated locator with `frame_symbol` standing in for the
    /// frame number (e.g. `%04d`).
    pub fn abstract_target_url(&self, frame_symbol: &str) -> String {
        let mut url = self.target_url_base.clone();
        if !url.is_empty() && !url.ends_with('/') {
            url.push('/');
        }
        url.push_str(&self.name_prefix);
        url.push_str(frame_symbol);
        url.push_str(&self.name_suffix);
        url
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum MediaReference {
    External(ExternalReference),
    ImageSequence(ImageSequenceReference),
    Missing,
}

impl MediaReference {
    pub fn name(&self) -> Option<&str> {
        match self {
            MediaReference::External(r) => r.name.as_deref(),
            MediaReference::ImageSequence(r) => r.name.as_deref(),
            MediaReference::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, MediaReference::Missing)
    }
}

// ---------------------------------------------------------------------------
// Effect
// ---------------------------------------------------------------------------

/// Effects attached to a clip. Only the time-altering kinds are meaningful
/// to the transcoder; anything else is carried as `Other` and ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Effect {
    LinearTimeWarp { time_scalar: f64 },
    FreezeFrame,
    Other { name: String },
}

// ---------------------------------------------------------------------------
// Transition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransitionKind {
    Dissolve,
    FadeIn,
    FadeOut,
}

impl TransitionKind {
    /// Classify from the offsets. Both offsets zero is a degenerate
    /// dissolve.
    pub fn from_offsets(in_offset: Frames, out_offset: Frames) -> Self {
        match (in_offset.0 > 0, out_offset.0 > 0) {
            (true, false) => TransitionKind::FadeIn,
            (false, true) => TransitionKind::FadeOut,
            _ => TransitionKind::Dissolve,
        }
    }
}

/// A cross-fade between two neighbouring items. `in_offset` frames are
/// consumed from the preceding item, `out_offset` from the following one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Transition {
    pub in_offset: Frames,
    pub out_offset: Frames,
    pub kind: TransitionKind,
}

impl Transition {
    pub fn new(in_offset: Frames, out_offset: Frames) -> Self {
        Self {
            in_offset,
            out_offset,
            kind: TransitionKind::from_offsets(in_offset, out_offset),
        }
    }

    /// Number of frames of cross-fade the transition exposes when played.
    pub fn overlap(&self) -> Frames {
        Frames(self.in_offset.0 + self.out_offset.0 - 1)
    }
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Clip {
    pub id: Uuid,
    pub name: String,
    pub source_range: TimeRange,
    pub media: MediaReference,
    pub effects: Vec<Effect>,
}

impl Clip {
    pub fn new(name: impl Into<String>, source_range: TimeRange, media: MediaReference) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            source_range,
            media,
            effects: vec![],
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Gap {
    pub duration: Frames,
}

impl Gap {
    pub fn new(duration: Frames) -> Self {
        Self { duration }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Stack {
    pub name: Option<String>,
    pub tracks: Vec<Track>,
}

impl Stack {
    pub fn new() -> Self {
        Self {
            name: None,
            tracks: vec![],
        }
    }

    /// Tracks composite on top of each other, so the stack lasts as long
    /// as its longest track.
    pub fn duration(&self) -> Frames {
        Frames(self.tracks.iter().map(|t| t.duration().0).max().unwrap_or(0))
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Item {
    Clip(Clip),
    Gap(Gap),
    Transition(Transition),
    Stack(Stack),
}

impl Item {
    /// Frames the item contributes to its track. Transitions overlap their
    /// neighbours and contribute nothing.
    pub fn duration(&self) -> Frames {
        match self {
            Item::Clip(c) => c.source_range.duration,
            Item::Gap(g) => g.duration,
            Item::Transition(_) => Frames::ZERO,
            Item::Stack(s) => s.duration(),
        }
    }
}

// ---------------------------------------------------------------------------
// Track
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TrackKind {
    Video,
    Audio,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Track {
    pub id: Uuid,
    pub name: Option<String>,
    pub kind: TrackKind,
    pub items: Vec<Item>,
}

impl Track {
    pub fn new(kind: TrackKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: None,
            kind,
            items: vec![],
        }
    }

    pub fn duration(&self) -> Frames {
        Frames(self.items.iter().map(|i| i.duration().0).sum())
    }
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Timeline {
    pub name: String,
    pub global_start: Option<RationalTime>,
    pub tracks: Stack,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
