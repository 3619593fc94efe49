//! Document assembly: walks the timeline once, top to bottom, and lays
//! the collected nodes out in the order the engine resolves them.

use crate::element::Element;
use crate::error::{MltError, Result};
use crate::producer::{Namespace, ProducerRegistry, COLOR_BLACK};
use crate::profile::{ProfileSetting, WriteOptions};
use crate::transition::synthesize_transition;
use meltline_core::{
    expand_track, Clip, Effect, ExpandedItem, Frames, Item, Stack, Timeline, Track, TrackKind,
};
use std::borrow::Cow;
use tracing::debug;

/// Anything the transcoder accepts as a composition root.
#[derive(Debug, Clone, Copy)]
pub enum Input<'a> {
    Timeline(&'a Timeline),
    Stack(&'a Stack),
    Track(&'a Track),
    Clip(&'a Clip),
    Item(&'a Item),
}

impl<'a> From<&'a Timeline> for Input<'a> {
    fn from(t: &'a Timeline) -> Self {
        Input::Timeline(t)
    }
}

impl<'a> From<&'a Stack> for Input<'a> {
    fn from(s: &'a Stack) -> Self {
        Input::Stack(s)
    }
}

impl<'a> From<&'a Track> for Input<'a> {
    fn from(t: &'a Track) -> Self {
        Input::Track(t)
    }
}

impl<'a> From<&'a Clip> for Input<'a> {
    fn from(c: &'a Clip) -> Self {
        Input::Clip(c)
    }
}

impl<'a> From<&'a Item> for Input<'a> {
    fn from(i: &'a Item) -> Self {
        Input::Item(i)
    }
}

/// Transcode `input` into the engine's document text. Every call runs in
/// a fresh context: repeated conversions never see each other's state.
pub fn write_to_string<'a>(
    input: impl Into<Input<'a>>,
    options: &WriteOptions,
) -> Result<String> {
    let (stack, rate_hint) = normalize(input.into())?;
    let mut assembler = DocumentAssembler::new();
    let root_tractor = assembler.assemble(stack.as_ref())?;
    let document = assembler.into_document(options, rate_hint, root_tractor);
    Ok(document.to_pretty_xml())
}

/// Wrap bare tracks and clips into a synthetic stack; reject items that
/// cannot stand alone as a composition.
fn normalize(input: Input<'_>) -> Result<(Cow<'_, Stack>, Option<f64>)> {
    match input {
        Input::Timeline(t) => Ok((Cow::Borrowed(&t.tracks), t.global_start.map(|s| s.rate))),
        Input::Stack(s) => Ok((Cow::Borrowed(s), None)),
        Input::Track(t) => Ok((Cow::Owned(stack_of(t.clone())), None)),
        Input::Clip(c) => Ok((Cow::Owned(stack_of(track_of(c.clone()))), None)),
        Input::Item(Item::Stack(s)) => Ok((Cow::Borrowed(s), None)),
        Input::Item(Item::Clip(c)) => Ok((Cow::Owned(stack_of(track_of(c.clone()))), None)),
        Input::Item(Item::Gap(_)) => Err(MltError::InvalidInput("Gap")),
        Input::Item(Item::Transition(_)) => Err(MltError::InvalidInput("Transition")),
    }
}

fn stack_of(track: Track) -> Stack {
    let mut stack = Stack::new();
    stack.tracks.push(track);
    stack
}

fn track_of(clip: Clip) -> Track {
    let mut track = Track::new(TrackKind::Video);
    track.items.push(Item::Clip(clip));
    track
}

/// Per-conversion context. Owns the producer registry and the append-only
/// creation-order lists of playlists and transition tractors.
struct DocumentAssembler {
    registry: ProducerRegistry,
    playlists: Vec<Element>,
    transitions: Vec<Element>,
    playlist_counter: usize,
}

impl DocumentAssembler {
    fn new() -> Self {
        Self {
            registry: ProducerRegistry::new(),
            playlists: vec![],
            transitions: vec![],
            playlist_counter: 0,
        }
    }

    /// Root composition: background fill first, then one slot per track.
    fn assemble(&mut self, stack: &Stack) -> Result<Element> {
        let mut tractor = Element::new("tractor").attr("id", "tractor0");
        let mut multitrack = Element::new("multitrack").attr("id", "multitrack0");

        self.background(stack, &mut multitrack);
        for track in &stack.tracks {
            self.assemble_track(track, &mut multitrack)?;
        }

        tractor.push(multitrack);
        Ok(tractor)
    }

    /// Synthetic fill under the whole composition, so gaps on every track
    /// still have content behind them.
    fn background(&mut self, stack: &Stack, multitrack: &mut Element) {
        let length = stack.duration();
        let fill = self.registry.fill_producer(COLOR_BLACK, length);

        let mut playlist = Element::new("playlist").attr("id", "background");
        playlist.push(entry(&fill, Frames::ZERO, Frames(length.0 - 1)));
        self.playlists.push(playlist);

        multitrack.push(Element::new("track").attr("producer", "background"));
    }

    fn assemble_track(&mut self, track: &Track, parent: &mut Element) -> Result<()> {
        let id = track
            .name
            .clone()
            .unwrap_or_else(|| format!("playlist{}", self.playlist_counter));
        self.playlist_counter += 1;
        debug!(playlist = %id, items = track.items.len(), "assembling track");

        // Reserve the playlist's slot in creation order before walking its
        // items, so recursion keeps parents ahead of their children.
        let slot = self.playlists.len();
        self.playlists
            .push(Element::new("playlist").attr("id", id.clone()));

        let reference_tag = if parent.tag() == "playlist" {
            "entry"
        } else {
            "track"
        };
        parent.push(Element::new(reference_tag).attr("producer", id.clone()));

        let is_audio = track.kind == TrackKind::Audio;
        let mut playlist = Element::new("playlist").attr("id", id);

        for item in expand_track(track) {
            match item {
                ExpandedItem::Clip(clip) => {
                    // An audio clip whose media already plays on a video
                    // track would double up; skip it entirely.
                    if is_audio
                        && self
                            .registry
                            .contains_video(ProducerRegistry::clip_identity(&clip))
                    {
                        continue;
                    }
                    let ns = if is_audio {
                        Namespace::Audio
                    } else {
                        Namespace::Video
                    };
                    let producer = self.registry.clip_producer(&clip, ns);
                    let range = clip.source_range;
                    let mut clip_entry = entry(&producer, range.start, range.end_inclusive());
                    self.apply_effects(&clip, &mut clip_entry)?;
                    playlist.push(clip_entry);
                }
                ExpandedItem::Gap(gap) => {
                    playlist.push(Element::new("blank").attr("length", gap.duration.to_string()));
                }
                ExpandedItem::Transition(expanded) => {
                    let (tractor, tractor_entry) = synthesize_transition(
                        &expanded,
                        self.transitions.len(),
                        &mut self.registry,
                    );
                    self.transitions.push(tractor);
                    playlist.push(tractor_entry);
                }
                ExpandedItem::Stack(stack) => {
                    for sub in &stack.tracks {
                        self.assemble_track(sub, &mut playlist)?;
                    }
                }
            }
        }

        self.playlists[slot] = playlist;
        Ok(())
    }

    /// Apply the clip's effects to its entry in declaration order. Only
    /// time-altering kinds act; transition legs never come through here,
    /// so composites are never retroactively rewritten.
    fn apply_effects(&mut self, clip: &Clip, clip_entry: &mut Element) -> Result<()> {
        for effect in &clip.effects {
            match effect {
                Effect::LinearTimeWarp { time_scalar } => {
                    self.registry.retime_entry(clip_entry, *time_scalar)?;
                }
                Effect::FreezeFrame => {
                    self.registry
                        .freeze_entry(clip_entry, clip.source_range.start)?;
                }
                Effect::Other { .. } => {}
            }
        }
        Ok(())
    }

    /// Final document layout: profile, producers in creation order,
    /// transition tractors, playlists, then the root composition. The
    /// engine resolves references top-down, so this order is contractual.
    fn into_document(
        self,
        options: &WriteOptions,
        rate_hint: Option<f64>,
        root_tractor: Element,
    ) -> Element {
        let mut root = Element::new("mlt");
        match (&options.profile, rate_hint) {
            (Some(setting), _) => root.push(setting.to_element()),
            (None, Some(rate)) => root.push(ProfileSetting::Rate(rate).to_element()),
            (None, None) => {}
        }
        for producer in self.registry.into_producers() {
            root.push(producer);
        }
        for tractor in self.transitions {
            root.push(tractor);
        }
        for playlist in self.playlists {
            root.push(playlist);
        }
        root.push(root_tractor);
        root
    }
}

fn entry(producer: &str, in_: Frames, out: Frames) -> Element {
    Element::new("entry")
        .attr("producer", producer)
        .attr("in", in_.to_string())
        .attr("out", out.to_string())
}
