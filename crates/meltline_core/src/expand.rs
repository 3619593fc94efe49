//! Transition expansion.
//!
//! Transcoding consumes tracks with every transition pre-expanded into a
//! triple of (leading leg, transition, trailing leg), where the legs are
//! trimmed copies of the neighbouring items covering exactly the overlap
//! region. The neighbours themselves stay in the list with the consumed
//! frames trimmed off, so the expanded track plays the same frames as the
//! original.

use crate::types::*;

/// One slot of an expanded track.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpandedItem {
    Clip(Clip),
    Gap(Gap),
    Stack(Stack),
    Transition(ExpandedTransition),
}

/// A transition together with trimmed copies of its neighbours. The legs
/// are values, never aliases: mutating them downstream cannot touch the
/// items still in the track.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedTransition {
    pub pre: Item,
    pub transition: Transition,
    pub post: Item,
}

/// Expand every transition in `track` into a triple and trim the
/// neighbouring items accordingly. Items trimmed to nothing are dropped.
pub fn expand_track(track: &Track) -> Vec<ExpandedItem> {
    let items = &track.items;
    let mut expanded = Vec::with_capacity(items.len());

    for (i, item) in items.iter().enumerate() {
        let prev = if i > 0 { items.get(i - 1) } else { None };
        let next = items.get(i + 1);

        match item {
            Item::Transition(t) => {
                expanded.push(ExpandedItem::Transition(ExpandedTransition {
                    pre: leading_leg(prev, t),
                    transition: *t,
                    post: trailing_leg(next, t),
                }));
            }
            Item::Clip(c) => {
                let mut start = c.source_range.start;
                let mut duration = c.source_range.duration;
                if let Some(Item::Transition(p)) = prev {
                    start = start + p.out_offset;
                    duration = duration - p.out_offset;
                }
                if let Some(Item::Transition(n)) = next {
                    duration = duration - n.in_offset;
                }
                if duration.0 <= 0 {
                    continue;
                }
                let mut clip = c.clone();
                clip.source_range = TimeRange::new(start, duration);
                expanded.push(ExpandedItem::Clip(clip));
            }
            Item::Gap(g) => {
                let mut duration = g.duration;
                if let Some(Item::Transition(p)) = prev {
                    duration = duration - p.out_offset;
                }
                if let Some(Item::Transition(n)) = next {
                    duration = duration - n.in_offset;
                }
                if duration.0 <= 0 {
                    continue;
                }
                expanded.push(ExpandedItem::Gap(Gap::new(duration)));
            }
            Item::Stack(s) => expanded.push(ExpandedItem::Stack(s.clone())),
        }
    }

    expanded
}

/// Copy of the item preceding a transition, trimmed to the overlap: the
/// leg starts `in_offset` frames before the item's last frame boundary and
/// spans the transition's overlap. Anything that cannot be trimmed (track
/// edge, adjacent transition, nested stack) becomes a gap leg, which the
/// transcoder renders as a solid fill.
fn leading_leg(neighbor: Option<&Item>, t: &Transition) -> Item {
    let span = t.overlap();
    match neighbor {
        Some(Item::Clip(c)) => {
            let mut leg = c.clone();
            leg.source_range =
                TimeRange::new(leg.source_range.end_exclusive() - t.in_offset, span);
            Item::Clip(leg)
        }
        _ => Item::Gap(Gap::new(span)),
    }
}

/// Copy of the item following a transition. Its media enters the overlap
/// `in_offset` frames before its own first trimmed frame.
fn trailing_leg(neighbor: Option<&Item>, t: &Transition) -> Item {
    let span = t.overlap();
    match neighbor {
        Some(Item::Clip(c)) => {
            let mut leg = c.clone();
            leg.source_range = TimeRange::new(leg.source_range.start - t.in_offset, span);
            Item::Clip(leg)
        }
        _ => Item::Gap(Gap::new(span)),
    }
}
