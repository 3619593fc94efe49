//! Transition synthesis: one two-slot tractor plus a cross-fade
//! descriptor per expanded transition.

use crate::element::Element;
use crate::producer::{Namespace, ProducerRegistry, COLOR_BLACK, COLOR_TRANSPARENT};
use meltline_core::{ExpandedTransition, Frames, Item, TransitionKind};

/// The engine's dissolve function; slot 0 fades into slot 1.
pub const DISSOLVE_SERVICE: &str = "luma";

/// Build the composite for one expanded transition. `index` is the
/// document-wide transition count, which keeps tractor ids unique even
/// when several transitions share endpoints. Returns the tractor and the
/// playlist entry referencing it.
pub fn synthesize_transition(
    expanded: &ExpandedTransition,
    index: usize,
    registry: &mut ProducerRegistry,
) -> (Element, Element) {
    let transition = &expanded.transition;
    let span = transition.overlap();
    let out = span.0 - 1;
    let name = format!("transition_tractor{index}");

    // A fade has no real item on one side; that slot becomes a
    // transparent fill sized to the fade offset.
    let (a_id, a_in) = match transition.kind {
        TransitionKind::FadeIn => (
            registry.fill_producer(COLOR_TRANSPARENT, transition.in_offset),
            Frames::ZERO,
        ),
        _ => leg_slot(&expanded.pre, span, registry),
    };
    let (b_id, b_in) = match transition.kind {
        TransitionKind::FadeOut => (
            registry.fill_producer(COLOR_TRANSPARENT, transition.out_offset),
            Frames::ZERO,
        ),
        _ => leg_slot(&expanded.post, span, registry),
    };

    let mut tractor = Element::new("tractor")
        .attr("id", name.clone())
        .attr("in", "0")
        .attr("out", out.to_string());
    tractor.push(slot(&a_id, a_in, span));
    tractor.push(slot(&b_id, b_in, span));

    let mut descriptor = Element::new("transition")
        .attr("id", format!("transition{index}"))
        .attr("out", out.to_string());
    descriptor.push(Element::property("a_track", "0"));
    descriptor.push(Element::property("b_track", "1"));
    descriptor.push(Element::property("factory", "loader"));
    descriptor.push(Element::property("mlt_service", DISSOLVE_SERVICE));
    tractor.push(descriptor);

    let entry = Element::new("entry")
        .attr("producer", name)
        .attr("in", "0")
        .attr("out", out.to_string());

    (tractor, entry)
}

fn leg_slot(leg: &Item, span: Frames, registry: &mut ProducerRegistry) -> (String, Frames) {
    match leg {
        Item::Clip(c) => (
            registry.clip_producer(c, Namespace::Video),
            c.source_range.start,
        ),
        Item::Gap(g) => (registry.fill_producer(COLOR_BLACK, g.duration), Frames::ZERO),
        // Expansion only produces clip or gap legs; anything else is
        // covered with a fill over the whole overlap.
        _ => (registry.fill_producer(COLOR_BLACK, span), Frames::ZERO),
    }
}

/// One track slot: `span` frames of the producer starting at `in_`.
fn slot(producer: &str, in_: Frames, span: Frames) -> Element {
    Element::new("track")
        .attr("producer", producer)
        .attr("in", in_.to_string())
        .attr("out", (in_.0 + span.0 - 1).to_string())
}
