//! Producer registry: stable identifiers, deduplicated media sources, and
//! the derived producers created by time-altering effects.

use crate::element::Element;
use crate::error::{MltError, Result};
use meltline_core::{Clip, Frames, MediaReference};
use std::collections::HashMap;
use tracing::trace;

/// Fill color for backgrounds and gap placeholders.
pub const COLOR_BLACK: &str = "black";
/// Fill color for fade endpoints.
pub const COLOR_TRANSPARENT: &str = "#00000000";

/// Video and audio producers live in separate id namespaces so an audio
/// item can ask "does this media already exist as a video producer" and
/// be elided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Video,
    Audio,
}

/// Owns every producer created during one conversion. `order` is the
/// append-only creation-order list the final document is emitted from;
/// producers are never removed or reordered once registered.
#[derive(Debug, Default)]
pub struct ProducerRegistry {
    order: Vec<Element>,
    video: HashMap<String, usize>,
    audio: HashMap<String, usize>,
}

impl ProducerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn namespace(&self, ns: Namespace) -> &HashMap<String, usize> {
        match ns {
            Namespace::Video => &self.video,
            Namespace::Audio => &self.audio,
        }
    }

    /// Deduplication key for a clip: the media reference's name when it
    /// has one, else the clip's own name.
    pub fn clip_identity(clip: &Clip) -> &str {
        clip.media.name().unwrap_or(&clip.name)
    }

    pub fn contains_video(&self, id: &str) -> bool {
        self.video.contains_key(id)
    }

    /// Producer by id, searching the video namespace first.
    pub fn get(&self, id: &str) -> Option<&Element> {
        self.video
            .get(id)
            .or_else(|| self.audio.get(id))
            .map(|&ix| &self.order[ix])
    }

    /// Drain the registry into the creation-order list of producers.
    pub fn into_producers(self) -> Vec<Element> {
        self.order
    }

    fn register(&mut self, ns: Namespace, id: String, producer: Element) {
        trace!(id = %id, ?ns, "registered producer");
        let ix = self.order.len();
        self.order.push(producer);
        match ns {
            Namespace::Video => self.video.insert(id, ix),
            Namespace::Audio => self.audio.insert(id, ix),
        };
    }

    /// Producer for a clip, created on first use and shared afterwards.
    /// Returns the producer id.
    pub fn clip_producer(&mut self, clip: &Clip, ns: Namespace) -> String {
        let id = Self::clip_identity(clip).to_string();
        if self.namespace(ns).contains_key(&id) {
            return id;
        }

        let (resource, service) = match &clip.media {
            MediaReference::External(r) => (r.target_url.clone(), None),
            MediaReference::ImageSequence(r) => {
                let pattern = format!("%0{}d", r.frame_zero_padding);
                (
                    format!("{}?begin={}", r.abstract_target_url(&pattern), r.start_frame),
                    Some("qimage"),
                )
            }
            // Degenerate placeholder: the id doubles as the locator.
            MediaReference::Missing => (id.clone(), None),
        };

        let mut producer = Element::new("producer").attr("id", id.clone());
        producer.push(Element::property("resource", resource));
        if let Some(service) = service {
            producer.push(Element::property("mlt_service", service));
        }
        self.register(ns, id.clone(), producer);
        id
    }

    /// Solid-fill producer. Color and length together form the identity,
    /// so equal fills collapse to one producer.
    pub fn fill_producer(&mut self, color: &str, length: Frames) -> String {
        let id = format!("solid_{}_{}", color, length);
        if self.video.contains_key(&id) {
            return id;
        }

        let mut producer = Element::new("producer")
            .attr("id", id.clone())
            .attr("title", "color")
            .attr("in", "0")
            .attr("out", (length.0 - 1).to_string());
        producer.push(Element::property("length", length.to_string()));
        producer.push(Element::property("eof", "pause"));
        producer.push(Element::property("resource", color));
        producer.push(Element::property("mlt_service", "color"));
        self.register(Namespace::Video, id.clone(), producer);
        id
    }

    // -----------------------------------------------------------------
    // Time-altering effects
    // -----------------------------------------------------------------

    /// Rewire `entry` to a time-remapped copy of the producer it currently
    /// references. The base producer is never touched; other entries still
    /// pointing at it are unaffected. Re-warping at the same scalar reuses
    /// the existing copy.
    pub fn retime_entry(&mut self, entry: &mut Element, time_scalar: f64) -> Result<()> {
        let base_id = entry_producer(entry)?;
        let id = format!("{}:{}", time_scalar, base_id);

        if !self.video.contains_key(&id) {
            let mut producer = self.clone_base(&base_id)?;
            producer.set_attr("id", id.clone());
            let resource = producer
                .property_text("resource")
                .ok_or_else(|| MltError::MissingResource(base_id.clone()))?
                .to_string();
            producer.set_property_text("resource", format!("{}:{}", time_scalar, resource));
            producer.push(Element::property("mlt_service", "timewarp"));
            self.register(Namespace::Video, id.clone(), producer);
        }

        entry.set_attr("producer", id);
        Ok(())
    }

    /// Rewire `entry` to a held-frame copy of its current producer, frozen
    /// on `frame`.
    pub fn freeze_entry(&mut self, entry: &mut Element, frame: Frames) -> Result<()> {
        let base_id = entry_producer(entry)?;
        let id = format!("{}:{}", base_id, frame);

        if !self.video.contains_key(&id) {
            let mut producer = self.clone_base(&base_id)?;
            producer.set_attr("id", id.clone());
            producer.push(Element::property("mlt_service", "hold"));
            producer.push(Element::property("frame", frame.to_string()));
            self.register(Namespace::Video, id.clone(), producer);
        }

        entry.set_attr("producer", id);
        Ok(())
    }

    fn clone_base(&self, base_id: &str) -> Result<Element> {
        self.get(base_id)
            .cloned()
            .ok_or_else(|| MltError::UnresolvableProducer(base_id.to_string()))
    }
}

fn entry_producer(entry: &Element) -> Result<String> {
    entry
        .get_attr("producer")
        .map(str::to_string)
        .ok_or_else(|| MltError::UnresolvableProducer(String::from("<unset>")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use meltline_core::{ExternalReference, ImageSequenceReference, TimeRange};

    fn media_clip(name: &str, media_name: &str, url: &str) -> Clip {
        Clip::new(
            name,
            TimeRange::new(Frames(0), Frames(10)),
            MediaReference::External(ExternalReference {
                name: Some(media_name.into()),
                target_url: url.into(),
            }),
        )
    }

    fn entry_for(id: &str) -> Element {
        Element::new("entry")
            .attr("producer", id)
            .attr("in", "0")
            .attr("out", "9")
    }

    #[test]
    fn clip_producer_dedups_by_media_name() {
        let mut reg = ProducerRegistry::new();
        let a = media_clip("a", "shot.mov", "/media/shot.mov");
        let b = media_clip("b", "shot.mov", "/media/shot.mov");

        let id_a = reg.clip_producer(&a, Namespace::Video);
        let id_b = reg.clip_producer(&b, Namespace::Video);
        assert_eq!(id_a, id_b);
        assert_eq!(reg.into_producers().len(), 1);
    }

    #[test]
    fn missing_media_falls_back_to_clip_name() {
        let mut reg = ProducerRegistry::new();
        let clip = Clip::new(
            "slate",
            TimeRange::new(Frames(0), Frames(10)),
            MediaReference::Missing,
        );
        let id = reg.clip_producer(&clip, Namespace::Video);
        assert_eq!(id, "slate");
        // The id doubles as the resource locator.
        let producer = reg.get("slate").unwrap();
        assert_eq!(producer.property_text("resource"), Some("slate"));
    }

    #[test]
    fn image_sequence_expands_locator() {
        let mut reg = ProducerRegistry::new();
        let clip = Clip::new(
            "plates",
            TimeRange::new(Frames(0), Frames(48)),
            MediaReference::ImageSequence(ImageSequenceReference {
                name: Some("sh010_plates".into()),
                target_url_base: "/mnt/plates".into(),
                name_prefix: "sh010.".into(),
                name_suffix: ".exr".into(),
                start_frame: 1001,
                frame_zero_padding: 4,
            }),
        );
        let id = reg.clip_producer(&clip, Namespace::Video);
        let producer = reg.get(&id).unwrap();
        assert_eq!(
            producer.property_text("resource"),
            Some("/mnt/plates/sh010.%04d.exr?begin=1001")
        );
        assert_eq!(producer.property_text("mlt_service"), Some("qimage"));
    }

    #[test]
    fn namespaces_are_separate_but_visible() {
        let mut reg = ProducerRegistry::new();
        let clip = media_clip("a", "shot.mov", "/media/shot.mov");
        reg.clip_producer(&clip, Namespace::Video);

        assert!(reg.contains_video("shot.mov"));
        // Registering the same media as audio creates a second producer.
        reg.clip_producer(&clip, Namespace::Audio);
        assert_eq!(reg.into_producers().len(), 2);
    }

    #[test]
    fn fill_identity_includes_color_and_length() {
        let mut reg = ProducerRegistry::new();
        let a = reg.fill_producer(COLOR_BLACK, Frames(24));
        let b = reg.fill_producer(COLOR_BLACK, Frames(24));
        let c = reg.fill_producer(COLOR_BLACK, Frames(12));
        let d = reg.fill_producer(COLOR_TRANSPARENT, Frames(24));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert_eq!(reg.into_producers().len(), 3);
    }

    #[test]
    fn fill_producer_geometry() {
        let mut reg = ProducerRegistry::new();
        let id = reg.fill_producer(COLOR_BLACK, Frames(24));
        let producer = reg.get(&id).unwrap();
        assert_eq!(producer.get_attr("in"), Some("0"));
        assert_eq!(producer.get_attr("out"), Some("23"));
        assert_eq!(producer.property_text("length"), Some("24"));
        assert_eq!(producer.property_text("mlt_service"), Some("color"));
        assert_eq!(producer.property_text("resource"), Some("black"));
    }

    #[test]
    fn retime_clones_and_leaves_base_untouched() {
        let mut reg = ProducerRegistry::new();
        let clip = media_clip("a", "shot.mov", "/media/shot.mov");
        let base_id = reg.clip_producer(&clip, Namespace::Video);

        let mut warped = entry_for(&base_id);
        let mut plain = entry_for(&base_id);
        reg.retime_entry(&mut warped, 0.5).unwrap();

        assert_eq!(warped.get_attr("producer"), Some("0.5:shot.mov"));
        assert_eq!(plain.get_attr("producer"), Some("shot.mov"));

        let base = reg.get("shot.mov").unwrap();
        assert_eq!(base.property_text("resource"), Some("/media/shot.mov"));
        assert_eq!(base.property_text("mlt_service"), None);

        let clone = reg.get("0.5:shot.mov").unwrap();
        assert_eq!(clone.property_text("resource"), Some("0.5:/media/shot.mov"));
        assert_eq!(clone.property_text("mlt_service"), Some("timewarp"));

        // Same scalar on another entry reuses the clone.
        reg.retime_entry(&mut plain, 0.5).unwrap();
        assert_eq!(plain.get_attr("producer"), Some("0.5:shot.mov"));
        assert_eq!(reg.into_producers().len(), 2);
    }

    #[test]
    fn retime_at_different_scalars_creates_distinct_clones() {
        let mut reg = ProducerRegistry::new();
        let clip = media_clip("a", "shot.mov", "/media/shot.mov");
        let base_id = reg.clip_producer(&clip, Namespace::Video);

        let mut slow = entry_for(&base_id);
        let mut fast = entry_for(&base_id);
        reg.retime_entry(&mut slow, 0.5).unwrap();
        reg.retime_entry(&mut fast, 2.0).unwrap();
        assert_ne!(slow.get_attr("producer"), fast.get_attr("producer"));
        assert_eq!(reg.into_producers().len(), 3);
    }

    #[test]
    fn stacked_warps_chain_on_the_previous_clone() {
        let mut reg = ProducerRegistry::new();
        let clip = media_clip("a", "shot.mov", "/media/shot.mov");
        let base_id = reg.clip_producer(&clip, Namespace::Video);

        let mut entry = entry_for(&base_id);
        reg.retime_entry(&mut entry, 0.5).unwrap();
        reg.retime_entry(&mut entry, 2.0).unwrap();

        assert_eq!(entry.get_attr("producer"), Some("2:0.5:shot.mov"));
        let clone = reg.get("2:0.5:shot.mov").unwrap();
        assert_eq!(
            clone.property_text("resource"),
            Some("2:0.5:/media/shot.mov")
        );
    }

    #[test]
    fn freeze_adds_hold_service_and_frame() {
        let mut reg = ProducerRegistry::new();
        let clip = media_clip("a", "shot.mov", "/media/shot.mov");
        let base_id = reg.clip_producer(&clip, Namespace::Video);

        let mut entry = entry_for(&base_id);
        reg.freeze_entry(&mut entry, Frames(86)).unwrap();

        assert_eq!(entry.get_attr("producer"), Some("shot.mov:86"));
        let held = reg.get("shot.mov:86").unwrap();
        assert_eq!(held.property_text("mlt_service"), Some("hold"));
        assert_eq!(held.property_text("frame"), Some("86"));
        // The locator is the original media, not a rewritten one.
        assert_eq!(held.property_text("resource"), Some("/media/shot.mov"));
    }

    #[test]
    fn retime_unknown_base_is_a_defect() {
        let mut reg = ProducerRegistry::new();
        let mut entry = entry_for("nowhere");
        let err = reg.retime_entry(&mut entry, 0.5).unwrap_err();
        assert!(matches!(err, MltError::UnresolvableProducer(_)));
    }
}
