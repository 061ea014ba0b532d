//! Atlas packing scenarios driven through a label pool
//!
//! Capacity exhaustion, idempotence, placement invariants and notification order

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::{AtlasConfig, PoolConfig};
use crate::events::{EventKind, LabelEvent};
use crate::labels::{LabelPool, UniformMaterialFactory};
use crate::text::{AtlasError, CharacterEntry, FixedGlyphRasterizer, GlyphBox, REPLACEMENT_CHARACTER};

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_pool() -> LabelPool<UniformMaterialFactory> {
        let config = PoolConfig::new().with_atlas(AtlasConfig::new().with_size(16, 16));
        LabelPool::new(
            config,
            UniformMaterialFactory,
            Box::new(FixedGlyphRasterizer::default().with_glyph_size(1, 1)),
        )
    }

    fn record(pool: &LabelPool<UniformMaterialFactory>, kind: EventKind) -> Rc<RefCell<Vec<LabelEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        pool.add_event_listener(kind, move |event| sink.borrow_mut().push(event.clone()));
        events
    }

    fn overlaps(a: &CharacterEntry, b: &CharacterEntry) -> bool {
        a.atlas_x < b.atlas_x + b.width
            && b.atlas_x < a.atlas_x + a.width
            && a.atlas_y < b.atlas_y + b.height
            && b.atlas_y < a.atlas_y + a.height
    }

    #[test]
    fn test_overflow_reports_seen_count() {
        let mut pool = tiny_pool();
        let errors = record(&pool, EventKind::Error);

        // 15 columns x 15 rows of 1x1 glyphs, 97 taken at construction
        let mut first_failure = None;
        for codepoint in 0..1000u32 {
            let Some(character) = char::from_u32(codepoint) else { continue };
            pool.update_atlas(&character.to_string());
            if first_failure.is_none() && !errors.borrow().is_empty() {
                first_failure = Some(codepoint);
            }
        }

        assert_eq!(first_failure, Some(224));
        let errors = errors.borrow();
        match &errors[0] {
            LabelEvent::Error(error) => {
                assert_eq!(error, &AtlasError::Overflow { character: '\u{E0}', seen: 226 });
                assert_eq!(error.to_string(), "Unable to fit all 226 characters in font atlas");
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(errors.len(), 1001 - 225);
        assert_eq!(pool.atlas().glyph_count(), 225);
        assert_eq!(pool.atlas().seen_count(), 1001);
    }

    #[test]
    fn test_known_text_does_not_change_atlas() {
        let mut pool = LabelPool::new(
            PoolConfig::default(),
            UniformMaterialFactory,
            Box::new(FixedGlyphRasterizer::default()),
        );
        let changes = record(&pool, EventKind::AtlasChanged);
        let version = pool.atlas_texture().version();

        let outcome = pool.update_atlas("Hi");

        assert!(!outcome.atlas_changed());
        assert!(changes.borrow().is_empty());
        assert_eq!(pool.atlas_texture().version(), version);
    }

    #[test]
    fn test_ensure_characters_is_idempotent() {
        let mut pool = tiny_pool();
        let changes = record(&pool, EventKind::AtlasChanged);

        assert!(pool.update_atlas("\u{e9}\u{e8}").atlas_changed());
        let second = pool.update_atlas("\u{e8}\u{e9}");

        assert!(second.placed.is_empty());
        assert!(second.errors.is_empty());
        assert_eq!(changes.borrow().len(), 1);
    }

    #[test]
    fn test_errors_are_dispatched_before_atlas_change() {
        let config = PoolConfig::new().with_atlas(
            AtlasConfig::new()
                .with_size(32, 32)
                .with_ascii_prepopulation(false),
        );
        let rasterizer = FixedGlyphRasterizer::default()
            .with_glyph_size(2, 2)
            .with_glyph('W', GlyphBox::new(64, 2));
        let mut pool = LabelPool::new(config, UniformMaterialFactory, Box::new(rasterizer));

        let order = Rc::new(RefCell::new(Vec::new()));
        for kind in [EventKind::AtlasChanged, EventKind::Error] {
            let sink = Rc::clone(&order);
            pool.add_event_listener(kind, move |event| sink.borrow_mut().push(event.kind()));
        }

        let outcome = pool.update_atlas("aWb");
        assert_eq!(outcome.placed, vec!['a', 'b']);
        assert_eq!(outcome.overflow_count(), 1);
        assert_eq!(*order.borrow(), vec![EventKind::Error, EventKind::AtlasChanged]);
    }

    #[test]
    fn test_packed_rectangles_do_not_overlap() {
        let rasterizer = FixedGlyphRasterizer::default()
            .with_glyph('M', GlyphBox::new(50, 60))
            .with_glyph('i', GlyphBox::new(12, 54))
            .with_glyph('\u{2603}', GlyphBox::new(70, 90));
        let mut pool = LabelPool::new(
            PoolConfig::new().with_atlas(AtlasConfig::new().with_size(512, 1024)),
            UniformMaterialFactory,
            Box::new(rasterizer),
        );
        pool.update_atlas("\u{2603}\u{e9}\u{df}\u{3b1}\u{3b2}");

        let atlas = pool.atlas();
        let entries: Vec<_> = atlas.entries().map(|(_, e)| *e).collect();
        for (i, a) in entries.iter().enumerate() {
            assert!(a.atlas_x + a.width < atlas.width());
            assert!(a.atlas_y + a.height < atlas.height());
            for b in &entries[i + 1..] {
                assert!(!overlaps(a, b), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn test_line_metrics_never_decrease() {
        let rasterizer = FixedGlyphRasterizer::default()
            .with_glyph_size(4, 8)
            .with_glyph('T', GlyphBox::new(4, 20).with_top_bearing(18.0))
            .with_glyph('s', GlyphBox::new(4, 5).with_top_bearing(3.0));
        let mut pool = LabelPool::new(
            PoolConfig::new().with_atlas(AtlasConfig::new().with_size(64, 64).with_ascii_prepopulation(false)),
            UniformMaterialFactory,
            Box::new(rasterizer),
        );

        let mut previous = pool.atlas().line_metrics();
        for text in ["a", "T", "s", "\u{e9}"] {
            pool.update_atlas(text);
            let current = pool.atlas().line_metrics();
            assert!(current.line_height >= previous.line_height);
            assert!(current.max_ascent >= previous.max_ascent);
            previous = current;
        }
        assert_eq!(previous.line_height, 20);
        assert_eq!(previous.max_ascent, 18.0);
    }

    #[test]
    fn test_unplaced_character_falls_back_permanently() {
        let mut pool = tiny_pool();
        for codepoint in 0x100..0x200u32 {
            if let Some(character) = char::from_u32(codepoint) {
                pool.update_atlas(&character.to_string());
            }
        }

        let atlas = pool.atlas();
        let replacement = *atlas.entry(REPLACEMENT_CHARACTER).unwrap();
        assert!(atlas.has_seen('\u{1FF}'));
        assert!(!atlas.contains('\u{1FF}'));

        let layout = atlas.layout("\u{1FF}");
        assert_eq!(layout.chars[0].atlas_x, replacement.atlas_x as f32);
        assert_eq!(layout.chars[0].atlas_y, replacement.atlas_y as f32);
    }
}
