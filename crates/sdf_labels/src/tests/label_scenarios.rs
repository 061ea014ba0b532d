//! Label behavior scenarios
//!
//! Layout to instance buffer conversion, relayout on atlas growth, scale derivation and
//! material forwarding

use approx::assert_relative_eq;

use crate::config::{AtlasConfig, LabelStyle, PoolConfig};
use crate::foundation::math::rgba;
use crate::labels::backends::node_material::names;
use crate::labels::backends::UniformValue;
use crate::labels::{
    LabelMaterial, LabelPool, NodeMaterialFactory, UniformMaterialFactory, FLOATS_PER_CHAR,
};
use crate::text::{FixedGlyphRasterizer, GlyphBox};

#[cfg(test)]
mod tests {
    use super::*;

    const SNOWMAN: char = '\u{2603}';

    fn default_pool() -> LabelPool<UniformMaterialFactory> {
        // Default glyphs are 35x54 with 3px padding, advance 32
        let rasterizer = FixedGlyphRasterizer::default().with_glyph(SNOWMAN, GlyphBox::new(30, 80));
        LabelPool::new(PoolConfig::default(), UniformMaterialFactory, Box::new(rasterizer))
    }

    fn uniform_pool() -> LabelPool<UniformMaterialFactory> {
        let config = PoolConfig::new().with_atlas(AtlasConfig::new().with_size(128, 128));
        LabelPool::new(
            config,
            UniformMaterialFactory,
            Box::new(FixedGlyphRasterizer::default().with_glyph_size(6, 10)),
        )
    }

    #[test]
    fn test_line_breaks_in_instance_buffer() {
        let mut pool = uniform_pool();
        let mut label = pool.acquire();
        label.set_text("AB\nC");

        let buffer = label.instance_buffer();
        assert_eq!(buffer.instance_count(), 3);
        let instances = buffer.instances();

        // Layout height 20: first line sits on top, Y flipped
        assert_eq!(instances[0].box_position, [0.0, 10.0]);
        assert_eq!(instances[1].box_position, [6.0, 10.0]);
        assert_eq!(instances[2].box_position, [0.0, 0.0]);
        assert_eq!(instances[2].char_position, [0.0, 0.0]);
        assert_eq!(instances[0].box_size, [6.0, 10.0]);
        assert_eq!(instances[0].char_size, [6.0, 10.0]);
        drop(buffer);

        assert_eq!(label.label_size().as_slice(), &[12.0, 20.0]);
    }

    #[test]
    fn test_same_text_is_noop() {
        let mut pool = uniform_pool();
        let mut label = pool.acquire();
        label.set_text("abc");
        label.instance_buffer_mut().mark_uploaded();

        label.set_text("abc");
        assert!(!label.instance_buffer().needs_upload());

        label.set_text("abd");
        assert!(label.instance_buffer().needs_upload());
    }

    #[test]
    fn test_buffer_grows_but_never_shrinks() {
        let mut pool = uniform_pool();
        let mut label = pool.acquire();

        label.set_text("hello");
        assert_eq!(label.instance_buffer().capacity(), 5);

        label.set_text("hi");
        assert_eq!(label.instance_buffer().capacity(), 5);
        assert_eq!(label.instance_count(), 2);
        assert_eq!(label.instance_buffer().floats().len(), 2 * FLOATS_PER_CHAR);

        label.set_text("hello world");
        assert_eq!(label.instance_buffer().capacity(), 11);
    }

    #[test]
    fn test_other_labels_relayout_when_atlas_grows() {
        let mut pool = default_pool();
        let mut first = pool.acquire();
        let mut second = pool.acquire();

        first.set_text("ab");
        assert_relative_eq!(first.label_size().y, 54.0);
        assert_relative_eq!(first.label_size().x, 64.0);

        second.set_text(&SNOWMAN.to_string());
        assert_relative_eq!(first.label_size().y, 80.0);
        assert_relative_eq!(first.instance_buffer().instances()[0].box_size[1], 80.0);
    }

    #[test]
    fn test_borrowed_label_relayouts_after_atlas_growth() {
        let mut pool = default_pool();
        let mut first = pool.acquire();
        let mut second = pool.acquire();
        first.set_text("ab");

        {
            let _held = first.instance_buffer();
            second.set_text(&SNOWMAN.to_string());
        }

        assert_relative_eq!(second.label_size().y, 80.0);
        assert_relative_eq!(first.label_size().y, 80.0);
        assert_relative_eq!(first.instance_buffer().instances()[0].box_size[1], 80.0);
        assert_relative_eq!(first.material().params().scale, 1.0 / 80.0);
    }

    #[test]
    fn test_borrowed_label_rescales_after_scale_factor_change() {
        let mut pool = default_pool();
        let label = pool.acquire();

        {
            let _material = label.material();
            pool.set_scale_factor(3.0);
        }

        assert_relative_eq!(label.material().params().scale, 3.0 / 54.0);
        assert_relative_eq!(label.picking_material().params().scale, 3.0 / 54.0);
    }

    #[test]
    fn test_deferred_work_accumulates_while_borrowed() {
        let mut pool = default_pool();
        let mut first = pool.acquire();
        let mut second = pool.acquire();
        first.set_text("a");

        {
            let _held = first.picking_material();
            pool.set_scale_factor(2.0);
            second.set_text(&SNOWMAN.to_string());
            pool.set_scale_factor(4.0);
        }

        first.set_line_height(1.0);
        assert_relative_eq!(first.material().params().scale, 4.0 / 80.0);
        assert_relative_eq!(first.label_size().y, 80.0);
    }

    #[test]
    fn test_scale_follows_line_height_and_scale_factor() {
        let mut pool = default_pool();
        let mut label = pool.acquire();

        label.set_line_height(2.0);
        assert_relative_eq!(label.material().params().scale, 2.0 / 54.0);

        pool.set_scale_factor(3.0);
        assert_relative_eq!(label.material().params().scale, 6.0 / 54.0);
        assert_relative_eq!(label.picking_material().params().scale, 6.0 / 54.0);

        // Taller glyph raises the atlas line height
        pool.update_atlas(&SNOWMAN.to_string());
        assert_relative_eq!(label.material().params().scale, 6.0 / 80.0);
    }

    #[test]
    fn test_direct_scale_is_overwritten() {
        let mut pool = default_pool();
        let mut label = pool.acquire();

        label.set_scale(5.0);
        assert_relative_eq!(label.material().params().scale, 5.0);

        pool.set_scale_factor(1.0);
        assert_relative_eq!(label.material().params().scale, 1.0 / 54.0);
    }

    #[test]
    fn test_empty_atlas_gives_zero_scale() {
        let config = PoolConfig::new().with_atlas(AtlasConfig::new().with_ascii_prepopulation(false));
        let rasterizer = FixedGlyphRasterizer::default()
            .with_glyph('\u{FFFD}', GlyphBox::new(0, 0));
        let mut pool = LabelPool::new(config, UniformMaterialFactory, Box::new(rasterizer));
        assert_eq!(pool.atlas().line_metrics().line_height, 0);

        let mut label = pool.acquire();
        label.set_line_height(4.0);
        assert_eq!(label.material().params().scale, 0.0);
    }

    #[test]
    fn test_transparency_is_joint_decision() {
        let mut pool = default_pool();
        let mut label = pool.acquire();
        assert!(label.material().depth_write());

        label.set_background_color(0.0, 0.0, 0.0, 0.0);
        assert!(label.material().is_transparent());
        assert!(!label.material().depth_write());

        label.set_background_color(1.0, 1.0, 1.0, 1.0);
        label.set_color(1.0, 1.0, 1.0, 0.5);
        assert!(label.material().is_transparent());

        label.set_color(1.0, 1.0, 1.0, 1.0);
        assert!(!label.material().is_transparent());
    }

    #[test]
    fn test_picking_material_ignores_colors() {
        let mut pool = default_pool();
        let mut label = pool.acquire();

        label.set_color(1.0, 0.0, 0.0, 0.5);
        label.set_billboard(true);
        label.set_anchor_point(0.0, 1.0);
        label.set_object_id(rgba(0.0, 0.0, 1.0, 1.0));

        let picking = label.picking_material().params();
        assert!(picking.picking);
        assert_eq!(picking.color, rgba(0.0, 0.0, 0.0, 1.0));
        assert!(picking.billboard);
        assert_eq!(picking.anchor_point.as_slice(), &[0.0, 1.0]);
        assert_eq!(picking.object_id, rgba(0.0, 0.0, 1.0, 1.0));
        assert!(!label.picking_material().is_transparent());
        assert!(label.material().params().object_id.x.is_nan());
    }

    #[test]
    fn test_texture_size_applied_on_creation() {
        let mut pool = uniform_pool();
        let label = pool.acquire();
        assert_eq!(label.material().params().texture_size.as_slice(), &[128.0, 128.0]);
        assert_eq!(label.picking_material().params().texture_size.as_slice(), &[128.0, 128.0]);
    }

    #[test]
    fn test_default_style_is_applied() {
        let style = LabelStyle::new()
            .billboarded(false)
            .with_colors([1.0, 1.0, 1.0, 1.0], [0.0, 0.0, 0.0, 0.5])
            .with_line_height(0.5);
        let mut pool = LabelPool::new(
            PoolConfig::new().with_label_style(style),
            UniformMaterialFactory,
            Box::new(FixedGlyphRasterizer::default()),
        );

        let label = pool.acquire();
        let params = label.material().params();
        assert!(params.billboard);
        assert!(!params.size_attenuation);
        assert!(label.material().is_transparent());
        assert_relative_eq!(label.line_height(), 0.5);
        assert_relative_eq!(params.scale, 0.5 / 54.0);
    }

    #[test]
    fn test_node_backend_uniforms() {
        let mut pool = LabelPool::new(
            PoolConfig::default(),
            NodeMaterialFactory,
            Box::new(FixedGlyphRasterizer::default()),
        );
        let mut label = pool.acquire();
        label.set_text("abc");
        label.set_billboard(true);

        let material = label.material();
        assert_eq!(
            material.node(names::BILLBOARD).map(|n| n.value),
            Some(UniformValue::Bool(true))
        );
        match material.node(names::LABEL_SIZE).map(|n| n.value) {
            Some(UniformValue::Vec2(size)) => assert_relative_eq!(size.x, 96.0),
            other => panic!("unexpected label size node {other:?}"),
        }
        match material.node(names::SCALE).map(|n| n.value) {
            Some(UniformValue::Float(scale)) => assert_relative_eq!(scale, 1.0 / 54.0),
            other => panic!("unexpected scale node {other:?}"),
        }
    }
}
