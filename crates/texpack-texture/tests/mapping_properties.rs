//! Behavioral properties of channel mapping through full compositions.

use pretty_assertions::assert_eq;
use texpack_spec::{
    ChannelAdjustment, ChannelId, ColorChannel, EncodingChannelSpec, Material, OutputTexture,
    Profile, TextureEncoding, TextureTag,
};
use texpack_texture::{
    build_plan, compose, CancellationToken, ImageBuffer, PixelFormat, PixelMapping, SourceImages,
};

fn single_output(spec: EncodingChannelSpec) -> OutputTexture {
    Profile::new("p")
        .with_output(TextureEncoding::new(vec![spec]))
        .output_textures()
        .remove(0)
}

fn every_byte() -> ImageBuffer {
    ImageBuffer::from_raw(256, 1, PixelFormat::Gray8, (0..=255u8).collect()).unwrap()
}

fn compose_row(
    output: &OutputTexture,
    input: EncodingChannelSpec,
    material: &Material,
) -> Vec<u8> {
    let tag = input.texture.clone();
    let inputs = TextureEncoding::new(vec![input]);
    let (plan, _) = build_plan(output, &inputs, material);
    let sources = SourceImages::from([(tag, every_byte())]);
    compose(&plan, &sources, 256, 1, &CancellationToken::new())
        .unwrap()
        .data
}

#[test]
fn identical_encodings_copy_bytes() {
    let spec = EncodingChannelSpec::new(ChannelId::Height, "height", ColorChannel::Red);
    let out = single_output(EncodingChannelSpec::new(ChannelId::Height, "packed", ColorChannel::Red));
    let row = compose_row(&out, spec, &Material::new("m"));
    assert_eq!(row, (0..=255u8).collect::<Vec<_>>());
}

#[test]
fn rough_and_smooth_are_complements_for_every_byte() {
    let out = single_output(EncodingChannelSpec::new(ChannelId::Smooth, "packed", ColorChannel::Red));
    let row = compose_row(
        &out,
        EncodingChannelSpec::new(ChannelId::Rough, "rough", ColorChannel::Red),
        &Material::new("m"),
    );
    for (b, smooth) in row.iter().enumerate() {
        assert_eq!(u32::from(*smooth) + b as u32, 255);
    }
}

#[test]
fn depth_is_inverted_height() {
    let out = single_output(EncodingChannelSpec::new(ChannelId::Height, "packed", ColorChannel::Red));
    let row = compose_row(
        &out,
        EncodingChannelSpec::new(ChannelId::Depth, "depth", ColorChannel::Red),
        &Material::new("m"),
    );
    assert_eq!(row[0], 255);
    assert_eq!(row[255], 0);
}

#[test]
fn scale_adjustment_doubles_values() {
    let out = single_output(EncodingChannelSpec::new(ChannelId::Height, "packed", ColorChannel::Red));
    let material = Material::new("m")
        .with_adjustment(ChannelAdjustment::new(ChannelId::Height).with_scale(2.0));
    let row = compose_row(
        &out,
        EncodingChannelSpec::new(ChannelId::Height, "height", ColorChannel::Red),
        &material,
    );
    assert_eq!(row[50], 100);
    assert_eq!(row[127], 254);
    assert_eq!(row[200], 255);
}

#[test]
fn narrowed_input_range_keeps_defaults_outside() {
    let out = single_output(EncodingChannelSpec::new(ChannelId::Height, "packed", ColorChannel::Red));
    let row = compose_row(
        &out,
        EncodingChannelSpec::new(ChannelId::Height, "height", ColorChannel::Red).with_pixel_range(64, 191),
        &Material::new("m"),
    );
    assert_eq!(row[10], 0);
    assert_eq!(row[64], 0);
    assert_eq!(row[191], 255);
    assert_eq!(row[250], 0);
}

#[test]
fn mapping_is_monotonic_without_invert() {
    let input = EncodingChannelSpec::new(ChannelId::Height, TextureTag::new("a"), ColorChannel::Red)
        .with_power(2.2);
    let output = EncodingChannelSpec::new(ChannelId::Height, TextureTag::new("b"), ColorChannel::Red)
        .with_value_range(-1.0, 1.0);
    let mapping = PixelMapping::between(&input, &output);
    let mut last = 0u8;
    for b in 0..=255u8 {
        let mapped = mapping.map(b).unwrap();
        assert!(mapped >= last, "{} -> {} after {}", b, mapped, last);
        last = mapped;
    }
}
