use super::*;

fn shape() -> ShapeObject {
    ShapeObject { path: "M 0 0 L 1 1".into(), fill_color: "#fff".into(), border: Border::default() }
}

fn text_box() -> TextBoxObject {
    TextBoxObject {
        text: "Title".into(),
        size: 24.0,
        weight: 400,
        font_family: "Pretendard".into(),
        align: TextAlign::Left,
        border: Border::default(),
    }
}

#[test]
fn shape_patch_applies_only_present_fields() {
    let mut s = shape();
    ShapePatch { fill_color: Some("#000".into()), ..ShapePatch::default() }.apply(&mut s);
    assert_eq!(s.fill_color, "#000");
    assert_eq!(s.path, "M 0 0 L 1 1");
}

#[test]
fn text_patch_updates_style() {
    let mut t = text_box();
    TextPatch { size: Some(32.0), weight: Some(700), align: Some(TextAlign::Center), ..TextPatch::default() }
        .apply(&mut t);
    assert!((t.size - 32.0).abs() < f64::EPSILON);
    assert_eq!(t.weight, 700);
    assert_eq!(t.align, TextAlign::Center);
    assert_eq!(t.text, "Title");
}

#[test]
fn spatial_patch_sets_background() {
    let mut s = SpatialObject::default();
    SpatialPatch { background: Some(Background::Color("#123456".into())), ..SpatialPatch::default() }.apply(&mut s);
    assert_eq!(s.background, Background::Color("#123456".into()));
    assert_eq!(s.camera_mode, CameraMode::Free);
}

#[test]
fn background_wire_form() {
    assert_eq!(Background::from_wire("skybox"), Background::Skybox);
    assert_eq!(Background::from_wire("#abcdef"), Background::Color("#abcdef".into()));
    assert_eq!(Background::Skybox.to_wire(), "skybox");
}

#[test]
fn invalid_variant_has_no_border() {
    let mut v = ObjectVariant::Invalid;
    assert!(v.border().is_none());
    assert!(v.border_mut().is_none());
    assert!(!v.is_valid());
    assert_eq!(v.kind(), ObjectKind::Invalid);
}

#[test]
fn border_mut_reaches_every_valid_variant() {
    let mut variants = vec![
        ObjectVariant::Shape(shape()),
        ObjectVariant::TextBox(text_box()),
        ObjectVariant::Image(ImageObject {
            source_url: "a.png".into(),
            pending_upload: None,
            border: Border::default(),
        }),
        ObjectVariant::Spatial(SpatialObject::default()),
    ];
    for v in &mut variants {
        v.border_mut().unwrap().kind = BorderKind::Solid;
        assert_eq!(v.border().unwrap().kind, BorderKind::Solid);
    }
}

#[test]
fn spatial_model_lookup_by_id() {
    let mut s = SpatialObject::default();
    s.models.push(Model {
        id: 4,
        name: "chair".into(),
        url: "/m/chair.glb".into(),
        transform: ModelTransform::default(),
        shader: Shader::None,
    });
    assert!(s.model(4).is_some());
    assert!(s.model(5).is_none());
    s.model_mut(4).unwrap().shader = Shader::Highlight;
    assert_eq!(s.model(4).unwrap().shader, Shader::Highlight);
}
