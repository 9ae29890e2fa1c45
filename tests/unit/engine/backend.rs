use super::*;

#[test]
fn auto_selection_routes_gif_to_ffmpeg() {
    assert_eq!(
        EngineVariant::select(EngineChoice::Auto, ImageMimeType::Gif),
        EngineVariant::Ffmpeg
    );
    for mime in [
        ImageMimeType::Png,
        ImageMimeType::Jpg,
        ImageMimeType::Jpeg,
        ImageMimeType::Webp,
    ] {
        assert_eq!(
            EngineVariant::select(EngineChoice::Auto, mime),
            EngineVariant::Libwebp
        );
    }
}

#[test]
fn explicit_choice_wins() {
    for mime in ImageMimeType::ALL {
        assert_eq!(
            EngineVariant::select(EngineChoice::Ffmpeg, mime),
            EngineVariant::Ffmpeg
        );
        assert_eq!(
            EngineVariant::select(EngineChoice::Libwebp, mime),
            EngineVariant::Libwebp
        );
    }
}

#[test]
fn choice_parsing() {
    assert_eq!("AUTO".parse::<EngineChoice>().unwrap(), EngineChoice::Auto);
    assert_eq!(
        "libwebp".parse::<EngineChoice>().unwrap(),
        EngineChoice::Libwebp
    );
    assert!("vips".parse::<EngineChoice>().is_err());
}
