//! Properties of the theme slug and the Markdown blueprint.

use loci::archive::{render_markdown, theme_slug};
use loci::palace::{EncodedImage, GenerationRequest, ImageState, Room};
use proptest::prelude::*;

/// The slug is filesystem-safe, one output char per input char, and stable.
#[test]
fn test_theme_slug_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&any::<String>(), |theme| {
            let slug = theme_slug(&theme);

            prop_assert_eq!(slug.chars().count(), theme.chars().count());
            prop_assert!(slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
            prop_assert_eq!(theme_slug(&slug), slug.clone());

            for (original, mapped) in theme.chars().zip(slug.chars()) {
                if original.is_ascii_alphanumeric() {
                    prop_assert_eq!(mapped, original.to_ascii_lowercase());
                } else {
                    prop_assert_eq!(mapped, '_');
                }
            }
            Ok(())
        })
        .unwrap();
}

fn room_strategy() -> impl Strategy<Value = Room> {
    (
        "[A-Za-z][A-Za-z ]{0,15}",
        proptest::collection::vec("[A-Za-z0-9:+>=, -]{1,30}", 0..5),
        any::<bool>(),
    )
        .prop_map(|(name, facts, has_image)| Room {
            room_name: name.trim().to_string(),
            narrative: "A vivid scene".to_string(),
            technical_info: facts,
            image_prompt: "a picture".to_string(),
            image: if has_image {
                ImageState::Ready(EncodedImage::new(Some("image/png"), "aGVsbG8="))
            } else {
                ImageState::Unavailable
            },
        })
}

/// Every room gets one heading and one technical section; every fact appears
/// verbatim as its own bullet; only illustrated rooms reference an image.
#[test]
fn test_markdown_preserves_every_fact_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &proptest::collection::vec(room_strategy(), 1..6),
            |rooms| {
                let request = GenerationRequest::new("Theme", "content", "Watercolor");
                let md = render_markdown(&request, &rooms);

                prop_assert_eq!(md.matches("\n## ").count(), rooms.len());
                prop_assert_eq!(md.matches("### Technical details").count(), rooms.len());

                let illustrated = rooms.iter().filter(|r| r.generated_image().is_some()).count();
                prop_assert_eq!(md.matches("![").count(), illustrated);

                let lines: Vec<&str> = md.lines().collect();
                for room in &rooms {
                    for fact in &room.technical_info {
                        let bullet = format!("- {}", fact);
                        prop_assert!(lines.contains(&bullet.as_str()));
                    }
                }
                Ok(())
            },
        )
        .unwrap();
}
