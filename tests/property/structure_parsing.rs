//! Properties of structure response parsing.

use loci::palace::RoomBlueprint;
use loci::provider::structure::parse_structure;
use proptest::prelude::*;

fn blueprint_strategy() -> impl Strategy<Value = RoomBlueprint> {
    (
        "[A-Za-z]{1,12}",
        "[A-Za-z ]{1,40}",
        proptest::collection::vec("[A-Za-z0-9:+ ]{0,20}", 0..4),
        "[A-Za-z ]{1,40}",
    )
        .prop_filter("non-blank fields", |(name, narrative, _, prompt)| {
            !name.trim().is_empty() && !narrative.trim().is_empty() && !prompt.trim().is_empty()
        })
        .prop_map(|(room_name, narrative, technical_info, image_prompt)| RoomBlueprint {
            room_name,
            narrative,
            technical_info,
            image_prompt,
        })
}

/// Fences and the `rooms` wrapper never change what is parsed, and order is kept.
#[test]
fn test_parse_structure_ignores_envelope_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(
                proptest::collection::vec(blueprint_strategy(), 1..6),
                any::<bool>(),
                any::<bool>(),
            ),
            |(rooms, fenced, wrapped)| {
                let array = serde_json::to_string(&rooms).unwrap();
                let body = if wrapped {
                    format!("{{\"rooms\": {}}}", array)
                } else {
                    array
                };
                let raw = if fenced {
                    format!("```json\n{}\n```", body)
                } else {
                    body
                };

                let parsed = parse_structure(&raw).unwrap();
                prop_assert_eq!(parsed, rooms);
                Ok(())
            },
        )
        .unwrap();
}

/// An empty plan is always rejected, whatever the envelope.
#[test]
fn test_empty_plan_rejected_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(any::<bool>(), any::<bool>()), |(fenced, wrapped)| {
            let body = if wrapped { "{\"rooms\": []}" } else { "[]" };
            let raw = if fenced {
                format!("```\n{}\n```", body)
            } else {
                body.to_string()
            };
            prop_assert!(parse_structure(&raw).is_err());
            Ok(())
        })
        .unwrap();
}
