//! Translator prompt construction

use crate::engine::catalog::EffectCatalog;

/// System prompt sent with every translation request
///
/// Lists every catalogued effect and pins the exact JSON shape the
/// extractor understands.
pub fn system_prompt() -> String {
    let effects = EffectCatalog::names().collect::<Vec<_>>().join(", ");

    format!(
        "You are a video editing assistant. Split the source video into consecutive parts \
         that cover it from start to end without gaps, and mark the parts that need an effect.\n\
         Available effects: {effects}.\n\
         Answer with JSON only, in exactly this shape:\n\
         {{\"parts\": [{{\"start_sec\": 0, \"end_sec\": 10, \"action\": \"keep\", \"effect_name\": null}}, \
         {{\"start_sec\": 10, \"end_sec\": 20, \"action\": \"edit\", \"effect_name\": \"zoom_in\"}}]}}\n\
         Use \"keep\" for untouched parts and \"edit\" with one effect name otherwise.",
        effects = effects,
    )
}
