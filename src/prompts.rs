//! Instruction text for the cinematic analysis call.
//!
//! Keeping the prompt here, away from the request code, means prompt edits
//! never touch error handling, and tests can inspect the text without a
//! live model.
//!
//! Callers can override the default via
//! [`crate::config::CineframeConfig::analysis_prompt`]; the constant is used
//! only when no override is provided. An override must still ask for the same
//! three-key JSON object, or normalisation will reject the replies.

/// Composition rules the model is asked to consider.
pub const COMPOSITION_RULES: [&str; 20] = [
    "Rule of Thirds",
    "Leading Lines",
    "Symmetry",
    "Centered Composition",
    "Framing Within a Frame",
    "Depth & Layers",
    "Negative Space",
    "Diagonals and Triangles",
    "Golden Ratio / Fibonacci Spiral",
    "Eye-Level vs. Low/High Angle",
    "Fill the Frame",
    "Rule of Odds",
    "Rule of Space (e.g., for moving subjects or gaze direction)",
    "Juxtaposition",
    "Color Composition (e.g., complementary colors, analogous colors, color harmony, color contrast for mood)",
    "Texture & Pattern (how they contribute to visual interest and mood)",
    "Light as Subject (e.g., chiaroscuro, silhouettes, lens flares, god rays)",
    "Negative vs. Positive Space Balance",
    "Implied Lines",
    "Visual Weight & Balance",
];

/// Keys the model must return, in order.
pub const RESPONSE_KEYS: [&str; 3] = [
    "analysisText",
    "suggestedBoundingBox",
    "cinematicConceptPrompt",
];

/// Default instruction sent alongside the photo.
pub const ANALYSIS_PROMPT: &str = r#"You are an expert cinematographer and photo editor. Analyze the provided image.
Your goal is to help the user achieve a more cinematic result.

When performing your analysis and making suggestions, consider the following established photographic and cinematographic composition rules. If any of these rules are particularly relevant to your analysis or could significantly enhance the cinematic quality of the image, mention them in your "analysisText". Explain how applying a rule (or how a rule is already present) contributes to the cinematic feel. Only apply or suggest rules if they genuinely improve the shot; do not force them.

Composition Rules to Consider:
- Rule of Thirds
- Leading Lines
- Symmetry
- Centered Composition
- Framing Within a Frame
- Depth & Layers
- Negative Space
- Diagonals and Triangles
- Golden Ratio / Fibonacci Spiral
- Eye-Level vs. Low/High Angle
- Fill the Frame
- Rule of Odds
- Rule of Space (e.g., for moving subjects or gaze direction)
- Juxtaposition
- Color Composition (e.g., complementary colors, analogous colors, color harmony, color contrast for mood)
- Texture & Pattern (how they contribute to visual interest and mood)
- Light as Subject (e.g., chiaroscuro, silhouettes, lens flares, god rays)
- Negative vs. Positive Space Balance
- Implied Lines
- Visual Weight & Balance

1. TEXTUAL ANALYSIS (mandatory)
   Provide a detailed textual analysis (2-4 paragraphs) explaining how to find or create a cinematic shot.
   - If a direct crop of the uploaded image can achieve this, describe the elements to focus on, the composition rules that justify the crop, the mood, the storytelling, and the reframing.
   - If a direct crop is NOT ideal or sufficient (the image is too busy, lacks a clear subject, or a more conceptual change is needed), explain why. Then describe a vision for a cinematic shot inspired by the scene, using the composition rules to define it. This vision will be used to generate a new image.

2. CINEMATIC OUTPUT (choose ONE)
   Option A: Suggested Bounding Box (for cropping)
     If a direct crop of the uploaded image is the best approach, provide a "suggestedBoundingBox" object defining the ideal cinematic frame within the original image.
     - It must have keys "x", "y", "width", "height" (fractions 0.0-1.0 of the image size).
     - Values must be valid: width/height > 0, x/y >= 0, x+width <= 1.0, y+height <= 1.0.
     - If you choose this option, "cinematicConceptPrompt" MUST be null.
   Option B: Cinematic Concept Prompt (for image generation)
     If a crop is not ideal and you are describing a conceptual vision, provide a "cinematicConceptPrompt" string. It will be used as the prompt for an image generation model.
     - Make it highly descriptive: scene, style, lighting, camera angle, mood, key elements, and the composition principles it relies on.
     - Example: "Epic cinematic wide shot of a lone figure on a cliff overlooking a stormy sea at sunset, applying the Rule of Thirds to place the figure. Dramatic lighting, volumetric clouds, anamorphic lens flare, style of a blockbuster film."
     - If you choose this option, "suggestedBoundingBox" MUST be null.

3. OUTPUT FORMAT
   Structure your response STRICTLY as a JSON object with exactly three keys:
   - "analysisText": (string) your textual analysis.
   - "suggestedBoundingBox": (object or null) the bounding box if Option A is chosen, otherwise null.
   - "cinematicConceptPrompt": (string or null) the image generation prompt if Option B is chosen, otherwise null.

   "analysisText" must always be provided. Either "suggestedBoundingBox" OR "cinematicConceptPrompt" should be non-null, but NOT BOTH. If neither output type applies (very rare), both can be null.
   Output ONLY the JSON object. Do NOT add commentary before or after it.

Example 1 (crop):
{
  "analysisText": "To capture a more cinematic frame from your photo of the Golden Gate Bridge, focus tightly on the iconic red tower. Placing the tower off-center with the Rule of Thirds, and using the bridge's cables as leading lines, draws the eye and creates a dramatic, focused composition.",
  "suggestedBoundingBox": { "x": 0.25, "y": 0.10, "width": 0.50, "height": 0.80 },
  "cinematicConceptPrompt": null
}

Example 2 (concept prompt):
{
  "analysisText": "The wide beach shot is pleasant, but a simple crop will not make it cinematic. Instead, build Depth & Layers: weathered driftwood in the foreground, a lone figure in the midground, and the ocean stretching to the horizon behind.",
  "suggestedBoundingBox": null,
  "cinematicConceptPrompt": "Golden hour shot, cinematic depth of field. Foreground: weathered driftwood. Midground: lone figure walking along a pristine sandy beach, footprints leading towards the ocean. Background: calm sea and distant sunset. Soft, warm lighting. Peaceful, slightly melancholic mood. Film emulation. Rule of Space for the walking figure."
}"#;

/// The instruction to send: the override when present, else [`ANALYSIS_PROMPT`].
pub fn analysis_prompt(custom: Option<&str>) -> &str {
    match custom {
        Some(p) if !p.trim().is_empty() => p,
        _ => ANALYSIS_PROMPT,
    }
}
