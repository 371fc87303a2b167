//! Fixed prompt text for both generation stages.

/// Opening sentinel for the code block in stage-two output
pub const CODE_REGION_OPENER: &str = "```html";

/// Closing sentinel for the code block in stage-two output
pub const CODE_REGION_CLOSER: &str = "```";

/// Stage-one instruction; the video itself is attached as a separate part.
pub const SPEC_FROM_VIDEO_PROMPT: &str = r#"You are a pedagogist and product designer with deep expertise in crafting engaging learning experiences for children via interactive web apps.

Examine the contents of the attached video. Then, write a detailed and carefully considered spec for an interactive web app designed to complement the video and reinforce its key idea or ideas. The recipient of the spec does not have access to the video, so the spec must be thorough and self-contained (the spec must not mention that it is based on a video).

The goal of the app that is to be built based on the spec is to enhance understanding through simple and playful design. The provided spec should not be overly complex, i.e., a junior web developer should be able to implement it in a single html file (with all styles and scripts inline). Most importantly, the spec must clearly outline the core mechanics of the app, and those mechanics must be highly effective in reinforcing the given video's key idea(s).

Provide the result as a JSON object containing a single field called "spec", whose value is the spec for the web app."#;

/// Appended to every synthesized spec before it is committed.
///
/// Stage two sends the committed spec verbatim, so this is where the code
/// block markers are requested.
pub const SPEC_ADDENDUM: &str = r#"

The app must be fully responsive and function properly on both desktop and mobile. Provide the code as a single, self-contained HTML document. All styles and scripts must be inline. In the result, encase the code between "```html" and "```" for easy parsing."#;

/// Append the fixed addendum to a freshly synthesized spec
pub fn with_addendum(spec: &str) -> String {
    let mut out = String::with_capacity(spec.len() + SPEC_ADDENDUM.len());
    out.push_str(spec);
    out.push_str(SPEC_ADDENDUM);
    out
}
