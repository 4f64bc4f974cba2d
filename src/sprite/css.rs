//! CSS rule generation from placements (pure, no I/O).

use super::pack::Placement;

/// One rule per placement:
///
/// ```css
/// .icon-back{background-position:-0px -16px;width:16px;height:16px;background-image:url(/assets/icons_1a2b3c4d.png)}
/// ```
pub fn sprite_rule(class_name: &str, placement: &Placement, url: &str) -> String {
    let Placement {
        x,
        y,
        width,
        height,
        ..
    } = placement;
    format!(
        ".{class_name}{{background-position:-{x}px -{y}px;width:{width}px;height:{height}px;background-image:url({url})}}"
    )
}

/// Join generated rules into the stylesheet text.
pub fn stylesheet(rules: &[String]) -> String {
    rules.join("\n")
}
