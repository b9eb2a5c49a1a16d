use crate::domain::{
    chart::ThemeTokens,
    logging::{LogComponent, get_logger},
};

/// Used when the token is not defined on the page.
pub const FALLBACK_GRID_COLOR: &str = "#2b2f36";

/// Resolve the theme tokens from the computed style of `<body>`.
pub fn read_theme_tokens(grid_color_token: &str) -> ThemeTokens {
    let value = web_sys::window()
        .and_then(|window| {
            let body = window.document()?.body()?;
            window.get_computed_style(&body).ok().flatten()
        })
        .and_then(|style| style.get_property_value(grid_color_token).ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());

    match value {
        Some(color) => ThemeTokens::new(color),
        None => {
            get_logger().warn(
                LogComponent::Infrastructure("Theme"),
                &format!("CSS token {} is not set, using {}", grid_color_token, FALLBACK_GRID_COLOR),
            );
            ThemeTokens::new(FALLBACK_GRID_COLOR)
        }
    }
}
