use foundation::html::escape_html;

use crate::surface::{ClickHandler, ClickedFeature, Popup};

/// Image-over-caption card shown for a clicked pin.
pub fn popup_html(image: &str, caption: &str) -> String {
    format!(
        concat!(
            r#"<div style="text-align:center; width:100%;">"#,
            r#"<img src="{}" alt="Marker" style="width:100%; height:auto; border-radius:5px;" />"#,
            r#"<p style="margin-top:10px; font-size:14px; color:#333;">{}</p>"#,
            "</div>"
        ),
        escape_html(image),
        escape_html(caption)
    )
}

/// Handler attached once per pin layer.
///
/// It reads everything from the clicked feature's own properties, so it stays
/// correct when the layer is later removed and re-created with new data.
pub fn pin_click_handler(max_width_px: u32) -> ClickHandler {
    Box::new(move |feature: &ClickedFeature| {
        let prop = |name: &str| {
            feature
                .properties
                .get(name)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };
        Some(Popup {
            at: feature.coordinates,
            html: popup_html(&prop("image"), &prop("caption")),
            max_width_px,
        })
    })
}
