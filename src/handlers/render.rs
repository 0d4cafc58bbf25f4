//! HTML rendering of the gallery page.

use crate::detail::DetailView;
use crate::filter::MonthOption;
use crate::gallery::GalleryView;
use crate::models::REGIONS;
use crate::navigation::NavigationState;
use crate::pager::{Card, PageButton};

/// Message shown in place of the gallery when the index never loaded.
pub const UNAVAILABLE_MESSAGE: &str = "Unable to load data";

/// Escapes text for HTML element content and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn document(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>Wallpaper Archive</title>\n</head>\n<body>\n{}</body>\n</html>\n",
        body
    )
}

/// Page shown when the archive index could not be loaded.
pub fn render_unavailable() -> String {
    document(&format!(
        "<main class=\"gallery-grid\">\n<h3 class=\"load-error\">{}</h3>\n</main>\n",
        UNAVAILABLE_MESSAGE
    ))
}

/// Renders a navigated gallery page.
pub fn render_gallery(view: &GalleryView, months: &[MonthOption]) -> String {
    let mut body = String::new();
    body.push_str(&render_controls(&view.state, months));

    body.push_str("<main class=\"gallery-grid\">\n");
    if view.page.cards.is_empty() {
        body.push_str("<p class=\"no-data\">No data</p>\n");
    }
    for card in &view.page.cards {
        body.push_str(&render_card(card, &view.state));
    }
    body.push_str("</main>\n");

    body.push_str(&render_pagination(&view.page.buttons, &view.state));
    if let Some(detail) = &view.detail {
        body.push_str(&render_detail(detail, &view.state));
    }
    document(&body)
}

fn render_controls(state: &NavigationState, months: &[MonthOption]) -> String {
    let mut html = String::from("<header class=\"controls\">\n<form method=\"get\" action=\"/\">\n");

    html.push_str("<select name=\"country\">\n");
    for region in REGIONS {
        html.push_str(&format!(
            "<option value=\"{}\"{}>{}</option>\n",
            region.code,
            selected(region.code == state.country),
            escape_html(region.label)
        ));
    }
    html.push_str("</select>\n<select name=\"date\">\n");
    html.push_str(&format!(
        "<option value=\"all\"{}>All Months</option>\n",
        selected(state.date.is_all())
    ));
    for month in months {
        html.push_str(&format!(
            "<option value=\"{}\"{}>{}</option>\n",
            escape_html(&month.value),
            selected(month.value == state.date.as_str()),
            escape_html(&month.label)
        ));
    }
    html.push_str("</select>\n");
    html.push_str(&format!(
        "<input type=\"search\" name=\"search\" value=\"{}\" placeholder=\"Search\">\n",
        escape_html(&state.search)
    ));
    html.push_str("<button type=\"submit\">Go</button>\n</form>\n</header>\n");
    html
}

fn selected(is_selected: bool) -> &'static str {
    if is_selected {
        " selected"
    } else {
        ""
    }
}

fn render_card(card: &Card, state: &NavigationState) -> String {
    let class = if card.featured { "card featured" } else { "card" };
    let loading = if card.lazy { "lazy" } else { "eager" };
    let description = card
        .description
        .as_deref()
        .map(|d| format!("<p class=\"card-desc\">{}</p>\n", escape_html(d)))
        .unwrap_or_default();

    format!(
        "<a class=\"{class}\" href=\"{href}\">\n\
         <span class=\"archive-year-badge\">{year}</span>\n\
         <img class=\"card-img\" src=\"{src}\" alt=\"{title}\" loading=\"{loading}\" \
         data-probe=\"/api/photos/{date}/probe\">\n\
         <div class=\"image-error\">Image Unavailable</div>\n\
         <div class=\"card-content\">\n<h3 class=\"card-title\">{title}</h3>\n\
         <div class=\"card-date\">{display_date}</div>\n{description}</div>\n</a>\n",
        class = class,
        href = escape_html(&state.with_photo(card.date.as_str()).href()),
        year = escape_html(&card.year),
        src = escape_html(&card.image_url),
        title = escape_html(&card.title),
        loading = loading,
        date = escape_html(&card.date),
        display_date = escape_html(&card.display_date),
        description = description,
    )
}

fn render_pagination(buttons: &[PageButton], state: &NavigationState) -> String {
    if buttons.is_empty() {
        return String::new();
    }
    let mut html = String::from("<nav class=\"pagination\">\n");
    for button in buttons {
        match button {
            PageButton::Page { number, active } => html.push_str(&format!(
                "<a class=\"page-btn{}\" href=\"{}\">{}</a>\n",
                if *active { " active" } else { "" },
                escape_html(&state.with_page(*number).href()),
                number
            )),
            PageButton::Ellipsis => html.push_str("<span class=\"page-dots\">...</span>\n"),
        }
    }
    html.push_str("</nav>\n");
    html
}

fn render_detail(detail: &DetailView, state: &NavigationState) -> String {
    let map_link = detail
        .map_url
        .as_deref()
        .map(|url| {
            format!(
                " <a class=\"map-link\" href=\"{}\" target=\"_blank\" \
                 title=\"View on world map (approximate location)\">Map</a>",
                escape_html(url)
            )
        })
        .unwrap_or_default();

    let mut html = format!(
        "<section class=\"lightbox show\">\n\
         <a class=\"close-lightbox\" href=\"{close}\">Close</a>\n\
         <img class=\"lb-img\" src=\"{src}\" alt=\"{title}\">\n\
         <h2 class=\"lb-title\">{title}</h2>\n\
         <div class=\"lb-date\">{date}</div>\n\
         <p class=\"lb-copyright\">{copyright}{map_link}</p>\n\
         <p class=\"lb-desc\">{description}</p>\n\
         <div class=\"dl-btn-group\">\n",
        close = escape_html(&state.without_photo().href()),
        src = escape_html(&detail.image_url),
        title = escape_html(&detail.title),
        date = escape_html(&detail.display_date),
        copyright = escape_html(&detail.copyright),
        map_link = map_link,
        description = escape_html(&detail.description),
    );
    for link in &detail.downloads {
        html.push_str(&format!(
            "<a class=\"dl-btn\" href=\"/api/photos/{}/download/{}\" download=\"{}\">{}</a>\n",
            escape_html(&detail.date),
            link.resolution,
            escape_html(&link.filename),
            link.label
        ));
    }
    html.push_str("</div>\n</section>\n");
    html
}
