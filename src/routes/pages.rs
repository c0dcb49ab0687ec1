//! The greeting and quote pages.

use std::path::Path;

use chrono::Utc;
use log::info;

use crate::parser::Request;
use crate::server::{http_date, Error, Response, StatusCode};

/// Colors the greeting page is willing to call someone's favorite.
pub const FAVORITE_COLORS: [&str; 7] = ["coral", "crimson", "navy", "purple", "tomato", "teal", "wheat"];

/// `GET /hello`: a greeting personalized from the `name`, `color` and
/// `visits` cookies. Each visit bumps the `visits` cookie.
pub fn hello_page(req: &Request, base_url: &str) -> Response {
    info!("Handling http get hello request");

    let name = req.cookie("name").filter(|name| !name.is_empty()).unwrap_or("World");
    let color = req.cookie("color").filter(|color| FAVORITE_COLORS.contains(color));
    let visits: u64 = req.cookie("visits").and_then(|v| v.parse().ok()).unwrap_or(0);

    let mut msg = format!("Welcome, {name}!\n");
    msg.push_str(&format!("The current date is {}.\n", http_date(Utc::now())));
    match visits {
        0 => msg.push_str("This is your first visit to this page.\n"),
        1 => msg.push_str("You have visited this page 1 time before.\n"),
        n => msg.push_str(&format!("You have visited this page {n} times before.\n")),
    }
    match color {
        Some(color) => msg.push_str(&format!("Your favorite color is {color}.\n")),
        None => msg.push_str("Set a `color` cookie to tell us your favorite color.\n"),
    }
    msg.push_str("You can also go to these exciting pages:\n");
    msg.push_str(&format!("  {base_url}/hello        - this page\n"));
    msg.push_str(&format!("  {base_url}/status       - status and statistics\n"));
    msg.push_str(&format!("  {base_url}/status.json  - statistics as JSON\n"));
    msg.push_str(&format!("  {base_url}/quote        - a random quote\n"));
    msg.push_str(&format!("  {base_url}/welcome.html - a welcome page\n"));
    msg.push_str(&format!("  {base_url}/index.html   - some fancy web page\n"));

    Response::text(StatusCode::Ok, msg).with_cookie(format!("visits={}", visits + 1))
}

/// Split the quotes file into entries. Entries are separated by lines that
/// contain nothing but `%`; blank entries are dropped.
pub fn split_quotes(text: &str) -> Vec<String> {
    let mut quotes = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        if line == "%" {
            quotes.push(std::mem::take(&mut current));
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }
    quotes.push(current);

    quotes.retain(|quote| !quote.trim().is_empty());
    quotes
}

/// `GET /quote`: an HTML page with a random entry from the quotes file.
///
/// # Errors
///
/// Fails if the quotes file cannot be read or holds no quotes.
pub async fn quote_page(quotes_file: &Path) -> Result<Response, Error> {
    info!("Handling http get quote request");

    let text = tokio::fs::read_to_string(quotes_file).await?;
    let quotes = split_quotes(&text);
    if quotes.is_empty() {
        return Err(Error::InternalError(format!("no quotes in {}", quotes_file.display())));
    }
    let quote = &quotes[fastrand::usize(..quotes.len())];

    let mut msg = String::from("<html><head><title>Quotes!</title></head>");
    msg.push_str("<body>");
    msg.push_str("<p>Here is a randomly chosen quote:</p>");
    msg.push_str(&format!("<pre>{}</pre>", escape_html(quote)));
    msg.push_str("<p>Hit page refresh (F5) or <a href=\"/quote\">click here</a> to refresh this page.</p>");
    msg.push_str("<p>You can also check the <a href=\"/status\">server status</a>.</p>");
    msg.push_str("</body></html>");

    Ok(Response::html(StatusCode::Ok, msg))
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            c => escaped.push(c),
        }
    }
    escaped
}
