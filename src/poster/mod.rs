//! Shareable victory poster.
//!
//! After a settlement confirms, the winner gets a square card to post on
//! social media: trophy, an over-the-top skill multiplier, the game, and
//! the amount won. Rendered as a self-contained SVG string so any client
//! can rasterize or embed it.

use rand::Rng;

/// Render the poster with a random dramatic multiplier (20-50x).
#[must_use]
pub fn render(game_name: &str, amount_sol: f64) -> String {
    let multiplier = rand::thread_rng().gen_range(20..=50);
    render_with_multiplier(game_name, amount_sol, multiplier)
}

/// Render the poster with a fixed multiplier.
#[must_use]
pub fn render_with_multiplier(game_name: &str, amount_sol: f64, multiplier: u32) -> String {
    let game_name = escape_xml(game_name);
    let amount = format!("{amount_sol:.2}");

    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="600" height="600" viewBox="0 0 600 600">
  <defs>
    <linearGradient id="bg" x1="0" y1="0" x2="1" y2="1">
      <stop offset="0" stop-color="#000000"/>
      <stop offset="0.5" stop-color="#111827"/>
      <stop offset="1" stop-color="#000000"/>
    </linearGradient>
    <linearGradient id="gold" x1="0" y1="0" x2="1" y2="0">
      <stop offset="0" stop-color="#facc15"/>
      <stop offset="1" stop-color="#ca8a04"/>
    </linearGradient>
  </defs>
  <rect width="600" height="600" rx="24" fill="url(#bg)" stroke="#eab308" stroke-width="8"/>
  <text x="300" y="150" font-size="96" text-anchor="middle">&#127942;</text>
  <text x="300" y="260" font-size="72" font-weight="900" text-anchor="middle" fill="url(#gold)">{multiplier}X</text>
  <text x="300" y="320" font-size="40" font-weight="900" text-anchor="middle" fill="#ffffff" letter-spacing="4">SKILL DIFF</text>
  <text x="300" y="410" font-size="28" font-weight="700" text-anchor="middle" fill="#ffffff">{game_name}</text>
  <text x="300" y="460" font-size="32" font-weight="700" text-anchor="middle" fill="#facc15">+{amount} SOL</text>
  <text x="300" y="540" font-size="24" font-weight="700" text-anchor="middle" fill="#eab308">TipArena</text>
  <text x="300" y="570" font-size="16" text-anchor="middle" fill="#6b7280">Prove Your Skills on Solana</text>
</svg>
"##
    )
}

/// Escape the five XML-significant characters in user-supplied text.
fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
