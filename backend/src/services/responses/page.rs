//! The response page served at `GET /nps/{token}`.
//!
//! Rendered from the token's context snapshot alone. Error pages are plain
//! text and worded for the recipient, not for operators.

use crate::state::AppState;
use crate::tokens::TokenError;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use log::error;
use nps_common::model::token::TokenContext;

const INVALID_LINK: &str = "This survey link is invalid. Please check the link you received.";
const ALREADY_ANSWERED: &str = "You have already answered this survey. Thank you for your feedback!";
const EXPIRED_LINK: &str = "This survey link has expired.";
const UNAVAILABLE: &str = "The survey is temporarily unavailable. Please try again later.";

pub(crate) async fn process(state: web::Data<AppState>, token: web::Path<String>) -> HttpResponse {
    match state.tokens.validate(token.trim()) {
        Ok(stored) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(render_form(&stored.context)),
        Err(TokenError::NotFound) => invalid_link(),
        Err(TokenError::AlreadyUsed) => plain(StatusCode::GONE, ALREADY_ANSWERED),
        Err(TokenError::Expired) => plain(StatusCode::GONE, EXPIRED_LINK),
        Err(TokenError::Storage(e)) => {
            error!("Response page unavailable: {}", e);
            plain(StatusCode::INTERNAL_SERVER_ERROR, UNAVAILABLE)
        }
    }
}

pub(crate) fn invalid_link() -> HttpResponse {
    plain(StatusCode::NOT_FOUND, INVALID_LINK)
}

fn plain(status: StatusCode, text: &'static str) -> HttpResponse {
    HttpResponse::build(status)
        .content_type("text/plain; charset=utf-8")
        .body(text)
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

pub(crate) fn render_form(ctx: &TokenContext) -> String {
    let first_name = ctx
        .recipient_name
        .split_whitespace()
        .next()
        .unwrap_or(&ctx.recipient_name);
    let buttons: String = (0..=10)
        .map(|n| {
            format!(
                r#"<label class="score"><input type="radio" name="score" value="{n}"><span>{n}</span></label>"#
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>
body {{ font-family: system-ui, sans-serif; max-width: 560px; margin: 2rem auto; padding: 0 1rem; color: #222; }}
.scores {{ display: flex; flex-wrap: wrap; gap: .4rem; margin: 1rem 0; }}
.score input {{ display: none; }}
.score span {{ display: inline-block; width: 2.4rem; line-height: 2.4rem; text-align: center; border: 1px solid #999; border-radius: 6px; cursor: pointer; }}
.score input:checked + span {{ background: #2563eb; color: #fff; border-color: #2563eb; }}
.legend {{ display: flex; justify-content: space-between; font-size: .85rem; color: #666; }}
textarea {{ width: 100%; min-height: 6rem; margin: 1rem 0; }}
button {{ padding: .7rem 1.6rem; font-size: 1rem; }}
#message {{ margin-top: 1rem; }}
</style>
</head>
<body>
<h1>{title}</h1>
<p>Hi {name},</p>
<form id="nps-form">
<p><strong>{question}</strong></p>
<div class="scores">{buttons}</div>
<div class="legend"><span>Not at all likely</span><span>Extremely likely</span></div>
<label for="comment">Anything you would like to add? (optional)</label>
<textarea id="comment" name="comment" maxlength="2000"></textarea>
<button type="submit">Send</button>
</form>
<p id="message"></p>
<script>
document.getElementById("nps-form").addEventListener("submit", async function (event) {{
  event.preventDefault();
  var message = document.getElementById("message");
  var picked = document.querySelector("input[name=score]:checked");
  if (!picked) {{ message.textContent = "Please choose a score from 0 to 10."; return; }}
  var body = {{ score: parseInt(picked.value, 10) }};
  var comment = document.getElementById("comment").value.trim();
  if (comment) {{ body.comment = comment; }}
  try {{
    var res = await fetch(window.location.pathname, {{
      method: "POST",
      headers: {{ "Content-Type": "application/json" }},
      body: JSON.stringify(body)
    }});
    if (res.ok) {{
      document.getElementById("nps-form").remove();
      message.textContent = "Thank you! Your answer was recorded.";
    }} else if (res.status === 410) {{
      message.textContent = "This survey was already answered or the link has expired.";
    }} else {{
      message.textContent = "We could not record your answer. Please try again.";
    }}
  }} catch (e) {{
    message.textContent = "We could not reach the server. Please try again.";
  }}
}});
</script>
</body>
</html>
"#,
        title = escape_html(&ctx.survey_title),
        name = escape_html(first_name),
        question = escape_html(&ctx.question),
        buttons = buttons,
    )
}
