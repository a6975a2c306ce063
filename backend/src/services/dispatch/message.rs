//! Text of the survey invitation sent over WhatsApp.

use nps_common::model::survey::Survey;

/// Builds the personalised invitation embedding the response link.
pub fn compose(first_name: &str, survey: &Survey, response_url: &str) -> String {
    let mut text = format!("Hi {}! 👋\n\n*{}*\n", first_name, survey.title);
    if let Some(description) = survey.description.as_deref() {
        text.push_str(description);
        text.push('\n');
    }
    text.push('\n');
    text.push_str(&survey.question);
    text.push_str("\n\nIt takes less than a minute, answer here:\n");
    text.push_str(response_url);
    text.push_str("\n\nThis link is personal and can only be used once.");
    text
}

/// `<base>/nps/<token>`
pub fn response_url(public_base_url: &str, token: &str) -> String {
    format!("{}/nps/{}", public_base_url.trim_end_matches('/'), token)
}
