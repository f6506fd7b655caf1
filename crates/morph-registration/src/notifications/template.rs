//! HTML body of the confirmation email

use crate::settings::EventDetails;

/// Escape text for inclusion in HTML element content or attribute values
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render the confirmation for `recipient`, listing every name in `roster`.
///
/// All values are escaped, including the event details.
pub fn render_confirmation<'a>(
    event: &EventDetails,
    recipient: &str,
    roster: impl IntoIterator<Item = &'a str>,
) -> String {
    let names = roster
        .into_iter()
        .map(escape_html)
        .collect::<Vec<_>>()
        .join("<br />\n              ");

    let name = escape_html(&event.name);
    let dates = escape_html(&event.dates);
    let website = escape_html(&event.website);
    let website_label = escape_html(
        event
            .website
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/'),
    );

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="UTF-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1.0" />
    <title>{name}</title>
  </head>
  <body style="font-family: 'Poppins', Arial, sans-serif; background-color: #f2f4f6; margin: 0; padding: 10px 0;">
    <table align="center" width="600" style="max-width: 600px; background-color: #ffffff; padding: 24px;">
      <tr>
        <td style="color: #000000; font-size: 16px; line-height: 24px;">
          <h1 style="font-size: 26px; line-height: 34px;">Hola {recipient}! &#128039;</h1>
          <p>
            We are pleased to inform you that your registration for
            <strong>{name}</strong> was successful!<br /><br />
            The event will be held on <strong><em>{dates}</em></strong>, focusing on {theme}.
          </p>
          <p>
            <strong>Participant Name(s):</strong><br />
              {names}
          </p>
          <p>
            You will have access to all the sessions and activities we have
            scheduled for the event as a registered participant.
          </p>
          <p>
            Details of the event are as follows:<br />
            <strong>Date:</strong> {dates}<br />
            <strong>Time:</strong> {time}<br />
            <strong>Venue:</strong> {venue}
          </p>
          <p>
            Please do not hesitate to contact us if you have any queries about
            the event. We will be happy to assist you in any way we can.
          </p>
          <p>
            <strong>{name} Website:</strong>
            <a href="{website}">{website_label}</a><br />
            Do share this with your friends and join us for an exciting journey!
          </p>
          <p><strong><i>We look forward to seeing you there!</i></strong></p>
          <p>Thanks and regards,<br />{organiser}</p>
        </td>
      </tr>
    </table>
  </body>
</html>
"#,
        recipient = escape_html(recipient),
        theme = escape_html(&event.theme),
        time = escape_html(&event.time),
        venue = escape_html(&event.venue),
        organiser = escape_html(&event.organiser),
    )
}
