//! Server-rendered HTML pages.

use crate::bot::{BulkReport, RowStatus};

const HEAD: &str = r#"<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<link rel="stylesheet" href="https://www.w3schools.com/w3css/4/w3.css">
<link rel="stylesheet" href="https://fonts.googleapis.com/css?family=Raleway">
<style>
body,h1 {font-family: "Raleway", sans-serif}
body, html {height: 100%}
.bgimg {
  background-color: #0b3d2e;
  min-height: 100%;
  background-position: center;
  background-size: cover;
}
</style>"#;

/// Escape text for inclusion in HTML content or attribute values.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn layout(title: &str, middle: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<title>{title}</title>
{HEAD}
</head>
<body>
<div class="bgimg w3-display-container w3-animate-opacity w3-text-white">
  <div class="w3-display-topleft w3-padding-large w3-xlarge">WhatsGPT</div>
  <div class="w3-display-middle">
{middle}
  </div>
  <div class="w3-display-bottomleft w3-padding-large">Powered by <a href="/">WhatsGPT</a></div>
</div>
</body>
</html>
"#
    )
}

/// Confirmation after a bulk upload.
#[must_use]
pub fn upload_summary(report: &BulkReport) -> String {
    let mut middle = format!(
        r#"    <h2 class="w3-jumbo w3-animate-top">Messages Sent!</h2>
    <hr class="w3-border-grey" style="margin:auto;width:40%">
    <p class="w3-large w3-center">Bulk messages have been sent to {} contacts.</p>
"#,
        report.attempted
    );

    let failures: Vec<_> = report.failures().collect();
    if !failures.is_empty() {
        middle.push_str(&format!(
            r#"    <p class="w3-center">{} could not be reached:</p>
    <ul class="w3-ul w3-small">
"#,
            failures.len()
        ));
        for outcome in failures {
            if let RowStatus::Failed { reason } = &outcome.status {
                middle.push_str(&format!(
                    "      <li>{} &mdash; {}</li>\n",
                    escape_html(&outcome.phone),
                    escape_html(reason)
                ));
            }
        }
        middle.push_str("    </ul>\n");
    }

    middle.push_str(
        r#"    <p class="w3-center"><a href="/" class="w3-button w3-white">Back to Home</a></p>"#,
    );
    layout("WhatsGPT - Bulk Messages Sent", &middle)
}

/// Pairing page embedding the QR image.
#[must_use]
pub fn pairing(image_src: &str) -> String {
    let middle = format!(
        r#"    <center>
      <h2 class="w3-jumbo w3-animate-top">QRCode Generated</h2>
      <hr class="w3-border-grey" style="margin:auto;width:40%">
      <p class="w3-center"><img src="{}" alt="WhatsApp pairing code"/></p>
    </center>"#,
        escape_html(image_src)
    );
    layout("WhatsGPT", &middle)
}

/// Shown when no pairing code arrived before the deadline.
#[must_use]
pub fn pairing_timeout(retry_path: &str) -> String {
    let middle = format!(
        r#"    <h2 class="w3-xxlarge w3-animate-top">No pairing code yet</h2>
    <p class="w3-center">WhatsApp has not produced a code. Please try again.</p>
    <p class="w3-center"><a href="{}" class="w3-button w3-white">Retry</a></p>"#,
        escape_html(retry_path)
    );
    layout("WhatsGPT - Waiting for WhatsApp", &middle)
}

/// Shown when the session is already paired.
#[must_use]
pub fn already_paired() -> String {
    layout(
        "WhatsGPT",
        r#"    <h2 class="w3-xxlarge w3-animate-top">WhatsApp is connected</h2>
    <p class="w3-center">This session is already paired.</p>
    <p class="w3-center"><a href="/" class="w3-button w3-white">Back to Home</a></p>"#,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::RowOutcome;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_summary_reports_attempted_count() {
        let report = BulkReport {
            attempted: 3,
            outcomes: vec![
                RowOutcome {
                    phone: "1".to_string(),
                    status: RowStatus::Sent,
                },
                RowOutcome {
                    phone: "2".to_string(),
                    status: RowStatus::Failed {
                        reason: "<boom>".to_string(),
                    },
                },
                RowOutcome {
                    phone: "3".to_string(),
                    status: RowStatus::Sent,
                },
            ],
        };
        let html = upload_summary(&report);
        assert!(html.contains("sent to 3 contacts"));
        assert!(html.contains("1 could not be reached"));
        assert!(html.contains("&lt;boom&gt;"));
    }

    #[test]
    fn test_pairing_embeds_image() {
        let html = pairing("data:image/svg+xml;base64,AAAA");
        assert!(html.contains(r#"<img src="data:image/svg+xml;base64,AAAA""#));
    }
}
