//! HTML pages of the browser upload flow.

/// Upload form served at `GET /`.
pub const UPLOAD_FORM: &str = r#"<!doctype html>
<title>Upload New Order File</title>
<h1>Upload new File</h1>
<form method=post enctype=multipart/form-data>
  <input type=file name=file>
  <input type=submit value=Upload>
</form>
"#;

/// Page linking both produced sheets.
pub fn processed_page(accounts_url: &str, shipping_url: &str) -> String {
    format!(
        r#"<!doctype html>
<title>Order Processed</title>
<h1>Order Processed</h1>
<p><a href="{}">Accounts File</a></p>
<p><a href="{}">Shipping File</a></p>
"#,
        escape_html(accounts_url),
        escape_html(shipping_url)
    )
}

/// Page showing an upload or processing failure.
pub fn error_page(message: &str) -> String {
    format!(
        "<!doctype html>\n<title>Error</title>\n<h1>{}</h1>\n",
        escape_html(message)
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
