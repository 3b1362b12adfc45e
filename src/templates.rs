//! Server-rendered pages of the demo

use crate::constants::{FORCE_UPDATE_PATH, HOME_PATH, MAX_USERNAME_LEN};

const STYLES: &str = r#"
body { font-family: -apple-system, "Segoe UI", Roboto, sans-serif; margin: 2rem auto; max-width: 960px; color: #222; }
h1 { font-size: 1.5rem; }
form label { display: block; margin: 0.75rem 0 0.25rem; }
.help { font-size: 0.8rem; color: #666; }
.error { background: #fdecea; border: 1px solid #f5c2c0; padding: 0.5rem 1rem; border-radius: 4px; }
iframe { width: 100%; height: 80vh; border: 1px solid #ddd; }
nav a { margin-right: 1rem; }
"#;

/// Form state shown on the home page
#[derive(Debug, Clone)]
pub struct HomeView<'a> {
  pub locales: &'a [String],
  pub selected_locale: &'a str,
  pub username: &'a str,
  pub theme_enabled: bool,
  pub skip_recipients_step: bool,
  pub flash_error: Option<&'a str>,
}

pub fn render_home(view: &HomeView) -> String {
  let mut content = String::with_capacity(2048);
  content.push_str("<h1>Embedded newsletter creation</h1>\n");

  if let Some(error) = view.flash_error {
    content.push_str("<p class=\"error\">Error: ");
    content.push_str(&html_escape(error));
    content.push_str("</p>\n");
  }

  content.push_str(&format!("<form method=\"post\" action=\"{HOME_PATH}\">\n"));

  content.push_str("<label for=\"username\">Username</label>\n");
  content.push_str(&format!(
    "<input type=\"text\" id=\"username\" name=\"username\" maxlength=\"{MAX_USERNAME_LEN}\" value=\"{}\">\n",
    html_escape(view.username)
  ));
  content.push_str(
    "<div class=\"help\">Try with the example \"demoapi\" user or leave blank to test the authorization code grant flow.</div>\n",
  );

  content.push_str("<label for=\"lang\">Choose language</label>\n<select id=\"lang\" name=\"lang\">\n");
  for locale in view.locales {
    let selected = if locale == view.selected_locale { " selected" } else { "" };
    content.push_str(&format!(
      "<option value=\"{0}\"{selected}>{1}</option>\n",
      html_escape(locale),
      html_escape(&locale_label(locale))
    ));
  }
  content.push_str("</select>\n");

  push_checkbox(&mut content, "css", "Use custom CSS", view.theme_enabled);
  push_checkbox(
    &mut content,
    "skip_recipients_step",
    "Skip recipients step",
    view.skip_recipients_step,
  );
  push_checkbox(&mut content, "auth_code_grant", "Use authorization code grant", false);

  content.push_str("<p><button type=\"submit\">Open newsletter editor</button></p>\n</form>\n");

  content.push_str(&format!(
    "<form method=\"post\" action=\"{FORCE_UPDATE_PATH}\"><button type=\"submit\">Reset session</button></form>\n"
  ));

  render_page("Embed demo", &content)
}

/// Page holding the embed session url in an iframe
pub fn render_embed(embed_url: &str) -> String {
  let content = format!(
    "<nav><a href=\"{HOME_PATH}\">Back</a></nav>\n<iframe src=\"{}\" title=\"Newsletter editor\"></iframe>\n",
    html_escape(embed_url)
  );
  render_page("Newsletter editor", &content)
}

pub fn render_error(title: &str, description: &str) -> String {
  let content = format!(
    "<h1>{}</h1>\n<p class=\"error\">{}</p>\n<nav><a href=\"{HOME_PATH}\">Start over</a></nav>\n",
    html_escape(title),
    html_escape(description)
  );
  render_page(title, &content)
}

fn render_page(title: &str, content: &str) -> String {
  format!(
    "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{STYLES}</style>\n</head>\n<body>\n{content}</body>\n</html>\n",
    html_escape(title)
  )
}

fn push_checkbox(content: &mut String, name: &str, label: &str, checked: bool) {
  let checked = if checked { " checked" } else { "" };
  content.push_str(&format!(
    "<label><input type=\"checkbox\" name=\"{name}\" value=\"on\"{checked}> {label}</label>\n"
  ));
}

fn locale_label(locale: &str) -> String {
  match locale {
    "en" => "English".to_string(),
    "nb" => "Norwegian".to_string(),
    other => other.to_string(),
  }
}

fn html_escape(s: &str) -> String {
  s.replace('&', "&amp;")
    .replace('<', "&lt;")
    .replace('>', "&gt;")
    .replace('"', "&quot;")
    .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
  use super::*;

  fn view<'a>(locales: &'a [String]) -> HomeView<'a> {
    HomeView {
      locales,
      selected_locale: "nb",
      username: "",
      theme_enabled: false,
      skip_recipients_step: true,
      flash_error: None,
    }
  }

  #[test]
  fn home_form_has_defaults() {
    let locales = vec!["en".to_string(), "nb".to_string()];
    let html = render_home(&view(&locales));
    assert!(html.contains("<option value=\"nb\" selected>Norwegian</option>"));
    assert!(html.contains("name=\"skip_recipients_step\" value=\"on\" checked"));
    assert!(html.contains("name=\"css\" value=\"on\">"));
    assert!(!html.contains("class=\"error\""));
  }

  #[test]
  fn user_input_is_escaped() {
    let locales = vec!["en".to_string()];
    let mut v = view(&locales);
    v.username = "<script>";
    v.flash_error = Some("bad \"grant\"");
    let html = render_home(&v);
    assert!(html.contains("value=\"&lt;script&gt;\""));
    assert!(html.contains("Error: bad &quot;grant&quot;"));
    assert!(!html.contains("<script>"));
  }

  #[test]
  fn embed_page_escapes_url() {
    let html = render_embed("https://embed.example/s?a=1&b=2");
    assert!(html.contains("src=\"https://embed.example/s?a=1&amp;b=2\""));
  }
}
