//! Default files synthesized for missing or blank entry points

use std::borrow::Cow;

const CONTENT_SCRIPT: &str = r"// Auto-generated content script
console.log('Extension content script loaded on:', window.location.href);

(function () {
  const badge = document.createElement('div');
  badge.textContent = 'Extension Active';
  badge.style.cssText = [
    'position: fixed',
    'top: 12px',
    'right: 12px',
    'z-index: 2147483647',
    'padding: 6px 10px',
    'border-radius: 4px',
    'background: #4CAF50',
    'color: #fff',
    'font: 12px sans-serif',
  ].join(';');
  document.documentElement.appendChild(badge);
  setTimeout(() => badge.remove(), 3000);
})();

chrome.runtime.onMessage.addListener((request, sender, sendResponse) => {
  if (request && request.action === 'ping') {
    sendResponse({ status: 'Content script active' });
  }
  return true;
});
";

const CONTENT_STYLE: &str = r"/* Auto-generated content script styles */
.extension-highlight {
  background-color: rgba(255, 235, 59, 0.4);
  outline: 1px solid #fbc02d;
}

.extension-overlay {
  position: fixed;
  inset: 0;
  z-index: 2147483646;
  pointer-events: none;
}
";

const BACKGROUND_SCRIPT: &str = r"// Auto-generated background script
console.log('Extension background script loaded');

chrome.runtime.onInstalled.addListener((details) => {
  console.log('Extension installed', details.reason);
});

chrome.runtime.onMessage.addListener((request, sender, sendResponse) => {
  if (request && request.action === 'ping') {
    sendResponse({ status: 'Background script active' });
  }
  return true;
});
";

/// Templates for synthesized files
///
/// Script and style stubs are fixed text. Page stubs are rendered with the
/// extension's display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubTemplates {
    pub content_script: Cow<'static, str>,
    pub content_style: Cow<'static, str>,
    pub background_script: Cow<'static, str>,
}

impl StubTemplates {
    /// Popup page titled with `name`
    #[must_use]
    pub fn popup_page(&self, name: &str) -> String {
        render_page(name, "Extension popup loaded successfully!", "320px")
    }

    /// Side panel page titled with `name`
    #[must_use]
    pub fn side_panel_page(&self, name: &str) -> String {
        render_page(name, "Extension side panel loaded successfully!", "100%")
    }
}

impl Default for StubTemplates {
    fn default() -> Self {
        Self {
            content_script: Cow::Borrowed(CONTENT_SCRIPT),
            content_style: Cow::Borrowed(CONTENT_STYLE),
            background_script: Cow::Borrowed(BACKGROUND_SCRIPT),
        }
    }
}

fn render_page(name: &str, message: &str, width: &str) -> String {
    let title = escape_html(name);
    format!(
        "<!DOCTYPE html>
<html>
<head>
  <meta charset=\"utf-8\">
  <title>{title}</title>
  <style>
    body {{ width: {width}; margin: 0; padding: 16px; font-family: sans-serif; }}
    h1 {{ font-size: 16px; margin: 0 0 8px; }}
  </style>
</head>
<body>
  <h1>{title}</h1>
  <p>{message}</p>
</body>
</html>
"
    )
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
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
