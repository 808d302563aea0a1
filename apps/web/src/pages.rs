//! Static HTML pages.

const STYLE: &str = "body{font-family:sans-serif;max-width:48rem;margin:2rem auto;padding:0 1rem}\
label{display:block;margin-top:1rem}input[type=url],input[type=text]{width:100%}\
pre{white-space:pre-wrap;background:#f4f4f4;padding:1rem}";

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <nav><a href=\"/\">Generate</a> | <a href=\"/about\">About</a></nav>\n{body}\n</body>\n</html>\n"
    )
}

/// Escape text for use inside a double-quoted attribute or element body.
fn escape_html(text: &str) -> String {
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

pub(crate) fn render_home(default_model: &str) -> String {
    let default_model = escape_html(default_model);
    let body = format!(
        r#"<h1>Tailored example generator</h1>
<form id="generate" method="post" action="/generate">
  <label>Paper or publications page URL
    <input type="url" name="url" required placeholder="https://example.org/paper.pdf">
  </label>
  <label>Model
    <input type="text" name="model" value="{default_model}">
  </label>
  <label>Classification
    <select name="force">
      <option value="true" selected>Generate without classifying</option>
      <option value="false">Only real-world applications</option>
    </select>
  </label>
  <p><button type="submit">Generate</button></p>
</form>
<div id="status"></div>
<pre id="result" hidden></pre>
<script>
document.getElementById("generate").addEventListener("submit", async (event) => {{
  event.preventDefault();
  const status = document.getElementById("status");
  const result = document.getElementById("result");
  status.textContent = "Generating, this can take a minute...";
  result.hidden = true;
  const response = await fetch("/generate", {{ method: "POST", body: new URLSearchParams(new FormData(event.target)) }});
  const data = await response.json();
  if (data.success) {{
    status.textContent = data.metadata.title || "";
    result.textContent = data.generated_content;
    result.hidden = false;
  }} else {{
    status.textContent = data.detail;
  }}
}});
</script>"#
    );
    layout("tailor", &body)
}

pub(crate) fn render_about() -> String {
    layout(
        "About tailor",
        r#"<h1>About</h1>
<p>Give this tool the URL of a paper PDF or of a publications page. It fetches the
paper, extracts its text and asks a language model to rewrite it as a tailored
example: a short markdown document covering the problem, why the algorithm had to
be tailored, the baseline algorithm, the tailoring process and what was tailored.</p>
<p>By default every paper is rewritten. Choose "Only real-world applications" to
classify the paper first and refuse papers that do not apply an algorithm to a
real-world problem.</p>"#,
    )
}
