//! Built-in deck theme.
//!
//! The stylesheet carries page-agnostic rules plus rules scoped with the
//! combined-markup selector prefix. That prefix reaches across fragment
//! boundaries, so the page extractor strips it before inlining the styles
//! into a standalone fragment.

pub(crate) const PAGE_WIDTH: u32 = 1280;
pub(crate) const PAGE_HEIGHT: u32 = 720;

pub(crate) const STYLESHEET: &str = r#"div.marpit {
  all: initial;
}
div.marpit > svg {
  display: block;
  margin: 0 auto 24px;
  max-width: 100%;
  height: auto;
}
div.marpit > svg > foreignObject > section {
  box-sizing: border-box;
  width: 1280px;
  height: 720px;
  padding: 60px 70px;
  display: flex;
  flex-direction: column;
  justify-content: center;
  overflow: hidden;
  background: #ffffff;
  color: #24292f;
  font-family: "Helvetica Neue", Arial, "Hiragino Sans", sans-serif;
  font-size: 28px;
  line-height: 1.45;
}
div.marpit > svg > foreignObject > section h1 {
  font-size: 1.8em;
  margin: 0 0 0.5em;
  border-bottom: 2px solid #d0d7de;
  padding-bottom: 0.25em;
}
div.marpit > svg > foreignObject > section h2 {
  font-size: 1.4em;
  margin: 0 0 0.5em;
}
div.marpit > svg > foreignObject > section p {
  margin: 0.4em 0;
}
div.marpit > svg > foreignObject > section code {
  font-family: "SFMono-Regular", Consolas, Menlo, monospace;
  font-size: 0.85em;
  background: #f6f8fa;
  border-radius: 4px;
  padding: 0.1em 0.3em;
}
div.marpit > svg > foreignObject > section pre {
  background: #f6f8fa;
  border-radius: 6px;
  padding: 0.6em 0.8em;
  overflow: hidden;
}
div.marpit > svg > foreignObject > section pre > code {
  background: transparent;
  padding: 0;
}
div.marpit > svg > foreignObject > section blockquote {
  margin: 0.4em 0;
  padding-left: 0.8em;
  border-left: 4px solid #d0d7de;
  color: #57606a;
}
div.marpit > svg > foreignObject > section table {
  border-collapse: collapse;
}
div.marpit > svg > foreignObject > section th,
div.marpit > svg > foreignObject > section td {
  border: 1px solid #d0d7de;
  padding: 0.2em 0.6em;
}
div.marpit > svg > foreignObject > section img {
  max-width: 100%;
}
div.marpit > svg > foreignObject > section a {
  color: #0969da;
}
"#;
