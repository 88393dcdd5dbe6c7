//! The built-in demonstration document.
//!
//! Loaded by [`crate::controller::ConversionController::on_load_example`] and
//! by the first-run bootstrap when the buffer is empty. It exercises every
//! construct the converter is expected to handle, so it doubles as a smoke
//! test for a freshly deployed server.

/// Fixed sample covering headings, emphasis, nested lists, inline and fenced
/// code, a blockquote, and a GFM table.
pub const EXAMPLE_DOCUMENT: &str = r#"# Markdown Example

## Introduction

This is a sample document showing various markdown features that will convert beautifully to PDF.

## Formatting

You can write text in **bold**, *italic*, or ***bold and italic***.

## Lists

### Unordered Lists

- Item 1
- Item 2
  - Nested item 1
  - Nested item 2
- Item 3

### Ordered Lists

1. First item
2. Second item
   1. Nested item 1
   2. Nested item 2
3. Third item

## Code

Inline code: `console.log('Hello World!')`

Code block:

```javascript
function greet(name) {
  return 'Hello, ' + name + '!';
}

console.log(greet('World'));
```

## Quotes

> This is a blockquote. It can span multiple lines and can contain *formatted* text.

## Tables

| Name | Type | Description |
|------|------|-------------|
| id | integer | Unique identifier |
| name | string | User's name |
| email | string | User's email address |
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{CmarkRenderer, MarkdownRenderer};

    #[test]
    fn example_covers_every_construct() {
        let html = CmarkRenderer::default().render(EXAMPLE_DOCUMENT);
        for needle in [
            "<h1>",
            "<h3>",
            "<strong>",
            "<em>",
            "<ul>",
            "<ol>",
            "<code>",
            "<pre>",
            "<blockquote>",
            "<table>",
        ] {
            assert!(html.contains(needle), "example preview lacks {needle}");
        }
    }

    #[test]
    fn nested_lists_render_nested() {
        let html = CmarkRenderer::default().render(EXAMPLE_DOCUMENT);
        assert!(html.contains("<ul>\n<li>Nested item 1"), "got: {html}");
        assert!(html.contains("<ol>\n<li>Nested item 1"), "got: {html}");
    }
}
