//! Fenced code blocks to the Confluence `code` macro.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::markup::unescape_html;

static CODE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<pre><code(?:\s+class="([^"]*)")?\s*>(.*?)</code></pre>"#)
        .expect("invalid code block regex")
});

/// Map a fence info tag to a Confluence code macro language.
///
/// Returns `"none"` for tags the macro doesn't know.
pub fn confluence_language(tag: &str) -> &'static str {
    match tag.to_ascii_lowercase().as_str() {
        "actionscript" | "actionscript3" | "as3" => "actionscript3",
        "applescript" => "applescript",
        "bash" | "sh" | "shell" | "zsh" | "console" => "bash",
        "c" | "cpp" | "c++" | "h" | "hpp" => "cpp",
        "cs" | "csharp" | "c#" => "c#",
        "coldfusion" | "cfm" => "coldfusion",
        "css" => "css",
        "delphi" | "pascal" => "delphi",
        "diff" | "patch" => "diff",
        "erlang" | "erl" => "erl",
        "groovy" => "groovy",
        "html" | "xml" | "xhtml" | "svg" => "xml",
        "java" => "java",
        "javafx" | "jfx" => "jfx",
        "javascript" | "js" | "json" | "typescript" | "ts" => "js",
        "perl" | "pl" => "perl",
        "php" => "php",
        "powershell" | "ps" | "ps1" => "powershell",
        "python" | "py" => "py",
        "ruby" | "rb" => "ruby",
        "sass" | "scss" => "sass",
        "scala" => "scala",
        "sql" => "sql",
        "vb" | "vbnet" | "visualbasic" => "vb",
        "yaml" | "yml" => "yml",
        "text" | "txt" | "plain" | "plaintext" => "text",
        _ => "none",
    }
}

/// Replace `<pre><code>` blocks with `code` macros.
///
/// The escaped HTML text is decoded back to the source bytes and wrapped in
/// CDATA, so markup inside the block is never interpreted.
pub fn convert_code_blocks(html: &str) -> String {
    CODE_BLOCK
        .replace_all(html, |caps: &Captures| {
            let tag = caps
                .get(1)
                .and_then(|class| class.as_str().split_whitespace().next())
                .map_or("", |class| class.strip_prefix("language-").unwrap_or(class));
            code_macro(confluence_language(tag), &unescape_html(&caps[2]))
        })
        .into_owned()
}

fn code_macro(language: &str, code: &str) -> String {
    format!(
        concat!(
            r#"<ac:structured-macro ac:name="code">"#,
            r#"<ac:parameter ac:name="theme">Midnight</ac:parameter>"#,
            r#"<ac:parameter ac:name="linenumbers">true</ac:parameter>"#,
            r#"<ac:parameter ac:name="language">{}</ac:parameter>"#,
            "<ac:plain-text-body><![CDATA[{}]]></ac:plain-text-body>",
            "</ac:structured-macro>"
        ),
        language,
        code.replace("]]>", "]]]]><![CDATA[>")
    )
}
