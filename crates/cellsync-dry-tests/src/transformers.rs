// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Markdown and SQL transformer fakes.
//!
//! Both recognise a single canonical spelling and only claim sources they
//! would re-render byte for byte, so anything they accept round-trips.
//!
//! - markdown: `mo.md(<prefix>"""\n<body>\n""")`
//! - SQL: `<df> = mo.sql(<prefix>"""<query>"""[, output=False][, engine=<name>])`

use cellsync_core::{
    MarkdownMetadata, QuotePrefix, SqlMetadata, Transformed, Transformer, Transformers,
};
use std::sync::Arc;

const TRIPLE: &str = "\"\"\"";

/// Markdown fake.
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeMarkdown;

impl FakeMarkdown {
    fn parse(source: &str) -> Option<Transformed<MarkdownMetadata>> {
        let rest = source.strip_prefix("mo.md(")?.strip_suffix(')')?;
        let q = rest.find(TRIPLE)?;
        let quote_prefix = QuotePrefix::parse(&rest[..q])?;
        let body = rest[q + TRIPLE.len()..]
            .strip_prefix('\n')?
            .strip_suffix("\n\"\"\"")?;
        Some(Transformed {
            code: body.to_owned(),
            metadata: MarkdownMetadata { quote_prefix },
        })
    }

    /// Wrap markdown `body` the way this fake expects to read it back.
    pub fn render(body: &str, metadata: &MarkdownMetadata) -> String {
        format!("mo.md({}{TRIPLE}\n{body}\n{TRIPLE})", metadata.quote_prefix.as_str())
    }
}

impl Transformer for FakeMarkdown {
    type Metadata = MarkdownMetadata;

    fn is_supported(&self, source: &str) -> bool {
        Self::parse(source).is_some_and(|t| Self::render(&t.code, &t.metadata) == source)
    }

    fn transform_in(&self, source: &str) -> Transformed<MarkdownMetadata> {
        Self::parse(source).unwrap_or_else(|| Transformed {
            code: source.to_owned(),
            metadata: MarkdownMetadata::default(),
        })
    }

    fn transform_out(&self, code: &str, metadata: &MarkdownMetadata) -> String {
        Self::render(code, metadata)
    }

    fn default_metadata(&self) -> MarkdownMetadata {
        MarkdownMetadata::default()
    }
}

/// SQL fake.
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeSql;

impl FakeSql {
    fn parse(source: &str) -> Option<Transformed<SqlMetadata>> {
        let (dataframe_name, rest) = source.split_once(" = mo.sql(")?;
        if dataframe_name.is_empty()
            || !dataframe_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return None;
        }
        let rest = rest.strip_suffix(')')?;
        let q = rest.find(TRIPLE)?;
        let quote_prefix = QuotePrefix::parse(&rest[..q])?;
        let body = &rest[q + TRIPLE.len()..];
        let end = body.rfind(TRIPLE)?;
        let query = &body[..end];
        let mut tail = &body[end + TRIPLE.len()..];

        let mut show_output = true;
        if let Some(t) = tail.strip_prefix(", output=False") {
            show_output = false;
            tail = t;
        }
        let mut engine = None;
        if let Some(t) = tail.strip_prefix(", engine=") {
            engine = Some(t.to_owned());
            tail = "";
        }
        if !tail.is_empty() {
            return None;
        }
        Some(Transformed {
            code: query.to_owned(),
            metadata: SqlMetadata {
                dataframe_name: dataframe_name.to_owned(),
                quote_prefix,
                show_output,
                engine,
            },
        })
    }

    /// Wrap `query` the way this fake expects to read it back.
    pub fn render(query: &str, metadata: &SqlMetadata) -> String {
        let mut out = format!(
            "{} = mo.sql({}{TRIPLE}{query}{TRIPLE}",
            metadata.dataframe_name,
            metadata.quote_prefix.as_str()
        );
        if !metadata.show_output {
            out.push_str(", output=False");
        }
        if let Some(engine) = &metadata.engine {
            out.push_str(", engine=");
            out.push_str(engine);
        }
        out.push(')');
        out
    }
}

impl Transformer for FakeSql {
    type Metadata = SqlMetadata;

    fn is_supported(&self, source: &str) -> bool {
        Self::parse(source).is_some_and(|t| Self::render(&t.code, &t.metadata) == source)
    }

    fn transform_in(&self, source: &str) -> Transformed<SqlMetadata> {
        Self::parse(source).unwrap_or_else(|| Transformed {
            code: source.to_owned(),
            metadata: SqlMetadata::default(),
        })
    }

    fn transform_out(&self, code: &str, metadata: &SqlMetadata) -> String {
        Self::render(code, metadata)
    }

    fn default_metadata(&self) -> SqlMetadata {
        SqlMetadata::default()
    }
}

/// [`FakeMarkdown`] and [`FakeSql`] bundled for a structurer.
pub fn transformers() -> Transformers {
    Transformers::new(Arc::new(FakeMarkdown), Arc::new(FakeSql))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_parses_prefix_and_body() {
        let src = "mo.md(r\"\"\"\n# Title\nbody\n\"\"\")";
        assert!(FakeMarkdown.is_supported(src));
        let t = FakeMarkdown.transform_in(src);
        assert_eq!(t.code, "# Title\nbody");
        assert_eq!(t.metadata.quote_prefix, QuotePrefix::Raw);
        assert_eq!(FakeMarkdown.transform_out(&t.code, &t.metadata), src);
    }

    #[test]
    fn markdown_rejects_other_code() {
        assert!(!FakeMarkdown.is_supported("x = 1"));
        assert!(!FakeMarkdown.is_supported("mo.md(\"hi\")"));
        assert!(!FakeMarkdown.is_supported("mo.md(b\"\"\"\nhi\n\"\"\")"));
    }

    #[test]
    fn sql_parses_every_option() {
        let src = "out = mo.sql(f\"\"\"SELECT * FROM t\"\"\", output=False, engine=duck)";
        assert!(FakeSql.is_supported(src));
        let t = FakeSql.transform_in(src);
        assert_eq!(t.code, "SELECT * FROM t");
        assert_eq!(t.metadata.dataframe_name, "out");
        assert!(!t.metadata.show_output);
        assert_eq!(t.metadata.engine.as_deref(), Some("duck"));
        assert_eq!(FakeSql.transform_out(&t.code, &t.metadata), src);
    }

    #[test]
    fn sql_default_metadata_renders_canonically() {
        let out = FakeSql.transform_out("SELECT 1", &FakeSql.default_metadata());
        assert_eq!(out, "_df = mo.sql(f\"\"\"SELECT 1\"\"\")");
        assert!(FakeSql.is_supported(&out));
    }

    #[test]
    fn sql_rejects_non_identifier_sinks() {
        assert!(!FakeSql.is_supported("a b = mo.sql(f\"\"\"SELECT 1\"\"\")"));
        assert!(!FakeSql.is_supported("df = mo.sql(f\"\"\"SELECT 1\"\"\", verbose=True)"));
    }
}
