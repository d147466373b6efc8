// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Serialize/deserialize round-trip properties over generated documents.
#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use cellsync_app_core::prefs::SessionPrefs;
use cellsync_core::{Cell, Document, Options, QuotePrefix};
use cellsync_dry_tests::{
    code_cell, document, markdown_cell, sql_cell, structurer, InMemoryDocumentReader, JsonCodec,
    PINNED_VERSION,
};
use cellsync_session::NotebookSession;
use proptest::prelude::*;
use serde_json::Value;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn session() -> NotebookSession<JsonCodec, InMemoryDocumentReader> {
    NotebookSession::new(
        JsonCodec::new(),
        InMemoryDocumentReader::new(),
        structurer("rt"),
        SessionPrefs::default(),
    )
}

fn option_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-z]{0,6}".prop_map(Value::from),
        any::<i32>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
    ]
}

fn options() -> impl Strategy<Value = Options> {
    prop::collection::btree_map("[a-z_]{1,6}", option_value(), 0..3)
        .prop_map(|m| m.into_iter().collect())
}

fn prefix() -> impl Strategy<Value = QuotePrefix> {
    prop_oneof![Just(QuotePrefix::Plain), Just(QuotePrefix::Raw)]
}

fn cell() -> impl Strategy<Value = Cell> {
    let code = "[a-z][a-z0-9_ =]{0,12}".prop_map(|v| code_cell("g", &v));
    let md = ("[a-z #]{0,12}", prefix()).prop_map(|(body, p)| {
        let mut c = markdown_cell("m", &body);
        if let Some(meta) = c.language_metadata.markdown.as_mut() {
            meta.quote_prefix = p;
        }
        c
    });
    let sql = ("[a-z ]{0,12}", "[a-z_][a-z0-9_]{0,6}", any::<bool>()).prop_map(|(q, df, show)| {
        let mut c = sql_cell("s", &q, &df);
        if let Some(meta) = c.language_metadata.sql.as_mut() {
            meta.show_output = show;
        }
        c
    });
    (prop_oneof![code, md, sql], prop::option::of("[a-z]{1,6}"), options()).prop_map(
        |(mut c, name, opts)| {
            if let Some(name) = name {
                c.name = cellsync_core::CellName::new(name);
            }
            c.options = opts;
            c
        },
    )
}

fn notebook() -> impl Strategy<Value = Document> {
    (
        prop::collection::vec(cell(), 0..6),
        options(),
        prop::option::of("[A-Za-z ]{0,16}"),
    )
        .prop_map(|(cells, app, header)| {
            let mut doc = document(cells);
            doc.metadata.app = app;
            doc.metadata.header = header;
            doc
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn deserialize_inverts_serialize(doc in notebook()) {
        let rt = runtime();
        let session = session();
        let bytes = rt.block_on(session.serialize(&doc)).unwrap();
        let back = rt.block_on(session.deserialize(&bytes)).unwrap();
        prop_assert!(back.same_content(&doc), "{back:#?}\n!=\n{doc:#?}");
        prop_assert_eq!(back.metadata.version.as_deref(), Some(PINNED_VERSION));
    }

    #[test]
    fn reserialization_is_idempotent(doc in notebook()) {
        let rt = runtime();
        let session = session();
        let first = rt.block_on(session.serialize(&doc)).unwrap();
        let back = rt.block_on(session.deserialize(&first)).unwrap();
        let second = rt.block_on(session.serialize(&back)).unwrap();
        prop_assert_eq!(first, second);
    }
}
