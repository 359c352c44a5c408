//! LSP server main loop with request/notification dispatch.
//!
//! Uses `lsp-server` (synchronous, crossbeam-based) for the transport.
//! Messages are handled one at a time, so each edit's analysis finishes
//! before the next message is read.

use lsp_server::{Connection, Message, Notification, Response};
use lsp_types::notification::{
    DidChangeTextDocument, DidCloseTextDocument, DidOpenTextDocument, Notification as _,
    PublishDiagnostics,
};
use lsp_types::request::{Completion, DocumentSymbolRequest, GotoDefinition, HoverRequest};
use lsp_types::{
    CompletionOptions, CompletionResponse, DocumentSymbolResponse, GotoDefinitionResponse,
    HoverProviderCapability, OneOf, PublishDiagnosticsParams, ServerCapabilities,
    TextDocumentSyncCapability, TextDocumentSyncKind, TextDocumentSyncOptions, Uri,
};
use std::path::PathBuf;

use antimony_core::Context;

use crate::completion;
use crate::diagnostics;
use crate::document::DocumentState;
use crate::hover;
use crate::navigation;

/// Run the LSP server over stdio until shutdown.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (connection, io_threads) = Connection::stdio();

    // ── Initialize handshake ──────────────────────────────────────────
    let server_capabilities = build_capabilities();
    let init_json = serde_json::to_value(&server_capabilities)?;
    let _init_params: lsp_types::InitializeParams =
        serde_json::from_value(connection.initialize(init_json)?)?;
    tracing::info!("language server initialized");

    // ── Main loop ─────────────────────────────────────────────────────
    let ctx = Context::new();
    let mut doc_state = DocumentState::new();

    for msg in &connection.receiver {
        match msg {
            Message::Request(req) => {
                if connection.handle_shutdown(&req)? {
                    break;
                }
                handle_request(&connection, &ctx, &doc_state, req)?;
            }
            Message::Notification(not) => {
                handle_notification(&connection, &ctx, &mut doc_state, not)?;
            }
            Message::Response(_) => {
                // Ignore responses (we don't send requests to the client)
            }
        }
    }

    io_threads.join()?;
    tracing::info!("language server stopped");
    Ok(())
}

pub fn build_capabilities() -> ServerCapabilities {
    ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Options(
            TextDocumentSyncOptions {
                open_close: Some(true),
                change: Some(TextDocumentSyncKind::FULL),
                ..Default::default()
            },
        )),
        definition_provider: Some(OneOf::Left(true)),
        document_symbol_provider: Some(OneOf::Left(true)),
        hover_provider: Some(HoverProviderCapability::Simple(true)),
        completion_provider: Some(CompletionOptions {
            trigger_characters: Some(vec![";".into(), " ".into()]),
            resolve_provider: Some(false),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn handle_request(
    connection: &Connection,
    ctx: &Context,
    doc_state: &DocumentState,
    req: lsp_server::Request,
) -> Result<(), Box<dyn std::error::Error>> {
    use lsp_types::request::Request as _;

    tracing::debug!(method = %req.method, "request");
    let result = if req.method == GotoDefinition::METHOD {
        let params: lsp_types::GotoDefinitionParams = serde_json::from_value(req.params)?;
        let uri = &params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        let result = doc_state
            .get(uri.as_str())
            .map(|doc| navigation::goto_definition(&doc.analysis, uri, position))
            .filter(|locs| !locs.is_empty())
            .map(GotoDefinitionResponse::Array);
        serde_json::to_value(result)?
    } else if req.method == DocumentSymbolRequest::METHOD {
        let params: lsp_types::DocumentSymbolParams = serde_json::from_value(req.params)?;
        let result = doc_state
            .get(params.text_document.uri.as_str())
            .map(|doc| navigation::document_symbols(&doc.analysis))
            .filter(|syms| !syms.is_empty())
            .map(DocumentSymbolResponse::Nested);
        serde_json::to_value(result)?
    } else if req.method == HoverRequest::METHOD {
        let params: lsp_types::HoverParams = serde_json::from_value(req.params)?;
        let uri = &params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        let result = doc_state
            .get(uri.as_str())
            .and_then(|doc| hover::compute_hover(&doc.analysis, position));
        serde_json::to_value(result)?
    } else if req.method == Completion::METHOD {
        let params: lsp_types::CompletionParams = serde_json::from_value(req.params)?;
        let uri = &params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        let items = doc_state
            .get(uri.as_str())
            .map(|doc| completion::compute_completions(ctx, &doc.analysis, position))
            .unwrap_or_default();
        serde_json::to_value(CompletionResponse::Array(items))?
    } else {
        // Unknown request -- method not found
        let resp = Response::new_err(
            req.id,
            lsp_server::ErrorCode::MethodNotFound as i32,
            format!("method not found: {}", req.method),
        );
        connection.sender.send(Message::Response(resp))?;
        return Ok(());
    };
    let resp = Response::new_ok(req.id, result);
    connection.sender.send(Message::Response(resp))?;
    Ok(())
}

fn handle_notification(
    connection: &Connection,
    ctx: &Context,
    doc_state: &mut DocumentState,
    not: Notification,
) -> Result<(), Box<dyn std::error::Error>> {
    match not.method.as_str() {
        m if m == DidOpenTextDocument::METHOD => {
            let params: lsp_types::DidOpenTextDocumentParams = serde_json::from_value(not.params)?;
            let uri = params.text_document.uri;
            let version = params.text_document.version;
            doc_state.open(
                ctx,
                uri.as_str(),
                uri_to_path(&uri),
                version,
                params.text_document.text,
            );
            publish_current(connection, doc_state, uri)?;
        }
        m if m == DidChangeTextDocument::METHOD => {
            let params: lsp_types::DidChangeTextDocumentParams =
                serde_json::from_value(not.params)?;
            let uri = params.text_document.uri;
            // FULL sync: last content change has the entire document
            if let Some(change) = params.content_changes.into_iter().last() {
                if doc_state.change(ctx, uri.as_str(), params.text_document.version, change.text)
                {
                    publish_current(connection, doc_state, uri)?;
                }
            }
        }
        m if m == DidCloseTextDocument::METHOD => {
            let params: lsp_types::DidCloseTextDocumentParams = serde_json::from_value(not.params)?;
            doc_state.close(params.text_document.uri.as_str());
            // Clear diagnostics for closed file
            publish_diagnostics(connection, params.text_document.uri, Vec::new(), None)?;
        }
        _ => {
            // Unknown notification -- ignore
        }
    }
    Ok(())
}

/// Publish the diagnostics of the latest analysis of `uri`.
fn publish_current(
    connection: &Connection,
    doc_state: &DocumentState,
    uri: Uri,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(doc) = doc_state.get(uri.as_str()) else {
        return Ok(());
    };
    let diags = diagnostics::compute_diagnostics(&doc.analysis);
    tracing::debug!(uri = uri.as_str(), version = doc.version, count = diags.len(), "publishing diagnostics");
    publish_diagnostics(connection, uri, diags, Some(doc.version))
}

/// Send `textDocument/publishDiagnostics` notification to the client.
fn publish_diagnostics(
    connection: &Connection,
    uri: Uri,
    diagnostics: Vec<lsp_types::Diagnostic>,
    version: Option<i32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let params = PublishDiagnosticsParams {
        uri,
        diagnostics,
        version,
    };
    let not = Notification::new(PublishDiagnostics::METHOD.to_string(), params);
    connection.sender.send(Message::Notification(not))?;
    Ok(())
}

/// Convert an LSP URI to a file system path.
///
/// Handles `file:///path/to/file` URIs by stripping the scheme and authority
/// and percent-decoding (e.g. `%3A` → `:`).
pub fn uri_to_path(uri: &Uri) -> PathBuf {
    let s = uri.as_str();
    if let Some(path) = s.strip_prefix("file://") {
        let decoded = percent_decode(path);
        // On Unix: file:///foo/bar -> /foo/bar
        // On Windows: file:///C:/foo -> C:/foo (strip leading /)
        #[cfg(windows)]
        {
            let decoded = decoded.strip_prefix('/').unwrap_or(&decoded);
            PathBuf::from(decoded)
        }
        #[cfg(not(windows))]
        {
            PathBuf::from(decoded)
        }
    } else {
        PathBuf::from(s)
    }
}

/// Decode percent-encoded characters in a URI path (e.g. `%3A` → `:`).
fn percent_decode(input: &str) -> String {
    let mut bytes = Vec::with_capacity(input.len());
    let mut iter = input.bytes();
    while let Some(b) = iter.next() {
        if b != b'%' {
            bytes.push(b);
            continue;
        }
        match (iter.next(), iter.next()) {
            (Some(hi), Some(lo)) => match (hex_val(hi), hex_val(lo)) {
                (Some(h), Some(l)) => bytes.push(h << 4 | l),
                // Malformed percent encoding -- pass through
                _ => bytes.extend([b'%', hi, lo]),
            },
            (Some(hi), None) => bytes.extend([b'%', hi]),
            _ => bytes.push(b'%'),
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_paths_are_decoded() {
        let uri: Uri = "file:///tmp/my%20model.ant".parse().expect("uri");
        assert_eq!(uri_to_path(&uri), PathBuf::from("/tmp/my model.ant"));
        assert_eq!(percent_decode("a%zzb"), "a%zzb");
        assert_eq!(percent_decode("caf%C3%A9"), "café");
    }

    #[test]
    fn capabilities_advertise_features() {
        let caps = build_capabilities();
        assert!(caps.hover_provider.is_some());
        assert!(caps.completion_provider.is_some());
        assert!(caps.definition_provider.is_some());
        assert!(caps.document_symbol_provider.is_some());
    }
}
