//! # Command File Language Server (cfilelsp)
//!
//! Serves hover text, completion and semantic highlighting for LS-PrePost
//! command files over the Language Server Protocol.
//!
//! ## Architecture
//! The command table is loaded once at startup into a [`CommandSet`] that is
//! shared read-only by every request. Open documents are kept as full text
//! (the client sends full updates), and each request looks at a single line.

use std::{
    borrow::Cow,
    collections::HashMap,
    fs,
    net::Ipv4Addr,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use cfilelsp::{
    highlight, matcher::Span, position, position::Encoding, tooltip::LANGUAGE_ID, CommandSet,
};
use serde_json::Value;
use tokio::{
    net::{TcpListener, TcpStream},
    sync::RwLock,
};
use tower_lsp::{async_trait, jsonrpc::Result, lsp_types::*, Client, LanguageServer, LspService, Server};
use tracing_subscriber::EnvFilter;

mod cli;

/// Packaged table location relative to the executable's directory.
const PACKAGED_TABLE: &str = "data/commands.tsv";

const DEFAULT_PORT: u16 = 9257;

#[derive(Clone, Debug)]
struct Configuration {
    hover: bool,
    completion: bool,
    semantic_tokens: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            hover: true,
            completion: true,
            semantic_tokens: true,
        }
    }
}

impl Configuration {
    /// Apply client settings, either top-level or nested under the language id.
    fn update(&mut self, settings: &Value) {
        let value = settings.get(LANGUAGE_ID).unwrap_or(settings);
        let flag = |name: &str, current: bool| value.get(name).and_then(Value::as_bool).unwrap_or(current);

        self.hover = flag("hover", self.hover);
        self.completion = flag("completion", self.completion);
        self.semantic_tokens = flag("semanticTokens", self.semantic_tokens);
    }
}

struct Backend {
    client: Client,
    commands: Arc<CommandSet>,
    documents: Arc<RwLock<HashMap<Url, String>>>,
    config: Arc<RwLock<Configuration>>,
    encoding: Arc<RwLock<Encoding>>,
}

#[async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let encoding = Encoding::negotiate(
            params
                .capabilities
                .general
                .as_ref()
                .and_then(|general| general.position_encodings.as_deref()),
        );
        *self.encoding.write().await = encoding;

        if let Some(options) = params.initialization_options.as_ref() {
            self.config.write().await.update(options);
        }

        let table = self.commands.table();
        self.client
            .log_message(
                MessageType::INFO,
                format!(
                    "cfilelsp init: commands={} baseCommands={} completionItems={} encoding={:?}",
                    table.len(),
                    table.base_count(),
                    self.commands.completions().len(),
                    encoding
                ),
            )
            .await;
        if table.is_empty() {
            self.client
                .show_message(
                    MessageType::WARNING,
                    "Command table could not be loaded; hover and completion are unavailable.",
                )
                .await;
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: vec!["version".to_string(), "commandCount".to_string()],
                    work_done_progress_options: WorkDoneProgressOptions {
                        work_done_progress: None,
                    },
                }),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                position_encoding: Some(encoding.kind()),
                completion_provider: Some(CompletionOptions {
                    resolve_provider: Some(false),
                    trigger_characters: Some(vec![" ".to_string()]),
                    ..Default::default()
                }),
                semantic_tokens_provider: Some(
                    SemanticTokensServerCapabilities::SemanticTokensOptions(
                        SemanticTokensOptions {
                            range: Some(false),
                            full: Some(SemanticTokensFullOptions::Bool(true)),
                            legend: SemanticTokensLegend {
                                token_types: highlight::LEGEND.into(),
                                token_modifiers: vec![],
                            },
                            ..Default::default()
                        },
                    ),
                ),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "cfilelsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        tracing::info!("client initialized");
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> Result<Option<Value>> {
        match params.command.as_str() {
            "version" => {
                self.client
                    .show_message(
                        MessageType::INFO,
                        concat!("cfilelsp version: ", env!("CARGO_PKG_VERSION")),
                    )
                    .await;
            }
            "commandCount" => {
                let count = self.commands.table().len();
                self.client
                    .show_message(MessageType::INFO, format!("{count} commands loaded"))
                    .await;
                return Ok(Some(Value::from(count)));
            }
            other => tracing::warn!(command = other, "unknown command"),
        }
        Ok(None)
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        self.documents
            .write()
            .await
            .insert(params.text_document.uri, params.text_document.text);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        // Full sync: the last change holds the whole document.
        if let Some(change) = params.content_changes.into_iter().last() {
            self.documents
                .write()
                .await
                .insert(params.text_document.uri, change.text);
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.documents
            .write()
            .await
            .remove(&params.text_document.uri);
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        let mut config = self.config.write().await;
        config.update(&params.settings);
        tracing::debug!(config = ?*config, "configuration updated");
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        if !self.config.read().await.hover {
            return Ok(None);
        }
        let encoding = *self.encoding.read().await;
        let documents = self.documents.read().await;
        let cursor = params.text_document_position_params.position;
        let Some(line) = documents
            .get(&params.text_document_position_params.text_document.uri)
            .and_then(|text| position::line_at(text, cursor.line))
        else {
            return Ok(None);
        };

        let caret = position::byte_offset(line, cursor.character, encoding);
        Ok(self.commands.hover(line, caret).map(|(contents, span)| Hover {
            contents: HoverContents::Array(contents),
            range: Some(lsp_range(cursor.line, line, span, encoding)),
        }))
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        if !self.config.read().await.completion {
            return Ok(None);
        }
        let encoding = *self.encoding.read().await;
        let documents = self.documents.read().await;
        let cursor = params.text_document_position.position;
        let line = documents
            .get(&params.text_document_position.text_document.uri)
            .and_then(|text| position::line_at(text, cursor.line))
            .unwrap_or("");

        let caret = position::byte_offset(line, cursor.character, encoding);
        let completions = self.commands.complete(line, caret);
        let replace = completions
            .replace
            .map(|span| lsp_range(cursor.line, line, span, encoding));

        let items = completions
            .items
            .into_iter()
            .map(|item| CompletionItem {
                label: item.label.clone(),
                detail: Some(item.detail.clone()),
                kind: Some(CompletionItemKind::FUNCTION),
                documentation: item.documentation.clone().map(Documentation::String),
                sort_text: Some(item.sort_text.clone()),
                insert_text: replace.is_none().then(|| item.insert_text.clone()),
                text_edit: replace.map(|range| {
                    CompletionTextEdit::Edit(TextEdit {
                        range,
                        new_text: item.insert_text.clone(),
                    })
                }),
                ..Default::default()
            })
            .collect();
        Ok(Some(CompletionResponse::Array(items)))
    }

    async fn semantic_tokens_full(
        &self,
        params: SemanticTokensParams,
    ) -> Result<Option<SemanticTokensResult>> {
        if !self.config.read().await.semantic_tokens {
            return Ok(None);
        }
        let encoding = *self.encoding.read().await;
        let documents = self.documents.read().await;
        let Some(text) = documents.get(&params.text_document.uri) else {
            return Ok(None);
        };
        Ok(Some(SemanticTokensResult::Tokens(SemanticTokens {
            result_id: None,
            data: highlight::semantic_tokens(self.commands.table(), text, encoding),
        })))
    }
}

fn lsp_range(line_no: u32, line: &str, span: Span, encoding: Encoding) -> Range {
    Range::new(
        Position::new(line_no, position::character(line, span.start, encoding)),
        Position::new(line_no, position::character(line, span.end, encoding)),
    )
}

/// `data/commands.tsv` next to the executable or up to two directories above it
/// (covers `target/<profile>` builds), else relative to the working directory.
fn packaged_table_path() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    exe_dir
        .iter()
        .flat_map(|dir| dir.ancestors().take(3))
        .map(|dir| dir.join(PACKAGED_TABLE))
        .find(|candidate| candidate.is_file())
        .unwrap_or_else(|| PathBuf::from(PACKAGED_TABLE))
}

/// Print the match found on every line of `path`.
fn inspect(commands: &CommandSet, path: &Path) -> anyhow::Result<()> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("could not read {}", path.display()))?;

    println!("Commands in {}:", path.display());
    let mut found = 0;
    for (line_no, line) in position::lines(&content).enumerate() {
        if let Some(m) = cfilelsp::matcher::find(commands.table(), line, 0) {
            found += 1;
            println!(
                "  {}:{}-{} {}",
                line_no + 1,
                m.span.start,
                m.span.end,
                m.entry.signature()
            );
        }
    }
    if found == 0 {
        println!("  (no commands)");
    }
    println!();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use clap::Parser as _;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_env_filter(
            EnvFilter::try_from_env("CFILELSP_LOG")
                .unwrap_or_else(|_| EnvFilter::new("cfilelsp=info")),
        )
        .init();

    let cli = cli::Cli::parse();
    let table_path = cli.commands.clone().unwrap_or_else(packaged_table_path);
    let commands = Arc::new(CommandSet::load(&table_path));

    if !cli.inspect.is_empty() {
        for path in &cli.inspect {
            if let Err(err) = inspect(&commands, path) {
                tracing::error!("{err:#}");
            }
        }
        return Ok(());
    }

    let (service, socket) = LspService::new(|client| Backend {
        client,
        commands: Arc::clone(&commands),
        documents: Arc::new(RwLock::new(HashMap::new())),
        config: Arc::new(RwLock::new(Configuration::default())),
        encoding: Arc::new(RwLock::new(Encoding::default())),
    });

    if !cli.listen && cli.host.is_none() {
        tracing::info!("serving on stdio");
        Server::new(tokio::io::stdin(), tokio::io::stdout(), socket)
            .serve(service)
            .await;
    } else if cli.listen {
        let host = cli
            .host
            .map(Cow::Owned)
            .unwrap_or(Cow::Borrowed("127.0.0.1"))
            .parse::<Ipv4Addr>()
            .context("could not parse listen address")?;
        let port = cli.port.unwrap_or(DEFAULT_PORT);

        let listener = TcpListener::bind((host, port))
            .await
            .with_context(|| format!("could not bind {host}:{port}"))?;
        tracing::info!(%host, port, "waiting for a client");
        let (stream, peer) = listener.accept().await?;
        tracing::info!(%peer, "client connected");

        let (input, output) = tokio::io::split(stream);
        Server::new(input, output, socket).serve(service).await;
    } else {
        let host = cli.host.context("no host given")?;
        let port = cli.port.context("no port given")?;

        let stream = TcpStream::connect((host.as_str(), port))
            .await
            .with_context(|| format!("could not connect to {host}:{port}"))?;

        let (input, output) = tokio::io::split(stream);
        Server::new(input, output, socket).serve(service).await;
    }
    Ok(())
}
